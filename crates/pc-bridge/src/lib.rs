pub mod dispatch;
pub mod error;
pub mod protocol;

pub use dispatch::Session;
pub use error::BridgeError;
pub use protocol::{ClientMessage, PresentationUpdate, ServerEvent};
