pub mod assets;
pub mod config;
pub mod history;
pub mod workspace;

pub use assets::{Asset, AssetCatalogue, AssetType, NewAsset};
pub use config::{ConfigError, EngineConfig};
pub use history::{History, Restore};
pub use workspace::{BatchUpdate, MISSING_ID, TextProperties, Workspace};
