//! Errors raised while turning a client message into engine calls.

use pc_core::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// The text is not JSON, or not a known message shape.
    #[error("malformed message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Well-formed JSON whose content cannot be acted on.
    #[error("bad request: {0}")]
    Request(String),
}
