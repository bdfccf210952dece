use crate::storage::StorageError;
use shared::DecodeError;
use std::net::{Ipv4Addr, SocketAddr};
use thiserror::Error;

/// Why a handler could not process a message
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("malformed message: {0}")]
    Malformed(#[from] DecodeError),
    #[error("{observed} tried to remote hack {expected}")]
    HijackAttempt {
        observed: Ipv4Addr,
        expected: Ipv4Addr,
    },
    #[error("character {0} not found")]
    CharacterNotFound(i32),
    #[error("unsupported address format: {0}")]
    UnsupportedAddress(SocketAddr),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("transport error: {0}")]
    Transport(String),
}

/// `Ok(true)`: handled. `Ok(false)`: not ours, offer it to the next stage.
pub type HandlerResult = Result<bool, HandlerError>;
