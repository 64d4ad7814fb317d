mod codec;
mod connection;
mod frame;

pub use codec::RespCodec;
pub use connection::{Connector, RespConnection, StoreConnection, TcpConnector};
pub use frame::Frame;

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid frame type: {0:#04x}")]
    InvalidFrameType(u8),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Frame too large: {0} bytes")]
    FrameTooLarge(usize),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Unexpected response to {command}: {frame:?}")]
    UnexpectedResponse { command: String, frame: Frame },

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Connection closed by server")]
    ConnectionClosed,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Largest bulk string the server may send (matches the server-side limit)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;
