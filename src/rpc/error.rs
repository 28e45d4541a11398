use thiserror::Error;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Timeout")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("not supported")]
    NotSupported,

    #[error("Unsupported network: {0}")]
    UnsupportedNetwork(String),
}

impl RpcError {
    /// True for errors raised by the connection itself rather than by the peer.
    pub fn is_transport(&self) -> bool {
        matches!(self, RpcError::Transport(_) | RpcError::Codec(_))
    }
}

impl From<bincode::error::EncodeError> for RpcError {
    fn from(err: bincode::error::EncodeError) -> Self {
        RpcError::Codec(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for RpcError {
    fn from(err: bincode::error::DecodeError) -> Self {
        RpcError::Codec(err.to_string())
    }
}
