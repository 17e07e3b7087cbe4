use {alloy::primitives::Address, std::path::PathBuf, thiserror::Error};

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("no keystore found at `{}`", path.display())]
    Unavailable { path: PathBuf },

    #[error("wallet is not connected")]
    NotConnected,

    #[error("keystore already exists at `{}`", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("failed to decrypt keystore: incorrect password or corrupted file")]
    Decryption,

    #[error("failed to encrypt private key")]
    Encryption,

    #[error("invalid private key: {reason}")]
    InvalidKey { reason: String },

    #[error("keystore holds key for {actual} but claims to be {expected}")]
    AddressMismatch { expected: Address, actual: Address },

    #[error("invalid key name `{name}`")]
    InvalidName { name: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("key derivation task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type WalletResult<T> = core::result::Result<T, WalletError>;
