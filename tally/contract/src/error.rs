use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("failed to read `{method}`: {reason}")]
    Read { method: &'static str, reason: String },

    #[error("failed to send `{method}`: {reason}")]
    Write { method: &'static str, reason: String },

    #[error("transaction `{method}` reverted! tx hash: {tx_hash}")]
    Reverted { method: &'static str, tx_hash: String },

    #[error("`{method}` returned a value that doesn't fit in 64 bits")]
    Overflow { method: &'static str },
}

impl ContractError {
    pub fn read<E>(method: &'static str) -> impl FnOnce(E) -> Self
    where
        E: ToString,
    {
        move |err| Self::Read {
            method,
            reason: err.to_string(),
        }
    }

    pub fn write<E>(method: &'static str) -> impl FnOnce(E) -> Self
    where
        E: ToString,
    {
        move |err| Self::Write {
            method,
            reason: err.to_string(),
        }
    }
}

pub type ContractResult<T> = core::result::Result<T, ContractError>;
