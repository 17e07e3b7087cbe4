use {tally_types::Address, thiserror::Error};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("address {address} is neither a manager nor a member of any group")]
    NotFound { address: Address },

    #[error("no manager record for address {address}")]
    ManagerNotFound { address: Address },

    #[error("malformed document `{collection}/{id}`: {reason}")]
    Malformed {
        collection: &'static str,
        id: String,
        reason: String,
    },

    #[error("vote id counter is not initialized")]
    CounterUninitialized,

    #[error("document store returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl DirectoryError {
    pub fn malformed<I, R>(collection: &'static str, id: I, reason: R) -> Self
    where
        I: Into<String>,
        R: Into<String>,
    {
        Self::Malformed {
            collection,
            id: id.into(),
            reason: reason.into(),
        }
    }
}

pub type DirectoryResult<T> = core::result::Result<T, DirectoryError>;
