use {
    tally_contract::ContractError,
    tally_directory::DirectoryError,
    tally_types::{Address, ValidationError, VoteId},
    thiserror::Error,
};

/// Why a single vote couldn't be reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("vote {id} does not exist on-chain")]
    VoteNotFound { id: VoteId },

    #[error("vote {id} has {expected} options but {actual} tallies")]
    TallyMismatch {
        id: VoteId,
        expected: u64,
        actual: usize,
    },

    #[error(transparent)]
    Contract(#[from] ContractError),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error("{address} is not a vote manager")]
    NotManager { address: Address },

    #[error("vote {id} is closed")]
    VoteClosed { id: VoteId },

    #[error("{voter} has already voted in vote {id}")]
    AlreadyVoted { id: VoteId, voter: Address },

    /// The vote exists on-chain but isn't listed in the participation index.
    #[error("vote {id} was created in transaction {tx_hash} but couldn't be indexed: {source}")]
    IndexingFailed {
        id: VoteId,
        tx_hash: String,
        source: DirectoryError,
    },
}

pub type ClientResult<T> = core::result::Result<T, ClientError>;
