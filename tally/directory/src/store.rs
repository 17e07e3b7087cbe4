use {
    crate::DirectoryResult,
    async_trait::async_trait,
    tally_types::{Address, GroupId, ManagerRecord, ParticipationEntry, VoteCounter},
};

/// Collection holding one `ManagerRecord` per manager address.
pub const MANAGERS_COLLECTION: &str = "voteManagers";

/// Collection holding each account's participation index.
pub const PARTICIPATION_COLLECTION: &str = "usersVotes";

/// Collection holding the global vote id counter.
pub const COUNTER_COLLECTION: &str = "votesID";

/// Document id of the global vote id counter.
pub const COUNTER_DOCUMENT: &str = "currentID";

/// Storage backend of the off-chain directory.
///
/// Implementations decode documents into validated records at this boundary;
/// callers never see untyped data.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn manager(&self, address: &Address) -> DirectoryResult<Option<ManagerRecord>>;

    /// Every manager record, in no particular order.
    async fn managers(&self) -> DirectoryResult<Vec<ManagerRecord>>;

    /// Create or replace a manager record.
    async fn put_manager(&self, record: &ManagerRecord) -> DirectoryResult<()>;

    /// Add `member` to a group with set-union semantics. Fails with
    /// `ManagerNotFound` if the manager has no record.
    async fn add_group_member(
        &self,
        manager: &Address,
        group: GroupId,
        member: Address,
    ) -> DirectoryResult<()>;

    /// An account's participation index. Empty if the account has none.
    async fn participation(&self, address: &Address) -> DirectoryResult<Vec<ParticipationEntry>>;

    /// Append to an account's participation index with set-union semantics,
    /// creating the index if needed.
    async fn append_participation(
        &self,
        address: &Address,
        entry: &ParticipationEntry,
    ) -> DirectoryResult<()>;

    async fn vote_counter(&self) -> DirectoryResult<Option<VoteCounter>>;

    /// Create the counter at zero unless it already exists. Returns whether a
    /// new counter was created.
    async fn create_vote_counter(&self) -> DirectoryResult<bool>;

    /// Atomically add one to the counter and return the new value. Fails with
    /// `CounterUninitialized` if the counter doesn't exist.
    async fn increment_vote_counter(&self) -> DirectoryResult<u64>;
}
