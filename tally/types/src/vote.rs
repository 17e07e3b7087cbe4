use {
    crate::{GroupId, VoteId},
    serde::{Deserialize, Serialize},
};

/// Vote metadata as returned by the contract's `getVote` call.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VoteInfo {
    /// The id echoed back by the contract. For ids that were never created
    /// the contract returns a zero-valued record, so this may differ from the
    /// id that was asked for.
    pub id: VoteId,
    pub name: String,
    /// UNIX timestamp in seconds.
    pub start_time: u64,
    /// In seconds.
    pub duration: u64,
    pub options_count: u64,
    pub open: bool,
}

impl VoteInfo {
    pub fn end_time(&self) -> u64 {
        self.start_time.saturating_add(self.duration)
    }

    /// Whether this looks like the zero-valued record the contract returns for
    /// an id it doesn't know.
    pub fn is_missing(&self, requested: VoteId) -> bool {
        self.id != requested || (self.name.is_empty() && self.start_time == 0)
    }
}

/// One option of a vote, with its current tally.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OptionTally {
    pub name: String,
    pub count: u64,
}

impl OptionTally {
    pub fn new<N>(name: N, count: u64) -> Self
    where
        N: Into<String>,
    {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// One row of the contract's `getAccessibleVotes` response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AccessibleVote {
    pub id: VoteId,
    pub name: String,
    pub start_time: u64,
    pub duration: u64,
    pub open: bool,
}

/// Arguments of the contract's `createVote` transaction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewVote {
    pub id: VoteId,
    pub name: String,
    pub start_time: u64,
    pub duration: u64,
    pub group: GroupId,
    pub options: Vec<String>,
}
