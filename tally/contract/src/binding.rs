use {
    crate::ContractResult,
    alloy::primitives::TxHash,
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    tally_types::{AccessibleVote, Address, GroupId, NewVote, OptionTally, VoteId, VoteInfo},
};

/// Result of a transaction that was mined successfully.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOutcome {
    pub tx_hash: TxHash,
}

/// The surface of the `VotingSystem` contract used by the client.
///
/// Read calls never mutate state. Write calls are signed by whichever account
/// the implementation was bound with, and only return once the transaction
/// has been included in a block.
#[async_trait]
pub trait VotingContract: Send + Sync {
    /// Address of the deployed contract.
    fn address(&self) -> Address;

    async fn create_vote(&self, vote: &NewVote) -> ContractResult<TxOutcome>;

    async fn cast_vote(&self, vote_id: VoteId, option_index: u64) -> ContractResult<TxOutcome>;

    async fn add_voter(
        &self,
        vote_id: VoteId,
        voter: Address,
        group: GroupId,
    ) -> ContractResult<TxOutcome>;

    async fn get_vote(&self, vote_id: VoteId) -> ContractResult<VoteInfo>;

    async fn get_option_details(&self, vote_id: VoteId, index: u64) -> ContractResult<OptionTally>;

    async fn get_options_count(&self, vote_id: VoteId) -> ContractResult<u64>;

    /// Tallies of the first `options_count` options, in option order.
    async fn get_vote_results(
        &self,
        vote_id: VoteId,
        options_count: u64,
    ) -> ContractResult<Vec<u64>>;

    async fn get_accessible_votes(&self, group: GroupId) -> ContractResult<Vec<AccessibleVote>>;

    async fn has_voted(&self, vote_id: VoteId, voter: Address) -> ContractResult<bool>;
}

/// Produces contract handles for an address, sharing one provider.
pub trait ContractBinder: Send + Sync {
    type Contract: VotingContract;

    fn bind(&self, address: Address) -> Self::Contract;
}
