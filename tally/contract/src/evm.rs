use {
    crate::{ContractBinder, ContractError, ContractResult, TxOutcome, VotingContract},
    alloy::{
        contract,
        network::{Ethereum, EthereumWallet},
        primitives::U256,
        providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder},
        signers::local::PrivateKeySigner,
        sol,
    },
    async_trait::async_trait,
    tally_types::{AccessibleVote, Address, GroupId, NewVote, OptionTally, VoteId, VoteInfo},
    url::Url,
};

sol! {
    #[sol(rpc)]
    contract VotingSystem {
        function createVote(
            uint256 voteID,
            string voteName,
            uint256 startTime,
            uint256 duration,
            uint256 groupId,
            string[] voting_options
        ) external;

        function castVote(uint256 voteID, uint256 optionIndex) external;

        function addVoter(uint256 voteID, address voterAddress, uint256 groupId) external;

        function getVote(uint256 voteID) external view returns (
            string voteName,
            uint256 voteID2,
            uint256 startVoteTime,
            uint256 duration,
            uint256 optionsCount,
            bool open
        );

        function getOptionDetails(uint256 voteID, uint256 optionIndex) external view returns (
            string optionName,
            uint256 countOption
        );

        function getOptionsCount(uint256 voteID) external view returns (uint256);

        function getVoteResults(uint256 voteID, uint256 optionsCount) external view returns (uint256[]);

        function getAccessibleVotes(uint256 groupId) external view returns (
            uint256[] voteIDs,
            string[] voteNames,
            uint256[] startVoteTimes,
            uint256[] durations,
            bool[] openStatuses
        );

        function hasVoted(uint256 voteID, address voter) external view returns (bool);
    }
}

/// `VotingContract` implementation that talks to a node over JSON-RPC.
#[derive(Clone)]
pub struct EvmContract {
    inner: VotingSystem::VotingSystemInstance<DynProvider>,
}

impl EvmContract {
    pub fn new(address: Address, provider: DynProvider) -> Self {
        Self {
            inner: VotingSystem::new(address, provider),
        }
    }
}

#[async_trait]
impl VotingContract for EvmContract {
    fn address(&self) -> Address {
        *self.inner.address()
    }

    async fn create_vote(&self, vote: &NewVote) -> ContractResult<TxOutcome> {
        let call = self.inner.createVote(
            to_uint(vote.id),
            vote.name.clone(),
            U256::from(vote.start_time),
            U256::from(vote.duration),
            to_uint(vote.group),
            vote.options.clone(),
        );

        confirm("createVote", call.send().await).await
    }

    async fn cast_vote(&self, vote_id: VoteId, option_index: u64) -> ContractResult<TxOutcome> {
        let call = self
            .inner
            .castVote(to_uint(vote_id), U256::from(option_index));

        confirm("castVote", call.send().await).await
    }

    async fn add_voter(
        &self,
        vote_id: VoteId,
        voter: Address,
        group: GroupId,
    ) -> ContractResult<TxOutcome> {
        let call = self.inner.addVoter(to_uint(vote_id), voter, to_uint(group));

        confirm("addVoter", call.send().await).await
    }

    async fn get_vote(&self, vote_id: VoteId) -> ContractResult<VoteInfo> {
        const METHOD: &str = "getVote";

        let res = self
            .inner
            .getVote(to_uint(vote_id))
            .call()
            .await
            .map_err(ContractError::read(METHOD))?;

        Ok(VoteInfo {
            id: VoteId(to_u64(METHOD, res.voteID2)?),
            name: res.voteName,
            start_time: to_u64(METHOD, res.startVoteTime)?,
            duration: to_u64(METHOD, res.duration)?,
            options_count: to_u64(METHOD, res.optionsCount)?,
            open: res.open,
        })
    }

    async fn get_option_details(&self, vote_id: VoteId, index: u64) -> ContractResult<OptionTally> {
        const METHOD: &str = "getOptionDetails";

        let res = self
            .inner
            .getOptionDetails(to_uint(vote_id), U256::from(index))
            .call()
            .await
            .map_err(ContractError::read(METHOD))?;

        Ok(OptionTally {
            name: res.optionName,
            count: to_u64(METHOD, res.countOption)?,
        })
    }

    async fn get_options_count(&self, vote_id: VoteId) -> ContractResult<u64> {
        const METHOD: &str = "getOptionsCount";

        let count = self
            .inner
            .getOptionsCount(to_uint(vote_id))
            .call()
            .await
            .map_err(ContractError::read(METHOD))?;

        to_u64(METHOD, count)
    }

    async fn get_vote_results(
        &self,
        vote_id: VoteId,
        options_count: u64,
    ) -> ContractResult<Vec<u64>> {
        const METHOD: &str = "getVoteResults";

        self.inner
            .getVoteResults(to_uint(vote_id), U256::from(options_count))
            .call()
            .await
            .map_err(ContractError::read(METHOD))?
            .into_iter()
            .map(|count| to_u64(METHOD, count))
            .collect()
    }

    async fn get_accessible_votes(&self, group: GroupId) -> ContractResult<Vec<AccessibleVote>> {
        const METHOD: &str = "getAccessibleVotes";

        let res = self
            .inner
            .getAccessibleVotes(to_uint(group))
            .call()
            .await
            .map_err(ContractError::read(METHOD))?;

        // The response is five parallel arrays; a length mismatch means the
        // rows can't be paired up reliably.
        let len = res.voteIDs.len();
        if [
            res.voteNames.len(),
            res.startVoteTimes.len(),
            res.durations.len(),
            res.openStatuses.len(),
        ]
        .iter()
        .any(|other| *other != len)
        {
            return Err(ContractError::Read {
                method: METHOD,
                reason: "response arrays have mismatched lengths".to_string(),
            });
        }

        res.voteIDs
            .into_iter()
            .zip(res.voteNames)
            .zip(res.startVoteTimes)
            .zip(res.durations)
            .zip(res.openStatuses)
            .map(|((((id, name), start_time), duration), open)| {
                Ok(AccessibleVote {
                    id: VoteId(to_u64(METHOD, id)?),
                    name,
                    start_time: to_u64(METHOD, start_time)?,
                    duration: to_u64(METHOD, duration)?,
                    open,
                })
            })
            .collect()
    }

    async fn has_voted(&self, vote_id: VoteId, voter: Address) -> ContractResult<bool> {
        self.inner
            .hasVoted(to_uint(vote_id), voter)
            .call()
            .await
            .map_err(ContractError::read("hasVoted"))
    }
}

/// Binds `EvmContract`s that all share one JSON-RPC provider.
#[derive(Clone)]
pub struct EvmBinder {
    provider: DynProvider,
}

impl EvmBinder {
    /// A binder without a local signer. Transactions are handed to the node
    /// unsigned, which only works against nodes with unlocked accounts.
    pub fn connect_http(rpc_url: Url) -> Self {
        let provider = ProviderBuilder::new().connect_http(rpc_url).erased();

        Self { provider }
    }

    /// A binder whose transactions are signed by `signer`.
    pub fn connect_http_with_signer(rpc_url: Url, signer: PrivateKeySigner) -> Self {
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(rpc_url)
            .erased();

        Self { provider }
    }
}

impl ContractBinder for EvmBinder {
    type Contract = EvmContract;

    fn bind(&self, address: Address) -> EvmContract {
        EvmContract::new(address, self.provider.clone())
    }
}

async fn confirm(
    method: &'static str,
    submitted: Result<PendingTransactionBuilder<Ethereum>, contract::Error>,
) -> ContractResult<TxOutcome> {
    let pending = submitted.map_err(ContractError::write(method))?;

    #[cfg(feature = "tracing")]
    tracing::debug!(method, tx_hash = %pending.tx_hash(), "Transaction submitted");

    let receipt = pending
        .get_receipt()
        .await
        .map_err(ContractError::write(method))?;

    if !receipt.status() {
        return Err(ContractError::Reverted {
            method,
            tx_hash: receipt.transaction_hash.to_string(),
        });
    }

    Ok(TxOutcome {
        tx_hash: receipt.transaction_hash,
    })
}

fn to_uint<T>(id: T) -> U256
where
    T: Into<u64>,
{
    U256::from(id.into())
}

fn to_u64(method: &'static str, value: U256) -> ContractResult<u64> {
    u64::try_from(value).map_err(|_| ContractError::Overflow { method })
}

#[cfg(test)]
mod tests {
    use {super::*, alloy::sol_types::SolCall, assertor::*};

    #[test]
    fn converting_integers() {
        assert_that!(to_u64("getVote", U256::from(42u64))).is_equal_to(Ok(42));
        assert_that!(to_u64("getVote", U256::MAX))
            .is_equal_to(Err(ContractError::Overflow { method: "getVote" }));
    }

    #[test]
    fn selectors_match_the_deployed_abi() {
        assert_that!(VotingSystem::castVoteCall::SIGNATURE)
            .is_equal_to("castVote(uint256,uint256)");
        assert_that!(VotingSystem::createVoteCall::SIGNATURE)
            .is_equal_to("createVote(uint256,string,uint256,uint256,uint256,string[])");
        assert_that!(VotingSystem::addVoterCall::SIGNATURE)
            .is_equal_to("addVoter(uint256,address,uint256)");
    }

    #[test]
    fn binding_keeps_the_address() {
        let binder = EvmBinder::connect_http("http://127.0.0.1:7545".parse().unwrap());
        let address = Address::repeat_byte(0xcc);

        assert_that!(binder.bind(address).address()).is_equal_to(address);
    }
}
