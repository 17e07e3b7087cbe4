use {
    alloy::primitives::{TxHash, U256},
    async_trait::async_trait,
    std::{
        collections::{BTreeMap, HashMap, HashSet},
        sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
    },
    tally_contract::{ContractBinder, ContractError, ContractResult, TxOutcome, VotingContract},
    tally_types::{AccessibleVote, Address, GroupId, NewVote, OptionTally, VoteId, VoteInfo},
};

#[derive(Debug, Clone)]
struct MockVote {
    name: String,
    start_time: u64,
    duration: u64,
    group: GroupId,
    open: bool,
    options: Vec<OptionTally>,
    voters: HashSet<Address>,
    added_voters: Vec<(Address, GroupId)>,
}

impl MockVote {
    fn is_open(&self, now: u64) -> bool {
        self.open && now < self.start_time.saturating_add(self.duration)
    }
}

#[derive(Debug, Default)]
struct MockDeployment {
    owner: Address,
    votes: BTreeMap<VoteId, MockVote>,
}

/// Calls matching a key fail until the failures are cleared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FailureKey {
    method: &'static str,
    vote_id: Option<VoteId>,
}

#[derive(Debug, Default)]
struct MockChainInner {
    deployments: HashMap<Address, MockDeployment>,
    /// Block timestamp used for open/closed checks on `castVote`.
    now: u64,
    tx_count: u64,
    failures: HashSet<FailureKey>,
}

/// An in-memory emulation of any number of deployed `VotingSystem`
/// contracts, sharing one clock. Clones share the same state.
///
/// Calls can be made to fail with [`MockVotingSystem::fail`] and
/// [`MockVotingSystem::fail_vote`]; reads then fail with `ContractError::Read`
/// and writes with `ContractError::Write`, as an unreachable node would.
#[derive(Debug, Clone, Default)]
pub struct MockVotingSystem {
    inner: Arc<RwLock<MockChainInner>>,
}

impl MockVotingSystem {
    pub fn new(now: u64) -> Self {
        let system = Self::default();
        system.set_time(now);
        system
    }

    fn with_read<C, T>(&self, callback: C) -> T
    where
        C: FnOnce(RwLockReadGuard<MockChainInner>) -> T,
    {
        let lock = self.inner.read().unwrap_or_else(|err| {
            panic!("MockVotingSystem is poisoned: {err:?}");
        });
        callback(lock)
    }

    fn with_write<C, T>(&self, callback: C) -> T
    where
        C: FnOnce(RwLockWriteGuard<MockChainInner>) -> T,
    {
        let lock = self.inner.write().unwrap_or_else(|err| {
            panic!("MockVotingSystem is poisoned: {err:?}");
        });
        callback(lock)
    }

    /// Deploy a fresh contract owned by `owner` at `address`.
    pub fn deploy(&self, owner: Address, address: Address) {
        self.with_write(|mut inner| {
            inner.deployments.insert(address, MockDeployment {
                owner,
                votes: BTreeMap::new(),
            });
        });
    }

    pub fn now(&self) -> u64 {
        self.with_read(|inner| inner.now)
    }

    pub fn set_time(&self, now: u64) {
        self.with_write(|mut inner| inner.now = now);
    }

    pub fn advance_time(&self, seconds: u64) {
        self.with_write(|mut inner| inner.now = inner.now.saturating_add(seconds));
    }

    /// Make every call to `method` fail until cleared.
    pub fn fail(&self, method: &'static str) {
        self.with_write(|mut inner| {
            inner.failures.insert(FailureKey {
                method,
                vote_id: None,
            });
        });
    }

    /// Make calls to `method` concerning one vote fail until cleared.
    pub fn fail_vote(&self, method: &'static str, vote_id: VoteId) {
        self.with_write(|mut inner| {
            inner.failures.insert(FailureKey {
                method,
                vote_id: Some(vote_id),
            });
        });
    }

    pub fn clear_failures(&self) {
        self.with_write(|mut inner| inner.failures.clear());
    }

    /// Set the on-chain open flag of a vote, as an owner-only close would.
    pub fn set_open(&self, contract: Address, vote_id: VoteId, open: bool) {
        self.with_write(|mut inner| {
            if let Some(vote) = inner
                .deployments
                .get_mut(&contract)
                .and_then(|deployment| deployment.votes.get_mut(&vote_id))
            {
                vote.open = open;
            }
        });
    }

    /// Voters registered on-chain for a vote through `addVoter`.
    pub fn added_voters(&self, contract: Address, vote_id: VoteId) -> Vec<(Address, GroupId)> {
        self.with_read(|inner| {
            inner
                .deployments
                .get(&contract)
                .and_then(|deployment| deployment.votes.get(&vote_id))
                .map(|vote| vote.added_voters.clone())
                .unwrap_or_default()
        })
    }

    /// Number of votes created on a contract.
    pub fn vote_count(&self, contract: Address) -> usize {
        self.with_read(|inner| {
            inner
                .deployments
                .get(&contract)
                .map(|deployment| deployment.votes.len())
                .unwrap_or_default()
        })
    }

    pub fn binder(&self, caller: Address) -> MockBinder {
        MockBinder {
            system: self.clone(),
            caller,
        }
    }

    fn check_failure(
        inner: &MockChainInner,
        method: &'static str,
        vote_id: Option<VoteId>,
        write: bool,
    ) -> ContractResult<()> {
        let injected = inner.failures.contains(&FailureKey {
            method,
            vote_id: None,
        }) || (vote_id.is_some() && inner.failures.contains(&FailureKey { method, vote_id }));

        if !injected {
            return Ok(());
        }

        let reason = "injected failure".to_string();

        if write {
            Err(ContractError::Write { method, reason })
        } else {
            Err(ContractError::Read { method, reason })
        }
    }

    fn read<C, T>(
        &self,
        contract: Address,
        method: &'static str,
        vote_id: Option<VoteId>,
        callback: C,
    ) -> ContractResult<T>
    where
        C: FnOnce(&MockDeployment, u64) -> ContractResult<T>,
    {
        self.with_read(|inner| {
            Self::check_failure(&inner, method, vote_id, false)?;

            let deployment = inner.deployments.get(&contract).ok_or(ContractError::Read {
                method,
                reason: format!("no contract deployed at {contract}"),
            })?;

            callback(deployment, inner.now)
        })
    }

    /// Run a state-changing call. A `Err(reason)` from the callback reverts
    /// the transaction: the state is left untouched but a hash is still
    /// consumed, as it would be for a mined transaction.
    fn transact<C>(
        &self,
        contract: Address,
        caller: Address,
        method: &'static str,
        vote_id: Option<VoteId>,
        callback: C,
    ) -> ContractResult<TxOutcome>
    where
        C: FnOnce(&mut MockDeployment, u64) -> Result<(), String>,
    {
        self.with_write(|mut inner| {
            Self::check_failure(&inner, method, vote_id, true)?;

            inner.tx_count += 1;
            let tx_hash = TxHash::from(U256::from(inner.tx_count));
            let now = inner.now;

            let res = match inner.deployments.get_mut(&contract) {
                Some(deployment) if deployment.owner != caller && method != "castVote" => {
                    Err("caller is not the owner".to_string())
                },
                Some(deployment) => callback(deployment, now),
                None => Err("no contract".to_string()),
            };

            match res {
                Ok(()) => Ok(TxOutcome { tx_hash }),
                Err(_) => Err(ContractError::Reverted {
                    method,
                    tx_hash: tx_hash.to_string(),
                }),
            }
        })
    }
}

fn find_vote<'a>(deployment: &'a MockDeployment, vote_id: VoteId) -> Option<&'a MockVote> {
    deployment.votes.get(&vote_id)
}

fn revert(method: &'static str, reason: &str) -> ContractError {
    ContractError::Read {
        method,
        reason: format!("execution reverted: {reason}"),
    }
}

/// Binds contract handles that act as `caller`.
#[derive(Debug, Clone)]
pub struct MockBinder {
    system: MockVotingSystem,
    caller: Address,
}

impl ContractBinder for MockBinder {
    type Contract = MockContract;

    fn bind(&self, address: Address) -> MockContract {
        MockContract {
            system: self.system.clone(),
            address,
            caller: self.caller,
        }
    }
}

/// A handle to one deployed mock contract.
#[derive(Debug, Clone)]
pub struct MockContract {
    system: MockVotingSystem,
    address: Address,
    caller: Address,
}

#[async_trait]
impl VotingContract for MockContract {
    fn address(&self) -> Address {
        self.address
    }

    async fn create_vote(&self, vote: &NewVote) -> ContractResult<TxOutcome> {
        let vote = vote.clone();

        self.system.transact(
            self.address,
            self.caller,
            "createVote",
            Some(vote.id),
            move |deployment, _| {
                if deployment.votes.contains_key(&vote.id) {
                    return Err("vote already exists".to_string());
                }

                if vote.options.is_empty() {
                    return Err("no options".to_string());
                }

                deployment.votes.insert(vote.id, MockVote {
                    name: vote.name,
                    start_time: vote.start_time,
                    duration: vote.duration,
                    group: vote.group,
                    open: true,
                    options: vote
                        .options
                        .into_iter()
                        .map(|name| OptionTally::new(name, 0))
                        .collect(),
                    voters: HashSet::new(),
                    added_voters: Vec::new(),
                });

                Ok(())
            },
        )
    }

    async fn cast_vote(&self, vote_id: VoteId, option_index: u64) -> ContractResult<TxOutcome> {
        let caller = self.caller;

        self.system.transact(
            self.address,
            caller,
            "castVote",
            Some(vote_id),
            move |deployment, now| {
                let vote = deployment
                    .votes
                    .get_mut(&vote_id)
                    .ok_or("vote doesn't exist")?;

                if !vote.is_open(now) {
                    return Err("vote is closed".to_string());
                }

                if vote.voters.contains(&caller) {
                    return Err("already voted".to_string());
                }

                let option = usize::try_from(option_index)
                    .ok()
                    .and_then(|index| vote.options.get_mut(index))
                    .ok_or("invalid option")?;

                option.count += 1;
                vote.voters.insert(caller);

                Ok(())
            },
        )
    }

    async fn add_voter(
        &self,
        vote_id: VoteId,
        voter: Address,
        group: GroupId,
    ) -> ContractResult<TxOutcome> {
        self.system.transact(
            self.address,
            self.caller,
            "addVoter",
            Some(vote_id),
            move |deployment, _| {
                let vote = deployment
                    .votes
                    .get_mut(&vote_id)
                    .ok_or("vote doesn't exist")?;

                if !vote.added_voters.contains(&(voter, group)) {
                    vote.added_voters.push((voter, group));
                }

                Ok(())
            },
        )
    }

    async fn get_vote(&self, vote_id: VoteId) -> ContractResult<VoteInfo> {
        self.system
            .read(self.address, "getVote", Some(vote_id), |deployment, _| {
                // Unknown ids read as the zero-valued struct.
                Ok(match find_vote(deployment, vote_id) {
                    Some(vote) => VoteInfo {
                        id: vote_id,
                        name: vote.name.clone(),
                        start_time: vote.start_time,
                        duration: vote.duration,
                        options_count: vote.options.len() as u64,
                        open: vote.open,
                    },
                    None => VoteInfo {
                        id: VoteId(0),
                        name: String::new(),
                        start_time: 0,
                        duration: 0,
                        options_count: 0,
                        open: false,
                    },
                })
            })
    }

    async fn get_option_details(&self, vote_id: VoteId, index: u64) -> ContractResult<OptionTally> {
        const METHOD: &str = "getOptionDetails";

        self.system
            .read(self.address, METHOD, Some(vote_id), |deployment, _| {
                find_vote(deployment, vote_id)
                    .and_then(|vote| vote.options.get(usize::try_from(index).ok()?))
                    .cloned()
                    .ok_or_else(|| revert(METHOD, "invalid option"))
            })
    }

    async fn get_options_count(&self, vote_id: VoteId) -> ContractResult<u64> {
        self.system
            .read(self.address, "getOptionsCount", Some(vote_id), |deployment, _| {
                Ok(find_vote(deployment, vote_id)
                    .map(|vote| vote.options.len() as u64)
                    .unwrap_or_default())
            })
    }

    async fn get_vote_results(
        &self,
        vote_id: VoteId,
        options_count: u64,
    ) -> ContractResult<Vec<u64>> {
        const METHOD: &str = "getVoteResults";

        self.system
            .read(self.address, METHOD, Some(vote_id), |deployment, _| {
                let vote =
                    find_vote(deployment, vote_id).ok_or_else(|| revert(METHOD, "no vote"))?;

                if options_count > vote.options.len() as u64 {
                    return Err(revert(METHOD, "options count out of range"));
                }

                Ok(vote
                    .options
                    .iter()
                    .take(options_count as usize)
                    .map(|option| option.count)
                    .collect())
            })
    }

    async fn get_accessible_votes(&self, group: GroupId) -> ContractResult<Vec<AccessibleVote>> {
        self.system
            .read(self.address, "getAccessibleVotes", None, |deployment, _| {
                Ok(deployment
                    .votes
                    .iter()
                    .filter(|(_, vote)| vote.group == group)
                    .map(|(id, vote)| AccessibleVote {
                        id: *id,
                        name: vote.name.clone(),
                        start_time: vote.start_time,
                        duration: vote.duration,
                        open: vote.open,
                    })
                    .collect())
            })
    }

    async fn has_voted(&self, vote_id: VoteId, voter: Address) -> ContractResult<bool> {
        self.system
            .read(self.address, "hasVoted", Some(vote_id), |deployment, _| {
                Ok(find_vote(deployment, vote_id)
                    .map(|vote| vote.voters.contains(&voter))
                    .unwrap_or_default())
            })
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::fixtures::*, assertor::*};

    fn setup() -> (MockVotingSystem, MockContract) {
        let system = MockVotingSystem::new(NOW);
        system.deploy(MANAGER, CONTRACT);

        let contract = system.binder(MANAGER).bind(CONTRACT);

        (system, contract)
    }

    #[tokio::test]
    async fn voting_updates_tallies() {
        let (system, manager) = setup();
        manager.create_vote(&new_vote(1, &["yes", "no"])).await.unwrap();

        let alice = system.binder(ALICE).bind(CONTRACT);
        alice.cast_vote(VoteId(1), 1).await.unwrap();

        assert_that!(manager.get_vote_results(VoteId(1), 2).await.unwrap())
            .is_equal_to(vec![0, 1]);
        assert_that!(manager.has_voted(VoteId(1), ALICE).await.unwrap()).is_true();

        // Second ballot from the same account reverts.
        assert!(matches!(
            alice.cast_vote(VoteId(1), 0).await,
            Err(ContractError::Reverted { method: "castVote", .. })
        ));
    }

    #[tokio::test]
    async fn closed_votes_reject_ballots() {
        let (system, manager) = setup();
        manager.create_vote(&new_vote(1, &["yes", "no"])).await.unwrap();

        system.advance_time(DAY * 2);
        assert_that!(system.now()).is_equal_to(NOW + DAY * 2);

        assert!(matches!(
            manager.cast_vote(VoteId(1), 0).await,
            Err(ContractError::Reverted { .. })
        ));

        // Rewinding the clock reopens the window.
        system.set_time(NOW);
        manager.cast_vote(VoteId(1), 0).await.unwrap();
    }

    #[tokio::test]
    async fn only_the_owner_creates_votes() {
        let (system, _) = setup();
        let alice = system.binder(ALICE).bind(CONTRACT);

        assert!(matches!(
            alice.create_vote(&new_vote(1, &["yes"])).await,
            Err(ContractError::Reverted { .. })
        ));
        assert_that!(system.vote_count(CONTRACT)).is_equal_to(0);
    }

    #[tokio::test]
    async fn unknown_votes_read_as_zero() {
        let (_, manager) = setup();
        let info = manager.get_vote(VoteId(9)).await.unwrap();

        assert_that!(info.is_missing(VoteId(9))).is_true();
    }

    #[tokio::test]
    async fn injected_failures() {
        let (system, manager) = setup();
        manager.create_vote(&new_vote(1, &["yes"])).await.unwrap();
        manager.create_vote(&new_vote(2, &["yes"])).await.unwrap();

        system.fail_vote("getVote", VoteId(2));

        assert_that!(manager.get_vote(VoteId(1)).await).is_ok();
        assert!(matches!(
            manager.get_vote(VoteId(2)).await,
            Err(ContractError::Read { method: "getVote", .. })
        ));

        system.fail("createVote");
        assert!(matches!(
            manager.create_vote(&new_vote(3, &["yes"])).await,
            Err(ContractError::Write { .. })
        ));

        system.clear_failures();
        assert_that!(manager.get_vote(VoteId(2)).await).is_ok();
    }
}
