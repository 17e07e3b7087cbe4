use {
    crate::{
        ClientError, ClientResult, DEFAULT_MAX_CONCURRENCY, ReconcileError, Reconciler,
        Reconciliation, VoteResults, fetch_results,
    },
    serde::Serialize,
    std::collections::HashSet,
    tally_contract::{ContractBinder, TxOutcome, VotingContract},
    tally_directory::{AccountRole, Directory, DirectoryResult, DirectoryStore},
    tally_types::{Address, CreateVote, GroupId, ParticipationEntry, VoteId, check_option_index},
};

/// An account resolved against the directory, with a handle to the contract
/// it talks to.
pub struct Session<C> {
    pub role: AccountRole,
    pub contract: C,
}

impl<C> Session<C> {
    pub fn address(&self) -> Address {
        self.role.address()
    }
}

/// A vote that was created on-chain and indexed off-chain.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CreatedVote {
    pub id: VoteId,
    pub outcome: TxOutcome,
    /// Accounts whose participation index now lists the vote.
    pub participants: Vec<Address>,
}

/// Manager and voter operations, combining the off-chain directory with the
/// on-chain contract.
pub struct TallyClient<S, B> {
    directory: Directory<S>,
    binder: B,
    max_concurrency: usize,
}

impl<S, B> TallyClient<S, B>
where
    S: DirectoryStore,
    B: ContractBinder,
{
    pub fn new(directory: Directory<S>, binder: B) -> Self {
        Self {
            directory,
            binder,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn directory(&self) -> &Directory<S> {
        &self.directory
    }

    pub fn binder(&self) -> &B {
        &self.binder
    }

    /// Resolve `account` to a manager or voter and bind its contract.
    pub async fn session(&self, account: Address) -> ClientResult<Session<B::Contract>> {
        let role = self.directory.resolve_account(&account).await?;
        let contract = self.binder.bind(role.contract());

        tracing::debug!(
            %account,
            contract = %role.contract(),
            manager = role.is_manager(),
            "Opened session"
        );

        Ok(Session { role, contract })
    }

    async fn manager_contract(&self, manager: Address) -> ClientResult<B::Contract> {
        match self.directory.store().manager(&manager).await? {
            Some(record) => Ok(self.binder.bind(record.contract_address)),
            None => Err(ClientError::NotManager { address: manager }),
        }
    }

    // ---------------------------------- manager ----------------------------------

    /// Validate the request, reserve an id, create the vote on-chain and list
    /// it in the participation index of the manager and every member of the
    /// vote's group.
    ///
    /// Ids are reserved before the transaction is sent. If it fails the id is
    /// never reused, so ids stay unique and increasing but may have gaps. If
    /// the vote is created but can't be indexed, `IndexingFailed` names it.
    pub async fn create_vote(
        &self,
        manager: Address,
        request: CreateVote,
        now: u64,
    ) -> ClientResult<CreatedVote> {
        let contract = self.manager_contract(manager).await?;
        let validated = request.validate(now)?;
        let id = self.directory.allocate_vote_id().await?;
        let vote = validated.with_id(id);

        let outcome = contract.create_vote(&vote).await.inspect_err(|err| {
            tracing::warn!(vote_id = %id, %err, "Failed to create vote; id is burned");
        })?;

        tracing::info!(
            vote_id = %id,
            name = %vote.name,
            group = %vote.group,
            tx_hash = %outcome.tx_hash,
            "Created vote"
        );

        let participants = self
            .index_vote(manager, &vote.name, vote.group, id)
            .await
            .map_err(|source| {
                tracing::error!(
                    vote_id = %id,
                    tx_hash = %outcome.tx_hash,
                    %source,
                    "Vote created on-chain but not indexed"
                );

                ClientError::IndexingFailed {
                    id,
                    tx_hash: outcome.tx_hash.to_string(),
                    source,
                }
            })?;

        Ok(CreatedVote {
            id,
            outcome,
            participants,
        })
    }

    /// List a vote in the participation index of the manager and every member
    /// of `group`. Returns the accounts now listing it.
    async fn index_vote(
        &self,
        manager: Address,
        name: &str,
        group: GroupId,
        id: VoteId,
    ) -> DirectoryResult<Vec<Address>> {
        let participants = self.directory.users_by_group(&manager, group).await?;

        self.directory
            .record_participation(&participants, &ParticipationEntry::new(id, name))
            .await?;

        Ok(participants)
    }

    /// Add an address to one of the manager's groups.
    pub async fn register_voter(
        &self,
        manager: Address,
        group: GroupId,
        voter: Address,
    ) -> ClientResult<()> {
        if !self.directory.is_manager(&manager).await? {
            return Err(ClientError::NotManager { address: manager });
        }

        self.directory
            .add_group_member(&manager, group, voter)
            .await?;

        Ok(())
    }

    /// Give one address access to a single vote: register it on-chain and list
    /// the vote in its participation index.
    pub async fn grant_vote_access(
        &self,
        manager: Address,
        vote_id: VoteId,
        voter: Address,
        group: GroupId,
    ) -> ClientResult<TxOutcome> {
        let contract = self.manager_contract(manager).await?;

        let info = contract.get_vote(vote_id).await?;
        if info.is_missing(vote_id) {
            return Err(ReconcileError::VoteNotFound { id: vote_id }.into());
        }

        let outcome = contract.add_voter(vote_id, voter, group).await?;

        self.directory
            .record_participation(&[voter], &ParticipationEntry::new(vote_id, info.name))
            .await?;

        tracing::info!(vote_id = %vote_id, %voter, %group, "Granted vote access");

        Ok(outcome)
    }

    // ----------------------------------- voter -----------------------------------

    /// Cast a ballot. The vote is reconciled first so that closed votes,
    /// invalid options and repeat ballots are rejected without sending a
    /// transaction.
    pub async fn cast_vote(
        &self,
        session: &Session<B::Contract>,
        vote_id: VoteId,
        option: u64,
        now: u64,
    ) -> ClientResult<TxOutcome> {
        let status = Reconciler::new(&session.contract)
            .reconcile_vote(vote_id, now)
            .await?;

        if !status.is_open {
            return Err(ClientError::VoteClosed { id: vote_id });
        }

        check_option_index(option, status.options.len() as u64)?;

        let voter = session.address();
        if session.contract.has_voted(vote_id, voter).await? {
            return Err(ClientError::AlreadyVoted { id: vote_id, voter });
        }

        let outcome = session.contract.cast_vote(vote_id, option).await?;

        tracing::info!(vote_id = %vote_id, %voter, option, "Cast vote");

        Ok(outcome)
    }

    /// Every vote listed in the account's participation index.
    pub async fn my_votes(
        &self,
        session: &Session<B::Contract>,
        now: u64,
    ) -> ClientResult<Reconciliation> {
        let entries = self.directory.participation(&session.address()).await?;

        // The index may list an id twice under different names.
        let mut seen = HashSet::new();
        let ids = entries
            .into_iter()
            .map(|entry| entry.vote_id)
            .filter(|id| seen.insert(*id))
            .collect::<Vec<_>>();

        Ok(self.reconciler(&session.contract).reconcile(ids, now).await)
    }

    /// Every vote the contract lists for a group.
    pub async fn group_votes(
        &self,
        session: &Session<B::Contract>,
        group: GroupId,
        now: u64,
    ) -> ClientResult<Reconciliation> {
        let ids = session
            .contract
            .get_accessible_votes(group)
            .await?
            .into_iter()
            .map(|vote| vote.id)
            .collect::<Vec<_>>();

        Ok(self.reconciler(&session.contract).reconcile(ids, now).await)
    }

    pub async fn vote_results(
        &self,
        session: &Session<B::Contract>,
        vote_id: VoteId,
    ) -> ClientResult<VoteResults> {
        Ok(fetch_results(&session.contract, vote_id).await?)
    }

    fn reconciler<'a>(&self, contract: &'a B::Contract) -> Reconciler<'a, B::Contract> {
        Reconciler::new(contract).with_max_concurrency(self.max_concurrency)
    }
}
