use {
    crate::{AccountRole, DirectoryError, DirectoryResult, DirectoryStore, MembershipIndex},
    std::collections::BTreeMap,
    tally_types::{Address, GroupId, ManagerRecord, ParticipationEntry, VoteId},
};

/// Typed operations over the off-chain directory.
#[derive(Debug, Clone)]
pub struct Directory<S> {
    store: S,
}

impl<S> Directory<S>
where
    S: DirectoryStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // --------------------------------- accounts ----------------------------------

    pub async fn is_manager(&self, address: &Address) -> DirectoryResult<bool> {
        Ok(self.store.manager(address).await?.is_some())
    }

    pub async fn manager(&self, address: &Address) -> DirectoryResult<ManagerRecord> {
        self.store
            .manager(address)
            .await?
            .ok_or(DirectoryError::ManagerNotFound { address: *address })
    }

    /// Record `address` as the manager of `contract`. Re-registering keeps the
    /// groups already on record.
    pub async fn register_manager(
        &self,
        address: Address,
        contract: Address,
    ) -> DirectoryResult<ManagerRecord> {
        let record = match self.store.manager(&address).await? {
            Some(mut existing) => {
                existing.contract_address = contract;
                existing
            },
            None => ManagerRecord::new(address, contract),
        };

        self.store.put_manager(&record).await?;

        tracing::info!(manager = %address, %contract, "Registered manager");

        Ok(record)
    }

    pub async fn add_group_member(
        &self,
        manager: &Address,
        group: GroupId,
        member: Address,
    ) -> DirectoryResult<()> {
        self.store.add_group_member(manager, group, member).await?;

        tracing::info!(%manager, %group, %member, "Added group member");

        Ok(())
    }

    /// Every group a manager administers, with its members.
    pub async fn group_addresses(
        &self,
        manager: &Address,
    ) -> DirectoryResult<BTreeMap<GroupId, Vec<Address>>> {
        Ok(self.manager(manager).await?.groups)
    }

    /// Members of one of a manager's groups. Empty if the group doesn't exist.
    pub async fn group_members(
        &self,
        manager: &Address,
        group: GroupId,
    ) -> DirectoryResult<Vec<Address>> {
        Ok(self.manager(manager).await?.members(group).to_vec())
    }

    /// Everyone who should see a vote created for `group`: the manager first,
    /// then the group's members, without duplicates.
    pub async fn users_by_group(
        &self,
        manager: &Address,
        group: GroupId,
    ) -> DirectoryResult<Vec<Address>> {
        let mut users = vec![*manager];

        for member in self.group_members(manager, group).await? {
            if !users.contains(&member) {
                users.push(member);
            }
        }

        Ok(users)
    }

    pub async fn membership_index(&self) -> DirectoryResult<MembershipIndex> {
        Ok(MembershipIndex::new(self.store.managers().await?))
    }

    /// Work out whether `address` is a manager or a voter, and which contract
    /// it talks to.
    pub async fn resolve_account(&self, address: &Address) -> DirectoryResult<AccountRole> {
        // Skip the full scan for managers.
        if let Some(record) = self.store.manager(address).await? {
            return Ok(AccountRole::Manager {
                address: *address,
                contract: record.contract_address,
            });
        }

        self.membership_index()
            .await?
            .resolve(address)
            .ok_or(DirectoryError::NotFound { address: *address })
    }

    // ------------------------------- participation -------------------------------

    pub async fn participation(
        &self,
        address: &Address,
    ) -> DirectoryResult<Vec<ParticipationEntry>> {
        self.store.participation(address).await
    }

    /// Add a vote to the participation index of each of `users`.
    pub async fn record_participation(
        &self,
        users: &[Address],
        entry: &ParticipationEntry,
    ) -> DirectoryResult<()> {
        for user in users {
            self.store.append_participation(user, entry).await?;
        }

        tracing::debug!(
            vote_id = %entry.vote_id,
            users = users.len(),
            "Recorded participation"
        );

        Ok(())
    }

    // --------------------------------- vote ids ----------------------------------

    /// Create the counter if it doesn't exist. Returns whether it was created.
    pub async fn initialize_vote_counter(&self) -> DirectoryResult<bool> {
        let created = self.store.create_vote_counter().await?;

        if created {
            tracing::info!("Initialized vote id counter");
        }

        Ok(created)
    }

    /// The id most recently handed out, zero before the first vote.
    pub async fn get_current_vote_id(&self) -> DirectoryResult<VoteId> {
        self.store
            .vote_counter()
            .await?
            .map(|counter| VoteId(counter.current_id))
            .ok_or(DirectoryError::CounterUninitialized)
    }

    /// Read the counter, then bump it in a separate step, returning the
    /// successor of the value that was read.
    ///
    /// The read and the write are not atomic: two callers that interleave
    /// between them get the same id. Use [`Directory::allocate_vote_id`]
    /// unless this exact behavior is wanted.
    pub async fn fetch_and_update_vote_id(&self) -> DirectoryResult<VoteId> {
        let current = self.get_current_vote_id().await?;

        self.store.increment_vote_counter().await?;

        Ok(VoteId(current.into_inner() + 1))
    }

    /// Atomically reserve a fresh vote id. Ids are strictly increasing and
    /// never handed out twice, even to concurrent callers. An id reserved for
    /// a vote that then fails to be created is not reused.
    pub async fn allocate_vote_id(&self) -> DirectoryResult<VoteId> {
        let id = VoteId(self.store.increment_vote_counter().await?);

        tracing::info!(vote_id = %id, "Allocated vote id");

        Ok(id)
    }
}
