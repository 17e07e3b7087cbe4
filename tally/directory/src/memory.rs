use {
    crate::{DirectoryError, DirectoryResult, DirectoryStore},
    async_trait::async_trait,
    std::{
        collections::{BTreeMap, HashMap},
        sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
    },
    tally_types::{Address, GroupId, ManagerRecord, ParticipationEntry, VoteCounter},
};

struct MemDirectoryInner {
    managers: BTreeMap<Address, ManagerRecord>,
    participation: HashMap<Address, Vec<ParticipationEntry>>,
    /// `None` until the counter is created.
    counter: Option<u64>,
}

/// A `DirectoryStore` that lives in memory. Clones share the same data.
pub struct MemDirectory {
    inner: Arc<RwLock<MemDirectoryInner>>,
}

impl MemDirectory {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemDirectoryInner {
                managers: BTreeMap::new(),
                participation: HashMap::new(),
                counter: None,
            })),
        }
    }

    fn with_read<C, T>(&self, callback: C) -> T
    where
        C: FnOnce(RwLockReadGuard<MemDirectoryInner>) -> T,
    {
        let lock = self.inner.read().unwrap_or_else(|err| {
            panic!("MemDirectory is poisoned: {err:?}");
        });
        callback(lock)
    }

    fn with_write<C, T>(&self, callback: C) -> T
    where
        C: FnOnce(RwLockWriteGuard<MemDirectoryInner>) -> T,
    {
        let lock = self.inner.write().unwrap_or_else(|err| {
            panic!("MemDirectory is poisoned: {err:?}");
        });
        callback(lock)
    }
}

impl Default for MemDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemDirectory {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl DirectoryStore for MemDirectory {
    async fn manager(&self, address: &Address) -> DirectoryResult<Option<ManagerRecord>> {
        Ok(self.with_read(|inner| inner.managers.get(address).cloned()))
    }

    async fn managers(&self) -> DirectoryResult<Vec<ManagerRecord>> {
        Ok(self.with_read(|inner| inner.managers.values().cloned().collect()))
    }

    async fn put_manager(&self, record: &ManagerRecord) -> DirectoryResult<()> {
        self.with_write(|mut inner| {
            inner.managers.insert(record.address, record.clone());
        });

        Ok(())
    }

    async fn add_group_member(
        &self,
        manager: &Address,
        group: GroupId,
        member: Address,
    ) -> DirectoryResult<()> {
        self.with_write(|mut inner| {
            let record = inner
                .managers
                .get_mut(manager)
                .ok_or(DirectoryError::ManagerNotFound { address: *manager })?;

            record.add_member(group, member);

            Ok(())
        })
    }

    async fn participation(&self, address: &Address) -> DirectoryResult<Vec<ParticipationEntry>> {
        Ok(self.with_read(|inner| {
            inner
                .participation
                .get(address)
                .cloned()
                .unwrap_or_default()
        }))
    }

    async fn append_participation(
        &self,
        address: &Address,
        entry: &ParticipationEntry,
    ) -> DirectoryResult<()> {
        self.with_write(|mut inner| {
            let entries = inner.participation.entry(*address).or_default();
            if !entries.contains(entry) {
                entries.push(entry.clone());
            }
        });

        Ok(())
    }

    async fn vote_counter(&self) -> DirectoryResult<Option<VoteCounter>> {
        Ok(self.with_read(|inner| inner.counter.map(|current_id| VoteCounter { current_id })))
    }

    async fn create_vote_counter(&self) -> DirectoryResult<bool> {
        Ok(self.with_write(|mut inner| {
            if inner.counter.is_some() {
                return false;
            }

            inner.counter = Some(0);

            true
        }))
    }

    async fn increment_vote_counter(&self) -> DirectoryResult<u64> {
        self.with_write(|mut inner| {
            let counter = inner
                .counter
                .as_mut()
                .ok_or(DirectoryError::CounterUninitialized)?;

            *counter += 1;

            Ok(*counter)
        })
    }
}
