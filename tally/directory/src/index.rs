use {
    serde::{Deserialize, Serialize},
    std::collections::{BTreeMap, HashMap},
    tally_types::{Address, GroupId, ManagerRecord},
};

/// One (manager, group) pair an account belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Membership {
    pub manager: Address,
    pub contract: Address,
    pub group: GroupId,
}

/// What an account is to the directory, and the contract it talks to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum AccountRole {
    Manager {
        address: Address,
        contract: Address,
    },
    Voter {
        address: Address,
        manager: Address,
        contract: Address,
        group: GroupId,
    },
}

impl AccountRole {
    pub fn address(&self) -> Address {
        match self {
            AccountRole::Manager { address, .. } | AccountRole::Voter { address, .. } => *address,
        }
    }

    pub fn contract(&self) -> Address {
        match self {
            AccountRole::Manager { contract, .. } | AccountRole::Voter { contract, .. } => {
                *contract
            },
        }
    }

    pub fn is_manager(&self) -> bool {
        matches!(self, AccountRole::Manager { .. })
    }
}

/// An inverted index from member address to the groups listing it, built from
/// a snapshot of every manager record.
///
/// Resolution is deterministic: memberships are ordered by manager address,
/// then group id, so an address listed in several places always resolves to
/// the same one.
#[derive(Debug, Clone, Default)]
pub struct MembershipIndex {
    managers: BTreeMap<Address, Address>,
    members: HashMap<Address, Vec<Membership>>,
}

impl MembershipIndex {
    pub fn new<I>(records: I) -> Self
    where
        I: IntoIterator<Item = ManagerRecord>,
    {
        let mut index = Self::default();

        for record in records {
            for (group, members) in &record.groups {
                for member in members {
                    index.members.entry(*member).or_default().push(Membership {
                        manager: record.address,
                        contract: record.contract_address,
                        group: *group,
                    });
                }
            }

            index
                .managers
                .insert(record.address, record.contract_address);
        }

        for memberships in index.members.values_mut() {
            memberships.sort_by_key(|membership| (membership.manager, membership.group));
            memberships.dedup();
        }

        index
    }

    /// Contract deployed by a manager.
    pub fn manager_contract(&self, address: &Address) -> Option<Address> {
        self.managers.get(address).copied()
    }

    /// Every group listing `address`, in resolution order.
    pub fn memberships(&self, address: &Address) -> &[Membership] {
        self.members
            .get(address)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Managers take precedence over group membership.
    pub fn resolve(&self, address: &Address) -> Option<AccountRole> {
        if let Some(contract) = self.manager_contract(address) {
            return Some(AccountRole::Manager {
                address: *address,
                contract,
            });
        }

        self.memberships(address)
            .first()
            .map(|membership| AccountRole::Voter {
                address: *address,
                manager: membership.manager,
                contract: membership.contract,
                group: membership.group,
            })
    }
}
