use {
    crate::{Address, GroupId, VoteId},
    serde::{Deserialize, Serialize},
    std::collections::BTreeMap,
};

/// An account that deployed its own voting contract, together with the voter
/// groups it administers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ManagerRecord {
    pub address: Address,
    pub contract_address: Address,
    pub groups: BTreeMap<GroupId, Vec<Address>>,
}

impl ManagerRecord {
    pub fn new(address: Address, contract_address: Address) -> Self {
        Self {
            address,
            contract_address,
            groups: BTreeMap::new(),
        }
    }

    pub fn members(&self, group: GroupId) -> &[Address] {
        self.groups.get(&group).map(Vec::as_slice).unwrap_or_default()
    }

    /// Return the first group, in ascending id order, that lists `address`.
    pub fn group_of(&self, address: &Address) -> Option<GroupId> {
        self.groups
            .iter()
            .find(|(_, members)| members.contains(address))
            .map(|(group, _)| *group)
    }

    /// Add a member with set-union semantics. Returns `false` if the address
    /// was already in the group.
    pub fn add_member(&mut self, group: GroupId, address: Address) -> bool {
        let members = self.groups.entry(group).or_default();

        if members.contains(&address) {
            return false;
        }

        members.push(address);

        true
    }
}

/// One entry of an account's participation index: a vote the account should
/// be able to see.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParticipationEntry {
    pub vote_id: VoteId,
    pub vote_name: String,
}

impl ParticipationEntry {
    pub fn new<N>(vote_id: VoteId, vote_name: N) -> Self
    where
        N: Into<String>,
    {
        Self {
            vote_id,
            vote_name: vote_name.into(),
        }
    }
}

/// The global vote id counter.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteCounter {
    pub current_id: u64,
}
