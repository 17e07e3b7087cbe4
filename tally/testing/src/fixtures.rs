use {
    crate::{MockBinder, MockVotingSystem},
    tally_contract::{ContractBinder, VotingContract},
    tally_directory::{Directory, MemDirectory},
    tally_types::{Address, GroupId, NewVote, VoteId},
};

pub const MANAGER: Address = Address::repeat_byte(0xaa);
pub const CONTRACT: Address = Address::repeat_byte(0xcc);
pub const ALICE: Address = Address::repeat_byte(0x01);
pub const BOB: Address = Address::repeat_byte(0x02);
pub const CHARLIE: Address = Address::repeat_byte(0x03);

pub const GROUP: GroupId = GroupId(1);

pub const DAY: u64 = 24 * 60 * 60;

/// Fixed wall-clock time used across tests, 2024-05-01T00:00:00Z.
pub const NOW: u64 = 1_714_521_600;

/// A one-day vote for `GROUP` that started at `NOW`.
pub fn new_vote(id: u64, options: &[&str]) -> NewVote {
    NewVote {
        id: VoteId(id),
        name: format!("vote {id}"),
        start_time: NOW,
        duration: DAY,
        group: GROUP,
        options: options.iter().map(|option| option.to_string()).collect(),
    }
}

/// A deployed contract owned by `MANAGER`, and a directory in which `MANAGER`
/// is registered with `ALICE` and `BOB` in `GROUP`.
pub struct TestSuite {
    pub system: MockVotingSystem,
    pub directory: Directory<MemDirectory>,
}

impl TestSuite {
    pub async fn new() -> Self {
        let system = MockVotingSystem::new(NOW);
        system.deploy(MANAGER, CONTRACT);

        let directory = Directory::new(MemDirectory::new());

        directory
            .register_manager(MANAGER, CONTRACT)
            .await
            .expect("failed to register manager");

        for member in [ALICE, BOB] {
            directory
                .add_group_member(&MANAGER, GROUP, member)
                .await
                .expect("failed to add group member");
        }

        directory
            .initialize_vote_counter()
            .await
            .expect("failed to initialize vote counter");

        Self { system, directory }
    }

    pub fn binder(&self, caller: Address) -> MockBinder {
        self.system.binder(caller)
    }

    /// Create a vote directly on the mock contract, bypassing the directory.
    /// `tallies[i]` ballots are cast for option `i`, each from its own
    /// synthetic account.
    pub async fn seed_vote(&self, vote: NewVote, tallies: &[u64]) {
        let id = vote.id;
        let manager = self.binder(MANAGER).bind(CONTRACT);

        manager
            .create_vote(&vote)
            .await
            .expect("failed to seed vote");

        for (index, count) in tallies.iter().enumerate() {
            for n in 0..*count {
                let [hi, lo] = u16::try_from(n)
                    .expect("at most 65536 seeded ballots per option")
                    .to_be_bytes();
                let voter = Address::left_padding_from(&[index as u8 + 1, hi, lo, 0xfe]);

                self.binder(voter)
                    .bind(CONTRACT)
                    .cast_vote(id, index as u64)
                    .await
                    .expect("failed to seed ballot");
            }
        }
    }
}
