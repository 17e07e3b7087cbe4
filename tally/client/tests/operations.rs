use {
    assertor::*,
    async_trait::async_trait,
    tally_client::{ClientError, ReconcileError, Reconciler, TallyClient},
    tally_contract::{ContractBinder, ContractError, VotingContract},
    tally_directory::{
        Directory, DirectoryError, DirectoryResult, DirectoryStore, MemDirectory,
    },
    tally_testing::{
        ALICE, BOB, CHARLIE, CONTRACT, DAY, GROUP, MANAGER, MockBinder, NOW, TestSuite, new_vote,
        setup_tracing_subscriber,
    },
    tally_types::{
        Address, CreateVote, GroupId, ManagerRecord, NewVote, ParticipationEntry,
        ValidationError, VoteCounter, VoteId,
    },
};

fn client(suite: &TestSuite, caller: Address) -> TallyClient<MemDirectory, MockBinder> {
    TallyClient::new(suite.directory.clone(), suite.binder(caller))
}

fn request(name: &str, options: &[&str]) -> CreateVote {
    CreateVote {
        name: name.to_string(),
        start_time: None,
        duration_days: 1.0,
        group: GROUP,
        options: options.iter().map(|option| option.to_string()).collect(),
    }
}

#[tokio::test]
async fn creating_votes_indexes_the_group() {
    setup_tracing_subscriber(tracing::Level::DEBUG);

    let suite = TestSuite::new().await;
    let manager = client(&suite, MANAGER);

    let first = manager
        .create_vote(MANAGER, request("budget", &["yes", "no"]), NOW)
        .await
        .unwrap();
    let second = manager
        .create_vote(MANAGER, request("venue", &["hall", "park"]), NOW)
        .await
        .unwrap();

    assert_that!(first.id).is_equal_to(VoteId(1));
    assert_that!(second.id).is_equal_to(VoteId(2));
    assert_that!(first.participants.clone()).is_equal_to(vec![MANAGER, ALICE, BOB]);

    let alice_index = suite.directory.participation(&ALICE).await.unwrap();
    assert_that!(alice_index).is_equal_to(vec![
        ParticipationEntry::new(VoteId(1), "budget"),
        ParticipationEntry::new(VoteId(2), "venue"),
    ]);

    // Not a member of the group.
    assert_that!(suite.directory.participation(&CHARLIE).await.unwrap()).is_empty();

    let alice = client(&suite, ALICE);
    let session = alice.session(ALICE).await.unwrap();
    let mine = alice.my_votes(&session, NOW + 3_600).await.unwrap();

    assert_that!(mine.is_complete()).is_true();
    assert_that!(mine.votes.iter().map(|vote| vote.id).collect::<Vec<_>>())
        .is_equal_to(vec![VoteId(1), VoteId(2)]);
    assert_that!(mine.votes[0].is_open).is_true();
    assert_that!(mine.votes[0].time_left.to_string()).is_equal_to("23 hours".to_string());
    assert_that!(mine.votes[1].options[1].name.as_str()).is_equal_to("park");
}

#[tokio::test]
async fn only_managers_create_votes() {
    let suite = TestSuite::new().await;
    let alice = client(&suite, ALICE);

    assert!(matches!(
        alice.create_vote(ALICE, request("budget", &["yes"]), NOW).await,
        Err(ClientError::NotManager { address }) if address == ALICE
    ));

    assert!(matches!(
        alice.register_voter(ALICE, GROUP, CHARLIE).await,
        Err(ClientError::NotManager { .. })
    ));

    // Rejected before an id is reserved.
    assert_that!(suite.directory.get_current_vote_id().await.unwrap()).is_equal_to(VoteId(0));
}

#[tokio::test]
async fn invalid_requests_are_rejected_before_allocation() {
    let suite = TestSuite::new().await;
    let manager = client(&suite, MANAGER);

    let options = ["x"; 11];
    assert!(matches!(
        manager.create_vote(MANAGER, request("budget", &options), NOW).await,
        Err(ClientError::Validation(ValidationError::TooManyOptions { .. }))
    ));

    assert_that!(suite.directory.get_current_vote_id().await.unwrap()).is_equal_to(VoteId(0));
}

#[tokio::test]
async fn failed_transactions_burn_ids() {
    let suite = TestSuite::new().await;
    let manager = client(&suite, MANAGER);

    suite.system.fail("createVote");

    assert!(matches!(
        manager.create_vote(MANAGER, request("budget", &["yes"]), NOW).await,
        Err(ClientError::Contract(ContractError::Write { .. }))
    ));

    // Nothing was indexed for the failed vote.
    assert_that!(suite.directory.participation(&ALICE).await.unwrap()).is_empty();

    suite.system.clear_failures();

    let created = manager
        .create_vote(MANAGER, request("budget", &["yes"]), NOW)
        .await
        .unwrap();

    assert_that!(created.id).is_equal_to(VoteId(2));
}

/// Delegates to an in-memory store but can't write participation entries.
#[derive(Clone)]
struct UnindexableStore(MemDirectory);

#[async_trait]
impl DirectoryStore for UnindexableStore {
    async fn manager(&self, address: &Address) -> DirectoryResult<Option<ManagerRecord>> {
        self.0.manager(address).await
    }

    async fn managers(&self) -> DirectoryResult<Vec<ManagerRecord>> {
        self.0.managers().await
    }

    async fn put_manager(&self, record: &ManagerRecord) -> DirectoryResult<()> {
        self.0.put_manager(record).await
    }

    async fn add_group_member(
        &self,
        manager: &Address,
        group: GroupId,
        member: Address,
    ) -> DirectoryResult<()> {
        self.0.add_group_member(manager, group, member).await
    }

    async fn participation(&self, address: &Address) -> DirectoryResult<Vec<ParticipationEntry>> {
        self.0.participation(address).await
    }

    async fn append_participation(
        &self,
        _address: &Address,
        _entry: &ParticipationEntry,
    ) -> DirectoryResult<()> {
        Err(DirectoryError::Status {
            status: 503,
            message: "unavailable".to_string(),
        })
    }

    async fn vote_counter(&self) -> DirectoryResult<Option<VoteCounter>> {
        self.0.vote_counter().await
    }

    async fn create_vote_counter(&self) -> DirectoryResult<bool> {
        self.0.create_vote_counter().await
    }

    async fn increment_vote_counter(&self) -> DirectoryResult<u64> {
        self.0.increment_vote_counter().await
    }
}

#[tokio::test]
async fn votes_created_but_not_indexed_are_reported() {
    let suite = TestSuite::new().await;
    let manager = TallyClient::new(
        Directory::new(UnindexableStore(suite.directory.store().clone())),
        suite.binder(MANAGER),
    );

    let err = manager
        .create_vote(MANAGER, request("budget", &["yes", "no"]), NOW)
        .await
        .unwrap_err();

    match err {
        ClientError::IndexingFailed {
            id,
            tx_hash,
            source,
        } => {
            assert_that!(id).is_equal_to(VoteId(1));
            assert_that!(tx_hash.is_empty()).is_false();
            assert!(matches!(source, DirectoryError::Status { status: 503, .. }));
        },
        other => panic!("unexpected error: {other}"),
    }

    // The vote exists on-chain under the reported id, but nobody lists it.
    assert_that!(suite.system.vote_count(CONTRACT)).is_equal_to(1);
    assert_that!(suite.directory.participation(&ALICE).await.unwrap()).is_empty();

    let session = client(&suite, MANAGER).session(MANAGER).await.unwrap();
    let status = Reconciler::new(&session.contract)
        .reconcile_vote(VoteId(1), NOW)
        .await
        .unwrap();

    assert_that!(status.name.as_str()).is_equal_to("budget");
}

#[tokio::test]
async fn casting_ballots() {
    let suite = TestSuite::new().await;
    suite.seed_vote(new_vote(1, &["yes", "no"]), &[]).await;

    let alice = client(&suite, ALICE);
    let session = alice.session(ALICE).await.unwrap();

    alice.cast_vote(&session, VoteId(1), 1, NOW).await.unwrap();

    assert!(matches!(
        alice.cast_vote(&session, VoteId(1), 0, NOW).await,
        Err(ClientError::AlreadyVoted { voter, .. }) if voter == ALICE
    ));

    let bob = client(&suite, BOB);
    let session = bob.session(BOB).await.unwrap();

    assert!(matches!(
        bob.cast_vote(&session, VoteId(1), 2, NOW).await,
        Err(ClientError::Validation(ValidationError::OptionOutOfRange { index: 2, count: 2 }))
    ));

    assert!(matches!(
        bob.cast_vote(&session, VoteId(7), 0, NOW).await,
        Err(ClientError::Reconcile(ReconcileError::VoteNotFound { id })) if id == VoteId(7)
    ));

    let results = bob.vote_results(&session, VoteId(1)).await.unwrap();
    assert_that!(results.total()).is_equal_to(1);
    assert_that!(results.winner()).is_equal_to(Some(1));
}

#[tokio::test]
async fn closed_votes_reject_ballots() {
    let suite = TestSuite::new().await;

    suite
        .seed_vote(
            NewVote {
                start_time: NOW - 10 * DAY,
                duration: 5 * DAY,
                ..new_vote(1, &["yes", "no"])
            },
            &[],
        )
        .await;

    let alice = client(&suite, ALICE);
    let session = alice.session(ALICE).await.unwrap();

    let status = Reconciler::new(&session.contract)
        .reconcile_vote(VoteId(1), NOW)
        .await
        .unwrap();

    assert_that!(status.is_open).is_false();
    assert_that!(status.time_left.to_string()).is_equal_to("ended".to_string());

    assert!(matches!(
        alice.cast_vote(&session, VoteId(1), 0, NOW).await,
        Err(ClientError::VoteClosed { .. })
    ));
}

#[tokio::test]
async fn votes_closed_on_chain_reject_ballots_inside_the_window() {
    let suite = TestSuite::new().await;
    suite.seed_vote(new_vote(1, &["yes", "no"]), &[]).await;
    suite.system.set_open(CONTRACT, VoteId(1), false);

    let alice = client(&suite, ALICE);
    let session = alice.session(ALICE).await.unwrap();
    let now = NOW + 3_600;

    let status = Reconciler::new(&session.contract)
        .reconcile_vote(VoteId(1), now)
        .await
        .unwrap();

    // The window is still running; only the flag closes it.
    assert_that!(status.end_time > now).is_true();
    assert_that!(status.open_flag).is_false();
    assert_that!(status.is_open).is_false();
    assert_that!(status.time_left.to_string()).is_equal_to("ended".to_string());

    assert!(matches!(
        alice.cast_vote(&session, VoteId(1), 0, now).await,
        Err(ClientError::VoteClosed { id }) if id == VoteId(1)
    ));

    suite.system.set_open(CONTRACT, VoteId(1), true);
    alice.cast_vote(&session, VoteId(1), 0, now).await.unwrap();
}

#[tokio::test]
async fn results_match_on_chain_tallies() {
    let suite = TestSuite::new().await;
    suite
        .seed_vote(new_vote(1, &["red", "green", "blue"]), &[2, 5, 1])
        .await;

    let manager = client(&suite, MANAGER);
    let session = manager.session(MANAGER).await.unwrap();
    let results = manager.vote_results(&session, VoteId(1)).await.unwrap();

    assert_that!(results.total()).is_equal_to(8);
    assert_that!(results.winner()).is_equal_to(Some(1));
    assert_that!(results.options[1].name.as_str()).is_equal_to("green");

    let on_chain = session.contract.get_vote_results(VoteId(1), 3).await.unwrap();
    let counts = results
        .options
        .iter()
        .map(|option| option.count)
        .collect::<Vec<_>>();

    assert_that!(counts).is_equal_to(on_chain);

    // The reconciler reads the same tallies one option at a time.
    let status = Reconciler::new(&session.contract)
        .reconcile_vote(VoteId(1), NOW)
        .await
        .unwrap();

    assert_that!(status.options).is_equal_to(results.options);
}

#[tokio::test]
async fn one_failing_vote_doesnt_hide_the_others() {
    let suite = TestSuite::new().await;

    for id in 1..=3 {
        suite.seed_vote(new_vote(id, &["yes", "no"]), &[]).await;
    }

    let entries = [1, 2, 3, 9].map(|id| ParticipationEntry::new(VoteId(id), format!("vote {id}")));
    for entry in &entries {
        suite
            .directory
            .record_participation(&[ALICE], entry)
            .await
            .unwrap();
    }

    suite.system.fail_vote("getOptionDetails", VoteId(2));

    let alice = client(&suite, ALICE).with_max_concurrency(2);
    let session = alice.session(ALICE).await.unwrap();
    let reconciliation = alice.my_votes(&session, NOW).await.unwrap();

    assert_that!(reconciliation.votes.iter().map(|vote| vote.id).collect::<Vec<_>>())
        .is_equal_to(vec![VoteId(1), VoteId(3)]);

    let failed = reconciliation
        .failures
        .iter()
        .map(|(id, _)| *id)
        .collect::<Vec<_>>();
    assert_that!(failed).is_equal_to(vec![VoteId(2), VoteId(9)]);

    assert!(matches!(
        reconciliation.failures[0].1,
        ReconcileError::Contract(ContractError::Read { .. })
    ));
    assert!(matches!(
        reconciliation.failures[1].1,
        ReconcileError::VoteNotFound { .. }
    ));
}

#[tokio::test]
async fn listing_group_votes() {
    let suite = TestSuite::new().await;
    suite.seed_vote(new_vote(1, &["yes"]), &[]).await;
    suite
        .seed_vote(
            NewVote {
                group: GroupId(2),
                ..new_vote(2, &["yes"])
            },
            &[],
        )
        .await;
    suite.seed_vote(new_vote(3, &["yes"]), &[]).await;

    let bob = client(&suite, BOB);
    let session = bob.session(BOB).await.unwrap();
    let votes = bob.group_votes(&session, GROUP, NOW).await.unwrap();

    assert_that!(votes.votes.iter().map(|vote| vote.id).collect::<Vec<_>>())
        .is_equal_to(vec![VoteId(1), VoteId(3)]);
}

#[tokio::test]
async fn granting_access_to_a_single_vote() {
    let suite = TestSuite::new().await;
    suite.seed_vote(new_vote(1, &["yes", "no"]), &[]).await;

    let manager = client(&suite, MANAGER);

    manager
        .grant_vote_access(MANAGER, VoteId(1), CHARLIE, GroupId(4))
        .await
        .unwrap();

    assert_that!(suite.system.added_voters(CONTRACT, VoteId(1)))
        .is_equal_to(vec![(CHARLIE, GroupId(4))]);
    assert_that!(suite.directory.participation(&CHARLIE).await.unwrap())
        .is_equal_to(vec![ParticipationEntry::new(VoteId(1), "vote 1")]);

    assert!(matches!(
        manager
            .grant_vote_access(MANAGER, VoteId(5), CHARLIE, GroupId(4))
            .await,
        Err(ClientError::Reconcile(ReconcileError::VoteNotFound { .. }))
    ));
}

#[tokio::test]
async fn sessions_resolve_contracts() {
    let suite = TestSuite::new().await;
    let alice = client(&suite, ALICE);

    let session = alice.session(ALICE).await.unwrap();
    assert_that!(session.role.is_manager()).is_false();
    assert_that!(session.contract.address()).is_equal_to(CONTRACT);

    assert!(matches!(
        alice.session(CHARLIE).await,
        Err(ClientError::Directory(DirectoryError::NotFound { address })) if address == CHARLIE
    ));

    // Binding doesn't depend on who resolved the account.
    assert_that!(suite.binder(CHARLIE).bind(CONTRACT).address()).is_equal_to(CONTRACT);
}
