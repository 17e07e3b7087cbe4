use {
    crate::ReconcileError,
    futures::{StreamExt, stream},
    serde::{Serialize, Serializer},
    std::fmt,
    tally_contract::VotingContract,
    tally_types::{OptionTally, VoteId, VoteInfo},
};

pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Time remaining before a vote closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeLeft {
    /// Seconds until the vote closes. Never zero.
    Remaining(u64),
    Ended,
}

impl TimeLeft {
    pub fn new(now: u64, end_time: u64, is_open: bool) -> Self {
        if is_open && now < end_time {
            TimeLeft::Remaining(end_time - now)
        } else {
            TimeLeft::Ended
        }
    }
}

/// Only the largest non-zero unit is shown: `3 days`, `1 hour`.
impl fmt::Display for TimeLeft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = match self {
            TimeLeft::Remaining(secs) => *secs,
            TimeLeft::Ended => return f.write_str("ended"),
        };

        let (amount, unit) = if secs >= DAY {
            (secs / DAY, "day")
        } else if secs >= HOUR {
            (secs / HOUR, "hour")
        } else if secs >= MINUTE {
            (secs / MINUTE, "minute")
        } else {
            (secs, "second")
        };

        let plural = if amount == 1 { "" } else { "s" };

        write!(f, "{amount} {unit}{plural}")
    }
}

impl Serialize for TimeLeft {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// A vote's on-chain state combined with the wall clock.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct VoteStatus {
    pub id: VoteId,
    pub name: String,
    pub start_time: u64,
    pub duration: u64,
    pub end_time: u64,
    /// The contract's own open flag.
    pub open_flag: bool,
    /// Whether ballots are accepted: the flag is set and the window hasn't
    /// passed.
    pub is_open: bool,
    pub time_left: TimeLeft,
    /// In option order; each name is paired with its own tally.
    pub options: Vec<OptionTally>,
}

impl VoteStatus {
    pub fn new(info: VoteInfo, options: Vec<OptionTally>, now: u64) -> Self {
        let end_time = info.end_time();
        let is_open = info.open && now < end_time;

        Self {
            id: info.id,
            name: info.name,
            start_time: info.start_time,
            duration: info.duration,
            end_time,
            open_flag: info.open,
            is_open,
            time_left: TimeLeft::new(now, end_time, is_open),
            options,
        }
    }
}

/// Outcome of reconciling a batch of votes. A failed vote never hides the
/// others.
#[derive(Debug, Default)]
pub struct Reconciliation {
    /// Successfully reconciled votes, in input order.
    pub votes: Vec<VoteStatus>,
    /// Votes that couldn't be reconciled, in input order.
    pub failures: Vec<(VoteId, ReconcileError)>,
}

impl Reconciliation {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Turns vote ids into `VoteStatus`es by reading from a contract.
pub struct Reconciler<'a, C> {
    contract: &'a C,
    max_concurrency: usize,
}

impl<'a, C> Reconciler<'a, C>
where
    C: VotingContract,
{
    pub fn new(contract: &'a C) -> Self {
        Self {
            contract,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Maximum number of votes fetched at the same time.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub async fn reconcile_vote(
        &self,
        id: VoteId,
        now: u64,
    ) -> Result<VoteStatus, ReconcileError> {
        let info = self.contract.get_vote(id).await?;

        if info.is_missing(id) {
            return Err(ReconcileError::VoteNotFound { id });
        }

        let mut options = Vec::new();
        for index in 0..info.options_count {
            options.push(self.contract.get_option_details(id, index).await?);
        }

        Ok(VoteStatus::new(info, options, now))
    }

    pub async fn reconcile<I>(&self, ids: I, now: u64) -> Reconciliation
    where
        I: IntoIterator<Item = VoteId>,
    {
        let outcomes = stream::iter(ids)
            .map(|id| async move { (id, self.reconcile_vote(id, now).await) })
            .buffered(self.max_concurrency)
            .collect::<Vec<_>>()
            .await;

        let mut reconciliation = Reconciliation::default();

        for (id, outcome) in outcomes {
            match outcome {
                Ok(status) => reconciliation.votes.push(status),
                Err(err) => {
                    tracing::warn!(vote_id = %id, %err, "Failed to reconcile vote");
                    reconciliation.failures.push((id, err));
                },
            }
        }

        tracing::debug!(
            votes = reconciliation.votes.len(),
            failures = reconciliation.failures.len(),
            "Reconciled votes"
        );

        reconciliation
    }
}

#[cfg(test)]
mod tests {
    use {super::*, assertor::*, test_case::test_case};

    const NOW: u64 = 1_714_521_600;

    fn info(start_time: u64, duration: u64, open: bool) -> VoteInfo {
        VoteInfo {
            id: VoteId(1),
            name: "budget".to_string(),
            start_time,
            duration,
            options_count: 0,
            open,
        }
    }

    #[test_case(TimeLeft::Remaining(3 * DAY + 5 * HOUR) => "3 days"; "days")]
    #[test_case(TimeLeft::Remaining(HOUR + 59 * MINUTE) => "1 hour"; "one hour")]
    #[test_case(TimeLeft::Remaining(12 * MINUTE + 1) => "12 minutes"; "minutes")]
    #[test_case(TimeLeft::Remaining(5) => "5 seconds"; "seconds")]
    #[test_case(TimeLeft::Remaining(1) => "1 second"; "one second")]
    #[test_case(TimeLeft::Ended => "ended"; "ended")]
    fn formatting_time_left(time_left: TimeLeft) -> String {
        time_left.to_string()
    }

    #[test_case(NOW - 10 * DAY, 5 * DAY, true => (false, "ended".to_string()); "window passed")]
    #[test_case(NOW - HOUR, DAY, true => (true, "23 hours".to_string()); "in progress")]
    #[test_case(NOW - HOUR, DAY, false => (false, "ended".to_string()); "closed by flag")]
    #[test_case(NOW, 0, true => (false, "ended".to_string()); "zero duration")]
    #[test_case(NOW - DAY, DAY, true => (false, "ended".to_string()); "ends exactly now")]
    fn classifying(start_time: u64, duration: u64, open: bool) -> (bool, String) {
        let status = VoteStatus::new(info(start_time, duration, open), Vec::new(), NOW);
        (status.is_open, status.time_left.to_string())
    }

    #[test]
    fn end_time_saturates() {
        let status = VoteStatus::new(info(NOW, u64::MAX, true), Vec::new(), NOW);

        assert_that!(status.end_time).is_equal_to(u64::MAX);
        assert_that!(status.is_open).is_true();
    }

    #[test]
    fn time_left_serializes_as_text() {
        assert_that!(serde_json::to_value(TimeLeft::Remaining(2 * DAY)).unwrap())
            .is_equal_to(serde_json::json!("2 days"));
    }
}
