use {
    crate::ReconcileError,
    serde::Serialize,
    tally_contract::VotingContract,
    tally_types::{OptionTally, VoteId},
};

/// Final or running tallies of a vote.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct VoteResults {
    pub id: VoteId,
    pub name: String,
    pub options: Vec<OptionTally>,
}

impl VoteResults {
    /// Sum of every tally, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.options
            .iter()
            .fold(0, |total, option| total.saturating_add(option.count))
    }

    /// Indexes of the options holding the most votes. Empty when no ballot
    /// has been cast.
    pub fn leading(&self) -> Vec<usize> {
        let Some(max) = self.options.iter().map(|option| option.count).max() else {
            return Vec::new();
        };

        if max == 0 {
            return Vec::new();
        }

        self.options
            .iter()
            .enumerate()
            .filter(|(_, option)| option.count == max)
            .map(|(index, _)| index)
            .collect()
    }

    /// The single option with strictly more votes than any other, if any.
    pub fn winner(&self) -> Option<usize> {
        match self.leading().as_slice() {
            [index] => Some(*index),
            _ => None,
        }
    }

    /// Share of the total held by an option, in percent.
    pub fn percentage(&self, index: usize) -> f64 {
        let total = self.total();

        match self.options.get(index) {
            Some(option) if total > 0 => option.count as f64 * 100.0 / total as f64,
            _ => 0.0,
        }
    }
}

/// Read a vote's option names and pair them with the tallies returned by
/// `getVoteResults`.
pub async fn fetch_results<C>(contract: &C, id: VoteId) -> Result<VoteResults, ReconcileError>
where
    C: VotingContract,
{
    let info = contract.get_vote(id).await?;

    if info.is_missing(id) {
        return Err(ReconcileError::VoteNotFound { id });
    }

    let count = contract.get_options_count(id).await?;

    let mut names = Vec::new();
    for index in 0..count {
        names.push(contract.get_option_details(id, index).await?.name);
    }

    let tallies = contract.get_vote_results(id, count).await?;

    if tallies.len() != names.len() {
        return Err(ReconcileError::TallyMismatch {
            id,
            expected: count,
            actual: tallies.len(),
        });
    }

    tracing::debug!(vote_id = %id, options = count, "Fetched vote results");

    Ok(VoteResults {
        id,
        name: info.name,
        options: names
            .into_iter()
            .zip(tallies)
            .map(|(name, count)| OptionTally::new(name, count))
            .collect(),
    })
}
