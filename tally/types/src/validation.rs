use {
    crate::{GroupId, NewVote, ValidationError, VoteId},
    serde::{Deserialize, Serialize},
};

/// Maximum number of options a vote may carry.
pub const MAX_OPTIONS: usize = 10;

pub const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// A vote creation request as entered by a manager, before an id is
/// allocated for it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CreateVote {
    pub name: String,
    /// UNIX timestamp in seconds. Defaults to the time of creation.
    #[serde(default)]
    pub start_time: Option<u64>,
    /// Fractional days are allowed; the duration is truncated to whole seconds.
    pub duration_days: f64,
    pub group: GroupId,
    pub options: Vec<String>,
}

/// A `CreateVote` that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedVote {
    pub name: String,
    pub start_time: u64,
    pub duration: u64,
    pub group: GroupId,
    pub options: Vec<String>,
}

impl CreateVote {
    pub fn validate(self, now: u64) -> Result<ValidatedVote, ValidationError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }

        if self.options.is_empty() {
            return Err(ValidationError::NoOptions);
        }

        if self.options.len() > MAX_OPTIONS {
            return Err(ValidationError::TooManyOptions {
                max: MAX_OPTIONS,
                actual: self.options.len(),
            });
        }

        let options = self
            .options
            .into_iter()
            .enumerate()
            .map(|(index, option)| {
                let option = option.trim().to_string();
                if option.is_empty() {
                    Err(ValidationError::BlankOption { index })
                } else {
                    Ok(option)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let duration = days_to_seconds(self.duration_days)?;

        Ok(ValidatedVote {
            name,
            start_time: self.start_time.unwrap_or(now),
            duration,
            group: self.group,
            options,
        })
    }
}

impl ValidatedVote {
    /// Attach the allocated id, producing the arguments of `createVote`.
    pub fn with_id(self, id: VoteId) -> NewVote {
        NewVote {
            id,
            name: self.name,
            start_time: self.start_time,
            duration: self.duration,
            group: self.group,
            options: self.options,
        }
    }
}

pub fn days_to_seconds(days: f64) -> Result<u64, ValidationError> {
    if !days.is_finite() {
        return Err(ValidationError::InvalidDuration { days });
    }

    if days < 0.0 {
        return Err(ValidationError::NegativeDuration { days });
    }

    // Float to int casts saturate, so absurdly long durations clamp to u64::MAX.
    Ok((days * SECONDS_PER_DAY as f64) as u64)
}

pub fn check_option_index(index: u64, count: u64) -> Result<(), ValidationError> {
    if index >= count {
        return Err(ValidationError::OptionOutOfRange { index, count });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use {super::*, assertor::*, test_case::test_case};

    const NOW: u64 = 1_700_000_000;

    fn request(options: &[&str], duration_days: f64) -> CreateVote {
        CreateVote {
            name: "Board election".to_string(),
            start_time: None,
            duration_days,
            group: GroupId(1),
            options: options.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test_case(0.0 => Ok(0); "zero days")]
    #[test_case(1.0 => Ok(86_400); "one day")]
    #[test_case(0.5 => Ok(43_200); "half a day")]
    #[test_case(-1.0 => Err(ValidationError::NegativeDuration { days: -1.0 }); "negative")]
    fn converting_days(days: f64) -> Result<u64, ValidationError> {
        days_to_seconds(days)
    }

    #[test]
    fn nan_duration_is_rejected() {
        assert!(matches!(
            days_to_seconds(f64::NAN),
            Err(ValidationError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn valid_request_is_trimmed() {
        let vote = request(&[" yes ", "no"], 5.0).validate(NOW).unwrap();

        assert_that!(vote.options).is_equal_to(vec!["yes".to_string(), "no".to_string()]);
        assert_that!(vote.duration).is_equal_to(5 * SECONDS_PER_DAY);
        assert_that!(vote.start_time).is_equal_to(NOW);

        let vote = vote.with_id(VoteId(3));
        assert_that!(vote.id).is_equal_to(VoteId(3));
        assert_that!(vote.name.as_str()).is_equal_to("Board election");
    }

    #[test]
    fn rejecting_bad_requests() {
        let mut empty_name = request(&["yes"], 1.0);
        empty_name.name = "   ".to_string();
        assert_that!(empty_name.validate(NOW)).is_equal_to(Err(ValidationError::EmptyName));

        assert_that!(request(&[], 1.0).validate(NOW))
            .is_equal_to(Err(ValidationError::NoOptions));

        let eleven = ["x"; 11];
        assert_that!(request(&eleven, 1.0).validate(NOW)).is_equal_to(Err(
            ValidationError::TooManyOptions {
                max: MAX_OPTIONS,
                actual: 11,
            },
        ));

        assert_that!(request(&["yes", " "], 1.0).validate(NOW))
            .is_equal_to(Err(ValidationError::BlankOption { index: 1 }));
    }

    #[test]
    fn explicit_start_time_is_kept() {
        let mut scheduled = request(&["yes"], 1.0);
        scheduled.start_time = Some(NOW + 3_600);

        assert_that!(scheduled.validate(NOW).unwrap().start_time).is_equal_to(NOW + 3_600);
    }

    #[test]
    fn option_index_bounds() {
        assert_that!(check_option_index(2, 3)).is_equal_to(Ok(()));
        assert_that!(check_option_index(3, 3))
            .is_equal_to(Err(ValidationError::OptionOutOfRange { index: 3, count: 3 }));
    }
}
