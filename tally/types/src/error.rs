use thiserror::Error;

/// Rejected user input. Always raised before anything is sent to the chain
/// or the directory.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("vote name cannot be empty")]
    EmptyName,

    #[error("a vote needs at least one option")]
    NoOptions,

    #[error("a maximum of {max} options are allowed, got {actual}")]
    TooManyOptions { max: usize, actual: usize },

    #[error("option {index} is blank")]
    BlankOption { index: usize },

    #[error("duration cannot be negative: {days} days")]
    NegativeDuration { days: f64 },

    #[error("duration is not a finite number of days: {days}")]
    InvalidDuration { days: f64 },

    #[error("option index {index} out of range, vote has {count} options")]
    OptionOutOfRange { index: u64, count: u64 },
}
