use {
    serde::{Deserialize, Serialize},
    std::{
        fmt::{self, Display},
        num::ParseIntError,
        str::FromStr,
    },
};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn into_inner(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

define_id! {
    /// Identifier of a vote. Allocated by the off-chain counter and mirrored
    /// into the contract when the vote is created.
    VoteId
}

define_id! {
    /// Identifier of a voter group inside a manager's contract.
    GroupId
}

#[cfg(test)]
mod tests {
    use {super::*, assertor::*};

    #[test]
    fn parsing_ids() {
        assert_that!(VoteId::from_str(" 42 ")).is_equal_to(Ok(VoteId(42)));
        assert_that!(GroupId::from_str("x").is_err()).is_true();
    }

    #[test]
    fn ids_are_transparent_in_json() {
        let json = serde_json::to_string(&VoteId(7)).unwrap();
        assert_that!(json.as_str()).is_equal_to("7");
    }
}
