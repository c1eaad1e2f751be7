use serde::Serialize;
use thiserror::Error;

/// Errors from building or querying a canonical pair
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PairError {
    #[error("A user cannot be paired with themselves: {0}")]
    SameUser(String),

    #[error("User {user_id} is not part of pair ({low}, {high})")]
    NotAMember {
        user_id: String,
        low: String,
        high: String,
    },
}

/// Unordered pair of distinct users, stored in canonical `(min, max)` order
///
/// Identifiers are ordered byte-wise, the same way the database compares
/// them under the `C` collation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UserPair {
    low: String,
    high: String,
}

impl UserPair {
    /// Canonicalize two user ids; the argument order does not matter
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Result<Self, PairError> {
        let first = first.into();
        let second = second.into();

        if first == second {
            return Err(PairError::SameUser(first));
        }

        let (low, high) = if first < second {
            (first, second)
        } else {
            (second, first)
        };

        Ok(Self { low, high })
    }

    /// The smaller id (`user_a_id`)
    pub fn low(&self) -> &str {
        &self.low
    }

    /// The larger id (`user_b_id`)
    pub fn high(&self) -> &str {
        &self.high
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.low == user_id || self.high == user_id
    }

    /// The member of the pair that is not `known`
    ///
    /// Asking with an id outside the pair is a caller bug and is reported
    /// as [`PairError::NotAMember`] instead of guessing.
    pub fn other_of(&self, known: &str) -> Result<&str, PairError> {
        if known == self.low {
            Ok(&self.high)
        } else if known == self.high {
            Ok(&self.low)
        } else {
            Err(PairError::NotAMember {
                user_id: known.to_string(),
                low: self.low.clone(),
                high: self.high.clone(),
            })
        }
    }
}

/// Free-function form of [`UserPair::other_of`]
pub fn other_of<'a>(pair: &'a UserPair, known: &str) -> Result<&'a str, PairError> {
    pair.other_of(known)
}
