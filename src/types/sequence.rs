//! Message sequence numbers, UIDs, and sequence sets.

use std::{fmt, num::NonZeroU32};

use thiserror::Error;

use crate::types::core::Vec1;

/// A single sequence number/UID or `*` (the largest number in use).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeqOrUid {
    Value(NonZeroU32),
    Asterisk,
}

impl fmt::Display for SeqOrUid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            Self::Asterisk => f.write_str("*"),
        }
    }
}

impl From<NonZeroU32> for SeqOrUid {
    fn from(value: NonZeroU32) -> Self {
        Self::Value(value)
    }
}

/// `seq-range` or a single `seq-number`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sequence {
    Single(SeqOrUid),
    Range(SeqOrUid, SeqOrUid),
}

/// `sequence-set = (seq-number / seq-range) ["," sequence-set]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequenceSet(pub Vec1<Sequence>);

impl SequenceSet {
    pub fn iter(&self) -> std::slice::Iter<'_, Sequence> {
        self.0.iter()
    }

    /// Parses the textual form, e.g., `1:5,7,10:*`.
    fn parse_str(value: &str) -> Result<Self, SequenceSetError> {
        fn single(token: &str) -> Result<SeqOrUid, SequenceSetError> {
            if token == "*" {
                Ok(SeqOrUid::Asterisk)
            } else {
                token
                    .parse::<NonZeroU32>()
                    .map(SeqOrUid::Value)
                    .map_err(|_| SequenceSetError::Invalid)
            }
        }

        let mut sequences = Vec::new();

        for part in value.split(',') {
            match part.split_once(':') {
                None => sequences.push(Sequence::Single(single(part)?)),
                Some((from, to)) => {
                    sequences.push(Sequence::Range(single(from)?, single(to)?));
                }
            }
        }

        Ok(Self(
            Vec1::try_from(sequences).map_err(|_| SequenceSetError::Empty)?,
        ))
    }
}

impl TryFrom<&str> for SequenceSet {
    type Error = SequenceSetError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse_str(value)
    }
}

impl From<NonZeroU32> for SequenceSet {
    fn from(value: NonZeroU32) -> Self {
        Self(Vec1::from(Sequence::Single(SeqOrUid::Value(value))))
    }
}

impl From<Sequence> for SequenceSet {
    fn from(value: Sequence) -> Self {
        Self(Vec1::from(value))
    }
}

#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum SequenceSetError {
    #[error("Must not be empty")]
    Empty,
    #[error("Not a valid sequence set")]
    Invalid,
}
