//! SEARCH and SORT criteria.

use std::fmt::{Display, Formatter};

use crate::types::{
    core::{IString, Vec1},
    datetime::NaiveDate,
    flag::Flag,
    sequence::SequenceSet,
};

/// `search-key`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchKey {
    /// Several keys combined with AND, rendered as a parenthesized list.
    And(Vec1<SearchKey>),
    SequenceSet(SequenceSet),
    All,
    Answered,
    Bcc(IString),
    Before(NaiveDate),
    Body(IString),
    Cc(IString),
    Deleted,
    Draft,
    Flagged,
    From(IString),
    Header(IString, IString),
    Keyword(Flag),
    Larger(u32),
    /// `MODSEQ n` (RFC 7162).
    ModSeq(u64),
    New,
    Not(Box<SearchKey>),
    Old,
    On(NaiveDate),
    Or(Box<SearchKey>, Box<SearchKey>),
    Recent,
    Seen,
    SentBefore(NaiveDate),
    SentOn(NaiveDate),
    SentSince(NaiveDate),
    Since(NaiveDate),
    Smaller(u32),
    Subject(IString),
    Text(IString),
    To(IString),
    Uid(SequenceSet),
    Unanswered,
    Undeleted,
    Undraft,
    Unflagged,
    Unkeyword(Flag),
    Unseen,
}

/// `search-return-opt` (RFC 4731, ESEARCH).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchReturnOption {
    Min,
    Max,
    All,
    Count,
    /// `SAVE` (RFC 5182).
    Save,
}

impl Display for SearchReturnOption {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Min => f.write_str("MIN"),
            Self::Max => f.write_str("MAX"),
            Self::All => f.write_str("ALL"),
            Self::Count => f.write_str("COUNT"),
            Self::Save => f.write_str("SAVE"),
        }
    }
}

/// `sort-key` (RFC 5256).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Arrival,
    Cc,
    Date,
    From,
    Size,
    Subject,
    To,
}

impl Display for SortKey {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Arrival => f.write_str("ARRIVAL"),
            Self::Cc => f.write_str("CC"),
            Self::Date => f.write_str("DATE"),
            Self::From => f.write_str("FROM"),
            Self::Size => f.write_str("SIZE"),
            Self::Subject => f.write_str("SUBJECT"),
            Self::To => f.write_str("TO"),
        }
    }
}

/// `sort-criterion`, an optionally reversed sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortCriterion {
    pub reverse: bool,
    pub key: SortKey,
}
