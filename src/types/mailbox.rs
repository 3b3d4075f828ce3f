//! Mailbox-related types.

use crate::types::core::{is_list_char, IString, IStringError};

/// A mailbox name.
///
/// `INBOX` is case-insensitive on the wire and therefore modeled as its own
/// variant; every other name is an arbitrary (NUL-free) byte string whose
/// wire form the encoder chooses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Mailbox {
    Inbox,
    Other(IString),
}

impl Mailbox {
    /// The raw name bytes, with `Inbox` rendered as `INBOX`.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Inbox => b"INBOX",
            Self::Other(other) => other.inner(),
        }
    }
}

impl TryFrom<&str> for Mailbox {
    type Error = IStringError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.eq_ignore_ascii_case("inbox") {
            Ok(Self::Inbox)
        } else {
            Ok(Self::Other(IString::try_from(value)?))
        }
    }
}

impl TryFrom<&[u8]> for Mailbox {
    type Error = IStringError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        if value.eq_ignore_ascii_case(b"inbox") {
            Ok(Self::Inbox)
        } else {
            Ok(Self::Other(IString::try_from(value)?))
        }
    }
}

/// A mailbox name or pattern in LIST/LSUB.
///
/// Patterns may contain the list wildcards `%` and `*`, which do not fit an
/// ordinary atom and would be destroyed by quoting rules applied to plain
/// strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListMailbox {
    /// A token of list-chars, emitted verbatim, e.g., `INBOX.*`.
    Token(String),
    /// Anything else, emitted as a quoted string or literal.
    String(IString),
}

impl TryFrom<&str> for ListMailbox {
    type Error = IStringError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if !value.is_empty() && value.bytes().all(is_list_char) {
            Ok(Self::Token(value.to_owned()))
        } else {
            Ok(Self::String(IString::try_from(value)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailbox_inbox_is_case_insensitive() {
        assert_eq!(Mailbox::try_from("inBoX").unwrap(), Mailbox::Inbox);
        assert!(matches!(
            Mailbox::try_from("Archive").unwrap(),
            Mailbox::Other(_)
        ));
    }

    #[test]
    fn test_list_mailbox() {
        assert_eq!(
            ListMailbox::try_from("INBOX.*").unwrap(),
            ListMailbox::Token("INBOX.*".to_owned())
        );
        assert!(matches!(
            ListMailbox::try_from("a b").unwrap(),
            ListMailbox::String(_)
        ));
        assert!(matches!(
            ListMailbox::try_from("").unwrap(),
            ListMailbox::String(_)
        ));
    }
}
