//! Flag-related types.

use std::fmt::{Display, Formatter};

use crate::types::core::{Atom, AtomError};

/// A message flag.
///
/// System flags begin with `\`; keywords are server- or user-defined atoms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Flag {
    /// Message has been answered (`\Answered`).
    Answered,
    /// Message is "deleted" for removal by later EXPUNGE (`\Deleted`).
    Deleted,
    /// Message has not completed composition (`\Draft`).
    Draft,
    /// Message is "flagged" for urgent/special attention (`\Flagged`).
    Flagged,
    /// Message has been read (`\Seen`).
    Seen,
    /// A future expansion of a system flag, e.g., `\XOther`.
    Extension(Atom),
    /// A keyword.
    Keyword(Atom),
}

impl Flag {
    /// Resolves a `\`-prefixed flag name to the corresponding system flag.
    pub fn system(atom: Atom) -> Self {
        match atom.inner().to_ascii_lowercase().as_str() {
            "answered" => Self::Answered,
            "deleted" => Self::Deleted,
            "draft" => Self::Draft,
            "flagged" => Self::Flagged,
            "seen" => Self::Seen,
            _ => Self::Extension(atom),
        }
    }
}

impl TryFrom<&str> for Flag {
    type Error = AtomError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Ok(if let Some(value) = value.strip_prefix('\\') {
            Self::system(Atom::try_from(value)?)
        } else {
            Self::Keyword(Atom::try_from(value)?)
        })
    }
}

impl Display for Flag {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Flag::Answered => f.write_str("\\Answered"),
            Flag::Deleted => f.write_str("\\Deleted"),
            Flag::Draft => f.write_str("\\Draft"),
            Flag::Flagged => f.write_str("\\Flagged"),
            Flag::Seen => f.write_str("\\Seen"),
            Flag::Extension(other) => write!(f, "\\{other}"),
            Flag::Keyword(atom) => write!(f, "{atom}"),
        }
    }
}

/// A flag as it appears in FETCH data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlagFetch {
    Flag(Flag),
    /// Message "recently" arrived in this mailbox (`\Recent`).
    ///
    /// Cannot be altered by the client.
    Recent,
}

impl From<Flag> for FlagFetch {
    fn from(flag: Flag) -> Self {
        Self::Flag(flag)
    }
}

/// A flag as it appears in a PERMANENTFLAGS response code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlagPerm {
    Flag(Flag),
    /// New keywords may be created by STOREing them (`\*`).
    Asterisk,
}

impl From<Flag> for FlagPerm {
    fn from(flag: Flag) -> Self {
        Self::Flag(flag)
    }
}

/// Mailbox name attributes in LIST/LSUB responses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlagNameAttribute {
    /// No child levels of hierarchy can exist under this name (`\Noinferiors`).
    Noinferiors,
    /// It is not possible to SELECT this name (`\Noselect`).
    Noselect,
    /// The mailbox has been marked "interesting" by the server (`\Marked`).
    Marked,
    /// The mailbox does not have any messages added since it was last
    /// selected (`\Unmarked`).
    Unmarked,
    /// An extension attribute, e.g., `\HasNoChildren`.
    Extension(Atom),
}

impl FlagNameAttribute {
    pub fn from_atom(atom: Atom) -> Self {
        match atom.inner().to_ascii_lowercase().as_str() {
            "noinferiors" => Self::Noinferiors,
            "noselect" => Self::Noselect,
            "marked" => Self::Marked,
            "unmarked" => Self::Unmarked,
            _ => Self::Extension(atom),
        }
    }
}

impl Display for FlagNameAttribute {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Noinferiors => f.write_str("\\Noinferiors"),
            Self::Noselect => f.write_str("\\Noselect"),
            Self::Marked => f.write_str("\\Marked"),
            Self::Unmarked => f.write_str("\\Unmarked"),
            Self::Extension(atom) => write!(f, "\\{atom}"),
        }
    }
}

/// STORE operation: replace, add, or remove the given flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreType {
    Replace,
    Add,
    Remove,
}

/// Whether the server should answer a STORE with untagged FETCHes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreResponse {
    Answer,
    Silent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_from_str() {
        assert_eq!(Flag::try_from("\\Seen").unwrap(), Flag::Seen);
        assert_eq!(Flag::try_from("\\seen").unwrap(), Flag::Seen);
        assert_eq!(
            Flag::try_from("$Important").unwrap(),
            Flag::Keyword(Atom::try_from("$Important").unwrap())
        );
        assert_eq!(
            Flag::try_from("\\XNope").unwrap().to_string(),
            "\\XNope".to_string()
        );
    }
}
