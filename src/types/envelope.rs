//! ENVELOPE data (RFC 3501 section 7.4.2).

use crate::types::core::NString;

/// The parsed envelope of a message.
///
/// Address lists are empty when the server sent `NIL`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    pub date: NString,
    pub subject: NString,
    pub from: Vec<Address>,
    pub sender: Vec<Address>,
    pub reply_to: Vec<Address>,
    pub to: Vec<Address>,
    pub cc: Vec<Address>,
    pub bcc: Vec<Address>,
    pub in_reply_to: NString,
    pub message_id: NString,
}

/// A single address, `(name adl mailbox host)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Address {
    /// Personal name.
    pub name: NString,
    /// At-domain-list (source route); historic.
    pub adl: NString,
    /// Local part, or `NIL` at the end of a group.
    pub mailbox: NString,
    /// Domain, or `NIL` for a group start marker.
    pub host: NString,
}
