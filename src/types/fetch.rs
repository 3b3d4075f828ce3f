//! FETCH-related types: requested items, parsed attributes, and the
//! streamed-body event sub-stream.

use std::{
    fmt::{Display, Formatter},
    num::NonZeroU32,
};

use crate::types::{
    body::BodyStructure,
    core::{IString, NString, Vec1},
    datetime::DateTime,
    envelope::Envelope,
    flag::FlagFetch,
};

/// A FETCH macro expanding to several item names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Macro {
    /// `(FLAGS INTERNALDATE RFC822.SIZE)`
    Fast,
    /// `(FLAGS INTERNALDATE RFC822.SIZE ENVELOPE)`
    All,
    /// `(FLAGS INTERNALDATE RFC822.SIZE ENVELOPE BODY)`
    Full,
}

impl Display for Macro {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Fast => f.write_str("FAST"),
            Self::All => f.write_str("ALL"),
            Self::Full => f.write_str("FULL"),
        }
    }
}

/// Either a macro or a list of item names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MacroOrMessageDataItemNames {
    Macro(Macro),
    MessageDataItemNames(Vec<MessageDataItemName>),
}

impl From<Macro> for MacroOrMessageDataItemNames {
    fn from(value: Macro) -> Self {
        Self::Macro(value)
    }
}

impl From<Vec<MessageDataItemName>> for MacroOrMessageDataItemNames {
    fn from(value: Vec<MessageDataItemName>) -> Self {
        Self::MessageDataItemNames(value)
    }
}

/// An item name requested in a FETCH command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageDataItemName {
    /// Non-extensible form of BODYSTRUCTURE.
    Body,
    /// `BODY[<section>]<<partial>>` or `BODY.PEEK[...]`.
    BodyExt {
        section: Option<Section>,
        partial: Option<(u32, NonZeroU32)>,
        peek: bool,
    },
    BodyStructure,
    /// `BINARY[...]` (RFC 3516).
    Binary {
        section: Vec<NonZeroU32>,
        partial: Option<(u32, NonZeroU32)>,
        peek: bool,
    },
    /// `BINARY.SIZE[...]` (RFC 3516).
    BinarySize { section: Vec<NonZeroU32> },
    Envelope,
    Flags,
    InternalDate,
    Rfc822,
    Rfc822Header,
    Rfc822Size,
    Rfc822Text,
    Uid,
    /// `MODSEQ` (RFC 7162).
    ModSeq,
    /// `X-GM-MSGID` (Gmail).
    GmailMessageId,
    /// `X-GM-THRID` (Gmail).
    GmailThreadId,
    /// `X-GM-LABELS` (Gmail).
    GmailLabels,
}

/// `section` inside `BODY[...]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Section {
    Part(Part),
    Header(Option<Part>),
    HeaderFields(Option<Part>, Vec1<IString>),
    HeaderFieldsNot(Option<Part>, Vec1<IString>),
    Text(Option<Part>),
    Mime(Part),
}

/// A dotted part number, e.g., `4.2.2.1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Part(pub Vec1<NonZeroU32>);

/// A non-streamed attribute inside FETCH response data.
///
/// Body payloads (`BODY[...]`, `RFC822*`, `BINARY[...]`) are not attributes;
/// they arrive through [`FetchEvent::StreamingBegin`] and friends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttribute {
    Flags(Vec<FlagFetch>),
    Uid(NonZeroU32),
    InternalDate(DateTime),
    Rfc822Size(u32),
    Envelope(Envelope),
    Body(BodyStructure),
    BodyStructure(BodyStructure),
    BinarySize { section: Vec<NonZeroU32>, size: u32 },
    /// `MODSEQ (n)` (RFC 7162).
    ModSeq(u64),
    /// `X-GM-MSGID n` (Gmail).
    GmailMessageId(u64),
    /// `X-GM-THRID n` (Gmail).
    GmailThreadId(u64),
    /// `X-GM-LABELS (...)` (Gmail).
    GmailLabels(Vec<NString>),
}

/// Which body payload a streamed FETCH item carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamingKind {
    Rfc822,
    Rfc822Header,
    Rfc822Text,
    Body {
        section: Option<Section>,
        origin: Option<u32>,
    },
    Binary {
        section: Vec<NonZeroU32>,
    },
}

/// One element of the FETCH sub-stream.
///
/// A single FETCH data response is delivered as
/// `Start (Attribute | StreamingBegin StreamingBytes* StreamingEnd)* Finish`,
/// and the parser guarantees that exactly `length` bytes are emitted between
/// `StreamingBegin` and `StreamingEnd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    /// `* <seq> FETCH (` was parsed.
    Start(NonZeroU32),
    /// A complete non-streamed attribute.
    Attribute(FetchAttribute),
    /// A body payload of `length` bytes follows.
    StreamingBegin { kind: StreamingKind, length: u32 },
    /// A slice of the announced payload.
    StreamingBytes(Vec<u8>),
    /// The announced payload is complete.
    StreamingEnd,
    /// The closing `)` of the FETCH response was parsed.
    Finish,
}
