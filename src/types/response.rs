//! Response-related types.

use std::{
    fmt::{Display, Formatter},
    num::NonZeroU32,
};

use crate::types::{
    auth::AuthMechanism,
    core::{Atom, IString, NString, QuotedChar, SeqNo, Tag, Text, Vec1},
    flag::{Flag, FlagNameAttribute, FlagPerm},
    mailbox::Mailbox,
    sequence::SequenceSet,
    status::StatusDataItem,
};

/// A complete (non-FETCH) server response.
///
/// FETCH data responses are not represented here; they are delivered as a
/// sub-stream of [`FetchEvent`](crate::types::fetch::FetchEvent)s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// A command completion result.
    Tagged(Tagged),
    /// Untagged data or an untagged status.
    Untagged(UntaggedData),
    /// `* BYE ...`: the server is about to close the connection.
    Fatal(ResponseText),
}

/// A tagged status line, e.g., `A1 OK [READ-WRITE] done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tagged {
    pub tag: Tag,
    pub kind: CompletionKind,
    pub text: ResponseText,
}

/// `OK` / `NO` / `BAD` of a command completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionKind {
    Ok,
    No,
    Bad,
}

/// The condition of an untagged status line, including the `PREAUTH`
/// greeting form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    Ok,
    No,
    Bad,
    PreAuth,
}

/// `resp-text`: an optional bracketed response code plus human-readable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseText {
    pub code: Option<Code>,
    pub text: Text,
}

/// A response code, `resp-text-code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Code {
    Alert,
    BadCharset {
        allowed: Vec<crate::types::core::Charset>,
    },
    Capability(Vec1<Capability>),
    Parse,
    PermanentFlags(Vec<FlagPerm>),
    ReadOnly,
    ReadWrite,
    TryCreate,
    UidNext(NonZeroU32),
    UidValidity(NonZeroU32),
    Unseen(NonZeroU32),
    /// `APPENDUID` (RFC 4315).
    AppendUid {
        uid_validity: NonZeroU32,
        uid: SequenceSet,
    },
    /// `COPYUID` (RFC 4315).
    CopyUid {
        uid_validity: NonZeroU32,
        source: SequenceSet,
        destination: SequenceSet,
    },
    /// `UIDNOTSTICKY` (RFC 4315).
    UidNotSticky,
    /// `HIGHESTMODSEQ` (RFC 7162).
    HighestModSeq(u64),
    /// `NOMODSEQ` (RFC 7162).
    NoModSeq,
    /// `MODIFIED` (RFC 7162).
    Modified(SequenceSet),
    /// `CLOSED` (RFC 7162).
    Closed,
    /// `COMPRESSIONACTIVE` (RFC 4978).
    CompressionActive,
    /// `OVERQUOTA` (RFC 9208).
    OverQuota,
    /// `TOOBIG` (RFC 4469).
    TooBig,
    /// `UNKNOWN-CTE` (RFC 3516).
    UnknownCte,
    /// An unrecognized code, preserved verbatim.
    Other(Vec<u8>),
}

/// A capability advertised by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    Imap4Rev1,
    Auth(AuthMechanism),
    StartTls,
    LoginDisabled,
    /// RFC 2177.
    Idle,
    /// RFC 7888.
    LiteralPlus,
    /// RFC 7888.
    LiteralMinus,
    /// RFC 3516.
    Binary,
    /// RFC 5161.
    Enable,
    /// RFC 2342.
    Namespace,
    /// RFC 2971.
    Id,
    /// RFC 3691.
    Unselect,
    /// RFC 6855.
    Utf8Accept,
    /// RFC 6855.
    Utf8Only,
    /// RFC 7162.
    CondStore,
    /// RFC 7162.
    QResync,
    /// RFC 4731.
    ESearch,
    /// RFC 5267.
    ESort,
    /// RFC 5256.
    Sort,
    /// RFC 6851.
    Move,
    /// RFC 4315.
    UidPlus,
    /// RFC 5464.
    Metadata,
    /// RFC 2087 / RFC 9208.
    Quota,
    /// RFC 3502.
    MultiAppend,
    /// RFC 4469.
    Catenate,
    /// RFC 4467.
    UrlAuth,
    /// RFC 5550.
    UrlPartial,
    /// RFC 4959.
    SaslIr,
    Other(Atom),
}

impl From<Atom> for Capability {
    fn from(atom: Atom) -> Self {
        if atom.inner().len() > 5 && atom.inner()[..5].eq_ignore_ascii_case("AUTH=") {
            if let Ok(mechanism) = Atom::try_from(&atom.inner()[5..]) {
                return Self::Auth(AuthMechanism::from(mechanism));
            }
        }

        match atom.inner().to_ascii_uppercase().as_str() {
            "IMAP4REV1" => Self::Imap4Rev1,
            "STARTTLS" => Self::StartTls,
            "LOGINDISABLED" => Self::LoginDisabled,
            "IDLE" => Self::Idle,
            "LITERAL+" => Self::LiteralPlus,
            "LITERAL-" => Self::LiteralMinus,
            "BINARY" => Self::Binary,
            "ENABLE" => Self::Enable,
            "NAMESPACE" => Self::Namespace,
            "ID" => Self::Id,
            "UNSELECT" => Self::Unselect,
            "UTF8=ACCEPT" => Self::Utf8Accept,
            "UTF8=ONLY" => Self::Utf8Only,
            "CONDSTORE" => Self::CondStore,
            "QRESYNC" => Self::QResync,
            "ESEARCH" => Self::ESearch,
            "ESORT" => Self::ESort,
            "SORT" => Self::Sort,
            "MOVE" => Self::Move,
            "UIDPLUS" => Self::UidPlus,
            "METADATA" => Self::Metadata,
            "QUOTA" => Self::Quota,
            "MULTIAPPEND" => Self::MultiAppend,
            "CATENATE" => Self::Catenate,
            "URLAUTH" => Self::UrlAuth,
            "URL-PARTIAL" => Self::UrlPartial,
            "SASL-IR" => Self::SaslIr,
            _ => Self::Other(atom),
        }
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Imap4Rev1 => f.write_str("IMAP4rev1"),
            Self::Auth(mechanism) => write!(f, "AUTH={mechanism}"),
            Self::StartTls => f.write_str("STARTTLS"),
            Self::LoginDisabled => f.write_str("LOGINDISABLED"),
            Self::Idle => f.write_str("IDLE"),
            Self::LiteralPlus => f.write_str("LITERAL+"),
            Self::LiteralMinus => f.write_str("LITERAL-"),
            Self::Binary => f.write_str("BINARY"),
            Self::Enable => f.write_str("ENABLE"),
            Self::Namespace => f.write_str("NAMESPACE"),
            Self::Id => f.write_str("ID"),
            Self::Unselect => f.write_str("UNSELECT"),
            Self::Utf8Accept => f.write_str("UTF8=ACCEPT"),
            Self::Utf8Only => f.write_str("UTF8=ONLY"),
            Self::CondStore => f.write_str("CONDSTORE"),
            Self::QResync => f.write_str("QRESYNC"),
            Self::ESearch => f.write_str("ESEARCH"),
            Self::ESort => f.write_str("ESORT"),
            Self::Sort => f.write_str("SORT"),
            Self::Move => f.write_str("MOVE"),
            Self::UidPlus => f.write_str("UIDPLUS"),
            Self::Metadata => f.write_str("METADATA"),
            Self::Quota => f.write_str("QUOTA"),
            Self::MultiAppend => f.write_str("MULTIAPPEND"),
            Self::Catenate => f.write_str("CATENATE"),
            Self::UrlAuth => f.write_str("URLAUTH"),
            Self::UrlPartial => f.write_str("URL-PARTIAL"),
            Self::SaslIr => f.write_str("SASL-IR"),
            Self::Other(atom) => f.write_str(atom.inner()),
        }
    }
}

/// Payload of an untagged response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UntaggedData {
    /// `* OK/NO/BAD/PREAUTH ...`, including the connection greeting.
    Condition {
        kind: ConditionKind,
        text: ResponseText,
    },
    Capability(Vec1<Capability>),
    List {
        items: Vec<FlagNameAttribute>,
        delimiter: Option<QuotedChar>,
        mailbox: Mailbox,
    },
    Lsub {
        items: Vec<FlagNameAttribute>,
        delimiter: Option<QuotedChar>,
        mailbox: Mailbox,
    },
    Status {
        mailbox: Mailbox,
        items: Vec<StatusDataItem>,
    },
    Search {
        seqs: Vec<SeqNo>,
        /// `(MODSEQ n)` tail (RFC 7162).
        mod_seq: Option<u64>,
    },
    /// `* ESEARCH ...` (RFC 4731).
    ESearch {
        tag: Option<Tag>,
        uid: bool,
        items: Vec<ESearchItem>,
    },
    /// `* SORT ...` (RFC 5256).
    Sort(Vec<SeqNo>),
    Flags(Vec<Flag>),
    Exists(u32),
    Recent(u32),
    Expunge(SeqNo),
    /// `* ENABLED ...` (RFC 5161).
    Enabled(Vec<Capability>),
    /// `* NAMESPACE ...` (RFC 2342).
    Namespace {
        personal: Vec<NamespaceDescr>,
        other_users: Vec<NamespaceDescr>,
        shared: Vec<NamespaceDescr>,
    },
    /// `* ID ...` (RFC 2971). `None` is wire `NIL`.
    Id(Option<Vec<(NString, NString)>>),
    /// `* QUOTA ...` (RFC 2087 / RFC 9208).
    Quota {
        root: NString,
        quotas: Vec1<QuotaGet>,
    },
    /// `* QUOTAROOT ...` (RFC 2087 / RFC 9208).
    QuotaRoot {
        mailbox: Mailbox,
        roots: Vec<NString>,
    },
    /// `* METADATA ...` (RFC 5464).
    Metadata {
        mailbox: Mailbox,
        items: MetadataData,
    },
    /// `* VANISHED [(EARLIER)] ...` (RFC 7162).
    Vanished {
        earlier: bool,
        uids: SequenceSet,
    },
    /// `* GENURLAUTH ...` (RFC 4467).
    GenUrlAuth(Vec1<IString>),
    /// `* URLFETCH url nstring ...` (RFC 4467).
    UrlFetch(Vec<(IString, NString)>),
}

/// One item of ESEARCH response data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ESearchItem {
    Min(u32),
    Max(u32),
    All(SequenceSet),
    Count(u32),
    ModSeq(u64),
}

/// `quota-resource` usage/limit pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaGet {
    pub resource: Atom,
    pub usage: u64,
    pub limit: u64,
}

/// One namespace description, `("prefix" "delimiter")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDescr {
    pub prefix: NString,
    pub delimiter: Option<QuotedChar>,
}

/// METADATA response payload: entries with values, or just entry names
/// (unsolicited change notifications).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataData {
    WithValues(Vec1<(NString, NString)>),
    WithoutValues(Vec1<NString>),
}

/// A server continuation request line (`+ ...`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContinuationRequest {
    /// Free-form response text.
    Basic(ResponseText),
    /// Base64 payload, e.g., a SASL challenge.
    Base64(Vec<u8>),
}
