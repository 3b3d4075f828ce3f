//! Command-related types.

use std::num::NonZeroU32;

use crate::types::{
    auth::AuthMechanism,
    core::{Atom, IString, Tag, TagError, Vec1},
    datetime::DateTime,
    fetch::MacroOrMessageDataItemNames,
    flag::{Flag, StoreResponse, StoreType},
    mailbox::{ListMailbox, Mailbox},
    response::Capability,
    search::{SearchKey, SearchReturnOption, SortCriterion},
    sequence::SequenceSet,
    status::StatusDataItemName,
};

/// A tagged command ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub tag: Tag,
    pub body: CommandBody,
}

impl Command {
    pub fn new<T>(tag: T, body: CommandBody) -> Result<Self, TagError>
    where
        T: TryInto<Tag, Error = TagError>,
    {
        Ok(Self {
            tag: tag.try_into()?,
            body,
        })
    }
}

/// The body of every supported command.
///
/// UID variants of SEARCH, FETCH, STORE, COPY, and MOVE are expressed
/// through the `uid` field of the respective variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandBody {
    // ----- any state -----
    Capability,
    Noop,
    Logout,

    // ----- not authenticated -----
    StartTls,
    Authenticate {
        mechanism: AuthMechanism,
        /// SASL-IR initial response (RFC 4959). An empty vector encodes as `=`.
        initial_response: Option<Vec<u8>>,
    },
    Login {
        username: IString,
        password: IString,
    },

    // ----- authenticated -----
    Select {
        mailbox: Mailbox,
        parameters: Vec<SelectParameter>,
    },
    Examine {
        mailbox: Mailbox,
        parameters: Vec<SelectParameter>,
    },
    Create {
        mailbox: Mailbox,
    },
    Delete {
        mailbox: Mailbox,
    },
    Rename {
        from: Mailbox,
        to: Mailbox,
    },
    Subscribe {
        mailbox: Mailbox,
    },
    Unsubscribe {
        mailbox: Mailbox,
    },
    List {
        reference: Mailbox,
        mailbox_wildcard: ListMailbox,
    },
    Lsub {
        reference: Mailbox,
        mailbox_wildcard: ListMailbox,
    },
    Status {
        mailbox: Mailbox,
        item_names: Vec<StatusDataItemName>,
    },
    /// One-shot APPEND with the message already in memory.
    ///
    /// Use [`AppendSubcommand`](crate::types::command::AppendSubcommand)
    /// parts to stream a message (or CATENATE parts) instead.
    Append {
        mailbox: Mailbox,
        flags: Vec<Flag>,
        date: Option<DateTime>,
        message: Vec<u8>,
    },
    Idle,
    Enable {
        capabilities: Vec1<Capability>,
    },

    // ----- selected -----
    Check,
    Close,
    Unselect,
    Expunge,
    /// `UID EXPUNGE` (RFC 4315).
    ExpungeUid {
        sequence_set: SequenceSet,
    },
    Search {
        charset: Option<crate::types::core::Charset>,
        /// ESEARCH result options (RFC 4731); empty means a classic SEARCH.
        return_options: Vec<SearchReturnOption>,
        criteria: Vec1<SearchKey>,
        uid: bool,
    },
    /// SORT (RFC 5256), with optional ESORT return options (RFC 5267).
    Sort {
        sort_criteria: Vec1<SortCriterion>,
        charset: crate::types::core::Charset,
        return_options: Vec<SearchReturnOption>,
        search_criteria: Vec1<SearchKey>,
        uid: bool,
    },
    Fetch {
        sequence_set: SequenceSet,
        macro_or_item_names: MacroOrMessageDataItemNames,
        modifiers: Vec<FetchModifier>,
        uid: bool,
    },
    Store {
        sequence_set: SequenceSet,
        kind: StoreType,
        response: StoreResponse,
        flags: Vec<Flag>,
        modifiers: Vec<StoreModifier>,
        uid: bool,
    },
    Copy {
        sequence_set: SequenceSet,
        mailbox: Mailbox,
        uid: bool,
    },
    /// MOVE (RFC 6851).
    Move {
        sequence_set: SequenceSet,
        mailbox: Mailbox,
        uid: bool,
    },

    // ----- extensions -----
    /// ID (RFC 2971). `None` encodes as `NIL`.
    Id {
        parameters: Option<Vec<(IString, Option<IString>)>>,
    },
    /// NAMESPACE (RFC 2342).
    Namespace,
    /// GETQUOTA (RFC 2087 / RFC 9208).
    GetQuota {
        root: IString,
    },
    /// GETQUOTAROOT (RFC 2087 / RFC 9208).
    GetQuotaRoot {
        mailbox: Mailbox,
    },
    /// SETQUOTA (RFC 2087 / RFC 9208).
    SetQuota {
        root: IString,
        quotas: Vec<QuotaSet>,
    },
    /// GETMETADATA (RFC 5464).
    GetMetadata {
        options: Vec<MetadataOption>,
        mailbox: Mailbox,
        entries: Vec1<IString>,
    },
    /// SETMETADATA (RFC 5464).
    SetMetadata {
        mailbox: Mailbox,
        entry_values: Vec1<MetadataEntryValue>,
    },
    /// GENURLAUTH (RFC 4467).
    GenUrlAuth {
        rumps: Vec1<UrlRumpMechanism>,
    },
    /// URLFETCH (RFC 4467).
    UrlFetch {
        urls: Vec1<IString>,
    },
    /// RESETKEY (RFC 4467).
    ResetKey {
        mailbox: Option<Mailbox>,
        mechanisms: Vec<Atom>,
    },
}

impl CommandBody {
    pub fn login<U, P>(username: U, password: P) -> Result<Self, LoginError>
    where
        U: TryInto<IString, Error = crate::types::core::IStringError>,
        P: TryInto<IString, Error = crate::types::core::IStringError>,
    {
        Ok(Self::Login {
            username: username.try_into().map_err(LoginError::Username)?,
            password: password.try_into().map_err(LoginError::Password)?,
        })
    }

    pub fn select(mailbox: Mailbox) -> Self {
        Self::Select {
            mailbox,
            parameters: Vec::new(),
        }
    }

    pub fn fetch<S>(
        sequence_set: S,
        macro_or_item_names: impl Into<MacroOrMessageDataItemNames>,
        uid: bool,
    ) -> Result<Self, S::Error>
    where
        S: TryInto<SequenceSet>,
    {
        Ok(Self::Fetch {
            sequence_set: sequence_set.try_into()?,
            macro_or_item_names: macro_or_item_names.into(),
            modifiers: Vec::new(),
            uid,
        })
    }

    pub fn search(criteria: Vec1<SearchKey>, uid: bool) -> Self {
        Self::Search {
            charset: None,
            return_options: Vec::new(),
            criteria,
            uid,
        }
    }
}

#[derive(Clone, Debug, Eq, Hash, PartialEq, thiserror::Error)]
pub enum LoginError {
    #[error("Invalid username: {0}")]
    Username(#[source] crate::types::core::IStringError),
    #[error("Invalid password: {0}")]
    Password(#[source] crate::types::core::IStringError),
}

/// `select-param` (RFC 7162).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectParameter {
    /// `(CONDSTORE)`
    CondStore,
    /// `(QRESYNC (uidvalidity modseq [known-uids]))`
    QResync {
        uid_validity: NonZeroU32,
        mod_seq: u64,
        known_uids: Option<SequenceSet>,
    },
}

/// `fetch-modifier` (RFC 4466 / RFC 7162).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchModifier {
    /// `CHANGEDSINCE n`
    ChangedSince(u64),
    /// `VANISHED` (only valid for UID FETCH with QRESYNC enabled).
    Vanished,
}

/// `store-modifier` (RFC 7162).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreModifier {
    /// `UNCHANGEDSINCE n`
    UnchangedSince(u64),
}

/// `setquota-resource`, e.g., `STORAGE 512`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaSet {
    pub resource: Atom,
    pub limit: u64,
}

/// GETMETADATA option (RFC 5464).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataOption {
    MaxSize(u32),
    Depth(MetadataDepth),
}

/// `DEPTH 0 / 1 / infinity` (RFC 5464).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataDepth {
    Zero,
    One,
    Infinity,
}

/// One `entry value` pair for SETMETADATA. `None` removes the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntryValue {
    pub entry: IString,
    pub value: Option<Vec<u8>>,
}

/// One `url-rump mechanism` pair for GENURLAUTH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRumpMechanism {
    pub url_rump: IString,
    /// `INTERNAL` in practice.
    pub mechanism: Atom,
}

// ----- write stream parts -----

/// The user-facing write type of the engine.
///
/// Most traffic is [`CommandStreamPart::Tagged`]; the remaining variants
/// exist for flows where a single command spans several user actions:
/// streamed APPEND/CATENATE, `DONE` after IDLE, and AUTHENTICATE
/// challenge responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStreamPart {
    Tagged(Command),
    Append(AppendSubcommand),
    /// `DONE\r\n`, ends an IDLE session.
    IdleDone,
    /// A SASL response; encodes as base64 + CRLF.
    ContinuationResponse(Vec<u8>),
}

/// One step of a streamed APPEND command.
///
/// Legal sequences form
/// `Start (BeginMessage MessageBytes* EndMessage
///        | BeginCatenate (CatenateUrl | CatenateData...)* EndCatenate)* Finish`;
/// the engine rejects anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendSubcommand {
    /// `tag APPEND mailbox`
    Start { tag: Tag, mailbox: Mailbox },
    /// Announces a message of exactly `byte_count` bytes.
    BeginMessage {
        options: AppendOptions,
        byte_count: u32,
    },
    /// A slice of the announced message.
    MessageBytes(Vec<u8>),
    /// The announced message is complete.
    EndMessage,
    /// Opens a `CATENATE (...)` list (RFC 4469).
    BeginCatenate { options: AppendOptions },
    /// `URL <url>` catenate element.
    CatenateUrl(IString),
    /// `TEXT {N}` catenate element, streamed like a message.
    CatenateData(CatenatePart),
    /// Closes the `CATENATE (...)` list.
    EndCatenate,
    /// Terminates the APPEND command line.
    Finish,
}

/// The streamed payload of a `CATENATE ... TEXT` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatenatePart {
    Begin { byte_count: u32 },
    Bytes(Vec<u8>),
    End,
}

/// Flags/date metadata for one appended message, plus whether its payload
/// must go out as a binary literal (`~{N}`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppendOptions {
    pub flags: Vec<Flag>,
    pub date: Option<DateTime>,
    pub binary: bool,
}
