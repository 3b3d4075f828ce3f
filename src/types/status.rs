//! STATUS data items.

use std::num::NonZeroU32;

/// An item name in a STATUS command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusDataItemName {
    /// The number of messages in the mailbox.
    Messages,
    /// The number of messages with the \Recent flag set.
    Recent,
    /// The next unique identifier value of the mailbox.
    UidNext,
    /// The unique identifier validity value of the mailbox.
    UidValidity,
    /// The number of messages which do not have the \Seen flag set.
    Unseen,
    /// The number of messages with the \Deleted flag set (RFC 9051).
    Deleted,
    /// The amount of storage that would be freed by an EXPUNGE (RFC 9208).
    DeletedStorage,
    /// The highest mod-sequence of all messages (RFC 7162).
    HighestModSeq,
}

/// An item in STATUS response data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusDataItem {
    Messages(u32),
    Recent(u32),
    UidNext(NonZeroU32),
    UidValidity(NonZeroU32),
    Unseen(u32),
    Deleted(u32),
    DeletedStorage(u64),
    HighestModSeq(u64),
}
