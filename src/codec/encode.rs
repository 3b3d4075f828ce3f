//! Grammar writers: every supported production as a pure value → bytes
//! function over [`EncodeBuffer`].

use std::{io, io::Write, num::NonZeroU32};

use base64::{engine::general_purpose::STANDARD as base64, Engine};

use crate::{
    codec::{Chunk, EncodeBuffer, EncodingOptions},
    types::{
        auth::AuthMechanism,
        command::{
            AppendOptions, Command, CommandBody, FetchModifier, MetadataDepth, MetadataEntryValue,
            MetadataOption, QuotaSet, SelectParameter, StoreModifier, UrlRumpMechanism,
        },
        core::{Atom, Charset, IString, Tag},
        datetime::{DateTime, NaiveDate},
        fetch::{MacroOrMessageDataItemNames, Macro, MessageDataItemName, Part, Section},
        flag::{Flag, StoreResponse, StoreType},
        mailbox::{ListMailbox, Mailbox},
        response::Capability,
        search::{SearchKey, SearchReturnOption, SortCriterion},
        sequence::{SeqOrUid, Sequence, SequenceSet},
        status::StatusDataItemName,
    },
};

/// Implemented by values that know their own wire form.
pub(crate) trait EncodeIntoBuffer {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()>;
}

pub(crate) fn join<T: EncodeIntoBuffer>(
    items: &[T],
    separator: &[u8],
    buf: &mut EncodeBuffer,
) -> io::Result<()> {
    if let Some((first, tail)) = items.split_first() {
        first.encode_into(buf)?;

        for item in tail {
            buf.write_bytes(separator);
            item.encode_into(buf)?;
        }
    }

    Ok(())
}

/// Encodes a complete tagged command into its chunk sequence.
///
/// Simple commands yield one chunk; a command with K synchronizing literals
/// yields K+1 chunks.
pub fn encode_command(command: &Command, options: EncodingOptions) -> io::Result<Vec<Chunk>> {
    let mut buf = EncodeBuffer::new(options);
    command.encode_into(&mut buf)?;
    Ok(buf.into_chunks())
}

pub(crate) fn encode_idle_done() -> Chunk {
    Chunk {
        bytes: b"DONE\r\n".to_vec(),
        wait_for_continuation: false,
    }
}

pub(crate) fn encode_continuation_response(data: &[u8]) -> Chunk {
    let mut bytes = base64.encode(data).into_bytes();
    bytes.extend_from_slice(b"\r\n");

    Chunk {
        bytes,
        wait_for_continuation: false,
    }
}

// ----- streamed APPEND -----

pub(crate) fn encode_append_start(
    tag: &Tag,
    mailbox: &Mailbox,
    options: EncodingOptions,
) -> io::Result<Vec<Chunk>> {
    let mut buf = EncodeBuffer::new(options);
    tag.encode_into(&mut buf)?;
    buf.write_str(" APPEND ");
    mailbox.encode_into(&mut buf)?;
    Ok(buf.into_chunks())
}

pub(crate) fn encode_append_begin_message(
    append_options: &AppendOptions,
    byte_count: u32,
    options: EncodingOptions,
) -> io::Result<Vec<Chunk>> {
    let mut buf = EncodeBuffer::new(options);
    write_append_options(append_options, &mut buf)?;
    buf.write_literal_header(byte_count as usize, append_options.binary)?;
    Ok(buf.into_chunks())
}

pub(crate) fn encode_append_begin_catenate(
    append_options: &AppendOptions,
    options: EncodingOptions,
) -> io::Result<Vec<Chunk>> {
    let mut buf = EncodeBuffer::new(options);
    write_append_options(append_options, &mut buf)?;
    buf.write_str("CATENATE (");
    Ok(buf.into_chunks())
}

pub(crate) fn encode_catenate_url(
    url: &IString,
    first: bool,
    options: EncodingOptions,
) -> io::Result<Vec<Chunk>> {
    let mut buf = EncodeBuffer::new(options);
    if !first {
        buf.write_str(" ");
    }
    buf.write_str("URL ");
    buf.write_string(url.inner())?;
    Ok(buf.into_chunks())
}

pub(crate) fn encode_catenate_data_begin(
    byte_count: u32,
    first: bool,
    options: EncodingOptions,
) -> io::Result<Vec<Chunk>> {
    let mut buf = EncodeBuffer::new(options);
    if !first {
        buf.write_str(" ");
    }
    buf.write_str("TEXT ");
    buf.write_literal_header(byte_count as usize, false)?;
    Ok(buf.into_chunks())
}

pub(crate) fn encode_append_end_catenate() -> Chunk {
    Chunk {
        bytes: b")".to_vec(),
        wait_for_continuation: false,
    }
}

pub(crate) fn encode_append_finish() -> Chunk {
    Chunk {
        bytes: b"\r\n".to_vec(),
        wait_for_continuation: false,
    }
}

fn write_append_options(options: &AppendOptions, buf: &mut EncodeBuffer) -> io::Result<()> {
    buf.write_str(" ");

    if !options.flags.is_empty() {
        buf.write_str("(");
        join(&options.flags, b" ", buf)?;
        buf.write_str(") ");
    }

    if let Some(date) = &options.date {
        date.encode_into(buf)?;
        buf.write_str(" ");
    }

    Ok(())
}

// ----- primitives -----

impl EncodeIntoBuffer for u32 {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        write!(buf, "{self}")
    }
}

impl EncodeIntoBuffer for u64 {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        write!(buf, "{self}")
    }
}

impl EncodeIntoBuffer for NonZeroU32 {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        write!(buf, "{self}")
    }
}

impl EncodeIntoBuffer for Tag {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        buf.write_str(self.inner());
        Ok(())
    }
}

impl EncodeIntoBuffer for Atom {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        buf.write_str(self.inner());
        Ok(())
    }
}

impl EncodeIntoBuffer for IString {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        buf.write_string(self.inner())
    }
}

impl EncodeIntoBuffer for Charset {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        if self.is_atom() {
            buf.write_str(self.inner());
        } else {
            // Charset content excludes quoted-specials, so no escaping.
            write!(buf, "\"{}\"", self.inner())?;
        }

        Ok(())
    }
}

impl EncodeIntoBuffer for Mailbox {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        match self {
            Mailbox::Inbox => {
                buf.write_str("INBOX");
                Ok(())
            }
            Mailbox::Other(other) => buf.write_string(other.inner()),
        }
    }
}

impl EncodeIntoBuffer for ListMailbox {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        match self {
            ListMailbox::Token(token) => {
                buf.write_str(token);
                Ok(())
            }
            ListMailbox::String(istr) => buf.write_string(istr.inner()),
        }
    }
}

impl EncodeIntoBuffer for Flag {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        write!(buf, "{self}")
    }
}

impl EncodeIntoBuffer for Capability {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        write!(buf, "{self}")
    }
}

impl EncodeIntoBuffer for AuthMechanism {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        write!(buf, "{self}")
    }
}

impl EncodeIntoBuffer for DateTime {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        write!(buf, "\"{}\"", self.as_ref().format("%d-%b-%Y %H:%M:%S %z"))
    }
}

impl EncodeIntoBuffer for NaiveDate {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        write!(buf, "\"{}\"", self.as_ref().format("%d-%b-%Y"))
    }
}

// ----- sequence sets -----

impl EncodeIntoBuffer for SequenceSet {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        join(self.0.as_ref(), b",", buf)
    }
}

impl EncodeIntoBuffer for Sequence {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        match self {
            Sequence::Single(seq) => seq.encode_into(buf),
            Sequence::Range(from, to) => {
                from.encode_into(buf)?;
                buf.write_str(":");
                to.encode_into(buf)
            }
        }
    }
}

impl EncodeIntoBuffer for SeqOrUid {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        match self {
            SeqOrUid::Value(value) => write!(buf, "{value}"),
            SeqOrUid::Asterisk => {
                buf.write_str("*");
                Ok(())
            }
        }
    }
}

// ----- status items -----

impl EncodeIntoBuffer for StatusDataItemName {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        buf.write_str(match self {
            Self::Messages => "MESSAGES",
            Self::Recent => "RECENT",
            Self::UidNext => "UIDNEXT",
            Self::UidValidity => "UIDVALIDITY",
            Self::Unseen => "UNSEEN",
            Self::Deleted => "DELETED",
            Self::DeletedStorage => "DELETED-STORAGE",
            Self::HighestModSeq => "HIGHESTMODSEQ",
        });

        Ok(())
    }
}

// ----- search -----

impl EncodeIntoBuffer for SearchKey {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        match self {
            SearchKey::All => buf.write_str("ALL"),
            SearchKey::Answered => buf.write_str("ANSWERED"),
            SearchKey::Bcc(astring) => {
                buf.write_str("BCC ");
                return astring.encode_into(buf);
            }
            SearchKey::Before(date) => {
                buf.write_str("BEFORE ");
                return date.encode_into(buf);
            }
            SearchKey::Body(astring) => {
                buf.write_str("BODY ");
                return astring.encode_into(buf);
            }
            SearchKey::Cc(astring) => {
                buf.write_str("CC ");
                return astring.encode_into(buf);
            }
            SearchKey::Deleted => buf.write_str("DELETED"),
            SearchKey::Draft => buf.write_str("DRAFT"),
            SearchKey::Flagged => buf.write_str("FLAGGED"),
            SearchKey::From(astring) => {
                buf.write_str("FROM ");
                return astring.encode_into(buf);
            }
            SearchKey::Header(name, value) => {
                buf.write_str("HEADER ");
                name.encode_into(buf)?;
                buf.write_str(" ");
                return value.encode_into(buf);
            }
            SearchKey::Keyword(flag) => {
                buf.write_str("KEYWORD ");
                return flag.encode_into(buf);
            }
            SearchKey::Larger(number) => return write!(buf, "LARGER {number}"),
            SearchKey::ModSeq(mod_seq) => return write!(buf, "MODSEQ {mod_seq}"),
            SearchKey::New => buf.write_str("NEW"),
            SearchKey::Not(key) => {
                buf.write_str("NOT ");
                return key.encode_into(buf);
            }
            SearchKey::Old => buf.write_str("OLD"),
            SearchKey::On(date) => {
                buf.write_str("ON ");
                return date.encode_into(buf);
            }
            SearchKey::Or(a, b) => {
                buf.write_str("OR ");
                a.encode_into(buf)?;
                buf.write_str(" ");
                return b.encode_into(buf);
            }
            SearchKey::Recent => buf.write_str("RECENT"),
            SearchKey::Seen => buf.write_str("SEEN"),
            SearchKey::SentBefore(date) => {
                buf.write_str("SENTBEFORE ");
                return date.encode_into(buf);
            }
            SearchKey::SentOn(date) => {
                buf.write_str("SENTON ");
                return date.encode_into(buf);
            }
            SearchKey::SentSince(date) => {
                buf.write_str("SENTSINCE ");
                return date.encode_into(buf);
            }
            SearchKey::Since(date) => {
                buf.write_str("SINCE ");
                return date.encode_into(buf);
            }
            SearchKey::Smaller(number) => return write!(buf, "SMALLER {number}"),
            SearchKey::Subject(astring) => {
                buf.write_str("SUBJECT ");
                return astring.encode_into(buf);
            }
            SearchKey::Text(astring) => {
                buf.write_str("TEXT ");
                return astring.encode_into(buf);
            }
            SearchKey::To(astring) => {
                buf.write_str("TO ");
                return astring.encode_into(buf);
            }
            SearchKey::Uid(sequence_set) => {
                buf.write_str("UID ");
                return sequence_set.encode_into(buf);
            }
            SearchKey::Unanswered => buf.write_str("UNANSWERED"),
            SearchKey::Undeleted => buf.write_str("UNDELETED"),
            SearchKey::Undraft => buf.write_str("UNDRAFT"),
            SearchKey::Unflagged => buf.write_str("UNFLAGGED"),
            SearchKey::Unkeyword(flag) => {
                buf.write_str("UNKEYWORD ");
                return flag.encode_into(buf);
            }
            SearchKey::Unseen => buf.write_str("UNSEEN"),
            SearchKey::SequenceSet(sequence_set) => return sequence_set.encode_into(buf),
            SearchKey::And(keys) => {
                buf.write_str("(");
                join(keys.as_ref(), b" ", buf)?;
                buf.write_str(")");
            }
        }

        Ok(())
    }
}

impl EncodeIntoBuffer for SearchReturnOption {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        write!(buf, "{self}")
    }
}

impl EncodeIntoBuffer for SortCriterion {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        if self.reverse {
            buf.write_str("REVERSE ");
        }

        write!(buf, "{}", self.key)
    }
}

// ----- fetch items -----

impl EncodeIntoBuffer for Macro {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        write!(buf, "{self}")
    }
}

impl EncodeIntoBuffer for MacroOrMessageDataItemNames {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        match self {
            Self::Macro(m) => m.encode_into(buf),
            Self::MessageDataItemNames(names) => {
                if names.len() == 1 {
                    names[0].encode_into(buf)
                } else {
                    buf.write_str("(");
                    join(names.as_slice(), b" ", buf)?;
                    buf.write_str(")");
                    Ok(())
                }
            }
        }
    }
}

impl EncodeIntoBuffer for MessageDataItemName {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        match self {
            Self::Body => buf.write_str("BODY"),
            Self::BodyExt {
                section,
                partial,
                peek,
            } => {
                if *peek {
                    buf.write_str("BODY.PEEK[");
                } else {
                    buf.write_str("BODY[");
                }
                if let Some(section) = section {
                    section.encode_into(buf)?;
                }
                buf.write_str("]");
                if let Some((start, length)) = partial {
                    write!(buf, "<{start}.{length}>")?;
                }
            }
            Self::BodyStructure => buf.write_str("BODYSTRUCTURE"),
            Self::Binary {
                section,
                partial,
                peek,
            } => {
                buf.write_str("BINARY");
                if *peek {
                    buf.write_str(".PEEK");
                }
                buf.write_str("[");
                join(section, b".", buf)?;
                buf.write_str("]");
                if let Some((start, length)) = partial {
                    write!(buf, "<{start}.{length}>")?;
                }
            }
            Self::BinarySize { section } => {
                buf.write_str("BINARY.SIZE[");
                join(section, b".", buf)?;
                buf.write_str("]");
            }
            Self::Envelope => buf.write_str("ENVELOPE"),
            Self::Flags => buf.write_str("FLAGS"),
            Self::InternalDate => buf.write_str("INTERNALDATE"),
            Self::Rfc822 => buf.write_str("RFC822"),
            Self::Rfc822Header => buf.write_str("RFC822.HEADER"),
            Self::Rfc822Size => buf.write_str("RFC822.SIZE"),
            Self::Rfc822Text => buf.write_str("RFC822.TEXT"),
            Self::Uid => buf.write_str("UID"),
            Self::ModSeq => buf.write_str("MODSEQ"),
            Self::GmailMessageId => buf.write_str("X-GM-MSGID"),
            Self::GmailThreadId => buf.write_str("X-GM-THRID"),
            Self::GmailLabels => buf.write_str("X-GM-LABELS"),
        }

        Ok(())
    }
}

impl EncodeIntoBuffer for Section {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        match self {
            Section::Part(part) => part.encode_into(buf),
            Section::Header(maybe_part) => {
                if let Some(part) = maybe_part {
                    part.encode_into(buf)?;
                    buf.write_str(".HEADER");
                } else {
                    buf.write_str("HEADER");
                }
                Ok(())
            }
            Section::HeaderFields(maybe_part, fields) => {
                if let Some(part) = maybe_part {
                    part.encode_into(buf)?;
                    buf.write_str(".HEADER.FIELDS (");
                } else {
                    buf.write_str("HEADER.FIELDS (");
                }
                join(fields.as_ref(), b" ", buf)?;
                buf.write_str(")");
                Ok(())
            }
            Section::HeaderFieldsNot(maybe_part, fields) => {
                if let Some(part) = maybe_part {
                    part.encode_into(buf)?;
                    buf.write_str(".HEADER.FIELDS.NOT (");
                } else {
                    buf.write_str("HEADER.FIELDS.NOT (");
                }
                join(fields.as_ref(), b" ", buf)?;
                buf.write_str(")");
                Ok(())
            }
            Section::Text(maybe_part) => {
                if let Some(part) = maybe_part {
                    part.encode_into(buf)?;
                    buf.write_str(".TEXT");
                } else {
                    buf.write_str("TEXT");
                }
                Ok(())
            }
            Section::Mime(part) => {
                part.encode_into(buf)?;
                buf.write_str(".MIME");
                Ok(())
            }
        }
    }
}

impl EncodeIntoBuffer for Part {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        join(self.0.as_ref(), b".", buf)
    }
}

// ----- command modifiers -----

impl EncodeIntoBuffer for SelectParameter {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        match self {
            Self::CondStore => {
                buf.write_str("CONDSTORE");
                Ok(())
            }
            Self::QResync {
                uid_validity,
                mod_seq,
                known_uids,
            } => {
                write!(buf, "QRESYNC ({uid_validity} {mod_seq}")?;
                if let Some(known_uids) = known_uids {
                    buf.write_str(" ");
                    known_uids.encode_into(buf)?;
                }
                buf.write_str(")");
                Ok(())
            }
        }
    }
}

impl EncodeIntoBuffer for FetchModifier {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        match self {
            Self::ChangedSince(mod_seq) => write!(buf, "CHANGEDSINCE {mod_seq}"),
            Self::Vanished => {
                buf.write_str("VANISHED");
                Ok(())
            }
        }
    }
}

impl EncodeIntoBuffer for StoreModifier {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        match self {
            Self::UnchangedSince(mod_seq) => write!(buf, "UNCHANGEDSINCE {mod_seq}"),
        }
    }
}

impl EncodeIntoBuffer for QuotaSet {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        self.resource.encode_into(buf)?;
        write!(buf, " {}", self.limit)
    }
}

impl EncodeIntoBuffer for MetadataOption {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        match self {
            Self::MaxSize(size) => write!(buf, "MAXSIZE {size}"),
            Self::Depth(depth) => {
                buf.write_str(match depth {
                    MetadataDepth::Zero => "DEPTH 0",
                    MetadataDepth::One => "DEPTH 1",
                    MetadataDepth::Infinity => "DEPTH infinity",
                });
                Ok(())
            }
        }
    }
}

impl EncodeIntoBuffer for MetadataEntryValue {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        self.entry.encode_into(buf)?;
        buf.write_str(" ");

        match &self.value {
            None => {
                buf.write_str("NIL");
                Ok(())
            }
            // Metadata values may be binary (RFC 5464 uses literals).
            Some(value) if value.contains(&0) => buf.write_literal8(value),
            Some(value) => buf.write_literal(value),
        }
    }
}

impl EncodeIntoBuffer for UrlRumpMechanism {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        buf.write_string(self.url_rump.inner())?;
        buf.write_str(" ");
        self.mechanism.encode_into(buf)
    }
}

// ----- command -----

impl EncodeIntoBuffer for Command {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        self.tag.encode_into(buf)?;
        buf.write_str(" ");
        self.body.encode_into(buf)?;
        buf.write_str("\r\n");
        Ok(())
    }
}

impl EncodeIntoBuffer for CommandBody {
    fn encode_into(&self, buf: &mut EncodeBuffer) -> io::Result<()> {
        match self {
            CommandBody::Capability => buf.write_str("CAPABILITY"),
            CommandBody::Noop => buf.write_str("NOOP"),
            CommandBody::Logout => buf.write_str("LOGOUT"),
            CommandBody::StartTls => buf.write_str("STARTTLS"),
            CommandBody::Authenticate {
                mechanism,
                initial_response,
            } => {
                buf.write_str("AUTHENTICATE ");
                mechanism.encode_into(buf)?;

                if let Some(initial_response) = initial_response {
                    buf.write_str(" ");

                    // RFC 4959: a zero-length initial response is a single
                    // pad character.
                    if initial_response.is_empty() {
                        buf.write_str("=");
                    } else {
                        buf.write_str(&base64.encode(initial_response));
                    }
                }
            }
            CommandBody::Login { username, password } => {
                buf.write_str("LOGIN ");
                username.encode_into(buf)?;
                buf.write_str(" ");
                password.encode_into(buf)?;
            }
            CommandBody::Select {
                mailbox,
                parameters,
            } => {
                buf.write_str("SELECT ");
                mailbox.encode_into(buf)?;
                if !parameters.is_empty() {
                    buf.write_str(" (");
                    join(parameters, b" ", buf)?;
                    buf.write_str(")");
                }
            }
            CommandBody::Examine {
                mailbox,
                parameters,
            } => {
                buf.write_str("EXAMINE ");
                mailbox.encode_into(buf)?;
                if !parameters.is_empty() {
                    buf.write_str(" (");
                    join(parameters, b" ", buf)?;
                    buf.write_str(")");
                }
            }
            CommandBody::Create { mailbox } => {
                buf.write_str("CREATE ");
                mailbox.encode_into(buf)?;
            }
            CommandBody::Delete { mailbox } => {
                buf.write_str("DELETE ");
                mailbox.encode_into(buf)?;
            }
            CommandBody::Rename { from, to } => {
                buf.write_str("RENAME ");
                from.encode_into(buf)?;
                buf.write_str(" ");
                to.encode_into(buf)?;
            }
            CommandBody::Subscribe { mailbox } => {
                buf.write_str("SUBSCRIBE ");
                mailbox.encode_into(buf)?;
            }
            CommandBody::Unsubscribe { mailbox } => {
                buf.write_str("UNSUBSCRIBE ");
                mailbox.encode_into(buf)?;
            }
            CommandBody::List {
                reference,
                mailbox_wildcard,
            } => {
                buf.write_str("LIST ");
                reference.encode_into(buf)?;
                buf.write_str(" ");
                mailbox_wildcard.encode_into(buf)?;
            }
            CommandBody::Lsub {
                reference,
                mailbox_wildcard,
            } => {
                buf.write_str("LSUB ");
                reference.encode_into(buf)?;
                buf.write_str(" ");
                mailbox_wildcard.encode_into(buf)?;
            }
            CommandBody::Status {
                mailbox,
                item_names,
            } => {
                buf.write_str("STATUS ");
                mailbox.encode_into(buf)?;
                buf.write_str(" (");
                join(item_names, b" ", buf)?;
                buf.write_str(")");
            }
            CommandBody::Append {
                mailbox,
                flags,
                date,
                message,
            } => {
                buf.write_str("APPEND ");
                mailbox.encode_into(buf)?;

                if !flags.is_empty() {
                    buf.write_str(" (");
                    join(flags, b" ", buf)?;
                    buf.write_str(")");
                }

                if let Some(date) = date {
                    buf.write_str(" ");
                    date.encode_into(buf)?;
                }

                buf.write_str(" ");
                if message.contains(&0) {
                    buf.write_literal8(message)?;
                } else {
                    buf.write_literal(message)?;
                }
            }
            CommandBody::Idle => buf.write_str("IDLE"),
            CommandBody::Enable { capabilities } => {
                buf.write_str("ENABLE ");
                join(capabilities.as_ref(), b" ", buf)?;
            }
            CommandBody::Check => buf.write_str("CHECK"),
            CommandBody::Close => buf.write_str("CLOSE"),
            CommandBody::Unselect => buf.write_str("UNSELECT"),
            CommandBody::Expunge => buf.write_str("EXPUNGE"),
            CommandBody::ExpungeUid { sequence_set } => {
                buf.write_str("UID EXPUNGE ");
                sequence_set.encode_into(buf)?;
            }
            CommandBody::Search {
                charset,
                return_options,
                criteria,
                uid,
            } => {
                if *uid {
                    buf.write_str("UID SEARCH");
                } else {
                    buf.write_str("SEARCH");
                }
                if !return_options.is_empty() {
                    buf.write_str(" RETURN (");
                    join(return_options, b" ", buf)?;
                    buf.write_str(")");
                }
                if let Some(charset) = charset {
                    buf.write_str(" CHARSET ");
                    charset.encode_into(buf)?;
                }
                buf.write_str(" ");
                join(criteria.as_ref(), b" ", buf)?;
            }
            CommandBody::Sort {
                sort_criteria,
                charset,
                return_options,
                search_criteria,
                uid,
            } => {
                if *uid {
                    buf.write_str("UID SORT");
                } else {
                    buf.write_str("SORT");
                }
                if !return_options.is_empty() {
                    buf.write_str(" RETURN (");
                    join(return_options, b" ", buf)?;
                    buf.write_str(")");
                }
                buf.write_str(" (");
                join(sort_criteria.as_ref(), b" ", buf)?;
                buf.write_str(") ");
                charset.encode_into(buf)?;
                buf.write_str(" ");
                join(search_criteria.as_ref(), b" ", buf)?;
            }
            CommandBody::Fetch {
                sequence_set,
                macro_or_item_names,
                modifiers,
                uid,
            } => {
                if *uid {
                    buf.write_str("UID FETCH ");
                } else {
                    buf.write_str("FETCH ");
                }
                sequence_set.encode_into(buf)?;
                buf.write_str(" ");
                macro_or_item_names.encode_into(buf)?;
                if !modifiers.is_empty() {
                    buf.write_str(" (");
                    join(modifiers, b" ", buf)?;
                    buf.write_str(")");
                }
            }
            CommandBody::Store {
                sequence_set,
                kind,
                response,
                flags,
                modifiers,
                uid,
            } => {
                if *uid {
                    buf.write_str("UID STORE ");
                } else {
                    buf.write_str("STORE ");
                }
                sequence_set.encode_into(buf)?;
                buf.write_str(" ");

                if !modifiers.is_empty() {
                    buf.write_str("(");
                    join(modifiers, b" ", buf)?;
                    buf.write_str(") ");
                }

                match kind {
                    StoreType::Add => buf.write_str("+"),
                    StoreType::Remove => buf.write_str("-"),
                    StoreType::Replace => {}
                }
                buf.write_str("FLAGS");
                match response {
                    StoreResponse::Answer => {}
                    StoreResponse::Silent => buf.write_str(".SILENT"),
                }
                buf.write_str(" (");
                join(flags, b" ", buf)?;
                buf.write_str(")");
            }
            CommandBody::Copy {
                sequence_set,
                mailbox,
                uid,
            } => {
                if *uid {
                    buf.write_str("UID COPY ");
                } else {
                    buf.write_str("COPY ");
                }
                sequence_set.encode_into(buf)?;
                buf.write_str(" ");
                mailbox.encode_into(buf)?;
            }
            CommandBody::Move {
                sequence_set,
                mailbox,
                uid,
            } => {
                if *uid {
                    buf.write_str("UID MOVE ");
                } else {
                    buf.write_str("MOVE ");
                }
                sequence_set.encode_into(buf)?;
                buf.write_str(" ");
                mailbox.encode_into(buf)?;
            }
            CommandBody::Id { parameters } => {
                buf.write_str("ID ");
                match parameters {
                    None => buf.write_str("NIL"),
                    Some(parameters) => {
                        if parameters.is_empty() {
                            buf.write_str("()");
                        } else {
                            buf.write_str("(");
                            let mut first = true;
                            for (key, value) in parameters {
                                if !first {
                                    buf.write_str(" ");
                                }
                                first = false;
                                key.encode_into(buf)?;
                                buf.write_str(" ");
                                match value {
                                    Some(value) => value.encode_into(buf)?,
                                    None => buf.write_str("NIL"),
                                }
                            }
                            buf.write_str(")");
                        }
                    }
                }
            }
            CommandBody::Namespace => buf.write_str("NAMESPACE"),
            CommandBody::GetQuota { root } => {
                buf.write_str("GETQUOTA ");
                root.encode_into(buf)?;
            }
            CommandBody::GetQuotaRoot { mailbox } => {
                buf.write_str("GETQUOTAROOT ");
                mailbox.encode_into(buf)?;
            }
            CommandBody::SetQuota { root, quotas } => {
                buf.write_str("SETQUOTA ");
                root.encode_into(buf)?;
                buf.write_str(" (");
                join(quotas, b" ", buf)?;
                buf.write_str(")");
            }
            CommandBody::GetMetadata {
                options,
                mailbox,
                entries,
            } => {
                buf.write_str("GETMETADATA");
                if !options.is_empty() {
                    buf.write_str(" (");
                    join(options, b" ", buf)?;
                    buf.write_str(")");
                }
                buf.write_str(" ");
                mailbox.encode_into(buf)?;
                buf.write_str(" ");
                if entries.len() == 1 {
                    entries.as_ref()[0].encode_into(buf)?;
                } else {
                    buf.write_str("(");
                    join(entries.as_ref(), b" ", buf)?;
                    buf.write_str(")");
                }
            }
            CommandBody::SetMetadata {
                mailbox,
                entry_values,
            } => {
                buf.write_str("SETMETADATA ");
                mailbox.encode_into(buf)?;
                buf.write_str(" (");
                join(entry_values.as_ref(), b" ", buf)?;
                buf.write_str(")");
            }
            CommandBody::GenUrlAuth { rumps } => {
                buf.write_str("GENURLAUTH ");
                join(rumps.as_ref(), b" ", buf)?;
            }
            CommandBody::UrlFetch { urls } => {
                buf.write_str("URLFETCH ");
                join(urls.as_ref(), b" ", buf)?;
            }
            CommandBody::ResetKey {
                mailbox,
                mechanisms,
            } => {
                buf.write_str("RESETKEY");
                if let Some(mailbox) = mailbox {
                    buf.write_str(" ");
                    mailbox.encode_into(buf)?;
                    for mechanism in mechanisms {
                        buf.write_str(" ");
                        mechanism.encode_into(buf)?;
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        testing::known_answer_test_encode,
        types::{
            core::Vec1,
            fetch::Macro,
            search::SearchKey,
        },
    };

    fn cmd(tag: &str, body: CommandBody) -> Command {
        Command::new(tag, body).unwrap()
    }

    #[test]
    fn test_encode_simple_commands() {
        let tests: &[(Command, &[u8])] = &[
            (cmd("a", CommandBody::Capability), b"a CAPABILITY\r\n"),
            (cmd("a", CommandBody::Noop), b"a NOOP\r\n"),
            (cmd("A23", CommandBody::Logout), b"A23 LOGOUT\r\n"),
            (cmd("a", CommandBody::StartTls), b"a STARTTLS\r\n"),
            (cmd("A2", CommandBody::Idle), b"A2 IDLE\r\n"),
            (cmd("a", CommandBody::Check), b"a CHECK\r\n"),
            (cmd("a", CommandBody::Close), b"a CLOSE\r\n"),
            (cmd("a", CommandBody::Unselect), b"a UNSELECT\r\n"),
            (cmd("a", CommandBody::Expunge), b"a EXPUNGE\r\n"),
            (cmd("a", CommandBody::Namespace), b"a NAMESPACE\r\n"),
        ];

        for (command, expected) in tests {
            known_answer_test_encode(command, expected);
        }
    }

    #[test]
    fn test_encode_login() {
        known_answer_test_encode(
            &cmd("a", CommandBody::login("foo", "bar").unwrap()),
            b"a LOGIN \"foo\" \"bar\"\r\n",
        );
    }

    #[test]
    fn test_encode_authenticate() {
        known_answer_test_encode(
            &cmd(
                "A1",
                CommandBody::Authenticate {
                    mechanism: AuthMechanism::Gssapi,
                    initial_response: None,
                },
            ),
            b"A1 AUTHENTICATE GSSAPI\r\n",
        );
        known_answer_test_encode(
            &cmd(
                "A1",
                CommandBody::Authenticate {
                    mechanism: AuthMechanism::Plain,
                    initial_response: Some(b"".to_vec()),
                },
            ),
            b"A1 AUTHENTICATE PLAIN =\r\n",
        );
        known_answer_test_encode(
            &cmd(
                "A1",
                CommandBody::Authenticate {
                    mechanism: AuthMechanism::Plain,
                    initial_response: Some(b"\x00alice\x00pass".to_vec()),
                },
            ),
            b"A1 AUTHENTICATE PLAIN AGFsaWNlAHBhc3M=\r\n",
        );
    }

    #[test]
    fn test_encode_mailbox_commands() {
        known_answer_test_encode(
            &cmd(
                "a",
                CommandBody::select(Mailbox::try_from("inbox").unwrap()),
            ),
            b"a SELECT INBOX\r\n",
        );
        known_answer_test_encode(
            &cmd(
                "a",
                CommandBody::Rename {
                    from: Mailbox::try_from("old").unwrap(),
                    to: Mailbox::try_from("new").unwrap(),
                },
            ),
            b"a RENAME \"old\" \"new\"\r\n",
        );
        known_answer_test_encode(
            &cmd(
                "a",
                CommandBody::List {
                    reference: Mailbox::try_from("").unwrap(),
                    mailbox_wildcard: ListMailbox::try_from("INBOX.*").unwrap(),
                },
            ),
            b"a LIST \"\" INBOX.*\r\n",
        );
        known_answer_test_encode(
            &cmd(
                "a",
                CommandBody::Status {
                    mailbox: Mailbox::Inbox,
                    item_names: vec![
                        StatusDataItemName::Messages,
                        StatusDataItemName::UidNext,
                    ],
                },
            ),
            b"a STATUS INBOX (MESSAGES UIDNEXT)\r\n",
        );
    }

    #[test]
    fn test_encode_select_qresync() {
        known_answer_test_encode(
            &cmd(
                "a",
                CommandBody::Select {
                    mailbox: Mailbox::Inbox,
                    parameters: vec![SelectParameter::QResync {
                        uid_validity: NonZeroU32::new(67890007).unwrap(),
                        mod_seq: 20050715194045000,
                        known_uids: Some(SequenceSet::try_from("41,43:211,214:541").unwrap()),
                    }],
                },
            ),
            b"a SELECT INBOX (QRESYNC (67890007 20050715194045000 41,43:211,214:541))\r\n",
        );
    }

    #[test]
    fn test_encode_fetch() {
        known_answer_test_encode(
            &cmd(
                "a",
                CommandBody::fetch("1:5", Macro::Fast, false).unwrap(),
            ),
            b"a FETCH 1:5 FAST\r\n",
        );
        known_answer_test_encode(
            &cmd(
                "a",
                CommandBody::Fetch {
                    sequence_set: SequenceSet::try_from("1:*").unwrap(),
                    macro_or_item_names: MacroOrMessageDataItemNames::MessageDataItemNames(vec![
                        MessageDataItemName::Flags,
                        MessageDataItemName::BodyExt {
                            section: Some(Section::Text(None)),
                            partial: None,
                            peek: true,
                        },
                    ]),
                    modifiers: vec![FetchModifier::ChangedSince(12345)],
                    uid: true,
                },
            ),
            b"a UID FETCH 1:* (FLAGS BODY.PEEK[TEXT]) (CHANGEDSINCE 12345)\r\n",
        );
    }

    #[test]
    fn test_encode_store() {
        known_answer_test_encode(
            &cmd(
                "a",
                CommandBody::Store {
                    sequence_set: SequenceSet::try_from("2:4").unwrap(),
                    kind: StoreType::Add,
                    response: StoreResponse::Silent,
                    flags: vec![Flag::Deleted],
                    modifiers: vec![],
                    uid: false,
                },
            ),
            b"a STORE 2:4 +FLAGS.SILENT (\\Deleted)\r\n",
        );
        known_answer_test_encode(
            &cmd(
                "a",
                CommandBody::Store {
                    sequence_set: SequenceSet::try_from("7").unwrap(),
                    kind: StoreType::Replace,
                    response: StoreResponse::Answer,
                    flags: vec![Flag::Seen],
                    modifiers: vec![StoreModifier::UnchangedSince(320162338)],
                    uid: true,
                },
            ),
            b"a UID STORE 7 (UNCHANGEDSINCE 320162338) FLAGS (\\Seen)\r\n",
        );
    }

    #[test]
    fn test_encode_search() {
        known_answer_test_encode(
            &cmd(
                "a",
                CommandBody::search(
                    Vec1::try_from(vec![
                        SearchKey::Unseen,
                        SearchKey::From(IString::try_from("smith").unwrap()),
                    ])
                    .unwrap(),
                    false,
                ),
            ),
            b"a SEARCH UNSEEN FROM \"smith\"\r\n",
        );
        known_answer_test_encode(
            &cmd(
                "a",
                CommandBody::Search {
                    charset: None,
                    return_options: vec![SearchReturnOption::Min, SearchReturnOption::Count],
                    criteria: Vec1::from(SearchKey::All),
                    uid: true,
                },
            ),
            b"a UID SEARCH RETURN (MIN COUNT) ALL\r\n",
        );
    }

    #[test]
    fn test_encode_extension_commands() {
        known_answer_test_encode(
            &cmd(
                "a",
                CommandBody::Enable {
                    capabilities: Vec1::from(Capability::QResync),
                },
            ),
            b"a ENABLE QRESYNC\r\n",
        );
        known_answer_test_encode(
            &cmd(
                "a",
                CommandBody::ExpungeUid {
                    sequence_set: SequenceSet::try_from("3000:3002").unwrap(),
                },
            ),
            b"a UID EXPUNGE 3000:3002\r\n",
        );
        known_answer_test_encode(
            &cmd("a", CommandBody::Id { parameters: None }),
            b"a ID NIL\r\n",
        );
        known_answer_test_encode(
            &cmd(
                "a",
                CommandBody::GetQuota {
                    root: IString::try_from("").unwrap(),
                },
            ),
            b"a GETQUOTA \"\"\r\n",
        );
        known_answer_test_encode(
            &cmd(
                "a",
                CommandBody::SetQuota {
                    root: IString::try_from("").unwrap(),
                    quotas: vec![QuotaSet {
                        resource: Atom::try_from("STORAGE").unwrap(),
                        limit: 512,
                    }],
                },
            ),
            b"a SETQUOTA \"\" (STORAGE 512)\r\n",
        );
        known_answer_test_encode(
            &cmd(
                "a",
                CommandBody::GetMetadata {
                    options: vec![MetadataOption::MaxSize(1024)],
                    mailbox: Mailbox::Inbox,
                    entries: Vec1::from(IString::try_from("/shared/comment").unwrap()),
                },
            ),
            b"a GETMETADATA (MAXSIZE 1024) INBOX \"/shared/comment\"\r\n",
        );
    }

    #[test]
    fn test_encode_append_one_shot() {
        known_answer_test_encode(
            &cmd(
                "a",
                CommandBody::Append {
                    mailbox: Mailbox::Inbox,
                    flags: vec![Flag::Seen],
                    date: None,
                    message: b"Subject: hi\r\n\r\nbody".to_vec(),
                },
            ),
            b"a APPEND INBOX (\\Seen) {19}\r\nSubject: hi\r\n\r\nbody\r\n",
        );
    }

    #[test]
    fn test_encode_command_chunks() {
        let chunks = encode_command(
            &cmd(
                "x",
                CommandBody::Rename {
                    from: Mailbox::try_from(b"\\".as_ref()).unwrap(),
                    to: Mailbox::try_from(b"\"".as_ref()).unwrap(),
                },
            ),
            EncodingOptions::default(),
        )
        .unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].bytes, b"x RENAME {1}\r\n");
        assert!(chunks[0].wait_for_continuation);
        assert_eq!(chunks[1].bytes, b"\\ {1}\r\n");
        assert!(chunks[1].wait_for_continuation);
        assert_eq!(chunks[2].bytes, b"\"\r\n");
        assert!(!chunks[2].wait_for_continuation);
    }

    #[test]
    fn test_encode_continuation_response() {
        assert_eq!(
            encode_continuation_response(b"response1").bytes,
            b"cmVzcG9uc2Ux\r\n".to_vec()
        );
        assert_eq!(encode_continuation_response(b"").bytes, b"\r\n".to_vec());
    }
}
