//! Parsers for FETCH message attributes.
//!
//! Body payloads are *streamed*: [`msg_att_streaming`] consumes only up to
//! and including the size header and reports how the payload will arrive,
//! so the response parser can hand the bytes through without buffering
//! them. Everything else is parsed as a complete attribute by
//! [`msg_att_simple`].

use std::num::NonZeroU32;

use abnf_core::streaming::sp;
use nom::{
    branch::alt,
    bytes::streaming::{tag, tag_no_case, take_while1},
    combinator::{map, map_res, opt, recognize},
    multi::{separated_list0, separated_list1},
    sequence::{delimited, pair, preceded, tuple},
};

use crate::{
    parse::{
        core::{
            astring, date_time, literal_header, nil, number, number64, nz_number, quoted,
            ImapResult,
        },
        envelope::{body, envelope},
        response::flag_fetch,
    },
    types::{
        core::{is_atom_char, IString, NString, Vec1},
        fetch::{FetchAttribute, Part, Section, StreamingKind},
    },
};

/// How the payload of a streamed attribute arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StreamSource {
    /// `NIL`: there is no payload.
    Nil,
    /// A quoted string carried the payload inline.
    Inline(Vec<u8>),
    /// A literal of the given length follows in the byte stream.
    Literal(u32),
}

/// One of `BODY[...]`, `RFC822`, `RFC822.HEADER`, `RFC822.TEXT`, or
/// `BINARY[...]`, consumed up to and including its payload announcement.
pub(crate) fn msg_att_streaming(input: &[u8]) -> ImapResult<(StreamingKind, StreamSource)> {
    alt((
        map(
            tuple((
                tag_no_case(b"BODY"),
                section,
                opt(delimited(tag(b"<"), number, tag(b">"))),
                sp,
                stream_source,
            )),
            |(_, section, origin, _, source)| (StreamingKind::Body { section, origin }, source),
        ),
        map(
            tuple((tag_no_case(b"BINARY"), section_binary, sp, stream_source)),
            |(_, section, _, source)| (StreamingKind::Binary { section }, source),
        ),
        map(
            tuple((tag_no_case(b"RFC822.HEADER"), sp, stream_source)),
            |(_, _, source)| (StreamingKind::Rfc822Header, source),
        ),
        map(
            tuple((tag_no_case(b"RFC822.TEXT"), sp, stream_source)),
            |(_, _, source)| (StreamingKind::Rfc822Text, source),
        ),
        map(
            tuple((tag_no_case(b"RFC822"), sp, stream_source)),
            |(_, _, source)| (StreamingKind::Rfc822, source),
        ),
    ))(input)
}

fn stream_source(input: &[u8]) -> ImapResult<StreamSource> {
    alt((
        map(nil, |_| StreamSource::Nil),
        map(quoted, |s| StreamSource::Inline(s.into_bytes())),
        map(literal_header, |(length, _)| StreamSource::Literal(length)),
    ))(input)
}

/// `msg-att-dynamic / msg-att-static`, except the streamed forms.
pub(crate) fn msg_att_simple(input: &[u8]) -> ImapResult<FetchAttribute> {
    alt((
        map(
            tuple((
                tag_no_case(b"FLAGS"),
                sp,
                delimited(tag(b"("), separated_list0(sp, flag_fetch), tag(b")")),
            )),
            |(_, _, flags)| FetchAttribute::Flags(flags),
        ),
        map(
            tuple((tag_no_case(b"ENVELOPE"), sp, envelope)),
            |(_, _, envelope)| FetchAttribute::Envelope(envelope),
        ),
        map(
            tuple((tag_no_case(b"INTERNALDATE"), sp, date_time)),
            |(_, _, date_time)| FetchAttribute::InternalDate(date_time),
        ),
        map(
            tuple((tag_no_case(b"RFC822.SIZE"), sp, number)),
            |(_, _, size)| FetchAttribute::Rfc822Size(size),
        ),
        map(
            tuple((tag_no_case(b"BODYSTRUCTURE"), sp, body)),
            |(_, _, body)| FetchAttribute::BodyStructure(body),
        ),
        map(tuple((tag_no_case(b"BODY"), sp, body)), |(_, _, body)| {
            FetchAttribute::Body(body)
        }),
        map(
            tuple((tag_no_case(b"UID"), sp, nz_number)),
            |(_, _, uid)| FetchAttribute::Uid(uid),
        ),
        map(
            tuple((tag_no_case(b"BINARY.SIZE"), section_binary, sp, number)),
            |(_, section, _, size)| FetchAttribute::BinarySize { section, size },
        ),
        map(
            tuple((
                tag_no_case(b"MODSEQ"),
                sp,
                delimited(tag(b"("), number64, tag(b")")),
            )),
            |(_, _, mod_seq)| FetchAttribute::ModSeq(mod_seq),
        ),
        map(
            tuple((tag_no_case(b"X-GM-MSGID"), sp, number64)),
            |(_, _, id)| FetchAttribute::GmailMessageId(id),
        ),
        map(
            tuple((tag_no_case(b"X-GM-THRID"), sp, number64)),
            |(_, _, id)| FetchAttribute::GmailThreadId(id),
        ),
        map(
            tuple((
                tag_no_case(b"X-GM-LABELS"),
                sp,
                delimited(tag(b"("), separated_list0(sp, gmail_label), tag(b")")),
            )),
            |(_, _, labels)| FetchAttribute::GmailLabels(labels),
        ),
    ))(input)
}

/// A Gmail label: a bare `\System` name, an astring, or `NIL`.
fn gmail_label(input: &[u8]) -> ImapResult<NString> {
    alt((
        map(
            recognize(pair(tag(b"\\"), take_while1(is_atom_char))),
            |bytes: &[u8]| NString(Some(bytes.to_vec())),
        ),
        map(nil, |_| NString(None)),
        map(astring, |bytes| NString(Some(bytes))),
    ))(input)
}

/// `section = "[" [section-spec] "]"`
pub(crate) fn section(input: &[u8]) -> ImapResult<Option<Section>> {
    delimited(tag(b"["), opt(section_spec), tag(b"]"))(input)
}

/// `section-binary = "[" [section-part] "]"` (RFC 3516)
pub(crate) fn section_binary(input: &[u8]) -> ImapResult<Vec<NonZeroU32>> {
    map(
        delimited(
            tag(b"["),
            opt(separated_list1(tag(b"."), nz_number)),
            tag(b"]"),
        ),
        Option::unwrap_or_default,
    )(input)
}

/// Intermediate for section parsing, mirroring the grammar split between
/// `section-msgtext` and `section-text`.
enum PartSpecifier {
    Header,
    HeaderFields(Vec1<IString>),
    HeaderFieldsNot(Vec1<IString>),
    Text,
    Mime,
}

/// `section-spec = section-msgtext / (section-part ["." section-text])`
fn section_spec(input: &[u8]) -> ImapResult<Section> {
    alt((
        map(section_msgtext, |specifier| match specifier {
            PartSpecifier::Header => Section::Header(None),
            PartSpecifier::HeaderFields(fields) => Section::HeaderFields(None, fields),
            PartSpecifier::HeaderFieldsNot(fields) => Section::HeaderFieldsNot(None, fields),
            PartSpecifier::Text => Section::Text(None),
            PartSpecifier::Mime => unreachable!(),
        }),
        map(
            tuple((section_part, opt(preceded(tag(b"."), section_text)))),
            |(part, specifier)| {
                let part = Part(Vec1::unvalidated(part));

                match specifier {
                    None => Section::Part(part),
                    Some(PartSpecifier::Header) => Section::Header(Some(part)),
                    Some(PartSpecifier::HeaderFields(fields)) => {
                        Section::HeaderFields(Some(part), fields)
                    }
                    Some(PartSpecifier::HeaderFieldsNot(fields)) => {
                        Section::HeaderFieldsNot(Some(part), fields)
                    }
                    Some(PartSpecifier::Text) => Section::Text(Some(part)),
                    Some(PartSpecifier::Mime) => Section::Mime(part),
                }
            },
        ),
    ))(input)
}

/// `section-msgtext = "HEADER" / "HEADER.FIELDS" [".NOT"] SP header-list / "TEXT"`
fn section_msgtext(input: &[u8]) -> ImapResult<PartSpecifier> {
    alt((
        map(
            tuple((tag_no_case(b"HEADER.FIELDS.NOT"), sp, header_list)),
            |(_, _, fields)| PartSpecifier::HeaderFieldsNot(fields),
        ),
        map(
            tuple((tag_no_case(b"HEADER.FIELDS"), sp, header_list)),
            |(_, _, fields)| PartSpecifier::HeaderFields(fields),
        ),
        map(tag_no_case(b"HEADER"), |_| PartSpecifier::Header),
        map(tag_no_case(b"TEXT"), |_| PartSpecifier::Text),
    ))(input)
}

/// `section-part = nz-number *("." nz-number)`
fn section_part(input: &[u8]) -> ImapResult<Vec<NonZeroU32>> {
    separated_list1(tag(b"."), nz_number)(input)
}

/// `section-text = section-msgtext / "MIME"`
fn section_text(input: &[u8]) -> ImapResult<PartSpecifier> {
    alt((
        section_msgtext,
        map(tag_no_case(b"MIME"), |_| PartSpecifier::Mime),
    ))(input)
}

/// `header-list = "(" header-fld-name *(SP header-fld-name) ")"`
fn header_list(input: &[u8]) -> ImapResult<Vec1<IString>> {
    map(
        delimited(
            tag(b"("),
            separated_list1(sp, map_res(astring, IString::try_from)),
            tag(b")"),
        ),
        Vec1::unvalidated,
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::flag::{Flag, FlagFetch};

    #[test]
    fn test_msg_att_streaming_literal() {
        let (rem, (kind, source)) = msg_att_streaming(b"BODY[TEXT] {1}\r\nX)").unwrap();
        assert_eq!(rem, b"X)");
        assert_eq!(
            kind,
            StreamingKind::Body {
                section: Some(Section::Text(None)),
                origin: None,
            }
        );
        assert_eq!(source, StreamSource::Literal(1));
    }

    #[test]
    fn test_msg_att_streaming_inline_and_nil() {
        let (_, (kind, source)) = msg_att_streaming(b"RFC822 \"abc\")").unwrap();
        assert_eq!(kind, StreamingKind::Rfc822);
        assert_eq!(source, StreamSource::Inline(b"abc".to_vec()));

        let (_, (kind, source)) = msg_att_streaming(b"BODY[1.2]<42> NIL)").unwrap();
        assert_eq!(
            kind,
            StreamingKind::Body {
                section: Some(Section::Part(Part(Vec1::unvalidated(vec![
                    NonZeroU32::new(1).unwrap(),
                    NonZeroU32::new(2).unwrap(),
                ])))),
                origin: Some(42),
            }
        );
        assert_eq!(source, StreamSource::Nil);
    }

    #[test]
    fn test_msg_att_streaming_binary() {
        let (_, (kind, source)) = msg_att_streaming(b"BINARY[2] ~{3}\r\nabc").unwrap();
        assert_eq!(
            kind,
            StreamingKind::Binary {
                section: vec![NonZeroU32::new(2).unwrap()],
            }
        );
        assert_eq!(source, StreamSource::Literal(3));
    }

    #[test]
    fn test_msg_att_streaming_rejects_simple_attributes() {
        assert!(matches!(
            msg_att_streaming(b"RFC822.SIZE 44827)"),
            Err(nom::Err::Error(_))
        ));
        assert!(matches!(
            msg_att_streaming(b"BODYSTRUCTURE (\"TEXT\""),
            Err(nom::Err::Error(_))
        ));
    }

    #[test]
    fn test_msg_att_simple() {
        let (rem, attribute) = msg_att_simple(b"FLAGS (\\Seen \\Recent))").unwrap();
        assert_eq!(rem, b")");
        assert_eq!(
            attribute,
            FetchAttribute::Flags(vec![
                FlagFetch::Flag(Flag::Seen),
                FlagFetch::Recent,
            ])
        );

        let (_, attribute) = msg_att_simple(b"UID 42)").unwrap();
        assert_eq!(attribute, FetchAttribute::Uid(NonZeroU32::new(42).unwrap()));

        let (_, attribute) = msg_att_simple(b"RFC822.SIZE 44827)").unwrap();
        assert_eq!(attribute, FetchAttribute::Rfc822Size(44827));

        let (_, attribute) = msg_att_simple(b"MODSEQ (624140003))").unwrap();
        assert_eq!(attribute, FetchAttribute::ModSeq(624140003));

        let (_, attribute) = msg_att_simple(b"X-GM-MSGID 1278455344230334865)").unwrap();
        assert_eq!(
            attribute,
            FetchAttribute::GmailMessageId(1278455344230334865)
        );

        let (_, attribute) =
            msg_att_simple(b"X-GM-LABELS (\\Inbox \\Sent Important \"Muy Importante\"))").unwrap();
        match attribute {
            FetchAttribute::GmailLabels(labels) => {
                assert_eq!(labels.len(), 4);
                assert_eq!(labels[0], NString(Some(b"\\Inbox".to_vec())));
                assert_eq!(labels[3], NString(Some(b"Muy Importante".to_vec())));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_msg_att_simple_envelope_with_literal() {
        let input = b"ENVELOPE ({25}\r\nTue, 01 Jul 2003 10:52:37 NIL NIL NIL NIL NIL NIL NIL NIL NIL))";
        let (rem, attribute) = msg_att_simple(input).unwrap();
        assert_eq!(rem, b")");
        match attribute {
            FetchAttribute::Envelope(envelope) => {
                assert_eq!(
                    envelope.date,
                    NString(Some(b"Tue, 01 Jul 2003 10:52:37".to_vec()))
                );
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
