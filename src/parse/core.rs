//! Parsers for the primitive productions of the response grammar.
//!
//! All parsers are `nom` streaming parsers: running out of input yields
//! `nom::Err::Incomplete`, never a failure.

use std::{
    num::{NonZeroU32, ParseIntError, TryFromIntError},
    str::from_utf8,
};

use abnf_core::streaming::dquote;
use base64::{engine::general_purpose::STANDARD as base64_engine, Engine};
use nom::{
    branch::alt,
    bytes::streaming::{escaped, tag, tag_no_case, take, take_while, take_while1},
    character::streaming::{char, digit1, one_of},
    combinator::{map, map_res, opt, recognize},
    error::{ErrorKind, FromExternalError, ParseError as NomParseError},
    multi::separated_list1,
    sequence::{delimited, tuple},
};

use crate::types::{
    core::{
        is_astring_char, is_atom_char, is_base64_char, is_quoted_specials, is_text_char, Atom,
        Charset, CharsetError, IStringError, LiteralMode, NString, Tag, Text,
    },
    datetime::DateTime,
    mailbox::Mailbox,
    sequence::{SeqOrUid, Sequence, SequenceSet},
};
use crate::utils::unescape_quoted;

/// An extended version of [`nom::IResult`].
pub(crate) type ImapResult<'a, O> = Result<(&'a [u8], O), nom::Err<ImapParseError<'a>>>;

/// An extended version of [`nom::error::Error`].
#[derive(Debug)]
pub(crate) struct ImapParseError<'a> {
    pub input: &'a [u8],
    pub kind: ImapErrorKind,
}

/// An extended version of [`nom::error::ErrorKind`].
#[derive(Debug)]
pub(crate) enum ImapErrorKind {
    BadNumber,
    BadBase64,
    BadDateTime,
    RecursionLimitExceeded,
    Nom(ErrorKind),
}

impl<'a> NomParseError<&'a [u8]> for ImapParseError<'a> {
    fn from_error_kind(input: &'a [u8], kind: ErrorKind) -> Self {
        Self {
            input,
            kind: ImapErrorKind::Nom(kind),
        }
    }

    fn append(input: &'a [u8], kind: ErrorKind, _: Self) -> Self {
        Self {
            input,
            kind: ImapErrorKind::Nom(kind),
        }
    }
}

impl<'a> FromExternalError<&'a [u8], ParseIntError> for ImapParseError<'a> {
    fn from_external_error(input: &'a [u8], _: ErrorKind, _: ParseIntError) -> Self {
        Self {
            input,
            kind: ImapErrorKind::BadNumber,
        }
    }
}

impl<'a> FromExternalError<&'a [u8], TryFromIntError> for ImapParseError<'a> {
    fn from_external_error(input: &'a [u8], _: ErrorKind, _: TryFromIntError) -> Self {
        Self {
            input,
            kind: ImapErrorKind::BadNumber,
        }
    }
}

impl<'a> FromExternalError<&'a [u8], base64::DecodeError> for ImapParseError<'a> {
    fn from_external_error(input: &'a [u8], _: ErrorKind, _: base64::DecodeError) -> Self {
        Self {
            input,
            kind: ImapErrorKind::BadBase64,
        }
    }
}

impl<'a> FromExternalError<&'a [u8], CharsetError> for ImapParseError<'a> {
    fn from_external_error(input: &'a [u8], kind: ErrorKind, _: CharsetError) -> Self {
        Self {
            input,
            kind: ImapErrorKind::Nom(kind),
        }
    }
}

impl<'a> FromExternalError<&'a [u8], IStringError> for ImapParseError<'a> {
    fn from_external_error(input: &'a [u8], kind: ErrorKind, _: IStringError) -> Self {
        Self {
            input,
            kind: ImapErrorKind::Nom(kind),
        }
    }
}

// ----- number -----

/// `number = 1*DIGIT`
///
/// Unsigned 32-bit integer.
pub(crate) fn number(input: &[u8]) -> ImapResult<u32> {
    map_res(
        // Safety: `1*DIGIT` is ASCII-only.
        map(digit1, |val| from_utf8(val).unwrap()),
        str::parse::<u32>,
    )(input)
}

/// `number64 = 1*DIGIT`
///
/// Unsigned 63-bit integer (RFC 9051 / mod-sequences).
pub(crate) fn number64(input: &[u8]) -> ImapResult<u64> {
    map_res(
        // Safety: `1*DIGIT` is ASCII-only.
        map(digit1, |val| from_utf8(val).unwrap()),
        str::parse::<u64>,
    )(input)
}

/// `nz-number = digit-nz *DIGIT`
pub(crate) fn nz_number(input: &[u8]) -> ImapResult<NonZeroU32> {
    map_res(number, NonZeroU32::try_from)(input)
}

// ----- strings -----

fn is_any_text_char_except_quoted_specials(byte: u8) -> bool {
    is_text_char(byte) && !is_quoted_specials(byte)
}

/// `quoted = DQUOTE *QUOTED-CHAR DQUOTE`
pub(crate) fn quoted(input: &[u8]) -> ImapResult<String> {
    let mut parser = tuple((
        dquote,
        map(
            opt(escaped(
                take_while1(is_any_text_char_except_quoted_specials),
                '\\',
                one_of("\\\""),
            )),
            // Safety: quoted content is ASCII-only.
            |val: Option<&[u8]>| from_utf8(val.unwrap_or_default()).unwrap(),
        ),
        dquote,
    ));

    let (remaining, (_, quoted, _)) = parser(input)?;

    Ok((remaining, unescape_quoted(quoted).into_owned()))
}

/// `literal = "{" number "}" CRLF *CHAR8`, plus the `~{N}` (literal8) and
/// `{N+}` forms a server may use in data responses.
///
/// The whole payload must be present; this parser is only used on complete
/// messages. Streamed FETCH payloads use [`literal_header`] instead.
pub(crate) fn literal(input: &[u8]) -> ImapResult<Vec<u8>> {
    let (remaining, (length, _)) = literal_header(input)?;
    let (remaining, data) = take(length)(remaining)?;

    Ok((remaining, data.to_vec()))
}

/// The size header of a literal: `["~"] "{" number ["+" / "-"] "}" CRLF`.
pub(crate) fn literal_header(input: &[u8]) -> ImapResult<(u32, LiteralMode)> {
    let (remaining, (_, _, length, mode, _)) = tuple((
        opt(char('~')),
        tag(b"{"),
        number,
        map(opt(one_of("+-")), |plus| match plus {
            Some(_) => LiteralMode::NonSync,
            None => LiteralMode::Sync,
        }),
        tag(b"}"),
    ))(input)?;

    let (remaining, _) = crlf(remaining)?;

    Ok((remaining, (length, mode)))
}

/// `CRLF`
pub(crate) fn crlf(input: &[u8]) -> ImapResult<&[u8]> {
    tag(b"\r\n")(input)
}

/// `string = quoted / literal`
pub(crate) fn string(input: &[u8]) -> ImapResult<Vec<u8>> {
    alt((map(quoted, String::into_bytes), literal))(input)
}

/// `nstring = string / nil`
pub(crate) fn nstring(input: &[u8]) -> ImapResult<NString> {
    alt((
        map(string, |bytes| NString(Some(bytes))),
        map(nil, |_| NString(None)),
    ))(input)
}

/// `nil = "NIL"`
pub(crate) fn nil(input: &[u8]) -> ImapResult<&[u8]> {
    tag_no_case(b"NIL")(input)
}

/// `astring = 1*ASTRING-CHAR / string`
pub(crate) fn astring(input: &[u8]) -> ImapResult<Vec<u8>> {
    alt((
        map(take_while1(is_astring_char), <[u8]>::to_vec),
        string,
    ))(input)
}

/// `atom = 1*ATOM-CHAR`
pub(crate) fn atom(input: &[u8]) -> ImapResult<Atom> {
    let (remaining, parsed) = take_while1(is_atom_char)(input)?;

    // Safety: `is_atom_char` admits ASCII only.
    Ok((remaining, Atom::unvalidated(from_utf8(parsed).unwrap())))
}

/// `text = 1*TEXT-CHAR`
pub(crate) fn text(input: &[u8]) -> ImapResult<Text> {
    map(take_while1(is_text_char), |bytes| {
        // Safety: `is_text_char` admits ASCII only.
        Text::unvalidated(from_utf8(bytes).unwrap())
    })(input)
}

/// `base64 = *(4base64-char) [base64-terminal]`
pub(crate) fn base64(input: &[u8]) -> ImapResult<Vec<u8>> {
    map_res(
        recognize(tuple((
            take_while(is_base64_char),
            opt(alt((tag("=="), tag("=")))),
        ))),
        |input| base64_engine.decode(input),
    )(input)
}

/// `charset = atom / quoted` (see errata id: 261)
pub(crate) fn charset(input: &[u8]) -> ImapResult<Charset> {
    alt((
        map(atom, |atom| Charset::unvalidated(atom.inner())),
        map_res(quoted, |quoted| Charset::try_from(quoted.as_str())),
    ))(input)
}

/// `tag = 1*<any ASTRING-CHAR except "+">`
pub(crate) fn tag_imap(input: &[u8]) -> ImapResult<Tag> {
    map(
        take_while1(|b| is_astring_char(b) && b != b'+'),
        // Safety: `is_astring_char` admits ASCII only.
        |val| Tag(from_utf8(val).unwrap().to_owned()),
    )(input)
}

/// `mailbox = "INBOX" / astring`
pub(crate) fn mailbox(input: &[u8]) -> ImapResult<Mailbox> {
    map_res(astring, |bytes| Mailbox::try_from(bytes.as_slice()))(input)
}

// ----- sequence sets -----

/// `seq-number = nz-number / "*"`
pub(crate) fn seq_or_uid(input: &[u8]) -> ImapResult<SeqOrUid> {
    alt((
        map(nz_number, SeqOrUid::Value),
        map(tag(b"*"), |_| SeqOrUid::Asterisk),
    ))(input)
}

/// `sequence-set = (seq-number / seq-range) ["," sequence-set]`
pub(crate) fn sequence_set(input: &[u8]) -> ImapResult<SequenceSet> {
    map(
        separated_list1(
            tag(b","),
            alt((
                map(
                    tuple((seq_or_uid, tag(b":"), seq_or_uid)),
                    |(from, _, to)| Sequence::Range(from, to),
                ),
                map(seq_or_uid, Sequence::Single),
            )),
        ),
        |sequences| SequenceSet(crate::types::core::Vec1::unvalidated(sequences)),
    )(input)
}

// ----- date-time -----

/// `date-time = DQUOTE date-day-fixed "-" date-month "-" date-year SP time SP zone DQUOTE`
pub(crate) fn date_time(input: &[u8]) -> ImapResult<DateTime> {
    let (remaining, content) = delimited(dquote, take(26usize), dquote)(input)?;

    // Safety: `take(26)` over a quoted date-time is ASCII in practice; a
    // non-UTF8 byte simply fails the chrono parse below.
    let Ok(content) = from_utf8(content) else {
        return Err(nom::Err::Error(ImapParseError {
            input,
            kind: ImapErrorKind::BadDateTime,
        }));
    };

    // date-day-fixed is (SP DIGIT) / 2DIGIT.
    let content = content.trim_start();

    match chrono::DateTime::parse_from_str(content, "%d-%b-%Y %H:%M:%S %z")
        .ok()
        .and_then(|parsed| DateTime::try_from(parsed).ok())
    {
        Some(datetime) => Ok((remaining, datetime)),
        None => Err(nom::Err::Error(ImapParseError {
            input,
            kind: ImapErrorKind::BadDateTime,
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number() {
        assert!(number(b"").is_err());
        assert!(number(b"?").is_err());
        assert!(number(b"0?").is_ok());
        assert!(number(b"55?").is_ok());
    }

    #[test]
    fn test_nz_number() {
        assert!(nz_number(b"0?").is_err());
        assert!(nz_number(b"999?").is_ok());
    }

    #[test]
    fn test_quoted() {
        let (rem, val) = quoted(br#""Hello"???"#).unwrap();
        assert_eq!(rem, b"???");
        assert_eq!(val, "Hello");

        let (_, val) = quoted(br#""Hello \"World\"""#).unwrap();
        assert_eq!(val, "Hello \"World\"");

        let (_, val) = quoted(br#""""#).unwrap();
        assert_eq!(val, "");

        assert!(matches!(quoted(br#""Hello "#), Err(nom::Err::Incomplete(_))));
        assert!(quoted(br#""Hello \a""#).is_err());
    }

    #[test]
    fn test_literal() {
        let (rem, val) = literal(b"{3}\r\n123xxx").unwrap();
        assert_eq!(rem, b"xxx");
        assert_eq!(val, b"123");

        assert!(matches!(literal(b"{3}\r\n12"), Err(nom::Err::Incomplete(_))));

        let (_, val) = literal(b"~{3}\r\n1\x003").unwrap();
        assert_eq!(val, b"1\x003");
    }

    #[test]
    fn test_literal_header() {
        let (rem, (length, mode)) = literal_header(b"{42}\r\nrest").unwrap();
        assert_eq!(rem, b"rest");
        assert_eq!(length, 42);
        assert_eq!(mode, LiteralMode::Sync);

        let (_, (_, mode)) = literal_header(b"{42+}\r\n").unwrap();
        assert_eq!(mode, LiteralMode::NonSync);
    }

    #[test]
    fn test_astring() {
        let (rem, val) = astring(b"hello ").unwrap();
        assert_eq!(rem, b" ");
        assert_eq!(val, b"hello");

        let (_, val) = astring(b"\"hel lo\" ").unwrap();
        assert_eq!(val, b"hel lo");
    }

    #[test]
    fn test_sequence_set() {
        let (rem, set) = sequence_set(b"1:5,7,10:* ").unwrap();
        assert_eq!(rem, b" ");
        assert_eq!(set.0.len(), 3);
    }

    #[test]
    fn test_date_time() {
        let (rem, _) = date_time(b"\"01-Jul-2003 10:52:37 +0200\"x").unwrap();
        assert_eq!(rem, b"x");

        let (_, parsed) = date_time(b"\" 1-Jul-2003 10:52:37 +0200\"").unwrap();
        assert_eq!(parsed.as_ref().timestamp(), 1057049557);
    }
}
