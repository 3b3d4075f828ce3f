//! Parsers for ENVELOPE and BODYSTRUCTURE data.

use abnf_core::streaming::sp;
use nom::{
    branch::alt,
    bytes::streaming::tag,
    combinator::{map, opt},
    multi::{many0, many1, separated_list1},
    sequence::{delimited, preceded, tuple},
};

use crate::{
    parse::core::{nil, nstring, number, ImapErrorKind, ImapParseError, ImapResult},
    types::{
        body::{
            BasicFields, Body, BodyExtension, BodyStructure, Disposition, MultiPartExtensionData,
            SinglePartExtensionData, SpecificFields,
        },
        core::{NString, Vec1},
        envelope::{Address, Envelope},
    },
};

/// Nesting limit for multipart bodies and extension lists.
const RECURSION_LIMIT: usize = 8;

/// ```abnf
/// envelope = "(" env-date SP env-subject SP env-from SP env-sender SP
///            env-reply-to SP env-to SP env-cc SP env-bcc SP
///            env-in-reply-to SP env-message-id ")"
/// ```
pub(crate) fn envelope(input: &[u8]) -> ImapResult<Envelope> {
    map(
        delimited(
            tag(b"("),
            tuple((
                nstring,
                preceded(sp, nstring),
                preceded(sp, address_list),
                preceded(sp, address_list),
                preceded(sp, address_list),
                preceded(sp, address_list),
                preceded(sp, address_list),
                preceded(sp, address_list),
                preceded(sp, nstring),
                preceded(sp, nstring),
            )),
            tag(b")"),
        ),
        |(date, subject, from, sender, reply_to, to, cc, bcc, in_reply_to, message_id)| Envelope {
            date,
            subject,
            from,
            sender,
            reply_to,
            to,
            cc,
            bcc,
            in_reply_to,
            message_id,
        },
    )(input)
}

/// `"(" 1*address ")" / nil`
///
/// Some servers put spaces between addresses; they are tolerated.
fn address_list(input: &[u8]) -> ImapResult<Vec<Address>> {
    alt((
        delimited(
            tag(b"("),
            many1(preceded(opt(sp), address)),
            tag(b")"),
        ),
        map(nil, |_| Vec::new()),
    ))(input)
}

/// `address = "(" addr-name SP addr-adl SP addr-mailbox SP addr-host ")"`
pub(crate) fn address(input: &[u8]) -> ImapResult<Address> {
    map(
        delimited(
            tag(b"("),
            tuple((
                nstring,
                preceded(sp, nstring),
                preceded(sp, nstring),
                preceded(sp, nstring),
            )),
            tag(b")"),
        ),
        |(name, adl, mailbox, host)| Address {
            name,
            adl,
            mailbox,
            host,
        },
    )(input)
}

/// `body = "(" (body-type-1part / body-type-mpart) ")"`
pub(crate) fn body(input: &[u8]) -> ImapResult<BodyStructure> {
    body_limited(input, RECURSION_LIMIT)
}

fn body_limited(input: &[u8], remaining_recursion: usize) -> ImapResult<BodyStructure> {
    if remaining_recursion == 0 {
        return Err(nom::Err::Failure(ImapParseError {
            input,
            kind: ImapErrorKind::RecursionLimitExceeded,
        }));
    }

    delimited(
        tag(b"("),
        alt((
            move |input| body_type_mpart(input, remaining_recursion - 1),
            move |input| body_type_1part(input, remaining_recursion - 1),
        )),
        tag(b")"),
    )(input)
}

/// `body-type-mpart = 1*body SP media-subtype [SP body-ext-mpart]`
fn body_type_mpart(input: &[u8], remaining_recursion: usize) -> ImapResult<BodyStructure> {
    let (remaining, bodies) =
        many1(move |input| body_limited(input, remaining_recursion))(input)?;
    let (remaining, subtype) = preceded(sp, nstring)(remaining)?;
    let (remaining, extension_data) =
        opt(preceded(sp, body_ext_mpart))(remaining)?;

    Ok((
        remaining,
        BodyStructure::Multi {
            bodies: Vec1::unvalidated(bodies),
            subtype,
            extension_data,
        },
    ))
}

/// `body-type-1part = (body-type-basic / body-type-msg / body-type-text) [SP body-ext-1part]`
///
/// The branch is picked on the parsed media type rather than by
/// backtracking over the alternatives.
fn body_type_1part(input: &[u8], remaining_recursion: usize) -> ImapResult<BodyStructure> {
    let (remaining, r#type) = nstring(input)?;
    let (remaining, subtype) = preceded(sp, nstring)(remaining)?;
    let (remaining, basic) = preceded(sp, body_fields)(remaining)?;

    let is_message_rfc822 = matches!(r#type.as_deref(), Some(t) if t.eq_ignore_ascii_case(b"message"))
        && matches!(subtype.as_deref(), Some(s) if s.eq_ignore_ascii_case(b"rfc822"));
    let is_text = matches!(r#type.as_deref(), Some(t) if t.eq_ignore_ascii_case(b"text"));

    let (remaining, specific) = if is_message_rfc822 {
        let (remaining, (envelope, body_structure, number_of_lines)) = tuple((
            preceded(sp, envelope),
            preceded(sp, move |input| body_limited(input, remaining_recursion)),
            preceded(sp, number),
        ))(remaining)?;

        (
            remaining,
            SpecificFields::Message {
                envelope: Box::new(envelope),
                body_structure: Box::new(body_structure),
                number_of_lines,
            },
        )
    } else if is_text {
        let (remaining, number_of_lines) = preceded(sp, number)(remaining)?;

        (
            remaining,
            SpecificFields::Text {
                subtype,
                number_of_lines,
            },
        )
    } else {
        (remaining, SpecificFields::Basic { r#type, subtype })
    };

    let (remaining, extension_data) = opt(preceded(sp, body_ext_1part))(remaining)?;

    Ok((
        remaining,
        BodyStructure::Single {
            body: Body { basic, specific },
            extension_data,
        },
    ))
}

/// `body-fields = body-fld-param SP body-fld-id SP body-fld-desc SP body-fld-enc SP body-fld-octets`
fn body_fields(input: &[u8]) -> ImapResult<BasicFields> {
    map(
        tuple((
            body_fld_param,
            preceded(sp, nstring),
            preceded(sp, nstring),
            preceded(sp, nstring),
            preceded(sp, number),
        )),
        |(parameter_list, id, description, content_transfer_encoding, size)| BasicFields {
            parameter_list,
            id,
            description,
            content_transfer_encoding,
            size,
        },
    )(input)
}

/// `body-fld-param = "(" string SP string *(SP string SP string) ")" / nil`
fn body_fld_param(input: &[u8]) -> ImapResult<Vec<(NString, NString)>> {
    alt((
        delimited(
            tag(b"("),
            separated_list1(
                sp,
                map(
                    tuple((nstring, sp, nstring)),
                    |(key, _, value)| (key, value),
                ),
            ),
            tag(b")"),
        ),
        map(nil, |_| Vec::new()),
    ))(input)
}

/// `body-ext-1part = body-fld-md5 [SP body-fld-dsp [SP body-fld-lang [SP body-fld-loc *(SP body-extension)]]]`
fn body_ext_1part(input: &[u8]) -> ImapResult<SinglePartExtensionData> {
    let (remaining, md5) = nstring(input)?;
    let (remaining, tail) = opt(body_ext_tail)(remaining)?;
    let (disposition, language, location, extensions) = tail.unwrap_or_default();

    Ok((
        remaining,
        SinglePartExtensionData {
            md5,
            disposition,
            language,
            location,
            extensions,
        },
    ))
}

/// `body-ext-mpart = body-fld-param [SP body-fld-dsp [SP body-fld-lang [SP body-fld-loc *(SP body-extension)]]]`
fn body_ext_mpart(input: &[u8]) -> ImapResult<MultiPartExtensionData> {
    let (remaining, parameter_list) = body_fld_param(input)?;
    let (remaining, tail) = opt(body_ext_tail)(remaining)?;
    let (disposition, language, location, extensions) = tail.unwrap_or_default();

    Ok((
        remaining,
        MultiPartExtensionData {
            parameter_list,
            disposition,
            language,
            location,
            extensions,
        },
    ))
}

type BodyExtTail = (
    Option<Disposition>,
    Vec<NString>,
    NString,
    Vec<BodyExtension>,
);

/// The shared `[SP dsp [SP lang [SP loc *(SP extension)]]]` suffix.
fn body_ext_tail(input: &[u8]) -> ImapResult<BodyExtTail> {
    let (remaining, disposition) = preceded(sp, body_fld_dsp)(input)?;
    let (remaining, rest) = opt(tuple((
        preceded(sp, body_fld_lang),
        opt(tuple((
            preceded(sp, nstring),
            many0(preceded(sp, |input| {
                body_extension(input, RECURSION_LIMIT)
            })),
        ))),
    )))(remaining)?;

    let (language, loc_ext) = match rest {
        Some((language, loc_ext)) => (language, loc_ext),
        None => (Vec::new(), None),
    };
    let (location, extensions) = loc_ext.unwrap_or((NString(None), Vec::new()));

    Ok((remaining, (disposition, language, location, extensions)))
}

/// `body-fld-dsp = "(" string SP body-fld-param ")" / nil`
fn body_fld_dsp(input: &[u8]) -> ImapResult<Option<Disposition>> {
    alt((
        map(
            delimited(
                tag(b"("),
                tuple((nstring, preceded(sp, body_fld_param))),
                tag(b")"),
            ),
            |(kind, parameter_list)| {
                Some(Disposition {
                    kind,
                    parameter_list,
                })
            },
        ),
        map(nil, |_| None),
    ))(input)
}

/// `body-fld-lang = nstring / "(" string *(SP string) ")"`
fn body_fld_lang(input: &[u8]) -> ImapResult<Vec<NString>> {
    alt((
        delimited(
            tag(b"("),
            separated_list1(sp, nstring),
            tag(b")"),
        ),
        map(nstring, |value| match value {
            NString(None) => Vec::new(),
            value => vec![value],
        }),
    ))(input)
}

/// `body-extension = nstring / number / "(" body-extension *(SP body-extension) ")"`
fn body_extension(input: &[u8], remaining_recursion: usize) -> ImapResult<BodyExtension> {
    if remaining_recursion == 0 {
        return Err(nom::Err::Failure(ImapParseError {
            input,
            kind: ImapErrorKind::RecursionLimitExceeded,
        }));
    }

    alt((
        map(number, BodyExtension::Number),
        map(nstring, BodyExtension::NString),
        map(
            delimited(
                tag(b"("),
                separated_list1(sp, move |input| {
                    body_extension(input, remaining_recursion - 1)
                }),
                tag(b")"),
            ),
            |extensions| BodyExtension::List(Vec1::unvalidated(extensions)),
        ),
    ))(input)
}
