//! Parsers for status lines, continuation requests, and untagged data.

use std::num::NonZeroU32;

use abnf_core::streaming::{dquote, sp};
use base64::{engine::general_purpose::STANDARD as base64_engine, Engine};
use nom::{
    branch::alt,
    bytes::streaming::{tag, tag_no_case, take_until, take_while, take_while_m_n},
    combinator::{map, map_res, opt, value},
    multi::{many0, many1, separated_list0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
};

use crate::{
    parse::core::{
        astring, atom, charset, crlf, mailbox, nil, nstring, number, number64, nz_number,
        sequence_set, tag_imap, text, ImapResult,
    },
    types::{
        core::{is_text_char, IString, NString, QuotedChar, Vec1},
        flag::{Flag, FlagFetch, FlagNameAttribute, FlagPerm},
        response::{
            Capability, Code, CompletionKind, ConditionKind, ContinuationRequest, ESearchItem,
            MetadataData, NamespaceDescr, QuotaGet, Response, ResponseText, Tagged, UntaggedData,
        },
        status::StatusDataItem,
    },
};

// ----- flags -----

/// `flag = "\Answered" / "\Flagged" / "\Deleted" / "\Seen" / "\Draft" /
///         flag-keyword / flag-extension`
pub(crate) fn flag(input: &[u8]) -> ImapResult<Flag> {
    alt((
        map(preceded(tag(b"\\"), atom), Flag::system),
        map(atom, Flag::Keyword),
    ))(input)
}

/// `flag-fetch = flag / "\Recent"`
pub(crate) fn flag_fetch(input: &[u8]) -> ImapResult<FlagFetch> {
    alt((
        map(preceded(tag(b"\\"), atom), |atom| {
            if atom.eq_ignore_case("recent") {
                FlagFetch::Recent
            } else {
                FlagFetch::Flag(Flag::system(atom))
            }
        }),
        map(atom, |atom| FlagFetch::Flag(Flag::Keyword(atom))),
    ))(input)
}

/// `flag-perm = flag / "\*"`
pub(crate) fn flag_perm(input: &[u8]) -> ImapResult<FlagPerm> {
    alt((
        value(FlagPerm::Asterisk, tag(b"\\*")),
        map(flag, FlagPerm::Flag),
    ))(input)
}

/// `mbx-list-flags`, e.g., `\Noselect`.
fn flag_name_attribute(input: &[u8]) -> ImapResult<FlagNameAttribute> {
    map(preceded(tag(b"\\"), atom), FlagNameAttribute::from_atom)(input)
}

// ----- capabilities -----

/// `capability = atom`, interpreted.
pub(crate) fn capability(input: &[u8]) -> ImapResult<Capability> {
    map(atom, Capability::from)(input)
}

/// `capability-data = "CAPABILITY" *(SP capability)`
pub(crate) fn capability_data(input: &[u8]) -> ImapResult<Vec1<Capability>> {
    map(
        preceded(tag_no_case(b"CAPABILITY "), separated_list1(sp, capability)),
        Vec1::unvalidated,
    )(input)
}

// ----- resp-text and codes -----

/// `resp-text = ["[" resp-text-code "]" SP] text`
pub(crate) fn resp_text(input: &[u8]) -> ImapResult<ResponseText> {
    // Insist on a code after "[" so that a broken code is not silently
    // re-interpreted as text.
    let (_, bracket) = opt(tag(b"["))(input)?;

    if bracket.is_some() {
        map(
            tuple((
                preceded(
                    tag(b"["),
                    alt((
                        terminated(resp_text_code, tag(b"]")),
                        map(
                            terminated(
                                take_while(|b: u8| b != b']' && b != b'\r' && b != b'\n'),
                                tag(b"]"),
                            ),
                            |bytes: &[u8]| Code::Other(bytes.to_vec()),
                        ),
                    )),
                ),
                preceded(sp, text),
            )),
            |(code, text)| ResponseText {
                code: Some(code),
                text,
            },
        )(input)
    } else {
        map(text, |text| ResponseText { code: None, text })(input)
    }
}

/// `resp-text-code` (RFC 3501 plus the extension codes the engine
/// recognizes).
fn resp_text_code(input: &[u8]) -> ImapResult<Code> {
    alt((
        alt((
            value(Code::Alert, tag_no_case(b"ALERT")),
            map(
                preceded(
                    tag_no_case(b"BADCHARSET"),
                    opt(delimited(
                        tag(b" ("),
                        separated_list1(sp, charset),
                        tag(b")"),
                    )),
                ),
                |allowed| Code::BadCharset {
                    allowed: allowed.unwrap_or_default(),
                },
            ),
            map(capability_data, Code::Capability),
            value(Code::Parse, tag_no_case(b"PARSE")),
            map(
                preceded(
                    tag_no_case(b"PERMANENTFLAGS "),
                    delimited(
                        tag(b"("),
                        separated_list0(sp, flag_perm),
                        tag(b")"),
                    ),
                ),
                Code::PermanentFlags,
            ),
            value(Code::ReadOnly, tag_no_case(b"READ-ONLY")),
            value(Code::ReadWrite, tag_no_case(b"READ-WRITE")),
            value(Code::TryCreate, tag_no_case(b"TRYCREATE")),
            map(preceded(tag_no_case(b"UIDNEXT "), nz_number), Code::UidNext),
            map(
                preceded(tag_no_case(b"UIDVALIDITY "), nz_number),
                Code::UidValidity,
            ),
            map(preceded(tag_no_case(b"UNSEEN "), nz_number), Code::Unseen),
        )),
        alt((
            map(
                tuple((
                    tag_no_case(b"APPENDUID "),
                    nz_number,
                    sp,
                    sequence_set,
                )),
                |(_, uid_validity, _, uid)| Code::AppendUid { uid_validity, uid },
            ),
            map(
                tuple((
                    tag_no_case(b"COPYUID "),
                    nz_number,
                    sp,
                    sequence_set,
                    sp,
                    sequence_set,
                )),
                |(_, uid_validity, _, source, _, destination)| Code::CopyUid {
                    uid_validity,
                    source,
                    destination,
                },
            ),
            value(Code::UidNotSticky, tag_no_case(b"UIDNOTSTICKY")),
            map(
                preceded(tag_no_case(b"HIGHESTMODSEQ "), number64),
                Code::HighestModSeq,
            ),
            value(Code::NoModSeq, tag_no_case(b"NOMODSEQ")),
            map(
                preceded(tag_no_case(b"MODIFIED "), sequence_set),
                Code::Modified,
            ),
            value(Code::Closed, tag_no_case(b"CLOSED")),
            value(Code::CompressionActive, tag_no_case(b"COMPRESSIONACTIVE")),
            value(Code::OverQuota, tag_no_case(b"OVERQUOTA")),
            value(Code::TooBig, tag_no_case(b"TOOBIG")),
            value(Code::UnknownCte, tag_no_case(b"UNKNOWN-CTE")),
        )),
    ))(input)
}

// ----- continuation requests -----

/// `continue-req = "+" SP (resp-text / base64) CRLF`
pub(crate) fn continue_req(input: &[u8]) -> ImapResult<ContinuationRequest> {
    // Base64 is tried against the whole line first: a subset of `text` is
    // also valid base64, and the AUTHENTICATE flow depends on getting the
    // decoded form.
    let (remaining, (_, line, _)) = tuple((tag(b"+ "), take_until("\r\n"), crlf))(input)?;

    if let Ok(decoded) = base64_engine.decode(line) {
        return Ok((remaining, ContinuationRequest::Base64(decoded)));
    }

    let (remaining, (_, resp_text, _)) = tuple((tag(b"+ "), resp_text, crlf))(input)?;

    Ok((remaining, ContinuationRequest::Basic(resp_text)))
}

// ----- status responses -----

/// `response-tagged = tag SP resp-cond-state CRLF`
pub(crate) fn response_tagged(input: &[u8]) -> ImapResult<Tagged> {
    map(
        terminated(
            tuple((
                tag_imap,
                preceded(
                    sp,
                    alt((
                        value(CompletionKind::Ok, tag_no_case(b"OK ")),
                        value(CompletionKind::No, tag_no_case(b"NO ")),
                        value(CompletionKind::Bad, tag_no_case(b"BAD ")),
                    )),
                ),
                resp_text,
            )),
            crlf,
        ),
        |(tag, kind, text)| Tagged { tag, kind, text },
    )(input)
}

/// Any untagged response, `"*" SP ... CRLF`.
///
/// FETCH data responses are not handled here; the response parser routes
/// them into the streaming path before this parser runs.
pub(crate) fn untagged_response(input: &[u8]) -> ImapResult<Response> {
    delimited(
        tag(b"* "),
        alt((
            map(
                pair(
                    alt((
                        value(ConditionKind::Ok, tag_no_case(b"OK ")),
                        value(ConditionKind::No, tag_no_case(b"NO ")),
                        value(ConditionKind::Bad, tag_no_case(b"BAD ")),
                        value(ConditionKind::PreAuth, tag_no_case(b"PREAUTH ")),
                    )),
                    resp_text,
                ),
                |(kind, text)| Response::Untagged(UntaggedData::Condition { kind, text }),
            ),
            map(preceded(tag_no_case(b"BYE "), resp_text), Response::Fatal),
            map(
                untagged_data,
                Response::Untagged,
            ),
        )),
        crlf,
    )(input)
}

fn untagged_data(input: &[u8]) -> ImapResult<UntaggedData> {
    alt((
        map(capability_data, UntaggedData::Capability),
        mailbox_data,
        message_data,
        extension_data,
    ))(input)
}

/// `mailbox-data` (FLAGS, LIST, LSUB, SEARCH, ESEARCH, STATUS)
fn mailbox_data(input: &[u8]) -> ImapResult<UntaggedData> {
    alt((
        map(
            preceded(
                tag_no_case(b"FLAGS "),
                delimited(tag(b"("), separated_list0(sp, flag), tag(b")")),
            ),
            UntaggedData::Flags,
        ),
        map(
            tuple((
                tag_no_case(b"LIST "),
                mbx_list_flags,
                sp,
                quoted_delimiter,
                sp,
                mailbox,
            )),
            |(_, items, _, delimiter, _, mailbox)| UntaggedData::List {
                items,
                delimiter,
                mailbox,
            },
        ),
        map(
            tuple((
                tag_no_case(b"LSUB "),
                mbx_list_flags,
                sp,
                quoted_delimiter,
                sp,
                mailbox,
            )),
            |(_, items, _, delimiter, _, mailbox)| UntaggedData::Lsub {
                items,
                delimiter,
                mailbox,
            },
        ),
        map(
            tuple((
                tag_no_case(b"STATUS "),
                mailbox,
                sp,
                delimited(tag(b"("), separated_list0(sp, status_att), tag(b")")),
            )),
            |(_, mailbox, _, items)| UntaggedData::Status { mailbox, items },
        ),
        map(
            tuple((
                tag_no_case(b"SEARCH"),
                many0(preceded(sp, nz_number)),
                opt(preceded(
                    sp,
                    delimited(tag_no_case(b"(MODSEQ "), number64, tag(b")")),
                )),
            )),
            |(_, seqs, mod_seq)| UntaggedData::Search { seqs, mod_seq },
        ),
        esearch_data,
        map(
            preceded(tag_no_case(b"SORT"), many0(preceded(sp, nz_number))),
            UntaggedData::Sort,
        ),
    ))(input)
}

/// `message-data = nz-number SP ("EXISTS" / "RECENT" / "EXPUNGE")`
fn message_data(input: &[u8]) -> ImapResult<UntaggedData> {
    let (remaining, count) = terminated(number, sp)(input)?;

    alt((
        value(UntaggedData::Exists(count), tag_no_case(b"EXISTS")),
        value(UntaggedData::Recent(count), tag_no_case(b"RECENT")),
        map_res(tag_no_case(b"EXPUNGE"), move |_| {
            NonZeroU32::try_from(count).map(UntaggedData::Expunge)
        }),
    ))(remaining)
}

/// Extension data responses (ENABLED, NAMESPACE, ID, QUOTA, METADATA,
/// VANISHED, GENURLAUTH, URLFETCH).
fn extension_data(input: &[u8]) -> ImapResult<UntaggedData> {
    alt((
        map(
            preceded(tag_no_case(b"ENABLED"), many0(preceded(sp, capability))),
            UntaggedData::Enabled,
        ),
        map(
            tuple((
                tag_no_case(b"NAMESPACE "),
                namespace_item,
                sp,
                namespace_item,
                sp,
                namespace_item,
            )),
            |(_, personal, _, other_users, _, shared)| UntaggedData::Namespace {
                personal,
                other_users,
                shared,
            },
        ),
        map(
            preceded(
                tag_no_case(b"ID "),
                alt((
                    map(nil, |_| None),
                    map(
                        delimited(
                            tag(b"("),
                            separated_list0(
                                sp,
                                map(tuple((nstring, sp, nstring)), |(key, _, value)| {
                                    (key, value)
                                }),
                            ),
                            tag(b")"),
                        ),
                        Some,
                    ),
                )),
            ),
            UntaggedData::Id,
        ),
        map(
            tuple((
                tag_no_case(b"QUOTAROOT "),
                mailbox,
                many0(preceded(sp, map(astring, |bytes| NString(Some(bytes))))),
            )),
            |(_, mailbox, roots)| UntaggedData::QuotaRoot { mailbox, roots },
        ),
        map(
            tuple((
                tag_no_case(b"QUOTA "),
                map(astring, |bytes| NString(Some(bytes))),
                preceded(
                    sp,
                    delimited(
                        tag(b"("),
                        separated_list1(sp, quota_resource),
                        tag(b")"),
                    ),
                ),
            )),
            |(_, root, quotas)| UntaggedData::Quota {
                root,
                quotas: Vec1::unvalidated(quotas),
            },
        ),
        map(
            tuple((tag_no_case(b"METADATA "), mailbox, sp, metadata_items)),
            |(_, mailbox, _, items)| UntaggedData::Metadata { mailbox, items },
        ),
        map(
            tuple((
                tag_no_case(b"VANISHED"),
                opt(preceded(sp, tag_no_case(b"(EARLIER)"))),
                sp,
                sequence_set,
            )),
            |(_, earlier, _, uids)| UntaggedData::Vanished {
                earlier: earlier.is_some(),
                uids,
            },
        ),
        map(
            preceded(
                tag_no_case(b"GENURLAUTH"),
                many1(preceded(sp, map_res(astring, IString::try_from))),
            ),
            |urls| UntaggedData::GenUrlAuth(Vec1::unvalidated(urls)),
        ),
        map(
            preceded(
                tag_no_case(b"URLFETCH"),
                many0(preceded(
                    sp,
                    pair(
                        map_res(astring, IString::try_from),
                        preceded(sp, nstring),
                    ),
                )),
            ),
            UntaggedData::UrlFetch,
        ),
    ))(input)
}

/// `esearch-response = "ESEARCH" [search-correlator] [SP "UID"] *(SP search-return-data)`
fn esearch_data(input: &[u8]) -> ImapResult<UntaggedData> {
    map(
        tuple((
            tag_no_case(b"ESEARCH"),
            opt(delimited(
                tag_no_case(b" (TAG \""),
                tag_imap,
                tag(b"\")"),
            )),
            opt(preceded(sp, tag_no_case(b"UID"))),
            many0(preceded(sp, esearch_item)),
        )),
        |(_, tag, uid, items)| UntaggedData::ESearch {
            tag,
            uid: uid.is_some(),
            items,
        },
    )(input)
}

fn esearch_item(input: &[u8]) -> ImapResult<ESearchItem> {
    alt((
        map(preceded(tag_no_case(b"MIN "), number), ESearchItem::Min),
        map(preceded(tag_no_case(b"MAX "), number), ESearchItem::Max),
        map(preceded(tag_no_case(b"COUNT "), number), ESearchItem::Count),
        map(
            preceded(tag_no_case(b"MODSEQ "), number64),
            ESearchItem::ModSeq,
        ),
        map(
            preceded(tag_no_case(b"ALL "), sequence_set),
            ESearchItem::All,
        ),
    ))(input)
}

/// `status-att-list` item.
fn status_att(input: &[u8]) -> ImapResult<StatusDataItem> {
    alt((
        map(
            preceded(tag_no_case(b"MESSAGES "), number),
            StatusDataItem::Messages,
        ),
        map(
            preceded(tag_no_case(b"RECENT "), number),
            StatusDataItem::Recent,
        ),
        map(
            preceded(tag_no_case(b"UIDNEXT "), nz_number),
            StatusDataItem::UidNext,
        ),
        map(
            preceded(tag_no_case(b"UIDVALIDITY "), nz_number),
            StatusDataItem::UidValidity,
        ),
        map(
            preceded(tag_no_case(b"UNSEEN "), number),
            StatusDataItem::Unseen,
        ),
        map(
            preceded(tag_no_case(b"DELETED-STORAGE "), number64),
            StatusDataItem::DeletedStorage,
        ),
        map(
            preceded(tag_no_case(b"DELETED "), number),
            StatusDataItem::Deleted,
        ),
        map(
            preceded(tag_no_case(b"HIGHESTMODSEQ "), number64),
            StatusDataItem::HighestModSeq,
        ),
    ))(input)
}

/// `mbx-list-flags` inside parentheses.
fn mbx_list_flags(input: &[u8]) -> ImapResult<Vec<FlagNameAttribute>> {
    delimited(
        tag(b"("),
        separated_list0(sp, flag_name_attribute),
        tag(b")"),
    )(input)
}

/// `DQUOTE QUOTED-CHAR DQUOTE / nil`
fn quoted_delimiter(input: &[u8]) -> ImapResult<Option<QuotedChar>> {
    alt((
        map(
            delimited(dquote, quoted_char, dquote),
            Some,
        ),
        map(nil, |_| None),
    ))(input)
}

/// `QUOTED-CHAR`
fn quoted_char(input: &[u8]) -> ImapResult<QuotedChar> {
    fn is_plain(byte: u8) -> bool {
        is_text_char(byte) && byte != b'"' && byte != b'\\'
    }

    map(
        alt((
            preceded(
                tag(b"\\"),
                take_while_m_n(1, 1, |b| b == b'"' || b == b'\\'),
            ),
            take_while_m_n(1, 1, is_plain),
        )),
        |bytes: &[u8]| QuotedChar::unvalidated(bytes[0] as char),
    )(input)
}

/// `nil / "(" 1*namespace-descr ")"`
fn namespace_item(input: &[u8]) -> ImapResult<Vec<NamespaceDescr>> {
    alt((
        map(nil, |_| Vec::new()),
        delimited(tag(b"("), many1(namespace_descr), tag(b")")),
    ))(input)
}

/// `"(" string SP (DQUOTE QUOTED-CHAR DQUOTE / nil) ")"`
fn namespace_descr(input: &[u8]) -> ImapResult<NamespaceDescr> {
    map(
        delimited(
            tag(b"("),
            tuple((nstring, sp, quoted_delimiter)),
            tag(b")"),
        ),
        |(prefix, _, delimiter)| NamespaceDescr { prefix, delimiter },
    )(input)
}

/// `quota-resource = resource-name SP resource-usage SP resource-limit`
fn quota_resource(input: &[u8]) -> ImapResult<QuotaGet> {
    map(
        tuple((atom, sp, number64, sp, number64)),
        |(resource, _, usage, _, limit)| QuotaGet {
            resource,
            usage,
            limit,
        },
    )(input)
}

/// Entry-value list or bare entry list of a METADATA response.
fn metadata_items(input: &[u8]) -> ImapResult<MetadataData> {
    alt((
        map(
            delimited(
                tag(b"("),
                separated_list1(
                    sp,
                    map(
                        tuple((
                            map(astring, |bytes| NString(Some(bytes))),
                            sp,
                            nstring,
                        )),
                        |(entry, _, value)| (entry, value),
                    ),
                ),
                tag(b")"),
            ),
            |entries| MetadataData::WithValues(Vec1::unvalidated(entries)),
        ),
        map(
            separated_list1(sp, map(astring, |bytes| NString(Some(bytes)))),
            |entries| MetadataData::WithoutValues(Vec1::unvalidated(entries)),
        ),
    ))(input)
}
