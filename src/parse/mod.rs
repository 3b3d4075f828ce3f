//! Incremental decoding of server responses.
//!
//! [`ResponseParser`] consumes an append-only byte buffer and produces a
//! lazy sequence of [`ResponseEvent`]s. It never consumes a partial event:
//! when more bytes are needed, [`ResponseParser::next_event`] returns
//! `Ok(None)` and the buffer position is unchanged.
//!
//! FETCH data responses are delivered as a sub-stream of
//! [`FetchEvent`](crate::types::fetch::FetchEvent)s so message bodies are
//! handed through without ever being buffered whole.

pub(crate) mod core;
pub(crate) mod envelope;
pub(crate) mod fetch;
pub(crate) mod response;

use std::{collections::VecDeque, num::NonZeroU32};

use abnf_core::streaming::sp;
use bytes::{Buf, BytesMut};
use nom::{
    bytes::streaming::{tag, tag_no_case},
    sequence::tuple,
};
use thiserror::Error;

use crate::{
    framing::scan_line,
    parse::{
        core::{nz_number, ImapErrorKind, ImapParseError},
        fetch::{msg_att_simple, msg_att_streaming, StreamSource},
    },
    types::{
        fetch::{FetchAttribute, FetchEvent, StreamingKind},
        response::{ContinuationRequest, Response},
    },
};

/// One decoded protocol event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseEvent {
    /// A complete tagged/untagged/BYE response.
    Response(Response),
    /// A `+ ...` line.
    Continuation(ContinuationRequest),
    /// One element of a FETCH sub-stream.
    Fetch(FetchEvent),
}

/// Syntactically invalid inbound bytes.
///
/// The parser's buffer position is preserved on error, so the offending
/// bytes are still visible through [`ResponseParser::buffer`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Parse error at offset {offset}: {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Byte offset relative to the current buffer position.
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("Malformed syntax")]
    Syntax,
    #[error("Invalid number")]
    Number,
    #[error("Invalid base64")]
    Base64,
    #[error("Invalid date-time")]
    DateTime,
    #[error("Nesting limit exceeded")]
    RecursionLimitExceeded,
}

impl From<&ImapErrorKind> for ParseErrorKind {
    fn from(kind: &ImapErrorKind) -> Self {
        match kind {
            ImapErrorKind::BadNumber => Self::Number,
            ImapErrorKind::BadBase64 => Self::Base64,
            ImapErrorKind::BadDateTime => Self::DateTime,
            ImapErrorKind::RecursionLimitExceeded => Self::RecursionLimitExceeded,
            ImapErrorKind::Nom(_) => Self::Syntax,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Expecting the start of a response line.
    Line,
    /// Inside the parenthesized attribute list of a FETCH data response.
    FetchItems { separator_expected: bool },
    /// Streaming the announced payload of a FETCH body item.
    FetchStreaming { remaining: u32 },
}

/// Incremental response parser.
#[derive(Debug)]
pub struct ResponseParser {
    buffer: BytesMut,
    state: State,
    pending: VecDeque<ResponseEvent>,
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseParser {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
            state: State::Line,
            pending: VecDeque::new(),
        }
    }

    /// Appends received bytes to the working buffer.
    pub fn enqueue_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// The bytes that have not been consumed by a decoded event yet.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Decodes the next event, or returns `Ok(None)` when more bytes are
    /// needed.
    pub fn next_event(&mut self) -> Result<Option<ResponseEvent>, ParseError> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }

        match self.state {
            State::Line => self.next_line_event(),
            State::FetchItems { separator_expected } => {
                self.next_fetch_item(separator_expected)
            }
            State::FetchStreaming { remaining } => Ok(self.next_streamed_bytes(remaining)),
        }
    }

    fn next_line_event(&mut self) -> Result<Option<ResponseEvent>, ParseError> {
        let Some(line) = scan_line(&self.buffer, 0) else {
            return Ok(None);
        };

        match self.buffer[0] {
            b'+' => {
                let (consumed, continuation) = {
                    let slice = &self.buffer[..line.end];
                    let (rest, continuation) = response::continue_req(slice)
                        .map_err(|err| convert_error(0, slice.len(), err))?;
                    (slice.len() - rest.len(), continuation)
                };

                self.buffer.advance(consumed);
                Ok(Some(ResponseEvent::Continuation(continuation)))
            }
            b'*' => {
                // FETCH data responses take the streaming path; everything
                // else is accumulated into a complete message first.
                let fetch = {
                    let slice = &self.buffer[..line.end];
                    match fetch_prefix(slice) {
                        Ok((rest, seq)) => Some((slice.len() - rest.len(), seq)),
                        Err(_) => None,
                    }
                };

                if let Some((consumed, seq)) = fetch {
                    self.buffer.advance(consumed);
                    self.state = State::FetchItems {
                        separator_expected: false,
                    };
                    return Ok(Some(ResponseEvent::Fetch(FetchEvent::Start(seq))));
                }

                let Some(message_end) = self.message_end(line) else {
                    return Ok(None);
                };

                let (consumed, response) = {
                    let slice = &self.buffer[..message_end];
                    let (rest, response) = response::untagged_response(slice)
                        .map_err(|err| convert_error(0, slice.len(), err))?;

                    if !rest.is_empty() {
                        return Err(ParseError {
                            kind: ParseErrorKind::Syntax,
                            offset: slice.len() - rest.len(),
                        });
                    }

                    (slice.len(), response)
                };

                self.buffer.advance(consumed);
                Ok(Some(ResponseEvent::Response(response)))
            }
            _ => {
                let (consumed, tagged) = {
                    let slice = &self.buffer[..line.end];
                    let (rest, tagged) = response::response_tagged(slice)
                        .map_err(|err| convert_error(0, slice.len(), err))?;
                    (slice.len() - rest.len(), tagged)
                };

                self.buffer.advance(consumed);
                Ok(Some(ResponseEvent::Response(Response::Tagged(tagged))))
            }
        }
    }

    /// Walks line and literal frames until the current message is complete.
    fn message_end(&self, first_line: crate::framing::LineInfo) -> Option<usize> {
        let mut announcement = first_line.announcement;
        let mut pos = first_line.end;

        while let Some(current) = announcement {
            let payload_end = pos.checked_add(current.length as usize)?;

            if payload_end > self.buffer.len() {
                return None;
            }

            let line = scan_line(&self.buffer, payload_end)?;
            announcement = line.announcement;
            pos = line.end;
        }

        Some(pos)
    }

    fn next_fetch_item(
        &mut self,
        separator_expected: bool,
    ) -> Result<Option<ResponseEvent>, ParseError> {
        let Some(&first) = self.buffer.first() else {
            return Ok(None);
        };

        let offset = if separator_expected {
            match first {
                b')' => {
                    if self.buffer.len() < 3 {
                        return if self.buffer.get(1).map_or(true, |b| *b == b'\r') {
                            Ok(None)
                        } else {
                            Err(ParseError {
                                kind: ParseErrorKind::Syntax,
                                offset: 1,
                            })
                        };
                    }

                    if &self.buffer[1..3] != b"\r\n" {
                        return Err(ParseError {
                            kind: ParseErrorKind::Syntax,
                            offset: 1,
                        });
                    }

                    self.buffer.advance(3);
                    self.state = State::Line;
                    return Ok(Some(ResponseEvent::Fetch(FetchEvent::Finish)));
                }
                b' ' => 1,
                _ => {
                    return Err(ParseError {
                        kind: ParseErrorKind::Syntax,
                        offset: 0,
                    })
                }
            }
        } else {
            0
        };

        enum Outcome {
            Streaming(StreamingKind, StreamSource),
            Attribute(FetchAttribute),
        }

        let parsed = {
            let input = &self.buffer[offset..];

            match msg_att_streaming(input) {
                Ok((rest, (kind, source))) => Ok((
                    offset + (input.len() - rest.len()),
                    Outcome::Streaming(kind, source),
                )),
                Err(nom::Err::Incomplete(_)) => return Ok(None),
                Err(nom::Err::Failure(err)) => {
                    Err(convert_error(offset, input.len(), nom::Err::Failure(err)))
                }
                Err(nom::Err::Error(_)) => match msg_att_simple(input) {
                    Ok((rest, attribute)) => Ok((
                        offset + (input.len() - rest.len()),
                        Outcome::Attribute(attribute),
                    )),
                    Err(nom::Err::Incomplete(_)) => return Ok(None),
                    Err(err) => Err(convert_error(offset, input.len(), err)),
                },
            }
        };

        let (consumed, outcome) = parsed?;
        self.buffer.advance(consumed);
        self.state = State::FetchItems {
            separator_expected: true,
        };

        match outcome {
            Outcome::Attribute(attribute) => {
                Ok(Some(ResponseEvent::Fetch(FetchEvent::Attribute(attribute))))
            }
            Outcome::Streaming(kind, source) => {
                let begin = |length| ResponseEvent::Fetch(FetchEvent::StreamingBegin { kind, length });

                match source {
                    StreamSource::Nil => {
                        self.pending
                            .push_back(ResponseEvent::Fetch(FetchEvent::StreamingEnd));
                        Ok(Some(begin(0)))
                    }
                    StreamSource::Inline(bytes) => {
                        let length = bytes.len() as u32;
                        if length > 0 {
                            self.pending
                                .push_back(ResponseEvent::Fetch(FetchEvent::StreamingBytes(bytes)));
                        }
                        self.pending
                            .push_back(ResponseEvent::Fetch(FetchEvent::StreamingEnd));
                        Ok(Some(begin(length)))
                    }
                    StreamSource::Literal(0) => {
                        self.pending
                            .push_back(ResponseEvent::Fetch(FetchEvent::StreamingEnd));
                        Ok(Some(begin(0)))
                    }
                    StreamSource::Literal(length) => {
                        self.state = State::FetchStreaming { remaining: length };
                        Ok(Some(begin(length)))
                    }
                }
            }
        }
    }

    fn next_streamed_bytes(&mut self, remaining: u32) -> Option<ResponseEvent> {
        if self.buffer.is_empty() {
            return None;
        }

        let take = (remaining as usize).min(self.buffer.len());
        let bytes = self.buffer.split_to(take).to_vec();
        let remaining = remaining - take as u32;

        if remaining == 0 {
            self.state = State::FetchItems {
                separator_expected: true,
            };
            self.pending
                .push_back(ResponseEvent::Fetch(FetchEvent::StreamingEnd));
        } else {
            self.state = State::FetchStreaming { remaining };
        }

        Some(ResponseEvent::Fetch(FetchEvent::StreamingBytes(bytes)))
    }
}

/// `"*" SP nz-number SP "FETCH" SP "("`
fn fetch_prefix(input: &[u8]) -> Result<(&[u8], NonZeroU32), nom::Err<ImapParseError>> {
    let (remaining, (_, seq, _, _, _, _)) = tuple((
        tag(b"* "),
        nz_number,
        sp,
        tag_no_case(b"FETCH"),
        sp,
        tag(b"("),
    ))(input)?;

    Ok((remaining, seq))
}

fn convert_error(base: usize, slice_len: usize, err: nom::Err<ImapParseError>) -> ParseError {
    match err {
        nom::Err::Incomplete(_) => ParseError {
            kind: ParseErrorKind::Syntax,
            offset: base,
        },
        nom::Err::Error(err) | nom::Err::Failure(err) => ParseError {
            kind: ParseErrorKind::from(&err.kind),
            offset: base + (slice_len - err.input.len()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        core::NString,
        fetch::{Section, StreamingKind},
        flag::{Flag, FlagFetch},
        response::{CompletionKind, Tagged, UntaggedData},
    };

    fn collect(parser: &mut ResponseParser) -> Vec<ResponseEvent> {
        let mut events = Vec::new();
        while let Some(event) = parser.next_event().unwrap() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_incomplete_input_keeps_position() {
        let mut parser = ResponseParser::new();
        parser.enqueue_bytes(b"* OK welco");

        assert_eq!(parser.next_event().unwrap(), None);
        assert_eq!(parser.buffer(), b"* OK welco");

        parser.enqueue_bytes(b"me\r\n");
        let events = collect(&mut parser);
        assert_eq!(events.len(), 1);
        assert!(parser.buffer().is_empty());
    }

    #[test]
    fn test_tagged_response() {
        let mut parser = ResponseParser::new();
        parser.enqueue_bytes(b"a OK ok\r\n");

        match parser.next_event().unwrap().unwrap() {
            ResponseEvent::Response(Response::Tagged(Tagged { kind, .. })) => {
                assert_eq!(kind, CompletionKind::Ok);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_continuation() {
        let mut parser = ResponseParser::new();
        parser.enqueue_bytes(b"+ idling\r\n");

        assert!(matches!(
            parser.next_event().unwrap().unwrap(),
            ResponseEvent::Continuation(ContinuationRequest::Basic(_))
        ));
    }

    #[test]
    fn test_fetch_streaming() {
        let mut parser = ResponseParser::new();
        parser
            .enqueue_bytes(b"* 2 FETCH (FLAGS (\\Deleted) BODY[TEXT] {1}\r\nX)\r\n2 OK Fetch completed.\r\n");

        let events = collect(&mut parser);

        assert_eq!(
            events,
            vec![
                ResponseEvent::Fetch(FetchEvent::Start(NonZeroU32::new(2).unwrap())),
                ResponseEvent::Fetch(FetchEvent::Attribute(FetchAttribute::Flags(vec![
                    FlagFetch::Flag(Flag::Deleted)
                ]))),
                ResponseEvent::Fetch(FetchEvent::StreamingBegin {
                    kind: StreamingKind::Body {
                        section: Some(Section::Text(None)),
                        origin: None,
                    },
                    length: 1,
                }),
                ResponseEvent::Fetch(FetchEvent::StreamingBytes(b"X".to_vec())),
                ResponseEvent::Fetch(FetchEvent::StreamingEnd),
                ResponseEvent::Fetch(FetchEvent::Finish),
                ResponseEvent::Response(Response::Tagged(Tagged {
                    tag: crate::types::core::Tag::try_from("2").unwrap(),
                    kind: CompletionKind::Ok,
                    text: crate::types::response::ResponseText {
                        code: None,
                        text: crate::types::core::Text::try_from("Fetch completed.").unwrap(),
                    },
                })),
            ]
        );
    }

    #[test]
    fn test_fetch_streaming_in_pieces() {
        let mut parser = ResponseParser::new();
        parser.enqueue_bytes(b"* 7 FETCH (BODY[] {10}\r\nabc");

        let events = collect(&mut parser);
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[1],
            ResponseEvent::Fetch(FetchEvent::StreamingBegin { length: 10, .. })
        ));
        assert_eq!(
            events[2],
            ResponseEvent::Fetch(FetchEvent::StreamingBytes(b"abc".to_vec()))
        );

        parser.enqueue_bytes(b"defg");
        let events = collect(&mut parser);
        assert_eq!(
            events,
            vec![ResponseEvent::Fetch(FetchEvent::StreamingBytes(
                b"defg".to_vec()
            ))]
        );

        parser.enqueue_bytes(b"hij UID 99)\r\n");
        let events = collect(&mut parser);
        assert_eq!(
            events,
            vec![
                ResponseEvent::Fetch(FetchEvent::StreamingBytes(b"hij".to_vec())),
                ResponseEvent::Fetch(FetchEvent::StreamingEnd),
                ResponseEvent::Fetch(FetchEvent::Attribute(FetchAttribute::Uid(
                    NonZeroU32::new(99).unwrap()
                ))),
                ResponseEvent::Fetch(FetchEvent::Finish),
            ]
        );
    }

    #[test]
    fn test_fetch_nil_body_is_an_empty_stream() {
        let mut parser = ResponseParser::new();
        parser.enqueue_bytes(b"* 3 FETCH (BODY[] NIL)\r\n");

        let events = collect(&mut parser);
        assert_eq!(
            events[1],
            ResponseEvent::Fetch(FetchEvent::StreamingBegin {
                kind: StreamingKind::Body {
                    section: None,
                    origin: None,
                },
                length: 0,
            })
        );
        assert_eq!(events[2], ResponseEvent::Fetch(FetchEvent::StreamingEnd));
        assert_eq!(events[3], ResponseEvent::Fetch(FetchEvent::Finish));
    }

    #[test]
    fn test_untagged_with_literal_waits_for_whole_message() {
        let mut parser = ResponseParser::new();
        parser.enqueue_bytes(b"* LIST () \"/\" {5}\r\nbo");

        assert_eq!(parser.next_event().unwrap(), None);

        parser.enqueue_bytes(b"ite\r\n");
        match parser.next_event().unwrap().unwrap() {
            ResponseEvent::Response(Response::Untagged(UntaggedData::List {
                mailbox, ..
            })) => {
                assert_eq!(mailbox.as_bytes(), b"boite");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_keeps_buffer() {
        let mut parser = ResponseParser::new();
        parser.enqueue_bytes(b"!!!\r\n");

        let err = parser.next_event().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Syntax);
        assert_eq!(parser.buffer(), b"!!!\r\n");
    }

    #[test]
    fn test_fetch_envelope_with_inner_literal() {
        let mut parser = ResponseParser::new();
        parser.enqueue_bytes(b"* 1 FETCH (ENVELOPE ({3}\r\nabc NIL NIL NIL NIL NIL NIL NIL NIL NIL))\r\n");

        let events = collect(&mut parser);
        assert_eq!(events.len(), 3);
        match &events[1] {
            ResponseEvent::Fetch(FetchEvent::Attribute(FetchAttribute::Envelope(envelope))) => {
                assert_eq!(envelope.date, NString(Some(b"abc".to_vec())));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
