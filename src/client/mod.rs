//! The client state machine.
//!
//! [`ClientEngine`] sequences commands and responses for one connection: it
//! admits pipelined commands, serializes the chunks of commands that carry
//! synchronizing literals, routes continuation requests to the command that
//! owns them, enforces the IDLE / AUTHENTICATE / APPEND mode transitions,
//! and surfaces protocol violations as typed [`ClientError`]s.
//!
//! The engine is sans-I/O: it never blocks and owns no socket. The
//! embedder writes the [`OutgoingChunk`]s it hands out and feeds received
//! bytes back in via [`ClientEngine::enqueue_bytes`] /
//! [`ClientEngine::next_event`] (or pre-parsed values via
//! [`ClientEngine::receive_response`] / [`ClientEngine::receive_continuation`]).

mod append;

use std::{collections::VecDeque, io};

use thiserror::Error;

use append::{AppendError, AppendProgress};

use crate::{
    codec::{
        encode_append_start, encode_command, encode_continuation_response, encode_idle_done,
        Chunk, EncodingOptions, OptionsPolicy,
    },
    parse::{ParseError, ResponseEvent, ResponseParser},
    types::{
        command::{AppendSubcommand, Command, CommandBody, CommandStreamPart},
        core::Tag,
        fetch::FetchEvent,
        response::{
            Capability, Code, ContinuationRequest, Response, ResponseText, Tagged, UntaggedData,
        },
    },
};

/// Identifies one submitted [`CommandStreamPart`].
///
/// A handle is a completion token: the transport signals it (success) once
/// the chunk carrying it has been accepted, and the engine reports it in
/// errors that fail a part before any of its bytes went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandHandle(u64);

/// Bytes ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingChunk {
    pub bytes: Vec<u8>,
    /// The handle of the part whose bytes end with this chunk, if any.
    /// Chunks that stop at a literal boundary carry `None`.
    pub handle: Option<CommandHandle>,
    /// Whether this chunk completes the submitted part; the transport
    /// should signal `handle` success after writing it.
    pub completes: bool,
}

/// Result of a successful [`ClientEngine::send_command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enqueued {
    pub handle: CommandHandle,
    /// The first chunk, when it may be sent immediately. `None` means the
    /// part is queued behind an outstanding continuation request.
    pub chunk: Option<OutgoingChunk>,
}

/// What a continuation request means in the current mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContinuationAction {
    /// A literal was granted: send these chunks now, in order.
    SendChunks(Vec<OutgoingChunk>),
    /// The server entered IDLE.
    IdleStarted,
    /// A SASL challenge (empty when the payload was absent or not valid
    /// base64).
    AuthenticationChallenge(Vec<u8>),
}

/// A user-visible protocol event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A command completed. `NO`/`BAD` are results, not engine errors.
    Tagged(Tagged),
    Untagged(UntaggedData),
    /// `* BYE ...`
    Fatal(ResponseText),
    /// An element of a FETCH sub-stream.
    Fetch(FetchEvent),
    IdleStarted,
    AuthenticationChallenge(Vec<u8>),
    /// Chunks released by a continuation request.
    SendChunks(Vec<OutgoingChunk>),
}

/// Typed engine errors.
///
/// Any error on the receive path leaves the connection unusable at the
/// protocol layer: the engine refuses further work and the caller should
/// tear the connection down.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Response not valid in the current state")]
    UnexpectedResponse { response: Box<Response> },
    #[error("Continuation request arrived while nothing was pending")]
    UnexpectedContinuationRequest,
    #[error("Command not valid in the current state")]
    InvalidCommandForState { part: Box<CommandStreamPart> },
    #[error("Tag is already in use by an outstanding command")]
    DuplicateCommandTag { tag: Tag },
    #[error("Invalid client state: {reason}")]
    InvalidClientState { reason: &'static str },
    #[error("Encoding failed")]
    Encode(#[source] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdlePhase {
    /// IDLE was sent; the first continuation request confirms it.
    AwaitingStart,
    Started,
    DoneSent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum EngineState {
    /// Zero or more non-interactive commands outstanding.
    Normal,
    /// Blocked on the server's `+` for a synchronizing literal of `tag`.
    LiteralWait { tag: Tag },
    Idle { tag: Tag, phase: IdlePhase },
    Authenticating { tag: Tag },
    Appending { tag: Tag, wait: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandKind {
    Normal,
    Idle,
    Authenticate,
    Append,
}

#[derive(Debug)]
struct Outstanding {
    tag: Tag,
    handle: CommandHandle,
    kind: CommandKind,
    /// Whether any byte of this command was handed to the transport.
    sent_any: bool,
}

#[derive(Debug)]
struct PendingChunk {
    tag: Tag,
    chunk: Chunk,
    handle: Option<CommandHandle>,
    completes: bool,
    /// Emitting this chunk completes an APPEND command line.
    finishes_append: bool,
}

/// The protocol engine for one connection.
#[derive(Debug)]
pub struct ClientEngine {
    parser: ResponseParser,
    policy: OptionsPolicy,
    /// Profile derived from the last-seen capability advertisement.
    advertised: EncodingOptions,
    state: EngineState,
    /// Ordered by submission; looked up by tag for completions.
    outstanding: Vec<Outstanding>,
    /// Chunks blocked on an outstanding continuation request.
    pending: VecDeque<PendingChunk>,
    append: Option<AppendProgress>,
    next_handle: u64,
    poisoned: bool,
}

impl Default for ClientEngine {
    fn default() -> Self {
        Self::new(OptionsPolicy::Automatic)
    }
}

impl ClientEngine {
    pub fn new(policy: OptionsPolicy) -> Self {
        Self {
            parser: ResponseParser::new(),
            policy,
            advertised: EncodingOptions::default(),
            state: EngineState::Normal,
            outstanding: Vec::new(),
            pending: VecDeque::new(),
            append: None,
            next_handle: 0,
            poisoned: false,
        }
    }

    /// The options the encoder currently works with.
    pub fn encoding_options(&self) -> EncodingOptions {
        match self.policy {
            OptionsPolicy::Automatic => self.advertised,
            OptionsPolicy::Fixed(options) => options,
        }
    }

    /// Switches between capability-derived and pinned encoding options.
    /// Recorded capability observations apply immediately when switching
    /// back to [`OptionsPolicy::Automatic`].
    pub fn set_options_policy(&mut self, policy: OptionsPolicy) {
        self.policy = policy;
    }

    // ----- send path -----

    /// Submits a command part.
    ///
    /// Returns the first chunk when it can go on the wire immediately;
    /// otherwise the part's chunks are queued and released by a later
    /// continuation request. Errors leave the engine unchanged and mean no
    /// byte of the part will ever be sent.
    pub fn send_command(&mut self, part: CommandStreamPart) -> Result<Enqueued, ClientError> {
        self.check_usable()?;

        match part {
            CommandStreamPart::Tagged(command) => self.send_tagged(command),
            CommandStreamPart::IdleDone => self.send_idle_done(),
            CommandStreamPart::ContinuationResponse(data) => self.send_continuation_response(data),
            CommandStreamPart::Append(subcommand) => self.send_append(subcommand),
        }
    }

    fn send_tagged(&mut self, command: Command) -> Result<Enqueued, ClientError> {
        if self.outstanding.iter().any(|o| o.tag == command.tag) {
            return Err(ClientError::DuplicateCommandTag { tag: command.tag });
        }

        let kind = match command.body {
            CommandBody::Idle => CommandKind::Idle,
            CommandBody::Authenticate { .. } => CommandKind::Authenticate,
            _ => CommandKind::Normal,
        };

        // Interactive commands own the connection; they cannot be preloaded
        // behind a literal wait.
        let admitted = match self.state {
            EngineState::Normal => true,
            EngineState::LiteralWait { .. } => kind == CommandKind::Normal,
            _ => false,
        };
        let preload_blocked = kind != CommandKind::Normal && !self.pending.is_empty();

        if !admitted || preload_blocked {
            return Err(ClientError::InvalidCommandForState {
                part: Box::new(CommandStreamPart::Tagged(command)),
            });
        }

        let chunks =
            encode_command(&command, self.encoding_options()).map_err(ClientError::Encode)?;
        let tag = command.tag;
        let handle = self.allocate_handle();

        self.outstanding.push(Outstanding {
            tag: tag.clone(),
            handle,
            kind,
            sent_any: false,
        });

        let (chunk, blocked) = self.stage_chunks(&tag, handle, chunks, false);

        match kind {
            CommandKind::Idle => {
                self.state = EngineState::Idle {
                    tag,
                    phase: IdlePhase::AwaitingStart,
                };
            }
            CommandKind::Authenticate => {
                self.state = EngineState::Authenticating { tag };
            }
            CommandKind::Normal if blocked => {
                self.state = EngineState::LiteralWait { tag };
            }
            _ => {}
        }

        Ok(Enqueued { handle, chunk })
    }

    fn send_idle_done(&mut self) -> Result<Enqueued, ClientError> {
        match &mut self.state {
            EngineState::Idle { phase, .. } if *phase == IdlePhase::Started => {
                *phase = IdlePhase::DoneSent;
            }
            _ => {
                return Err(ClientError::InvalidCommandForState {
                    part: Box::new(CommandStreamPart::IdleDone),
                })
            }
        }

        let handle = self.allocate_handle();
        let chunk = encode_idle_done();

        Ok(Enqueued {
            handle,
            chunk: Some(OutgoingChunk {
                bytes: chunk.bytes,
                handle: Some(handle),
                completes: true,
            }),
        })
    }

    fn send_continuation_response(&mut self, data: Vec<u8>) -> Result<Enqueued, ClientError> {
        if !matches!(self.state, EngineState::Authenticating { .. }) {
            return Err(ClientError::InvalidCommandForState {
                part: Box::new(CommandStreamPart::ContinuationResponse(data)),
            });
        }

        let handle = self.allocate_handle();
        let chunk = encode_continuation_response(&data);

        Ok(Enqueued {
            handle,
            chunk: Some(OutgoingChunk {
                bytes: chunk.bytes,
                handle: Some(handle),
                completes: true,
            }),
        })
    }

    fn send_append(&mut self, subcommand: AppendSubcommand) -> Result<Enqueued, ClientError> {
        if let AppendSubcommand::Start { .. } = &subcommand {
            return self.send_append_start(subcommand);
        }

        let tag = match &self.state {
            EngineState::Appending { tag, .. } => tag.clone(),
            _ => {
                return Err(ClientError::InvalidCommandForState {
                    part: Box::new(CommandStreamPart::Append(subcommand)),
                })
            }
        };

        let Some(progress) = self.append.as_mut() else {
            return Err(ClientError::InvalidClientState {
                reason: "append mode without append progress",
            });
        };

        let options = match self.policy {
            OptionsPolicy::Automatic => self.advertised,
            OptionsPolicy::Fixed(options) => options,
        };

        let step = progress
            .encode(&subcommand, options)
            .map_err(|err| match err {
                AppendError::IllegalSubcommand => ClientError::InvalidCommandForState {
                    part: Box::new(CommandStreamPart::Append(subcommand.clone())),
                },
                AppendError::ByteCountExceeded => ClientError::InvalidClientState {
                    reason: "more message bytes than announced",
                },
                AppendError::ByteCountNotReached => ClientError::InvalidClientState {
                    reason: "message ended before all announced bytes",
                },
                AppendError::Encode(err) => ClientError::Encode(err),
            })?;

        let handle = self.allocate_handle();
        let (chunk, blocked) = self.stage_chunks(&tag, handle, step.chunks, step.finished);

        if step.finished && !blocked && self.pending.is_empty() {
            // The command line is fully on the wire; only the tagged
            // response is outstanding now.
            self.append = None;
            self.state = EngineState::Normal;
        } else if let EngineState::Appending { wait, .. } = &mut self.state {
            *wait = *wait || blocked;
        }

        Ok(Enqueued { handle, chunk })
    }

    fn send_append_start(&mut self, subcommand: AppendSubcommand) -> Result<Enqueued, ClientError> {
        let AppendSubcommand::Start { tag, mailbox } = &subcommand else {
            unreachable!("checked by caller");
        };

        if !matches!(self.state, EngineState::Normal) || !self.pending.is_empty() {
            return Err(ClientError::InvalidCommandForState {
                part: Box::new(CommandStreamPart::Append(subcommand)),
            });
        }

        if self.outstanding.iter().any(|o| o.tag == *tag) {
            return Err(ClientError::DuplicateCommandTag { tag: tag.clone() });
        }

        let chunks = encode_append_start(tag, mailbox, self.encoding_options())
            .map_err(ClientError::Encode)?;
        let tag = tag.clone();
        let handle = self.allocate_handle();

        self.outstanding.push(Outstanding {
            tag: tag.clone(),
            handle,
            kind: CommandKind::Append,
            sent_any: false,
        });
        self.append = Some(AppendProgress::new());

        let (chunk, blocked) = self.stage_chunks(&tag, handle, chunks, false);
        self.state = EngineState::Appending {
            tag,
            wait: blocked,
        };

        Ok(Enqueued { handle, chunk })
    }

    /// Queues the chunks of one part. Returns the first chunk when it can
    /// be sent now, and whether the wire is blocked on a continuation
    /// request afterwards.
    fn stage_chunks(
        &mut self,
        tag: &Tag,
        handle: CommandHandle,
        chunks: Vec<Chunk>,
        finishes_append: bool,
    ) -> (Option<OutgoingChunk>, bool) {
        let count = chunks.len();
        let mut pending: VecDeque<PendingChunk> = chunks
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| {
                let last = index + 1 == count;
                PendingChunk {
                    tag: tag.clone(),
                    chunk,
                    handle: last.then_some(handle),
                    completes: last,
                    finishes_append: last && finishes_append,
                }
            })
            .collect();

        let emit_now = self.pending.is_empty() && !self.wire_blocked();

        if !emit_now {
            self.pending.append(&mut pending);
            return (None, false);
        }

        let Some(first) = pending.pop_front() else {
            // A part may encode to nothing at all, e.g. `EndMessage`.
            return (None, false);
        };

        let blocked = first.chunk.wait_for_continuation;
        self.mark_sent(tag);
        self.pending.append(&mut pending);

        (
            Some(OutgoingChunk {
                bytes: first.chunk.bytes,
                handle: first.handle,
                completes: first.completes,
            }),
            blocked,
        )
    }

    fn wire_blocked(&self) -> bool {
        matches!(
            self.state,
            EngineState::LiteralWait { .. } | EngineState::Appending { wait: true, .. }
        )
    }

    // ----- receive path -----

    /// Feeds received bytes into the engine's parser.
    pub fn enqueue_bytes(&mut self, bytes: &[u8]) {
        self.parser.enqueue_bytes(bytes);
    }

    /// Decodes and routes the next inbound event, or returns `Ok(None)`
    /// when more bytes are needed.
    pub fn next_event(&mut self) -> Result<Option<ClientEvent>, ClientError> {
        let event = match self.parser.next_event() {
            Ok(Some(event)) => event,
            Ok(None) => return Ok(None),
            Err(err) => {
                self.poisoned = true;
                return Err(ClientError::Parse(err));
            }
        };

        match event {
            ResponseEvent::Fetch(event) => Ok(Some(ClientEvent::Fetch(event))),
            ResponseEvent::Response(response) => self.receive_response(response).map(Some),
            ResponseEvent::Continuation(continuation) => {
                Ok(Some(match self.receive_continuation(continuation)? {
                    ContinuationAction::SendChunks(chunks) => ClientEvent::SendChunks(chunks),
                    ContinuationAction::IdleStarted => ClientEvent::IdleStarted,
                    ContinuationAction::AuthenticationChallenge(data) => {
                        ClientEvent::AuthenticationChallenge(data)
                    }
                }))
            }
        }
    }

    /// Routes one parsed response.
    ///
    /// Untagged responses pass through in any state, including while a
    /// literal continuation is awaited. A tagged response completes the
    /// matching outstanding command; a tagged response for the command
    /// whose literal is currently awaited is a protocol violation.
    pub fn receive_response(&mut self, response: Response) -> Result<ClientEvent, ClientError> {
        self.check_usable()?;
        self.observe_capabilities(&response);

        let tagged = match response {
            Response::Untagged(data) => return Ok(ClientEvent::Untagged(data)),
            Response::Fatal(text) => return Ok(ClientEvent::Fatal(text)),
            Response::Tagged(tagged) => tagged,
        };

        if let EngineState::LiteralWait { tag } = &self.state {
            if *tag == tagged.tag {
                self.poisoned = true;
                return Err(ClientError::UnexpectedResponse {
                    response: Box::new(Response::Tagged(tagged)),
                });
            }
        }

        let Some(position) = self
            .outstanding
            .iter()
            .position(|o| o.tag == tagged.tag)
        else {
            self.poisoned = true;
            return Err(ClientError::UnexpectedResponse {
                response: Box::new(Response::Tagged(tagged)),
            });
        };

        self.outstanding.remove(position);

        // An early completion (e.g. NO before the command was fully sent)
        // may leave unsent chunks behind; they must never reach the wire.
        self.pending.retain(|p| p.tag != tagged.tag);

        // Leaving a mode is tied to the completion of the command that
        // entered it.
        let mode_over = match &self.state {
            EngineState::Idle { tag, .. }
            | EngineState::Authenticating { tag }
            | EngineState::Appending { tag, .. } => *tag == tagged.tag,
            _ => false,
        };

        if mode_over {
            self.append = None;
            self.state = EngineState::Normal;
        }

        Ok(ClientEvent::Tagged(tagged))
    }

    /// Routes one continuation request based on the current mode.
    pub fn receive_continuation(
        &mut self,
        continuation: ContinuationRequest,
    ) -> Result<ContinuationAction, ClientError> {
        self.check_usable()?;

        match self.state.clone() {
            EngineState::LiteralWait { .. } => {
                let (chunks, blocked, _) = self.release_pending();
                self.state = match blocked {
                    Some(tag) => EngineState::LiteralWait { tag },
                    None => EngineState::Normal,
                };
                Ok(ContinuationAction::SendChunks(chunks))
            }
            EngineState::Appending { tag, wait } => {
                if !wait {
                    self.poisoned = true;
                    return Err(ClientError::UnexpectedContinuationRequest);
                }

                let (chunks, blocked, finished) = self.release_pending();
                self.state = if blocked.is_some() {
                    EngineState::Appending { tag, wait: true }
                } else if finished {
                    self.append = None;
                    EngineState::Normal
                } else {
                    EngineState::Appending { tag, wait: false }
                };
                Ok(ContinuationAction::SendChunks(chunks))
            }
            EngineState::Idle { tag, phase } => match phase {
                IdlePhase::AwaitingStart => {
                    self.state = EngineState::Idle {
                        tag,
                        phase: IdlePhase::Started,
                    };
                    Ok(ContinuationAction::IdleStarted)
                }
                IdlePhase::Started | IdlePhase::DoneSent => {
                    self.poisoned = true;
                    Err(ClientError::UnexpectedContinuationRequest)
                }
            },
            EngineState::Authenticating { .. } => Ok(ContinuationAction::AuthenticationChallenge(
                challenge_bytes(continuation),
            )),
            EngineState::Normal => {
                self.poisoned = true;
                Err(ClientError::UnexpectedContinuationRequest)
            }
        }
    }

    /// Emits any chunks that are ready without a further continuation
    /// request. The engine hands chunks out directly from
    /// [`ClientEngine::send_command`] and
    /// [`ClientEngine::receive_continuation`], so this is a no-op unless a
    /// future release buffers chunks internally; it is idempotent and safe
    /// to call in every transport loop iteration.
    pub fn flush(&mut self) -> Vec<OutgoingChunk> {
        Vec::new()
    }

    /// Cancels a part that has not put any byte on the wire yet.
    ///
    /// In-flight commands cannot be cancelled (the protocol has no cancel
    /// primitive); for those this returns `false` and the bytes will still
    /// be sent.
    pub fn cancel(&mut self, handle: CommandHandle) -> bool {
        let Some(position) = self.outstanding.iter().position(|o| o.handle == handle) else {
            return false;
        };

        let outstanding = &self.outstanding[position];
        if outstanding.sent_any || outstanding.kind != CommandKind::Normal {
            return false;
        }

        let tag = outstanding.tag.clone();
        self.pending.retain(|p| p.tag != tag);
        self.outstanding.remove(position);
        true
    }

    /// Outstanding command tags in submission order.
    pub fn outstanding_tags(&self) -> impl Iterator<Item = &Tag> {
        self.outstanding.iter().map(|o| &o.tag)
    }

    // ----- internals -----

    fn check_usable(&self) -> Result<(), ClientError> {
        if self.poisoned {
            Err(ClientError::InvalidClientState {
                reason: "connection is unusable after an earlier protocol error",
            })
        } else {
            Ok(())
        }
    }

    fn allocate_handle(&mut self) -> CommandHandle {
        let handle = CommandHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    fn mark_sent(&mut self, tag: &Tag) {
        if let Some(outstanding) = self.outstanding.iter_mut().find(|o| o.tag == *tag) {
            outstanding.sent_any = true;
        }
    }

    /// Releases pending chunks up to and including the next stop point.
    fn release_pending(&mut self) -> (Vec<OutgoingChunk>, Option<Tag>, bool) {
        let mut chunks = Vec::new();
        let mut blocked = None;
        let mut finished = false;

        while let Some(front) = self.pending.pop_front() {
            let wait = front.chunk.wait_for_continuation;
            finished |= front.finishes_append;
            self.mark_sent(&front.tag);
            chunks.push(OutgoingChunk {
                bytes: front.chunk.bytes,
                handle: front.handle,
                completes: front.completes,
            });

            if wait {
                blocked = Some(front.tag);
                break;
            }
        }

        (chunks, blocked, finished)
    }

    fn observe_capabilities(&mut self, response: &Response) {
        let capabilities: Option<&[Capability]> = match response {
            Response::Untagged(UntaggedData::Capability(capabilities)) => {
                Some(capabilities.as_slice())
            }
            Response::Untagged(UntaggedData::Condition {
                text:
                    ResponseText {
                        code: Some(Code::Capability(capabilities)),
                        ..
                    },
                ..
            }) => Some(capabilities.as_slice()),
            Response::Tagged(Tagged {
                text:
                    ResponseText {
                        code: Some(Code::Capability(capabilities)),
                        ..
                    },
                ..
            }) => Some(capabilities.as_slice()),
            _ => None,
        };

        if let Some(capabilities) = capabilities {
            self.advertised = EncodingOptions::from_capabilities(capabilities);
            log::trace!("updated encoding profile: {:?}", self.advertised);
        }
    }
}

fn challenge_bytes(continuation: ContinuationRequest) -> Vec<u8> {
    match continuation {
        ContinuationRequest::Base64(data) => data,
        ContinuationRequest::Basic(text) => {
            // Not valid base64 (the parser already tried); the convention
            // is an empty challenge, not an error.
            log::warn!(
                "continuation request without base64 payload during AUTHENTICATE: {:?}",
                text.text
            );
            Vec::new()
        }
    }
}
