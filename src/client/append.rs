//! Progression of a streamed APPEND command.
//!
//! The legal order of subcommands forms
//! `Start (BeginMessage MessageBytes* EndMessage
//!        | BeginCatenate (CatenateUrl | CatenateData...)* EndCatenate)* Finish`.
//! [`AppendProgress`] tracks where in that expression the command stands and
//! rejects everything else before any bytes are produced.

use std::io;

use crate::{
    codec::{
        encode_append_begin_catenate, encode_append_begin_message, encode_append_end_catenate,
        encode_append_finish, encode_catenate_data_begin, encode_catenate_url, Chunk,
        EncodingOptions,
    },
    types::command::{AppendSubcommand, CatenatePart},
};

#[derive(Debug)]
pub(crate) struct AppendProgress {
    phase: AppendPhase,
    /// Whether at least one message (or catenate group) was announced.
    /// `Finish` on an argument-less APPEND would produce an invalid line.
    appended_any: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppendPhase {
    /// Between messages: BeginMessage, BeginCatenate, or Finish.
    Arguments,
    /// Streaming the announced message payload.
    Message { remaining: u32 },
    /// Inside a `CATENATE (...)` list.
    Catenate { first: bool },
    /// Streaming the payload of a `TEXT` catenate element.
    CatenateData { remaining: u32 },
}

/// Why a subcommand was rejected.
#[derive(Debug)]
pub(crate) enum AppendError {
    /// The subcommand is not legal at the current position.
    IllegalSubcommand,
    /// More payload bytes were submitted than announced.
    ByteCountExceeded,
    /// The payload was ended before all announced bytes were submitted.
    ByteCountNotReached,
    Encode(io::Error),
}

impl From<io::Error> for AppendError {
    fn from(err: io::Error) -> Self {
        Self::Encode(err)
    }
}

/// The encoded chunks of one accepted subcommand.
pub(crate) struct AppendStep {
    pub(crate) chunks: Vec<Chunk>,
    /// The command line is complete; the engine leaves append mode once
    /// these chunks are on the wire.
    pub(crate) finished: bool,
}

impl AppendProgress {
    pub(crate) fn new() -> Self {
        Self {
            phase: AppendPhase::Arguments,
            appended_any: false,
        }
    }

    /// Validates and encodes the next subcommand. The phase only advances
    /// when the subcommand is accepted.
    pub(crate) fn encode(
        &mut self,
        subcommand: &AppendSubcommand,
        options: EncodingOptions,
    ) -> Result<AppendStep, AppendError> {
        let step = match (self.phase, subcommand) {
            // Start is handled by the engine itself.
            (_, AppendSubcommand::Start { .. }) => return Err(AppendError::IllegalSubcommand),

            (
                AppendPhase::Arguments,
                AppendSubcommand::BeginMessage {
                    options: append_options,
                    byte_count,
                },
            ) => {
                let chunks = encode_append_begin_message(append_options, *byte_count, options)?;
                self.phase = AppendPhase::Message {
                    remaining: *byte_count,
                };
                self.appended_any = true;
                AppendStep {
                    chunks,
                    finished: false,
                }
            }
            (AppendPhase::Message { remaining }, AppendSubcommand::MessageBytes(bytes)) => {
                let remaining = self.accept_payload(remaining, bytes)?;
                self.phase = AppendPhase::Message { remaining };
                AppendStep {
                    chunks: vec![payload_chunk(bytes)],
                    finished: false,
                }
            }
            (AppendPhase::Message { remaining: 0 }, AppendSubcommand::EndMessage) => {
                self.phase = AppendPhase::Arguments;
                AppendStep {
                    chunks: Vec::new(),
                    finished: false,
                }
            }
            (AppendPhase::Message { .. }, AppendSubcommand::EndMessage) => {
                return Err(AppendError::ByteCountNotReached)
            }

            (
                AppendPhase::Arguments,
                AppendSubcommand::BeginCatenate {
                    options: append_options,
                },
            ) => {
                let chunks = encode_append_begin_catenate(append_options, options)?;
                self.phase = AppendPhase::Catenate { first: true };
                self.appended_any = true;
                AppendStep {
                    chunks,
                    finished: false,
                }
            }
            (AppendPhase::Catenate { first }, AppendSubcommand::CatenateUrl(url)) => {
                let chunks = encode_catenate_url(url, first, options)?;
                self.phase = AppendPhase::Catenate { first: false };
                AppendStep {
                    chunks,
                    finished: false,
                }
            }
            (
                AppendPhase::Catenate { first },
                AppendSubcommand::CatenateData(CatenatePart::Begin { byte_count }),
            ) => {
                let chunks = encode_catenate_data_begin(*byte_count, first, options)?;
                self.phase = AppendPhase::CatenateData {
                    remaining: *byte_count,
                };
                AppendStep {
                    chunks,
                    finished: false,
                }
            }
            (
                AppendPhase::CatenateData { remaining },
                AppendSubcommand::CatenateData(CatenatePart::Bytes(bytes)),
            ) => {
                let remaining = self.accept_payload(remaining, bytes)?;
                self.phase = AppendPhase::CatenateData { remaining };
                AppendStep {
                    chunks: vec![payload_chunk(bytes)],
                    finished: false,
                }
            }
            (
                AppendPhase::CatenateData { remaining: 0 },
                AppendSubcommand::CatenateData(CatenatePart::End),
            ) => {
                self.phase = AppendPhase::Catenate { first: false };
                AppendStep {
                    chunks: Vec::new(),
                    finished: false,
                }
            }
            (
                AppendPhase::CatenateData { .. },
                AppendSubcommand::CatenateData(CatenatePart::End),
            ) => return Err(AppendError::ByteCountNotReached),
            (AppendPhase::Catenate { .. }, AppendSubcommand::EndCatenate) => {
                self.phase = AppendPhase::Arguments;
                AppendStep {
                    chunks: vec![encode_append_end_catenate()],
                    finished: false,
                }
            }

            (AppendPhase::Arguments, AppendSubcommand::Finish) => {
                if !self.appended_any {
                    return Err(AppendError::IllegalSubcommand);
                }

                AppendStep {
                    chunks: vec![encode_append_finish()],
                    finished: true,
                }
            }

            (_, _) => return Err(AppendError::IllegalSubcommand),
        };

        Ok(step)
    }

    fn accept_payload(&self, remaining: u32, bytes: &[u8]) -> Result<u32, AppendError> {
        u32::try_from(bytes.len())
            .ok()
            .and_then(|len| remaining.checked_sub(len))
            .ok_or(AppendError::ByteCountExceeded)
    }
}

fn payload_chunk(bytes: &[u8]) -> Chunk {
    Chunk {
        bytes: bytes.to_vec(),
        wait_for_continuation: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::command::AppendOptions;

    fn progress() -> AppendProgress {
        AppendProgress::new()
    }

    fn dump(step: &AppendStep) -> Vec<u8> {
        let mut out = Vec::new();
        for chunk in &step.chunks {
            out.extend_from_slice(&chunk.bytes);
        }
        out
    }

    #[test]
    fn test_message_flow() {
        let mut progress = progress();
        let options = EncodingOptions::default();

        let step = progress
            .encode(
                &AppendSubcommand::BeginMessage {
                    options: AppendOptions::default(),
                    byte_count: 5,
                },
                options,
            )
            .unwrap();
        assert_eq!(dump(&step), b" {5}\r\n");
        assert!(step.chunks[0].wait_for_continuation);

        let step = progress
            .encode(&AppendSubcommand::MessageBytes(b"hello".to_vec()), options)
            .unwrap();
        assert_eq!(dump(&step), b"hello");

        assert!(matches!(
            progress.encode(&AppendSubcommand::MessageBytes(b"x".to_vec()), options),
            Err(AppendError::ByteCountExceeded)
        ));

        progress
            .encode(&AppendSubcommand::EndMessage, options)
            .unwrap();

        let step = progress.encode(&AppendSubcommand::Finish, options).unwrap();
        assert!(step.finished);
        assert_eq!(dump(&step), b"\r\n");
    }

    #[test]
    fn test_catenate_flow_separates_elements() {
        let mut progress = progress();
        let options = EncodingOptions {
            use_non_synchronizing_literal_plus: true,
            ..Default::default()
        };

        let step = progress
            .encode(
                &AppendSubcommand::BeginCatenate {
                    options: AppendOptions::default(),
                },
                options,
            )
            .unwrap();
        assert_eq!(dump(&step), b" CATENATE (");

        let step = progress
            .encode(
                &AppendSubcommand::CatenateUrl(
                    crate::types::core::IString::try_from("/INBOX/;UID=20/;SECTION=1.5").unwrap(),
                ),
                options,
            )
            .unwrap();
        assert_eq!(dump(&step), b"URL \"/INBOX/;UID=20/;SECTION=1.5\"");

        let step = progress
            .encode(
                &AppendSubcommand::CatenateData(CatenatePart::Begin { byte_count: 3 }),
                options,
            )
            .unwrap();
        assert_eq!(dump(&step), b" TEXT {3+}\r\n");

        progress
            .encode(
                &AppendSubcommand::CatenateData(CatenatePart::Bytes(b"abc".to_vec())),
                options,
            )
            .unwrap();
        progress
            .encode(&AppendSubcommand::CatenateData(CatenatePart::End), options)
            .unwrap();

        let step = progress
            .encode(&AppendSubcommand::EndCatenate, options)
            .unwrap();
        assert_eq!(dump(&step), b")");

        let step = progress.encode(&AppendSubcommand::Finish, options).unwrap();
        assert!(step.finished);
    }

    #[test]
    fn test_illegal_orders_are_rejected() {
        let mut progress = progress();
        let options = EncodingOptions::default();

        assert!(matches!(
            progress.encode(&AppendSubcommand::Finish, options),
            Err(AppendError::IllegalSubcommand)
        ));
        assert!(matches!(
            progress.encode(&AppendSubcommand::EndMessage, options),
            Err(AppendError::IllegalSubcommand)
        ));
        assert!(matches!(
            progress.encode(&AppendSubcommand::MessageBytes(b"x".to_vec()), options),
            Err(AppendError::IllegalSubcommand)
        ));

        progress
            .encode(
                &AppendSubcommand::BeginMessage {
                    options: AppendOptions::default(),
                    byte_count: 2,
                },
                options,
            )
            .unwrap();
        assert!(matches!(
            progress.encode(&AppendSubcommand::EndMessage, options),
            Err(AppendError::ByteCountNotReached)
        ));
    }
}
