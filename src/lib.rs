//! # Client-side protocol engine for IMAP4rev1
//!
//! This crate implements the client half of the IMAP4rev1 dialog
//! ([RFC 3501](https://datatracker.ietf.org/doc/html/rfc3501)) plus the
//! extensions commonly met in the wild (IDLE, AUTHENTICATE, LITERAL+ /
//! LITERAL-, BINARY, APPEND / CATENATE, ENABLE, CONDSTORE / QRESYNC,
//! ESEARCH, MOVE, UIDPLUS, METADATA, QUOTA, ID, NAMESPACE, URLAUTH, and the
//! Gmail FETCH items). It is sans-I/O: the embedder owns the socket and
//! feeds bytes in and out.
//!
//! Three subsystems cooperate:
//!
//! * [`codec`] encodes a structured command into wire [`codec::Chunk`]s,
//!   splitting at every point where the server must grant a synchronizing
//!   literal before the client may continue.
//! * [`parse`] incrementally decodes inbound bytes into
//!   [`parse::ResponseEvent`]s, streaming FETCH bodies instead of buffering
//!   them.
//! * [`client`] drives the dialog: it pipelines commands, routes
//!   continuation requests, enforces the IDLE / AUTHENTICATE / APPEND mode
//!   transitions, and auto-tunes the encoding profile from capability
//!   advertisements.
//!
//! # Example
//!
//! ```rust
//! use imap_engine::{
//!     client::{ClientEngine, ClientEvent},
//!     types::command::{Command, CommandBody, CommandStreamPart},
//! };
//!
//! let mut engine = ClientEngine::default();
//!
//! let command = Command::new("a", CommandBody::login("alice", "password").unwrap()).unwrap();
//! let enqueued = engine.send_command(CommandStreamPart::Tagged(command)).unwrap();
//!
//! // Write the chunk, then feed the server's answer back in.
//! assert_eq!(enqueued.chunk.unwrap().bytes, b"a LOGIN \"alice\" \"password\"\r\n");
//!
//! engine.enqueue_bytes(b"a OK LOGIN completed\r\n");
//! match engine.next_event().unwrap() {
//!     Some(ClientEvent::Tagged(tagged)) => assert_eq!(tagged.tag.inner(), "a"),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

#![deny(missing_debug_implementations)]
#![forbid(unsafe_code)]

pub mod client;
pub mod codec;
pub mod framing;
pub mod parse;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;
pub mod utils;
