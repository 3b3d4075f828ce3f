//! End-to-end tests driving [`ClientEngine`] through recorded dialogs.
//!
//! Each step is either a client action (submit a part, expect bytes) or a
//! server line (inject bytes, expect events). The collected outgoing bytes
//! must equal the wire trace exactly, including literal suspensions.

use imap_engine::{
    client::{ClientEngine, ClientEvent, ContinuationAction, Enqueued},
    codec::{EncodingOptions, OptionsPolicy},
    types::{
        command::{
            AppendSubcommand, Command, CommandBody, CommandStreamPart,
        },
        core::{IString, Tag, Vec1},
        fetch::{FetchEvent, MacroOrMessageDataItemNames, MessageDataItemName, Section},
        flag::{Flag, FlagFetch},
        mailbox::Mailbox,
        response::{CompletionKind, ContinuationRequest, Response, UntaggedData},
        sequence::SequenceSet,
    },
};

fn tagged(tag: &str, body: CommandBody) -> CommandStreamPart {
    CommandStreamPart::Tagged(Command::new(tag, body).unwrap())
}

/// Submits a part and returns the bytes that may be sent immediately.
fn submit(engine: &mut ClientEngine, part: CommandStreamPart) -> (Enqueued, Vec<u8>) {
    let enqueued = engine.send_command(part).unwrap();
    let bytes = enqueued
        .chunk
        .as_ref()
        .map(|chunk| chunk.bytes.clone())
        .unwrap_or_default();
    (enqueued, bytes)
}

/// Injects server bytes and drains all resulting events, appending any
/// released chunks to `wire`.
fn inject(engine: &mut ClientEngine, bytes: &[u8], wire: &mut Vec<u8>) -> Vec<ClientEvent> {
    engine.enqueue_bytes(bytes);
    let mut events = Vec::new();

    while let Some(event) = engine.next_event().unwrap() {
        if let ClientEvent::SendChunks(chunks) = &event {
            for chunk in chunks {
                wire.extend_from_slice(&chunk.bytes);
            }
        }
        events.push(event);
    }

    events
}

fn tagged_ok(events: &[ClientEvent], tag: &str, text: &str) {
    match events {
        [ClientEvent::Tagged(tagged)] => {
            assert_eq!(tagged.tag, Tag::try_from(tag).unwrap());
            assert_eq!(tagged.kind, CompletionKind::Ok);
            assert_eq!(tagged.text.text.inner(), text);
        }
        other => panic!("expected tagged OK, got {other:?}"),
    }
}

// ----- spec scenarios -----

#[test]
fn scenario_trivial_login() {
    let mut engine = ClientEngine::default();
    let mut wire = Vec::new();

    let (_, bytes) = submit(
        &mut engine,
        tagged("a", CommandBody::login("foo", "bar").unwrap()),
    );
    assert_eq!(bytes, b"a LOGIN \"foo\" \"bar\"\r\n");

    let events = inject(&mut engine, b"a OK ok\r\n", &mut wire);
    tagged_ok(&events, "a", "ok");
}

#[test]
fn scenario_rename_with_two_synchronizing_literals() {
    let mut engine = ClientEngine::default();
    let mut wire = Vec::new();

    let (_, bytes) = submit(
        &mut engine,
        tagged(
            "x",
            CommandBody::Rename {
                from: Mailbox::Other(IString::try_from(b"\\".as_ref()).unwrap()),
                to: Mailbox::Other(IString::try_from(b"\"".as_ref()).unwrap()),
            },
        ),
    );
    assert_eq!(bytes, b"x RENAME {1}\r\n");
    wire.extend_from_slice(&bytes);

    inject(&mut engine, b"+ OK\r\n", &mut wire);
    assert_eq!(wire, b"x RENAME {1}\r\n\\ {1}\r\n");

    inject(&mut engine, b"+ OK\r\n", &mut wire);
    assert_eq!(wire, b"x RENAME {1}\r\n\\ {1}\r\n\"\r\n");

    let events = inject(&mut engine, b"x OK ok\r\n", &mut wire);
    tagged_ok(&events, "x", "ok");
}

#[test]
fn scenario_preloading_under_literal_wait() {
    let mut engine = ClientEngine::default();
    let mut wire = Vec::new();

    let (_, bytes) = submit(
        &mut engine,
        tagged(
            "1",
            CommandBody::Create {
                mailbox: Mailbox::Other(IString::try_from(b"\\".as_ref()).unwrap()),
            },
        ),
    );
    assert_eq!(bytes, b"1 CREATE {1}\r\n");

    let (_, bytes) = submit(&mut engine, tagged("2", CommandBody::Noop));
    assert!(bytes.is_empty());

    let events = inject(&mut engine, b"+ OK\r\n", &mut wire);
    match &events[..] {
        [ClientEvent::SendChunks(chunks)] => {
            assert_eq!(chunks.len(), 2);
            assert_eq!(chunks[0].bytes, b"\\\r\n");
            assert_eq!(chunks[1].bytes, b"2 NOOP\r\n");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn scenario_idle_lifecycle() {
    let mut engine = ClientEngine::default();
    let mut wire = Vec::new();

    let (_, bytes) = submit(&mut engine, tagged("A2", CommandBody::Idle));
    assert_eq!(bytes, b"A2 IDLE\r\n");

    let events = inject(&mut engine, b"+ idling\r\n", &mut wire);
    assert_eq!(events, vec![ClientEvent::IdleStarted]);

    let (_, bytes) = submit(&mut engine, CommandStreamPart::IdleDone);
    assert_eq!(bytes, b"DONE\r\n");

    let events = inject(&mut engine, b"A2 OK done\r\n", &mut wire);
    tagged_ok(&events, "A2", "done");

    // The engine accepts ordinary commands again.
    assert!(engine.send_command(tagged("A3", CommandBody::Noop)).is_ok());
}

#[test]
fn scenario_authenticate_base64_round_trip() {
    let mut engine = ClientEngine::default();
    let mut wire = Vec::new();

    let (_, bytes) = submit(
        &mut engine,
        tagged(
            "A1",
            CommandBody::Authenticate {
                mechanism: imap_engine::types::auth::AuthMechanism::Gssapi,
                initial_response: None,
            },
        ),
    );
    assert_eq!(bytes, b"A1 AUTHENTICATE GSSAPI\r\n");

    let events = inject(&mut engine, b"+ Y2hhbGxlbmdlMQ==\r\n", &mut wire);
    assert_eq!(
        events,
        vec![ClientEvent::AuthenticationChallenge(b"challenge1".to_vec())]
    );

    let (_, bytes) = submit(
        &mut engine,
        CommandStreamPart::ContinuationResponse(b"response1".to_vec()),
    );
    assert_eq!(bytes, b"cmVzcG9uc2Ux\r\n");

    let events = inject(&mut engine, b"+ \r\n", &mut wire);
    assert_eq!(events, vec![ClientEvent::AuthenticationChallenge(Vec::new())]);

    let (_, bytes) = submit(
        &mut engine,
        CommandStreamPart::ContinuationResponse(b"response3".to_vec()),
    );
    assert_eq!(bytes, b"cmVzcG9uc2Uz\r\n");

    let events = inject(&mut engine, b"A1 OK Success\r\n", &mut wire);
    tagged_ok(&events, "A1", "Success");
}

#[test]
fn scenario_fetch_streaming() {
    let mut engine = ClientEngine::default();
    let mut wire = Vec::new();

    submit(
        &mut engine,
        tagged(
            "2",
            CommandBody::Fetch {
                sequence_set: SequenceSet::try_from("2").unwrap(),
                macro_or_item_names: MacroOrMessageDataItemNames::MessageDataItemNames(vec![
                    MessageDataItemName::Flags,
                    MessageDataItemName::BodyExt {
                        section: Some(Section::Text(None)),
                        partial: None,
                        peek: false,
                    },
                ]),
                modifiers: Vec::new(),
                uid: false,
            },
        ),
    );

    let events = inject(
        &mut engine,
        b"* 2 FETCH (FLAGS (\\Deleted) BODY[TEXT] {1}\r\nX)\r\n2 OK Fetch completed.\r\n",
        &mut wire,
    );

    let fetch_events: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            ClientEvent::Fetch(fetch) => Some(fetch.clone()),
            _ => None,
        })
        .collect();

    assert_eq!(fetch_events.len(), 6);
    assert_eq!(fetch_events[0], FetchEvent::Start(2.try_into().unwrap()));
    assert_eq!(
        fetch_events[1],
        FetchEvent::Attribute(imap_engine::types::fetch::FetchAttribute::Flags(vec![
            FlagFetch::Flag(Flag::Deleted)
        ]))
    );
    assert!(matches!(
        &fetch_events[2],
        FetchEvent::StreamingBegin { length: 1, .. }
    ));
    assert_eq!(fetch_events[3], FetchEvent::StreamingBytes(b"X".to_vec()));
    assert_eq!(fetch_events[4], FetchEvent::StreamingEnd);
    assert_eq!(fetch_events[5], FetchEvent::Finish);

    match events.last() {
        Some(ClientEvent::Tagged(tagged)) => {
            assert_eq!(tagged.text.text.inner(), "Fetch completed.");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

// ----- ordering and pipelining properties -----

#[test]
fn pipelined_simple_commands_preserve_submission_order() {
    let mut engine = ClientEngine::default();
    let mut wire = Vec::new();

    for (tag, body) in [
        ("a1", CommandBody::Capability),
        ("a2", CommandBody::Noop),
        ("a3", CommandBody::Check),
    ] {
        let (_, bytes) = submit(&mut engine, tagged(tag, body));
        wire.extend_from_slice(&bytes);
    }

    assert_eq!(wire, b"a1 CAPABILITY\r\na2 NOOP\r\na3 CHECK\r\n");

    // Tagged completions may arrive out of order; matching is by tag.
    let events = inject(&mut engine, b"a2 OK 2\r\n", &mut Vec::new());
    tagged_ok(&events, "a2", "2");
    let events = inject(&mut engine, b"a3 OK 3\r\n", &mut Vec::new());
    tagged_ok(&events, "a3", "3");
    let events = inject(&mut engine, b"a1 OK 1\r\n", &mut Vec::new());
    tagged_ok(&events, "a1", "1");

    assert_eq!(engine.outstanding_tags().count(), 0);
}

#[test]
fn untagged_responses_pass_through_during_literal_wait() {
    let mut engine = ClientEngine::default();
    let mut wire = Vec::new();

    submit(
        &mut engine,
        tagged(
            "x",
            CommandBody::Create {
                mailbox: Mailbox::Other(IString::try_from(b"\\".as_ref()).unwrap()),
            },
        ),
    );

    let events = inject(&mut engine, b"* 7 EXISTS\r\n", &mut wire);
    assert_eq!(events, vec![ClientEvent::Untagged(UntaggedData::Exists(7))]);
    assert!(wire.is_empty());

    let events = inject(&mut engine, b"+ OK\r\n", &mut wire);
    assert!(matches!(&events[..], [ClientEvent::SendChunks(_)]));
    assert_eq!(wire, b"\\\r\n");
}

// ----- streamed append over the wire -----

#[test]
fn streamed_multiappend_session() {
    let mut engine = ClientEngine::default();
    let mut wire = Vec::new();

    let (_, bytes) = submit(
        &mut engine,
        CommandStreamPart::Append(AppendSubcommand::Start {
            tag: Tag::try_from("A003").unwrap(),
            mailbox: Mailbox::try_from("saved-messages").unwrap(),
        }),
    );
    wire.extend_from_slice(&bytes);

    let (_, bytes) = submit(
        &mut engine,
        CommandStreamPart::Append(AppendSubcommand::BeginMessage {
            options: imap_engine::types::command::AppendOptions {
                flags: vec![Flag::Seen],
                date: None,
                binary: false,
            },
            byte_count: 11,
        }),
    );
    wire.extend_from_slice(&bytes);
    assert_eq!(wire, b"A003 APPEND \"saved-messages\" (\\Seen) {11}\r\n");

    // Preload payload and the rest of the command behind the literal wait.
    submit(
        &mut engine,
        CommandStreamPart::Append(AppendSubcommand::MessageBytes(b"Subject: hi".to_vec())),
    );
    submit(
        &mut engine,
        CommandStreamPart::Append(AppendSubcommand::EndMessage),
    );
    submit(
        &mut engine,
        CommandStreamPart::Append(AppendSubcommand::Finish),
    );

    inject(&mut engine, b"+ Ready for literal data\r\n", &mut wire);
    assert_eq!(
        wire,
        b"A003 APPEND \"saved-messages\" (\\Seen) {11}\r\nSubject: hi\r\n".as_slice()
    );

    let events = inject(&mut engine, b"A003 OK APPEND completed\r\n", &mut wire);
    tagged_ok(&events, "A003", "APPEND completed");

    assert!(engine.send_command(tagged("A004", CommandBody::Noop)).is_ok());
}

// ----- a longer session transcript -----

#[test]
fn session_transcript() {
    let mut engine = ClientEngine::default();
    let mut wire = Vec::new();

    // Greeting advertises LITERAL+; the autotuner picks it up.
    let events = inject(
        &mut engine,
        b"* OK [CAPABILITY IMAP4rev1 IDLE LITERAL+ UIDPLUS MOVE] ready\r\n",
        &mut wire,
    );
    assert!(matches!(&events[..], [ClientEvent::Untagged(_)]));
    assert!(engine.encoding_options().use_non_synchronizing_literal_plus);

    // Login with a password that needs a literal; LITERAL+ avoids the
    // round-trip.
    let (_, bytes) = submit(
        &mut engine,
        tagged("a1", CommandBody::login("alice", "p\\ss").unwrap()),
    );
    assert_eq!(bytes, b"a1 LOGIN \"alice\" {4+}\r\np\\ss\r\n");
    let events = inject(&mut engine, b"a1 OK [CAPABILITY IMAP4rev1 IDLE] logged in\r\n", &mut wire);
    tagged_ok(&events, "a1", "logged in");

    // Select INBOX.
    submit(&mut engine, tagged("a2", CommandBody::select(Mailbox::Inbox)));
    let events = inject(
        &mut engine,
        b"* 18 EXISTS\r\n* FLAGS (\\Answered \\Seen)\r\n* 2 RECENT\r\n* OK [UIDVALIDITY 3857529045] UIDs valid\r\na2 OK [READ-WRITE] SELECT completed\r\n",
        &mut wire,
    );
    assert_eq!(events.len(), 5);
    assert_eq!(events[0], ClientEvent::Untagged(UntaggedData::Exists(18)));

    // Search, then fetch one message with a streamed body.
    submit(
        &mut engine,
        tagged(
            "a3",
            CommandBody::search(Vec1::from(imap_engine::types::search::SearchKey::Unseen), false),
        ),
    );
    let events = inject(&mut engine, b"* SEARCH 12\r\na3 OK done\r\n", &mut wire);
    assert_eq!(
        events[0],
        ClientEvent::Untagged(UntaggedData::Search {
            seqs: vec![12.try_into().unwrap()],
            mod_seq: None,
        })
    );

    submit(
        &mut engine,
        tagged(
            "a4",
            CommandBody::fetch(
                "12",
                vec![
                    MessageDataItemName::Uid,
                    MessageDataItemName::Rfc822Size,
                    MessageDataItemName::BodyExt {
                        section: None,
                        partial: None,
                        peek: true,
                    },
                ],
                false,
            )
            .unwrap(),
        ),
    );

    let body = b"Subject: lunch?\r\n\r\nnoon?";
    let mut fetch = format!("* 12 FETCH (UID 443 RFC822.SIZE {} BODY[] {{{}}}\r\n", body.len(), body.len()).into_bytes();
    fetch.extend_from_slice(body);
    fetch.extend_from_slice(b")\r\na4 OK FETCH done\r\n");

    let events = inject(&mut engine, &fetch, &mut wire);
    let streamed: Vec<u8> = events
        .iter()
        .filter_map(|event| match event {
            ClientEvent::Fetch(FetchEvent::StreamingBytes(bytes)) => Some(bytes.clone()),
            _ => None,
        })
        .flatten()
        .collect();
    assert_eq!(streamed, body);

    // Move it away, using the UID from the fetch.
    submit(
        &mut engine,
        tagged(
            "a5",
            CommandBody::Move {
                sequence_set: SequenceSet::try_from("443").unwrap(),
                mailbox: Mailbox::try_from("Archive").unwrap(),
                uid: true,
            },
        ),
    );
    let events = inject(
        &mut engine,
        b"* OK [COPYUID 38505 443 1202] moved\r\n* 12 EXPUNGE\r\na5 OK Done\r\n",
        &mut wire,
    );
    assert_eq!(events.len(), 3);

    // Wind down.
    submit(&mut engine, tagged("a6", CommandBody::Logout));
    let events = inject(
        &mut engine,
        b"* BYE logging out\r\na6 OK bye\r\n",
        &mut wire,
    );
    assert!(matches!(events[0], ClientEvent::Fatal(_)));
    tagged_ok(&events[1..], "a6", "bye");
}

// ----- failure semantics -----

#[test]
fn double_continuation_in_idle_is_an_error() {
    let mut engine = ClientEngine::default();
    let mut wire = Vec::new();

    submit(&mut engine, tagged("A2", CommandBody::Idle));
    inject(&mut engine, b"+ idling\r\n", &mut wire);

    engine.enqueue_bytes(b"+ again?\r\n");
    assert!(engine.next_event().is_err());
}

#[test]
fn receive_continuation_routes_by_mode() {
    let mut engine = ClientEngine::default();

    submit(&mut engine, tagged("A2", CommandBody::Idle));
    let action = engine
        .receive_continuation(ContinuationRequest::Base64(Vec::new()))
        .unwrap();
    assert_eq!(action, ContinuationAction::IdleStarted);
}

#[test]
fn parse_errors_preserve_the_offending_bytes() {
    let mut engine = ClientEngine::default();

    engine.enqueue_bytes(b"!!! gibberish\r\n");
    assert!(engine.next_event().is_err());

    // The engine is unusable afterwards.
    assert!(engine.send_command(tagged("a", CommandBody::Noop)).is_err());
}

#[test]
fn receive_response_accepts_pre_parsed_values() {
    let mut engine = ClientEngine::new(OptionsPolicy::Fixed(EncodingOptions::default()));

    submit(&mut engine, tagged("a", CommandBody::Noop));

    let response = Response::Untagged(UntaggedData::Recent(3));
    match engine.receive_response(response).unwrap() {
        ClientEvent::Untagged(UntaggedData::Recent(3)) => {}
        other => panic!("unexpected: {other:?}"),
    }
}
