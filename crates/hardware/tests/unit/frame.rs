//! # Framing Tests
//!
//! Request encoding and trailer-located reply parsing, including malformed
//! replies that must be rejected without guessing.

use powerdbg_core::ProtocolError;
use powerdbg_core::sbefifo::{Command, Request, SbeStatus, build_reply, parse_reply};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::common::harness::words;

#[test]
fn test_scom_get_request_words() {
    let bytes = Request::new(Command::GetScom).u64(0x0000_0000_2001_0A9C).encode().unwrap();
    assert_eq!(words(&bytes), [4, 0xA201, 0x0000_0000, 0x2001_0A9C]);
}

#[test]
fn test_request_without_payload_is_two_words() {
    let bytes = Request::new(Command::GetCapabilities).encode().unwrap();
    assert_eq!(words(&bytes), [2, 0xA802]);
}

#[test]
fn test_request_parse_recovers_command_and_payload() {
    let request = Request::new(Command::PutScom).u64(0x10).u64(0xFFFF_0000_1234_5678);
    let parsed = Request::parse(&request.encode().unwrap()).unwrap();
    assert_eq!(parsed, request);
}

#[test]
fn test_request_parse_rejects_bad_count() {
    let mut bytes = Request::new(Command::GetScom).u64(0).encode().unwrap();
    bytes[3] = 7;
    assert!(matches!(Request::parse(&bytes), Err(ProtocolError::Request(_))));
    assert!(matches!(Request::parse(&[0, 0, 0, 1]), Err(ProtocolError::Request(_))));
}

#[test]
fn test_request_parse_rejects_unknown_command() {
    let bytes: Vec<u8> = [2u32, 0xA2FF].iter().flat_map(|w| w.to_be_bytes()).collect();
    assert!(matches!(Request::parse(&bytes), Err(ProtocolError::Request("unknown command"))));
}

#[test]
fn test_reply_payload_status_and_ffdc_are_split() {
    let ffdc = [0xFF, 0xDC, 0x00, 0x02, 1, 2, 3, 4];
    let raw = build_reply(0xA201, &[0xAA; 8], SbeStatus::new(0x02, 0x03), &ffdc);
    let reply = parse_reply(&raw, 0xA201).unwrap();
    assert_eq!(reply.payload, [0xAA; 8]);
    assert_eq!(reply.status.primary(), 0x02);
    assert_eq!(reply.status.secondary(), 0x03);
    assert_eq!(reply.ffdc, ffdc);
}

#[test]
fn test_reply_shorter_than_trailer() {
    assert_eq!(parse_reply(&[0; 8], 0xA201), Err(ProtocolError::Short { len: 8 }));
    assert_eq!(parse_reply(&[], 0xA201), Err(ProtocolError::Short { len: 0 }));
}

#[test]
fn test_reply_not_word_aligned() {
    assert_eq!(parse_reply(&[0; 13], 0xA201), Err(ProtocolError::Unaligned { len: 13 }));
}

#[test]
fn test_trailer_offset_out_of_range() {
    let mut raw = build_reply(0xA201, &[], SbeStatus::SUCCESS, &[]);
    let n = raw.len();
    raw[n - 4..].copy_from_slice(&9u32.to_be_bytes());
    assert_eq!(parse_reply(&raw, 0xA201), Err(ProtocolError::BadTrailer { offset: 9, words: 3 }));

    raw[n - 4..].copy_from_slice(&2u32.to_be_bytes());
    assert_eq!(parse_reply(&raw, 0xA201), Err(ProtocolError::BadTrailer { offset: 2, words: 3 }));
}

#[test]
fn test_header_must_echo_command() {
    let raw = build_reply(0xA202, &[], SbeStatus::SUCCESS, &[]);
    assert_eq!(
        parse_reply(&raw, 0xA201),
        Err(ProtocolError::HeaderMismatch {
            expected: 0xC0DE_A201,
            found: 0xC0DE_A202,
        })
    );
}

#[test]
fn test_header_word_on_the_wire() {
    let raw = build_reply(0xA801, &[], SbeStatus::SUCCESS, &[]);
    assert_eq!(words(&raw), [0xC0DE_A801, 0, 3]);
}

fn payload_words() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<[u8; 4]>(), 0..32).prop_map(|w| w.concat())
}

proptest! {
    #[test]
    fn test_reply_parse_recovers_parts(
        payload in payload_words(),
        ffdc in payload_words(),
        status in any::<u32>(),
        command in prop::sample::select(Command::ALL.to_vec()),
    ) {
        let raw = build_reply(command.code(), &payload, SbeStatus(status), &ffdc);
        let reply = parse_reply(&raw, command.code()).unwrap();
        prop_assert_eq!(reply.payload, payload);
        prop_assert_eq!(reply.status, SbeStatus(status));
        prop_assert_eq!(reply.ffdc, ffdc);
    }

    #[test]
    fn test_arbitrary_bytes_never_panic(raw in prop::collection::vec(any::<u8>(), 0..64)) {
        let _ = parse_reply(&raw, 0xA201);
        let _ = Request::parse(&raw);
    }
}
