//! # Session Tests
//!
//! FFDC retention, the scoped long-operation timeout, reply sizing, and
//! status decoding.

use std::cell::Cell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use mockall::Sequence;
use mockall::predicate::eq;
use powerdbg_core::config::SbefifoConfig;
use powerdbg_core::sbefifo::{CallbackTransport, Command, SbeStatus, Session, build_reply};
use powerdbg_core::{Error, ProtocolError};
use pretty_assertions::assert_eq;

use crate::common::harness::{ok_reply, scripted_session};
use crate::common::mocks::MockTransport;

const GET_SCOM: u32 = 0xA201;

fn failed_scom(ffdc: &[u8]) -> Vec<u8> {
    build_reply(GET_SCOM, &[], SbeStatus(0x0001_0000), ffdc)
}

#[test]
fn test_failure_reports_status_and_ffdc_length() {
    let ffdc = [0xFF, 0xDC, 0x00, 0x03, 0, 0, 0, 1, 0, 0, 0, 2];
    let (mut session, _) = scripted_session(vec![failed_scom(&ffdc)]);

    let err = session.scom_get(0x10).unwrap_err();
    let Error::Sbe { command, status, ffdc_len } = err else {
        panic!("expected an SBE status error");
    };
    assert_eq!(command, GET_SCOM);
    assert_eq!(status.primary(), 1);
    assert_eq!(status.secondary(), 0);
    assert_eq!(ffdc_len, 12);

    let kept = session.ffdc().unwrap();
    assert_eq!(kept.status, SbeStatus(0x0001_0000));
    assert_eq!(kept.data, ffdc);
    assert_eq!(kept.packages().count(), 1);
}

#[test]
fn test_next_operation_clears_ffdc() {
    let mut value = Vec::new();
    value.extend_from_slice(&0x1234_5678_9ABC_DEF0u64.to_be_bytes());
    let (mut session, _) = scripted_session(vec![failed_scom(&[0; 8]), ok_reply(GET_SCOM, &value)]);

    assert!(session.scom_get(0x10).is_err());
    assert!(session.ffdc().is_some());
    assert_eq!(session.scom_get(0x10).unwrap(), 0x1234_5678_9ABC_DEF0);
    assert!(session.ffdc().is_none());
}

#[test]
fn test_take_ffdc_empties_the_session() {
    let (mut session, _) = scripted_session(vec![failed_scom(&[0; 4])]);
    assert!(session.scom_get(0).is_err());
    assert_eq!(session.take_ffdc().unwrap().len(), 4);
    assert!(session.ffdc().is_none());
}

#[test]
fn test_failure_without_ffdc() {
    let (mut session, _) = scripted_session(vec![failed_scom(&[])]);
    assert!(matches!(session.scom_get(0), Err(Error::Sbe { ffdc_len: 0, .. })));
    assert!(session.ffdc().unwrap().is_empty());
}

#[test]
fn test_protocol_error_keeps_no_ffdc() {
    let (mut session, _) = scripted_session(vec![vec![0; 8]]);
    assert!(matches!(
        session.scom_get(0),
        Err(Error::Protocol(ProtocolError::Short { len: 8 }))
    ));
    assert!(session.ffdc().is_none());
}

#[test]
fn test_payload_of_wrong_length_is_rejected() {
    let (mut session, _) = scripted_session(vec![ok_reply(GET_SCOM, &[0; 4])]);
    assert!(matches!(
        session.scom_get(0),
        Err(Error::Protocol(ProtocolError::Length { expected: 8, found: 4 }))
    ));
}

#[test]
fn test_transport_error_propagates() {
    let (mut session, _) = scripted_session(Vec::new());
    assert!(matches!(session.quiesce(), Err(Error::Transport(e)) if e.kind() == io::ErrorKind::UnexpectedEof));
}

#[test]
fn test_long_operation_installs_and_restores_timeout() {
    let mut transport = MockTransport::new();
    let mut seq = Sequence::new();
    let _ = transport
        .expect_read_timeout()
        .times(1)
        .in_sequence(&mut seq)
        .return_const(None);
    let _ = transport
        .expect_set_read_timeout()
        .with(eq(Some(Duration::from_secs(30))))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    let reply = ok_reply(Command::EnterMpipl.code(), &[]);
    let _ = transport
        .expect_exchange()
        .times(1)
        .in_sequence(&mut seq)
        .returning(move |_, _| Ok(reply.clone()));
    let _ = transport
        .expect_set_read_timeout()
        .with(eq(None))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));

    let mut session = Session::with_transport(Box::new(transport), &SbefifoConfig::default());
    session.mpipl_enter().unwrap();
}

#[test]
fn test_timeout_is_restored_when_exchange_fails() {
    let mut transport = MockTransport::new();
    let mut seq = Sequence::new();
    let previous = Some(Duration::from_millis(500));
    let _ = transport.expect_read_timeout().return_const(previous);
    let _ = transport
        .expect_set_read_timeout()
        .with(eq(Some(Duration::from_secs(30))))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    let _ = transport
        .expect_exchange()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Err(Error::Timeout { millis: 30_000 }));
    let _ = transport
        .expect_set_read_timeout()
        .with(eq(previous))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));

    let mut session = Session::with_transport(Box::new(transport), &SbefifoConfig::default());
    assert!(matches!(session.mpipl_continue(), Err(Error::Timeout { millis: 30_000 })));
}

#[test]
fn test_short_operation_leaves_timeout_alone() {
    let mut transport = MockTransport::new();
    let _ = transport.expect_set_read_timeout().never();
    let _ = transport
        .expect_exchange()
        .times(1)
        .returning(|_, _| Ok(ok_reply(Command::Quiesce.code(), &[])));

    let mut session = Session::with_transport(Box::new(transport), &SbefifoConfig::default());
    session.quiesce().unwrap();
}

#[test]
fn test_reply_capacity_covers_payload_and_ffdc() {
    let seen = Rc::new(Cell::new(0));
    let log = Rc::clone(&seen);
    let transport = CallbackTransport::new(move |_: &[u8], capacity: usize| {
        log.set(capacity);
        Ok(ok_reply(GET_SCOM, &[0; 8]))
    });
    let config = SbefifoConfig {
        max_ffdc_bytes: 0x100,
        ..SbefifoConfig::default()
    };
    let mut session = Session::with_transport(Box::new(transport), &config);
    let _ = session.scom_get(0).unwrap();
    assert_eq!(seen.get(), 8 + 12 + 0x100);
}

#[test]
fn test_oversized_reply_is_refused_before_sending() {
    let sent = Rc::new(Cell::new(false));
    let log = Rc::clone(&sent);
    let transport = CallbackTransport::new(move |_: &[u8], _: usize| {
        log.set(true);
        Ok(Vec::new())
    });
    let config = SbefifoConfig {
        max_reply_bytes: 64,
        ..SbefifoConfig::default()
    };
    let mut session = Session::with_transport(Box::new(transport), &config);

    assert!(matches!(session.ring_get(0x1000, 1024, 0), Err(Error::InvalidArgument(_))));
    assert!(!sent.get());
}

#[test]
fn test_status_names() {
    assert_eq!(
        SbeStatus::new(0xFE, 0x10).to_string(),
        "primary 0xfe (generic execution failure), secondary 0x10 (SBE busy)"
    );
    assert_eq!(SbeStatus(0x0042_0042).to_string(), "primary 0x42, secondary 0x42");
}
