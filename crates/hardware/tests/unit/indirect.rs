//! # Indirect SCOM Tests
//!
//! Addresses with bit 0 set go through a write of the indirect register
//! address followed by polling the direct address for completion.

use powerdbg_core::Error;
use pretty_assertions::assert_eq;

use crate::common::harness::FourCoreSystem;

const INDIRECT: u64 = 0x8000_0C01_0901_143F;
const DIRECT: u64 = 0x0901_143F;
const DONE: u64 = 0x8000_0000;

fn probed() -> FourCoreSystem {
    let mut sys = FourCoreSystem::new();
    let _ = sys.topo.probe(sys.cores[0]).unwrap();
    sys
}

#[test]
fn test_indirect_read_requests_then_polls() {
    let mut sys = probed();
    sys.scom.borrow_mut().queue(DIRECT, [0, DONE | 0x1234]);

    let value = sys.topo.pib_read(sys.cores[0], INDIRECT).unwrap();
    assert_eq!(value, 0x1234);

    let scom = sys.scom.borrow();
    assert_eq!(scom.writes, [(DIRECT, 0x8000_0C01_0000_0000)]);
    assert_eq!(scom.reads, [DIRECT, DIRECT]);
}

#[test]
fn test_indirect_write_carries_low_sixteen_bits() {
    let mut sys = probed();
    sys.scom.borrow_mut().queue(DIRECT, [DONE]);

    sys.topo.pib_write(sys.cores[0], INDIRECT, 0xDEAD_BEEF).unwrap();
    assert_eq!(sys.scom.borrow().writes, [(DIRECT, 0x0000_0C01_0000_BEEF)]);
}

#[test]
fn test_indirect_error_bits_fail_the_access() {
    let mut sys = probed();
    sys.scom.borrow_mut().queue(DIRECT, [DONE | 0x2000_0000]);

    let err = sys.topo.pib_read(sys.cores[0], INDIRECT).unwrap_err();
    assert!(matches!(err, Error::IndirectScom { addr: INDIRECT, status } if status == DONE | 0x2000_0000));
}

#[test]
fn test_indirect_poll_is_bounded() {
    let mut sys = probed();
    let err = sys.topo.pib_read(sys.cores[0], INDIRECT).unwrap_err();
    assert!(matches!(err, Error::RetryExhausted { attempts: 10, .. }));
    assert_eq!(sys.scom.borrow().reads.len(), 10);
}

#[test]
fn test_form_one_is_rejected_without_bus_traffic() {
    let mut sys = probed();
    let err = sys.topo.pib_read(sys.cores[0], INDIRECT | 0x1000_0000_0000_0000).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(sys.scom.borrow().writes.is_empty());
}
