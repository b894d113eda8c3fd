//! # Dispatch Tests
//!
//! Capability resolution, address rewriting on the way up, status checks,
//! and the PIB, FSI, and memory entry points.

use powerdbg_core::chip::{ChipUnit, Generation};
use powerdbg_core::common::constants::NET_CTRL0;
use powerdbg_core::common::ppc_bit;
use powerdbg_core::drivers::ChipUnitDriver;
use powerdbg_core::target::{Capability, PropertyStore, Status, Target, TargetDriver};
use powerdbg_core::{Config, Error, Topology};
use pretty_assertions::assert_eq;

use crate::common::harness::{FourCoreSystem, add, add_with_props};
use crate::common::mocks::{BridgeFsi, FakePib};

fn p9_core() -> Option<Box<dyn TargetDriver>> {
    let translate = ChipUnit::Core.translator(Generation::P9Nimbus).unwrap();
    Some(Box::new(ChipUnitDriver::new(ChipUnit::Core, Generation::P9Nimbus, translate)))
}

#[test]
fn test_resolve_finds_nearest_provider() {
    let mut sys = FourCoreSystem::new();
    let thread = sys.threads[1][0];
    let _ = sys.topo.probe(thread).unwrap();
    let (pib, addr) = sys.topo.resolve(thread, Capability::Pib, 0x1234).unwrap();
    assert_eq!(pib, sys.pib);
    assert_eq!(addr, 0x1234);
}

#[test]
fn test_no_provider_reports_capability() {
    let sys = FourCoreSystem::new();
    let err = sys.topo.resolve(sys.cores[0], Capability::Fsi, 0).unwrap_err();
    assert!(matches!(err, Error::NoCapability { capability: "fsi", .. }));
}

#[test]
fn test_unprobed_provider_is_not_enabled() {
    let mut sys = FourCoreSystem::new();
    let err = sys.topo.pib_read(sys.cores[0], 0x10).unwrap_err();
    assert!(matches!(err, Error::NotEnabled { status: Status::Unknown, .. }));
    assert!(sys.scom.borrow().reads.is_empty());
}

#[test]
fn test_translation_applies_per_unit() {
    let mut topo = Topology::new(Config::default());
    let root = topo.backend_root();
    let (pib, scom) = FakePib::new();
    let pib = add(&mut topo, root, "pib@0", "pib", None, Some(Box::new(pib)));
    let core = add(&mut topo, pib, "core@25000000", "core", Some(5), p9_core());
    let thread = add(&mut topo, core, "thread@0", "thread", Some(0), None);
    let _ = scom.borrow_mut().regs.insert(0x2500_0000 | NET_CTRL0, ppc_bit(0));
    let _ = scom.borrow_mut().regs.insert(0x2501_0A9C, 0xAB);

    topo.probe_all(root).unwrap();
    assert_eq!(topo.status(thread), Status::Enabled);
    assert_eq!(topo.pib_read(thread, 0x0001_0A9C).unwrap(), 0xAB);

    topo.pib_write(core, 0x0001_0A9C, 0xCD).unwrap();
    assert_eq!(scom.borrow().writes.last(), Some(&(0x2501_0A9C, 0xCD)));
}

#[test]
fn test_base_offsets_accumulate_for_units_without_translation() {
    let mut topo = Topology::new(Config::default());
    let root = topo.backend_root();
    let (fsi, bridge) = BridgeFsi::new(0x1000);
    let cells = PropertyStore::new()
        .with("#address-cells", 1u32.to_be_bytes())
        .with("#size-cells", 1u32.to_be_bytes());
    let fsi = add_with_props(&mut topo, root, "fsi@0", "fsi", cells, Some(Box::new(fsi)));
    let reg: Vec<u8> = [0x1000u32, 0x400].iter().flat_map(|c| c.to_be_bytes()).collect();
    let engine = add_with_props(&mut topo, fsi, "engine@1000", "engine", PropertyStore::new().with("reg", reg), None);
    topo.probe_all(root).unwrap();

    bridge.borrow_mut().data[1] = 0x55;
    assert_eq!(topo.fsi_read(engine, 0x04).unwrap(), 0x55);
    topo.fsi_write(engine, 0x00, 0x77).unwrap();
    assert_eq!(bridge.borrow().writes.last(), Some(&(0x1000, 0x77)));
}

#[test]
fn test_write_mask_preserves_other_bits() {
    let mut sys = FourCoreSystem::new();
    let _ = sys.topo.probe(sys.cores[0]).unwrap();
    let _ = sys.scom.borrow_mut().regs.insert(0x100, 0xFF00_FF00);
    sys.topo.pib_write_mask(sys.cores[0], 0x100, 0x0000_00FF, 0x0000_0F0F).unwrap();
    assert_eq!(sys.scom.borrow().regs[&0x100], 0xFF00_F00F);
}

#[test]
fn test_wait_polls_until_match() {
    let mut sys = FourCoreSystem::new();
    let _ = sys.topo.probe(sys.cores[0]).unwrap();
    sys.scom.borrow_mut().queue(0x200, [0, 0, 0x8000]);
    let value = sys.topo.pib_wait(sys.cores[0], 0x200, 0x8000, 0x8000).unwrap();
    assert_eq!(value, 0x8000);
    assert_eq!(sys.scom.borrow().reads.len(), 3);
}

#[test]
fn test_wait_gives_up_after_configured_polls() {
    let mut sys = FourCoreSystem::new();
    let _ = sys.topo.probe(sys.cores[0]).unwrap();
    let err = sys.topo.pib_wait(sys.cores[0], 0x200, 1, 1).unwrap_err();
    assert!(matches!(err, Error::RetryExhausted { attempts: 100, .. }));
}

#[test]
fn test_provider_errors_propagate_unchanged() {
    let mut sys = FourCoreSystem::new();
    let _ = sys.topo.probe(sys.cores[0]).unwrap();
    let _ = sys.scom.borrow_mut().fail_reads.insert(0x300);
    assert!(matches!(sys.topo.pib_read(sys.cores[0], 0x300), Err(Error::Transport(_))));
}

#[test]
fn test_nested_driver_use_is_busy() {
    let mut sys = FourCoreSystem::new();
    let pib = sys.pib;
    let inner = sys
        .topo
        .with_driver(pib, |_, topo| topo.with_driver(pib, |_, _| ()).map(|_| ()))
        .unwrap()
        .unwrap();
    assert!(matches!(inner, Err(Error::TargetBusy(_))));
    assert!(sys.topo.has_driver(pib));
}

#[test]
fn test_sweep_skips_members_that_are_not_enabled() {
    let mut topo = Topology::new(Config::default());
    let root = topo.backend_root();
    let (pib, _) = FakePib::new();
    let pib = add(&mut topo, root, "pib@0", "pib", None, Some(Box::new(pib)));
    let live = add(&mut topo, pib, "core@0", "core", Some(0), None);
    let off = topo
        .attach(pib, Target::new("core@1", "core").unwrap().with_index(1).with_status(Status::Disabled), None)
        .unwrap();
    let _ = topo.probe(live).unwrap();

    let results = topo.sweep("core", None, |topo, id| topo.pib_read(id, 0x10));
    assert_eq!(results.len(), 2);
    assert!(matches!(results[0], (id, Ok(0)) if id == live));
    assert!(matches!(&results[1], (id, Err(Error::NotEnabled { status: Status::Disabled, .. })) if *id == off));
}

#[test]
fn test_memory_without_provider() {
    let mut sys = FourCoreSystem::new();
    let _ = sys.topo.probe(sys.cores[0]).unwrap();
    let mut buf = [0u8; 8];
    assert!(matches!(
        sys.topo.mem_read(sys.cores[0], 0, &mut buf),
        Err(Error::NoCapability { capability: "mem", .. })
    ));
}
