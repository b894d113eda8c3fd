//! # Builder Tests
//!
//! Topologies built from JSON descriptions with the built-in registry plus a
//! fake PIB provider.

use std::rc::Rc;

use powerdbg_core::common::constants::NET_CTRL0;
use powerdbg_core::common::ppc_bit;
use powerdbg_core::target::Status;
use powerdbg_core::{Config, DriverRegistry, Error, TopologyConfig, Topology};

use crate::common::harness::init_tracing;
use crate::common::mocks::{FakePib, SharedScom};

const DESC: &str = r#"{
    "backend": {
        "children": [{
            "name": "pib@0",
            "compatible": "test,fake-pib",
            "index": 0,
            "children": [
                {
                    "name": "core@20000000",
                    "compatible": "ibm,power9-core",
                    "index": 0,
                    "children": [
                        { "name": "thread@0", "class": "thread", "index": 0 },
                        { "name": "thread@1", "class": "thread", "index": 1 }
                    ]
                },
                { "name": "core@21000000", "compatible": "ibm,power9-core", "index": 1 },
                { "name": "adu@90000", "compatible": "ibm,power9-adu" },
                { "name": "spare", "compatible": "vendor,unknown" }
            ]
        }]
    },
    "system": {
        "children": [{
            "name": "proc0",
            "class": "proc",
            "index": 0,
            "children": [
                { "name": "core0", "class": "core", "index": 0, "properties": { "device-path": "/pib@0/core@20000000" } },
                { "name": "core1", "class": "core", "index": 1, "properties": { "device-path": "/pib@0/core@21000000" } },
                { "name": "core2", "class": "core", "index": 2, "status": "disabled" }
            ]
        }]
    }
}"#;

fn build() -> (Topology, SharedScom) {
    init_tracing();
    let config = Config::default();
    let scom = SharedScom::default();
    let mut registry = DriverRegistry::for_generation(&config);
    let state = Rc::clone(&scom);
    registry.register("test,fake-pib", move |_, _| Ok(Box::new(FakePib::with_state(Rc::clone(&state)))));
    let desc = TopologyConfig::from_json_str(DESC).unwrap();
    let topo = Topology::from_config(config, &desc, &registry).unwrap();
    (topo, scom)
}

#[test]
fn test_registry_knows_generation_units() {
    let registry = DriverRegistry::for_generation(&Config::default());
    assert!(registry.contains("ibm,power9-core"));
    assert!(registry.contains("ibm,power9-adu"));
    assert!(registry.contains("ibm,sbefifo"));
    assert!(!registry.contains("ibm,power10-core"));
}

#[test]
fn test_classes_come_from_drivers_and_description() {
    let (topo, _) = build();
    let backend = topo.backend_root();
    let core = topo.find_by_path(backend, "/pib@0/core@20000000").unwrap();
    assert_eq!(topo.target(core).class(), "core");
    assert!(topo.target(core).translator().is_some());

    let adu = topo.find_by_path(backend, "/pib@0/adu").unwrap();
    assert_eq!(topo.target(adu).class(), "mem");

    let spare = topo.find_by_path(backend, "/pib@0/spare").unwrap();
    assert!(!topo.has_driver(spare));
    assert_eq!(topo.target(spare).class(), "spare");
}

#[test]
fn test_device_path_links_system_to_backend() {
    let (topo, _) = build();
    let system = topo.system_root();
    let core0 = topo.find_by_path(system, "/proc0/core0").unwrap();
    let backend_core = topo.find_by_path(topo.backend_root(), "/pib@0/core@20000000").unwrap();
    assert_eq!(core0, backend_core);
    assert_eq!(topo.iterate_class("core", Some(system)).len(), 3);
}

#[test]
fn test_path_continues_under_linked_backend_node() {
    let (topo, _) = build();
    let system = topo.system_root();

    // Threads are only described under the backend core.
    let thread = topo.find_by_path(system, "/proc0/core0/thread@1").unwrap();
    let backend_thread = topo
        .find_by_path(topo.backend_root(), "/pib@0/core@20000000/thread@1")
        .unwrap();
    assert_eq!(thread, backend_thread);
    assert_eq!(topo.path(thread), "/pib@0/core@20000000/thread@1");
}

#[test]
fn test_path_missing_under_both_views_is_not_found() {
    let (topo, _) = build();
    let system = topo.system_root();

    let err = topo.find_by_path(system, "/proc0/core0/thread@7").unwrap_err();
    assert!(matches!(err, Error::PathNotFound(ref p) if p == "/proc0/core0/thread@7"));
    // core1's backend node has no threads.
    assert!(matches!(
        topo.find_by_path(system, "/proc0/core1/thread@1"),
        Err(Error::PathNotFound(_))
    ));
    // core2 has no alias to fall back on.
    assert!(matches!(
        topo.find_by_path(system, "/proc0/core2/thread@0"),
        Err(Error::PathNotFound(_))
    ));
}

#[test]
fn test_chiplet_enable_decides_presence() {
    let (mut topo, scom) = build();
    let _ = scom.borrow_mut().regs.insert(0x2000_0000 | NET_CTRL0, ppc_bit(0));

    let system = topo.system_root();
    let cores = topo.iterate_class("core", Some(system));
    let statuses: Vec<Status> = cores.iter().map(|&c| topo.probe(c).unwrap()).collect();
    assert_eq!(statuses, [Status::Enabled, Status::Nonexistent, Status::Disabled]);

    // core1 read its own chiplet's control register
    assert!(scom.borrow().reads.contains(&(0x2100_0000 | NET_CTRL0)));
}

#[test]
fn test_access_through_system_node_is_translated() {
    let (mut topo, scom) = build();
    let _ = scom.borrow_mut().regs.insert(0x2000_0000 | NET_CTRL0, ppc_bit(0));
    let _ = scom.borrow_mut().regs.insert(0x2001_0A9C, 0xFEED);

    let core0 = topo.find_by_path(topo.system_root(), "/proc0/core0").unwrap();
    let _ = topo.probe(core0).unwrap();
    assert_eq!(topo.pib_read(core0, 0x0001_0A9C).unwrap(), 0xFEED);
}

#[test]
fn test_chip_unit_without_index_is_rejected() {
    let config = Config::default();
    let registry = DriverRegistry::for_generation(&config);
    let desc = TopologyConfig::from_json_str(
        r#"{ "backend": { "children": [{ "name": "core", "compatible": "ibm,power9-core" }] } }"#,
    )
    .unwrap();
    let err = Topology::from_config(config, &desc, &registry).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_dangling_device_path_is_rejected() {
    let config = Config::default();
    let registry = DriverRegistry::for_generation(&config);
    let desc = TopologyConfig::from_json_str(
        r#"{ "system": { "children": [{ "name": "core0", "properties": { "device-path": "/nowhere" } }] } }"#,
    )
    .unwrap();
    assert!(Topology::from_config(config, &desc, &registry).is_err());
}

#[test]
fn test_duplicate_siblings_are_rejected() {
    let config = Config::default();
    let registry = DriverRegistry::new();
    let desc = TopologyConfig::from_json_str(
        r#"{ "backend": { "children": [{ "name": "fsi@0" }, { "name": "fsi@0" }] } }"#,
    )
    .unwrap();
    let err = Topology::from_config(config, &desc, &registry).unwrap_err();
    assert!(matches!(err, Error::DuplicateTarget { .. }));
}
