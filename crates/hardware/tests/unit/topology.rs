//! # Topology Tests
//!
//! Paths, class iteration, properties, `reg` decoding, and aliases.

use powerdbg_core::target::{PropertyStore, Status};
use powerdbg_core::{Config, Error, Topology};
use pretty_assertions::assert_eq;

use crate::common::harness::{FourCoreSystem, add, add_with_props};

#[test]
fn test_roots_are_distinct_and_render_as_slash() {
    let topo = Topology::new(Config::default());
    assert_ne!(topo.system_root(), topo.backend_root());
    assert_eq!(topo.path(topo.system_root()), "/");
    assert_eq!(topo.len(), 2);
}

#[test]
fn test_paths_round_trip() {
    let sys = FourCoreSystem::new();
    let thread = sys.threads[2][5];
    let path = sys.topo.path(thread);
    assert_eq!(path, "/pib@0/core@2/thread@5");
    assert_eq!(sys.topo.find_by_path(sys.topo.backend_root(), &path).unwrap(), thread);
}

#[test]
fn test_unit_less_segment_matches_first_sibling() {
    let sys = FourCoreSystem::new();
    let found = sys.topo.find_by_path(sys.topo.backend_root(), "pib/core/thread@3").unwrap();
    assert_eq!(found, sys.threads[0][3]);
}

#[test]
fn test_missing_path_is_reported() {
    let sys = FourCoreSystem::new();
    let err = sys.topo.find_by_path(sys.topo.backend_root(), "/pib@0/core@9").unwrap_err();
    assert!(matches!(err, Error::PathNotFound(p) if p == "/pib@0/core@9"));
}

#[test]
fn test_class_iteration_scoped_to_parent() {
    let sys = FourCoreSystem::new();
    assert_eq!(sys.topo.iterate_class("thread", None).len(), 32);
    assert_eq!(sys.topo.iterate_class("thread", Some(sys.cores[1])), sys.threads[1]);
    assert!(sys.topo.iterate_class("eq", None).is_empty());
}

#[test]
fn test_children_sorted_by_index() {
    let mut topo = Topology::new(Config::default());
    let root = topo.backend_root();
    let c2 = add(&mut topo, root, "core@2", "core", Some(2), None);
    let c0 = add(&mut topo, root, "core@0", "core", Some(0), None);
    let c1 = add(&mut topo, root, "core@1", "core", Some(1), None);
    assert_eq!(topo.target(root).children(), [c0, c1, c2]);
}

#[test]
fn test_duplicate_sibling_leaves_tree_unchanged() {
    let mut topo = Topology::new(Config::default());
    let root = topo.backend_root();
    let _ = add(&mut topo, root, "fsi@0", "fsi", None, None);
    let before = topo.len();
    let dup = powerdbg_core::target::Target::new("fsi@0", "fsi").unwrap();
    assert!(matches!(topo.attach(root, dup, None), Err(Error::DuplicateTarget { .. })));
    assert_eq!(topo.len(), before);
    assert_eq!(topo.target(root).children().len(), 1);
}

#[test]
fn test_reg_uses_parent_cell_counts() {
    let mut topo = Topology::new(Config::default());
    let root = topo.backend_root();
    let fsi = add_with_props(
        &mut topo,
        root,
        "fsi@0",
        "fsi",
        PropertyStore::new()
            .with("#address-cells", 1u32.to_be_bytes())
            .with("#size-cells", 1u32.to_be_bytes()),
        None,
    );
    let cells: Vec<u8> = [0x1000u32, 0x400].iter().flat_map(|c| c.to_be_bytes()).collect();
    let bridge = add_with_props(&mut topo, fsi, "pib@1000", "pib", PropertyStore::new().with("reg", cells), None);
    assert_eq!(topo.address(bridge).unwrap(), Some((0x1000, 0x400)));
    assert_eq!(topo.base_offset(bridge).unwrap(), 0x1000);
    assert_eq!(topo.base_offset(fsi).unwrap(), 0);
}

#[test]
fn test_reg_defaults_to_two_address_cells() {
    let mut topo = Topology::new(Config::default());
    let root = topo.backend_root();
    let cells: Vec<u8> = [0x1u32, 0x2000_0000, 0x100].iter().flat_map(|c| c.to_be_bytes()).collect();
    let unit = add_with_props(&mut topo, root, "unit", "unit", PropertyStore::new().with("reg", cells), None);
    assert_eq!(topo.address(unit).unwrap(), Some((0x1_2000_0000, 0x100)));
}

#[test]
fn test_short_reg_is_a_config_error() {
    let mut topo = Topology::new(Config::default());
    let root = topo.backend_root();
    let unit = add_with_props(&mut topo, root, "unit", "unit", PropertyStore::new().with("reg", vec![0u8, 0, 0, 1]), None);
    assert!(matches!(topo.address(unit), Err(Error::Config(_))));
}

#[test]
fn test_property_falls_back_to_alias() {
    let mut topo = Topology::new(Config::default());
    let backend = topo.backend_root();
    let system = topo.system_root();
    let real = add_with_props(
        &mut topo,
        backend,
        "core@0",
        "core",
        PropertyStore::new().with("ecid", 7u32.to_be_bytes()),
        None,
    );
    let view = add(&mut topo, system, "core0", "core", Some(0), None);
    topo.link(view, real).unwrap();

    assert_eq!(topo.property_u32(view, "ecid").unwrap(), Some(7));
    assert_eq!(topo.alias(real), Some(view));
    assert!(topo.link(view, real).is_err());
}

#[test]
fn test_properties_are_read_only_by_default() {
    let mut topo = Topology::new(Config::default());
    let root = topo.backend_root();
    let ro = add(&mut topo, root, "ro", "ro", None, None);
    let rw = add_with_props(&mut topo, root, "rw", "rw", PropertyStore::writable(), None);

    assert!(matches!(topo.set_property(ro, "x", vec![1]), Err(Error::ReadOnlyProperty { .. })));
    topo.set_property(rw, "x", vec![1]).unwrap();
    assert_eq!(topo.property(rw, "x"), Some(&[1u8][..]));
}

#[test]
fn test_new_targets_start_unknown() {
    let sys = FourCoreSystem::new();
    assert!(sys.topo.ids().all(|id| sys.topo.status(id) == Status::Unknown));
}
