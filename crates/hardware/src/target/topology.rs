//! Target arena, class index, and alias map.
//!
//! This module implements the topology that owns every target. It provides:
//! 1. **Arena:** Targets and their drivers stored by `TargetId`, with two roots (system and backend).
//! 2. **Attach:** Sorted sibling insertion that rejects duplicate identities without mutating.
//! 3. **Class index:** Flat per-class membership lists for `iterate_class`.
//! 4. **Aliases:** A symmetric map pairing a system-tree node with its backend-tree node.
//! 5. **Lookup:** Path resolution, property lookup with alias fallback, and `reg` decoding.

use std::collections::{HashMap, HashSet};
use std::mem;

use tracing::debug;

use crate::common::constants::{
    DEFAULT_ADDRESS_CELLS, DEFAULT_SIZE_CELLS, PROP_ADDRESS_CELLS, PROP_REG, PROP_SIZE_CELLS,
};
use crate::common::{Error, Result};
use crate::config::Config;

use super::node::{Status, Target, TargetId, parse_segment};
use super::property::decode_cells;
use super::traits::{Capabilities, TargetDriver};

/// Driver storage for one target.
///
/// A driver is moved out of its slot while one of its hooks runs, so the hook
/// can borrow the topology mutably. A re-entrant call on the same target finds
/// the slot `InUse`.
#[derive(Debug)]
enum DriverSlot {
    Empty,
    Present(Box<dyn TargetDriver>),
    InUse,
}

/// The topology context: every target, its driver, and the lookup indices.
///
/// Each `Topology` is independent; tests build as many as they like.
#[derive(Debug)]
pub struct Topology {
    pub(super) targets: Vec<Target>,
    drivers: Vec<DriverSlot>,
    classes: HashMap<String, Vec<TargetId>>,
    aliases: HashMap<TargetId, TargetId>,
    pub(super) probing: HashSet<TargetId>,
    system_root: TargetId,
    backend_root: TargetId,
    config: Config,
}

impl Topology {
    /// Creates a topology holding only the system and backend roots.
    pub fn new(config: Config) -> Self {
        let mut topo = Self {
            targets: Vec::new(),
            drivers: Vec::new(),
            classes: HashMap::new(),
            aliases: HashMap::new(),
            probing: HashSet::new(),
            system_root: TargetId(0),
            backend_root: TargetId(0),
            config,
        };
        topo.system_root = topo.push(Target::root(), None);
        topo.backend_root = topo.push(Target::root(), None);
        topo
    }

    /// Settings the topology was created with.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Root of the logical (system) tree.
    pub const fn system_root(&self) -> TargetId {
        self.system_root
    }

    /// Root of the backend tree.
    pub const fn backend_root(&self) -> TargetId {
        self.backend_root
    }

    /// Number of targets, roots included.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Always `false`: a topology holds at least its two roots.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Returns the target with the given id.
    pub fn target(&self, id: TargetId) -> &Target {
        &self.targets[id.0]
    }

    /// Current status of a target.
    pub fn status(&self, id: TargetId) -> Status {
        self.targets[id.0].status
    }

    /// Iterates over every target id in creation order.
    pub fn ids(&self) -> impl Iterator<Item = TargetId> {
        (0..self.targets.len()).map(TargetId)
    }

    /// Inserts `target` under `parent`, binding `driver` to it.
    ///
    /// Children stay sorted by class, index, name and unit address. A sibling
    /// with the same name and unit address is rejected and nothing changes.
    pub fn attach(
        &mut self,
        parent: TargetId,
        mut target: Target,
        mut driver: Option<Box<dyn TargetDriver>>,
    ) -> Result<TargetId> {
        let duplicate = self.targets[parent.0].children.iter().any(|c| {
            let sibling = &self.targets[c.0];
            sibling.name == target.name && sibling.unit_addr == target.unit_addr
        });
        if duplicate {
            return Err(Error::DuplicateTarget {
                parent: self.path(parent),
                name: target.display_name(),
            });
        }

        if let Some(drv) = driver.as_deref_mut() {
            target.caps = Capabilities::of(drv);
            target.translate = drv.translator();
            if target.class.is_empty() {
                target.class = drv.class().to_string();
            }
        }
        target.parent = Some(parent);
        target.children.clear();

        let pos = {
            let key = target.sort_key();
            let siblings = &self.targets[parent.0].children;
            siblings
                .iter()
                .position(|c| self.targets[c.0].sort_key() > key)
                .unwrap_or(siblings.len())
        };
        let id = self.push(target, driver);
        self.targets[parent.0].children.insert(pos, id);
        debug!(path = %self.path(id), class = %self.targets[id.0].class, "attached target");
        Ok(id)
    }

    fn push(&mut self, target: Target, driver: Option<Box<dyn TargetDriver>>) -> TargetId {
        let id = TargetId(self.targets.len());
        self.classes
            .entry(target.class.clone())
            .or_default()
            .push(id);
        self.targets.push(target);
        self.drivers
            .push(driver.map_or(DriverSlot::Empty, DriverSlot::Present));
        id
    }

    /// Pairs two targets as views of the same unit.
    ///
    /// Each target may have at most one alias.
    pub fn link(&mut self, a: TargetId, b: TargetId) -> Result<()> {
        if a == b || self.aliases.contains_key(&a) || self.aliases.contains_key(&b) {
            return Err(Error::config(format!(
                "cannot alias {} to {}",
                self.path(a),
                self.path(b)
            )));
        }
        let _ = self.aliases.insert(a, b);
        let _ = self.aliases.insert(b, a);
        Ok(())
    }

    /// Returns the alias of a target, if linked.
    pub fn alias(&self, id: TargetId) -> Option<TargetId> {
        self.aliases.get(&id).copied()
    }

    /// Maps a virtual node to the concrete node it aliases.
    pub fn to_real(&self, id: TargetId) -> TargetId {
        match self.alias(id) {
            Some(alias) if self.targets[id.0].is_virtual() && !self.targets[alias.0].is_virtual() => {
                alias
            }
            _ => id,
        }
    }

    /// Resolves `/a/b@3` relative to `start`.
    ///
    /// Each segment matches a child by name and, when given, unit address.
    /// If no child matches, the current node's alias is searched instead. The
    /// result is mapped to its concrete representative.
    pub fn find_by_path(&self, start: TargetId, path: &str) -> Result<TargetId> {
        let mut cur = start;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let (name, unit) =
                parse_segment(segment).map_err(|_| Error::PathNotFound(path.to_string()))?;
            cur = self
                .child_named(cur, name, unit)
                .or_else(|| {
                    self.alias(cur)
                        .and_then(|alias| self.child_named(alias, name, unit))
                })
                .ok_or_else(|| Error::PathNotFound(path.to_string()))?;
        }
        Ok(self.to_real(cur))
    }

    fn child_named(&self, parent: TargetId, name: &str, unit: Option<u64>) -> Option<TargetId> {
        self.targets[parent.0]
            .children
            .iter()
            .copied()
            .find(|c| self.targets[c.0].matches(name, unit))
    }

    /// Lists every target of `class`, optionally only those below `parent`.
    ///
    /// Order is class-index insertion order.
    pub fn iterate_class(&self, class: &str, parent: Option<TargetId>) -> Vec<TargetId> {
        self.classes
            .get(class)
            .map(|members| {
                members
                    .iter()
                    .copied()
                    .filter(|&id| parent.is_none_or(|p| self.is_descendant(id, p)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Iterates over the known class names.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// Returns `true` if `ancestor` is a strict ancestor of `id`.
    pub fn is_descendant(&self, id: TargetId, ancestor: TargetId) -> bool {
        let mut cur = self.targets[id.0].parent;
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.targets[p.0].parent;
        }
        false
    }

    /// Looks a property up locally, then on the target's alias.
    pub fn property(&self, id: TargetId, key: &str) -> Option<&[u8]> {
        self.property_holder(id, key)
            .and_then(|holder| self.targets[holder.0].props.get(key))
    }

    fn property_holder(&self, id: TargetId, key: &str) -> Option<TargetId> {
        if self.targets[id.0].props.contains(key) {
            return Some(id);
        }
        self.alias(id)
            .filter(|alias| self.targets[alias.0].props.contains(key))
    }

    /// Decodes a one-cell property, with alias fallback.
    pub fn property_u32(&self, id: TargetId, key: &str) -> Result<Option<u32>> {
        self.property_holder(id, key)
            .map_or(Ok(None), |holder| self.targets[holder.0].props.get_u32(key))
    }

    /// Decodes a two-cell property, with alias fallback.
    pub fn property_u64(&self, id: TargetId, key: &str) -> Result<Option<u64>> {
        self.property_holder(id, key)
            .map_or(Ok(None), |holder| self.targets[holder.0].props.get_u64(key))
    }

    /// Decodes a string property, with alias fallback.
    pub fn property_str(&self, id: TargetId, key: &str) -> Result<Option<&str>> {
        self.property_holder(id, key)
            .map_or(Ok(None), |holder| self.targets[holder.0].props.get_str(key))
    }

    /// Writes a property on a target whose store is writable.
    pub fn set_property(&mut self, id: TargetId, key: &str, value: Vec<u8>) -> Result<()> {
        if !self.targets[id.0].props.is_writable() {
            return Err(Error::ReadOnlyProperty {
                path: self.path(id),
                key: key.to_string(),
            });
        }
        let _ = self.targets[id.0].props.insert(key, value);
        Ok(())
    }

    /// Decodes the first `(address, size)` entry of a target's `reg`.
    ///
    /// Cell counts come from the parent of whichever node declares `reg`.
    pub fn address(&self, id: TargetId) -> Result<Option<(u64, u64)>> {
        let Some(holder) = self.property_holder(id, PROP_REG) else {
            return Ok(None);
        };
        let target = &self.targets[holder.0];
        let (address_cells, size_cells) = match target.parent {
            Some(p) => (
                self.cell_count(p, PROP_ADDRESS_CELLS, DEFAULT_ADDRESS_CELLS)?,
                self.cell_count(p, PROP_SIZE_CELLS, DEFAULT_SIZE_CELLS)?,
            ),
            None => (DEFAULT_ADDRESS_CELLS, DEFAULT_SIZE_CELLS),
        };
        let raw = target.props.get(PROP_REG).unwrap_or_default();
        let cells = decode_cells(PROP_REG, raw)?;
        if !(1..=2).contains(&address_cells)
            || size_cells > 2
            || cells.len() < address_cells + size_cells
        {
            return Err(Error::config(format!(
                "{}: reg has {} cells, expected {address_cells}+{size_cells}",
                self.path(holder),
                cells.len()
            )));
        }
        let fold = |cells: &[u32]| cells.iter().fold(0u64, |acc, &c| (acc << 32) | c as u64);
        let addr = fold(&cells[..address_cells]);
        let size = fold(&cells[address_cells..address_cells + size_cells]);
        Ok(Some((addr, size)))
    }

    /// Base offset a target contributes during the upward walk; 0 without `reg`.
    pub fn base_offset(&self, id: TargetId) -> Result<u64> {
        Ok(self.address(id)?.map_or(0, |(addr, _)| addr))
    }

    fn cell_count(&self, id: TargetId, key: &str, default: usize) -> Result<usize> {
        Ok(self.targets[id.0]
            .props
            .get_u32(key)?
            .map_or(default, |n| n as usize))
    }

    /// Renders the path of a target, the inverse of `find_by_path`.
    pub fn path(&self, id: TargetId) -> String {
        let mut segments = Vec::new();
        let mut cur = Some(id);
        while let Some(c) = cur {
            let target = &self.targets[c.0];
            if target.parent.is_some() {
                segments.push(target.display_name());
            }
            cur = target.parent;
        }
        if segments.is_empty() {
            return "/".to_string();
        }
        segments.reverse();
        format!("/{}", segments.join("/"))
    }

    pub(super) fn set_status(&mut self, id: TargetId, status: Status) {
        self.targets[id.0].status = status;
    }

    /// Runs `f` with the driver bound to `id` moved out of the topology.
    ///
    /// Returns `Ok(None)` when the target has no driver, and
    /// `Error::TargetBusy` when its driver is already running a hook.
    pub fn with_driver<R>(
        &mut self,
        id: TargetId,
        f: impl FnOnce(&mut dyn TargetDriver, &mut Self) -> R,
    ) -> Result<Option<R>> {
        match mem::replace(&mut self.drivers[id.0], DriverSlot::InUse) {
            DriverSlot::Empty => {
                self.drivers[id.0] = DriverSlot::Empty;
                Ok(None)
            }
            DriverSlot::InUse => Err(Error::TargetBusy(self.path(id))),
            DriverSlot::Present(mut driver) => {
                let out = f(driver.as_mut(), self);
                self.drivers[id.0] = DriverSlot::Present(driver);
                Ok(Some(out))
            }
        }
    }

    /// Returns `true` if a driver is bound to `id`.
    pub fn has_driver(&self, id: TargetId) -> bool {
        !matches!(self.drivers[id.0], DriverSlot::Empty)
    }
}

impl Target {
    fn root() -> Self {
        Self {
            name: String::new(),
            unit_addr: None,
            class: "root".to_string(),
            compatible: None,
            index: None,
            status: Status::Unknown,
            must_exist: false,
            parent: None,
            children: Vec::new(),
            props: super::property::PropertyStore::new(),
            caps: Capabilities::default(),
            translate: None,
        }
    }
}
