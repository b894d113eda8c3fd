//! Topology construction from a description.
//!
//! The builder attaches the backend tree, then the system tree, binding a
//! driver to each node whose compatible string the registry knows. System
//! nodes carrying `device-path` are then aliased to the backend node at that
//! path.

use tracing::debug;

use crate::common::constants::{PROP_DEVICE_PATH, PROP_INDEX};
use crate::common::{Error, Result};
use crate::config::{Config, NodeConfig, StatusConfig, TopologyConfig};
use crate::drivers::DriverRegistry;

use super::node::{Status, Target, TargetId, parse_segment};
use super::property::PropertyStore;
use super::topology::Topology;

impl Topology {
    /// Builds a topology from a description, binding drivers from `registry`.
    pub fn from_config(
        config: Config,
        desc: &TopologyConfig,
        registry: &DriverRegistry,
    ) -> Result<Self> {
        let mut topo = Self::new(config);
        let backend = topo.backend_root();
        let system = topo.system_root();
        topo.populate(backend, &desc.backend, registry)?;
        topo.populate(system, &desc.system, registry)?;
        topo.link_device_paths()?;
        Ok(topo)
    }

    fn populate(&mut self, root: TargetId, desc: &NodeConfig, registry: &DriverRegistry) -> Result<()> {
        self.targets[root.0]
            .props
            .overlay(&PropertyStore::from_config(&desc.properties));
        for child in &desc.children {
            let _ = self.build_node(root, child, registry)?;
        }
        Ok(())
    }

    fn build_node(
        &mut self,
        parent: TargetId,
        desc: &NodeConfig,
        registry: &DriverRegistry,
    ) -> Result<TargetId> {
        let (base, _) = parse_segment(&desc.name)
            .map_err(|e| Error::config(format!("under {}: {e}", self.path(parent))))?;
        let props = PropertyStore::from_config(&desc.properties);

        let driver = match desc.compatible.as_deref() {
            Some(compatible) => {
                let driver = registry.create(compatible, desc, self.config())?;
                if driver.is_none() {
                    debug!(name = %desc.name, compatible, "no driver registered");
                }
                driver
            }
            None => None,
        };

        let class = desc
            .class
            .clone()
            .or_else(|| driver.as_ref().map(|d| d.class().to_string()))
            .unwrap_or_else(|| base.to_string());
        let index = match desc.index {
            Some(index) => Some(index),
            None => props.get_u32(PROP_INDEX)?,
        };

        let mut target = Target::new(&desc.name, &class)?
            .with_properties(props)
            .must_exist(desc.status == Some(StatusConfig::MustExist));
        if let Some(index) = index {
            target = target.with_index(index);
        }
        if let Some(compatible) = desc.compatible.as_deref() {
            target = target.with_compatible(compatible);
        }
        if desc.status == Some(StatusConfig::Disabled) {
            target = target.with_status(Status::Disabled);
        }

        let id = self.attach(parent, target, driver)?;
        for child in &desc.children {
            let _ = self.build_node(id, child, registry)?;
        }
        Ok(id)
    }

    fn link_device_paths(&mut self) -> Result<()> {
        let system = self.system_root();
        let backend = self.backend_root();
        let nodes: Vec<TargetId> = self
            .ids()
            .filter(|&id| self.is_descendant(id, system))
            .collect();
        for id in nodes {
            let Some(path) = self.target(id).properties().get_str(PROP_DEVICE_PATH)? else {
                continue;
            };
            let path = path.to_string();
            let real = self.find_by_path(backend, &path).map_err(|_| {
                Error::config(format!("{}: device-path {path} not found", self.path(id)))
            })?;
            self.link(id, real)?;
            debug!(system = %self.path(id), backend = %path, "linked alias");
        }
        Ok(())
    }
}
