//! Built-in target drivers.
//!
//! This module contains the backends that implement the capability hooks
//! dispatched by the topology, such as the SBE FIFO chip-op provider, the
//! kernel SCOM and FSI device files, the FSI-to-PIB bridge, the alter/display
//! unit, and the per-generation chip units.
//!
//! `DriverRegistry` maps compatible strings to driver constructors.

/// Alter/display unit memory access over the PIB.
pub mod adu;

/// Chip units binding the per-generation translate hooks.
pub mod chiplet;

/// FSI-to-PIB bridge.
pub mod fsi2pib;

/// Kernel SCOM and CFAM device files.
pub mod kernel;

/// PIB and memory access carried over the SBE.
pub mod sbe;

/// SBE FIFO chip-op provider.
pub mod sbefifo;

use std::collections::HashMap;
use std::fmt;

use crate::chip::ChipUnit;
use crate::common::constants::PROP_INDEX;
use crate::common::{Error, Result};
use crate::config::{Config, NodeConfig};
use crate::target::TargetDriver;

pub use adu::Adu;
pub use chiplet::ChipUnitDriver;
pub use fsi2pib::Fsi2Pib;
pub use kernel::{KernelFsi, KernelScom};
pub use sbe::{SbeMem, SbePib};
pub use sbefifo::SbefifoChipop;

/// Constructor registered for a compatible string.
pub type DriverCtor = Box<dyn Fn(&NodeConfig, &Config) -> Result<Box<dyn TargetDriver>>>;

/// Compatible string to driver constructor map.
#[derive(Default)]
pub struct DriverRegistry {
    ctors: HashMap<String, DriverCtor>,
}

impl DriverRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in driver for the configured generation.
    pub fn for_generation(config: &Config) -> Self {
        let generation = config.general.generation;
        let mut registry = Self::new();

        registry.register("ibm,sbefifo", |_, cfg| {
            Ok(Box::new(SbefifoChipop::new(cfg.sbefifo.clone())))
        });
        registry.register("ibm,sbefifo-pib", |_, _| Ok(Box::new(SbePib)));
        registry.register("ibm,sbefifo-mem", |_, _| Ok(Box::new(SbeMem::proc())));
        registry.register("ibm,sbefifo-mem-pba", |_, _| Ok(Box::new(SbeMem::pba())));
        registry.register("ibm,kernel-scom", |_, _| Ok(Box::new(KernelScom::new())));
        registry.register("ibm,kernel-fsi", |_, _| Ok(Box::new(KernelFsi::new())));
        registry.register("ibm,fsi-pib", |_, _| Ok(Box::new(Fsi2Pib)));
        registry.register(&format!("ibm,{}-adu", generation.family()), move |_, cfg| {
            Ok(Box::new(Adu::new(generation, cfg.mem.adu_retries)))
        });

        for unit in ChipUnit::ALL {
            let Some(translate) = unit.translator(generation) else {
                continue;
            };
            registry.register(&unit.compatible(generation), move |node, _| {
                if node.index.is_none() && !node.properties.contains_key(PROP_INDEX) {
                    return Err(Error::config(format!(
                        "{} ({}) needs an index",
                        node.name,
                        unit.class()
                    )));
                }
                Ok(Box::new(ChipUnitDriver::new(unit, generation, translate)))
            });
        }
        registry
    }

    /// Registers (or replaces) the constructor for `compatible`.
    pub fn register<F>(&mut self, compatible: &str, ctor: F)
    where
        F: Fn(&NodeConfig, &Config) -> Result<Box<dyn TargetDriver>> + 'static,
    {
        let _ = self.ctors.insert(compatible.to_string(), Box::new(ctor));
    }

    /// Returns `true` if a constructor is registered for `compatible`.
    pub fn contains(&self, compatible: &str) -> bool {
        self.ctors.contains_key(compatible)
    }

    /// Constructs the driver for `compatible`, or `None` if none is registered.
    pub fn create(
        &self,
        compatible: &str,
        node: &NodeConfig,
        config: &Config,
    ) -> Result<Option<Box<dyn TargetDriver>>> {
        self.ctors
            .get(compatible)
            .map(|ctor| ctor(node, config))
            .transpose()
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut compatibles: Vec<&str> = self.ctors.keys().map(String::as_str).collect();
        compatibles.sort_unstable();
        f.debug_struct("DriverRegistry")
            .field("compatibles", &compatibles)
            .finish()
    }
}
