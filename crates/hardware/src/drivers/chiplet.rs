//! Chip units.
//!
//! A chip unit has no bus of its own. It binds the translate hook of its
//! (generation, kind) pair so accesses below it reach the right chiplet, and
//! on P9 and later it checks the chiplet enable bit when probed.

use tracing::debug;

use crate::chip::{ChipUnit, Generation};
use crate::common::constants::{NET_CTRL0, NET_CTRL0_CHIPLET_ENABLE};
use crate::common::{Error, Result};
use crate::target::{TargetDriver, TargetId, Topology, TranslateFn};

/// Driver for one chip unit kind.
#[derive(Debug, Clone, Copy)]
pub struct ChipUnitDriver {
    unit: ChipUnit,
    generation: Generation,
    translate: TranslateFn,
}

impl ChipUnitDriver {
    /// Creates a unit driver using `translate` for address rewriting.
    pub const fn new(unit: ChipUnit, generation: Generation, translate: TranslateFn) -> Self {
        Self {
            unit,
            generation,
            translate,
        }
    }

    /// Unit kind.
    pub const fn unit(&self) -> ChipUnit {
        self.unit
    }
}

impl TargetDriver for ChipUnitDriver {
    fn class(&self) -> &str {
        self.unit.class()
    }

    fn probe(&mut self, topo: &mut Topology, id: TargetId) -> Result<()> {
        if !self.unit.probes_chiplet_enable(self.generation) {
            return Ok(());
        }
        let ctrl = topo.pib_read(id, NET_CTRL0)?;
        debug!(path = %topo.path(id), net_ctrl0 = format_args!("{ctrl:#018x}"), "chiplet control");
        if ctrl & NET_CTRL0_CHIPLET_ENABLE == 0 {
            return Err(Error::ProbeFailed {
                path: topo.path(id),
                reason: "chiplet is not enabled".into(),
            });
        }
        Ok(())
    }

    fn translator(&self) -> Option<TranslateFn> {
        Some(self.translate)
    }
}
