//! Per-target sweeps.

use crate::common::{Error, Result};
use crate::target::{Status, TargetId, Topology};

impl Topology {
    /// Runs `op` on every enabled member of `class`, optionally below `parent`.
    ///
    /// A failing member does not stop the sweep. Members that are not enabled
    /// are reported as `Error::NotEnabled` without running `op`.
    pub fn sweep<T>(
        &mut self,
        class: &str,
        parent: Option<TargetId>,
        mut op: impl FnMut(&mut Self, TargetId) -> Result<T>,
    ) -> Vec<(TargetId, Result<T>)> {
        self.iterate_class(class, parent)
            .into_iter()
            .map(|id| {
                let status = self.status(id);
                let result = if status == Status::Enabled {
                    op(self, id)
                } else {
                    Err(Error::NotEnabled {
                        path: self.path(id),
                        status,
                    })
                };
                (id, result)
            })
            .collect()
    }
}
