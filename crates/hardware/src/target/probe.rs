//! Probe engine.
//!
//! Probing is lazy and memoized. A target is probed at most once:
//! 1. **Parent first:** The parent is probed before the child. A child of a
//!    `Nonexistent` parent is `Nonexistent`; a child of a `Disabled` parent
//!    stays unresolved unless it is must-exist.
//! 2. **Aliases together:** The alias of a target is probed alongside it and
//!    an absent or disabled alias settles the target the same way. An
//!    in-progress set stops the recursion coming back.
//! 3. **Hook:** The driver's probe hook decides between `Enabled` and
//!    `Nonexistent`. Failure is routine and only fatal for must-exist targets.
//!
//! Release runs post-order and is idempotent. A released target is never
//! probed again.

use tracing::{debug, error, warn};

use crate::common::{Error, Result};

use super::node::{Status, TargetId};
use super::topology::Topology;

impl Topology {
    /// Probes a target, returning its resolved status.
    ///
    /// Returns `Error::MissingTarget` when a must-exist target ends up absent
    /// or below a disabled parent.
    pub fn probe(&mut self, id: TargetId) -> Result<Status> {
        let current = self.status(id);
        if current.is_resolved() || self.probing.contains(&id) {
            return Ok(current);
        }

        let _ = self.probing.insert(id);
        let result = self.probe_unresolved(id);
        let _ = self.probing.remove(&id);
        result
    }

    fn probe_unresolved(&mut self, id: TargetId) -> Result<Status> {
        if let Some(parent) = self.target(id).parent() {
            match self.probe(parent)? {
                Status::Enabled => {}
                Status::Nonexistent => return self.settle_absent(id, "parent is absent"),
                other => {
                    if self.target(id).is_must_exist() {
                        return Err(self.missing(id, other));
                    }
                    debug!(path = %self.path(id), parent = %other, "parent not enabled, skipping");
                    return Ok(self.status(id));
                }
            }
        }

        if let Some(alias) = self.alias(id) {
            match self.probe(alias)? {
                Status::Nonexistent => return self.settle_absent(id, "alias is absent"),
                Status::Disabled => {
                    self.set_status(id, Status::Disabled);
                    if self.target(id).is_must_exist() {
                        return Err(self.missing(id, Status::Disabled));
                    }
                    debug!(path = %self.path(id), "alias is disabled");
                    return Ok(Status::Disabled);
                }
                _ => {}
            }
        }

        let hook = self.with_driver(id, |driver, topo| driver.probe(topo, id))?;
        match hook {
            Some(Err(e)) => self.settle_absent(id, &e.to_string()),
            None | Some(Ok(())) => {
                self.set_status(id, Status::Enabled);
                debug!(path = %self.path(id), "probed enabled");
                Ok(Status::Enabled)
            }
        }
    }

    fn settle_absent(&mut self, id: TargetId, reason: &str) -> Result<Status> {
        self.set_status(id, Status::Nonexistent);
        if self.target(id).is_must_exist() {
            error!(path = %self.path(id), reason, "must-exist target is absent");
            return Err(self.missing(id, Status::Nonexistent));
        }
        debug!(path = %self.path(id), reason, "probed nonexistent");
        Ok(Status::Nonexistent)
    }

    fn missing(&self, id: TargetId, status: Status) -> Error {
        Error::MissingTarget {
            path: self.path(id),
            status,
        }
    }

    /// Probes `root` and every target below it, parents before children.
    ///
    /// Stops at the first must-exist failure.
    pub fn probe_all(&mut self, root: TargetId) -> Result<()> {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let _ = self.probe(id)?;
            stack.extend(self.target(id).children().iter().rev().copied());
        }
        Ok(())
    }

    /// Probes every member of `class`, optionally only below `parent`.
    pub fn probe_class(
        &mut self,
        class: &str,
        parent: Option<TargetId>,
    ) -> Vec<(TargetId, Result<Status>)> {
        self.iterate_class(class, parent)
            .into_iter()
            .map(|id| (id, self.probe(id)))
            .collect()
    }

    /// Releases a target and everything below it.
    ///
    /// Children are released first. The release hook runs only for targets
    /// that are currently enabled; its failure is logged and ignored. The
    /// target's alias is released afterwards. Releasing twice is a no-op.
    pub fn release(&mut self, id: TargetId) {
        if self.status(id) == Status::Released {
            return;
        }

        let children = self.target(id).children().to_vec();
        for child in children {
            self.release(child);
        }

        if self.status(id) == Status::Enabled {
            match self.with_driver(id, |driver, topo| driver.release(topo, id)) {
                Ok(Some(Err(e))) | Err(e) => {
                    warn!(path = %self.path(id), error = %e, "release hook failed");
                }
                Ok(_) => {}
            }
        }
        self.set_status(id, Status::Released);
        debug!(path = %self.path(id), "released");

        if let Some(alias) = self.alias(id) {
            self.release(alias);
        }
    }
}
