//! Target nodes and lifecycle status.
//!
//! A `Target` is one hardware unit in the topology. It records:
//! 1. **Identity:** Name, optional unit address, class tag, and index within the class.
//! 2. **Binding:** Compatible string (absent for virtual nodes), capability set, and translate hook.
//! 3. **Lifecycle:** Probe status and the must-exist marker.
//! 4. **Structure:** Parent and children as arena ids owned by the `Topology`.

use std::fmt;

use crate::common::{Error, Result};

use super::property::PropertyStore;
use super::traits::{Capabilities, TranslateFn};

/// Arena index of a target within its `Topology`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub(crate) usize);

impl TargetId {
    /// Returns the raw arena index.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Probe lifecycle status.
///
/// `Unknown` is the only unresolved state. `Enabled`, `Disabled` and
/// `Nonexistent` are memoized results, and `Released` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    /// Not probed yet.
    #[default]
    Unknown,
    /// Probed and usable.
    Enabled,
    /// Excluded from probing by the description.
    Disabled,
    /// Probed and found absent.
    Nonexistent,
    /// Released; never probed again.
    Released,
}

impl Status {
    /// Returns `true` once a probe result (or release) has been recorded.
    pub const fn is_resolved(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::Nonexistent => "nonexistent",
            Self::Released => "released",
        };
        f.write_str(s)
    }
}

/// One hardware unit.
#[derive(Debug, Clone)]
pub struct Target {
    pub(crate) name: String,
    pub(crate) unit_addr: Option<u64>,
    pub(crate) class: String,
    pub(crate) compatible: Option<String>,
    pub(crate) index: Option<u32>,
    pub(crate) status: Status,
    pub(crate) must_exist: bool,
    pub(crate) parent: Option<TargetId>,
    pub(crate) children: Vec<TargetId>,
    pub(crate) props: PropertyStore,
    pub(crate) caps: Capabilities,
    pub(crate) translate: Option<TranslateFn>,
}

impl Target {
    /// Creates a detached target.
    ///
    /// `name` may carry a `@<hex>` unit address suffix, as in `core@20000000`.
    ///
    /// # Examples
    ///
    /// ```
    /// use powerdbg_core::target::Target;
    ///
    /// let core = Target::new("core@20000000", "core").unwrap().with_index(0);
    /// assert_eq!(core.name(), "core");
    /// assert_eq!(core.unit_addr(), Some(0x2000_0000));
    /// assert!(core.is_virtual());
    /// ```
    pub fn new(name: &str, class: &str) -> Result<Self> {
        let (base, unit_addr) =
            parse_segment(name).map_err(|e| Error::config(format!("target {name}: {e}")))?;
        Ok(Self {
            name: base.to_string(),
            unit_addr,
            class: class.to_string(),
            compatible: None,
            index: None,
            status: Status::Unknown,
            must_exist: false,
            parent: None,
            children: Vec::new(),
            props: PropertyStore::new(),
            caps: Capabilities::default(),
            translate: None,
        })
    }

    /// Sets the compatible string, making the target concrete.
    #[must_use]
    pub fn with_compatible(mut self, compatible: &str) -> Self {
        self.compatible = Some(compatible.to_string());
        self
    }

    /// Sets the unit number within the class.
    #[must_use]
    pub const fn with_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }

    /// Replaces the property store.
    #[must_use]
    pub fn with_properties(mut self, props: PropertyStore) -> Self {
        self.props = props;
        self
    }

    /// Sets the initial status.
    #[must_use]
    pub const fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Marks the target as must-exist.
    #[must_use]
    pub const fn must_exist(mut self, must_exist: bool) -> Self {
        self.must_exist = must_exist;
        self
    }

    /// Base name without the unit address.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit address parsed from the name suffix.
    pub const fn unit_addr(&self) -> Option<u64> {
        self.unit_addr
    }

    /// Name as it appears in a path segment.
    pub fn display_name(&self) -> String {
        match self.unit_addr {
            Some(unit) => format!("{}@{unit:x}", self.name),
            None => self.name.clone(),
        }
    }

    /// Class tag.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Compatible string, if any.
    pub fn compatible(&self) -> Option<&str> {
        self.compatible.as_deref()
    }

    /// Returns `true` for nodes without a compatible string.
    pub const fn is_virtual(&self) -> bool {
        self.compatible.is_none()
    }

    /// Unit number within the class.
    pub const fn index(&self) -> Option<u32> {
        self.index
    }

    /// Current lifecycle status.
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Returns `true` if a failed probe is fatal.
    pub const fn is_must_exist(&self) -> bool {
        self.must_exist
    }

    /// Parent target, `None` for a root.
    pub const fn parent(&self) -> Option<TargetId> {
        self.parent
    }

    /// Children in sibling sort order.
    pub fn children(&self) -> &[TargetId] {
        &self.children
    }

    /// Local properties, without alias fallback.
    pub const fn properties(&self) -> &PropertyStore {
        &self.props
    }

    /// Capabilities provided by the bound driver.
    pub const fn capabilities(&self) -> Capabilities {
        self.caps
    }

    /// Translate hook bound by the driver.
    pub const fn translator(&self) -> Option<TranslateFn> {
        self.translate
    }

    /// Sibling sort key: class, then index, then name and unit address.
    pub(crate) fn sort_key(&self) -> (&str, Option<u32>, &str, Option<u64>) {
        (&self.class, self.index, &self.name, self.unit_addr)
    }

    /// Returns `true` if this target is addressed by the given path segment.
    pub(crate) fn matches(&self, name: &str, unit: Option<u64>) -> bool {
        self.name == name && (unit.is_none() || unit == self.unit_addr)
    }
}

/// Splits a path segment such as `pib@1000` into name and unit address.
pub fn parse_segment(segment: &str) -> std::result::Result<(&str, Option<u64>), String> {
    match segment.split_once('@') {
        None => Ok((segment, None)),
        Some((name, unit)) => {
            let digits = unit.trim_start_matches("0x");
            u64::from_str_radix(digits, 16)
                .map(|u| (name, Some(u)))
                .map_err(|_| format!("bad unit address in {segment}"))
        }
    }
}
