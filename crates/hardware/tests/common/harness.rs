//! Topology fixtures and scripted SBE FIFO sessions.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use powerdbg_core::config::SbefifoConfig;
use powerdbg_core::sbefifo::{CallbackTransport, SbeStatus, Session, build_reply};
use powerdbg_core::target::{PropertyStore, Target, TargetDriver};
use powerdbg_core::{Config, TargetId, Topology};
use tracing_subscriber::EnvFilter;

use super::mocks::{CountingDriver, FakePib, HookCounts, SharedScom};

/// Installs a test-writer subscriber filtered by `RUST_LOG`, once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Attaches a target and returns its id.
pub fn add(
    topo: &mut Topology,
    parent: TargetId,
    name: &str,
    class: &str,
    index: Option<u32>,
    driver: Option<Box<dyn TargetDriver>>,
) -> TargetId {
    let mut target = Target::new(name, class).unwrap();
    if let Some(index) = index {
        target = target.with_index(index);
    }
    topo.attach(parent, target, driver).unwrap()
}

/// Attaches a target with properties.
pub fn add_with_props(
    topo: &mut Topology,
    parent: TargetId,
    name: &str,
    class: &str,
    props: PropertyStore,
    driver: Option<Box<dyn TargetDriver>>,
) -> TargetId {
    let target = Target::new(name, class).unwrap().with_properties(props);
    topo.attach(parent, target, driver).unwrap()
}

/// A processor with a fake PIB, four cores, and eight threads per core.
pub struct FourCoreSystem {
    /// The topology.
    pub topo: Topology,
    /// The PIB node.
    pub pib: TargetId,
    /// PIB register file.
    pub scom: SharedScom,
    /// Cores by index.
    pub cores: Vec<TargetId>,
    /// Hook counters of each core.
    pub core_hooks: Vec<Rc<RefCell<HookCounts>>>,
    /// Threads of each core.
    pub threads: Vec<Vec<TargetId>>,
}

impl FourCoreSystem {
    /// Builds the fixture without probing.
    pub fn new() -> Self {
        init_tracing();
        let mut topo = Topology::new(Config::default());
        let root = topo.backend_root();
        let (pib_driver, scom) = FakePib::new();
        let pib = add(&mut topo, root, "pib@0", "pib", Some(0), Some(Box::new(pib_driver)));

        let mut cores = Vec::new();
        let mut core_hooks = Vec::new();
        let mut threads = Vec::new();
        for c in 0..4 {
            let (driver, counts) = CountingDriver::new("core", true);
            let core = add(&mut topo, pib, &format!("core@{c:x}"), "core", Some(c), Some(Box::new(driver)));
            let per_core = (0..8)
                .map(|t| add(&mut topo, core, &format!("thread@{t:x}"), "thread", Some(t), None))
                .collect();
            cores.push(core);
            core_hooks.push(counts);
            threads.push(per_core);
        }
        Self {
            topo,
            pib,
            scom,
            cores,
            core_hooks,
            threads,
        }
    }
}

/// Requests captured by a scripted session.
pub type Captured = Rc<RefCell<Vec<Vec<u8>>>>;

/// A session whose transport plays back `replies` in order and records requests.
pub fn scripted_session(replies: Vec<Vec<u8>>) -> (Session, Captured) {
    let captured = Captured::default();
    let log = Rc::clone(&captured);
    let mut replies = VecDeque::from(replies);
    let transport = CallbackTransport::new(move |request: &[u8], _capacity: usize| {
        log.borrow_mut().push(request.to_vec());
        replies
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted reply"))
    });
    let session = Session::with_transport(Box::new(transport), &SbefifoConfig::default());
    (session, captured)
}

/// A successful reply to `command` carrying `payload`.
pub fn ok_reply(command: u32, payload: &[u8]) -> Vec<u8> {
    build_reply(command, payload, SbeStatus::SUCCESS, &[])
}

/// Splits bytes into big-endian words.
pub fn words(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
