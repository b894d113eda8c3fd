//! POWER target debug CLI.
//!
//! This binary is a thin operator front end over `powerdbg-core`. It performs:
//! 1. **Load:** Reads the topology description and optional tunables, binds drivers, probes both trees.
//! 2. **Inspect:** Prints every target with its class and probe status, as text or JSON.
//! 3. **Access:** SCOM and memory reads and writes on one target, or on every member of a class.
//! 4. **SBE:** isteps, MPIPL, FFDC collection and capability reports over the nearest SBE FIFO.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use powerdbg_core::{Config, DriverRegistry, Error, Result, TargetId, Topology, TopologyConfig};

#[derive(Parser, Debug)]
#[command(
    name = "powerdbg",
    author,
    version,
    about = "Probe and access POWER processor targets",
    long_about = "Load a topology description, probe it, and issue SCOM, memory and SBE operations.\n\nTargets are paths into the system tree (falling back to the backend tree), or a bare class name to act on every enabled member of that class.\n\nExamples:\n  powerdbg -t p9.json probe\n  powerdbg -t p9.json getscom /proc0/core0 0xf0040\n  powerdbg -t p9.json getscom core 0x20010a9c\n  powerdbg -t p9.json istep /proc0 4 1"
)]
struct Cli {
    /// Topology description (JSON).
    #[arg(short, long)]
    topology: PathBuf,

    /// Tunables (JSON). Built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Probe every target and print the tree.
    Probe {
        /// Print a JSON array instead of an indented tree.
        #[arg(long)]
        json: bool,
    },

    /// Read a SCOM register.
    Getscom {
        /// Target path or class name.
        target: String,
        /// SCOM address.
        #[arg(value_parser = parse_u64)]
        addr: u64,
    },

    /// Write a SCOM register.
    Putscom {
        /// Target path or class name.
        target: String,
        /// SCOM address.
        #[arg(value_parser = parse_u64)]
        addr: u64,
        /// Value to write.
        #[arg(value_parser = parse_u64)]
        value: u64,
        /// Only replace the bits set in this mask.
        #[arg(long, value_parser = parse_u64)]
        mask: Option<u64>,
    },

    /// Read memory and print a hex dump.
    Getmem {
        /// Target path.
        target: String,
        /// Start address.
        #[arg(value_parser = parse_u64)]
        addr: u64,
        /// Number of bytes.
        #[arg(value_parser = parse_u64)]
        len: u64,
    },

    /// Write memory from a hex string.
    Putmem {
        /// Target path.
        target: String,
        /// Start address.
        #[arg(value_parser = parse_u64)]
        addr: u64,
        /// Bytes as hex digits, e.g. `deadbeef`.
        #[arg(value_parser = parse_hex_bytes)]
        data: HexBytes,
    },

    /// Execute one istep on the SBE.
    Istep {
        /// Target path.
        target: String,
        /// Major step.
        major: u8,
        /// Minor step.
        minor: u8,
    },

    /// Enter or continue a memory-preserving IPL.
    Mpipl {
        /// Target path.
        target: String,
        /// Phase to run.
        #[arg(value_enum)]
        phase: MpiplPhase,
    },

    /// Fetch FFDC from the SBE and print it.
    Ffdc {
        /// Target path.
        target: String,
    },

    /// Print the SBE firmware version and capability words.
    SbeCaps {
        /// Target path.
        target: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MpiplPhase {
    Enter,
    Continue,
}

/// Bytes parsed from a hex argument.
#[derive(Debug, Clone)]
struct HexBytes(Vec<u8>);

#[derive(Debug, Serialize)]
struct TargetReport {
    tree: &'static str,
    path: String,
    class: String,
    status: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let mut topo = load(&cli.topology, cli.config.as_deref())?;

    match cli.command {
        Commands::Probe { json } => report(&topo, json)?,
        Commands::Getscom { target, addr } => {
            for (path, value) in each_target(&mut topo, &target, |topo, id| topo.pib_read(id, addr))? {
                println!("{path}: {value:#018x}");
            }
        }
        Commands::Putscom {
            target,
            addr,
            value,
            mask,
        } => {
            let _ = each_target(&mut topo, &target, |topo, id| match mask {
                Some(mask) => topo.pib_write_mask(id, addr, value, mask),
                None => topo.pib_write(id, addr, value),
            })?;
        }
        Commands::Getmem { target, addr, len } => {
            let id = lookup(&topo, &target)?;
            let len = usize::try_from(len).map_err(|_| Error::invalid(format!("length {len} is too large")))?;
            let mut buf = vec![0u8; len];
            topo.mem_read(id, addr, &mut buf)?;
            hexdump(addr, &buf);
        }
        Commands::Putmem { target, addr, data } => {
            let id = lookup(&topo, &target)?;
            topo.mem_write(id, addr, &data.0)?;
        }
        Commands::Istep { target, major, minor } => {
            let id = lookup(&topo, &target)?;
            topo.sbe_istep(id, major, minor)?;
        }
        Commands::Mpipl { target, phase } => {
            let id = lookup(&topo, &target)?;
            match phase {
                MpiplPhase::Enter => topo.sbe_mpipl_enter(id)?,
                MpiplPhase::Continue => topo.sbe_mpipl_continue(id)?,
            }
        }
        Commands::Ffdc { target } => {
            let id = lookup(&topo, &target)?;
            let data = topo.sbe_get_ffdc(id)?;
            hexdump(0, &data);
        }
        Commands::SbeCaps { target } => {
            let id = lookup(&topo, &target)?;
            let caps = topo.sbe_capabilities(id)?;
            println!("version:  {}.{}", caps.major(), caps.minor());
            println!("commit:   {}", caps.commit_id);
            println!("release:  {}", caps.release_tag);
            for (i, word) in caps.capabilities.iter().enumerate() {
                println!("cap[{i:2}]:  {word:#010x}");
            }
        }
    }
    Ok(())
}

/// Builds and probes the topology.
fn load(topology: &Path, config: Option<&Path>) -> Result<Topology> {
    let config = config.map_or_else(|| Ok(Config::default()), Config::from_file)?;
    let desc = TopologyConfig::from_file(topology)?;
    let registry = DriverRegistry::for_generation(&config);
    info!(generation = %config.general.generation, ?registry, "building topology");

    let mut topo = Topology::from_config(config, &desc, &registry)?;
    let (backend, system) = (topo.backend_root(), topo.system_root());
    topo.probe_all(backend)?;
    topo.probe_all(system)?;
    Ok(topo)
}

/// Path in the system tree first, then the backend tree.
fn lookup(topo: &Topology, path: &str) -> Result<TargetId> {
    topo.find_by_path(topo.system_root(), path)
        .or_else(|_| topo.find_by_path(topo.backend_root(), path))
}

/// Runs `op` on one path, or on every enabled member of a class.
fn each_target<T>(
    topo: &mut Topology,
    target: &str,
    mut op: impl FnMut(&mut Topology, TargetId) -> Result<T>,
) -> Result<Vec<(String, T)>> {
    if target.starts_with('/') {
        let id = lookup(topo, target)?;
        let value = op(topo, id)?;
        return Ok(vec![(topo.path(id), value)]);
    }

    let system = topo.system_root();
    let mut out = Vec::new();
    for (id, result) in topo.sweep(target, Some(system), &mut op) {
        match result {
            Ok(value) => out.push((topo.path(id), value)),
            Err(Error::NotEnabled { path, status }) => debug!(%path, %status, "skipped"),
            Err(e) => eprintln!("{}: {e}", topo.path(id)),
        }
    }
    if out.is_empty() {
        return Err(Error::PathNotFound(format!("no enabled {target} targets")));
    }
    Ok(out)
}

fn report(topo: &Topology, json: bool) -> Result<()> {
    let mut rows = Vec::new();
    for (tree, root) in [("system", topo.system_root()), ("backend", topo.backend_root())] {
        collect(topo, tree, root, &mut rows);
    }

    if json {
        let text = serde_json::to_string_pretty(&rows).map_err(|e| Error::config(e.to_string()))?;
        println!("{text}");
        return Ok(());
    }
    for row in rows {
        let depth = row.path.matches('/').count().saturating_sub(1);
        let name = row.path.rsplit('/').next().unwrap_or_default();
        let name = if name.is_empty() { row.tree } else { name };
        println!("{:indent$}{name} [{}] {}", "", row.class, row.status, indent = depth * 2);
    }
    Ok(())
}

fn collect(topo: &Topology, tree: &'static str, id: TargetId, rows: &mut Vec<TargetReport>) {
    let target = topo.target(id);
    rows.push(TargetReport {
        tree,
        path: topo.path(id),
        class: target.class().to_owned(),
        status: target.status().to_string(),
    });
    for &child in target.children() {
        collect(topo, tree, child, rows);
    }
}

fn hexdump(base: u64, data: &[u8]) {
    for line in hexdump_lines(base, data) {
        println!("{line}");
    }
}

/// Sixteen bytes per line; addresses wrap past `u64::MAX`.
fn hexdump_lines(base: u64, data: &[u8]) -> Vec<String> {
    data.chunks(16)
        .enumerate()
        .map(|(i, line)| {
            let bytes: Vec<String> = line.iter().map(|b| format!("{b:02x}")).collect();
            let addr = base.wrapping_add((i as u64).wrapping_mul(16));
            format!("{addr:016x}: {}", bytes.join(" "))
        })
        .collect()
}

fn parse_u64(s: &str) -> std::result::Result<u64, String> {
    let digits = s.replace('_', "");
    let parsed = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => digits.parse(),
    };
    parsed.map_err(|e| format!("invalid number {s:?}: {e}"))
}

fn parse_hex_bytes(s: &str) -> std::result::Result<HexBytes, String> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits in {s:?}"));
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            digits
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| format!("invalid hex byte at offset {i} in {s:?}"))
        })
        .collect::<std::result::Result<Vec<u8>, String>>()
        .map(HexBytes)
}
