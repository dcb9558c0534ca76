// CLASSIFICATION: COMMUNITY
// Filename: main.rs v0.3
// Date Modified: 2026-01-22
// Author: Lukas Bower

//! Entry point for the cohdevd daemon.
//!
//! Two consumers share the uevent multicast: the main loop runs the full
//! device pipeline; a firmware thread with its own socket services firmware
//! requests so 100 ms retry sleeps and blob copies never stall device
//! events.

use std::path::PathBuf;
use std::thread;

use anyhow::Context;
use clap::Parser;
use log::{error, warn};

use cohdevd::netlink::UeventSocket;
use cohdevd::{DevdPaths, DeviceManager};

#[derive(Debug, Parser)]
#[command(name = "cohdevd", about = "Cohesix early-boot device manager")]
struct Cli {
    /// Device rules files, applied in order; later files win on conflict
    #[arg(long = "rules")]
    rules: Vec<PathBuf>,

    /// Netlink receive buffer size in bytes
    #[arg(long, default_value_t = 8 * 1024 * 1024)]
    socket_buffer: usize,

    /// Skip the coldboot walk even without a completion sentinel
    #[arg(long)]
    no_coldboot: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let fw_paths = DevdPaths::default();
    let fw_buffer = cli.socket_buffer;
    thread::spawn(move || {
        if let Err(e) = firmware_loop(fw_paths, fw_buffer) {
            error!("firmware consumer exited: {e:#}");
        }
    });

    let mut mgr = DeviceManager::new(DevdPaths::default());
    for path in &cli.rules {
        if let Err(e) = mgr.load_rules_file(path) {
            warn!("skipping rules file {}: {}", path.display(), e);
        }
    }

    let mut sock = UeventSocket::open(cli.socket_buffer).context("open uevent socket")?;

    if !cli.no_coldboot {
        mgr.coldboot_init(Some(&mut sock));
    }

    loop {
        sock.wait_readable()?;
        mgr.handle_socket_events(&mut sock, false);
    }
}

fn firmware_loop(paths: DevdPaths, buffer: usize) -> anyhow::Result<()> {
    let mut mgr = DeviceManager::new(paths);
    let mut sock = UeventSocket::open(buffer).context("open uevent socket")?;
    loop {
        sock.wait_readable()?;
        mgr.handle_socket_events(&mut sock, true);
    }
}
