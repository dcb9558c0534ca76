// CLASSIFICATION: COMMUNITY
// Filename: cohprobe.rs v0.2
// Author: Lukas Bower
// Date Modified: 2025-12-05

//! modprobe-compatible module loader entry.
//!
//! Installed as `/proc/sys/kernel/modprobe` so the kernel can request
//! module loads directly: `cohprobe [-q] [--] <modalias-or-module>
//! [options...]`.

use cohdevd::{DevdPaths, DeviceManager};

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut mgr = DeviceManager::new(DevdPaths::default());
    let ret = mgr.modprobe_main(&args);

    std::process::exit(if ret == 0 { 0 } else { 1 });
}
