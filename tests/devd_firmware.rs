// CLASSIFICATION: COMMUNITY
// Filename: devd_firmware.rs v0.2
// Author: Cohesix Codex
// Date Modified: 2026-01-22

//! Firmware servicing: the loading/data protocol, search-path priority,
//! and the retry-while-booting loop.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use cohdevd::{DevdPaths, DeviceManager, Uevent};
use serial_test::serial;
use tempfile::tempdir;

fn scratch_manager(root: &Path) -> (DeviceManager, PathBuf, PathBuf) {
    let dev_root = root.join("dev");
    let fw_dir = root.join("firmware");
    fs::create_dir_all(&dev_root).unwrap();
    fs::create_dir_all(&fw_dir).unwrap();
    let mut paths = DevdPaths::default();
    paths.dev_root = dev_root.to_str().unwrap().to_string();
    paths.sys_prefix = root.join("sys").to_str().unwrap().to_string();
    paths.booting_sentinel = dev_root.join(".booting");
    paths.coldboot_done = dev_root.join(".coldboot_done");
    paths.modules_alias = root.join("modules.alias");
    paths.modules_blacklist = root.join("modules.blacklist");
    paths.firmware_dirs = vec![root.join("vendor-firmware"), fw_dir.clone()];
    (DeviceManager::new(paths), dev_root, fw_dir)
}

fn firmware_request(root: &Path) -> Uevent {
    let sysdir = root.join("sys/class/firmware/wlan");
    fs::create_dir_all(&sysdir).unwrap();
    fs::File::create(sysdir.join("loading")).unwrap();
    fs::File::create(sysdir.join("data")).unwrap();
    Uevent {
        action: "add".into(),
        path: "/class/firmware/wlan".into(),
        subsystem: "firmware".into(),
        firmware: "wlan.bin".into(),
        ..Default::default()
    }
}

#[test]
#[serial]
fn found_firmware_is_copied_and_committed() {
    let dir = tempdir().unwrap();
    let (mgr, _dev_root, fw_dir) = scratch_manager(dir.path());
    let ev = firmware_request(dir.path());

    fs::write(fw_dir.join("wlan.bin"), b"firmware-bytes").unwrap();
    mgr.handle_firmware_event(&ev);

    let sysdir = dir.path().join("sys/class/firmware/wlan");
    assert_eq!(fs::read(sysdir.join("data")).unwrap(), b"firmware-bytes");
    // "1" opened the transfer, "0" committed it
    assert_eq!(fs::read_to_string(sysdir.join("loading")).unwrap(), "10");
}

#[test]
#[serial]
fn earlier_search_directory_wins() {
    let dir = tempdir().unwrap();
    let (mgr, _dev_root, fw_dir) = scratch_manager(dir.path());
    let ev = firmware_request(dir.path());

    let vendor = dir.path().join("vendor-firmware");
    fs::create_dir_all(&vendor).unwrap();
    fs::write(vendor.join("wlan.bin"), b"vendor").unwrap();
    fs::write(fw_dir.join("wlan.bin"), b"system").unwrap();

    mgr.handle_firmware_event(&ev);

    let sysdir = dir.path().join("sys/class/firmware/wlan");
    assert_eq!(fs::read(sysdir.join("data")).unwrap(), b"vendor");
}

#[test]
#[serial]
fn missing_firmware_after_boot_aborts_once() {
    let dir = tempdir().unwrap();
    let (mgr, _dev_root, _fw_dir) = scratch_manager(dir.path());
    let ev = firmware_request(dir.path());

    mgr.handle_firmware_event(&ev);

    let sysdir = dir.path().join("sys/class/firmware/wlan");
    assert_eq!(fs::read_to_string(sysdir.join("loading")).unwrap(), "-1");
    assert_eq!(fs::read(sysdir.join("data")).unwrap(), b"");
}

#[test]
#[serial]
fn booting_request_retries_until_firmware_appears() {
    let dir = tempdir().unwrap();
    let (mgr, dev_root, fw_dir) = scratch_manager(dir.path());
    let ev = firmware_request(dir.path());

    fs::write(dev_root.join(".booting"), "").unwrap();

    let handler = thread::spawn(move || mgr.handle_firmware_event(&ev));

    // let it spin on the 100 ms retry loop before the blob lands
    thread::sleep(Duration::from_millis(350));
    fs::write(fw_dir.join("wlan.bin"), b"late-firmware").unwrap();
    handler.join().unwrap();

    let sysdir = dir.path().join("sys/class/firmware/wlan");
    assert_eq!(fs::read(sysdir.join("data")).unwrap(), b"late-firmware");
    assert_eq!(fs::read_to_string(sysdir.join("loading")).unwrap(), "10");
}

#[test]
#[serial]
fn non_firmware_events_are_ignored() {
    let dir = tempdir().unwrap();
    let (mgr, _dev_root, fw_dir) = scratch_manager(dir.path());
    let ev = firmware_request(dir.path());
    fs::write(fw_dir.join("wlan.bin"), b"firmware-bytes").unwrap();

    mgr.handle_firmware_event(&Uevent {
        action: "remove".into(),
        ..ev.clone()
    });
    mgr.handle_firmware_event(&Uevent {
        subsystem: "block".into(),
        ..ev
    });

    let sysdir = dir.path().join("sys/class/firmware/wlan");
    assert_eq!(fs::read_to_string(sysdir.join("loading")).unwrap(), "");
    assert_eq!(fs::read(sysdir.join("data")).unwrap(), b"");
}
