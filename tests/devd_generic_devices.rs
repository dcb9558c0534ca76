// CLASSIFICATION: COMMUNITY
// Filename: devd_generic_devices.rs v0.2
// Author: Cohesix Codex
// Date Modified: 2026-01-22

//! Generic character device handling: the subsystem directory table, USB
//! bus/device derivation, configured subsystems, and platform USB symlinks.

use std::fs;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use cohdevd::{DevdPaths, DeviceManager, Uevent};
use serial_test::serial;
use tempfile::tempdir;

fn scratch_manager(root: &Path) -> (DeviceManager, PathBuf) {
    let dev_root = root.join("dev");
    fs::create_dir_all(&dev_root).unwrap();
    let mut paths = DevdPaths::default();
    paths.dev_root = dev_root.to_str().unwrap().to_string();
    paths.sys_prefix = root.join("sys").to_str().unwrap().to_string();
    paths.booting_sentinel = dev_root.join(".booting");
    paths.coldboot_done = dev_root.join(".coldboot_done");
    paths.modules_alias = root.join("modules.alias");
    paths.modules_blacklist = root.join("modules.blacklist");
    paths.firmware_dirs = vec![root.join("firmware")];
    (DeviceManager::new(paths), dev_root)
}

fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[test]
#[serial]
fn usb_without_devname_derives_bus_and_device() {
    if !is_root() {
        eprintln!("Skipping usb_without_devname_derives_bus_and_device: requires root");
        return;
    }
    let dir = tempdir().unwrap();
    let (mut mgr, dev_root) = scratch_manager(dir.path());

    mgr.handle_device_event(&Uevent {
        action: "add".into(),
        path: "/devices/pci0000:00/0000:00:14.0/usb2/2-1".into(),
        subsystem: "usb".into(),
        major: 189,
        minor: 130,
        ..Default::default()
    });

    // minor 130: bus 130/128+1 = 2, device 130%128+1 = 3
    let node = dev_root.join("bus/usb/002/003");
    let meta = fs::symlink_metadata(&node).expect("usb node created");
    assert!(meta.file_type().is_char_device());
}

#[test]
#[serial]
fn usb_with_devname_lands_under_dev() {
    if !is_root() {
        eprintln!("Skipping usb_with_devname_lands_under_dev: requires root");
        return;
    }
    let dir = tempdir().unwrap();
    let (mut mgr, dev_root) = scratch_manager(dir.path());

    mgr.handle_device_event(&Uevent {
        action: "add".into(),
        path: "/devices/pci0000:00/0000:00:14.0/usb2/2-1/hiddev0".into(),
        subsystem: "usbmisc".into(),
        device_name: Some("usb/hiddev0".into()),
        major: 180,
        minor: 96,
        ..Default::default()
    });

    assert!(dev_root.join("usb/hiddev0").exists());
}

#[test]
#[serial]
fn subsystem_table_routes_well_known_directories() {
    if !is_root() {
        eprintln!("Skipping subsystem_table_routes_well_known_directories: requires root");
        return;
    }
    let dir = tempdir().unwrap();
    let (mut mgr, dev_root) = scratch_manager(dir.path());

    for (subsystem, path, expected) in [
        ("input", "/devices/platform/gpio-keys/input/input0/event0", "input/event0"),
        ("sound", "/devices/platform/snd/pcmC0D0p", "snd/pcmC0D0p"),
        ("graphics", "/devices/virtual/graphics/fb0", "graphics/fb0"),
        ("drm", "/devices/virtual/drm/card0", "dri/card0"),
        ("mtd", "/devices/virtual/mtd/mtd3", "mtd/mtd3"),
        ("misc", "/devices/virtual/misc/log_main", "log/main"),
        ("rtc", "/devices/virtual/rtc/rtc0", "rtc0"),
    ] {
        mgr.handle_device_event(&Uevent {
            action: "add".into(),
            path: path.into(),
            subsystem: subsystem.into(),
            major: 10,
            minor: 60,
            ..Default::default()
        });
        assert!(
            dev_root.join(expected).exists(),
            "{subsystem} node at {expected}"
        );
    }
}

#[test]
#[serial]
fn configured_subsystem_uses_devname_and_dirname() {
    if !is_root() {
        eprintln!("Skipping configured_subsystem_uses_devname_and_dirname: requires root");
        return;
    }
    let dir = tempdir().unwrap();
    let (mut mgr, dev_root) = scratch_manager(dir.path());

    mgr.load_rules(&format!(
        "subsystem adf\ndevname uevent_devname\ndirname {}/adf\n",
        dev_root.display()
    ))
    .unwrap();

    mgr.handle_device_event(&Uevent {
        action: "add".into(),
        path: "/devices/virtual/adf/adf0".into(),
        subsystem: "adf".into(),
        device_name: Some("adf0".into()),
        major: 250,
        minor: 0,
        ..Default::default()
    });

    assert!(dev_root.join("adf/adf0").exists());
}

#[test]
#[serial]
fn platform_usb_interface_gets_stable_symlink() {
    if !is_root() {
        eprintln!("Skipping platform_usb_interface_gets_stable_symlink: requires root");
        return;
    }
    let dir = tempdir().unwrap();
    let (mut mgr, dev_root) = scratch_manager(dir.path());

    mgr.handle_device_event(&Uevent {
        action: "add".into(),
        path: "/devices/platform/msm_hsusb_host".into(),
        subsystem: "platform".into(),
        ..Default::default()
    });
    mgr.handle_device_event(&Uevent {
        action: "add".into(),
        path: "/devices/platform/msm_hsusb_host/usb1/1-1/1-1:1.0/ttyUSB0".into(),
        subsystem: "tty".into(),
        major: 188,
        minor: 0,
        ..Default::default()
    });

    let node = dev_root.join("ttyUSB0");
    assert!(node.exists());
    let link = dev_root.join("usb/tty1-1:1.0");
    assert_eq!(fs::read_link(&link).unwrap(), node);
}
