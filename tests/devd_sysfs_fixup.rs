// CLASSIFICATION: COMMUNITY
// Filename: devd_sysfs_fixup.rs v0.2
// Author: Cohesix Codex
// Date Modified: 2026-01-22

//! `/sys` rule application on add/change/online events.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use cohdevd::{DevdPaths, DeviceManager, Uevent};
use serial_test::serial;
use tempfile::tempdir;

fn scratch_manager(root: &Path) -> (DeviceManager, PathBuf) {
    let dev_root = root.join("dev");
    let sys_root = root.join("sys");
    fs::create_dir_all(&dev_root).unwrap();
    let mut paths = DevdPaths::default();
    paths.dev_root = dev_root.to_str().unwrap().to_string();
    paths.sys_prefix = sys_root.to_str().unwrap().to_string();
    paths.booting_sentinel = dev_root.join(".booting");
    paths.coldboot_done = dev_root.join(".coldboot_done");
    paths.modules_alias = root.join("modules.alias");
    paths.modules_blacklist = root.join("modules.blacklist");
    paths.firmware_dirs = vec![root.join("firmware")];
    (DeviceManager::new(paths), sys_root)
}

fn attr_mode(path: &Path) -> u32 {
    fs::metadata(path).unwrap().permissions().mode() & 0o777
}

#[test]
#[serial]
fn matching_rule_applies_mode_to_attribute() {
    let dir = tempdir().unwrap();
    let (mut mgr, sys_root) = scratch_manager(dir.path());

    let widget = sys_root.join("devices/widget0");
    fs::create_dir_all(&widget).unwrap();
    fs::write(widget.join("enable"), "0").unwrap();
    fs::set_permissions(widget.join("enable"), fs::Permissions::from_mode(0o644)).unwrap();

    mgr.load_rules("/sys/devices/widget0 enable 0664 root root\n").unwrap();
    mgr.fixup_sys_perms("/devices/widget0");

    assert_eq!(attr_mode(&widget.join("enable")), 0o664);
}

#[test]
#[serial]
fn change_and_online_actions_trigger_fixup() {
    let dir = tempdir().unwrap();
    let (mut mgr, sys_root) = scratch_manager(dir.path());

    let widget = sys_root.join("devices/widget0");
    fs::create_dir_all(&widget).unwrap();
    fs::write(widget.join("trigger"), "none").unwrap();
    fs::set_permissions(widget.join("trigger"), fs::Permissions::from_mode(0o600)).unwrap();

    mgr.load_rules("/sys/devices/widget* trigger 0666 root root\n").unwrap();

    mgr.handle_device_event(&Uevent {
        action: "change".into(),
        path: "/devices/widget0".into(),
        subsystem: "leds".into(),
        ..Default::default()
    });
    assert_eq!(attr_mode(&widget.join("trigger")), 0o666);

    fs::set_permissions(widget.join("trigger"), fs::Permissions::from_mode(0o600)).unwrap();
    mgr.handle_device_event(&Uevent {
        action: "online".into(),
        path: "/devices/widget0".into(),
        subsystem: "leds".into(),
        ..Default::default()
    });
    assert_eq!(attr_mode(&widget.join("trigger")), 0o666);

    // remove does not touch attributes
    fs::set_permissions(widget.join("trigger"), fs::Permissions::from_mode(0o600)).unwrap();
    mgr.handle_device_event(&Uevent {
        action: "remove".into(),
        path: "/devices/widget0".into(),
        subsystem: "leds".into(),
        ..Default::default()
    });
    assert_eq!(attr_mode(&widget.join("trigger")), 0o600);
}

#[test]
#[serial]
fn non_matching_rules_leave_attributes_alone() {
    let dir = tempdir().unwrap();
    let (mut mgr, sys_root) = scratch_manager(dir.path());

    let widget = sys_root.join("devices/widget0");
    fs::create_dir_all(&widget).unwrap();
    fs::write(widget.join("enable"), "0").unwrap();
    fs::set_permissions(widget.join("enable"), fs::Permissions::from_mode(0o644)).unwrap();

    mgr.load_rules("/sys/devices/other0 enable 0600 root root\n").unwrap();
    mgr.fixup_sys_perms("/devices/widget0");

    assert_eq!(attr_mode(&widget.join("enable")), 0o644);
}
