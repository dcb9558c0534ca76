// CLASSIFICATION: COMMUNITY
// Filename: dispatch.rs v0.4
// Author: Lukas Bower
// Date Modified: 2026-01-22

//! Top-level event classification.
//!
//! Every event first feeds module autoload (on `add`) and sysfs fixup (on
//! `add`/`change`/`online`), then routes by subsystem to the block,
//! platform, or generic handler.

use std::path::Path;

use log::{debug, error};

use crate::manager::DeviceManager;
use crate::uevent::Uevent;
use crate::util;

/// Longest devpath the generic and configured handlers will assemble.
const DEVPATH_LEN: usize = 96;

/// Where a configured subsystem takes its device name from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevnameSource {
    /// The uevent's `DEVNAME` value.
    UeventDevname,
    /// The basename of the uevent's devpath.
    UeventDevpath,
}

/// A `subsystem` section from a rules file.
#[derive(Debug, Clone)]
pub struct SubsystemConfig {
    pub name: String,
    /// Absent until the section's `devname` line is seen; events for the
    /// subsystem are dropped with an error until then.
    pub devname_src: Option<DevnameSource>,
    pub dirname: String,
}

impl DeviceManager {
    /// Process one parsed uevent to completion.
    pub fn handle_device_event(&mut self, ev: &Uevent) {
        if ev.action == "add" {
            self.handle_modalias(ev.modalias.as_deref());
        }

        if ev.action == "add" || ev.action == "change" || ev.action == "online" {
            self.fixup_sys_perms(&ev.path);
        }

        if ev.subsystem.starts_with("block") {
            self.handle_block_device_event(ev);
        } else if ev.subsystem.starts_with("platform") {
            self.handle_platform_device_event(ev);
        } else {
            self.handle_generic_device_event(ev);
        }
    }

    fn handle_platform_device_event(&mut self, ev: &Uevent) {
        if ev.action == "add" {
            self.platform.add(&ev.path);
        } else if ev.action == "remove" {
            self.platform.remove(&ev.path);
        }
    }

    fn handle_block_device_event(&self, ev: &Uevent) {
        let Some(name) = parse_device_name(ev, 64) else {
            return;
        };

        let devpath = format!("{}/block/{}", self.paths.dev_root, name);
        let _ = util::make_dir(format!("{}/block", self.paths.dev_root), 0o755);

        let links = if ev.path.starts_with("/devices/") {
            self.block_device_symlinks(ev).unwrap_or_default()
        } else {
            Vec::new()
        };

        self.handle_device(&ev.action, &devpath, true, ev.major, ev.minor, &links);
    }

    fn handle_generic_device_event(&self, ev: &Uevent) {
        let Some(name) = parse_device_name(ev, 64) else {
            return;
        };
        let mut name = name;
        let mut devpath = String::new();
        let mut base = String::new();

        if let Some(subsystem) = self.subsystems.iter().find(|s| s.name == ev.subsystem) {
            let devname = match subsystem.devname_src {
                Some(DevnameSource::UeventDevname) => match ev.device_name.as_deref() {
                    Some(devname) => devname,
                    None => {
                        error!("{} subsystem's DEVNAME is missing; ignoring event", ev.subsystem);
                        return;
                    }
                },
                Some(DevnameSource::UeventDevpath) => name,
                None => {
                    error!("{} subsystem's devpath option is not set; ignoring event", ev.subsystem);
                    return;
                }
            };
            devpath = match assemble_devpath(&subsystem.dirname, devname) {
                Some(p) => p,
                None => return,
            };
            mkdir_for_devpath(&devpath);
        } else if ev.subsystem.starts_with("usb") {
            if ev.subsystem == "usb" || ev.subsystem == "usbmisc" {
                if let Some(devname) = ev.device_name.as_deref() {
                    devpath = match assemble_devpath(&self.paths.dev_root, devname) {
                        Some(p) => p,
                        None => return,
                    };
                    mkdir_for_devpath(&devpath);
                } else {
                    // mimic the devfs layout: minors in groups of 128,
                    // numbered from 001
                    let bus_id = ev.minor / 128 + 1;
                    let device_id = ev.minor % 128 + 1;
                    let _ = util::make_dir(format!("{}/bus", self.paths.dev_root), 0o755);
                    let _ = util::make_dir(format!("{}/bus/usb", self.paths.dev_root), 0o755);
                    let busdir = format!("{}/bus/usb/{:03}", self.paths.dev_root, bus_id);
                    let _ = util::make_dir(&busdir, 0o755);
                    devpath = format!("{}/{:03}", busdir, device_id);
                }
            } else {
                // ignore other USB events
                return;
            }
        } else {
            let dir = if ev.subsystem.starts_with("graphics") {
                "/graphics/"
            } else if ev.subsystem.starts_with("drm") {
                "/dri/"
            } else if ev.subsystem.starts_with("oncrpc") {
                "/oncrpc/"
            } else if ev.subsystem.starts_with("adsp") {
                "/adsp/"
            } else if ev.subsystem.starts_with("msm_camera") {
                "/msm_camera/"
            } else if ev.subsystem.starts_with("input") {
                "/input/"
            } else if ev.subsystem.starts_with("mtd") {
                "/mtd/"
            } else if ev.subsystem.starts_with("sound") {
                "/snd/"
            } else if ev.subsystem.starts_with("misc") && name.starts_with("log_") {
                debug!("kernel logger is deprecated");
                name = &name["log_".len()..];
                "/log/"
            } else {
                "/"
            };
            base = format!("{}{}", self.paths.dev_root, dir);
            if dir != "/" {
                let _ = util::make_dir(&base, 0o755);
            }
        }

        let links = self.character_device_symlinks(ev);

        if devpath.is_empty() {
            devpath = format!("{}{}", base, name);
        }

        self.handle_device(&ev.action, &devpath, false, ev.major, ev.minor, &links);
    }
}

/// Basename of the devpath, for events that describe a `/dev` node at all.
fn parse_device_name<'e>(ev: &'e Uevent, max_len: usize) -> Option<&'e str> {
    // not a /dev device
    if ev.major < 0 || ev.minor < 0 {
        return None;
    }

    let name = &ev.path[ev.path.rfind('/')? + 1..];

    if name.len() > max_len {
        error!(
            "DEVPATH={} exceeds {}-character limit on filename; ignoring event",
            name, max_len
        );
        return None;
    }

    Some(name)
}

fn assemble_devpath(dirname: &str, devname: &str) -> Option<String> {
    let devpath = format!("{}/{}", dirname, devname);
    if devpath.len() >= DEVPATH_LEN {
        error!(
            "{}/{} exceeds {}-character limit on path; ignoring event",
            dirname, devname, DEVPATH_LEN
        );
        return None;
    }
    Some(devpath)
}

fn mkdir_for_devpath(devpath: &str) {
    if let Some(parent) = Path::new(devpath).parent() {
        let _ = util::mkdir_recursive(parent, 0o755);
    }
}
