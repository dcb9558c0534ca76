// CLASSIFICATION: COMMUNITY
// Filename: manager.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-01-22

//! The `DeviceManager` and its filesystem roots.
//!
//! Everything the hotplug pipeline mutates (the platform registry, the
//! permission tables, module state, the deferred queue, the label handle)
//! hangs off one `DeviceManager` value. Tests build isolated managers whose
//! `DevdPaths` point into scratch trees.

use std::collections::VecDeque;
use std::env;
use std::io;
use std::path::PathBuf;

use log::debug;

use crate::dispatch::SubsystemConfig;
use crate::label::{LabelBackend, NullLabels};
use crate::modules::{HelperInserter, ModuleAlias, ModuleBlacklistEntry, ModuleInserter};
use crate::netlink::UeventSocket;
use crate::perms::PermissionStore;
use crate::platform::{PlatformNode, PlatformRegistry};
use crate::uevent::Uevent;

/// Largest uevent datagram we accept; anything that fills the buffer is
/// discarded whole.
pub const UEVENT_MSG_LEN: usize = 2048;

/// Filesystem roots and well-known paths.
///
/// Defaults point at the live system; `COH_DEV_ROOT` and `COH_SYS_ROOT`
/// override the two roots the way other Cohesix services honor them.
#[derive(Debug, Clone)]
pub struct DevdPaths {
    /// Device hierarchy root, normally `/dev`. No trailing slash.
    pub dev_root: String,
    /// Prefix prepended to uevent devpaths, normally `/sys`. No trailing slash.
    pub sys_prefix: String,
    /// Firmware search path, highest priority first.
    pub firmware_dirs: Vec<PathBuf>,
    /// `modules.alias` location.
    pub modules_alias: PathBuf,
    /// Module blacklist location.
    pub modules_blacklist: PathBuf,
    /// Present while the system is still booting.
    pub booting_sentinel: PathBuf,
    /// Created when the coldboot walk completes.
    pub coldboot_done: PathBuf,
}

impl Default for DevdPaths {
    fn default() -> Self {
        let dev_root = env::var("COH_DEV_ROOT").unwrap_or_else(|_| "/dev".into());
        let sys_prefix = env::var("COH_SYS_ROOT").unwrap_or_else(|_| "/sys".into());
        DevdPaths {
            booting_sentinel: PathBuf::from(format!("{dev_root}/.booting")),
            coldboot_done: PathBuf::from(format!("{dev_root}/.coldboot_done")),
            dev_root,
            sys_prefix,
            firmware_dirs: default_firmware_dirs(),
            modules_alias: PathBuf::from("/system/lib/modules/modules.alias"),
            modules_blacklist: PathBuf::from("/system/etc/modules.blacklist"),
        }
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn default_firmware_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("/system/lib/firmware")]
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn default_firmware_dirs() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/etc/firmware"),
        PathBuf::from("/vendor/firmware"),
        PathBuf::from("/firmware/image"),
    ]
}

/// Process-scoped hotplug state and the handlers operating on it.
pub struct DeviceManager {
    pub paths: DevdPaths,
    pub platform: PlatformRegistry,
    pub perms: PermissionStore,
    pub subsystems: Vec<SubsystemConfig>,
    pub(crate) aliases: Vec<ModuleAlias>,
    pub(crate) blacklist: Vec<ModuleBlacklistEntry>,
    pub(crate) deferred: VecDeque<String>,
    pub(crate) labels: Box<dyn LabelBackend>,
    pub(crate) inserter: Box<dyn ModuleInserter>,
}

impl DeviceManager {
    /// Manager with the default collaborators: no label database, module
    /// insertion via the platform helper.
    pub fn new(paths: DevdPaths) -> Self {
        Self::with_collaborators(
            paths,
            Box::new(NullLabels),
            Box::new(HelperInserter::default()),
        )
    }

    /// Manager with explicit label and module-insertion backends.
    pub fn with_collaborators(
        paths: DevdPaths,
        labels: Box<dyn LabelBackend>,
        inserter: Box<dyn ModuleInserter>,
    ) -> Self {
        DeviceManager {
            paths,
            platform: PlatformRegistry::default(),
            perms: PermissionStore::default(),
            subsystems: Vec::new(),
            aliases: Vec::new(),
            blacklist: Vec::new(),
            deferred: VecDeque::new(),
            labels,
            inserter,
        }
    }

    /// Whether the boot sentinel is still present.
    pub fn is_booting(&self) -> bool {
        self.paths.booting_sentinel.exists()
    }

    /// External-tokenizer entry point: append one permission rule.
    ///
    /// `prefix` and `wildcard` select the match kind; an attribute routes
    /// the rule to the `/sys` table.
    pub fn add_dev_perms(
        &mut self,
        name: &str,
        attribute: Option<&str>,
        mode: u32,
        uid: u32,
        gid: u32,
        prefix: bool,
        wildcard: bool,
    ) {
        let kind = if prefix {
            crate::perms::MatchKind::Prefix
        } else if wildcard {
            crate::perms::MatchKind::Glob
        } else {
            crate::perms::MatchKind::Exact
        };
        self.perms.add(name, attribute, mode, uid, gid, kind);
    }

    /// Longest-matching platform device for a devpath, if any.
    pub fn find_platform_device(&self, path: &str) -> Option<&PlatformNode> {
        self.platform.find(path)
    }

    /// Drain every pending datagram from the socket and process it.
    ///
    /// `firmware_only` is the firmware-consumer role: it services firmware
    /// `add` requests and nothing else, so firmware copies never stall the
    /// device pipeline running in the other consumer.
    pub fn handle_socket_events(&mut self, sock: &mut UeventSocket, firmware_only: bool) {
        let mut buf = [0u8; UEVENT_MSG_LEN];
        loop {
            let n = match sock.recv_multicast(&mut buf) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    debug!("uevent recv failed: {}", e);
                    break;
                }
            };
            if n >= UEVENT_MSG_LEN {
                // overflow -- discard
                continue;
            }
            let ev = Uevent::parse(&buf[..n]);

            self.labels.refresh();

            if firmware_only {
                self.handle_firmware_event(&ev);
            } else {
                self.handle_device_event(&ev);
            }
        }
    }
}
