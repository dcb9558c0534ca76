// CLASSIFICATION: COMMUNITY
// Filename: links.rs v0.2
// Author: Lukas Bower
// Date Modified: 2025-12-19

//! Stable symlink derivation.
//!
//! Block devices get `/dev/block/<platform|pci>/<device>/...` symlinks keyed
//! on bus topology and partition identity; platform-rooted USB character
//! devices get `/dev/usb/<subsystem><interface>`.

use log::{debug, info};

use crate::manager::DeviceManager;
use crate::uevent::Uevent;
use crate::util;

/// Replace anything outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_partition_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Extract the PCI prefix `pci<domain:bus>/<BDF>` from a devpath, the first
/// two `/`-terminated segments after `/devices/`.
pub fn find_pci_device_prefix(path: &str) -> Option<String> {
    if !path.starts_with("/devices/pci") {
        return None;
    }
    let start = &path["/devices/".len()..];
    let first = start.find('/')?;
    let second = start[first + 1..].find('/')? + first + 1;
    Some(start[..second].to_string())
}

impl DeviceManager {
    /// Symlink set for a block device, or `None` when the event hangs under
    /// neither a known platform device nor a PCI root.
    pub fn block_device_symlinks(&self, ev: &Uevent) -> Option<Vec<String>> {
        let (device, bus_type) = if let Some(pdev) = self.platform.find(&ev.path) {
            (pdev.name.clone(), "platform")
        } else if let Some(prefix) = find_pci_device_prefix(&ev.path) {
            (prefix, "pci")
        } else {
            return None;
        };

        debug!("found {} device {}", bus_type, device);
        let link_path = format!("{}/block/{}/{}", self.paths.dev_root, bus_type, device);
        let mut links = Vec::with_capacity(3);

        if let Some(partition_name) = &ev.partition_name {
            let clean = sanitize_partition_name(partition_name);
            if clean != *partition_name {
                info!("Linking partition '{}' as '{}'", partition_name, clean);
            }
            links.push(format!("{}/by-name/{}", link_path, clean));
        }

        if ev.partition_num >= 0 {
            links.push(format!("{}/by-num/p{}", link_path, ev.partition_num));
        }

        let base = &ev.path[ev.path.rfind('/').map_or(0, |i| i + 1)..];
        links.push(format!("{}/{}", link_path, base));

        Some(links)
    }

    /// Symlink set for a character device: platform-rooted USB interfaces
    /// only. Ensures `<dev>/usb` exists when a link is emitted.
    pub fn character_device_symlinks(&self, ev: &Uevent) -> Vec<String> {
        let Some(pdev) = self.platform.find(&ev.path) else {
            return Vec::new();
        };

        // segment after the platform prefix, beginning with '/'
        let rest = &ev.path[pdev.path.len()..];
        if !rest.starts_with("/usb") {
            return Vec::new();
        }

        // skip root hub and device, take the interface; the interface
        // segment must itself be followed by '/'
        let parts: Vec<&str> = rest[1..].split('/').collect();
        if parts.len() < 4 {
            return Vec::new();
        }
        let interface = parts[2];
        if interface.is_empty() {
            return Vec::new();
        }

        let link = format!("{}/usb/{}{}", self.paths.dev_root, ev.subsystem, interface);
        let _ = util::make_dir(format!("{}/usb", self.paths.dev_root), 0o755);
        vec![link]
    }
}
