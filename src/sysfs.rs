// CLASSIFICATION: COMMUNITY
// Filename: sysfs.rs v0.2
// Author: Lukas Bower
// Date Modified: 2025-12-19

//! `/sys` attribute permission fixups and label restoration.

use std::ffi::CString;
use std::path::Path;

use log::debug;

use crate::manager::DeviceManager;
use crate::perms::{glob_match, MatchKind};

// fixed cap on assembled fixup paths
const FIXUP_PATH_MAX: usize = 512;

impl DeviceManager {
    /// Apply every matching `/sys` rule to the event path, then restore
    /// labels below it. Best-effort throughout.
    ///
    /// Uevent paths omit the `/sys` prefix the rule patterns carry, so
    /// patterns are compared with their first four bytes stripped.
    pub fn fixup_sys_perms(&self, upath: &str) {
        for rule in self.perms.iter_sys() {
            let pattern = rule.pattern.strip_prefix("/sys").unwrap_or(&rule.pattern);
            let matched = match rule.kind {
                MatchKind::Prefix => upath.starts_with(pattern),
                MatchKind::Glob => glob_match(pattern, upath, true),
                MatchKind::Exact => upath == pattern,
            };
            if !matched {
                continue;
            }

            let attr = rule.attribute.as_deref().unwrap_or("");
            if upath.len() + attr.len() + 6 > FIXUP_PATH_MAX {
                break;
            }

            let target = format!("{}{}/{}", self.paths.sys_prefix, upath, attr);
            debug!("fixup {} {} {} 0{:o}", target, rule.uid, rule.gid, rule.mode);
            if let Ok(ctarget) = CString::new(target) {
                unsafe {
                    if libc::chown(ctarget.as_ptr(), rule.uid, rule.gid) != 0 {
                        debug!("fixup chown failed: {}", std::io::Error::last_os_error());
                    }
                    if libc::chmod(ctarget.as_ptr(), rule.mode) != 0 {
                        debug!("fixup chmod failed: {}", std::io::Error::last_os_error());
                    }
                }
            }
        }

        let dir = format!("{}{}", self.paths.sys_prefix, upath);
        if Path::new(&dir).exists() {
            debug!("restorecon_recursive: {}", dir);
            self.labels.restorecon_recursive(Path::new(&dir));
        }
    }
}
