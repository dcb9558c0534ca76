// CLASSIFICATION: COMMUNITY
// Filename: node.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-01-22

//! Device node creation and removal.

use std::ffi::CString;
use std::fs;
use std::io;
use std::os::unix::fs as unix_fs;
use std::path::Path;

use log::{debug, error};

use crate::manager::DeviceManager;
use crate::util;

impl DeviceManager {
    /// Apply one add/remove action to a device node and its symlinks.
    pub(crate) fn handle_device(
        &self,
        action: &str,
        devpath: &str,
        is_block: bool,
        major: i32,
        minor: i32,
        links: &[String],
    ) {
        if action == "add" {
            self.make_device(devpath, is_block, major, minor, links);
            for link in links {
                self.make_link(devpath, link);
            }
        }

        if action == "remove" {
            for link in links {
                self.remove_link(devpath, link);
            }
            let _ = fs::remove_file(devpath);
        }
    }

    fn make_device(&self, path: &str, is_block: bool, major: i32, minor: i32, links: &[String]) {
        let (perm, uid, gid) = self.perms.resolve_dev(path, links);
        let mode = perm | if is_block { libc::S_IFBLK } else { libc::S_IFCHR };

        let label = match self.labels.lookup_best_match(path, links, mode) {
            Ok(label) => label,
            Err(e) => {
                error!("Device '{}' not created; cannot find security label ({})", path, e);
                return;
            }
        };
        let Ok(cpath) = CString::new(path) else {
            return;
        };
        if let Some(ctx) = label.as_deref() {
            self.labels.set_fscreate(Some(ctx));
        }
        let dev = libc::makedev(major as libc::c_uint, minor as libc::c_uint);

        // Temporarily switch egid so the node is never visible with the
        // default group. The uid window remains: changing euid would prevent
        // creation of some nodes, so the owner is fixed with chown below.
        // The umask must not strip mode bits from the node.
        let saved_umask = unsafe { libc::umask(0) };
        unsafe {
            libc::setegid(gid);
        }
        let rc = unsafe { libc::mknod(cpath.as_ptr(), mode, dev) };
        if rc != 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EEXIST) {
                // coldboot may have created the node under a provisional
                // context; re-stamp it in place
                if let Some(ctx) = label.as_deref() {
                    if let Err(e) = self.labels.set_file_label(path, ctx) {
                        error!(
                            "Cannot set '{}' security label on '{}' device ({})",
                            ctx, path, e
                        );
                    }
                }
            } else {
                error!("mknod '{}' failed: {}", path, err);
            }
        }
        unsafe {
            libc::chown(cpath.as_ptr(), uid, u32::MAX);
            libc::setegid(0);
            libc::umask(saved_umask);
        }

        self.labels.set_fscreate(None);
    }

    fn make_link(&self, devpath: &str, link: &str) {
        if let Some(parent) = Path::new(link).parent() {
            if let Err(e) = util::mkdir_recursive(parent, 0o755) {
                error!("failed to create directory {}: {}", parent.display(), e);
            }
        }
        match unix_fs::symlink(devpath, link) {
            Ok(()) => debug!("created symlink {} -> {}", link, devpath),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => error!("failed to symlink {} -> {}: {}", link, devpath, e),
        }
    }

    fn remove_link(&self, devpath: &str, link: &str) {
        if let Ok(target) = fs::read_link(link) {
            if target == Path::new(devpath) {
                let _ = fs::remove_file(link);
            }
        }
    }
}
