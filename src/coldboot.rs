// CLASSIFICATION: COMMUNITY
// Filename: coldboot.rs v0.2
// Author: Lukas Bower
// Date Modified: 2025-12-19

//! Coldboot walk.
//!
//! Devices discovered before the manager started never produced netlink
//! traffic, so the walk pokes `add` into every `uevent` file under the
//! `/sys` roots, regenerating the historical event stream. The socket is
//! drained after every poke; the burst would otherwise overrun the kernel's
//! netlink buffer.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::time::Instant;

use log::info;

use crate::manager::DeviceManager;
use crate::netlink::UeventSocket;

impl DeviceManager {
    /// Replay add events for pre-existing devices, then drain the deferred
    /// module queue and mark completion. Skipped entirely when the sentinel
    /// from a previous run exists.
    pub fn coldboot_init(&mut self, mut sock: Option<&mut UeventSocket>) {
        if self.paths.coldboot_done.exists() {
            info!("Skipping coldboot, already done!");
            return;
        }

        let started = Instant::now();
        for root in ["class", "block", "devices"] {
            let dir = format!("{}/{}", self.paths.sys_prefix, root);
            self.coldboot(Path::new(&dir), &mut sock);
        }
        self.drain_deferred();

        if let Err(e) = OpenOptions::new()
            .write(true)
            .create(true)
            .custom_flags(libc::O_CLOEXEC)
            .mode(0)
            .open(&self.paths.coldboot_done)
        {
            info!(
                "cannot create {}: {}",
                self.paths.coldboot_done.display(),
                e
            );
        }
        info!("Coldboot took {:.2}s.", started.elapsed().as_secs_f32());
    }

    fn coldboot(&mut self, dir: &Path, sock: &mut Option<&mut UeventSocket>) {
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };

        let uevent = dir.join("uevent");
        if let Ok(mut f) = OpenOptions::new().write(true).open(&uevent) {
            let _ = f.write_all(b"add\n");
            drop(f);
            if let Some(s) = sock.as_deref_mut() {
                self.handle_socket_events(s, false);
            }
        }

        for entry in entries.flatten() {
            if entry.file_name().as_encoded_bytes().first() == Some(&b'.') {
                continue;
            }
            // symlinks are not followed; sysfs is full of cycles
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                self.coldboot(&entry.path(), sock);
            }
        }
    }
}
