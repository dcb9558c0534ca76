// CLASSIFICATION: COMMUNITY
// Filename: firmware.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-01-22

//! Firmware request servicing.
//!
//! The kernel requests a blob by emitting a `firmware` `add` uevent; the
//! answer is the sysfs three-file dance: `"1"` to `loading` opens the
//! transfer, bytes to `data` form the blob, `"0"` commits and `"-1"`
//! aborts. Exactly one terminal status is written per request.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::manager::DeviceManager;
use crate::uevent::Uevent;

const RETRY_INTERVAL: Duration = Duration::from_millis(100);
const COPY_CHUNK: usize = 4096;

impl DeviceManager {
    /// Firmware-consumer entry: ignores everything but `firmware` `add`.
    pub fn handle_firmware_event(&self, ev: &Uevent) {
        if ev.subsystem != "firmware" || ev.action != "add" {
            return;
        }
        self.process_firmware_event(ev);
    }

    fn process_firmware_event(&self, ev: &Uevent) {
        info!("firmware: loading '{}' for '{}'", ev.firmware, ev.path);

        let root = format!("{}{}/", self.paths.sys_prefix, ev.path);
        let loading_path = format!("{}loading", root);
        let data_path = format!("{}data", root);

        let mut loading = match open_wronly_cloexec(&loading_path) {
            Ok(f) => f,
            Err(e) => {
                warn!("firmware: cannot open '{}': {}", loading_path, e);
                return;
            }
        };
        let mut data = match open_wronly_cloexec(&data_path) {
            Ok(f) => f,
            Err(e) => {
                warn!("firmware: cannot open '{}': {}", data_path, e);
                return;
            }
        };

        let mut booting = self.is_booting();
        loop {
            let source = self
                .paths
                .firmware_dirs
                .iter()
                .find_map(|dir| File::open(dir.join(&ev.firmware)).ok());

            match source {
                Some(fw) => {
                    if copy_firmware(fw, &mut loading, &mut data) {
                        debug!("firmware: copy success {{ '{}', '{}' }}", root, ev.firmware);
                    } else {
                        debug!("firmware: copy failure {{ '{}', '{}' }}", root, ev.firmware);
                    }
                    return;
                }
                None if booting => {
                    // the firmware filesystem may not be mounted yet; wait
                    thread::sleep(RETRY_INTERVAL);
                    booting = self.is_booting();
                }
                None => {
                    warn!("firmware: could not open '{}'", ev.firmware);
                    let _ = loading.write_all(b"-1");
                    return;
                }
            }
        }
    }
}

fn open_wronly_cloexec(path: &str) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .custom_flags(libc::O_CLOEXEC)
        .open(path)
}

/// Stream the blob into the kernel's data sink, closing the transfer with
/// exactly one terminal status.
fn copy_firmware(mut fw: File, loading: &mut File, data: &mut File) -> bool {
    let _ = loading.write_all(b"1");

    let mut buf = [0u8; COPY_CHUNK];
    let ok = loop {
        match fw.read(&mut buf) {
            Ok(0) => break true,
            Ok(n) => {
                if data.write_all(&buf[..n]).is_err() {
                    break false;
                }
            }
            Err(e) => {
                debug!("firmware: read failed: {}", e);
                break false;
            }
        }
    };

    let _ = loading.write_all(if ok { b"0" as &[u8] } else { b"-1" });
    ok
}
