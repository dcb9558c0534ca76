// CLASSIFICATION: COMMUNITY
// Filename: uevent.rs v0.2
// Author: Lukas Bower
// Date Modified: 2025-11-03

//! Kernel uevent datagram parsing.
//!
//! A uevent datagram is a sequence of NUL-terminated `KEY=VALUE` records
//! preceded by an `action@devpath` header. The header and unrecognized keys
//! (including `SEQNUM`) are ignored.

/// One decoded hotplug notification.
///
/// String fields default to empty, integers to `-1`, optionals to absent.
/// The event owns copies of its fields; the receive buffer may be reused
/// immediately after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uevent {
    pub action: String,
    /// devpath under `/sys`, expressed without the `/sys` prefix.
    pub path: String,
    pub subsystem: String,
    /// Firmware blob basename, empty unless this is a firmware request.
    pub firmware: String,
    pub partition_name: Option<String>,
    pub device_name: Option<String>,
    pub modalias: Option<String>,
    pub partition_num: i32,
    pub major: i32,
    pub minor: i32,
}

impl Default for Uevent {
    fn default() -> Self {
        Uevent {
            action: String::new(),
            path: String::new(),
            subsystem: String::new(),
            firmware: String::new(),
            partition_name: None,
            device_name: None,
            modalias: None,
            partition_num: -1,
            major: -1,
            minor: -1,
        }
    }
}

impl Uevent {
    /// Decode a raw netlink datagram.
    pub fn parse(msg: &[u8]) -> Uevent {
        let mut ev = Uevent::default();

        for record in msg.split(|&b| b == 0) {
            if record.is_empty() {
                continue;
            }
            let Ok(record) = std::str::from_utf8(record) else {
                continue;
            };
            if let Some(v) = record.strip_prefix("ACTION=") {
                ev.action = v.to_string();
            } else if let Some(v) = record.strip_prefix("DEVPATH=") {
                ev.path = v.to_string();
            } else if let Some(v) = record.strip_prefix("SUBSYSTEM=") {
                ev.subsystem = v.to_string();
            } else if let Some(v) = record.strip_prefix("FIRMWARE=") {
                ev.firmware = v.to_string();
            } else if let Some(v) = record.strip_prefix("MAJOR=") {
                ev.major = atoi(v);
            } else if let Some(v) = record.strip_prefix("MINOR=") {
                ev.minor = atoi(v);
            } else if let Some(v) = record.strip_prefix("PARTN=") {
                ev.partition_num = atoi(v);
            } else if let Some(v) = record.strip_prefix("PARTNAME=") {
                ev.partition_name = Some(v.to_string());
            } else if let Some(v) = record.strip_prefix("DEVNAME=") {
                ev.device_name = Some(v.to_string());
            } else if let Some(v) = record.strip_prefix("MODALIAS=") {
                ev.modalias = Some(v.to_string());
            }
        }

        log::trace!(
            "event {{ '{}', '{}', '{}', '{}', {}, {} }}",
            ev.action,
            ev.path,
            ev.subsystem,
            ev.firmware,
            ev.major,
            ev.minor
        );
        ev
    }
}

/// C `atoi` semantics: optional sign, leading digits, 0 on no digits.
fn atoi(s: &str) -> i32 {
    let s = s.trim_start();
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'-') => (-1i64, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let digits: &str = &rest[..rest
        .as_bytes()
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count()];
    let val: i64 = digits.parse().unwrap_or(0);
    (sign * val) as i32
}
