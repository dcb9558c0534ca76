// CLASSIFICATION: COMMUNITY
// Filename: rules.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-01-22

//! Device rules file parsing.
//!
//! Line-oriented, `#` comments. Three shapes:
//!
//! ```text
//! /dev/ttyHS*            0660 root 1001
//! /sys/devices/widget0   enable 0664 root root
//! subsystem adf
//!   devname uevent_devname
//!   dirname /dev/adf
//! ```
//!
//! A pattern whose only metacharacter is a trailing `*` is a prefix rule
//! (the `*` is stripped); any other `*`, `?` or `[` makes it a glob.
//! uid/gid accept numeric IDs or `root`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::dispatch::{DevnameSource, SubsystemConfig};
use crate::manager::DeviceManager;
use crate::perms::MatchKind;

/// Rules file parse failures.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: invalid mode '{token}'")]
    BadMode { line: usize, token: String },
    #[error("line {line}: unknown user or group '{token}'")]
    BadId { line: usize, token: String },
    #[error("line {line}: malformed rule")]
    BadRule { line: usize },
}

impl DeviceManager {
    /// Parse a rules file and append its rules and subsystem entries.
    pub fn load_rules_file(&mut self, path: &Path) -> Result<(), RulesError> {
        let text = fs::read_to_string(path).map_err(|source| RulesError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_rules(&text)
    }

    /// Parse rules text. Later rules win over earlier ones for `/dev`
    /// resolution, so callers feed base files before overrides.
    pub fn load_rules(&mut self, text: &str) -> Result<(), RulesError> {
        let mut current: Option<usize> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            match tokens[0] {
                "subsystem" => {
                    if tokens.len() != 2 {
                        return Err(RulesError::BadRule { line: line_no });
                    }
                    self.subsystems.push(SubsystemConfig {
                        name: tokens[1].to_string(),
                        devname_src: None,
                        dirname: "/dev".to_string(),
                    });
                    current = Some(self.subsystems.len() - 1);
                }
                "devname" => {
                    let section = current.ok_or(RulesError::BadRule { line: line_no })?;
                    if tokens.len() != 2 {
                        return Err(RulesError::BadRule { line: line_no });
                    }
                    self.subsystems[section].devname_src = Some(match tokens[1] {
                        "uevent_devname" => DevnameSource::UeventDevname,
                        "uevent_devpath" => DevnameSource::UeventDevpath,
                        _ => return Err(RulesError::BadRule { line: line_no }),
                    });
                }
                "dirname" => {
                    let section = current.ok_or(RulesError::BadRule { line: line_no })?;
                    if tokens.len() != 2 || !tokens[1].starts_with('/') {
                        return Err(RulesError::BadRule { line: line_no });
                    }
                    self.subsystems[section].dirname = tokens[1].to_string();
                }
                pattern if pattern.starts_with("/sys/") => {
                    // <pattern> <attribute> <mode> <uid> <gid>
                    if tokens.len() != 5 {
                        return Err(RulesError::BadRule { line: line_no });
                    }
                    let (pattern, kind) = split_match_kind(pattern);
                    let mode = parse_mode(tokens[2], line_no)?;
                    let uid = parse_id(tokens[3], line_no)?;
                    let gid = parse_id(tokens[4], line_no)?;
                    self.perms.add(&pattern, Some(tokens[1]), mode, uid, gid, kind);
                }
                pattern if pattern.starts_with('/') => {
                    // <pattern> <mode> <uid> <gid>
                    if tokens.len() != 4 {
                        return Err(RulesError::BadRule { line: line_no });
                    }
                    let (pattern, kind) = split_match_kind(pattern);
                    let mode = parse_mode(tokens[1], line_no)?;
                    let uid = parse_id(tokens[2], line_no)?;
                    let gid = parse_id(tokens[3], line_no)?;
                    self.perms.add(&pattern, None, mode, uid, gid, kind);
                }
                _ => return Err(RulesError::BadRule { line: line_no }),
            }
        }
        Ok(())
    }
}

fn split_match_kind(pattern: &str) -> (String, MatchKind) {
    let body = &pattern[..pattern.len() - usize::from(pattern.ends_with('*'))];
    let has_meta = body.contains(['*', '?', '[']);
    if pattern.ends_with('*') && !has_meta {
        (body.to_string(), MatchKind::Prefix)
    } else if has_meta {
        (pattern.to_string(), MatchKind::Glob)
    } else {
        (pattern.to_string(), MatchKind::Exact)
    }
}

fn parse_mode(token: &str, line: usize) -> Result<u32, RulesError> {
    u32::from_str_radix(token, 8).map_err(|_| RulesError::BadMode {
        line,
        token: token.to_string(),
    })
}

fn parse_id(token: &str, line: usize) -> Result<u32, RulesError> {
    if token == "root" {
        return Ok(0);
    }
    token.parse().map_err(|_| RulesError::BadId {
        line,
        token: token.to_string(),
    })
}
