// CLASSIFICATION: COMMUNITY
// Filename: modules.rs v0.4
// Author: Lukas Bower
// Date Modified: 2026-01-22

//! MODALIAS-driven module autoloading.
//!
//! Alias and blacklist tables are loaded lazily the first time a MODALIAS
//! arrives; until the alias table is readable, MODALIAS strings queue on a
//! deferred FIFO that the coldboot walk drains once tables are in.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::Command;

use log::{debug, error, info};

use crate::manager::DeviceManager;
use crate::perms::glob_match;

/// Classification values shared with callers: `try_load_by_modalias`
/// reports `MOD_DEFER` so the dispatcher can queue the modalias.
pub const MOD_ALLOWED: i32 = 0;
pub const MOD_BLOCKED: i32 = 1;
pub const MOD_DEFER: i32 = 2;

/// One `modules.alias` entry.
#[derive(Debug, Clone)]
pub struct ModuleAlias {
    pub name: String,
    /// Glob matched against MODALIAS strings.
    pub pattern: String,
}

/// One blacklist entry. `deferred` means "postpone during boot, permit
/// after"; plain blacklisting is absolute.
#[derive(Debug, Clone)]
pub struct ModuleBlacklistEntry {
    pub name: String,
    pub deferred: bool,
}

/// Interface to the module insertion engine.
pub trait ModuleInserter: Send {
    /// Insert `name` with its dependency chain, passing `options` through.
    fn insert_with_deps(&self, name: &str, options: &str) -> io::Result<()>;
}

/// Default inserter: spawns the platform module helper, which owns
/// dependency resolution.
pub struct HelperInserter {
    pub helper: PathBuf,
}

impl Default for HelperInserter {
    fn default() -> Self {
        HelperInserter {
            helper: PathBuf::from("/sbin/modprobe"),
        }
    }
}

impl ModuleInserter for HelperInserter {
    fn insert_with_deps(&self, name: &str, options: &str) -> io::Result<()> {
        let mut cmd = Command::new(&self.helper);
        cmd.arg(name);
        if !options.is_empty() {
            cmd.arg(options);
        }
        let status = cmd.status()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!(
                "{} exited with {}",
                self.helper.display(),
                status
            )))
        }
    }
}

impl DeviceManager {
    pub(crate) fn read_modules_aliases(&mut self) -> io::Result<()> {
        let text = fs::read_to_string(&self.paths.modules_alias)?;
        for line in text.lines() {
            let mut tokens = line.split_whitespace();
            if tokens.next() != Some("alias") {
                continue;
            }
            let (Some(pattern), Some(name)) = (tokens.next(), tokens.next()) else {
                continue;
            };
            self.aliases.push(ModuleAlias {
                name: name.to_string(),
                pattern: pattern.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn read_modules_blacklist(&mut self) -> io::Result<()> {
        let text = fs::read_to_string(&self.paths.modules_blacklist)?;
        for line in text.lines() {
            let mut tokens = line.split_whitespace();
            let deferred = match tokens.next() {
                Some("blacklist") => false,
                Some("deferred") => true,
                _ => continue,
            };
            let Some(name) = tokens.next() else {
                continue;
            };
            self.blacklist.push(ModuleBlacklistEntry {
                name: name.to_string(),
                deferred,
            });
        }
        Ok(())
    }

    /// Blacklist verdict for a module name.
    pub fn classify_module(&self, name: &str, need_deferred: bool) -> i32 {
        for entry in &self.blacklist {
            if entry.name == name {
                debug!("module {} is blacklisted", name);
                if entry.deferred {
                    return if need_deferred { MOD_DEFER } else { MOD_ALLOWED };
                }
                return MOD_BLOCKED;
            }
        }
        MOD_ALLOWED
    }

    /// Scan the alias table in order, attempting insertion for every allowed
    /// match. Returns 0 once a load succeeds, -1 when nothing matched, and
    /// otherwise the verdict of the last alias tried (`MOD_DEFER` tells the
    /// caller to queue the modalias).
    pub fn try_load_by_modalias(&self, modalias: &str, need_deferred: bool) -> i32 {
        let mut ret = -1;

        for alias in &self.aliases {
            if !glob_match(&alias.pattern, modalias, false) {
                continue;
            }
            debug!("trying to load module {} due to uevents", alias.name);

            ret = self.classify_module(&alias.name, need_deferred);
            if ret == MOD_ALLOWED {
                match self.inserter.insert_with_deps(&alias.name, "") {
                    Ok(()) => {
                        debug!("loaded module {} due to uevents", alias.name);
                        ret = 0;
                    }
                    Err(e) => {
                        // another alias may still match; keep scanning
                        info!("failed to load {} for modalias {}: {}", alias.name, modalias, e);
                        ret = e.raw_os_error().map_or(-1, |n| -n);
                    }
                }
            } else {
                info!("blacklisted module {}: {}", alias.name, ret);
            }
        }

        ret
    }

    /// Autoload hook for `add` events. Loads the tables on first need and
    /// queues the modalias whenever they are unavailable or the verdict was
    /// to defer.
    pub fn handle_modalias(&mut self, modalias: Option<&str>) {
        // once modules.alias can be read, the deferred queue becomes drainable
        if self.aliases.is_empty() && self.read_modules_aliases().is_ok() {
            let _ = self.read_modules_blacklist();
        }

        let Some(modalias) = modalias else {
            return;
        };

        if self.aliases.is_empty()
            || self.try_load_by_modalias(modalias, self.is_booting()) == MOD_DEFER
        {
            debug!("add to queue for deferred module loading: {}", modalias);
            self.deferred.push_back(modalias.to_string());
        }
    }

    /// Attempt every queued modalias exactly once, dropping each regardless
    /// of outcome. No-op while the alias table is still empty.
    pub fn drain_deferred(&mut self) {
        if self.aliases.is_empty() {
            return;
        }
        while let Some(modalias) = self.deferred.pop_front() {
            debug!("deferred loading of module for {}", modalias);
            self.try_load_by_modalias(&modalias, false);
        }
    }

    /// modprobe-compatible entry: the kernel invokes this process as
    /// `/proc/sys/kernel/modprobe`. Requests are accepted from uid 0 only.
    pub fn modprobe_main(&mut self, args: &[String]) -> i32 {
        if unsafe { libc::getuid() } != 0 {
            return -libc::EPERM;
        }

        let mut args = args;
        while let Some(first) = args.first() {
            if first == "-q" || first == "--" {
                args = &args[1..];
            } else {
                break;
            }
        }

        if args.is_empty() {
            return -libc::EINVAL;
        }

        info!("modprobe {}", args[0]);
        self.module_probe(args)
    }

    fn module_probe(&mut self, args: &[String]) -> i32 {
        if self.aliases.is_empty() {
            if let Err(e) = self.read_modules_aliases() {
                error!("cannot read module aliases: {}", e);
            }
            let _ = self.read_modules_blacklist();
        }

        // modalias first; fall through to a plain module name
        let ret = self.try_load_by_modalias(&args[0], false);
        if ret == 0 {
            return 0;
        }

        let options = args[1..].join(" ");
        match self.inserter.insert_with_deps(&args[0], &options) {
            Ok(()) => 0,
            Err(e) => e.raw_os_error().map_or(-1, |n| -n),
        }
    }
}
