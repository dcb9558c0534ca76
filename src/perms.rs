// CLASSIFICATION: COMMUNITY
// Filename: perms.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-01-22

//! Ordered permission rule tables.
//!
//! Rules carrying a sysfs attribute land in the `/sys` table and are applied
//! in file order; plain device rules land in the `/dev` table and are
//! resolved in reverse so a later, more specific rules file overrides the
//! base one.

use std::ffi::CString;

/// How a rule pattern is compared against a candidate path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Byte-equal string match.
    Exact,
    /// Candidate starts with the pattern; no delimiter requirement.
    Prefix,
    /// Filename glob with path-separator sensitivity.
    Glob,
}

/// One permission rule.
#[derive(Debug, Clone)]
pub struct PermissionRule {
    /// Pattern, stored verbatim. Sysfs rules keep their `/sys` prefix.
    pub pattern: String,
    /// Sysfs attribute name; presence routes the rule to the `/sys` table.
    pub attribute: Option<String>,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub kind: MatchKind,
}

impl PermissionRule {
    pub fn matches(&self, candidate: &str) -> bool {
        match self.kind {
            MatchKind::Exact => candidate == self.pattern,
            MatchKind::Prefix => candidate.starts_with(self.pattern.as_str()),
            MatchKind::Glob => glob_match(&self.pattern, candidate, true),
        }
    }
}

/// The two rule tables.
#[derive(Debug, Default)]
pub struct PermissionStore {
    dev: Vec<PermissionRule>,
    sys: Vec<PermissionRule>,
}

impl PermissionStore {
    /// Append a rule; an attribute selects the `/sys` table.
    pub fn add(
        &mut self,
        pattern: &str,
        attribute: Option<&str>,
        mode: u32,
        uid: u32,
        gid: u32,
        kind: MatchKind,
    ) {
        let rule = PermissionRule {
            pattern: pattern.to_string(),
            attribute: attribute.map(str::to_string),
            mode,
            uid,
            gid,
            kind,
        };
        if rule.attribute.is_some() {
            self.sys.push(rule);
        } else {
            self.dev.push(rule);
        }
    }

    /// Resolve `(mode, uid, gid)` for a device node path.
    ///
    /// The `/dev` table is scanned in reverse; the first rule matching the
    /// path or any of its symlink aliases wins. Default is `0600 root:root`.
    pub fn resolve_dev(&self, path: &str, links: &[String]) -> (u32, u32, u32) {
        for rule in self.dev.iter().rev() {
            if rule.matches(path) || links.iter().any(|l| rule.matches(l)) {
                return (rule.mode, rule.uid, rule.gid);
            }
        }
        (0o600, 0, 0)
    }

    /// Forward iteration over the `/sys` table.
    pub fn iter_sys(&self) -> impl Iterator<Item = &PermissionRule> {
        self.sys.iter()
    }
}

/// Filename-glob match via `fnmatch(3)`.
///
/// `pathname` selects `FNM_PATHNAME`, making `*` stop at `/` as the rule
/// tables require; modalias matching passes `false`, as the kernel's alias
/// globs span the whole string.
pub fn glob_match(pattern: &str, name: &str, pathname: bool) -> bool {
    let (Ok(pattern), Ok(name)) = (CString::new(pattern), CString::new(name)) else {
        return false;
    };
    let flags = if pathname { libc::FNM_PATHNAME } else { 0 };
    unsafe { libc::fnmatch(pattern.as_ptr(), name.as_ptr(), flags) == 0 }
}
