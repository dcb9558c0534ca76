// CLASSIFICATION: COMMUNITY
// Filename: label.rs v0.2
// Author: Lukas Bower
// Date Modified: 2025-12-05

//! Security-label database seam.
//!
//! Node creation and sysfs fixup consult a label backend for the context to
//! stamp on files. The backend is a collaborator: real policy databases live
//! outside this crate, and [`NullLabels`] stands in when none is wired up.

use std::path::Path;

use thiserror::Error;

/// Errors surfaced by a label backend.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("label database unavailable")]
    Unavailable,
    #[error("no label match for {0}")]
    NoMatch(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Interface to the security-label database.
pub trait LabelBackend: Send {
    /// Best-match label for a node about to be created at `path` with the
    /// given symlink aliases and mode. `Ok(None)` means no labeling is
    /// configured; `Err` aborts the node creation.
    fn lookup_best_match(
        &self,
        path: &str,
        links: &[String],
        mode: u32,
    ) -> Result<Option<String>, LabelError>;

    /// Set or clear the label applied to subsequently created files.
    fn set_fscreate(&self, label: Option<&str>);

    /// Re-stamp the label on an existing file.
    fn set_file_label(&self, path: &str, label: &str) -> Result<(), LabelError>;

    /// Restore labels below `path` per the loaded policy.
    fn restorecon_recursive(&self, path: &Path);

    /// Poll for a policy update and atomically swap the underlying handle
    /// when one occurred.
    fn refresh(&mut self);
}

/// Backend used when no security-label database is present.
#[derive(Debug, Default)]
pub struct NullLabels;

impl LabelBackend for NullLabels {
    fn lookup_best_match(
        &self,
        _path: &str,
        _links: &[String],
        _mode: u32,
    ) -> Result<Option<String>, LabelError> {
        Ok(None)
    }

    fn set_fscreate(&self, _label: Option<&str>) {}

    fn set_file_label(&self, _path: &str, _label: &str) -> Result<(), LabelError> {
        Ok(())
    }

    fn restorecon_recursive(&self, _path: &Path) {}

    fn refresh(&mut self) {}
}
