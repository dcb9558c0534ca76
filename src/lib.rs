// CLASSIFICATION: COMMUNITY
// Filename: lib.rs v0.3
// Date Modified: 2026-01-22
// Author: Lukas Bower

//! Cohesix early-boot device manager.
//!
//! `cohdevd` consumes kernel hotplug (uevent) notifications over a
//! `NETLINK_KOBJECT_UEVENT` socket and reconciles them with user-space
//! state: device nodes under `/dev`, stable symlinks by platform/PCI
//! topology and partition identity, permission and security-label fixups
//! under `/sys`, MODALIAS-driven module autoloading, and firmware delivery
//! to kernel-initiated requests.
//!
//! All mutable hotplug state lives in a single [`DeviceManager`] so tests
//! can instantiate isolated managers over scratch directory trees.

/// Coldboot walk: synthetic replay of pre-startup add events.
pub mod coldboot;
/// Top-level event classification and the block/platform/generic handlers.
pub mod dispatch;
/// Firmware request servicing over the sysfs loading/data protocol.
pub mod firmware;
/// Security-label database seam.
pub mod label;
/// Stable symlink derivation for block and character devices.
pub mod links;
/// The `DeviceManager` instance and its filesystem roots.
pub mod manager;
/// Module alias/blacklist tables and load scheduling.
pub mod modules;
/// The kernel uevent multicast socket.
pub mod netlink;
/// Device node creation and removal.
pub mod node;
/// Ordered permission rule tables for `/dev` and `/sys`.
pub mod perms;
/// Registry of known platform device paths.
pub mod platform;
/// Device rules file parsing.
pub mod rules;
/// `/sys` attribute permission fixups.
pub mod sysfs;
/// Uevent datagram parsing.
pub mod uevent;
/// Directory helpers.
pub mod util;

pub use manager::{DevdPaths, DeviceManager};
pub use uevent::Uevent;
