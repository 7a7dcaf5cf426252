//! omoritr-installer - OMORI Turkish localization patch installer
//!
//! Library crate for the installer core: component probes, reconciliation
//! planning, and manifest-driven package installation. The CLI binary is a
//! thin caller; it probes, plans, applies, then re-probes.

pub mod apply;
pub mod detect;
pub mod logging;
pub mod manifest;
pub mod package;
pub mod paths;
pub mod planner;
pub mod steam;
pub mod uninstall;
pub mod utils;
