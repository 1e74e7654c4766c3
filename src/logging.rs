//! Process-wide log verbosity control.
//!
//! The library emits [`tracing`] events at key optimization points (trial
//! completed, new best found, refit) but never installs a subscriber on its
//! own: whether and how much of that output is visible is process-wide
//! configuration the caller owns. Call [`init`] once at startup to install
//! a formatting subscriber at the chosen verbosity, or install any other
//! `tracing` subscriber directly.

use tracing::level_filters::LevelFilter;

/// How much of the library's diagnostic output is visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verbosity {
    /// Suppress all diagnostic output.
    Silent,
    /// Warnings only.
    Warn,
    /// Per-run milestones such as new best values and refits.
    Info,
    /// Per-trial diagnostics.
    Debug,
}

impl From<Verbosity> for LevelFilter {
    fn from(verbosity: Verbosity) -> Self {
        match verbosity {
            Verbosity::Silent => LevelFilter::OFF,
            Verbosity::Warn => LevelFilter::WARN,
            Verbosity::Info => LevelFilter::INFO,
            Verbosity::Debug => LevelFilter::DEBUG,
        }
    }
}

/// Installs a global formatting subscriber at the given verbosity.
///
/// Returns `false` when a global subscriber is already installed, in which
/// case the existing configuration is left untouched.
pub fn init(verbosity: Verbosity) -> bool {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from(verbosity))
        .with_target(false)
        .try_init()
        .is_ok()
}
