//! Test/debug escape hatches.
//!
//! These are read once per process and passed explicitly to the pieces that
//! honor them. None of them is part of normal operation.

use crate::constants::{ENV_DEBUG, ENV_RAISE, ENV_READ_CHAOS, ENV_WRITE_CHAOS};

/// Process-wide escape hatches, captured from the environment at startup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DebugFlags {
    /// Verbose internal diagnostics (`AAU_DEBUG`).
    pub debug: bool,
    /// Propagate normally swallowed failures (`AAU_RAISE`).
    pub raise: bool,
    /// Kind letters whose cache reads pretend the file is absent.
    pub read_chaos: String,
    /// Kind letters whose cache writes fail as if the disk were read-only.
    pub write_chaos: String,
}

impl DebugFlags {
    /// Capture flags from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Capture flags through an arbitrary lookup (testable without env vars).
    ///
    /// Any non-empty value turns a boolean flag on.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let set = |key: &str| lookup(key).is_some_and(|v| !v.is_empty());
        Self {
            debug: set(ENV_DEBUG),
            raise: set(ENV_RAISE),
            read_chaos: lookup(ENV_READ_CHAOS).unwrap_or_default(),
            write_chaos: lookup(ENV_WRITE_CHAOS).unwrap_or_default(),
        }
    }

    /// Whether reads of the kind identified by `letter` are forced to fail.
    pub fn read_fails(&self, letter: char) -> bool {
        self.read_chaos.contains(letter)
    }

    /// Whether writes of the kind identified by `letter` are forced to fail.
    pub fn write_fails(&self, letter: char) -> bool {
        self.write_chaos.contains(letter)
    }

    /// Log level implied by these flags: `debug` when diagnostics are on, `off` otherwise.
    pub fn log_level(&self) -> &'static str {
        if self.debug { "debug" } else { "off" }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
