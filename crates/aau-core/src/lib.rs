//! # aau-core
//!
//! Foundation pieces shared by every `aau` crate:
//!
//! - **Constants**: environment variable names and token alphabet rules ([`constants`])
//! - **Flags**: the debug/raise/chaos escape hatches read once per process ([`flags::DebugFlags`])
//! - **Logging**: `tracing` subscriber bootstrap ([`logging::init_subscriber`])
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other aau crates.

#![deny(unsafe_code)]

pub mod constants;
pub mod flags;
pub mod logging;

pub use flags::DebugFlags;
pub use logging::init_subscriber;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _flags = DebugFlags::default();
        assert_eq!(constants::TOKEN_LENGTH, 22);
    }
}
