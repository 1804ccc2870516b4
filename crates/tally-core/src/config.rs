//! # Runtime configuration
//!
//! The batch runtime reads its knobs from a thread‑local `RuntimeConfig`.
//! `set_runtime_config` replaces the base value for the thread;
//! `with_runtime_config` overrides it for the duration of a closure:
//!
//! ```rust
//! use tally_core::*;
//!
//! let strict = RuntimeConfig {
//!     max_flush_passes: 4,
//!     ..RuntimeConfig::default()
//! };
//!
//! with_runtime_config(strict, || {
//!     assert_eq!(runtime_config().max_flush_passes, 4);
//! });
//! ```

use std::cell::{Cell, RefCell};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Upper bound on commit passes in one flush. Observers that keep
    /// requesting updates hit this instead of looping forever.
    pub max_flush_passes: usize,
    /// Log every commit at debug level.
    pub trace_commits: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_flush_passes: 100,
            trace_commits: false,
        }
    }
}

thread_local! {
    static BASE: Cell<RuntimeConfig> = Cell::new(RuntimeConfig::default());
    static OVERRIDES: RefCell<Vec<RuntimeConfig>> = const { RefCell::new(Vec::new()) };
}

pub fn runtime_config() -> RuntimeConfig {
    OVERRIDES
        .with(|st| st.borrow().last().copied())
        .unwrap_or_else(|| BASE.with(Cell::get))
}

pub fn set_runtime_config(config: RuntimeConfig) {
    BASE.with(|b| b.set(config));
}

pub fn with_runtime_config<R>(config: RuntimeConfig, f: impl FnOnce() -> R) -> R {
    // pops on unwind too
    struct Guard;
    impl Drop for Guard {
        fn drop(&mut self) {
            OVERRIDES.with(|st| {
                st.borrow_mut().pop();
            });
        }
    }
    OVERRIDES.with(|st| st.borrow_mut().push(config));
    let _guard = Guard;
    f()
}
