use thiserror::Error;

/// Errors surfaced by the batch runtime and the host.
///
/// Stale-snapshot updates and similar misuse are not errors: they commit
/// exactly what was requested.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("state cell `{label}` was disposed with its scope")]
    Disposed { label: &'static str },

    #[error("flush did not settle after {passes} passes; observers keep requesting updates")]
    FlushLimit { passes: usize },

    #[error("no button labelled `{0}` in the current frame")]
    NoSuchTarget(String),
}
