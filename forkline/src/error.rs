use thiserror::Error;

/// Errors raised by forkline itself.
///
/// Task failures are never reported through this type: a rejected task
/// carries the caller's own error value through the promise chain untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A value handed in at an untyped boundary was not what was expected,
    /// e.g. a chain parent that is not a promise or a malformed config value.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    /// `block_on` was left with a pending future and nothing that could
    /// ever wake it: no microtask, no runnable task and no timer.
    #[error("runtime stalled: the future is pending but no work is left to drive it")]
    Stalled,
}

impl Error {
    pub(crate) fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}
