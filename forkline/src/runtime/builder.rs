use super::Runtime;
use crate::error::Error;

use std::env;

/// Environment variable read by [`RuntimeBuilder::from_env`].
pub const JOB_BUDGET_ENV: &str = "FORKLINE_JOB_BUDGET";

const DEFAULT_JOB_BUDGET: usize = 64;

/// Builder for configuring and creating a runtime.
///
/// `RuntimeBuilder` allows customizing runtime parameters before
/// constructing the runtime. Currently, it supports configuring how many
/// woken futures are polled between two timer checks.
///
/// # Examples
///
/// ```rust,ignore
/// let runtime = RuntimeBuilder::new()
///     .job_budget(16)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct RuntimeBuilder {
    /// Number of woken futures polled between timer checks.
    job_budget: usize,
}

impl RuntimeBuilder {
    /// Creates a new `RuntimeBuilder` with default configuration.
    pub fn new() -> Self {
        Self {
            job_budget: DEFAULT_JOB_BUDGET,
        }
    }

    /// Creates a builder from the process environment.
    ///
    /// Reads [`JOB_BUDGET_ENV`]; unset means the default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the variable is set to anything
    /// but a positive integer.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Creates a builder from an arbitrary key/value source.
    ///
    /// `lookup` is called with the same keys [`from_env`](Self::from_env)
    /// reads, which makes configuration testable without touching the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] on a malformed value.
    pub fn from_vars<L>(lookup: L) -> Result<Self, Error>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::new();

        if let Some(raw) = lookup(JOB_BUDGET_ENV) {
            let budget = raw.trim().parse::<usize>().map_err(|err| {
                Error::invalid_argument(JOB_BUDGET_ENV, format!("`{raw}` is not a number: {err}"))
            })?;

            if budget == 0 {
                return Err(Error::invalid_argument(JOB_BUDGET_ENV, "must be greater than 0"));
            }

            builder.job_budget = budget;
        }

        Ok(builder)
    }

    /// Sets the number of woken futures polled before timers are checked.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let builder = RuntimeBuilder::new()
    ///     .job_budget(8);
    /// ```
    pub fn job_budget(mut self, n: usize) -> Self {
        assert!(n > 0, "job_budget must be > 0");

        self.job_budget = n;
        self
    }

    /// Returns the configured job budget.
    pub fn budget(&self) -> usize {
        self.job_budget
    }

    /// Builds the runtime with the configured options.
    pub fn build(self) -> Runtime {
        Runtime::new(self.job_budget)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
