//! Runtime configuration shared by the library and the binaries.
//!
//! Defaults live here as constants. The CLI overrides them from flags or the
//! environment variables named below.

/// Number of amplifiers in every known pipeline configuration.
pub const DEFAULT_AMPLIFIERS: usize = 5;

/// Environment variable holding the step watchdog limit.
pub const STEP_LIMIT_ENV: &str = "INTCODE_STEP_LIMIT";

/// Environment variable holding the log level.
pub const LOG_LEVEL_ENV: &str = "INTCODE_LOG";

/// Limits applied to every machine.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MachineConfig {
    /// Maximum number of instructions a machine may execute, or `None` for no limit.
    pub step_limit: Option<u64>,
}

impl MachineConfig {
    /// Configuration without a step watchdog.
    pub const fn unlimited() -> Self {
        Self { step_limit: None }
    }

    /// Configuration that fails a machine after `limit` instructions.
    pub const fn with_step_limit(limit: u64) -> Self {
        Self {
            step_limit: Some(limit),
        }
    }
}
