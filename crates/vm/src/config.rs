//! Execution limits.

/// Default number of steps one execution context may take.
pub const DEFAULT_STEP_LIMIT: u64 = 1_000_000;

/// Default maximum number of entries on one control stack.
pub const DEFAULT_MAX_CONTROL_DEPTH: usize = 65_536;

/// Limits applied to the main machine and to every goroutine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    /// Steps after which execution fails with `StepLimitExceeded`.
    pub step_limit: u64,
    /// Control-stack entries after which execution fails with
    /// `ControlStackOverflow`.
    pub max_control_depth: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            step_limit: DEFAULT_STEP_LIMIT,
            max_control_depth: DEFAULT_MAX_CONTROL_DEPTH,
        }
    }
}

impl VmConfig {
    pub fn with_step_limit(mut self, step_limit: u64) -> Self {
        self.step_limit = step_limit;
        self
    }

    pub fn with_max_control_depth(mut self, max_control_depth: usize) -> Self {
        self.max_control_depth = max_control_depth;
        self
    }
}
