//! Run configuration
//!
//! One immutable record per invocation, built up front and consumed
//! read-only by every phase. Size/stride invalidity is deliberately *not*
//! rejected here: provoking the kernel's own `InvalidSize` classification
//! is part of the protocol. But combinations that would break the harness
//! itself are caught before any allocation.

use serde::{Deserialize, Serialize};

/// Timed iterations used when none are requested explicitly
pub const DEFAULT_HOT_CALLS: u32 = 10;

/// Seed used when none is requested explicitly
pub const DEFAULT_SEED: u64 = 0x5eed_0001;

/// Profiling side-channel configuration, scoped to one run
///
/// A `depth` of zero leaves the profiling layer disarmed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Maximum nesting depth the profiling layer records
    pub depth: u32,
    /// Also record kernel-level detail
    pub profile_kernels: bool,
}

/// Immutable per-run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Problem size (may be deliberately invalid)
    pub n: i64,
    /// Stride between logical vector elements (may be deliberately invalid)
    pub incx: i64,
    /// Timed device invocations for the profiler
    pub hot_calls: u32,
    /// Seed for reproducible input generation
    pub seed: u64,
    /// Run the correctness evaluator and judge against the scaled bound
    pub unit_check: bool,
    /// Run the correctness evaluator and report the error scalar
    pub norm_check: bool,
    /// Run the performance profiler
    pub timing: bool,
    /// Skip the host-reference baseline during timing
    pub perf_only: bool,
    /// Report the required workspace size and stop
    pub mem_query: bool,
    /// Profiling side channel
    pub profile: ProfileConfig,
}

impl RunConfig {
    /// Create a configuration for problem size `n` with stride `incx`
    #[must_use]
    pub fn new(n: i64, incx: i64) -> Self {
        Self {
            n,
            incx,
            hot_calls: DEFAULT_HOT_CALLS,
            seed: DEFAULT_SEED,
            unit_check: false,
            norm_check: false,
            timing: false,
            perf_only: false,
            mem_query: false,
            profile: ProfileConfig::default(),
        }
    }

    /// Request correctness checking
    #[must_use]
    pub fn with_checks(mut self, unit: bool, norm: bool) -> Self {
        self.unit_check = unit;
        self.norm_check = norm;
        self
    }

    /// Request timing with `hot_calls` measured iterations
    #[must_use]
    pub fn with_timing(mut self, hot_calls: u32) -> Self {
        self.timing = true;
        self.hot_calls = hot_calls;
        self
    }

    /// Skip the host baseline while timing
    #[must_use]
    pub fn performance_only(mut self) -> Self {
        self.perf_only = true;
        self
    }

    /// Turn the run into a pure workspace-size query
    #[must_use]
    pub fn with_mem_query(mut self) -> Self {
        self.mem_query = true;
        self
    }

    /// Override the generation seed
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Arm the profiling side channel
    #[must_use]
    pub fn with_profile(mut self, depth: u32, profile_kernels: bool) -> Self {
        self.profile = ProfileConfig {
            depth,
            profile_kernels,
        };
        self
    }

    /// Whether the kernel must classify this size/stride pair as invalid
    #[must_use]
    pub fn invalid_size(&self) -> bool {
        self.n < 0 || self.incx < 1
    }

    /// Whether the correctness evaluator runs
    #[must_use]
    pub fn wants_correctness(&self) -> bool {
        self.unit_check || self.norm_check
    }

    /// Reject combinations the harness itself cannot execute
    ///
    /// # Errors
    ///
    /// Returns [`crate::HarnessError::Config`] for a timed run with zero
    /// hot calls.
    pub fn validate(&self) -> crate::Result<()> {
        if self.timing && self.hot_calls == 0 {
            return Err(crate::HarnessError::Config(
                "timing requested with zero hot calls".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let cfg = RunConfig::new(50, 2)
            .with_checks(true, false)
            .with_timing(25)
            .with_seed(7)
            .with_profile(2, true);
        assert_eq!(cfg.n, 50);
        assert_eq!(cfg.incx, 2);
        assert!(cfg.unit_check);
        assert!(!cfg.norm_check);
        assert!(cfg.timing);
        assert_eq!(cfg.hot_calls, 25);
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.profile.depth, 2);
    }

    #[test]
    fn test_invalid_size_classification() {
        assert!(RunConfig::new(-1, 1).invalid_size());
        assert!(RunConfig::new(10, 0).invalid_size());
        assert!(!RunConfig::new(0, 1).invalid_size());
        assert!(!RunConfig::new(10, 2).invalid_size());
    }

    #[test]
    fn test_validate_rejects_zero_hot_calls() {
        assert!(RunConfig::new(4, 1).with_timing(0).validate().is_err());
        assert!(RunConfig::new(4, 1).with_timing(1).validate().is_ok());
        // hot_calls is irrelevant without timing
        let mut cfg = RunConfig::new(4, 1);
        cfg.hot_calls = 0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_config_round_trips_through_serde() {
        let cfg = RunConfig::new(8, 1).with_timing(5);
        let json = serde_json::to_string(&cfg).unwrap();
        let back: RunConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.n, 8);
        assert!(back.timing);
    }
}
