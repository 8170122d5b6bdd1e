//! Environment-driven configuration for the parcel services.

use crate::domain::fees::DEFAULT_FEE_RATE;

/// Environment variable name for the per-unit fee rate.
pub const FEE_RATE_ENV: &str = "PARCEL_FEE_RATE";

/// Environment variable name for the tracking code retry budget.
pub const TRACKING_CODE_ATTEMPTS_ENV: &str = "PARCEL_TRACKING_CODE_ATTEMPTS";

/// Environment abstraction for configuration lookups.
///
/// This trait allows testing with stub environments without unsafe env
/// var mutations.
pub trait ParcelEnv {
    /// Fetch a string value by name.
    fn string(&self, name: &str) -> Option<String>;
}

/// Environment access backed by the real process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultParcelEnv;

impl DefaultParcelEnv {
    /// Create a new environment reader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ParcelEnv for DefaultParcelEnv {
    fn string(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Tunable behaviour of the parcel command service.
#[derive(Debug, Clone)]
pub struct ParcelServiceConfig {
    fee_rate: f64,
    tracking_code_attempts: u32,
}

impl ParcelServiceConfig {
    /// Default number of tracking code generation attempts per create.
    const DEFAULT_TRACKING_CODE_ATTEMPTS: u32 = 5;

    /// Minimum allowed attempt budget.
    const MIN_TRACKING_CODE_ATTEMPTS: u32 = 1;

    /// Maximum allowed attempt budget.
    ///
    /// Prevents pathological configurations from turning a hot collision
    /// window into an unbounded insert loop.
    const MAX_TRACKING_CODE_ATTEMPTS: u32 = 32;

    /// Load configuration from the real process environment.
    ///
    /// Reads `PARCEL_FEE_RATE` (default: 10) and
    /// `PARCEL_TRACKING_CODE_ATTEMPTS` (default: 5, clamped to [1, 32]).
    pub fn from_env() -> Self {
        Self::from_env_with(&DefaultParcelEnv)
    }

    /// Load configuration from a custom environment source.
    pub fn from_env_with(env: &impl ParcelEnv) -> Self {
        let fee_rate = env
            .string(FEE_RATE_ENV)
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .unwrap_or(DEFAULT_FEE_RATE);
        let tracking_code_attempts = env
            .string(TRACKING_CODE_ATTEMPTS_ENV)
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(Self::DEFAULT_TRACKING_CODE_ATTEMPTS)
            .clamp(
                Self::MIN_TRACKING_CODE_ATTEMPTS,
                Self::MAX_TRACKING_CODE_ATTEMPTS,
            );
        Self {
            fee_rate,
            tracking_code_attempts,
        }
    }

    /// Create with explicit values (for testing).
    pub fn with_values(fee_rate: f64, tracking_code_attempts: u32) -> Self {
        Self {
            fee_rate,
            tracking_code_attempts,
        }
    }

    /// Charge per weight unit.
    pub fn fee_rate(&self) -> f64 {
        self.fee_rate
    }

    /// Tracking code generation attempts per parcel creation.
    pub fn tracking_code_attempts(&self) -> u32 {
        self.tracking_code_attempts
    }
}

impl Default for ParcelServiceConfig {
    fn default() -> Self {
        Self {
            fee_rate: DEFAULT_FEE_RATE,
            tracking_code_attempts: Self::DEFAULT_TRACKING_CODE_ATTEMPTS,
        }
    }
}
