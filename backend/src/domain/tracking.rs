//! Tracking code generation and validation.
//!
//! Tracking codes are the public, human-readable handles for anonymous
//! status lookup. They are generated server-side only; callers never
//! supply one.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Number of random characters in the code suffix.
pub const TRACKING_SUFFIX_LEN: usize = 6;

static TRACKING_CODE_RE: OnceLock<Regex> = OnceLock::new();

fn tracking_code_regex() -> &'static Regex {
    TRACKING_CODE_RE.get_or_init(|| {
        let pattern = r"^TRK-\d{8}-[A-Za-z0-9]{6}$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("tracking code regex failed to compile: {error}"))
    })
}

/// Validation errors returned by [`TrackingCode::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingCodeError {
    InvalidFormat,
}

impl fmt::Display for TrackingCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat => {
                write!(f, "tracking code must match TRK-YYYYMMDD-<6 alphanumerics>")
            }
        }
    }
}

impl std::error::Error for TrackingCodeError {}

/// Public tracking code in the form `TRK-<YYYYMMDD>-<random suffix>`.
///
/// ## Invariants
/// - Globally unique once stored; collisions are possible at generation
///   time and must be resolved by regenerating at insert (see
///   `ParcelCommandService::create_parcel`).
/// - Immutable once assigned to a parcel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackingCode(String);

impl TrackingCode {
    /// Validate and wrap an existing code, e.g. when loading from a store.
    pub fn new(code: impl Into<String>) -> Result<Self, TrackingCodeError> {
        let code = code.into();
        if !tracking_code_regex().is_match(&code) {
            return Err(TrackingCodeError::InvalidFormat);
        }
        Ok(Self(code))
    }

    /// Generate a fresh code for the given creation instant.
    ///
    /// The date component is the UTC creation date; the suffix is drawn
    /// fresh from the thread-local RNG on every call.
    pub fn generate(created_at: DateTime<Utc>) -> Self {
        Self::generate_with(&mut rand::thread_rng(), created_at)
    }

    /// Generate a code using the supplied RNG.
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, created_at: DateTime<Utc>) -> Self {
        let date_part = created_at.format("%Y%m%d");
        let suffix: String = rng
            .sample_iter(&Alphanumeric)
            .take(TRACKING_SUFFIX_LEN)
            .map(char::from)
            .collect();
        Self(format!("TRK-{date_part}-{suffix}"))
    }
}

impl AsRef<str> for TrackingCode {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TrackingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<TrackingCode> for String {
    fn from(value: TrackingCode) -> Self {
        value.0
    }
}

impl TryFrom<String> for TrackingCode {
    type Error = TrackingCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
