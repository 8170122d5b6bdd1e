//! Weight-based delivery fee calculation.

use crate::domain::parcel::{Fee, ParcelValidationError, Weight};

/// Default charge per weight unit, in currency units.
pub const DEFAULT_FEE_RATE: f64 = 10.0;

/// Derive the delivery fee from a parcel weight.
///
/// Pure function: fee = weight x per-unit rate. The only failure mode is
/// a pathological rate producing a non-finite product.
pub fn fee_for_weight(weight: Weight, rate_per_unit: f64) -> Result<Fee, ParcelValidationError> {
    Fee::new(weight.value() * rate_per_unit)
}
