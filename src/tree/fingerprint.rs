//! Scalar fingerprint used for directory aggregation
//!
//! A BKDR-style rolling hash over Unicode scalar values. The accumulator is
//! kept in `f64` and divided by the multiplier whenever another step could
//! exceed the largest exactly-representable integer, so the result is stable
//! across runs and platforms for identical input.

/// Largest integer an `f64` represents exactly (2^53 - 1).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

const MULTIPLIER: f64 = 131.0;

/// Fingerprint an arbitrary string into a signed 64-bit value.
pub fn fingerprint(text: &str) -> i64 {
    let limit = MAX_SAFE_INTEGER / MULTIPLIER;
    let mut acc = 0.0_f64;
    for ch in text.chars() {
        if acc > limit {
            acc /= MULTIPLIER;
        }
        acc = acc * MULTIPLIER + f64::from(u32::from(ch));
    }
    acc as i64
}

/// Fingerprint `value` salted with the owning entry's path, so identical
/// content at two different paths yields different contributions.
pub fn path_salted(value: &str, path: &str) -> i64 {
    let mut salted = String::with_capacity(value.len() + path.len());
    salted.push_str(value);
    salted.push_str(path);
    fingerprint(&salted)
}
