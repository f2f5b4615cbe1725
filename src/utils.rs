//! Identifier and numeric helpers

use bech32::Bech32m;
use uuid7::uuid7;

// construct a unique time-ordered id then encode using bech32
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    bytes_to_bech32(hrp, uuid7().as_bytes())
}

pub fn bytes_to_bech32(hrp: &str, bytes: &[u8]) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, bytes)?;
    Ok(encode)
}

/// Rounds half away from zero to `decimals` places.
///
/// The tie is compared against `value` itself rather than the scaled product,
/// so 1.0005 rounds up even though `1.0005 * 1000.0` lands below 1000.5, and
/// anything strictly below the tie rounds down.
pub fn round_half_up(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    let lower = (value.abs() * scale).floor();
    let tie = (lower + 0.5) / scale;
    let rounded = if value.abs() >= tie { lower + 1.0 } else { lower };
    value.signum() * rounded / scale
}
