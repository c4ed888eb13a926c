//! Satoshi / millisatoshi conversions.
//!
//! Public APIs take and return satoshis. Core Lightning speaks millisatoshi
//! on the wire; LND speaks whole satoshis.

use crate::{Error, Result};

/// Millisatoshis per satoshi.
pub const MSAT_PER_SAT: u64 = 1000;

/// Convert satoshis to millisatoshis, failing on overflow.
pub fn sat_to_msat(sat: u64) -> Result<u64> {
    sat.checked_mul(MSAT_PER_SAT)
        .ok_or_else(|| Error::InvalidInput(format!("amount of {sat} sats is too large")))
}

/// Convert millisatoshis to whole satoshis, dropping any remainder.
pub const fn msat_to_sat(msat: u64) -> u64 {
    msat / MSAT_PER_SAT
}
