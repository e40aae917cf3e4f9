//! Conversion of exact wei amounts into floating-point display units.
//!
//! This is the only place where monetary values lose precision; aggregation never goes
//! through here.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::Serialize;
use strum::Display;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Display)]
pub enum Unit {
    #[strum(serialize = "GWEI")]
    Gwei,
    #[strum(serialize = "ETH")]
    Ether,
}

impl Unit {
    pub const fn decimals(self) -> u32 {
        match self {
            Unit::Gwei => 9,
            Unit::Ether => 18,
        }
    }

    pub fn to_display(self, wei: &BigUint) -> f64 {
        if wei.is_zero() {
            return 0.0;
        }
        let scale = BigUint::from(10u8).pow(self.decimals());
        let whole = (wei / &scale).to_f64().unwrap_or(f64::INFINITY);
        let fraction = (wei % &scale).to_f64().unwrap_or_default();
        whole + fraction / 10f64.powi(self.decimals() as i32)
    }
}
