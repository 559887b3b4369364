use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Values this close to an integer are treated as that integer before floor/ceil
const INTEGER_SNAP: f64 = 1e-9;

/// How new-customer counts are emitted.
///
/// The acquisition driver itself is always carried unrounded; the policy
/// only decides how many customers actually land in the stock each month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    #[default]
    Unrounded,
    /// Two decimal places, banker's rounding
    Cents,
    /// Whole customers, rounded down
    Floor,
    /// Whole customers, rounded up
    Ceil,
}

impl RoundingPolicy {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            RoundingPolicy::Unrounded => value,
            RoundingPolicy::Cents => round_cents(value),
            RoundingPolicy::Floor => snap_to_integer(value).floor(),
            RoundingPolicy::Ceil => snap_to_integer(value).ceil(),
        }
    }
}

impl FromStr for RoundingPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unrounded" | "none" => Ok(RoundingPolicy::Unrounded),
            "cents" => Ok(RoundingPolicy::Cents),
            "floor" => Ok(RoundingPolicy::Floor),
            "ceil" => Ok(RoundingPolicy::Ceil),
            _ => anyhow::bail!(
                "Invalid ROUNDING_POLICY: {}. Must be 'unrounded', 'cents', 'floor', or 'ceil'",
                s
            ),
        }
    }
}

impl fmt::Display for RoundingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundingPolicy::Unrounded => write!(f, "unrounded"),
            RoundingPolicy::Cents => write!(f, "cents"),
            RoundingPolicy::Floor => write!(f, "floor"),
            RoundingPolicy::Ceil => write!(f, "ceil"),
        }
    }
}

/// Round a currency or count value to 2 decimal places (half to even).
pub fn round_cents(value: f64) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

fn snap_to_integer(value: f64) -> f64 {
    let nearest = value.round();
    if (value - nearest).abs() < INTEGER_SNAP {
        nearest
    } else {
        value
    }
}
