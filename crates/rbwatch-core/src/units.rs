// ── Rate units ──
//
// Two independent unit systems live here: the user-selected traffic unit
// applied to per-host and per-network byte rates, and the automatic
// k/M bit-rate rendering used for queue limits. They are deliberately
// not unified; queue limits are always bits and always auto-scaled.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Display unit for traffic rates.
///
/// A lower-case `b` in the first two characters of the symbol means bits;
/// the leading `K`/`M` selects the magnitude.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum TrafficUnit {
    #[serde(rename = "b/s")]
    #[strum(serialize = "b/s")]
    BitsPerSecond,
    #[serde(rename = "B/s")]
    #[strum(serialize = "B/s")]
    BytesPerSecond,
    #[serde(rename = "Kb/s")]
    #[strum(serialize = "Kb/s")]
    KilobitsPerSecond,
    #[serde(rename = "KB/s")]
    #[strum(serialize = "KB/s")]
    KilobytesPerSecond,
    #[default]
    #[serde(rename = "Mb/s")]
    #[strum(serialize = "Mb/s")]
    MegabitsPerSecond,
    #[serde(rename = "MB/s")]
    #[strum(serialize = "MB/s")]
    MegabytesPerSecond,
}

/// Decimal magnitude prefix of a [`TrafficUnit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Magnitude {
    Unit,
    Kilo,
    Mega,
}

impl TrafficUnit {
    pub fn symbol(self) -> &'static str {
        self.into()
    }

    pub fn is_bits(self) -> bool {
        self.symbol().chars().take(2).any(|c| c == 'b')
    }

    pub fn magnitude(self) -> Magnitude {
        match self.symbol().chars().next().map(|c| c.to_ascii_uppercase()) {
            Some('K') => Magnitude::Kilo,
            Some('M') => Magnitude::Mega,
            _ => Magnitude::Unit,
        }
    }

    /// Convert a per-second byte count into this unit.
    ///
    /// Kilo values are rounded to one decimal place, Mega values to two.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn convert(self, bytes: u64) -> f64 {
        let mut value = bytes as f64;
        if self.is_bits() {
            value *= 8.0;
        }
        match self.magnitude() {
            Magnitude::Kilo => round_to(value / 1_000.0, 1),
            Magnitude::Mega => round_to(value / 1_000_000.0, 2),
            Magnitude::Unit => value,
        }
    }

    /// Render a converted value with the precision its magnitude implies.
    pub fn format(self, value: f64) -> String {
        match self.magnitude() {
            Magnitude::Unit => format!("{value:.0}"),
            Magnitude::Kilo => format!("{value:.1}"),
            Magnitude::Mega => format!("{value:.2}"),
        }
    }
}

/// Convert a per-second byte count into `unit`.
pub fn convert(bytes: u64, unit: TrafficUnit) -> f64 {
    unit.convert(bytes)
}

/// Render a bit rate with an automatic `k`/`M` prefix, e.g. `10Mbits/s`.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn convert_bits_rate(bits: u64) -> String {
    let value = bits as f64;
    if bits >= 1_000_000 {
        format!("{:.0}Mbits/s", (value / 1_000_000.0).round_ties_even())
    } else if bits >= 1_000 {
        format!("{:.0}kbits/s", (value / 1_000.0).round_ties_even())
    } else {
        format!("{bits}bits/s")
    }
}

/// Round half-to-even at `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}
