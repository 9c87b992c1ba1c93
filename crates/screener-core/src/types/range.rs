//! Look-back range presets for candle requests.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exchange local time (IST, UTC+05:30).
pub fn market_offset() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).expect("valid IST offset")
}

/// Cash market open in exchange local time.
const MARKET_OPEN: (u32, u32) = (9, 15);

/// Named look-back window ending "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RangePreset {
    /// From today's market open until now
    #[serde(rename = "today")]
    #[default]
    Today,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "2h")]
    Hour2,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "2d")]
    Day2,
}

impl RangePreset {
    /// Resolve the preset against the given instant.
    pub fn resolve(&self, now: DateTime<Utc>) -> TimeRange {
        let from = match self {
            RangePreset::Hour1 => now - Duration::hours(1),
            RangePreset::Hour2 => now - Duration::hours(2),
            RangePreset::Hour4 => now - Duration::hours(4),
            RangePreset::Day2 => now - Duration::days(2),
            RangePreset::Today => {
                let local = now.with_timezone(&market_offset());
                let open = NaiveTime::from_hms_opt(MARKET_OPEN.0, MARKET_OPEN.1, 0)
                    .expect("valid market open");
                local
                    .date_naive()
                    .and_time(open)
                    .and_local_timezone(market_offset())
                    .single()
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or(now)
            }
        };
        TimeRange { from, to: now }
    }
}

impl fmt::Display for RangePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RangePreset::Today => "today",
            RangePreset::Hour1 => "1h",
            RangePreset::Hour2 => "2h",
            RangePreset::Hour4 => "4h",
            RangePreset::Day2 => "2d",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for RangePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "today" => Ok(RangePreset::Today),
            "1h" => Ok(RangePreset::Hour1),
            "2h" => Ok(RangePreset::Hour2),
            "4h" => Ok(RangePreset::Hour4),
            "2d" => Ok(RangePreset::Day2),
            _ => Err(format!("Invalid range preset: {}", s)),
        }
    }
}

/// Concrete request window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    /// Format an instant as `YYYY-MM-DD HH:MM` in exchange local time.
    pub fn format_local(dt: DateTime<Utc>) -> String {
        dt.with_timezone(&market_offset())
            .format("%Y-%m-%d %H:%M")
            .to_string()
    }

    /// Range start in broker format.
    pub fn from_local(&self) -> String {
        Self::format_local(self.from)
    }

    /// Range end in broker format.
    pub fn to_local(&self) -> String {
        Self::format_local(self.to)
    }
}
