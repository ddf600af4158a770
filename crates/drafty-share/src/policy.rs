//! Sharing policy helpers for hosts
//!
//! Which subjects may be shared, how requested durations are turned into
//! seconds, and how an expiry is described to a person.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ShareError;
use crate::grant::UnixSeconds;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;
const MONTH: u64 = 30 * DAY;
const YEAR: u64 = 365 * DAY;

/// Publication state of a subject as reported by the host
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectStatus {
    Draft,
    Future,
    Pending,
    Publish,
    Private,
    Trash,
}

impl SubjectStatus {
    /// Only content that is not yet public can be shared by link
    pub fn is_shareable(&self) -> bool {
        matches!(
            self,
            SubjectStatus::Draft | SubjectStatus::Future | SubjectStatus::Pending
        )
    }
}

impl FromStr for SubjectStatus {
    type Err = ShareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(SubjectStatus::Draft),
            "future" => Ok(SubjectStatus::Future),
            "pending" => Ok(SubjectStatus::Pending),
            "publish" => Ok(SubjectStatus::Publish),
            "private" => Ok(SubjectStatus::Private),
            "trash" => Ok(SubjectStatus::Trash),
            other => Err(ShareError::UnknownStatus(other.to_owned())),
        }
    }
}

/// Unit of a requested share duration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    pub fn seconds(&self) -> u64 {
        match self {
            TimeUnit::Seconds => 1,
            TimeUnit::Minutes => MINUTE,
            TimeUnit::Hours => HOUR,
            TimeUnit::Days => DAY,
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "" | "s" => Some(TimeUnit::Seconds),
            "m" => Some(TimeUnit::Minutes),
            "h" => Some(TimeUnit::Hours),
            "d" => Some(TimeUnit::Days),
            _ => None,
        }
    }
}

/// A non-negative share duration in seconds
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ShareDuration(u64);

impl ShareDuration {
    /// Negative amounts clamp to zero
    pub fn from_amount(amount: i64, unit: TimeUnit) -> Self {
        let amount = u64::try_from(amount).unwrap_or(0);
        Self(amount.saturating_mul(unit.seconds()))
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }
}

impl Default for ShareDuration {
    /// Two hours
    fn default() -> Self {
        Self(2 * HOUR)
    }
}

impl FromStr for ShareDuration {
    type Err = ShareError;

    /// `"<amount><unit>"` with unit one of `s`, `m`, `h`, `d`; bare numbers are seconds
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, suffix) = s.split_at(split);

        if digits.is_empty() {
            return Err(ShareError::InvalidDuration(format!("missing amount in {s:?}")));
        }
        let amount: u64 = digits
            .parse()
            .map_err(|_| ShareError::InvalidDuration(format!("amount out of range in {s:?}")))?;
        let unit = TimeUnit::from_suffix(suffix)
            .ok_or_else(|| ShareError::InvalidDuration(format!("unknown unit {suffix:?}")))?;
        let secs = amount
            .checked_mul(unit.seconds())
            .ok_or_else(|| ShareError::InvalidDuration(format!("{s:?} is too long")))?;
        Ok(Self(secs))
    }
}

impl fmt::Display for ShareDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&human_duration(self.0))
    }
}

/// `"In 3 hours."` while the expiry lies ahead, `"Expired."` after
pub fn describe_expiry(expires_at: UnixSeconds, now: UnixSeconds) -> String {
    match u64::try_from(expires_at.saturating_sub(now)) {
        Ok(diff) if diff > 0 => format!("In {}.", human_duration(diff)),
        _ => "Expired.".to_owned(),
    }
}

/// Coarse, rounded rendering of a span of seconds, e.g. `"2 days"`
///
/// Never finer than minutes: anything under 90 seconds reads `"1 min"`.
pub fn human_duration(secs: u64) -> String {
    let (count, singular, plural) = if secs < HOUR {
        (rounded(secs, MINUTE), "min", "mins")
    } else if secs < DAY {
        (rounded(secs, HOUR), "hour", "hours")
    } else if secs < WEEK {
        (rounded(secs, DAY), "day", "days")
    } else if secs < MONTH {
        (rounded(secs, WEEK), "week", "weeks")
    } else if secs < YEAR {
        (rounded(secs, MONTH), "month", "months")
    } else {
        (rounded(secs, YEAR), "year", "years")
    };

    let count = count.max(1);
    let unit = if count == 1 { singular } else { plural };
    format!("{count} {unit}")
}

fn rounded(secs: u64, unit: u64) -> u64 {
    secs / unit + u64::from(secs % unit >= unit / 2)
}
