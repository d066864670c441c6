//! Elapsed-time policy for closed loans.
//!
//! Three floor buckets, no fractions, no localisation beyond the Spanish
//! unit suffixes:
//!
//! | elapsed            | rendered          |
//! |--------------------|-------------------|
//! | < 60 minutes       | `"N minuto(s)"`   |
//! | < 24 hours         | `"N hora(s)"`     |
//! | otherwise          | `"N día(s)"`      |
//!
//! Division floors toward negative infinity, so a return stamped before its
//! loan renders as a negative minute count instead of panicking.

use std::fmt;

use chrono::{DateTime, Utc};

const MS_PER_MINUTE: i64 = 60 * 1000;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Elapsed {
    Minutes(i64),
    Hours(i64),
    Days(i64),
}

impl Elapsed {
    pub fn from_millis(ms: i64) -> Self {
        let minutes = ms.div_euclid(MS_PER_MINUTE);
        let hours = ms.div_euclid(MS_PER_HOUR);
        let days = ms.div_euclid(MS_PER_DAY);

        if minutes < 60 {
            Elapsed::Minutes(minutes)
        } else if hours < 24 {
            Elapsed::Hours(hours)
        } else {
            Elapsed::Days(days)
        }
    }

    /// Elapsed time from `loaned_at` to `returned_at`.
    pub fn between(loaned_at: DateTime<Utc>, returned_at: DateTime<Utc>) -> Self {
        let ms = returned_at
            .signed_duration_since(loaned_at)
            .num_milliseconds();
        Self::from_millis(ms)
    }
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Elapsed::Minutes(n) => write!(f, "{n} minuto(s)"),
            Elapsed::Hours(n) => write!(f, "{n} hora(s)"),
            Elapsed::Days(n) => write!(f, "{n} día(s)"),
        }
    }
}
