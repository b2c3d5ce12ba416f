use chrono::{NaiveDateTime, TimeDelta, Timelike};
use serde::Deserialize;

use std::fmt;

use crate::error::AlignError;

/// Width of the output grid in minutes.
///
/// Grid boundaries are computed from the minute-of-hour field, so the width
/// is limited to one hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "u32")]
pub struct Resolution(u32);

impl Resolution {
    pub const MAX_MINUTES: u32 = 60;

    pub fn new(minutes: u32) -> Result<Self, AlignError> {
        if minutes == 0 || minutes > Self::MAX_MINUTES {
            return Err(AlignError::InvalidResolution(minutes));
        }
        Ok(Self(minutes))
    }

    pub fn minutes(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Resolution {
    type Error = AlignError;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::new(minutes)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}min", self.0)
    }
}

/// Snap `ts` to the nearest grid boundary.
///
/// With `m = minute % r`, the timestamp moves back by `m` minutes when
/// `m <= r / 2` and forward by `r - m` otherwise, so an exact half goes to the
/// earlier boundary. Seconds and sub-second fields are dropped, which makes
/// every sample that rounds to the same minute share one bucket key.
///
/// Returns `None` when the grid point falls outside the representable range.
pub fn round_to_grid(ts: NaiveDateTime, resolution: Resolution) -> Option<NaiveDateTime> {
    let r = i64::from(resolution.minutes());
    let m = i64::from(ts.minute()) % r;

    let minute_start = ts
        .checked_sub_signed(TimeDelta::seconds(i64::from(ts.second())))?
        .checked_sub_signed(TimeDelta::nanoseconds(i64::from(ts.nanosecond())))?;

    // 2m <= r is `m <= r / 2` without losing the half on odd widths.
    if 2 * m <= r {
        minute_start.checked_sub_signed(TimeDelta::minutes(m))
    } else {
        minute_start.checked_add_signed(TimeDelta::minutes(r - m))
    }
}
