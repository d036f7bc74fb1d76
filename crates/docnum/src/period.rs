use core::fmt;

const MILLIS_PER_DAY: u64 = 86_400_000;

/// The calendar-month bucket (`YYYYMM`) within which sequence numbers are
/// scoped and restart at 1.
///
/// A period is derived purely from a wall-clock timestamp. There is no
/// explicit rollover operation anywhere in the allocator: the first
/// allocation of a new month simply finds no matching rows under the new
/// period prefix and restarts the sequence.
///
/// # Example
///
/// ```
/// use docnum::Period;
///
/// // 2025-01-01T00:00:00Z
/// let period = Period::from_unix_millis(1_735_689_600_000);
/// assert_eq!(period.year(), 2025);
/// assert_eq!(period.month(), 1);
/// assert_eq!(period.to_string(), "202501");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u8,
}

impl Period {
    /// Computes the period containing the given unix-millisecond timestamp.
    pub fn from_unix_millis(millis: u64) -> Self {
        let days = (millis / MILLIS_PER_DAY) as i64;
        let (year, month, _day) = civil_from_days(days);
        Self {
            year: year as i32,
            month,
        }
    }

    pub const fn year(&self) -> i32 {
        self.year
    }

    /// 1-based calendar month.
    pub const fn month(&self) -> u8 {
        self.month
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

/// Converts days since 1970-01-01 into a proleptic Gregorian `(year, month,
/// day)` triple. Howard Hinnant's `civil_from_days` algorithm.
fn civil_from_days(z: i64) -> (i64, u8, u8) {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097; // [0, 146096]
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365; // [0, 399]
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // [0, 365]
    let mp = (5 * doy + 2) / 153; // [0, 11]
    let d = (doy - (153 * mp + 2) / 5 + 1) as u8; // [1, 31]
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u8; // [1, 12]
    (if m <= 2 { y + 1 } else { y }, m, d)
}
