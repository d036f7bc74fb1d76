use std::time::{SystemTime, UNIX_EPOCH};

/// A trait for time sources that return wall-clock unix time.
///
/// This abstraction allows you to plug in the real system clock or a mocked
/// time source in tests. Allocation periods are derived from the calendar, so
/// implementations are expected to return **milliseconds since the Unix
/// epoch**, tracking wall-clock adjustments rather than a monotonic timer.
///
/// # Example
///
/// ```
/// use docnum::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn current_millis(&self) -> u64;
}

/// A [`TimeSource`] backed by [`SystemTime`].
///
/// This is the production clock. It deliberately follows external clock
/// adjustments (NTP, timezone-independent UTC steps): the allocator buckets
/// identifiers by calendar month, and those buckets must agree with the wall
/// clock, not with process uptime.
#[derive(Default, Clone, Copy, Debug)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("System clock before UNIX_EPOCH")
            .as_millis() as u64
    }
}
