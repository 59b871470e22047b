//! Scalar units shared across the engine.

/// Token quantity. The governance token has no fractional sub-unit,
/// so amounts and vote weights are whole numbers.
pub type Amount = u64;

/// Seconds since the Unix epoch. The engine never reads a system
/// clock; every time-dependent operation takes an explicit timestamp.
pub type Timestamp = u64;

/// Seconds in one hour.
pub const SECS_PER_HOUR: u64 = 3_600;

/// Seconds in one day.
pub const SECS_PER_DAY: u64 = 86_400;

/// Seconds in one week.
pub const SECS_PER_WEEK: u64 = 7 * SECS_PER_DAY;

/// Whole hours as seconds.
pub const fn hours(n: u64) -> u64 {
    n * SECS_PER_HOUR
}

/// Whole days as seconds.
pub const fn days(n: u64) -> u64 {
    n * SECS_PER_DAY
}
