//! Relative age expressions for retention cutoffs.
//!
//! Grammar: `-<count> <unit>` where unit is one of second, minute,
//! hour, day, week, month, year (plural accepted). The leading `-` is
//! optional; expressions always reach into the past.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, Months, Utc};

/// Evaluate an age expression relative to `now`.
pub fn parse_expr(expr: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let trimmed = expr.trim().trim_start_matches('-').trim();
    let (count, unit) = trimmed
        .split_once(char::is_whitespace)
        .with_context(|| format!("malformed age expression `{expr}` (expected `-N unit`)"))?;
    let count: u32 = count
        .trim()
        .parse()
        .with_context(|| format!("bad count in age expression `{expr}`"))?;

    let unit = unit.trim().trim_end_matches('s');
    let cutoff = match unit {
        "second" => now - Duration::seconds(i64::from(count)),
        "minute" => now - Duration::minutes(i64::from(count)),
        "hour" => now - Duration::hours(i64::from(count)),
        "day" => now - Duration::days(i64::from(count)),
        "week" => now - Duration::weeks(i64::from(count)),
        // Calendar arithmetic: clamps to the last day of short months
        "month" => now
            .checked_sub_months(Months::new(count))
            .with_context(|| format!("age expression `{expr}` out of range"))?,
        "year" => now
            .checked_sub_months(Months::new(count.saturating_mul(12)))
            .with_context(|| format!("age expression `{expr}` out of range"))?,
        other => bail!("unknown unit `{other}` in age expression `{expr}`"),
    };
    Ok(cutoff)
}

/// Pick the retention cutoff: the explicit expression when given and
/// valid, otherwise the configured default.
///
/// A cutoff in the future would purge everything not protected by a
/// record, so an expression that resolves to now-or-later is rejected
/// and the default takes over.
pub fn resolve_cutoff(
    expr: Option<&str>,
    default_expr: &str,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    if let Some(expr) = expr {
        match parse_expr(expr, now) {
            Ok(cutoff) if cutoff < now => return Ok(cutoff),
            Ok(_) => {
                crate::log!("purge"; "ignoring non-past cutoff `{expr}`, using default `{default_expr}`");
            }
            Err(e) => {
                crate::log!("purge"; "ignoring bad cutoff `{expr}` ({e}), using default `{default_expr}`");
            }
        }
    }
    let cutoff = parse_expr(default_expr, now)
        .with_context(|| format!("bad default retention `{default_expr}`"))?;
    if cutoff >= now {
        bail!("default retention `{default_expr}` is not in the past");
    }
    Ok(cutoff)
}
