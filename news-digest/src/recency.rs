use crate::types::RawEntry;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::info;

pub const DEFAULT_WINDOW_HOURS: i64 = 24;

/// Keep entries published strictly after `now - window_hours`.
///
/// Entries without a timestamp are dropped. Input order is preserved.
/// A window reaching past the representable range keeps every dated entry.
pub fn filter_recent(entries: Vec<RawEntry>, window_hours: i64, now: DateTime<Utc>) -> Vec<RawEntry> {
    let cutoff = TimeDelta::try_hours(window_hours)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let total = entries.len();

    let recent: Vec<RawEntry> = entries
        .into_iter()
        .filter(|entry| entry.published.map(|published| published > cutoff).unwrap_or(false))
        .collect();

    info!("Filtered {} recent entries from {} total", recent.len(), total);
    recent
}
