use alloy::primitives::U256;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;

use super::TokenMovement;

/// Label format of a daily bucket, e.g. `Oct 17, 2026`.
pub const DATE_LABEL_FORMAT: &str = "%b %-d, %Y";

/// Volume and count for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyBucket {
    pub date: String,
    /// Timestamp of the first event seen for this day.
    pub timestamp: u64,
    pub volume: U256,
    pub count: usize,
}

/// Bucket movements by calendar date in `tz`, ordered by bucket timestamp.
pub fn daily_series<'a, M, I, Tz>(events: I, tz: &Tz) -> Vec<DailyBucket>
where
    M: TokenMovement + ?Sized + 'a,
    I: IntoIterator<Item = &'a M>,
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut buckets: HashMap<String, DailyBucket> = HashMap::new();

    for event in events {
        let timestamp = event.timestamp();
        let date = date_label(timestamp, tz);
        let bucket = buckets.entry(date.clone()).or_insert_with(|| DailyBucket {
            date,
            timestamp,
            volume: U256::ZERO,
            count: 0,
        });
        bucket.volume = bucket.volume.saturating_add(event.amount());
        bucket.count += 1;
    }

    let mut series: Vec<DailyBucket> = buckets.into_values().collect();
    series.sort_by_key(|b| b.timestamp);
    series
}

fn date_label<Tz>(timestamp: u64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let utc: DateTime<Utc> = i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_default();
    utc.with_timezone(tz).format(DATE_LABEL_FORMAT).to_string()
}
