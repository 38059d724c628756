//! Relative-time bucketing for history display.

use crate::record::HistoryRecord;
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use std::fmt;

/// Display cohort for a history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupKey {
    Today,
    Yesterday,
    LastWeek,
    LastMonth,
    Month { year: i32, month: u32 },
}

impl GroupKey {
    /// Fixed position for the relative buckets; month labels share the
    /// last slot and keep first-seen order.
    fn rank(&self) -> u8 {
        match self {
            GroupKey::Today => 0,
            GroupKey::Yesterday => 1,
            GroupKey::LastWeek => 2,
            GroupKey::LastMonth => 3,
            GroupKey::Month { .. } => 4,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Today => write!(f, "Today"),
            GroupKey::Yesterday => write!(f, "Yesterday"),
            GroupKey::LastWeek => write!(f, "Last week"),
            GroupKey::LastMonth => write!(f, "Last month"),
            GroupKey::Month { year, month } => {
                match NaiveDate::from_ymd_opt(*year, *month, 1) {
                    Some(date) => write!(f, "{}", date.format("%B %Y")),
                    None => write!(f, "{}-{:02}", year, month),
                }
            }
        }
    }
}

/// Bucket `timestamp` relative to `now`, comparing calendar dates in `now`'s
/// time zone.
///
/// Anything on or after today's date (including clock skew into the future)
/// is `Today`.
pub fn group_key<Tz: TimeZone>(timestamp: &DateTime<Utc>, now: &DateTime<Tz>) -> GroupKey {
    let tz = now.timezone();
    let today = now.date_naive();
    let date = timestamp.with_timezone(&tz).date_naive();

    if date >= today {
        return GroupKey::Today;
    }
    if today.pred_opt() == Some(date) {
        return GroupKey::Yesterday;
    }
    if let Some(week_start) = today.checked_sub_days(Days::new(7)) {
        if date >= week_start {
            return GroupKey::LastWeek;
        }
    }
    if let Some(month_start) = today.checked_sub_months(Months::new(1)) {
        if date >= month_start {
            return GroupKey::LastMonth;
        }
    }

    GroupKey::Month {
        year: date.year(),
        month: date.month(),
    }
}

/// A record with its position in the full newest-first history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub display_index: usize,
    pub record: HistoryRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryGroup {
    pub key: GroupKey,
    pub entries: Vec<HistoryEntry>,
}

impl HistoryGroup {
    pub fn label(&self) -> String {
        self.key.to_string()
    }
}

/// Group newest-first entries. Entry order inside a group is preserved.
pub fn group_history<Tz: TimeZone>(
    entries: impl IntoIterator<Item = HistoryEntry>,
    now: &DateTime<Tz>,
) -> Vec<HistoryGroup> {
    let mut groups: Vec<HistoryGroup> = Vec::new();

    for entry in entries {
        let key = group_key(&entry.record.timestamp, now);
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.entries.push(entry),
            None => groups.push(HistoryGroup {
                key,
                entries: vec![entry],
            }),
        }
    }

    groups.sort_by_key(|g| g.key.rank());
    groups
}

/// Entries for `records` (newest first) whose query contains `filter`,
/// ignoring case. `None` or an empty filter keeps everything.
pub fn filter_entries(records: Vec<HistoryRecord>, filter: Option<&str>) -> Vec<HistoryEntry> {
    let needle = filter.map(str::to_lowercase).filter(|f| !f.is_empty());

    records
        .into_iter()
        .enumerate()
        .filter(|(_, record)| match needle {
            Some(ref needle) => record.query.to_lowercase().contains(needle),
            None => true,
        })
        .map(|(display_index, record)| HistoryEntry {
            display_index,
            record,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    fn record_at(query: &str, timestamp: DateTime<Utc>) -> HistoryRecord {
        HistoryRecord {
            query: query.to_string(),
            answer_text: None,
            embedding: None,
            timestamp,
            citations: Vec::new(),
            usage: None,
            raw_response: serde_json::Value::Null,
        }
    }

    fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_relative_buckets() {
        let now = noon(2024, 6, 20);

        assert_eq!(group_key(&now, &now), GroupKey::Today);
        assert_eq!(group_key(&(now - Duration::days(1)), &now), GroupKey::Yesterday);
        assert_eq!(group_key(&(now - Duration::days(3)), &now), GroupKey::LastWeek);
        assert_eq!(group_key(&(now - Duration::days(7)), &now), GroupKey::LastWeek);
        assert_eq!(group_key(&(now - Duration::days(10)), &now), GroupKey::LastMonth);
        assert_eq!(
            group_key(&noon(2024, 3, 2), &now),
            GroupKey::Month { year: 2024, month: 3 }
        );
    }

    #[test]
    fn test_earlier_today_is_today() {
        let now = Utc.with_ymd_and_hms(2024, 6, 20, 23, 59, 0).unwrap();
        let morning = Utc.with_ymd_and_hms(2024, 6, 20, 0, 1, 0).unwrap();
        assert_eq!(group_key(&morning, &now), GroupKey::Today);
    }

    #[test]
    fn test_future_timestamp_is_today() {
        let now = noon(2024, 6, 20);
        assert_eq!(group_key(&(now + Duration::days(2)), &now), GroupKey::Today);
    }

    #[test]
    fn test_local_calendar_dates() {
        // 23:30 UTC on the 19th is already the 20th at UTC+2.
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 6, 20, 9, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 6, 19, 23, 30, 0).unwrap();

        assert_eq!(group_key(&late, &now), GroupKey::Today);
        assert_eq!(group_key(&late, &now.with_timezone(&Utc)), GroupKey::Yesterday);
    }

    #[test]
    fn test_month_label() {
        let key = GroupKey::Month { year: 2023, month: 11 };
        assert_eq!(key.to_string(), "November 2023");
        assert_eq!(GroupKey::LastWeek.to_string(), "Last week");
    }

    #[test]
    fn test_group_order_and_entry_order() {
        let now = noon(2024, 6, 20);
        let records = vec![
            record_at("today newest", now),
            record_at("today older", now - Duration::hours(2)),
            record_at("march", noon(2024, 3, 5)),
            record_at("yesterday", now - Duration::days(1)),
            record_at("january", noon(2024, 1, 9)),
            record_at("february", noon(2024, 2, 9)),
        ];

        let groups = group_history(filter_entries(records, None), &now);
        let labels: Vec<String> = groups.iter().map(|g| g.label()).collect();
        assert_eq!(
            labels,
            vec!["Today", "Yesterday", "March 2024", "January 2024", "February 2024"]
        );

        let today: Vec<&str> = groups[0]
            .entries
            .iter()
            .map(|e| e.record.query.as_str())
            .collect();
        assert_eq!(today, vec!["today newest", "today older"]);
    }

    #[test]
    fn test_filter_keeps_display_indices() {
        let now = noon(2024, 6, 20);
        let records = vec![
            record_at("Rust lifetimes", now),
            record_at("banana bread", now),
            record_at("rust async", now),
        ];

        let entries = filter_entries(records, Some("RUST"));
        let indices: Vec<usize> = entries.iter().map(|e| e.display_index).collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let now = noon(2024, 6, 20);
        let records = vec![record_at("a", now), record_at("b", now)];
        assert_eq!(filter_entries(records, Some("")).len(), 2);
    }

    #[test]
    fn test_filter_whitespace_is_significant() {
        let now = noon(2024, 6, 20);
        let records = vec![
            record_at("Banana bread recipe", now),
            record_at("breadcrumbs in rust", now),
        ];

        let hits = filter_entries(records.clone(), Some(" Bread"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.query, "Banana bread recipe");

        assert!(filter_entries(records, Some("   ")).is_empty());
    }
}
