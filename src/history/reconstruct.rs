//! Sparse histories and the views derived from them.

use std::collections::BTreeMap;
use std::ops::Bound;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;

/// A sampled value: a cumulative ordinal or a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum HistoryValue {
    Count(u64),
    Label(String),
}

impl HistoryValue {
    pub fn as_count(&self) -> Option<u64> {
        match self {
            HistoryValue::Count(n) => Some(*n),
            HistoryValue::Label(_) => None,
        }
    }
}

/// Timestamp key → sampled value, ordered by key.
///
/// Keys are ISO-8601 strings, so lexicographic order is chronological.
/// A key, once recorded, is never overwritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct History {
    points: BTreeMap<String, HistoryValue>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` at `key` unless the key is already present.
    /// Returns whether the point was inserted.
    pub fn record(&mut self, key: impl Into<String>, value: HistoryValue) -> bool {
        let mut inserted = false;
        self.points.entry(key.into()).or_insert_with(|| {
            inserted = true;
            value
        });
        inserted
    }

    pub fn get(&self, key: &str) -> Option<&HistoryValue> {
        self.points.get(key)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HistoryValue)> {
        self.points.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Latest value with a key from `lower` up to `upper`.
    fn last_between(&self, lower: &str, upper: Bound<&str>) -> Option<&HistoryValue> {
        self.points
            .range::<str, _>((Bound::Included(lower), upper))
            .next_back()
            .map(|(_, v)| v)
    }
}

/// One chart point: epoch milliseconds against a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisPoint {
    pub x: i64,
    pub y: HistoryValue,
}

/// Parse a history key: an RFC 3339 timestamp or a bare `YYYY-MM-DD` day.
pub fn parse_key(key: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(key) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(key, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Chart points for every key of `history`, in key order.
///
/// Keys that are not timestamps are skipped.
pub fn to_axis_series(history: &History) -> Vec<AxisPoint> {
    history
        .iter()
        .filter_map(|(key, value)| match parse_key(key) {
            Some(dt) => Some(AxisPoint {
                x: dt.timestamp_millis(),
                y: value.clone(),
            }),
            None => {
                tracing::debug!("Skipping unparseable history key {:?}", key);
                None
            }
        })
        .collect()
}

fn month_index(day: NaiveDate) -> i32 {
    day.year() * 12 + day.month0() as i32
}

fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Value recorded at `target`, or at the closest earlier day.
///
/// `target` is a `YYYY-MM-DD` day or a full timestamp. An exact key hit
/// returns immediately. Otherwise days are walked backwards and the latest
/// value of the first non-empty day wins; on the target day itself only
/// keys up to `target` count. The walk gives up after crossing more than
/// one month boundary.
pub fn nearest_value_before<'a>(history: &'a History, target: &str) -> Option<&'a HistoryValue> {
    if let Some(value) = history.get(target) {
        return Some(value);
    }

    let day = target
        .get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())?;
    let target_month = month_index(day);

    let mut current = day;
    loop {
        if target_month - month_index(current) > 1 {
            return None;
        }

        let lower = day_key(current);
        let next = current.succ_opt().map(day_key);
        let found = if current == day && target.len() > 10 {
            history.last_between(&lower, Bound::Included(target))
        } else {
            match &next {
                Some(next) => history.last_between(&lower, Bound::Excluded(next.as_str())),
                None => history.last_between(&lower, Bound::Unbounded),
            }
        };
        if found.is_some() {
            return found;
        }

        current = current.pred_opt()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(points: &[(&str, u64)]) -> History {
        let mut history = History::new();
        for (key, n) in points {
            history.record(*key, HistoryValue::Count(*n));
        }
        history
    }

    #[test]
    fn test_record_never_overwrites() {
        let mut history = History::new();
        assert!(history.record("2020-01-01T00:00:00Z", HistoryValue::Count(1)));
        assert!(!history.record("2020-01-01T00:00:00Z", HistoryValue::Count(99)));
        assert_eq!(history.get("2020-01-01T00:00:00Z"), Some(&HistoryValue::Count(1)));
    }

    #[test]
    fn test_axis_series_sorted() {
        let history = counts(&[
            ("2020-03-01T00:00:00Z", 41),
            ("2020-01-01T00:00:00Z", 1),
            ("garbage", 7),
            ("2020-02-01", 21),
        ]);
        let series = to_axis_series(&history);
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].x, 1_577_836_800_000);
        assert_eq!(series[0].y, HistoryValue::Count(1));
        assert_eq!(series[1].y, HistoryValue::Count(21));
        assert!(series.windows(2).all(|w| w[0].x < w[1].x));
    }

    #[test]
    fn test_axis_series_serializes_flat() {
        let mut history = counts(&[("2020-01-01T00:00:00Z", 5)]);
        history.record("2020-01-02T00:00:00Z", HistoryValue::Label("v1.0".into()));
        let json = serde_json::to_value(to_axis_series(&history)).unwrap();
        assert_eq!(json[0]["y"], 5);
        assert_eq!(json[1]["y"], "v1.0");
    }

    #[test]
    fn test_nearest_exact_key() {
        let history = counts(&[("2021-06-15", 300), ("2021-06-15T12:00:00Z", 310)]);
        assert_eq!(nearest_value_before(&history, "2021-06-15"), Some(&HistoryValue::Count(300)));
        assert_eq!(
            nearest_value_before(&history, "2021-06-15T12:00:00Z"),
            Some(&HistoryValue::Count(310))
        );
    }

    #[test]
    fn test_nearest_takes_latest_of_day() {
        let history = counts(&[
            ("2021-06-10T01:00:00Z", 100),
            ("2021-06-10T22:00:00Z", 120),
            ("2021-06-11T08:00:00Z", 130),
        ]);
        assert_eq!(nearest_value_before(&history, "2021-06-10"), Some(&HistoryValue::Count(120)));
        assert_eq!(nearest_value_before(&history, "2021-06-11"), Some(&HistoryValue::Count(130)));
    }

    #[test]
    fn test_nearest_ignores_later_same_day() {
        let history = counts(&[("2021-06-09T10:00:00Z", 90), ("2021-06-10T22:00:00Z", 120)]);
        assert_eq!(
            nearest_value_before(&history, "2021-06-10T08:00:00Z"),
            Some(&HistoryValue::Count(90))
        );
    }

    #[test]
    fn test_nearest_walks_back_across_one_month() {
        let history = counts(&[("2021-05-03T09:00:00Z", 42)]);
        // June 20 -> back through June into May: one boundary crossed.
        assert_eq!(nearest_value_before(&history, "2021-06-20"), Some(&HistoryValue::Count(42)));
    }

    #[test]
    fn test_nearest_gives_up_after_two_boundaries() {
        let history = counts(&[("2021-04-28T09:00:00Z", 42)]);
        // June 2 -> May -> April would cross two boundaries.
        assert_eq!(nearest_value_before(&history, "2021-06-02"), None);
    }

    #[test]
    fn test_nearest_across_year_boundary() {
        let history = counts(&[("2020-12-24T00:00:00Z", 7)]);
        assert_eq!(nearest_value_before(&history, "2021-01-10"), Some(&HistoryValue::Count(7)));
    }

    #[test]
    fn test_nearest_before_any_sample() {
        let history = counts(&[("2021-06-01T00:00:00Z", 1), ("2021-07-01T00:00:00Z", 100)]);
        assert_eq!(nearest_value_before(&history, "2021-04-15"), None);
        assert_eq!(nearest_value_before(&history, "2021-05-31"), None);
        assert_eq!(nearest_value_before(&History::new(), "2021-05-31"), None);
    }

    #[test]
    fn test_nearest_rejects_bad_target() {
        let history = counts(&[("2021-06-01T00:00:00Z", 1)]);
        assert_eq!(nearest_value_before(&history, "yesterday"), None);
    }
}
