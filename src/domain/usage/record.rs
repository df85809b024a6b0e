//! Per-day usage records

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Usage accounting for one API key on one UTC calendar day.
///
/// Created lazily on the first admitted request of the day and never deleted
/// by the gateway; retention is an external concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageDay {
    /// The key the usage belongs to
    pub api_key: String,
    /// UTC calendar day, serialized as YYYY-MM-DD
    pub date: NaiveDate,
    /// Total requests that day
    pub count: u64,
    /// Request count per endpoint path
    pub endpoints: HashMap<String, u64>,
    /// Set once, when the day's record is created
    pub first_access: DateTime<Utc>,
    /// Overwritten on every request
    pub last_access: DateTime<Utc>,
}

impl UsageDay {
    /// Create the day's record from its first hit
    pub fn first_hit(api_key: impl Into<String>, endpoint: &str, at: DateTime<Utc>) -> Self {
        let mut endpoints = HashMap::new();
        endpoints.insert(endpoint.to_string(), 1);

        Self {
            api_key: api_key.into(),
            date: at.date_naive(),
            count: 1,
            endpoints,
            first_access: at,
            last_access: at,
        }
    }

    /// Fold one more hit into the record
    pub fn add_hit(&mut self, endpoint: &str, at: DateTime<Utc>) {
        self.count += 1;
        *self.endpoints.entry(endpoint.to_string()).or_insert(0) += 1;
        self.last_access = at;
    }
}

/// Optional date-range filter for usage queries, both bounds inclusive
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl UsageQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start(mut self, start: NaiveDate) -> Self {
        self.start_date = Some(start);
        self
    }

    pub fn with_end(mut self, end: NaiveDate) -> Self {
        self.end_date = Some(end);
        self
    }

    /// Whether a day falls inside the range
    pub fn matches(&self, date: NaiveDate) -> bool {
        if let Some(start) = self.start_date {
            if date < start {
                return false;
            }
        }

        if let Some(end) = self.end_date {
            if date > end {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, h, 0, 0).unwrap()
    }

    #[test]
    fn test_first_hit() {
        let day = UsageDay::first_hit("key1", "/api/secure-data", at(9));

        assert_eq!(day.count, 1);
        assert_eq!(day.endpoints.get("/api/secure-data"), Some(&1));
        assert_eq!(day.first_access, at(9));
        assert_eq!(day.last_access, at(9));
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2024, 5, 17).unwrap());
    }

    #[test]
    fn test_add_hit_updates_counts_and_last_access() {
        let mut day = UsageDay::first_hit("key1", "/api/secure-data", at(9));
        day.add_hit("/api/usage-stats", at(10));
        day.add_hit("/api/secure-data", at(11));

        assert_eq!(day.count, 3);
        assert_eq!(day.endpoints.get("/api/secure-data"), Some(&2));
        assert_eq!(day.endpoints.get("/api/usage-stats"), Some(&1));
        // first_access is immutable after creation
        assert_eq!(day.first_access, at(9));
        assert_eq!(day.last_access, at(11));
    }

    #[test]
    fn test_endpoints_sum_to_count() {
        let mut day = UsageDay::first_hit("key1", "/a", at(1));

        for _ in 0..4 {
            day.add_hit("/b", at(2));
        }
        day.add_hit("/a", at(3));

        let sum: u64 = day.endpoints.values().sum();
        assert_eq!(sum, day.count);
    }

    #[test]
    fn test_date_serializes_as_iso_day() {
        let day = UsageDay::first_hit("key1", "/a", at(1));
        let json = serde_json::to_value(&day).unwrap();
        assert_eq!(json["date"], "2024-05-17");
    }

    #[test]
    fn test_query_range_matching() {
        let may = |d| NaiveDate::from_ymd_opt(2024, 5, d).unwrap();

        let open = UsageQuery::new();
        assert!(open.matches(may(1)));

        let bounded = UsageQuery::new().with_start(may(10)).with_end(may(20));
        assert!(!bounded.matches(may(9)));
        assert!(bounded.matches(may(10)));
        assert!(bounded.matches(may(20)));
        assert!(!bounded.matches(may(21)));
    }
}
