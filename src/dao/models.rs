use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Durable record of the live shoot this client is currently part of.
///
/// Serialised as `{shootCode, archerName, roundName, joinedAt}` with `joinedAt`
/// in epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSessionRecord {
    /// Code of the shoot the archer joined.
    pub shoot_code: String,
    /// Name the archer joined under.
    pub archer_name: String,
    /// Round the archer is shooting.
    pub round_name: String,
    /// Join time in milliseconds since the Unix epoch.
    pub joined_at: i64,
}

impl PersistedSessionRecord {
    /// Build a record stamped with the current time.
    pub fn new(
        shoot_code: impl Into<String>,
        archer_name: impl Into<String>,
        round_name: impl Into<String>,
    ) -> Self {
        Self {
            shoot_code: shoot_code.into(),
            archer_name: archer_name.into(),
            round_name: round_name.into(),
            joined_at: now_millis(),
        }
    }

    /// Age of the record relative to `now_ms`. Records stamped in the future count as fresh.
    pub fn age_at(&self, now_ms: i64) -> Duration {
        let elapsed = now_ms.saturating_sub(self.joined_at).max(0);
        Duration::from_millis(elapsed as u64)
    }

    /// Whether the record is older than `max_age` at `now_ms`.
    pub fn is_expired_at(&self, now_ms: i64, max_age: Duration) -> bool {
        self.age_at(now_ms) > max_age
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    #[test]
    fn serialises_with_camel_case_keys() {
        let record = PersistedSessionRecord {
            shoot_code: "AB12".into(),
            archer_name: "Bob".into(),
            round_name: "national".into(),
            joined_at: 1_700_000_000_000,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["shootCode"], "AB12");
        assert_eq!(json["archerName"], "Bob");
        assert_eq!(json["roundName"], "national");
        assert_eq!(json["joinedAt"], 1_700_000_000_000_i64);
    }

    #[test]
    fn expiry_uses_max_age_boundary() {
        let now = 10 * DAY.as_millis() as i64;
        let mut record = PersistedSessionRecord::new("AB12", "Bob", "national");

        record.joined_at = now - 1000;
        assert!(!record.is_expired_at(now, DAY));

        record.joined_at = now - DAY.as_millis() as i64;
        assert!(!record.is_expired_at(now, DAY));

        record.joined_at = now - DAY.as_millis() as i64 - 1;
        assert!(record.is_expired_at(now, DAY));
    }

    #[test]
    fn future_timestamps_are_not_expired() {
        let mut record = PersistedSessionRecord::new("AB12", "Bob", "national");
        record.joined_at = now_millis() + 60_000;
        assert_eq!(record.age_at(now_millis()), Duration::ZERO);
    }
}
