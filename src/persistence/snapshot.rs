use crate::domain::Activity;
use serde::{Deserialize, Serialize};

/// Storage key the activity snapshot lives under
pub const STORAGE_KEY: &str = "activity-storage";

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 0;

/// Persisted part of the store state (hydration flag excluded)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub activities: Vec<Activity>,
}

/// On-disk envelope: `{"state": {...}, "version": 0}`
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    state: Snapshot,
    #[serde(default)]
    version: u32,
}

/// Serialize the full activity list
pub fn encode_snapshot(activities: &[Activity]) -> serde_json::Result<String> {
    #[derive(Serialize)]
    struct EnvelopeRef<'a> {
        state: StateRef<'a>,
        version: u32,
    }

    #[derive(Serialize)]
    struct StateRef<'a> {
        activities: &'a [Activity],
    }

    serde_json::to_string_pretty(&EnvelopeRef {
        state: StateRef { activities },
        version: SNAPSHOT_VERSION,
    })
}

/// Parse a stored snapshot
pub fn decode_snapshot(content: &str) -> serde_json::Result<Snapshot> {
    if content.trim().is_empty() {
        return Ok(Snapshot::default());
    }
    let envelope: Envelope = serde_json::from_str(content)?;
    if envelope.version != SNAPSHOT_VERSION {
        tracing::warn!(
            version = envelope.version,
            expected = SNAPSHOT_VERSION,
            "activity snapshot written by a different version"
        );
    }
    Ok(envelope.state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_empty_content() {
        assert_eq!(decode_snapshot("").unwrap(), Snapshot::default());
        assert_eq!(decode_snapshot("  \n").unwrap(), Snapshot::default());
    }

    #[test]
    fn test_decode_envelope() {
        let content = r#"{
            "state": {
                "activities": [{
                    "id": "1",
                    "title": "Walk",
                    "startDate": "2025-01-01",
                    "endDate": "2025-01-03",
                    "reminderHour": 9,
                    "reminderMinute": 15,
                    "notificationId": "abc",
                    "completion": {"2025-01-02": true}
                }],
                "hasHydrated": true
            },
            "version": 0
        }"#;

        let snapshot = decode_snapshot(content).unwrap();
        assert_eq!(snapshot.activities.len(), 1);
        let activity = &snapshot.activities[0];
        assert_eq!(activity.title, "Walk");
        assert_eq!(
            activity.notification_id.as_ref().map(|h| h.as_str()),
            Some("abc")
        );
        assert_eq!(activity.completed_days(), 1);
    }

    #[test]
    fn test_encode_shape() {
        let encoded = encode_snapshot(&[]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();

        assert_eq!(value["version"], 0);
        assert!(value["state"]["activities"].as_array().unwrap().is_empty());
        assert!(value["state"].get("hasHydrated").is_none());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_snapshot("{not json").is_err());
    }
}
