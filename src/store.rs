//! Owned, observable activity collection mirrored to durable storage.
//!
//! Mutations are two-phase: they apply to the in-memory list immediately
//! and mark the store dirty; `persist` then writes the whole snapshot and
//! reports failure through its own error channel.

use crate::domain::{Activity, ActivityPatch, NewActivity};
use crate::persistence::{decode_snapshot, encode_snapshot, Storage, STORAGE_KEY};
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read stored activities ({key}): {cause:#}")]
    Read { key: String, cause: anyhow::Error },

    #[error("stored activities ({key}) are unreadable: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode activities: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to save activities ({key}): {cause:#}")]
    Write { key: String, cause: anyhow::Error },
}

/// Identifies a registered change listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&[Activity])>;

pub struct ActivityStore<S: Storage> {
    activities: Vec<Activity>,
    has_hydrated: bool,
    needs_save: bool,
    storage: S,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl<S: Storage> ActivityStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            activities: Vec::new(),
            has_hydrated: false,
            needs_save: false,
            storage,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Load the persisted snapshot, replacing the in-memory list.
    ///
    /// A corrupt snapshot is copied aside and reported; the store stays
    /// unhydrated so nothing overwrites the stored data.
    pub fn hydrate(&mut self) -> Result<(), StoreError> {
        let content = self
            .storage
            .get_item(STORAGE_KEY)
            .map_err(|cause| StoreError::Read {
                key: STORAGE_KEY.to_string(),
                cause,
            })?;

        let snapshot = match content.as_deref().map(decode_snapshot) {
            None => Default::default(),
            Some(Ok(snapshot)) => snapshot,
            Some(Err(source)) => {
                match self.storage.preserve_item(STORAGE_KEY) {
                    Ok(Some(location)) => warn!(%location, "copied unreadable activity snapshot"),
                    Ok(None) => {}
                    Err(e) => warn!(error = %format!("{e:#}"), "could not copy unreadable activity snapshot"),
                }
                return Err(StoreError::Corrupt {
                    key: STORAGE_KEY.to_string(),
                    source,
                });
            }
        };

        self.activities = snapshot.activities;
        self.has_hydrated = true;
        self.needs_save = false;
        info!(count = self.activities.len(), "activities rehydrated");
        self.notify();
        Ok(())
    }

    pub fn has_hydrated(&self) -> bool {
        self.has_hydrated
    }

    /// Activities, most recently added first
    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn get(&self, id: &str) -> Option<&Activity> {
        self.activities.iter().find(|a| a.id == id)
    }

    /// True when in-memory changes have not been written yet
    pub fn needs_save(&self) -> bool {
        self.needs_save
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&[Activity]) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Create an activity with a fresh id and empty completion map, newest first.
    ///
    /// Title and date ordering are not validated here.
    pub fn add_activity(&mut self, input: NewActivity) -> String {
        let id = match input.id.as_deref() {
            Some(id) if self.get(id).is_none() => id.to_string(),
            _ => self.generate_id(),
        };

        let activity = input.into_activity(id.clone());
        self.activities.insert(0, activity);
        debug!(%id, "activity added");
        self.changed();
        id
    }

    /// Merge `patch` into the activity; false if the id is unknown.
    /// Notification handles are the caller's responsibility.
    pub fn update_activity(&mut self, id: &str, patch: ActivityPatch) -> bool {
        let Some(activity) = self.activities.iter_mut().find(|a| a.id == id) else {
            debug!(%id, "update for unknown activity ignored");
            return false;
        };
        if patch.is_empty() {
            return false;
        }

        patch.apply_to(activity);
        debug!(%id, "activity updated");
        self.changed();
        true
    }

    /// Remove the activity; false if the id is unknown.
    /// Its notification must already be cancelled by the caller.
    pub fn delete_activity(&mut self, id: &str) -> bool {
        let before = self.activities.len();
        self.activities.retain(|a| a.id != id);
        if self.activities.len() == before {
            debug!(%id, "delete for unknown activity ignored");
            return false;
        }

        debug!(%id, "activity deleted");
        self.changed();
        true
    }

    /// Mark `date` done when it lies inside the activity window and is not
    /// already marked. Returns whether anything changed.
    pub fn mark_completed(&mut self, id: &str, date: NaiveDate) -> bool {
        let Some(activity) = self.activities.iter_mut().find(|a| a.id == id) else {
            return false;
        };
        if !activity.is_active_on(date) || activity.is_completed_on(date) {
            return false;
        }

        activity.completion.insert(date, true);
        debug!(%id, %date, "activity marked completed");
        self.changed();
        true
    }

    /// Write the full snapshot if there are unsaved changes.
    ///
    /// On failure the in-memory state is kept and stays dirty, so a later
    /// call retries the write.
    pub fn persist(&mut self) -> Result<(), StoreError> {
        if !self.needs_save {
            return Ok(());
        }

        let content = encode_snapshot(&self.activities)?;
        if let Err(cause) = self.storage.set_item(STORAGE_KEY, &content) {
            error!(error = %format!("{cause:#}"), "failed to save activities");
            return Err(StoreError::Write {
                key: STORAGE_KEY.to_string(),
                cause,
            });
        }

        self.needs_save = false;
        debug!(count = self.activities.len(), "activities saved");
        Ok(())
    }

    /// Creation timestamp in milliseconds, bumped until unique
    fn generate_id(&self) -> String {
        let mut candidate = chrono::Utc::now().timestamp_millis();
        while self.get(&candidate.to_string()).is_some() {
            candidate += 1;
        }
        candidate.to_string()
    }

    fn changed(&mut self) {
        self.needs_save = true;
        self.notify();
    }

    fn notify(&mut self) {
        let activities = &self.activities;
        for (_, listener) in self.listeners.iter_mut() {
            listener(activities);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NotificationHandle;
    use crate::persistence::{FileStorage, MemoryStorage};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn input(title: &str) -> NewActivity {
        NewActivity {
            title: title.to_string(),
            start_date: date("2025-01-01"),
            end_date: Some(date("2025-01-03")),
            reminder_hour: 12,
            reminder_minute: 30,
            ..NewActivity::default()
        }
    }

    fn hydrated_store() -> ActivityStore<MemoryStorage> {
        let mut store = ActivityStore::new(MemoryStorage::new());
        store.hydrate().unwrap();
        store
    }

    /// Storage whose writes always fail
    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn get_item(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Ok(None)
        }

        fn set_item(&mut self, _key: &str, _value: &str) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    #[test]
    fn test_add_prepends() {
        let mut store = hydrated_store();
        let a = store.add_activity(input("A"));
        let b = store.add_activity(input("B"));

        let ids: Vec<&str> = store.activities().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec![b.as_str(), a.as_str()]);
        assert_ne!(a, b);
        assert!(store.activities()[0].completion.is_empty());
    }

    #[test]
    fn test_add_keeps_free_explicit_id_and_replaces_taken_one() {
        let mut store = hydrated_store();
        let first = store.add_activity(NewActivity {
            id: Some("1".to_string()),
            ..input("A")
        });
        let second = store.add_activity(NewActivity {
            id: Some("1".to_string()),
            ..input("B")
        });

        assert_eq!(first, "1");
        assert_ne!(second, "1");
        assert_eq!(store.activities().len(), 2);
    }

    #[test]
    fn test_update_merges_fields() {
        let mut store = hydrated_store();
        let id = store.add_activity(input("Run"));

        let changed = store.update_activity(
            &id,
            ActivityPatch {
                reminder_hour: Some(6),
                notification_id: Some(Some(NotificationHandle::new("n-1"))),
                ..ActivityPatch::default()
            },
        );

        assert!(changed);
        let activity = store.get(&id).unwrap();
        assert_eq!(activity.reminder_hour, 6);
        assert_eq!(activity.reminder_minute, 30);
        assert_eq!(activity.title, "Run");
        assert_eq!(activity.notification_id, Some(NotificationHandle::new("n-1")));
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let mut store = hydrated_store();
        store.add_activity(input("Run"));
        store.persist().unwrap();

        let before = store.activities().to_vec();
        assert!(!store.update_activity(
            "missing",
            ActivityPatch {
                title: Some("x".to_string()),
                ..ActivityPatch::default()
            }
        ));
        assert_eq!(store.activities(), before.as_slice());
        assert!(!store.needs_save());
    }

    #[test]
    fn test_delete_unknown_id_leaves_collection_unchanged() {
        let mut store = hydrated_store();
        store.add_activity(input("A"));
        store.add_activity(input("B"));
        let before = store.activities().to_vec();

        assert!(!store.delete_activity("does-not-exist"));
        assert_eq!(store.activities(), before.as_slice());
    }

    #[test]
    fn test_delete_removes_activity() {
        let mut store = hydrated_store();
        let a = store.add_activity(input("A"));
        let b = store.add_activity(input("B"));

        assert!(store.delete_activity(&a));
        assert_eq!(store.activities().len(), 1);
        assert_eq!(store.activities()[0].id, b);
    }

    #[test]
    fn test_mark_completed_scenario() {
        let mut store = hydrated_store();
        store.add_activity(NewActivity {
            id: Some("1".to_string()),
            ..input("Read")
        });

        assert!(store.mark_completed("1", date("2025-01-02")));
        let expected: std::collections::BTreeMap<_, _> =
            [(date("2025-01-02"), true)].into_iter().collect();
        assert_eq!(store.get("1").unwrap().completion, expected);

        assert!(!store.mark_completed("1", date("2025-01-05")));
        assert_eq!(store.get("1").unwrap().completion, expected);
    }

    #[test]
    fn test_mark_completed_is_idempotent() {
        let mut store = hydrated_store();
        let id = store.add_activity(input("Read"));

        assert!(store.mark_completed(&id, date("2025-01-01")));
        let once = store.get(&id).unwrap().completion.clone();
        assert!(!store.mark_completed(&id, date("2025-01-01")));
        assert_eq!(store.get(&id).unwrap().completion, once);
    }

    #[test]
    fn test_mark_completed_respects_window() {
        let mut store = hydrated_store();
        let id = store.add_activity(input("Read"));

        assert!(!store.mark_completed(&id, date("2024-12-31")));
        assert!(!store.mark_completed(&id, date("2025-01-04")));
        assert!(store.get(&id).unwrap().completion.is_empty());

        let ongoing = store.add_activity(NewActivity {
            end_date: None,
            ..input("Ongoing")
        });
        assert!(store.mark_completed(&ongoing, date("2031-07-01")));
        assert!(!store.mark_completed(&ongoing, date("2024-12-31")));
    }

    #[test]
    fn test_persist_and_rehydrate() {
        let temp_dir = tempfile::tempdir().unwrap();

        let mut store = ActivityStore::new(FileStorage::new(temp_dir.path()));
        store.hydrate().unwrap();
        let a = store.add_activity(input("A"));
        let b = store.add_activity(input("B"));
        store.mark_completed(&a, date("2025-01-02"));
        store.persist().unwrap();
        assert!(!store.needs_save());

        let mut reloaded = ActivityStore::new(FileStorage::new(temp_dir.path()));
        assert!(!reloaded.has_hydrated());
        reloaded.hydrate().unwrap();

        assert!(reloaded.has_hydrated());
        assert_eq!(reloaded.activities(), store.activities());
        assert_eq!(reloaded.activities()[0].id, b);
    }

    #[test]
    fn test_hydrate_missing_snapshot_starts_empty() {
        let store = hydrated_store();
        assert!(store.has_hydrated());
        assert!(store.activities().is_empty());
    }

    #[test]
    fn test_hydrate_corrupt_snapshot_keeps_store_unhydrated() {
        let storage = MemoryStorage::new().with_item(STORAGE_KEY, "{broken");
        let mut store = ActivityStore::new(storage);

        let err = store.hydrate().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        assert!(!store.has_hydrated());
    }

    #[test]
    fn test_write_failure_is_reported_and_state_kept() {
        let mut store = ActivityStore::new(BrokenStorage);
        store.hydrate().unwrap();
        store.add_activity(input("A"));

        let err = store.persist().unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert!(err.to_string().contains("disk full"));
        assert_eq!(store.activities().len(), 1);
        assert!(store.needs_save());
    }

    #[test]
    fn test_subscribers_see_every_change() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut store = hydrated_store();

        let sink = Rc::clone(&seen);
        let sub = store.subscribe(move |activities| sink.borrow_mut().push(activities.len()));

        let id = store.add_activity(input("A"));
        store.add_activity(input("B"));
        store.delete_activity("unknown");
        store.delete_activity(&id);
        assert_eq!(*seen.borrow(), vec![1, 2, 1]);

        assert!(store.unsubscribe(sub));
        store.add_activity(input("C"));
        assert_eq!(seen.borrow().len(), 3);
    }
}
