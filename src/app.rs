use crate::domain::{
    format_reminder_time, parse_date, parse_reminder_time, today, Activity, ActivityPatch,
    FormField, NewActivity, NotificationHandle, UiMode,
};
use crate::notifications::{NotificationError, NotificationHost, NotificationService};
use crate::persistence::Storage;
use crate::store::{ActivityStore, StoreError};
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

/// Why a form could not be turned into an activity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Title cannot be empty")]
    EmptyTitle,
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("End date is before start date")]
    EndBeforeStart,
    #[error("Invalid reminder time '{0}', expected HH:MM")]
    InvalidTime(String),
}

/// Validated activity fields coming from a form or the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityDraft {
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub reminder_hour: u32,
    pub reminder_minute: u32,
}

impl ActivityDraft {
    pub fn new(
        title: &str,
        description: Option<&str>,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        reminder_hour: u32,
        reminder_minute: u32,
    ) -> Result<Self, DraftError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DraftError::EmptyTitle);
        }
        if end_date.is_some_and(|end| end < start_date) {
            return Err(DraftError::EndBeforeStart);
        }
        if reminder_hour > 23 || reminder_minute > 59 {
            return Err(DraftError::InvalidTime(format_reminder_time(
                reminder_hour,
                reminder_minute,
            )));
        }

        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        Ok(Self {
            title: title.to_string(),
            description,
            start_date,
            end_date,
            reminder_hour,
            reminder_minute,
        })
    }
}

/// Input form state for adding or editing an activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityForm {
    /// Some when editing an existing activity
    pub editing_id: Option<String>,
    pub field: FormField,
    pub title: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    pub reminder_time: String,
}

impl ActivityForm {
    pub fn new(today: NaiveDate, reminder: (u32, u32)) -> Self {
        let date = today.format("%Y-%m-%d").to_string();
        Self {
            editing_id: None,
            field: FormField::Title,
            title: String::new(),
            description: String::new(),
            start_date: date.clone(),
            end_date: date,
            reminder_time: format_reminder_time(reminder.0, reminder.1),
        }
    }

    pub fn from_activity(activity: &Activity) -> Self {
        Self {
            editing_id: Some(activity.id.clone()),
            field: FormField::Title,
            title: activity.title.clone(),
            description: activity.description.clone().unwrap_or_default(),
            start_date: activity.start_date.format("%Y-%m-%d").to_string(),
            end_date: activity
                .end_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            reminder_time: activity.reminder_label(),
        }
    }

    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Title => &self.title,
            FormField::Description => &self.description,
            FormField::StartDate => &self.start_date,
            FormField::EndDate => &self.end_date,
            FormField::ReminderTime => &self.reminder_time,
        }
    }

    fn value_mut(&mut self) -> &mut String {
        match self.field {
            FormField::Title => &mut self.title,
            FormField::Description => &mut self.description,
            FormField::StartDate => &mut self.start_date,
            FormField::EndDate => &mut self.end_date,
            FormField::ReminderTime => &mut self.reminder_time,
        }
    }

    pub fn draft(&self) -> Result<ActivityDraft, DraftError> {
        let start_date = parse_date(&self.start_date)
            .ok_or_else(|| DraftError::InvalidDate(self.start_date.clone()))?;
        let end_date = if self.end_date.trim().is_empty() {
            None
        } else {
            Some(parse_date(&self.end_date).ok_or_else(|| DraftError::InvalidDate(self.end_date.clone()))?)
        };
        let (hour, minute) = parse_reminder_time(&self.reminder_time)
            .ok_or_else(|| DraftError::InvalidTime(self.reminder_time.clone()))?;

        ActivityDraft::new(
            &self.title,
            Some(&self.description),
            start_date,
            end_date,
            hour,
            minute,
        )
    }
}

/// Result of a save that reached the store
#[derive(Debug)]
pub struct Saved {
    pub id: String,
    /// Set when the activity was saved without a working reminder
    pub reminder_error: Option<NotificationError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RescheduleOutcome {
    PermissionDenied,
    Rescheduled { scheduled: usize, cleared: usize },
}

/// One-line feedback shown under the list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

/// Main application state
pub struct AppState<S: Storage, H: NotificationHost> {
    pub store: ActivityStore<S>,
    pub notifications: NotificationService<H>,
    pub selected_index: usize,
    pub ui_mode: UiMode,
    pub form: Option<ActivityForm>,
    pub status: Option<StatusMessage>,
    pub today: NaiveDate,
    pub default_reminder: (u32, u32),
    input_fence: bool,
}

impl<S: Storage, H: NotificationHost> AppState<S, H> {
    pub fn new(store: ActivityStore<S>, notifications: NotificationService<H>) -> Self {
        Self {
            store,
            notifications,
            selected_index: 0,
            ui_mode: UiMode::Normal,
            form: None,
            status: None,
            today: today(),
            default_reminder: (12, 30),
            input_fence: false,
        }
    }

    pub fn with_default_reminder(mut self, reminder: (u32, u32)) -> Self {
        self.default_reminder = reminder;
        self
    }

    pub fn activities(&self) -> &[Activity] {
        self.store.activities()
    }

    pub fn selected_activity(&self) -> Option<&Activity> {
        self.store.activities().get(self.selected_index)
    }

    pub fn move_selection_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn move_selection_down(&mut self) {
        let len = self.store.activities().len();
        if self.selected_index + 1 < len {
            self.selected_index += 1;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.store.activities().len();
        if self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
        }
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: true,
        });
    }

    /// True once after an action that called the notification host;
    /// input queued while it ran should be discarded.
    pub fn take_input_fence(&mut self) -> bool {
        std::mem::take(&mut self.input_fence)
    }

    /// Pick up a date change while the app is running
    pub fn refresh_today(&mut self) {
        let now = today();
        if now != self.today {
            info!(%now, "day changed");
            self.today = now;
        }
    }

    // ----- form handling -----

    pub fn start_add_activity(&mut self) {
        self.form = Some(ActivityForm::new(self.today, self.default_reminder));
        self.ui_mode = UiMode::AddingActivity;
    }

    pub fn start_edit_selected(&mut self) {
        if let Some(activity) = self.selected_activity() {
            self.form = Some(ActivityForm::from_activity(activity));
            self.ui_mode = UiMode::EditingActivity;
        }
    }

    pub fn form_next_field(&mut self) {
        if let Some(form) = &mut self.form {
            form.field = form.field.next();
        }
    }

    pub fn form_prev_field(&mut self) {
        if let Some(form) = &mut self.form {
            form.field = form.field.prev();
        }
    }

    pub fn form_add_char(&mut self, c: char) {
        if let Some(form) = &mut self.form {
            form.value_mut().push(c);
        }
    }

    pub fn form_backspace(&mut self) {
        if let Some(form) = &mut self.form {
            form.value_mut().pop();
        }
    }

    pub fn cancel_form(&mut self) {
        self.form = None;
        self.ui_mode = UiMode::Normal;
    }

    /// Validate and save the open form. Invalid input keeps the form open.
    pub fn submit_form(&mut self) {
        let Some(form) = self.form.clone() else {
            return;
        };

        let draft = match form.draft() {
            Ok(draft) => draft,
            Err(e) => {
                self.set_error(e.to_string());
                return;
            }
        };

        self.form = None;
        self.ui_mode = UiMode::Normal;

        let result = match &form.editing_id {
            Some(id) => self.edit_activity(id, draft),
            None => self.create_activity(draft).map(Some),
        };
        self.report_save(result);
    }

    fn report_save(&mut self, result: Result<Option<Saved>, StoreError>) {
        match result {
            Ok(Some(Saved {
                id,
                reminder_error: None,
            })) => {
                self.select_id(&id);
                self.set_status("Saved");
            }
            Ok(Some(Saved {
                id,
                reminder_error: Some(e),
            })) => {
                self.select_id(&id);
                self.set_error(format!("Saved without reminder: {}", e));
            }
            Ok(None) => self.set_error("Activity no longer exists"),
            Err(e) => self.set_error(format!("Not saved to disk: {}", e)),
        }
    }

    fn select_id(&mut self, id: &str) {
        if let Some(idx) = self.store.activities().iter().position(|a| a.id == id) {
            self.selected_index = idx;
        }
    }

    // ----- activity flows -----

    /// Schedule the reminder, then add the activity. A reminder that could
    /// not be scheduled does not block saving; it is reported instead.
    pub fn create_activity(&mut self, draft: ActivityDraft) -> Result<Saved, StoreError> {
        let (handle, reminder_error) = self.schedule_for(&draft);

        let id = self.store.add_activity(NewActivity {
            id: None,
            title: draft.title,
            start_date: draft.start_date,
            end_date: draft.end_date,
            reminder_hour: draft.reminder_hour,
            reminder_minute: draft.reminder_minute,
            notification_id: handle,
            description: draft.description,
        });
        info!(%id, "activity created");

        self.store.persist()?;
        Ok(Saved { id, reminder_error })
    }

    /// Apply edited fields. When the title or reminder time changes the old
    /// reminder is cancelled before a new one is scheduled.
    pub fn edit_activity(&mut self, id: &str, draft: ActivityDraft) -> Result<Option<Saved>, StoreError> {
        let Some(existing) = self.store.get(id).cloned() else {
            return Ok(None);
        };

        let reminder_changed = existing.title != draft.title
            || existing.reminder_hour != draft.reminder_hour
            || existing.reminder_minute != draft.reminder_minute
            || existing.notification_id.is_none();

        let mut patch = ActivityPatch {
            title: Some(draft.title.clone()),
            start_date: Some(draft.start_date),
            end_date: Some(draft.end_date),
            reminder_hour: Some(draft.reminder_hour),
            reminder_minute: Some(draft.reminder_minute),
            notification_id: None,
            description: Some(draft.description.clone()),
        };

        let mut reminder_error = None;
        if reminder_changed {
            if let Some(old) = &existing.notification_id {
                self.notifications.cancel(old);
            }
            let (handle, error) = self.schedule_for(&draft);
            patch.notification_id = Some(handle);
            reminder_error = error;
        }

        self.store.update_activity(id, patch);
        info!(%id, reminder_changed, "activity edited");

        self.store.persist()?;
        Ok(Some(Saved {
            id: id.to_string(),
            reminder_error,
        }))
    }

    /// Cancel the activity's reminder, then remove it
    pub fn delete_activity(&mut self, id: &str) -> Result<bool, StoreError> {
        let Some(handle) = self.store.get(id).map(|a| a.notification_id.clone()) else {
            return Ok(false);
        };

        if let Some(handle) = handle {
            self.notifications.cancel(&handle);
            self.input_fence = true;
        }
        self.store.delete_activity(id);
        self.clamp_selection();
        info!(%id, "activity deleted");

        self.store.persist()?;
        Ok(true)
    }

    pub fn mark_completed(&mut self, id: &str, date: NaiveDate) -> Result<bool, StoreError> {
        let changed = self.store.mark_completed(id, date);
        self.store.persist()?;
        Ok(changed)
    }

    /// Replace every reminder; activities outside their window lose theirs
    pub fn reschedule_all(&mut self) -> Result<RescheduleOutcome, StoreError> {
        self.input_fence = true;
        let Some(handles) = self.notifications.reschedule_all(self.store.activities()) else {
            return Ok(RescheduleOutcome::PermissionDenied);
        };

        let updates: Vec<(String, Option<NotificationHandle>)> = self
            .store
            .activities()
            .iter()
            .filter_map(|a| {
                let handle = handles.get(&a.id).cloned();
                (a.notification_id != handle).then(|| (a.id.clone(), handle))
            })
            .collect();

        let cleared = updates.iter().filter(|(_, h)| h.is_none()).count();
        for (id, handle) in updates {
            self.store.update_activity(&id, ActivityPatch::notification(handle));
        }

        self.store.persist()?;
        Ok(RescheduleOutcome::Rescheduled {
            scheduled: handles.len(),
            cleared,
        })
    }

    /// Cancel every registered reminder and forget all handles
    pub fn clear_reminders(&mut self) -> Result<usize, StoreError> {
        self.input_fence = true;
        self.notifications.cancel_all();

        let ids: Vec<String> = self
            .store
            .activities()
            .iter()
            .filter(|a| a.notification_id.is_some())
            .map(|a| a.id.clone())
            .collect();
        for id in &ids {
            self.store.update_activity(id, ActivityPatch::notification(None));
        }

        self.store.persist()?;
        Ok(ids.len())
    }

    // ----- key actions -----

    pub fn request_delete_selected(&mut self) {
        if self.selected_activity().is_some() {
            self.ui_mode = UiMode::ConfirmDelete;
        }
    }

    pub fn confirm_delete(&mut self) {
        self.ui_mode = UiMode::Normal;
        let Some(id) = self.selected_activity().map(|a| a.id.clone()) else {
            return;
        };
        match self.delete_activity(&id) {
            Ok(_) => self.set_status("Deleted"),
            Err(e) => self.set_error(format!("Not saved to disk: {}", e)),
        }
    }

    pub fn cancel_delete(&mut self) {
        self.ui_mode = UiMode::Normal;
    }

    pub fn mark_selected_done(&mut self) {
        let Some(activity) = self.selected_activity() else {
            return;
        };
        let id = activity.id.clone();
        let active = activity.is_active_on(self.today);
        let date = self.today;

        match self.mark_completed(&id, date) {
            Ok(true) => self.set_status("Marked done for today"),
            Ok(false) if !active => self.set_error("Today is outside this activity's dates"),
            Ok(false) => self.set_status("Already done today"),
            Err(e) => self.set_error(format!("Not saved to disk: {}", e)),
        }
    }

    pub fn reschedule_from_ui(&mut self) {
        match self.reschedule_all() {
            Ok(RescheduleOutcome::PermissionDenied) => {
                self.set_error("Notifications are disabled; nothing rescheduled")
            }
            Ok(RescheduleOutcome::Rescheduled { scheduled, .. }) => {
                self.set_status(format!("Rescheduled {} reminder(s)", scheduled))
            }
            Err(e) => self.set_error(format!("Not saved to disk: {}", e)),
        }
    }

    /// Retry a write that failed earlier
    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.store.persist()
    }

    fn schedule_for(
        &mut self,
        draft: &ActivityDraft,
    ) -> (Option<NotificationHandle>, Option<NotificationError>) {
        self.input_fence = true;
        let body = self.notifications.reminder_body().to_string();
        match self.notifications.schedule_daily(
            &draft.title,
            &body,
            draft.reminder_hour,
            draft.reminder_minute,
        ) {
            Ok(handle) => (Some(handle), None),
            Err(e) => {
                warn!(title = %draft.title, error = %e, "failed to schedule reminder");
                (None, Some(e))
            }
        }
    }
}
