pub mod activity;
pub mod dates;
pub mod enums;

pub use activity::{Activity, ActivityPatch, NewActivity, NotificationHandle};
pub use dates::{
    date_range, format_date_in_words, format_range_in_words, format_reminder_time,
    parse_date, parse_reminder_time, today,
};
pub use enums::{FormField, UiMode};
