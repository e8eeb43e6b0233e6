/// UI mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMode {
    Normal,
    AddingActivity,
    EditingActivity,
    ConfirmDelete,
}

/// Field of the add/edit activity form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    StartDate,
    EndDate,
    ReminderTime,
}

impl FormField {
    pub fn all() -> &'static [FormField] {
        &[
            FormField::Title,
            FormField::Description,
            FormField::StartDate,
            FormField::EndDate,
            FormField::ReminderTime,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Title => "Title",
            FormField::Description => "Description",
            FormField::StartDate => "Start (YYYY-MM-DD)",
            FormField::EndDate => "End (YYYY-MM-DD, empty = ongoing)",
            FormField::ReminderTime => "Reminder at (HH:MM)",
        }
    }

    /// Next field, wrapping around
    pub fn next(&self) -> Self {
        let fields = Self::all();
        let idx = fields.iter().position(|f| f == self).unwrap_or(0);
        fields[(idx + 1) % fields.len()]
    }

    /// Previous field, wrapping around
    pub fn prev(&self) -> Self {
        let fields = Self::all();
        let idx = fields.iter().position(|f| f == self).unwrap_or(0);
        fields[(idx + fields.len() - 1) % fields.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_field_cycles() {
        assert_eq!(FormField::Title.next(), FormField::Description);
        assert_eq!(FormField::ReminderTime.next(), FormField::Title);
        assert_eq!(FormField::Title.prev(), FormField::ReminderTime);
    }
}
