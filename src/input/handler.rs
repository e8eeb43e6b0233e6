use crate::app::AppState;
use crate::domain::UiMode;
use crate::notifications::NotificationHost;
use crate::persistence::Storage;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Handle keyboard input events. Returns true when the app should quit.
pub fn handle_key<S: Storage, H: NotificationHost>(app: &mut AppState<S, H>, key: KeyEvent) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    match app.ui_mode {
        UiMode::Normal => handle_normal_mode(app, key),
        UiMode::AddingActivity | UiMode::EditingActivity => handle_input_form_mode(app, key),
        UiMode::ConfirmDelete => handle_confirm_delete_mode(app, key),
    }
}

/// Handle keys in normal mode
fn handle_normal_mode<S: Storage, H: NotificationHost>(app: &mut AppState<S, H>, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => app.move_selection_up(),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection_down(),

        KeyCode::Char('a') | KeyCode::Char('A') => app.start_add_activity(),
        KeyCode::Char('e') | KeyCode::Char('E') | KeyCode::Enter => app.start_edit_selected(),

        // Mark today done
        KeyCode::Char(' ') | KeyCode::Char('d') | KeyCode::Char('D') => app.mark_selected_done(),

        KeyCode::Char('x') | KeyCode::Char('X') | KeyCode::Delete => app.request_delete_selected(),

        KeyCode::Char('r') | KeyCode::Char('R') => app.reschedule_from_ui(),

        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return true,

        _ => {}
    }
    false
}

/// Handle keys in the add/edit form
fn handle_input_form_mode<S: Storage, H: NotificationHost>(app: &mut AppState<S, H>, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Enter => app.submit_form(),
        KeyCode::Esc => app.cancel_form(),
        KeyCode::Tab | KeyCode::Down => app.form_next_field(),
        KeyCode::BackTab | KeyCode::Up => app.form_prev_field(),
        KeyCode::Backspace => app.form_backspace(),
        KeyCode::Char(c) => app.form_add_char(c),
        _ => {}
    }
    false
}

/// Handle keys in the delete confirmation modal
fn handle_confirm_delete_mode<S: Storage, H: NotificationHost>(app: &mut AppState<S, H>, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_delete(),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_delete(),
        _ => {}
    }
    false
}
