pub mod details_pane;
pub mod input_form;
pub mod keybindings;
pub mod layout;
pub mod list_pane;
pub mod modal;
pub mod styles;

use crate::app::AppState;
use crate::domain::UiMode;
use crate::notifications::NotificationHost;
use crate::persistence::Storage;
use details_pane::render_details_pane;
use input_form::render_input_form;
use keybindings::{render_keybindings, render_status_bar};
use layout::create_layout;
use list_pane::render_list_pane;
use modal::render_delete_modal;
use ratatui::Frame;

/// Main render function - draws the entire UI
pub fn render<S: Storage, H: NotificationHost>(f: &mut Frame, app: &AppState<S, H>) {
    let size = f.size();
    let layout = create_layout(size);

    render_keybindings(f, app.ui_mode, layout.keybindings_area);
    render_list_pane(f, app, layout.list_area);
    render_details_pane(f, app, layout.details_area);
    render_status_bar(f, app.status.as_ref(), layout.status_area);

    match app.ui_mode {
        UiMode::ConfirmDelete => render_delete_modal(f, app, size),
        UiMode::AddingActivity | UiMode::EditingActivity => render_input_form(f, app, size),
        UiMode::Normal => {}
    }
}
