use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use eco_core::{model::Coordinate, presentation::MarkerAction};

use crate::app::{App, LoginInput, MenuItem, RecyclerInput, RegisterInput, Screen};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Action {
    None,
    Quit,
    /// Run `accounts.login`(...) with the login form
    Login,
    /// Run `accounts.register`(...) with the registration form
    Register,
    Logout,
    CheckStatus,
    /// Run `accounts.submit_recycling`(...) with the checked materials
    SubmitRecycling,
    /// Spawn a map refresh
    RefreshMap,
    /// Spawn a navigation to the given point
    Navigate(Coordinate),
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{BackTab, Backspace, Char, Down, Enter, Esc, Left, Tab, Up};

    // Global quit shortcut
    if key.code == Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    let mut action = Action::None;

    match app.screen() {
        Screen::Main => match key.code {
            Char('q') => action = Action::Quit,
            Up | Char('k') => {
                app.menu_index = app.menu_index.saturating_sub(1);
            }
            Down | Char('j') => {
                if app.menu_index + 1 < app.menu().len() {
                    app.menu_index += 1;
                }
            }
            Enter | Char(' ') => {
                if let Some(item) = app.menu().get(app.menu_index).copied() {
                    action = select_menu_item(item, app);
                }
            }
            _ => {}
        },

        Screen::Login => match key.code {
            Esc => app.go_to(Screen::Main),
            Tab | Down => app.login.field = (app.login.field + 1) % LoginInput::FIELDS,
            BackTab | Up => {
                app.login.field = (app.login.field + LoginInput::FIELDS - 1) % LoginInput::FIELDS;
            }
            Enter => action = Action::Login,
            Backspace => {
                app.login.focused().pop();
            }
            Char(character) => push_char(key, app.login.focused(), character),
            _ => {}
        },

        Screen::Register => {
            let fields = RegisterInput::LABELS.len();
            match key.code {
                Esc => app.go_to(Screen::Main),
                Tab | Down => app.register.field = (app.register.field + 1) % fields,
                BackTab | Up => app.register.field = (app.register.field + fields - 1) % fields,
                Enter => action = Action::Register,
                Backspace => {
                    app.register.focused().pop();
                }
                Char(character) => push_char(key, app.register.focused(), character),
                _ => {}
            }
        }

        Screen::RecyclerProfile => match key.code {
            Char('q') => action = Action::Quit,
            Esc | Left | Char('b') => app.go_to(Screen::Main),
            Up | Char('k') => {
                app.recycler.index = app.recycler.index.saturating_sub(1);
            }
            Down | Char('j') => {
                if app.recycler.index + 1 < RecyclerInput::LABELS.len() {
                    app.recycler.index += 1;
                }
            }
            Char(' ') => app.recycler.toggle_current(),
            Enter => action = Action::SubmitRecycling,
            _ => {}
        },

        Screen::CollectorProfile => match key.code {
            Char('q') => action = Action::Quit,
            Esc | Left | Char('b') => app.go_to(Screen::Main),
            Enter | Char('m') => app.go_to(Screen::Map),
            _ => {}
        },

        Screen::Map => action = handle_map_key(key.code, app),
    }
    action
}

fn handle_map_key(code: KeyCode, app: &mut App) -> Action {
    use KeyCode::{Char, Down, Enter, Esc, Left, Up};

    // The dialog is modal: only "OK" gets through.
    if app.map.state().dialog.is_some() {
        if matches!(code, Enter | Esc | Char(' ')) {
            app.map.dismiss_dialog();
        }
        return Action::None;
    }

    match code {
        Char('q') => Action::Quit,
        Char('r') => Action::RefreshMap,
        Up | Char('k') => {
            app.marker_index = app.marker_index.saturating_sub(1);
            Action::None
        }
        Down | Char('j') => {
            if app.marker_index + 1 < app.map.state().markers.len() {
                app.marker_index += 1;
            }
            Action::None
        }
        Enter | Char('n') => {
            if app.map.state().info_window == Some(app.marker_index) {
                match app.map.activate_info_window() {
                    Some(MarkerAction::NavigateTo(destination)) => Action::Navigate(destination),
                    None => Action::None,
                }
            } else {
                app.map.click_marker(app.marker_index);
                Action::None
            }
        }
        Esc | Left | Char('b') => {
            if app.map.state().info_window.is_some() {
                app.map.close_info_window();
            } else {
                app.go_to(Screen::CollectorProfile);
            }
            Action::None
        }
        _ => Action::None,
    }
}

fn select_menu_item(item: MenuItem, app: &mut App) -> Action {
    match item {
        MenuItem::Login => app.go_to(Screen::Login),
        MenuItem::Register => app.go_to(Screen::Register),
        MenuItem::Recyclers => app.go_to(Screen::RecyclerProfile),
        MenuItem::Collectors => app.go_to(Screen::CollectorProfile),
        MenuItem::Status => return Action::CheckStatus,
        MenuItem::Logout => return Action::Logout,
    }
    Action::None
}

fn push_char(key: KeyEvent, target: &mut String, character: char) {
    if !key.modifiers.contains(KeyModifiers::CONTROL) && !key.modifiers.contains(KeyModifiers::ALT) {
        target.push(character);
    }
}
