//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, AppState, PendingAction, Tab, PAGE_SCROLL_SIZE};
use crate::form::FormState;

/// Outcome of a key press inside a form
#[derive(Debug, PartialEq, Eq)]
enum FormEvent {
    Submit,
    Edited,
}

/// Navigate and type inside a form. Enter on the button submits; Enter on an
/// input moves to the next one.
fn handle_form_key(form: &mut FormState, key: KeyEvent) -> FormEvent {
    match key.code {
        KeyCode::Down | KeyCode::Tab => form.focus_next(),
        KeyCode::Up | KeyCode::BackTab => form.focus_prev(),
        KeyCode::Enter => {
            if form.is_button_focused() {
                return FormEvent::Submit;
            }
            form.focus_next();
        }
        KeyCode::Backspace => form.pop_char(),
        KeyCode::Char(c) => form.push_char(c),
        _ => {}
    }
    FormEvent::Edited
}

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Ignore input while a submission is waiting to run
    if app.is_busy() {
        return Ok(false);
    }

    match app.state {
        AppState::SigningIn => return Ok(handle_sign_in_input(app, key)),
        AppState::SigningUp => {
            if key.code == KeyCode::Esc {
                app.start_sign_in();
            } else if handle_form_key(&mut app.sign_up_form, key) == FormEvent::Submit {
                app.request(PendingAction::SignUp);
            }
            return Ok(false);
        }
        AppState::EditingProfile => {
            if key.code == KeyCode::Esc {
                app.state = AppState::Normal;
            } else if handle_form_key(&mut app.profile_form, key) == FormEvent::Submit {
                app.request(PendingAction::UpdateProfile);
            }
            return Ok(false);
        }
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingSignOut => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.request(PendingAction::SignOut);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::Searching => {
            handle_search_input(app, key);
            return Ok(false);
        }
        AppState::Filtering => {
            handle_filter_input(app, key);
            return Ok(false);
        }
        AppState::ViewingProduct => {
            match key.code {
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Backspace => app.close_product(),
                KeyCode::Char('c') => app.show_contact_link(),
                _ => {}
            }
            return Ok(false);
        }
        AppState::Normal | AppState::Quitting => {}
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return Ok(false);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        KeyCode::Char('1') => app.current_tab = Tab::Products,
        KeyCode::Char('2') => app.current_tab = Tab::Profile,
        KeyCode::Left => app.current_tab = app.current_tab.prev(),
        KeyCode::Right => app.current_tab = app.current_tab.next(),
        _ => match app.current_tab {
            Tab::Products => handle_products_input(app, key),
            Tab::Profile => handle_profile_input(app, key),
        },
    }

    Ok(false)
}

fn handle_sign_in_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => {
            // Quit if on sign-in screen
            app.state = AppState::Quitting;
            return true;
        }
        KeyCode::Char('n') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.start_sign_up();
        }
        _ => {
            if handle_form_key(&mut app.sign_in_form, key) == FormEvent::Submit {
                app.request(PendingAction::SignIn);
            }
        }
    }
    false
}

fn handle_products_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('/') => {
            app.state = AppState::Searching;
        }
        KeyCode::Char('f') => app.open_filters(),
        KeyCode::Char('u') => app.refresh_products(),
        KeyCode::Esc => {
            if !app.search_query.is_empty() {
                app.clear_search();
            }
        }
        KeyCode::Up | KeyCode::Char('k') => app.select_prev_product(1),
        KeyCode::Down | KeyCode::Char('j') => app.select_next_product(1),
        KeyCode::PageUp => app.select_prev_product(PAGE_SCROLL_SIZE),
        KeyCode::PageDown => app.select_next_product(PAGE_SCROLL_SIZE),
        KeyCode::Home => app.product_selection = 0,
        KeyCode::End => app.select_last_product(),
        KeyCode::Enter => app.open_selected_product(),
        _ => {}
    }
}

fn handle_profile_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('e') => app.start_profile_edit(),
        KeyCode::Char('s') => app.state = AppState::ConfirmingSignOut,
        _ => {}
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.clear_search();
        }
        KeyCode::Enter => {
            // Keep search query active
            app.state = AppState::Normal;
        }
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Char(c) => app.push_search_char(c),
        _ => {}
    }
}

fn handle_filter_input(app: &mut App, key: KeyEvent) {
    use crate::app::FilterFocus;

    match key.code {
        KeyCode::Esc => app.state = AppState::Normal,
        KeyCode::Enter => app.apply_filters(),
        KeyCode::Tab => app.filter_focus = app.filter_focus.next(),
        KeyCode::BackTab => app.filter_focus = app.filter_focus.prev(),
        KeyCode::Char('r') => app.clear_filters(),
        KeyCode::Backspace => app.pop_filter_char(),
        KeyCode::Up if app.filter_focus == FilterFocus::Categories => {
            app.category_selection = app.category_selection.saturating_sub(1);
        }
        KeyCode::Down if app.filter_focus == FilterFocus::Categories => {
            let last = app.categories.len().saturating_sub(1);
            app.category_selection = (app.category_selection + 1).min(last);
        }
        KeyCode::Up => app.filter_focus = app.filter_focus.prev(),
        KeyCode::Down => app.filter_focus = app.filter_focus.next(),
        KeyCode::Char(' ') if app.filter_focus == FilterFocus::Categories => {
            app.toggle_selected_category();
        }
        KeyCode::Char(c) => app.push_filter_char(c),
        _ => {}
    }
}
