use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use std::time::Duration;

use super::{App, Editing, LoginField, Screen};
use crate::models::ActivityId;

pub fn poll_event(timeout: Duration) -> anyhow::Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Apply a typing key to a text buffer. Returns false for keys it ignores.
fn edit_text(buf: &mut String, code: KeyCode) -> bool {
    match code {
        KeyCode::Char(c) => buf.push(c),
        KeyCode::Backspace => {
            buf.pop();
        }
        _ => return false,
    }
    true
}

pub fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (code, modifiers) {
        app.running = false;
        return;
    }

    // ── Delete confirmation intercepts all keys while open ────────────
    if app.confirm_delete.is_some() {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.answer_delete(true),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.answer_delete(false),
            _ => {}
        }
        return;
    }

    if let Some(editing) = app.editing {
        handle_edit_key(app, editing, code);
        return;
    }

    match app.screen {
        Screen::Login => return handle_login_key(app, code),
        Screen::Create => return handle_create_key(app, code, modifiers),
        _ => {}
    }

    match code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Tab => {
            app.next_tab();
            return;
        }
        KeyCode::BackTab => {
            app.prev_tab();
            return;
        }
        KeyCode::Char('L') => {
            app.logout();
            return;
        }
        _ => {}
    }

    match app.screen {
        Screen::Dashboard => match code {
            KeyCode::Enter => app.go_to(Screen::Activities),
            KeyCode::Char('r') => app.start(),
            _ => {}
        },
        Screen::Activities => handle_activities_key(app, code),
        Screen::Groups => handle_groups_key(app, code),
        Screen::Detail => handle_detail_key(app, code),
        Screen::NotFound => {
            if matches!(code, KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace) {
                app.back_from_detail();
            }
        }
        Screen::Login | Screen::Create => {}
    }
}

fn page_digit(code: KeyCode) -> Option<usize> {
    match code {
        KeyCode::Char(c) => c.to_digit(10).map(|d| d as usize),
        _ => None,
    }
}

// ─── Screens ────────────────────────────────────────────────────────────────

fn handle_login_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.running = false,
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Up => {
            app.login_field = match app.login_field {
                LoginField::UserName => LoginField::Password,
                LoginField::Password => LoginField::UserName,
            };
        }
        KeyCode::F(2) => app.login_form.show_password = !app.login_form.show_password,
        KeyCode::Enter => match app.login_field {
            LoginField::UserName => app.login_field = LoginField::Password,
            LoginField::Password => app.submit_login(),
        },
        _ => {
            let buf = match app.login_field {
                LoginField::UserName => &mut app.login_form.user_name,
                LoginField::Password => &mut app.login_form.password,
            };
            edit_text(buf, code);
        }
    }
}

fn handle_create_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match (code, modifiers) {
        (KeyCode::Char('s'), KeyModifiers::CONTROL) => app.submit_create(),
        (KeyCode::Esc, _) => app.go_to(Screen::Activities),
        (KeyCode::Tab | KeyCode::Down, _) => app.create_field_next(),
        (KeyCode::BackTab | KeyCode::Up, _) => app.create_field_prev(),
        (KeyCode::Left, _) => app.cycle_create_choice(false),
        (KeyCode::Right, _) => app.cycle_create_choice(true),
        (KeyCode::Enter, _) => app.create_field_next(),
        _ => {
            let field = app.focused_create_field();
            if let Some(buf) = app.create_form.text_mut(field) {
                edit_text(buf, code);
            }
        }
    }
}

fn handle_activities_key(app: &mut App, code: KeyCode) {
    if let Some(page) = page_digit(code) {
        app.activities_go_to_page(page);
        return;
    }
    match code {
        KeyCode::Down | KeyCode::Char('j') => app.activity_cursor_down(),
        KeyCode::Up | KeyCode::Char('k') => app.activity_cursor_up(),
        KeyCode::Left | KeyCode::Char('h') => app.activities_prev_page(),
        KeyCode::Right | KeyCode::Char('l') => app.activities_next_page(),
        KeyCode::Char('/') => app.editing = Some(Editing::Search),
        KeyCode::Char('s') => app.cycle_subject_filter(),
        KeyCode::Char('f') => app.cycle_status_filter(),
        KeyCode::Char('x') => app.clear_activity_filters(),
        KeyCode::Char('o') => app.editing = Some(Editing::JumpTo),
        KeyCode::Char('d') => app.request_delete(),
        KeyCode::Char('n') => app.go_to(Screen::Create),
        KeyCode::Char('r') => app.start_list_fetch(),
        KeyCode::Enter => {
            if let Some(id) = app.selected_activity().map(|r| r.id.clone()) {
                app.open_detail(id, Screen::Activities);
            }
        }
        _ => {}
    }
}

fn handle_groups_key(app: &mut App, code: KeyCode) {
    if let Some(page) = page_digit(code) {
        app.groups_go_to_page(page);
        return;
    }
    match code {
        KeyCode::Down | KeyCode::Char('j') => app.group_cursor_down(),
        KeyCode::Up | KeyCode::Char('k') => app.group_cursor_up(),
        KeyCode::Left | KeyCode::Char('h') => app.groups_prev_page(),
        KeyCode::Right | KeyCode::Char('l') => app.groups_next_page(),
        KeyCode::Char('/') => app.editing = Some(Editing::GroupSearch),
        KeyCode::Char('c') => app.cycle_group_class(),
        KeyCode::Char('s') => app.cycle_group_subject(),
        KeyCode::Char('f') => app.cycle_group_status(),
        KeyCode::Char('x') => app.clear_group_filters(),
        KeyCode::Char('v') => app.load_roster(),
        KeyCode::Char('d') => app.request_group_delete(),
        KeyCode::Char('r') => app.start_groups_fetch(),
        KeyCode::Enter => {
            if let Some(id) = app.selected_group().map(|g| g.activity_id.clone()) {
                app.open_detail(id, Screen::Groups);
            }
        }
        _ => {}
    }
}

fn handle_detail_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc | KeyCode::Backspace => app.back_from_detail(),
        KeyCode::Char('r') => {
            let id: Option<ActivityId> = app.detail.as_ref().map(|d| d.id.clone());
            if let Some(id) = id {
                let back = app.detail_return;
                app.open_detail(id, back);
            }
        }
        KeyCode::Char('a') if !app.is_teacher() => app.editing = Some(Editing::FilePath),
        KeyCode::Char('s') if !app.is_teacher() => app.submit_work(),
        KeyCode::Char('e') if app.grade_form.is_some() => app.editing = Some(Editing::Feedback),
        KeyCode::Char('g') if app.grade_form.is_some() => app.editing = Some(Editing::Grade),
        KeyCode::Char('s') => app.submit_grade(),
        _ => {}
    }
}

// ─── Text inputs ────────────────────────────────────────────────────────────

fn handle_edit_key(app: &mut App, editing: Editing, code: KeyCode) {
    let done = matches!(code, KeyCode::Enter | KeyCode::Esc);

    match editing {
        Editing::Search => {
            let mut search = app.activities.filter().search.clone();
            if edit_text(&mut search, code) && search != app.activities.filter().search {
                app.update_activity_filter(|f| f.search = search);
            }
        }
        Editing::GroupSearch => {
            let mut search = app.groups.filter().search.clone();
            if edit_text(&mut search, code) && search != app.groups.filter().search {
                app.update_group_filter(|f| f.search = search);
            }
        }
        Editing::JumpTo => match code {
            KeyCode::Enter => return app.submit_jump(),
            KeyCode::Esc => app.jump_input.clear(),
            _ => {
                edit_text(&mut app.jump_input, code);
            }
        },
        Editing::FilePath => match code {
            KeyCode::Enter => return app.choose_file(),
            _ => {
                edit_text(&mut app.draft.path_input, code);
            }
        },
        Editing::Feedback => {
            if let Some(form) = app.grade_form.as_mut() {
                edit_text(&mut form.feedback, code);
            }
        }
        Editing::Grade => {
            if let Some(form) = app.grade_form.as_mut() {
                match code {
                    KeyCode::Char(c) => form.push_grade_char(c),
                    KeyCode::Backspace => {
                        form.grade.pop();
                    }
                    _ => {}
                }
            }
        }
    }

    if done {
        app.editing = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_text_types_and_deletes() {
        let mut buf = String::from("ab");
        assert!(edit_text(&mut buf, KeyCode::Char('c')));
        assert!(edit_text(&mut buf, KeyCode::Backspace));
        assert!(edit_text(&mut buf, KeyCode::Backspace));
        assert_eq!(buf, "a");
        assert!(!edit_text(&mut buf, KeyCode::Enter));
    }

    #[test]
    fn digits_map_to_pages() {
        assert_eq!(page_digit(KeyCode::Char('3')), Some(3));
        assert_eq!(page_digit(KeyCode::Char('x')), None);
        assert_eq!(page_digit(KeyCode::Enter), None);
    }
}
