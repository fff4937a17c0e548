use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use pulse_core::ClickTarget;
use crate::app::{App, FocusPane};
use crate::tui::AppEvent;

/// Width of the delete button at the right edge of a history row.
pub const DELETE_BUTTON_WIDTH: u16 = 3;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key).await,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse).await,
        AppEvent::Paste(text) => {
            if app.focus == FocusPane::Input {
                for c in text.chars().filter(|c| *c != '\r') {
                    app.client.ui_mut().input.insert(c);
                }
            }
        }
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(),
    }

    // Replies are collected on every event so the UI never blocks on them.
    app.poll_reply().await;
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys that work in any pane
    if ctrl {
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => {
                app.should_quit = true;
                return;
            }
            KeyCode::Char('o') => {
                app.toggle_history().await;
                return;
            }
            KeyCode::Char('n') => {
                app.client.new_chat().await;
                return;
            }
            KeyCode::Char('t') => {
                app.client.toggle_theme();
                return;
            }
            _ => {}
        }
    }

    // The delete prompt swallows everything until answered.
    if app.confirm_delete.is_some() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                let action = app.client.confirm_delete().await;
                app.handle_history_action(action);
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                app.client.cancel_delete();
                app.confirm_delete = None;
            }
            _ => {}
        }
        return;
    }

    if app.show_help {
        app.show_help = false;
        return;
    }

    match key.code {
        KeyCode::Tab => {
            app.cycle_focus();
            return;
        }
        KeyCode::PageUp => {
            app.client.ui_mut().transcript.scroll_by(-10);
            return;
        }
        KeyCode::PageDown => {
            app.client.ui_mut().transcript.scroll_by(10);
            return;
        }
        KeyCode::F(1) => {
            app.show_help = true;
            return;
        }
        _ => {}
    }

    match app.focus {
        FocusPane::Input => handle_input(app, key),
        FocusPane::Transcript => handle_transcript(app, key),
        FocusPane::History => handle_history(app, key).await,
    }
}

fn handle_input(app: &mut App, key: KeyEvent) {
    let input = &mut app.client.ui_mut().input;
    match key.code {
        // Shift/Alt+Enter inserts a newline, plain Enter sends
        KeyCode::Enter
            if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            input.insert('\n');
        }
        KeyCode::Enter => app.send(),
        KeyCode::Esc => {
            if app.client.session().is_sending() {
                app.client.cancel_send();
            }
        }
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Home => input.move_home(),
        KeyCode::End => input.move_end(),
        KeyCode::Char(c) => input.insert(c),
        _ => {}
    }
}

fn handle_transcript(app: &mut App, key: KeyEvent) {
    let transcript = &mut app.client.ui_mut().transcript;
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => transcript.scroll_by(1),
        KeyCode::Char('k') | KeyCode::Up => transcript.scroll_by(-1),
        KeyCode::Char('g') | KeyCode::Home => transcript.scroll_by(-i32::from(u16::MAX)),
        KeyCode::Char('G') | KeyCode::End => transcript.scroll_to_bottom(),
        KeyCode::Char('i') | KeyCode::Esc => app.focus = FocusPane::Input,
        _ => {}
    }
}

async fn handle_history(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.client.history_mut().nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.client.history_mut().nav_up(),
        KeyCode::Enter => {
            let index = app.client.history().selected();
            let action = app.client.activate_chat(index, ClickTarget::Row).await;
            app.handle_history_action(action);
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            let index = app.client.history().selected();
            let action = app.client.activate_chat(index, ClickTarget::DeleteButton).await;
            app.handle_history_action(action);
        }
        KeyCode::Char('r') => app.client.refresh_history().await,
        KeyCode::Esc => app.toggle_history().await,
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

/// Which history row (and which part of it) a click at `(x, y)` hit.
/// Rows start one line below the panel's top border.
pub fn history_hit(area: Rect, x: u16, y: u16) -> Option<(usize, ClickTarget)> {
    if !point_in_rect(x, y, area) {
        return None;
    }
    let inner_top = area.y + 1;
    let inner_right = area.x + area.width.saturating_sub(1);
    if y < inner_top || y >= area.y + area.height.saturating_sub(1) || x >= inner_right {
        return None;
    }

    let index = usize::from(y - inner_top);
    let target = if x >= inner_right.saturating_sub(DELETE_BUTTON_WIDTH) {
        ClickTarget::DeleteButton
    } else {
        ClickTarget::Row
    };
    Some((index, target))
}

async fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    let in_transcript = app.transcript_area.is_some_and(|r| point_in_rect(x, y, r));
    let in_history = app.history_area.is_some_and(|r| point_in_rect(x, y, r));
    let in_input = app.input_area.is_some_and(|r| point_in_rect(x, y, r));

    match mouse.kind {
        MouseEventKind::ScrollDown if in_transcript => {
            app.client.ui_mut().transcript.scroll_by(3);
        }
        MouseEventKind::ScrollUp if in_transcript => {
            app.client.ui_mut().transcript.scroll_by(-3);
        }
        MouseEventKind::ScrollDown if in_history => app.client.history_mut().nav_down(),
        MouseEventKind::ScrollUp if in_history => app.client.history_mut().nav_up(),
        MouseEventKind::Down(MouseButton::Left) => {
            if app.confirm_delete.is_some() {
                return;
            }
            if in_input {
                app.focus = FocusPane::Input;
            } else if in_transcript {
                app.focus = FocusPane::Transcript;
            } else if let Some((index, target)) =
                app.history_area.and_then(|area| history_hit(area, x, y))
            {
                app.focus = FocusPane::History;
                let index = index + app.history_offset;
                if index < app.client.history().rows().len() {
                    let action = app.client.activate_chat(index, target).await;
                    app.handle_history_action(action);
                }
            }
        }
        _ => {}
    }
}
