use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use crate::app::{App, InputMode, ServiceHealth};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
        AppEvent::Solved(resolution) => {
            if app.controller.apply(resolution).is_some() {
                app.scroll_to_bottom();
            }
        }
        AppEvent::FeedbackSent(result) => {
            app.notice = Some(match result {
                Ok(response) => response
                    .message
                    .unwrap_or_else(|| format!("Feedback {}", response.status)),
                Err(e) => {
                    tracing::warn!(error = %e, "feedback failed");
                    format!("Feedback failed: {}", e)
                }
            });
        }
        AppEvent::Status(result) => {
            app.health = match result {
                Ok(status) => {
                    tracing::info!(status = %status.status, "service status");
                    ServiceHealth::from_status(&status)
                }
                Err(e) => {
                    tracing::warn!(error = %e, url = %app.api_url, "status probe failed");
                    ServiceHealth::Offline
                }
            };
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Enter | KeyCode::Tab => {
            app.input_mode = InputMode::Editing;
        }

        // Transcript scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::PageDown => app.scroll_down((app.chat_height / 2).max(1)),
        KeyCode::PageUp => app.scroll_up((app.chat_height / 2).max(1)),
        KeyCode::Char('g') | KeyCode::Home => app.chat_scroll = 0,
        KeyCode::Char('G') | KeyCode::End => app.scroll_to_bottom(),

        // Rate the latest answer
        KeyCode::Char('+') | KeyCode::Char('=') => app.send_feedback(true),
        KeyCode::Char('-') => app.send_feedback(false),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            // Blank input and in-flight questions are refused by the controller
            app.submit();
        }
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(app.pending(), app.cursor);
                app.controller.pending_mut().remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.pending().chars().count();
            if app.cursor < char_count {
                let byte_pos = char_to_byte_index(app.pending(), app.cursor);
                app.controller.pending_mut().remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.pending().chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app.pending().chars().count();
        }
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(app.pending(), app.cursor);
            app.controller.pending_mut().insert(byte_pos, c);
            app.cursor += 1;
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}
