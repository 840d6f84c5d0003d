use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use crate::app::{App, FocusPane};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(
    app: &mut App,
    event: AppEvent,
    events: &mpsc::UnboundedSender<AppEvent>,
) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key, events),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Completion { id, session, outcome } => app.on_completion(id, session, outcome),
        AppEvent::Models(outcome) => app.on_models(outcome),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent, events: &mpsc::UnboundedSender<AppEvent>) {
    // Global keys that work in any pane
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => app.should_quit = true,
            KeyCode::Char('n') => app.new_chat(),
            KeyCode::Char('l') => app.clear_history(),
            KeyCode::Char('t') => app.toggle_dark_mode(),
            KeyCode::Char('g') => app.cycle_language(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusPane::Sidebar => FocusPane::Input,
                FocusPane::Input => FocusPane::Sidebar,
            };
        }
        KeyCode::PageUp => app.scroll_up(),
        KeyCode::PageDown => app.scroll_down(),
        _ => match app.focus {
            FocusPane::Sidebar => handle_sidebar(app, key),
            FocusPane::Input => handle_input(app, key, events),
        },
    }
}

fn handle_sidebar(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => app.sidebar_down(),
        KeyCode::Up | KeyCode::Char('k') => app.sidebar_up(),
        KeyCode::Enter => {
            app.select_highlighted();
            app.focus = FocusPane::Input;
        }
        _ => {}
    }
}

fn handle_input(app: &mut App, key: KeyEvent, events: &mpsc::UnboundedSender<AppEvent>) {
    match key.code {
        KeyCode::Enter => app.submit(events),
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.input_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.input.chars().count();
        }
        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
            app.input.insert(byte_pos, c);
            app.input_cursor += 1;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ragchat_core::{ChatMessage, CompletionBackend};
    use std::sync::Arc;

    struct Never;

    #[async_trait]
    impl CompletionBackend for Never {
        async fn complete(&self, _transcript: &[ChatMessage]) -> ragchat_core::Result<String> {
            std::future::pending().await
        }

        async fn list_models(&self) -> ragchat_core::Result<Vec<String>> {
            std::future::pending().await
        }
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> AppEvent {
        AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn type_text(app: &mut App, tx: &mpsc::UnboundedSender<AppEvent>, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c)), tx).unwrap();
        }
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        assert_eq!(char_to_byte_index("héllo", 2), 3);
        assert_eq!(char_to_byte_index("abc", 10), 3);
    }

    #[test]
    fn test_editing_with_cursor() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(Arc::new(Never), "http://gateway");

        type_text(&mut app, &tx, "helo");
        handle_event(&mut app, key(KeyCode::Left), &tx).unwrap();
        type_text(&mut app, &tx, "l");
        assert_eq!(app.input, "hello");

        handle_event(&mut app, key(KeyCode::Home), &tx).unwrap();
        handle_event(&mut app, key(KeyCode::Delete), &tx).unwrap();
        assert_eq!(app.input, "ello");
    }

    #[test]
    fn test_control_keys() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(Arc::new(Never), "http://gateway");

        handle_event(&mut app, ctrl('n'), &tx).unwrap();
        handle_event(&mut app, ctrl('n'), &tx).unwrap();
        assert_eq!(app.sessions().len(), 2);

        handle_event(&mut app, ctrl('t'), &tx).unwrap();
        assert!(app.dark_mode);

        handle_event(&mut app, ctrl('l'), &tx).unwrap();
        assert!(app.sessions().is_empty());

        handle_event(&mut app, ctrl('c'), &tx).unwrap();
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_enter_while_pending_is_ignored() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(Arc::new(Never), "http://gateway");
        handle_event(&mut app, ctrl('n'), &tx).unwrap();

        type_text(&mut app, &tx, "first");
        handle_event(&mut app, key(KeyCode::Enter), &tx).unwrap();
        assert!(app.is_loading());

        type_text(&mut app, &tx, "second");
        handle_event(&mut app, key(KeyCode::Enter), &tx).unwrap();
        assert_eq!(app.input, "second");
        assert_eq!(app.controller.store().transcript(), &[ChatMessage::user("first")]);
    }

    #[test]
    fn test_sidebar_navigation_selects_chat() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(Arc::new(Never), "http://gateway");
        handle_event(&mut app, ctrl('n'), &tx).unwrap();
        handle_event(&mut app, ctrl('n'), &tx).unwrap();
        let first = app.sessions()[0].id();

        handle_event(&mut app, key(KeyCode::Tab), &tx).unwrap();
        assert_eq!(app.focus, FocusPane::Sidebar);
        handle_event(&mut app, key(KeyCode::Up), &tx).unwrap();
        handle_event(&mut app, key(KeyCode::Enter), &tx).unwrap();

        assert_eq!(app.current_session_id(), Some(first));
        assert_eq!(app.focus, FocusPane::Input);
    }
}
