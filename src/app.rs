use std::sync::Arc;

use ragchat_core::{
    ChatSession, CompletionBackend, FinishOutcome, SessionId, SubmissionController, SubmissionId,
};
use ratatui::widgets::ListState;
use tokio::sync::mpsc;

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Sidebar,
    Input,
}

/// Language offered in the input placeholder. Cosmetic only: the request
/// sent to the model is not affected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    Spanish,
    French,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Spanish => "Spanish",
            Language::French => "French",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Spanish => "Español",
            Language::French => "Français",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Language::English => Language::Spanish,
            Language::Spanish => Language::French,
            Language::French => Language::English,
        }
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub focus: FocusPane,
    pub controller: SubmissionController,
    backend: Arc<dyn CompletionBackend>,
    pub gateway_url: String,
    /// Models the gateway reported; `None` until it answers or if it failed
    pub models: Option<Vec<String>>,

    // Sidebar state
    pub sidebar_state: ListState,

    // Input state
    pub input: String,
    pub input_cursor: usize, // cursor position in chars

    // Chat view state
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub animation_frame: u8,

    // Appearance
    pub dark_mode: bool,
    pub language: Language,
}

impl App {
    pub fn new(backend: Arc<dyn CompletionBackend>, gateway_url: &str) -> Self {
        Self {
            should_quit: false,
            focus: FocusPane::Input,
            controller: SubmissionController::new(),
            backend,
            gateway_url: gateway_url.to_string(),
            models: None,

            sidebar_state: ListState::default(),

            input: String::new(),
            input_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,

            dark_mode: false,
            language: Language::default(),
        }
    }

    pub fn sessions(&self) -> &[ChatSession] {
        self.controller.store().sessions()
    }

    pub fn current_session_id(&self) -> Option<SessionId> {
        self.controller.store().current_id()
    }

    pub fn is_loading(&self) -> bool {
        self.controller.is_pending()
    }

    /// Text for the "Models:" line of the settings panel.
    pub fn models_label(&self) -> String {
        match &self.models {
            Some(models) if models.is_empty() => "none installed".to_string(),
            Some(models) => models.join(", "),
            None => "unavailable".to_string(),
        }
    }

    pub fn placeholder(&self) -> String {
        format!("Say something in {}...", self.language.as_str())
    }

    pub fn new_chat(&mut self) {
        self.controller.create_session();
        self.chat_scroll = 0;
        self.sync_sidebar();
    }

    pub fn clear_history(&mut self) {
        self.controller.clear_all();
        self.chat_scroll = 0;
        self.sync_sidebar();
    }

    /// Selects the chat highlighted in the sidebar.
    pub fn select_highlighted(&mut self) {
        let id = self
            .sidebar_state
            .selected()
            .and_then(|i| self.sessions().get(i))
            .map(|s| s.id());
        if let Some(id) = id {
            self.controller.select_session(id);
            self.chat_scroll = 0;
            self.scroll_chat_to_bottom();
        }
    }

    pub fn sidebar_down(&mut self) {
        let len = self.sessions().len();
        if len == 0 {
            return;
        }
        let next = self.sidebar_state.selected().map_or(0, |i| (i + 1).min(len - 1));
        self.sidebar_state.select(Some(next));
    }

    pub fn sidebar_up(&mut self) {
        if let Some(i) = self.sidebar_state.selected() {
            self.sidebar_state.select(Some(i.saturating_sub(1)));
        }
    }

    /// Points the sidebar highlight at the current chat.
    fn sync_sidebar(&mut self) {
        let current = self.current_session_id();
        let idx = current.and_then(|id| self.sessions().iter().position(|s| s.id() == id));
        self.sidebar_state.select(idx);
    }

    pub fn toggle_dark_mode(&mut self) {
        self.dark_mode = !self.dark_mode;
    }

    pub fn cycle_language(&mut self) {
        self.language = self.language.next();
    }

    /// Sends the input line and spawns the gateway call.
    ///
    /// The reply comes back through `events` as [`AppEvent::Completion`].
    pub fn submit(&mut self, events: &mpsc::UnboundedSender<AppEvent>) {
        let Some(pending) = self.controller.begin_submit(&self.input) else {
            return;
        };

        self.input.clear();
        self.input_cursor = 0;
        self.sync_sidebar();
        // Scroll to bottom so "Thinking..." is visible
        self.scroll_chat_to_bottom();

        let backend = Arc::clone(&self.backend);
        let events = events.clone();
        tokio::spawn(async move {
            let outcome = backend.complete(&pending.transcript).await;
            let event = AppEvent::Completion {
                id: pending.id,
                session: pending.session,
                outcome,
            };
            if events.send(event).is_err() {
                log::debug!("Reply for {} arrived after shutdown", pending.id);
            }
        });
    }

    /// Asks the gateway which models it serves.
    ///
    /// The answer comes back through `events` as [`AppEvent::Models`].
    pub fn fetch_models(&self, events: &mpsc::UnboundedSender<AppEvent>) {
        let backend = Arc::clone(&self.backend);
        let events = events.clone();
        tokio::spawn(async move {
            let outcome = backend.list_models().await;
            if events.send(AppEvent::Models(outcome)).is_err() {
                log::debug!("Model list arrived after shutdown");
            }
        });
    }

    pub fn on_models(&mut self, outcome: ragchat_core::Result<Vec<String>>) {
        match outcome {
            Ok(models) => {
                log::info!("Gateway serves {} model(s)", models.len());
                self.models = Some(models);
            }
            Err(e) => {
                log::warn!("Could not list models: {}", e);
                self.models = None;
            }
        }
    }

    pub fn on_completion(
        &mut self,
        id: SubmissionId,
        session: SessionId,
        outcome: ragchat_core::Result<String>,
    ) {
        let outcome = self.controller.finish_submit(id, session, outcome);
        if outcome != FinishOutcome::Dropped && self.current_session_id() == Some(session) {
            self.scroll_chat_to_bottom();
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    /// Scroll chat to bottom so the newest message is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: usize = 0;

        for msg in self.controller.store().transcript() {
            // Role line ("You:" or "AI:") and the blank line after the message
            total_lines = total_lines.saturating_add(2);
            for line in msg.content.lines() {
                // Character count, not byte length, for UTF-8 text
                let char_count = line.chars().count();
                total_lines = total_lines.saturating_add(char_count / wrap_width + 1);
            }
        }

        if self.is_loading() {
            total_lines = total_lines.saturating_add(2); // "AI:" + "Thinking..."
        }
        let total_lines = u16::try_from(total_lines).unwrap_or(u16::MAX);

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ragchat_core::{ChatError, ChatMessage, ERROR_REPLY};

    struct Echo;

    #[async_trait]
    impl CompletionBackend for Echo {
        async fn complete(&self, transcript: &[ChatMessage]) -> ragchat_core::Result<String> {
            let last = transcript.last().map(|m| m.content.clone()).unwrap_or_default();
            if last == "fail" {
                return Err(ChatError::Upstream("boom".to_string()));
            }
            Ok(format!("echo: {}", last))
        }

        async fn list_models(&self) -> ragchat_core::Result<Vec<String>> {
            Ok(vec!["llama2".to_string(), "mistral".to_string()])
        }
    }

    fn app() -> App {
        App::new(Arc::new(Echo), "http://127.0.0.1:3000")
    }

    async fn deliver(app: &mut App, rx: &mut mpsc::UnboundedReceiver<AppEvent>) {
        match rx.recv().await {
            Some(AppEvent::Completion { id, session, outcome }) => {
                app.on_completion(id, session, outcome)
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn test_language_cycle_changes_placeholder_only() {
        let mut app = app();
        assert_eq!(app.placeholder(), "Say something in English...");
        app.cycle_language();
        assert_eq!(app.placeholder(), "Say something in Spanish...");
        app.cycle_language();
        app.cycle_language();
        assert_eq!(app.language, Language::English);
    }

    #[test]
    fn test_dark_mode_toggle() {
        let mut app = app();
        app.toggle_dark_mode();
        assert!(app.dark_mode);
        app.toggle_dark_mode();
        assert!(!app.dark_mode);
    }

    #[test]
    fn test_sidebar_follows_new_chat_and_selection() {
        let mut app = app();
        app.new_chat();
        app.new_chat();
        assert_eq!(app.sidebar_state.selected(), Some(1));

        app.sidebar_up();
        app.select_highlighted();
        assert_eq!(app.current_session_id(), Some(app.sessions()[0].id()));

        app.clear_history();
        assert_eq!(app.sidebar_state.selected(), None);
        assert!(app.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_submit_round_trip() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = app();
        app.new_chat();
        app.input = "hello".to_string();
        app.input_cursor = 5;

        app.submit(&tx);
        assert!(app.input.is_empty());
        assert_eq!(app.input_cursor, 0);
        assert!(app.is_loading());
        assert_eq!(app.controller.store().transcript(), &[ChatMessage::user("hello")]);

        deliver(&mut app, &mut rx).await;
        assert!(!app.is_loading());
        assert_eq!(
            app.controller.store().transcript(),
            &[ChatMessage::user("hello"), ChatMessage::assistant("echo: hello")]
        );
    }

    #[tokio::test]
    async fn test_failed_submit_shows_error_bubble() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = app();
        app.input = "fail".to_string();

        app.submit(&tx);
        deliver(&mut app, &mut rx).await;

        let transcript = app.controller.store().transcript();
        assert_eq!(transcript.last(), Some(&ChatMessage::assistant(ERROR_REPLY)));
        assert!(!app.is_loading());
    }

    #[test]
    fn test_blank_input_is_kept_and_ignored() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = app();
        app.input = "   ".to_string();

        app.submit(&tx);
        assert_eq!(app.input, "   ");
        assert!(app.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_models_fills_settings_label() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = app();
        assert_eq!(app.models_label(), "unavailable");

        app.fetch_models(&tx);
        match rx.recv().await {
            Some(AppEvent::Models(outcome)) => app.on_models(outcome),
            other => panic!("expected models, got {:?}", other),
        }
        assert_eq!(app.models_label(), "llama2, mistral");

        app.on_models(Err(ChatError::Upstream("down".to_string())));
        assert_eq!(app.models, None);
        app.on_models(Ok(Vec::new()));
        assert_eq!(app.models_label(), "none installed");
    }

    struct Verbose;

    #[async_trait]
    impl CompletionBackend for Verbose {
        async fn complete(&self, _transcript: &[ChatMessage]) -> ragchat_core::Result<String> {
            Ok("line\n".repeat(70_000))
        }

        async fn list_models(&self) -> ragchat_core::Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_very_long_reply_pins_scroll_to_bottom() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = App::new(Arc::new(Verbose), "http://127.0.0.1:3000");
        app.input = "tell me everything".to_string();

        app.submit(&tx);
        deliver(&mut app, &mut rx).await;

        assert!(!app.is_loading());
        assert_eq!(app.chat_scroll, u16::MAX - 20);
        assert_eq!(app.controller.store().transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_reply_to_background_chat_keeps_scroll() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = app();
        app.new_chat();
        app.input = "hello".to_string();
        app.submit(&tx);

        // Switch to another chat while the first one waits
        app.new_chat();
        app.chat_scroll = 7;
        deliver(&mut app, &mut rx).await;

        assert_eq!(app.chat_scroll, 7);
        assert_eq!(app.sessions()[0].transcript().len(), 2);
        assert!(app.controller.store().transcript().is_empty());
    }
}
