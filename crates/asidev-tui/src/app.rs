use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::mpsc::UnboundedSender;

use asidev_core::{
    fallback, markdown, ApiError, CancelToken, ChatMessage, Config, DeepSeekClient, ProgressFn,
    SessionStore, UserProfile,
};

use crate::tui::AppEvent;

/// Fixed greeting that opens every conversation.
pub const GREETING: &str =
    "Hello! I am Asidev, your development assistant. How can I help you today?";

/// Fixed apology substituted when a request fails, whatever the cause.
const APOLOGY: &str =
    "Sorry, I could not process your request. Please check your API key or try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Conversation state
    pub chat_messages: Vec<ChatMessage>,
    pub draft: String,
    pub draft_cursor: usize, // cursor position in draft, in chars

    // In-flight response state
    pub is_generating: bool,
    pub current_response: String,
    pub cancel: CancelToken,

    // Chat viewport
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height of chat area, set during render
    pub chat_width: u16,  // inner width of chat area, set during render

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // API key input state
    pub show_api_key_input: bool,
    pub api_key_input: String,
    pub api_key_input_cursor: usize,

    // Transient status line
    pub status: Option<String>,

    // Collaborators
    pub config: Config,
    pub client: Option<DeepSeekClient>,
    pub session: SessionStore,
    pub user: Option<UserProfile>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let client = config
            .resolve_api_key()
            .map(|key| DeepSeekClient::new(&key, &config.api_base_url(), &config.model()));

        if client.is_none() {
            tracing::warn!("no API key provisioned; running against canned fallback responses");
        }

        let session = SessionStore::open()?;
        let user = session.current_user();

        Ok(Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            chat_messages: vec![ChatMessage::assistant(GREETING)],
            draft: String::new(),
            draft_cursor: 0,

            is_generating: false,
            current_response: String::new(),
            cancel: CancelToken::new(),

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,

            show_api_key_input: false,
            api_key_input: String::new(),
            api_key_input_cursor: 0,

            status: None,

            config,
            client,
            session,
            user,
        })
    }

    /// Submit the draft as a user message and start fetching the reply.
    /// Ignored while a response is already in flight.
    pub fn submit(&mut self, tx: &UnboundedSender<AppEvent>) {
        if self.draft.trim().is_empty() || self.is_generating {
            return;
        }

        let content = std::mem::take(&mut self.draft);
        self.draft_cursor = 0;
        self.status = None;
        self.chat_messages.push(ChatMessage::user(content));

        self.start_response(tx);
    }

    fn start_response(&mut self, tx: &UnboundedSender<AppEvent>) {
        self.is_generating = true;
        self.current_response.clear();
        self.animation_frame = 0;
        self.cancel = CancelToken::new();

        let cancel = self.cancel.clone();
        let history = self.chat_messages.clone();
        let client = self.client.clone();
        let tx_progress = tx.clone();
        let tx_done = tx.clone();

        tokio::spawn(async move {
            let on_progress: ProgressFn = Box::new(move |prefix: &str| {
                let _ = tx_progress.send(AppEvent::Progress(prefix.to_string()));
            });

            let result = match client {
                Some(client) => client.complete(&history, &cancel, Some(on_progress)).await,
                None => Ok(fallback(&cancel, Some(on_progress)).await),
            };

            let _ = tx_done.send(AppEvent::Completed(result));
        });

        self.scroll_chat_to_bottom();
    }

    /// A longer prefix of the in-flight response arrived from the reveal
    /// simulator.
    pub fn apply_progress(&mut self, prefix: String) {
        if !self.is_generating {
            return; // stale tick from a cancelled response
        }
        self.current_response = prefix;
        self.scroll_chat_to_bottom();
    }

    /// The response task finished; commit the reply to the conversation.
    pub fn finish_response(&mut self, result: Result<String, ApiError>) {
        if !self.is_generating {
            return;
        }

        match result {
            Ok(text) => {
                let cancelled = self.cancel.is_cancelled();
                // A cancelled reveal keeps exactly what the user saw.
                let content = if cancelled {
                    std::mem::take(&mut self.current_response)
                } else {
                    text
                };
                if !(cancelled && content.is_empty()) {
                    self.chat_messages.push(ChatMessage::assistant(content));
                }
            }
            Err(e) => {
                tracing::error!("completion request failed: {e}");
                self.chat_messages.push(ChatMessage::assistant(APOLOGY));
            }
        }

        self.current_response.clear();
        self.is_generating = false;
        self.scroll_chat_to_bottom();
    }

    /// Ask the in-flight reveal to stop after its current tick.
    pub fn stop_generation(&mut self) {
        if self.is_generating {
            self.cancel.cancel();
        }
    }

    /// Discard the conversation and start over with the greeting.
    pub fn new_conversation(&mut self) {
        if self.is_generating {
            return;
        }
        self.chat_messages = vec![ChatMessage::assistant(GREETING)];
        self.chat_scroll = 0;
        self.status = None;
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick(&mut self) {
        if self.is_generating {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        // The sign-in helper writes the session file out-of-band; pick it
        // up as soon as it appears.
        self.user = self.session.current_user();
    }

    pub fn sign_in(&mut self) {
        match self.session.sign_in(&self.config) {
            Ok(()) => {
                self.status = Some(
                    "Sign-in started in your browser; your profile appears here once it completes"
                        .to_string(),
                );
            }
            Err(e) => {
                tracing::warn!("sign-in trigger failed: {e}");
                self.status = Some(format!("Sign-in unavailable: {e}"));
            }
        }
    }

    pub fn sign_out(&mut self) {
        if let Err(e) = self.session.sign_out() {
            tracing::warn!("sign-out failed: {e}");
            self.status = Some(format!("Sign-out failed: {e}"));
            return;
        }
        self.user = None;
        self.status = Some("Signed out".to_string());
    }

    // API key popup

    pub fn open_api_key_input(&mut self) {
        self.show_api_key_input = true;
        self.api_key_input.clear();
        self.api_key_input_cursor = 0;
    }

    pub fn cancel_api_key_input(&mut self) {
        self.show_api_key_input = false;
        self.api_key_input.clear();
        self.api_key_input_cursor = 0;
    }

    /// Persist the entered key and rebuild the client with it.
    pub fn apply_api_key(&mut self) {
        let key = self.api_key_input.trim().to_string();
        self.cancel_api_key_input();
        if key.is_empty() {
            return;
        }

        match Config::save_api_key(&key) {
            Ok(()) => {
                self.config.api_key = Some(key.clone());
                self.client = Some(DeepSeekClient::new(
                    &key,
                    &self.config.api_base_url(),
                    &self.config.model(),
                ));
                self.status = Some("API key saved".to_string());
            }
            Err(e) => {
                tracing::error!("failed to save API key: {e}");
                self.status = Some(format!("Failed to save API key: {e}"));
            }
        }
    }

    /// Write the conversation to a standalone HTML file.
    pub fn export_transcript(&mut self) {
        let path = match self.transcript_path() {
            Ok(path) => path,
            Err(e) => {
                self.status = Some(format!("Export failed: {e}"));
                return;
            }
        };

        let html = markdown::render_document("Asidev conversation", &self.chat_messages);
        match std::fs::write(&path, html) {
            Ok(()) => {
                tracing::info!("transcript exported to {}", path.display());
                self.status = Some(format!("Transcript exported to {}", path.display()));
            }
            Err(e) => {
                tracing::error!("transcript export failed: {e}");
                self.status = Some(format!("Export failed: {e}"));
            }
        }
    }

    fn transcript_path(&self) -> Result<PathBuf> {
        let dir = Config::config_dir()?;
        std::fs::create_dir_all(&dir)?;
        Ok(dir.join("transcript.html"))
    }

    // Chat scrolling

    pub fn scroll_down(&mut self) {
        let max_scroll = self
            .estimated_chat_lines()
            .saturating_sub(self.chat_height.max(1));
        if self.chat_scroll < max_scroll {
            self.chat_scroll = self.chat_scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = self.chat_height / 2;
        let max_scroll = self
            .estimated_chat_lines()
            .saturating_sub(self.chat_height.max(1));
        self.chat_scroll = (self.chat_scroll + half_page).min(max_scroll);
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = self.chat_height / 2;
        self.chat_scroll = self.chat_scroll.saturating_sub(half_page);
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
    }

    /// Keep the newest content visible while a response types itself out.
    pub fn scroll_chat_to_bottom(&mut self) {
        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        let total_lines = self.estimated_chat_lines();
        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        } else {
            self.chat_scroll = 0;
        }
    }

    /// Estimate of the rendered chat height in wrapped lines; mirrors the
    /// layout the UI produces closely enough for scroll positioning.
    fn estimated_chat_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total: u16 = 0;
        for msg in &self.chat_messages {
            total = total.saturating_add(1); // role label line
            total = total.saturating_add(wrapped_line_count(&msg.content, wrap_width));
            total = total.saturating_add(1); // blank line after message
        }

        if self.is_generating {
            total = total.saturating_add(1); // role label
            if self.current_response.is_empty() {
                total = total.saturating_add(1); // "Thinking..."
            } else {
                total =
                    total.saturating_add(wrapped_line_count(&self.current_response, wrap_width));
            }
        }

        total
    }
}

/// Wrapped line estimate for one message body. Uses character counts, not
/// byte lengths, so multi-byte text does not overestimate.
fn wrapped_line_count(text: &str, width: usize) -> u16 {
    let width = width.max(1);
    let mut count: u16 = 0;
    for line in text.lines() {
        let chars = line.chars().count();
        if chars == 0 {
            count = count.saturating_add(1);
        } else {
            count = count.saturating_add(((chars / width) + 1) as u16);
        }
    }
    count.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_still_occupies_one_line() {
        assert_eq!(wrapped_line_count("", 40), 1);
    }

    #[test]
    fn long_lines_wrap_by_character_count() {
        let text = "a".repeat(100);
        assert_eq!(wrapped_line_count(&text, 40), 3);
    }

    #[test]
    fn multibyte_text_counts_characters_not_bytes() {
        let text = "é".repeat(30); // 60 bytes, 30 chars
        assert_eq!(wrapped_line_count(&text, 40), 1);
    }

    #[test]
    fn multiline_text_sums_each_line() {
        assert_eq!(wrapped_line_count("one\ntwo\n\nthree", 40), 4);
    }
}
