use std::sync::Arc;

use mathtutor_core::{ServiceStatus, SolveService, SubmissionController};
use tokio::sync::mpsc;

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// What the startup probe learned about the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceHealth {
    Checking,
    Healthy,
    Degraded,
    Offline,
}

impl ServiceHealth {
    pub fn from_status(status: &ServiceStatus) -> Self {
        if status.is_healthy() {
            ServiceHealth::Healthy
        } else {
            ServiceHealth::Degraded
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServiceHealth::Checking => "checking...",
            ServiceHealth::Healthy => "healthy",
            ServiceHealth::Degraded => "degraded",
            ServiceHealth::Offline => "offline",
        }
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Conversation (transcript, pending input, busy flag)
    pub controller: SubmissionController<dyn SolveService, AppEvent>,
    pub cursor: usize, // cursor position in the pending input, in chars

    // Chat view
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Footer notice (feedback results and the like)
    pub notice: Option<String>,

    // Service info
    pub health: ServiceHealth,
    pub api_url: String,

    events: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        service: Arc<dyn SolveService>,
        user_id: &str,
        api_url: &str,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            controller: SubmissionController::new(service, user_id, events.clone()),
            cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,

            notice: None,

            health: ServiceHealth::Checking,
            api_url: api_url.to_string(),

            events,
        }
    }

    pub fn pending(&self) -> &str {
        self.controller.conversation().pending()
    }

    pub fn is_busy(&self) -> bool {
        self.controller.is_busy()
    }

    /// Submit the input box; the cursor resets only if the submission was taken.
    pub fn submit(&mut self) -> bool {
        if !self.controller.submit_pending() {
            return false;
        }
        self.cursor = 0;
        self.notice = None;
        self.scroll_to_bottom();
        true
    }

    /// Rate the latest answer in the background.
    pub fn send_feedback(&mut self, correct: bool) {
        let Some(request) = self.controller.feedback_request(correct) else {
            self.notice = Some("Nothing to rate yet".to_string());
            return;
        };

        tracing::info!(correct, "sending feedback");
        self.notice = Some("Sending feedback...".to_string());

        let service = self.controller.service();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = service.send_feedback(request).await;
            let _ = events.send(AppEvent::FeedbackSent(result));
        });
    }

    /// Ask the service how it is doing, once, in the background.
    pub fn probe_status(&mut self) {
        self.health = ServiceHealth::Checking;

        let service = self.controller.service();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = service.status().await;
            let _ = events.send(AppEvent::Status(result));
        });
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max_scroll = self.total_chat_lines().saturating_sub(self.visible_chat_height());
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max_scroll);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    /// Scroll chat to bottom so the newest message (or "Thinking...") is visible
    pub fn scroll_to_bottom(&mut self) {
        let total_lines = self.total_chat_lines();
        let visible_height = self.visible_chat_height();

        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }

    fn visible_chat_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        }
    }

    /// Rendered line count of the transcript at the current chat width.
    pub fn total_chat_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in self.controller.conversation().messages() {
            total_lines = total_lines.saturating_add(1); // Role line ("You:" or "Tutor:")
            for line in msg.text.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                let wrapped = if char_count == 0 { 1 } else { char_count.div_ceil(wrap_width) };
                total_lines = total_lines.saturating_add(wrapped as u16);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }

        if self.is_busy() {
            total_lines = total_lines.saturating_add(2); // "Tutor:" + "Thinking..."
        }

        total_lines
    }
}
