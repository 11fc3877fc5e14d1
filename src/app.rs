use anyhow::Result;
use ratatui::layout::Rect;

use crate::client::ChatClient;
use crate::session::ChatSession;
use crate::tui::{AppEvent, EventSender};

pub struct App {
    pub should_quit: bool,
    pub session: ChatSession,
    pub client: ChatClient,
    events: EventSender,

    // Input state
    pub cursor: usize, // cursor position in session.draft, in chars

    // Requests spawned but not yet answered
    pub pending: usize,

    // Transcript view
    pub scroll: u16,
    pub follow: bool, // pin the view to the latest entry on next render
    pub chat_height: u16,
    pub total_lines: u16, // wrapped transcript rows, measured during render

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Areas for mouse hit-testing (set during render)
    pub send_area: Option<Rect>,
}

impl App {
    pub fn new(client: ChatClient, events: EventSender) -> Self {
        Self {
            should_quit: false,
            session: ChatSession::new(),
            client,
            events,
            cursor: 0,
            pending: 0,
            scroll: 0,
            follow: true,
            chat_height: 0,
            total_lines: 0,
            animation_frame: 0,
            send_area: None,
        }
    }

    /// Send the draft. The user message lands in the transcript right away;
    /// the reply arrives later as `AppEvent::Reply`.
    pub fn submit(&mut self) {
        let Some(input) = self.session.submit_draft() else {
            return;
        };

        self.cursor = 0;
        self.pending += 1;
        self.follow = true;

        let client = self.client.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = client.ask(&input).await;
            // The loop is gone if this fails; nothing left to update
            let _ = events.send(AppEvent::Reply(outcome));
        });
    }

    pub fn receive_reply(&mut self, outcome: Result<String>) {
        self.pending = self.pending.saturating_sub(1);
        self.session.complete(outcome);
        self.follow = true;
    }

    pub fn is_waiting(&self) -> bool {
        self.pending > 0
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_waiting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn max_scroll(&self) -> u16 {
        self.total_lines.saturating_sub(self.chat_height)
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow = false;
        self.scroll = self.scroll.min(self.max_scroll()).saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.scroll = self.scroll.saturating_add(lines).min(max);
        self.follow = self.scroll >= max;
    }

    pub fn page_size(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }
}
