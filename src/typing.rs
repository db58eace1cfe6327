//! Typewriter effect as a frame-driven state machine.
//!
//! Reveals one character per interval, then keeps the cursor visible for a
//! short linger before hiding it. Advancing is driven by host frame
//! timestamps, so a slow frame catches up on every character that came due.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TypewriterConfig {
    pub text: String,
    pub char_interval_ms: f64,
    /// Delay between the last character and the cursor disappearing.
    pub cursor_linger_ms: f64,
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self {
            text: "AI Engineer".to_string(),
            char_interval_ms: 100.0,
            cursor_linger_ms: 500.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TypingState {
    Idle,
    Typing { next_at: f64 },
    Lingering { hide_at: f64 },
    Done,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct Typewriter {
    chars: Vec<char>,
    typed: usize,
    char_interval_ms: f64,
    cursor_linger_ms: f64,
    state: TypingState,
}

impl Typewriter {
    pub fn new(config: &TypewriterConfig) -> Self {
        Self {
            chars: config.text.chars().collect(),
            typed: 0,
            char_interval_ms: config.char_interval_ms.max(0.0),
            cursor_linger_ms: config.cursor_linger_ms.max(0.0),
            state: TypingState::Idle,
        }
    }

    /// Begin typing from an empty line; the first character appears immediately.
    pub fn start(&mut self, now_ms: f64) {
        self.typed = 0;
        self.state = TypingState::Typing { next_at: now_ms };
    }

    /// Stop wherever the effect currently is. The visible text is kept.
    pub fn cancel(&mut self) {
        if !matches!(self.state, TypingState::Done) {
            self.state = TypingState::Cancelled;
        }
    }

    /// Advance to `now_ms`. Returns true if the visible output changed.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        let mut changed = false;
        loop {
            match self.state {
                TypingState::Typing { next_at } if now_ms >= next_at => {
                    if self.typed < self.chars.len() {
                        self.typed += 1;
                        self.state = TypingState::Typing {
                            next_at: next_at + self.char_interval_ms,
                        };
                    } else {
                        self.state = TypingState::Lingering {
                            hide_at: next_at + self.cursor_linger_ms,
                        };
                    }
                    changed = true;
                }
                TypingState::Lingering { hide_at } if now_ms >= hide_at => {
                    self.state = TypingState::Done;
                    changed = true;
                }
                _ => return changed,
            }
        }
    }

    pub fn visible_text(&self) -> String {
        self.chars[..self.typed].iter().collect()
    }

    pub fn cursor_visible(&self) -> bool {
        !matches!(self.state, TypingState::Done)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, TypingState::Done | TypingState::Cancelled)
    }
}
