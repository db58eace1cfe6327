//! Hero video cross-fade.
//!
//! The first clip plays until shortly before its end, then the second clip
//! starts and the opacities swap (the host's CSS transition does the actual
//! blending). After the transition the first clip is paused and hidden.

/// Commands for the host media elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossfadeAction {
    /// Start playback of the second clip and swap opacities.
    StartSecond,
    /// Pause and hide the first clip.
    RetireFirst,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CrossfadeState {
    PlayingFirst,
    Transitioning { retire_at_ms: f64 },
    Finished,
}

#[derive(Debug, Clone)]
pub struct VideoCrossfade {
    /// Seconds before the first clip ends at which the switch begins.
    lead_secs: f64,
    /// Time the host transition needs before the first clip can be retired.
    retire_delay_ms: f64,
    state: CrossfadeState,
}

impl Default for VideoCrossfade {
    fn default() -> Self {
        Self::new(0.8, 600.0)
    }
}

impl VideoCrossfade {
    pub fn new(lead_secs: f64, retire_delay_ms: f64) -> Self {
        Self {
            lead_secs,
            retire_delay_ms,
            state: CrossfadeState::PlayingFirst,
        }
    }

    /// Feed a playback progress report from the first clip.
    ///
    /// Returns `StartSecond` exactly once, the first time playback comes
    /// within the lead window of the clip's end.
    pub fn on_time_update(&mut self, current_secs: f64, duration_secs: f64, now_ms: f64) -> Option<CrossfadeAction> {
        if self.state != CrossfadeState::PlayingFirst || !duration_secs.is_finite() {
            return None;
        }
        if current_secs >= duration_secs - self.lead_secs {
            log::debug!("Cross-fading hero video at {:.2}s of {:.2}s", current_secs, duration_secs);
            self.state = CrossfadeState::Transitioning {
                retire_at_ms: now_ms + self.retire_delay_ms,
            };
            return Some(CrossfadeAction::StartSecond);
        }
        None
    }

    /// Advance timers; returns `RetireFirst` once the transition has had time to finish.
    pub fn tick(&mut self, now_ms: f64) -> Option<CrossfadeAction> {
        match self.state {
            CrossfadeState::Transitioning { retire_at_ms } if now_ms >= retire_at_ms => {
                self.state = CrossfadeState::Finished;
                Some(CrossfadeAction::RetireFirst)
            }
            _ => None,
        }
    }

    /// Target opacities for (first, second) clips.
    pub fn opacities(&self) -> (f32, f32) {
        match self.state {
            CrossfadeState::PlayingFirst => (1.0, 0.0),
            _ => (0.0, 1.0),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state == CrossfadeState::Finished
    }
}

/// Record a rejected play request. Playback failure never interrupts the page.
pub fn report_play_rejected(clip: &str, reason: &str) {
    log::warn!("Video '{}' play request rejected: {}", clip, reason);
}
