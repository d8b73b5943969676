//! Frame tick
//!
//! Applies one frame of host input to the session and advances its clock.

use super::reveal::Orientation;
use super::session::Session;

/// Input gathered by the host during one frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Any click/touch anywhere (unlocks audio on the first one)
    pub interaction: bool,
    /// Stop button pressed
    pub stop: bool,
    /// Live wheel angle read from the renderer, if available
    pub observed_angle: Option<f64>,
    /// Call-to-action pressed
    pub cta: bool,
    /// End screen shown/hidden by the host
    pub end_screen_visible: Option<bool>,
    /// Viewport orientation changed
    pub orientation: Option<Orientation>,
}

impl TickInput {
    /// Clear one-shot inputs after they have been processed
    pub fn clear_one_shots(&mut self) {
        self.interaction = false;
        self.stop = false;
        self.observed_angle = None;
        self.cta = false;
        self.end_screen_visible = None;
        self.orientation = None;
    }
}

/// Apply `input` at the current time, then advance the session by `dt_ms`
pub fn tick(session: &mut Session, input: &TickInput, dt_ms: u64) {
    // Interaction first: the stop button click also counts as one
    if input.interaction {
        session.handle_interaction();
    }
    if input.stop {
        session.request_stop(input.observed_angle);
    }
    if let Some(orientation) = input.orientation {
        session.set_orientation(orientation);
    }
    if let Some(visible) = input.end_screen_visible {
        session.set_end_screen_visible(visible);
    }
    if input.cta {
        session.click_cta();
    }

    let now = session.now_ms().saturating_add(dt_ms);
    session.advance_to(now);
}
