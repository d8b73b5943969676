//! End-screen reveal cycle
//!
//! While visible the end screen loops forever:
//!
//! ```text
//! {0, text 0} -> {0, text 1} -> {1, CenterPop} -> {1, Restored} -> ... -> {K, Restored} -> {0, text 0}
//! ```
//!
//! The machine holds at most one pending timer. Hiding cancels it and resets
//! to the initial state; showing always starts over from the beginning.

use serde::{Deserialize, Serialize};

use super::state::{SessionEvent, SimContext, TimerEvent};
use super::timer::TimerId;
use crate::consts::{
    ENTRANCE_DELAY_MS, ITEM_COUNT, ITEM_POP_MS, ITEM_RESTORE_MS, LANDSCAPE_TEXT_MS, TEXT_PHASE_MS,
    TEXT_SWAP_MS,
};

/// Animation phase of the current prize item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ItemAnimPhase {
    #[default]
    Hidden,
    /// Item enlarged at the center of the podium
    CenterPop,
    /// Item back in its slot
    Restored,
}

/// Screen layout; landscape has no room for the item showcase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Current position in the reveal cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SequenceState {
    /// 0 = text phase, 1..=K = item phases
    pub step: u8,
    /// Which text is showing during step 0
    pub text_sub_step: u8,
    /// Only meaningful for steps 1..=K
    pub item_anim_phase: ItemAnimPhase,
}

impl SequenceState {
    pub const INITIAL: Self = Self {
        step: 0,
        text_sub_step: 0,
        item_anim_phase: ItemAnimPhase::Hidden,
    };

    pub fn is_text_phase(&self) -> bool {
        self.step == 0
    }
}

/// Reveal timings (ms)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealTimings {
    /// Show to cycle start
    pub entrance_delay_ms: u64,
    /// First text visible
    pub text_swap_ms: u64,
    /// First plus second text
    pub text_phase_ms: u64,
    pub item_pop_ms: u64,
    pub item_restore_ms: u64,
    /// Each text when there are no item steps
    pub landscape_text_ms: u64,
}

impl Default for RevealTimings {
    fn default() -> Self {
        Self {
            entrance_delay_ms: ENTRANCE_DELAY_MS,
            text_swap_ms: TEXT_SWAP_MS,
            text_phase_ms: TEXT_PHASE_MS,
            item_pop_ms: ITEM_POP_MS,
            item_restore_ms: ITEM_RESTORE_MS,
            landscape_text_ms: LANDSCAPE_TEXT_MS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SequencePhaseMachine {
    state: SequenceState,
    item_count: u8,
    orientation: Orientation,
    timings: RevealTimings,
    visible: bool,
    entered: bool,
    timer: Option<TimerId>,
}

impl Default for SequencePhaseMachine {
    fn default() -> Self {
        Self::new(ITEM_COUNT, RevealTimings::default(), Orientation::Portrait)
    }
}

impl SequencePhaseMachine {
    pub fn new(item_count: u8, timings: RevealTimings, orientation: Orientation) -> Self {
        Self {
            state: SequenceState::INITIAL,
            item_count,
            orientation,
            timings,
            visible: false,
            entered: false,
            timer: None,
        }
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// True once the entrance delay has passed and the cycle is running
    pub fn has_entered(&self) -> bool {
        self.entered
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Item steps in the current layout
    pub fn active_items(&self) -> u8 {
        match self.orientation {
            Orientation::Portrait => self.item_count,
            Orientation::Landscape => 0,
        }
    }

    /// How long the current sub-phase lasts. Never zero.
    pub fn delay_ms(&self) -> u64 {
        let t = &self.timings;
        let delay = match (self.state.step, self.state.text_sub_step, self.state.item_anim_phase) {
            (0, _, _) if self.active_items() == 0 => t.landscape_text_ms,
            (0, 0, _) => t.text_swap_ms,
            (0, _, _) => t.text_phase_ms.saturating_sub(t.text_swap_ms),
            (_, _, ItemAnimPhase::Restored) => t.item_restore_ms,
            (_, _, _) => t.item_pop_ms,
        };
        delay.max(1)
    }

    /// Move to the next sub-phase
    pub fn advance(&mut self) {
        let items = self.active_items();
        let s = self.state;
        self.state = match (s.step, s.item_anim_phase) {
            (0, _) if s.text_sub_step == 0 => SequenceState {
                text_sub_step: 1,
                ..SequenceState::INITIAL
            },
            (0, _) if items == 0 => SequenceState::INITIAL,
            (0, _) => SequenceState {
                step: 1,
                text_sub_step: 0,
                item_anim_phase: ItemAnimPhase::CenterPop,
            },
            (step, ItemAnimPhase::Restored) if step >= items => SequenceState::INITIAL,
            (step, ItemAnimPhase::Restored) => SequenceState {
                step: step + 1,
                text_sub_step: 0,
                item_anim_phase: ItemAnimPhase::CenterPop,
            },
            (step, _) => SequenceState {
                step,
                text_sub_step: 0,
                item_anim_phase: ItemAnimPhase::Restored,
            },
        };
    }

    /// Length of one full cycle in the current layout
    pub fn cycle_ms(&self) -> u64 {
        let t = &self.timings;
        let items = u64::from(self.active_items());
        if items == 0 {
            return t.landscape_text_ms.max(1).saturating_mul(2);
        }
        let item_ms = t.item_pop_ms.max(1).saturating_add(t.item_restore_ms.max(1));
        t.text_swap_ms
            .max(1)
            .saturating_add(t.text_phase_ms.saturating_sub(t.text_swap_ms).max(1))
            .saturating_add(items.saturating_mul(item_ms))
    }

    /// Show the end screen and start over. Returns the handle of the pending timer.
    pub fn show(&mut self, ctx: &mut SimContext<'_>) -> TimerId {
        ctx.cancel(&mut self.timer);
        self.state = SequenceState::INITIAL;
        self.visible = true;
        self.entered = false;
        ctx.emit(SessionEvent::EndScreenShown);
        let id = ctx.schedule_in(self.timings.entrance_delay_ms, TimerEvent::RevealEntered);
        self.timer = Some(id);
        id
    }

    /// Hide the end screen, cancelling the cycle
    pub fn hide(&mut self, ctx: &mut SimContext<'_>) {
        ctx.cancel(&mut self.timer);
        let was_visible = self.visible;
        self.state = SequenceState::INITIAL;
        self.visible = false;
        self.entered = false;
        if was_visible {
            ctx.emit(SessionEvent::EndScreenHidden);
        }
    }

    /// Switch layout. A visible cycle restarts from the beginning.
    pub fn set_orientation(&mut self, orientation: Orientation, ctx: &mut SimContext<'_>) {
        if orientation == self.orientation {
            return;
        }
        self.orientation = orientation;
        if !self.visible {
            return;
        }
        self.state = SequenceState::INITIAL;
        if self.entered {
            ctx.cancel(&mut self.timer);
            ctx.emit(SessionEvent::RevealChanged { state: self.state });
            self.timer = Some(ctx.schedule_in(self.delay_ms(), TimerEvent::RevealAdvance));
        }
    }

    /// Handle a fired reveal timer
    pub fn on_timer(&mut self, id: TimerId, event: TimerEvent, ctx: &mut SimContext<'_>) {
        if !self.visible || self.timer != Some(id) {
            log::debug!("Stale reveal timer ignored");
            return;
        }
        match event {
            TimerEvent::RevealEntered => {
                self.entered = true;
                ctx.emit(SessionEvent::EndScreenEntered);
                ctx.emit(SessionEvent::RevealChanged { state: self.state });
            }
            TimerEvent::RevealAdvance => {
                self.advance();
                ctx.emit(SessionEvent::RevealChanged { state: self.state });
            }
            other => {
                log::warn!("Reveal got unrelated timer {:?}", other);
                return;
            }
        }
        self.timer = Some(ctx.schedule_in(self.delay_ms(), TimerEvent::RevealAdvance));
    }
}
