//! Session phases, timer payloads and published events

use serde::{Deserialize, Serialize};

use super::channel::ChannelId;
use super::reveal::SequenceState;
use super::timer::{TimerId, TimerQueue};

/// Top-level lifecycle of one presentation. Forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GamePhase {
    /// Wheel idling, waiting for the stop button
    Spinning,
    /// Music ducked, wheel decelerating
    Stopping,
    /// Wheel settled, swapping to the end screen
    EndScreenTransition,
    /// Reveal cycle running
    EndScreen,
}

/// What a scheduled timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Advance one step of the channel's volume ramp
    FadeStep(ChannelId),
    /// Play the stop sound effect
    StopSfx,
    /// Deceleration finished
    SpinSettled,
    /// Settle delay over, show the end screen
    EndScreenDue,
    /// End screen entrance finished, start the reveal cycle
    RevealEntered,
    /// Move the reveal to its next sub-phase
    RevealAdvance,
}

/// Notifications for the rendering and audio layers, in the order they happened
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SessionEvent {
    PhaseChanged { phase: GamePhase },
    /// First interaction unlocked the background music
    MusicUnlocked,
    FadeStarted {
        channel: ChannelId,
        from: f32,
        to: f32,
        duration_ms: u64,
    },
    FadeCompleted { channel: ChannelId, volume: f32 },
    /// Ramp replaced by a newer one or aborted because playback stopped
    FadeCancelled { channel: ChannelId, volume: f32 },
    PlaybackDenied { channel: ChannelId, reason: String },
    SoundPlayed { channel: ChannelId },
    /// Idle loop frozen at this angle (degrees)
    SpinFrozen { angle: f64 },
    /// Decelerate from `from` to `to` over `duration_ms` with an ease-out curve
    SpinCommitted {
        from: f64,
        to: f64,
        duration_ms: u64,
    },
    SpinStopped { angle: f64 },
    EndScreenShown,
    EndScreenEntered,
    EndScreenHidden,
    RevealChanged { state: SequenceState },
    DestinationOpened,
}

/// Clock, timers and event sink handed to components while they run
pub struct SimContext<'a> {
    pub now_ms: u64,
    pub timers: &'a mut TimerQueue<TimerEvent>,
    pub events: &'a mut Vec<SessionEvent>,
}

impl<'a> SimContext<'a> {
    pub fn new(
        now_ms: u64,
        timers: &'a mut TimerQueue<TimerEvent>,
        events: &'a mut Vec<SessionEvent>,
    ) -> Self {
        Self {
            now_ms,
            timers,
            events,
        }
    }

    /// Schedule `event` `delay_ms` from now
    pub fn schedule_in(&mut self, delay_ms: u64, event: TimerEvent) -> TimerId {
        self.timers.schedule_at(self.now_ms.saturating_add(delay_ms), event)
    }

    pub fn schedule_at(&mut self, due_ms: u64, event: TimerEvent) -> TimerId {
        self.timers.schedule_at(due_ms, event)
    }

    /// Cancel the timer held in `slot`, leaving it empty
    pub fn cancel(&mut self, slot: &mut Option<TimerId>) -> bool {
        slot.take().is_some_and(|id| self.timers.cancel(id))
    }

    pub fn emit(&mut self, event: SessionEvent) {
        self.events.push(event);
    }
}
