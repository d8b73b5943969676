//! Presentation session: the orchestrator
//!
//! Owns the two audio channels, the spin animator and the reveal machine, and
//! wires them into one timeline:
//!
//! 1. stop requested: duck the music, freeze and commit the spin
//! 2. +200ms: stop sound effect
//! 3. spin settled (completion event): restore the music
//! 4. +settle delay: end screen, reveal cycle starts
//!
//! Step 3 reacts to the animator's completion rather than a copy of its
//! duration, so changing the spin length keeps the sequence in order.

use serde::{Deserialize, Serialize};

use super::channel::{AudioBackend, AudioChannel, ChannelId, SilentBackend};
use super::fade::AudioFadeController;
use super::reveal::{Orientation, RevealTimings, SequencePhaseMachine, SequenceState};
use super::spin::{SpinConfig, SpinSnapshot, SpinStopAnimator};
use super::state::{GamePhase, SessionEvent, SimContext, TimerEvent};
use super::timer::{DueTimer, TimerId, TimerQueue};
use crate::consts::*;
use crate::platform::{LogBridge, PlatformBridge};

/// Delays of the stop sequence (ms)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopTimings {
    /// Music fade-out when the stop is requested
    pub duck_fade_ms: u64,
    /// Music fade-in after the wheel settles
    pub restore_fade_ms: u64,
    /// Music fade-in on the first interaction
    pub unlock_fade_ms: u64,
    /// Stop request to stop sound effect
    pub stop_sfx_delay_ms: u64,
    /// Wheel settled to end screen
    pub settle_delay_ms: u64,
}

impl Default for StopTimings {
    fn default() -> Self {
        Self {
            duck_fade_ms: DUCK_FADE_MS,
            restore_fade_ms: RESTORE_FADE_MS,
            unlock_fade_ms: UNLOCK_FADE_MS,
            stop_sfx_delay_ms: STOP_SFX_DELAY_MS,
            settle_delay_ms: SETTLE_DELAY_MS,
        }
    }
}

/// Everything a session needs to know up front
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub music_source: String,
    pub stop_sfx_source: String,
    /// Nominal background level
    pub music_volume: f32,
    pub stop_sfx_volume: f32,
    pub timings: StopTimings,
    pub spin: SpinConfig,
    pub reveal: RevealTimings,
    pub item_count: u8,
    pub orientation: Orientation,
    /// Seed for the resting angle
    pub seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            music_source: "background.mp3".into(),
            stop_sfx_source: "stop.mp3".into(),
            music_volume: NORMAL_VOLUME,
            stop_sfx_volume: STOP_SFX_VOLUME,
            timings: StopTimings::default(),
            spin: SpinConfig::default(),
            reveal: RevealTimings::default(),
            item_count: ITEM_COUNT,
            orientation: Orientation::Portrait,
            seed: 0,
        }
    }
}

/// One presentation, from mount to the looping end screen
pub struct Session {
    config: SessionConfig,
    now_ms: u64,
    phase: GamePhase,
    timers: TimerQueue<TimerEvent>,
    events: Vec<SessionEvent>,
    music: AudioChannel,
    sfx: AudioChannel,
    music_fade: AudioFadeController,
    sfx_fade: AudioFadeController,
    /// One-shot guard for the first-interaction fade-in
    music_started: bool,
    spin: SpinStopAnimator,
    reveal: SequencePhaseMachine,
    bridge: Box<dyn PlatformBridge>,
    stop_sfx_timer: Option<TimerId>,
    end_screen_timer: Option<TimerId>,
    torn_down: bool,
}

impl Session {
    pub fn new(
        config: SessionConfig,
        music_backend: Box<dyn AudioBackend>,
        sfx_backend: Box<dyn AudioBackend>,
        bridge: Box<dyn PlatformBridge>,
    ) -> Self {
        let music = AudioChannel::new(
            ChannelId::Music,
            config.music_source.clone(),
            config.music_volume,
            true,
            music_backend,
        );
        let sfx = AudioChannel::new(
            ChannelId::StopSfx,
            config.stop_sfx_source.clone(),
            config.stop_sfx_volume,
            false,
            sfx_backend,
        );
        let spin = SpinStopAnimator::new(config.spin, config.seed, 0);
        let reveal = SequencePhaseMachine::new(config.item_count, config.reveal, config.orientation);

        log::info!("Session created (seed {})", config.seed);

        Self {
            config,
            now_ms: 0,
            phase: GamePhase::Spinning,
            timers: TimerQueue::new(),
            events: Vec::new(),
            music,
            sfx,
            music_fade: AudioFadeController::new(ChannelId::Music),
            sfx_fade: AudioFadeController::new(ChannelId::StopSfx),
            music_started: false,
            spin,
            reveal,
            bridge,
            stop_sfx_timer: None,
            end_screen_timer: None,
            torn_down: false,
        }
    }

    /// Session with silent audio and a logging bridge
    pub fn headless(config: SessionConfig) -> Self {
        Self::new(
            config,
            Box::new(SilentBackend::default()),
            Box::new(SilentBackend::default()),
            Box::new(LogBridge::default()),
        )
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn music(&self) -> &AudioChannel {
        &self.music
    }

    /// Mutable access for the host (e.g. pausing when the tab is hidden)
    pub fn music_mut(&mut self) -> &mut AudioChannel {
        &mut self.music
    }

    pub fn sfx(&self) -> &AudioChannel {
        &self.sfx
    }

    pub fn music_started(&self) -> bool {
        self.music_started
    }

    pub fn spin(&self) -> &SpinStopAnimator {
        &self.spin
    }

    pub fn spin_snapshot(&self) -> SpinSnapshot {
        self.spin.snapshot(self.now_ms)
    }

    pub fn reveal(&self) -> &SequencePhaseMachine {
        &self.reveal
    }

    pub fn reveal_state(&self) -> SequenceState {
        self.reveal.state()
    }

    pub fn is_fading(&self, channel: ChannelId) -> bool {
        match channel {
            ChannelId::Music => self.music_fade.is_active(),
            ChannelId::StopSfx => self.sfx_fade.is_active(),
        }
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Due time of the next scheduled action
    pub fn next_due(&self) -> Option<u64> {
        self.timers.next_due()
    }

    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    /// Take all events published since the last drain
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    fn set_phase(&mut self, phase: GamePhase) {
        if self.phase == phase {
            return;
        }
        log::info!("Phase {:?} -> {:?} at {}ms", self.phase, phase, self.now_ms);
        self.phase = phase;
        self.events.push(SessionEvent::PhaseChanged { phase });
    }

    /// Ramp a channel. Replaces any ramp in flight on that channel.
    pub fn fade(&mut self, channel: ChannelId, target_volume: f32, duration_ms: u64) {
        let mut ctx = SimContext::new(self.now_ms, &mut self.timers, &mut self.events);
        match channel {
            ChannelId::Music => {
                self.music_fade
                    .fade(&mut self.music, target_volume, duration_ms, &mut ctx)
            }
            ChannelId::StopSfx => {
                self.sfx_fade
                    .fade(&mut self.sfx, target_volume, duration_ms, &mut ctx)
            }
        }
    }

    /// Any click or touch anywhere. The first one fades the music in.
    pub fn handle_interaction(&mut self) {
        if self.torn_down || self.music_started {
            return;
        }
        if !self.music.is_paused() {
            return;
        }
        self.music_started = true;
        log::info!("Interaction detected. Fading in music...");
        self.events.push(SessionEvent::MusicUnlocked);
        self.music.set_volume(0.0);
        self.fade(
            ChannelId::Music,
            self.config.music_volume,
            self.config.timings.unlock_fade_ms,
        );
    }

    /// The stop button. `observed_angle` is the live wheel angle if the host
    /// can read it; otherwise the idle clock is used.
    pub fn request_stop(&mut self, observed_angle: Option<f64>) {
        if self.torn_down || self.phase != GamePhase::Spinning {
            log::debug!("Stop ignored in {:?}", self.phase);
            return;
        }
        self.set_phase(GamePhase::Stopping);

        self.fade(ChannelId::Music, 0.0, self.config.timings.duck_fade_ms);

        let mut ctx = SimContext::new(self.now_ms, &mut self.timers, &mut self.events);
        self.stop_sfx_timer =
            Some(ctx.schedule_in(self.config.timings.stop_sfx_delay_ms, TimerEvent::StopSfx));

        let angle = observed_angle.unwrap_or_else(|| self.spin.idle_angle(self.now_ms));
        self.spin.begin_stop(angle, &mut ctx);
    }

    /// Call-to-action click on the end screen
    pub fn click_cta(&mut self) {
        if self.torn_down || self.phase != GamePhase::EndScreen {
            log::debug!("CTA ignored in {:?}", self.phase);
            return;
        }
        self.bridge.open_destination();
        self.events.push(SessionEvent::DestinationOpened);
    }

    /// Show or hide the end screen. Only meaningful once it has been reached.
    pub fn set_end_screen_visible(&mut self, visible: bool) {
        if self.torn_down || self.phase != GamePhase::EndScreen {
            return;
        }
        if visible == self.reveal.is_visible() {
            return;
        }
        let mut ctx = SimContext::new(self.now_ms, &mut self.timers, &mut self.events);
        if visible {
            self.reveal.show(&mut ctx);
        } else {
            self.reveal.hide(&mut ctx);
        }
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        if self.torn_down {
            return;
        }
        let mut ctx = SimContext::new(self.now_ms, &mut self.timers, &mut self.events);
        self.reveal.set_orientation(orientation, &mut ctx);
    }

    /// Fire every timer due up to `now_ms`, in order
    pub fn advance_to(&mut self, now_ms: u64) {
        while let Some(due) = self.timers.pop_due(now_ms) {
            self.dispatch(due);
        }
        self.now_ms = self.now_ms.max(now_ms);
    }

    fn dispatch(&mut self, due: DueTimer<TimerEvent>) {
        // Callbacks run at their scheduled time so chained delays do not drift
        self.now_ms = due.due_ms;
        log::trace!("Timer {:?} at {}ms", due.event, due.due_ms);

        match due.event {
            TimerEvent::FadeStep(ChannelId::Music) => {
                let mut ctx = SimContext::new(self.now_ms, &mut self.timers, &mut self.events);
                self.music_fade.on_timer(due.id, &mut self.music, &mut ctx);
            }
            TimerEvent::FadeStep(ChannelId::StopSfx) => {
                let mut ctx = SimContext::new(self.now_ms, &mut self.timers, &mut self.events);
                self.sfx_fade.on_timer(due.id, &mut self.sfx, &mut ctx);
            }
            TimerEvent::StopSfx => self.play_stop_sfx(due.id),
            TimerEvent::SpinSettled => {
                let mut ctx = SimContext::new(self.now_ms, &mut self.timers, &mut self.events);
                if self.spin.on_timer(due.id, &mut ctx) {
                    self.on_spin_settled();
                }
            }
            TimerEvent::EndScreenDue => self.enter_end_screen(due.id),
            TimerEvent::RevealEntered | TimerEvent::RevealAdvance => {
                let mut ctx = SimContext::new(self.now_ms, &mut self.timers, &mut self.events);
                self.reveal.on_timer(due.id, due.event, &mut ctx);
            }
        }
    }

    fn play_stop_sfx(&mut self, id: TimerId) {
        if self.stop_sfx_timer != Some(id) {
            return;
        }
        self.stop_sfx_timer = None;
        self.sfx.set_volume(self.config.stop_sfx_volume);
        match self.sfx.replay() {
            Ok(()) => self.events.push(SessionEvent::SoundPlayed {
                channel: ChannelId::StopSfx,
            }),
            Err(e) => {
                log::warn!("Stop sound failed: {}", e);
                self.events.push(SessionEvent::PlaybackDenied {
                    channel: ChannelId::StopSfx,
                    reason: e.to_string(),
                });
            }
        }
    }

    fn on_spin_settled(&mut self) {
        self.fade(
            ChannelId::Music,
            self.config.music_volume,
            self.config.timings.restore_fade_ms,
        );
        let mut ctx = SimContext::new(self.now_ms, &mut self.timers, &mut self.events);
        self.end_screen_timer =
            Some(ctx.schedule_in(self.config.timings.settle_delay_ms, TimerEvent::EndScreenDue));
    }

    fn enter_end_screen(&mut self, id: TimerId) {
        if self.end_screen_timer != Some(id) || self.phase != GamePhase::Stopping {
            return;
        }
        self.end_screen_timer = None;
        self.set_phase(GamePhase::EndScreenTransition);
        self.set_phase(GamePhase::EndScreen);
        let mut ctx = SimContext::new(self.now_ms, &mut self.timers, &mut self.events);
        self.reveal.show(&mut ctx);
    }

    /// End of the session: cancel every pending timer. Further input is ignored.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        let mut ctx = SimContext::new(self.now_ms, &mut self.timers, &mut self.events);
        self.music_fade.cancel(&mut ctx);
        self.sfx_fade.cancel(&mut ctx);
        self.spin.cancel(&mut ctx);
        ctx.cancel(&mut self.stop_sfx_timer);
        ctx.cancel(&mut self.end_screen_timer);
        self.reveal.hide(&mut ctx);
        self.torn_down = true;
        debug_assert!(self.timers.is_empty());
        log::info!("Session torn down at {}ms", self.now_ms);
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}
