//! Linear volume ramps
//!
//! A fade is split into [`FADE_STEPS`] discrete steps. Step `k` is scheduled at
//! `start + k * duration / steps` (rounded to the millisecond), so the last step
//! always lands exactly at `start + duration` and snaps to the target.

use super::channel::{AudioChannel, ChannelId};
use super::state::{SessionEvent, SimContext, TimerEvent};
use super::timer::TimerId;
use crate::consts::FADE_STEPS;

/// Progress of one volume ramp
#[derive(Debug, Clone, PartialEq)]
pub struct FadeJob {
    pub channel: ChannelId,
    pub start_volume: f32,
    pub target_volume: f32,
    pub elapsed_steps: u32,
    pub total_steps: u32,
}

impl FadeJob {
    pub fn new(channel: ChannelId, start_volume: f32, target_volume: f32, total_steps: u32) -> Self {
        Self {
            channel,
            start_volume,
            target_volume,
            elapsed_steps: 0,
            total_steps: total_steps.max(1),
        }
    }

    /// Volume change per step
    pub fn step_delta(&self) -> f32 {
        (self.target_volume - self.start_volume) / self.total_steps as f32
    }

    /// Advance one step and return the new volume
    pub fn advance(&mut self) -> f32 {
        self.elapsed_steps = (self.elapsed_steps + 1).min(self.total_steps);
        if self.is_finished() {
            // Snap to kill accumulated float error
            self.target_volume
        } else {
            (self.start_volume + self.step_delta() * self.elapsed_steps as f32).clamp(0.0, 1.0)
        }
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed_steps >= self.total_steps
    }
}

#[derive(Debug, Clone)]
struct ActiveFade {
    job: FadeJob,
    timer: TimerId,
    started_ms: u64,
    duration_ms: u64,
    /// Playback was running when the ramp began, so a pause means abort
    requires_playback: bool,
}

/// Absolute due time of ramp step `step` (1-based)
fn step_due_ms(started_ms: u64, duration_ms: u64, step: u32, total_steps: u32) -> u64 {
    let steps = u128::from(total_steps.max(1));
    let offset = (u128::from(step) * u128::from(duration_ms) + steps / 2) / steps;
    started_ms.saturating_add(u64::try_from(offset).unwrap_or(u64::MAX))
}

/// Owns the single in-flight ramp of one channel
#[derive(Debug, Clone)]
pub struct AudioFadeController {
    channel: ChannelId,
    steps: u32,
    active: Option<ActiveFade>,
}

impl AudioFadeController {
    pub fn new(channel: ChannelId) -> Self {
        Self::with_steps(channel, FADE_STEPS)
    }

    pub fn with_steps(channel: ChannelId, steps: u32) -> Self {
        Self {
            channel,
            steps: steps.max(1),
            active: None,
        }
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn job(&self) -> Option<&FadeJob> {
        self.active.as_ref().map(|a| &a.job)
    }

    /// Ramp `channel` to `target_volume` over `duration_ms`, replacing any ramp in flight
    pub fn fade(
        &mut self,
        channel: &mut AudioChannel,
        target_volume: f32,
        duration_ms: u64,
        ctx: &mut SimContext<'_>,
    ) {
        debug_assert_eq!(channel.id(), self.channel);
        let target = target_volume.clamp(0.0, 1.0);

        if self.cancel(ctx) {
            ctx.emit(SessionEvent::FadeCancelled {
                channel: self.channel,
                volume: channel.volume(),
            });
        }

        let start = channel.volume();
        if target > 0.0 && channel.is_paused() {
            // Start at the pre-fade level so there is no jump
            channel.set_volume(start);
            if let Err(e) = channel.play() {
                log::warn!("{:?}: {} - fading silently", self.channel, e);
                ctx.emit(SessionEvent::PlaybackDenied {
                    channel: self.channel,
                    reason: e.to_string(),
                });
            }
        }
        let requires_playback = target > 0.0 && channel.is_playing();

        ctx.emit(SessionEvent::FadeStarted {
            channel: self.channel,
            from: start,
            to: target,
            duration_ms,
        });

        if duration_ms == 0 {
            channel.set_volume(target);
            ctx.emit(SessionEvent::FadeCompleted {
                channel: self.channel,
                volume: target,
            });
            return;
        }

        let job = FadeJob::new(self.channel, start, target, self.steps);
        let first_due = step_due_ms(ctx.now_ms, duration_ms, 1, job.total_steps);
        let timer = ctx.schedule_at(first_due, TimerEvent::FadeStep(self.channel));
        log::debug!(
            "{:?}: fade {:.3} -> {:.3} over {}ms",
            self.channel,
            start,
            target,
            duration_ms
        );
        self.active = Some(ActiveFade {
            job,
            timer,
            started_ms: ctx.now_ms,
            duration_ms,
            requires_playback,
        });
    }

    /// Handle a fired `FadeStep` timer
    pub fn on_timer(&mut self, id: TimerId, channel: &mut AudioChannel, ctx: &mut SimContext<'_>) {
        let Some(active) = self.active.as_mut() else {
            log::debug!("{:?}: stale fade step ignored", self.channel);
            return;
        };
        if active.timer != id {
            log::debug!("{:?}: stale fade step ignored", self.channel);
            return;
        }

        if active.requires_playback && channel.is_paused() {
            log::debug!("{:?}: channel paused mid-fade, aborting", self.channel);
            self.active = None;
            ctx.emit(SessionEvent::FadeCancelled {
                channel: self.channel,
                volume: channel.volume(),
            });
            return;
        }

        let volume = active.job.advance();
        channel.set_volume(volume);

        if active.job.is_finished() {
            self.active = None;
            ctx.emit(SessionEvent::FadeCompleted {
                channel: self.channel,
                volume,
            });
        } else {
            let next = step_due_ms(
                active.started_ms,
                active.duration_ms,
                active.job.elapsed_steps + 1,
                active.job.total_steps,
            );
            active.timer = ctx.schedule_at(next, TimerEvent::FadeStep(self.channel));
        }
    }

    /// Drop the ramp in flight. Returns true if there was one.
    pub fn cancel(&mut self, ctx: &mut SimContext<'_>) -> bool {
        match self.active.take() {
            Some(active) => {
                ctx.timers.cancel(active.timer);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::channel::SilentBackend;
    use crate::sim::timer::TimerQueue;
    use proptest::prelude::*;

    /// Minimal harness: one channel, one controller, a timer queue
    struct Rig {
        now: u64,
        timers: TimerQueue<TimerEvent>,
        events: Vec<SessionEvent>,
        channel: AudioChannel,
        fader: AudioFadeController,
    }

    impl Rig {
        fn new(volume: f32, playing: bool) -> Self {
            let mut channel = AudioChannel::silent(ChannelId::Music, "bg.mp3", volume, true);
            if playing {
                channel.play().unwrap();
            }
            Self {
                now: 0,
                timers: TimerQueue::new(),
                events: Vec::new(),
                channel,
                fader: AudioFadeController::new(ChannelId::Music),
            }
        }

        fn fade(&mut self, target: f32, duration_ms: u64) {
            let mut ctx = SimContext::new(self.now, &mut self.timers, &mut self.events);
            self.fader.fade(&mut self.channel, target, duration_ms, &mut ctx);
        }

        /// Run timers up to `until`, returning (time, volume) after each step
        fn run_until(&mut self, until: u64) -> Vec<(u64, f32)> {
            let mut trace = Vec::new();
            while let Some(due) = self.timers.pop_due(until) {
                self.now = due.due_ms;
                let mut ctx = SimContext::new(self.now, &mut self.timers, &mut self.events);
                self.fader.on_timer(due.id, &mut self.channel, &mut ctx);
                trace.push((self.now, self.channel.volume()));
            }
            self.now = until;
            trace
        }
    }

    #[test]
    fn test_step_due_times() {
        assert_eq!(step_due_ms(1000, 800, 1, 20), 1040);
        assert_eq!(step_due_ms(1000, 800, 20, 20), 1800);
        assert_eq!(step_due_ms(0, 10, 1, 20), 1);
        // Huge durations saturate instead of overflowing
        assert_eq!(step_due_ms(5, u64::MAX, 20, 20), u64::MAX);
        assert!(step_due_ms(0, u64::MAX, 1, 20) < u64::MAX);
    }

    #[test]
    fn test_job_snaps_to_target() {
        let mut job = FadeJob::new(ChannelId::Music, 0.0, 0.15, 20);
        let mut last = 0.0;
        for _ in 0..20 {
            last = job.advance();
        }
        assert!(job.is_finished());
        assert_eq!(last, 0.15);
    }

    #[test]
    fn test_zero_duration_sets_immediately() {
        let mut rig = Rig::new(0.15, true);
        rig.fade(0.6, 0);
        assert_eq!(rig.channel.volume(), 0.6);
        assert!(!rig.fader.is_active());
        assert!(rig.timers.is_empty());
    }

    #[test]
    fn test_duck_then_restore_trajectory() {
        let mut rig = Rig::new(0.15, true);

        rig.fade(0.0, 800);
        let down = rig.run_until(800);
        assert_eq!(down.len(), 20);
        assert_eq!(down.last(), Some(&(800, 0.0)));
        assert!(down.windows(2).all(|w| w[1].1 <= w[0].1));

        rig.run_until(3500);
        rig.fade(0.15, 1500);
        let up = rig.run_until(5000);
        assert_eq!(up.len(), 20);
        assert_eq!(up.last(), Some(&(5000, 0.15)));
        assert!(up.windows(2).all(|w| w[1].1 >= w[0].1));
    }

    #[test]
    fn test_fade_up_starts_paused_channel_at_current_volume() {
        let mut rig = Rig::new(0.0, false);
        rig.fade(0.15, 2000);
        assert!(rig.channel.is_playing());
        assert_eq!(rig.channel.volume(), 0.0);
        rig.run_until(2000);
        assert_eq!(rig.channel.volume(), 0.15);
    }

    #[test]
    fn test_fade_down_does_not_start_playback() {
        let mut rig = Rig::new(0.5, false);
        rig.fade(0.0, 400);
        assert!(rig.channel.is_paused());
        rig.run_until(400);
        assert_eq!(rig.channel.volume(), 0.0);
    }

    #[test]
    fn test_second_fade_replaces_first() {
        let mut rig = Rig::new(0.0, true);
        rig.fade(1.0, 2000);
        rig.run_until(1000);
        let mid = rig.channel.volume();
        assert!(mid > 0.0 && mid < 1.0);

        rig.fade(0.2, 500);
        assert_eq!(rig.timers.len(), 1);
        assert_eq!(rig.fader.job().map(|j| j.start_volume), Some(mid));

        rig.run_until(10_000);
        assert_eq!(rig.channel.volume(), 0.2);
        assert!(rig.events.iter().any(|e| matches!(e, SessionEvent::FadeCancelled { .. })));
    }

    #[test]
    fn test_external_pause_aborts_fade_up() {
        let mut rig = Rig::new(0.0, true);
        rig.fade(0.15, 1000);
        rig.run_until(300);
        rig.channel.pause();
        let frozen = rig.channel.volume();
        rig.run_until(2000);
        assert_eq!(rig.channel.volume(), frozen);
        assert!(!rig.fader.is_active());
        assert!(rig.timers.is_empty());
    }

    #[test]
    fn test_denied_playback_still_ramps() {
        let mut channel = AudioChannel::new(
            ChannelId::Music,
            "bg.mp3",
            0.0,
            true,
            Box::new(SilentBackend {
                deny_playback: true,
            }),
        );
        let mut timers = TimerQueue::new();
        let mut events = Vec::new();
        let mut fader = AudioFadeController::new(ChannelId::Music);

        let mut ctx = SimContext::new(0, &mut timers, &mut events);
        fader.fade(&mut channel, 0.15, 2000, &mut ctx);

        while let Some(due) = timers.pop_due(2000) {
            let mut ctx = SimContext::new(due.due_ms, &mut timers, &mut events);
            fader.on_timer(due.id, &mut channel, &mut ctx);
        }
        assert!(channel.is_paused());
        assert_eq!(channel.volume(), 0.15);
        assert!(matches!(events[0], SessionEvent::PlaybackDenied { .. }));
    }

    proptest! {
        #[test]
        fn prop_fade_lands_exactly_on_target(
            start in 0.0f32..=1.0,
            target in 0.0f32..=1.0,
            duration in 0u64..10_000,
        ) {
            let mut rig = Rig::new(start, true);
            rig.fade(target, duration);
            let trace = rig.run_until(duration);
            prop_assert_eq!(rig.channel.volume(), target);
            prop_assert!(!rig.fader.is_active());

            // Every step moves toward the target, never past it
            let mut volumes = vec![start];
            volumes.extend(trace.iter().map(|(_, v)| *v));
            for w in volumes.windows(2) {
                if target >= start {
                    prop_assert!(w[1] >= w[0] && w[1] <= target);
                } else {
                    prop_assert!(w[1] <= w[0] && w[1] >= target);
                }
            }
        }

        #[test]
        fn prop_refade_matches_second_target(
            first in 0.0f32..=1.0,
            second in 0.0f32..=1.0,
            interrupt_at in 0u64..1000,
        ) {
            let mut rig = Rig::new(0.5, true);
            rig.fade(first, 1000);
            rig.run_until(interrupt_at);
            rig.fade(second, 700);
            prop_assert!(rig.timers.len() <= 1);
            rig.run_until(interrupt_at + 700);
            prop_assert_eq!(rig.channel.volume(), second);
        }
    }
}
