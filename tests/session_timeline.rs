//! End-to-end timeline of one presentation through the public API

use prize_wheel::Settings;
use prize_wheel::consts::*;
use prize_wheel::sim::{
    GamePhase, ItemAnimPhase, SequenceState, Session, SessionConfig, SessionEvent, SpinPhase,
    TickInput, tick,
};

fn session(seed: u64) -> Session {
    Session::headless(SessionConfig {
        seed,
        ..SessionConfig::default()
    })
}

#[test]
fn full_presentation_timeline() {
    let mut s = session(2024);

    // First touch unlocks the music
    s.handle_interaction();
    s.advance_to(2000);
    assert_eq!(s.music().volume(), NORMAL_VOLUME);

    // Stop at 2000ms with the wheel read at 47 degrees
    s.request_stop(Some(47.0));
    let target = s.spin().state().target_angle_degrees;
    assert!((1127.0..1487.0).contains(&target), "target {target}");

    s.advance_to(2000 + 800);
    assert_eq!(s.music().volume(), 0.0);
    assert!(s.sfx().is_playing());

    s.advance_to(2000 + 3500);
    assert_eq!(s.spin().phase(), SpinPhase::Stopped);
    assert_eq!(s.phase(), GamePhase::Stopping);

    s.advance_to(2000 + 3500 + 1500);
    assert_eq!(s.music().volume(), NORMAL_VOLUME);
    assert_eq!(s.phase(), GamePhase::EndScreen);

    // Reveal: entrance, text swap, first item pop
    let entered = 2000 + 3500 + 1500 + ENTRANCE_DELAY_MS;
    s.advance_to(entered);
    assert!(s.reveal().has_entered());
    assert_eq!(s.reveal_state(), SequenceState::INITIAL);

    s.advance_to(entered + TEXT_SWAP_MS);
    assert_eq!(s.reveal_state().step, 0);
    assert_eq!(s.reveal_state().text_sub_step, 1);

    s.advance_to(entered + TEXT_PHASE_MS);
    assert_eq!(s.reveal_state().step, 1);
    assert_eq!(s.reveal_state().item_anim_phase, ItemAnimPhase::CenterPop);

    // One whole cycle brings it back to the start
    let cycle = s.reveal().cycle_ms();
    assert_eq!(cycle, 11_200);
    s.advance_to(entered + cycle);
    assert_eq!(s.reveal_state(), SequenceState::INITIAL);

    let stopped = s.events().iter().find_map(|e| match e {
        SessionEvent::SpinStopped { angle } => Some(*angle),
        _ => None,
    });
    assert_eq!(stopped, Some(target));

    s.teardown();
    assert_eq!(s.pending_timers(), 0);
}

#[test]
fn same_seed_same_resting_angle() {
    let rest = |seed| {
        let mut s = session(seed);
        s.request_stop(Some(120.0));
        s.spin().state().target_angle_degrees
    };
    assert_eq!(rest(7), rest(7));
}

#[test]
fn tick_loop_from_settings() {
    let settings = Settings::from_json(r#"{ "seed": 3, "orientation": "Landscape" }"#).unwrap();
    let mut s = Session::headless(settings.session_config(0));

    let stop = TickInput {
        interaction: true,
        stop: true,
        ..Default::default()
    };
    tick(&mut s, &stop, 16);
    let idle = TickInput::default();
    while s.now_ms() < 20_000 {
        tick(&mut s, &idle, 16);
    }

    // Landscape alternates text only
    assert_eq!(s.phase(), GamePhase::EndScreen);
    assert_eq!(s.reveal().active_items(), 0);
    assert!(s.events().iter().all(|e| match e {
        SessionEvent::RevealChanged { state } => state.step == 0,
        _ => true,
    }));
}

#[test]
fn events_serialize_for_the_host() {
    let mut s = session(1);
    s.request_stop(Some(0.0));
    let json = serde_json::to_string(s.events()).unwrap();
    assert!(json.contains("SpinFrozen"));
    assert!(json.contains("Stopping"));
}
