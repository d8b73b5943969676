//! Prize Wheel entry point
//!
//! Handles platform-specific initialization and runs the presentation loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_wheel {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Element, HtmlElement};

    use prize_wheel::audio::HtmlAudioBackend;
    use prize_wheel::platform::WebBridge;
    use prize_wheel::sim::{
        AudioBackend, GamePhase, ItemAnimPhase, Orientation, SessionEvent, SilentBackend,
        TickInput, Session, tick,
    };
    use prize_wheel::{Settings, angle_from_transform};

    // Read the live rotation of the wheel from its computed transform
    #[wasm_bindgen(inline_js = "
        export function wheel_matrix() {
            const wheel = document.getElementById('wheel');
            if (!wheel) { return new Float64Array([]); }
            const m = new DOMMatrixReadOnly(window.getComputedStyle(wheel).transform);
            return new Float64Array([m.a, m.b]);
        }
    ")]
    extern "C" {
        fn wheel_matrix() -> Vec<f64>;
    }

    /// Presentation instance holding all state
    struct Wheel {
        session: Session,
        input: TickInput,
        last_time: f64,
    }

    impl Wheel {
        fn observed_angle() -> Option<f64> {
            match wheel_matrix().as_slice() {
                [a, b] => Some(angle_from_transform(glam::DVec2::new(*a, *b))),
                _ => None,
            }
        }

        fn update(&mut self, time: f64) {
            let dt_ms = if self.last_time > 0.0 {
                (time - self.last_time).max(0.0) as u64
            } else {
                0
            };
            self.last_time = time;

            if self.input.stop {
                self.input.observed_angle = Self::observed_angle();
            }
            tick(&mut self.session, &self.input, dt_ms);
            self.input.clear_one_shots();

            for event in self.session.drain_events() {
                apply_event(&event);
            }
        }
    }

    fn element(id: &str) -> Option<Element> {
        web_sys::window()?.document()?.get_element_by_id(id)
    }

    fn style(id: &str, property: &str, value: &str) {
        if let Some(el) = element(id).and_then(|e| e.dyn_into::<HtmlElement>().ok()) {
            let _ = el.style().set_property(property, value);
        }
    }

    /// Mirror a session event into the DOM
    fn apply_event(event: &SessionEvent) {
        match event {
            SessionEvent::SpinFrozen { angle } => {
                style("wheel", "animation", "none");
                style(
                    "wheel",
                    "transform",
                    &format!("translate(-50%, -50%) rotate({}deg)", angle),
                );
                // Force a reflow so the transition starts from the frozen angle
                if let Some(el) = element("wheel").and_then(|e| e.dyn_into::<HtmlElement>().ok()) {
                    let _ = el.offset_height();
                }
            }
            SessionEvent::SpinCommitted { to, duration_ms, .. } => {
                style(
                    "wheel",
                    "transition",
                    &format!(
                        "transform {}s cubic-bezier(0, 0, 0.2, 1)",
                        *duration_ms as f64 / 1000.0
                    ),
                );
                style(
                    "wheel",
                    "transform",
                    &format!("translate(-50%, -50%) rotate({}deg)", to),
                );
            }
            SessionEvent::PhaseChanged { phase } => {
                if let Some(el) = element("app") {
                    let _ = el.set_attribute("data-phase", &format!("{:?}", phase));
                }
                if *phase == GamePhase::EndScreen {
                    if let Some(el) = element("game") {
                        let _ = el.set_attribute("class", "hidden");
                    }
                    if let Some(el) = element("end-screen") {
                        let _ = el.set_attribute("class", "");
                    }
                }
            }
            SessionEvent::EndScreenEntered => {
                if let Some(el) = element("end-screen") {
                    let _ = el.set_attribute("class", "entered");
                }
            }
            SessionEvent::RevealChanged { state } => {
                if let Some(el) = element("end-screen") {
                    let _ = el.set_attribute("data-step", &state.step.to_string());
                    let _ = el.set_attribute("data-text", &state.text_sub_step.to_string());
                    let item = match state.item_anim_phase {
                        ItemAnimPhase::Hidden => "hidden",
                        ItemAnimPhase::CenterPop => "pop",
                        ItemAnimPhase::Restored => "restored",
                    };
                    let _ = el.set_attribute("data-item", item);
                }
            }
            SessionEvent::PlaybackDenied { channel, reason } => {
                log::warn!("{:?} playback denied: {}", channel, reason);
            }
            _ => {}
        }
    }

    fn current_orientation() -> Orientation {
        let Some(window) = web_sys::window() else {
            return Orientation::Portrait;
        };
        let w = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let h = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        if w > h {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }

    fn audio_backend(src: &str, looping: bool) -> Box<dyn AudioBackend> {
        match HtmlAudioBackend::new(src, looping) {
            Ok(backend) => Box::new(backend),
            Err(e) => {
                log::warn!("{} - audio disabled for {}", e, src);
                Box::new(SilentBackend::default())
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            return;
        }

        log::info!("Prize Wheel starting...");

        let mut settings = Settings::load();
        settings.orientation = current_orientation();
        let config = settings.session_config(js_sys::Date::now() as u64);

        let music = audio_backend(&config.music_source, true);
        let sfx = audio_backend(&config.stop_sfx_source, false);
        let session = Session::new(config, music, sfx, Box::new(WebBridge));

        let wheel = Rc::new(RefCell::new(Wheel {
            session,
            input: TickInput::default(),
            last_time: 0.0,
        }));

        setup_input_handlers(wheel.clone());
        request_animation_frame(wheel);

        log::info!("Prize Wheel running!");
    }

    fn listen<E: wasm_bindgen::convert::FromWasmAbi + 'static>(
        target: &web_sys::EventTarget,
        name: &str,
        handler: impl FnMut(E) + 'static,
    ) {
        let closure = Closure::<dyn FnMut(E)>::new(handler);
        let _ = target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_input_handlers(wheel: Rc<RefCell<Wheel>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Global interaction; the stop click bubbles up here as well
        for name in ["click", "touchstart"] {
            let wheel = wheel.clone();
            listen(&window, name, move |_event: web_sys::Event| {
                wheel.borrow_mut().input.interaction = true;
            });
        }

        if let Some(btn) = element("stop-btn") {
            let wheel = wheel.clone();
            listen(&btn, "click", move |_event: web_sys::MouseEvent| {
                wheel.borrow_mut().input.stop = true;
            });
        }

        if let Some(btn) = element("cta-btn") {
            let wheel = wheel.clone();
            listen(&btn, "click", move |_event: web_sys::MouseEvent| {
                wheel.borrow_mut().input.cta = true;
            });
        }

        {
            let wheel = wheel.clone();
            listen(&window, "resize", move |_event: web_sys::Event| {
                wheel.borrow_mut().input.orientation = Some(current_orientation());
            });
        }

        if let Some(document) = window.document() {
            let doc = document.clone();
            listen(&document, "visibilitychange", move |_event: web_sys::Event| {
                let hidden = doc.hidden();
                wheel.borrow_mut().input.end_screen_visible = Some(!hidden);
            });
        }
    }

    fn request_animation_frame(wheel: Rc<RefCell<Wheel>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            wheel.borrow_mut().update(time);
            request_animation_frame(wheel);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_wheel::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Prize Wheel (native) starting...");
    log::info!("Native mode runs a headless timeline - use `trunk serve` for the web version");

    run_headless();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Drive one scripted session and log every event
#[cfg(not(target_arch = "wasm32"))]
fn run_headless() {
    use prize_wheel::Settings;
    use prize_wheel::sim::{Session, TickInput, tick};

    const FRAME_MS: u64 = 16;
    const INTERACT_AT_MS: u64 = 500;
    const STOP_AT_MS: u64 = 2500;

    let settings = Settings::load();
    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();
    let config = settings.session_config(seed);
    let mut session = Session::headless(config);

    // Two full reveal cycles after the end screen appears
    let end_ms = STOP_AT_MS
        + settings.timing.stop_duration_ms
        + settings.timing.settle_delay_ms
        + settings.reveal.entrance_delay_ms
        + 2 * session.reveal().cycle_ms();

    let mut input = TickInput::default();
    while session.now_ms() < end_ms {
        let now = session.now_ms();
        input.interaction = (INTERACT_AT_MS..INTERACT_AT_MS + FRAME_MS).contains(&now);
        input.stop = (STOP_AT_MS..STOP_AT_MS + FRAME_MS).contains(&now);
        tick(&mut session, &input, FRAME_MS);
        input.clear_one_shots();

        for event in session.drain_events() {
            log::info!("{:>6}ms {:?}", session.now_ms(), event);
        }
    }

    let spin = session.spin_snapshot();
    log::info!(
        "Finished in {:?}: wheel at {:.1} deg, music {:.2}, reveal {:?}",
        session.phase(),
        spin.angle_degrees,
        session.music().volume(),
        session.reveal_state()
    );
    session.teardown();
}
