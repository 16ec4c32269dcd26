//! Sharpshot entry point
//!
//! On the web this drives the DOM page. Natively it plays seeded demo
//! sessions with the auto-aim bot and prints the resulting leaderboard.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlElement, KeyboardEvent, MouseEvent, TouchEvent};

    use sharpshot::backend::{MemoryBackend, Reporter};
    use sharpshot::consts::*;
    use sharpshot::platform::DomSurface;
    use sharpshot::sim::{GameEvent, SessionPhase, Target, Viewport};
    use sharpshot::tuning::{Difficulty, GameMode};
    use sharpshot::{Game, PlayerKind, Settings};

    /// Frames a hit/miss flash stays on the crosshair
    const FLASH_FRAMES: u32 = 12;

    /// Browser shell around the game host
    struct App {
        game: Game,
        settings: Settings,
        surface: DomSurface,
        document: Document,
        last_time: f64,
        /// Element ids of the targets currently in the arena
        rendered: Vec<String>,
        /// Crosshair flash class and frames remaining
        flash: Option<(&'static str, u32)>,
    }

    impl App {
        fn new(document: Document, mut settings: Settings) -> Self {
            let seed = js_sys::Date::now() as u64;
            let reporter = build_reporter(&mut settings);
            log::info!("Game initialized with seed: {}", seed);
            Self {
                game: Game::new(seed, reporter),
                settings,
                surface: DomSurface::new(document.clone()),
                document,
                last_time: 0.0,
                rendered: Vec::new(),
                flash: None,
            }
        }

        /// Answer the welcome screen and rebuild the reporter for the choice
        fn choose_player(&mut self, player: PlayerKind) {
            let name = match player {
                PlayerKind::Guest => None,
                PlayerKind::Member => Some("Player".to_string()),
            };
            self.settings.choose_player(player, name);
            self.settings.save();

            let seed = js_sys::Date::now() as u64;
            self.game = Game::new(seed, build_reporter(&mut self.settings));
            log::info!("Playing as {}", player.as_str());
        }

        fn start(&mut self) {
            self.game.resize(viewport());
            self.game.start(
                self.settings.difficulty,
                self.settings.game_mode,
                js_sys::Date::now(),
            );
        }

        fn cycle_difficulty(&mut self) {
            let index = Difficulty::ALL
                .iter()
                .position(|d| *d == self.settings.difficulty)
                .unwrap_or(0);
            self.settings.difficulty = Difficulty::ALL[(index + 1) % Difficulty::ALL.len()];
            self.settings.save();
        }

        fn toggle_mode(&mut self) {
            self.settings.game_mode = match self.settings.game_mode {
                GameMode::TwoD => GameMode::ThreeD,
                GameMode::ThreeD => GameMode::TwoD,
            };
            self.settings.save();
        }

        /// Run simulation ticks and react to what happened
        fn update(&mut self, dt: f32) {
            let events = self.game.update(dt, &self.surface);
            for event in &events {
                match event {
                    GameEvent::Hit { .. } if self.settings.shot_feedback => {
                        self.flash = Some(("hit", FLASH_FRAMES));
                    }
                    GameEvent::Miss { .. } if self.settings.shot_feedback => {
                        self.flash = Some(("miss", FLASH_FRAMES));
                    }
                    GameEvent::Ended { report } => {
                        log::info!("Final score {} ({}% accuracy)", report.score, report.accuracy);
                    }
                    _ => {}
                }
            }
            self.flash = self
                .flash
                .and_then(|(class, frames)| (frames > 1).then(|| (class, frames - 1)));
        }

        fn render(&mut self) {
            self.sync_targets();
            self.update_crosshair();
            self.update_hud();
        }

        /// Mirror the live target set into `#target-{id}` elements
        fn sync_targets(&mut self) {
            let Some(arena) = self.document.get_element_by_id("arena") else {
                return;
            };
            let targets = self.game.state.targets();
            let live: Vec<String> = targets.iter().map(DomSurface::element_id).collect();

            for id in self.rendered.iter().filter(|id| !live.contains(id)) {
                if let Some(el) = self.document.get_element_by_id(id) {
                    el.remove();
                }
            }

            for (target, id) in targets.iter().zip(&live) {
                let el = match self.document.get_element_by_id(id) {
                    Some(el) => el,
                    None => {
                        let Ok(el) = self.document.create_element("div") else {
                            continue;
                        };
                        el.set_id(id);
                        let class = if target.z.is_some() {
                            "target target-3d"
                        } else {
                            "target"
                        };
                        el.set_class_name(class);
                        let _ = arena.append_child(&el);
                        el
                    }
                };
                if let Ok(el) = el.dyn_into::<HtmlElement>() {
                    style_target(&el, target);
                }
            }
            self.rendered = live;
        }

        fn update_crosshair(&self) {
            let Some(el) = self.document.get_element_by_id("crosshair") else {
                return;
            };
            let aim = &self.game.state.aim;
            let mut class = String::from("crosshair");
            if self.settings.crosshair_feedback {
                class.push(' ');
                class.push_str(aim.proximity.as_str());
            }
            if let Some((flash, _)) = self.flash {
                class.push(' ');
                class.push_str(flash);
            }
            el.set_class_name(&class);
            if let Ok(el) = el.dyn_into::<HtmlElement>() {
                let style = el.style();
                let _ = style.set_property("left", &format!("{}px", aim.pointer.x));
                let _ = style.set_property("top", &format!("{}px", aim.pointer.y));
            }
        }

        /// Update HUD and overlay text
        fn update_hud(&self) {
            let session = &self.game.state.session;

            if let Some(el) = self.document.get_element_by_id("hud") {
                el.set_text_content(Some(&format!(
                    "Score {}   Time {}   Accuracy {}%   {} {}",
                    session.score,
                    session.time_left,
                    session.accuracy,
                    session.difficulty,
                    session.game_mode
                )));
            }

            if let Some(el) = self.document.get_element_by_id("overlay") {
                let text = match session.phase {
                    SessionPhase::Idle if !self.settings.visited => {
                        "G: play as guest   M: sign in to save scores".to_string()
                    }
                    SessionPhase::Idle => format!(
                        "Enter: start   D: difficulty ({})   M: mode ({})",
                        self.settings.difficulty, self.settings.game_mode
                    ),
                    SessionPhase::Active => String::new(),
                    SessionPhase::Paused => "Paused   Esc: resume   Q: quit".to_string(),
                    SessionPhase::Ended => format!(
                        "Final score {}   Hits {}   Misses {}   Accuracy {}%   Enter: menu",
                        session.score, session.hits, session.misses, session.accuracy
                    ),
                };
                let class = if text.is_empty() { "hidden" } else { "" };
                el.set_class_name(class);
                el.set_text_content(Some(&text));
            }
        }

        fn on_key(&mut self, key: &str) {
            if key == "i" || key == "I" {
                self.game.input.idle_mode = !self.game.input.idle_mode;
                log::info!("Idle mode: {}", self.game.input.idle_mode);
                return;
            }
            match (self.game.state.phase(), key) {
                (SessionPhase::Idle, "g" | "G") if !self.settings.visited => {
                    self.choose_player(PlayerKind::Guest)
                }
                (SessionPhase::Idle, "m" | "M") if !self.settings.visited => {
                    self.choose_player(PlayerKind::Member)
                }
                (SessionPhase::Idle, "Enter" | " ") if self.settings.visited => self.start(),
                (SessionPhase::Idle, "d" | "D") => self.cycle_difficulty(),
                (SessionPhase::Idle, "m" | "M") => self.toggle_mode(),
                (SessionPhase::Active | SessionPhase::Paused, "Escape" | "p" | "P") => {
                    self.game.toggle_pause()
                }
                (SessionPhase::Active | SessionPhase::Paused, "q" | "Q") => self.game.quit(),
                (SessionPhase::Ended, "Enter" | " ") => self.game.return_to_idle(),
                _ => {}
            }
        }
    }

    /// Reporter for the current player, registering members on first use
    fn build_reporter(settings: &mut Settings) -> Reporter {
        let mut backend = MemoryBackend::load();
        if settings.is_member() && settings.credential.is_none() {
            let credential = backend.register_player(settings.display_name());
            backend.save();
            settings.credential = Some(credential);
            settings.save();
        }
        Reporter::new(Box::new(backend), settings.reporting_credential())
    }

    fn style_target(el: &HtmlElement, target: &Target) {
        let style = el.style();
        let visible = target.visible_size();
        let _ = style.set_property("left", &format!("{}px", target.pos.x));
        let _ = style.set_property("top", &format!("{}px", target.pos.y));
        let _ = style.set_property("width", &format!("{}px", visible));
        let _ = style.set_property("height", &format!("{}px", visible));
        if let Some(z) = target.z {
            let _ = style.set_property("opacity", &target.opacity().to_string());
            let _ = style.set_property(
                "transform",
                &format!("perspective({}px) translateZ({}px)", PERSPECTIVE, -z),
            );
        }
    }

    /// Current visible viewport in CSS pixels
    fn viewport() -> Viewport {
        let Some(window) = web_sys::window() else {
            return Viewport::default();
        };
        let width = window.inner_width().ok().and_then(|v| v.as_f64());
        let height = window.inner_height().ok().and_then(|v| v.as_f64());
        let client = window.document().and_then(|d| d.document_element());
        match (width, height) {
            (Some(w), Some(h)) => {
                let (cw, ch) = client.map_or((w, h), |el| {
                    (f64::from(el.client_width()), f64::from(el.client_height()))
                });
                Viewport::new(w.min(cw) as f32, h.min(ch) as f32)
            }
            _ => Viewport::default(),
        }
    }

    /// Get or create a fixed page element
    fn ensure_element(document: &Document, id: &str, class: &str) -> Option<Element> {
        if let Some(el) = document.get_element_by_id(id) {
            return Some(el);
        }
        let el = document.create_element("div").ok()?;
        el.set_id(id);
        el.set_class_name(class);
        document.body()?.append_child(&el).ok()?;
        Some(el)
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Sharpshot starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let arena = ensure_element(&document, "arena", "arena").expect("no arena");
        ensure_element(&document, "crosshair", "crosshair");
        ensure_element(&document, "hud", "hud");
        ensure_element(&document, "overlay", "");

        let app = Rc::new(RefCell::new(App::new(document.clone(), Settings::load())));
        app.borrow_mut().game.resize(viewport());

        setup_input_handlers(&arena, app.clone());
        setup_auto_pause(app.clone());

        // Start game loop
        request_animation_frame(app);

        log::info!("Sharpshot running!");
    }

    fn setup_input_handlers(arena: &Element, app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Mouse move - crosshair follows the pointer everywhere
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let point = Vec2::new(event.client_x() as f32, event.client_y() as f32);
                app.borrow_mut().game.move_pointer(point);
            });
            let _ = window
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse down - shoot
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let point = Vec2::new(event.client_x() as f32, event.client_y() as f32);
                let mut a = app.borrow_mut();
                a.game.move_pointer(point);
                a.game.fire(point);
            });
            let _ = arena
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch start - aim and shoot
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let point = Vec2::new(touch.client_x() as f32, touch.client_y() as f32);
                    let mut a = app.borrow_mut();
                    a.game.move_pointer(point);
                    a.game.fire(point);
                }
            });
            let _ = arena
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Resize
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                app.borrow_mut().game.resize(viewport());
            });
            let _ = window
                .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                app.borrow_mut().on_key(event.key().as_str());
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut a = app.borrow_mut();

            // Calculate delta time
            let dt = if a.last_time > 0.0 {
                ((time - a.last_time) / 1000.0) as f32
            } else {
                FRAME_DT
            };
            a.last_time = time;

            a.update(dt);
            a.render();
        }

        request_animation_frame(app);
    }

    fn setup_auto_pause(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Visibility change (tab switch, minimize)
        {
            let app = app.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut a = app.borrow_mut();
                    if a.game.state.session.is_active() {
                        a.game.toggle_pause();
                        log::info!("Auto-paused (tab hidden)");
                    }
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut a = app.borrow_mut();
                if a.game.state.session.is_active() {
                    a.game.toggle_pause();
                    log::info!("Auto-paused (window blur)");
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod native_demo {
    use chrono::Utc;

    use sharpshot::backend::{BackendResult, LeaderboardQuery, MemoryBackend, Reporter, Timeframe};
    use sharpshot::consts::FRAME_DT;
    use sharpshot::platform::ProjectedSurface;
    use sharpshot::sim::GameEvent;
    use sharpshot::{Difficulty, Game, GameMode};

    const DEMO_SEED: u64 = 12345;
    const DEMO_SESSIONS: u32 = 3;

    /// `sharpshot [difficulty] [mode] [seed] [timeframe]`
    pub fn run(args: &[String]) -> BackendResult<()> {
        let difficulty = args
            .first()
            .map_or(Difficulty::Medium, |s| Difficulty::from_str_lossy(s));
        let game_mode = args
            .get(1)
            .map_or(GameMode::TwoD, |s| GameMode::from_str_lossy(s));
        let seed = args
            .get(2)
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEMO_SEED);
        let timeframe = args
            .get(3)
            .map_or(Timeframe::All, |s| Timeframe::from_str_lossy(s));

        let mut backend = MemoryBackend::new();
        let credential = backend.register_player("demo-bot");
        let reporter = Reporter::new(Box::new(backend), Some(credential.clone()));
        let mut game = Game::new(seed, reporter);
        game.input.idle_mode = true;

        log::info!(
            "Playing {} session(s): {} {} seed {}",
            DEMO_SESSIONS,
            difficulty,
            game_mode,
            seed
        );

        let started_ms = Utc::now().timestamp_millis() as f64;
        for round in 0..DEMO_SESSIONS {
            let round_start = started_ms + f64::from(round) * 120_000.0;
            game.start(difficulty, game_mode, round_start);
            loop {
                let events = game.update(FRAME_DT, &ProjectedSurface);
                if events.iter().any(|e| matches!(e, GameEvent::Ended { .. })) {
                    break;
                }
            }
            let session = &game.state.session;
            log::info!(
                "Round {}: score {} hits {} misses {} accuracy {}%",
                round + 1,
                session.score,
                session.hits,
                session.misses,
                session.accuracy
            );
            game.return_to_idle();
        }

        let backend = game.reporter().backend();
        let query = LeaderboardQuery {
            timeframe,
            ..Default::default()
        };
        let leaderboard = backend.leaderboard(&query)?;
        let achievements = backend.user_achievements(&credential)?;
        let summary = serde_json::json!({
            "leaderboard": leaderboard,
            "achievements": achievements.stats,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Sharpshot (native) starting...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(err) = native_demo::run(&args) {
        log::error!("Demo failed: {}", err);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
