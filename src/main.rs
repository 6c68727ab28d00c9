//! Claw Machine entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, HtmlInputElement};

    use claw_machine::audio::AudioManager;
    use claw_machine::auth::{failure_notice, login_or_register, refresh};
    use claw_machine::consts::*;
    use claw_machine::persistence::LocalStore;
    use claw_machine::renderer::{CABINET_NODES, SdfRenderState};
    use claw_machine::scene::{SceneBindings, SceneRig};
    use claw_machine::sim::{
        GameEvent, KeyAction, MachineState, SeededSource, TickInput, map_key, tick,
    };
    use claw_machine::{
        CoinLedger, Leaderboard, Notification, Session, Settings, Tuning, account,
    };

    /// Game instance holding all state
    struct Game {
        tuning: Tuning,
        state: MachineState,
        rig: SceneRig,
        render_state: Option<SdfRenderState>,
        accumulator: f32,
        last_time: f64,
        input: TickInput,
        rng: SeededSource,
        store: Option<LocalStore>,
        session: Option<Session>,
        settings: Settings,
        audio: AudioManager,
        leaderboard: Leaderboard,
        // Window focus lost with mute_on_blur set
        blurred: bool,
    }

    impl Game {
        fn new(seed: u64, store: Option<LocalStore>) -> Self {
            let tuning = Tuning::default();
            let state = MachineState::new(&tuning);
            let rig = SceneRig::new(&state);
            Self {
                tuning,
                state,
                rig,
                render_state: None,
                accumulator: 0.0,
                last_time: 0.0,
                input: TickInput::default(),
                rng: SeededSource::new(seed),
                store,
                session: None,
                settings: Settings::load(),
                audio: AudioManager::new(),
                leaderboard: Leaderboard::default(),
                blurred: false,
            }
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let Game {
                state,
                input,
                rng,
                store,
                session,
                accumulator,
                ..
            } = self;
            let (Some(session), Some(store)) = (session.as_mut(), store.as_mut()) else {
                // Not logged in yet
                *accumulator = 0.0;
                return;
            };

            let mut events = Vec::new();
            let mut substeps = 0;
            while *accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let mut ledger = CoinLedger::new(&mut *session, &mut *store);
                events.extend(tick(state, input, SIM_DT, &mut ledger, &mut *rng));
                *accumulator -= SIM_DT;
                substeps += 1;

                // Clear one-shot inputs after processing
                input.trigger = false;
            }

            self.rig.update(&self.state);
            self.handle_events(&events);
        }

        fn handle_events(&mut self, events: &[GameEvent]) {
            if events.is_empty() {
                return;
            }
            self.audio.play_events(events);

            for event in events {
                match event {
                    GameEvent::PhaseChanged { from, to } => {
                        log::debug!("Phase {:?} -> {:?}", from, to);
                    }
                    GameEvent::OutcomeDrawn(outcome) => {
                        log::info!("Outcome drawn: {}", outcome.label());
                    }
                    GameEvent::Notify(notice) => {
                        if matches!(notice, Notification::RoundResult { .. }) {
                            self.reload_leaderboard();
                        }
                        show_notice(notice);
                    }
                }
            }
        }

        fn reload_leaderboard(&mut self) {
            let Some(store) = self.store.as_ref() else {
                return;
            };
            match Leaderboard::load(store) {
                Ok(board) => self.leaderboard = board,
                Err(e) => log::warn!("Leaderboard unavailable: {}", e),
            }
        }

        /// Render the current frame
        fn render(&mut self, time: f64) {
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&self.state, &self.rig, time) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            if let Some(session) = &self.session {
                if let Some(el) = document.query_selector("#hud-coins .hud-value").ok().flatten() {
                    el.set_text_content(Some(&session.coins().to_string()));
                }
                if let Some(el) = document.query_selector("#hud-user .hud-value").ok().flatten() {
                    el.set_text_content(Some(session.username()));
                }
                if let Some(el) = document.get_element_by_id("mute-btn") {
                    el.set_text_content(Some(if session.muted { "Unmute" } else { "Mute" }));
                }
            }

            if let Some(list) = document.get_element_by_id("leaderboard-list") {
                let rows: String = self
                    .leaderboard
                    .entries
                    .iter()
                    .enumerate()
                    .map(|(i, e)| format!("{}. {} - {}\n", i + 1, e.username, e.coins))
                    .collect();
                if list.text_content().unwrap_or_default() != rows {
                    list.set_text_content(Some(&rows));
                }
            }
        }

        /// Effects and music volumes for the current mute state
        fn apply_volume(&mut self) {
            let muted = self.blurred || self.session.as_ref().is_none_or(|s| s.muted);
            self.audio.set_sfx_volume(self.settings.effective_sfx(muted));
            if let Some(handle) = self.session.as_ref().and_then(|s| s.music) {
                self.audio
                    .set_music_volume(handle, self.settings.effective_music(muted));
            }
        }

        fn login(&mut self, username: &str, password: &str) {
            let Some(store) = self.store.as_mut() else {
                show_notice(&Notification::StoreFailure);
                return;
            };

            let starting = self.tuning.starting_coins;
            match login_or_register(store, username, password, starting, account::now()) {
                Ok((mut session, notice)) => {
                    session.muted = self.settings.muted;
                    self.audio.resume();
                    let music_vol = self.settings.effective_music(session.muted);
                    session.music = self.audio.start_music(music_vol);
                    self.session = Some(session);
                    self.state.reset();
                    self.rig = SceneRig::new(&self.state);
                    self.input = TickInput::default();
                    self.apply_volume();
                    self.reload_leaderboard();

                    set_hidden("login", true);
                    set_hidden("hud", false);
                    show_notice(&notice);
                }
                Err(e) => {
                    log::warn!("Login failed: {}", e);
                    show_notice(&failure_notice(&e));
                }
            }
        }

        fn toggle_mute(&mut self) {
            let Some(session) = self.session.as_mut() else {
                return;
            };
            let muted = session.toggle_mute();
            self.settings.muted = muted;
            self.settings.save();
            self.apply_volume();
            log::info!("Muted: {}", muted);
        }

        fn logout(&mut self) {
            if let Some(handle) = self.session.take().and_then(Session::logout) {
                self.audio.stop_music(handle);
            }
        }

        /// Re-read the balance after the tab comes back
        fn resync(&mut self) {
            if !self.state.is_idle() {
                return;
            }
            if let (Some(store), Some(session)) = (self.store.as_ref(), self.session.as_mut()) {
                if let Err(e) = refresh(store, session) {
                    log::warn!("Refresh failed: {}", e);
                }
            }
        }
    }

    /// Show or hide an element by id
    fn set_hidden(id: &str, hidden: bool) {
        if let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
        {
            let _ = el.set_attribute("class", if hidden { "hidden" } else { "" });
        }
    }

    /// Put a notification in the result dialog
    fn show_notice(notice: &Notification) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        if let Some(el) = document.get_element_by_id("notice-title") {
            el.set_text_content(Some(notice.title()));
        }
        if let Some(el) = document.get_element_by_id("notice-message") {
            el.set_text_content(Some(&notice.message()));
        }
        set_hidden("notice", false);
    }

    fn input_value(id: &str) -> String {
        web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            .map(|input| input.value())
            .unwrap_or_default()
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Claw Machine starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Hide loading indicator
        set_hidden("loading", true);

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        // Set canvas size
        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let store = match LocalStore::open() {
            Ok(store) => Some(store),
            Err(e) => {
                log::error!("Account store unavailable: {}", e);
                None
            }
        };

        let bindings = SceneBindings::bind(CABINET_NODES.iter().copied().enumerate());
        if !bindings.is_complete() {
            log::warn!("Cabinet model is missing scene roles");
        }

        // Initialize game
        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, store)));
        game.borrow_mut().reload_leaderboard();
        for (node, pose) in game.borrow().rig.bound_poses(&bindings) {
            log::debug!("Node {} starts at {:?}", CABINET_NODES[node], pose.translation);
        }

        log::info!("Game initialized with seed: {}", seed);

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to get adapter");

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        match SdfRenderState::new(surface, &adapter, width, height).await {
            Ok(mut render_state) => {
                render_state.set_start_time(js_sys::Date::now());
                game.borrow_mut().render_state = Some(render_state);
            }
            Err(e) => log::error!("Failed to create device: {}", e),
        }

        setup_keyboard(&window, game.clone());
        setup_controls(game.clone());
        setup_focus(&window, game.clone());

        set_hidden("login", false);

        // Start game loop
        request_animation_frame(game);

        log::info!("Claw Machine running!");
    }

    /// Attach a listener for the lifetime of the page
    fn listen<E>(target: &web_sys::EventTarget, kind: &str, handler: impl FnMut(E) + 'static)
    where
        E: wasm_bindgen::convert::FromWasmAbi + 'static,
    {
        let closure = Closure::<dyn FnMut(E)>::new(handler);
        if target
            .add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())
            .is_err()
        {
            log::warn!("Could not listen for {}", kind);
        }
        closure.forget();
    }

    /// Click handler on the element with `id`, if it exists
    fn on_click(id: &str, mut handler: impl FnMut() + 'static) {
        let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
        else {
            log::warn!("Missing #{}", id);
            return;
        };
        listen(&el, "click", move |event: web_sys::MouseEvent| {
            event.prevent_default();
            handler();
        });
    }

    fn setup_keyboard(window: &web_sys::Window, game: Rc<RefCell<Game>>) {
        let held = game.clone();
        listen(window, "keydown", move |event: web_sys::KeyboardEvent| {
            let mut g = held.borrow_mut();
            if g.session.is_none() {
                return;
            }
            let action = map_key(&event.key()).or_else(|| map_key(&event.code()));
            let Some(action) = action else {
                return;
            };
            // Keep arrows and space from scrolling the page
            event.prevent_default();
            match action {
                KeyAction::Move(dir) => g.input.keys.press(dir),
                KeyAction::Trigger if !event.repeat() => g.input.trigger = true,
                KeyAction::Trigger => {}
            }
        });

        listen(window, "keyup", move |event: web_sys::KeyboardEvent| {
            if let Some(KeyAction::Move(dir)) = map_key(&event.key()) {
                game.borrow_mut().input.keys.release(dir);
            }
        });
    }

    fn setup_controls(game: Rc<RefCell<Game>>) {
        {
            let game = game.clone();
            on_click("login-btn", move || {
                let (username, password) = (input_value("username"), input_value("password"));
                game.borrow_mut().login(&username, &password);
            });
        }

        on_click("notice-close", || set_hidden("notice", true));

        {
            let game = game.clone();
            on_click("mute-btn", move || game.borrow_mut().toggle_mute());
        }

        // Logout reloads the page to reset all state
        on_click("logout-btn", move || {
            game.borrow_mut().logout();
            if let Some(window) = web_sys::window() {
                let _ = window.location().reload();
            }
        });
    }

    fn setup_focus(window: &web_sys::Window, game: Rc<RefCell<Game>>) {
        // Keys released while unfocused never send keyup
        let on_blur = game.clone();
        listen(window, "blur", move |_: web_sys::FocusEvent| {
            let mut g = on_blur.borrow_mut();
            g.input.keys.clear();
            if g.settings.mute_on_blur {
                g.blurred = true;
                g.apply_volume();
            }
        });

        listen(window, "focus", move |_: web_sys::FocusEvent| {
            let mut g = game.borrow_mut();
            g.blurred = false;
            g.apply_volume();
            g.resync();
        });
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt);
            g.render(time);
            g.update_hud();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Claw Machine (native) starting...");
    log::info!("Native mode runs a headless demo - use `trunk serve` for the web version");

    let tuning = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| claw_machine::Tuning::from_json(&json))
        {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path);
                tuning
            }
            Err(e) => {
                log::error!("Bad tuning file {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => claw_machine::Tuning::default(),
    };

    if let Err(e) = demo::run(&tuning) {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use claw_machine::account::{self, Account};
    use claw_machine::auth::login_or_register;
    use claw_machine::persistence::{AccountStore, MemoryStore};
    use claw_machine::sim::{GameEvent, MachineState, SeededSource, TickInput, tick};
    use claw_machine::{AuthError, CoinLedger, Leaderboard, Notification, Tuning};

    /// Rounds to play before stopping even if coins remain
    const MAX_ROUNDS: u32 = 25;

    pub fn run(tuning: &Tuning) -> Result<(), AuthError> {
        let mut store = MemoryStore::new();

        // A couple of rivals so the leaderboard has something to rank
        for (name, coins) in [("maru", 14), ("pippa", 7)] {
            store.put(&Account::new(name, "hunter2", coins, account::now()))?;
        }

        let (mut session, notice) =
            login_or_register(&mut store, "demo", "demo", tuning.starting_coins, account::now())?;
        log::info!("{}: {}", notice.title(), notice.message());

        let seed = std::env::var("CLAW_SEED")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0x5eed);
        let mut rng = SeededSource::new(seed);
        let mut state = MachineState::new(tuning);

        let trigger = TickInput {
            trigger: true,
            ..Default::default()
        };
        let idle = TickInput::default();
        let dt = claw_machine::consts::SIM_DT;

        while state.rounds_played < MAX_ROUNDS {
            let mut ledger = CoinLedger::new(&mut session, &mut store);
            let mut events = tick(&mut state, &trigger, dt, &mut ledger, &mut rng);
            if state.is_idle() {
                // Out of coins
                log_events(&events);
                break;
            }
            while !state.is_idle() {
                events.extend(tick(&mut state, &idle, dt, &mut ledger, &mut rng));
            }
            log_events(&events);
        }

        log::info!(
            "{} rounds played, {} ends with {} coins",
            state.rounds_played,
            session.username(),
            session.coins()
        );

        let board = Leaderboard::load(&store)?;
        for (i, entry) in board.entries.iter().enumerate() {
            log::info!("#{} {} ({} coins)", i + 1, entry.username, entry.coins);
        }
        Ok(())
    }

    fn log_events(events: &[GameEvent]) {
        for event in events {
            if let GameEvent::Notify(notice) = event {
                match notice {
                    Notification::RoundResult { .. } => {
                        log::info!("{}: {}", notice.title(), notice.message())
                    }
                    _ => log::warn!("{}: {}", notice.title(), notice.message()),
                }
            }
        }
    }
}
