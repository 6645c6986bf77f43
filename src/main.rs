//! Merge Drop entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, HtmlScriptElement, MouseEvent, TouchEvent};

    use merge_drop::consts::*;
    use merge_drop::renderer::{RenderState, Viewport};
    use merge_drop::sim::{BallColor, GameEvent, GamePhase, GameState, TickInput, restart, tick};
    use merge_drop::{HighScores, QualityPreset, Settings, Tuning};

    /// Game instance holding all state
    struct Game {
        state: GameState,
        render_state: Option<RenderState>,
        settings: Settings,
        highscores: HighScores,
        accumulator: f32,
        last_time: f64,
        input: TickInput,
        /// Canvas size in CSS pixels, for pointer mapping
        canvas_css: (f32, f32),
        /// Start time of the current run, keys its high score entry
        run_started_at: f64,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        fn new(seed: u64, tuning: Tuning) -> Self {
            Self {
                state: GameState::with_tuning(seed, tuning),
                render_state: None,
                settings: Settings::load(),
                highscores: HighScores::load(),
                accumulator: 0.0,
                last_time: 0.0,
                input: TickInput::default(),
                canvas_css: (WORLD_WIDTH, WORLD_HEIGHT),
                run_started_at: js_sys::Date::now(),
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            }
        }

        /// Queue a drop at a pointer position given in CSS pixels
        fn queue_drop(&mut self, x: f32, y: f32) {
            let viewport = Viewport::new(self.canvas_css.0, self.canvas_css.1);
            let point = viewport.screen_to_world(x, y);
            self.input.spawn_at = Some(point);
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32, time: f64) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = self.input.clone();
                tick(&mut self.state, &input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;

                // Clear one-shot inputs after processing
                self.input.spawn_at = None;
                self.input.pause = false;
            }

            for event in self.state.drain_events() {
                match event {
                    GameEvent::Merged { radius, .. } => log::debug!(
                        "Merged into a {} ball (radius {})",
                        BallColor::for_radius(radius).as_str(),
                        radius
                    ),
                    GameEvent::Cleared { radius, .. } => {
                        log::info!("Cleared two balls at radius {}", radius)
                    }
                    other => log::debug!("{:?}", other),
                }
            }

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;

            // Calculate FPS from oldest to newest frame
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        /// Render the current frame
        fn render(&mut self) {
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&self.state, &self.settings) {
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

            if let Some(el) = document.query_selector("#hud-score .hud-value").ok().flatten() {
                el.set_text_content(Some(&self.state.score.to_string()));
            }

            let best = self
                .highscores
                .top_score()
                .unwrap_or(0)
                .max(self.state.score);
            if let Some(el) = document.query_selector("#hud-best .hud-value").ok().flatten() {
                el.set_text_content(Some(&best.to_string()));
            }

            if let Some(el) = document.get_element_by_id("hud-fps") {
                if self.settings.show_fps {
                    let _ = el.set_attribute("class", "hud-item");
                    if let Some(val) = document.query_selector("#hud-fps .hud-value").ok().flatten() {
                        val.set_text_content(Some(&self.fps.to_string()));
                    }
                } else {
                    let _ = el.set_attribute("class", "hud-item hidden");
                }
            }

            // Show/hide pause menu
            if let Some(el) = document.get_element_by_id("pause-menu") {
                if self.state.phase == GamePhase::Paused {
                    let _ = el.set_attribute("class", "");
                } else {
                    let _ = el.set_attribute("class", "hidden");
                }
            }
        }

        /// Store the current run in the leaderboard
        fn record_high_score(&mut self) {
            let largest = self.state.largest_radius().unwrap_or(0.0);
            if let Some(rank) = self.highscores.record_run(
                self.state.score,
                largest,
                self.state.drops,
                self.run_started_at,
            ) {
                log::info!("High score #{}: {}", rank, self.state.score);
                self.highscores.save();
            }
        }

        /// Reset game state for restart
        fn restart(&mut self, seed: u64) {
            self.record_high_score();
            restart(&mut self.state, seed);
            self.run_started_at = js_sys::Date::now();
            self.accumulator = 0.0;
            self.input = TickInput::default();
        }
    }

    /// Read balance overrides from the `#tuning` JSON script tag
    fn load_tuning(document: &web_sys::Document) -> Tuning {
        let script = document
            .get_element_by_id("tuning")
            .and_then(|el| el.dyn_into::<HtmlScriptElement>().ok());

        let Some(script) = script else {
            return Tuning::default();
        };

        match script.text().ok().map(|json| Tuning::from_json(&json)) {
            Some(Ok(tuning)) => {
                log::info!("Loaded tuning from page");
                tuning
            }
            Some(Err(e)) => {
                log::warn!("Invalid tuning, using defaults: {}", e);
                Tuning::default()
            }
            None => Tuning::default(),
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Merge Drop starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        // Set canvas size
        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width();
        let client_h = canvas.client_height();
        let width = (client_w as f64 * dpr) as u32;
        let height = (client_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        // Initialize game
        let seed = js_sys::Date::now() as u64;
        let tuning = load_tuning(&document);
        let game = Rc::new(RefCell::new(Game::new(seed, tuning)));
        game.borrow_mut().canvas_css = (client_w as f32, client_h as f32);

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

        match RenderState::new(surface, &adapter, width, height).await {
            Ok(render_state) => game.borrow_mut().render_state = Some(render_state),
            Err(e) => log::error!("Failed to create device: {}", e),
        }

        setup_input_handlers(&canvas, game.clone());
        setup_restart_button(game.clone());
        setup_pause_menu(game.clone());
        setup_auto_pause(game.clone());

        if let Some(hud) = document.get_element_by_id("hud") {
            let _ = hud.set_attribute("class", "");
        }

        // Start game loop
        request_animation_frame(game);

        log::info!("Merge Drop running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Mouse click drops a ball
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.canvas_css = (
                    canvas_clone.client_width() as f32,
                    canvas_clone.client_height() as f32,
                );
                g.queue_drop(event.offset_x() as f32, event.offset_y() as f32);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch start drops a ball at the first touch
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let mut g = game.borrow_mut();
                    g.canvas_css = (
                        canvas_clone.client_width() as f32,
                        canvas_clone.client_height() as f32,
                    );
                    let rect = canvas_clone.get_bounding_client_rect();
                    let x = touch.client_x() as f32 - rect.left() as f32;
                    let y = touch.client_y() as f32 - rect.top() as f32;
                    g.queue_drop(x, y);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let Some(window) = web_sys::window() else {
                return;
            };
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "p" | "P" | "Escape" => g.input.pause = true,
                    "r" | "R" => {
                        let seed = js_sys::Date::now() as u64;
                        g.restart(seed);
                    }
                    "f" | "F" => {
                        g.settings.show_fps = !g.settings.show_fps;
                        g.settings.save();
                    }
                    "q" | "Q" => {
                        let next = match g.settings.quality {
                            QualityPreset::Low => QualityPreset::Medium,
                            QualityPreset::Medium => QualityPreset::High,
                            QualityPreset::High => QualityPreset::Low,
                        };
                        g.settings.apply_preset(next);
                        g.settings.save();
                        log::info!("Quality: {}", next.as_str());
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
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

            g.update(dt, time);
            g.render();
            g.update_hud();
        }

        request_animation_frame(game);
    }

    fn setup_restart_button(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let seed = js_sys::Date::now() as u64;
                game.borrow_mut().restart(seed);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_pause_menu(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        if let Some(btn) = document.get_element_by_id("resume-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                game.borrow_mut().input.pause = true; // Toggle back to playing
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        // Visibility change (tab switch, minimize)
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                let mut g = game.borrow_mut();
                if g.state.phase == GamePhase::Playing {
                    g.input.pause = true;
                    log::info!("Auto-paused (tab hidden)");
                }
                g.record_high_score();
            }
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless run options
#[cfg(not(target_arch = "wasm32"))]
struct RunConfig {
    seed: u64,
    seconds: f32,
    tuning_path: Option<String>,
}

#[cfg(not(target_arch = "wasm32"))]
impl RunConfig {
    fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut config = Self {
            seed: 1,
            seconds: 60.0,
            tuning_path: None,
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--seed" => {
                    if i + 1 < args.len() {
                        config.seed = args[i + 1].parse().unwrap_or(1);
                        i += 1;
                    }
                }
                "--seconds" => {
                    if i + 1 < args.len() {
                        config.seconds = args[i + 1].parse().unwrap_or(60.0);
                        i += 1;
                    }
                }
                "--tuning" => {
                    if i + 1 < args.len() {
                        config.tuning_path = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--help" | "-h" => {
                    println!("Usage: merge-drop [--seed N] [--seconds S] [--tuning FILE]");
                    std::process::exit(0);
                }
                other => eprintln!("Warning: ignoring unknown argument {}", other),
            }
            i += 1;
        }

        config
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use merge_drop::Tuning;
    use merge_drop::consts::*;
    use merge_drop::sim::{BallColor, GameEvent, GameState, TickInput, tick};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    env_logger::init();
    log::info!("Merge Drop (native) starting...");

    let config = RunConfig::from_args();
    let tuning = match &config.tuning_path {
        Some(path) => match Tuning::from_file(path) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => Tuning::default(),
    };

    let mut state = GameState::with_tuning(config.seed, tuning);
    // Separate stream so drop positions don't disturb preview rolls
    let mut dropper = Pcg32::seed_from_u64(config.seed ^ 0x5eed);
    let total_ticks = (config.seconds / SIM_DT).round() as u64;

    let mut merges = 0u32;
    let mut clears = 0u32;
    let mut lost = 0u32;

    for _ in 0..total_ticks {
        let mut input = TickInput::default();
        if state.spawn_cooldown_ticks == 0 {
            let r = state.preview.radius;
            let inner_min = WALL_THICKNESS / 2.0 + r;
            let inner_max = WORLD_WIDTH - WALL_THICKNESS / 2.0 - r;
            let x = if inner_max > inner_min {
                dropper.random_range(inner_min..=inner_max)
            } else {
                WORLD_WIDTH / 2.0
            };
            input.spawn_at = Some(glam::Vec2::new(x, PREVIEW_Y));
        }

        tick(&mut state, &input, SIM_DT);

        for event in state.drain_events() {
            match event {
                GameEvent::Merged { .. } => merges += 1,
                GameEvent::Cleared { .. } => clears += 1,
                GameEvent::BallLost { .. } => lost += 1,
                _ => {}
            }
            log::debug!("tick {}: {:?}", state.time_ticks, event);
        }
    }

    println!("seed:           {}", config.seed);
    println!("simulated:      {:.1}s ({} ticks)", config.seconds, total_ticks);
    println!("drops:          {}", state.drops);
    println!("merges:         {}", merges);
    println!("ceiling clears: {}", clears);
    println!("balls lost:     {}", lost);
    println!("balls in box:   {}", state.world.balls.len());
    println!(
        "largest radius: {}",
        state.largest_radius().map_or("-".to_string(), |r| r.to_string())
    );
    println!("score:          {}", state.score);
}
