//! The windowed frame loop.
//!
//! The runtime owns the winit event loop. On start it opens a window (the
//! `canvas` element on the web), builds the GPU [`Context`], the [`World`]
//! and its [`Renderer`], then starts every label load. Loads resolve on the
//! async runtime and come back to the event loop as
//! [`RuntimeEvent::LabelLoaded`], in completion order. Each redraw ticks the
//! world and draws whatever the tick says should be drawn:
//!
//! - `Waiting`: nothing; the redraw is requested again once the world is ready
//! - `Frame`: render, composite and schedule the next frame
//! - `Stopped`: leave the event loop
//! - `Failed`: stop scheduling frames
//!
//! Escape and closing the window set the world's stop flag.

use std::{fmt::Debug, sync::Arc};

use futures::{StreamExt, future::LocalBoxFuture, stream::FuturesUnordered};
use instant::{Duration, Instant};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    keyboard::{Key, NamedKey},
    window::Window,
};

use crate::{
    config::WorldConfig,
    context::Context,
    error::ResourceLoadError,
    render::Renderer,
    resources::font::{FontCache, TextLayout},
    world::{TickOutcome, World},
};

type LabelLoad = LocalBoxFuture<'static, (usize, Result<TextLayout, ResourceLoadError>)>;

/// Everything that exists once the window is up.
pub struct AppState {
    ctx: Context,
    world: World,
    renderer: Renderer,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, config: WorldConfig) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await?;
        let (width, height) = ctx.size();
        let mut world = World::new(config, width, height)?;
        let renderer = Renderer::new(&ctx, &mut world)?;
        Ok(Self {
            ctx,
            world,
            renderer,
            is_surface_configured: width > 0 && height > 0,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if !self.ctx.resize(width, height) {
            return;
        }
        self.world.resize(width, height);
        self.renderer.resize(&self.ctx, &self.world);
        self.is_surface_configured = true;
    }

    fn window_size(&self) -> Option<(u32, u32)> {
        self.ctx.window.as_ref().map(|w| {
            let size = w.inner_size();
            (size.width, size.height)
        })
    }
}

impl Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("world", &self.world)
            .field("is_surface_configured", &self.is_surface_configured)
            .finish()
    }
}

pub enum RuntimeEvent {
    /// The GPU context finished initializing (web only).
    #[allow(dead_code)]
    Initialized(anyhow::Result<AppState>),
    LabelLoaded {
        index: usize,
        result: Result<TextLayout, ResourceLoadError>,
    },
    #[allow(dead_code)]
    Exit,
}

impl Debug for RuntimeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(state) => f
                .debug_tuple("Initialized")
                .field(&state.as_ref().map(|_| "AppState"))
                .finish(),
            Self::LabelLoaded { index, result } => f
                .debug_struct("LabelLoaded")
                .field("index", index)
                .field("ok", &result.is_ok())
                .finish(),
            Self::Exit => f.write_str("Exit"),
        }
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<RuntimeEvent>,
    config: Option<WorldConfig>,
    state: Option<AppState>,
    fonts: FontCache,
    last_time: Instant,
    time_since_tick: Duration,
}

impl App {
    fn new(event_loop: &EventLoop<RuntimeEvent>, config: WorldConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            config: Some(config),
            state: None,
            fonts: FontCache::new(),
            last_time: Instant::now(),
            time_since_tick: Duration::from_millis(0),
        })
    }

    /// Start every pending label load. Results are posted back to the event
    /// loop in the order they complete.
    fn start_label_loads(&mut self) {
        let Some(state) = &self.state else {
            return;
        };
        let loads = state.world.label_loads(&mut self.fonts);
        if loads.is_empty() {
            return;
        }
        log::info!("loading {} labels", loads.len());
        let proxy = self.proxy.clone();

        #[cfg(not(target_arch = "wasm32"))]
        self.async_runtime.block_on(forward_loads(loads, proxy));

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(forward_loads(loads, proxy));
    }

    fn install(&mut self, event_loop: &ActiveEventLoop, state: anyhow::Result<AppState>) {
        match state {
            Ok(mut state) => {
                if let Some((width, height)) = state.window_size() {
                    state.resize(width, height);
                }
                state.ctx.request_redraw();
                self.state = Some(state);
                self.start_label_loads();
            }
            Err(e) => {
                log::error!("App initialization failed: {e:#}");
                event_loop.exit();
            }
        }
    }
}

async fn forward_loads(loads: Vec<LabelLoad>, proxy: EventLoopProxy<RuntimeEvent>) {
    let mut pending: FuturesUnordered<LabelLoad> = loads.into_iter().collect();
    while let Some((index, result)) = pending.next().await {
        if proxy
            .send_event(RuntimeEvent::LabelLoaded { index, result })
            .is_err()
        {
            log::warn!("event loop closed before label {index} was delivered");
            return;
        }
    }
}

impl ApplicationHandler<RuntimeEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(config) = self.config.take() else {
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("quote-ngin");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let canvas = wgpu::web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id(CANVAS_ID));
            match canvas {
                Some(canvas) => {
                    window_attributes =
                        window_attributes.with_canvas(Some(canvas.unchecked_into()));
                }
                None => log::warn!("no #{CANVAS_ID} element, letting winit create one"),
            }
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Cannot create a window: {e}");
                event_loop.exit();
                return;
            }
        };

        let init_future = AppState::new(window, config);

        #[cfg(not(target_arch = "wasm32"))]
        {
            let state = self.async_runtime.block_on(init_future);
            self.install(event_loop, state);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let state = init_future.await;
                if proxy.send_event(RuntimeEvent::Initialized(state)).is_err() {
                    log::error!("event loop closed during initialization");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: RuntimeEvent) {
        match event {
            RuntimeEvent::Initialized(state) => self.install(event_loop, state),
            RuntimeEvent::LabelLoaded { index, result } => {
                let Some(state) = &mut self.state else {
                    return;
                };
                match state.world.on_label_loaded(index, result) {
                    Ok(true) => state.ctx.request_redraw(),
                    Ok(false) => (),
                    Err(e) => log::error!("{e}"),
                }
            }
            RuntimeEvent::Exit => event_loop.exit(),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                state.world.stop_handle().stop();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                state.resize(size.width, size.height);
                state.ctx.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();
                self.time_since_tick += dt;

                let outcome =
                    if self.time_since_tick >= Duration::from_millis(state.ctx.tick_duration_millis) {
                        self.time_since_tick = Duration::from_millis(0);
                        state.world.tick()
                    } else {
                        state.world.outcome()
                    };

                match outcome {
                    TickOutcome::Waiting | TickOutcome::Failed => return,
                    TickOutcome::Stopped => {
                        event_loop.exit();
                        return;
                    }
                    TickOutcome::Frame => (),
                }

                // Rendering requires the surface to be configured
                if !state.is_surface_configured {
                    return;
                }
                match state.renderer.render(&state.ctx, &state.world) {
                    Ok(()) => state.ctx.request_redraw(),
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        if let Some((width, height)) = state.window_size() {
                            state.resize(width, height);
                        }
                        state.ctx.request_redraw();
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Open a window and run `config` until the window closes or the world is
/// stopped.
pub fn run(config: WorldConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| anyhow::anyhow!("Could not initialize logger: {e}"))?;
    }

    #[cfg(all(feature = "integration-tests", target_os = "linux"))]
    let event_loop: EventLoop<RuntimeEvent> = {
        use winit::platform::wayland::EventLoopBuilderExtWayland;

        EventLoop::with_user_event().with_any_thread(true).build()?
    };

    #[cfg(all(feature = "integration-tests", target_os = "windows"))]
    let event_loop: EventLoop<RuntimeEvent> = {
        use winit::platform::windows::EventLoopBuilderExtWindows;

        EventLoop::with_user_event().with_any_thread(true).build()?
    };

    #[cfg(not(all(
        feature = "integration-tests",
        any(target_os = "linux", target_os = "windows")
    )))]
    let event_loop: EventLoop<RuntimeEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, config)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}

/// Browser entry point: the default scene on the page's `canvas`.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn run_web() -> Result<(), JsValue> {
    run(WorldConfig::default()).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
