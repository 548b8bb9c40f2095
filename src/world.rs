//! The world: every object of the scene plus the state machine that decides
//! when the scene is complete and what a frame does.
//!
//! A world is built synchronously. Its labels start out pending; each label
//! load is a separate future whose result is handed back through
//! [`World::on_label_loaded`], in whatever order the loads finish. A
//! [`ReadinessBarrier`] counts the completions and opens once, at which point
//! the scene is finalized (members, lights, fog, camera placement,
//! postprocessing) and the world starts running.
//!
//! ```text
//! Constructing -> AwaitingResources -> Ready -> Running
//!                        |
//!                        +-> Failed(ResourceLoadError)
//! ```

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use futures::{FutureExt, future::LocalBoxFuture};

use crate::{
    camera::{Camera, Projection},
    compositor::{Compositor, PassChain},
    config::{HUE_WRAP, ReadyPolicy, WorldConfig},
    data_structures::scene_graph::{Fog, NodeId, Scene},
    error::{EngineError, ResourceLoadError},
    objects::{
        ground::Ground,
        label::Label,
        lighting::LightingRig,
        shape::{Shape, ShapeAnimation},
    },
    resources::font::{FontCache, TextLayout, load_label},
};

#[derive(Clone, Debug, PartialEq)]
pub enum WorldState {
    Constructing,
    AwaitingResources,
    Ready,
    Running,
    Failed(ResourceLoadError),
}

/// What the caller should do after a [`World::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Resources are still loading; nothing to draw.
    Waiting,
    /// The frame hooks ran; render and composite.
    Frame,
    /// The stop flag is set; stop scheduling frames.
    Stopped,
    /// A resource failed to load; the scene will never be finalized.
    Failed,
}

/// Counts label completions and opens exactly once.
#[derive(Clone, Debug)]
pub struct ReadinessBarrier {
    policy: ReadyPolicy,
    arrived: Vec<bool>,
    open: bool,
}

impl ReadinessBarrier {
    /// A barrier over `expected` participants. With zero participants it is
    /// open from the start.
    pub fn new(expected: usize, policy: ReadyPolicy) -> Self {
        Self {
            policy,
            arrived: vec![false; expected],
            open: expected == 0,
        }
    }

    /// Record that participant `index` is done. Returns `true` only for the
    /// arrival that opens the barrier.
    pub fn arrive(&mut self, index: usize) -> bool {
        let Some(slot) = self.arrived.get_mut(index) else {
            return false;
        };
        *slot = true;
        if self.open {
            return false;
        }
        let opens = match self.policy {
            ReadyPolicy::AllLabels => self.arrived.iter().all(|a| *a),
            ReadyPolicy::LastConstructed => index + 1 == self.arrived.len(),
        };
        self.open = opens;
        opens
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn expected(&self) -> usize {
        self.arrived.len()
    }

    pub fn pending(&self) -> usize {
        self.arrived.iter().filter(|a| !**a).count()
    }
}

/// Hue in degrees, advanced once per executed frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HueState(u32);

impl HueState {
    pub fn value(self) -> u32 {
        self.0
    }

    pub fn advance(&mut self) {
        self.0 = (self.0 + 1) % HUE_WRAP;
    }
}

/// Shared stop flag, checked at the start of every tick.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

type ErrorHandler = Box<dyn FnMut(&ResourceLoadError)>;

pub struct World {
    config: WorldConfig,
    state: WorldState,
    scene: Scene,
    camera: Camera,
    projection: Projection,
    shape: Shape,
    ground: Option<Ground>,
    labels: Vec<Label>,
    lighting: LightingRig,
    compositor: Compositor,
    compositor_attached: bool,
    barrier: ReadinessBarrier,
    hue: HueState,
    stop: StopHandle,
    finalize_count: u32,
    frames: u64,
    error_handler: Option<ErrorHandler>,
}

impl World {
    /// Build every component for a `width` x `height` viewport.
    ///
    /// Fails on an invalid lighting rig or pass chain. A config without
    /// labels is finalized before this returns.
    pub fn new(config: WorldConfig, width: u32, height: u32) -> Result<Self, EngineError> {
        let lighting = LightingRig::create(&config.lighting)?;
        let chain = PassChain::new(config.passes.clone())?;

        let mut projection = Projection::new(
            1,
            1,
            cgmath::Deg(config.camera.fov_deg),
            config.camera.near,
            config.camera.far,
        );
        projection.resize(width, height);
        let mut compositor = Compositor::new(chain, config.glitch.clone(), config.bokeh.clone());
        compositor.set_size(width, height);

        let shape = Shape::create(config.shape.kind, config.shape.color)
            .with_position(config.shape.position)
            .with_shadows(config.shape.shadows);
        let ground = config.ground.as_ref().map(Ground::create);
        let labels: Vec<Label> = config
            .labels
            .lines
            .iter()
            .map(|line| Label::new(line.text.clone(), line.position))
            .collect();
        let barrier = ReadinessBarrier::new(labels.len(), config.ready_policy);

        let mut world = Self {
            state: WorldState::Constructing,
            scene: Scene::new(config.background),
            camera: Camera::new([0.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            projection,
            shape,
            ground,
            labels,
            lighting,
            compositor,
            compositor_attached: false,
            barrier,
            hue: HueState::default(),
            stop: StopHandle::default(),
            finalize_count: 0,
            frames: 0,
            error_handler: None,
            config,
        };

        if world.config.render_before_ready {
            // Frames run before the labels exist, so the synchronous nodes
            // have to be in the scene already.
            world.attach_synchronous_nodes();
        }

        world.set_state(WorldState::AwaitingResources);
        if world.barrier.is_open() {
            world.finalize();
        }
        Ok(world)
    }

    /// Report load failures to `handler` in addition to the log.
    pub fn with_error_handler(mut self, handler: impl FnMut(&ResourceLoadError) + 'static) -> Self {
        self.error_handler = Some(Box::new(handler));
        self
    }

    /// One future per pending label: fetch the font through `cache`, lay out
    /// the text and yield `(label index, result)`.
    pub fn label_loads(
        &self,
        cache: &mut FontCache,
    ) -> Vec<LocalBoxFuture<'static, (usize, Result<TextLayout, ResourceLoadError>)>> {
        let path = self.config.labels.font_path.clone();
        let style = self.config.labels.style.clone();
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, label)| !label.is_ready())
            .map(|(index, label)| {
                load_label(cache, &path, label.text().to_string(), style.clone())
                    .map(move |result| (index, result))
                    .boxed_local()
            })
            .collect()
    }

    /// Feed the result of label `index`'s load into the world.
    ///
    /// Returns `Ok(true)` when this completion finalized the scene.
    pub fn on_label_loaded(
        &mut self,
        index: usize,
        result: Result<TextLayout, ResourceLoadError>,
    ) -> Result<bool, EngineError> {
        if index >= self.labels.len() {
            return Err(EngineError::UnknownLabel(index));
        }
        if let WorldState::Failed(_) = self.state {
            log::debug!("ignoring label {index}: world already failed");
            return Ok(false);
        }

        let layout = match result {
            Ok(layout) => layout,
            Err(err) => {
                self.fail(err);
                return Ok(false);
            }
        };

        let style = &self.config.labels.style;
        if !self.labels[index].finish(layout, style) {
            return Ok(false);
        }
        log::info!(
            "label {index} ready ({} of {} pending)",
            self.barrier.pending().saturating_sub(1),
            self.barrier.expected()
        );

        if self.barrier.arrive(index) {
            self.finalize();
            return Ok(true);
        }
        Ok(false)
    }

    fn fail(&mut self, err: ResourceLoadError) {
        log::error!("{err}");
        if let Some(handler) = self.error_handler.as_mut() {
            handler(&err);
        }
        if self.finalize_count == 0 {
            self.set_state(WorldState::Failed(err));
        }
    }

    fn attach_synchronous_nodes(&mut self) {
        self.scene.add(NodeId::Shape);
        if self.ground.is_some() {
            self.scene.add(NodeId::Ground);
        }
    }

    fn finalize(&mut self) {
        if self.finalize_count > 0 {
            return;
        }
        self.set_state(WorldState::Ready);

        self.attach_synchronous_nodes();
        for index in 0..self.labels.len() {
            self.scene.add(NodeId::Label(index));
        }
        self.scene.attach_lights();
        self.scene.background = self.config.background;
        self.scene.fog = self
            .config
            .fog
            .as_ref()
            .map(|fog| Fog::new(fog.color, fog.density));
        self.camera
            .place(self.config.camera.position, self.config.camera.look_at);
        self.compositor_attached = true;
        self.finalize_count += 1;

        self.set_state(WorldState::Running);
    }

    fn set_state(&mut self, state: WorldState) {
        log::info!("world: {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// What [`World::tick`] would report right now, without running any hook.
    pub fn outcome(&self) -> TickOutcome {
        if self.stop.is_stopped() {
            return TickOutcome::Stopped;
        }
        match self.state {
            WorldState::Failed(_) => TickOutcome::Failed,
            WorldState::Running => TickOutcome::Frame,
            _ if self.config.render_before_ready => TickOutcome::Frame,
            _ => TickOutcome::Waiting,
        }
    }

    /// Run one frame's hooks in order: shape, labels, hue, compositor.
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.outcome();
        if outcome != TickOutcome::Frame {
            return outcome;
        }

        let animation = self.config.shape.animation;
        if animation.rotates() {
            self.shape.step_rotation();
        }
        if animation.pulses() {
            self.shape.step_scale();
        }
        let hue = self.hue.value();
        for label in &mut self.labels {
            label.set_hue(hue);
        }
        self.hue.advance();
        if self.compositor_attached {
            self.compositor.advance();
        }
        self.frames += 1;
        TickOutcome::Frame
    }

    /// React to a new viewport size. Zero dimensions keep the previous
    /// aspect; returns whether anything changed.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if !self.projection.resize(width, height) {
            log::debug!("skipping resize to {width}x{height}");
            return false;
        }
        self.compositor.set_size(width, height);
        true
    }

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == WorldState::Running
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn shape_mut(&mut self) -> &mut Shape {
        &mut self.shape
    }

    pub fn shape_animation(&self) -> ShapeAnimation {
        self.config.shape.animation
    }

    pub fn ground(&self) -> Option<&Ground> {
        self.ground.as_ref()
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn lighting(&self) -> &LightingRig {
        &self.lighting
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn compositor_mut(&mut self) -> &mut Compositor {
        &mut self.compositor
    }

    /// Whether postprocessing is active; false until the scene is finalized.
    pub fn is_compositor_attached(&self) -> bool {
        self.compositor_attached
    }

    pub fn hue(&self) -> HueState {
        self.hue
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// How many times the scene has been finalized. Never more than one.
    pub fn finalize_count(&self) -> u32 {
        self.finalize_count
    }

    /// Frames executed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("state", &self.state)
            .field("labels", &self.labels.len())
            .field("hue", &self.hue)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}
