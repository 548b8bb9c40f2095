//! Postprocessing chain description and the per-frame state of its effects.
//!
//! The chain is fixed: the base render, optionally followed by a digital
//! glitch and a depth-of-field (bokeh) pass. The last pass in the chain is the
//! one that writes to the screen. This module only decides *what* each pass
//! does on a given frame; the GPU side lives in
//! [`pipelines::post`](crate::pipelines::post).

use std::f32::consts::PI;

use rand::{RngExt, SeedableRng, rngs::StdRng};

use crate::{
    config::{BokehSettings, GlitchSettings},
    error::EngineError,
};

/// Vertical band half-height of the glitch tears, in UV units.
const GLITCH_COLUMN_SIZE: f32 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PassKind {
    Render,
    Glitch,
    Bokeh,
}

impl PassKind {
    const CANONICAL: [PassKind; 3] = [PassKind::Render, PassKind::Glitch, PassKind::Bokeh];
}

/// A validated, ordered list of passes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassChain {
    passes: Vec<PassKind>,
}

impl PassChain {
    /// Validate a chain: it must start with `Render` and keep the canonical
    /// order (render, glitch, bokeh) with no pass repeated.
    pub fn new(passes: Vec<PassKind>) -> Result<Self, EngineError> {
        if passes.first() != Some(&PassKind::Render) {
            return Err(EngineError::InvalidPassChain(format!(
                "chain must start with Render, got {passes:?}"
            )));
        }
        let mut canonical = PassKind::CANONICAL.iter();
        for pass in &passes {
            if !canonical.any(|c| c == pass) {
                return Err(EngineError::InvalidPassChain(format!(
                    "{pass:?} is repeated or out of order in {passes:?}"
                )));
            }
        }
        Ok(Self { passes })
    }

    pub fn direct() -> Self {
        Self {
            passes: vec![PassKind::Render],
        }
    }

    pub fn passes(&self) -> &[PassKind] {
        &self.passes
    }

    /// A chain with only the base render draws straight to the screen.
    pub fn is_direct(&self) -> bool {
        self.passes.len() == 1
    }

    pub fn contains(&self, kind: PassKind) -> bool {
        self.passes.contains(&kind)
    }

    /// The pass whose output reaches the screen.
    pub fn output_pass(&self) -> PassKind {
        self.passes.last().copied().unwrap_or(PassKind::Render)
    }
}

impl Default for PassChain {
    fn default() -> Self {
        Self::direct()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlitchUniform {
    pub amount: f32,
    pub angle: f32,
    pub seed: f32,
    pub seed_x: f32,
    pub seed_y: f32,
    pub distortion_x: f32,
    pub distortion_y: f32,
    pub col_s: f32,
    /// 1 passes the frame through untouched.
    pub bypass: u32,
    _padding: [u32; 3],
}

/// Frame counter, trigger interval and RNG of the digital glitch.
pub struct GlitchState {
    rng: StdRng,
    settings: GlitchSettings,
    frame: u32,
    trigger: u32,
    go_wild: bool,
    uniform: GlitchUniform,
}

impl GlitchState {
    pub fn new(settings: GlitchSettings) -> Self {
        let mut rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::rng().random()),
        };
        let trigger = draw_trigger(&mut rng, &settings);
        Self {
            rng,
            settings,
            frame: 0,
            trigger,
            go_wild: false,
            uniform: GlitchUniform {
                col_s: GLITCH_COLUMN_SIZE,
                bypass: 1,
                ..Default::default()
            },
        }
    }

    /// Glitch on every frame regardless of the trigger.
    pub fn set_go_wild(&mut self, go_wild: bool) {
        self.go_wild = go_wild;
    }

    /// Frames until the next strong glitch is due.
    pub fn trigger_interval(&self) -> u32 {
        self.trigger
    }

    pub fn uniform(&self) -> &GlitchUniform {
        &self.uniform
    }

    /// Advance one frame and return the shader parameters for it.
    ///
    /// A strong glitch fires when the counter hits the trigger interval, which
    /// then resets the counter and draws a new interval. During the first
    /// fifth of every interval a mild glitch plays. Otherwise the pass is
    /// bypassed.
    pub fn step(&mut self) -> GlitchUniform {
        let u = &mut self.uniform;
        u.seed = self.rng.random::<f32>();
        u.bypass = 0;
        if self.frame % self.trigger == 0 || self.go_wild {
            u.amount = self.rng.random::<f32>() / 30.0;
            u.angle = self.rng.random_range(-PI..PI);
            u.seed_x = self.rng.random_range(-1.0..1.0);
            u.seed_y = self.rng.random_range(-1.0..1.0);
            u.distortion_x = self.rng.random_range(0.0..1.0);
            u.distortion_y = self.rng.random_range(0.0..1.0);
            self.frame = 0;
            self.trigger = draw_trigger(&mut self.rng, &self.settings);
        } else if ((self.frame % self.trigger) as f32) < self.trigger as f32 / 5.0 {
            u.amount = self.rng.random::<f32>() / 90.0;
            u.angle = self.rng.random_range(-PI..PI);
            u.distortion_x = self.rng.random_range(0.0..1.0);
            u.distortion_y = self.rng.random_range(0.0..1.0);
            u.seed_x = self.rng.random_range(-0.3..0.3);
            u.seed_y = self.rng.random_range(-0.3..0.3);
        } else {
            u.bypass = 1;
        }
        self.frame += 1;
        *u
    }

    /// Random RGBA bytes for the displacement texture.
    pub fn displacement_map(&mut self) -> (u32, Vec<u8>) {
        let size = self.settings.displacement_size.max(1);
        let data = (0..size * size * 4)
            .map(|_| self.rng.random::<u8>())
            .collect();
        (size, data)
    }
}

fn draw_trigger(rng: &mut StdRng, settings: &GlitchSettings) -> u32 {
    let lo = settings.trigger_min.max(1);
    let hi = settings.trigger_max.max(lo);
    rng.random_range(lo..=hi)
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BokehUniform {
    pub focus: f32,
    pub aperture: f32,
    pub max_blur: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    _padding: [f32; 2],
}

impl BokehUniform {
    pub fn new(settings: &BokehSettings, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            focus: settings.focus,
            aperture: settings.aperture,
            max_blur: settings.max_blur,
            aspect,
            near,
            far,
            _padding: [0.0; 2],
        }
    }
}

/// Linear view distance for a depth-buffer value in `[0, 1]`.
pub fn view_depth(depth: f32, near: f32, far: f32) -> f32 {
    let view_z = near * far / ((far - near) * depth - far);
    -view_z
}

/// Signed blur radius for a fragment at view distance `depth`.
pub fn bokeh_blur(settings: &BokehSettings, depth: f32) -> f32 {
    ((depth - settings.focus) * settings.aperture).clamp(-settings.max_blur, settings.max_blur)
}

/// The chain together with the state its effects carry between frames.
pub struct Compositor {
    chain: PassChain,
    glitch: GlitchState,
    bokeh: BokehSettings,
    size: (u32, u32),
}

impl Compositor {
    pub fn new(chain: PassChain, glitch: GlitchSettings, bokeh: BokehSettings) -> Self {
        Self {
            chain,
            glitch: GlitchState::new(glitch),
            bokeh,
            size: (1, 1),
        }
    }

    pub fn chain(&self) -> &PassChain {
        &self.chain
    }

    pub fn glitch(&self) -> &GlitchState {
        &self.glitch
    }

    pub fn glitch_mut(&mut self) -> &mut GlitchState {
        &mut self.glitch
    }

    pub fn bokeh(&self) -> &BokehSettings {
        &self.bokeh
    }

    /// Target size of the offscreen passes. Zero dimensions are ignored.
    pub fn set_size(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.size = (width, height);
        true
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Advance per-frame effect state. Only passes in the chain are stepped.
    pub fn advance(&mut self) {
        if self.chain.contains(PassKind::Glitch) {
            self.glitch.step();
        }
    }
}
