//! Morphing point cloud
//!
//! The consumer side of the compute channel: one instance owns the sphere
//! and model point sets for a single visual component, requests both through
//! the channel, and guarantees that a result buffer always exists — zero
//! filled when sampling fails — so downstream GPU buffers are never
//! undefined. Sampling failures are invisible beyond the morph target
//! degrading to a blank shape; there is no retry and no error surface.

use std::sync::Arc;
use std::time::Duration;

use glam::Vec3;
use parking_lot::Mutex;

use crate::compute::{ComputeChannel, PendingSample, SampleRequest};
use crate::sampler::PointSet;

/// Pointer rest position: far enough away that no point feels it
const POINTER_AT_REST: Vec3 = Vec3::new(9999.0, 9999.0, 9999.0);

/// Tuning for one morphing point cloud instance.
#[derive(Debug, Clone)]
pub struct CloudConfig {
    pub point_count: usize,
    pub sphere_radius: f32,
    pub seed: u32,
    pub model_url: String,
    /// Per-frame advance of the intro ramp clock
    pub time_scale: f32,
    /// Intro ramp duration in ramp-clock units
    pub intro_duration: f32,
    /// Exponential smoothing time constant for morph input, seconds
    pub morph_smooth_time: f32,
    /// Exponential smoothing time constant for pointer input, seconds
    pub pointer_smooth_time: f32,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            point_count: 450_000,
            sphere_radius: 6.5,
            seed: 1,
            model_url: "assets/models/cloud.ply".to_string(),
            time_scale: 0.0007,
            intro_duration: 0.13,
            morph_smooth_time: 0.08,
            pointer_smooth_time: 0.2,
        }
    }
}

/// Shared progress sink: forwarded worker progress and the final 100 both go
/// through it, from the router thread and the polling thread respectively.
type ProgressSink = Arc<Mutex<Box<dyn FnMut(u32) + Send>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntroState {
    /// Not armed: ramp reads fully-on so a cloud without an intro just shows
    Unarmed,
    /// Armed but waiting for drawable points
    Armed,
    /// Ramp clock running
    Running,
}

/// A point cloud that morphs between a generated sphere and a mesh-derived
/// shape, index-for-index.
pub struct MorphingPointCloud {
    config: CloudConfig,

    sphere: PointSet,
    model: PointSet,
    /// Points eligible for drawing; 0 until the sphere set arrives
    draw_count: usize,
    sphere_dirty: bool,
    model_dirty: bool,

    sphere_pending: Option<PendingSample>,
    model_pending: Option<PendingSample>,
    progress: Option<ProgressSink>,

    target_morph: f32,
    current_morph: f32,

    intro: IntroState,
    intro_elapsed: f32,
    ramp: f32,

    pointer_target: Vec3,
    pointer_current: Vec3,
}

impl MorphingPointCloud {
    pub fn new(config: CloudConfig) -> Self {
        let point_count = config.point_count;
        Self {
            config,
            sphere: PointSet::zeroed(point_count),
            model: PointSet::zeroed(point_count),
            draw_count: 0,
            sphere_dirty: false,
            model_dirty: false,
            sphere_pending: None,
            model_pending: None,
            progress: None,
            target_morph: 0.0,
            current_morph: 0.0,
            intro: IntroState::Unarmed,
            intro_elapsed: 0.0,
            ramp: 1.0,
            pointer_target: POINTER_AT_REST,
            pointer_current: POINTER_AT_REST,
        }
    }

    /// Submit both sample requests through `channel`. Combined load progress
    /// (0..=100) is delivered to `on_progress`; it reaches 100 on success
    /// and on failure alike.
    pub fn begin_load(
        &mut self,
        channel: &ComputeChannel,
        on_progress: Option<Box<dyn FnMut(u32) + Send>>,
    ) {
        let sink = on_progress.map(|cb| Arc::new(Mutex::new(cb)) as ProgressSink);

        let model_progress = sink.clone().map(|sink| {
            Box::new(move |percent: u32| (*sink.lock())(percent)) as Box<dyn FnMut(u32) + Send>
        });
        self.model_pending = Some(channel.submit(
            SampleRequest::LoadAndSampleMesh {
                url: self.config.model_url.clone(),
                point_count: self.config.point_count,
                target_radius: self.config.sphere_radius,
            },
            model_progress,
        ));

        self.sphere_pending = Some(channel.submit(
            SampleRequest::GenerateSphere {
                point_count: self.config.point_count,
                radius: self.config.sphere_radius,
                seed: self.config.seed,
            },
            None,
        ));

        self.progress = sink;
    }

    /// Non-blocking poll of the in-flight requests. Returns true once both
    /// have settled (in this call or earlier).
    pub fn poll(&mut self) -> bool {
        if let Some(pending) = self.sphere_pending.take() {
            match pending.try_wait() {
                Some(result) => self.apply_sphere(result),
                None => self.sphere_pending = Some(pending),
            }
        }
        if let Some(pending) = self.model_pending.take() {
            match pending.try_wait() {
                Some(result) => self.apply_model(result),
                None => self.model_pending = Some(pending),
            }
        }
        self.sphere_pending.is_none() && self.model_pending.is_none()
    }

    /// Block until both requests settle. Same fallback semantics as
    /// [`poll`](Self::poll).
    pub fn wait_loaded(&mut self) {
        if let Some(pending) = self.sphere_pending.take() {
            self.apply_sphere(pending.wait());
        }
        if let Some(pending) = self.model_pending.take() {
            self.apply_model(pending.wait());
        }
    }

    fn apply_sphere(&mut self, result: Result<PointSet, crate::error::EngineError>) {
        match result {
            Ok(points) => {
                self.sphere = points;
                self.draw_count = self.config.point_count;
                self.sphere_dirty = true;
            }
            Err(error) => {
                // Buffer stays zero-filled; nothing becomes drawable
                log::warn!("sphere generation failed: {error}");
            }
        }
    }

    fn apply_model(&mut self, result: Result<PointSet, crate::error::EngineError>) {
        match result {
            Ok(points) => {
                self.model = points;
            }
            Err(error) => {
                // Fail soft: degrade to a blank morph target
                log::warn!("model sampling failed, using zero-filled target: {error}");
                self.model.fill_zero();
            }
        }
        self.model_dirty = true;
        if let Some(sink) = self.progress.as_ref() {
            (*sink.lock())(100);
        }
    }

    /// Arm the intro ramp so it starts the moment the cloud has drawable
    /// points, not while a loading overlay still covers it.
    pub fn arm_intro(&mut self) {
        self.intro = IntroState::Armed;
        self.intro_elapsed = 0.0;
        self.ramp = 0.0;
    }

    /// Clamp and store the morph input; per-frame smoothing happens in
    /// [`update`](Self::update).
    pub fn set_morph(&mut self, morph: f32) {
        self.target_morph = morph.clamp(0.0, 1.0);
    }

    pub fn set_pointer_target(&mut self, local: Vec3) {
        self.pointer_target = local;
    }

    /// Advance the per-frame state: morph and pointer smoothing plus the
    /// intro ramp clock.
    pub fn update(&mut self, dt: Duration) {
        // Large scroll steps arrive as large dt gaps; clamp so smoothing
        // never overshoots
        let dt_ms = (dt.as_secs_f32() * 1000.0).clamp(0.0, 100.0);
        let dt_s = (dt_ms / 1000.0).max(1e-6);

        let morph_k = 1.0 - (-dt_s / self.config.morph_smooth_time).exp();
        self.current_morph += (self.target_morph - self.current_morph) * morph_k;

        let pointer_k = 1.0 - (-dt_s / self.config.pointer_smooth_time).exp();
        self.pointer_current = self.pointer_current.lerp(self.pointer_target, pointer_k);

        match self.intro {
            IntroState::Unarmed => self.ramp = 1.0,
            IntroState::Armed if self.draw_count == 0 => self.ramp = 1.0,
            IntroState::Armed => {
                self.intro = IntroState::Running;
                self.intro_elapsed = self.config.time_scale;
                self.ramp = 0.0;
            }
            IntroState::Running => {
                self.intro_elapsed =
                    (self.intro_elapsed + self.config.time_scale).min(self.config.intro_duration);
                let t = (self.intro_elapsed / self.config.intro_duration).clamp(0.0, 1.0);
                self.ramp = smootherstep(t);
            }
        }
    }

    /// Write the index-aligned interpolation between sphere and model into
    /// `out` at the current morph value. `out` must hold point_count * 3
    /// floats.
    pub fn morph_positions(&self, out: &mut [f32]) {
        let t = self.current_morph;
        let sphere = self.sphere.as_slice();
        let model = self.model.as_slice();
        for ((dst, &a), &b) in out.iter_mut().zip(sphere).zip(model) {
            *dst = a + (b - a) * t;
        }
    }

    pub fn sphere_positions(&self) -> &PointSet {
        &self.sphere
    }

    pub fn model_positions(&self) -> &PointSet {
        &self.model
    }

    /// True once per sphere-buffer change: the caller re-uploads to its GPU
    /// buffer when this reports true.
    pub fn take_sphere_dirty(&mut self) -> bool {
        std::mem::take(&mut self.sphere_dirty)
    }

    pub fn take_model_dirty(&mut self) -> bool {
        std::mem::take(&mut self.model_dirty)
    }

    pub fn draw_count(&self) -> usize {
        self.draw_count
    }

    pub fn morph(&self) -> f32 {
        self.current_morph
    }

    pub fn ramp(&self) -> f32 {
        self.ramp
    }

    pub fn pointer(&self) -> Vec3 {
        self.pointer_current
    }
}

/// smootherstep easing: t^3 * (t * (6t - 15) + 10)
fn smootherstep(t: f32) -> f32 {
    t * t * t * (t * (6.0 * t - 15.0) + 10.0)
}
