//! Scene plumbing shared by every page.
//!
//! A [`SceneContext`] owns the per-scene input and timing state. Each frame
//! it advances the clock, smooths scroll, lags the pointer and projects it,
//! then freezes the result into a [`FrameSnapshot`] that every component of
//! the scene reads. Components never see each other's half-updated state.

use glam::{Vec2, Vec3};

use crate::camera::{Camera, CameraPose, CameraRig};
use crate::clock::FrameClock;
use crate::error::ConstructionError;
use crate::pointer::{PointerProjector, ProjectionPlane};
use crate::render::RenderSink;
use crate::scroll::ScrollState;

pub use crate::scenes::SceneKind;

/// Read-only view of one frame's inputs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameSnapshot {
    /// Clamped frame delta, seconds.
    pub dt: f32,
    /// Simulated seconds since the scene started.
    pub time: f32,
    pub frame: u64,
    /// Smoothed scroll progress in [0, 1].
    pub progress: f32,
    pub pointer_ndc: Vec2,
    pub pointer_lag: Vec2,
    pub pointer_world: Option<Vec3>,
    /// Canvas size in pixels.
    pub viewport: Vec2,
}

#[derive(Clone, Copy, Debug)]
pub struct ContextParams {
    pub scroll_k: f32,
    pub pointer_lag_k: f32,
    pub camera_follow: f32,
    pub fovy_deg: f32,
}

pub struct SceneContext {
    pub clock: FrameClock,
    pub scroll: ScrollState,
    pub pointer: PointerProjector,
    pub rig: CameraRig,
    viewport: Vec2,
    alive: bool,
}

impl SceneContext {
    pub fn new(params: ContextParams, eye: Vec3, aspect: f32) -> Result<Self, ConstructionError> {
        let camera = Camera::new(eye, Vec3::ZERO, params.fovy_deg, aspect);
        Ok(Self {
            clock: FrameClock::new(),
            scroll: ScrollState::new(params.scroll_k)?,
            pointer: PointerProjector::new(params.pointer_lag_k)?,
            rig: CameraRig::new(camera, params.camera_follow),
            viewport: Vec2::new(1280.0, 1280.0 / aspect.max(1e-3)),
            alive: true,
        })
    }

    /// Run the input half of the frame and freeze it.
    pub fn begin_frame(&mut self, raw_dt: f32, plane: Option<ProjectionPlane>) -> FrameSnapshot {
        let dt = self.clock.advance(raw_dt);
        let progress = self.scroll.tick();
        let lag = self.pointer.tick_lag();
        let world = plane.and_then(|p| self.pointer.project(&self.rig.camera, p));
        FrameSnapshot {
            dt,
            time: self.clock.elapsed(),
            frame: self.clock.frame(),
            progress,
            pointer_ndc: self.pointer.state().screen,
            pointer_lag: lag,
            pointer_world: world,
            viewport: self.viewport,
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite() {
            self.viewport = Vec2::new(width, height);
            self.rig.camera.set_aspect(width / height);
        }
    }

    #[inline]
    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    #[inline]
    pub fn camera(&self) -> &Camera {
        &self.rig.camera
    }

    #[inline]
    pub fn pose(&self) -> CameraPose {
        self.rig.pose()
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn shutdown(&mut self) {
        self.alive = false;
    }
}

/// A complete page animation: owns its state and publishes buffers.
pub trait Scene {
    fn name(&self) -> &'static str;

    fn context(&self) -> &SceneContext;

    fn context_mut(&mut self) -> &mut SceneContext;

    /// Plane the pointer is projected onto this frame, if the scene uses a
    /// world-space pointer at all.
    fn pointer_plane(&self) -> Option<ProjectionPlane>;

    /// Fields, then graph, then routing, then camera.
    fn update(&mut self, frame: &FrameSnapshot);

    fn publish(&self, sink: &mut dyn RenderSink);

    /// Stop all pending work. Later frames do nothing.
    fn shutdown(&mut self) {
        self.context_mut().shutdown();
    }

    /// Pointer in normalized device coordinates, +y up.
    fn set_pointer(&mut self, ndc: Vec2) {
        self.context_mut().pointer.set_screen(ndc);
    }

    fn set_scroll_target(&mut self, fraction: f32) {
        self.context_mut().scroll.set_target(fraction);
    }

    fn resize(&mut self, width: f32, height: f32) {
        self.context_mut().resize(width, height);
    }

    /// Advance one frame and publish it. Returns `None` once shut down.
    fn frame(&mut self, raw_dt: f32, sink: &mut dyn RenderSink) -> Option<FrameSnapshot> {
        if !self.context().is_alive() {
            return None;
        }
        let plane = self.pointer_plane();
        let snapshot = self.context_mut().begin_frame(raw_dt, plane);
        self.update(&snapshot);
        self.publish(sink);
        sink.camera(self.context().pose());
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> SceneContext {
        let params = ContextParams {
            scroll_k: 0.5,
            pointer_lag_k: 0.5,
            camera_follow: 0.1,
            fovy_deg: 60.0,
        };
        SceneContext::new(params, Vec3::new(0.0, 0.0, 80.0), 1.5).unwrap()
    }

    #[test]
    fn snapshot_carries_clamped_dt_and_progress() {
        let mut c = ctx();
        c.scroll.set_target(1.0);
        let s = c.begin_frame(1.0, None);
        assert_eq!(s.dt, crate::constants::MAX_FRAME_DT);
        assert_eq!(s.progress, 0.5);
        assert_eq!(s.frame, 1);
        assert!(s.pointer_world.is_none());
    }

    #[test]
    fn pointer_is_projected_when_a_plane_is_given() {
        let mut c = ctx();
        let s = c.begin_frame(0.016, Some(ProjectionPlane::SCREEN));
        assert!(s.pointer_world.is_some());
    }

    #[test]
    fn resize_ignores_degenerate_sizes() {
        let mut c = ctx();
        c.resize(800.0, 400.0);
        c.resize(0.0, 400.0);
        assert_eq!(c.viewport(), Vec2::new(800.0, 400.0));
        assert_eq!(c.camera().aspect, 2.0);
    }
}
