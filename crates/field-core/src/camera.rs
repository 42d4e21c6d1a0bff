//! Camera description and the smoothed rig that scenes steer.
//!
//! The simulation never renders; it only decides where the camera should be.
//! [`Camera`] carries the projection parameters needed for pointer rays and
//! screen-space picking, [`CameraRig`] eases the eye toward a per-frame target
//! and [`CameraPose`] is what gets handed to the renderer.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::constants::{DEFAULT_FOVY_DEG, DEFAULT_ZFAR, DEFAULT_ZNEAR};

/// Simple right-handed camera description with perspective projection.
#[derive(Clone, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fovy_radians: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub fn new(eye: Vec3, target: Vec3, fovy_deg: f32, aspect: f32) -> Self {
        Self {
            eye,
            target,
            up: Vec3::Y,
            aspect: sane_aspect(aspect),
            fovy_radians: fovy_deg.to_radians(),
            znear: DEFAULT_ZNEAR,
            zfar: DEFAULT_ZFAR,
        }
    }

    /// Compute the clip-space projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy_radians, self.aspect, self.znear, self.zfar)
    }

    /// Compute the view matrix that transforms world to view space.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Unit vector the camera is looking along.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize_or_zero()
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = sane_aspect(aspect);
    }

    /// World-space ray through normalized device coordinates (`[-1, 1]`, +y up).
    ///
    /// Returns `(origin, direction)`; the origin is the eye so hits behind the
    /// camera can be rejected with a simple `t >= 0` test.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> (Vec3, Vec3) {
        let inv = self.view_projection().inverse();
        let p_far = inv * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
        let far: Vec3 = p_far.truncate() / p_far.w;
        let dir = (far - self.eye).normalize_or_zero();
        (self.eye, dir)
    }

    /// Project a world point to pixel coordinates in a `viewport` of the given
    /// size (origin top-left). `None` when the point is behind the camera.
    pub fn project_to_screen(&self, world: Vec3, viewport: Vec2) -> Option<Vec2> {
        let clip = self.view_projection() * world.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(ndc_to_pixels(Vec2::new(ndc.x, ndc.y), viewport))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 80.0), Vec3::ZERO, DEFAULT_FOVY_DEG, 16.0 / 9.0)
    }
}

#[inline]
pub fn ndc_to_pixels(ndc: Vec2, viewport: Vec2) -> Vec2 {
    Vec2::new(
        (ndc.x + 1.0) * 0.5 * viewport.x,
        (1.0 - ndc.y) * 0.5 * viewport.y,
    )
}

#[inline]
fn sane_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    }
}

/// Eye position plus look-at target, published to the renderer each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub eye: Vec3,
    pub target: Vec3,
}

/// Eases the camera eye toward a moving goal by a fixed fraction per frame.
///
/// The look-at target is applied directly (scenes compute it from smoothed
/// quantities already), matching how the pages call `lookAt` every frame.
#[derive(Clone, Debug)]
pub struct CameraRig {
    pub camera: Camera,
    follow: f32,
}

impl CameraRig {
    pub fn new(camera: Camera, follow: f32) -> Self {
        Self {
            camera,
            follow: follow.clamp(0.0, 1.0),
        }
    }

    pub fn steer(&mut self, goal_eye: Vec3, look_at: Vec3) {
        self.camera.eye = self.camera.eye.lerp(goal_eye, self.follow);
        self.camera.target = look_at;
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            eye: self.camera.eye,
            target: self.camera.target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_ray_points_at_target() {
        let cam = Camera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, 60.0, 1.0);
        let (origin, dir) = cam.ray_from_ndc(Vec2::ZERO);
        assert_eq!(origin, cam.eye);
        assert!((dir - Vec3::NEG_Z).length() < 1e-4, "dir = {dir:?}");
    }

    #[test]
    fn target_projects_to_viewport_center() {
        let cam = Camera::new(Vec3::new(3.0, 4.0, 20.0), Vec3::new(3.0, 4.0, 0.0), 50.0, 2.0);
        let px = cam
            .project_to_screen(Vec3::new(3.0, 4.0, 0.0), Vec2::new(800.0, 400.0))
            .unwrap();
        assert!((px - Vec2::new(400.0, 200.0)).length() < 1e-2, "px = {px:?}");
    }

    #[test]
    fn points_behind_camera_do_not_project() {
        let cam = Camera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, 60.0, 1.0);
        assert!(cam
            .project_to_screen(Vec3::new(0.0, 0.0, 30.0), Vec2::new(100.0, 100.0))
            .is_none());
    }

    #[test]
    fn rig_moves_a_fraction_toward_goal() {
        let mut rig = CameraRig::new(Camera::default(), 0.5);
        rig.camera.eye = Vec3::ZERO;
        rig.steer(Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO);
        assert!((rig.pose().eye.x - 5.0).abs() < 1e-6);
    }
}
