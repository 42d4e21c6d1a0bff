//! Pointer-to-world projection.
//!
//! Input capture hands over normalized screen coordinates; the projector turns
//! them into a world point by intersecting the camera ray with a plane chosen
//! per call, and keeps a lagged copy of the screen position for camera drift.

use glam::{Affine3A, Vec2, Vec3};

use crate::camera::Camera;
use crate::error::{check_upper_closed, ConstructionError};

const PARALLEL_EPSILON: f32 = 1e-6;

/// Plane the pointer ray is intersected with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProjectionPlane {
    /// World-horizontal plane (normal +Y) at the given height.
    Horizontal { height: f32 },
    /// Plane facing the camera, passing through a moving anchor point.
    CameraFacing { anchor: Vec3 },
    /// Arbitrary fixed plane.
    Fixed { normal: Vec3, point: Vec3 },
}

impl ProjectionPlane {
    /// The z = 0 plane, facing a camera on the +z axis.
    pub const SCREEN: ProjectionPlane = ProjectionPlane::Fixed {
        normal: Vec3::Z,
        point: Vec3::ZERO,
    };

    fn resolve(&self, camera: &Camera) -> (Vec3, Vec3) {
        match *self {
            ProjectionPlane::Horizontal { height } => (Vec3::Y, Vec3::new(0.0, height, 0.0)),
            ProjectionPlane::CameraFacing { anchor } => (-camera.forward(), anchor),
            ProjectionPlane::Fixed { normal, point } => (normal.normalize_or_zero(), point),
        }
    }
}

/// Ray/plane intersection. `None` when the ray is parallel to the plane or the
/// hit lies behind the ray origin.
#[inline]
pub fn ray_plane(origin: Vec3, dir: Vec3, normal: Vec3, point: Vec3) -> Option<Vec3> {
    let denom = normal.dot(dir);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }
    let t = normal.dot(point - origin) / denom;
    (t >= 0.0).then(|| origin + dir * t)
}

/// Pointer state owned by one scene.
#[derive(Clone, Debug, Default)]
pub struct PointerState {
    /// Latest normalized screen position, `[-1, 1]` on both axes, +y up.
    pub screen: Vec2,
    /// Last successful world projection.
    pub world: Option<Vec3>,
    /// Exponentially smoothed screen position.
    pub lag: Vec2,
}

#[derive(Clone, Debug)]
pub struct PointerProjector {
    state: PointerState,
    lag_k: f32,
    misses: u64,
}

impl PointerProjector {
    pub fn new(lag_k: f32) -> Result<Self, ConstructionError> {
        check_upper_closed("pointer.lag_k", lag_k, 0.0, 1.0, "(0, 1]")?;
        Ok(Self {
            state: PointerState::default(),
            lag_k,
            misses: 0,
        })
    }

    pub fn set_screen(&mut self, ndc: Vec2) {
        if ndc.is_finite() {
            self.state.screen = ndc.clamp(Vec2::NEG_ONE, Vec2::ONE);
        }
    }

    /// Advance the lag filter by one frame.
    pub fn tick_lag(&mut self) -> Vec2 {
        self.state.lag += (self.state.screen - self.state.lag) * self.lag_k;
        self.state.lag
    }

    /// Intersect the current pointer ray with `plane` without touching the
    /// cached world point.
    pub fn cast(&self, camera: &Camera, plane: ProjectionPlane) -> Option<Vec3> {
        let (origin, dir) = camera.ray_from_ndc(self.state.screen);
        let (normal, point) = plane.resolve(camera);
        ray_plane(origin, dir, normal, point)
    }

    /// Project the current screen position onto `plane`.
    ///
    /// On a miss the previous world point is kept and returned unchanged; it
    /// is `None` only if no projection has ever succeeded.
    pub fn project(&mut self, camera: &Camera, plane: ProjectionPlane) -> Option<Vec3> {
        match self.cast(camera, plane) {
            Some(hit) => self.state.world = Some(hit),
            None => {
                self.misses += 1;
                log::trace!("pointer ray missed {:?}; keeping previous hit", plane);
            }
        }
        self.state.world
    }

    /// Pointer hit on `plane`, expressed in the local space of `to_world`.
    pub fn to_local(
        &self,
        camera: &Camera,
        plane: ProjectionPlane,
        to_world: &Affine3A,
    ) -> Option<Vec3> {
        self.cast(camera, plane)
            .map(|w| to_world.inverse().transform_point3(w))
    }

    #[inline]
    pub fn state(&self) -> &PointerState {
        &self.state
    }

    /// Number of projections that fell back to the previous value.
    #[inline]
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallel_ray_misses() {
        assert!(ray_plane(Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::ZERO).is_none());
    }

    #[test]
    fn plane_behind_origin_misses() {
        let hit = ray_plane(Vec3::new(0.0, 5.0, 0.0), Vec3::Y, Vec3::Y, Vec3::ZERO);
        assert!(hit.is_none());
    }

    #[test]
    fn center_pointer_hits_screen_plane_at_origin() {
        let cam = Camera::new(Vec3::new(0.0, 0.0, 80.0), Vec3::ZERO, 60.0, 1.5);
        let mut p = PointerProjector::new(0.06).unwrap();
        let hit = p.project(&cam, ProjectionPlane::SCREEN).unwrap();
        assert!(hit.length() < 1e-3, "hit = {hit:?}");
    }

    #[test]
    fn miss_keeps_previous_world_point() {
        let cam = Camera::new(Vec3::new(0.0, 0.0, 80.0), Vec3::ZERO, 60.0, 1.5);
        let mut p = PointerProjector::new(0.06).unwrap();
        let first = p.project(&cam, ProjectionPlane::SCREEN);
        // camera looks along -z, a horizontal plane above the eye is never hit
        // by the center ray
        let second = p.project(&cam, ProjectionPlane::Horizontal { height: 100.0 });
        assert_eq!(first, second);
        assert_eq!(p.misses(), 1);
    }

    #[test]
    fn local_hit_undoes_the_object_transform() {
        let cam = Camera::new(Vec3::new(0.0, 0.0, 80.0), Vec3::ZERO, 60.0, 1.5);
        let p = PointerProjector::new(0.06).unwrap();
        let to_world = Affine3A::from_translation(Vec3::new(5.0, 0.0, 0.0));
        let local = p
            .to_local(&cam, ProjectionPlane::SCREEN, &to_world)
            .unwrap();
        assert!((local - Vec3::new(-5.0, 0.0, 0.0)).length() < 1e-3);
        assert!(p.state().world.is_none());
    }

    #[test]
    fn lag_trails_the_pointer() {
        let mut p = PointerProjector::new(0.5).unwrap();
        p.set_screen(Vec2::new(1.0, -1.0));
        let lag = p.tick_lag();
        assert_eq!(lag, Vec2::new(0.5, -0.5));
    }
}
