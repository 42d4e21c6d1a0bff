//! A particle car driving a winding mountain road, one scroll length long.
//!
//! Road surface and terrain are rest-anchored clouds pushed aside by the
//! pointer where it meets the ground plane under the car. The car body is a
//! cloud in car-local space, dented by the pointer projected onto a plane
//! facing the camera through the car.

use std::f32::consts::PI;

use glam::{Affine3A, Mat3, Quat, Vec3};
use rand::prelude::*;

use super::sub_seed;
use crate::error::ConstructionError;
use crate::field::{FieldParams, ParticleField, Repulsion, Source};
use crate::geometry::{
    cloud_or_procedural, CatmullRom, GeometrySource, Path, PointCloud, CAR_BODY, CAR_WHEEL,
};
use crate::pointer::ProjectionPlane;
use crate::render::{Layer, RenderSink, Style};
use crate::scene::{ContextParams, FrameSnapshot, Scene, SceneContext};

const ROAD_CONTROL_POINTS: [[f32; 3]; 17] = [
    [0.0, 0.0, 0.0],
    [10.0, 1.0, -40.0],
    [30.0, 4.0, -80.0],
    [20.0, 7.0, -120.0],
    [-10.0, 10.0, -160.0],
    [-35.0, 13.0, -195.0],
    [-40.0, 17.0, -235.0],
    [-20.0, 22.0, -275.0],
    [15.0, 26.0, -310.0],
    [40.0, 30.0, -345.0],
    [45.0, 35.0, -385.0],
    [20.0, 40.0, -425.0],
    [-15.0, 44.0, -460.0],
    [-40.0, 48.0, -495.0],
    [-35.0, 52.0, -535.0],
    [0.0, 56.0, -570.0],
    [30.0, 60.0, -600.0],
];

const ROAD_PARTICLES: usize = 12_000;
const ROAD_WIDTH: f32 = 5.5;
const TERRAIN_PARTICLES: usize = 60_000;
const STARS: usize = 3000;

const GROUND_REPULSE_RADIUS: f32 = 8.0;
const GROUND_REPULSE_STRENGTH: f32 = 1.2;
const GROUND_SPRING: f32 = 0.10;
const GROUND_DAMPING: f32 = 0.75;
const GROUND_Y_GAIN: f32 = 0.3; // keep the ground from bulging upward

const CAR_REPULSE_RADIUS: f32 = 1.2;
const CAR_REPULSE_STRENGTH: f32 = 0.25;
const CAR_SPRING: f32 = 0.08;
const CAR_DAMPING: f32 = 0.80;

const PATH_END: f32 = 0.9999;
const LOOK_AHEAD_T: f32 = 0.002;
const SWAY_GAIN: f32 = 0.04;
const SWAY_FOLLOW: f32 = 0.06;
const PATH_LENGTH_APPROX: f32 = 620.0; // world units per unit of progress
const WHEEL_RADIUS: f32 = 0.38;

const CAM_DISTANCE: f32 = 9.0;
const CAM_ANGLE_DEG: f32 = 40.0;
const CAM_HEIGHT: f32 = 2.8;
const CAM_LOOK_AHEAD: f32 = 3.0;

const WHEEL_LAYERS: [&str; 4] = [
    "road.car.wheel.0",
    "road.car.wheel.1",
    "road.car.wheel.2",
    "road.car.wheel.3",
];

#[derive(Clone, Copy, Debug)]
struct WheelMount {
    centre: Vec3,
    /// Spin sign: left and right wheels turn opposite ways about local X.
    flip: f32,
}

/// Where the car is and how it sits on the road this frame.
#[derive(Clone, Copy, Debug)]
pub struct CarPose {
    pub position: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
    pub rotation: Quat,
    pub sway: f32,
    pub wheel_angle: f32,
    last_t: f32,
}

impl CarPose {
    pub fn transform(&self) -> Affine3A {
        Affine3A::from_rotation_translation(self.rotation, self.position)
    }

    fn advance(&mut self, path: &dyn Path, t: f32) {
        let tc = t.min(PATH_END);
        let pos = path.point(tc);
        let ahead = path.point((tc + LOOK_AHEAD_T).min(PATH_END));
        let forward = (ahead - pos).try_normalize().unwrap_or(self.forward);
        let right = forward.cross(Vec3::Y).try_normalize().unwrap_or(Vec3::X);

        // local -Z faces along the road
        let z = -forward;
        let x = Vec3::Y.cross(z).try_normalize().unwrap_or(Vec3::X);
        let y = z.cross(x);
        let look = Quat::from_mat3(&Mat3::from_cols(x, y, z));

        self.sway += (forward.x * SWAY_GAIN - self.sway) * SWAY_FOLLOW;
        self.wheel_angle += (t - self.last_t) * PATH_LENGTH_APPROX / WHEEL_RADIUS;
        self.last_t = t;

        self.position = pos;
        self.forward = forward;
        self.right = right;
        self.rotation = look * Quat::from_rotation_z(-self.sway);
    }
}

pub struct RoadScene {
    ctx: SceneContext,
    path: CatmullRom,
    road: ParticleField,
    terrain: ParticleField,
    body: ParticleField,
    wheel: PointCloud,
    wheels: [WheelMount; 4],
    stars: Vec<Vec3>,
    car: CarPose,
}

impl RoadScene {
    pub fn new(seed: u64, aspect: f32, geometry: &dyn GeometrySource) -> Result<Self, ConstructionError> {
        let path = CatmullRom::new(ROAD_CONTROL_POINTS.iter().map(|p| Vec3::from(*p)).collect(), 0.5)?;

        let mut car = CarPose {
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            rotation: Quat::IDENTITY,
            sway: 0.0,
            wheel_angle: 0.0,
            last_t: 0.0,
        };
        car.advance(&path, 0.0);

        let ctx = SceneContext::new(
            ContextParams {
                scroll_k: 0.06,
                pointer_lag_k: 0.05,
                camera_follow: 0.07,
                fovy_deg: 55.0,
            },
            chase_eye(&car, glam::Vec2::ZERO, 0.0),
            aspect,
        )?;

        let ground = |name: &'static str, strength: f32| FieldParams {
            name,
            source: Source::Pointer,
            repulsion: Repulsion {
                axis_gain: Vec3::new(1.0, GROUND_Y_GAIN, 1.0),
                ..Repulsion::new(GROUND_REPULSE_RADIUS, strength)
            },
            spring: GROUND_SPRING,
            damping: GROUND_DAMPING,
            ..FieldParams::default()
        };

        let (rest, colors) = road_surface(&path, sub_seed(seed, 1));
        let road = ParticleField::new(ground("road.surface", GROUND_REPULSE_STRENGTH), rest, seed)?
            .with_colors(colors)?;

        let (rest, colors) = terrain(&path, sub_seed(seed, 2));
        let terrain = ParticleField::new(ground("road.terrain", GROUND_REPULSE_STRENGTH * 0.5), rest, seed)?
            .with_colors(colors)?;

        let body_cloud = cloud_or_procedural(geometry, CAR_BODY, sub_seed(seed, 3))
            .filter(|c| !c.is_empty())
            .ok_or(ConstructionError::EmptyField { name: "road.car.body" })?;
        let body = ParticleField::new(
            FieldParams {
                name: "road.car.body",
                source: Source::None,
                repulsion: Repulsion::new(CAR_REPULSE_RADIUS, CAR_REPULSE_STRENGTH),
                spring: CAR_SPRING,
                damping: CAR_DAMPING,
                ..FieldParams::default()
            },
            body_cloud.positions,
            seed,
        )?
        .with_colors(body_cloud.colors)?;

        let wheel = cloud_or_procedural(geometry, CAR_WHEEL, sub_seed(seed, 4)).unwrap_or_default();
        let wheels = [
            (-0.8, -1.0),
            (0.8, -1.0),
            (-0.8, 1.0),
            (0.8, 1.0),
        ]
        .map(|(x, z)| WheelMount {
            centre: Vec3::new(x, WHEEL_RADIUS, z),
            flip: if x < 0.0 { -1.0 } else { 1.0 },
        });

        let mut rng = StdRng::seed_from_u64(sub_seed(seed, 5));
        let stars = (0..STARS)
            .map(|_| {
                Vec3::new(
                    rng.gen_range(-300.0f32..=300.0),
                    rng.gen_range(20.0f32..=220.0),
                    rng.gen_range(-300.0f32..=300.0),
                )
            })
            .collect();

        log::info!(
            "[road] {} road, {} terrain, {} body particles",
            road.len(),
            terrain.len(),
            body.len()
        );
        Ok(Self {
            ctx,
            path,
            road,
            terrain,
            body,
            wheel,
            wheels,
            stars,
            car,
        })
    }

    pub fn car(&self) -> &CarPose {
        &self.car
    }

    pub fn road(&self) -> &ParticleField {
        &self.road
    }

    pub fn terrain(&self) -> &ParticleField {
        &self.terrain
    }

    pub fn body(&self) -> &ParticleField {
        &self.body
    }

    pub fn path(&self) -> &dyn Path {
        &self.path
    }
}

/// Chase-camera goal: behind and to the right of the car, nudged by the
/// lagged pointer.
fn chase_eye(car: &CarPose, lag: glam::Vec2, t: f32) -> Vec3 {
    let angle = CAM_ANGLE_DEG.to_radians();
    let drift = (t * PI * 3.0).sin() * 0.05;
    let dir = (car.forward * -angle.cos() + car.right * (angle.sin() + drift)).normalize_or_zero();
    car.position
        + dir * CAM_DISTANCE
        + Vec3::new(
            car.right.x * lag.x * 0.4,
            CAM_HEIGHT + lag.y * 0.3,
            car.right.z * lag.x * 0.4,
        )
}

fn road_surface(path: &dyn Path, seed: u64) -> (Vec<Vec3>, Vec<Vec3>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rest = Vec::with_capacity(ROAD_PARTICLES);
    let mut colors = Vec::with_capacity(ROAD_PARTICLES);
    for i in 0..ROAD_PARTICLES {
        let t = i as f32 / ROAD_PARTICLES as f32;
        let pt = path.point(t);
        let tan = path.tangent(t);
        let perp = Vec3::new(-tan.z, 0.0, tan.x).normalize_or_zero();
        let spread = rng.gen_range(-0.5f32..=0.5) * ROAD_WIDTH;
        let mut p = pt + perp * spread;
        p.y = pt.y - 0.18 + rng.gen_range(-0.125f32..=0.125);
        rest.push(p);
        // centre line stands out
        let b = if spread.abs() < 0.3 {
            0.55
        } else {
            0.18 + rng.gen::<f32>() * 0.12
        };
        colors.push(Vec3::splat(b * 0.7));
    }
    (rest, colors)
}

fn terrain(path: &dyn Path, seed: u64) -> (Vec<Vec3>, Vec<Vec3>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rest = Vec::with_capacity(TERRAIN_PARTICLES);
    let mut colors = Vec::with_capacity(TERRAIN_PARTICLES);
    for _ in 0..TERRAIN_PARTICLES {
        let pt = path.point(rng.gen());
        let rx = rng.gen_range(-80.0f32..=80.0);
        let rz = rng.gen_range(-20.0f32..=20.0);
        let x = pt.x + rx;
        let z = pt.z + rz;
        let bump = (x * 0.08).sin() * 8.0
            + (z * 0.12).cos() * 6.0
            + (x * 0.03 + z * 0.04).sin() * 15.0
            + rng.gen_range(-1.5f32..=1.5);
        let y = pt.y - 0.5 + bump * (rx.abs() / 80.0);
        rest.push(Vec3::new(x, y, z));
        let rel = ((y - pt.y + 20.0) / 45.0).clamp(0.0, 1.0);
        colors.push(Vec3::splat(0.08 + (0.55 - 0.08) * rel));
    }
    (rest, colors)
}

impl Scene for RoadScene {
    fn name(&self) -> &'static str {
        "road"
    }

    fn context(&self) -> &SceneContext {
        &self.ctx
    }

    fn context_mut(&mut self) -> &mut SceneContext {
        &mut self.ctx
    }

    fn pointer_plane(&self) -> Option<ProjectionPlane> {
        Some(ProjectionPlane::Horizontal {
            height: self.car.position.y,
        })
    }

    fn update(&mut self, frame: &FrameSnapshot) {
        self.car.advance(&self.path, frame.progress);

        self.road.step(frame);
        self.terrain.step(frame);

        let to_world = self.car.transform();
        let local = self.ctx.pointer.to_local(
            self.ctx.camera(),
            ProjectionPlane::CameraFacing {
                anchor: self.car.position,
            },
            &to_world,
        );
        self.body.set_source(local.map_or(Source::None, Source::Point));
        self.body.step(frame);

        let eye = chase_eye(&self.car, frame.pointer_lag, frame.progress);
        let look = self.car.position + self.car.forward * CAM_LOOK_AHEAD + Vec3::Y * 0.6;
        self.ctx.rig.steer(eye, look);
    }

    fn publish(&self, sink: &mut dyn RenderSink) {
        sink.points(
            "road.surface",
            self.road.positions_flat(),
            Some(self.road.colors_flat()),
            Style::points(0.18, 0.7),
        );
        sink.points(
            "road.terrain",
            self.terrain.positions_flat(),
            Some(self.terrain.colors_flat()),
            Style::points(0.22, 0.65),
        );
        sink.points(
            "road.stars",
            bytemuck::cast_slice(&self.stars),
            None,
            Style::points(0.25, 0.6),
        );

        let car = self.car.transform();
        sink.layer(
            Layer::new("road.car.body", Style::points(0.045, 0.85), self.body.positions_flat())
                .colors(self.body.colors_flat())
                .transform(car),
        );
        for (&name, mount) in WHEEL_LAYERS.iter().zip(&self.wheels) {
            let spin = Quat::from_rotation_x(self.car.wheel_angle * mount.flip);
            sink.layer(
                Layer::new(name, Style::points(0.045, 0.85), bytemuck::cast_slice(&self.wheel.positions))
                    .colors(bytemuck::cast_slice(&self.wheel.colors))
                    .transform(car * Affine3A::from_rotation_translation(spin, mount.centre)),
            );
        }
    }
}
