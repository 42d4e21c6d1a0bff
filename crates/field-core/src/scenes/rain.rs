//! Falling data streams that swing into a horizontal pipeline as the page
//! scrolls, parting around the pointer.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};
use rand::prelude::*;

use super::sub_seed;
use crate::error::ConstructionError;
use crate::field::{Anchor, Boundary, FieldParams, Flow, ParticleField, Repulsion, Source};
use crate::pointer::ProjectionPlane;
use crate::render::{Layer, RenderSink, Style};
use crate::scene::{ContextParams, FrameSnapshot, Scene, SceneContext};
use crate::scroll::smoothstep;

// Half-height of the visible world at z = 0 for the starting camera.
const WORLD_H: f32 = 46.0;
const STREAMS: usize = 120;
const PER_STREAM: usize = 55;
const STREAM_SPEED_MIN: f32 = 0.06;
const STREAM_SPEED_SPAN: f32 = 0.14;
const STREAM_DEPTH: f32 = 60.0;
const REPULSE_RADIUS: f32 = 14.0;
const REPULSE_STRENGTH: f32 = 22.0 / 60.0;
const WRAP_MARGIN: f32 = 1.2; // recycle just outside the visible area
const RESPAWN_SPREAD: f32 = 1.1;

const DUST: usize = 4000;
const DUST_DRIFT: f32 = 0.012;
const DUST_JITTER: f32 = 0.005;

const RING_OUTER: usize = 280;
const RING_INNER: usize = 140;

const CAM_Z_FROM: f32 = 80.0;
const CAM_Z_TO: f32 = 55.0;
const CAM_TILT_TO: f32 = -8.0;

pub struct RainScene {
    ctx: SceneContext,
    world: Vec2,
    streams: ParticleField,
    dust: ParticleField,
    ring_outer: Vec<Vec3>,
    ring_inner: Vec<Vec3>,
    ring_opacity: f32,
    stream_colors: Vec<f32>,
}

impl RainScene {
    pub fn new(seed: u64, aspect: f32) -> Result<Self, ConstructionError> {
        let ctx = SceneContext::new(
            ContextParams {
                scroll_k: 0.035,
                pointer_lag_k: 0.06,
                camera_follow: 0.04,
                fovy_deg: 60.0,
            },
            Vec3::new(0.0, 0.0, CAM_Z_FROM),
            aspect,
        )?;
        let world = Vec2::new(WORLD_H * ctx.camera().aspect, WORLD_H);
        let gravity = Flow {
            from: Vec3::NEG_Y,
            to: Vec3::X,
        };

        let mut rng = StdRng::seed_from_u64(sub_seed(seed, 1));
        let n = STREAMS * PER_STREAM;
        let mut rest = Vec::with_capacity(n);
        let mut speed = Vec::with_capacity(n);
        let mut size = Vec::with_capacity(n);
        let mut brightness = Vec::with_capacity(n);
        let mut phase = Vec::with_capacity(n);
        for _ in 0..STREAMS {
            let x = rng.gen_range(-1.0f32..=1.0) * world.x * RESPAWN_SPREAD;
            let z = rng.gen_range(-0.5f32..=0.5) * STREAM_DEPTH;
            let col_speed = STREAM_SPEED_MIN + rng.gen::<f32>() * STREAM_SPEED_SPAN;
            for pi in 0..PER_STREAM {
                let y = world.y * WRAP_MARGIN - (pi as f32 / PER_STREAM as f32) * world.y * 2.0 * WRAP_MARGIN;
                rest.push(Vec3::new(x, y, z));
                speed.push(col_speed * rng.gen_range(0.7f32..=1.3));
                size.push(rng.gen_range(0.18f32..=0.5));
                brightness.push(rng.gen_range(0.3f32..=1.0));
                phase.push(rng.gen_range(0.0f32..TAU));
            }
        }
        let streams = ParticleField::new(
            FieldParams {
                name: "rain.streams",
                anchor: Anchor::Drift,
                source: Source::Pointer,
                repulsion: Repulsion {
                    metric: Vec3::new(1.0, 1.0, 0.0),
                    axis_gain: Vec3::new(1.0, 1.0, 0.0),
                    ..Repulsion::new(REPULSE_RADIUS, REPULSE_STRENGTH)
                },
                spring: 1.0,
                damping: 0.5,
                flow: Some(gravity),
                boundary: Boundary::Wrap {
                    min: (-world * WRAP_MARGIN).extend(f32::NEG_INFINITY),
                    max: (world * WRAP_MARGIN).extend(f32::INFINITY),
                    scatter: (world * RESPAWN_SPREAD).extend(0.0),
                },
            },
            rest,
            sub_seed(seed, 2),
        )?
        .with_speeds(speed)?
        .with_sizes(size)?
        .with_brightness(brightness)?
        .with_phases(phase)?;

        let mut rng = StdRng::seed_from_u64(sub_seed(seed, 3));
        let dust_rest: Vec<Vec3> = (0..DUST)
            .map(|_| {
                Vec3::new(
                    rng.gen_range(-1.5f32..=1.5) * world.x,
                    rng.gen_range(-1.5f32..=1.5) * world.y,
                    rng.gen_range(-60.0f32..=60.0),
                )
            })
            .collect();
        let dust_drift: Vec<Vec3> = (0..DUST)
            .map(|_| {
                Vec3::new(
                    rng.gen_range(-0.5f32..=0.5) * DUST_JITTER,
                    rng.gen_range(-0.5f32..=0.5) * DUST_JITTER,
                    0.0,
                )
            })
            .collect();
        let dust = ParticleField::new(
            FieldParams {
                name: "rain.dust",
                anchor: Anchor::Drift,
                source: Source::None,
                spring: 1.0,
                damping: 0.5,
                flow: Some(gravity),
                boundary: Boundary::Wrap {
                    min: (-world * 2.0).extend(f32::NEG_INFINITY),
                    max: (world * 2.0).extend(f32::INFINITY),
                    scatter: Vec3::ZERO,
                },
                ..FieldParams::default()
            },
            dust_rest,
            sub_seed(seed, 4),
        )?
        .with_drift(dust_drift)?
        .with_speeds(vec![DUST_DRIFT; DUST])?;

        log::info!(
            "[rain] {} stream particles, {} dust, world {:.1}x{:.1}",
            streams.len(),
            dust.len(),
            world.x,
            world.y
        );
        Ok(Self {
            ctx,
            world,
            stream_colors: vec![0.0; streams.len() * 3],
            streams,
            dust,
            ring_outer: vec![Vec3::ZERO; RING_OUTER],
            ring_inner: vec![Vec3::ZERO; RING_INNER],
            ring_opacity: 0.0,
        })
    }

    fn shimmer(&mut self, time: f32) {
        let s = &self.streams;
        for (i, rgb) in self.stream_colors.chunks_exact_mut(3).enumerate() {
            let wave = 0.5 + 0.5 * (time * 4.0 + s.phases()[i]).sin();
            let b = (s.brightness()[i] * wave + s.velocities()[i].length() * 0.4).min(1.0);
            rgb.fill(b);
        }
    }

    fn spin_rings(&mut self, time: f32) {
        let pulse = 1.0 + 0.12 * (time * 3.5).sin();
        for (i, p) in self.ring_outer.iter_mut().enumerate() {
            let a = i as f32 / RING_OUTER as f32 * TAU + time * 0.25;
            *p = Vec3::new(a.cos(), a.sin(), 0.0) * 12.0 * pulse;
        }
        for (i, p) in self.ring_inner.iter_mut().enumerate() {
            let a = i as f32 / RING_INNER as f32 * TAU - time * 0.6;
            let r = 5.0 * (1.0 + 0.08 * (time * 5.0 + i as f32).sin());
            *p = Vec3::new(a.cos(), a.sin(), 0.0) * r;
        }
    }

    pub fn streams(&self) -> &ParticleField {
        &self.streams
    }

    pub fn dust(&self) -> &ParticleField {
        &self.dust
    }

    /// Half-extent of the visible world at z = 0.
    pub fn world(&self) -> Vec2 {
        self.world
    }

    pub fn ring_opacity(&self) -> f32 {
        self.ring_opacity
    }
}

impl Scene for RainScene {
    fn name(&self) -> &'static str {
        "rain"
    }

    fn context(&self) -> &SceneContext {
        &self.ctx
    }

    fn context_mut(&mut self) -> &mut SceneContext {
        &mut self.ctx
    }

    fn pointer_plane(&self) -> Option<ProjectionPlane> {
        Some(ProjectionPlane::SCREEN)
    }

    fn update(&mut self, frame: &FrameSnapshot) {
        self.streams.step(frame);
        self.dust.step(frame);
        self.shimmer(frame.time);

        self.ring_opacity = smoothstep(frame.progress, 0.18, 0.55);
        self.spin_rings(frame.time);

        let s = frame.progress;
        let cam_z = CAM_Z_FROM + (CAM_Z_TO - CAM_Z_FROM) * s;
        let tilt = CAM_TILT_TO * s;
        let lag = frame.pointer_lag;
        self.ctx.rig.steer(
            Vec3::new(lag.x * 3.0, lag.y * 2.0 + tilt, cam_z),
            Vec3::new(0.0, tilt * 0.4, 0.0),
        );
    }

    fn publish(&self, sink: &mut dyn RenderSink) {
        let pos = self.streams.positions_flat();
        sink.layer(
            Layer::new("rain.streams", Style::points(0.35, 1.0), pos)
                .colors(&self.stream_colors)
                .sizes(self.streams.sizes()),
        );
        sink.layer(
            Layer::new("rain.streams.glow", Style::points(1.1, 0.18), pos).colors(&self.stream_colors),
        );
        sink.points("rain.dust", self.dust.positions_flat(), None, Style::points(0.18, 0.12));
        sink.points(
            "rain.ring.outer",
            bytemuck::cast_slice(&self.ring_outer),
            None,
            Style::points(0.5, self.ring_opacity * 0.7),
        );
        sink.points(
            "rain.ring.inner",
            bytemuck::cast_slice(&self.ring_inner),
            None,
            Style::points(0.7, self.ring_opacity * 0.55),
        );
    }
}
