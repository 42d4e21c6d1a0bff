//! A layered neural network seen from an orbiting camera, with signal pulses
//! firing through it on their own and wherever the pointer hovers.

use std::f32::consts::PI;

use glam::Vec3;

use super::{shell_dust, sub_seed};
use crate::error::ConstructionError;
use crate::field::ParticleField;
use crate::graph::Graph;
use crate::pointer::ProjectionPlane;
use crate::pulse::{PulseGraph, PulseParams};
use crate::render::{RenderSink, Style};
use crate::scene::{ContextParams, FrameSnapshot, Scene, SceneContext};

/// `(rows, cols)` per layer, input on the left.
pub const LAYERS: [(u32, u32); 6] = [(2, 2), (3, 3), (4, 4), (4, 4), (3, 3), (2, 2)];
const LAYER_GAP: f32 = 22.0;
const NODE_GAP: f32 = 10.0;

const IDLE_GROUP: u32 = 0;
const IDLE_INTERVAL: f32 = 0.5;
const IDLE_EXCITE: f32 = 0.6;
const IDLE_SPEED: f32 = 0.008;

const DUST_INNER: f32 = 0.4;
const DUST_NEAR: (usize, f32, f32) = (7000, 110.0, 0.008);
const DUST_FAR: (usize, f32, f32) = (1800, 160.0, 0.004);

const ORBIT_RADIUS: f32 = 100.0;
const ORBIT_SHRINK: f32 = 55.0;
const ORBIT_HEIGHT: f32 = 28.0;
const ORBIT_RISE: f32 = 20.0;

pub struct NetworkScene {
    ctx: SceneContext,
    pulses: PulseGraph,
    dust_near: ParticleField,
    dust_far: ParticleField,
    segments: Vec<f32>,
}

impl NetworkScene {
    pub fn new(seed: u64, aspect: f32) -> Result<Self, ConstructionError> {
        let ctx = SceneContext::new(
            ContextParams {
                scroll_k: 0.04,
                pointer_lag_k: 0.04,
                camera_follow: 0.03,
                fovy_deg: 52.0,
            },
            Vec3::new(-10.0, ORBIT_HEIGHT, ORBIT_RADIUS),
            aspect,
        )?;

        let graph = Graph::layered(&LAYERS, LAYER_GAP, NODE_GAP, NODE_GAP)?;
        let segments = graph.segments_flat();
        let pulses = PulseGraph::new(graph, PulseParams::default(), sub_seed(seed, 1))?
            .with_idle_emitter(IDLE_GROUP, IDLE_INTERVAL, IDLE_EXCITE, IDLE_SPEED)?;

        let (n, r, v) = DUST_NEAR;
        let dust_near = shell_dust(
            "network.dust.near",
            n,
            DUST_INNER,
            r,
            Vec3::splat(v),
            sub_seed(seed, 2),
        )?;
        let (n, r, v) = DUST_FAR;
        let dust_far = shell_dust(
            "network.dust.far",
            n,
            DUST_INNER,
            r,
            Vec3::splat(v),
            sub_seed(seed, 3),
        )?;

        log::info!(
            "[network] {} nodes, {} edges",
            pulses.graph().node_count(),
            pulses.graph().edge_count()
        );
        Ok(Self {
            ctx,
            pulses,
            dust_near,
            dust_far,
            segments,
        })
    }

    pub fn pulses(&self) -> &PulseGraph {
        &self.pulses
    }

    pub fn pulses_mut(&mut self) -> &mut PulseGraph {
        &mut self.pulses
    }

    pub fn dust(&self) -> [&ParticleField; 2] {
        [&self.dust_near, &self.dust_far]
    }
}

impl Scene for NetworkScene {
    fn name(&self) -> &'static str {
        "network"
    }

    fn context(&self) -> &SceneContext {
        &self.ctx
    }

    fn context_mut(&mut self) -> &mut SceneContext {
        &mut self.ctx
    }

    // nodes are picked in screen space, no world plane needed
    fn pointer_plane(&self) -> Option<ProjectionPlane> {
        None
    }

    fn update(&mut self, frame: &FrameSnapshot) {
        self.dust_near.step(frame);
        self.dust_far.step(frame);

        self.pulses.probe(self.ctx.camera(), frame);
        self.pulses.step(frame);

        let s = frame.progress;
        let angle = s * PI;
        let radius = ORBIT_RADIUS - s * ORBIT_SHRINK;
        let lag = frame.pointer_lag;
        let eye = Vec3::new(
            angle.sin() * radius + lag.x * 2.0,
            ORBIT_HEIGHT + s * ORBIT_RISE + lag.y * 1.4,
            angle.cos() * radius,
        );
        self.ctx.rig.steer(eye, Vec3::ZERO);
    }

    fn publish(&self, sink: &mut dyn RenderSink) {
        let pg = &self.pulses;
        sink.lines("network.edges", &self.segments, pg.edge_colors(), Style::lines(1.0));

        let nodes: &[f32] = bytemuck::cast_slice(pg.graph().positions());
        let node_colors = Some(pg.node_colors());
        sink.points("network.nodes", nodes, node_colors, Style::points(2.5, 1.0));
        sink.points("network.nodes.glow", nodes, node_colors, Style::points(7.0, 0.18));
        sink.points("network.nodes.halo", nodes, node_colors, Style::points(16.0, 0.05));

        let pulses = pg.pulse_positions_flat();
        let pulse_colors = Some(pg.pulse_colors_flat());
        sink.points("network.pulses", pulses, pulse_colors, Style::points(1.6, 1.0));
        sink.points("network.pulses.glow", pulses, pulse_colors, Style::points(4.5, 0.25));

        sink.points(
            "network.dust.near",
            self.dust_near.positions_flat(),
            None,
            Style::points(0.28, 0.55),
        );
        sink.points(
            "network.dust.far",
            self.dust_far.positions_flat(),
            None,
            Style::points(0.65, 0.18),
        );
    }

    fn shutdown(&mut self) {
        self.pulses.shutdown();
        self.ctx.shutdown();
    }
}
