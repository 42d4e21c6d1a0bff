//! A city grid seen from above. Vehicles wander the streets, light up the
//! intersections they pass and flash when they come close to each other.

use std::f32::consts::PI;

use glam::Vec3;

use super::{shell_dust, sub_seed};
use crate::error::ConstructionError;
use crate::field::ParticleField;
use crate::graph::Graph;
use crate::pointer::ProjectionPlane;
use crate::render::{RenderSink, Style};
use crate::router::{AgentRouter, RouterParams};
use crate::scene::{ContextParams, FrameSnapshot, Scene, SceneContext};

pub const GRID_SIZE: u32 = 11;
pub const CELL: f32 = 18.0;

/// Extra streets as `[row_a, col_a, row_b, col_b]`.
pub const DIAGONALS: [[u32; 4]; 15] = [
    [0, 0, 2, 2],
    [2, 2, 4, 0],
    [4, 0, 6, 2],
    [6, 2, 8, 0],
    [8, 0, 10, 2],
    [0, 10, 2, 8],
    [2, 8, 4, 10],
    [4, 10, 6, 8],
    [6, 8, 8, 10],
    [8, 10, 10, 8],
    [0, 5, 2, 3],
    [2, 3, 4, 5],
    [4, 5, 6, 3],
    [6, 3, 8, 5],
    [8, 5, 10, 3],
];

const DUST: usize = 6000;
const DUST_INNER: f32 = 1.0 / 3.0;
const DUST_SHELL: f32 = 300.0;
const DUST_VELOCITY: Vec3 = Vec3::new(0.025, 0.008, 0.025);

// Scroll fraction where the top-down descent hands over to the orbit.
const DESCENT_END: f32 = 0.4;

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Camera goal for a scroll fraction: straight down, then tilting to an
/// isometric view, then a 216 degree orbit that closes in on the grid.
pub fn camera_goal(progress: f32) -> Vec3 {
    let s = progress.clamp(0.0, 1.0);
    if s < DESCENT_END {
        let k = s / DESCENT_END;
        Vec3::new(lerp(0.0, 15.0, k), lerp(160.0, 80.0, k), lerp(0.01, 80.0, k))
    } else {
        let k = (s - DESCENT_END) / (1.0 - DESCENT_END);
        let angle = k * PI * 1.2;
        let radius = lerp(105.0, 48.0, k);
        Vec3::new(
            angle.sin() * radius + 15.0,
            lerp(80.0, 35.0, k),
            angle.cos() * radius,
        )
    }
}

pub struct TrafficScene {
    ctx: SceneContext,
    router: AgentRouter,
    dust: ParticleField,
    segments: Vec<f32>,
}

impl TrafficScene {
    pub fn new(seed: u64, aspect: f32) -> Result<Self, ConstructionError> {
        let ctx = SceneContext::new(
            ContextParams {
                scroll_k: 0.04,
                pointer_lag_k: 0.04,
                camera_follow: 0.035,
                fovy_deg: 50.0,
            },
            camera_goal(0.0),
            aspect,
        )?;

        let graph = Graph::grid(GRID_SIZE, CELL, &DIAGONALS)?;
        let segments = graph.segments_flat();
        let router = AgentRouter::new(graph, RouterParams::default(), sub_seed(seed, 1))?;
        let dust = shell_dust(
            "traffic.dust",
            DUST,
            DUST_INNER,
            DUST_SHELL,
            DUST_VELOCITY,
            sub_seed(seed, 2),
        )?;

        log::info!(
            "[traffic] {} intersections, {} streets, {} vehicles",
            router.graph().node_count(),
            router.graph().edge_count(),
            router.agents().len()
        );
        Ok(Self {
            ctx,
            router,
            dust,
            segments,
        })
    }

    pub fn router(&self) -> &AgentRouter {
        &self.router
    }

    pub fn dust(&self) -> &ParticleField {
        &self.dust
    }
}

impl Scene for TrafficScene {
    fn name(&self) -> &'static str {
        "traffic"
    }

    fn context(&self) -> &SceneContext {
        &self.ctx
    }

    fn context_mut(&mut self) -> &mut SceneContext {
        &mut self.ctx
    }

    fn pointer_plane(&self) -> Option<ProjectionPlane> {
        None
    }

    fn update(&mut self, frame: &FrameSnapshot) {
        self.dust.step(frame);
        self.router.step(frame);
        // the pointer does not move this camera
        self.ctx.rig.steer(camera_goal(frame.progress), Vec3::ZERO);
    }

    fn publish(&self, sink: &mut dyn RenderSink) {
        let r = &self.router;
        sink.lines("traffic.streets", &self.segments, r.edge_colors(), Style::lines(0.55));

        let nodes: &[f32] = bytemuck::cast_slice(r.graph().positions());
        let node_colors = Some(r.node_colors());
        sink.points("traffic.intersections", nodes, node_colors, Style::points(1.2, 1.0));
        sink.points("traffic.intersections.glow", nodes, node_colors, Style::points(4.0, 0.18));
        sink.points("traffic.intersections.halo", nodes, node_colors, Style::points(9.0, 0.06));

        let vehicles = r.agent_positions_flat();
        sink.points("traffic.vehicles", vehicles, None, Style::points(0.7, 1.0));
        sink.points("traffic.vehicles.glow", vehicles, None, Style::points(2.2, 0.22));

        let flashes = r.flash_positions_flat();
        let flash_colors = Some(r.flash_colors_flat());
        sink.points("traffic.flashes", flashes, flash_colors, Style::points(6.0, 0.55));
        sink.points("traffic.flashes.halo", flashes, flash_colors, Style::points(18.0, 0.12));

        sink.points("traffic.dust", self.dust.positions_flat(), None, Style::points(0.3, 0.28));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_has_every_street() {
        let scene = TrafficScene::new(1, 1.6).unwrap();
        let g = scene.router().graph();
        assert_eq!(g.node_count(), 121);
        // 2 * 11 * 10 straight streets plus the diagonals
        assert_eq!(g.edge_count(), 220 + DIAGONALS.len());
    }

    #[test]
    fn camera_only_descends_with_scroll() {
        assert_eq!(camera_goal(0.0), Vec3::new(0.0, 160.0, 0.01));
        let mut last = f32::INFINITY;
        for i in 0..=100 {
            let y = camera_goal(i as f32 / 100.0).y;
            assert!(y <= last + 1e-4, "camera rose at step {i}");
            last = y;
        }
        assert!((last - 35.0).abs() < 1e-4);
    }
}
