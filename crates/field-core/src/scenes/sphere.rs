//! Research keywords orbiting on a sphere that collapse into a single point
//! of light as the page scrolls.

use std::f32::consts::{PI, TAU};

use glam::{Quat, Vec3};
use rand::prelude::*;

use super::{shell_dust, sub_seed};
use crate::error::ConstructionError;
use crate::field::ParticleField;
use crate::pointer::ProjectionPlane;
use crate::render::{Layer, RenderSink, Style};
use crate::scene::{ContextParams, FrameSnapshot, Scene, SceneContext};
use crate::scroll::smoothstep;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyword {
    pub word: &'static str,
    /// Relative label height.
    pub size: f32,
    /// 0 sits on the outermost shell, 2 on the innermost.
    pub tier: u8,
}

const fn kw(word: &'static str, size: f32, tier: u8) -> Keyword {
    Keyword { word, size, tier }
}

pub const KEYWORDS: [Keyword; 30] = [
    kw("LLM", 1.10, 0),
    kw("SLM", 1.10, 0),
    kw("RSS", 0.90, 1),
    kw("Groq", 0.85, 1),
    kw("ADAS", 1.00, 0),
    kw("V2X", 1.00, 0),
    kw("Quantization", 0.80, 1),
    kw("arXiv", 0.75, 2),
    kw("Zotero", 0.72, 2),
    kw("NVIDIA", 0.95, 1),
    kw("Qualcomm", 0.90, 1),
    kw("Llama", 0.85, 1),
    kw("Mistral", 0.85, 1),
    kw("TinyML", 0.78, 2),
    kw("Edge AI", 0.95, 0),
    kw("NPU", 0.80, 2),
    kw("Distillation", 0.75, 2),
    kw("RAG", 0.80, 2),
    kw("Hallucination", 0.72, 2),
    kw("Cockpit", 0.78, 2),
    kw("DRIVE Thor", 0.82, 1),
    kw("Autopilot", 0.80, 2),
    kw("OEM", 0.78, 2),
    kw("INT8", 0.75, 2),
    kw("Pruning", 0.75, 2),
    kw("Physical AI", 0.88, 1),
    kw("AI Factory", 0.85, 1),
    kw("Green AI", 0.78, 2),
    kw("Waymo", 0.80, 2),
    kw("Omniverse", 0.78, 2),
];

const RADIUS: f32 = 38.0;
const TIER_STEP: f32 = 4.0;
const RADIUS_JITTER: f32 = 8.0;
const OMEGA_MIN: f32 = 0.08; // rad/s
const OMEGA_SPAN: f32 = 0.10;
const LABEL_SCALE: f32 = 5.5;
const FADE_STAGGER: f32 = 0.06; // seconds between successive keywords

const DUST_INNER: f32 = 0.4;
const DUST_NEAR: (usize, f32, f32) = (7000, 110.0, 0.008);
const DUST_FAR: (usize, f32, f32) = (1800, 160.0, 0.004);

const ORBIT_FAR: f32 = 110.0;
const ORBIT_NEAR: f32 = 55.0;
const ORBIT_HEIGHT: f32 = 28.0;
const ORBIT_RISE: f32 = 20.0;

#[derive(Clone, Copy, Debug)]
struct Orbiter {
    base: Vec3,
    axis: Vec3,
    omega: f32,
    phase: f32,
}

pub struct SphereScene {
    ctx: SceneContext,
    orbiters: Vec<Orbiter>,
    positions: Vec<Vec3>,
    scales: Vec<f32>,
    opacities: Vec<f32>,
    label_colors: Vec<f32>,
    convergence: f32,
    dust_near: ParticleField,
    dust_far: ParticleField,
}

impl SphereScene {
    pub fn new(seed: u64, aspect: f32) -> Result<Self, ConstructionError> {
        let ctx = SceneContext::new(
            ContextParams {
                scroll_k: 0.035,
                pointer_lag_k: 0.04,
                camera_follow: 0.03,
                fovy_deg: 52.0,
            },
            Vec3::new(-10.0, ORBIT_HEIGHT, ORBIT_FAR),
            aspect,
        )?;

        let mut rng = StdRng::seed_from_u64(sub_seed(seed, 1));
        let n = KEYWORDS.len() as f32;
        let orbiters: Vec<Orbiter> = KEYWORDS
            .iter()
            .enumerate()
            .map(|(i, k)| {
                // Fibonacci lattice: even coverage for any count
                let phi = (1.0 - 2.0 * (i as f32 + 0.5) / n).acos();
                let theta = PI * (1.0 + 5f32.sqrt()) * i as f32;
                let r = RADIUS
                    + (2.0 - k.tier as f32) * TIER_STEP
                    + (rng.gen::<f32>() - 0.5) * RADIUS_JITTER;
                let base = Vec3::new(
                    phi.sin() * theta.cos(),
                    phi.sin() * theta.sin(),
                    phi.cos(),
                ) * r;
                let axis = Vec3::new(
                    rng.gen::<f32>() - 0.5,
                    rng.gen::<f32>() - 0.5,
                    rng.gen::<f32>() - 0.5,
                )
                .try_normalize()
                .unwrap_or(Vec3::Y);
                let omega = (OMEGA_MIN + rng.gen::<f32>() * OMEGA_SPAN)
                    * if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                Orbiter {
                    base,
                    axis,
                    omega,
                    phase: rng.gen_range(0.0f32..TAU),
                }
            })
            .collect();

        let (n, r, v) = DUST_NEAR;
        let dust_near = shell_dust(
            "sphere.dust.near",
            n,
            DUST_INNER,
            r,
            Vec3::splat(v),
            sub_seed(seed, 2),
        )?;
        let (n, r, v) = DUST_FAR;
        let dust_far = shell_dust(
            "sphere.dust.far",
            n,
            DUST_INNER,
            r,
            Vec3::splat(v),
            sub_seed(seed, 3),
        )?;

        let count = orbiters.len();
        log::info!("[sphere] {count} keywords");
        Ok(Self {
            ctx,
            positions: orbiters.iter().map(|o| o.base).collect(),
            scales: KEYWORDS.iter().map(|k| k.size * LABEL_SCALE).collect(),
            opacities: vec![0.0; count],
            label_colors: vec![0.0; count * 3],
            orbiters,
            convergence: 0.0,
            dust_near,
            dust_far,
        })
    }

    fn update_keywords(&mut self, frame: &FrameSnapshot) {
        let conv = self.convergence;
        let t = frame.time;
        for (i, (o, k)) in self.orbiters.iter_mut().zip(KEYWORDS.iter()).enumerate() {
            o.base = Quat::from_axis_angle(o.axis, o.omega * frame.dt) * o.base;

            let breathe = 1.0 + 0.04 * (t * 1.2 + o.phase).sin();
            self.positions[i] = o.base * (1.0 - conv);
            self.scales[i] = k.size * LABEL_SCALE * breathe * (1.0 - conv * 0.7);

            let delay = i as f32 * FADE_STAGGER;
            let fade_in = smoothstep(t, 0.5 + delay, 1.8 + delay);
            let fade_out = 1.0 - conv * conv;
            let opacity = fade_in * fade_out * (0.65 + 0.35 * (t * 0.8 + o.phase).sin());
            self.opacities[i] = opacity;
            self.label_colors[i * 3..i * 3 + 3].fill(opacity);
        }
    }

    pub fn keywords(&self) -> &'static [Keyword] {
        &KEYWORDS
    }

    /// Label centres, index-aligned with [`Self::keywords`].
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn scales(&self) -> &[f32] {
        &self.scales
    }

    pub fn opacities(&self) -> &[f32] {
        &self.opacities
    }

    /// 0 while orbiting, 1 once every keyword sits at the origin.
    pub fn convergence(&self) -> f32 {
        self.convergence
    }

    pub fn dust(&self) -> [&ParticleField; 2] {
        [&self.dust_near, &self.dust_far]
    }
}

impl Scene for SphereScene {
    fn name(&self) -> &'static str {
        "sphere"
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
        self.dust_near.step(frame);
        self.dust_far.step(frame);

        self.convergence = smoothstep(frame.progress, 0.35, 0.85);
        self.update_keywords(frame);

        let s = frame.progress;
        let angle = s * PI;
        let radius = ORBIT_FAR + (ORBIT_NEAR - ORBIT_FAR) * self.convergence;
        let lag = frame.pointer_lag;
        let eye = Vec3::new(
            angle.sin() * radius + lag.x * 2.0,
            ORBIT_HEIGHT + s * ORBIT_RISE + lag.y * 1.4,
            angle.cos() * radius,
        );
        self.ctx.rig.steer(eye, Vec3::ZERO);
    }

    fn publish(&self, sink: &mut dyn RenderSink) {
        sink.layer(
            Layer::new(
                "sphere.keywords",
                Style::points(LABEL_SCALE, 1.0),
                bytemuck::cast_slice(&self.positions),
            )
            .colors(&self.label_colors)
            .sizes(&self.scales),
        );

        sink.points(
            "sphere.dust.near",
            self.dust_near.positions_flat(),
            None,
            Style::points(0.28, 0.55),
        );
        sink.points(
            "sphere.dust.far",
            self.dust_far.positions_flat(),
            None,
            Style::points(0.65, 0.18),
        );

        let core = [0.0f32; 3];
        let conv = self.convergence;
        sink.points("sphere.core", &core, None, Style::points(5.0, conv * 0.9));
        sink.points("sphere.core.halo", &core, None, Style::points(20.0, conv * 0.22));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::NullSink;

    #[test]
    fn keywords_start_on_their_tier_shell() {
        let scene = SphereScene::new(3, 1.5).unwrap();
        for (p, k) in scene.positions().iter().zip(scene.keywords()) {
            let shell = RADIUS + (2.0 - k.tier as f32) * TIER_STEP;
            let r = p.length();
            assert!((r - shell).abs() <= RADIUS_JITTER / 2.0 + 1e-3, "{} at r {r}", k.word);
        }
    }

    #[test]
    fn full_scroll_collapses_keywords_into_the_core() {
        let mut scene = SphereScene::new(3, 1.5).unwrap();
        scene.set_scroll_target(1.0);
        let mut sink = NullSink;
        for _ in 0..400 {
            scene.frame(1.0 / 60.0, &mut sink);
        }
        assert_eq!(scene.convergence(), 1.0);
        assert!(scene.positions().iter().all(|p| p.length() < 1e-4));
        assert!(scene.opacities().iter().all(|&o| o.abs() < 1e-6));
    }

    #[test]
    fn orbit_preserves_radius() {
        let mut scene = SphereScene::new(9, 1.0).unwrap();
        let before: Vec<f32> = scene.positions().iter().map(|p| p.length()).collect();
        let mut sink = NullSink;
        for _ in 0..120 {
            scene.frame(1.0 / 60.0, &mut sink);
        }
        for (b, p) in before.iter().zip(scene.positions()) {
            assert!((b - p.length()).abs() < 1e-2);
        }
    }
}
