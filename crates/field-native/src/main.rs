use std::collections::BTreeMap;
use std::time::Instant;

use clap::Parser;
use field_core::camera::CameraPose;
use field_core::constants::PARKED_POSITION;
use field_core::geometry::{Path, Polyline};
use field_core::render::{Layer, RenderSink};
use field_core::scenes::SceneKind;
use glam::Vec3;

/// Step driftfield scenes headlessly and report what they publish.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Scene to run (rain, road, network, sphere, traffic), or `all`.
    #[arg(long, default_value = "all")]
    scene: String,

    /// Frames to simulate per scene.
    #[arg(long, default_value_t = 600)]
    frames: u32,

    /// Fixed frame delta in seconds.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Feed measured wall-clock time between frames instead of `--dt`.
    #[arg(long)]
    wall_clock: bool,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Viewport size in pixels, `WIDTHxHEIGHT`.
    #[arg(long, default_value = "1280x720", value_parser = parse_viewport)]
    viewport: (u32, u32),
}

fn parse_viewport(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let w: u32 = w.trim().parse().map_err(|e| format!("width: {e}"))?;
    let h: u32 = h.trim().parse().map_err(|e| format!("height: {e}"))?;
    if w == 0 || h == 0 {
        return Err("viewport must be non-empty".into());
    }
    Ok((w, h))
}

#[derive(Default, Clone, Copy)]
struct LayerStats {
    frames: u64,
    vertices: usize,
    visible: usize,
    min: Option<Vec3>,
    max: Option<Vec3>,
    mean_brightness: f32,
    opacity: f32,
}

/// Keeps the most recent snapshot of every layer plus frame counts.
#[derive(Default)]
struct StatsSink {
    layers: BTreeMap<&'static str, LayerStats>,
    last_pose: Option<CameraPose>,
}

impl RenderSink for StatsSink {
    fn layer(&mut self, layer: Layer<'_>) {
        let s = self.layers.entry(layer.name).or_default();
        s.frames += 1;
        s.vertices = layer.len();
        s.opacity = layer.style.opacity;
        s.min = None;
        s.max = None;
        s.visible = 0;
        for p in layer.positions.chunks_exact(3) {
            let p = Vec3::from_slice(p);
            // pooled entities park far away while inactive
            if p.y <= PARKED_POSITION * 0.5 {
                continue;
            }
            let p = layer.transform.map_or(p, |t| t.transform_point3(p));
            s.visible += 1;
            s.min = Some(s.min.map_or(p, |m| m.min(p)));
            s.max = Some(s.max.map_or(p, |m| m.max(p)));
        }
        s.mean_brightness = match layer.colors {
            Some(c) if !c.is_empty() => c.iter().sum::<f32>() / c.len() as f32,
            _ => 1.0,
        };
    }

    fn camera(&mut self, pose: CameraPose) {
        self.last_pose = Some(pose);
    }
}

/// Corners of the pointer tour in NDC: across the canvas, through the centre
/// and back, so every scene sees the pointer both near and far from its content.
const POINTER_TOUR: [[f32; 2]; 6] = [
    [-0.8, 0.6],
    [0.8, 0.6],
    [0.0, 0.0],
    [-0.8, -0.6],
    [0.8, -0.6],
    [-0.8, 0.6],
];

fn run(kind: SceneKind, args: &Args) -> anyhow::Result<()> {
    let (w, h) = args.viewport;
    let mut scene = kind.build(args.seed, w as f32 / h as f32)?;
    scene.resize(w as f32, h as f32);
    if !args.wall_clock {
        scene.context_mut().clock.set_fixed_delta(Some(args.dt));
    }
    let tour = Polyline::new(POINTER_TOUR.iter().map(|&[x, y]| Vec3::new(x, y, 0.0)).collect())?;
    let mut sink = StatsSink::default();

    let started = Instant::now();
    let mut last = started;
    for i in 0..args.frames {
        // scroll through the whole page once while the pointer walks the tour twice
        let t = i as f32 / args.frames.max(1) as f32;
        scene.set_scroll_target(t);
        scene.set_pointer(tour.point((t * 2.0).fract()).truncate());
        let now = Instant::now();
        let measured = now.duration_since(last).as_secs_f32();
        last = now;
        if scene.frame(measured, &mut sink).is_none() {
            log::warn!("[{kind}] stopped early at frame {i}");
            break;
        }
    }
    let elapsed = started.elapsed();
    scene.shutdown();

    log::info!(
        "[{kind}] {} frames in {:.1} ms ({:.3} ms/frame)",
        args.frames,
        elapsed.as_secs_f64() * 1e3,
        elapsed.as_secs_f64() * 1e3 / args.frames.max(1) as f64
    );
    if let Some(pose) = sink.last_pose {
        log::info!(
            "[{kind}] camera eye ({:.1}, {:.1}, {:.1}) -> ({:.1}, {:.1}, {:.1})",
            pose.eye.x,
            pose.eye.y,
            pose.eye.z,
            pose.target.x,
            pose.target.y,
            pose.target.z
        );
    }
    for (name, s) in &sink.layers {
        match (s.min, s.max) {
            (Some(lo), Some(hi)) => log::info!(
                "  {name:<28} {:>6}/{:<6} visible  op {:.2}  lum {:.3}  bounds ({:.1}, {:.1}, {:.1})..({:.1}, {:.1}, {:.1})",
                s.visible,
                s.vertices,
                s.opacity,
                s.mean_brightness,
                lo.x,
                lo.y,
                lo.z,
                hi.x,
                hi.y,
                hi.z
            ),
            _ => log::info!(
                "  {name:<28} {:>6}/{:<6} visible  op {:.2}",
                s.visible,
                s.vertices,
                s.opacity
            ),
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let kinds: Vec<SceneKind> = if args.scene.eq_ignore_ascii_case("all") {
        SceneKind::ALL.to_vec()
    } else {
        vec![args.scene.parse()?]
    };
    if !(args.dt.is_finite() && args.dt > 0.0) {
        anyhow::bail!("--dt must be a positive number of seconds, got {}", args.dt);
    }

    for kind in kinds {
        run(kind, &args)?;
    }
    Ok(())
}
