// Host-side tests for the particle field integrator.

use field_core::field::{Anchor, Boundary, FieldParams, ParticleField, Repulsion, Source};
use field_core::scene::FrameSnapshot;
use glam::Vec3;

fn frame(i: u64) -> FrameSnapshot {
    FrameSnapshot {
        dt: 1.0 / 60.0,
        time: i as f32 / 60.0,
        frame: i,
        ..FrameSnapshot::default()
    }
}

fn ring(n: usize, radius: f32) -> Vec<Vec3> {
    (0..n)
        .map(|i| {
            let a = i as f32 / n as f32 * std::f32::consts::TAU;
            Vec3::new(a.cos(), a.sin(), 0.0) * radius
        })
        .collect()
}

#[test]
fn displaced_particles_settle_back_to_rest() {
    let params = FieldParams {
        source: Source::None,
        ..FieldParams::default()
    };
    let rest = ring(32, 4.0);
    let mut field = ParticleField::new(params, rest.clone(), 1).unwrap();
    for i in 0..field.len() {
        field.set_position(i, rest[i] + Vec3::new(3.0, -2.0, 1.0));
    }
    assert!(field.mean_displacement() > 3.0);

    for i in 0..300 {
        field.step(&frame(i));
    }
    for (p, r) in field.positions().iter().zip(&rest) {
        assert!(p.distance(*r) < 1e-3, "particle stuck at {p}, rest {r}");
    }
}

#[test]
fn wrapped_particles_reappear_on_the_opposite_face() {
    let params = FieldParams {
        name: "wrap",
        anchor: Anchor::Drift,
        source: Source::None,
        spring: 1.0,
        damping: 0.5,
        boundary: Boundary::Wrap {
            min: Vec3::new(-10.0, f32::NEG_INFINITY, f32::NEG_INFINITY),
            max: Vec3::new(10.0, f32::INFINITY, f32::INFINITY),
            scatter: Vec3::ZERO,
        },
        ..FieldParams::default()
    };
    let rest: Vec<Vec3> = (0..19).map(|i| Vec3::new(i as f32 - 9.0, 0.0, 0.0)).collect();
    let n = rest.len();
    let mut field = ParticleField::new(params, rest, 2)
        .unwrap()
        .with_drift(vec![Vec3::new(0.5, 0.0, 0.0); n])
        .unwrap();

    let mut wraps = vec![0u32; n];
    let mut last: Vec<f32> = field.positions().iter().map(|p| p.x).collect();
    for i in 0..200 {
        field.step(&frame(i));
        for (j, p) in field.positions().iter().enumerate() {
            assert!((-10.0..=10.0).contains(&p.x), "particle {j} escaped to {}", p.x);
            if p.x < last[j] {
                wraps[j] += 1;
            }
            last[j] = p.x;
        }
    }
    assert!(wraps.iter().all(|&w| w >= 1), "wrap counts {wraps:?}");
}

#[test]
fn point_source_pushes_the_cloud_away_and_it_settles() {
    let params = FieldParams {
        name: "cloud",
        source: Source::Point(Vec3::new(5.0, 0.0, 0.0)),
        repulsion: Repulsion::new(10.0, 1.0),
        spring: 0.1,
        damping: 0.8,
        ..FieldParams::default()
    };
    let rest = vec![Vec3::ZERO; 100];
    let mut field = ParticleField::new(params, rest.clone(), 3).unwrap();

    let mut before = 0.0;
    for i in 0..200 {
        if i == 199 {
            before = field.mean_displacement();
        }
        field.step(&frame(i));
    }
    let after = field.mean_displacement();

    assert!(field.centroid().x < -0.3, "centroid {}", field.centroid());
    for (p, r) in field.positions().iter().zip(&rest) {
        assert!(p.x < r.x, "particle at {p} was not pushed away from the source");
    }
    assert!(after > 0.3);
    assert!(
        (after - before).abs() / after < 0.01,
        "still moving: {before} -> {after}"
    );
}

#[test]
fn pointer_source_follows_the_frame() {
    let params = FieldParams {
        repulsion: Repulsion::new(10.0, 1.0),
        ..FieldParams::default()
    };
    let mut field = ParticleField::new(params, vec![Vec3::ZERO; 4], 4).unwrap();

    // no projected pointer: nothing moves
    for i in 0..30 {
        field.step(&frame(i));
    }
    assert_eq!(field.mean_displacement(), 0.0);

    let pushed = FrameSnapshot {
        pointer_world: Some(Vec3::new(0.0, -2.0, 0.0)),
        ..frame(30)
    };
    for _ in 0..60 {
        field.step(&pushed);
    }
    assert!(field.centroid().y > 0.5);
}
