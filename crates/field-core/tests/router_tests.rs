// Host-side tests for the agent router on the street grid.

use field_core::graph::{Edge, Graph};
use glam::Vec3;
use field_core::router::{AgentRouter, RouterParams};
use field_core::scene::FrameSnapshot;
use field_core::scenes::traffic::{CELL, DIAGONALS, GRID_SIZE};

const DT: f32 = 1.0 / 60.0;

fn frame(i: u64) -> FrameSnapshot {
    FrameSnapshot {
        dt: DT,
        time: i as f32 * DT,
        frame: i,
        ..FrameSnapshot::default()
    }
}

fn router(seed: u64) -> AgentRouter {
    let graph = Graph::grid(GRID_SIZE, CELL, &DIAGONALS).unwrap();
    AgentRouter::new(graph, RouterParams::default(), seed).unwrap()
}

#[test]
fn agents_keep_moving_and_stay_on_edges() {
    let mut r = router(7);
    let start: Vec<_> = r.agents().iter().map(|a| a.position).collect();
    let mut peak_flashes = 0;
    for i in 1..=1200 {
        r.step(&frame(i));
        peak_flashes = peak_flashes.max(r.active_flashes());
        for a in r.agents() {
            assert!((0.0..=1.0).contains(&a.t), "agent off its edge at t={}", a.t);
            assert!((a.edge as usize) < r.graph().edge_count());
            assert!(a.position.is_finite());
        }
    }

    let moved = r
        .agents()
        .iter()
        .zip(&start)
        .filter(|(a, s)| a.position.distance(**s) > 1e-3)
        .count();
    assert!(moved * 100 >= r.agents().len() * 95, "only {moved} agents moved");
    assert!(r.arrivals() > 0, "no agent ever reached an intersection");
    assert!(peak_flashes > 0, "no close encounter ever flashed");
}

#[test]
fn arrivals_light_up_intersections() {
    let mut r = router(11);
    for i in 1..=600 {
        r.step(&frame(i));
    }
    let lit = r.glow().activations().iter().filter(|&&a| a > 0.0).count();
    assert!(lit > 0);
    assert!(r.node_colors().iter().all(|c| (0.0..=2.0).contains(c)));
}

#[test]
fn buffers_match_graph_sizes() {
    let mut r = router(3);
    r.step(&frame(1));
    assert_eq!(r.agent_positions_flat().len(), r.agents().len() * 3);
    assert_eq!(r.node_colors().len(), r.graph().node_count() * 3);
    assert_eq!(r.edge_colors().len(), r.graph().edge_count() * 6);
    assert_eq!(r.flash_positions_flat().len(), r.flash_colors_flat().len());
}

#[test]
fn dead_ends_turn_agents_around() {
    // 0 - 1 - 2: both ends have a single street
    let graph = Graph::new(
        vec![Vec3::ZERO, Vec3::X * 10.0, Vec3::X * 20.0],
        vec![0; 3],
        vec![Edge::new(0, 1), Edge::new(1, 2)],
    )
    .unwrap();
    let params = RouterParams {
        agents: 8,
        ..RouterParams::default()
    };
    let mut r = AgentRouter::new(graph, params, 5).unwrap();
    let mut reached_ends = [false; 2];
    for i in 1..=6000 {
        r.step(&frame(i));
        for a in r.agents() {
            assert!((0.0..=1.0).contains(&a.t), "agent off its edge at t={}", a.t);
            assert!((a.edge as usize) < 2);
            assert!(a.position.x >= -1e-3 && a.position.x <= 20.0 + 1e-3);
            reached_ends[0] |= a.position.x < 0.5;
            reached_ends[1] |= a.position.x > 19.5;
        }
    }
    assert!(r.arrivals() > 40, "only {} arrivals", r.arrivals());
    assert_eq!(reached_ends, [true, true]);
}
