//! Signal pulses travelling along graph edges.
//!
//! A pulse walks its edge at a constant per-frame speed. When it arrives the
//! destination node lights up and, if the pulse still carries enough
//! strength, each outgoing edge independently schedules a weaker child after
//! a short random delay. Strength shrinks geometrically per hop, so every
//! cascade dies out on its own.

use glam::Vec3;
use rand::prelude::*;

use crate::camera::{ndc_to_pixels, Camera};
use crate::constants::*;
use crate::error::{
    check_non_negative, check_open, check_probability, check_upper_closed, ConstructionError,
};
use crate::glow::{GlowParams, NodeGlow};
use crate::graph::{EdgeId, Graph, NodeId};
use crate::pool::{Poolable, RingPool};
use crate::scene::FrameSnapshot;
use crate::schedule::DeferredQueue;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pulse {
    pub edge: EdgeId,
    pub t: f32,
    pub speed: f32,
    pub strength: f32,
    pub active: bool,
}

impl Poolable for Pulse {
    fn is_active(&self) -> bool {
        self.active
    }
}

#[derive(Clone, Debug)]
pub struct PulseParams {
    pub pool_size: usize,
    /// Strength multiplier applied at every hop.
    pub decay: f32,
    /// Children weaker than this are not scheduled.
    pub min_strength: f32,
    /// Upper bound of the uniform spawn delay, in seconds.
    pub max_delay: f32,
    pub arrival_boost: f32,
    pub speed_min: f32,
    pub speed_span: f32,
    pub glow: GlowParams,
    pub probe_interval: f32,
    pub probe_radius_px: f32,
    pub probe_speed: f32,
    pub probe_incoming_chance: f64,
}

impl Default for PulseParams {
    fn default() -> Self {
        Self {
            pool_size: PULSE_POOL_SIZE,
            decay: PULSE_DECAY,
            min_strength: PULSE_MIN_STRENGTH,
            max_delay: PULSE_MAX_DELAY,
            arrival_boost: ARRIVAL_BOOST,
            speed_min: PULSE_SPEED_MIN,
            speed_span: PULSE_SPEED_SPAN,
            glow: GlowParams::default(),
            probe_interval: PROBE_INTERVAL,
            probe_radius_px: PROBE_RADIUS_PX,
            probe_speed: PROBE_PULSE_SPEED,
            probe_incoming_chance: PROBE_INCOMING_CHANCE,
        }
    }
}

impl PulseParams {
    fn validate(&self) -> Result<(), ConstructionError> {
        if self.pool_size == 0 {
            return Err(ConstructionError::InvalidParameter {
                name: "pulse.pool_size",
                value: 0.0,
                expected: "> 0",
            });
        }
        check_open("pulse.decay", self.decay, 0.0, 1.0, "(0, 1)")?;
        check_upper_closed("pulse.min_strength", self.min_strength, 0.0, 1.0, "(0, 1]")?;
        check_non_negative("pulse.max_delay", self.max_delay)?;
        check_upper_closed("pulse.speed_min", self.speed_min, 0.0, 1.0, "(0, 1]")?;
        check_non_negative("pulse.speed_span", self.speed_span)?;
        check_non_negative("pulse.probe_interval", self.probe_interval)?;
        check_non_negative("pulse.probe_radius_px", self.probe_radius_px)?;
        check_probability("pulse.probe_incoming_chance", self.probe_incoming_chance)?;
        Ok(())
    }
}

/// Periodically fires a slow pulse from a random edge leaving one node group.
#[derive(Clone, Debug)]
pub struct IdleEmitter {
    edges: Vec<EdgeId>,
    interval: f32,
    excite: f32,
    speed: f32,
    timer: f32,
}

#[derive(Clone, Copy, Debug)]
struct Spawn {
    edge: EdgeId,
    strength: f32,
}

pub struct PulseGraph {
    graph: Graph,
    params: PulseParams,
    pool: RingPool<Pulse>,
    pending: DeferredQueue<Spawn>,
    glow: NodeGlow,
    rng: StdRng,
    emitter: Option<IdleEmitter>,
    probe_timer: f32,
    last_probed: Option<NodeId>,
    now: f32,
    spawned: u64,
    alive: bool,
    due: Vec<Spawn>,
    arrivals: Vec<(NodeId, f32)>,
    pulse_positions: Vec<Vec3>,
    pulse_colors: Vec<Vec3>,
    node_colors: Vec<f32>,
    edge_colors: Vec<f32>,
}

impl PulseGraph {
    pub fn new(graph: Graph, params: PulseParams, seed: u64) -> Result<Self, ConstructionError> {
        params.validate()?;
        if graph.edge_count() == 0 {
            return Err(ConstructionError::NoEdges);
        }
        let pool_size = params.pool_size;
        let nodes = graph.node_count();
        let edges = graph.edge_count();
        Ok(Self {
            glow: NodeGlow::new(nodes, params.glow),
            pool: RingPool::new(pool_size),
            pending: DeferredQueue::new(),
            rng: StdRng::seed_from_u64(seed),
            emitter: None,
            probe_timer: 0.0,
            last_probed: None,
            now: 0.0,
            spawned: 0,
            alive: true,
            due: Vec::new(),
            arrivals: Vec::new(),
            pulse_positions: vec![Vec3::splat(PARKED_POSITION); pool_size],
            pulse_colors: vec![Vec3::ZERO; pool_size],
            node_colors: Vec::with_capacity(nodes * 3),
            edge_colors: vec![EDGE_BRIGHTNESS_FLOOR; edges * 6],
            graph,
            params,
        })
    }

    /// Attach an idle emitter firing from edges that leave nodes in `group`.
    pub fn with_idle_emitter(
        mut self,
        group: u32,
        interval: f32,
        excite: f32,
        speed: f32,
    ) -> Result<Self, ConstructionError> {
        let edges = self.graph.edges_from_group(group);
        if edges.is_empty() {
            return Err(ConstructionError::NoEdgesInGroup { group });
        }
        check_open("pulse.idle.interval", interval, 0.0, f32::INFINITY, "> 0")?;
        self.emitter = Some(IdleEmitter {
            edges,
            interval,
            excite,
            speed,
            timer: 0.0,
        });
        Ok(self)
    }

    /// Put a pulse on `edge`. `None` speed picks a random one.
    pub fn spawn(&mut self, edge: EdgeId, speed: Option<f32>, strength: f32) {
        if !self.alive || edge as usize >= self.graph.edge_count() {
            return;
        }
        let speed = speed.unwrap_or_else(|| {
            self.params.speed_min + self.rng.gen::<f32>() * self.params.speed_span
        });
        *self.pool.acquire() = Pulse {
            edge,
            t: 0.0,
            speed,
            strength,
            active: true,
        };
        self.spawned += 1;
    }

    /// Light `node` up and start a cascade from it.
    pub fn trigger(&mut self, node: NodeId, strength: f32) {
        if !self.alive || node as usize >= self.graph.node_count() {
            return;
        }
        self.glow.excite(node, strength);
        self.propagate(node, strength);
    }

    /// Each outgoing edge of `node` independently, with probability
    /// `strength`, schedules a child of that strength after a random delay.
    fn propagate(&mut self, node: NodeId, strength: f32) {
        if strength < self.params.min_strength {
            return;
        }
        for i in 0..self.graph.outgoing(node).len() {
            let edge = self.graph.outgoing(node)[i];
            if self.rng.gen::<f32>() < strength {
                let delay = self.rng.gen_range(0.0..=self.params.max_delay);
                self.pending.schedule(self.now + delay, Spawn { edge, strength });
            }
        }
    }

    /// Nearest-node query against the pointer, throttled to the probe interval.
    pub fn probe(&mut self, camera: &Camera, frame: &FrameSnapshot) {
        if !self.alive {
            return;
        }
        self.probe_timer += frame.dt;
        if self.probe_timer < self.params.probe_interval {
            return;
        }
        self.probe_timer = 0.0;
        self.now = frame.time;

        let pointer = ndc_to_pixels(frame.pointer_ndc, frame.viewport);
        let closest = self
            .graph
            .positions()
            .iter()
            .enumerate()
            .filter_map(|(i, p)| {
                camera
                    .project_to_screen(*p, frame.viewport)
                    .map(|px| (i as NodeId, px.distance(pointer)))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1));

        if let Some((node, dist)) = closest {
            if self.last_probed != Some(node) && dist < self.params.probe_radius_px {
                log::trace!("[pulse] pointer probe hit node {node} at {dist:.1}px");
                self.last_probed = Some(node);
                self.trigger(node, 1.0);
                for i in 0..self.graph.incoming(node).len() {
                    let edge = self.graph.incoming(node)[i];
                    if self.rng.gen_bool(self.params.probe_incoming_chance) {
                        self.spawn(edge, Some(self.params.probe_speed), 1.0);
                    }
                }
            }
        }
    }

    /// Advance one frame: release due spawns, fire the idle emitter, move
    /// pulses, resolve arrivals, decay glow and refresh render buffers.
    pub fn step(&mut self, frame: &FrameSnapshot) {
        if !self.alive {
            return;
        }
        self.now = frame.time;

        let mut due = std::mem::take(&mut self.due);
        self.pending.drain_due(self.now, |s| due.push(s));
        for s in due.drain(..) {
            self.spawn(s.edge, None, s.strength);
        }
        self.due = due;

        self.tick_emitter(frame.dt);

        let mut arrivals = std::mem::take(&mut self.arrivals);
        for p in self.pool.slots_mut() {
            if !p.active {
                continue;
            }
            p.t += p.speed;
            if p.t >= 1.0 - PROGRESS_EPSILON {
                p.active = false;
                arrivals.push((self.graph.edge(p.edge).b, p.strength));
            }
        }
        for (node, strength) in arrivals.drain(..) {
            self.glow.excite(node, self.params.arrival_boost);
            self.propagate(node, strength * self.params.decay);
        }
        self.arrivals = arrivals;

        self.glow.decay(frame.dt);
        self.refresh_buffers(frame.time);
    }

    fn tick_emitter(&mut self, dt: f32) {
        let Some(em) = self.emitter.as_mut() else {
            return;
        };
        em.timer += dt;
        if em.timer <= em.interval {
            return;
        }
        em.timer = 0.0;
        let edge = em.edges[self.rng.gen_range(0..em.edges.len())];
        let (excite, speed) = (em.excite, em.speed);
        self.glow.excite(self.graph.edge(edge).a, excite);
        self.spawn(edge, Some(speed), 1.0);
    }

    fn refresh_buffers(&mut self, time: f32) {
        for (i, p) in self.pool.slots().iter().enumerate() {
            if p.active {
                self.pulse_positions[i] = self.graph.point_on(p.edge, p.t);
                self.pulse_colors[i] = Vec3::splat((p.t * std::f32::consts::PI).sin());
            } else {
                self.pulse_positions[i] = Vec3::splat(PARKED_POSITION);
                self.pulse_colors[i] = Vec3::ZERO;
            }
        }

        self.glow.write_colors(time, &mut self.node_colors);

        for (i, e) in self.graph.edges().iter().enumerate() {
            let b = EDGE_BRIGHTNESS_FLOOR
                .max(self.glow.activation(e.a) * 0.5)
                .max(self.glow.activation(e.b) * 0.5);
            self.edge_colors[i * 6..i * 6 + 6].fill(b);
        }
    }

    /// Drop pending spawns and live pulses; every later call is a no-op.
    pub fn shutdown(&mut self) {
        if self.alive {
            log::debug!(
                "[pulse] shutdown with {} pending spawns, {} live pulses",
                self.pending.len(),
                self.pool.active_count()
            );
        }
        self.alive = false;
        self.pending.close();
        self.pool.clear();
        self.refresh_buffers(self.now);
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    #[inline]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    #[inline]
    pub fn glow(&self) -> &NodeGlow {
        &self.glow
    }

    #[inline]
    pub fn pool(&self) -> &RingPool<Pulse> {
        &self.pool
    }

    #[inline]
    pub fn active_pulses(&self) -> usize {
        self.pool.active_count()
    }

    /// Spawns waiting on their delay.
    #[inline]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Total pulses spawned since construction.
    #[inline]
    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    pub fn pulse_positions_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.pulse_positions)
    }

    pub fn pulse_colors_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.pulse_colors)
    }

    pub fn node_colors(&self) -> &[f32] {
        &self.node_colors
    }

    pub fn edge_colors(&self) -> &[f32] {
        &self.edge_colors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Edge;

    fn line() -> Graph {
        Graph::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::new(2.0, 0.0, 0.0)],
            vec![0, 1, 2],
            vec![Edge::new(0, 1), Edge::new(1, 2)],
        )
        .unwrap()
    }

    fn frame(time: f32) -> FrameSnapshot {
        FrameSnapshot {
            dt: 1.0 / 60.0,
            time,
            ..FrameSnapshot::default()
        }
    }

    #[test]
    fn idle_emitter_needs_edges_in_group() {
        let pg = PulseGraph::new(line(), PulseParams::default(), 1).unwrap();
        assert!(matches!(
            pg.with_idle_emitter(2, 0.5, 0.6, 0.008),
            Err(ConstructionError::NoEdgesInGroup { group: 2 })
        ));
    }

    #[test]
    fn rejects_bad_configuration() {
        let params = PulseParams {
            probe_incoming_chance: 2.0,
            ..PulseParams::default()
        };
        assert!(matches!(
            PulseGraph::new(line(), params, 1),
            Err(ConstructionError::InvalidParameter {
                name: "pulse.probe_incoming_chance",
                ..
            })
        ));
        let params = PulseParams {
            decay: 1.0,
            ..PulseParams::default()
        };
        assert!(PulseGraph::new(line(), params, 1).is_err());
    }

    #[test]
    fn inactive_pulses_are_parked() {
        let mut pg = PulseGraph::new(line(), PulseParams::default(), 1).unwrap();
        pg.spawn(0, Some(0.25), 1.0);
        pg.step(&frame(0.0));
        let flat = pg.pulse_positions_flat();
        assert!((flat[0] - 0.25).abs() < 1e-6);
        assert_eq!(flat[3], PARKED_POSITION);
    }

    #[test]
    fn arrival_lights_destination() {
        let mut pg = PulseGraph::new(line(), PulseParams::default(), 1).unwrap();
        pg.spawn(0, Some(0.5), 1.0);
        pg.step(&frame(0.0));
        pg.step(&frame(0.016));
        assert_eq!(pg.active_pulses(), 0);
        assert!(pg.glow().activation(1) > 0.8);
    }

    #[test]
    fn shutdown_discards_pending_work() {
        let mut pg = PulseGraph::new(line(), PulseParams::default(), 1).unwrap();
        pg.trigger(0, 1.0);
        assert_eq!(pg.pending(), 1);
        pg.shutdown();
        assert_eq!(pg.pending(), 0);
        pg.step(&frame(1.0));
        pg.spawn(0, None, 1.0);
        assert_eq!(pg.active_pulses(), 0);
        assert!(!pg.is_alive());
    }
}
