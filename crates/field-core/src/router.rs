//! Agents wandering a road graph.
//!
//! Each agent walks one edge at a time. Reaching an endpoint it picks any
//! edge touching that node and heads away from it. Close encounters between
//! agents occasionally spark a short-lived flash and brighten the
//! intersections at either end of the initiating agent's edge.

use fnv::FnvHashMap;
use glam::{IVec3, Vec3};
use rand::prelude::*;
use smallvec::SmallVec;

use crate::constants::*;
use crate::error::{
    check_non_negative, check_open, check_probability, check_upper_closed, ConstructionError,
};
use crate::glow::{GlowParams, NodeGlow};
use crate::graph::{EdgeId, Graph, NodeId};
use crate::pool::{Poolable, RingPool};
use crate::scene::FrameSnapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }

    #[inline]
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Agent {
    pub edge: EdgeId,
    pub t: f32,
    pub dir: Direction,
    pub speed: f32,
    pub position: Vec3,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Flash {
    pub position: Vec3,
    pub life: f32,
    pub active: bool,
}

impl Poolable for Flash {
    fn is_active(&self) -> bool {
        self.active
    }
}

/// Road-line brightness model: every edge cools toward `floor` and is warmed
/// by each agent currently on it.
#[derive(Clone, Copy, Debug)]
pub struct HeatParams {
    pub base: Vec3,
    pub floor: Vec3,
    pub decay: f32,
    pub gain: Vec3,
}

impl Default for HeatParams {
    fn default() -> Self {
        Self {
            base: Vec3::new(0.12, 0.14, 0.18),
            floor: Vec3::new(0.10, 0.11, 0.14),
            decay: 0.97,
            gain: Vec3::new(0.55 * 0.04, 0.55 * 0.04, 0.55 * 0.06),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RouterParams {
    pub agents: usize,
    pub speed_min: f32,
    pub speed_span: f32,
    /// Height agents float above their edge.
    pub lift: f32,
    pub proximity_interval: f32,
    pub proximity_stride: usize,
    pub proximity_radius: f32,
    pub flash_chance: f64,
    pub proximity_boost: f32,
    pub arrival_boost: f32,
    pub arrival_flash: f32,
    pub flash_pool: usize,
    pub flash_fade: f32,
    pub glow: GlowParams,
    pub heat: HeatParams,
}

impl Default for RouterParams {
    fn default() -> Self {
        Self {
            agents: 220,
            speed_min: AGENT_SPEED_MIN,
            speed_span: AGENT_SPEED_SPAN,
            lift: AGENT_LIFT,
            proximity_interval: PROXIMITY_INTERVAL,
            proximity_stride: PROXIMITY_STRIDE,
            proximity_radius: PROXIMITY_RADIUS,
            flash_chance: PROXIMITY_FLASH_CHANCE,
            proximity_boost: PROXIMITY_NODE_BOOST,
            arrival_boost: ARRIVAL_NODE_BOOST,
            arrival_flash: ARRIVAL_NODE_FLASH,
            flash_pool: FLASH_POOL_SIZE,
            flash_fade: FLASH_FADE_PER_SEC,
            glow: GlowParams {
                decay_per_sec: 2.8,
                flash_fade_per_sec: 3.5,
                idle_base: 0.12,
                idle_amp: 0.05,
                idle_freq: 0.9,
                idle_phase_step: 0.4,
            },
            heat: HeatParams::default(),
        }
    }
}

impl RouterParams {
    fn validate(&self) -> Result<(), ConstructionError> {
        check_upper_closed("router.speed_min", self.speed_min, 0.0, 1.0, "(0, 1]")?;
        check_non_negative("router.speed_span", self.speed_span)?;
        check_open("router.proximity_radius", self.proximity_radius, 0.0, f32::INFINITY, "> 0")?;
        check_open("router.heat.decay", self.heat.decay, 0.0, 1.0, "(0, 1)")?;
        check_probability("router.flash_chance", self.flash_chance)?;
        if self.proximity_stride == 0 || self.flash_pool == 0 {
            return Err(ConstructionError::InvalidParameter {
                name: "router.proximity_stride/flash_pool",
                value: 0.0,
                expected: "> 0",
            });
        }
        Ok(())
    }
}

type Cell = SmallVec<[u32; 8]>;

pub struct AgentRouter {
    graph: Graph,
    params: RouterParams,
    agents: Vec<Agent>,
    flashes: RingPool<Flash>,
    glow: NodeGlow,
    heat: Vec<Vec3>,
    rng: StdRng,
    proximity_timer: f32,
    grid: FnvHashMap<IVec3, Cell>,
    arrivals: u64,
    agent_positions: Vec<Vec3>,
    flash_positions: Vec<Vec3>,
    flash_colors: Vec<Vec3>,
    node_colors: Vec<f32>,
    edge_colors: Vec<f32>,
}

impl AgentRouter {
    pub fn new(graph: Graph, params: RouterParams, seed: u64) -> Result<Self, ConstructionError> {
        params.validate()?;
        if graph.edge_count() == 0 {
            return Err(ConstructionError::NoEdges);
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let agents: Vec<Agent> = (0..params.agents)
            .map(|_| {
                let edge = rng.gen_range(0..graph.edge_count()) as EdgeId;
                let t = rng.gen::<f32>();
                let dir = if rng.gen_bool(0.5) {
                    Direction::Forward
                } else {
                    Direction::Backward
                };
                Agent {
                    edge,
                    t,
                    dir,
                    speed: params.speed_min + rng.gen::<f32>() * params.speed_span,
                    position: graph.point_on(edge, t) + Vec3::Y * params.lift,
                }
            })
            .collect();

        log::debug!(
            "[router] {} agents on {} edges",
            agents.len(),
            graph.edge_count()
        );
        let edges = graph.edge_count();
        Ok(Self {
            glow: NodeGlow::new(graph.node_count(), params.glow),
            heat: vec![params.heat.base; edges],
            flashes: RingPool::new(params.flash_pool),
            agent_positions: agents.iter().map(|a| a.position).collect(),
            flash_positions: vec![Vec3::splat(PARKED_POSITION); params.flash_pool],
            flash_colors: vec![Vec3::ZERO; params.flash_pool],
            node_colors: Vec::with_capacity(graph.node_count() * 3),
            edge_colors: vec![0.0; edges * 6],
            grid: FnvHashMap::default(),
            proximity_timer: 0.0,
            arrivals: 0,
            agents,
            rng,
            graph,
            params,
        })
    }

    pub fn step(&mut self, frame: &FrameSnapshot) {
        self.proximity_timer += frame.dt;
        let check = self.proximity_timer > self.params.proximity_interval;
        if check {
            self.proximity_timer = 0.0;
        }

        for i in 0..self.agents.len() {
            self.advance_agent(i);
        }
        if check {
            self.check_proximity();
        }

        self.update_flashes(frame.dt);
        self.update_heat();
        self.glow.decay(frame.dt);
        self.refresh_buffers(frame.time);
    }

    fn advance_agent(&mut self, i: usize) {
        let mut a = self.agents[i];
        a.t += a.speed * a.dir.sign();
        if a.t >= 1.0 || a.t <= 0.0 {
            let e = self.graph.edge(a.edge);
            let end = if a.t >= 1.0 { e.b } else { e.a };
            // `incident` always holds the current edge, so a dead end re-picks it
            // and the agent heads back the way it came
            let incident = self.graph.incident(end);
            if incident.is_empty() {
                // unreachable for validated graphs; stay put rather than index nothing
                a.t = a.t.clamp(0.0, 1.0);
                a.dir = a.dir.reversed();
            } else {
                let pick = incident[self.rng.gen_range(0..incident.len())];
                a.edge = pick;
                if self.graph.edge(pick).a == end {
                    a.dir = Direction::Forward;
                    a.t = 0.0;
                } else {
                    a.dir = Direction::Backward;
                    a.t = 1.0;
                }
            }
            self.arrive(end);
        }
        a.position = self.graph.point_on(a.edge, a.t) + Vec3::Y * self.params.lift;
        self.agents[i] = a;
    }

    fn arrive(&mut self, node: NodeId) {
        self.arrivals += 1;
        self.glow.excite(node, self.params.arrival_boost);
        self.glow.flash(node, self.params.arrival_flash);
    }

    #[inline]
    fn cell_of(&self, p: Vec3) -> IVec3 {
        (p / self.params.proximity_radius).floor().as_ivec3()
    }

    fn check_proximity(&mut self) {
        for cell in self.grid.values_mut() {
            cell.clear();
        }
        for (i, a) in self.agents.iter().enumerate() {
            let key = (a.position / self.params.proximity_radius).floor().as_ivec3();
            self.grid.entry(key).or_default().push(i as u32);
        }

        let r2 = self.params.proximity_radius * self.params.proximity_radius;
        let mut sparks: SmallVec<[(Vec3, EdgeId); 16]> = SmallVec::new();
        for i in (0..self.agents.len()).step_by(self.params.proximity_stride) {
            let pi = self.agents[i].position;
            let home = self.cell_of(pi);
            for dz in -1..=1 {
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        let Some(cell) = self.grid.get(&(home + IVec3::new(dx, dy, dz))) else {
                            continue;
                        };
                        for &j in cell.iter().filter(|&&j| j as usize > i) {
                            let pj = self.agents[j as usize].position;
                            if pi.distance_squared(pj) < r2
                                && self.rng.gen_bool(self.params.flash_chance)
                            {
                                sparks.push((pi.lerp(pj, 0.5), self.agents[i].edge));
                            }
                        }
                    }
                }
            }
        }

        for (at, edge) in sparks {
            self.spawn_flash(at);
            let e = self.graph.edge(edge);
            self.glow.excite(e.a, self.params.proximity_boost);
            self.glow.excite(e.b, self.params.proximity_boost);
        }
    }

    pub fn spawn_flash(&mut self, position: Vec3) {
        *self.flashes.acquire() = Flash {
            position,
            life: 1.0,
            active: true,
        };
    }

    fn update_flashes(&mut self, dt: f32) {
        let fade = dt * self.params.flash_fade;
        for (i, f) in self.flashes.slots_mut().iter_mut().enumerate() {
            if f.active {
                f.life -= fade;
                if f.life <= 0.0 {
                    f.active = false;
                }
            }
            if f.active {
                self.flash_positions[i] = f.position;
                self.flash_colors[i] = Vec3::splat(f.life);
            } else {
                self.flash_positions[i] = Vec3::splat(PARKED_POSITION);
                self.flash_colors[i] = Vec3::ZERO;
            }
        }
    }

    fn update_heat(&mut self) {
        let h = self.params.heat;
        for c in &mut self.heat {
            *c = (*c * h.decay).max(h.floor);
        }
        for a in &self.agents {
            let c = &mut self.heat[a.edge as usize];
            *c = (*c + h.gain).min(Vec3::ONE);
        }
    }

    fn refresh_buffers(&mut self, time: f32) {
        for (dst, a) in self.agent_positions.iter_mut().zip(&self.agents) {
            *dst = a.position;
        }
        self.glow.write_colors(time, &mut self.node_colors);
        for (i, c) in self.heat.iter().enumerate() {
            let rgb = c.to_array();
            self.edge_colors[i * 6..i * 6 + 3].copy_from_slice(&rgb);
            self.edge_colors[i * 6 + 3..i * 6 + 6].copy_from_slice(&rgb);
        }
    }

    #[inline]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    #[inline]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    #[inline]
    pub fn glow(&self) -> &NodeGlow {
        &self.glow
    }

    #[inline]
    pub fn heat(&self) -> &[Vec3] {
        &self.heat
    }

    #[inline]
    pub fn active_flashes(&self) -> usize {
        self.flashes.active_count()
    }

    /// Endpoint arrivals since construction.
    #[inline]
    pub fn arrivals(&self) -> u64 {
        self.arrivals
    }

    pub fn agent_positions_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.agent_positions)
    }

    pub fn flash_positions_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.flash_positions)
    }

    pub fn flash_colors_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.flash_colors)
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

    fn frame() -> FrameSnapshot {
        FrameSnapshot {
            dt: 1.0 / 60.0,
            ..FrameSnapshot::default()
        }
    }

    #[test]
    fn overshoot_moves_agent_to_incident_edge() {
        let graph = Graph::new(
            vec![Vec3::ZERO, Vec3::X * 10.0, Vec3::new(10.0, 0.0, 10.0)],
            vec![0; 3],
            vec![Edge::new(0, 1), Edge::new(1, 2)],
        )
        .unwrap();
        let params = RouterParams {
            agents: 1,
            speed_min: 0.4,
            speed_span: 0.0,
            ..RouterParams::default()
        };
        let mut router = AgentRouter::new(graph, params, 9).unwrap();
        for _ in 0..10 {
            router.step(&frame());
            let a = router.agents()[0];
            assert!((0.0..=1.0).contains(&a.t));
            assert!((a.edge as usize) < router.graph().edge_count());
        }
        assert!(router.arrivals() > 0);
    }

    #[test]
    fn rejects_bad_configuration() {
        for flash_chance in [1.5, -0.1, f64::NAN] {
            let params = RouterParams {
                flash_chance,
                proximity_interval: 0.0,
                ..RouterParams::default()
            };
            let graph = Graph::grid(3, 10.0, &[]).unwrap();
            assert!(matches!(
                AgentRouter::new(graph, params, 1),
                Err(ConstructionError::InvalidParameter {
                    name: "router.flash_chance",
                    ..
                })
            ));
        }
    }

    #[test]
    fn flashes_fade_out() {
        let graph = Graph::new(vec![Vec3::ZERO, Vec3::X], vec![0, 0], vec![Edge::new(0, 1)]).unwrap();
        let params = RouterParams {
            agents: 0,
            ..RouterParams::default()
        };
        let mut router = AgentRouter::new(graph, params, 1).unwrap();
        router.spawn_flash(Vec3::ONE);
        router.step(&frame());
        assert_eq!(router.active_flashes(), 1);
        assert_eq!(&router.flash_positions_flat()[0..3], &[1.0, 1.0, 1.0]);
        for _ in 0..20 {
            router.step(&frame());
        }
        assert_eq!(router.active_flashes(), 0);
        assert_eq!(router.flash_positions_flat()[0], PARKED_POSITION);
    }

    #[test]
    fn heat_stays_within_floor_and_one() {
        let graph = Graph::grid(3, 10.0, &[]).unwrap();
        let mut router = AgentRouter::new(graph, RouterParams::default(), 4).unwrap();
        for _ in 0..300 {
            router.step(&frame());
        }
        let floor = HeatParams::default().floor;
        for c in router.heat() {
            assert!(c.cmpge(floor - Vec3::splat(1e-6)).all());
            assert!(c.cmple(Vec3::ONE).all());
        }
    }
}
