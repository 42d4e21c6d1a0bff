//! Spring-damped particle fields.
//!
//! A [`ParticleField`] is a structure-of-arrays over a fixed number of
//! particles that share one repulsion/spring/damping configuration. Every
//! frame each particle runs the same single-phase update:
//!
//! 1. measure the displacement from its anchor (rest position, or current
//!    position for drifting fields) to the repulsion source;
//! 2. inside the radius the source pushes it away with a force falling off
//!    linearly to zero at the edge;
//! 3. a directional flow term (blended by scroll progress) and a per-particle
//!    drift are added on top;
//! 4. velocity springs toward `anchor + force` and is then damped;
//! 5. position integrates velocity;
//! 6. the field's boundary policy recycles or reflects strays.
//!
//! Spring and damping are per-frame factors. Only the flow term scales with
//! the (clamped) frame delta.

use glam::Vec3;
use rand::prelude::*;

use crate::constants::{REFERENCE_FPS, REPULSION_EPSILON};
use crate::error::{
    check_non_negative, check_open, check_probability, check_upper_closed, ConstructionError,
};
use crate::scene::FrameSnapshot;

/// What a particle springs toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    /// Its immutable rest position.
    Rest,
    /// Its own current position: the particle drifts freely.
    Drift,
}

/// Where the repulsion force comes from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Source {
    None,
    Point(Vec3),
    /// The pointer's world projection for the current frame.
    Pointer,
}

#[derive(Clone, Copy, Debug)]
pub struct Repulsion {
    pub radius: f32,
    pub strength: f32,
    /// Per-axis mask applied before measuring distance (0 drops an axis).
    pub metric: Vec3,
    /// Per-axis gain applied to the resulting force.
    pub axis_gain: Vec3,
}

impl Repulsion {
    pub fn new(radius: f32, strength: f32) -> Self {
        Self {
            radius,
            strength,
            metric: Vec3::ONE,
            axis_gain: Vec3::ONE,
        }
    }

    /// Offset pushing `anchor` away from `source`.
    #[inline]
    pub fn offset(&self, anchor: Vec3, source: Vec3) -> Vec3 {
        let disp = (anchor - source) * self.metric;
        let d = disp.length();
        if d < self.radius && d > REPULSION_EPSILON {
            let s = (1.0 - d / self.radius) * self.strength;
            disp / d * s * self.axis_gain
        } else {
            Vec3::ZERO
        }
    }
}

impl Default for Repulsion {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Directional flow that blends between two directions as progress goes 0 → 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Flow {
    pub from: Vec3,
    pub to: Vec3,
}

impl Flow {
    #[inline]
    pub fn at(&self, progress: f32) -> Vec3 {
        self.from.lerp(self.to, progress.clamp(0.0, 1.0))
    }
}

/// Boundary policy, fixed when the field is built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Boundary {
    None,
    /// Leaving the box through one face re-enters through the opposite face.
    /// Every other axis with a non-zero `scatter` gets a fresh random
    /// coordinate in `±scatter` so recycled particles do not visibly repeat.
    /// Use infinite bounds to leave an axis unbounded.
    Wrap { min: Vec3, max: Vec3, scatter: Vec3 },
    /// A coordinate past `±limit` is multiplied by `-factor`.
    Reflect { limit: Vec3, factor: f32 },
    /// Outside the sphere of `radius` around the origin, velocity and drift
    /// are reversed.
    Shell { radius: f32 },
}

#[derive(Clone, Debug)]
pub struct FieldParams {
    pub name: &'static str,
    pub anchor: Anchor,
    pub source: Source,
    pub repulsion: Repulsion,
    pub spring: f32,
    pub damping: f32,
    pub flow: Option<Flow>,
    pub boundary: Boundary,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            name: "field",
            anchor: Anchor::Rest,
            source: Source::Pointer,
            repulsion: Repulsion::default(),
            spring: 0.1,
            damping: 0.8,
            flow: None,
            boundary: Boundary::None,
        }
    }
}

impl FieldParams {
    fn validate(&self) -> Result<(), ConstructionError> {
        check_upper_closed("field.spring", self.spring, 0.0, 2.0, "(0, 2]")?;
        check_open("field.damping", self.damping, 0.0, 1.0, "(0, 1)")?;
        check_non_negative("field.repulsion.radius", self.repulsion.radius)?;
        if !self.repulsion.strength.is_finite() {
            return Err(ConstructionError::InvalidParameter {
                name: "field.repulsion.strength",
                value: self.repulsion.strength,
                expected: "finite",
            });
        }
        match self.boundary {
            Boundary::Wrap { min, max, scatter } => {
                if self.anchor == Anchor::Rest {
                    return Err(ConstructionError::WrapNeedsDrift { name: self.name });
                }
                for s in scatter.to_array() {
                    check_non_negative("field.boundary.wrap.scatter", s)?;
                }
                if min.cmpge(max).any() {
                    return Err(ConstructionError::InvalidParameter {
                        name: "field.boundary.wrap",
                        value: (max - min).min_element(),
                        expected: "min < max on every axis",
                    });
                }
            }
            Boundary::Reflect { factor, .. } => {
                check_upper_closed("field.boundary.reflect.factor", factor, 0.0, 1.0, "(0, 1]")?
            }
            Boundary::Shell { radius } => {
                check_open("field.boundary.shell.radius", radius, 0.0, f32::INFINITY, "> 0")?
            }
            Boundary::None => {}
        }
        Ok(())
    }
}

/// Structure-of-arrays particle storage plus the integrator that drives it.
pub struct ParticleField {
    params: FieldParams,
    rest: Vec<Vec3>,
    position: Vec<Vec3>,
    velocity: Vec<Vec3>,
    color: Vec<Vec3>,
    drift: Vec<Vec3>,
    size: Vec<f32>,
    phase: Vec<f32>,
    brightness: Vec<f32>,
    speed: Vec<f32>,
    rng: StdRng,
    resets: u64,
}

impl ParticleField {
    /// Build a field whose particles start at rest on `rest`.
    pub fn new(params: FieldParams, rest: Vec<Vec3>, seed: u64) -> Result<Self, ConstructionError> {
        params.validate()?;
        let n = rest.len();
        if n == 0 {
            return Err(ConstructionError::EmptyField { name: params.name });
        }
        if let Some(i) = rest.iter().position(|p| !p.is_finite()) {
            return Err(ConstructionError::InvalidParameter {
                name: "field.rest",
                value: i as f32,
                expected: "finite rest positions",
            });
        }
        log::debug!("[field] {} built with {} particles", params.name, n);
        Ok(Self {
            position: rest.clone(),
            velocity: vec![Vec3::ZERO; n],
            color: vec![Vec3::ONE; n],
            drift: vec![Vec3::ZERO; n],
            size: vec![1.0; n],
            phase: vec![0.0; n],
            brightness: vec![1.0; n],
            speed: vec![1.0; n],
            rest,
            params,
            rng: StdRng::seed_from_u64(seed),
            resets: 0,
        })
    }

    pub fn with_colors(mut self, colors: Vec<Vec3>) -> Result<Self, ConstructionError> {
        self.check_len("color", colors.len())?;
        self.color = colors;
        Ok(self)
    }

    pub fn with_drift(mut self, drift: Vec<Vec3>) -> Result<Self, ConstructionError> {
        self.check_len("drift", drift.len())?;
        self.drift = drift;
        Ok(self)
    }

    pub fn with_speeds(mut self, speed: Vec<f32>) -> Result<Self, ConstructionError> {
        self.check_len("speed", speed.len())?;
        self.speed = speed;
        Ok(self)
    }

    pub fn with_sizes(mut self, size: Vec<f32>) -> Result<Self, ConstructionError> {
        self.check_len("size", size.len())?;
        self.size = size;
        Ok(self)
    }

    pub fn with_phases(mut self, phase: Vec<f32>) -> Result<Self, ConstructionError> {
        self.check_len("phase", phase.len())?;
        self.phase = phase;
        Ok(self)
    }

    pub fn with_brightness(mut self, brightness: Vec<f32>) -> Result<Self, ConstructionError> {
        self.check_len("brightness", brightness.len())?;
        self.brightness = brightness;
        Ok(self)
    }

    fn check_len(&self, column: &'static str, actual: usize) -> Result<(), ConstructionError> {
        if actual == self.rest.len() {
            Ok(())
        } else {
            Err(ConstructionError::ColumnLength {
                name: self.params.name,
                column,
                actual,
                expected: self.rest.len(),
            })
        }
    }

    pub fn set_source(&mut self, source: Source) {
        self.params.source = source;
    }

    /// Run one frame of the integrator.
    pub fn step(&mut self, frame: &FrameSnapshot) {
        let source = match self.params.source {
            Source::None => None,
            Source::Point(p) => Some(p),
            Source::Pointer => frame.pointer_world,
        };
        let flow = self
            .params
            .flow
            .map(|f| f.at(frame.progress) * frame.dt * REFERENCE_FPS)
            .unwrap_or(Vec3::ZERO);
        let FieldParams {
            anchor,
            repulsion,
            spring,
            damping,
            boundary,
            ..
        } = self.params;

        for i in 0..self.rest.len() {
            let home = match anchor {
                Anchor::Rest => self.rest[i],
                Anchor::Drift => self.position[i],
            };
            let mut offset = flow * self.speed[i] + self.drift[i];
            if let Some(src) = source {
                offset += repulsion.offset(home, src);
            }
            let target = home + offset;

            let mut vel = self.velocity[i] + (target - self.position[i]) * spring;
            vel *= damping;
            let mut pos = self.position[i] + vel;

            match boundary {
                Boundary::None => {}
                Boundary::Wrap { min, max, scatter } => {
                    wrap_into(&mut pos, min, max, scatter, &mut self.rng);
                }
                Boundary::Reflect { limit, factor } => {
                    for a in 0..3 {
                        if pos[a].abs() > limit[a] {
                            pos[a] *= -factor;
                        }
                    }
                }
                Boundary::Shell { radius } => {
                    if pos.length_squared() > radius * radius {
                        vel = -vel;
                        self.drift[i] = -self.drift[i];
                    }
                }
            }

            if pos.is_finite() && vel.is_finite() {
                self.position[i] = pos;
                self.velocity[i] = vel;
            } else {
                if self.resets == 0 {
                    log::warn!(
                        "[field] {}: particle {} went non-finite, resetting to rest",
                        self.params.name,
                        i
                    );
                }
                self.resets += 1;
                self.position[i] = self.rest[i];
                self.velocity[i] = Vec3::ZERO;
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rest.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    #[inline]
    pub fn params(&self) -> &FieldParams {
        &self.params
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.params.name
    }

    #[inline]
    pub fn rest(&self) -> &[Vec3] {
        &self.rest
    }

    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.position
    }

    #[inline]
    pub fn velocities(&self) -> &[Vec3] {
        &self.velocity
    }

    #[inline]
    pub fn colors(&self) -> &[Vec3] {
        &self.color
    }

    #[inline]
    pub fn colors_mut(&mut self) -> &mut [Vec3] {
        &mut self.color
    }

    #[inline]
    pub fn phases(&self) -> &[f32] {
        &self.phase
    }

    #[inline]
    pub fn brightness(&self) -> &[f32] {
        &self.brightness
    }

    #[inline]
    pub fn sizes(&self) -> &[f32] {
        &self.size
    }

    /// Positions as a flat `[x, y, z, x, y, z, ...]` buffer for the renderer.
    #[inline]
    pub fn positions_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.position)
    }

    #[inline]
    pub fn colors_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.color)
    }

    /// Directly place a particle (tests and scripted nudges).
    pub fn set_position(&mut self, i: usize, position: Vec3) {
        if let Some(p) = self.position.get_mut(i) {
            *p = position;
        }
    }

    pub fn set_velocity(&mut self, i: usize, velocity: Vec3) {
        if let Some(v) = self.velocity.get_mut(i) {
            *v = velocity;
        }
    }

    /// Number of particles reset after going non-finite.
    #[inline]
    pub fn resets(&self) -> u64 {
        self.resets
    }

    /// Mean distance between each particle and its rest position.
    pub fn mean_displacement(&self) -> f32 {
        let sum: f32 = self
            .position
            .iter()
            .zip(&self.rest)
            .map(|(p, r)| p.distance(*r))
            .sum();
        sum / self.rest.len() as f32
    }

    pub fn centroid(&self) -> Vec3 {
        self.position.iter().copied().sum::<Vec3>() / self.position.len() as f32
    }
}

fn wrap_into(pos: &mut Vec3, min: Vec3, max: Vec3, scatter: Vec3, rng: &mut StdRng) {
    for a in 0..3 {
        let exited = if pos[a] < min[a] {
            pos[a] = max[a];
            true
        } else if pos[a] > max[a] {
            pos[a] = min[a];
            true
        } else {
            false
        };
        if exited {
            for b in (0..3).filter(|&b| b != a && scatter[b] > 0.0) {
                pos[b] = rng.gen_range(-scatter[b]..=scatter[b]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> FrameSnapshot {
        FrameSnapshot {
            dt: 1.0 / 60.0,
            ..FrameSnapshot::default()
        }
    }

    #[test]
    fn force_falls_off_linearly() {
        let rep = Repulsion::new(10.0, 2.0);
        let near = rep.offset(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO);
        let mid = rep.offset(Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO);
        let out = rep.offset(Vec3::new(12.0, 0.0, 0.0), Vec3::ZERO);
        assert!((near.x - 1.8).abs() < 1e-5);
        assert!((mid.x - 1.0).abs() < 1e-5);
        assert_eq!(out, Vec3::ZERO);
    }

    #[test]
    fn coincident_source_exerts_no_force() {
        let rep = Repulsion::new(10.0, 2.0);
        assert_eq!(rep.offset(Vec3::ONE, Vec3::ONE), Vec3::ZERO);
    }

    #[test]
    fn metric_drops_depth_from_distance() {
        let rep = Repulsion {
            metric: Vec3::new(1.0, 1.0, 0.0),
            ..Repulsion::new(10.0, 1.0)
        };
        let f = rep.offset(Vec3::new(3.0, 0.0, 50.0), Vec3::ZERO);
        assert!(f.x > 0.0);
        assert_eq!(f.z, 0.0);
    }

    #[test]
    fn rejects_bad_configuration() {
        let rest = vec![Vec3::ZERO; 4];
        let bad_damping = FieldParams {
            damping: 1.0,
            ..FieldParams::default()
        };
        assert!(ParticleField::new(bad_damping, rest.clone(), 1).is_err());

        let wrap_on_rest = FieldParams {
            boundary: Boundary::Wrap {
                min: Vec3::splat(-1.0),
                max: Vec3::splat(1.0),
                scatter: Vec3::ZERO,
            },
            ..FieldParams::default()
        };
        assert!(matches!(
            ParticleField::new(wrap_on_rest, rest.clone(), 1),
            Err(ConstructionError::WrapNeedsDrift { .. })
        ));

        for scatter in [Vec3::new(0.0, f32::INFINITY, 0.0), Vec3::new(-1.0, 0.0, 0.0)] {
            let bad_scatter = FieldParams {
                anchor: Anchor::Drift,
                boundary: Boundary::Wrap {
                    min: Vec3::splat(-1.0),
                    max: Vec3::splat(1.0),
                    scatter,
                },
                ..FieldParams::default()
            };
            assert!(matches!(
                ParticleField::new(bad_scatter, rest.clone(), 1),
                Err(ConstructionError::InvalidParameter { .. })
            ));
        }

        assert!(matches!(
            ParticleField::new(FieldParams::default(), Vec::new(), 1),
            Err(ConstructionError::EmptyField { .. })
        ));

        let field = ParticleField::new(FieldParams::default(), rest, 1).unwrap();
        assert!(matches!(
            field.with_speeds(vec![1.0; 3]),
            Err(ConstructionError::ColumnLength { .. })
        ));
    }

    #[test]
    fn nan_particle_is_reset_to_rest() {
        let rest = vec![Vec3::new(1.0, 2.0, 3.0); 2];
        let mut field = ParticleField::new(FieldParams::default(), rest, 7).unwrap();
        field.set_velocity(1, Vec3::splat(f32::NAN));
        field.step(&frame());
        assert_eq!(field.positions()[1], Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(field.velocities()[1], Vec3::ZERO);
        assert_eq!(field.resets(), 1);
        assert!(field.positions()[0].is_finite());
    }

    #[test]
    fn reflect_flips_and_shrinks() {
        let params = FieldParams {
            anchor: Anchor::Drift,
            source: Source::None,
            spring: 1.0,
            damping: 0.5,
            boundary: Boundary::Reflect {
                limit: Vec3::splat(10.0),
                factor: 0.8,
            },
            ..FieldParams::default()
        };
        let mut field = ParticleField::new(params, vec![Vec3::ZERO], 3).unwrap();
        field.set_position(0, Vec3::new(12.0, 0.0, 0.0));
        field.step(&frame());
        assert!((field.positions()[0].x + 9.6).abs() < 1e-4);
    }

    #[test]
    fn shell_reverses_drift() {
        let params = FieldParams {
            anchor: Anchor::Drift,
            source: Source::None,
            spring: 1.0,
            damping: 0.5,
            boundary: Boundary::Shell { radius: 5.0 },
            ..FieldParams::default()
        };
        let mut field = ParticleField::new(params, vec![Vec3::new(4.9, 0.0, 0.0)], 3)
            .unwrap()
            .with_drift(vec![Vec3::new(0.5, 0.0, 0.0)])
            .unwrap();
        for _ in 0..40 {
            field.step(&frame());
        }
        assert!(field.positions()[0].length() < 6.0);
    }

    #[test]
    fn flat_buffers_mirror_positions() {
        let rest = vec![Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0)];
        let field = ParticleField::new(FieldParams::default(), rest, 0).unwrap();
        assert_eq!(field.positions_flat(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(field.colors_flat().len(), 6);
    }
}
