//! The five page animations, each a composition of the shared engines.

use std::fmt;
use std::str::FromStr;

use crate::error::ConstructionError;
use crate::geometry::{GeometrySource, Procedural};
use crate::scene::Scene;

pub mod network;
pub mod rain;
pub mod road;
pub mod sphere;
pub mod traffic;

pub use network::NetworkScene;
pub use rain::RainScene;
pub use road::RoadScene;
pub use sphere::SphereScene;
pub use traffic::TrafficScene;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SceneKind {
    Rain,
    Road,
    Network,
    Sphere,
    Traffic,
}

impl SceneKind {
    pub const ALL: [SceneKind; 5] = [
        SceneKind::Rain,
        SceneKind::Road,
        SceneKind::Network,
        SceneKind::Sphere,
        SceneKind::Traffic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SceneKind::Rain => "rain",
            SceneKind::Road => "road",
            SceneKind::Network => "network",
            SceneKind::Sphere => "sphere",
            SceneKind::Traffic => "traffic",
        }
    }

    /// Build with procedural stand-ins for any external geometry.
    pub fn build(self, seed: u64, aspect: f32) -> Result<Box<dyn Scene>, ConstructionError> {
        self.build_with(seed, aspect, &Procedural { seed })
    }

    pub fn build_with(
        self,
        seed: u64,
        aspect: f32,
        geometry: &dyn GeometrySource,
    ) -> Result<Box<dyn Scene>, ConstructionError> {
        log::info!("[scene] building {} (seed {seed})", self.name());
        Ok(match self {
            SceneKind::Rain => Box::new(RainScene::new(seed, aspect)?),
            SceneKind::Road => Box::new(RoadScene::new(seed, aspect, geometry)?),
            SceneKind::Network => Box::new(NetworkScene::new(seed, aspect)?),
            SceneKind::Sphere => Box::new(SphereScene::new(seed, aspect)?),
            SceneKind::Traffic => Box::new(TrafficScene::new(seed, aspect)?),
        })
    }
}

impl FromStr for SceneKind {
    type Err = ConstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SceneKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConstructionError::UnknownScene(s.to_string()))
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-component RNG seed derived from the scene seed.
#[inline]
pub(crate) fn sub_seed(seed: u64, component: u64) -> u64 {
    seed ^ component.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Uniform point on the unit sphere.
pub(crate) fn unit_sphere<R: rand::Rng>(rng: &mut R) -> glam::Vec3 {
    let theta = rng.gen_range(0.0..std::f32::consts::TAU);
    let phi = (2.0 * rng.gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
    glam::Vec3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos())
}

/// Slowly drifting dust inside a spherical shell of radius `spread`; starts
/// between `inner * spread` and `spread` and bounces off the shell.
pub(crate) fn shell_dust(
    name: &'static str,
    count: usize,
    inner: f32,
    spread: f32,
    velocity: glam::Vec3,
    seed: u64,
) -> Result<crate::field::ParticleField, ConstructionError> {
    use crate::field::{Anchor, Boundary, FieldParams, ParticleField, Source};
    use rand::prelude::*;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut rest = Vec::with_capacity(count);
    let mut drift = Vec::with_capacity(count);
    for _ in 0..count {
        let r = spread * (inner + (1.0 - inner) * rng.gen::<f32>());
        rest.push(unit_sphere(&mut rng) * r);
        drift.push(
            glam::Vec3::new(rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5)
                * velocity,
        );
    }
    let params = FieldParams {
        name,
        anchor: Anchor::Drift,
        source: Source::None,
        spring: 1.0,
        damping: 0.5,
        boundary: Boundary::Shell { radius: spread },
        ..FieldParams::default()
    };
    ParticleField::new(params, rest, seed)?.with_drift(drift)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_names_round_trip() {
        for kind in SceneKind::ALL {
            assert_eq!(kind.name().parse::<SceneKind>().unwrap(), kind);
        }
        assert_eq!(" Rain ".parse::<SceneKind>().unwrap(), SceneKind::Rain);
        assert_eq!(
            "lava".parse::<SceneKind>().unwrap_err(),
            ConstructionError::UnknownScene("lava".into())
        );
    }

    #[test]
    fn sub_seeds_differ() {
        assert_ne!(sub_seed(7, 1), sub_seed(7, 2));
        assert_eq!(sub_seed(7, 0), 7);
    }
}
