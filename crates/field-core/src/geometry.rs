//! Rest geometry handed to the simulation: point clouds and paths.
//!
//! Where the points come from (sampled meshes, procedural shapes, data
//! shipped from the page) is the provider's business. The simulation only
//! sees opaque position/color arrays and parametric curves.

use fnv::FnvHashMap;
use glam::Vec3;
use rand::prelude::*;

use crate::error::ConstructionError;

/// Key of the car body cloud, in car-local space (forward is -Z).
pub const CAR_BODY: &str = "car.body";
/// Key of a single wheel cloud, relative to the wheel centre.
pub const CAR_WHEEL: &str = "car.wheel";

pub trait Path {
    /// Point at parameter `t` in [0, 1].
    fn point(&self, t: f32) -> Vec3;

    /// Unit tangent at `t`.
    fn tangent(&self, t: f32) -> Vec3 {
        const H: f32 = 1e-3;
        let (a, b) = if t + H <= 1.0 { (t, t + H) } else { (t - H, t) };
        (self.point(b) - self.point(a)).normalize_or_zero()
    }
}

/// Piecewise-linear path parameterised by arc length.
#[derive(Clone, Debug)]
pub struct Polyline {
    points: Vec<Vec3>,
    cumulative: Vec<f32>,
}

impl Polyline {
    pub fn new(points: Vec<Vec3>) -> Result<Self, ConstructionError> {
        if points.len() < 2 {
            return Err(ConstructionError::InvalidParameter {
                name: "polyline.points",
                value: points.len() as f32,
                expected: ">= 2 points",
            });
        }
        let mut cumulative = Vec::with_capacity(points.len());
        let mut acc = 0.0;
        cumulative.push(0.0);
        for w in points.windows(2) {
            acc += w[0].distance(w[1]);
            cumulative.push(acc);
        }
        if acc <= 0.0 || !acc.is_finite() {
            return Err(ConstructionError::InvalidParameter {
                name: "polyline.length",
                value: acc,
                expected: "> 0",
            });
        }
        Ok(Self { points, cumulative })
    }

    pub fn length(&self) -> f32 {
        self.cumulative[self.cumulative.len() - 1]
    }
}

impl Path for Polyline {
    fn point(&self, t: f32) -> Vec3 {
        let s = t.clamp(0.0, 1.0) * self.length();
        let seg = self
            .cumulative
            .partition_point(|&c| c <= s)
            .clamp(1, self.points.len() - 1);
        let (c0, c1) = (self.cumulative[seg - 1], self.cumulative[seg]);
        let u = if c1 > c0 { (s - c0) / (c1 - c0) } else { 0.0 };
        self.points[seg - 1].lerp(self.points[seg], u)
    }
}

/// Open uniform Catmull-Rom spline through its control points.
#[derive(Clone, Debug)]
pub struct CatmullRom {
    points: Vec<Vec3>,
    tension: f32,
}

impl CatmullRom {
    pub fn new(points: Vec<Vec3>, tension: f32) -> Result<Self, ConstructionError> {
        if points.len() < 2 {
            return Err(ConstructionError::InvalidParameter {
                name: "spline.points",
                value: points.len() as f32,
                expected: ">= 2 points",
            });
        }
        Ok(Self { points, tension })
    }
}

impl Path for CatmullRom {
    fn point(&self, t: f32) -> Vec3 {
        let n = self.points.len();
        let p = (n - 1) as f32 * t.clamp(0.0, 1.0);
        let mut i = p.floor() as usize;
        let mut w = p - i as f32;
        if i >= n - 1 {
            i = n - 2;
            w = 1.0;
        }
        let p1 = self.points[i];
        let p2 = self.points[i + 1];
        let p0 = if i > 0 { self.points[i - 1] } else { p1 * 2.0 - p2 };
        let p3 = if i + 2 < n { self.points[i + 2] } else { p2 * 2.0 - p1 };

        // cubic Hermite with Catmull-Rom tangents
        let m1 = (p2 - p0) * self.tension;
        let m2 = (p3 - p1) * self.tension;
        let w2 = w * w;
        let w3 = w2 * w;
        p1 * (2.0 * w3 - 3.0 * w2 + 1.0)
            + m1 * (w3 - 2.0 * w2 + w)
            + p2 * (-2.0 * w3 + 3.0 * w2)
            + m2 * (w3 - w2)
    }
}

/// Rest positions plus per-point colors.
#[derive(Clone, Debug, Default)]
pub struct PointCloud {
    pub positions: Vec<Vec3>,
    pub colors: Vec<Vec3>,
}

impl PointCloud {
    /// White cloud at the given positions.
    pub fn new(positions: Vec<Vec3>) -> Self {
        let colors = vec![Vec3::ONE; positions.len()];
        Self { positions, colors }
    }

    /// Build from flat xyz (and optional rgb) buffers, as shipped by a page.
    pub fn from_flat(positions: &[f32], colors: Option<&[f32]>) -> Result<Self, ConstructionError> {
        if positions.len() % 3 != 0 {
            return Err(ConstructionError::InvalidParameter {
                name: "cloud.positions",
                value: positions.len() as f32,
                expected: "a multiple of 3",
            });
        }
        let pos: Vec<Vec3> = positions.chunks_exact(3).map(Vec3::from_slice).collect();
        let col = match colors {
            Some(c) if c.len() == positions.len() => c.chunks_exact(3).map(Vec3::from_slice).collect(),
            Some(c) => {
                return Err(ConstructionError::ColumnLength {
                    name: "cloud",
                    column: "color",
                    actual: c.len() / 3,
                    expected: pos.len(),
                })
            }
            None => vec![Vec3::ONE; pos.len()],
        };
        Ok(Self {
            positions: pos,
            colors: col,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Anything that can hand out named point clouds.
pub trait GeometrySource {
    fn cloud(&self, key: &str) -> Option<PointCloud>;
}

/// Clouds registered up front, keyed by name.
#[derive(Clone, Debug, Default)]
pub struct GeometryLibrary {
    clouds: FnvHashMap<String, PointCloud>,
}

impl GeometryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, cloud: PointCloud) {
        self.clouds.insert(key.into(), cloud);
    }

    pub fn len(&self) -> usize {
        self.clouds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clouds.is_empty()
    }
}

impl GeometrySource for GeometryLibrary {
    fn cloud(&self, key: &str) -> Option<PointCloud> {
        self.clouds.get(key).cloned()
    }
}

/// Seeded stand-in shapes used when no real geometry was provided.
#[derive(Clone, Copy, Debug)]
pub struct Procedural {
    pub seed: u64,
}

impl GeometrySource for Procedural {
    fn cloud(&self, key: &str) -> Option<PointCloud> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        match key {
            CAR_BODY => Some(car_body(&mut rng, 6000)),
            CAR_WHEEL => Some(wheel(&mut rng, 600)),
            _ => None,
        }
    }
}

/// Look `key` up in `source`, falling back to the procedural shape.
pub fn cloud_or_procedural(source: &dyn GeometrySource, key: &str, seed: u64) -> Option<PointCloud> {
    source.cloud(key).or_else(|| {
        log::info!("[geometry] no `{key}` provided, using procedural stand-in");
        Procedural { seed }.cloud(key)
    })
}

/// Points scattered over a rounded box roughly the size of a hatchback,
/// resting on y = 0 and facing -Z.
fn car_body(rng: &mut StdRng, n: usize) -> PointCloud {
    let half = Vec3::new(0.8, 0.5, 1.6);
    let mut positions = Vec::with_capacity(n);
    let mut colors = Vec::with_capacity(n);
    for _ in 0..n {
        let mut p = Vec3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        // push onto the surface of the unit cube
        let axis = rng.gen_range(0..3);
        p[axis] = p[axis].signum();
        // narrower cabin on the upper half
        let cabin = if p.y > 0.0 { 0.75 } else { 1.0 };
        let mut q = p * half * Vec3::new(cabin, 1.0, cabin);
        q.y += half.y + 0.2;
        q += Vec3::new(
            rng.gen_range(-0.03..=0.03),
            rng.gen_range(-0.03..=0.03),
            rng.gen_range(-0.03..=0.03),
        );
        positions.push(q);
        colors.push(Vec3::splat(rng.gen_range(0.7..=1.0)));
    }
    PointCloud { positions, colors }
}

/// Tyre ring around the local X axis.
fn wheel(rng: &mut StdRng, n: usize) -> PointCloud {
    let mut positions = Vec::with_capacity(n);
    let mut colors = Vec::with_capacity(n);
    for _ in 0..n {
        let a = rng.gen_range(0.0..std::f32::consts::TAU);
        let r = rng.gen_range(0.22..=0.38f32);
        let x = rng.gen_range(-0.12..=0.12);
        positions.push(Vec3::new(x, a.sin() * r, a.cos() * r));
        colors.push(Vec3::splat(if r > 0.3 { 0.3 } else { 0.85 }));
    }
    PointCloud { positions, colors }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polyline_is_arc_length_parameterised() {
        let line = Polyline::new(vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 3.0, 0.0)]).unwrap();
        assert_eq!(line.length(), 4.0);
        assert!((line.point(0.25) - Vec3::X).length() < 1e-5);
        assert!((line.point(0.5) - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5);
        assert_eq!(line.point(2.0), Vec3::new(1.0, 3.0, 0.0));
        assert!((line.tangent(0.9) - Vec3::Y).length() < 1e-4);
    }

    #[test]
    fn spline_passes_through_control_points() {
        let pts = vec![Vec3::ZERO, Vec3::new(10.0, 1.0, -40.0), Vec3::new(30.0, 4.0, -80.0)];
        let spline = CatmullRom::new(pts.clone(), 0.5).unwrap();
        assert!((spline.point(0.0) - pts[0]).length() < 1e-4);
        assert!((spline.point(0.5) - pts[1]).length() < 1e-4);
        assert!((spline.point(1.0) - pts[2]).length() < 1e-4);
    }

    #[test]
    fn degenerate_paths_are_rejected() {
        assert!(Polyline::new(vec![Vec3::ONE]).is_err());
        assert!(Polyline::new(vec![Vec3::ONE, Vec3::ONE]).is_err());
        assert!(CatmullRom::new(Vec::new(), 0.5).is_err());
    }

    #[test]
    fn flat_clouds_validate_lengths() {
        let c = PointCloud::from_flat(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0], None).unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c.positions[1], Vec3::new(3.0, 4.0, 5.0));
        assert!(PointCloud::from_flat(&[0.0, 1.0], None).is_err());
        assert!(PointCloud::from_flat(&[0.0; 6], Some(&[1.0; 3])).is_err());
    }

    #[test]
    fn library_falls_back_to_procedural() {
        let mut lib = GeometryLibrary::new();
        assert!(cloud_or_procedural(&lib, CAR_BODY, 1).is_some());
        lib.insert(CAR_BODY, PointCloud::new(vec![Vec3::ZERO; 3]));
        assert_eq!(cloud_or_procedural(&lib, CAR_BODY, 1).map(|c| c.len()), Some(3));
        assert!(cloud_or_procedural(&lib, "nope", 1).is_none());
    }
}
