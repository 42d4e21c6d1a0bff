//! Frame-stepped simulation behind the driftfield pages.
//!
//! Everything here is renderer-agnostic: scenes publish flat `f32` buffers
//! through a [`RenderSink`] and never touch a GPU or the DOM.

pub mod camera;
pub mod clock;
pub mod constants;
pub mod error;
pub mod field;
pub mod geometry;
pub mod glow;
pub mod graph;
pub mod pointer;
pub mod pool;
pub mod pulse;
pub mod render;
pub mod router;
pub mod scene;
pub mod scenes;
pub mod schedule;
pub mod scroll;

pub use camera::{Camera, CameraPose, CameraRig};
pub use clock::FrameClock;
pub use error::ConstructionError;
pub use field::{Anchor, Boundary, FieldParams, Flow, ParticleField, Repulsion, Source};
pub use geometry::{CatmullRom, GeometryLibrary, GeometrySource, Path, PointCloud, Polyline};
pub use glow::{GlowParams, NodeGlow};
pub use graph::{Edge, EdgeId, Graph, NodeId};
pub use pointer::{PointerProjector, ProjectionPlane};
pub use pool::{Poolable, RingPool};
pub use pulse::{Pulse, PulseGraph, PulseParams};
pub use render::{Layer, NullSink, Primitive, RenderSink, Style};
pub use router::{AgentRouter, RouterParams};
pub use scene::{FrameSnapshot, Scene, SceneContext};
pub use scenes::SceneKind;
pub use scroll::ScrollState;
