//! The seam between the simulation and whatever draws it.
//!
//! Scenes never touch a graphics API. Once per frame they hand each drawable
//! layer to a [`RenderSink`] as flat `f32` slices borrowed straight from
//! their own storage, then publish the camera pose.

use glam::Affine3A;

use crate::camera::CameraPose;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    Points,
    /// Pairs of vertices, one segment per pair.
    Lines,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Style {
    pub primitive: Primitive,
    pub size: f32,
    pub opacity: f32,
    pub additive: bool,
}

impl Style {
    pub const fn points(size: f32, opacity: f32) -> Self {
        Self {
            primitive: Primitive::Points,
            size,
            opacity,
            additive: true,
        }
    }

    pub const fn lines(opacity: f32) -> Self {
        Self {
            primitive: Primitive::Lines,
            size: 1.0,
            opacity,
            additive: false,
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }
}

/// One drawable buffer for the current frame.
#[derive(Clone, Copy, Debug)]
pub struct Layer<'a> {
    /// Stable identifier; the renderer keys its GPU objects on it.
    pub name: &'static str,
    pub style: Style,
    /// xyz triplets.
    pub positions: &'a [f32],
    /// rgb triplets, or `None` for plain white.
    pub colors: Option<&'a [f32]>,
    /// Per-vertex size multipliers.
    pub sizes: Option<&'a [f32]>,
    /// Local-to-world transform for layers stored in object space.
    pub transform: Option<Affine3A>,
}

impl<'a> Layer<'a> {
    pub fn new(name: &'static str, style: Style, positions: &'a [f32]) -> Self {
        Self {
            name,
            style,
            positions,
            colors: None,
            sizes: None,
            transform: None,
        }
    }

    pub fn colors(mut self, colors: &'a [f32]) -> Self {
        self.colors = Some(colors);
        self
    }

    pub fn sizes(mut self, sizes: &'a [f32]) -> Self {
        self.sizes = Some(sizes);
        self
    }

    pub fn transform(mut self, transform: Affine3A) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Number of vertices in the layer.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

pub trait RenderSink {
    fn layer(&mut self, layer: Layer<'_>);

    fn camera(&mut self, pose: CameraPose);

    fn points(&mut self, name: &'static str, positions: &[f32], colors: Option<&[f32]>, style: Style) {
        let mut layer = Layer::new(name, style, positions);
        layer.colors = colors;
        self.layer(layer);
    }

    fn lines(&mut self, name: &'static str, positions: &[f32], colors: &[f32], style: Style) {
        self.layer(Layer::new(name, style, positions).colors(colors));
    }
}

/// Sink that drops everything. Handy for headless stepping.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn layer(&mut self, _layer: Layer<'_>) {}

    fn camera(&mut self, _pose: CameraPose) {}
}
