use glam::Vec2;

/// Client (CSS px) coordinates to normalized device coordinates, +y up.
/// Returns the centre when the element has no area.
#[inline]
pub fn client_to_ndc(client: Vec2, rect_origin: Vec2, rect_size: Vec2) -> Vec2 {
    if rect_size.x <= 0.0 || rect_size.y <= 0.0 {
        return Vec2::ZERO;
    }
    let uv = ((client - rect_origin) / rect_size).clamp(Vec2::ZERO, Vec2::ONE);
    Vec2::new(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0)
}

/// Fraction of the scrollable page that has been scrolled past.
#[inline]
pub fn scroll_fraction(scroll_y: f64, scroll_height: f64, viewport_height: f64) -> f32 {
    let max = scroll_height - viewport_height;
    if max.is_nan() || max <= 0.0 || !scroll_y.is_finite() {
        return 0.0;
    }
    (scroll_y / max).clamp(0.0, 1.0) as f32
}

/// Viewport handed to the scene: the CSS size when it is known and
/// non-empty, the backing size otherwise.
#[inline]
pub fn scene_viewport(css: Option<(f64, f64)>, backing: (u32, u32)) -> (f32, f32) {
    match css {
        Some((w, h)) if w >= 1.0 && h >= 1.0 && w.is_finite() && h.is_finite() => {
            (w as f32, h as f32)
        }
        _ => (backing.0.max(1) as f32, backing.1.max(1) as f32),
    }
}

/// Canvas backing size for a CSS size and device pixel ratio, never zero.
#[inline]
pub fn backing_size(css_width: f64, css_height: f64, dpr: f64) -> (u32, u32) {
    let dpr = if dpr.is_finite() && dpr > 0.0 { dpr.min(2.0) } else { 1.0 };
    let w = (css_width * dpr).max(1.0) as u32;
    let h = (css_height * dpr).max(1.0) as u32;
    (w, h)
}
