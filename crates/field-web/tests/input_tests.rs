// Host-side tests for pure input functions.
// The web crate is wasm-only, so we include the pure-Rust modules directly.

#![allow(dead_code)]
mod input {
    include!("../src/input.rs");
}

use glam::Vec2;
use input::*;

#[test]
fn canvas_corners_map_to_ndc_corners() {
    let origin = Vec2::new(100.0, 50.0);
    let size = Vec2::new(800.0, 600.0);
    assert_eq!(client_to_ndc(origin, origin, size), Vec2::new(-1.0, 1.0));
    assert_eq!(client_to_ndc(origin + size, origin, size), Vec2::new(1.0, -1.0));
    assert_eq!(client_to_ndc(origin + size / 2.0, origin, size), Vec2::ZERO);
}

#[test]
fn pointer_outside_canvas_is_clamped() {
    let ndc = client_to_ndc(Vec2::new(-500.0, 5000.0), Vec2::ZERO, Vec2::new(100.0, 100.0));
    assert_eq!(ndc, Vec2::new(-1.0, -1.0));
}

#[test]
fn zero_sized_canvas_reports_centre() {
    assert_eq!(client_to_ndc(Vec2::new(3.0, 4.0), Vec2::ZERO, Vec2::ZERO), Vec2::ZERO);
}

#[test]
fn scroll_fraction_spans_the_scrollable_height() {
    assert_eq!(scroll_fraction(0.0, 3000.0, 1000.0), 0.0);
    assert_eq!(scroll_fraction(1000.0, 3000.0, 1000.0), 0.5);
    assert_eq!(scroll_fraction(2500.0, 3000.0, 1000.0), 1.0);
    // page shorter than the viewport cannot scroll
    assert_eq!(scroll_fraction(10.0, 800.0, 1000.0), 0.0);
    assert_eq!(scroll_fraction(f64::NAN, 3000.0, 1000.0), 0.0);
}

#[test]
fn backing_size_caps_pixel_ratio() {
    assert_eq!(backing_size(400.0, 300.0, 1.0), (400, 300));
    assert_eq!(backing_size(400.0, 300.0, 3.0), (800, 600));
    assert_eq!(backing_size(0.0, 0.0, 2.0), (1, 1));
    assert_eq!(backing_size(400.0, 300.0, f64::NAN), (400, 300));
}

#[test]
fn scene_viewport_is_measured_in_css_pixels() {
    // a 2x display backs a 400x300 canvas with 800x600 pixels
    let backing = backing_size(400.0, 300.0, 2.0);
    assert_eq!(scene_viewport(Some((400.0, 300.0)), backing), (400.0, 300.0));
    // without a layout box fall back to the backing store
    assert_eq!(scene_viewport(None, backing), (800.0, 600.0));
    assert_eq!(scene_viewport(Some((0.0, 0.0)), (1, 1)), (1.0, 1.0));
}
