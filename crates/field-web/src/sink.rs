use field_core::camera::CameraPose;
use field_core::render::{Layer, Primitive, RenderSink};
use glam::Mat4;
use js_sys::{Array, Float32Array, Function, Object, Reflect};
use wasm_bindgen::{JsCast, JsValue};

/// Forwards published layers to a JS renderer object exposing
/// `layer(desc)` and `camera(eye, target)`.
///
/// Buffers are copied into fresh `Float32Array`s: a view into Wasm memory
/// would dangle as soon as the next frame grows the heap.
pub struct JsSink {
    renderer: JsValue,
    layer_fn: Function,
    camera_fn: Function,
    errors: u32,
}

fn method(renderer: &JsValue, name: &str) -> anyhow::Result<Function> {
    Reflect::get(renderer, &JsValue::from_str(name))
        .ok()
        .and_then(|f| f.dyn_into::<Function>().ok())
        .ok_or_else(|| anyhow::anyhow!("renderer has no `{name}` function"))
}

fn set(obj: &Object, key: &str, value: &JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(key), value);
}

impl JsSink {
    pub fn new(renderer: JsValue) -> anyhow::Result<Self> {
        Ok(Self {
            layer_fn: method(&renderer, "layer")?,
            camera_fn: method(&renderer, "camera")?,
            renderer,
            errors: 0,
        })
    }

    fn report(&mut self, what: &str, err: JsValue) {
        // one line is enough, the renderer will fail the same way every frame
        if self.errors == 0 {
            log::error!("[sink] renderer.{what} threw: {err:?}");
        }
        self.errors += 1;
    }
}

impl RenderSink for JsSink {
    fn layer(&mut self, layer: Layer<'_>) {
        let desc = Object::new();
        set(&desc, "name", &JsValue::from_str(layer.name));
        let primitive = match layer.style.primitive {
            Primitive::Points => "points",
            Primitive::Lines => "lines",
        };
        set(&desc, "primitive", &JsValue::from_str(primitive));
        set(&desc, "size", &JsValue::from_f64(layer.style.size as f64));
        set(&desc, "opacity", &JsValue::from_f64(layer.style.opacity as f64));
        set(&desc, "additive", &JsValue::from_bool(layer.style.additive));
        set(&desc, "positions", &Float32Array::from(layer.positions).into());
        if let Some(colors) = layer.colors {
            set(&desc, "colors", &Float32Array::from(colors).into());
        }
        if let Some(sizes) = layer.sizes {
            set(&desc, "sizes", &Float32Array::from(sizes).into());
        }
        if let Some(t) = layer.transform {
            let cols = Mat4::from(t).to_cols_array();
            set(&desc, "transform", &Float32Array::from(&cols[..]).into());
        }
        if let Err(e) = self.layer_fn.call1(&self.renderer, &desc) {
            self.report("layer", e);
        }
    }

    fn camera(&mut self, pose: CameraPose) {
        let eye = Array::of3(
            &JsValue::from_f64(pose.eye.x as f64),
            &JsValue::from_f64(pose.eye.y as f64),
            &JsValue::from_f64(pose.eye.z as f64),
        );
        let target = Array::of3(
            &JsValue::from_f64(pose.target.x as f64),
            &JsValue::from_f64(pose.target.y as f64),
            &JsValue::from_f64(pose.target.z as f64),
        );
        if let Err(e) = self.camera_fn.call2(&self.renderer, &eye, &target) {
            self.report("camera", e);
        }
    }
}
