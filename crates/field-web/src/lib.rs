#![cfg(target_arch = "wasm32")]
mod dom;
mod events;
mod frame;
mod input;
mod sink;

use field_core::geometry::{GeometryLibrary, PointCloud};
use field_core::scenes::SceneKind;
use frame::FrameContext;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys as web;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("field-web starting");
    Ok(())
}

/// Point clouds handed over by the page (e.g. decoded from a model file).
#[wasm_bindgen]
#[derive(Default)]
pub struct Geometry {
    lib: GeometryLibrary,
}

#[wasm_bindgen]
impl Geometry {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// `positions` and optional `colors` are flat xyz / rgb triplets.
    #[wasm_bindgen(js_name = addCloud)]
    pub fn add_cloud(
        &mut self,
        key: String,
        positions: Vec<f32>,
        colors: Option<Vec<f32>>,
    ) -> Result<(), JsValue> {
        let cloud = PointCloud::from_flat(&positions, colors.as_deref())
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        log::info!("[geometry] {key}: {} points", cloud.len());
        self.lib.insert(key, cloud);
        Ok(())
    }
}

type Tick = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

struct Mount {
    ctx: Rc<RefCell<FrameContext>>,
    alive: Rc<Cell<bool>>,
    raf: Rc<Cell<Option<i32>>>,
    tick: Tick,
    listeners: dom::Listeners,
}

impl Mount {
    fn teardown(&mut self) {
        if !self.alive.replace(false) {
            return;
        }
        if let (Some(id), Some(w)) = (self.raf.take(), web::window()) {
            let _ = w.cancel_animation_frame(id);
        }
        self.listeners.clear();
        if let Ok(mut c) = self.ctx.try_borrow_mut() {
            c.scene.shutdown();
            log::info!("[mount] {} torn down", c.scene.name());
        }
        // break the closure's self-reference so it can be freed
        self.tick.borrow_mut().take();
    }
}

impl Drop for Mount {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// A running scene. Call `destroy()` (or `free()`) when the page goes away.
#[wasm_bindgen]
pub struct Mounted {
    inner: Mount,
}

#[wasm_bindgen]
impl Mounted {
    pub fn destroy(&mut self) {
        self.inner.teardown();
    }

    #[wasm_bindgen(js_name = isAlive)]
    pub fn is_alive(&self) -> bool {
        self.inner.alive.get()
    }
}

/// Start `scene` on the canvas with id `canvas_id`, publishing every frame to
/// `renderer` (an object with `layer(desc)` and `camera(eye, target)`).
#[wasm_bindgen]
pub fn mount(
    canvas_id: &str,
    scene: &str,
    renderer: JsValue,
    geometry: Option<Geometry>,
    seed: Option<f64>,
) -> Result<Mounted, JsValue> {
    mount_inner(canvas_id, scene, renderer, geometry, seed)
        .map(|inner| Mounted { inner })
        .map_err(|e| {
            log::error!("mount error: {e:?}");
            JsValue::from_str(&e.to_string())
        })
}

fn mount_inner(
    canvas_id: &str,
    scene: &str,
    renderer: JsValue,
    geometry: Option<Geometry>,
    seed: Option<f64>,
) -> anyhow::Result<Mount> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let document = dom::window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;
    let canvas: web::HtmlCanvasElement = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| anyhow::anyhow!("missing #{canvas_id}"))?
        .dyn_into::<web::HtmlCanvasElement>()
        .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;
    dom::sync_canvas_backing_size(&canvas);

    let kind: SceneKind = scene.parse()?;
    let seed = seed
        .filter(|s| s.is_finite() && *s >= 0.0)
        .unwrap_or_else(|| (js_sys::Math::random() * u32::MAX as f64).floor()) as u64;
    let aspect = canvas.width() as f32 / canvas.height().max(1) as f32;
    let lib = geometry.map(|g| g.lib).unwrap_or_default();
    let built = kind.build_with(seed, aspect, &lib)?;
    log::info!("[mount] {kind} on #{canvas_id} (seed {seed})");

    let sink = sink::JsSink::new(renderer)?;
    let ctx = Rc::new(RefCell::new(FrameContext::new(built, sink, canvas)));
    let listeners = events::wire_input_handlers(&window, &ctx);

    let alive = Rc::new(Cell::new(true));
    let raf: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
    let tick: Tick = Rc::new(RefCell::new(None));
    {
        let ctx = ctx.clone();
        let alive = alive.clone();
        let raf = raf.clone();
        let tick_clone = tick.clone();
        *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            raf.set(None);
            if !alive.get() {
                return;
            }
            let running = match ctx.try_borrow_mut() {
                Ok(mut c) => c.frame(),
                Err(_) => true,
            };
            if !running {
                alive.set(false);
                return;
            }
            // Schedule next frame
            if let (Some(w), Some(cb)) = (web::window(), tick_clone.borrow().as_ref()) {
                raf.set(w.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
            }
        }) as Box<dyn FnMut()>));
    }
    if let Some(cb) = tick.borrow().as_ref() {
        let id = window
            .request_animation_frame(cb.as_ref().unchecked_ref())
            .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;
        raf.set(Some(id));
    }

    Ok(Mount {
        ctx,
        alive,
        raf,
        tick,
        listeners,
    })
}
