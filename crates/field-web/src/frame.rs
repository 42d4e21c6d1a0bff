use crate::sink::JsSink;
use field_core::scene::Scene;
use instant::Instant;
use web_sys as web;

pub struct FrameContext {
    pub scene: Box<dyn Scene>,
    pub sink: JsSink,
    pub canvas: web::HtmlCanvasElement,
    pub last_instant: Instant,
}

impl FrameContext {
    pub fn new(scene: Box<dyn Scene>, sink: JsSink, canvas: web::HtmlCanvasElement) -> Self {
        let mut ctx = Self {
            scene,
            sink,
            canvas,
            last_instant: Instant::now(),
        };
        ctx.resize();
        ctx.scene.set_scroll_target(crate::dom::page_scroll_fraction());
        ctx
    }

    /// Run one animation frame. Returns false once the scene has shut down.
    pub fn frame(&mut self) -> bool {
        let now = Instant::now();
        let dt = (now - self.last_instant).as_secs_f32();
        self.last_instant = now;
        self.scene.frame(dt, &mut self.sink).is_some()
    }

    /// Scenes measure the pointer in CSS pixels, so they get the CSS size
    /// rather than the backing store.
    pub fn resize(&mut self) {
        let css = crate::dom::sync_canvas_backing_size(&self.canvas);
        let backing = (self.canvas.width(), self.canvas.height());
        let (w, h) = crate::input::scene_viewport(css, backing);
        self.scene.resize(w, h);
    }
}
