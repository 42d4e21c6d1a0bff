use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

/// Match the backing store to the displayed size. Returns the CSS size.
pub fn sync_canvas_backing_size(canvas: &web::HtmlCanvasElement) -> Option<(f64, f64)> {
    let w = web::window()?;
    let rect = canvas.get_bounding_client_rect();
    let (w_px, h_px) =
        crate::input::backing_size(rect.width(), rect.height(), w.device_pixel_ratio());
    canvas.set_width(w_px);
    canvas.set_height(h_px);
    Some((rect.width(), rect.height()))
}

/// Current page scroll as a fraction of the scrollable height.
pub fn page_scroll_fraction() -> f32 {
    let Some(window) = web::window() else {
        return 0.0;
    };
    let scroll_y = window.scroll_y().unwrap_or(0.0);
    let viewport = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    let height = window
        .document()
        .and_then(|d| d.document_element())
        .map(|el| el.scroll_height() as f64)
        .unwrap_or(0.0);
    crate::input::scroll_fraction(scroll_y, height, viewport)
}

/// Event listeners registered by one mounted scene, removed on teardown.
#[derive(Default)]
pub struct Listeners {
    bound: Vec<(web::EventTarget, &'static str, Closure<dyn FnMut(web::Event)>)>,
}

impl Listeners {
    pub fn add(
        &mut self,
        target: &web::EventTarget,
        event: &'static str,
        handler: impl FnMut(web::Event) + 'static,
    ) {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web::Event)>);
        if let Err(e) =
            target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        {
            log::warn!("[dom] could not listen for {event}: {e:?}");
            return;
        }
        self.bound.push((target.clone(), event, closure));
    }

    pub fn clear(&mut self) {
        for (target, event, closure) in self.bound.drain(..) {
            let _ = target
                .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        }
    }
}
