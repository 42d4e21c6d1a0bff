use crate::dom::Listeners;
use crate::frame::FrameContext;
use glam::Vec2;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Pointer, scroll and resize input for one mounted scene.
pub fn wire_input_handlers(window: &web::Window, ctx: &Rc<RefCell<FrameContext>>) -> Listeners {
    let mut listeners = Listeners::default();
    let target: &web::EventTarget = window.as_ref();

    // pointermove: the whole page steers the scene, not just the canvas
    {
        let ctx = ctx.clone();
        listeners.add(target, "pointermove", move |ev| {
            let Some(ev) = ev.dyn_ref::<web::PointerEvent>() else {
                return;
            };
            let Ok(mut c) = ctx.try_borrow_mut() else {
                return;
            };
            let rect = c.canvas.get_bounding_client_rect();
            let ndc = crate::input::client_to_ndc(
                Vec2::new(ev.client_x() as f32, ev.client_y() as f32),
                Vec2::new(rect.left() as f32, rect.top() as f32),
                Vec2::new(rect.width() as f32, rect.height() as f32),
            );
            c.scene.set_pointer(ndc);
        });
    }

    {
        let ctx = ctx.clone();
        listeners.add(target, "scroll", move |_| {
            if let Ok(mut c) = ctx.try_borrow_mut() {
                c.scene.set_scroll_target(crate::dom::page_scroll_fraction());
            }
        });
    }

    {
        let ctx = ctx.clone();
        listeners.add(target, "resize", move |_| {
            if let Ok(mut c) = ctx.try_borrow_mut() {
                c.resize();
                log::debug!(
                    "[resize] canvas {}x{}",
                    c.canvas.width(),
                    c.canvas.height()
                );
            }
        });
    }

    listeners
}
