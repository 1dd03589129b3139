//! banner3d web front-end
//!
//! Draws the banner into a 2D canvas with the software rasterizer and drives
//! it from `requestAnimationFrame`.
use std::cell::RefCell;
use std::rc::Rc;

use banner3d_core::{Banner, BannerConfig, Framebuffer};
use wasm_bindgen::prelude::*;
use wasm_bindgen::{Clamped, JsCast};
use web_sys::{
    CanvasRenderingContext2d, Event, EventTarget, HtmlCanvasElement, HtmlElement, ImageData,
    MouseEvent, WheelEvent, Window,
};

/// Canvas pixels per CSS pixel
const RESOLUTION_SCALE: f64 = 0.5;

/// Left mouse button in `MouseEvent::button`
const LEFT_BUTTON: i16 = 0;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    Ok(())
}

/// Canvas size for a container, never zero.
pub fn canvas_size(client_width: i32, client_height: i32, scale: f64) -> (u32, u32) {
    let scaled = |v: i32| ((f64::from(v.max(0)) * scale).round() as u32).max(1);
    (scaled(client_width), scaled(client_height))
}

struct Drag {
    button: i16,
    x: i32,
    y: i32,
}

/// Everything the frame and input callbacks share
struct State {
    banner: Banner,
    framebuffer: Framebuffer,
    pixels: Vec<u8>,
    context: CanvasRenderingContext2d,
    canvas: HtmlCanvasElement,
    container: HtmlElement,
    drag: Option<Drag>,
    frame_id: Option<i32>,
    destroyed: bool,
}

impl State {
    /// Follow the container size; the banner redraws on the next frame.
    fn fit_container(&mut self) {
        let (width, height) = canvas_size(
            self.container.client_width(),
            self.container.client_height(),
            RESOLUTION_SCALE,
        );
        if (width, height) == (self.framebuffer.width(), self.framebuffer.height()) {
            return;
        }
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.banner.resize(&mut self.framebuffer, width, height);
        log::debug!("canvas resized to {}x{}", width, height);
    }

    fn draw(&mut self) -> Result<(), JsValue> {
        self.fit_container();
        if !self.banner.frame(&mut self.framebuffer) {
            return Ok(());
        }
        self.framebuffer.write_rgba8(&mut self.pixels);
        let image = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(self.pixels.as_slice()),
            self.framebuffer.width(),
            self.framebuffer.height(),
        )?;
        self.context.put_image_data(&image, 0.0, 0.0)
    }

    fn drag_to(&mut self, x: i32, y: i32) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let (dx, dy) = ((x - drag.x) as f32, (y - drag.y) as f32);
        drag.x = x;
        drag.y = y;
        let button = drag.button;

        // Drags are measured in CSS pixels, so use the on-page size
        let width = self.canvas.client_width().max(1) as u32;
        let height = self.canvas.client_height().max(1) as u32;
        let Banner {
            camera, controls, ..
        } = &mut self.banner;
        let Some(controls) = controls.as_mut() else {
            return;
        };
        if button == LEFT_BUTTON {
            controls.rotate_drag(dx, dy, height);
        } else {
            controls.pan_drag(dx, dy, camera, width, height);
        }
    }

    fn wheel(&mut self, delta_y: f32) {
        let Banner {
            camera, controls, ..
        } = &mut self.banner;
        if let Some(controls) = controls.as_mut() {
            controls.zoom_wheel(camera, delta_y);
        }
    }
}

struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

fn listen(
    target: &EventTarget,
    kind: &'static str,
    handler: impl FnMut(Event) + 'static,
) -> Result<Listener, JsValue> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
    Ok(Listener {
        target: target.clone(),
        kind,
        closure,
    })
}

/// A running banner inside a page element
#[wasm_bindgen]
pub struct BannerRender {
    window: Window,
    canvas: HtmlCanvasElement,
    state: Rc<RefCell<State>>,
    frame: FrameCallback,
    listeners: Vec<Listener>,
    destroyed: bool,
}

/// Build a banner in `container` and start drawing it. `config_toml`
/// overrides the default settings.
#[wasm_bindgen(js_name = createBannerRender)]
pub fn create_banner_render(
    container: HtmlElement,
    config_toml: Option<String>,
) -> Result<BannerRender, JsValue> {
    let config = match config_toml {
        Some(source) => BannerConfig::from_toml_str(&source),
        None => Ok(BannerConfig::default()),
    }
    .map_err(|err| JsValue::from_str(&err.to_string()))?;

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
    let style = canvas.style();
    style.set_property("width", "100%")?;
    style.set_property("height", "100%")?;
    style.set_property("display", "block")?;

    let (width, height) = canvas_size(
        container.client_width(),
        container.client_height(),
        RESOLUTION_SCALE,
    );
    canvas.set_width(width);
    canvas.set_height(height);

    let context: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into()?;

    let banner = Banner::new(&config, width, height)
        .map_err(|err| JsValue::from_str(&err.to_string()))?;
    container.append_child(&canvas)?;
    log::info!(
        "banner render started: {}x{} canvas, {} lit cells",
        width,
        height,
        banner.lit_cells().len()
    );

    let state = Rc::new(RefCell::new(State {
        banner,
        framebuffer: Framebuffer::new(width, height),
        pixels: Vec::new(),
        context,
        canvas: canvas.clone(),
        container,
        drag: None,
        frame_id: None,
        destroyed: false,
    }));

    let mut render = BannerRender {
        window: window.clone(),
        canvas: canvas.clone(),
        state: state.clone(),
        frame: Rc::new(RefCell::new(None)),
        listeners: Vec::new(),
        destroyed: false,
    };
    if let Err(err) = render.attach_listeners() {
        render.destroy();
        return Err(err);
    }

    // The frame closure schedules itself through the shared slot
    let frame = render.frame.clone();
    let next = render.frame.clone();
    let frame_window = window.clone();
    let frame_state = state.clone();
    *frame.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        let mut state = frame_state.borrow_mut();
        state.frame_id = None;
        if state.destroyed {
            return;
        }
        if let Err(err) = state.draw() {
            log::error!("banner frame failed: {:?}", err);
        }
        if let Some(callback) = next.borrow().as_ref() {
            match frame_window.request_animation_frame(callback.as_ref().unchecked_ref()) {
                Ok(id) => state.frame_id = Some(id),
                Err(err) => log::error!("requestAnimationFrame failed: {:?}", err),
            }
        }
    }) as Box<dyn FnMut()>));

    let first = frame
        .borrow()
        .as_ref()
        .map(|callback| window.request_animation_frame(callback.as_ref().unchecked_ref()));
    match first {
        Some(Ok(id)) => state.borrow_mut().frame_id = Some(id),
        Some(Err(err)) => {
            render.destroy();
            return Err(err);
        }
        None => {}
    }

    Ok(render)
}

#[wasm_bindgen]
impl BannerRender {
    /// Stop drawing and take the canvas out of the page. Safe to call more
    /// than once.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        {
            let mut state = self.state.borrow_mut();
            state.destroyed = true;
            state.drag = None;
            if let Some(id) = state.frame_id.take() {
                if let Err(err) = self.window.cancel_animation_frame(id) {
                    log::warn!("cancelAnimationFrame failed: {:?}", err);
                }
            }
        }

        for listener in self.listeners.drain(..) {
            let removed = listener.target.remove_event_listener_with_callback(
                listener.kind,
                listener.closure.as_ref().unchecked_ref(),
            );
            if let Err(err) = removed {
                log::warn!("removing {} listener failed: {:?}", listener.kind, err);
            }
        }

        self.frame.borrow_mut().take();
        self.canvas.remove();
        log::info!("banner render destroyed");
    }

    #[wasm_bindgen(js_name = isDestroyed)]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Put the camera back where it started.
    #[wasm_bindgen(js_name = resetView)]
    pub fn reset_view(&self) {
        let mut state = self.state.borrow_mut();
        let Banner {
            camera, controls, ..
        } = &mut state.banner;
        if let Some(controls) = controls.as_mut() {
            controls.reset(camera);
        }
        state.banner.request_redraw();
    }
}

impl BannerRender {
    fn attach_listeners(&mut self) -> Result<(), JsValue> {
        let state = self.state.clone();
        self.listeners.push(listen(&self.canvas, "mousedown", move |event| {
            if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
                state.borrow_mut().drag = Some(Drag {
                    button: mouse.button(),
                    x: mouse.client_x(),
                    y: mouse.client_y(),
                });
            }
        })?);

        // Move and release on the window so drags keep working off the canvas
        let state = self.state.clone();
        self.listeners.push(listen(&self.window, "mousemove", move |event| {
            if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
                state.borrow_mut().drag_to(mouse.client_x(), mouse.client_y());
            }
        })?);

        let state = self.state.clone();
        self.listeners.push(listen(&self.window, "mouseup", move |_| {
            state.borrow_mut().drag = None;
        })?);

        let state = self.state.clone();
        self.listeners.push(listen(&self.canvas, "wheel", move |event| {
            if let Some(wheel) = event.dyn_ref::<WheelEvent>() {
                event.prevent_default();
                state.borrow_mut().wheel(wheel.delta_y() as f32);
            }
        })?);

        self.listeners.push(listen(&self.canvas, "contextmenu", |event| {
            event.prevent_default();
        })?);

        Ok(())
    }
}

impl Drop for BannerRender {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_size_scales_container() {
        assert_eq!(canvas_size(800, 200, 0.5), (400, 100));
        assert_eq!(canvas_size(801, 201, 1.0), (801, 201));
    }

    #[test]
    fn test_canvas_size_never_zero() {
        assert_eq!(canvas_size(0, 0, 0.5), (1, 1));
        assert_eq!(canvas_size(-5, 1, 0.5), (1, 1));
    }
}
