//! Browser glue: DOM listeners, a three.js camera adapter and the exported
//! `Walkthrough` class a JavaScript host drives.

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Quat, Vec3};
use js_sys::{Array, Function, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
use web_sys::{Document, Event, EventTarget, KeyboardEvent, MouseEvent, Window};

use crate::controller::input::wasm as convert;
use crate::controller::{ControllerConfig, FrameLoopContext, InputProcessor, InputTracker};
use crate::model::{Aabb, Camera, Viewport, ViewerContext};

fn js_error<E: Into<String>>(msg: E) -> JsValue {
    JsValue::from_str(&msg.into())
}

/// Keeps DOM listeners alive; dropping it unregisters every one of them.
#[derive(Default)]
pub struct ListenerGuard {
    listeners: Vec<(EventTarget, &'static str, Closure<dyn FnMut(Event)>)>,
}

impl ListenerGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listen<F>(&mut self, target: &EventTarget, event: &'static str, handler: F) -> Result<(), JsValue>
    where
        F: FnMut(Event) + 'static,
    {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        self.listeners.push((target.clone(), event, closure));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        for (target, event, closure) in self.listeners.drain(..) {
            if let Err(e) = target.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
                tracing::warn!(event, error = ?e, "failed to remove listener");
            }
        }
    }
}

fn window_size(window: &Window) -> Viewport {
    let dim = |v: Result<JsValue, JsValue>, fallback: f64| v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback);
    Viewport::new(
        dim(window.inner_width(), 800.0) as f32,
        dim(window.inner_height(), 600.0) as f32,
    )
}

/// Wire pointer, keyboard, focus and resize events into the tracker.
pub fn attach_input(
    window: &Window,
    document: &Document,
    input: Rc<RefCell<InputTracker>>,
    processor: InputProcessor,
) -> Result<ListenerGuard, JsValue> {
    let mut guard = ListenerGuard::new();
    let doc_target: &EventTarget = document.as_ref();
    let win_target: &EventTarget = window.as_ref();

    // Mouse move
    {
        let input = input.clone();
        guard.listen(doc_target, "mousemove", move |e: Event| {
            if let Some(e) = e.dyn_ref::<MouseEvent>() {
                input.borrow_mut().process_event(&convert::mouse_move_to_input(e));
            }
        })?;
    }

    // Mouse buttons
    for (name, is_down) in [("mousedown", true), ("mouseup", false)] {
        let input = input.clone();
        guard.listen(doc_target, name, move |e: Event| {
            if let Some(e) = e.dyn_ref::<MouseEvent>() {
                input.borrow_mut().process_event(&convert::mouse_button_to_input(e, is_down));
            }
        })?;
    }

    // Keyboard
    for (name, is_down) in [("keydown", true), ("keyup", false)] {
        let input = input.clone();
        let processor = processor.clone();
        guard.listen(doc_target, name, move |e: Event| {
            if let Some(e) = e.dyn_ref::<KeyboardEvent>() {
                if processor.is_navigation_key(&e.key()) {
                    e.prevent_default();
                }
                input.borrow_mut().process_event(&convert::keyboard_event_to_input(e, is_down));
            }
        })?;
    }

    // Right-drag should not open the context menu
    guard.listen(doc_target, "contextmenu", |e: Event| e.prevent_default())?;

    // Focus loss / hidden tab - key-up events will never arrive
    {
        let input = input.clone();
        guard.listen(win_target, "blur", move |_e: Event| {
            input.borrow_mut().clear_keys();
        })?;
    }
    {
        let input = input.clone();
        guard.listen(doc_target, "visibilitychange", move |_e: Event| {
            input.borrow_mut().clear_keys();
        })?;
    }

    // Resize
    {
        let context = input.borrow().context().clone();
        let window_for_resize = window.clone();
        guard.listen(win_target, "resize", move |_e: Event| {
            let size = window_size(&window_for_resize);
            context.resize(size.width, size.height);
        })?;
    }

    tracing::debug!(listeners = guard.len(), "input listeners attached");
    Ok(guard)
}

/// `Camera` over a three.js `Object3D` (anything with `quaternion.set`,
/// `position.set` and `lookAt`).
pub struct ThreeCamera {
    inner: JsValue,
}

impl ThreeCamera {
    pub fn new(inner: JsValue) -> Result<Self, JsValue> {
        for key in ["quaternion", "position", "lookAt"] {
            let v = Reflect::get(&inner, &JsValue::from_str(key))?;
            if v.is_undefined() || v.is_null() {
                return Err(js_error(format!("camera object has no `{key}`")));
            }
        }
        Ok(Self { inner })
    }

    fn call(&self, owner: &JsValue, method: &str, args: &[f32]) -> Result<(), JsValue> {
        let f: Function = Reflect::get(owner, &JsValue::from_str(method))?
            .dyn_into()
            .map_err(|_| js_error(format!("`{method}` is not a function")))?;
        let argv: Array = args.iter().map(|&a| JsValue::from_f64(a as f64)).collect();
        f.apply(owner, &argv)?;
        Ok(())
    }

    fn call_on_field(&self, field: &str, method: &str, args: &[f32]) -> Result<(), JsValue> {
        let owner = Reflect::get(&self.inner, &JsValue::from_str(field))?;
        self.call(&owner, method, args)
    }
}

impl Camera for ThreeCamera {
    fn set_orientation(&mut self, q: Quat) {
        if let Err(e) = self.call_on_field("quaternion", "set", &[q.x, q.y, q.z, q.w]) {
            tracing::warn!(error = ?e, "camera.quaternion.set failed");
        }
    }

    fn set_position(&mut self, p: Vec3) {
        if let Err(e) = self.call_on_field("position", "set", &[p.x, p.y, p.z]) {
            tracing::warn!(error = ?e, "camera.position.set failed");
        }
    }

    fn look_at(&mut self, target: Vec3) {
        if let Err(e) = self.call(&self.inner, "lookAt", &[target.x, target.y, target.z]) {
            tracing::warn!(error = ?e, "camera.lookAt failed");
        }
    }
}

/// requestAnimationFrame loop running `f` once per display refresh with the
/// frame timestamp in milliseconds.
struct RafLoop {
    inner: Rc<RefCell<Box<dyn FnMut(f64)>>>,
    window: Window,
}

impl RafLoop {
    fn new(window: Window, f: impl FnMut(f64) + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Box::new(f))),
            window,
        }
    }

    fn start(self) -> Result<(), JsValue> {
        let inner = self.inner.clone();
        let window = self.window.clone();

        let callback = Rc::new(RefCell::new(None::<Closure<dyn FnMut(f64)>>));
        let callback_clone = callback.clone();

        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move |now: f64| {
            inner.borrow_mut().as_mut()(now);

            // Schedule the next frame
            let cb_ref = callback_clone.borrow();
            if let Some(cb) = cb_ref.as_ref() {
                if let Err(e) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    tracing::error!(error = ?e, "requestAnimationFrame failed, loop stopped");
                }
            }
        }) as Box<dyn FnMut(f64)>));

        {
            let cb_ref = callback.borrow();
            let cb = cb_ref.as_ref().ok_or_else(|| js_error("frame callback missing"))?;
            self.window.request_animation_frame(cb.as_ref().unchecked_ref())?;
        }

        // The loop lives until the page goes away
        std::mem::forget(callback);
        Ok(())
    }
}

/// First-person walkthrough bound to a three.js camera.
///
/// ```js
/// const walk = new Walkthrough(camera);
/// walk.set_bounds(flatBoxes);
/// walk.run(() => renderer.render(scene, camera));
/// walk.place_at(0, 1.6, 4, 0, 0); // still usable while running
/// ```
#[wasm_bindgen]
pub struct Walkthrough {
    frame: Rc<RefCell<FrameLoopContext<ThreeCamera>>>,
    _listeners: ListenerGuard,
}

#[wasm_bindgen]
impl Walkthrough {
    #[wasm_bindgen(constructor)]
    pub fn new(camera: JsValue) -> Result<Walkthrough, JsValue> {
        crate::logging::init();

        let window = web_sys::window().ok_or_else(|| js_error("no global `window`"))?;
        let document = window.document().ok_or_else(|| js_error("no document on window"))?;

        let context = Rc::new(ViewerContext::new(window_size(&window)));
        let config = ControllerConfig::default();
        let processor = InputProcessor::new(config.bindings.clone());
        let frame = FrameLoopContext::new(context, ThreeCamera::new(camera)?, config);
        let listeners = attach_input(&window, &document, frame.input.clone(), processor)?;

        tracing::info!("walkthrough attached");
        Ok(Walkthrough {
            frame: Rc::new(RefCell::new(frame)),
            _listeners: listeners,
        })
    }

    pub fn set_rates(&self, yaw_rate: f32, pitch_rate: f32) {
        self.frame.borrow_mut().controller.set_rates(yaw_rate, pitch_rate);
    }

    pub fn set_speed(&self, speed: f32) {
        self.frame.borrow_mut().controller.set_move_speed(speed);
    }

    pub fn place_at(&self, x: f32, y: f32, z: f32, yaw: f32, pitch: f32) {
        self.frame.borrow_mut().controller.place_at(Vec3::new(x, y, z), yaw, pitch);
    }

    /// Replace the bounding volumes, given as `[minX, minY, minZ, maxX, maxY, maxZ, ...]`.
    pub fn set_bounds(&self, flat: &[f32]) {
        self.frame.borrow().context.set_bounds(Aabb::from_flat(flat));
    }

    pub fn resize(&self, width: f32, height: f32) {
        self.frame.borrow().context.resize(width, height);
    }

    /// Advance one frame at `now_ms` (a requestAnimationFrame timestamp).
    pub fn tick(&self, now_ms: f64) {
        self.frame.borrow_mut().step(now_ms);
    }

    pub fn is_ready(&self) -> bool {
        self.frame.borrow().is_ready()
    }

    /// Current position as `[x, y, z]`.
    pub fn position(&self) -> Vec<f32> {
        self.frame.borrow().controller.position().to_array().to_vec()
    }

    /// Current look target as `[x, y, z]`.
    pub fn look_target(&self) -> Vec<f32> {
        self.frame.borrow().controller.pose().look_target.to_array().to_vec()
    }

    /// Drive `tick` from requestAnimationFrame and call `on_frame` after each
    /// update once input has arrived. The handle stays usable afterwards.
    pub fn run(&self, on_frame: Function) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| js_error("no global `window`"))?;
        let frame = self.frame.clone();
        RafLoop::new(window, move |now| {
            let ready = {
                let mut frame = frame.borrow_mut();
                frame.step(now);
                frame.is_ready()
            };
            // Borrow released first: `on_frame` may call back into the handle.
            if ready {
                if let Err(e) = on_frame.call0(&JsValue::NULL) {
                    tracing::warn!(error = ?e, "frame callback threw");
                }
            }
        })
        .start()
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    crate::logging::init();
}
