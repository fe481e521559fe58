use std::cell::{Cell, Ref, RefCell};

use glam::Vec2;

use super::bounds::Aabb;

/// Size of the drawing surface in CSS pixels.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Pixel displacement as a fraction of the viewport size.
    /// A non-positive dimension yields zero on that axis.
    pub fn normalize_delta(&self, delta: Vec2) -> Vec2 {
        let frac = |d: f32, extent: f32| if extent > 0.0 { d / extent } else { 0.0 };
        Vec2::new(frac(delta.x, self.width), frac(delta.y, self.height))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// State shared between the host, the input tracker and the controller.
///
/// The host owns the viewport size and the list of bounding volumes; the
/// tracker and controller only read them, always seeing the latest values.
#[derive(Debug, Default)]
pub struct ViewerContext {
    viewport: Cell<Viewport>,
    bounds: RefCell<Vec<Aabb>>,
}

impl ViewerContext {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport: Cell::new(viewport),
            bounds: RefCell::new(Vec::new()),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport.get()
    }

    pub fn resize(&self, width: f32, height: f32) {
        self.viewport.set(Viewport::new(width, height));
        tracing::debug!(width, height, "viewport resized");
    }

    pub fn bounds(&self) -> Ref<'_, [Aabb]> {
        Ref::map(self.bounds.borrow(), |b| b.as_slice())
    }

    pub fn set_bounds(&self, bounds: Vec<Aabb>) {
        tracing::debug!(count = bounds.len(), "bounding volumes replaced");
        *self.bounds.borrow_mut() = bounds;
    }

    pub fn push_bounds(&self, aabb: Aabb) {
        self.bounds.borrow_mut().push(aabb);
    }
}
