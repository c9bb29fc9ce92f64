//! Pointer input for the holographic card.
//!
//! An [`InputSurface`] fans raw pointer-move events (client pixels, origin top-left)
//! out to registered listeners. A [`PointerTracker`] is one such listener: it keeps
//! the latest position normalized to [0, 1]² with the origin at the bottom-left,
//! in a cell the render loop reads once per frame.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Normalized pointer position, origin bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPosition {
    pub x: f32,
    pub y: f32,
}

impl PointerPosition {
    pub const CENTER: PointerPosition = PointerPosition { x: 0.5, y: 0.5 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Distance from the center, scaled so an edge midpoint is 1.0 and a corner √2.
    pub fn from_center(&self) -> f32 {
        let dx = self.x - 0.5;
        let dy = self.y - 0.5;
        (dx * dx + dy * dy).sqrt() * 2.0
    }

    fn to_bits(self) -> u64 {
        (self.x.to_bits() as u64) | ((self.y.to_bits() as u64) << 32)
    }

    fn from_bits(bits: u64) -> Self {
        Self {
            x: f32::from_bits(bits as u32),
            y: f32::from_bits((bits >> 32) as u32),
        }
    }
}

impl Default for PointerPosition {
    fn default() -> Self {
        Self::CENTER
    }
}

/// Map client pixel coordinates on a `width × height` surface to [0, 1]², flipping Y.
/// A degenerate surface reports the center.
pub fn normalize_pointer(client_x: f64, client_y: f64, width: f64, height: f64) -> PointerPosition {
    if !(width > 0.0 && height > 0.0) || !client_x.is_finite() || !client_y.is_finite() {
        return PointerPosition::CENTER;
    }
    let x = (client_x / width).clamp(0.0, 1.0);
    let y = (1.0 - client_y / height).clamp(0.0, 1.0);
    PointerPosition::new(x as f32, y as f32)
}

/// A raw pointer move, with the surface size at the time it happened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerMoved {
    pub client_x: f64,
    pub client_y: f64,
    pub width: f64,
    pub height: f64,
}

impl PointerMoved {
    pub fn normalized(&self) -> PointerPosition {
        normalize_pointer(self.client_x, self.client_y, self.width, self.height)
    }
}

type Listener = Box<dyn FnMut(&PointerMoved)>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
    /// Ids dropped while their listener was out for dispatch.
    removed: Vec<u64>,
}

impl Registry {
    fn remove(&mut self, id: u64) {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        if self.listeners.len() == before {
            self.removed.push(id);
        }
    }
}

/// The display surface pointer events come from.
pub struct InputSurface {
    width: f64,
    height: f64,
    registry: Rc<RefCell<Registry>>,
}

impl InputSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            registry: Rc::new(RefCell::new(Registry::default())),
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Register a pointer-move listener. It stays registered until the returned
    /// [`Subscription`] is dropped.
    pub fn on_pointer_move<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&PointerMoved) + 'static,
    {
        let mut reg = self.registry.borrow_mut();
        let id = reg.next_id;
        reg.next_id += 1;
        reg.listeners.push((id, Box::new(listener)));
        Subscription {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Deliver a raw pointer move to every listener.
    pub fn dispatch_pointer_move(&self, client_x: f64, client_y: f64) {
        let event = PointerMoved {
            client_x,
            client_y,
            width: self.width,
            height: self.height,
        };

        // Listeners run outside the borrow so they may (un)subscribe
        let mut active = std::mem::take(&mut self.registry.borrow_mut().listeners);
        for (_, listener) in active.iter_mut() {
            listener(&event);
        }

        let mut reg = self.registry.borrow_mut();
        let removed = std::mem::take(&mut reg.removed);
        active.retain(|(id, _)| !removed.contains(id));
        active.append(&mut reg.listeners);
        reg.listeners = active;
    }

    pub fn listener_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }
}

/// Keeps a listener registered; dropping it deregisters.
pub struct Subscription {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().remove(self.id);
        }
    }
}

/// Shared read handle on the latest normalized pointer position.
#[derive(Debug, Clone)]
pub struct PointerReader {
    cell: Arc<AtomicU64>,
}

impl PointerReader {
    fn new(initial: PointerPosition) -> Self {
        Self {
            cell: Arc::new(AtomicU64::new(initial.to_bits())),
        }
    }

    /// Latest stored position. May lag the newest event by one queue turn.
    pub fn get(&self) -> PointerPosition {
        PointerPosition::from_bits(self.cell.load(Ordering::Relaxed))
    }

    fn store(&self, position: PointerPosition) {
        self.cell.store(position.to_bits(), Ordering::Relaxed);
    }
}

/// One pointer listener for the lifetime of the view that mounts it.
pub struct PointerTracker {
    reader: PointerReader,
    _subscription: Subscription,
}

impl PointerTracker {
    /// Register on `surface`. Starts at the center until the first move.
    pub fn mount(surface: &InputSurface) -> Self {
        let reader = PointerReader::new(PointerPosition::CENTER);
        let writer = reader.clone();
        let subscription = surface.on_pointer_move(move |event| {
            writer.store(event.normalized());
        });
        log::debug!("pointer tracker mounted");
        Self {
            reader,
            _subscription: subscription,
        }
    }

    pub fn reader(&self) -> PointerReader {
        self.reader.clone()
    }

    pub fn position(&self) -> PointerPosition {
        self.reader.get()
    }

    /// Deregister the listener. Readers keep the last position.
    pub fn unmount(self) {
        log::debug!("pointer tracker unmounted");
    }
}
