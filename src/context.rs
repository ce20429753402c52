use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use log::debug;

use crate::math::{Point3, Vec2D};

/// Shared handle to the viewer's 3D scene.
///
/// Tools use it to park transient feedback visuals (a measurement line, a
/// selection box) under a name they pick, and to take them down again when
/// deactivated. How the viewer actually renders a visual is none of our
/// business here.
#[derive(Default, Debug)]
pub struct SceneManager {
    visuals: RefCell<BTreeSet<String>>,
}

impl SceneManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if a visual with this name already exists.
    pub fn add_visual(&self, name: &str) -> bool {
        self.visuals.borrow_mut().insert(name.to_string())
    }

    /// Returns false if no such visual existed.
    pub fn remove_visual(&self, name: &str) -> bool {
        self.visuals.borrow_mut().remove(name)
    }

    pub fn has_visual(&self, name: &str) -> bool {
        self.visuals.borrow().contains(name)
    }

    pub fn visual_count(&self) -> usize {
        self.visuals.borrow().len()
    }
}

const DEFAULT_METERS_PER_PIXEL: f32 = 0.05;

/// One viewport of the viewer window.
#[derive(Debug)]
pub struct RenderPanel {
    width: u32,
    height: u32,
    meters_per_pixel: f32,
}

impl RenderPanel {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_scale(width, height, DEFAULT_METERS_PER_PIXEL)
    }

    pub fn with_scale(width: u32, height: u32, meters_per_pixel: f32) -> Self {
        Self {
            width,
            height,
            meters_per_pixel,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, pos: Vec2D) -> bool {
        pos.x >= 0.0 && pos.y >= 0.0 && pos.x <= self.width as f32 && pos.y <= self.height as f32
    }

    /// Project a viewport position onto the ground plane.
    ///
    /// The panel looks straight down at the plane, centered on the origin,
    /// with screen y growing downward. Positions outside the viewport do
    /// not hit anything.
    pub fn unproject(&self, pos: Vec2D) -> Option<Point3> {
        if !self.contains(pos) {
            return None;
        }
        let cx = self.width as f32 / 2.0;
        let cy = self.height as f32 / 2.0;
        Some(Point3::new(
            (pos.x - cx) * self.meters_per_pixel,
            (cy - pos.y) * self.meters_per_pixel,
            0.0,
        ))
    }
}

/// The shared object a tool is bound to in `initialize`: scene access, the
/// render panels, and the viewer's status line.
#[derive(Default, Debug)]
pub struct DisplayContext {
    scene: Rc<SceneManager>,
    panels: RefCell<Vec<Rc<RenderPanel>>>,
    status: RefCell<Option<String>>,
}

impl DisplayContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scene_manager(&self) -> Rc<SceneManager> {
        Rc::clone(&self.scene)
    }

    pub fn add_panel(&self, panel: RenderPanel) -> Rc<RenderPanel> {
        let panel = Rc::new(panel);
        self.panels.borrow_mut().push(Rc::clone(&panel));
        panel
    }

    pub fn panel(&self, index: usize) -> Option<Rc<RenderPanel>> {
        self.panels.borrow().get(index).cloned()
    }

    pub fn panel_count(&self) -> usize {
        self.panels.borrow().len()
    }

    pub fn set_status(&self, message: impl Into<String>) {
        let message = message.into();
        debug!("status: {message}");
        *self.status.borrow_mut() = Some(message);
    }

    pub fn clear_status(&self) {
        *self.status.borrow_mut() = None;
    }

    pub fn status(&self) -> Option<String> {
        self.status.borrow().clone()
    }
}
