use std::cell::RefCell;
use std::ops::BitOr;
use std::rc::Rc;

use log::debug;

use crate::config::Config;
use crate::context::{DisplayContext, RenderPanel, SceneManager};
use crate::events::{KeyEvent, MouseEvent};
use crate::properties::PropertyContainer;
use crate::resources::{Cursor, Icon};

mod manager;
mod measure;
mod point;
mod select;

pub use manager::{ToolError, ToolFactory, ToolManager};
pub use measure::MeasureTool;
pub use point::PointTool;
pub use select::SelectTool;

/// What the dispatcher should do after handing an event to a tool.
///
/// `needs_render` asks for a redraw of the scene; `finished` tells the
/// dispatcher the tool is done with its task and the default tool should
/// take over. Both can be set at once.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventResponse {
    pub needs_render: bool,
    pub finished: bool,
}

impl EventResponse {
    pub const NONE: EventResponse = EventResponse {
        needs_render: false,
        finished: false,
    };

    pub const RENDER: EventResponse = EventResponse {
        needs_render: true,
        finished: false,
    };

    pub const FINISHED: EventResponse = EventResponse {
        needs_render: false,
        finished: true,
    };
}

impl BitOr for EventResponse {
    type Output = EventResponse;

    fn bitor(self, rhs: Self) -> Self::Output {
        EventResponse {
            needs_render: self.needs_render || rhs.needs_render,
            finished: self.finished || rhs.finished,
        }
    }
}

/// The state every tool variant embeds and exposes through
/// [`Tool::base`]. Holds identity, presentation resources, the owned
/// property container and the context references bound by `initialize`.
pub struct ToolBase {
    class_id: String,
    name: String,
    description: String,
    shortcut_key: Option<char>,
    access_all_keys: bool,
    icon: Option<Icon>,
    cursor: Cursor,
    properties: Rc<RefCell<PropertyContainer>>,
    context: Option<Rc<DisplayContext>>,
    scene: Option<Rc<SceneManager>>,
    name_observers: Vec<Box<dyn Fn(&str)>>,
    close_observers: Vec<Box<dyn Fn()>>,
}

impl Default for ToolBase {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolBase {
    pub fn new() -> Self {
        Self {
            class_id: String::new(),
            name: String::new(),
            description: String::new(),
            shortcut_key: None,
            access_all_keys: false,
            icon: None,
            cursor: Cursor::default(),
            properties: Rc::new(RefCell::new(PropertyContainer::default())),
            context: None,
            scene: None,
            name_observers: Vec::new(),
            close_observers: Vec::new(),
        }
    }

    /// The class identifier the factory created this instance under.
    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    /// Set by the factory right after construction; not meant to change
    /// afterwards.
    pub fn set_class_id(&mut self, class_id: impl Into<String>) {
        self.class_id = class_id.into();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store the name and notify the name-changed observers. Observers run
    /// even when the value did not change.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.notify_name_changed();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Tool lists show the description as tooltip text, so this notifies
    /// the same observers as `set_name`.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.notify_name_changed();
    }

    pub fn shortcut_key(&self) -> Option<char> {
        self.shortcut_key
    }

    pub fn set_shortcut_key(&mut self, key: char) {
        self.shortcut_key = Some(key);
    }

    /// True if this tool wants every key event, not just the ones left
    /// over after shortcut routing.
    pub fn access_all_keys(&self) -> bool {
        self.access_all_keys
    }

    pub fn set_access_all_keys(&mut self, value: bool) {
        self.access_all_keys = value;
    }

    pub fn icon(&self) -> Option<&Icon> {
        self.icon.as_ref()
    }

    /// Setting the icon also resets the cursor to the one derived from it;
    /// call `set_cursor` afterwards to override.
    pub fn set_icon(&mut self, icon: Icon) {
        self.cursor = Cursor::from_icon(&icon);
        self.icon = Some(icon);
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    /// The property container is created with the tool and lives as long
    /// as it does; variants attach their children to it.
    pub fn property_container(&self) -> Rc<RefCell<PropertyContainer>> {
        Rc::clone(&self.properties)
    }

    /// Bind the display context and scene manager. Called exactly once,
    /// from [`Tool::initialize`]; a second call is a sequencing bug in the
    /// dispatcher and panics.
    pub fn bind_context(&mut self, context: Rc<DisplayContext>) {
        assert!(
            self.context.is_none(),
            "Tool::initialize called twice on '{}'",
            self.name
        );
        self.scene = Some(context.scene_manager());
        self.context = Some(context);
        debug!("tool '{}' initialized", self.name);
    }

    pub fn is_initialized(&self) -> bool {
        self.context.is_some()
    }

    /// The bound display context. Panics when used before `initialize`.
    pub fn context(&self) -> &Rc<DisplayContext> {
        self.context
            .as_ref()
            .unwrap_or_else(|| panic!("tool '{}' used before initialize", self.name))
    }

    /// The scene manager derived from the context during `initialize`.
    /// Panics when used before `initialize`.
    pub fn scene_manager(&self) -> &Rc<SceneManager> {
        self.scene
            .as_ref()
            .unwrap_or_else(|| panic!("tool '{}' used before initialize", self.name))
    }

    /// Push a message to the viewer's status line.
    pub fn set_status(&self, message: impl Into<String>) {
        self.context().set_status(message);
    }

    pub fn observe_name_changed(&mut self, observer: impl Fn(&str) + 'static) {
        self.name_observers.push(Box::new(observer));
    }

    pub fn observe_close(&mut self, observer: impl Fn() + 'static) {
        self.close_observers.push(Box::new(observer));
    }

    /// Ask the owner to drop this tool from the active set.
    pub fn request_close(&self) {
        for observer in &self.close_observers {
            observer();
        }
    }

    fn notify_name_changed(&self) {
        for observer in &self.name_observers {
            observer(&self.name);
        }
    }
}

/// An interactive tool: the one object with exclusive claim on pointer and
/// keyboard input while it is the active tool.
///
/// Variants embed a [`ToolBase`] and get the whole event and persistence
/// contract from the default methods; `activate`/`deactivate` are the only
/// methods every variant must spell out. The owner drives instances
/// through one fixed sequence: factory construction, `set_class_id`,
/// `initialize`, then any number of activate/input/deactivate cycles.
pub trait Tool {
    fn base(&self) -> &ToolBase;
    fn base_mut(&mut self) -> &mut ToolBase;

    /// Called each time this tool becomes the active tool.
    fn activate(&mut self);

    /// Called each time this tool stops being the active tool. Transient
    /// scene visuals and grabbed input state must be released here.
    fn deactivate(&mut self);

    /// Setup hook for variants, run at the end of `initialize` when the
    /// context and scene manager are available.
    fn on_initialize(&mut self) {}

    /// Bind the context and run the variant setup hook. Must be called
    /// exactly once, before any other lifecycle call; a second call
    /// panics.
    fn initialize(&mut self, context: Rc<DisplayContext>) {
        self.base_mut().bind_context(context);
        self.on_initialize();
    }

    /// Periodic tick while active, nominally 30 Hz. `wall_dt` is real
    /// elapsed seconds, `sim_dt` follows the viewer's data clock; both are
    /// non-negative.
    fn update(&mut self, _wall_dt: f32, _sim_dt: f32) {}

    /// Central input entry point of every tool. The default asks for a
    /// redraw on any event, since most tools visualize pointer feedback
    /// continuously.
    fn process_mouse_event(&mut self, _event: &MouseEvent) -> EventResponse {
        EventResponse::RENDER
    }

    /// Key events not already consumed as tool shortcuts. Tools with
    /// `access_all_keys` receive every key event here instead.
    fn process_key_event(&mut self, _event: &KeyEvent, _panel: &RenderPanel) -> EventResponse {
        EventResponse::NONE
    }

    /// Restore the child properties from a config tree. The class id entry
    /// is not read here; the factory already used it to pick this class.
    fn load(&mut self, config: &Config) {
        self.base()
            .property_container()
            .borrow_mut()
            .load_children(config);
    }

    /// Write the class id plus one entry per child property.
    fn save(&self, config: &mut Config) {
        config.insert("class_id", self.base().class_id());
        self.base()
            .property_container()
            .borrow()
            .save_children(config);
    }
}
