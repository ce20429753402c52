//! Interactive tool framework for 3D scene viewers.
//!
//! A [`Tool`](tools::Tool) owns pointer and keyboard input while it is the
//! active tool, draws its feedback through the shared scene and persists
//! its configuration through a property tree. The
//! [`ToolManager`](tools::ToolManager) creates tools from string class
//! identifiers, routes shortcuts and events, and saves or restores the
//! whole set.

pub mod config;
pub mod context;
pub mod events;
pub mod math;
pub mod properties;
pub mod resources;
pub mod session;
pub mod tools;

pub use config::Config;
pub use context::{DisplayContext, RenderPanel, SceneManager};
pub use events::{Key, KeyEvent, Modifiers, MouseButton, MouseEvent, MouseEventKind};
pub use math::{Point3, Vec2D};
pub use properties::{Property, PropertyContainer, PropertyError, PropertyValue};
pub use resources::{Cursor, Icon};
pub use session::{load_session, save_session, SessionFileError};
pub use tools::{
    EventResponse, MeasureTool, PointTool, SelectTool, Tool, ToolBase, ToolError, ToolFactory,
    ToolManager,
};
