use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use log::{debug, warn};
use thiserror::Error;
use toml::value::{Table, Value};

use crate::config::Config;
use crate::context::{DisplayContext, RenderPanel};
use crate::events::{KeyEvent, MouseEvent};

use super::{EventResponse, MeasureTool, PointTool, SelectTool, Tool};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool class '{0}'")]
    UnknownClassId(String),

    #[error("tool class '{0}' is already registered")]
    DuplicateClassId(String),
}

type Constructor = Box<dyn Fn() -> Rc<RefCell<dyn Tool>>>;

/// Creates tools from their string class identifier.
///
/// Registered constructors take no arguments; the factory stamps the class
/// id onto the fresh instance so `save` can reproduce it.
#[derive(Default)]
pub struct ToolFactory {
    constructors: BTreeMap<String, Constructor>,
}

impl ToolFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory with the built-in tool classes registered.
    pub fn with_defaults() -> Self {
        let mut factory = Self::new();
        factory
            .register::<SelectTool>("scenetools/Select")
            .expect("built-in class ids are distinct");
        factory
            .register::<MeasureTool>("scenetools/Measure")
            .expect("built-in class ids are distinct");
        factory
            .register::<PointTool>("scenetools/PointPick")
            .expect("built-in class ids are distinct");
        factory
    }

    /// Register a tool type constructible through `Default`.
    pub fn register<T>(&mut self, class_id: &str) -> Result<(), ToolError>
    where
        T: Tool + Default + 'static,
    {
        self.register_with(class_id, || Rc::new(RefCell::new(T::default())))
    }

    /// Register an arbitrary constructor closure.
    pub fn register_with(
        &mut self,
        class_id: &str,
        constructor: impl Fn() -> Rc<RefCell<dyn Tool>> + 'static,
    ) -> Result<(), ToolError> {
        if self.constructors.contains_key(class_id) {
            return Err(ToolError::DuplicateClassId(class_id.to_string()));
        }
        self.constructors
            .insert(class_id.to_string(), Box::new(constructor));
        Ok(())
    }

    pub fn contains(&self, class_id: &str) -> bool {
        self.constructors.contains_key(class_id)
    }

    pub fn class_ids(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn make(&self, class_id: &str) -> Result<Rc<RefCell<dyn Tool>>, ToolError> {
        let constructor = self
            .constructors
            .get(class_id)
            .ok_or_else(|| ToolError::UnknownClassId(class_id.to_string()))?;
        let tool = constructor();
        tool.borrow_mut().base_mut().set_class_id(class_id);
        Ok(tool)
    }
}

/// Owns the tool set of one viewer window: creation through the factory,
/// the active/default tool, shortcut routing and event forwarding, and
/// persistence of the whole set.
pub struct ToolManager {
    factory: ToolFactory,
    context: Rc<DisplayContext>,
    tools: Vec<Rc<RefCell<dyn Tool>>>,
    current: Option<usize>,
    default: Option<usize>,
}

impl ToolManager {
    pub fn new(factory: ToolFactory, context: Rc<DisplayContext>) -> Self {
        Self {
            factory,
            context,
            tools: Vec::new(),
            current: None,
            default: None,
        }
    }

    pub fn factory(&self) -> &ToolFactory {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut ToolFactory {
        &mut self.factory
    }

    pub fn num_tools(&self) -> usize {
        self.tools.len()
    }

    pub fn tool(&self, index: usize) -> Option<Rc<RefCell<dyn Tool>>> {
        self.tools.get(index).cloned()
    }

    pub fn current_tool(&self) -> Option<Rc<RefCell<dyn Tool>>> {
        self.current.and_then(|i| self.tool(i))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn default_tool(&self) -> Option<Rc<RefCell<dyn Tool>>> {
        self.default.and_then(|i| self.tool(i))
    }

    /// Create a tool through the factory, initialize it against the
    /// manager's context and append it to the set. The first tool added
    /// becomes the default tool.
    pub fn add_tool(&mut self, class_id: &str) -> Result<Rc<RefCell<dyn Tool>>, ToolError> {
        let tool = self.factory.make(class_id)?;
        tool.borrow_mut().initialize(Rc::clone(&self.context));
        debug!(
            "added tool '{}' ({class_id})",
            tool.borrow().base().name()
        );

        self.tools.push(Rc::clone(&tool));
        if self.default.is_none() {
            self.default = Some(self.tools.len() - 1);
        }
        Ok(tool)
    }

    /// Remove a tool from the set. Removing the current tool activates the
    /// default tool; removing the default demotes it to the first
    /// remaining tool.
    pub fn remove_tool(&mut self, index: usize) -> Option<Rc<RefCell<dyn Tool>>> {
        if index >= self.tools.len() {
            return None;
        }

        let removing_current = self.current == Some(index);
        if removing_current {
            if let Some(tool) = self.current_tool() {
                tool.borrow_mut().deactivate();
            }
            self.current = None;
        }

        let tool = self.tools.remove(index);

        let adjust = |slot: &mut Option<usize>| match *slot {
            Some(i) if i == index => *slot = None,
            Some(i) if i > index => *slot = Some(i - 1),
            _ => {}
        };
        adjust(&mut self.current);
        adjust(&mut self.default);

        if self.default.is_none() && !self.tools.is_empty() {
            self.default = Some(0);
        }
        if removing_current {
            if let Some(default) = self.default {
                self.set_current_tool(default);
            }
        }
        Some(tool)
    }

    pub fn remove_all(&mut self) {
        if let Some(tool) = self.current_tool() {
            tool.borrow_mut().deactivate();
        }
        self.tools.clear();
        self.current = None;
        self.default = None;
    }

    /// Switch the active tool: the old one is deactivated, the new one
    /// activated, each exactly once. Out-of-range indices are ignored.
    pub fn set_current_tool(&mut self, index: usize) {
        if index >= self.tools.len() {
            warn!("set_current_tool: no tool at index {index}");
            return;
        }
        if let Some(old) = self.current_tool() {
            old.borrow_mut().deactivate();
        }
        self.current = Some(index);
        self.tools[index].borrow_mut().activate();
        debug!(
            "current tool: '{}'",
            self.tools[index].borrow().base().name()
        );
    }

    pub fn set_default_tool(&mut self, index: usize) {
        if index < self.tools.len() {
            self.default = Some(index);
        }
    }

    /// Route a plain character key press.
    ///
    /// A character matching an inactive tool's shortcut (case-insensitive)
    /// switches to that tool; the current tool's own shortcut is swallowed.
    /// A current tool with `access_all_keys` set receives every key event
    /// instead of any shortcut routing. Everything else is forwarded to the
    /// current tool's key handler.
    pub fn handle_char(&mut self, c: char, panel: &RenderPanel) -> EventResponse {
        if let Some(current) = self.current {
            let grabs_all = self.tools[current].borrow().base().access_all_keys();
            if grabs_all {
                return self.process_key_event(&KeyEvent::character(c), panel);
            }
        }

        let target = self.tools.iter().position(|tool| {
            tool.borrow()
                .base()
                .shortcut_key()
                .is_some_and(|key| key.eq_ignore_ascii_case(&c))
        });
        match (target, self.current) {
            (Some(index), current) if current != Some(index) => {
                self.set_current_tool(index);
                EventResponse::RENDER
            }
            (Some(_), _) => EventResponse::NONE,
            (None, Some(_)) => self.process_key_event(&KeyEvent::character(c), panel),
            (None, None) => EventResponse::NONE,
        }
    }

    /// Forward a mouse event to the current tool. A `finished` response
    /// deactivates it and restores the default tool.
    pub fn process_mouse_event(&mut self, event: &MouseEvent) -> EventResponse {
        let Some(current) = self.current else {
            return EventResponse::NONE;
        };
        let response = self.tools[current].borrow_mut().process_mouse_event(event);
        self.restore_default_if_finished(response);
        response
    }

    /// Forward a key event to the current tool, with the same `finished`
    /// handling as mouse events. Shortcut routing happens in
    /// [`handle_char`](Self::handle_char); this entry point is for keys the
    /// dispatcher already decided belong to the tool.
    pub fn process_key_event(&mut self, event: &KeyEvent, panel: &RenderPanel) -> EventResponse {
        let Some(current) = self.current else {
            return EventResponse::NONE;
        };
        let response = self.tools[current]
            .borrow_mut()
            .process_key_event(event, panel);
        self.restore_default_if_finished(response);
        response
    }

    /// Periodic tick, forwarded to the current tool only.
    pub fn update(&mut self, wall_dt: f32, sim_dt: f32) {
        if let Some(tool) = self.current_tool() {
            tool.borrow_mut().update(wall_dt, sim_dt);
        }
    }

    /// Save the whole tool set as an ordered array of per-tool tables.
    pub fn save(&self, config: &mut Config) {
        let mut entries = Vec::with_capacity(self.tools.len());
        for tool in &self.tools {
            let mut tool_config = Config::new();
            tool.borrow().save(&mut tool_config);
            entries.push(Value::Table(tool_config.into_table()));
        }
        config.insert("tools", Value::Array(entries));
    }

    /// Rebuild the tool set from a config tree written by `save`.
    ///
    /// The existing set is dropped first. Entries without a class id, or
    /// with one the factory does not know, are skipped with a warning so
    /// one stale entry cannot take down the rest of the session.
    pub fn load(&mut self, config: &Config) {
        self.remove_all();

        let entries: &[Value] = match config.get("tools").and_then(Value::as_array) {
            Some(entries) => entries,
            None => return,
        };

        for entry in entries {
            let Some(table) = entry.as_table() else {
                warn!("tool config entry is not a table, skipping");
                continue;
            };
            self.load_tool_entry(table);
        }
    }

    fn load_tool_entry(&mut self, table: &Table) {
        let Some(class_id) = table.get("class_id").and_then(Value::as_str) else {
            warn!("tool config entry has no class id, skipping");
            return;
        };
        let class_id = class_id.to_string();
        match self.add_tool(&class_id) {
            Ok(tool) => {
                tool.borrow_mut()
                    .load(&Config::from_table(table.clone()));
            }
            Err(e) => warn!("skipping tool entry: {e}"),
        }
    }

    fn restore_default_if_finished(&mut self, response: EventResponse) {
        if !response.finished {
            return;
        }
        if let Some(default) = self.default {
            self.set_current_tool(default);
        } else if let Some(tool) = self.current_tool() {
            tool.borrow_mut().deactivate();
            self.current = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::events::MouseButton;
    use crate::math::Vec2D;
    use crate::tools::ToolBase;

    struct CountingTool {
        base: ToolBase,
        activations: Rc<Cell<u32>>,
        deactivations: Rc<Cell<u32>>,
        keys_seen: Rc<Cell<u32>>,
    }

    impl CountingTool {
        fn new(
            shortcut: char,
            activations: Rc<Cell<u32>>,
            deactivations: Rc<Cell<u32>>,
            keys_seen: Rc<Cell<u32>>,
        ) -> Self {
            let mut base = ToolBase::new();
            base.set_name("Counting");
            base.set_shortcut_key(shortcut);
            Self {
                base,
                activations,
                deactivations,
                keys_seen,
            }
        }
    }

    impl Tool for CountingTool {
        fn base(&self) -> &ToolBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ToolBase {
            &mut self.base
        }

        fn activate(&mut self) {
            self.activations.set(self.activations.get() + 1);
        }

        fn deactivate(&mut self) {
            self.deactivations.set(self.deactivations.get() + 1);
        }

        fn process_key_event(&mut self, _event: &KeyEvent, _panel: &RenderPanel) -> EventResponse {
            self.keys_seen.set(self.keys_seen.get() + 1);
            EventResponse::RENDER
        }
    }

    fn context() -> Rc<DisplayContext> {
        Rc::new(DisplayContext::new())
    }

    fn default_manager(ctx: &Rc<DisplayContext>) -> ToolManager {
        let mut manager = ToolManager::new(ToolFactory::with_defaults(), Rc::clone(ctx));
        manager.add_tool("scenetools/Select").unwrap();
        manager.add_tool("scenetools/Measure").unwrap();
        manager.add_tool("scenetools/PointPick").unwrap();
        manager
    }

    #[test]
    fn factory_stamps_the_class_id() {
        let factory = ToolFactory::with_defaults();
        let tool = factory.make("scenetools/Measure").unwrap();
        assert_eq!(tool.borrow().base().class_id(), "scenetools/Measure");
    }

    #[test]
    fn factory_rejects_unknown_and_duplicate_ids() {
        let mut factory = ToolFactory::with_defaults();
        assert!(matches!(
            factory.make("scenetools/Nope"),
            Err(ToolError::UnknownClassId(_))
        ));
        assert!(matches!(
            factory.register::<SelectTool>("scenetools/Select"),
            Err(ToolError::DuplicateClassId(_))
        ));
    }

    #[test]
    fn first_tool_becomes_default_but_nothing_activates_on_its_own() {
        let ctx = context();
        let manager = default_manager(&ctx);
        assert_eq!(manager.num_tools(), 3);
        assert!(manager.current_tool().is_none());
        assert!(Rc::ptr_eq(
            &manager.default_tool().unwrap(),
            &manager.tool(0).unwrap()
        ));
    }

    #[test]
    fn switching_tools_pairs_activate_and_deactivate() {
        let ctx = context();
        let activations = Rc::new(Cell::new(0));
        let deactivations = Rc::new(Cell::new(0));
        let keys = Rc::new(Cell::new(0));

        let mut factory = ToolFactory::with_defaults();
        let (a, d, k) = (
            Rc::clone(&activations),
            Rc::clone(&deactivations),
            Rc::clone(&keys),
        );
        factory
            .register_with("test/Counting", move || {
                Rc::new(RefCell::new(CountingTool::new(
                    'c',
                    Rc::clone(&a),
                    Rc::clone(&d),
                    Rc::clone(&k),
                )))
            })
            .unwrap();

        let mut manager = ToolManager::new(factory, Rc::clone(&ctx));
        manager.add_tool("test/Counting").unwrap();
        manager.add_tool("scenetools/Select").unwrap();

        manager.set_current_tool(0);
        assert_eq!(activations.get(), 1);
        assert_eq!(deactivations.get(), 0);

        manager.set_current_tool(1);
        assert_eq!(activations.get(), 1);
        assert_eq!(deactivations.get(), 1);

        manager.set_current_tool(0);
        assert_eq!(activations.get(), 2);
    }

    #[test]
    fn shortcut_switches_to_the_matching_tool() {
        let ctx = context();
        let panel = ctx.add_panel(RenderPanel::new(800, 600));
        let mut manager = default_manager(&ctx);
        manager.set_current_tool(0);

        // 'm' is the measure tool's shortcut; matching is case-insensitive
        let r = manager.handle_char('M', &panel);
        assert!(r.needs_render);
        assert!(Rc::ptr_eq(
            &manager.current_tool().unwrap(),
            &manager.tool(1).unwrap()
        ));

        // the active tool's own shortcut is swallowed
        let r = manager.handle_char('m', &panel);
        assert_eq!(r, EventResponse::NONE);
        assert_eq!(manager.current_index(), Some(1));
    }

    #[test]
    fn access_all_keys_bypasses_shortcut_routing() {
        let ctx = context();
        let panel = ctx.add_panel(RenderPanel::new(800, 600));
        let keys = Rc::new(Cell::new(0));

        let mut factory = ToolFactory::with_defaults();
        let k = Rc::clone(&keys);
        factory
            .register_with("test/Grabby", move || {
                let mut tool = CountingTool::new(
                    'g',
                    Rc::new(Cell::new(0)),
                    Rc::new(Cell::new(0)),
                    Rc::clone(&k),
                );
                tool.base_mut().set_access_all_keys(true);
                Rc::new(RefCell::new(tool))
            })
            .unwrap();

        let mut manager = ToolManager::new(factory, Rc::clone(&ctx));
        manager.add_tool("test/Grabby").unwrap();
        manager.add_tool("scenetools/Select").unwrap();
        manager.set_current_tool(0);

        // 's' would normally switch to the select tool
        let r = manager.handle_char('s', &panel);
        assert!(r.needs_render);
        assert_eq!(keys.get(), 1);
        assert_eq!(manager.current_index(), Some(0));
    }

    #[test]
    fn finished_response_restores_the_default_tool() {
        let ctx = context();
        let panel = ctx.add_panel(RenderPanel::new(800, 600));
        let mut manager = default_manager(&ctx);

        // point tool is index 2, select (index 0) is the default
        manager.set_current_tool(2);
        let r = manager.process_mouse_event(&MouseEvent::press(
            &panel,
            MouseButton::Primary,
            Vec2D::new(400.0, 300.0),
        ));
        assert!(r.finished);
        assert_eq!(manager.current_index(), Some(0));
    }

    #[test]
    fn removing_the_current_tool_falls_back_to_the_default() {
        let ctx = context();
        let mut manager = default_manager(&ctx);
        manager.set_current_tool(2);

        manager.remove_tool(2);
        assert_eq!(manager.num_tools(), 2);
        assert_eq!(manager.current_index(), Some(0));

        // removing the default itself demotes it to the survivor
        manager.remove_tool(0);
        assert_eq!(manager.num_tools(), 1);
        assert_eq!(manager.current_index(), Some(0));
        assert!(manager.default_tool().is_some());
    }

    #[test]
    fn save_and_load_roundtrip_preserves_the_set() {
        let ctx = context();
        let mut manager = default_manager(&ctx);
        manager
            .tool(2)
            .unwrap()
            .borrow()
            .base()
            .property_container()
            .borrow_mut()
            .set_value(
                "single_shot",
                crate::properties::PropertyValue::Bool(false),
            );

        let mut config = Config::new();
        manager.save(&mut config);

        let mut restored = ToolManager::new(ToolFactory::with_defaults(), Rc::clone(&ctx));
        restored.load(&config);
        assert_eq!(restored.num_tools(), 3);
        assert_eq!(
            restored.tool(0).unwrap().borrow().base().class_id(),
            "scenetools/Select"
        );
        assert_eq!(
            restored
                .tool(2)
                .unwrap()
                .borrow()
                .base()
                .property_container()
                .borrow()
                .bool_value("single_shot"),
            Some(false)
        );
    }

    #[test]
    fn load_skips_unknown_class_ids() {
        let ctx = context();
        let mut manager = default_manager(&ctx);
        let mut config = Config::new();
        manager.save(&mut config);

        // sneak in an entry from a plugin that is no longer installed
        let mut entries = config
            .get("tools")
            .and_then(Value::as_array)
            .cloned()
            .unwrap();
        let mut stale = Table::new();
        stale.insert(
            "class_id".to_string(),
            Value::String("plugins/Gone".to_string()),
        );
        entries.insert(0, Value::Table(stale));
        config.insert("tools", Value::Array(entries));

        let mut restored = ToolManager::new(ToolFactory::with_defaults(), Rc::clone(&ctx));
        restored.load(&config);
        assert_eq!(restored.num_tools(), 3);
    }
}
