use crate::events::{MouseButton, MouseEvent, MouseEventKind};
use crate::math::Point3;
use crate::properties::{Property, PropertyValue};
use crate::resources::{Cursor, Icon};

use super::{EventResponse, Tool, ToolBase};

/// Single-click point pick on the ground plane. With `single_shot` set
/// (the default) a successful pick finishes the tool, handing control back
/// to the default tool.
pub struct PointTool {
    base: ToolBase,
}

impl Default for PointTool {
    fn default() -> Self {
        let mut base = ToolBase::new();
        base.set_name("Pick Point");
        base.set_description("Pick a single point on the ground plane.");
        base.set_shortcut_key('p');
        base.set_icon(Icon::named("point"));
        base.set_cursor(Cursor::Crosshair);

        {
            let container = base.property_container();
            let mut container = container.borrow_mut();
            container.set_name("Pick Point");
            container.add(Property::new(
                "single_shot",
                "Switch back to the default tool after one pick.",
                PropertyValue::Bool(true),
            ));
            container.add(Property::new(
                "last_point",
                "The previously picked point.",
                PropertyValue::Text(String::new()),
            ));
        }

        Self { base }
    }
}

impl PointTool {
    pub fn single_shot(&self) -> bool {
        self.base
            .property_container()
            .borrow()
            .bool_value("single_shot")
            .unwrap_or(true)
    }

    pub fn last_point(&self) -> Option<Point3> {
        let container = self.base.property_container();
        let container = container.borrow();
        let text = container.get("last_point")?.value().as_text()?.to_string();
        let mut parts = text
            .trim_matches(|c| c == '(' || c == ')')
            .split(',')
            .map(|p| p.trim().parse::<f32>());
        match (parts.next(), parts.next(), parts.next()) {
            (Some(Ok(x)), Some(Ok(y)), Some(Ok(z))) => Some(Point3::new(x, y, z)),
            _ => None,
        }
    }

    fn record_pick(&mut self, point: Point3) {
        self.base
            .property_container()
            .borrow_mut()
            .set_value("last_point", PropertyValue::Text(point.to_string()));
        self.base.set_status(format!("Picked point {point}."));
    }
}

impl Tool for PointTool {
    fn base(&self) -> &ToolBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ToolBase {
        &mut self.base
    }

    fn activate(&mut self) {
        self.base.set_status("Click a point on the ground plane.");
    }

    fn deactivate(&mut self) {}

    fn process_mouse_event(&mut self, event: &MouseEvent) -> EventResponse {
        match event.kind {
            MouseEventKind::Press if event.button == MouseButton::Primary => {
                let Some(point) = event.panel.unproject(event.pos) else {
                    return EventResponse::NONE;
                };
                self.record_pick(point);
                if self.single_shot() {
                    EventResponse::RENDER | EventResponse::FINISHED
                } else {
                    EventResponse::RENDER
                }
            }
            MouseEventKind::Move => {
                // live readout of the point under the pointer
                if let Some(point) = event.panel.unproject(event.pos) {
                    self.base.set_status(format!("{point}"));
                }
                EventResponse::RENDER
            }
            _ => EventResponse::NONE,
        }
    }
}
