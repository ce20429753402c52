use hex_color::HexColor;

use crate::events::{Key, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use crate::math::Point3;
use crate::properties::{Property, PropertyValue};
use crate::resources::Icon;

use super::{EventResponse, Tool, ToolBase};

const LINE_VISUAL: &str = "measure_line";

/// Two-click distance measurement on the ground plane. The first click
/// anchors the line, the second one reports the distance and clears it
/// again.
pub struct MeasureTool {
    base: ToolBase,
    anchor: Option<Point3>,
}

impl Default for MeasureTool {
    fn default() -> Self {
        let mut base = ToolBase::new();
        base.set_name("Measure");
        base.set_description("Measure the distance between two points.");
        base.set_shortcut_key('m');
        base.set_icon(Icon::named("measure"));

        {
            let container = base.property_container();
            let mut container = container.borrow_mut();
            container.set_name("Measure");
            container.add(Property::new(
                "line_color",
                "Color of the measurement line.",
                PropertyValue::Color(HexColor::rgb(240, 147, 43)),
            ));
            container.add(Property::new(
                "last_distance",
                "Result of the previous measurement, in meters.",
                PropertyValue::Float(0.0),
            ));
        }

        Self { base, anchor: None }
    }
}

impl MeasureTool {
    pub fn line_color(&self) -> HexColor {
        self.base
            .property_container()
            .borrow()
            .color_value("line_color")
            .unwrap_or(HexColor::rgb(255, 255, 255))
    }

    fn reset(&mut self) -> EventResponse {
        if self.anchor.take().is_some() {
            self.base.scene_manager().remove_visual(LINE_VISUAL);
            EventResponse::RENDER
        } else {
            EventResponse::NONE
        }
    }

    fn handle_click(&mut self, point: Point3) -> EventResponse {
        match self.anchor {
            None => {
                self.anchor = Some(point);
                self.base.scene_manager().add_visual(LINE_VISUAL);
                self.base
                    .set_status(format!("Start point set at {point}. Click the end point."));
            }
            Some(anchor) => {
                let distance = anchor.distance(&point);
                self.base
                    .property_container()
                    .borrow_mut()
                    .set_value("last_distance", PropertyValue::Float(distance as f64));
                self.base
                    .set_status(format!("Distance: {distance:.3} m"));
                self.anchor = None;
                self.base.scene_manager().remove_visual(LINE_VISUAL);
            }
        }
        EventResponse::RENDER
    }
}

impl Tool for MeasureTool {
    fn base(&self) -> &ToolBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ToolBase {
        &mut self.base
    }

    fn activate(&mut self) {
        self.base
            .set_status("Click two points on the ground plane to measure.");
    }

    fn deactivate(&mut self) {
        self.reset();
    }

    fn process_mouse_event(&mut self, event: &MouseEvent) -> EventResponse {
        match event.kind {
            MouseEventKind::Press if event.button == MouseButton::Primary => {
                match event.panel.unproject(event.pos) {
                    Some(point) => self.handle_click(point),
                    None => EventResponse::NONE,
                }
            }
            // redraw so the pending line tracks the pointer
            MouseEventKind::Move if self.anchor.is_some() => EventResponse::RENDER,
            _ => EventResponse::NONE,
        }
    }

    fn process_key_event(
        &mut self,
        event: &KeyEvent,
        _panel: &crate::context::RenderPanel,
    ) -> EventResponse {
        if event.key == Key::Escape {
            self.reset()
        } else {
            EventResponse::NONE
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::config::Config;
    use crate::context::{DisplayContext, RenderPanel};
    use crate::math::Vec2D;

    fn setup() -> (Rc<DisplayContext>, Rc<RenderPanel>, MeasureTool) {
        let ctx = Rc::new(DisplayContext::new());
        let panel = ctx.add_panel(RenderPanel::with_scale(800, 600, 0.1));
        let mut tool = MeasureTool::default();
        tool.initialize(Rc::clone(&ctx));
        (ctx, panel, tool)
    }

    fn click(panel: &Rc<RenderPanel>, x: f32, y: f32) -> MouseEvent {
        MouseEvent::press(panel, MouseButton::Primary, Vec2D::new(x, y))
    }

    #[test]
    fn two_clicks_report_the_distance() {
        let (ctx, panel, mut tool) = setup();
        tool.activate();

        let r = tool.process_mouse_event(&click(&panel, 400.0, 300.0));
        assert!(r.needs_render);
        assert!(ctx.scene_manager().has_visual(LINE_VISUAL));

        // 100 px to the right at 0.1 m/px
        let r = tool.process_mouse_event(&click(&panel, 500.0, 300.0));
        assert!(r.needs_render);
        assert!(!ctx.scene_manager().has_visual(LINE_VISUAL));
        assert!(ctx.status().unwrap().starts_with("Distance: 10.000"));

        let recorded = tool
            .base()
            .property_container()
            .borrow()
            .float_value("last_distance")
            .unwrap();
        assert!((recorded - 10.0).abs() < 1e-4);
    }

    #[test]
    fn click_outside_the_viewport_does_nothing() {
        let (_ctx, panel, mut tool) = setup();
        tool.activate();
        let r = tool.process_mouse_event(&click(&panel, -5.0, 300.0));
        assert_eq!(r, EventResponse::NONE);
    }

    #[test]
    fn deactivate_removes_the_pending_line() {
        let (ctx, panel, mut tool) = setup();
        tool.activate();
        tool.process_mouse_event(&click(&panel, 400.0, 300.0));
        assert_eq!(ctx.scene_manager().visual_count(), 1);

        tool.deactivate();
        assert_eq!(ctx.scene_manager().visual_count(), 0);
    }

    #[test]
    fn escape_abandons_the_measurement() {
        let (ctx, panel, mut tool) = setup();
        tool.activate();
        tool.process_mouse_event(&click(&panel, 400.0, 300.0));

        let r = tool.process_key_event(&KeyEvent::new(Key::Escape), &panel);
        assert!(r.needs_render);
        assert!(!ctx.scene_manager().has_visual(LINE_VISUAL));
    }

    #[test]
    fn line_color_survives_save_and_load() {
        let (_ctx, _panel, tool) = setup();
        tool.base()
            .property_container()
            .borrow_mut()
            .set_value("line_color", PropertyValue::Color(HexColor::rgb(0, 255, 0)));

        let mut config = Config::new();
        tool.save(&mut config);

        let ctx = Rc::new(DisplayContext::new());
        let mut restored = MeasureTool::default();
        restored.initialize(ctx);
        restored.load(&config);
        assert_eq!(restored.line_color(), HexColor::rgb(0, 255, 0));
    }
}
