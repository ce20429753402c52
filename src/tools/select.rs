use crate::events::{Key, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use crate::math::{self, Vec2D};
use crate::resources::Icon;

use super::{EventResponse, Tool, ToolBase};

/// Rubber-band selection in viewport space. Dragging with the primary
/// button opens the band, releasing commits it and reports the region
/// through the status line.
pub struct SelectTool {
    base: ToolBase,
    band: Option<Band>,
    dash_phase: f32,
}

struct Band {
    start: Vec2D,
    end: Vec2D,
}

impl Band {
    fn rect(&self) -> (Vec2D, Vec2D) {
        math::rect_ensure_positive_size(self.start, self.end - self.start)
    }
}

impl Default for SelectTool {
    fn default() -> Self {
        let mut base = ToolBase::new();
        base.set_name("Select");
        base.set_description("Drag to select a region of the scene.");
        base.set_shortcut_key('s');
        base.set_icon(Icon::named("select"));
        base.property_container().borrow_mut().set_name("Select");

        Self {
            base,
            band: None,
            dash_phase: 0.0,
        }
    }
}

impl SelectTool {
    fn clear_band(&mut self) -> EventResponse {
        if self.band.take().is_some() {
            EventResponse::RENDER
        } else {
            EventResponse::NONE
        }
    }
}

impl Tool for SelectTool {
    fn base(&self) -> &ToolBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ToolBase {
        &mut self.base
    }

    fn activate(&mut self) {
        self.base.set_status("Click and drag to select a region.");
    }

    fn deactivate(&mut self) {
        self.band = None;
        self.dash_phase = 0.0;
    }

    fn update(&mut self, wall_dt: f32, _sim_dt: f32) {
        // march the band outline while one is open
        if self.band.is_some() {
            self.dash_phase = (self.dash_phase + wall_dt) % 1.0;
        }
    }

    fn process_mouse_event(&mut self, event: &MouseEvent) -> EventResponse {
        match event.kind {
            MouseEventKind::Press if event.button == MouseButton::Primary => {
                self.band = Some(Band {
                    start: event.pos,
                    end: event.pos,
                });
                EventResponse::RENDER
            }
            MouseEventKind::Drag | MouseEventKind::Move => {
                if let Some(band) = &mut self.band {
                    band.end = event.pos;
                    EventResponse::RENDER
                } else {
                    EventResponse::NONE
                }
            }
            MouseEventKind::Release if event.button == MouseButton::Primary => {
                let Some(mut band) = self.band.take() else {
                    return EventResponse::NONE;
                };
                band.end = event.pos;
                let (pos, size) = band.rect();
                self.base
                    .set_status(format!("Selected region at {pos}, size {size}."));
                EventResponse::RENDER
            }
            _ => EventResponse::NONE,
        }
    }

    fn process_key_event(
        &mut self,
        event: &KeyEvent,
        _panel: &crate::context::RenderPanel,
    ) -> EventResponse {
        if event.key == Key::Escape {
            self.clear_band()
        } else {
            EventResponse::NONE
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::context::{DisplayContext, RenderPanel};

    fn setup() -> (Rc<DisplayContext>, Rc<RenderPanel>, SelectTool) {
        let ctx = Rc::new(DisplayContext::new());
        let panel = ctx.add_panel(RenderPanel::new(800, 600));
        let mut tool = SelectTool::default();
        tool.initialize(Rc::clone(&ctx));
        (ctx, panel, tool)
    }

    #[test]
    fn drag_release_reports_the_region() {
        let (ctx, panel, mut tool) = setup();
        tool.activate();

        let r = tool.process_mouse_event(&MouseEvent::press(
            &panel,
            MouseButton::Primary,
            Vec2D::new(10.0, 10.0),
        ));
        assert!(r.needs_render);

        tool.process_mouse_event(&MouseEvent::drag(
            &panel,
            MouseButton::Primary,
            Vec2D::new(60.0, 40.0),
        ));
        let r = tool.process_mouse_event(&MouseEvent::release(
            &panel,
            MouseButton::Primary,
            Vec2D::new(60.0, 40.0),
        ));
        assert!(r.needs_render);
        assert!(!r.finished);
        assert!(ctx.status().unwrap().contains("size (50,30)"));
    }

    #[test]
    fn escape_clears_an_open_band() {
        let (_ctx, panel, mut tool) = setup();
        tool.activate();
        tool.process_mouse_event(&MouseEvent::press(
            &panel,
            MouseButton::Primary,
            Vec2D::new(10.0, 10.0),
        ));

        let r = tool.process_key_event(&KeyEvent::new(Key::Escape), &panel);
        assert!(r.needs_render);

        // second escape has nothing left to clear
        let r = tool.process_key_event(&KeyEvent::new(Key::Escape), &panel);
        assert_eq!(r, EventResponse::NONE);
    }

    #[test]
    fn deactivate_releases_the_band() {
        let (_ctx, panel, mut tool) = setup();
        tool.activate();
        tool.process_mouse_event(&MouseEvent::press(
            &panel,
            MouseButton::Primary,
            Vec2D::new(10.0, 10.0),
        ));
        tool.deactivate();

        // a drag after reactivation finds no half-open band
        tool.activate();
        let r = tool.process_mouse_event(&MouseEvent::drag(
            &panel,
            MouseButton::Primary,
            Vec2D::new(20.0, 20.0),
        ));
        assert_eq!(r, EventResponse::NONE);
    }

    #[test]
    fn update_advances_the_band_outline() {
        let (_ctx, panel, mut tool) = setup();
        tool.activate();
        tool.update(0.25, 0.0);
        assert_eq!(tool.dash_phase, 0.0);

        tool.process_mouse_event(&MouseEvent::press(
            &panel,
            MouseButton::Primary,
            Vec2D::new(10.0, 10.0),
        ));
        tool.update(0.25, 0.0);
        assert!(tool.dash_phase > 0.0);
    }
}
