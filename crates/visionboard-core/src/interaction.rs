//! Translates pointer, wheel and key events into store mutations.

use crate::canvas::{Canvas, LinkHit};
use crate::input::{Key, KeyEvent, MouseButton, PointerEvent};
use crate::selection::InteractionMode;
use kurbo::Point;

/// What a press landed on, in priority order.
#[derive(Debug, Clone, PartialEq)]
enum PressTarget {
    Corner,
    Element(String),
    Link(LinkHit),
    Background,
}

/// Drives the canvas interaction state machine.
///
/// The active mode itself lives on the [`Canvas`]; the controller only
/// remembers which button is held so stray moves and releases are ignored.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    pressed: Option<MouseButton>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the primary button is currently held.
    pub fn is_pressed(&self) -> bool {
        self.pressed.is_some()
    }

    /// Dispatch a raw pointer event.
    pub fn handle_pointer_event(&mut self, canvas: &mut Canvas, event: PointerEvent) {
        match event {
            PointerEvent::Down { position, button } => self.handle_press(canvas, position, button),
            PointerEvent::Move { position } => self.handle_move(canvas, position),
            PointerEvent::Up { position, button } => self.handle_release(canvas, position, button),
            PointerEvent::Scroll { delta, .. } => self.handle_scroll(canvas, delta.y),
            PointerEvent::Leave => self.handle_leave(canvas),
        }
    }

    /// "Start connection" affordance on an element.
    pub fn begin_connection(&mut self, canvas: &mut Canvas, source: &str) -> bool {
        canvas.start_connecting(source)
    }

    /// "Start arrow" affordance on an element.
    pub fn begin_arrow(&mut self, canvas: &mut Canvas, source: &str) -> bool {
        canvas.start_arrow(source)
    }

    fn target_at(canvas: &Canvas, position: Point) -> PressTarget {
        if canvas.corner_at(position).is_some() {
            return PressTarget::Corner;
        }
        if let Some(element) = canvas.element_at(position) {
            return PressTarget::Element(element.id().to_string());
        }
        if let Some(hit) = canvas.link_at(position) {
            return PressTarget::Link(hit);
        }
        PressTarget::Background
    }

    pub fn handle_press(&mut self, canvas: &mut Canvas, position: Point, button: MouseButton) {
        if button != MouseButton::Left {
            return;
        }
        canvas.set_cursor(Some(position));

        if canvas.mode().is_creating_link() {
            match canvas.element_at(position).map(|e| e.id().to_string()) {
                Some(target) => {
                    if let Some(id) = canvas.complete_link(&target) {
                        log::debug!("Link {} created by click on {}", id, target);
                    }
                }
                None => canvas.reset(),
            }
            return;
        }

        match Self::target_at(canvas, position) {
            PressTarget::Corner => {
                if let Some((id, corner)) = canvas.corner_at(position) {
                    canvas.start_scale(&id, corner, position);
                }
            }
            PressTarget::Element(id) => {
                canvas.start_drag(&id, position);
            }
            PressTarget::Link(LinkHit::Connection(id)) => {
                canvas.cancel_mode();
                canvas.select_connection(&id);
            }
            PressTarget::Link(LinkHit::Arrow(id)) => {
                canvas.cancel_mode();
                canvas.select_arrow(&id);
            }
            PressTarget::Background => canvas.reset(),
        }
        self.pressed = Some(button);
    }

    pub fn handle_move(&mut self, canvas: &mut Canvas, position: Point) {
        canvas.set_cursor(Some(position));
        if self.pressed.is_none() {
            return;
        }
        match canvas.mode() {
            InteractionMode::Dragging(_) => {
                canvas.update_drag(position);
            }
            InteractionMode::Scaling(_) => {
                canvas.update_scale(position);
            }
            _ => {}
        }
    }

    pub fn handle_release(&mut self, canvas: &mut Canvas, position: Point, button: MouseButton) {
        if self.pressed != Some(button) {
            return;
        }
        self.pressed = None;
        canvas.set_cursor(Some(position));
        Self::finish_gesture(canvas);
    }

    /// The pointer left the surface: end any drag or scale in place.
    pub fn handle_leave(&mut self, canvas: &mut Canvas) {
        self.pressed = None;
        canvas.set_cursor(None);
        Self::finish_gesture(canvas);
    }

    fn finish_gesture(canvas: &mut Canvas) {
        if !canvas.end_drag() {
            canvas.end_scale();
        }
    }

    /// Wheel input; `delta_y` is in notches, positive when scrolling down.
    pub fn handle_scroll(&mut self, canvas: &mut Canvas, delta_y: f64) {
        if let Some(scale) = canvas.wheel_scale(-delta_y) {
            log::debug!("Wheel scale -> {:.3}", scale);
        }
    }

    /// Returns true if the key was consumed.
    pub fn handle_key(&mut self, canvas: &mut Canvas, event: &KeyEvent) -> bool {
        match &event.key {
            Key::Delete | Key::Backspace => canvas.delete_selected(),
            Key::Escape => {
                self.pressed = None;
                canvas.reset();
                true
            }
            Key::Character(c) if event.modifiers.command() && c == "z" => {
                if event.modifiers.shift {
                    canvas.redo()
                } else {
                    canvas.undo()
                }
            }
            Key::Character(c) if event.modifiers.command() && c == "y" => canvas.redo(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ElementTemplate, MAX_SCALE};
    use crate::input::Modifiers;
    use crate::selection::Selection;
    use kurbo::Vec2;

    fn setup() -> (Canvas, InteractionController, String, String) {
        let mut canvas = Canvas::new();
        let a = canvas.add_element(ElementTemplate::Text, Point::new(0.0, 0.0));
        let b = canvas.add_element(ElementTemplate::Text, Point::new(400.0, 0.0));
        canvas.update_element_size(&a, 100.0, 100.0);
        canvas.update_element_size(&b, 100.0, 100.0);
        canvas.clear_selection();
        (canvas, InteractionController::new(), a, b)
    }

    fn down(position: Point) -> PointerEvent {
        PointerEvent::Down {
            position,
            button: MouseButton::Left,
        }
    }

    fn up(position: Point) -> PointerEvent {
        PointerEvent::Up {
            position,
            button: MouseButton::Left,
        }
    }

    fn moved(position: Point) -> PointerEvent {
        PointerEvent::Move { position }
    }

    #[test]
    fn test_press_move_release_drags() {
        let (mut canvas, mut ctrl, a, _) = setup();
        ctrl.handle_pointer_event(&mut canvas, down(Point::new(50.0, 50.0)));
        assert!(matches!(canvas.mode(), InteractionMode::Dragging(_)));
        assert_eq!(canvas.selection().element(), Some(a.as_str()));

        ctrl.handle_pointer_event(&mut canvas, moved(Point::new(70.0, 60.0)));
        ctrl.handle_pointer_event(&mut canvas, up(Point::new(70.0, 60.0)));

        assert!(canvas.mode().is_idle());
        assert_eq!(canvas.element(&a).unwrap().position, Point::new(20.0, 10.0));
    }

    #[test]
    fn test_move_without_press_does_nothing() {
        let (mut canvas, mut ctrl, a, _) = setup();
        ctrl.handle_pointer_event(&mut canvas, moved(Point::new(70.0, 60.0)));
        assert_eq!(canvas.element(&a).unwrap().position, Point::ZERO);
        assert_eq!(canvas.cursor(), Some(Point::new(70.0, 60.0)));
    }

    #[test]
    fn test_leave_ends_drag() {
        let (mut canvas, mut ctrl, _, _) = setup();
        ctrl.handle_pointer_event(&mut canvas, down(Point::new(50.0, 50.0)));
        ctrl.handle_pointer_event(&mut canvas, PointerEvent::Leave);
        assert!(canvas.mode().is_idle());
        assert!(!ctrl.is_pressed());
        assert_eq!(canvas.cursor(), None);
    }

    #[test]
    fn test_corner_press_scales() {
        let (mut canvas, mut ctrl, a, _) = setup();
        canvas.select(&a);
        // bottom-right corner at (100, 100); center (50, 50)
        ctrl.handle_pointer_event(&mut canvas, down(Point::new(100.0, 100.0)));
        assert!(matches!(canvas.mode(), InteractionMode::Scaling(_)));

        ctrl.handle_pointer_event(&mut canvas, moved(Point::new(150.0, 150.0)));
        assert!((canvas.element(&a).unwrap().scale() - 2.0).abs() < 1e-9);

        ctrl.handle_pointer_event(&mut canvas, moved(Point::new(5000.0, 5000.0)));
        assert_eq!(canvas.element(&a).unwrap().scale(), MAX_SCALE);

        ctrl.handle_pointer_event(&mut canvas, up(Point::new(5000.0, 5000.0)));
        assert!(canvas.mode().is_idle());
        // position and base size untouched by scaling
        let element = canvas.element(&a).unwrap();
        assert_eq!(element.position, Point::ZERO);
        assert_eq!(element.width(), 100.0);
    }

    #[test]
    fn test_connect_by_clicking_other_element() {
        let (mut canvas, mut ctrl, a, b) = setup();
        assert!(ctrl.begin_connection(&mut canvas, &a));
        ctrl.handle_pointer_event(&mut canvas, moved(Point::new(300.0, 50.0)));
        assert!(canvas.temp_link().is_some());

        ctrl.handle_pointer_event(&mut canvas, down(Point::new(450.0, 50.0)));
        ctrl.handle_pointer_event(&mut canvas, up(Point::new(450.0, 50.0)));

        assert!(canvas.mode().is_idle());
        let connections = canvas.document().connections();
        assert_eq!(connections.len(), 1);
        assert!(connections[0].joins(&a, &b));
    }

    #[test]
    fn test_arrow_click_same_element_cancels() {
        let (mut canvas, mut ctrl, a, _) = setup();
        ctrl.begin_arrow(&mut canvas, &a);
        ctrl.handle_pointer_event(&mut canvas, down(Point::new(50.0, 50.0)));
        assert!(canvas.mode().is_idle());
        assert!(canvas.document().arrows().is_empty());
    }

    #[test]
    fn test_background_click_cancels_and_clears() {
        let (mut canvas, mut ctrl, a, _) = setup();
        ctrl.begin_arrow(&mut canvas, &a);
        let before = canvas.element(&a).unwrap().clone();

        ctrl.handle_pointer_event(&mut canvas, down(Point::new(250.0, 500.0)));
        assert!(canvas.mode().is_idle());
        assert!(canvas.selection().is_none());
        assert!(canvas.document().arrows().is_empty());
        assert_eq!(canvas.element(&a).unwrap(), &before);
    }

    #[test]
    fn test_click_on_link_selects_it() {
        let (mut canvas, mut ctrl, a, b) = setup();
        let arrow = canvas.create_arrow(&a, &b).unwrap();
        ctrl.handle_pointer_event(&mut canvas, down(Point::new(250.0, 52.0)));
        assert_eq!(canvas.selection(), &Selection::Arrow(arrow));
        assert!(canvas.mode().is_idle());
    }

    #[test]
    fn test_wheel_scales_selected_element() {
        let (mut canvas, mut ctrl, a, _) = setup();
        let wheel = |dy: f64| PointerEvent::Scroll {
            position: Point::ZERO,
            delta: Vec2::new(0.0, dy),
        };

        ctrl.handle_pointer_event(&mut canvas, wheel(-1.0));
        assert_eq!(canvas.element(&a).unwrap().scale(), 1.0);

        canvas.select(&a);
        ctrl.handle_pointer_event(&mut canvas, wheel(-1.0));
        assert!((canvas.element(&a).unwrap().scale() - 1.1).abs() < 1e-9);
        assert!(canvas.mode().is_idle());
    }

    #[test]
    fn test_delete_key_removes_selection() {
        let (mut canvas, mut ctrl, a, b) = setup();
        let conn = canvas.create_connection(&a, &b).unwrap();
        canvas.select_connection(&conn);
        assert!(ctrl.handle_key(&mut canvas, &KeyEvent::new(Key::Delete)));
        assert!(canvas.document().connections().is_empty());
        assert_eq!(canvas.document().len(), 2);

        canvas.select(&b);
        assert!(ctrl.handle_key(&mut canvas, &KeyEvent::new(Key::Backspace)));
        assert!(canvas.element(&b).is_none());
        assert!(!ctrl.handle_key(&mut canvas, &KeyEvent::new(Key::Delete)));
    }

    #[test]
    fn test_escape_cancels_mode() {
        let (mut canvas, mut ctrl, a, _) = setup();
        ctrl.begin_connection(&mut canvas, &a);
        assert!(ctrl.handle_key(&mut canvas, &KeyEvent::new(Key::Escape)));
        assert!(canvas.mode().is_idle());
        assert!(canvas.selection().is_none());
    }

    #[test]
    fn test_undo_shortcuts() {
        let (mut canvas, mut ctrl, a, _) = setup();
        canvas.rotate_element(&a, true);
        let ctrl_mod = Modifiers {
            ctrl: true,
            ..Modifiers::default()
        };
        let undo = KeyEvent::with_modifiers(Key::Character("z".into()), ctrl_mod);
        assert!(ctrl.handle_key(&mut canvas, &undo));
        assert_eq!(canvas.element(&a).unwrap().rotation, 0.0);

        let redo = KeyEvent::with_modifiers(Key::Character("y".into()), ctrl_mod);
        assert!(ctrl.handle_key(&mut canvas, &redo));
        assert_eq!(canvas.element(&a).unwrap().rotation, 90.0);
    }

    #[test]
    fn test_click_select_keeps_redo() {
        let (mut canvas, mut ctrl, a, _) = setup();
        canvas.rotate_element(&a, true);
        assert!(canvas.undo());

        let on_a = Point::new(50.0, 50.0);
        ctrl.handle_pointer_event(&mut canvas, down(on_a));
        ctrl.handle_pointer_event(
            &mut canvas,
            PointerEvent::Up {
                position: on_a,
                button: MouseButton::Left,
            },
        );
        assert_eq!(canvas.selection(), &Selection::Element(a.clone()));
        assert!(canvas.document().can_redo());
    }
}
