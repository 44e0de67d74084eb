//! GTK overlay surface
//!
//! An undecorated, fullscreen, dimmed window. Gesture and key controllers
//! push `OverlayInput`s into a queue that `next_input` drains while pumping
//! the default main context.

use gtk4 as gtk;

use gtk::cairo;
use gtk::gdk;
use gtk::glib;
use gtk::prelude::*;
use log::{debug, warn};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use super::{OverlayHost, OverlayInput, OverlayKind, OverlaySurface};
use crate::capture::{Point, Rect};

const OVERLAY_CSS_CLASS: &str = "clickshot-overlay";

const OVERLAY_CSS: &str = "
window.clickshot-overlay {
    background-color: rgba(0, 0, 0, 0.25);
}
";

/// Outline colour, #58a6ff
const OUTLINE_RGB: (f64, f64, f64) = (0x58 as f64 / 255.0, 0xa6 as f64 / 255.0, 1.0);

#[derive(Default)]
pub struct GtkOverlayHost {
    css_loaded: Cell<bool>,
}

impl GtkOverlayHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_css(&self) {
        if self.css_loaded.get() {
            return;
        }
        let Some(display) = gdk::Display::default() else {
            warn!("No display available for overlay styling");
            return;
        };
        let provider = gtk::CssProvider::new();
        provider.load_from_string(OVERLAY_CSS);
        gtk::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
        self.css_loaded.set(true);
    }
}

/// The monitor an overlay for `bounds` should cover. GTK can't span
/// monitors with one window, so the one with the largest overlap wins;
/// callers pass the bounds of the monitor under the pointer.
fn target_monitor(bounds: Rect) -> Option<(gdk::Monitor, Rect)> {
    let display = gdk::Display::default()?;
    let model = display.monitors();
    (0..model.n_items())
        .filter_map(|i| model.item(i).and_downcast::<gdk::Monitor>())
        .map(|monitor| {
            let g = monitor.geometry();
            let rect = Rect::new(
                g.x(),
                g.y(),
                g.width().max(0) as u32,
                g.height().max(0) as u32,
            );
            (monitor, rect)
        })
        .max_by_key(|(_, rect)| {
            rect.intersect(&bounds)
                .map(|o| u64::from(o.width) * u64::from(o.height))
                .unwrap_or(0)
        })
}

impl OverlayHost for GtkOverlayHost {
    fn open(&self, kind: OverlayKind, bounds: Rect) -> Box<dyn OverlaySurface> {
        self.ensure_css();
        Box::new(GtkOverlaySurface::new(kind, bounds))
    }
}

pub struct GtkOverlaySurface {
    window: gtk::Window,
    drawing_area: gtk::DrawingArea,
    origin: Point,
    inputs: Rc<RefCell<VecDeque<OverlayInput>>>,
    selection: Rc<Cell<Option<Rect>>>,
    closed: Rc<Cell<bool>>,
    destroyed: bool,
}

impl GtkOverlaySurface {
    fn new(kind: OverlayKind, bounds: Rect) -> Self {
        let inputs: Rc<RefCell<VecDeque<OverlayInput>>> = Rc::default();
        let selection: Rc<Cell<Option<Rect>>> = Rc::default();
        let closed = Rc::new(Cell::new(false));

        let drawing_area = gtk::DrawingArea::builder()
            .hexpand(true)
            .vexpand(true)
            .build();

        drawing_area.set_draw_func({
            let selection = selection.clone();
            move |_, cr, width, _height| {
                if let Err(e) = paint_overlay(cr, kind.hint(), selection.get(), width) {
                    warn!("Overlay paint failed: {}", e);
                }
            }
        });

        let window = gtk::Window::builder()
            .decorated(false)
            .resizable(false)
            .child(&drawing_area)
            .build();
        window.add_css_class(OVERLAY_CSS_CLASS);

        let origin = match target_monitor(bounds) {
            Some((monitor, rect)) => {
                window.fullscreen_on_monitor(&monitor);
                rect.origin()
            }
            None => {
                window.fullscreen();
                bounds.origin()
            }
        };

        let drag = gtk::GestureDrag::new();
        drag.set_button(gdk::BUTTON_PRIMARY);
        drag.connect_drag_begin({
            let inputs = inputs.clone();
            move |_, x, y| {
                inputs
                    .borrow_mut()
                    .push_back(OverlayInput::PrimaryDown(local_point(x, y)));
            }
        });
        drag.connect_drag_update({
            let inputs = inputs.clone();
            move |gesture, dx, dy| {
                if let Some((x, y)) = gesture.start_point() {
                    inputs
                        .borrow_mut()
                        .push_back(OverlayInput::PointerMoved(local_point(x + dx, y + dy)));
                }
            }
        });
        drag.connect_drag_end({
            let inputs = inputs.clone();
            move |gesture, dx, dy| {
                if let Some((x, y)) = gesture.start_point() {
                    inputs
                        .borrow_mut()
                        .push_back(OverlayInput::PrimaryUp(local_point(x + dx, y + dy)));
                }
            }
        });
        drawing_area.add_controller(drag);

        let keys = gtk::EventControllerKey::new();
        keys.connect_key_pressed({
            let inputs = inputs.clone();
            move |_, key, _, _| {
                if key == gdk::Key::Escape {
                    inputs.borrow_mut().push_back(OverlayInput::Cancel);
                    glib::Propagation::Stop
                } else {
                    glib::Propagation::Proceed
                }
            }
        });
        window.add_controller(keys);

        window.connect_close_request({
            let closed = closed.clone();
            move |_| {
                closed.set(true);
                glib::Propagation::Proceed
            }
        });

        window.present();
        debug!("Overlay window presented at ({}, {})", origin.x, origin.y);

        Self {
            window,
            drawing_area,
            origin,
            inputs,
            selection,
            closed,
            destroyed: false,
        }
    }
}

fn local_point(x: f64, y: f64) -> Point {
    Point::new(x.round() as i32, y.round() as i32)
}

fn paint_overlay(
    cr: &cairo::Context,
    hint: &str,
    selection: Option<Rect>,
    width: i32,
) -> Result<(), cairo::Error> {
    cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Bold);
    cr.set_font_size(18.0);
    let extents = cr.text_extents(hint)?;
    cr.set_source_rgba(1.0, 1.0, 1.0, 0.9);
    cr.move_to((f64::from(width) - extents.width()) / 2.0, 48.0);
    cr.show_text(hint)?;

    if let Some(rect) = selection {
        let (r, g, b) = OUTLINE_RGB;
        let (x, y) = (f64::from(rect.x), f64::from(rect.y));
        let (w, h) = (f64::from(rect.width), f64::from(rect.height));

        cr.set_source_rgba(r, g, b, 0.15);
        cr.rectangle(x, y, w, h);
        cr.fill()?;

        cr.set_source_rgb(r, g, b);
        cr.set_line_width(2.0);
        cr.rectangle(x, y, w, h);
        cr.stroke()?;
    }
    Ok(())
}

impl OverlaySurface for GtkOverlaySurface {
    fn origin(&self) -> Point {
        self.origin
    }

    fn next_input(&mut self) -> Option<OverlayInput> {
        let context = glib::MainContext::default();
        loop {
            if let Some(input) = self.inputs.borrow_mut().pop_front() {
                return Some(input);
            }
            if self.closed.get() {
                return None;
            }
            context.iteration(true);
        }
    }

    fn set_selection(&mut self, selection: Option<Rect>) {
        if self.selection.get() != selection {
            self.selection.set(selection);
            self.drawing_area.queue_draw();
        }
    }

    fn close(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.closed.set(true);
        self.window.destroy();
        self.inputs.borrow_mut().clear();

        // Let the compositor unmap the window before anything is captured.
        let context = glib::MainContext::default();
        while context.pending() {
            context.iteration(false);
        }
    }
}

impl Drop for GtkOverlaySurface {
    fn drop(&mut self) {
        self.close();
    }
}
