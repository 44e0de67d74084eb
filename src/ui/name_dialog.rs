//! "Name your screenshot" dialog.

use gtk4 as gtk;

use chrono::Local;
use gtk::gdk;
use gtk::glib;
use gtk::prelude::*;
use gtk::{Align, Orientation};
use image::imageops::{self, FilterType};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::capture::CapturedImage;
use crate::naming::suggested_name;
use crate::orchestrator::NamePrompt;

const PREVIEW_MAX: (u32, u32) = (540, 320);

/// Largest size within the preview box, keeping aspect. Never upscales.
pub fn preview_size(width: u32, height: u32) -> (u32, u32) {
    let (max_w, max_h) = PREVIEW_MAX;
    if width <= max_w && height <= max_h {
        return (width, height);
    }
    let aspect = f64::from(width) / f64::from(height);
    if f64::from(max_w) / aspect <= f64::from(max_h) {
        (max_w, ((f64::from(max_w) / aspect) as u32).max(1))
    } else {
        (((f64::from(max_h) * aspect) as u32).max(1), max_h)
    }
}

fn preview_texture(shot: &CapturedImage) -> gdk::MemoryTexture {
    let (w, h) = preview_size(shot.width(), shot.height());
    let pixels = if (w, h) == (shot.width(), shot.height()) {
        shot.image.clone()
    } else {
        imageops::resize(&shot.image, w, h, FilterType::Lanczos3)
    };
    let bytes = glib::Bytes::from_owned(pixels.into_raw());
    gdk::MemoryTexture::new(
        w as i32,
        h as i32,
        gdk::MemoryFormat::R8g8b8,
        &bytes,
        w as usize * 3,
    )
}

#[derive(Default)]
pub struct GtkNamePrompt;

impl GtkNamePrompt {
    pub fn new() -> Self {
        Self
    }
}

impl NamePrompt for GtkNamePrompt {
    fn request_name(&self, shot: &CapturedImage) -> Option<String> {
        let window = gtk::Window::builder()
            .title("Name your screenshot")
            .modal(true)
            .resizable(false)
            .build();

        let picture = gtk::Picture::for_paintable(&preview_texture(shot));
        picture.set_can_shrink(false);

        let label = gtk::Label::builder()
            .label("File name (without extension):")
            .halign(Align::Start)
            .build();
        label.add_css_class("heading");

        let entry = gtk::Entry::builder()
            .text(suggested_name(Local::now().naive_local()))
            .width_chars(50)
            .build();

        let cancel_btn = gtk::Button::builder().label("Cancel").build();
        cancel_btn.add_css_class("destructive-action");
        let save_btn = gtk::Button::builder().label("Save").build();
        save_btn.add_css_class("suggested-action");

        let buttons = gtk::Box::builder()
            .orientation(Orientation::Horizontal)
            .spacing(12)
            .halign(Align::Center)
            .build();
        buttons.append(&save_btn);
        buttons.append(&cancel_btn);

        let content = gtk::Box::builder()
            .orientation(Orientation::Vertical)
            .spacing(8)
            .margin_top(14)
            .margin_bottom(14)
            .margin_start(14)
            .margin_end(14)
            .build();
        content.append(&picture);
        content.append(&label);
        content.append(&entry);
        content.append(&buttons);
        window.set_child(Some(&content));

        let result: Rc<RefCell<Option<String>>> = Rc::default();
        let done = Rc::new(Cell::new(false));

        let accept = {
            let window = window.clone();
            let entry = entry.clone();
            let result = result.clone();
            move || {
                *result.borrow_mut() = Some(entry.text().trim().to_string());
                window.close();
            }
        };
        save_btn.connect_clicked({
            let accept = accept.clone();
            move |_| accept()
        });
        entry.connect_activate(move |_| accept());

        cancel_btn.connect_clicked({
            let window = window.clone();
            move |_| window.close()
        });

        let keys = gtk::EventControllerKey::new();
        keys.connect_key_pressed({
            let window = window.clone();
            move |_, key, _, _| {
                if key == gdk::Key::Escape {
                    window.close();
                    glib::Propagation::Stop
                } else {
                    glib::Propagation::Proceed
                }
            }
        });
        window.add_controller(keys);

        window.connect_close_request({
            let done = done.clone();
            move |_| {
                done.set(true);
                glib::Propagation::Proceed
            }
        });

        window.present();
        entry.grab_focus();
        entry.select_region(0, -1);

        let context = glib::MainContext::default();
        while !done.get() {
            context.iteration(true);
        }

        let name = result.borrow_mut().take();
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_size() {
        assert_eq!(preview_size(300, 200), (300, 200));
        assert_eq!(preview_size(1920, 1080), (540, 303));
        assert_eq!(preview_size(800, 1600), (160, 320));
    }
}
