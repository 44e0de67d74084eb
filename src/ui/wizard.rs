//! Startup wizard: save folder, project name and an optional template.

use gtk4 as gtk;

use gtk::gio;
use gtk::glib;
use gtk::prelude::*;
use gtk::{Align, Orientation};
use log::debug;
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

use crate::app::{APP_NAME, DEFAULT_PROJECT_NAME};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardAnswer {
    pub folder: PathBuf,
    pub project_name: String,
    pub template: Option<PathBuf>,
}

#[derive(Default)]
struct Choices {
    folder: Option<PathBuf>,
    template: Option<PathBuf>,
}

fn path_row(title: &str, button_label: &str) -> (gtk::Box, gtk::Label, gtk::Button) {
    let caption = gtk::Label::builder()
        .label(title)
        .halign(Align::Start)
        .build();
    caption.add_css_class("heading");

    let value = gtk::Label::builder()
        .label("Not chosen")
        .halign(Align::Start)
        .hexpand(true)
        .ellipsize(gtk::pango::EllipsizeMode::Middle)
        .build();
    value.add_css_class("dim-label");

    let button = gtk::Button::builder().label(button_label).build();

    let row = gtk::Box::builder()
        .orientation(Orientation::Horizontal)
        .spacing(12)
        .build();
    row.append(&value);
    row.append(&button);

    let block = gtk::Box::builder()
        .orientation(Orientation::Vertical)
        .spacing(6)
        .build();
    block.append(&caption);
    block.append(&row);
    (block, value, button)
}

/// Show the wizard and block until it is answered. `None` when the operator
/// backs out.
pub fn run(app: &impl IsA<gtk::Application>, parent: Option<&gtk::Window>) -> Option<WizardAnswer> {
    let window = gtk::Window::builder()
        .application(app)
        .title(format!("{} - New project", APP_NAME))
        .modal(true)
        .default_width(480)
        .resizable(false)
        .build();
    if let Some(parent) = parent {
        window.set_transient_for(Some(parent));
    }

    let choices = Rc::new(RefCell::new(Choices::default()));
    let answer: Rc<RefCell<Option<WizardAnswer>>> = Rc::default();
    let done = Rc::new(Cell::new(false));

    let (folder_block, folder_label, folder_btn) = path_row("Save folder", "Choose…");
    let (template_block, template_label, template_btn) =
        path_row("PowerPoint template (optional)", "Choose…");
    template_label.set_label("Blank deck");

    let name_caption = gtk::Label::builder()
        .label("Project name")
        .halign(Align::Start)
        .build();
    name_caption.add_css_class("heading");
    let name_entry = gtk::Entry::builder()
        .placeholder_text(DEFAULT_PROJECT_NAME)
        .activates_default(true)
        .build();

    let cancel_btn = gtk::Button::builder().label("Cancel").build();
    let start_btn = gtk::Button::builder().label("Start").sensitive(false).build();
    start_btn.add_css_class("suggested-action");

    let buttons = gtk::Box::builder()
        .orientation(Orientation::Horizontal)
        .spacing(6)
        .halign(Align::End)
        .build();
    buttons.append(&cancel_btn);
    buttons.append(&start_btn);

    let content = gtk::Box::builder()
        .orientation(Orientation::Vertical)
        .spacing(18)
        .margin_top(18)
        .margin_bottom(18)
        .margin_start(18)
        .margin_end(18)
        .build();
    content.append(&folder_block);
    content.append(&name_caption);
    content.append(&name_entry);
    content.append(&template_block);
    content.append(&buttons);
    window.set_child(Some(&content));
    window.set_default_widget(Some(&start_btn));

    folder_btn.connect_clicked({
        let window = window.clone();
        let choices = choices.clone();
        let folder_label = folder_label.clone();
        let start_btn = start_btn.clone();
        move |_| {
            let dialog = gtk::FileDialog::builder()
                .title("Choose the folder to save into")
                .modal(true)
                .build();
            let choices = choices.clone();
            let folder_label = folder_label.clone();
            let start_btn = start_btn.clone();
            dialog.select_folder(Some(&window), gio::Cancellable::NONE, move |result| {
                if let Some(path) = result.ok().and_then(|file| file.path()) {
                    folder_label.set_label(&path.to_string_lossy());
                    choices.borrow_mut().folder = Some(path);
                    start_btn.set_sensitive(true);
                }
            });
        }
    });

    template_btn.connect_clicked({
        let window = window.clone();
        let choices = choices.clone();
        let template_label = template_label.clone();
        move |_| {
            let filter = gtk::FileFilter::new();
            filter.set_name(Some("PowerPoint presentations"));
            filter.add_suffix("pptx");
            let filters = gio::ListStore::new::<gtk::FileFilter>();
            filters.append(&filter);

            let dialog = gtk::FileDialog::builder()
                .title("Choose a template")
                .modal(true)
                .filters(&filters)
                .build();
            let choices = choices.clone();
            let template_label = template_label.clone();
            dialog.open(Some(&window), gio::Cancellable::NONE, move |result| {
                if let Some(path) = result.ok().and_then(|file| file.path()) {
                    template_label.set_label(&path.to_string_lossy());
                    choices.borrow_mut().template = Some(path);
                }
            });
        }
    });

    start_btn.connect_clicked({
        let window = window.clone();
        let choices = choices.clone();
        let answer = answer.clone();
        let name_entry = name_entry.clone();
        move |_| {
            let choices = choices.borrow();
            let Some(folder) = choices.folder.clone() else {
                return;
            };
            *answer.borrow_mut() = Some(WizardAnswer {
                folder,
                project_name: name_entry.text().trim().to_string(),
                template: choices.template.clone(),
            });
            window.close();
        }
    });

    cancel_btn.connect_clicked({
        let window = window.clone();
        move |_| window.close()
    });

    window.connect_close_request({
        let done = done.clone();
        move |_| {
            done.set(true);
            glib::Propagation::Proceed
        }
    });

    window.present();

    let context = glib::MainContext::default();
    while !done.get() {
        context.iteration(true);
    }

    let answer = answer.borrow_mut().take();
    debug!("Wizard answered: {:?}", answer);
    answer
}
