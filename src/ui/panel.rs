//! The control panel: capture buttons, save, project switching and the
//! status line.

use gtk4 as gtk;
use libadwaita as adw;

use adw::prelude::*;
use gtk::glib;
use gtk::{Align, Orientation};
use log::{error, info, warn};
use std::cell::RefCell;
use std::rc::Rc;

use super::name_dialog::GtkNamePrompt;
use super::{create_session, wizard};
use crate::app::{AppConfig, CaptureMode, Session, Severity, StatusMessage, APP_NAME};
use crate::capture::{DesktopSession, XcapDesktop};
use crate::orchestrator::{CaptureOrchestrator, PanelVisibility, Platform};
use crate::overlay::gtk_surface::GtkOverlayHost;
use crate::overlay::WindowFilter;

type SharedOrchestrator = Rc<RefCell<Option<CaptureOrchestrator>>>;

/// `PanelVisibility` for the main window.
struct GtkPanel {
    window: adw::ApplicationWindow,
}

impl PanelVisibility for GtkPanel {
    fn hide(&self) {
        self.window.set_visible(false);
        let context = glib::MainContext::default();
        while context.pending() {
            context.iteration(false);
        }
    }

    fn show(&self) {
        self.window.set_visible(true);
        self.window.present();
    }
}

struct PanelWidgets {
    window: adw::ApplicationWindow,
    status: gtk::Label,
    project: gtk::Label,
}

impl PanelWidgets {
    fn show_status(&self, status: &StatusMessage) {
        for severity in [Severity::Success, Severity::Info, Severity::Error] {
            self.status.remove_css_class(severity.css_class());
        }
        self.status.add_css_class(status.severity.css_class());
        self.status.set_label(&status.text);
    }

    fn show_project(&self, session: &Session) {
        self.project.set_label(&format!(
            "Project: {}  •  {}",
            session.project_name,
            session.project_dir.display()
        ));
    }
}

fn action_button(label: &str, icon: &str) -> gtk::Button {
    let content = adw::ButtonContent::builder()
        .label(label)
        .icon_name(icon)
        .build();
    gtk::Button::builder().child(&content).build()
}

fn capture_button(
    label: &str,
    icon: &str,
    mode: CaptureMode,
    state: &SharedOrchestrator,
    widgets: &Rc<PanelWidgets>,
) -> gtk::Button {
    let button = action_button(label, icon);
    button.add_css_class("suggested-action");
    button.add_css_class("pill");
    button.connect_clicked({
        let state = state.clone();
        let widgets = widgets.clone();
        move |_| {
            let Ok(mut guard) = state.try_borrow_mut() else {
                warn!("Capture already in progress");
                return;
            };
            if let Some(orchestrator) = guard.as_mut() {
                let status = orchestrator.capture(mode);
                widgets.show_status(&status);
            }
        }
    });
    button
}

/// Move the orchestrator out for shutdown. `None` while a capture holds it.
fn take_for_quit<T>(state: &RefCell<Option<T>>) -> Option<Option<T>> {
    state.try_borrow_mut().ok().map(|mut guard| guard.take())
}

/// Close every worker, wait for the final saves, then leave. Returns
/// `false`, doing nothing, while a capture holds the orchestrator.
fn quit(app: &adw::Application, state: &SharedOrchestrator) -> bool {
    let Some(orchestrator) = take_for_quit(state) else {
        warn!("Quit requested during a capture; ignoring");
        return false;
    };
    if let Some(orchestrator) = orchestrator {
        info!("Closing project '{}'", orchestrator.session().project_name);
        orchestrator.shutdown();
    }
    app.quit();
    true
}

fn change_project(state: &SharedOrchestrator, widgets: &PanelWidgets) {
    let Ok(mut guard) = state.try_borrow_mut() else {
        return;
    };
    let Some(orchestrator) = guard.as_mut() else {
        return;
    };

    let parent = widgets.window.clone().upcast::<gtk::Window>();
    let Some(app) = widgets.window.application() else {
        return;
    };
    let Some(answer) = wizard::run(&app, Some(&parent)) else {
        widgets.show_status(&StatusMessage::info("Project unchanged."));
        return;
    };

    let status = match create_session(&answer) {
        Ok(session) => match orchestrator.switch_project(session) {
            Ok(status) => {
                widgets.show_project(orchestrator.session());
                status
            }
            Err(e) => StatusMessage::error(e.to_string()),
        },
        Err(e) => StatusMessage::error(e.to_string()),
    };
    widgets.show_status(&status);
}

pub fn present(app: &adw::Application, config: &AppConfig, desktop: &DesktopSession, session: Session) {
    let header_bar = adw::HeaderBar::new();

    let status = gtk::Label::builder()
        .label("Ready.")
        .halign(Align::Start)
        .wrap(true)
        .build();
    status.add_css_class("accent");

    let project = gtk::Label::builder()
        .halign(Align::Start)
        .ellipsize(gtk::pango::EllipsizeMode::Middle)
        .build();
    project.add_css_class("dim-label");
    project.add_css_class("caption");

    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title(APP_NAME)
        .default_width(560)
        .resizable(false)
        .build();

    let widgets = Rc::new(PanelWidgets {
        window: window.clone(),
        status,
        project,
    });
    widgets.show_project(&session);

    let xcap = Rc::new(XcapDesktop::new());
    let platform = Platform {
        geometry: xcap.clone(),
        backend: xcap.clone(),
        locator: xcap,
        overlay_host: Rc::new(GtkOverlayHost::new()),
        prompt: Rc::new(GtkNamePrompt::new()),
        panel: Rc::new(GtkPanel {
            window: window.clone(),
        }),
    };
    let filter = WindowFilter::new(
        config.capture.app_name.clone(),
        desktop.filtered_classes(&config.capture.extra_shell_classes),
    );

    let state: SharedOrchestrator = Rc::new(RefCell::new(None));
    match CaptureOrchestrator::new(platform, filter, config, session) {
        Ok(orchestrator) => *state.borrow_mut() = Some(orchestrator),
        Err(e) => {
            error!("{}", e);
            widgets.show_status(&StatusMessage::error(e.to_string()));
        }
    }

    let capture_row = gtk::Box::builder()
        .orientation(Orientation::Horizontal)
        .spacing(8)
        .homogeneous(true)
        .build();
    capture_row.append(&capture_button(
        "Monitor",
        "video-display-symbolic",
        CaptureMode::Monitor,
        &state,
        &widgets,
    ));
    capture_row.append(&capture_button(
        "Window",
        "focus-windows-symbolic",
        CaptureMode::Window,
        &state,
        &widgets,
    ));
    capture_row.append(&capture_button(
        "Region",
        "crop-symbolic",
        CaptureMode::Region,
        &state,
        &widgets,
    ));

    let save_btn = action_button("Save PPTX/DOCX Now", "document-save-symbolic");
    save_btn.connect_clicked({
        let state = state.clone();
        let widgets = widgets.clone();
        move |_| {
            if let Ok(guard) = state.try_borrow() {
                if let Some(orchestrator) = guard.as_ref() {
                    widgets.show_status(&orchestrator.save_now());
                }
            }
        }
    });

    let change_btn = action_button("Change Project", "folder-open-symbolic");
    change_btn.connect_clicked({
        let state = state.clone();
        let widgets = widgets.clone();
        move |_| change_project(&state, &widgets)
    });

    let quit_btn = action_button("Quit", "application-exit-symbolic");
    quit_btn.add_css_class("destructive-action");
    quit_btn.connect_clicked({
        let state = state.clone();
        let app = app.clone();
        move |_| {
            quit(&app, &state);
        }
    });

    let actions_row = gtk::Box::builder()
        .orientation(Orientation::Horizontal)
        .spacing(8)
        .build();
    actions_row.append(&save_btn);
    actions_row.append(&change_btn);

    let footer = gtk::Box::builder()
        .orientation(Orientation::Horizontal)
        .halign(Align::End)
        .build();
    footer.append(&quit_btn);

    let body = gtk::Box::builder()
        .orientation(Orientation::Vertical)
        .spacing(12)
        .margin_top(12)
        .margin_bottom(12)
        .margin_start(12)
        .margin_end(12)
        .build();
    body.append(&widgets.project);
    body.append(&capture_row);
    body.append(&actions_row);
    body.append(&widgets.status);
    body.append(&footer);

    let content = gtk::Box::builder()
        .orientation(Orientation::Vertical)
        .build();
    content.append(&header_bar);
    content.append(&body);
    window.set_content(Some(&content));

    window.connect_close_request({
        let state = state.clone();
        let app = app.clone();
        move |_| {
            if quit(&app, &state) {
                glib::Propagation::Proceed
            } else {
                glib::Propagation::Stop
            }
        }
    });

    window.present();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_waits_for_running_capture() {
        let state = RefCell::new(Some("orchestrator"));
        {
            let _capture = state.borrow_mut();
            assert_eq!(take_for_quit(&state), None);
        }
        assert_eq!(*state.borrow(), Some("orchestrator"));

        assert_eq!(take_for_quit(&state), Some(Some("orchestrator")));
        assert_eq!(take_for_quit(&state), Some(None));
    }
}
