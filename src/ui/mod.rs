//! GTK front end: startup wizard, control panel and naming dialog.

pub mod name_dialog;
pub mod panel;
pub mod wizard;

use libadwaita as adw;

use log::{error, info};

use crate::app::config::{config_path, save_config};
use crate::app::{load_config, Session, SessionError};
use crate::capture::DesktopSession;

pub use wizard::WizardAnswer;

pub fn create_session(answer: &WizardAnswer) -> Result<Session, SessionError> {
    Session::create(&answer.folder, &answer.project_name, answer.template.clone())
}

pub fn build_ui(app: &adw::Application) {
    let config = load_config();
    if !config_path().exists() {
        save_config(&config);
    }

    let desktop = DesktopSession::detect();
    info!("Desktop session: {}", desktop);

    let Some(answer) = wizard::run(app, None) else {
        error!("No save folder chosen; exiting");
        std::process::exit(1);
    };

    let session = match create_session(&answer) {
        Ok(session) => session,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    panel::present(app, &config, &desktop, session);
}
