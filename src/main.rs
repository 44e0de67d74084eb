use libadwaita as adw;

use adw::prelude::*;
use env_logger::Env;

const APP_ID: &str = "io.github.clickshot.ClickShot";

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let app = adw::Application::builder().application_id(APP_ID).build();
    app.connect_activate(clickshot::ui::build_ui);
    app.run();
}
