// File: main.rs
// Location: /src/main.rs

use chrono::Local;
use gtk4::prelude::*;
use libadwaita as adw;
use std::io::Write;

mod ui;
mod window;

use window::QrWindow;

const APP_ID: &str = "com.github.adwaita-qr";

fn setup_logging() {
    env_logger::Builder::new()
        .format(move |buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Debug)
        .parse_default_env()
        .try_init()
        .ok();
}

fn main() -> glib::ExitCode {
    setup_logging();
    log::info!("Application starting...");

    // Logo decoding and debounce timers run on tokio.
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");
    let _guard = rt.enter();

    let app = adw::Application::builder()
        .application_id(APP_ID)
        .build();

    app.connect_activate(build_ui);
    app.run()
}

fn build_ui(app: &adw::Application) {
    log::info!("Building UI...");
    let window = QrWindow::new(app);
    window.window.present();
    log::info!("UI built and window presented");
}
