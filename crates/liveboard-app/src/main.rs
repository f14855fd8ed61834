//! Main application entry point.

use liveboard_app::{App, AppConfig, ShortcutRegistry};
use std::path::PathBuf;

fn main() {
    env_logger::init();
    log::info!("Starting Liveboard");

    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => match AppConfig::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => AppConfig::default(),
    };

    ShortcutRegistry::print_all();

    let mut app = App::with_config(config);
    match app.run() {
        Ok(summary) => {
            println!(
                "{} shape(s), converged: {}, reactions received: {}",
                summary.shapes, summary.converged, summary.reactions_seen
            );
        }
        Err(e) => {
            log::error!("Session failed: {}", e);
            std::process::exit(1);
        }
    }
}
