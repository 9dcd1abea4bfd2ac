use anyhow::Context;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod constants;
mod conversion;
mod events;
mod metadata;
mod presets;
mod process;
mod services;
mod state;
mod ui;

use app::ConverterApp;
use config::AppConfig;
use constants::APP_NAME;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting {}", APP_NAME);

    // Probe and transcode jobs run here; the GUI thread only polls results.
    let runtime = Runtime::new().context("Failed to create async runtime")?;
    let handle = runtime.handle().clone();
    let config = AppConfig::load();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 720.0])
            .with_min_inner_size([720.0, 560.0])
            .with_title(APP_NAME)
            .with_resizable(true),
        ..Default::default()
    };

    let app_creator = move |_cc: &eframe::CreationContext| -> Box<dyn eframe::App> {
        Box::new(ConverterApp::new(handle, config))
    };

    eframe::run_native(APP_NAME, options, Box::new(app_creator))
        .map_err(|e| anyhow::anyhow!("Failed to run application: {}", e))?;

    tracing::info!("Application shutting down");
    drop(runtime);
    Ok(())
}
