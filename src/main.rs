use anyhow::{Context, Result};
use callbot::integration::{AppConfig, Orchestrator};
use callbot::ui::CallbotApp;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "callbot=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config_path: Option<PathBuf> = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--list-devices" => return list_devices(),
            path => config_path = Some(PathBuf::from(path)),
        }
    }

    let config_path = config_path.or_else(AppConfig::default_config_path);
    let mut config = AppConfig::load_or_default(config_path.as_deref())
        .context("Failed to load configuration")?;
    config.apply_env_overrides();
    config.validate().context("Invalid configuration")?;

    info!("Starting Callbot");

    let (orchestrator, events) =
        Orchestrator::from_config(&config).context("Failed to create orchestrator")?;
    let (handle, control_thread) = orchestrator
        .spawn_control_loop()
        .context("Failed to start control loop")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 640.0])
            .with_min_inner_size([640.0, 420.0])
            .with_title("Callbot"),
        ..Default::default()
    };

    let app_handle = handle.clone();
    let app_config = config.clone();
    let run = eframe::run_native(
        "Callbot",
        options,
        Box::new(move |cc| Ok(Box::new(CallbotApp::new(cc, &app_config, app_handle, events)))),
    );

    if let Err(e) = handle.shutdown() {
        warn!("Control loop already gone: {}", e);
    }
    if control_thread.join().is_err() {
        warn!("Control loop panicked");
    }

    run.map_err(|e| anyhow::anyhow!("UI error: {}", e))?;
    info!("Callbot exited");
    Ok(())
}

#[cfg(feature = "audio-io")]
fn list_devices() -> Result<()> {
    let devices = callbot::audio::list_input_devices()?;
    if devices.is_empty() {
        println!("No input devices found");
    }
    for (index, name) in devices.iter().enumerate() {
        println!("{}: {}", index, name);
    }
    Ok(())
}

#[cfg(not(feature = "audio-io"))]
fn list_devices() -> Result<()> {
    println!("Built without the `audio-io` feature, no devices available");
    Ok(())
}
