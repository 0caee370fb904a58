use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};

use clap::Parser;

use moodlens_core::analytics::infrastructure::remote_emotion_logger::RemoteEmotionLogger;
use moodlens_core::camera::domain::camera_source::CameraSource;
use moodlens_core::camera::infrastructure::image_sequence_camera::ImageSequenceCamera;
use moodlens_core::detection::domain::face_analyzer::FaceAnalyzer;
use moodlens_core::detection::infrastructure::model_resolver::ModelResolver;
use moodlens_core::detection::infrastructure::replay_analyzer::ReplayAnalyzer;
use moodlens_core::export::infrastructure::png_capture_writer::PngCaptureWriter;
use moodlens_core::pipeline::pipeline_controller::PipelineController;
use moodlens_core::pipeline::pipeline_event::PipelineEvent;
use moodlens_core::pipeline::pipeline_state::Consumer;
use moodlens_core::shared::config::AppConfig;

/// Live emotion, age and gender analysis from a camera source.
#[derive(Parser)]
#[command(name = "moodlens")]
struct Cli {
    /// Folder with one sub-directory of images per camera.
    #[arg(long)]
    camera_root: Option<PathBuf>,

    /// Detection trace to replay (JSON lines, one frame per line).
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Model directory or http(s) base URL.
    #[arg(long)]
    models: Option<String>,

    /// Camera id to use instead of the default selection.
    #[arg(long)]
    device: Option<String>,

    /// Cameras whose label contains this text are preferred.
    #[arg(long)]
    preferred_label: Option<String>,

    /// Detection interval in milliseconds.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// How long to run live detection, in seconds.
    #[arg(long, default_value = "5")]
    duration: u64,

    /// Save a capture of the last frame with the overlay before stopping.
    #[arg(long)]
    capture: bool,

    /// Directory for captures.
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Base URL of a server accepting POST /log-emotion.
    #[arg(long)]
    log_endpoint: Option<String>,

    /// Settings file (defaults to the user config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the available cameras and exit.
    #[arg(long)]
    list_devices: bool,

    /// Write the effective settings back to the settings file and exit.
    #[arg(long)]
    save_config: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    if cli.save_config {
        return save_config(&cli, &config);
    }
    if cli.list_devices {
        return list_devices(&config);
    }

    let analyzer = build_analyzer(&cli)?;
    let camera: Box<dyn CameraSource> = Box::new(ImageSequenceCamera::new(&config.camera_root));
    let (mut controller, events) = PipelineController::new(
        &config,
        camera,
        analyzer,
        Box::new(PngCaptureWriter::new()),
    );
    if let Some(endpoint) = &config.log_endpoint {
        controller.add_subscriber(Box::new(RemoteEmotionLogger::new(endpoint)));
    }

    let resolver = ModelResolver::new(&config.model_base)?;
    eprintln!("Loading AI Models...");
    controller.load_models(&resolver)?;
    if let Some(id) = &cli.device {
        controller.select_device(id)?;
    }

    let state = controller.state();
    if let Some(error) = state.last_error.filter(|e| e.kind.is_blocking()) {
        return Err(error.message.into());
    }
    eprintln!("{}", state.status_message);

    let deadline = Instant::now() + Duration::from_secs(cli.duration);
    let mut frames = 0usize;
    while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
        match events.recv_timeout(remaining) {
            Ok(PipelineEvent::FrameApplied { faces }) => {
                frames += 1;
                let snapshot = controller.live_snapshot();
                if faces > 0 {
                    eprint!(
                        "\r{} face(s): {} ({:.0}%)        ",
                        faces,
                        snapshot.emotion,
                        snapshot.confidence * 100.0
                    );
                }
            }
            Ok(PipelineEvent::Error(error)) => log::warn!("{error}"),
            Ok(event) => log::debug!("{event:?}"),
            Err(_) => break,
        }
    }
    eprintln!();

    if cli.capture {
        match controller.capture() {
            Ok(path) => println!("Capture saved to {}", path.display()),
            Err(e) => eprintln!("Capture failed: {e}"),
        }
    }

    controller.switch_consumer(Consumer::Analytics)?;
    controller.shutdown();
    log::info!("Processed {frames} detection frames");

    print_analytics(&controller);
    print_log(&controller);
    Ok(())
}

fn build_config(cli: &Cli) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) if cli.save_config && !path.exists() => AppConfig::default(),
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(),
    };
    if let Some(root) = &cli.camera_root {
        config.camera_root = root.clone();
    }
    if let Some(models) = &cli.models {
        config.model_base = models.clone();
    }
    if let Some(label) = &cli.preferred_label {
        config.preferred_camera_label = label.clone();
    }
    if let Some(ms) = cli.interval_ms {
        config.detection_interval_ms = ms;
    }
    if let Some(dir) = &cli.export_dir {
        config.export_dir = dir.clone();
    }
    if let Some(endpoint) = &cli.log_endpoint {
        config.log_endpoint = Some(endpoint.clone());
    }
    config.validate()?;
    Ok(config)
}

fn build_analyzer(cli: &Cli) -> Result<Box<dyn FaceAnalyzer>, Box<dyn std::error::Error>> {
    match &cli.trace {
        Some(path) => {
            let analyzer = ReplayAnalyzer::open(path)?;
            log::info!("Replaying {} detection frames from {}", analyzer.len(), path.display());
            Ok(Box::new(analyzer))
        }
        None => {
            log::warn!("No detection trace given, no faces will be reported");
            Ok(Box::new(ReplayAnalyzer::new(Vec::new())))
        }
    }
}

fn save_config(cli: &Cli, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let path = cli
        .config
        .clone()
        .or_else(AppConfig::config_path)
        .ok_or("no config directory available")?;
    config.save_to(&path)?;
    println!("Settings saved to {}", path.display());
    Ok(())
}

fn list_devices(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut camera = ImageSequenceCamera::new(&config.camera_root);
    camera.request_permission()?;
    let devices = camera.enumerate_devices()?;
    if devices.is_empty() {
        println!("No cameras found in {}", config.camera_root.display());
    }
    for device in devices.iter().filter(|d| d.is_camera()) {
        println!("{}\t{}", device.id, device.display_label());
    }
    Ok(())
}

fn print_analytics(controller: &PipelineController) {
    let session = controller.session();
    println!("Session analytics");
    println!("  Average age: {}", session.average_age_label());

    println!("  Emotions:");
    let shares = session.emotion_shares();
    if shares.is_empty() {
        println!("    (none)");
    }
    for (label, pct) in shares {
        println!("    {label:<10} {pct:5.1}%");
    }

    println!("  Gender:");
    if session.gender_counts().is_empty() {
        println!("    (none)");
    }
    for (label, count) in session.gender_counts() {
        println!("    {label:<10} {count}");
    }
}

fn print_log(controller: &PipelineController) {
    let entries = controller.log_entries();
    println!("Detection log ({} entries, newest first)", entries.len());
    for entry in entries {
        let age = entry
            .age
            .map(|a| a.to_string())
            .unwrap_or_else(|| "N/A".into());
        println!(
            "  {}  {:<10} {:>3}%  age {:<3}  {}",
            entry.time_label(),
            entry.emotion,
            entry.confidence_percent(),
            age,
            entry.gender.as_deref().unwrap_or("N/A")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.json");
        std::fs::write(&path, r#"{"detection_interval_ms": 700, "preferred_camera_label": "usb"}"#).unwrap();
        let cli = Cli::parse_from([
            "moodlens",
            "--config",
            path.to_str().unwrap(),
            "--interval-ms",
            "120",
            "--log-endpoint",
            "http://localhost:5000",
        ]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.detection_interval_ms, 120);
        assert_eq!(config.preferred_camera_label, "usb");
        assert_eq!(config.log_endpoint.as_deref(), Some("http://localhost:5000"));
    }

    #[test]
    fn test_save_config_writes_effective_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("moodlens").join("settings.json");
        let cli = Cli::parse_from([
            "moodlens",
            "--config",
            path.to_str().unwrap(),
            "--interval-ms",
            "250",
            "--save-config",
        ]);
        let config = build_config(&cli).unwrap();
        save_config(&cli, &config).unwrap();

        let saved = AppConfig::load_from(&path).unwrap();
        assert_eq!(saved.detection_interval_ms, 250);
        assert_eq!(saved, config);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let cli = Cli::parse_from(["moodlens", "--interval-ms", "0"]);
        assert!(build_config(&cli).is_err());
    }
}
