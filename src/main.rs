use album_uploader::component::BatchUploader;
use album_uploader::component::batch_uploader::describe_settings;
use album_uploader::component::uploader::{OutboxTransport, ProgressRegistry, UploadProgressBars};
use album_uploader::config::{Config, DEFAULT_SETTINGS_FILE};
use album_uploader::tools::{FfmpegTranscoder, check_external_tools};
use album_uploader::{PipelineContext, init, signal::setup_shutdown_signal};
use anyhow::Result;
use console::style;
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> Result<ExitCode> {
    init::init();
    let shutdown_signal = setup_shutdown_signal()?;

    let settings_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE), PathBuf::from);
    let config = Config::load(&settings_path)?;
    config.validate()?;
    info!("{}", describe_settings(&config.settings));

    let missing = check_external_tools();
    if !missing.is_empty() {
        eprintln!(
            "{} {} not found, video files will fail",
            style("Warning:").yellow().bold(),
            missing.join(", ")
        );
    }

    let progress = ProgressRegistry::with_observer(Arc::new(UploadProgressBars::new()));
    let context = PipelineContext::new(Arc::clone(&shutdown_signal), progress);
    let transcoder = Arc::new(FfmpegTranscoder::new(Arc::clone(&shutdown_signal)));
    let transport = Arc::new(OutboxTransport::open(
        &config.settings.outbox_dir,
        Arc::clone(&shutdown_signal),
    )?);

    let uploader = BatchUploader::new(config, transcoder, transport, context)?;
    let summary = uploader.run()?;
    summary.print();

    if summary.has_failures() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
