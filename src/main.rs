use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;

use codimd_share::config::{self, Config};
use codimd_share::desktop::{ConsoleNotifier, SystemClipboard};
use codimd_share::mime;
use codimd_share::presentation::{PresentationFlags, Presenter};
use codimd_share::security::InputValidator;
use codimd_share::uploader::{
    FileSource, ImageSource, StdinSource, UploadOutcome, UploadPipeline, UploadRequest,
};

/// Spool files older than this are swept on startup
const STALE_SPOOL_AGE: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Parser, Debug)]
#[command(name = "codimd-share", version, about = "Share images through a CodiMD server")]
struct Cli {
    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload an image and print its link
    Upload {
        /// Image to upload, `-` reads from stdin
        file: PathBuf,

        /// Override the configured base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Mime type of the image, inferred from the extension by default
        #[arg(long)]
        mime: Option<String>,

        /// Do not copy the link to the clipboard
        #[arg(long)]
        no_clipboard: bool,

        /// Do not show a notification
        #[arg(long)]
        no_notification: bool,
    },
    /// Inspect or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the current settings
    Show,
    /// Set the CodiMD base URL (`https://` is added when missing)
    SetBaseUrl { url: String },
    /// Toggle copying the link to the clipboard
    SetClipboard {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Toggle the upload notification
    SetNotification {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Restore default settings
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config::get_config_path()?,
    };
    let settings = match config::load_config_from(&config_path) {
        Ok(settings) => settings,
        Err(e) if e.is_configuration_problem() => {
            eprintln!(
                "Ignoring invalid settings in {}: {}. Using defaults.",
                config_path.display(),
                e
            );
            Config::default()
        }
        Err(e) => {
            return Err(anyhow::Error::new(e).context(format!("loading {}", config_path.display())));
        }
    };

    // RUST_LOG still wins over the configured level
    env_logger::Builder::new()
        .filter_level(settings.log_level_filter())
        .parse_default_env()
        .init();

    log::info!("Starting CodiMD Share");

    match cli.command {
        Command::Upload {
            file,
            base_url,
            mime,
            no_clipboard,
            no_notification,
        } => {
            let mut flags = PresentationFlags::from(&settings);
            flags.copy_to_clipboard &= !no_clipboard;
            flags.show_notification &= !no_notification;

            let base_url = match base_url {
                Some(url) => Some(InputValidator::normalize_base_url(&url)),
                None => settings.base_url.clone(),
            };

            upload(&file, mime, base_url, flags).await
        }
        Command::Config { action } => run_config_action(&config_path, settings, action),
    }
}

async fn upload(
    file: &Path,
    mime_type: Option<String>,
    base_url: Option<String>,
    flags: PresentationFlags,
) -> anyhow::Result<()> {
    let from_stdin = file == Path::new("-");

    let mime_type = match mime_type {
        Some(mime_type) => mime_type,
        None if from_stdin => bail!("--mime is required when reading from stdin"),
        None => mime::mime_for_path(file).to_string(),
    };
    InputValidator::validate_share_type(&mime_type)?;

    let spool_dir = config::get_temp_directory()?;
    match config::cleanup_stale_spool_files(&spool_dir, STALE_SPOOL_AGE) {
        Ok(0) => {}
        Ok(removed) => log::info!("Removed {} stale spool files", removed),
        Err(e) => log::warn!("Failed to sweep spool directory: {}", e),
    }

    let request = if from_stdin {
        UploadRequest::new(StdinSource, mime_type, base_url)
    } else {
        let source = FileSource::new(file);
        log::debug!("Sharing {}", source.describe());
        UploadRequest::new(source, mime_type, base_url)
    };

    let pipeline = UploadPipeline::new(spool_dir);
    let outcome = pipeline
        .spawn(request)
        .await
        .context("upload task ended without an outcome")?;

    let mut presenter = Presenter::new(SystemClipboard::new(), ConsoleNotifier, flags);
    let report = presenter.present(&outcome);

    match &outcome {
        UploadOutcome::Success { link, .. } => {
            println!("{}", link);
            if report.copied {
                eprintln!("{}", report.message);
            }
            Ok(())
        }
        UploadOutcome::Failure {
            underlying_error, ..
        } => match underlying_error {
            Some(detail) => bail!("{} ({})", report.message, detail),
            None => bail!("{}", report.message),
        },
    }
}

fn run_config_action(
    config_path: &Path,
    mut settings: Config,
    action: ConfigAction,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            println!("# {}", config_path.display());
            return Ok(());
        }
        ConfigAction::SetBaseUrl { url } => settings.set_base_url(&url)?,
        ConfigAction::SetClipboard { enabled } => settings.copy_to_clipboard = enabled,
        ConfigAction::SetNotification { enabled } => settings.show_notification = enabled,
        ConfigAction::Reset => {
            config::reset_config_at(config_path)?;
            return Ok(());
        }
    }

    config::save_config_to(config_path, &settings)?;
    Ok(())
}
