use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use firetv_voice::console::StdinPrompt;
use firetv_voice::{App, AppOptions, ConfigStore, SystemRunner};

#[derive(Parser)]
#[command(name = "firetv-voice")]
#[command(about = "Control a Fire TV Stick with voice commands over adb")]
struct Cli {
    /// Config file (default: ./firetv_config.json, then the user config dir)
    #[arg(short, long)]
    config: Option<String>,

    /// Fire TV address to use and save, skipping the setup questions
    #[arg(short, long)]
    address: Option<String>,

    /// Debug bridge executable
    #[arg(long, default_value = firetv_voice::bridge::DEFAULT_BRIDGE_PROGRAM)]
    adb: String,

    /// Speech-to-text executable
    #[arg(long, default_value = firetv_voice::speech::DEFAULT_SPEECH_PROGRAM)]
    stt: String,

    /// Never enter continuous listening mode
    #[arg(long)]
    no_continuous: bool,

    /// More diagnostics on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(log_level(cli.verbose).into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    ctrlc::set_handler(|| {
        println!("\nProgram terminated by user.");
        std::process::exit(130);
    })?;

    let config_path = config_path(cli.config.as_deref());
    tracing::info!("Using config file {:?}", config_path);

    let options = AppOptions {
        bridge_program: cli.adb,
        speech_program: cli.stt,
        address: cli.address,
        disable_continuous: cli.no_continuous,
        ..Default::default()
    };

    let mut app = App::new(
        ConfigStore::new(config_path),
        Arc::new(SystemRunner),
        Box::new(StdinPrompt),
        options,
    )?;
    app.run()
}

/// Default log level for the number of `-v` flags
fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    }
}

fn config_path(arg: Option<&str>) -> PathBuf {
    match arg {
        Some(path) => PathBuf::from(shellexpand::tilde(path).into_owned()),
        None => ConfigStore::default_path(),
    }
}
