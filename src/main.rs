use anyhow::{anyhow, Result};
use clap::Parser;
use overlay_painter::draw::overlay::{PainterApp, APP_TITLE};
use overlay_painter::draw::window_query::platform_window_query;
use overlay_painter::logging;
use overlay_painter::settings::{PainterConfig, DEFAULT_CONFIG_FILE};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "overlay_painter", version, about = "Transparent drawing overlay.")]
struct Args {
    /// Config file to load at startup and write on exit
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(long)]
    debug: bool,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.debug, args.log_file.clone());

    let config_path = args.config_path();
    let config = PainterConfig::load(&config_path);
    tracing::info!(config = %config_path.display(), "starting overlay painter");

    let native_options = eframe::NativeOptions {
        viewport: PainterApp::viewport(&config),
        ..Default::default()
    };
    eframe::run_native(
        APP_TITLE,
        native_options,
        Box::new(move |_cc| {
            Box::new(PainterApp::new(&config, config_path, platform_window_query()))
        }),
    )
    .map_err(|err| anyhow!("overlay window failed: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_when_not_given() {
        let args = Args::try_parse_from(["overlay_painter"]).unwrap();
        assert_eq!(args.config_path(), PathBuf::from(DEFAULT_CONFIG_FILE));
        assert!(!args.debug);
        assert_eq!(args.log_file, None);
    }

    #[test]
    fn flags_and_config_path_parse() {
        let args = Args::try_parse_from([
            "overlay_painter",
            "stream.json",
            "--debug",
            "--log-file",
            "painter.log",
        ])
        .unwrap();
        assert_eq!(args.config_path(), PathBuf::from("stream.json"));
        assert!(args.debug);
        assert_eq!(args.log_file, Some(PathBuf::from("painter.log")));
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(Args::try_parse_from(["overlay_painter", "--bogus"]).is_err());
        assert!(Args::try_parse_from(["overlay_painter", "a.json", "b.json"]).is_err());
    }
}
