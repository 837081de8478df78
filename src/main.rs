use anyhow::Context;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct CliArgs {
    playlist: Option<PathBuf>,
    null_audio: bool,
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1).collect())?;
    if let Err(err) = init_logging() {
        eprintln!("logging disabled: {err:#}");
    }

    tunedeck::app::run_with_startup(tunedeck::app::AppStartupOptions {
        playlist_path: args.playlist,
        null_audio: args.null_audio,
    })
}

/// Logs go to a file so they never land on the terminal UI.
fn init_logging() -> anyhow::Result<()> {
    tunedeck::config::ensure_config_dir()?;
    let path = tunedeck::config::log_path()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_env("TUNEDECK_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install log subscriber: {err}"))
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--playlist" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--playlist requires a file path");
                };
                if value.trim().is_empty() {
                    anyhow::bail!("--playlist cannot be empty");
                }
                out.playlist = Some(PathBuf::from(value.trim()));
            }
            "--null-audio" => out.null_audio = true,
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument {other}"),
        }
        index += 1;
    }
    Ok(out)
}

fn print_help() {
    println!("tunedeck");
    println!("  --playlist <path>   Playlist file (default: config dir playlist.json)");
    println!("  --null-audio        Run without opening an audio device");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parses_playlist_and_null_audio() {
        let parsed = parse_args(args(&["--null-audio", "--playlist", "mix.json"])).expect("parse");
        assert!(parsed.null_audio);
        assert_eq!(parsed.playlist, Some(PathBuf::from("mix.json")));
    }

    #[test]
    fn playlist_requires_value() {
        assert!(parse_args(args(&["--playlist"])).is_err());
    }

    #[test]
    fn rejects_unknown_flags() {
        let err = parse_args(args(&["--host"])).expect_err("unknown flag");
        assert!(err.to_string().contains("--host"));
    }
}
