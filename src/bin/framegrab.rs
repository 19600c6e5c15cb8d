use std::{
    io::{self, BufRead, IsTerminal},
    path::{Path, PathBuf},
    sync::Arc,
    thread,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use framegrab::{
    ControllerHandle, ExtractOptions, ExtractionController, ExtractionRequest, FfmpegLogLevel,
    InputMode, ProgressCallback, ProgressInfo, RequestDefaults, RunStatus, TerminalStatus,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  framegrab probe input.mp4 --json\n  framegrab extract input.mp4 --fps 10 --start 1 --end 3 --out frames --progress\n  framegrab extract input.mp4 --out frames --strict\n  framegrab completions zsh > _framegrab";

#[derive(Debug, Parser)]
#[command(
    name = "framegrab",
    version,
    about = "Export the frames of a video time window as numbered JPEG images",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Print a line for every decoded frame.
    #[arg(long)]
    verbose: bool,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print video metadata and the values an extraction would default to.
    #[command(
        about = "Print video metadata",
        visible_alias = "info",
        after_help = "Examples:\n  framegrab probe input.mp4\n  framegrab probe input.mp4 --json"
    )]
    Probe {
        /// Input video path.
        input: PathBuf,

        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Export the frames between two times as `<index>.jpg` files.
    #[command(
        about = "Export frames to a directory",
        after_help = "Type `q` and press Enter while a run is in progress to stop it.\n\nExamples:\n  framegrab extract input.mp4 --fps 10 --start 1 --end 3 --out frames\n  framegrab extract input.mp4 --start 0 --end 2.5 --out frames --progress"
    )]
    Extract {
        /// Input video path.
        input: PathBuf,
        /// Frames per second used to turn times into frame numbers. Defaults
        /// to the video's native rate.
        #[arg(long)]
        fps: Option<String>,
        /// Start time in seconds. Defaults to 0.
        #[arg(long)]
        start: Option<String>,
        /// End time in seconds. Defaults to the video's duration.
        #[arg(long)]
        end: Option<String>,
        /// Destination directory (created if missing).
        #[arg(long)]
        out: Option<PathBuf>,
        /// Reject fractional values instead of truncating them.
        #[arg(long)]
        strict: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Mirrors a run on the terminal.
struct TerminalProgress {
    bar: Option<ProgressBar>,
    verbose: bool,
}

impl TerminalProgress {
    fn new(show_bar: bool, verbose: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = if show_bar {
            let bar = ProgressBar::new(100);
            let style = ProgressStyle::with_template(
                "{spinner:.green} {bar:40.cyan/blue} {pos:>3}% {msg}",
            )?;
            bar.set_style(style.progress_chars("##-"));
            Some(bar)
        } else {
            None
        };
        Ok(Self { bar, verbose })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(bar) = &self.bar {
            bar.set_position(u64::from(info.percent));
            bar.set_message(format!("frame {}", info.current_frame));
        }
        if self.verbose {
            let line = format!(
                "decoded frame {} ({}%, {} written)",
                info.current_frame, info.percent, info.frames_written,
            );
            match &self.bar {
                Some(bar) => bar.println(line),
                None => eprintln!("{line}"),
            }
        }
    }

    fn on_finish(&self, status: &TerminalStatus) {
        if let Some(bar) = &self.bar {
            match status {
                TerminalStatus::Completed => bar.finish_with_message("done"),
                other => bar.abandon_with_message(other.to_string()),
            }
        }
    }
}

/// Fill in whichever of fps/start/end the user left out from the video itself.
fn resolve_fields(
    input: &Path,
    fps: Option<String>,
    start: Option<String>,
    end: Option<String>,
) -> Result<(String, String, String), Box<dyn std::error::Error>> {
    if let (Some(fps), Some(start), Some(end)) = (&fps, &start, &end) {
        return Ok((fps.clone(), start.clone(), end.clone()));
    }

    let metadata = framegrab::probe(input)?;
    let defaults = RequestDefaults::from_metadata(&metadata);
    Ok((
        fps.unwrap_or(defaults.frame_rate),
        start.unwrap_or(defaults.start_time),
        end.unwrap_or(defaults.end_time),
    ))
}

/// Cancel the run when the user types `q` on an interactive stdin.
fn spawn_stop_listener(handle: ControllerHandle) {
    if !io::stdin().is_terminal() {
        return;
    }
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if matches!(line.trim(), "q" | "quit" | "stop") {
                handle.cancel();
                break;
            }
        }
    });
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_level = cli
        .global
        .log_level
        .as_deref()
        .map(str::parse::<FfmpegLogLevel>)
        .transpose()?;
    if let Some(level) = log_level {
        framegrab::set_ffmpeg_log_level(level);
    }

    match cli.command {
        Commands::Probe { input, json } => {
            let metadata = framegrab::probe(&input)?;
            let defaults = RequestDefaults::from_metadata(&metadata);
            if json {
                let payload = json!({
                    "format": metadata.format,
                    "codec": metadata.codec,
                    "width": metadata.width,
                    "height": metadata.height,
                    "fps": metadata.frames_per_second,
                    "frame_count": metadata.frame_count,
                    "duration_seconds": metadata.duration_seconds(),
                    "defaults": {
                        "fps": defaults.frame_rate,
                        "start": defaults.start_time,
                        "end": defaults.end_time,
                    },
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Format: {}", metadata.format);
                println!(
                    "Video: {}x{} @ {:.2} fps [{}]",
                    metadata.width, metadata.height, metadata.frames_per_second, metadata.codec,
                );
                println!(
                    "Frames: {} ({:.3}s)",
                    metadata.frame_count,
                    metadata.duration_seconds()
                );
                println!(
                    "Defaults: --fps {} --start {} --end {}",
                    defaults.frame_rate, defaults.start_time, defaults.end_time,
                );
            }
        }
        Commands::Extract {
            input,
            fps,
            start,
            end,
            out,
            strict,
        } => {
            let (fps, start, end) = resolve_fields(&input, fps, start, end)?;
            let mode = if strict {
                InputMode::Strict
            } else {
                InputMode::Truncate
            };
            let request = ExtractionRequest::from_text_fields(
                input.as_path(),
                &fps,
                &start,
                &end,
                out.unwrap_or_default(),
                mode,
            )?;

            let window = request.frame_window();
            if window.is_empty() {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!(
                        "frame range {}..={} is empty; no frames will be written",
                        window.lower, window.upper
                    )
                    .yellow()
                );
            }

            let observer = TerminalProgress::new(cli.global.progress, cli.global.verbose)?;
            let mut options = ExtractOptions::new().with_progress(Arc::new(observer));
            if let Some(level) = log_level {
                options = options.with_ffmpeg_log_level(level);
            }

            let controller = ExtractionController::new();
            spawn_stop_listener(controller.handle());
            let report = controller.start_with_options(&request, &options)?;

            match report.status {
                RunStatus::Cancelled => eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!(
                        "Stopped after frame {}; {} frame(s) kept in {}",
                        report.frames_decoded,
                        report.frames_written,
                        request.destination_dir.display()
                    )
                    .yellow()
                ),
                _ => println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!(
                        "Extracted {} frame(s) to {}",
                        report.frames_written,
                        request.destination_dir.display()
                    )
                    .green()
                ),
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framegrab", &mut io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
