mod console;

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use glob::glob;
use serde::Serialize;
use showtape_core::{
    CancelToken, DatagramSource, Immediate, PcapFileSource, PlaybackError, PlaybackStatus,
    Player, RecordError, Recorder, RecordingOutcome, ShowConfig, SourceError, StartGate,
    SystemClock, TapeDir, TapeReader, TapeSummary, UdpSink, UdpSource,
};

use console::{Console, Cues, EnterGate, cancel_on_interrupt};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("SHOWTAPE_BUILD_COMMIT"),
    " ",
    env!("SHOWTAPE_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "showtape")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Record an Art-Net DMX universe and play it back on its original timeline.",
    long_about = None,
    after_help = concat!(
        "Examples:\n",
        "  showtape record --universe 0 --duration 225\n",
        "  showtape play bins/DMX-2024-05-01-20-00-00.bin --target 192.168.0.101:6454\n",
        "  showtape play --tick-command 'aplay click.wav'\n",
        "  showtape inspect 'bins/*.bin' --stdout --pretty"
    )
)]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    /// JSON configuration file (command-line flags take precedence)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Wait for the first change on a universe and record it to a new tape.
    Record {
        /// Local address to receive Art-Net on
        #[arg(long)]
        listen: Option<SocketAddr>,

        /// Universe to record
        #[arg(long)]
        universe: Option<u16>,

        /// Seconds to record after the first change
        #[arg(long)]
        duration: Option<f64>,

        /// Directory new tapes are written to
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Read datagrams from a .pcap/.pcapng capture instead of the network
        #[arg(long, value_name = "FILE")]
        from_pcap: Option<PathBuf>,
    },
    /// Play a tape back to an Art-Net node.
    Play {
        /// Tape file (or a glob matching exactly one tape); defaults to the
        /// newest tape in the tape directory
        input: Option<PathBuf>,

        /// Destination address for Art-Net packets
        #[arg(long)]
        target: Option<SocketAddr>,

        /// Universe to send on
        #[arg(long)]
        universe: Option<u16>,

        /// Countdown seconds between ENTER and the first timed frame
        #[arg(long)]
        countdown: Option<u32>,

        /// Start right after the pre-roll instead of waiting for ENTER
        #[arg(long)]
        no_wait: bool,

        /// Shell command started with timed playback and stopped with it
        #[arg(long, value_name = "CMD")]
        cue_command: Option<String>,

        /// Shell command fired on every countdown tick (e.g. a metronome click)
        #[arg(long, value_name = "CMD")]
        tick_command: Option<String>,

        /// Shell command fired once when playback stops
        #[arg(long, value_name = "CMD")]
        stop_command: Option<String>,
    },
    /// Summarise a tape as JSON.
    Inspect {
        /// Tape file (or a glob matching exactly one tape)
        input: PathBuf,

        /// Output path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .parse_default_env()
        .init();
    let quiet = cli.verbose.log_level_filter() < log::LevelFilter::Info;

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Record {
            listen,
            universe,
            duration,
            dir,
            from_pcap,
        } => {
            let mut config = config;
            override_with(&mut config.listen, listen);
            override_with(&mut config.universe, universe);
            override_with(&mut config.duration_s, duration);
            override_with(&mut config.tape_dir, dir);
            cmd_record(&config, from_pcap.as_deref(), quiet)
        }
        Commands::Play {
            input,
            target,
            universe,
            countdown,
            no_wait,
            cue_command,
            tick_command,
            stop_command,
        } => {
            let mut config = config;
            override_with(&mut config.target, target);
            override_with(&mut config.universe, universe);
            override_with(&mut config.countdown_s, countdown);
            let cues = Cues {
                background: cue_command,
                tick: tick_command,
                stop: stop_command,
            };
            cmd_play(&config, input.as_deref(), no_wait, cues, quiet)
        }
        Commands::Inspect {
            input,
            report,
            stdout,
            pretty,
        } => cmd_inspect(&input, report, stdout, pretty, quiet),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn load_config(path: Option<&Path>) -> Result<ShowConfig, CliError> {
    let Some(path) = path else {
        return Ok(ShowConfig::default());
    };
    ShowConfig::load(path).map_err(|err| {
        CliError::new(
            err.to_string(),
            Some(
                "known keys: target, listen, universe, duration_s, countdown_s, tape_dir"
                    .to_string(),
            ),
        )
    })
}

fn cmd_record(config: &ShowConfig, from_pcap: Option<&Path>, quiet: bool) -> Result<(), CliError> {
    let recording = config.recording().map_err(|err| {
        CliError::new(
            err.to_string(),
            Some("--duration takes a non-negative number of seconds".to_string()),
        )
    })?;
    let dir = TapeDir::new(&config.tape_dir);
    let cancel = CancelToken::new();

    let mut source: Box<dyn DatagramSource> = match from_pcap {
        Some(capture) => {
            validate_input_file(capture, &["pcap", "pcapng"])?;
            Box::new(PcapFileSource::open(capture).map_err(|err| {
                CliError::new(
                    format!("cannot read capture {}: {err}", capture.display()),
                    Some("expected a .pcap or .pcapng file".to_string()),
                )
            })?)
        }
        None => {
            let source = UdpSource::bind(config.listen).map_err(|err| match err {
                SourceError::Bind { .. } => CliError::new(
                    err.to_string(),
                    Some("another Art-Net program may hold the port; try --listen".to_string()),
                ),
                other => CliError::new(other.to_string(), None),
            })?;
            cancel_on_interrupt(cancel.clone()).context("failed to install Ctrl+C handler")?;
            log::info!(
                "listening on {} for universe {}, Ctrl+C to stop",
                config.listen,
                recording.universe
            );
            Box::new(source)
        }
    };

    let mut recorder = Recorder::new(recording, cancel);
    let outcome = recorder
        .record(source.as_mut(), &dir, &mut Console::default())
        .map_err(|err| match err {
            RecordError::Tape(err) => CliError::new(
                err.to_string(),
                Some(format!(
                    "check that {} is writable",
                    config.tape_dir.display()
                )),
            ),
            RecordError::Source(err) => CliError::new(err.to_string(), None),
        })?;

    if !quiet {
        match outcome {
            RecordingOutcome::NotStarted { reason } => {
                eprintln!("no change detected ({reason:?}), nothing recorded");
            }
            RecordingOutcome::Saved {
                path,
                frames,
                elapsed,
                reason,
            } => {
                eprintln!(
                    "OK: saved {frames} frames ({:.2}s, {reason:?}) -> {}",
                    elapsed.as_secs_f64(),
                    path.display()
                );
            }
        }
    }
    Ok(())
}

fn cmd_play(
    config: &ShowConfig,
    input: Option<&Path>,
    no_wait: bool,
    cues: Cues,
    quiet: bool,
) -> Result<(), CliError> {
    let resolved = match input {
        Some(input) => resolve_input_path(input)?,
        None => newest_tape(&config.tape_dir)?,
    };
    validate_input_file(&resolved, &["bin"])?;
    let tape = TapeReader::open(&resolved).context("cannot open tape")?;

    let sink = UdpSink::connect(config.target).map_err(|err| {
        CliError::new(
            format!("cannot open UDP socket for {}: {err}", config.target),
            Some("check --target".to_string()),
        )
    })?;
    let cancel = CancelToken::new();
    cancel_on_interrupt(cancel.clone()).context("failed to install Ctrl+C handler")?;

    let mut gate: Box<dyn StartGate> = if no_wait {
        Box::new(Immediate)
    } else {
        Box::new(EnterGate)
    };
    let mut console = Console::with_cues(cues);
    let mut player = Player::new(config.playback(), sink, SystemClock::new(), cancel);
    log::info!(
        "playing {} to {} on universe {}",
        resolved.display(),
        config.target,
        config.universe
    );

    let outcome = player
        .play(tape, gate.as_mut(), &mut console)
        .map_err(|err| match err {
            PlaybackError::Send(source) => CliError::new(
                format!("cannot send to {}: {source}", config.target),
                Some("check the network route to the Art-Net node".to_string()),
            ),
            other => CliError::new(other.to_string(), None),
        })?;

    if !quiet {
        match outcome.status {
            PlaybackStatus::Completed => {
                eprintln!("OK: played {} frames", outcome.frames_sent)
            }
            PlaybackStatus::StoppedEarly => {
                eprintln!("stopped early after {} frames", outcome.frames_sent)
            }
            PlaybackStatus::Aborted => eprintln!("aborted, nothing played"),
        }
    }
    Ok(())
}

fn newest_tape(dir: &Path) -> Result<PathBuf, CliError> {
    let hint = Some("pass a tape path, or record one first".to_string());
    let tapes = TapeDir::new(dir).list().map_err(|err| {
        CliError::new(
            format!("cannot list tapes in {}: {err}", dir.display()),
            hint.clone(),
        )
    })?;
    match tapes.last() {
        Some(tape) => {
            log::info!("no input given, using newest tape {}", tape.display());
            Ok(tape.clone())
        }
        None => Err(CliError::new(format!("no tapes in {}", dir.display()), hint)),
    }
}

#[derive(Serialize)]
struct InspectReport<'a> {
    tool: ToolInfo,
    input: InputInfo,
    #[serde(flatten)]
    summary: &'a TapeSummary,
}

#[derive(Serialize)]
struct ToolInfo {
    name: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct InputInfo {
    path: String,
    bytes: u64,
}

fn cmd_inspect(
    input: &Path,
    report: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let resolved = resolve_input_path(input)?;
    validate_input_file(&resolved, &["bin"])?;
    let input_abs = fs::canonicalize(&resolved)
        .with_context(|| format!("Failed to resolve input path: {}", resolved.display()))?;
    let meta = fs::metadata(&resolved)
        .with_context(|| format!("Failed to read input file: {}", resolved.display()))?;

    let summary = showtape_core::summarize_tape(&resolved).context("tape inspection failed")?;
    let rep = InspectReport {
        tool: ToolInfo {
            name: "showtape",
            version: env!("CARGO_PKG_VERSION"),
        },
        input: InputInfo {
            path: resolved.display().to_string(),
            bytes: meta.len(),
        },
        summary: &summary,
    };
    let json = if pretty {
        serde_json::to_string_pretty(&rep)
    } else {
        serde_json::to_string(&rep)
    }
    .context("JSON serialization failed")?;

    if stdout {
        println!("{}", json);
        return Ok(());
    }

    let report = report.ok_or_else(|| {
        CliError::new(
            "missing output path",
            Some("use -o/--report or --stdout".to_string()),
        )
    })?;
    if let Some(parent) = report.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    if fs::canonicalize(&report).is_ok_and(|existing| existing == input_abs) {
        return Err(CliError::new(
            format!("report path must differ from input: {}", report.display()),
            Some("choose a different output path".to_string()),
        ));
    }

    fs::write(&report, json)
        .with_context(|| format!("Failed to write report: {}", report.display()))?;
    if !quiet {
        eprintln!("OK: report written -> {}", report.display());
    }
    Ok(())
}

fn validate_input_file(input: &Path, extensions: &[&str]) -> Result<(), CliError> {
    let expected = extensions
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(" or ");
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some(format!("expected a {expected} file")),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some(format!("expected a {expected} file")),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if !extensions.contains(&ext.as_str()) {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some(format!("expected a {expected} file")),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        count => {
            let mut message = format!("multiple files match pattern '{pattern}' ({count} matches)");
            let listed = matches
                .iter()
                .take(3)
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            message.push_str("; matches: ");
            message.push_str(&listed);
            if count > 3 {
                message.push_str(", ...");
            }
            Err(CliError::new(
                message,
                Some("pass a single tape, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
