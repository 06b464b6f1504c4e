//! VIGIL CLI
//!
//! Usage:
//!   vigil                                   # Built-in IGN-Λ17 file
//!   vigil --script corridor.json            # Authored script
//!   vigil --seed 42 --speed 4               # Fixed outcome hash, faster pacing
//!   vigil --instant --no-audio --json < answers.txt

use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use vigil::core::{
    clock_seed, spawn_stdin_reader, PhaseScript, SessionRunner, SilentAudio, SubPhaseController,
    TerminalBell, TerminalPresenter,
};
use vigil::error::VigilError;
use vigil::logging::init_logging;
use vigil::types::{Pacing, SessionState};
use vigil::{FILE_DESIGNATION, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "vigil",
    version = VERSION,
    about = "VIGIL secure terminal - archived ignition file IGN-Λ17",
    long_about = "VIGIL replays an archived observation file one phase at a time.\n\n\
                  Content is revealed line by line. When options appear, type the\n\
                  option number (or its id) and press Enter.\n\n\
                  The session ends in a locked terminal. There is no restart."
)]
struct Args {
    /// Authored script (JSON) instead of the built-in file
    #[arg(long)]
    script: Option<PathBuf>,

    /// Seed for the outcome hash (defaults to the clock)
    #[arg(long)]
    seed: Option<u64>,

    /// Pacing multiplier (2.0 = twice as fast)
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Collapse every delay to zero
    #[arg(long)]
    instant: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Disable the terminal bell
    #[arg(long)]
    no_audio: bool,

    /// Print the final session state as JSON after lock
    #[arg(long)]
    json: bool,

    /// Print a status line on every phase entry
    #[arg(long)]
    status: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON on stderr
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.log_json);

    if let Err(e) = run(args).await {
        error!(error = %e, "session ended abnormally");
        eprintln!("vigil: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(args: Args) -> Result<(), VigilError> {
    let script = match &args.script {
        Some(path) => PhaseScript::from_json_file(path)?,
        None => PhaseScript::builtin(),
    };
    let pacing = if args.instant {
        Pacing::instant()
    } else {
        Pacing::with_speed(args.speed)
    };
    let seed = args.seed.unwrap_or_else(clock_seed);
    info!(seed, phases = script.len(), speed = pacing.speed, "loading session");

    let controller = SubPhaseController::with_seed(script, pacing, seed);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let (tx, rx) = mpsc::channel(16);
    spawn_stdin_reader(tx);

    let color = !args.no_color && std::io::stdout().is_terminal();
    let presenter = TerminalPresenter::new(std::io::stdout(), color).with_status_line(args.status);
    print_header(color);

    let state = if args.no_audio {
        SessionRunner::new(controller, presenter, SilentAudio, cancel).run(rx).await?
    } else {
        SessionRunner::new(controller, presenter, TerminalBell::stdout(), cancel).run(rx).await?
    };

    if args.json {
        print_transcript(&state)?;
    }
    Ok(())
}

fn print_header(color: bool) {
    let title = format!("VIGIL v{} | {} | THE CORRIDOR OF CHOICE", VERSION, FILE_DESIGNATION);
    if color {
        println!("\x1b[1m{}\x1b[0m", title);
        println!("\x1b[90m{}\x1b[0m", "=".repeat(title.chars().count()));
    } else {
        println!("{}", title);
        println!("{}", "=".repeat(title.chars().count()));
    }
}

fn print_transcript(state: &SessionState) -> Result<(), VigilError> {
    println!("{}", serde_json::to_string_pretty(state)?);
    Ok(())
}
