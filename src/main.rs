//! bmad-terminal - drive a session terminal controller from the command line
//!
//! # Commands
//!
//! ```text
//! bmad-terminal replay events.jsonl            # feed recorded server events
//! bmad-terminal replay --disconnected -        # read events from stdin, offline
//! bmad-terminal dispatch --session s-1 story 4-16 dev-story
//! bmad-terminal dispatch --session s-1 epic 6 epic-tech-context
//! ```
//!
//! Outbound client messages are written to stdout, one JSON object per line.
//! The final session view is drawn on stderr.

use std::env;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{bail, Context};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use bmad_terminal::actions::{ActionDispatcher, LogNotifier};
use bmad_terminal::config::Config;
use bmad_terminal::core::{
    ControllerOptions, FitAddon, SessionId, SessionProps, TerminalSessionController,
    VtEmulatorFactory,
};
use bmad_terminal::transport::{LocalTransport, Transport};
use bmad_terminal::ui::{Placement, Renderer};

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_SESSION: &str = "local";

#[derive(Debug, PartialEq)]
struct Cli {
    config: Option<PathBuf>,
    command: Command,
}

#[derive(Debug, PartialEq)]
enum Command {
    Help,
    Version,
    Replay {
        session: String,
        cols: u16,
        rows: u16,
        disconnected: bool,
        /// `None` reads stdin
        input: Option<PathBuf>,
    },
    Dispatch {
        session: String,
        target: DispatchTarget,
    },
}

#[derive(Debug, PartialEq)]
enum DispatchTarget {
    Story { id: String, workflow: String },
    Epic { number: String, workflow: String },
}

fn print_help() {
    eprintln!("bmad-terminal {} - session terminal controller", VERSION);
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  bmad-terminal [OPTIONS] replay [REPLAY OPTIONS] <FILE|->");
    eprintln!("  bmad-terminal [OPTIONS] dispatch --session <ID> story <STORY-ID> <WORKFLOW>");
    eprintln!("  bmad-terminal [OPTIONS] dispatch --session <ID> epic <N> <WORKFLOW>");
    eprintln!();
    eprintln!("Replay options:");
    eprintln!("  --session <ID>        Session to mount (default: {})", DEFAULT_SESSION);
    eprintln!("  --cols <N>            Grid columns (default: 80)");
    eprintln!("  --rows <N>            Grid rows (default: 24)");
    eprintln!("  --disconnected        Start with the transport down");
    eprintln!();
    eprintln!("Story workflows:  story-context, dev-story, code-review");
    eprintln!("Epic workflows:   epic-tech-context");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <PATH>       Config file (default: ~/.bmad-terminal/config.toml)");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
}

fn parse_args(args: &[String]) -> Result<Cli, String> {
    let mut config = None;
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                return Ok(Cli {
                    config,
                    command: Command::Help,
                })
            }
            "-v" | "--version" => {
                return Ok(Cli {
                    config,
                    command: Command::Version,
                })
            }
            "--config" => {
                i += 1;
                let path = args.get(i).ok_or("Missing config path")?;
                config = Some(PathBuf::from(path));
            }
            "replay" => {
                let command = parse_replay(&args[i + 1..])?;
                return Ok(Cli { config, command });
            }
            "dispatch" => {
                let command = parse_dispatch(&args[i + 1..])?;
                return Ok(Cli { config, command });
            }
            arg => return Err(format!("Unknown argument: {}. Use -h for help.", arg)),
        }
        i += 1;
    }

    Err("Missing command. Use -h for help.".to_string())
}

fn parse_replay(args: &[String]) -> Result<Command, String> {
    let mut session = DEFAULT_SESSION.to_string();
    let mut cols = 80;
    let mut rows = 24;
    let mut disconnected = false;
    let mut input = None;
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--session" => {
                i += 1;
                session = args.get(i).ok_or("Missing session id")?.clone();
            }
            "--cols" => {
                i += 1;
                cols = parse_size(args.get(i), "--cols")?;
            }
            "--rows" => {
                i += 1;
                rows = parse_size(args.get(i), "--rows")?;
            }
            "--disconnected" => disconnected = true,
            "-" => input = None,
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown replay option: {}", arg));
            }
            path => input = Some(PathBuf::from(path)),
        }
        i += 1;
    }

    Ok(Command::Replay {
        session,
        cols,
        rows,
        disconnected,
        input,
    })
}

fn parse_size(value: Option<&String>, flag: &str) -> Result<u16, String> {
    let value = value.ok_or_else(|| format!("Missing value for {}", flag))?;
    match value.parse::<u16>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("Invalid value for {}: {}", flag, value)),
    }
}

fn parse_dispatch(args: &[String]) -> Result<Command, String> {
    let mut session = None;
    let mut rest = Vec::new();
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--session" => {
                i += 1;
                session = Some(args.get(i).ok_or("Missing session id")?.clone());
            }
            arg => rest.push(arg.to_string()),
        }
        i += 1;
    }

    let session = session.ok_or("dispatch needs --session <ID>")?;
    let target = match rest.as_slice() {
        [kind, id, workflow] if kind == "story" => DispatchTarget::Story {
            id: id.clone(),
            workflow: workflow.clone(),
        },
        [kind, number, workflow] if kind == "epic" => DispatchTarget::Epic {
            number: number.clone(),
            workflow: workflow.clone(),
        },
        _ => return Err("Expected: story <STORY-ID> <WORKFLOW> or epic <N> <WORKFLOW>".to_string()),
    };
    Ok(Command::Dispatch { session, target })
}

/// Logs go to a file; stdout carries messages and stderr the view.
/// `RUST_LOG` overrides the configured level.
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let log_file = config.log_path().and_then(|path| {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .ok()
    });

    let builder = FmtSubscriber::builder().with_env_filter(filter).with_ansi(false);
    let result = match log_file {
        Some(file) => {
            let subscriber = builder.with_writer(std::sync::Mutex::new(file)).finish();
            tracing::subscriber::set_global_default(subscriber)
        }
        None => tracing::subscriber::set_global_default(builder.with_writer(io::stderr).finish()),
    };
    if result.is_err() {
        eprintln!("Warning: logging already initialized");
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load {}", path.display())),
        None => Ok(Config::load()),
    }
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(2);
        }
    };

    match cli.command {
        Command::Help => {
            print_help();
            return Ok(());
        }
        Command::Version => {
            eprintln!("bmad-terminal {}", VERSION);
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(cli.config.as_ref())?;
    init_logging(&config);
    info!("bmad-terminal {} starting", VERSION);

    match cli.command {
        Command::Replay {
            session,
            cols,
            rows,
            disconnected,
            input,
        } => run_replay(&config, session, (cols, rows), disconnected, input),
        Command::Dispatch { session, target } => run_dispatch(session, target),
        Command::Help | Command::Version => Ok(()),
    }
}

/// Mount a controller, feed it recorded server events and draw the result
fn run_replay(
    config: &Config,
    session: String,
    (cols, rows): (u16, u16),
    disconnected: bool,
    input: Option<PathBuf>,
) -> anyhow::Result<()> {
    let reader: Box<dyn BufRead> = match &input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let transport = LocalTransport::with_writer(io::stdout());
    transport.set_connected(!disconnected);

    let options = ControllerOptions::from_config(config);
    let fit = FitAddon::new(options.emulator.font_size, options.emulator.line_height);
    let palette = options.emulator.palette.clone();
    let props = SessionProps::new(SessionId::from(session), config.session.default_status);
    let mut controller = TerminalSessionController::new(
        Rc::new(transport.clone()) as Rc<dyn Transport>,
        Box::new(VtEmulatorFactory),
        options,
        props,
        fit.container_for(cols, rows),
    );

    let mut skipped = 0usize;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read events")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Err(e) = transport.deliver_line(line) {
            warn!("Skipping line {}: {}", line_no + 1, e);
            skipped += 1;
        }
    }
    controller.on_animation_frame();
    if skipped > 0 {
        eprintln!("Skipped {} malformed line(s)", skipped);
    }

    let renderer = Renderer::new(palette, Placement::Inline);
    let snapshot = controller.snapshot();
    renderer.render(&mut io::stderr(), controller.view(), snapshot.as_ref())?;
    eprintln!();
    info!("Replay finished with status {}", controller.status());

    controller.unmount();
    transport.flush()?;
    Ok(())
}

fn run_dispatch(session: String, target: DispatchTarget) -> anyhow::Result<()> {
    let transport = LocalTransport::with_writer(io::stdout());
    let dispatcher = ActionDispatcher::new(Rc::new(transport.clone()), Rc::new(LogNotifier));
    let session = SessionId::from(session);

    let result = match &target {
        DispatchTarget::Story { id, workflow } => {
            dispatcher.dispatch_story(Some(&session), id, workflow)
        }
        DispatchTarget::Epic { number, workflow } => {
            dispatcher.dispatch_epic(Some(&session), number, workflow)
        }
    };
    transport.flush()?;
    if let Err(e) = result {
        bail!(e);
    }
    Ok(())
}
