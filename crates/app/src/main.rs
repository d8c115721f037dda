use std::fmt;
use std::path::PathBuf;

use services::{AgentConfig, AppServices, Clock};
use tracing::info;
use tutor_core::model::ExperienceLevel;

mod dashboard;
mod terminal;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingOperand { command: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidLevel { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingOperand { command } => write!(f, "{command} requires an argument"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidLevel { raw } => write!(
                f,
                "invalid level: {raw} (expected Beginner, Intermediate or Advanced)"
            ),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- dashboard [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- tutor     [--db <sqlite_url>] [--module <id>]");
    eprintln!("  cargo run -p app -- ask       [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- docs      [--db <sqlite_url>] [<action>]");
    eprintln!("  cargo run -p app -- level     [--db <sqlite_url>] [<level>]");
    eprintln!();
    eprintln!("Docs actions: list (default), upload <path>, delete <name>");
    eprintln!("Levels: Beginner, Intermediate, Advanced");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://pm-tutor.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PM_TUTOR_DB_URL, PM_TUTOR_AGENT_BASE_URL, PM_TUTOR_API_KEY,");
    eprintln!("  PM_TUTOR_TUTOR_AGENT_ID, PM_TUTOR_KB_AGENT_ID, PM_TUTOR_RAG_ID,");
    eprintln!("  PM_TUTOR_TIMEOUT_SECS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Dashboard,
    Tutor,
    Ask,
    Docs,
    Level,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "dashboard" => Some(Self::Dashboard),
            "tutor" => Some(Self::Tutor),
            "ask" => Some(Self::Ask),
            "docs" => Some(Self::Docs),
            "level" => Some(Self::Level),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DocsAction {
    List,
    Upload(PathBuf),
    Delete(String),
}

struct Args {
    db_url: String,
    module: Option<String>,
    operands: Vec<String>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("PM_TUTOR_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://pm-tutor.sqlite3".into(), normalize_sqlite_url);
        let mut module = None;
        let mut operands = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--module" => module = Some(require_value(args, "--module")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => operands.push(arg),
            }
        }

        Ok(Self {
            db_url,
            module,
            operands,
        })
    }

    fn docs_action(&self) -> Result<DocsAction, ArgsError> {
        let mut operands = self.operands.iter();
        match operands.next().map(String::as_str) {
            None | Some("list") => Ok(DocsAction::List),
            Some("upload") => operands
                .next()
                .map(|path| DocsAction::Upload(PathBuf::from(path)))
                .ok_or(ArgsError::MissingOperand {
                    command: "docs upload",
                }),
            Some("delete") => operands
                .next()
                .map(|name| DocsAction::Delete(name.clone()))
                .ok_or(ArgsError::MissingOperand {
                    command: "docs delete",
                }),
            Some(other) => Err(ArgsError::UnknownArg(other.to_owned())),
        }
    }

    fn level(&self) -> Result<Option<ExperienceLevel>, ArgsError> {
        self.operands
            .first()
            .map(|raw| {
                raw.parse()
                    .map_err(|_| ArgsError::InvalidLevel { raw: raw.clone() })
            })
            .transpose()
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Dashboard,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Dashboard,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let config = AgentConfig::from_env()?;
    if !config.enabled() {
        info!("PM_TUTOR_AGENT_BASE_URL is not set; agent features are disabled");
    }

    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, config, Clock::default_clock()).await?;

    match cmd {
        Command::Dashboard => {
            dashboard::print(&services).await;
            Ok(())
        }
        Command::Tutor => {
            if let Some(module) = parsed.module.as_deref() {
                services.tutor().select_module(module)?;
            }
            terminal::tutor_loop(&services).await?;
            Ok(())
        }
        Command::Ask => {
            terminal::knowledge_loop(&services).await?;
            Ok(())
        }
        Command::Docs => {
            let action = parsed.docs_action()?;
            terminal::documents(&services, action).await;
            Ok(())
        }
        Command::Level => {
            let settings = services.settings();
            if let Some(level) = parsed.level()? {
                settings.save_level(level).await?;
            }
            println!("Experience level: {}", settings.load_level().await);
            Ok(())
        }
    }
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
