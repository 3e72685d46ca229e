use std::io::{self, Write};
use std::path::PathBuf;

use env_logger::Env;
use sqlpanel::Navigator;
use sqlpanel::shell::{Shell, ShellControl};
use sqlpanel::terminal::TerminalHost;
use sqlpanel_core::{AppConfig, AppConfigStore, DialogHost, ErrorCategory, ErrorReport};

const USAGE: &str = "usage: sqlpanel <database> [--config <path>]";
const PROMPT: &str = "sqlpanel> ";

struct Args {
    database: PathBuf,
    config: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut database = None;
    let mut config = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().ok_or("--config needs a path")?;
                config = Some(PathBuf::from(path));
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            other if database.is_none() => database = Some(PathBuf::from(other)),
            other => return Err(format!("unexpected argument: {}\n{}", other, USAGE)),
        }
    }

    Ok(Args {
        database: database.ok_or(USAGE)?,
        config,
    })
}

fn load_config(path: Option<PathBuf>) -> Result<AppConfig, String> {
    let store = match path {
        Some(path) => AppConfigStore::at(path),
        None => AppConfigStore::new().map_err(|e| e.to_string())?,
    };
    store.load().map_err(|e| e.to_string())
}

fn init_logging(config: &AppConfig) {
    let filter = config.log_filter.as_deref().unwrap_or("info");
    env_logger::Builder::from_env(Env::default().default_filter_or(filter))
        .format_timestamp_millis()
        .init();
}

fn run(args: &[String]) -> i32 {
    let args = match parse_args(args) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            return 2;
        }
    };

    let config = match load_config(args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return 1;
        }
    };
    init_logging(&config);

    let stdin = io::stdin();
    let mut host = TerminalHost::new(stdin.lock(), io::stdout());

    let nav = match Navigator::open(&args.database) {
        Ok(nav) => nav,
        Err(e) => {
            let name = args.database.display().to_string();
            host.message(&ErrorReport::from_error(ErrorCategory::Open, name, &e));
            return 1;
        }
    };

    let mut shell = Shell::new(nav, config);
    let mut out = io::stdout();

    loop {
        let Some(line) = host.prompt(PROMPT) else {
            break;
        };

        match shell.execute(&line, &mut host, &mut out) {
            Ok(ShellControl::Continue) => {}
            Ok(ShellControl::Quit) => break,
            Err(e) => {
                log::error!("Output failed: {}", e);
                return 1;
            }
        }

        if let Err(e) = out.flush() {
            log::error!("Output failed: {}", e);
            return 1;
        }
    }

    match shell.into_navigator().into_connection().close() {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{}", e);
            1
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    std::process::exit(run(&args));
}
