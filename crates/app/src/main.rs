use std::fmt;
use std::path::PathBuf;

use quiz_core::model::{
    QuizSettingsDraft, SettingsError, parse_time_of_day, parse_utc_offset_minutes,
};
use services::{AppServices, Clock};

mod terminal;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDataDir { raw: String },
    Settings(SettingsError),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDataDir { raw } => write!(f, "invalid --data-dir value: {raw:?}"),
            ArgsError::Settings(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<SettingsError> for ArgsError {
    fn from(err: SettingsError) -> Self {
        ArgsError::Settings(err)
    }
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_count(flag: &'static str, raw: String) -> Result<u32, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [quiz]   [options]   # take the current test");
    eprintln!("  cargo run -p app -- overview [options]   # last 7 days + mistake pool");
    eprintln!("  cargo run -p app -- wrong    [options]   # list missed questions");
    eprintln!("  cargo run -p app -- seed     [options]   # write a sample bank if empty");
    eprintln!();
    eprintln!("Options (defaults in brackets):");
    eprintln!("  --data-dir <dir>      [.]");
    eprintln!("  --batch-size <n>      [5]");
    eprintln!("  --celebrate-at <n>    [4]");
    eprintln!("  --morning <HH:MM>     [08:00]");
    eprintln!("  --evening <HH:MM>     [02:13]");
    eprintln!("  --utc-offset <+HH:MM> [+03:00]");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DATA_DIR, QUIZ_BATCH_SIZE, QUIZ_CELEBRATE_AT,");
    eprintln!("  QUIZ_MORNING, QUIZ_EVENING, QUIZ_UTC_OFFSET, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Quiz,
    Overview,
    Wrong,
    Seed,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "quiz" => Some(Self::Quiz),
            "overview" => Some(Self::Overview),
            "wrong" => Some(Self::Wrong),
            "seed" => Some(Self::Seed),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    data_dir: PathBuf,
    settings: QuizSettingsDraft,
}

#[derive(Debug)]
enum Invocation {
    Help,
    Run { command: Command, args: Args },
}

/// Splits off the subcommand (default `quiz`) and parses the rest as options.
fn parse_invocation(
    argv: Vec<String>,
    var: impl Fn(&str) -> Option<String>,
) -> Result<Invocation, ArgsError> {
    let mut iter = argv.into_iter().peekable();
    let command = match iter.peek().map(String::as_str) {
        None => Command::Quiz,
        Some(first) if first.starts_with('-') => Command::Quiz,
        Some(first) => {
            let command = Command::from_arg(first)
                .ok_or_else(|| ArgsError::UnknownCommand(first.to_string()))?;
            iter.next();
            command
        }
    };

    Ok(match Args::parse(&mut iter, var)? {
        Some(args) => Invocation::Run { command, args },
        None => Invocation::Help,
    })
}

impl Args {
    /// Environment first, then flags on top. `None` means help was requested.
    fn parse(
        args: &mut impl Iterator<Item = String>,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, ArgsError> {
        let mut parsed = Self::from_env(var)?;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--data-dir" => {
                    let value = require_value(args, "--data-dir")?;
                    parsed.data_dir = parse_data_dir(value)?;
                }
                "--batch-size" => {
                    let value = require_value(args, "--batch-size")?;
                    parsed.settings.batch_size = Some(parse_count("--batch-size", value)?);
                }
                "--celebrate-at" => {
                    let value = require_value(args, "--celebrate-at")?;
                    parsed.settings.celebration_threshold =
                        Some(parse_count("--celebrate-at", value)?);
                }
                "--morning" => {
                    let value = require_value(args, "--morning")?;
                    parsed.settings.morning_start = Some(parse_time_of_day(&value)?);
                }
                "--evening" => {
                    let value = require_value(args, "--evening")?;
                    parsed.settings.evening_start = Some(parse_time_of_day(&value)?);
                }
                "--utc-offset" => {
                    let value = require_value(args, "--utc-offset")?;
                    parsed.settings.utc_offset_minutes = Some(parse_utc_offset_minutes(&value)?);
                }
                "--help" | "-h" => return Ok(None),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Some(parsed))
    }

    fn from_env(var: impl Fn(&str) -> Option<String>) -> Result<Self, ArgsError> {
        let data_dir = var("QUIZ_DATA_DIR")
            .map(parse_data_dir)
            .transpose()?
            .unwrap_or_else(|| PathBuf::from("."));

        let settings = QuizSettingsDraft {
            batch_size: var("QUIZ_BATCH_SIZE")
                .map(|raw| parse_count("QUIZ_BATCH_SIZE", raw))
                .transpose()?,
            celebration_threshold: var("QUIZ_CELEBRATE_AT")
                .map(|raw| parse_count("QUIZ_CELEBRATE_AT", raw))
                .transpose()?,
            morning_start: var("QUIZ_MORNING")
                .map(|raw| parse_time_of_day(&raw))
                .transpose()?,
            evening_start: var("QUIZ_EVENING")
                .map(|raw| parse_time_of_day(&raw))
                .transpose()?,
            utc_offset_minutes: var("QUIZ_UTC_OFFSET")
                .map(|raw| parse_utc_offset_minutes(&raw))
                .transpose()?,
        };

        Ok(Self { data_dir, settings })
    }
}

fn parse_data_dir(raw: String) -> Result<PathBuf, ArgsError> {
    if raw.trim().is_empty() {
        return Err(ArgsError::InvalidDataDir { raw });
    }
    Ok(PathBuf::from(raw.trim()))
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    let invocation =
        parse_invocation(argv, |key| std::env::var(key).ok()).inspect_err(|_| print_usage())?;
    let Invocation::Run { command, args } = invocation else {
        print_usage();
        return Ok(());
    };
    let settings = args
        .settings
        .validate()
        .map_err(ArgsError::from)
        .inspect_err(|_| print_usage())?;
    let data_dir = args.data_dir;

    log::debug!("data dir {}", data_dir.display());
    let services = AppServices::new_json(&data_dir, Clock::default_clock(), settings).await?;

    match command {
        Command::Quiz => terminal::run_quiz(&services).await,
        Command::Overview => {
            terminal::render_overview(&services.overview().weekly_overview().await?);
            Ok(())
        }
        Command::Wrong => {
            terminal::render_wrong_questions(&services.overview().wrong_questions().await?);
            Ok(())
        }
        Command::Seed => {
            if services.seed_sample_bank().await? {
                println!("Sample questions written to {}", data_dir.display());
            } else {
                println!("Question bank already has questions; nothing written.");
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn args(items: &[&str]) -> impl Iterator<Item = String> {
        items
            .iter()
            .map(|s| (*s).to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn env_values_are_read() {
        let parsed = Args::from_env(env(&[
            ("QUIZ_DATA_DIR", "/tmp/quiz"),
            ("QUIZ_BATCH_SIZE", "3"),
            ("QUIZ_EVENING", "20:00"),
            ("QUIZ_UTC_OFFSET", "+02:00"),
        ]))
        .unwrap();

        assert_eq!(parsed.data_dir, PathBuf::from("/tmp/quiz"));
        let settings = parsed.settings.validate().unwrap();
        assert_eq!(settings.batch_size(), 3);
        assert_eq!(settings.utc_offset().local_minus_utc(), 2 * 3600);
        assert_eq!(
            settings.window().evening_start().format("%H:%M").to_string(),
            "20:00"
        );
    }

    #[test]
    fn missing_env_uses_defaults() {
        let parsed = Args::from_env(env(&[])).unwrap();
        assert_eq!(parsed.data_dir, PathBuf::from("."));
        assert_eq!(parsed.settings.validate().unwrap().batch_size(), 5);
    }

    #[test]
    fn bad_env_number_is_reported() {
        let err = Args::from_env(env(&[("QUIZ_BATCH_SIZE", "five")])).unwrap_err();
        assert!(matches!(err, ArgsError::InvalidNumber { .. }));
    }

    #[test]
    fn flags_override_values() {
        let parsed = Args::parse(&mut args(&["--batch-size", "2", "--morning", "07:30"]), env(&[]))
            .unwrap()
            .unwrap();
        assert_eq!(parsed.settings.batch_size, Some(2));
        assert_eq!(
            parsed.settings.morning_start.unwrap().format("%H:%M").to_string(),
            "07:30"
        );
    }

    #[test]
    fn flag_without_value_is_an_error() {
        let err = Args::parse(&mut args(&["--evening"]), env(&[])).unwrap_err();
        assert!(matches!(err, ArgsError::MissingValue { flag: "--evening" }));
    }

    #[test]
    fn bad_time_is_a_settings_error() {
        let err = Args::parse(&mut args(&["--evening", "noon"]), env(&[])).unwrap_err();
        assert!(matches!(err, ArgsError::Settings(SettingsError::InvalidTime { .. })));
    }

    fn argv(items: &[&str]) -> Vec<String> {
        args(items).collect()
    }

    #[test]
    fn flags_win_over_environment() {
        let parsed = Args::parse(
            &mut args(&["--batch-size", "7"]),
            env(&[("QUIZ_BATCH_SIZE", "3"), ("QUIZ_CELEBRATE_AT", "2")]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(parsed.settings.batch_size, Some(7));
        assert_eq!(parsed.settings.celebration_threshold, Some(2));
    }

    #[test]
    fn help_is_returned_not_exited() {
        assert!(matches!(
            parse_invocation(argv(&["--help"]), env(&[])).unwrap(),
            Invocation::Help
        ));
        assert!(matches!(
            parse_invocation(argv(&["overview", "-h"]), env(&[])).unwrap(),
            Invocation::Help
        ));
    }

    #[test]
    fn missing_subcommand_defaults_to_quiz() {
        let Invocation::Run { command, args } =
            parse_invocation(argv(&["--data-dir", "/srv/quiz"]), env(&[])).unwrap()
        else {
            panic!("expected a run");
        };
        assert_eq!(command, Command::Quiz);
        assert_eq!(args.data_dir, PathBuf::from("/srv/quiz"));
    }

    #[test]
    fn subcommand_is_split_from_options() {
        let Invocation::Run { command, args } =
            parse_invocation(argv(&["wrong", "--batch-size", "2"]), env(&[])).unwrap()
        else {
            panic!("expected a run");
        };
        assert_eq!(command, Command::Wrong);
        assert_eq!(args.settings.batch_size, Some(2));
    }

    #[test]
    fn unknown_subcommand_is_a_typed_error() {
        let err = parse_invocation(argv(&["ui"]), env(&[])).unwrap_err();
        assert!(matches!(&err, ArgsError::UnknownCommand(cmd) if cmd == "ui"));
        assert_eq!(err.to_string(), "unknown subcommand: ui");
    }

    #[test]
    fn subcommands_are_recognised() {
        assert_eq!(Command::from_arg("wrong"), Some(Command::Wrong));
        assert_eq!(Command::from_arg("ui"), None);
    }
}
