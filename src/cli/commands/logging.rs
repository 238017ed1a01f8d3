use clap::{Arg, ArgAction, Command, builder::ValueParser};
use tracing::Level;

pub const ARG_VERBOSITY: &str = "verbosity";

/// Index is the `-v` count; `SESI_LOG_LEVEL` may name a level or give its index.
const LEVELS: [(&str, Level); 5] = [
    ("error", Level::ERROR),
    ("warn", Level::WARN),
    ("info", Level::INFO),
    ("debug", Level::DEBUG),
    ("trace", Level::TRACE),
];

fn parse_level(value: &str) -> Result<u8, String> {
    let value = value.trim().to_ascii_lowercase();
    let index = match value.parse::<usize>() {
        Ok(index) => Some(index).filter(|index| *index < LEVELS.len()),
        Err(_) => LEVELS.iter().position(|(name, _)| *name == value),
    };
    index
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| format!("invalid log level: {value} (use error, warn, info, debug or trace)"))
}

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(parse_level)
}

/// Tracing level for a verbosity count; anything above `trace` stays `trace`.
#[must_use]
pub fn verbosity_level(verbosity: u8) -> Level {
    let last = LEVELS.len() - 1;
    LEVELS[usize::from(verbosity).min(last)].1
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Raise log verbosity: -v warn, -vv info, -vvv debug, -vvvv trace (default: error)")
            .env("SESI_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}
