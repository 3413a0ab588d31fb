//! Interactive session commands and console log display.
//!
//! Inside `relayctl run` the operator types short commands on stdin.
//! Slot numbers are 1-based like the stream names; parsing converts them to
//! 0-based indices.

use std::path::PathBuf;
use std::str::FromStr;

use relayctl_core::LogDisplay;
use relayctl_runtime::LogView;
use thiserror::Error;

/// Help text printed by the `help` command.
pub const SESSION_HELP: &str = "\
Commands:
  start <n>|all   start one slot or every slot
  stop <n>|all    stop one slot or every slot
  delete <n>      remove a slot (later slots are renumbered)
  add <path>      append a media file as a stopped slot
  list            show the slot list
  urls            print the URLs of running streams
  log [n]         show the last n log lines (default 20)
  help            show this help
  quit            stop everything and exit";

/// Default number of lines shown by `log`.
pub const DEFAULT_LOG_TAIL: usize = 20;

/// Which slots a start or stop addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    All,
    /// 0-based slot index.
    Slot(usize),
}

/// One parsed line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Start(Target),
    Stop(Target),
    Delete(usize),
    Add(PathBuf),
    List,
    Urls,
    Log(usize),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}' (type 'help')")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("'{0}' is not a slot number")]
    InvalidNumber(String),
}

impl FromStr for SessionCommand {
    type Err = SessionParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));

        match word.to_ascii_lowercase().as_str() {
            "" => Err(SessionParseError::Empty),
            "start" => parse_target(rest, "start").map(Self::Start),
            "stop" => parse_target(rest, "stop").map(Self::Stop),
            "delete" | "del" | "rm" => {
                if rest.is_empty() {
                    return Err(SessionParseError::MissingArgument("delete"));
                }
                parse_slot_number(rest).map(Self::Delete)
            }
            "add" => {
                let path = unquote(rest);
                if path.is_empty() {
                    return Err(SessionParseError::MissingArgument("add"));
                }
                Ok(Self::Add(PathBuf::from(path)))
            }
            "list" | "ls" => Ok(Self::List),
            "urls" => Ok(Self::Urls),
            "log" => {
                if rest.is_empty() {
                    return Ok(Self::Log(DEFAULT_LOG_TAIL));
                }
                rest.parse::<usize>()
                    .map(Self::Log)
                    .map_err(|_| SessionParseError::InvalidNumber(rest.to_string()))
            }
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(SessionParseError::Unknown(other.to_string())),
        }
    }
}

fn parse_target(arg: &str, command: &'static str) -> Result<Target, SessionParseError> {
    match arg {
        "" => Err(SessionParseError::MissingArgument(command)),
        a if a.eq_ignore_ascii_case("all") => Ok(Target::All),
        a => parse_slot_number(a).map(Target::Slot),
    }
}

/// Parse a 1-based slot number into a 0-based index.
fn parse_slot_number(arg: &str) -> Result<usize, SessionParseError> {
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(SessionParseError::InvalidNumber(arg.to_string())),
    }
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(s)
}

/// Prints flushed log batches and keeps them for the `log` command.
#[derive(Debug)]
pub struct ConsoleLog {
    view: LogView,
}

impl ConsoleLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            view: LogView::new(capacity),
        }
    }

    pub const fn view(&self) -> &LogView {
        &self.view
    }
}

impl LogDisplay for ConsoleLog {
    fn show(&self, lines: &[String]) {
        for line in lines {
            println!("{line}");
        }
        self.view.push_lines(lines);
    }
}
