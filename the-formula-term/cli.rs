use std::path::PathBuf;

use anyhow::{
  Result,
  bail,
};
use clap::{
  ArgAction,
  Parser,
  Subcommand,
};

#[derive(Clone, Debug)]
pub struct CliOptions {
  pub verbosity:   u8,
  pub log_file:    Option<PathBuf>,
  pub config_file: Option<PathBuf>,
  pub command:     Command,
}

#[derive(Clone, Debug)]
pub enum Command {
  /// Print the formula spans of a file, or of stdin when `file` is `None`.
  Scan { file: Option<PathBuf> },
  /// Type `keys` into an empty editor, then optionally commit `pick` as a
  /// token and rank `candidates` against the formula under the caret.
  Type {
    keys:       String,
    pick:       Option<String>,
    candidates: Vec<String>,
  },
}

impl CliOptions {
  pub fn parse() -> Result<Self> {
    let raw = RawCli::parse();
    raw.try_into()
  }
}

#[derive(Parser, Debug)]
#[command(name = "the-formula", about, version, long_about = None)]
struct RawCli {
  /// Increase logging verbosity (repeat for more detail)
  #[arg(short = 'v', action = ArgAction::Count, global = true)]
  verbosity: u8,

  /// Save logs to a specific file
  #[arg(long = "log", value_name = "FILE", global = true)]
  log_file: Option<PathBuf>,

  /// Load configuration from a specific file
  #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
  config_file: Option<PathBuf>,

  #[command(subcommand)]
  command: RawCommand,
}

#[derive(Subcommand, Debug)]
enum RawCommand {
  /// List the formula spans of every line
  Scan {
    /// File to scan, stdin when omitted
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
  },
  /// Feed keystrokes through the editor pipeline
  Type {
    /// Characters to type, one keystroke each
    #[arg(value_name = "KEYS")]
    keys: String,

    /// Commit this label as a token once typing is done
    #[arg(long = "pick", value_name = "LABEL")]
    pick: Option<String>,

    /// Comma separated names to rank against the formula under the caret
    #[arg(long = "suggest", value_name = "NAMES", value_delimiter = ',')]
    candidates: Vec<String>,
  },
}

impl TryFrom<RawCli> for CliOptions {
  type Error = anyhow::Error;

  fn try_from(raw: RawCli) -> Result<Self> {
    let command = match raw.command {
      RawCommand::Scan { file } => Command::Scan { file },
      RawCommand::Type {
        keys,
        pick,
        candidates,
      } => {
        if pick.is_some() && !candidates.is_empty() {
          bail!("--pick and --suggest cannot be combined");
        }
        Command::Type {
          keys,
          pick,
          candidates: candidates
            .into_iter()
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty())
            .collect(),
        }
      },
    };

    Ok(Self {
      verbosity: raw.verbosity,
      log_file: raw.log_file,
      config_file: raw.config_file,
      command,
    })
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn parse(args: &[&str]) -> Result<CliOptions> {
    RawCli::try_parse_from(args)?.try_into()
  }

  #[test]
  fn test_scan_defaults_to_stdin() {
    let options = parse(&["the-formula", "scan"]).unwrap();
    assert!(matches!(options.command, Command::Scan { file: None }));
    assert_eq!(options.verbosity, 0);
  }

  #[test]
  fn test_global_flags_after_subcommand() {
    let options = parse(&["the-formula", "scan", "notes.txt", "-vv", "--log", "out.log"]).unwrap();
    assert_eq!(options.verbosity, 2);
    assert_eq!(options.log_file, Some(PathBuf::from("out.log")));
    assert!(matches!(options.command, Command::Scan { file: Some(_) }));
  }

  #[test]
  fn test_type_suggest_list() {
    let options = parse(&["the-formula", "type", "[co", "--suggest", "cost, count,,"]).unwrap();
    let Command::Type { candidates, .. } = options.command else {
      panic!("expected type command");
    };
    assert_eq!(candidates, vec!["cost", "count"]);
  }

  #[test]
  fn test_pick_and_suggest_conflict() {
    assert!(parse(&["the-formula", "type", "[co", "--pick", "cost", "--suggest", "cost"]).is_err());
  }
}
