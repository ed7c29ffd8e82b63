//! Plugin configuration.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! trigger = "@"
//! pattern = '\[(.*?)\]'
//! open-delimiter = "["
//! close-delimiter = "]"
//! prefix = ""
//! entity-mutability = "immutable"
//! operator-denylist = "-%^&*()+\"'/"
//! suggestion-limit = 5
//!
//! [theme]
//! mention = "formula-mention"
//! ```

use std::{
  fs,
  path::Path,
};

use serde::Deserialize;
use thiserror::Error;

use crate::{
  document::EntityMutability,
  span::{
    DEFAULT_PATTERN,
    DelimiterPattern,
  },
};

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid delimiter pattern: {0}")]
  Pattern(#[from] regex::Error),
  #[error("failed to parse config: {0}")]
  Parse(#[from] toml::de::Error),
  #[error("failed to read config: {0}")]
  Io(#[from] std::io::Error),
  #[error("opening and closing delimiter must differ, both are {0:?}")]
  SameDelimiters(char),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Class names handed to the presentation layer untouched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Theme {
  pub mention:                   String,
  pub suggestions:               String,
  pub suggestions_entry:         String,
  pub suggestions_entry_focused: String,
  pub suggestions_entry_text:    String,
  pub suggestions_entry_avatar:  String,
}

impl Default for Theme {
  fn default() -> Self {
    Self {
      mention:                   "formula-mention".into(),
      suggestions:               "formula-suggestions".into(),
      suggestions_entry:         "formula-suggestions-entry".into(),
      suggestions_entry_focused: "formula-suggestions-entry-focused".into(),
      suggestions_entry_text:    "formula-suggestions-entry-text".into(),
      suggestions_entry_avatar:  "formula-suggestions-entry-avatar".into(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct FormulaConfig {
  /// Character that names the token entity kind (`<trigger>mention`).
  pub trigger:           String,
  /// Regex matching one formula span.
  pub pattern:           String,
  pub open_delimiter:    char,
  pub close_delimiter:   char,
  /// Prepended to the label of inserted tokens.
  pub prefix:            String,
  pub entity_mutability: EntityMutability,
  /// Characters dropped when typed inside a formula.
  pub operator_denylist: String,
  /// Maximum number of suggestions kept by the filter.
  pub suggestion_limit:  usize,
  pub theme:             Theme,
}

impl Default for FormulaConfig {
  fn default() -> Self {
    Self {
      trigger:           "@".into(),
      pattern:           DEFAULT_PATTERN.into(),
      open_delimiter:    '[',
      close_delimiter:   ']',
      prefix:            String::new(),
      entity_mutability: EntityMutability::Immutable,
      operator_denylist: "-%^&*()+\"'/".into(),
      suggestion_limit:  5,
      theme:             Theme::default(),
    }
  }
}

impl FormulaConfig {
  pub fn from_toml(source: &str) -> Result<Self> {
    let config: Self = toml::from_str(source)?;
    config.validate()?;
    Ok(config)
  }

  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let source = fs::read_to_string(path)?;
    Self::from_toml(&source)
  }

  pub fn validate(&self) -> Result<()> {
    if self.open_delimiter == self.close_delimiter {
      return Err(ConfigError::SameDelimiters(self.open_delimiter));
    }
    self.compile_pattern()?;
    Ok(())
  }

  pub fn compile_pattern(&self) -> Result<DelimiterPattern> {
    Ok(DelimiterPattern::new(&self.pattern)?)
  }

  /// Entity kind of committed tokens.
  pub fn token_kind(&self) -> String {
    format!("{}mention", self.trigger)
  }

  pub fn is_denied(&self, ch: char) -> bool {
    self.operator_denylist.contains(ch)
  }

  /// The text inserted when the opening delimiter is typed.
  pub fn delimiter_pair(&self) -> String {
    [self.open_delimiter, self.close_delimiter].iter().collect()
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn test_empty_config_is_default() {
    assert_eq!(FormulaConfig::from_toml("").unwrap(), FormulaConfig::default());
  }

  #[test]
  fn test_parse_overrides() {
    let config = FormulaConfig::from_toml(
      r##"
        trigger = "#"
        prefix = "="
        entity-mutability = "segmented"
        suggestion-limit = 3

        [theme]
        mention = "token"
      "##,
    )
    .unwrap();

    assert_eq!(config.token_kind(), "#mention");
    assert_eq!(config.prefix, "=");
    assert_eq!(config.entity_mutability, EntityMutability::Segmented);
    assert_eq!(config.suggestion_limit, 3);
    assert_eq!(config.theme.mention, "token");
    assert_eq!(config.theme.suggestions, Theme::default().suggestions);
  }

  #[test]
  fn test_custom_delimiters() {
    let config = FormulaConfig::from_toml(
      r#"
        pattern = '\{(.*?)\}'
        open-delimiter = "{"
        close-delimiter = "}"
      "#,
    )
    .unwrap();
    assert_eq!(config.delimiter_pair(), "{}");
    assert_eq!(config.compile_pattern().unwrap().as_str(), r"\{(.*?)\}");
  }

  #[test]
  fn test_rejects_bad_config() {
    assert!(matches!(
      FormulaConfig::from_toml("pattern = '[('"),
      Err(ConfigError::Pattern(_))
    ));
    assert!(matches!(
      FormulaConfig::from_toml("unknown = 1"),
      Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
      FormulaConfig::from_toml("open-delimiter = \"|\"\nclose-delimiter = \"|\""),
      Err(ConfigError::SameDelimiters('|'))
    ));
  }

  #[test]
  fn test_denylist() {
    let config = FormulaConfig::default();
    for ch in ['+', '-', '*', '/', '"', '\'', '%', '^', '&', '(', ')'] {
      assert!(config.is_denied(ch), "{ch} should be denied");
    }
    for ch in ['a', '1', ' ', '_', '.'] {
      assert!(!config.is_denied(ch), "{ch} should be allowed");
    }
  }
}
