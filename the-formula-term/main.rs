use std::{
  fmt::Write as _,
  fs,
  io::{
    self,
    Read,
  },
};

use anyhow::{
  Context,
  Result,
};
use the_formula::{
  FormulaConfig,
  FormulaPlugin,
  document::{
    Block,
    ContentState,
    EditorState,
  },
  span::scan,
};

use crate::cli::{
  CliOptions,
  Command,
};

mod cli;
mod logging;

fn main() -> Result<()> {
  let options = CliOptions::parse()?;
  logging::setup_logging(options.verbosity, options.log_file.as_deref())?;

  let config = match &options.config_file {
    Some(path) => FormulaConfig::load(path)
      .with_context(|| format!("failed to load config from {}", path.display()))?,
    None => FormulaConfig::default(),
  };
  let mut plugin = FormulaPlugin::new(config)?;

  let output = match options.command {
    Command::Scan { file } => {
      let text = match file {
        Some(path) => fs::read_to_string(&path)
          .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
          let mut text = String::new();
          io::stdin().read_to_string(&mut text)?;
          text
        },
      };
      render_scan(&plugin, &text)
    },
    Command::Type {
      keys,
      pick,
      candidates,
    } => run_type(&mut plugin, &keys, pick.as_deref(), &candidates)?,
  };

  print!("{output}");
  Ok(())
}

/// One line per span: `line:start..end<TAB>inner`.
fn render_scan(plugin: &FormulaPlugin, text: &str) -> String {
  let content = ContentState::from_text(text);
  let mut out = String::new();
  for (line, block) in content.blocks().iter().enumerate() {
    let chars: Vec<char> = block.text().chars().collect();
    for span in scan(&block.text(), plugin.pattern()) {
      let inner: String = chars[span.inner()].iter().collect();
      let _ = writeln!(out, "{}:{}..{}\t{}", line + 1, span.start, span.end, inner);
    }
  }
  out
}

fn run_type(
  plugin: &mut FormulaPlugin,
  keys: &str,
  pick: Option<&str>,
  candidates: &[String],
) -> Result<String> {
  let mut state = plugin.type_text(EditorState::from_text(""), keys)?;

  if let Some(label) = pick {
    if plugin.insert_token(&mut state, label)?.is_none() {
      log::warn!("caret is not inside a formula, nothing to pick");
    }
    state = plugin.on_change(state)?;
  }

  let mut out = render_state(&state);
  if !candidates.is_empty() {
    let search = plugin
      .search_text(&state)?
      .map(|search| search.value)
      .unwrap_or_default();
    for name in plugin.filter_suggestions(&search, candidates) {
      let _ = writeln!(out, "  {name}");
    }
  }
  Ok(out)
}

fn render_state(state: &EditorState) -> String {
  let selection = state.selection();
  format!(
    "{}\nselection {}..{}{}\n",
    state.content().plain_text(),
    selection.anchor().offset,
    selection.focus().offset,
    if selection.is_backward() { " (backward)" } else { "" }
  )
}

#[cfg(test)]
mod test {
  use super::*;

  fn plugin() -> FormulaPlugin {
    FormulaPlugin::new(FormulaConfig::default()).unwrap()
  }

  #[test]
  fn test_render_scan() {
    let out = render_scan(&plugin(), "a [x] b\nnone\n[yz]");
    assert_eq!(out, "1:2..5\tx\n3:0..4\tyz\n");
  }

  #[test]
  fn test_run_type() {
    let out = run_type(&mut plugin(), "[ab", None, &[]).unwrap();
    assert_eq!(out, "[ab]\nselection 3..3\n");
  }

  #[test]
  fn test_run_type_pick() {
    let out = run_type(&mut plugin(), "= [re", Some("revenue"), &[]).unwrap();
    assert_eq!(out, "= [revenue] \nselection 12..12\n");
  }

  #[test]
  fn test_run_type_suggest() {
    let candidates = vec!["cost".to_owned(), "revenue".to_owned()];
    let out = run_type(&mut plugin(), "[co", None, &candidates).unwrap();
    assert_eq!(out, "[co]\nselection 3..3\n  cost\n");
  }
}
