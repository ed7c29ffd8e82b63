//! Bracket closing and input filtering for formula spans.
//!
//! Runs on every typed input before the host inserts it:
//!
//! 1. **Insert pair** - typing the opening delimiter inserts both delimiters
//!    and leaves the caret between them: `total |` → type `[` → `total [|]`
//! 2. **Drop operator** - inside a formula, characters from the configured
//!    denylist (`+`, `-`, `/`, quotes, ...) are swallowed.
//! 3. **Pass through** - everything else is left to the host's default text
//!    insertion, inside or outside formulas.

use crate::{
  config::FormulaConfig,
  document::{
    Block,
    ChangeType,
    EditorState,
    Result,
  },
  input::HandleResult,
  selection::{
    Position,
    Selection,
  },
  span::{
    DelimiterPattern,
    scan,
  },
};

/// Handle `chars` typed over the current selection of `state`.
///
/// Returns [`HandleResult::Handled`] when the input was consumed, in which
/// case the host must not insert it itself.
pub fn handle_before_input(
  chars: &str,
  state: &mut EditorState,
  config: &FormulaConfig,
  pattern: &DelimiterPattern,
) -> Result<HandleResult> {
  if chars.is_empty() {
    return Ok(HandleResult::NotHandled);
  }

  let mut typed = chars.chars();
  if typed.next() == Some(config.open_delimiter) && typed.next().is_none() {
    insert_pair(state, config)?;
    return Ok(HandleResult::Handled);
  }

  let selection = state.selection();
  if !selection.is_single_block() {
    return Ok(HandleResult::NotHandled);
  }

  let (start, end) = (selection.start().offset, selection.end().offset);
  let block = state.start_block()?;
  let inside = scan(&block.text(), pattern)
    .iter()
    .any(|span| span.surrounds(start) && span.surrounds(end));

  if inside && chars.chars().any(|ch| config.is_denied(ch)) {
    tracing::trace!(chars, "dropping operator typed inside formula");
    return Ok(HandleResult::Handled);
  }

  Ok(HandleResult::NotHandled)
}

fn insert_pair(state: &mut EditorState, config: &FormulaConfig) -> Result<()> {
  let selection = state.selection().clone();
  let start = selection.start();

  let mut content = state.content().clone();
  content.replace_text(&selection, &config.delimiter_pair(), None)?;
  state.push(content, ChangeType::InsertCharacters);

  let caret = Position::new(start.block.clone(), start.offset + 1);
  tracing::trace!(block = %caret.block, offset = caret.offset, "inserted delimiter pair");
  state.force_selection(Selection::point(caret));
  Ok(())
}
