//! Committing a picked suggestion as an atomic formula token.
//!
//! The formula under the caret is replaced by `open + prefix + label + close`
//! and every char of it is tagged with a fresh entity of the token kind. The
//! resulting entity run is what [`crate::selection::extend`] snaps to, which
//! keeps the token from being edited partially.

use crate::{
  config::FormulaConfig,
  document::{
    Block,
    ChangeType,
    EditorState,
    EntityKey,
    Result,
  },
  selection::Selection,
  span::{
    DelimiterPattern,
    search_text,
  },
};

/// Replace the formula the caret is typing into with a token for `label`.
///
/// Returns the entity of the new token, or `None` when the caret is not in a
/// formula. A space is appended when the token ends the block, so typing can
/// continue after it.
pub fn insert_token(
  state: &mut EditorState,
  config: &FormulaConfig,
  pattern: &DelimiterPattern,
  label: &str,
) -> Result<Option<EntityKey>> {
  let caret = state.selection().anchor().clone();
  let block = state.start_block()?;
  let len = block.len_chars();
  let Some(search) = search_text(&block.text(), caret.offset, pattern) else {
    return Ok(None);
  };

  let token = format!(
    "{}{}{}{}",
    config.open_delimiter, config.prefix, label, config.close_delimiter
  );

  let mut content = state.content().clone();
  let entity = content.create_entity(config.token_kind(), config.entity_mutability, label);
  let replaced = Selection::range(caret.block.clone(), search.begin(), search.end());
  let after = content.replace_text(&replaced, &token, Some(entity))?;
  if search.end() == len {
    content.replace_text(&Selection::point(after), " ", None)?;
  }

  tracing::debug!(label, value = %search.value, "inserted formula token");
  state.push(content, ChangeType::InsertToken);
  Ok(Some(entity))
}
