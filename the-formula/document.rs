//! Block-structured rich-text document model.
//!
//! The editor that hosts formula spans owns its own document. This crate
//! only relies on the small contract captured by [`Block`]: plain text, a
//! length, and per-char entity tags. [`ContentState`] and [`EditorState`]
//! are an in-memory rendition of that contract used by the plugin facade,
//! the tests and the command-line driver.
//!
//! # Model
//!
//! - A [`ContentState`] is an ordered list of [`ContentBlock`]s plus an
//!   entity table.
//! - Every char of a block carries a [`CharMeta`], which may point at an
//!   [`Entity`]. Contiguous chars sharing the same entity form an entity run.
//! - An [`EditorState`] pairs content with the current [`Selection`].
//!
//! Offsets are char indices within a block.
//!
//! # Example
//!
//! ```
//! use the_formula::{
//!   document::{ChangeType, EditorState},
//!   selection::Selection,
//! };
//!
//! let mut state = EditorState::from_text("total: ");
//! let key = state.content().first_block_key().clone();
//! state.set_selection(Selection::collapsed(key, 7));
//!
//! let mut content = state.content().clone();
//! content.replace_text(state.selection(), "[]", None).unwrap();
//! state.push(content, ChangeType::InsertCharacters);
//!
//! assert_eq!(state.content().plain_text(), "total: []");
//! ```

use std::{
  borrow::Cow,
  fmt,
  iter,
  num::NonZeroUsize,
  ops::Range,
};

use ropey::Rope;
use serde::Deserialize;
use thiserror::Error;

use crate::{
  Tendril,
  selection::{
    Position,
    Selection,
  },
};

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum DocumentError {
  #[error("block {0} does not exist")]
  UnknownBlock(BlockKey),
  #[error("offset {offset} out of bounds for block {block} of length {len}")]
  OffsetOutOfBounds {
    block:  BlockKey,
    offset: usize,
    len:    usize,
  },
  #[error("range {start}..{end} in block {block} is reversed")]
  ReversedRange {
    block: BlockKey,
    start: usize,
    end:   usize,
  },
  #[error("entity {0} does not exist")]
  UnknownEntity(EntityKey),
}

pub type Result<T> = std::result::Result<T, DocumentError>;

/// Host-assigned block identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockKey(Tendril);

impl BlockKey {
  pub fn new(key: impl Into<Tendril>) -> Self {
    Self(key.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for BlockKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for BlockKey {
  fn from(value: &str) -> Self {
    Self::new(value)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey(NonZeroUsize);

impl EntityKey {
  pub const fn new(key: NonZeroUsize) -> Self {
    Self(key)
  }

  pub const fn get(self) -> NonZeroUsize {
    self.0
  }

  fn index(self) -> usize {
    self.0.get() - 1
  }
}

impl fmt::Display for EntityKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// How an entity behaves when the text it covers is edited.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityMutability {
  /// Edits remove the whole entity.
  #[default]
  Immutable,
  /// Text may be edited freely and keeps the entity.
  Mutable,
  /// Edits remove the affected segment only.
  Segmented,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
  pub kind:       Tendril,
  pub mutability: EntityMutability,
  pub label:      Tendril,
}

/// Metadata attached to a single char.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CharMeta {
  pub entity: Option<EntityKey>,
}

/// Read access to a block of the host document.
pub trait Block {
  fn key(&self) -> &BlockKey;

  fn text(&self) -> Cow<'_, str>;

  fn len_chars(&self) -> usize;

  /// Metadata of the char at `offset`, or `None` past the end of the block.
  fn char_at(&self, offset: usize) -> Option<CharMeta>;

  /// Entity tag of the char at `offset`. `None` both for untagged chars and
  /// for offsets past the end of the block.
  fn entity_at(&self, offset: usize) -> Option<EntityKey> {
    self.char_at(offset).and_then(|meta| meta.entity)
  }
}

/// Report every maximal entity run whose entity satisfies `predicate`.
///
/// Runs are reported left to right as half-open `(start, end)` char ranges.
pub fn entity_ranges<B, P, F>(block: &B, mut predicate: P, mut report: F)
where
  B: Block + ?Sized,
  P: FnMut(EntityKey) -> bool,
  F: FnMut(usize, usize),
{
  let len = block.len_chars();
  let mut offset = 0;

  while offset < len {
    let entity = block.entity_at(offset);
    let start = offset;
    while offset < len && block.entity_at(offset) == entity {
      offset += 1;
    }

    if let Some(entity) = entity
      && predicate(entity)
    {
      report(start, offset);
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBlock {
  key:   BlockKey,
  text:  Rope,
  chars: Vec<CharMeta>,
}

impl ContentBlock {
  pub fn new(key: impl Into<BlockKey>, text: &str) -> Self {
    let text = Rope::from(text);
    let chars = vec![CharMeta::default(); text.len_chars()];
    Self {
      key: key.into(),
      text,
      chars,
    }
  }

  /// Tag the chars in `range` with `entity`.
  pub fn set_entity(&mut self, range: Range<usize>, entity: Option<EntityKey>) -> Result<()> {
    if range.start > range.end {
      return Err(DocumentError::ReversedRange {
        block: self.key.clone(),
        start: range.start,
        end:   range.end,
      });
    }
    self.check_offset(range.end)?;
    for meta in &mut self.chars[range] {
      meta.entity = entity;
    }
    Ok(())
  }

  fn check_offset(&self, offset: usize) -> Result<()> {
    let len = self.chars.len();
    if offset > len {
      return Err(DocumentError::OffsetOutOfBounds {
        block: self.key.clone(),
        offset,
        len,
      });
    }
    Ok(())
  }

  fn splice(&mut self, range: Range<usize>, text: &str, entity: Option<EntityKey>) {
    let inserted = text.chars().count();
    self.text.remove(range.clone());
    self.text.insert(range.start, text);
    self
      .chars
      .splice(range, iter::repeat_n(CharMeta { entity }, inserted));
  }

  fn append(&mut self, other: &ContentBlock, from: usize) {
    let tail = String::from(other.text.slice(from..));
    let at = self.text.len_chars();
    self.text.insert(at, &tail);
    self.chars.extend_from_slice(&other.chars[from..]);
  }
}

impl Block for ContentBlock {
  fn key(&self) -> &BlockKey {
    &self.key
  }

  fn text(&self) -> Cow<'_, str> {
    self.text.slice(..).into()
  }

  fn len_chars(&self) -> usize {
    self.chars.len()
  }

  fn char_at(&self, offset: usize) -> Option<CharMeta> {
    self.chars.get(offset).copied()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentState {
  blocks:          Vec<ContentBlock>,
  entities:        Vec<Entity>,
  selection_after: Option<Selection>,
}

impl ContentState {
  /// Build content from blocks. An empty list gets a single empty block so
  /// there is always somewhere to put the caret.
  pub fn new(mut blocks: Vec<ContentBlock>) -> Self {
    if blocks.is_empty() {
      blocks.push(ContentBlock::new("b0", ""));
    }
    Self {
      blocks,
      entities: Vec::new(),
      selection_after: None,
    }
  }

  /// One block per line of `text`, keyed `b0`, `b1`, ...
  pub fn from_text(text: &str) -> Self {
    let blocks = text
      .split('\n')
      .enumerate()
      .map(|(i, line)| ContentBlock::new(BlockKey::new(format!("b{i}")), line))
      .collect();
    Self::new(blocks)
  }

  pub fn blocks(&self) -> &[ContentBlock] {
    &self.blocks
  }

  pub fn first_block_key(&self) -> &BlockKey {
    // `new` guarantees at least one block.
    &self.blocks[0].key
  }

  pub fn block_for_key(&self, key: &BlockKey) -> Option<&ContentBlock> {
    self.blocks.iter().find(|block| &block.key == key)
  }

  pub fn block_for_key_mut(&mut self, key: &BlockKey) -> Option<&mut ContentBlock> {
    self.blocks.iter_mut().find(|block| &block.key == key)
  }

  fn block_index(&self, key: &BlockKey) -> Result<usize> {
    self
      .blocks
      .iter()
      .position(|block| &block.key == key)
      .ok_or_else(|| DocumentError::UnknownBlock(key.clone()))
  }

  /// Block texts joined with `\n`.
  pub fn plain_text(&self) -> String {
    let mut out = String::new();
    for (i, block) in self.blocks.iter().enumerate() {
      if i > 0 {
        out.push('\n');
      }
      out.push_str(&block.text());
    }
    out
  }

  pub fn create_entity(
    &mut self,
    kind: impl Into<Tendril>,
    mutability: EntityMutability,
    label: impl Into<Tendril>,
  ) -> EntityKey {
    // Keys are 1-based indices into the entity table.
    let key = EntityKey::new(NonZeroUsize::MIN.saturating_add(self.entities.len()));
    self.entities.push(Entity {
      kind: kind.into(),
      mutability,
      label: label.into(),
    });
    key
  }

  pub fn entity(&self, key: EntityKey) -> Option<&Entity> {
    self.entities.get(key.index())
  }

  /// Selection the host should adopt after the last mutation.
  pub fn selection_after(&self) -> Option<&Selection> {
    self.selection_after.as_ref()
  }

  /// Replace the text covered by `selection` with `text`, tagging the new
  /// chars with `entity`.
  ///
  /// A selection spanning several blocks merges its first and last block and
  /// drops the blocks in between. The caret ends up collapsed after the
  /// inserted text and is recorded as [`ContentState::selection_after`].
  pub fn replace_text(
    &mut self,
    selection: &Selection,
    text: &str,
    entity: Option<EntityKey>,
  ) -> Result<Position> {
    if let Some(entity) = entity
      && self.entity(entity).is_none()
    {
      return Err(DocumentError::UnknownEntity(entity));
    }

    let (mut start, mut end) = (selection.start(), selection.end());
    let mut start_idx = self.block_index(&start.block)?;
    let mut end_idx = self.block_index(&end.block)?;
    // The backward flag comes from the host; trust block order over it.
    if start_idx > end_idx {
      std::mem::swap(&mut start, &mut end);
      std::mem::swap(&mut start_idx, &mut end_idx);
    }
    self.blocks[start_idx].check_offset(start.offset)?;
    self.blocks[end_idx].check_offset(end.offset)?;

    if start_idx == end_idx {
      self.blocks[start_idx].splice(start.offset..end.offset, text, entity);
    } else {
      let (head, tail) = self.blocks.split_at_mut(end_idx);
      let first = &mut head[start_idx];
      let len = first.len_chars();
      first.splice(start.offset..len, text, entity);
      first.append(&tail[0], end.offset);
      self.blocks.drain(start_idx + 1..=end_idx);
    }

    let caret = Position::new(start.block.clone(), start.offset + text.chars().count());
    self.selection_after = Some(Selection::point(caret.clone()));
    Ok(caret)
  }
}

/// Kind of content mutation recorded by [`EditorState::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
  InsertCharacters,
  InsertToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorState {
  content:          ContentState,
  selection:        Selection,
  last_change:      Option<ChangeType>,
  selection_forced: bool,
  version:          u64,
}

impl EditorState {
  pub fn new(content: ContentState) -> Self {
    let selection = Selection::collapsed(content.first_block_key().clone(), 0);
    Self {
      content,
      selection,
      last_change: None,
      selection_forced: false,
      version: 0,
    }
  }

  pub fn from_text(text: &str) -> Self {
    Self::new(ContentState::from_text(text))
  }

  pub fn content(&self) -> &ContentState {
    &self.content
  }

  pub fn selection(&self) -> &Selection {
    &self.selection
  }

  pub fn last_change(&self) -> Option<ChangeType> {
    self.last_change
  }

  /// True if the current selection was set by [`EditorState::force_selection`]
  /// rather than by the last content change.
  pub fn selection_forced(&self) -> bool {
    self.selection_forced
  }

  /// Number of content mutations pushed so far.
  pub fn version(&self) -> u64 {
    self.version
  }

  /// Block the selection starts in.
  pub fn start_block(&self) -> Result<&ContentBlock> {
    let key = &self.selection.start().block;
    self
      .content
      .block_for_key(key)
      .ok_or_else(|| DocumentError::UnknownBlock(key.clone()))
  }

  /// Block the selection ends in.
  pub fn end_block(&self) -> Result<&ContentBlock> {
    let key = &self.selection.end().block;
    self
      .content
      .block_for_key(key)
      .ok_or_else(|| DocumentError::UnknownBlock(key.clone()))
  }

  /// Selection change coming from the host (mouse, arrow keys).
  pub fn set_selection(&mut self, selection: Selection) {
    self.selection = selection;
    self.selection_forced = false;
  }

  /// Commit new content. The selection follows the content's
  /// `selection_after`.
  pub fn push(&mut self, content: ContentState, change: ChangeType) {
    if let Some(selection) = content.selection_after() {
      self.selection = selection.clone();
    }
    self.content = content;
    self.last_change = Some(change);
    self.selection_forced = false;
    self.version += 1;
  }

  /// Replace the selection without counting as a content mutation.
  pub fn force_selection(&mut self, selection: Selection) {
    self.selection = selection;
    self.selection_forced = true;
  }

  /// Default host insertion: replace the selection with `chars`.
  pub fn insert_characters(&mut self, chars: &str) -> Result<()> {
    let mut content = self.content.clone();
    content.replace_text(&self.selection, chars, None)?;
    self.push(content, ChangeType::InsertCharacters);
    Ok(())
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn tagged(text: &str, range: Range<usize>) -> (ContentState, EntityKey) {
    let mut content = ContentState::new(vec![ContentBlock::new("a", text)]);
    let entity = content.create_entity("@mention", EntityMutability::Immutable, "x");
    content
      .block_for_key_mut(&"a".into())
      .unwrap()
      .set_entity(range, Some(entity))
      .unwrap();
    (content, entity)
  }

  #[test]
  fn test_from_text_splits_lines() {
    let content = ContentState::from_text("one\ntwo");
    assert_eq!(content.blocks().len(), 2);
    assert_eq!(content.blocks()[1].key().as_str(), "b1");
    assert_eq!(content.plain_text(), "one\ntwo");
    assert_eq!(ContentState::new(Vec::new()).blocks().len(), 1);
  }

  #[test]
  fn test_char_at_bounds() {
    let (content, entity) = tagged("ab[cd]", 2..6);
    let block = &content.blocks()[0];
    assert_eq!(block.char_at(1), Some(CharMeta { entity: None }));
    assert_eq!(block.entity_at(2), Some(entity));
    assert_eq!(block.char_at(6), None);
  }

  #[test]
  fn test_set_entity_bad_ranges() {
    let (mut content, entity) = tagged("abc", 0..1);
    let block = content.block_for_key_mut(&"a".into()).unwrap();

    let (start, end) = (3, 1);
    assert_eq!(
      block.set_entity(start..end, Some(entity)),
      Err(DocumentError::ReversedRange {
        block: "a".into(),
        start: 3,
        end:   1,
      })
    );
    assert!(matches!(
      block.set_entity(1..4, Some(entity)),
      Err(DocumentError::OffsetOutOfBounds { offset: 4, len: 3, .. })
    ));
    assert_eq!(block.entity_at(1), None);
  }

  #[test]
  fn test_replace_text_within_block() {
    let (mut content, entity) = tagged("ab[cd]ef", 2..6);
    let key = BlockKey::from("a");
    let caret = content
      .replace_text(&Selection::range(key.clone(), 1, 7), "XY", None)
      .unwrap();

    assert_eq!(caret, Position::new(key.clone(), 3));
    assert_eq!(content.plain_text(), "aXYf");
    let block = content.block_for_key(&key).unwrap();
    assert_eq!(block.len_chars(), 4);
    assert!((0..4).all(|i| block.entity_at(i) != Some(entity)));
    assert_eq!(content.selection_after(), Some(&Selection::collapsed(key, 3)));
  }

  #[test]
  fn test_replace_text_keeps_tags_outside_range() {
    let (mut content, entity) = tagged("[cd] x", 0..4);
    let key = BlockKey::from("a");
    content
      .replace_text(&Selection::collapsed(key.clone(), 5), "yz", None)
      .unwrap();
    let block = content.block_for_key(&key).unwrap();
    assert_eq!(block.text(), "[cd] yzx");
    assert_eq!(block.entity_at(3), Some(entity));
    assert_eq!(block.entity_at(5), None);
  }

  #[test]
  fn test_replace_text_across_blocks() {
    let mut content = ContentState::from_text("hello\nmiddle\nworld");
    let selection = Selection::new(Position::new("b0".into(), 2), Position::new("b2".into(), 3));
    content.replace_text(&selection, "-", None).unwrap();
    assert_eq!(content.plain_text(), "he-ld");
    assert_eq!(content.blocks().len(), 1);
  }

  #[test]
  fn test_replace_text_errors() {
    let mut content = ContentState::from_text("abc");
    assert_eq!(
      content.replace_text(&Selection::collapsed("zz".into(), 0), "x", None),
      Err(DocumentError::UnknownBlock("zz".into()))
    );
    assert!(matches!(
      content.replace_text(&Selection::collapsed("b0".into(), 9), "x", None),
      Err(DocumentError::OffsetOutOfBounds { offset: 9, len: 3, .. })
    ));
    let bogus = EntityKey::new(NonZeroUsize::new(4).unwrap());
    assert_eq!(
      content.replace_text(&Selection::collapsed("b0".into(), 0), "x", Some(bogus)),
      Err(DocumentError::UnknownEntity(bogus))
    );
  }

  #[test]
  fn test_entity_ranges() {
    let mut content = ContentState::new(vec![ContentBlock::new("a", "[x] and [y] z")]);
    let first = content.create_entity("@mention", EntityMutability::Immutable, "x");
    let second = content.create_entity("link", EntityMutability::Mutable, "y");
    let block = content.block_for_key_mut(&"a".into()).unwrap();
    block.set_entity(0..3, Some(first)).unwrap();
    block.set_entity(8..11, Some(second)).unwrap();

    let block = content.block_for_key(&"a".into()).unwrap();
    let mut all = Vec::new();
    entity_ranges(block, |_| true, |start, end| all.push((start, end)));
    assert_eq!(all, vec![(0, 3), (8, 11)]);

    let mut mentions = Vec::new();
    entity_ranges(
      block,
      |key| content.entity(key).is_some_and(|e| e.kind.as_str() == "@mention"),
      |start, end| mentions.push((start, end)),
    );
    assert_eq!(mentions, vec![(0, 3)]);
  }

  #[test]
  fn test_push_and_force_selection() {
    let mut state = EditorState::from_text("ab");
    let key = state.content().first_block_key().clone();
    state.set_selection(Selection::collapsed(key.clone(), 2));
    state.insert_characters("c").unwrap();

    assert_eq!(state.content().plain_text(), "abc");
    assert_eq!(state.selection(), &Selection::collapsed(key.clone(), 3));
    assert_eq!(state.last_change(), Some(ChangeType::InsertCharacters));
    assert_eq!(state.version(), 1);
    assert!(!state.selection_forced());

    state.force_selection(Selection::collapsed(key, 1));
    assert!(state.selection_forced());
    assert_eq!(state.version(), 1);
  }
}
