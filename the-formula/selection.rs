//! Selections over block content and entity-run snapping.
//!
//! A [`Selection`] has an `anchor` (where it started) and a `focus` (where the
//! caret is). Both are [`Position`]s: a block key plus a char offset. When
//! anchor and focus coincide the selection is collapsed, i.e. a plain caret.
//!
//! ```text
//! anchor=2, focus=7: "he[llo w]orld"  (forward)
//! anchor=7, focus=2: "he]llo w[orld"  (backward)
//! anchor=5, focus=5: "hello|world"    (collapsed)
//! ```
//!
//! # Snapping
//!
//! Committed formula tokens are entity runs, and must behave like a single
//! glyph: the caret may sit before or after one, never inside it. [`extend`]
//! widens a selection so that it never cuts an entity run:
//!
//! - A collapsed caret with the same entity on both sides selects the whole
//!   run.
//! - A ranged selection grows each boundary outward to the edge of the run
//!   it cuts through.
//!
//! Walking never crosses block boundaries. Anything else is returned
//! unchanged.

use crate::document::{
  Block,
  BlockKey,
  EntityKey,
};

/// A caret position: block key plus char offset within that block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
  pub block:  BlockKey,
  pub offset: usize,
}

impl Position {
  pub fn new(block: BlockKey, offset: usize) -> Self {
    Self { block, offset }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
  anchor:   Position,
  focus:    Position,
  backward: bool,
}

impl Selection {
  /// Selection from `anchor` to `focus`. Within one block the direction is
  /// derived from the offsets; across blocks it is forward unless
  /// [`Selection::with_backward`] says otherwise.
  pub fn new(anchor: Position, focus: Position) -> Self {
    let backward = anchor.block == focus.block && focus.offset < anchor.offset;
    Self {
      anchor,
      focus,
      backward,
    }
  }

  pub fn point(position: Position) -> Self {
    Self::new(position.clone(), position)
  }

  pub fn collapsed(block: BlockKey, offset: usize) -> Self {
    Self::point(Position::new(block, offset))
  }

  /// Selection inside a single block, anchored at `anchor`.
  pub fn range(block: BlockKey, anchor: usize, focus: usize) -> Self {
    Self::new(Position::new(block.clone(), anchor), Position::new(block, focus))
  }

  #[must_use]
  pub fn with_backward(mut self, backward: bool) -> Self {
    self.backward = backward;
    self
  }

  pub fn anchor(&self) -> &Position {
    &self.anchor
  }

  pub fn focus(&self) -> &Position {
    &self.focus
  }

  pub fn is_backward(&self) -> bool {
    self.backward
  }

  pub fn is_collapsed(&self) -> bool {
    self.anchor == self.focus
  }

  pub fn is_single_block(&self) -> bool {
    self.anchor.block == self.focus.block
  }

  /// The boundary that comes first in the document.
  pub fn start(&self) -> &Position {
    if self.is_single_block() {
      if self.focus.offset < self.anchor.offset {
        &self.focus
      } else {
        &self.anchor
      }
    } else if self.backward {
      &self.focus
    } else {
      &self.anchor
    }
  }

  /// The boundary that comes last in the document.
  pub fn end(&self) -> &Position {
    if self.is_single_block() {
      if self.focus.offset < self.anchor.offset {
        &self.anchor
      } else {
        &self.focus
      }
    } else if self.backward {
      &self.anchor
    } else {
      &self.focus
    }
  }

  /// Rebuild a selection over `start..end` keeping this one's direction.
  fn with_bounds(&self, start: Position, end: Position) -> Self {
    if self.backward {
      Self::new(end, start).with_backward(true)
    } else {
      Self::new(start, end)
    }
  }
}

/// First offset of the run of `entity` that contains `offset`.
fn run_start<B: Block + ?Sized>(block: &B, mut offset: usize, entity: EntityKey) -> usize {
  while offset > 0 && block.entity_at(offset - 1) == Some(entity) {
    offset -= 1;
  }
  offset
}

/// First offset at or after `offset` that is not tagged with `entity`.
fn run_end<B: Block + ?Sized>(block: &B, mut offset: usize, entity: EntityKey) -> usize {
  // `entity_at` is `None` past the end of the block, which ends the walk.
  while block.entity_at(offset) == Some(entity) {
    offset += 1;
  }
  offset
}

/// Snap `selection` to the entity runs of `block`.
///
/// `block` must be the block the selection starts in. A ranged selection that
/// ends in another block only has its start boundary extended; use
/// [`extend_across`] to extend both.
pub fn extend<B: Block + ?Sized>(selection: &Selection, block: &B) -> Selection {
  let end = selection.end();
  if &end.block == block.key() {
    extend_across(selection, block, block)
  } else {
    extend_bounds(selection, block, None)
  }
}

/// Snap `selection` given the blocks holding its start and end boundaries.
pub fn extend_across<B: Block + ?Sized>(
  selection: &Selection,
  start_block: &B,
  end_block: &B,
) -> Selection {
  if selection.is_collapsed() {
    return extend_caret(selection, start_block);
  }
  extend_bounds(selection, start_block, Some(end_block))
}

fn extend_caret<B: Block + ?Sized>(selection: &Selection, block: &B) -> Selection {
  let caret = selection.focus();
  let Some(prev_offset) = caret.offset.checked_sub(1) else {
    return selection.clone();
  };
  let (Some(prev), Some(next)) = (block.char_at(prev_offset), block.char_at(caret.offset)) else {
    return selection.clone();
  };
  let Some(entity) = prev.entity.filter(|_| prev.entity == next.entity) else {
    return selection.clone();
  };

  let start = run_start(block, prev_offset, entity);
  let end = run_end(block, caret.offset, entity);
  tracing::trace!(
    block = %caret.block,
    caret = caret.offset,
    start,
    end,
    "caret inside entity run, selecting it"
  );

  Selection::range(caret.block.clone(), start, end)
}

fn extend_bounds<B: Block + ?Sized>(
  selection: &Selection,
  start_block: &B,
  end_block: Option<&B>,
) -> Selection {
  let start = selection.start();
  let end = selection.end();

  // The first selected char decides the start run.
  let start_offset = match start_block.entity_at(start.offset) {
    Some(entity) => run_start(start_block, start.offset, entity),
    None => start.offset,
  };

  // The last selected char decides the end run, so a selection ending right
  // where a run begins is left alone.
  let end_offset = end_block
    .zip(end.offset.checked_sub(1))
    .and_then(|(block, last)| block.entity_at(last).map(|entity| run_end(block, end.offset, entity)))
    .unwrap_or(end.offset);

  if start_offset == start.offset && end_offset == end.offset {
    return selection.clone();
  }

  tracing::trace!(
    from = ?(start.offset, end.offset),
    to = ?(start_offset, end_offset),
    "extended selection to entity run boundaries"
  );

  selection.with_bounds(
    Position::new(start.block.clone(), start_offset),
    Position::new(end.block.clone(), end_offset),
  )
}

#[cfg(test)]
mod test {
  use std::ops::Range;

  use super::*;
  use crate::document::{
    ContentBlock,
    ContentState,
    EntityMutability,
  };

  fn key() -> BlockKey {
    BlockKey::from("a")
  }

  /// Block "ab[cde]fg[hi]" style content with each range tagged by its own
  /// entity.
  fn block(text: &str, runs: &[Range<usize>]) -> ContentBlock {
    let mut content = ContentState::new(vec![ContentBlock::new(key(), text)]);
    let entities: Vec<_> = runs
      .iter()
      .map(|_| content.create_entity("@mention", EntityMutability::Immutable, ""))
      .collect();
    let block = content.block_for_key_mut(&key()).unwrap();
    for (run, entity) in runs.iter().zip(entities) {
      block.set_entity(run.clone(), Some(entity)).unwrap();
    }
    block.clone()
  }

  #[test]
  fn test_start_end_ordering() {
    let forward = Selection::range(key(), 2, 7);
    assert_eq!(forward.start().offset, 2);
    assert_eq!(forward.end().offset, 7);
    assert!(!forward.is_backward());

    let backward = Selection::range(key(), 7, 2);
    assert_eq!(backward.start().offset, 2);
    assert_eq!(backward.end().offset, 7);
    assert!(backward.is_backward());

    let across = Selection::new(Position::new("b1".into(), 4), Position::new("b0".into(), 1))
      .with_backward(true);
    assert_eq!(across.start().block.as_str(), "b0");
    assert_eq!(across.end().block.as_str(), "b1");
  }

  #[test]
  fn test_caret_inside_run_selects_it() {
    let block = block("abc[xy]ef", &[3..7]);
    let extended = extend(&Selection::collapsed(key(), 5), &block);
    assert_eq!(extended, Selection::range(key(), 3, 7));
  }

  #[test]
  fn test_caret_without_entity_is_unchanged() {
    let block = block("abc[xy]ef", &[3..7]);
    for offset in [1, 2, 8] {
      let caret = Selection::collapsed(key(), offset);
      assert_eq!(extend(&caret, &block), caret);
    }
  }

  #[test]
  fn test_caret_on_run_edge_is_unchanged() {
    let block = block("abc[xy]ef", &[3..7]);
    // Before the opening bracket and after the closing one.
    for offset in [3, 7] {
      let caret = Selection::collapsed(key(), offset);
      assert_eq!(extend(&caret, &block), caret);
    }
  }

  #[test]
  fn test_caret_at_block_edges_is_unchanged() {
    let block = block("[xy]", &[0..4]);
    for offset in [0, 4] {
      let caret = Selection::collapsed(key(), offset);
      assert_eq!(extend(&caret, &block), caret);
    }
  }

  #[test]
  fn test_caret_between_adjacent_runs_is_unchanged() {
    let block = block("[a][b]", &[0..3, 3..6]);
    let caret = Selection::collapsed(key(), 3);
    assert_eq!(extend(&caret, &block), caret);
    assert_eq!(
      extend(&Selection::collapsed(key(), 4), &block),
      Selection::range(key(), 3, 6)
    );
  }

  #[test]
  fn test_range_extends_both_boundaries() {
    let block = block("[ab] x [cd]", &[0..4, 7..11]);
    let extended = extend(&Selection::range(key(), 2, 9), &block);
    assert_eq!(extended, Selection::range(key(), 0, 11));
  }

  #[test]
  fn test_range_untagged_boundaries_unchanged() {
    let block = block("xx [ab] yy", &[3..7]);
    let selection = Selection::range(key(), 1, 9);
    assert_eq!(extend(&selection, &block), selection);
  }

  #[test]
  fn test_range_stops_at_run_boundary() {
    let block = block("xx[ab]yy", &[2..6]);
    // Ends right where the run begins: the run is not part of the selection.
    let selection = Selection::range(key(), 0, 2);
    assert_eq!(extend(&selection, &block), selection);
    // Ends inside the run: grow to its end, not one past it.
    assert_eq!(
      extend(&Selection::range(key(), 0, 4), &block),
      Selection::range(key(), 0, 6)
    );
    // Starts inside the run.
    assert_eq!(
      extend(&Selection::range(key(), 3, 8), &block),
      Selection::range(key(), 2, 8)
    );
  }

  #[test]
  fn test_range_keeps_direction() {
    let block = block("xx[ab]yy", &[2..6]);
    let extended = extend(&Selection::range(key(), 7, 4), &block);
    assert_eq!(extended, Selection::range(key(), 7, 2));
    assert!(extended.is_backward());
  }

  #[test]
  fn test_range_across_blocks() {
    let first = {
      let mut content = ContentState::new(vec![ContentBlock::new("a", "x[ab]")]);
      let entity = content.create_entity("@mention", EntityMutability::Immutable, "");
      let block = content.block_for_key_mut(&"a".into()).unwrap();
      block.set_entity(1..5, Some(entity)).unwrap();
      block.clone()
    };
    let second = {
      let mut content = ContentState::new(vec![ContentBlock::new("b", "[cd]y")]);
      let entity = content.create_entity("@mention", EntityMutability::Immutable, "");
      let block = content.block_for_key_mut(&"b".into()).unwrap();
      block.set_entity(0..4, Some(entity)).unwrap();
      block.clone()
    };

    let selection = Selection::new(Position::new("a".into(), 3), Position::new("b".into(), 2));
    let extended = extend_across(&selection, &first, &second);
    assert_eq!(
      extended,
      Selection::new(Position::new("a".into(), 1), Position::new("b".into(), 4))
    );

    // Only the start block is known: the end boundary stays put.
    assert_eq!(
      extend(&selection, &first),
      Selection::new(Position::new("a".into(), 1), Position::new("b".into(), 2))
    );
  }
}
