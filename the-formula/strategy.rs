//! Decorator strategies: where the host should draw decorations.
//!
//! The host calls a strategy whenever a block needs to be re-scanned and
//! mounts one decoration per reported range. Two strategies exist:
//!
//! - [`TokenStrategy`] reports committed tokens (entity runs of the token
//!   kind) so they can be styled.
//! - [`SuggestionsStrategy`] reports every formula span in the text so an
//!   autocomplete overlay can be mounted over it.
//!
//! Both report ranges left to right, and reporting is deterministic: the same
//! block always produces the same calls.

use crate::{
  document::{
    Block,
    ContentState,
    entity_ranges,
  },
  registry::SearchId,
  span::{
    DelimiterPattern,
    Span,
    scan,
  },
};

/// Report every formula span of `block` as `(start, end)`.
pub fn dispatch<B, F>(block: &B, pattern: &DelimiterPattern, mut report: F)
where
  B: Block + ?Sized,
  F: FnMut(usize, usize),
{
  for span in scan(&block.text(), pattern) {
    report(span.start, span.end);
  }
}

#[derive(Debug, Clone)]
pub struct SuggestionsStrategy {
  pattern: DelimiterPattern,
}

impl SuggestionsStrategy {
  pub fn new(pattern: DelimiterPattern) -> Self {
    Self { pattern }
  }

  pub fn find<B, F>(&self, block: &B, report: F)
  where
    B: Block + ?Sized,
    F: FnMut(usize, usize),
  {
    dispatch(block, &self.pattern, report);
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStrategy {
  kind: String,
}

impl TokenStrategy {
  pub fn new(kind: impl Into<String>) -> Self {
    Self { kind: kind.into() }
  }

  pub fn kind(&self) -> &str {
    &self.kind
  }

  pub fn find<B, F>(&self, block: &B, content: &ContentState, report: F)
  where
    B: Block + ?Sized,
    F: FnMut(usize, usize),
  {
    entity_ranges(
      block,
      |key| content.entity(key).is_some_and(|entity| entity.kind.as_str() == self.kind),
      report,
    );
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoratorKind {
  Token,
  Suggestions,
}

#[derive(Debug, Clone)]
pub enum Decorator {
  Token(TokenStrategy),
  Suggestions(SuggestionsStrategy),
}

impl Decorator {
  pub fn kind(&self) -> DecoratorKind {
    match self {
      Self::Token(_) => DecoratorKind::Token,
      Self::Suggestions(_) => DecoratorKind::Suggestions,
    }
  }

  pub fn find<B, F>(&self, block: &B, content: &ContentState, report: F)
  where
    B: Block + ?Sized,
    F: FnMut(usize, usize),
  {
    match self {
      Self::Token(strategy) => strategy.find(block, content, report),
      Self::Suggestions(strategy) => strategy.find(block, report),
    }
  }
}

/// One decoration the host should mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
  pub kind: DecoratorKind,
  pub span: Span,
  /// Stable key of the decoration: block, decorator index and the index of
  /// the range among that decorator's ranges in the block.
  pub id:   SearchId,
}

/// Run every decorator over `block`, in decorator order.
pub fn decorate<B: Block + ?Sized>(
  decorators: &[Decorator],
  block: &B,
  content: &ContentState,
) -> Vec<Decoration> {
  let mut decorations = Vec::new();
  for (index, decorator) in decorators.iter().enumerate() {
    let mut leaf = 0;
    decorator.find(block, content, |start, end| {
      decorations.push(Decoration {
        kind: decorator.kind(),
        span: Span::new(start, end),
        id:   SearchId::from_parts(block.key(), index, leaf),
      });
      leaf += 1;
    });
  }
  decorations
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    document::{
      BlockKey,
      ContentBlock,
      EntityMutability,
    },
    span::DEFAULT_PATTERN,
  };

  fn collect<B: Block>(block: &B) -> Vec<(usize, usize)> {
    let mut calls = Vec::new();
    dispatch(block, &DelimiterPattern::new(DEFAULT_PATTERN).unwrap(), |start, end| {
      calls.push((start, end))
    });
    calls
  }

  #[test]
  fn test_dispatch_reports_in_order() {
    let block = ContentBlock::new("a", "a [x] b [y] c");
    assert_eq!(collect(&block), vec![(2, 5), (8, 11)]);
  }

  #[test]
  fn test_dispatch_is_repeatable() {
    let block = ContentBlock::new("a", "[one] [two] [three]");
    assert_eq!(collect(&block), collect(&block));
    assert_eq!(collect(&block).len(), 3);
  }

  #[test]
  fn test_dispatch_without_spans() {
    assert!(collect(&ContentBlock::new("a", "")).is_empty());
    assert!(collect(&ContentBlock::new("a", "plain text")).is_empty());
  }

  #[test]
  fn test_decorate_both_strategies() {
    let key = BlockKey::from("k");
    let mut content = ContentState::new(vec![ContentBlock::new(key.clone(), "[rev] - [co")]);
    let token = content.create_entity("@mention", EntityMutability::Immutable, "rev");
    let other = content.create_entity("link", EntityMutability::Mutable, "");
    let block = content.block_for_key_mut(&key).unwrap();
    block.set_entity(0..5, Some(token)).unwrap();
    block.set_entity(8..11, Some(other)).unwrap();

    let decorators = [
      Decorator::Token(TokenStrategy::new("@mention")),
      Decorator::Suggestions(SuggestionsStrategy::new(DelimiterPattern::new(DEFAULT_PATTERN).unwrap())),
    ];
    let block = content.block_for_key(&key).unwrap();
    let decorations = decorate(&decorators, block, &content);

    assert_eq!(
      decorations,
      vec![
        Decoration {
          kind: DecoratorKind::Token,
          span: Span::new(0, 5),
          id:   SearchId::from("k-0-0"),
        },
        Decoration {
          kind: DecoratorKind::Suggestions,
          span: Span::new(0, 5),
          id:   SearchId::from("k-1-0"),
        },
      ]
    );
  }
}
