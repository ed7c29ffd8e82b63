//! Formula span detection.
//!
//! A formula span is a run of block text delimited by a bracket pair, `[...]`
//! by default. Spans are found with a [`DelimiterPattern`] and reported as
//! half-open char ranges, the same unit the rest of the crate uses for
//! offsets.
//!
//! # Examples
//!
//! ```
//! use the_formula::span::{DEFAULT_PATTERN, DelimiterPattern, Span, scan};
//!
//! let pattern = DelimiterPattern::new(DEFAULT_PATTERN)?;
//! let spans = scan("a [x] b [y] c", &pattern);
//!
//! assert_eq!(spans.as_slice(), &[Span::new(2, 5), Span::new(8, 11)]);
//! # Ok::<(), regex::Error>(())
//! ```
//!
//! # Design Notes
//!
//! - Matches never overlap: scanning resumes after the end of each match.
//! - Empty matches are dropped, so every span satisfies `start < end`.
//! - Scanning is pure. The same text always yields the same spans.

use regex::Regex;
use smallvec::SmallVec;

pub const DEFAULT_PATTERN: &str = r"\[(.*?)\]";

/// Spans of a single block, in left-to-right order.
pub type Spans = SmallVec<[Span; 4]>;

/// Half-open char range `[start, end)` covering one delimited formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
  pub start: usize,
  pub end:   usize,
}

impl Span {
  pub const fn new(start: usize, end: usize) -> Self {
    Self { start, end }
  }

  pub const fn len(&self) -> usize {
    self.end - self.start
  }

  pub const fn is_empty(&self) -> bool {
    self.start == self.end
  }

  /// True if `offset` lies strictly between the delimiters, i.e. a caret
  /// placed there sits inside the formula.
  pub const fn surrounds(&self, offset: usize) -> bool {
    self.start < offset && offset < self.end
  }

  /// Range of the text between the delimiters.
  pub fn inner(&self) -> std::ops::Range<usize> {
    let start = (self.start + 1).min(self.end);
    let end = self.end.saturating_sub(1).max(start);
    start..end
  }
}

/// Compiled bracket pattern used to find formula spans.
#[derive(Debug, Clone)]
pub struct DelimiterPattern {
  regex: Regex,
}

impl DelimiterPattern {
  pub fn new(pattern: &str) -> Result<Self, regex::Error> {
    Ok(Self {
      regex: Regex::new(pattern)?,
    })
  }

  pub fn as_str(&self) -> &str {
    self.regex.as_str()
  }
}

/// Find every formula span in `text`.
pub fn scan(text: &str, pattern: &DelimiterPattern) -> Spans {
  let mut spans = Spans::new();
  // regex reports byte offsets; carry the char count forward so each match
  // only counts the text since the previous one.
  let mut char_pos = 0;
  let mut byte_pos = 0;

  for mat in pattern.regex.find_iter(text) {
    if mat.is_empty() {
      continue;
    }

    let start = char_pos + text[byte_pos..mat.start()].chars().count();
    let end = start + mat.as_str().chars().count();
    spans.push(Span::new(start, end));

    char_pos = end;
    byte_pos = mat.end();
  }

  spans
}

/// The span whose interior contains `offset`, if any.
pub fn span_surrounding(spans: &[Span], offset: usize) -> Option<Span> {
  spans.iter().copied().find(|span| span.surrounds(offset))
}

/// The formula the caret is currently typing into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchText {
  pub span:  Span,
  /// Text between the delimiters.
  pub value: String,
}

impl SearchText {
  pub fn begin(&self) -> usize {
    self.span.start
  }

  pub fn end(&self) -> usize {
    self.span.end
  }
}

/// Resolve the search value for a caret at `caret`.
///
/// A span whose interior holds the caret wins. Otherwise the caret must sit
/// in `start + 1..=end + 1`: right after the opening bracket up to one char
/// past the closing bracket, so text typed just after a formula still
/// searches it.
pub fn search_text(text: &str, caret: usize, pattern: &DelimiterPattern) -> Option<SearchText> {
  let pos = caret.checked_sub(1)?;
  let spans = scan(text, pattern);
  let span = span_surrounding(&spans, caret).or_else(|| {
    spans
      .iter()
      .copied()
      .find(|span| span.start <= pos && pos <= span.end)
  })?;

  let inner = span.inner();
  let value = text
    .chars()
    .skip(inner.start)
    .take(inner.end - inner.start)
    .collect();

  Some(SearchText { span, value })
}
