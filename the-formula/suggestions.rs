//! Ranking autocomplete candidates against the formula being typed.
//!
//! Matching is fuzzy and powered by [`nucleo`], with smart case: a lowercase
//! search matches case-insensitively, a search containing uppercase letters
//! is case-sensitive. Everything runs on the current thread, which is fine
//! for the handful of names a formula overlay shows.
//!
//! ```
//! use the_formula::suggestions::filter;
//!
//! let names = ["revenue", "cost", "net_revenue"];
//! let ranked = filter("rev", names, 5);
//! assert_eq!(ranked.len(), 2);
//! assert!(!ranked.contains(&"cost"));
//! ```

use std::cell::RefCell;

use nucleo::{
  Config,
  Matcher,
  pattern::{
    Atom,
    AtomKind,
    CaseMatching,
    Normalization,
  },
};

thread_local! {
  static MATCHER: RefCell<Matcher> = RefCell::new(Matcher::new(Config::DEFAULT));
}

/// Keep at most `limit` suggestions matching `search`, best match first.
///
/// An empty search keeps the suggestions in their original order.
pub fn filter<T: AsRef<str>>(
  search: &str,
  suggestions: impl IntoIterator<Item = T>,
  limit: usize,
) -> Vec<T> {
  MATCHER.with(|matcher| filter_with(&mut matcher.borrow_mut(), search, suggestions, limit))
}

/// [`filter`] with a caller-provided matcher.
pub fn filter_with<T: AsRef<str>>(
  matcher: &mut Matcher,
  search: &str,
  suggestions: impl IntoIterator<Item = T>,
  limit: usize,
) -> Vec<T> {
  let search = search.trim();
  if search.is_empty() {
    return suggestions.into_iter().take(limit).collect();
  }

  let pattern = Atom::new(
    search,
    CaseMatching::Smart,
    Normalization::Smart,
    AtomKind::Fuzzy,
    false,
  );
  let mut ranked = pattern.match_list(suggestions, matcher);
  ranked.truncate(limit);
  ranked.into_iter().map(|(item, _)| item).collect()
}
