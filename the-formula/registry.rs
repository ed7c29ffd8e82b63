//! Live autocomplete searches and where to draw them.
//!
//! Every formula span the host decorates gets an overlay, and every mounted
//! overlay registers itself here under a stable [`SearchId`] supplied by the
//! host's decoration mechanism. The rendering layer then stores a position
//! resolver for it and asks the registry where to draw.
//!
//! The registry also remembers the single search the user dismissed last (the
//! "escaped" search) so its overlay stays hidden until another search is
//! escaped or the marker is reset.
//!
//! # Snapshots
//!
//! Mutations never touch the live map in place. Each one builds a new map and
//! swaps it in atomically, so a resolver call racing a keystroke either sees
//! the map from before the update or the one after, never a half-updated one.
//!
//! ```
//! use the_formula::registry::{Rect, SearchId, SearchRegistry};
//!
//! let registry = SearchRegistry::new();
//! let id = SearchId::from("b0-1-0");
//!
//! registry.register(&id);
//! registry.update_position_resolver(&id, || Rect::new(10.0, 20.0, 0.0, 16.0));
//! assert_eq!(registry.resolve_position(&id).unwrap().y, 20.0);
//!
//! let before = registry.snapshot();
//! registry.unregister(&id);
//! assert!(before.contains(&id));
//! assert!(registry.resolve_position(&id).is_err());
//! ```

use std::{
  collections::{
    HashMap,
    HashSet,
  },
  fmt,
  sync::Arc,
};

use arc_swap::{
  ArcSwap,
  ArcSwapOption,
};
use thiserror::Error;

use crate::{
  Tendril,
  document::BlockKey,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistryError {
  #[error("search {0} is not registered")]
  Lookup(SearchId),
  #[error("search {0} has no position resolver")]
  MissingResolver(SearchId),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Opaque identifier of one rendered autocomplete overlay.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SearchId(Tendril);

impl SearchId {
  pub fn new(id: impl Into<Tendril>) -> Self {
    Self(id.into())
  }

  /// Host-style offset key: `<block>-<decorator>-<leaf>`.
  pub fn from_parts(block: &BlockKey, decorator: usize, leaf: usize) -> Self {
    Self::new(format!("{block}-{decorator}-{leaf}"))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for SearchId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for SearchId {
  fn from(value: &str) -> Self {
    Self::new(value)
  }
}

/// On-screen rectangle an overlay is anchored to.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Rect {
  pub x:      f32,
  pub y:      f32,
  pub width:  f32,
  pub height: f32,
}

impl Rect {
  pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }
}

pub type PositionResolver = Arc<dyn Fn() -> Rect + Send + Sync>;

#[derive(Clone, Default)]
struct SearchRecord {
  resolver: Option<PositionResolver>,
}

type Searches = HashMap<SearchId, SearchRecord>;

/// Read-only view of the registry at one point in time.
#[derive(Clone)]
pub struct Snapshot(Arc<Searches>);

impl Snapshot {
  pub fn contains(&self, id: &SearchId) -> bool {
    self.0.contains_key(id)
  }

  pub fn ids(&self) -> impl Iterator<Item = &SearchId> {
    self.0.keys()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl fmt::Debug for Snapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set().entries(self.ids()).finish()
  }
}

/// Registry of live searches, owned by one plugin instance.
pub struct SearchRegistry {
  searches: ArcSwap<Searches>,
  escaped:  ArcSwapOption<SearchId>,
}

impl SearchRegistry {
  pub fn new() -> Self {
    Self {
      searches: ArcSwap::from_pointee(Searches::new()),
      escaped:  ArcSwapOption::empty(),
    }
  }

  /// Apply `update` to a copy of the current map and swap the copy in.
  fn update<F>(&self, mut update: F)
  where
    F: FnMut(&mut Searches),
  {
    self.searches.rcu(|current| {
      let mut next = Searches::clone(current);
      update(&mut next);
      next
    });
  }

  /// Mark `id` as live. Registering twice keeps the existing resolver.
  pub fn register(&self, id: &SearchId) {
    if self.is_registered(id) {
      return;
    }
    tracing::debug!(%id, "registering search");
    self.update(|searches| {
      searches.entry(id.clone()).or_default();
    });
  }

  /// Store the position resolver of `id`, replacing any previous one.
  ///
  /// Calling this before [`SearchRegistry::register`] registers `id`.
  pub fn update_position_resolver<F>(&self, id: &SearchId, resolver: F)
  where
    F: Fn() -> Rect + Send + Sync + 'static,
  {
    let resolver: PositionResolver = Arc::new(resolver);
    if !self.is_registered(id) {
      tracing::debug!(%id, "position resolver set before registration");
    }
    self.update(|searches| {
      searches.entry(id.clone()).or_default().resolver = Some(Arc::clone(&resolver));
    });
  }

  /// Forget `id` and its resolver.
  pub fn unregister(&self, id: &SearchId) {
    if !self.is_registered(id) {
      return;
    }
    tracing::debug!(%id, "unregistering search");
    self.update(|searches| {
      searches.remove(id);
    });
  }

  pub fn is_registered(&self, id: &SearchId) -> bool {
    self.searches.load().contains_key(id)
  }

  /// Ask the rendering layer where the overlay of `id` should go.
  ///
  /// Fails for ids that were never registered (or have been unregistered) and
  /// for ids without a resolver. Callers are expected to check first.
  pub fn resolve_position(&self, id: &SearchId) -> Result<Rect> {
    let resolver = {
      let searches = self.searches.load();
      let Some(record) = searches.get(id) else {
        tracing::warn!(%id, "position requested for unregistered search");
        return Err(RegistryError::Lookup(id.clone()));
      };
      record
        .resolver
        .clone()
        .ok_or_else(|| RegistryError::MissingResolver(id.clone()))?
    };
    // The guard is released before calling out, so a resolver may touch the
    // registry itself.
    Ok(resolver())
  }

  pub fn snapshot(&self) -> Snapshot {
    Snapshot(self.searches.load_full())
  }

  /// Ids of every registered search.
  pub fn list_all(&self) -> HashSet<SearchId> {
    self.searches.load().keys().cloned().collect()
  }

  pub fn len(&self) -> usize {
    self.searches.load().len()
  }

  pub fn is_empty(&self) -> bool {
    self.searches.load().is_empty()
  }

  /// Dismiss `id`. Any previously escaped search is implicitly restored.
  pub fn escape(&self, id: &SearchId) {
    tracing::debug!(%id, "escaping search");
    self.escaped.store(Some(Arc::new(id.clone())));
  }

  pub fn is_escaped(&self, id: &SearchId) -> bool {
    self.escaped.load().as_deref() == Some(id)
  }

  pub fn escaped(&self) -> Option<SearchId> {
    self.escaped.load_full().map(|id| SearchId::clone(&id))
  }

  pub fn reset_escape(&self) {
    self.escaped.store(None);
  }

  /// Drop every search and the escaped marker.
  pub fn clear(&self) {
    self.searches.store(Arc::new(Searches::new()));
    self.escaped.store(None);
  }
}

impl Default for SearchRegistry {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for SearchRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SearchRegistry")
      .field("searches", &self.snapshot())
      .field("escaped", &self.escaped())
      .finish()
  }
}
