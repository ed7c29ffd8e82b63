//! Formula span handling for block-structured rich-text editors.
//!
//! Text between a bracket pair (`[...]`) is a formula span. This crate finds
//! those spans, keeps the caret from landing inside committed formula tokens,
//! closes brackets as they are typed, and tracks the autocomplete overlays
//! the host renders over each span.
//!
//! The host editor is a collaborator: it is consumed through the
//! [`document::Block`] trait, with [`document`] providing an in-memory model
//! that the rest of the crate and its tests run against.

use smartstring::{
  LazyCompact,
  SmartString,
};

pub mod auto_bracket;
pub mod config;
pub mod document;
pub mod hooks;
pub mod input;
pub mod plugin;
pub mod registry;
pub mod selection;
pub mod span;
pub mod strategy;
pub mod suggestions;
pub mod token;

pub type Tendril = SmartString<LazyCompact>;

pub use config::FormulaConfig;
pub use plugin::FormulaPlugin;
pub use registry::SearchRegistry;
pub use span::Span;
