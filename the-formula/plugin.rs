//! The editor plugin tying the formula machinery together.
//!
//! A host editor creates one [`FormulaPlugin`] per editor instance and calls
//! into it from its event chain, in this order for every keystroke:
//!
//! 1. [`FormulaPlugin::handle_before_input`] before the typed text is
//!    inserted. A `Handled` result means the host must skip its own insertion.
//! 2. [`FormulaPlugin::on_change`] with every accepted state, before it
//!    becomes visible.
//! 3. [`FormulaPlugin::decorators`] whenever blocks are re-decorated.
//!
//! The plugin owns a [`SearchRegistry`] and hands out shared handles to it
//! through [`FormulaPlugin::registry`]. The registry lives as long as the
//! plugin: dropping the plugin clears it.

use std::sync::Arc;

use thiserror::Error;

use crate::{
  Tendril,
  auto_bracket,
  config::{
    ConfigError,
    FormulaConfig,
  },
  document::{
    Block,
    ContentState,
    DocumentError,
    EditorState,
    EntityKey,
  },
  hooks::{
    Callbacks,
    Hook,
  },
  input::{
    HandleResult,
    KeyEvent,
  },
  registry::{
    RegistryError,
    SearchRegistry,
  },
  selection::extend_across,
  span::{
    DelimiterPattern,
    SearchText,
    search_text,
  },
  strategy::{
    Decoration,
    Decorator,
    SuggestionsStrategy,
    TokenStrategy,
    decorate,
  },
  suggestions,
  token,
};

#[derive(Debug, Error)]
pub enum PluginError {
  #[error(transparent)]
  Config(#[from] ConfigError),
  #[error(transparent)]
  Document(#[from] DocumentError),
  #[error(transparent)]
  Registry(#[from] RegistryError),
}

pub type Result<T> = std::result::Result<T, PluginError>;

/// ARIA state the suggestions overlay updates while it is open.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AriaState {
  pub has_popup:            bool,
  pub expanded:             bool,
  pub owns_id:              Option<String>,
  pub active_descendant_id: Option<String>,
}

/// Accessibility attributes for the editor element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessibilityProps {
  pub role:                 &'static str,
  pub aria_autocomplete:    &'static str,
  pub aria_has_popup:       bool,
  pub aria_expanded:        bool,
  pub aria_owns_id:         Option<String>,
  pub aria_active_descendant_id: Option<String>,
}

#[derive(Debug)]
pub struct FormulaPlugin {
  config:    FormulaConfig,
  pattern:   DelimiterPattern,
  registry:  Arc<SearchRegistry>,
  callbacks: Callbacks,
  aria:      AriaState,
}

impl FormulaPlugin {
  pub fn new(config: FormulaConfig) -> Result<Self> {
    config.validate()?;
    let pattern = config.compile_pattern()?;
    tracing::debug!(pattern = pattern.as_str(), trigger = %config.trigger, "formula plugin created");
    Ok(Self {
      config,
      pattern,
      registry: Arc::new(SearchRegistry::new()),
      callbacks: Callbacks::default(),
      aria: AriaState::default(),
    })
  }

  pub fn config(&self) -> &FormulaConfig {
    &self.config
  }

  pub fn pattern(&self) -> &DelimiterPattern {
    &self.pattern
  }

  /// Shared handle to this plugin's search registry.
  pub fn registry(&self) -> Arc<SearchRegistry> {
    Arc::clone(&self.registry)
  }

  pub fn callbacks_mut(&mut self) -> &mut Callbacks {
    &mut self.callbacks
  }

  pub fn aria_mut(&mut self) -> &mut AriaState {
    &mut self.aria
  }

  pub fn accessibility_props(&self) -> AccessibilityProps {
    AccessibilityProps {
      role:                      "combobox",
      aria_autocomplete:         "list",
      aria_has_popup:            self.aria.has_popup,
      aria_expanded:             self.aria.expanded,
      aria_owns_id:              self.aria.owns_id.clone(),
      aria_active_descendant_id: self.aria.active_descendant_id.clone(),
    }
  }

  /// Decorators to register with the host: committed tokens first, then the
  /// suggestion overlays.
  pub fn decorators(&self) -> Vec<Decorator> {
    vec![
      Decorator::Token(TokenStrategy::new(self.config.token_kind())),
      Decorator::Suggestions(SuggestionsStrategy::new(self.pattern.clone())),
    ]
  }

  pub fn decorate_block<B: Block + ?Sized>(&self, block: &B, content: &ContentState) -> Vec<Decoration> {
    decorate(&self.decorators(), block, content)
  }

  /// Intercept `chars` before the host inserts them.
  pub fn handle_before_input(&mut self, chars: &str, state: &mut EditorState) -> Result<HandleResult> {
    let result = auto_bracket::handle_before_input(chars, state, &self.config, &self.pattern)?;
    tracing::trace!(chars, ?result, "before input");
    Ok(result)
  }

  /// Snap the selection of an accepted state to token boundaries, then hand
  /// the state to the `on_change` hook if one is installed.
  pub fn on_change(&mut self, mut state: EditorState) -> Result<EditorState> {
    let extended = {
      let start = state.start_block()?;
      let end = state.end_block()?;
      extend_across(state.selection(), start, end)
    };
    if &extended != state.selection() {
      state.force_selection(extended);
    }
    Ok(self.callbacks.change(state))
  }

  /// Run `text` through the same pipeline a host runs per keystroke: the
  /// before-input hook, default insertion when it is not handled, then
  /// [`FormulaPlugin::on_change`].
  pub fn type_text(&mut self, mut state: EditorState, text: &str) -> Result<EditorState> {
    let mut buf = [0; 4];
    for ch in text.chars() {
      let chars = ch.encode_utf8(&mut buf);
      if !self.handle_before_input(chars, &mut state)?.is_handled() {
        state.insert_characters(chars)?;
      }
      state = self.on_change(state)?;
    }
    Ok(state)
  }

  pub fn on_down_arrow(&mut self, event: &KeyEvent) -> HandleResult {
    self.callbacks.key(Hook::OnDownArrow, event)
  }

  pub fn on_up_arrow(&mut self, event: &KeyEvent) -> HandleResult {
    self.callbacks.key(Hook::OnUpArrow, event)
  }

  pub fn on_tab(&mut self, event: &KeyEvent) -> HandleResult {
    self.callbacks.key(Hook::OnTab, event)
  }

  pub fn on_escape(&mut self, event: &KeyEvent) -> HandleResult {
    self.callbacks.key(Hook::OnEscape, event)
  }

  pub fn handle_return(&mut self, event: &KeyEvent) -> HandleResult {
    self.callbacks.key(Hook::HandleReturn, event)
  }

  pub fn key_binding(&mut self, event: &KeyEvent) -> Option<Tendril> {
    self.callbacks.key_binding(event)
  }

  pub fn handle_key_command(&mut self, command: &str) -> HandleResult {
    self.callbacks.key_command(command)
  }

  /// The formula the caret is currently typing into.
  pub fn search_text(&self, state: &EditorState) -> Result<Option<SearchText>> {
    let block = state.start_block()?;
    let caret = state.selection().anchor().offset;
    Ok(search_text(&block.text(), caret, &self.pattern))
  }

  /// Commit `label` as a token in place of the formula under the caret.
  pub fn insert_token(&self, state: &mut EditorState, label: &str) -> Result<Option<EntityKey>> {
    Ok(token::insert_token(state, &self.config, &self.pattern, label)?)
  }

  /// Rank `candidates` against `search`, keeping the configured number.
  pub fn filter_suggestions<T: AsRef<str>>(
    &self,
    search: &str,
    candidates: impl IntoIterator<Item = T>,
  ) -> Vec<T> {
    suggestions::filter(search, candidates, self.config.suggestion_limit)
  }
}

impl Drop for FormulaPlugin {
  fn drop(&mut self) {
    tracing::debug!(searches = self.registry.len(), "formula plugin dropped, clearing registry");
    self.registry.clear();
  }
}
