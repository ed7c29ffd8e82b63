//! Optional hooks the suggestions overlay installs on the plugin.
//!
//! The overlay owns the keyboard while it is open: it wants arrow keys to move
//! through suggestions, tab/return to pick one and escape to dismiss. It does
//! so by filling the slots of [`Callbacks`]. An empty slot means the plugin
//! passes the event through to the host's default behavior.

use std::fmt;

use crate::{
  Tendril,
  document::EditorState,
  input::{
    HandleResult,
    KeyEvent,
  },
};

pub type KeyHook = Box<dyn FnMut(&KeyEvent) -> HandleResult + Send>;
pub type KeyBindingHook = Box<dyn FnMut(&KeyEvent) -> Option<Tendril> + Send>;
pub type KeyCommandHook = Box<dyn FnMut(&str) -> HandleResult + Send>;
pub type ChangeHook = Box<dyn FnMut(EditorState) -> EditorState + Send>;

/// Every hook the plugin recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
  OnDownArrow,
  OnUpArrow,
  OnTab,
  OnEscape,
  HandleReturn,
  OnChange,
  KeyBindingFn,
  HandleKeyCommand,
}

#[derive(Default)]
pub struct Callbacks {
  pub on_down_arrow:      Option<KeyHook>,
  pub on_up_arrow:        Option<KeyHook>,
  pub on_tab:             Option<KeyHook>,
  pub on_escape:          Option<KeyHook>,
  pub handle_return:      Option<KeyHook>,
  pub on_change:          Option<ChangeHook>,
  pub key_binding_fn:     Option<KeyBindingHook>,
  pub handle_key_command: Option<KeyCommandHook>,
}

impl Callbacks {
  pub fn is_set(&self, hook: Hook) -> bool {
    match hook {
      Hook::OnDownArrow => self.on_down_arrow.is_some(),
      Hook::OnUpArrow => self.on_up_arrow.is_some(),
      Hook::OnTab => self.on_tab.is_some(),
      Hook::OnEscape => self.on_escape.is_some(),
      Hook::HandleReturn => self.handle_return.is_some(),
      Hook::OnChange => self.on_change.is_some(),
      Hook::KeyBindingFn => self.key_binding_fn.is_some(),
      Hook::HandleKeyCommand => self.handle_key_command.is_some(),
    }
  }

  /// Empty the slot of `hook`, restoring default host behavior.
  pub fn clear(&mut self, hook: Hook) {
    match hook {
      Hook::OnDownArrow => self.on_down_arrow = None,
      Hook::OnUpArrow => self.on_up_arrow = None,
      Hook::OnTab => self.on_tab = None,
      Hook::OnEscape => self.on_escape = None,
      Hook::HandleReturn => self.handle_return = None,
      Hook::OnChange => self.on_change = None,
      Hook::KeyBindingFn => self.key_binding_fn = None,
      Hook::HandleKeyCommand => self.handle_key_command = None,
    }
  }

  /// Run the key hook of `hook`. Non-key hooks and empty slots are not
  /// handled.
  pub fn key(&mut self, hook: Hook, event: &KeyEvent) -> HandleResult {
    let slot = match hook {
      Hook::OnDownArrow => &mut self.on_down_arrow,
      Hook::OnUpArrow => &mut self.on_up_arrow,
      Hook::OnTab => &mut self.on_tab,
      Hook::OnEscape => &mut self.on_escape,
      Hook::HandleReturn => &mut self.handle_return,
      Hook::OnChange | Hook::KeyBindingFn | Hook::HandleKeyCommand => return HandleResult::NotHandled,
    };
    slot
      .as_mut()
      .map_or(HandleResult::NotHandled, |hook| hook(event))
  }

  pub fn key_binding(&mut self, event: &KeyEvent) -> Option<Tendril> {
    self.key_binding_fn.as_mut().and_then(|hook| hook(event))
  }

  pub fn key_command(&mut self, command: &str) -> HandleResult {
    self
      .handle_key_command
      .as_mut()
      .map_or(HandleResult::NotHandled, |hook| hook(command))
  }

  pub fn change(&mut self, state: EditorState) -> EditorState {
    match self.on_change.as_mut() {
      Some(hook) => hook(state),
      None => state,
    }
  }
}

impl fmt::Debug for Callbacks {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let set: Vec<_> = [
      Hook::OnDownArrow,
      Hook::OnUpArrow,
      Hook::OnTab,
      Hook::OnEscape,
      Hook::HandleReturn,
      Hook::OnChange,
      Hook::KeyBindingFn,
      Hook::HandleKeyCommand,
    ]
    .into_iter()
    .filter(|hook| self.is_set(*hook))
    .collect();
    f.debug_struct("Callbacks").field("set", &set).finish()
  }
}
