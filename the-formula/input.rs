//! Key events delivered by the host and the outcome of handling them.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
  Char(char),
  Enter,
  Escape,
  Backspace,
  Tab,
  Delete,
  Home,
  End,
  Left,
  Right,
  Up,
  Down,
  Other,
}

/// A key press the host forwards to the plugin's key hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
  pub key: Key,
}

impl KeyEvent {
  pub const fn new(key: Key) -> Self {
    Self { key }
  }
}

/// Whether a handler consumed an input.
///
/// `Handled` stops the host from applying its default behavior;
/// `NotHandled` lets it proceed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum HandleResult {
  Handled,
  #[default]
  NotHandled,
}

impl HandleResult {
  pub const fn is_handled(self) -> bool {
    matches!(self, Self::Handled)
  }
}

impl From<bool> for HandleResult {
  fn from(handled: bool) -> Self {
    if handled { Self::Handled } else { Self::NotHandled }
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn test_handle_result() {
    assert_eq!(HandleResult::default(), HandleResult::NotHandled);
    assert!(HandleResult::from(true).is_handled());
    assert!(!HandleResult::from(false).is_handled());
  }
}
