//! What a screen draws
//!
//! Network failures end up here as a state, never as an error returned to
//! the front-end.

use syncopate_common::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Loading,
    Ready(T),
    /// Nothing to show; carries the message for the empty screen
    Empty(String),
    /// Dedicated interstitial; no further fetches on this screen
    SessionExpired,
    /// Concert search backend is down (HTTP 503)
    ServiceUnavailable,
    /// One-line message
    Error(String),
}

impl<T> ViewState<T> {
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::SessionExpired => ViewState::SessionExpired,
            Error::ServiceUnavailable => ViewState::ServiceUnavailable,
            other => ViewState::Error(other.to_string()),
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn ready_mut(&mut self) -> Option<&mut T> {
        match self {
            ViewState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ViewState<U> {
        match self {
            ViewState::Loading => ViewState::Loading,
            ViewState::Ready(value) => ViewState::Ready(f(value)),
            ViewState::Empty(msg) => ViewState::Empty(msg),
            ViewState::SessionExpired => ViewState::SessionExpired,
            ViewState::ServiceUnavailable => ViewState::ServiceUnavailable,
            ViewState::Error(msg) => ViewState::Error(msg),
        }
    }
}

impl<I> ViewState<Vec<I>> {
    /// `Ready` unless `items` is empty
    pub fn from_items(items: Vec<I>, empty_message: &str) -> Self {
        if items.is_empty() {
            ViewState::Empty(empty_message.to_string())
        } else {
            ViewState::Ready(items)
        }
    }
}
