pub mod background;
pub mod content;
pub mod hub;
mod listeners;
pub mod session;

pub use background::{Background, event_loop};
pub use content::{ContentClient, RouterError, TranslateOutcome};
pub use hub::{HubError, TabHub, TabPort};
pub use session::{ContentSession, HistoryStore, MemoryHistory, PopupState, TranslateParams};

#[cfg(test)]
mod test_support;
