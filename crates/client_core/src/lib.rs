//! Client side of ResearchHub: backend access, the signed-in session, the
//! selected academic year and the gated topic workflows.

use shared::domain::{AcademicYearId, Role};
use tokio::sync::broadcast;

pub mod academic_year;
pub mod api;
pub mod error;
pub mod navigation;
pub mod search;
pub mod session;
pub mod workflow;

pub use academic_year::{AcademicYearContext, AcademicYearSource};
pub use api::ResearchHubClient;
pub use error::{ClientError, Result};
pub use session::{AuthSession, SessionManager};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Something the user should be told about.
    Notice { level: NoticeLevel, message: String },
    AcademicYearChanged(Option<AcademicYearId>),
    SignedIn { username: String, role: Role },
    SignedOut,
}

pub fn event_channel() -> (
    broadcast::Sender<ClientEvent>,
    broadcast::Receiver<ClientEvent>,
) {
    broadcast::channel(EVENT_CHANNEL_CAPACITY)
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
