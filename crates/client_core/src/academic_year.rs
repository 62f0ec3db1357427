//! The academic year every list and dashboard is scoped to.

use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    domain::{AcademicYearId, DepartmentId, SessionStatus},
    protocol::{AcademicYear, YearSession},
};
use storage::Storage;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::{
    api::{AcademicYearQuery, ResearchHubClient, YearSessionQuery},
    error::{ClientError, Result},
    ClientEvent, NoticeLevel,
};

/// Enough for every year the backend has ever held.
pub const ACADEMIC_YEAR_FETCH_SIZE: u32 = 100;

#[async_trait]
pub trait AcademicYearSource: Send + Sync {
    async fn academic_years(&self) -> Result<Vec<AcademicYear>>;
}

#[async_trait]
impl AcademicYearSource for ResearchHubClient {
    async fn academic_years(&self) -> Result<Vec<AcademicYear>> {
        let page = self
            .list_academic_years(&AcademicYearQuery {
                page: 0,
                size: ACADEMIC_YEAR_FETCH_SIZE,
                ..AcademicYearQuery::default()
            })
            .await?;
        Ok(page.content)
    }
}

/// Chooses the year to show: the current choice if it is still active,
/// then the persisted id, then the latest active year.
pub fn resolve_selection(
    years: &[AcademicYear],
    current: Option<AcademicYearId>,
    persisted: Option<AcademicYearId>,
) -> Option<AcademicYearId> {
    let is_active = |id: AcademicYearId| years.iter().any(|year| year.id == id && year.is_active);

    current
        .filter(|id| is_active(*id))
        .or_else(|| persisted.filter(|id| is_active(*id)))
        .or_else(|| {
            years
                .iter()
                .filter(|year| year.is_active)
                .max_by_key(|year| year.year)
                .map(|year| year.id)
        })
}

/// The session a department runs inside an academic year.
pub fn resolve_session(
    sessions: &[YearSession],
    academic_year_id: AcademicYearId,
    department_id: DepartmentId,
) -> Option<&YearSession> {
    sessions.iter().find(|session| {
        session.academic_year_id == academic_year_id && session.department_id == department_id
    })
}

/// One department's session inside one academic year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionScope {
    pub academic_year_id: AcademicYearId,
    pub department_id: DepartmentId,
}

/// Looks up the status of the session `scope` names. `None` when the
/// department runs no session that year.
pub async fn fetch_session_status(
    client: &ResearchHubClient,
    scope: SessionScope,
) -> Result<Option<SessionStatus>> {
    let sessions = client
        .list_year_sessions(&YearSessionQuery {
            department_id: Some(scope.department_id),
            page: 0,
            size: ACADEMIC_YEAR_FETCH_SIZE,
            ..YearSessionQuery::default()
        })
        .await?;
    let status = resolve_session(&sessions.content, scope.academic_year_id, scope.department_id)
        .map(|session| session.status);
    debug!(?scope, ?status, "session resolved");
    Ok(status)
}

#[derive(Debug, Default)]
struct YearState {
    years: Vec<AcademicYear>,
    selected: Option<AcademicYearId>,
}

pub struct AcademicYearContext {
    source: Arc<dyn AcademicYearSource>,
    storage: Storage,
    state: RwLock<YearState>,
    events: broadcast::Sender<ClientEvent>,
}

impl AcademicYearContext {
    pub fn new(
        source: Arc<dyn AcademicYearSource>,
        storage: Storage,
        events: broadcast::Sender<ClientEvent>,
    ) -> Self {
        Self {
            source,
            storage,
            state: RwLock::new(YearState::default()),
            events,
        }
    }

    pub async fn years(&self) -> Vec<AcademicYear> {
        self.state.read().await.years.clone()
    }

    pub async fn selected_id(&self) -> Option<AcademicYearId> {
        self.state.read().await.selected
    }

    pub async fn selected(&self) -> Option<AcademicYear> {
        let state = self.state.read().await;
        let selected = state.selected?;
        state.years.iter().find(|year| year.id == selected).cloned()
    }

    /// Reloads the active years and settles the selection. On a failed
    /// fetch the previous state is kept and an error notice goes out.
    pub async fn refresh(&self) -> Result<Option<AcademicYearId>> {
        let fetched = match self.source.academic_years().await {
            Ok(years) => years,
            Err(err) => {
                warn!(error = %err, "failed to load academic years");
                self.notify(NoticeLevel::Error, err.user_message());
                return Err(err);
            }
        };
        let years: Vec<AcademicYear> = fetched.into_iter().filter(|year| year.is_active).collect();

        let persisted = self
            .storage
            .selected_academic_year()
            .await
            .map_err(ClientError::Storage)?;

        let mut state = self.state.write().await;
        let previous = state.selected;
        let resolved = resolve_selection(&years, previous, persisted);
        debug!(
            active = years.len(),
            previous = ?previous,
            persisted = ?persisted,
            resolved = ?resolved,
            "resolved academic year"
        );
        state.years = years;
        state.selected = resolved;
        drop(state);

        if let Some(id) = resolved {
            if persisted != Some(id) {
                self.storage
                    .set_selected_academic_year(id)
                    .await
                    .map_err(ClientError::Storage)?;
            }
        }
        if previous != resolved {
            let _ = self.events.send(ClientEvent::AcademicYearChanged(resolved));
        }
        Ok(resolved)
    }

    /// The only way to change the selection by hand. The year must be one
    /// of the loaded active years.
    pub async fn select(&self, id: AcademicYearId) -> Result<AcademicYear> {
        let year = {
            let state = self.state.read().await;
            state.years.iter().find(|year| year.id == id).cloned()
        }
        .ok_or_else(|| ClientError::Validation(format!("academic year {id} is not active")))?;

        self.storage
            .set_selected_academic_year(id)
            .await
            .map_err(ClientError::Storage)?;
        self.state.write().await.selected = Some(id);

        info!(academic_year_id = %id, year = year.year, "academic year selected");
        let _ = self.events.send(ClientEvent::AcademicYearChanged(Some(id)));
        self.notify(
            NoticeLevel::Success,
            format!("Switched to academic year {}", year.year),
        );
        Ok(year)
    }

    /// Forgets the loaded years and the in-memory selection.
    pub async fn teardown(&self) {
        let mut state = self.state.write().await;
        let had_selection = state.selected.is_some();
        *state = YearState::default();
        drop(state);

        if had_selection {
            let _ = self.events.send(ClientEvent::AcademicYearChanged(None));
        }
    }

    fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        let _ = self.events.send(ClientEvent::Notice {
            level,
            message: message.into(),
        });
    }
}

#[cfg(test)]
#[path = "tests/academic_year_tests.rs"]
mod tests;
