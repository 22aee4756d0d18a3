//! Dashboard orchestration: canonical lists, mutations, and the sub-protocols
//! (assignment, delete confirmation, by-id search) hanging off them.
//!
//! Every successful mutation is followed by a full refetch of both lists; the
//! controller never patches its lists locally.
//!
//! Known limitation: concurrent [`DashboardController::refresh_all`] calls are
//! not ordered. Whichever response arrives last overwrites the lists, so a
//! slow refetch issued before a mutation can hide that mutation until the next
//! refresh.

use std::{
    collections::BTreeSet,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use shared::domain::{Employee, EmployeeId, Office, OfficeId};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    api::ConsoleApi,
    assignment::AssignmentWorkflow,
    confirmation::{ConfirmationGate, DeletionExecutor, GateState},
    error::{
        ConfirmationError, ConsoleError, DeletionTarget, NotFoundWarning, RequestError,
        ValidationError,
    },
    events::{DashboardEvent, Notification},
    forms::{EmployeeForm, OfficeForm},
    session::{AuthSession, Credential},
};

/// Identifies one mounted lifetime of the dashboard view. `0` is never live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewEpoch(u64);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeDraft {
    pub form: EmployeeForm,
    pub editing: Option<EmployeeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfficeDraft {
    pub form: OfficeForm,
    pub editing: Option<OfficeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardState {
    pub employees: Vec<Employee>,
    pub offices: Vec<Office>,
    pub employee_draft: EmployeeDraft,
    pub office_draft: OfficeDraft,
    pub assignment: AssignmentWorkflow,
    /// Result of the last by-id search; never merged into `employees`.
    pub searched: Option<Employee>,
}

pub struct DashboardController {
    session: Arc<AuthSession>,
    gate: ConfirmationGate,
    inner: Mutex<DashboardState>,
    live_epoch: AtomicU64,
    last_epoch: AtomicU64,
    events: broadcast::Sender<DashboardEvent>,
}

impl DashboardController {
    pub fn new(session: Arc<AuthSession>) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            session,
            gate: ConfirmationGate::new(),
            inner: Mutex::new(DashboardState::default()),
            live_epoch: AtomicU64::new(0),
            last_epoch: AtomicU64::new(0),
            events,
        })
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> DashboardState {
        self.inner.lock().await.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.live_epoch.load(Ordering::SeqCst) != 0
    }

    /// Opens a new view lifetime and performs the initial load.
    pub async fn mount(&self) -> Result<(), ConsoleError> {
        let epoch = self.last_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.inner.lock().await;
            *state = DashboardState::default();
            self.live_epoch.store(epoch, Ordering::SeqCst);
        }
        info!(epoch, "dashboard: mounted");
        self.refresh_all().await
    }

    /// Tears the view down. Responses still in flight are discarded on arrival.
    pub async fn unmount(&self) {
        {
            let mut state = self.inner.lock().await;
            self.live_epoch.store(0, Ordering::SeqCst);
            *state = DashboardState::default();
        }
        self.gate.cancel().await;
        info!("dashboard: unmounted");
    }

    /// Refetches both canonical lists and swaps them in together.
    ///
    /// On failure the previous lists stay in place.
    pub async fn refresh_all(&self) -> Result<(), ConsoleError> {
        let epoch = self.require_mounted()?;
        let credential = match self.session.require_credential().await {
            Ok(credential) => credential,
            Err(err) => return self.fail(epoch, "Failed to load data", err).await,
        };

        let api = self.session.api();
        let fetched = futures::try_join!(
            api.list_employees_with_offices(&credential),
            api.list_offices(&credential)
        );
        let (employees, offices) = match fetched {
            Ok(lists) => lists,
            Err(err) => return self.fail(epoch, "Failed to load data", err.into()).await,
        };

        let (employee_count, office_count) = {
            let mut state = self.inner.lock().await;
            if !self.is_live(epoch) {
                debug!(?epoch, "dashboard: dropping refresh for unmounted view");
                return Ok(());
            }
            state.employees = employees;
            state.offices = offices;
            (state.employees.len(), state.offices.len())
        };

        debug!(
            employees = employee_count,
            offices = office_count,
            "dashboard: lists refreshed"
        );
        self.publish(
            epoch,
            DashboardEvent::ListsRefreshed {
                employees: employee_count,
                offices: office_count,
            },
        );
        Ok(())
    }

    pub async fn set_employee_draft(&self, form: EmployeeForm) {
        self.inner.lock().await.employee_draft.form = form;
    }

    /// Loads a listed employee into the draft for editing.
    pub async fn edit_employee(&self, id: EmployeeId) -> Result<(), ConsoleError> {
        let epoch = self.require_mounted()?;
        let found = {
            let mut state = self.inner.lock().await;
            let form = state
                .employees
                .iter()
                .find(|employee| employee.id == id)
                .map(EmployeeForm::from);
            if let Some(form) = &form {
                state.employee_draft = EmployeeDraft {
                    form: form.clone(),
                    editing: Some(id),
                };
            }
            form.is_some()
        };
        if found {
            return Ok(());
        }
        let err = NotFoundWarning {
            id: id.to_string(),
            reason: "not in the employee list".into(),
        };
        self.fail(epoch, "Employee not found", err.into()).await
    }

    pub async fn reset_employee_draft(&self) {
        self.inner.lock().await.employee_draft = EmployeeDraft::default();
    }

    pub async fn submit_employee_draft(&self) -> Result<(), ConsoleError> {
        let draft = self.inner.lock().await.employee_draft.clone();
        self.submit_employee(draft.form, draft.editing).await
    }

    /// Creates (`editing_id == None`) or updates an employee, then refetches.
    pub async fn submit_employee(
        &self,
        form: EmployeeForm,
        editing_id: Option<EmployeeId>,
    ) -> Result<(), ConsoleError> {
        let epoch = self.require_mounted()?;
        let payload = match form.validate() {
            Ok(payload) => payload,
            Err(err) => return self.fail(epoch, "Incomplete employee", err.into()).await,
        };
        let credential = match self.session.require_credential().await {
            Ok(credential) => credential,
            Err(err) => return self.fail(epoch, "Failed to save employee", err).await,
        };

        let api = self.session.api();
        let saved = match editing_id {
            Some(id) => api.update_employee(id, &payload, &credential).await,
            None => api.create_employee(&payload, &credential).await,
        };
        if let Err(err) = saved {
            return self.fail(epoch, "Failed to save employee", err.into()).await;
        }

        let title = match editing_id {
            Some(id) => {
                info!(employee_id = id.0, "dashboard: employee updated");
                "Employee updated"
            }
            None => {
                info!(dni = %payload.dni, "dashboard: employee created");
                "Employee created"
            }
        };
        self.apply(epoch, |state| state.employee_draft = EmployeeDraft::default())
            .await;
        self.publish(epoch, DashboardEvent::Notification(Notification::success(title)));
        self.refresh_after_mutation().await;
        Ok(())
    }

    pub async fn set_office_draft(&self, form: OfficeForm) {
        self.inner.lock().await.office_draft.form = form;
    }

    pub async fn edit_office(&self, id: OfficeId) -> Result<(), ConsoleError> {
        let epoch = self.require_mounted()?;
        let found = {
            let mut state = self.inner.lock().await;
            let form = state
                .offices
                .iter()
                .find(|office| office.id == id)
                .map(OfficeForm::from);
            if let Some(form) = &form {
                state.office_draft = OfficeDraft {
                    form: form.clone(),
                    editing: Some(id),
                };
            }
            form.is_some()
        };
        if found {
            return Ok(());
        }
        let err = NotFoundWarning {
            id: id.to_string(),
            reason: "not in the office list".into(),
        };
        self.fail(epoch, "Office not found", err.into()).await
    }

    pub async fn reset_office_draft(&self) {
        self.inner.lock().await.office_draft = OfficeDraft::default();
    }

    pub async fn submit_office_draft(&self) -> Result<(), ConsoleError> {
        let draft = self.inner.lock().await.office_draft.clone();
        self.submit_office(draft.form, draft.editing).await
    }

    pub async fn submit_office(
        &self,
        form: OfficeForm,
        editing_id: Option<OfficeId>,
    ) -> Result<(), ConsoleError> {
        let epoch = self.require_mounted()?;
        let payload = match form.validate() {
            Ok(payload) => payload,
            Err(err) => return self.fail(epoch, "Incomplete office", err.into()).await,
        };
        let credential = match self.session.require_credential().await {
            Ok(credential) => credential,
            Err(err) => return self.fail(epoch, "Failed to save office", err).await,
        };

        let api = self.session.api();
        let saved = match editing_id {
            Some(id) => api.update_office(id, &payload, &credential).await,
            None => api.create_office(&payload, &credential).await,
        };
        if let Err(err) = saved {
            return self.fail(epoch, "Failed to save office", err.into()).await;
        }

        let title = if editing_id.is_some() {
            "Office updated"
        } else {
            "Office created"
        };
        info!(office = %payload.name, updated = editing_id.is_some(), "dashboard: office saved");
        self.apply(epoch, |state| state.office_draft = OfficeDraft::default())
            .await;
        self.publish(epoch, DashboardEvent::Notification(Notification::success(title)));
        self.refresh_after_mutation().await;
        Ok(())
    }

    /// Opens the delete confirmation for an employee. Nothing is deleted yet.
    pub async fn delete_employee(&self, id: EmployeeId) {
        self.request_deletion(DeletionTarget::Employee(id)).await;
    }

    /// Opens the delete confirmation for an office. Nothing is deleted yet.
    pub async fn delete_office(&self, id: OfficeId) {
        self.request_deletion(DeletionTarget::Office(id)).await;
    }

    pub async fn pending_deletion(&self) -> Option<DeletionTarget> {
        self.gate.pending().await
    }

    pub async fn confirmation_state(&self) -> GateState {
        self.gate.state().await
    }

    pub async fn cancel_deletion(&self) -> Option<DeletionTarget> {
        let epoch = self.current_epoch();
        let cancelled = self.gate.cancel().await;
        if cancelled.is_some() {
            self.publish(epoch, DashboardEvent::ConfirmationCleared);
        }
        cancelled
    }

    /// Executes the pending delete, then refetches.
    pub async fn confirm_deletion(&self) -> Result<DeletionTarget, ConsoleError> {
        let epoch = self.require_mounted()?;
        let credential = match self.session.require_credential().await {
            Ok(credential) => credential,
            Err(err) => return self.fail(epoch, "Failed to delete", err).await,
        };

        let executor = ApiDeletion {
            api: self.session.api(),
            credential,
        };
        match self.gate.confirm(&executor).await {
            Ok(target) => {
                info!(%target, "dashboard: deleted");
                let title = match target {
                    DeletionTarget::Employee(_) => "Employee deleted",
                    DeletionTarget::Office(_) => "Office deleted",
                };
                self.publish(epoch, DashboardEvent::ConfirmationCleared);
                self.publish(epoch, DashboardEvent::Notification(Notification::success(title)));
                self.refresh_after_mutation().await;
                Ok(target)
            }
            Err(err @ ConfirmationError::NothingPending) => {
                self.fail(epoch, "Nothing to delete", err.into()).await
            }
            Err(err) => {
                self.publish(epoch, DashboardEvent::ConfirmationCleared);
                self.fail(epoch, "Failed to delete", err.into()).await
            }
        }
    }

    pub async fn select_assignment_employee(&self, employee_id: Option<EmployeeId>) {
        self.inner
            .lock()
            .await
            .assignment
            .select_employee(employee_id);
    }

    pub async fn set_assignment_offices(&self, office_ids: impl IntoIterator<Item = OfficeId>) {
        self.inner.lock().await.assignment.set_offices(office_ids);
    }

    pub async fn toggle_assignment_office(&self, office_id: OfficeId) -> bool {
        self.inner.lock().await.assignment.toggle_office(office_id)
    }

    /// Selects `employee_id` with exactly `office_ids` and submits.
    pub async fn assign(
        &self,
        employee_id: Option<EmployeeId>,
        office_ids: BTreeSet<OfficeId>,
    ) -> Result<(), ConsoleError> {
        {
            let mut state = self.inner.lock().await;
            state.assignment.select_employee(employee_id);
            state.assignment.set_offices(office_ids);
        }
        self.submit_assignment().await
    }

    /// Full-replace assignment from the pending selection.
    pub async fn submit_assignment(&self) -> Result<(), ConsoleError> {
        let epoch = self.require_mounted()?;
        let prepared = self.inner.lock().await.assignment.prepare();
        let request = match prepared {
            Ok(request) => request,
            Err(err) => return self.fail(epoch, "Select an employee", err.into()).await,
        };
        let credential = match self.session.require_credential().await {
            Ok(credential) => credential,
            Err(err) => return self.fail(epoch, "Failed to assign offices", err).await,
        };

        let payload = request.payload();
        if let Err(err) = self
            .session
            .api()
            .assign_offices(request.employee_id, &payload, &credential)
            .await
        {
            return self.fail(epoch, "Failed to assign offices", err.into()).await;
        }

        info!(
            employee_id = request.employee_id.0,
            offices = ?payload,
            "dashboard: offices assigned"
        );
        self.apply(epoch, |state| state.assignment.clear()).await;
        self.publish(
            epoch,
            DashboardEvent::Notification(Notification::success("Offices assigned")),
        );
        self.refresh_after_mutation().await;
        Ok(())
    }

    /// Independent by-id read; the result is shown on its own and never
    /// merged into the canonical list.
    ///
    /// A blank id is a validation error and leaves any previous result in
    /// place. Any other failure clears the previous result and reports a
    /// [`NotFoundWarning`].
    pub async fn search_employee_by_id(&self, raw_id: &str) -> Result<Employee, ConsoleError> {
        let epoch = self.require_mounted()?;
        let trimmed = raw_id.trim();
        if trimmed.is_empty() {
            return self
                .fail(epoch, "Enter an employee id", ValidationError::BlankSearchId.into())
                .await;
        }
        let credential = match self.session.require_credential().await {
            Ok(credential) => credential,
            Err(err) => {
                self.clear_searched(epoch).await;
                return self.fail(epoch, "Search failed", err).await;
            }
        };

        let Ok(id) = trimmed.parse::<i64>() else {
            return self
                .search_missed(epoch, trimmed, "not a valid employee id".into())
                .await;
        };

        match self
            .session
            .api()
            .get_employee_with_offices(EmployeeId(id), &credential)
            .await
        {
            Ok(employee) => {
                let applied = self
                    .apply(epoch, |state| state.searched = Some(employee.clone()))
                    .await;
                if applied {
                    self.publish(epoch, DashboardEvent::SearchResult(Some(employee.clone())));
                }
                Ok(employee)
            }
            Err(err) => {
                if err.requires_reauth() {
                    self.end_session(epoch).await;
                }
                self.search_missed(epoch, trimmed, err.message).await
            }
        }
    }

    pub async fn clear_search(&self) {
        self.clear_searched(self.current_epoch()).await;
    }

    async fn clear_searched(&self, epoch: ViewEpoch) {
        if self.apply(epoch, |state| state.searched = None).await {
            self.publish(epoch, DashboardEvent::SearchResult(None));
        }
    }

    async fn search_missed(
        &self,
        epoch: ViewEpoch,
        id: &str,
        reason: String,
    ) -> Result<Employee, ConsoleError> {
        self.clear_searched(epoch).await;
        let warning = NotFoundWarning {
            id: id.to_string(),
            reason,
        };
        self.fail(epoch, "Not found", warning.into()).await
    }

    async fn request_deletion(&self, target: DeletionTarget) {
        let epoch = self.current_epoch();
        if let Some(replaced) = self.gate.request_confirmation(target).await {
            debug!(%replaced, %target, "dashboard: replaced stale delete confirmation");
        }
        self.publish(epoch, DashboardEvent::ConfirmationRequested(target));
    }

    async fn refresh_after_mutation(&self) {
        if let Err(err) = self.refresh_all().await {
            warn!(error = %err, "dashboard: refetch after mutation failed");
        }
    }

    /// Runs `update` only while `epoch` is still the live view.
    async fn apply(&self, epoch: ViewEpoch, update: impl FnOnce(&mut DashboardState)) -> bool {
        let mut state = self.inner.lock().await;
        if !self.is_live(epoch) {
            return false;
        }
        update(&mut state);
        true
    }

    /// Reports `err` as a notification (when the view is still live) and
    /// hands it back to the caller.
    async fn fail<T>(
        &self,
        epoch: ViewEpoch,
        title: &str,
        err: ConsoleError,
    ) -> Result<T, ConsoleError> {
        if err.requires_reauth() {
            self.end_session(epoch).await;
        }
        if self.is_live(epoch) {
            warn!(title, error = %err, "dashboard: operation failed");
            self.publish(
                epoch,
                DashboardEvent::Notification(Notification::from_error(title, &err)),
            );
        } else {
            debug!(title, error = %err, "dashboard: dropping failure for unmounted view");
        }
        Err(err)
    }

    async fn end_session(&self, epoch: ViewEpoch) {
        self.session.logout().await;
        self.publish(epoch, DashboardEvent::SessionEnded);
    }

    /// Epoch of the open view. Fails before any request when the view was
    /// never mounted or has been unmounted.
    fn require_mounted(&self) -> Result<ViewEpoch, ConsoleError> {
        let epoch = self.current_epoch();
        if epoch.0 == 0 {
            warn!("dashboard: operation on a view that is not mounted");
            return Err(ConsoleError::NotMounted);
        }
        Ok(epoch)
    }

        fn current_epoch(&self) -> ViewEpoch {
        ViewEpoch(self.live_epoch.load(Ordering::SeqCst))
    }

    fn is_live(&self, epoch: ViewEpoch) -> bool {
        epoch.0 != 0 && self.live_epoch.load(Ordering::SeqCst) == epoch.0
    }

    fn publish(&self, epoch: ViewEpoch, event: DashboardEvent) {
        if self.is_live(epoch) {
            let _ = self.events.send(event);
        }
    }
}

struct ApiDeletion<'a> {
    api: &'a ConsoleApi,
    credential: Credential,
}

#[async_trait]
impl<'a> DeletionExecutor for ApiDeletion<'a> {
    async fn delete(&self, target: DeletionTarget) -> Result<(), RequestError> {
        match target {
            DeletionTarget::Employee(id) => self.api.delete_employee(id, &self.credential).await,
            DeletionTarget::Office(id) => self.api.delete_office(id, &self.credential).await,
        }
    }
}

#[cfg(test)]
#[path = "tests/dashboard_tests.rs"]
mod tests;
