//! Pending employee -> offices selection and the full-replace request built from it.

use std::collections::BTreeSet;

use shared::domain::{EmployeeId, OfficeId};

use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRequest {
    pub employee_id: EmployeeId,
    pub office_ids: BTreeSet<OfficeId>,
}

impl AssignmentRequest {
    /// Wire body: the exact office set, sorted.
    pub fn payload(&self) -> Vec<OfficeId> {
        self.office_ids.iter().copied().collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentWorkflow {
    employee_id: Option<EmployeeId>,
    office_ids: BTreeSet<OfficeId>,
}

impl AssignmentWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_employee(&self) -> Option<EmployeeId> {
        self.employee_id
    }

    pub fn selected_offices(&self) -> &BTreeSet<OfficeId> {
        &self.office_ids
    }

    pub fn select_employee(&mut self, employee_id: Option<EmployeeId>) {
        self.employee_id = employee_id;
    }

    pub fn set_offices(&mut self, office_ids: impl IntoIterator<Item = OfficeId>) {
        self.office_ids = office_ids.into_iter().collect();
    }

    /// Returns whether the office is selected afterwards.
    pub fn toggle_office(&mut self, office_id: OfficeId) -> bool {
        if self.office_ids.remove(&office_id) {
            false
        } else {
            self.office_ids.insert(office_id);
            true
        }
    }

    pub fn clear(&mut self) {
        self.employee_id = None;
        self.office_ids.clear();
    }

    /// An empty office set is valid and clears every assignment.
    pub fn prepare(&self) -> Result<AssignmentRequest, ValidationError> {
        let employee_id = self
            .employee_id
            .ok_or(ValidationError::NoEmployeeSelected)?;
        Ok(AssignmentRequest {
            employee_id,
            office_ids: self.office_ids.clone(),
        })
    }
}
