use serde::{Deserialize, Serialize};

use crate::domain::OfficeId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub username: String,
}

/// Body of `POST /employees` and `PUT /employees/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePayload {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub dni: String,
    pub address: String,
    pub birth_date: String,
}

/// Body of `POST /offices` and `PUT /offices/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficePayload {
    pub name: String,
    pub location: String,
}

/// Body of `PATCH /employees/{id}/assignOffices`: a bare JSON array of ids.
pub type AssignOfficesPayload = Vec<OfficeId>;
