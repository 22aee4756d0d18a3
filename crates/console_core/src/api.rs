//! Typed calls for every endpoint of the employee/office service.

use reqwest::Method;
use serde::de::IgnoredAny;
use shared::{
    domain::{Employee, EmployeeId, Office, OfficeId},
    protocol::{
        AssignOfficesPayload, CredentialsRequest, EmployeePayload, OfficePayload, RegisteredUser,
        TokenResponse,
    },
};

use crate::{error::RequestError, session::Credential, transport::RequestClient};

type ApiResult<T> = Result<T, RequestError>;

#[derive(Clone)]
pub struct ConsoleApi {
    client: RequestClient,
}

impl ConsoleApi {
    pub fn new(client: RequestClient) -> Self {
        Self { client }
    }

    pub async fn register(&self, username: &str, password: &str) -> ApiResult<Option<RegisteredUser>> {
        let body = credentials(username, password);
        self.client
            .send("/auth/register", Method::POST, Some(&body), None)
            .await
    }

    pub async fn login(&self, username: &str, password: &str) -> ApiResult<Option<TokenResponse>> {
        let body = credentials(username, password);
        self.client
            .send("/auth/login", Method::POST, Some(&body), None)
            .await
    }

    /// Plain list, without derived office names.
    pub async fn list_employees(&self, credential: &Credential) -> ApiResult<Vec<Employee>> {
        self.get_list("/employees", credential).await
    }

    pub async fn list_employees_with_offices(
        &self,
        credential: &Credential,
    ) -> ApiResult<Vec<Employee>> {
        self.get_list("/employees/withOffices", credential).await
    }

    pub async fn get_employee_with_offices(
        &self,
        id: EmployeeId,
        credential: &Credential,
    ) -> ApiResult<Employee> {
        self.get_one(&format!("/employees/{id}/withOffices"), credential)
            .await
    }

    pub async fn create_employee(
        &self,
        payload: &EmployeePayload,
        credential: &Credential,
    ) -> ApiResult<Option<Employee>> {
        self.client
            .send("/employees", Method::POST, Some(payload), Some(credential))
            .await
    }

    pub async fn update_employee(
        &self,
        id: EmployeeId,
        payload: &EmployeePayload,
        credential: &Credential,
    ) -> ApiResult<Option<Employee>> {
        self.client
            .send(
                &format!("/employees/{id}"),
                Method::PUT,
                Some(payload),
                Some(credential),
            )
            .await
    }

    pub async fn delete_employee(&self, id: EmployeeId, credential: &Credential) -> ApiResult<()> {
        self.send_without_reply(&format!("/employees/{id}"), Method::DELETE, credential)
            .await
    }

    /// Full replace: the employee ends up assigned to exactly `office_ids`.
    pub async fn assign_offices(
        &self,
        id: EmployeeId,
        office_ids: &AssignOfficesPayload,
        credential: &Credential,
    ) -> ApiResult<()> {
        self.client
            .send::<_, IgnoredAny>(
                &format!("/employees/{id}/assignOffices"),
                Method::PATCH,
                Some(office_ids),
                Some(credential),
            )
            .await
            .map(|_| ())
    }

    pub async fn list_offices(&self, credential: &Credential) -> ApiResult<Vec<Office>> {
        self.get_list("/offices", credential).await
    }

    pub async fn get_office(&self, id: OfficeId, credential: &Credential) -> ApiResult<Office> {
        self.get_one(&format!("/offices/{id}"), credential).await
    }

    pub async fn create_office(
        &self,
        payload: &OfficePayload,
        credential: &Credential,
    ) -> ApiResult<Option<Office>> {
        self.client
            .send("/offices", Method::POST, Some(payload), Some(credential))
            .await
    }

    pub async fn update_office(
        &self,
        id: OfficeId,
        payload: &OfficePayload,
        credential: &Credential,
    ) -> ApiResult<Option<Office>> {
        self.client
            .send(
                &format!("/offices/{id}"),
                Method::PUT,
                Some(payload),
                Some(credential),
            )
            .await
    }

    pub async fn delete_office(&self, id: OfficeId, credential: &Credential) -> ApiResult<()> {
        self.send_without_reply(&format!("/offices/{id}"), Method::DELETE, credential)
            .await
    }

    async fn get_list<T>(&self, path: &str, credential: &Credential) -> ApiResult<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let items: Option<Vec<T>> = self
            .client
            .send::<(), _>(path, Method::GET, None, Some(credential))
            .await?;
        Ok(items.unwrap_or_default())
    }

    async fn get_one<T>(&self, path: &str, credential: &Credential) -> ApiResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.client
            .send::<(), _>(path, Method::GET, None, Some(credential))
            .await?
            .ok_or_else(|| RequestError::new(Some(404), "Not Found"))
    }

    async fn send_without_reply(
        &self,
        path: &str,
        method: Method,
        credential: &Credential,
    ) -> ApiResult<()> {
        self.client
            .send::<(), IgnoredAny>(path, method, None, Some(credential))
            .await
            .map(|_| ())
    }
}

fn credentials(username: &str, password: &str) -> CredentialsRequest {
    CredentialsRequest {
        username: username.to_string(),
        password: password.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
