//! Create/edit form records and their local validation.

use shared::{
    domain::{Employee, Office},
    protocol::{EmployeePayload, OfficePayload},
};

use crate::error::{FormKind, ValidationError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeForm {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub dni: String,
    pub address: String,
    pub birth_date: String,
}

impl EmployeeForm {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("phone", &self.phone),
            ("dni", &self.dni),
            ("address", &self.address),
            ("birthDate", &self.birth_date),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn validate(&self) -> Result<EmployeePayload, ValidationError> {
        check(FormKind::Employee, self.missing_fields())?;
        Ok(EmployeePayload {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone: self.phone.clone(),
            dni: self.dni.clone(),
            address: self.address.clone(),
            birth_date: self.birth_date.clone(),
        })
    }
}

impl From<&Employee> for EmployeeForm {
    fn from(employee: &Employee) -> Self {
        Self {
            first_name: employee.first_name.clone(),
            last_name: employee.last_name.clone(),
            phone: employee.phone.clone(),
            dni: employee.dni.clone(),
            address: employee.address.clone(),
            birth_date: employee.birth_date.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfficeForm {
    pub name: String,
    pub location: String,
}

impl OfficeForm {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [("name", &self.name), ("location", &self.location)]
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| name)
            .collect()
    }

    pub fn validate(&self) -> Result<OfficePayload, ValidationError> {
        check(FormKind::Office, self.missing_fields())?;
        Ok(OfficePayload {
            name: self.name.clone(),
            location: self.location.clone(),
        })
    }
}

impl From<&Office> for OfficeForm {
    fn from(office: &Office) -> Self {
        Self {
            name: office.name.clone(),
            location: office.location.clone(),
        }
    }
}

fn check(form: FormKind, fields: Vec<&'static str>) -> Result<(), ValidationError> {
    if fields.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFields { form, fields })
    }
}
