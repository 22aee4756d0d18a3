use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(EmployeeId);
id_newtype!(OfficeId);

/// Employee as listed by the service.
///
/// `office_names` is derived by the server from the assignment table and is
/// only present on the `withOffices` endpoints. It is never sent back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub dni: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub birth_date: String,
    #[serde(default, skip_serializing)]
    pub office_names: Vec<String>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn office_names_display(&self) -> String {
        if self.office_names.is_empty() {
            "none".to_string()
        } else {
            self.office_names.join(", ")
        }
    }

    pub fn birth_date_display(&self) -> &str {
        if self.birth_date.is_empty() {
            "N/A"
        } else {
            &self.birth_date
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Office {
    pub id: OfficeId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
