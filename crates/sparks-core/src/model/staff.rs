//! Employees, their audit trail, and the signed-in session.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::entity::{ref_from_row, Entity, EntitySchema, Field, FieldDef, FieldKind, Ref};
use crate::error::DecodeError;
use crate::value::{Row, ID_COLUMN};

// =============================================================================
// Employee Role
// =============================================================================

/// What an employee may do in the back office.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EmployeeRole {
    Manager,
    #[default]
    Cashier,
}

impl EmployeeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeRole::Manager => "manager",
            EmployeeRole::Cashier => "cashier",
        }
    }
}

impl fmt::Display for EmployeeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmployeeRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manager" => Ok(EmployeeRole::Manager),
            "cashier" => Ok(EmployeeRole::Cashier),
            _ => Err(()),
        }
    }
}

// =============================================================================
// Employee
// =============================================================================

/// A person allowed to sign in.
///
/// `password_hash` holds a PHC string (`$argon2id$...`); the clear password is
/// never stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Employee {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: EmployeeRole,
}

impl Employee {
    pub const NAME: Field<Employee> = Field::new("name");
    pub const EMAIL: Field<Employee> = Field::new("email");
    pub const ROLE: Field<Employee> = Field::new("role");

    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        role: EmployeeRole,
    ) -> Self {
        Employee {
            id: None,
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            role,
        }
    }
}

impl Entity for Employee {
    const SCHEMA: &'static EntitySchema = &EntitySchema {
        tag: "employees",
        fields: &[
            FieldDef::scalar("name", FieldKind::Text),
            FieldDef::scalar("email", FieldKind::Text),
            FieldDef::scalar("password_hash", FieldKind::Text),
            FieldDef::scalar("role", FieldKind::Text),
        ],
    };

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("name", &self.name)
            .with("email", &self.email)
            .with("password_hash", &self.password_hash)
            .with("role", self.role.as_str())
    }

    fn from_row(row: &Row) -> Result<Self, DecodeError> {
        let role = row.text("role")?;
        Ok(Employee {
            id: row.opt_i64(ID_COLUMN)?,
            name: row.text("name")?,
            email: row.text("email")?,
            password_hash: row.text("password_hash")?,
            role: role.parse().map_err(|_| DecodeError::InvalidFormat {
                column: "role".to_string(),
                expected: "employee role",
                value: role.clone(),
            })?,
        })
    }
}

// =============================================================================
// Employee Log
// =============================================================================

/// One audit entry: what happened, attributed to whoever was signed in.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeLog {
    pub id: Option<i64>,
    /// Unset when nobody was signed in.
    pub employee: Ref<Employee>,
    pub action: String,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

impl EmployeeLog {
    pub const EMPLOYEE: Field<EmployeeLog> = Field::new("employee");
    pub const ACTION: Field<EmployeeLog> = Field::new("action");

    pub fn new(employee: Ref<Employee>, action: impl Into<String>, detail: impl Into<String>) -> Self {
        EmployeeLog {
            id: None,
            employee,
            action: action.into(),
            detail: detail.into(),
            created_at: Utc::now(),
        }
    }
}

impl Entity for EmployeeLog {
    const SCHEMA: &'static EntitySchema = &EntitySchema {
        tag: "employee_logs",
        fields: &[
            FieldDef::reference("employee", "employee_id", "employees"),
            FieldDef::scalar("action", FieldKind::Text),
            FieldDef::scalar("detail", FieldKind::Text),
            FieldDef::scalar("created_at", FieldKind::Timestamp),
        ],
    };

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("employee_id", self.employee.id())
            .with("action", &self.action)
            .with("detail", &self.detail)
            .with("created_at", self.created_at)
    }

    fn from_row(row: &Row) -> Result<Self, DecodeError> {
        Ok(EmployeeLog {
            id: row.opt_i64(ID_COLUMN)?,
            employee: ref_from_row(row, "employee_id")?,
            action: row.text("action")?,
            detail: row.text("detail")?,
            created_at: row.timestamp("created_at")?,
        })
    }

    fn attach(&mut self, association: &str, target: &Row) -> Result<(), DecodeError> {
        match association {
            "employee" => self.employee.resolve(Employee::from_row(target)?),
            other => {
                return Err(DecodeError::UnknownAssociation {
                    entity: Self::SCHEMA.tag,
                    association: other.to_string(),
                })
            }
        }
        Ok(())
    }
}

// =============================================================================
// Session
// =============================================================================

/// The employee the current session belongs to.
///
/// Held in the registry; the default value is the signed-out session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentEmployee(Option<Employee>);

impl CurrentEmployee {
    pub fn signed_in(employee: Employee) -> Self {
        CurrentEmployee(Some(employee))
    }

    pub fn signed_out() -> Self {
        CurrentEmployee(None)
    }

    pub fn employee(&self) -> Option<&Employee> {
        self.0.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.0.is_some()
    }

    /// A reference suitable for attributing records to this session.
    pub fn reference(&self) -> Ref<Employee> {
        self.0
            .as_ref()
            .and_then(|e| e.id)
            .map_or_else(Ref::none, Ref::to_id)
    }
}
