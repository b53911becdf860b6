//! # Login Service
//!
//! Signs employees in and out of the back office.
//!
//! ## Sign-in Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sign_in("a@x.com", "secret")                                          │
//! │       │                                                                 │
//! │       ├── blank field? ──────────────────────► ValidationError          │
//! │       ▼                                                                 │
//! │  find_one_by_field(Employee::EMAIL, "a@x.com")                         │
//! │       │                                                                 │
//! │       ├── found = false ─────────────────────► UnknownUser              │
//! │       ▼                                                                 │
//! │  PasswordVerifier::verify(password, hash)                              │
//! │       │                                                                 │
//! │       ├── mismatch ──────────────────────────► InvalidPassword          │
//! │       ▼                                                                 │
//! │  registry.rebind(CurrentEmployee::signed_in(employee))                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  audit.record("login", email)   ← attributed to the new session        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The session is only rebound once the password checks out.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher};
use tracing::{debug, info, warn};

use sparks_core::validation::{validate_email, validate_name, validate_required};
use sparks_core::{CurrentEmployee, Employee, EmployeeRole, Registry};
use sparks_db::{AuditLog, Repository};

use crate::error::{AppError, AppResult, ErrorCode};

// =============================================================================
// Password Hashing
// =============================================================================

/// Checks a password against a stored hash.
pub trait PasswordVerifier: Send + Sync {
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Argon2id verification of PHC-format hashes.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Verifier;

impl PasswordVerifier for Argon2Verifier {
    fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };

        argon2::PasswordVerifier::verify_password(&Argon2::default(), password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// Hashes a password for storage.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

// =============================================================================
// Service
// =============================================================================

pub struct LoginService {
    repository: Arc<Repository>,
    audit: Arc<AuditLog>,
    registry: Arc<Registry>,
    verifier: Arc<dyn PasswordVerifier>,
}

impl LoginService {
    pub fn new(registry: &Arc<Registry>) -> Self {
        LoginService {
            repository: registry.require::<Repository>(),
            audit: registry.require::<AuditLog>(),
            registry: registry.clone(),
            verifier: Arc::new(Argon2Verifier),
        }
    }

    /// Replaces the password check (tests use a cheap one).
    pub fn with_verifier(mut self, verifier: Arc<dyn PasswordVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Signs in the employee with `email` and makes them the current session.
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<Employee> {
        let (email, password) = match (email.trim(), password) {
            ("", _) | (_, "") => {
                return Err(AppError::validation("Enter both user and password"));
            }
            (email, password) => (email, password),
        };

        let employee = self
            .repository
            .find_one_by_field(Employee::EMAIL, email)
            .await?
            .into_option()
            .ok_or_else(|| {
                warn!(email, "Sign-in for unknown user");
                AppError::new(ErrorCode::UnknownUser, "User not found")
            })?;

        if !self.verifier.verify(password, &employee.password_hash) {
            warn!(email, "Sign-in with invalid password");
            return Err(AppError::new(ErrorCode::InvalidPassword, "Invalid password"));
        }

        self.registry
            .rebind(CurrentEmployee::signed_in(employee.clone()));
        self.audit.record("login", email).await;
        info!(employee = ?employee.id, role = %employee.role, "Employee signed in");
        Ok(employee)
    }

    /// Ends the current session. Signing out twice is harmless.
    pub async fn sign_out(&self) {
        let session = self.registry.get::<CurrentEmployee>();
        if let Some(employee) = session.employee() {
            self.audit.record("logout", &employee.email).await;
            info!(employee = ?employee.id, "Employee signed out");
        }
        self.registry.rebind(CurrentEmployee::signed_out());
    }

    /// The employee of the current session.
    pub fn current(&self) -> AppResult<Employee> {
        self.registry
            .get::<CurrentEmployee>()
            .employee()
            .cloned()
            .ok_or_else(|| AppError::new(ErrorCode::NotSignedIn, "Nobody is signed in"))
    }

    /// Creates an employee account with a freshly hashed password.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: EmployeeRole,
    ) -> AppResult<Employee> {
        let name = validate_name("name", name)?;
        let email = validate_email(email)?;
        let password = validate_required("password", password)?;

        let mut employee = Employee::new(name, email, hash_password(&password)?, role);
        self.repository.upsert(&mut employee).await?;
        debug!(employee = ?employee.id, role = %role, "Employee registered");
        Ok(employee)
    }
}
