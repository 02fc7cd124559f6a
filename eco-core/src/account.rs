//! Login, registration, logout, and recycling reports.
//!
//! The backend answers with free text. Success is recognised by the marker
//! phrase each endpoint puts in its body, not by status code.

use std::sync::Arc;

use crate::model::{Credentials, MaterialSelection, RecyclingReport, Registration};
use crate::ports::{AccountPort, PortError, SessionStore};

/// Body fragment of a successful login.
pub const LOGIN_SUCCESS: &str = "Valid credentials";
/// Body fragment of a successful registration.
pub const REGISTER_SUCCESS: &str = "User registered successfully";
/// Body fragment of a successful logout.
pub const LOGOUT_SUCCESS: &str = "Logged out successfully";
/// Body fragment of an accepted recycling report.
pub const RECYCLING_SUCCESS: &str = "success";

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Registration form problems, checked in declaration order.
pub enum RegistrationError {
    /// Username blank or containing spaces.
    #[error("Username must not be empty or contain spaces")]
    InvalidUsername,
    /// Last name missing.
    #[error("Please enter your last name")]
    MissingLastname,
    /// E-mail address malformed.
    #[error("E-mail address is invalid")]
    InvalidEmail,
    /// Postal address missing.
    #[error("Address must not be empty")]
    MissingAddress,
    /// Password missing.
    #[error("Password must not be empty")]
    MissingPassword,
    /// Confirmation missing.
    #[error("Please confirm your password")]
    MissingConfirmation,
    /// Password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,
}

#[derive(Debug, Clone, Default)]
/// Registration form as typed by the user.
pub struct RegistrationForm {
    /// Username.
    pub username: String,
    /// Last name.
    pub lastname: String,
    /// E-mail address.
    pub email: String,
    /// Postal address.
    pub address: String,
    /// Password.
    pub password: String,
    /// Password typed a second time.
    pub confirm_password: String,
}

impl RegistrationForm {
    /// Check the form and build the request body.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistrationError`] found.
    pub fn validate(&self) -> Result<Registration, RegistrationError> {
        if self.username.trim().is_empty() || self.username.contains(' ') {
            return Err(RegistrationError::InvalidUsername);
        }
        if self.lastname.is_empty() {
            return Err(RegistrationError::MissingLastname);
        }
        if !is_valid_email(&self.email) {
            return Err(RegistrationError::InvalidEmail);
        }
        if self.address.is_empty() {
            return Err(RegistrationError::MissingAddress);
        }
        if self.password.is_empty() {
            return Err(RegistrationError::MissingPassword);
        }
        if self.confirm_password.is_empty() {
            return Err(RegistrationError::MissingConfirmation);
        }
        if self.password != self.confirm_password {
            return Err(RegistrationError::PasswordMismatch);
        }
        Ok(Registration {
            username: self.username.clone(),
            lastname: self.lastname.clone(),
            email: self.email.clone(),
            address: self.address.clone(),
            password: self.password.clone(),
        })
    }
}

/// `local@domain.tld` with no whitespace, a non-empty local part, and a dot
/// inside the domain that is neither its first nor last character.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .split('.')
        .collect::<Vec<_>>()
        .split_first()
        .is_some_and(|(head, rest)| {
            !head.is_empty() && !rest.is_empty() && rest.iter().all(|label| !label.is_empty())
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Outcome of an account call that reached the backend.
pub enum AccountOutcome {
    /// The backend confirmed the operation.
    Accepted,
    /// The backend answered without the success marker; carries the body.
    Rejected(String),
}

impl AccountOutcome {
    fn from_body(body: String, marker: &str) -> Self {
        if body.contains(marker) {
            AccountOutcome::Accepted
        } else {
            AccountOutcome::Rejected(body)
        }
    }

    /// Whether the backend confirmed the operation.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, AccountOutcome::Accepted)
    }
}

#[derive(thiserror::Error, Debug)]
/// Failures of an account flow before or while talking to the backend.
pub enum AccountError {
    /// The registration form is invalid; nothing was sent.
    #[error(transparent)]
    Form(#[from] RegistrationError),
    /// A recycling report must name at least one material.
    #[error("Select at least one kind of material")]
    NothingSelected,
    /// The backend or the session store failed.
    #[error(transparent)]
    Port(#[from] PortError),
}

/// Account flows over the backend and the local session.
pub struct AccountService {
    port: Arc<dyn AccountPort>,
    session: Arc<dyn SessionStore>,
}

impl AccountService {
    /// Bind the service to a backend and a session store.
    #[must_use]
    pub fn new(port: Arc<dyn AccountPort>, session: Arc<dyn SessionStore>) -> Self {
        Self { port, session }
    }

    /// Local session state.
    #[must_use]
    pub fn session(&self) -> &dyn SessionStore {
        self.session.as_ref()
    }

    /// Raw status text from the backend.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Port`] when the request fails.
    pub async fn status(&self) -> Result<String, AccountError> {
        Ok(self.port.status().await?)
    }

    /// Check credentials and remember the user on success.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Port`] when the request or saving the session fails.
    pub async fn login(&self, username: &str, password: &str) -> Result<AccountOutcome, AccountError> {
        let credentials = Credentials {
            username: username.to_owned(),
            password: password.to_owned(),
        };
        let body = self.port.login(&credentials).await?;
        let outcome = AccountOutcome::from_body(body, LOGIN_SUCCESS);
        if outcome.is_accepted() {
            self.session.save(username)?;
            tracing::info!(username, "logged in");
        }
        Ok(outcome)
    }

    /// Validate the form and create the account.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Form`] for an invalid form and
    /// [`AccountError::Port`] when the request fails.
    pub async fn register(&self, form: &RegistrationForm) -> Result<AccountOutcome, AccountError> {
        let registration = form.validate()?;
        let body = self.port.register(&registration).await?;
        Ok(AccountOutcome::from_body(body, REGISTER_SUCCESS))
    }

    /// End the backend session and forget the user on success.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Port`] when the request or clearing the session fails.
    pub async fn logout(&self) -> Result<AccountOutcome, AccountError> {
        let body = self.port.logout().await?;
        let outcome = AccountOutcome::from_body(body, LOGOUT_SUCCESS);
        if outcome.is_accepted() {
            self.session.clear()?;
            tracing::info!("logged out");
        }
        Ok(outcome)
    }

    /// Report recycled material on behalf of the logged in user.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::NothingSelected`] for an empty selection and
    /// [`AccountError::Port`] when the request fails.
    pub async fn submit_recycling(
        &self,
        selection: MaterialSelection,
    ) -> Result<AccountOutcome, AccountError> {
        if selection.is_empty() {
            return Err(AccountError::NothingSelected);
        }
        let report = RecyclingReport::new(selection, self.session.username());
        let body = self.port.submit_recycling(&report).await?;
        Ok(AccountOutcome::from_body(body, RECYCLING_SUCCESS))
    }
}
