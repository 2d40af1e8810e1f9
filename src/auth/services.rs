use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::auth::password::Hasher;
use crate::error::{ServiceError, StoreError};
use crate::users::{NewUser, User, UserStore};
use crate::validation::{is_valid_email, trimmed_within, MAX_NAME_LEN};

const LOGIN_FAILED: &str = "unable to login";
const SIGNUP_FAILED: &str = "unable to create account";
const ACCOUNT_EXISTS: &str = "account already exists";

/// Signup and login against the user store.
#[derive(Clone)]
pub struct CredentialManager {
    store: Arc<dyn UserStore>,
    hasher: Hasher,
}

impl CredentialManager {
    pub fn new(store: Arc<dyn UserStore>, hasher: Hasher) -> Self {
        Self { store, hasher }
    }

    /// Verifies `password` for the account registered under `email`.
    ///
    /// The email must match exactly and the password is compared as given.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        let user = match self.store.find_by_email(email).await {
            Ok(u) => u,
            Err(StoreError::NotFound) => {
                warn!(email, "login unknown email");
                return Err(ServiceError::NotAuthenticated(
                    "account does not exist".into(),
                ));
            }
            Err(e) => {
                error!(error = %e, "find_by_email failed");
                return Err(ServiceError::internal(LOGIN_FAILED));
            }
        };

        let ok = self.hasher.verify(password, &user.password_hash).map_err(|e| {
            error!(error = %e, user_id = user.id, "verify_password failed");
            ServiceError::internal(LOGIN_FAILED)
        })?;

        if !ok {
            warn!(email, user_id = user.id, "login invalid password");
            return Err(ServiceError::BadCredentials("incorrect password".into()));
        }

        info!(user_id = user.id, "user logged in");
        Ok(user)
    }

    /// Creates an account. The existence check is only a fast path; a unique
    /// violation from the store is reported the same way.
    #[instrument(skip(self, password))]
    pub async fn signup(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ServiceError> {
        let first_name = trimmed_within(first_name, MAX_NAME_LEN)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ServiceError::invalid("invalid first name"))?;
        let last_name = trimmed_within(last_name, MAX_NAME_LEN)
            .ok_or_else(|| ServiceError::invalid("invalid last name"))?;
        if !is_valid_email(email) {
            warn!(email, "invalid email");
            return Err(ServiceError::invalid("invalid email"));
        }
        if password.is_empty() {
            return Err(ServiceError::invalid("invalid password"));
        }

        match self.store.email_exists(email).await {
            Ok(true) => {
                warn!(email, "email already registered");
                return Err(ServiceError::Conflict(ACCOUNT_EXISTS.into()));
            }
            Ok(false) => {}
            Err(e) => {
                error!(error = %e, "email_exists failed");
                return Err(ServiceError::internal(SIGNUP_FAILED));
            }
        }

        let password_hash = self.hasher.hash(password).map_err(|e| {
            error!(error = %e, "hash_password failed");
            ServiceError::internal(SIGNUP_FAILED)
        })?;

        let new_user = NewUser {
            first_name,
            last_name,
            email: email.to_string(),
            password_hash,
        };

        let user = match self.store.insert(&new_user).await {
            Ok(u) => u,
            Err(StoreError::UniqueViolation) => {
                warn!(email, "email registered concurrently");
                return Err(ServiceError::Conflict(ACCOUNT_EXISTS.into()));
            }
            Err(e) => {
                error!(error = %e, "create user failed");
                return Err(ServiceError::internal(SIGNUP_FAILED));
            }
        };

        info!(user_id = user.id, email = %user.email, "user registered");
        Ok(user)
    }
}
