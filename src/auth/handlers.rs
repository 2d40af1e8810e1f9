use axum::{extract::State, routing::post, Form, Router};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, SignupRequest},
        services::CredentialManager,
    },
    error::ServiceError,
    response::Envelope,
    state::AppState,
    users::User,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
}

#[instrument(skip(creds, form))]
pub async fn signup(
    State(creds): State<CredentialManager>,
    Form(form): Form<SignupRequest>,
) -> Result<Envelope<User>, ServiceError> {
    let user = creds
        .signup(&form.first_name, &form.last_name, &form.email, &form.password)
        .await?;
    Ok(Envelope::ok(user))
}

#[instrument(skip(creds, form))]
pub async fn login(
    State(creds): State<CredentialManager>,
    Form(form): Form<LoginRequest>,
) -> Result<Envelope<User>, ServiceError> {
    if form.email.is_empty() || form.password.is_empty() {
        return Err(ServiceError::invalid("invalid params"));
    }
    let user = creds.login(&form.email, &form.password).await?;
    Ok(Envelope::ok(user))
}
