use std::path::Path as FsPath;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    routing::{get, post, put},
    Form, Router,
};
use tracing::{instrument, warn};

use crate::{
    account::{
        dto::{ChangePasswordRequest, PageQuery},
        services::{AccountManager, MAX_AVATAR_BYTES},
    },
    error::ServiceError,
    response::Envelope,
    state::AppState,
    users::{ProfileUpdate, StudyGroup, User},
    validation::parse_id,
};

/// Request bodies on the avatar route may be somewhat larger than the image
/// limit so oversized images reach the size check instead of being cut off.
const AVATAR_BODY_LIMIT: usize = MAX_AVATAR_BYTES + 1024 * 1024;

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(get_users))
        .route(
            "/users/:id",
            get(get_user).put(update_account).delete(delete_user),
        )
        .route("/users/:id/password", put(change_password))
        .route(
            "/users/:id/avatar",
            post(upload_avatar).layer(DefaultBodyLimit::max(AVATAR_BODY_LIMIT)),
        )
        .route("/users/:id/study_groups", get(get_user_study_groups))
}

fn user_id(raw: &str) -> Result<i64, ServiceError> {
    parse_id(raw).ok_or_else(|| ServiceError::invalid("invalid user id"))
}

#[instrument(skip(accounts))]
pub async fn get_user(
    State(accounts): State<AccountManager>,
    Path(id): Path<String>,
) -> Result<Envelope<User>, ServiceError> {
    let user = accounts.get_user(user_id(&id)?).await?;
    Ok(Envelope::ok(user))
}

#[instrument(skip(accounts))]
pub async fn get_users(
    State(accounts): State<AccountManager>,
    Query(q): Query<PageQuery>,
) -> Result<Envelope<Vec<User>>, ServiceError> {
    let (page, page_size) = q.parse()?;
    let users = accounts.get_users(page, page_size).await?;
    Ok(Envelope::ok(users))
}

#[instrument(skip(accounts))]
pub async fn delete_user(
    State(accounts): State<AccountManager>,
    Path(id): Path<String>,
) -> Result<Envelope<()>, ServiceError> {
    accounts.delete_user(user_id(&id)?).await?;
    Ok(Envelope::message("account successfully deleted"))
}

#[instrument(skip(accounts))]
pub async fn get_user_study_groups(
    State(accounts): State<AccountManager>,
    Path(id): Path<String>,
    Query(q): Query<PageQuery>,
) -> Result<Envelope<Vec<StudyGroup>>, ServiceError> {
    let id = user_id(&id)?;
    let (page, page_size) = q.parse()?;
    let groups = accounts.get_user_study_groups(id, page, page_size).await?;
    Ok(Envelope::ok(groups))
}

#[instrument(skip(accounts, form))]
pub async fn update_account(
    State(accounts): State<AccountManager>,
    Path(id): Path<String>,
    Form(form): Form<ProfileUpdate>,
) -> Result<Envelope<User>, ServiceError> {
    let user = accounts.update_account(user_id(&id)?, &form).await?;
    Ok(Envelope::ok(user))
}

#[instrument(skip(accounts, form))]
pub async fn change_password(
    State(accounts): State<AccountManager>,
    Path(id): Path<String>,
    Form(form): Form<ChangePasswordRequest>,
) -> Result<Envelope<User>, ServiceError> {
    let user = accounts
        .change_password(user_id(&id)?, &form.current_password, &form.new_password)
        .await?;
    Ok(Envelope::ok(user))
}

/// Multipart upload; the file is read from the `image` field and its
/// extension taken from the submitted file name.
#[instrument(skip(accounts, mp))]
pub async fn upload_avatar(
    State(accounts): State<AccountManager>,
    Path(id): Path<String>,
    mut mp: Multipart,
) -> Result<Envelope<String>, ServiceError> {
    let id = user_id(&id)?;

    let mut image = None;
    let mut ext = String::new();
    loop {
        let field = match mp.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "multipart read failed");
                return Err(ServiceError::invalid("unable to get image"));
            }
        };
        if field.name() != Some("image") {
            continue;
        }
        ext = field
            .file_name()
            .and_then(|name| FsPath::new(name).extension())
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();
        let data = field.bytes().await.map_err(|e| {
            warn!(error = %e, "image field read failed");
            ServiceError::invalid("unable to get image")
        })?;
        image = Some(data);
        break;
    }

    let url = accounts.upload_avatar(id, &ext, image).await?;
    Ok(Envelope::ok(url))
}
