use std::sync::Arc;

use bytes::Bytes;
use tracing::{error, info, instrument, warn};

use crate::auth::password::Hasher;
use crate::error::{ServiceError, StoreError};
use crate::storage::StorageClient;
use crate::users::{PageWindow, ProfileUpdate, StudyGroup, User, UserStore};
use crate::validation::{
    strip_spaces, trimmed_within, MAX_BIO_LEN, MAX_NAME_LEN, MAX_SCHOOL_LEN, MAX_STUDY_LEN,
    MIN_PASSWORD_LEN,
};

/// Largest accepted avatar, inclusive.
pub const MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;

const USER_NOT_FOUND: &str = "user not found";
const INVALID_PARAMS: &str = "invalid params";

/// Profile, password and avatar changes for an existing user, plus the plain
/// read/delete passthroughs.
#[derive(Clone)]
pub struct AccountManager {
    store: Arc<dyn UserStore>,
    storage: Arc<dyn StorageClient>,
    hasher: Hasher,
}

/// Maps a store failure for a keyed lookup or write on `user_id`.
fn store_failure(e: StoreError, user_id: i64, op: &'static str) -> ServiceError {
    match e {
        StoreError::NotFound => ServiceError::NotFound(USER_NOT_FOUND.into()),
        other => {
            error!(error = %other, user_id, op, "user store failed");
            ServiceError::internal(format!("unable to {op}"))
        }
    }
}

impl AccountManager {
    pub fn new(store: Arc<dyn UserStore>, storage: Arc<dyn StorageClient>, hasher: Hasher) -> Self {
        Self {
            store,
            storage,
            hasher,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, user_id: i64) -> Result<User, ServiceError> {
        self.store
            .find_by_id(user_id)
            .await
            .map_err(|e| store_failure(e, user_id, "get user"))
    }

    #[instrument(skip(self))]
    pub async fn get_users(&self, page: u32, page_size: u32) -> Result<Vec<User>, ServiceError> {
        self.store
            .list(PageWindow::new(page, page_size))
            .await
            .map_err(|e| {
                error!(error = %e, "list users failed");
                ServiceError::internal("unable to get users")
            })
    }

    #[instrument(skip(self))]
    pub async fn get_user_study_groups(
        &self,
        user_id: i64,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<StudyGroup>, ServiceError> {
        self.get_user(user_id).await?;
        self.store
            .list_study_groups(user_id, PageWindow::new(page, page_size))
            .await
            .map_err(|e| store_failure(e, user_id, "get study groups"))
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: i64) -> Result<(), ServiceError> {
        self.store
            .delete(user_id)
            .await
            .map_err(|e| store_failure(e, user_id, "delete account"))?;
        info!(user_id, "account deleted");
        Ok(())
    }

    /// Overwrites the seven profile fields. Every field is trimmed and checked
    /// before anything is written.
    #[instrument(skip(self, profile))]
    pub async fn update_account(
        &self,
        user_id: i64,
        profile: &ProfileUpdate,
    ) -> Result<User, ServiceError> {
        let profile = normalize_profile(profile).ok_or_else(|| {
            warn!(user_id, "profile update rejected");
            ServiceError::invalid(INVALID_PARAMS)
        })?;

        let user = self
            .store
            .update_profile(user_id, &profile)
            .await
            .map_err(|e| store_failure(e, user_id, "update account"))?;
        info!(user_id, "profile updated");
        Ok(user)
    }

    /// Re-authenticates with `current` and replaces the stored hash with one
    /// of `desired`. Spaces anywhere in either password are dropped first.
    ///
    /// There is no conditional write: two concurrent changes for the same
    /// user both succeed and the last one wins.
    #[instrument(skip(self, current, desired))]
    pub async fn change_password(
        &self,
        user_id: i64,
        current: &str,
        desired: &str,
    ) -> Result<User, ServiceError> {
        let current = strip_spaces(current);
        let desired = strip_spaces(desired);

        if current.is_empty() || desired.is_empty() {
            return Err(ServiceError::invalid(INVALID_PARAMS));
        }
        if desired.chars().count() < MIN_PASSWORD_LEN {
            return Err(ServiceError::invalid(format!(
                "new password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let user = self.get_user(user_id).await?;
        let ok = self.hasher.verify(&current, &user.password_hash).map_err(|e| {
            error!(error = %e, user_id, "verify_password failed");
            ServiceError::internal("unable to change password")
        })?;
        if !ok {
            warn!(user_id, "change password with wrong current password");
            return Err(ServiceError::BadCredentials("incorrect password".into()));
        }

        let hash = self.hasher.hash(&desired).map_err(|e| {
            error!(error = %e, user_id, "hash_password failed");
            ServiceError::internal("unable to change password")
        })?;
        let user = self
            .store
            .update_password(user_id, &hash)
            .await
            .map_err(|e| store_failure(e, user_id, "change password"))?;
        info!(user_id, "password changed");
        Ok(user)
    }

    /// Stores the image under `avatars/{user_id}.{ext}` and points the user's
    /// avatar at it. The key depends only on the user and extension, so a
    /// retry after a failed row update overwrites the same object.
    #[instrument(skip(self, image))]
    pub async fn upload_avatar(
        &self,
        user_id: i64,
        file_extension: &str,
        image: Option<Bytes>,
    ) -> Result<String, ServiceError> {
        let image = image.ok_or_else(|| ServiceError::invalid("unable to get image"))?;
        if image.len() > MAX_AVATAR_BYTES {
            warn!(user_id, size = image.len(), "avatar too large");
            return Err(ServiceError::invalid("image size must be 2MB or less"));
        }
        let (ext, content_type) = image_type(file_extension)
            .ok_or_else(|| ServiceError::invalid("unsupported image type"))?;

        self.get_user(user_id).await?;

        let key = format!("avatars/{user_id}.{ext}");
        let url = self
            .storage
            .store(&key, image, content_type)
            .await
            .map_err(|e| {
                error!(error = %e, user_id, key = %key, "avatar put_object failed");
                ServiceError::internal("unable to upload image")
            })?;

        match self.store.update_avatar(user_id, &url).await {
            Ok(_) => {
                info!(user_id, key = %key, "avatar uploaded");
                Ok(url)
            }
            Err(e) => {
                // The object stays under `key`; the next upload for this user
                // and extension overwrites it.
                error!(error = %e, user_id, key = %key, "avatar stored but user row not updated");
                Err(match e {
                    StoreError::NotFound => ServiceError::NotFound(USER_NOT_FOUND.into()),
                    _ => ServiceError::internal("unable to upload image"),
                })
            }
        }
    }
}

fn normalize_profile(p: &ProfileUpdate) -> Option<ProfileUpdate> {
    let first_name = trimmed_within(&p.first_name, MAX_NAME_LEN).filter(|n| !n.is_empty())?;
    Some(ProfileUpdate {
        first_name,
        last_name: trimmed_within(&p.last_name, MAX_NAME_LEN)?,
        bio: trimmed_within(&p.bio, MAX_BIO_LEN)?,
        school: trimmed_within(&p.school, MAX_SCHOOL_LEN)?,
        major1: trimmed_within(&p.major1, MAX_STUDY_LEN)?,
        major2: trimmed_within(&p.major2, MAX_STUDY_LEN)?,
        minor: trimmed_within(&p.minor, MAX_STUDY_LEN)?,
    })
}

/// Normalized extension and content type for an accepted image extension.
fn image_type(ext: &str) -> Option<(&'static str, &'static str)> {
    let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some(("jpg", "image/jpeg")),
        "png" => Some(("png", "image/png")),
        "gif" => Some(("gif", "image/gif")),
        "webp" => Some(("webp", "image/webp")),
        _ => None,
    }
}
