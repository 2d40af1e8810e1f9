//! In-memory `UserStore` used by the unit tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::error::StoreError;
use crate::users::repo::{StoreResult, UserStore};
use crate::users::repo_types::{NewUser, PageWindow, ProfileUpdate, StudyGroup, User};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    groups: BTreeMap<i64, StudyGroup>,
    members: Vec<(i64, i64)>, // (group_id, user_id)
}

/// Mirrors the postgres schema closely enough for service tests: ids are
/// assigned on insert and email is unique.
#[derive(Default)]
pub struct MemoryUserStore {
    tables: Mutex<Tables>,
    /// Makes `email_exists` always answer `false`, as a concurrent signup would.
    pub stale_exists: AtomicBool,
    /// Makes every update statement fail with a backend error.
    pub fail_updates: AtomicBool,
}

impl MemoryUserStore {
    pub fn user_count(&self) -> usize {
        self.tables.lock().unwrap().users.len()
    }

    pub fn add_group(&self, name: &str, members: &[i64]) -> i64 {
        let mut t = self.tables.lock().unwrap();
        let id = t.groups.len() as i64 + 1;
        t.groups.insert(
            id,
            StudyGroup {
                id,
                name: name.to_string(),
                description: String::new(),
                created_at: OffsetDateTime::now_utc(),
            },
        );
        t.members.extend(members.iter().map(|u| (id, *u)));
        id
    }

    fn update<F>(&self, id: i64, apply: F) -> StoreResult<User>
    where
        F: FnOnce(&mut User),
    {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(anyhow::anyhow!("connection reset")));
        }
        let mut t = self.tables.lock().unwrap();
        let user = t.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        apply(user);
        Ok(user.clone())
    }
}

fn window<T>(items: impl Iterator<Item = T>, w: PageWindow) -> Vec<T> {
    let skip = usize::try_from(w.offset).unwrap_or(usize::MAX);
    let take = usize::try_from(w.limit).unwrap_or(usize::MAX);
    items.skip(skip).take(take).collect()
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: i64) -> StoreResult<User> {
        let t = self.tables.lock().unwrap();
        t.users.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<User> {
        let t = self.tables.lock().unwrap();
        t.users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        if self.stale_exists.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let t = self.tables.lock().unwrap();
        Ok(t.users.values().any(|u| u.email == email))
    }

    async fn insert(&self, new: &NewUser) -> StoreResult<User> {
        let mut t = self.tables.lock().unwrap();
        if t.users.values().any(|u| u.email == new.email) {
            return Err(StoreError::UniqueViolation);
        }
        t.next_id += 1;
        let user = User {
            id: t.next_id,
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            bio: String::new(),
            school: String::new(),
            major1: String::new(),
            major2: String::new(),
            minor: String::new(),
            avatar_url: None,
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_profile(&self, id: i64, p: &ProfileUpdate) -> StoreResult<User> {
        self.update(id, |u| {
            u.first_name = p.first_name.clone();
            u.last_name = p.last_name.clone();
            u.bio = p.bio.clone();
            u.school = p.school.clone();
            u.major1 = p.major1.clone();
            u.major2 = p.major2.clone();
            u.minor = p.minor.clone();
        })
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> StoreResult<User> {
        self.update(id, |u| u.password_hash = password_hash.to_string())
    }

    async fn update_avatar(&self, id: i64, avatar_url: &str) -> StoreResult<User> {
        self.update(id, |u| u.avatar_url = Some(avatar_url.to_string()))
    }

    async fn list(&self, w: PageWindow) -> StoreResult<Vec<User>> {
        let t = self.tables.lock().unwrap();
        Ok(window(t.users.values().cloned(), w))
    }

    async fn list_study_groups(&self, user_id: i64, w: PageWindow) -> StoreResult<Vec<StudyGroup>> {
        let t = self.tables.lock().unwrap();
        let groups = t
            .groups
            .values()
            .filter(|g| t.members.contains(&(g.id, user_id)))
            .cloned();
        Ok(window(groups, w))
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let mut t = self.tables.lock().unwrap();
        t.users.remove(&id).ok_or(StoreError::NotFound)?;
        t.members.retain(|(_, u)| *u != id);
        Ok(())
    }
}
