pub mod repo;
pub mod repo_types;

#[cfg(test)]
pub(crate) mod memory;

pub use repo::{PgUserStore, UserStore};
pub use repo_types::{NewUser, PageWindow, ProfileUpdate, StudyGroup, User};
