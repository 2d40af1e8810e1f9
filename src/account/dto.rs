use serde::Deserialize;

use crate::error::ServiceError;

const DEFAULT_PAGE_SIZE: u32 = 30;

/// Form body for a password change.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// `?page=&page_size=` as received. Values are parsed by hand so a bad
/// number gets the regular error envelope.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl PageQuery {
    pub fn parse(&self) -> Result<(u32, u32), ServiceError> {
        let field = |raw: &Option<String>, default: u32| match raw.as_deref() {
            None => Ok(default),
            Some(v) => v
                .trim()
                .parse::<u32>()
                .map_err(|_| ServiceError::invalid("invalid params")),
        };
        Ok((field(&self.page, 0)?, field(&self.page_size, DEFAULT_PAGE_SIZE)?))
    }
}
