//! The user's business profile, created once during onboarding.

mod db;
mod onboarding;

use std::fmt::Display;

use crate::{Error, user::UserID};

pub use db::{create_profile, create_profile_table, get_profile, has_profile};
pub use onboarding::{create_profile_endpoint, get_onboarding_page};

/// A validated, non-empty company name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompanyName(String);

impl CompanyName {
    /// Create a company name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCompanyName] if `name` is empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCompanyName)
        } else {
            Ok(Self(name.to_owned()))
        }
    }

    /// Create a company name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for CompanyName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CompanyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user's business details.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub user_id: UserID,
    pub company_name: CompanyName,
}
