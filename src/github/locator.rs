//! Repository identifiers, credentials, and API paths.

use std::fmt;

use super::error::ForgeError;

/// Value shipped in sample `.env` files instead of a real token.
pub const PLACEHOLDER_TOKEN: &str = "your_github_token_here";

/// Repository owner wrapper to avoid stringly typed parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryOwner(String);

impl RepositoryOwner {
    pub(crate) fn new(value: &str) -> Result<Self, ForgeError> {
        validate_segment("owner", value)?;
        Ok(Self(value.to_owned()))
    }

    /// Borrow the owner value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Repository name wrapper to prevent parameter mix-ups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryName(String);

impl RepositoryName {
    pub(crate) fn new(value: &str) -> Result<Self, ForgeError> {
        validate_segment("name", value)?;
        Ok(Self(value.to_owned()))
    }

    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

fn validate_segment(label: &str, value: &str) -> Result<(), ForgeError> {
    if value.is_empty() {
        return Err(ForgeError::InvalidRepository {
            message: format!("{label} must not be empty"),
        });
    }
    if value.contains(['/', '?', '#']) || value.chars().any(char::is_whitespace) {
        return Err(ForgeError::InvalidRepository {
            message: format!("{label} contains invalid characters: {value}"),
        });
    }
    Ok(())
}

/// A repository identified as `owner/name`.
///
/// # Example
///
/// ```
/// use tally::github::locator::RepositorySlug;
///
/// let slug = RepositorySlug::parse("stellar/stellar-docs").expect("slug should parse");
/// assert_eq!(slug.owner().as_str(), "stellar");
/// assert_eq!(slug.to_string(), "stellar/stellar-docs");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositorySlug {
    owner: RepositoryOwner,
    repository: RepositoryName,
}

impl RepositorySlug {
    /// Parses an `owner/name` string. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError::InvalidRepository`] unless the input has exactly
    /// two non-empty segments.
    pub fn parse(input: &str) -> Result<Self, ForgeError> {
        let trimmed = input.trim();
        let Some((owner_segment, name_segment)) = trimmed.split_once('/') else {
            return Err(ForgeError::InvalidRepository {
                message: format!("missing '/' in {trimmed:?}"),
            });
        };

        Ok(Self {
            owner: RepositoryOwner::new(owner_segment)?,
            repository: RepositoryName::new(name_segment)?,
        })
    }

    /// Repository owner.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryName {
        &self.repository
    }

    fn repo_path(&self, suffix: &str) -> String {
        format!(
            "/repos/{}/{}/{suffix}",
            self.owner.as_str(),
            self.repository.as_str()
        )
    }

    pub(crate) fn commits_path(&self) -> String {
        self.repo_path("commits")
    }

    pub(crate) fn pulls_path(&self) -> String {
        self.repo_path("pulls")
    }

    pub(crate) fn issues_path(&self) -> String {
        self.repo_path("issues")
    }

    pub(crate) fn reviews_path(&self, pull_number: u64) -> String {
        self.repo_path(&format!("pulls/{pull_number}/reviews"))
    }
}

impl fmt::Display for RepositorySlug {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}/{}",
            self.owner.as_str(),
            self.repository.as_str()
        )
    }
}

/// Personal access token wrapper enforcing a usable value.
#[derive(Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Trims whitespace and rejects blank or placeholder values.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError::Configuration`] when the supplied string is blank
    /// or still the sample placeholder.
    pub fn new(token: impl AsRef<str>) -> Result<Self, ForgeError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() || trimmed == PLACEHOLDER_TOKEN {
            return Err(ForgeError::Configuration {
                message: "token is blank or a placeholder".to_owned(),
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Converts an optional raw value, treating blank and placeholder values
    /// as "no token".
    #[must_use]
    pub fn from_optional(token: Option<&str>) -> Option<Self> {
        token.and_then(|raw| Self::new(raw).ok())
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

impl fmt::Debug for PersonalAccessToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("PersonalAccessToken(***)")
    }
}
