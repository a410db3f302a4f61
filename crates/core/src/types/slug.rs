//! URL slugs for products, categories and articles.

use serde::{Deserialize, Serialize};

/// Errors returned by [`Slug::parse`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug cannot be empty")]
    Empty,
    #[error("slug must be at most {max} characters")]
    TooLong { max: usize },
    #[error("slug may only contain lowercase letters, digits and single dashes")]
    InvalidCharacters,
}

/// A URL-safe identifier: lowercase ASCII alphanumerics separated by single dashes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    pub const MAX_LENGTH: usize = 120;

    /// Derive a slug from a human title.
    ///
    /// Non-alphanumeric runs collapse to a single dash. Returns `None` if the
    /// title has no ASCII alphanumerics at all.
    ///
    /// ```
    /// use apothecary_core::Slug;
    ///
    /// let slug = Slug::from_title("Vitamin D3 — 1000 IU (90 caps)").unwrap();
    /// assert_eq!(slug.as_str(), "vitamin-d3-1000-iu-90-caps");
    /// ```
    #[must_use]
    pub fn from_title(title: &str) -> Option<Self> {
        let mut out = String::with_capacity(title.len());
        let mut pending_dash = false;
        for c in title.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_dash && !out.is_empty() {
                    out.push('-');
                }
                pending_dash = false;
                out.push(c.to_ascii_lowercase());
            } else {
                pending_dash = true;
            }
        }
        if out.is_empty() {
            return None;
        }
        if out.len() > Self::MAX_LENGTH {
            out.truncate(Self::MAX_LENGTH);
            while out.ends_with('-') {
                out.pop();
            }
        }
        Some(Self(out))
    }

    /// Validate an existing slug.
    ///
    /// # Errors
    ///
    /// Returns a [`SlugError`] if the value is empty, too long or malformed.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        let well_formed = s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            && !s.starts_with('-')
            && !s.ends_with('-')
            && !s.contains("--");
        if !well_formed {
            return Err(SlugError::InvalidCharacters);
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
