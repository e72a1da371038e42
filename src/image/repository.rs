use crate::errors::ImageError;
use regex::Regex;
use std::{fmt, str::FromStr};

/// Path of an image repository inside a registry, such as `raptor/frontend`
///
/// Segments are lowercase alphanumeric runs joined by single periods, single
/// or double underscores, or any number of dashes, and are separated by
/// single slashes. The pull scope for token requests is derived from it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Repository(String);

impl Repository {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a [prim@str] as a [Repository]
    ///
    /// ```
    /// # use revprobe::Repository;
    /// assert!(Repository::parse("raptor/frontend").is_ok());
    /// assert!(Repository::parse("Raptor/Frontend").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, ImageError> {
        lazy_static! {
            static ref RE: Regex = Regex::new(concat!(
                "^",
                "[a-z0-9]+(?:(?:[._]|__|[-]*)[a-z0-9]+)*", // first segment
                "(?:/[a-z0-9]+(?:(?:[._]|__|[-]*)[a-z0-9]+)*)*", // more segments
                "$",
            ))
            .unwrap();
        }
        if RE.is_match(s) {
            Ok(Repository(s.to_owned()))
        } else {
            Err(ImageError::InvalidReferenceFormat(s.to_owned()))
        }
    }

    /// Token scope granting read access to this repository
    pub fn pull_scope(&self) -> String {
        format!("repository:{}:pull", self.0)
    }
}

impl FromStr for Repository {
    type Err = ImageError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Repository::parse(s)
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
