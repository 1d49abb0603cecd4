//! Lifecycle status of an indexed site

use serde::Serialize;
use std::fmt;

/// Status of a site's indexing job, as persisted in the `site` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SiteStatus {
    /// A crawl job for the site is in progress
    Indexing,

    /// The last job finished without errors and without a stop request
    Indexed,

    /// The last job was stopped or its root page could not be fetched
    Failed,
}

impl SiteStatus {
    /// Returns true once the job for this site has finished, successfully or not
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Indexing)
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Indexing => "INDEXING",
            Self::Indexed => "INDEXED",
            Self::Failed => "FAILED",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "INDEXING" => Some(Self::Indexing),
            "INDEXED" => Some(Self::Indexed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all possible site statuses
    pub fn all_statuses() -> Vec<Self> {
        vec![Self::Indexing, Self::Indexed, Self::Failed]
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!SiteStatus::Indexing.is_terminal());
        assert!(SiteStatus::Indexed.is_terminal());
        assert!(SiteStatus::Failed.is_terminal());
    }

    #[test]
    fn test_from_db_string() {
        assert_eq!(
            SiteStatus::from_db_string("INDEXED"),
            Some(SiteStatus::Indexed)
        );
        assert_eq!(SiteStatus::from_db_string("indexed"), None);
        assert_eq!(SiteStatus::from_db_string(""), None);
    }

    #[test]
    fn test_roundtrip_db_string() {
        for status in SiteStatus::all_statuses() {
            let parsed = SiteStatus::from_db_string(status.to_db_string());
            assert_eq!(Some(status), parsed, "Failed roundtrip for {:?}", status);
        }
    }

    #[test]
    fn test_serializes_like_db_string() {
        let json = serde_json::to_string(&SiteStatus::Failed).unwrap();
        assert_eq!(json, "\"FAILED\"");
    }
}
