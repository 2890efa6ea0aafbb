//! Shared value types for the article domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (e.g. an expiration window is never zero)
//! and participate in domain computations.

use std::str::FromStr;

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::BlogcopError;
use crate::front_matter::{self, MalformedContent};
use crate::{AccountLogin, ArticlePath, BlobSha, BranchName, InstallationId};

// ---------------------------------------------------------------------------
// Expiration policy
// ---------------------------------------------------------------------------

/// How long an article may go without changes before it is considered outdated.
///
/// Parsed from configuration strings such as `"3 months"`, `"1 month"`,
/// `"90 days"` or `"2 weeks"` (weeks are stored as days).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpirationPolicy {
    /// Calendar months. Subtraction clamps to the last valid day of the month.
    Months(u32),
    /// Whole days.
    Days(u32),
}

impl ExpirationPolicy {
    /// Returns the last date on which an unchanged article is still considered
    /// outdated, relative to `today`.
    ///
    /// Dates too far in the past to represent saturate to [`NaiveDate::MIN`].
    pub fn cutoff(self, today: NaiveDate) -> NaiveDate {
        let cutoff = match self {
            Self::Months(n) => today.checked_sub_months(Months::new(n)),
            Self::Days(n) => today.checked_sub_days(Days::new(u64::from(n))),
        };
        cutoff.unwrap_or(NaiveDate::MIN)
    }
}

impl Default for ExpirationPolicy {
    fn default() -> Self {
        Self::Months(3)
    }
}

impl std::fmt::Display for ExpirationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Months(1) => write!(f, "1 month"),
            Self::Months(n) => write!(f, "{n} months"),
            Self::Days(1) => write!(f, "1 day"),
            Self::Days(n) => write!(f, "{n} days"),
        }
    }
}

impl FromStr for ExpirationPolicy {
    type Err = BlogcopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BlogcopError::InvalidExpiration {
            value: s.to_string(),
        };

        let trimmed = s.trim();
        let split_at = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (amount, unit) = trimmed.split_at(split_at);
        let amount: u32 = amount.parse().map_err(|_| invalid())?;
        if amount == 0 {
            return Err(invalid());
        }

        match unit.trim().to_ascii_lowercase().as_str() {
            "month" | "months" => Ok(Self::Months(amount)),
            "week" | "weeks" => amount.checked_mul(7).map(Self::Days).ok_or_else(invalid),
            "day" | "days" => Ok(Self::Days(amount)),
            _ => Err(invalid()),
        }
    }
}

// ---------------------------------------------------------------------------
// Articles
// ---------------------------------------------------------------------------

/// One file listed in the posts directory, before its content is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleEntry {
    /// File name, e.g. `"2017-08-22-some-old-blogpost.md"`.
    pub name: String,
    /// Repository-relative path, e.g. `"_posts/2017-08-22-some-old-blogpost.md"`.
    pub path: ArticlePath,
    /// Blob SHA of the current content on the main branch.
    pub sha: BlobSha,
    /// URL serving the raw file content.
    pub download_url: String,
}

impl ArticleEntry {
    /// Name of the branch carrying the unpublish change for this article.
    pub fn branch_name(&self) -> BranchName {
        BranchName(format!("unpublish/{}", self.name))
    }
}

/// An article whose content and last-change date have both been resolved.
///
/// Built by an explicit fetch step and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    entry: ArticleEntry,
    content: String,
    last_modified: NaiveDate,
}

impl Article {
    /// Creates an [`Article`] from its listing entry and fetched state.
    pub fn new(entry: ArticleEntry, content: impl Into<String>, last_modified: NaiveDate) -> Self {
        Self {
            entry,
            content: content.into(),
            last_modified,
        }
    }

    /// The listing entry the article was fetched from.
    pub fn entry(&self) -> &ArticleEntry {
        &self.entry
    }

    /// Repository-relative path of the post.
    pub fn path(&self) -> &ArticlePath {
        &self.entry.path
    }

    /// Blob SHA the unpublish commit must replace.
    pub fn sha(&self) -> &BlobSha {
        &self.entry.sha
    }

    /// Raw file content, front matter included.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Date of the last commit touching the file on the main branch.
    pub fn last_modified(&self) -> NaiveDate {
        self.last_modified
    }

    /// Returns the article content with its front matter marked `published: false`.
    pub fn unpublished_content(&self) -> Result<String, MalformedContent> {
        front_matter::rewrite_unpublished(&self.content)
    }
}

// ---------------------------------------------------------------------------
// Installations
// ---------------------------------------------------------------------------

/// An installation of the GitHub App on one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installation {
    pub id: InstallationId,
    pub account: AccountLogin,
}
