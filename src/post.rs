use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use thiserror::Error;

/// Sections a post can be published under. The registry enforces the same
/// set with a CHECK constraint, so the two must stay in lockstep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Blog,
    Works,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Blog, Category::Works];

    /// Directory name and registry value for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Blog => "blog",
            Category::Works => "works",
        }
    }

    /// Human-facing heading used on the section listing page.
    pub fn section_title(&self) -> &'static str {
        match self {
            Category::Blog => "Blog",
            Category::Works => "Works",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown category: {0}")]
pub struct ParseCategoryError(pub String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blog" => Ok(Category::Blog),
            "works" => Ok(Category::Works),
            other => Err(ParseCategoryError(other.to_string())),
        }
    }
}

/// Everything the site knows about one post, extracted from its artifact
/// or assembled by the generator. `path` is relative to the category
/// directory and under the current naming scheme equals `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct PostMeta {
    pub id: String,
    pub category: Category,
    pub title: String,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub path: String,
    pub fingerprint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let err = "drafts".parse::<Category>().unwrap_err();
        assert_eq!(err, ParseCategoryError("drafts".to_string()));
        assert!("Blog".parse::<Category>().is_err());
    }

    #[test]
    fn test_section_titles() {
        assert_eq!(Category::Blog.section_title(), "Blog");
        assert_eq!(Category::Works.section_title(), "Works");
    }
}
