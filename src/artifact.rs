//! Extraction of post metadata out of published HTML artifacts. The
//! artifacts have a fixed shape (they all come out of the same template),
//! so this is deliberately regex over a real HTML parser: an `<article>`
//! container, the first `<h1>` inside it, and a `<time datetime="...">`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{fs, io};

use chrono::{Local, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use spdlog::warn;
use thiserror::Error;

use crate::fingerprint;
use crate::post::{Category, PostMeta};

lazy_static! {
    static ref TITLE_REGEX: Regex = Regex::new(r"(?s)<h1[^>]*>(?P<title>.*?)</h1>").unwrap();
    static ref DATE_REGEX: Regex =
        Regex::new(r#"<time[^>]*datetime="(?P<date>[^"]*)""#).unwrap();
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{} - file={}", .reason, .path.display())]
    MalformedArtifact { path: PathBuf, reason: &'static str },
    #[error("unknown category '{}' - file={}", .category, .path.display())]
    UnknownCategory { path: PathBuf, category: String },
    #[error("cannot read {}: {}", .path.display(), .source)]
    Unreadable { path: PathBuf, source: io::Error },
}

fn malformed(reason: &'static str, path: &Path) -> ExtractError {
    ExtractError::MalformedArtifact {
        path: path.to_path_buf(),
        reason,
    }
}

/// Read one artifact and derive its registry metadata. The id is the name
/// of the enclosing directory, the category is the directory above that,
/// and the fingerprint is taken over the exact bytes on disk.
pub fn extract_post_meta(posts_root: &Path, artifact_path: &Path) -> Result<PostMeta, ExtractError> {
    let post_dir = artifact_path
        .parent()
        .ok_or_else(|| malformed("artifact has no enclosing directory", artifact_path))?;
    let category_dir = post_dir
        .parent()
        .ok_or_else(|| malformed("artifact has no category directory", artifact_path))?;

    let category_name = category_dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| malformed("artifact has no category directory", artifact_path))?;
    let category: Category =
        category_name
            .parse()
            .map_err(|_| ExtractError::UnknownCategory {
                path: artifact_path.to_path_buf(),
                category: category_name.to_string(),
            })?;

    let id = post_dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| malformed("post directory has no usable name", artifact_path))?
        .to_string();

    let bytes = fs::read(artifact_path).map_err(|e| ExtractError::Unreadable {
        path: artifact_path.to_path_buf(),
        source: e,
    })?;
    let fingerprint = fingerprint::digest(&bytes);
    let html = String::from_utf8_lossy(&bytes);

    // Only look inside the article container. Site chrome above it may
    // carry its own h1.
    let article_start = html
        .find("<article")
        .ok_or_else(|| malformed("no article element", artifact_path))?;
    let article = &html[article_start..];

    let title = TITLE_REGEX
        .captures(article)
        .and_then(|cap| cap.name("title"))
        .map(|m| m.as_str().trim().to_string())
        .ok_or_else(|| malformed("no title element", artifact_path))?;
    if title.is_empty() {
        return Err(malformed("empty title element", artifact_path));
    }

    let raw_date = DATE_REGEX
        .captures(article)
        .and_then(|cap| cap.name("date"))
        .map(|m| m.as_str())
        .ok_or_else(|| malformed("no date element", artifact_path))?;
    let date = match NaiveDate::parse_from_str(raw_date, "%Y-%m-%d") {
        Ok(date) => date,
        Err(e) => {
            warn!(
                "Unparseable date '{}' in {}: {}. Using today",
                raw_date,
                artifact_path.display(),
                e
            );
            Local::now().date_naive()
        }
    };

    // Relative location under the category directory. With the current
    // naming scheme this is just the id.
    let path = match post_dir.strip_prefix(posts_root.join(category.as_str())) {
        Ok(relative) => relative.to_string_lossy().to_string(),
        Err(_) => id.clone(),
    };

    Ok(PostMeta {
        id,
        category,
        title,
        date,
        description: None,
        path,
        fingerprint: Some(fingerprint),
    })
}

#[derive(Debug)]
pub struct SkippedArtifact {
    pub path: PathBuf,
    pub reason: ExtractError,
}

#[derive(Debug, Default)]
pub struct ScanResult {
    pub posts: Vec<PostMeta>,
    pub skipped: Vec<SkippedArtifact>,
}

/// Walk the posts root and extract metadata from every artifact found.
/// One broken artifact never aborts the scan; it is logged and reported
/// in `skipped`. A missing posts root, on the other hand, is an error.
pub fn scan_posts(posts_root: &Path, post_file_name: &str) -> io::Result<ScanResult> {
    if !posts_root.is_dir() {
        return Err(io::Error::new(
            ErrorKind::NotFound,
            format!("Posts root not found: {}", posts_root.display()),
        ));
    }

    let mut result = ScanResult::default();
    for category in Category::ALL {
        let category_dir = posts_root.join(category.as_str());
        if !category_dir.is_dir() {
            continue;
        }

        let entries = fs::read_dir(&category_dir)?;
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let artifact_path = entry.path().join(post_file_name);
            if !artifact_path.is_file() {
                continue;
            }

            match extract_post_meta(posts_root, &artifact_path) {
                Ok(meta) => result.posts.push(meta),
                Err(reason) => {
                    warn!("Skipping artifact: {}", reason);
                    result.skipped.push(SkippedArtifact {
                        path: artifact_path,
                        reason,
                    });
                }
            }
        }
    }

    Ok(result)
}
