//! Media resolution for markdown sources. References use the wikilink
//! form `![[name]]`; each one is copied next to the artifact and replaced
//! with figure markup, so a published post directory carries everything
//! it needs.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{fs, io};

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use spdlog::warn;

lazy_static! {
    static ref WIKILINK_REGEX: Regex = Regex::new(r"!\[\[(?P<name>[^\]]+)\]\]").unwrap();
}

const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "webm", "ogg", "mov"];

/// Replace every wikilink in `source`, copying the referenced files into
/// `post_dir`. A missing file never fails the pipeline; it leaves a
/// visible placeholder in the text instead.
pub fn resolve_media(source: &str, media_root: &Path, post_dir: &Path) -> String {
    WIKILINK_REGEX
        .replace_all(source, |caps: &Captures| {
            let name = caps.name("name").unwrap().as_str().trim();
            match copy_media(name, media_root, post_dir) {
                Ok(file_name) => media_markup(&file_name),
                Err(e) => {
                    warn!("Could not resolve media '{}': {}", name, e);
                    format!("[media not found: {}]", name)
                }
            }
        })
        .to_string()
}

fn copy_media(name: &str, media_root: &Path, post_dir: &Path) -> io::Result<String> {
    let source = find_media_file(media_root, name).ok_or_else(|| {
        io::Error::new(
            ErrorKind::NotFound,
            format!("no file named '{}' under {}", name, media_root.display()),
        )
    })?;

    // Use the name of the file as found on disk, not as written in the
    // wikilink. The search is case insensitive.
    let file_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| io::Error::new(ErrorKind::InvalidData, "media file has no usable name"))?
        .to_string();

    fs::copy(&source, post_dir.join(&file_name))?;
    Ok(file_name)
}

/// Exact path first, then a recursive case-insensitive search by file
/// name. First hit wins.
fn find_media_file(media_root: &Path, name: &str) -> Option<PathBuf> {
    let direct = media_root.join(name);
    if direct.is_file() {
        return Some(direct);
    }
    find_by_name(media_root, &name.to_lowercase())
}

fn find_by_name(dir: &Path, lowered: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = find_by_name(&path, lowered) {
                return Some(found);
            }
        } else if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
            if file_name.to_lowercase() == lowered {
                return Some(path);
            }
        }
    }
    None
}

fn media_markup(file_name: &str) -> String {
    let encoded = percent_encode(file_name);
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
        format!(
            "<figure>\n    <video controls>\n        <source src=\"{}\" type=\"video/{}\" />\n        Your browser does not support the video tag.\n    </video>\n</figure>",
            encoded, extension
        )
    } else {
        format!(
            "<figure>\n    <img src=\"{}\" alt=\"{}\" />\n</figure>",
            encoded, file_name
        )
    }
}

/// RFC 3986 unreserved characters stay as-is, everything else becomes a
/// percent-escaped byte. File names end up in src attributes, so spaces
/// and friends must not leak through.
fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        let keep = matches!(b,
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~');
        if keep {
            out.push(b as char);
        } else {
            out.push('%');
            out.push_str(&format!("{:02X}", b));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let media_root = tmp.path().join("media");
        let post_dir = tmp.path().join("post");
        fs::create_dir_all(&media_root).unwrap();
        fs::create_dir_all(&post_dir).unwrap();
        (tmp, media_root, post_dir)
    }

    #[test]
    fn test_image_wikilink_becomes_figure() {
        let (_tmp, media_root, post_dir) = setup();
        fs::write(media_root.join("Screenshot One.png"), b"png-bytes").unwrap();

        let source = "Before\n\n![[Screenshot One.png]]\n\nAfter";
        let resolved = resolve_media(source, &media_root, &post_dir);

        assert!(resolved.contains(r#"<img src="Screenshot%20One.png" alt="Screenshot One.png" />"#));
        assert!(resolved.starts_with("Before"));
        assert!(resolved.ends_with("After"));
        assert!(post_dir.join("Screenshot One.png").is_file());
    }

    #[test]
    fn test_video_wikilink_becomes_video_element() {
        let (_tmp, media_root, post_dir) = setup();
        fs::write(media_root.join("demo.mp4"), b"mp4-bytes").unwrap();

        let resolved = resolve_media("![[demo.mp4]]", &media_root, &post_dir);
        assert!(resolved.contains("<video controls>"));
        assert!(resolved.contains(r#"<source src="demo.mp4" type="video/mp4" />"#));
        assert!(post_dir.join("demo.mp4").is_file());
    }

    #[test]
    fn test_search_is_recursive_and_case_insensitive() {
        let (_tmp, media_root, post_dir) = setup();
        let nested = media_root.join("2024").join("shots");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("Photo.JPG"), b"jpg-bytes").unwrap();

        let resolved = resolve_media("![[photo.jpg]]", &media_root, &post_dir);
        // The copy keeps the on-disk name.
        assert!(resolved.contains(r#"alt="Photo.JPG""#));
        assert!(post_dir.join("Photo.JPG").is_file());
    }

    #[test]
    fn test_missing_media_leaves_placeholder() {
        let (_tmp, media_root, post_dir) = setup();

        let resolved = resolve_media("See ![[ghost.png]] here", &media_root, &post_dir);
        assert_eq!(resolved, "See [media not found: ghost.png] here");
    }

    #[test]
    fn test_text_without_wikilinks_is_untouched() {
        let (_tmp, media_root, post_dir) = setup();
        let source = "Plain text with ![ordinary](markdown.png) images.";
        assert_eq!(resolve_media(source, &media_root, &post_dir), source);
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("simple.png"), "simple.png");
        assert_eq!(percent_encode("a b(c).png"), "a%20b%28c%29.png");
        assert_eq!(percent_encode("~A-Z_0.9"), "~A-Z_0.9");
    }
}
