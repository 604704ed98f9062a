//! The publishing pipeline: one markdown source in, one self-contained
//! post directory out, with the registry and the listing pages refreshed
//! behind it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use spdlog::info;

use crate::config::Config;
use crate::post::{Category, PostMeta};
use crate::registry::{Registry, Upsert};
use crate::view::post_renderer::PostRenderer;
use crate::{assets, fingerprint, naming, pages, post_render};

pub const POST_TEMPLATE: &str = "post.tpl";

const DESCRIPTION_MAX_LEN: usize = 200;

/// A post about to be published. The title and date determine the id,
/// which pins down the output directory.
pub struct PostDraft {
    pub category: Category,
    pub title: String,
    pub date: NaiveDate,
    pub source_path: PathBuf,
}

pub struct GeneratedPost {
    pub id: String,
    pub post_dir: PathBuf,
    pub outcome: Upsert,
}

/// Publish a draft end to end: resolve media, render the markdown into
/// the post template, write the artifact, upsert the registry record and
/// regenerate the listing pages. Re-publishing with the same title and
/// date replaces the existing post.
pub fn generate_post(config: &Config, draft: &PostDraft) -> Result<GeneratedPost> {
    let title = draft.title.trim();
    if title.is_empty() {
        bail!("Post title must not be empty");
    }
    if !draft.source_path.is_file() {
        bail!("Source file not found: {}", draft.source_path.display());
    }

    let id = naming::post_id(title, draft.date);
    let post_dir = config
        .paths
        .posts_dir
        .join(draft.category.as_str())
        .join(&id);
    fs::create_dir_all(&post_dir)
        .with_context(|| format!("Error creating post directory {}", post_dir.display()))?;

    let source = fs::read_to_string(&draft.source_path)
        .with_context(|| format!("Error reading source file {}", draft.source_path.display()))?;

    let media_root = match &config.paths.media_dir {
        Some(dir) => dir.clone(),
        None => draft
            .source_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    let resolved = assets::resolve_media(&source, &media_root, &post_dir);

    let description = derive_description(&resolved);
    let content = post_render::render_markdown(&resolved)?;

    let tpl_src = pages::read_template(&config.paths.template_dir, POST_TEMPLATE)?;
    let renderer = PostRenderer::new(&tpl_src)?;
    let page = renderer.render(title, draft.date, draft.category, &content);

    let artifact_path = post_dir.join(config.post_file_name());
    pages::write_page(&artifact_path, &page)
        .with_context(|| format!("Error writing artifact {}", artifact_path.display()))?;

    let meta = PostMeta {
        id: id.clone(),
        category: draft.category,
        title: title.to_string(),
        date: draft.date,
        description,
        path: id.clone(),
        fingerprint: Some(fingerprint::digest(page.as_bytes())),
    };

    let registry = Registry::open(&config.registry_path())?;
    let outcome = registry.upsert(&meta)?;
    match outcome {
        Upsert::Inserted => info!("Registered new post {}", id),
        Upsert::Updated => info!("Replaced existing post {}", id),
    }

    pages::regenerate_pages(&registry, config)?;

    Ok(GeneratedPost {
        id,
        post_dir,
        outcome,
    })
}

/// First prose line of the source, clipped to a sensible length. Used as
/// the stored description unless one already exists in the registry.
fn derive_description(source: &str) -> Option<String> {
    for line in source.lines() {
        let line = line.trim();
        if line.is_empty()
            || line.starts_with('#')
            || line.starts_with('<')
            || line.starts_with("![[")
            || line.starts_with("[media not found:")
        {
            continue;
        }
        return Some(clip_at_word(line, DESCRIPTION_MAX_LEN));
    }
    None
}

fn clip_at_word(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }

    let mut clipped = String::new();
    for word in text.split_whitespace() {
        if !clipped.is_empty() && clipped.len() + word.len() + 1 > max_len {
            break;
        }
        if !clipped.is_empty() {
            clipped.push(' ');
        }
        clipped.push_str(word);
    }
    clipped.push_str("...");
    clipped
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::artifact;
    use crate::config::{Paths, Site};
    use crate::test_data::{INDEX_TPL, POST_TPL, SECTION_TPL, SOURCE_MD};

    use super::*;

    fn site_config(root: &Path) -> Config {
        Config {
            paths: Paths {
                base_dir: root.to_path_buf(),
                posts_dir: root.join("webpage"),
                template_dir: root.join("templates"),
                data_dir: root.join("data"),
                media_dir: Some(root.join("media")),
            },
            site: Site {
                url_prefix: None,
                home_post_count: None,
                post_file_name: None,
            },
            log: None,
        }
    }

    fn setup_site(root: &Path) -> Config {
        let config = site_config(root);
        fs::create_dir_all(&config.paths.template_dir).unwrap();
        fs::write(config.paths.template_dir.join(POST_TEMPLATE), POST_TPL).unwrap();
        fs::write(config.paths.template_dir.join(pages::INDEX_TEMPLATE), INDEX_TPL).unwrap();
        fs::write(config.paths.template_dir.join(pages::SECTION_TEMPLATE), SECTION_TPL).unwrap();

        let media_dir = config.paths.media_dir.as_ref().unwrap();
        fs::create_dir_all(media_dir).unwrap();
        fs::write(media_dir.join("Screenshot One.png"), b"png-bytes").unwrap();
        config
    }

    fn sample_draft(root: &Path) -> PostDraft {
        let source_path = root.join("draft.md");
        fs::write(&source_path, SOURCE_MD).unwrap();
        PostDraft {
            category: Category::Blog,
            title: "My First Post".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            source_path,
        }
    }

    #[test]
    fn test_generate_publishes_a_post() {
        let tmp = TempDir::new().unwrap();
        let config = setup_site(tmp.path());
        let draft = sample_draft(tmp.path());

        let generated = generate_post(&config, &draft).unwrap();
        assert_eq!(generated.id, "20240305_my_first_post");
        assert_eq!(generated.outcome, Upsert::Inserted);
        assert_eq!(
            generated.post_dir,
            config.paths.posts_dir.join("blog").join("20240305_my_first_post")
        );

        let page = fs::read_to_string(generated.post_dir.join("post.html")).unwrap();
        assert!(page.contains("<h1>My First Post</h1>"));
        assert!(page.contains(r#"<time datetime="2024-03-05">"#));
        assert!(page.contains("<strong>bold</strong>"));
        assert!(page.contains(r#"<img src="Screenshot%20One.png""#));
        assert!(generated.post_dir.join("Screenshot One.png").is_file());

        // The stored record matches the artifact on disk.
        let registry = Registry::open(&config.registry_path()).unwrap();
        let record = registry.get(&generated.id).unwrap().unwrap();
        assert_eq!(record.title, "My First Post");
        assert_eq!(
            record.description.as_deref(),
            Some("Opening paragraph of the post, which also works as its snippet.")
        );
        assert_eq!(
            record.fingerprint.as_deref(),
            Some(fingerprint::digest(page.as_bytes()).as_str())
        );

        // And the artifact is extractable again, which is what keeps the
        // rescan loop closed.
        let meta = artifact::extract_post_meta(
            &config.paths.posts_dir,
            &generated.post_dir.join("post.html"),
        )
        .unwrap();
        assert_eq!(meta.id, generated.id);
        assert_eq!(meta.title, "My First Post");
        assert_eq!(meta.date, draft.date);

        // Listing pages were refreshed.
        let home = fs::read_to_string(config.paths.base_dir.join(pages::HOME_PAGE)).unwrap();
        assert!(home.contains("/webpage/blog/20240305_my_first_post/post.html"));
    }

    #[test]
    fn test_generate_twice_replaces_the_post() {
        let tmp = TempDir::new().unwrap();
        let config = setup_site(tmp.path());
        let draft = sample_draft(tmp.path());

        let first = generate_post(&config, &draft).unwrap();
        assert_eq!(first.outcome, Upsert::Inserted);

        let second = generate_post(&config, &draft).unwrap();
        assert_eq!(second.outcome, Upsert::Updated);

        let registry = Registry::open(&config.registry_path()).unwrap();
        assert_eq!(registry.get_all().unwrap().len(), 1);
    }

    #[test]
    fn test_generate_rejects_blank_title() {
        let tmp = TempDir::new().unwrap();
        let config = setup_site(tmp.path());
        let mut draft = sample_draft(tmp.path());
        draft.title = "   ".to_string();

        assert!(generate_post(&config, &draft).is_err());
    }

    #[test]
    fn test_generate_rejects_missing_source() {
        let tmp = TempDir::new().unwrap();
        let config = setup_site(tmp.path());
        let mut draft = sample_draft(tmp.path());
        draft.source_path = tmp.path().join("absent.md");

        assert!(generate_post(&config, &draft).is_err());
    }

    #[test]
    fn test_derive_description_skips_non_prose() {
        let source = "# Heading\n\n![[image.png]]\n\n<figure></figure>\n\nThe real first line.\nSecond line.";
        assert_eq!(derive_description(source).as_deref(), Some("The real first line."));
        assert_eq!(derive_description("# Only a heading"), None);
    }

    #[test]
    fn test_derive_description_clips_long_lines() {
        let long = "word ".repeat(100);
        let description = derive_description(&long).unwrap();
        assert!(description.len() <= DESCRIPTION_MAX_LEN + 3);
        assert!(description.ends_with("..."));
    }
}
