//! Regeneration of the listing pages: the home page with the latest posts
//! across categories, and one posts.html per category. Pages are written
//! through a temp file and renamed into place, so a crash mid-write never
//! leaves a torn page behind.

use std::path::Path;
use std::{fs, io};

use spdlog::info;
use thiserror::Error;

use crate::config::Config;
use crate::post::Category;
use crate::registry::{PostRecord, Registry, RegistryError};
use crate::view::list_renderer::{ListEntry, ListRenderer};

pub const INDEX_TEMPLATE: &str = "index.tpl";
pub const SECTION_TEMPLATE: &str = "section.tpl";
pub const HOME_PAGE: &str = "index.html";
pub const SECTION_PAGE: &str = "posts.html";

#[derive(Debug, Error)]
pub enum PageError {
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("{0}")]
    Io(#[from] io::Error),
}

/// Rebuild every listing page from the registry. Always writes all of
/// them; deciding whether regeneration is needed at all is the caller's
/// job.
pub fn regenerate_pages(registry: &Registry, config: &Config) -> Result<(), PageError> {
    regenerate_home(registry, config)?;
    for category in Category::ALL {
        regenerate_section(registry, config, category)?;
    }
    Ok(())
}

fn regenerate_home(registry: &Registry, config: &Config) -> Result<(), PageError> {
    let tpl_src = read_template(&config.paths.template_dir, INDEX_TEMPLATE)?;
    let renderer = ListRenderer::new(&tpl_src)?;

    let latest = registry.get_latest(config.home_post_count())?;
    let entries: Vec<ListEntry> = latest
        .iter()
        .map(|record| home_entry(record, config))
        .collect();

    let target = config.paths.base_dir.join(HOME_PAGE);
    write_page(&target, &renderer.render_home(&entries))?;
    info!("Generated {}", target.display());
    Ok(())
}

fn regenerate_section(
    registry: &Registry,
    config: &Config,
    category: Category,
) -> Result<(), PageError> {
    let tpl_src = read_template(&config.paths.template_dir, SECTION_TEMPLATE)?;
    let renderer = ListRenderer::new(&tpl_src)?;

    let records = registry.get_by_category(category)?;
    let entries: Vec<ListEntry> = records
        .iter()
        .map(|record| section_entry(record, config))
        .collect();

    let target = config
        .paths
        .posts_dir
        .join(category.as_str())
        .join(SECTION_PAGE);
    write_page(&target, &renderer.render_section(category.section_title(), &entries))?;
    info!("Generated {}", target.display());
    Ok(())
}

/// Home page links carry the full site prefix, since the home page lives
/// outside the posts tree.
fn home_entry(record: &PostRecord, config: &Config) -> ListEntry {
    ListEntry {
        href: format!(
            "{}/{}/{}/{}",
            config.url_prefix(),
            record.category.as_str(),
            record.path,
            config.post_file_name()
        ),
        title: record.title.clone(),
        date: record.date.format("%Y-%m-%d").to_string(),
    }
}

/// Section pages sit inside the category directory, so their links are
/// relative to it.
fn section_entry(record: &PostRecord, config: &Config) -> ListEntry {
    ListEntry {
        href: format!("{}/{}", record.path, config.post_file_name()),
        title: record.title.clone(),
        date: record.date.format("%Y-%m-%d").to_string(),
    }
}

pub(crate) fn read_template(template_dir: &Path, name: &str) -> io::Result<String> {
    let path = template_dir.join(name);
    match fs::read_to_string(&path) {
        Ok(content) => Ok(content),
        Err(e) => Err(io::Error::new(
            e.kind(),
            format!("Error reading template {}: {}", path.display(), e),
        )),
    }
}

/// Write through a sibling temp file and rename into place. Readers see
/// either the old page or the new one, nothing in between.
pub(crate) fn write_page(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("html.tmp");
    fs::write(&tmp_path, contents)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    Ok(())
}
