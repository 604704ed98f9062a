//! The reconciliation pass. Scans the published artifacts, diffs them
//! against the registry, applies the difference record by record, and
//! regenerates the listing pages only when something actually changed.
//!
//! A second pass over an unchanged site is a no-op: no registry writes,
//! no page writes.

use std::collections::BTreeMap;
use std::io;

use spdlog::{error, info, warn};
use thiserror::Error;

use crate::artifact::{self, SkippedArtifact};
use crate::config::Config;
use crate::pages::{self, PageError};
use crate::post::PostMeta;
use crate::registry::{PostRecord, Registry, RegistryError};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("page regeneration failed: {0}")]
    Page(#[from] PageError),
    #[error("{0}")]
    Io(#[from] io::Error),
}

/// A registry mutation that failed for one record. The pass carries on;
/// the failure is reported at the end.
#[derive(Debug)]
pub struct FailedMutation {
    pub id: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
    pub skipped: Vec<SkippedArtifact>,
    pub failed: Vec<FailedMutation>,
    pub regenerated: bool,
}

impl SyncReport {
    /// True when the pass actually mutated the registry.
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.updated.is_empty() || !self.removed.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Added: {}, Updated: {}, Removed: {}",
            self.added.len(),
            self.updated.len(),
            self.removed.len()
        )
    }
}

/// Run one full reconciliation pass. `force` regenerates the listing
/// pages even when the registry comes out unchanged; it does not touch
/// the per-record diff logic.
pub fn sync_posts(config: &Config, force: bool) -> Result<SyncReport, SyncError> {
    let registry = Registry::open(&config.registry_path())?;
    let scan = artifact::scan_posts(&config.paths.posts_dir, config.post_file_name())?;

    let mut current: BTreeMap<String, PostMeta> = BTreeMap::new();
    for meta in scan.posts {
        if let Some(previous) = current.insert(meta.id.clone(), meta) {
            warn!(
                "Post id {} appears in more than one category; keeping the last one scanned",
                previous.id
            );
        }
    }

    let existing: BTreeMap<String, PostRecord> = registry
        .get_all()?
        .into_iter()
        .map(|record| (record.id.clone(), record))
        .collect();

    let mut report = SyncReport {
        skipped: scan.skipped,
        ..SyncReport::default()
    };

    for (id, meta) in &current {
        match existing.get(id) {
            None => match registry.add(meta) {
                Ok(()) => {
                    info!("Added post {} ({})", id, meta.title);
                    report.added.push(id.clone());
                }
                Err(e) => {
                    error!("Failed to add {}: {}", id, e);
                    report.failed.push(FailedMutation {
                        id: id.clone(),
                        error: e.to_string(),
                    });
                }
            },
            Some(record) => {
                if needs_refresh(record, meta) {
                    match registry.update(id, meta) {
                        Ok(()) => {
                            info!("Updated post {} ({})", id, meta.title);
                            report.updated.push(id.clone());
                        }
                        Err(e) => {
                            error!("Failed to update {}: {}", id, e);
                            report.failed.push(FailedMutation {
                                id: id.clone(),
                                error: e.to_string(),
                            });
                        }
                    }
                }
            }
        }
    }

    for id in existing.keys() {
        if current.contains_key(id) {
            continue;
        }
        match registry.delete(id) {
            Ok(()) => {
                info!("Removed post {}", id);
                report.removed.push(id.clone());
            }
            Err(e) => {
                error!("Failed to remove {}: {}", id, e);
                report.failed.push(FailedMutation {
                    id: id.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    if report.has_changes() || force {
        info!("Regenerating listing pages");
        if let Err(e) = pages::regenerate_pages(&registry, config) {
            error!(
                "Page regeneration failed after registry changes were applied ({}): {}",
                report.summary(),
                e
            );
            return Err(e.into());
        }
        report.regenerated = true;
    } else {
        info!("No changes detected, skipping page regeneration");
    }

    Ok(report)
}

/// A record needs a refresh when its stored fingerprint differs from the
/// artifact's, or when it has none at all. Records without a fingerprint
/// predate fingerprinting and heal themselves on the next pass.
fn needs_refresh(record: &PostRecord, meta: &PostMeta) -> bool {
    match record.fingerprint.as_deref() {
        None | Some("") => true,
        stored => stored != meta.fingerprint.as_deref(),
    }
}
