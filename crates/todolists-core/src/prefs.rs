use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use todolists_shared::{Filter, TodoList};
use tracing::{debug, info};

use crate::action::Action;

const FILTERS_FILE: &str = "filters.json";

/// Per-list display filters kept between CLI runs in `filters.json`.
#[derive(Debug)]
pub struct FilterPrefs {
    pub path: PathBuf,
    filters: BTreeMap<String, Filter>,
}

impl FilterPrefs {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;
        let path = data_dir.join(FILTERS_FILE);

        let filters = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed reading {}", path.display()))?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw)
                    .with_context(|| format!("failed parsing {}", path.display()))?
            }
        } else {
            BTreeMap::new()
        };

        info!(file = %path.display(), count = filters.len(), "opened filter preferences");
        Ok(Self { path, filters })
    }

    pub fn get(&self, list_id: &str) -> Option<Filter> {
        self.filters.get(list_id).copied()
    }

    pub fn set(&mut self, list_id: &str, filter: Filter) {
        if filter == Filter::All {
            self.filters.remove(list_id);
        } else {
            self.filters.insert(list_id.to_string(), filter);
        }
    }

    /// `SetListFilter` actions restoring the saved filter of each given list.
    pub fn restore_actions(&self, lists: &[TodoList]) -> Vec<Action> {
        lists
            .iter()
            .filter_map(|list| {
                self.get(&list.id).map(|filter| Action::SetListFilter {
                    id: list.id.clone(),
                    filter,
                })
            })
            .collect()
    }

    /// Drops entries for lists that no longer exist.
    pub fn retain_lists(&mut self, lists: &[TodoList]) {
        let before = self.filters.len();
        self.filters
            .retain(|id, _| lists.iter().any(|list| &list.id == id));
        if before != self.filters.len() {
            debug!(pruned = before - self.filters.len(), "pruned stale filters");
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn save(&self) -> anyhow::Result<()> {
        debug!(file = %self.path.display(), count = self.filters.len(), "saving filters atomically");
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        let serialized = serde_json::to_string_pretty(&self.filters)?;
        writeln!(temp, "{serialized}")?;
        temp.flush()?;
        temp.persist(&self.path)
            .map_err(|err| anyhow!("failed to persist {}: {}", self.path.display(), err))?;
        Ok(())
    }
}
