use crate::output::VARIATIONS_SUFFIX;
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Which directories a bulk run walks into
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Directory names, or paths relative to the root, to skip entirely
    pub ignore_dirs: Vec<PathBuf>,
    pub ignore_hidden: bool,
}

impl Discovery {
    fn skips(&self, root: &Path, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        if name.ends_with(VARIATIONS_SUFFIX) {
            return true;
        }
        if self.ignore_hidden && name.starts_with('.') {
            return true;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        self.ignore_dirs
            .iter()
            .any(|ignored| relative == ignored || entry.path().ends_with(ignored))
    }

    /// Every `.yaml`/`.yml` file under `root`, in a stable order
    pub fn templates(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            bail!(
                "{} is not a directory. Use the single-template command instead.",
                root.display()
            );
        }

        let mut templates = Vec::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.skips(root, entry));
        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() && is_template(entry.path()) {
                templates.push(entry.into_path());
            }
        }
        Ok(templates)
    }
}

fn is_template(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Where the variations of `template` go in a bulk run.
///
/// Mirrors the template's directory below `root` unless `flatten` is set.
pub fn output_dir_for(root: &Path, template: &Path, output: &Path, flatten: bool) -> PathBuf {
    let base = if flatten {
        output.to_path_buf()
    } else {
        let parent = template.parent().unwrap_or(root);
        output.join(parent.strip_prefix(root).unwrap_or(Path::new("")))
    };
    base.join(format!(
        "{}{}",
        crate::output::stem(template),
        VARIATIONS_SUFFIX
    ))
}

/// Directory of the error artifact for `template`, next to its variations directory
pub fn error_dir_for(root: &Path, template: &Path, output: &Path, flatten: bool) -> PathBuf {
    output_dir_for(root, template, output, flatten)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| output.to_path_buf())
}
