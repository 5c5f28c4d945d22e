use anyhow::{Context, Result};
use procgen::codec::to_yaml;
use procgen::{Metadata, Node};
use regex::Regex;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Name of the template copy inside an output directory
pub const TEMPLATE_COPY: &str = "template.yaml";

/// Name of the per-directory label index
pub const META_FILE: &str = "meta.csv";

/// Prefix of the hidden directories output is staged in
const STAGING_PREFIX: &str = ".procgen-";

/// Directory suffix for generated variations. Bulk runs never descend into these.
pub const VARIATIONS_SUFFIX: &str = "_variations";

/// File stem of a template, `arena` for `tasks/arena.yaml`
pub fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "template".to_string())
}

/// `tmp/<stem>_variations` next to the working directory
pub fn default_dir(template: &Path) -> PathBuf {
    PathBuf::from("tmp").join(format!("{}{}", stem(template), VARIATIONS_SUFFIX))
}

/// Builds `<stem>_<index>[_<labels>].yaml` names
pub struct FileNamer {
    stem: String,
    unsafe_chars: Regex,
}

impl FileNamer {
    pub fn new(stem: impl Into<String>) -> Result<Self> {
        Ok(Self {
            stem: stem.into(),
            unsafe_chars: Regex::new(r"[^A-Za-z0-9.\-]+")?,
        })
    }

    /// Indices start at 1; labels are joined with `_` after sanitizing
    pub fn file_name(&self, index: usize, labels: &[String]) -> String {
        let labels = labels
            .iter()
            .map(|label| self.unsafe_chars.replace_all(label, "-").to_string())
            .filter(|label| !label.is_empty())
            .collect::<Vec<_>>();
        if labels.is_empty() {
            format!("{}_{:05}.yaml", self.stem, index)
        } else {
            format!("{}_{:05}_{}.yaml", self.stem, index, labels.join("_"))
        }
    }
}

/// An output directory being filled with variations of one template.
///
/// Files go to a hidden staging directory next to the target and are moved into
/// place by [`OutputDir::finish`]. Dropping it unfinished leaves nothing behind.
pub struct OutputDir {
    path: PathBuf,
    staging: TempDir,
    namer: FileNamer,
    meta: csv::Writer<File>,
    written: usize,
}

impl OutputDir {
    pub fn create(path: &Path, stem: &str) -> Result<Self> {
        let parent = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create output directory {}", parent.display()))?;
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(parent)
            .with_context(|| format!("Could not create a staging directory in {}", parent.display()))?;
        let meta_path = staging.path().join(META_FILE);
        let meta = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&meta_path)
            .with_context(|| format!("Could not create {}", meta_path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            staging,
            namer: FileNamer::new(stem)?,
            meta,
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the template as read, including `proc_meta` and every `!Proc*` tag
    pub fn copy_template(&self, template: &Node) -> Result<()> {
        let staged = self.staging.path().join(TEMPLATE_COPY);
        fs::write(&staged, to_yaml(template)?)
            .with_context(|| format!("Could not write {}", staged.display()))
    }

    /// Write the next variation and record its labels; returns its final path
    pub fn write(&mut self, variation: &Node, meta: &Metadata) -> Result<PathBuf> {
        self.written += 1;
        let file_name = self.namer.file_name(self.written, &meta.labels);
        let staged = self.staging.path().join(&file_name);
        fs::write(&staged, to_yaml(variation)?)
            .with_context(|| format!("Could not write {}", staged.display()))?;

        let target = self.path.join(&file_name);
        let mut row = vec![file_name];
        row.extend(meta.labels.iter().cloned());
        self.meta.write_record(&row)?;
        Ok(target)
    }

    /// Flush `meta.csv` and move everything into the output directory.
    /// Returns the number of variations written.
    pub fn finish(self) -> Result<usize> {
        let OutputDir {
            path,
            staging,
            mut meta,
            written,
            ..
        } = self;
        meta.flush()?;
        drop(meta);

        fs::create_dir_all(&path)
            .with_context(|| format!("Could not create output directory {}", path.display()))?;
        for entry in fs::read_dir(staging.path())? {
            let entry = entry?;
            let target = path.join(entry.file_name());
            fs::rename(entry.path(), &target)
                .with_context(|| format!("Could not move output to {}", target.display()))?;
        }
        Ok(written)
    }
}

/// Record a failed template next to where its variations would have gone
pub fn write_error(dir: &Path, stem: &str, report: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Could not create output directory {}", dir.display()))?;
    let target = dir.join(format!("{}.error.txt", stem));
    fs::write(&target, format!("{}\n", report.trim_end()))
        .with_context(|| format!("Could not write {}", target.display()))?;
    Ok(target)
}
