// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Scan-scoped driver resources.
//!
//! A [`ScanSession`] is opened at the start of every scan and released when
//! it is dropped, so the release happens on every exit path: normal return,
//! early `?` return on a read failure, or unwinding. The driver keeps a
//! shared counter of open sessions which lets tests verify that nothing
//! outlives its scan.

use crate::config::SensorsConfig;
use crate::hwmon::{read_sysfs_file, FeatureKind};
use crate::DriverError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Resources held for the duration of one scan.
pub(crate) struct ScanSession {
    root: PathBuf,
    config: SensorsConfig,
    open_sessions: Arc<AtomicUsize>,
}

/// A chip discovered under the hwmon root.
#[derive(Debug, Clone)]
pub(crate) struct Chip {
    /// `<name>-<hwmonN>`.
    pub id: String,
    /// Contents of the chip's `name` attribute.
    pub name: String,
    dir: PathBuf,
}

/// One `<kind><n>_input` attribute of a chip.
#[derive(Debug, Clone)]
pub(crate) struct Feature {
    /// `temp1`, `in0`, ...
    pub name: String,
    pub kind: FeatureKind,
    index: u32,
    dir: PathBuf,
}

impl ScanSession {
    /// Loads the configuration source and checks that the hwmon root exists.
    pub(crate) fn init(
        root: &Path,
        config_source: &Path,
        open_sessions: Arc<AtomicUsize>,
    ) -> Result<Self, DriverError> {
        let config = SensorsConfig::from_file(config_source)?;
        if !root.is_dir() {
            return Err(DriverError::NotAvailable {
                path: root.display().to_string(),
            });
        }

        let open = open_sessions.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!(
            "scan session opened on {} ({} config blocks, {open} open)",
            root.display(),
            config.num_blocks()
        );

        Ok(Self {
            root: root.to_path_buf(),
            config,
            open_sessions,
        })
    }

    pub(crate) fn config(&self) -> &SensorsConfig {
        &self.config
    }

    /// Lists every chip directory under the root, sorted by directory name.
    pub(crate) fn chips(&self) -> Result<Vec<Chip>, DriverError> {
        let mut dirs: Vec<PathBuf> = list_dir(&self.root)?
            .into_iter()
            .filter(|p| p.is_dir())
            .collect();
        dirs.sort();

        dirs.into_iter()
            .map(|dir| -> Result<Chip, DriverError> {
                let dir_name = file_name(&dir);
                let name_path = dir.join("name");
                let name = if name_path.exists() {
                    read_sysfs_file(&name_path)?
                } else {
                    dir_name.clone()
                };
                Ok(Chip {
                    id: format!("{name}-{dir_name}"),
                    name,
                    dir,
                })
            })
            .collect()
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        let open = self.open_sessions.fetch_sub(1, Ordering::AcqRel) - 1;
        tracing::trace!("scan session released ({open} open)");
    }
}

impl Chip {
    /// Lists the chip's readable features, ordered by kind then channel.
    pub(crate) fn features(&self) -> Result<Vec<Feature>, DriverError> {
        let mut features: Vec<Feature> = list_dir(&self.dir)?
            .iter()
            .filter_map(|p| parse_input_name(&file_name(p)))
            .map(|(kind, index)| Feature {
                name: format!("{}{index}", kind.prefix()),
                kind,
                index,
                dir: self.dir.clone(),
            })
            .collect();
        features.sort_by_key(|f| (f.kind, f.index));
        Ok(features)
    }
}

impl Feature {
    /// Reads the `_label` attribute, if the chip provides one.
    pub(crate) fn sysfs_label(&self) -> Result<Option<String>, DriverError> {
        let path = self.dir.join(format!("{}_label", self.name));
        if !path.exists() {
            return Ok(None);
        }
        read_sysfs_file(&path).map(Some)
    }

    /// Reads the `_input` attribute and converts it to natural units.
    pub(crate) fn read_value(&self) -> Result<f64, DriverError> {
        let path = self.dir.join(format!("{}_input", self.name));
        let content = read_sysfs_file(&path)?;
        let raw: i64 = content.parse().map_err(|_| DriverError::Parse {
            path: path.display().to_string(),
            detail: format!("expected integer, got '{content}'"),
        })?;
        Ok(raw as f64 / self.kind.scale())
    }
}

/// Parses `temp3_input` into `(Temperature, 3)`.
fn parse_input_name(file_name: &str) -> Option<(FeatureKind, u32)> {
    let stem = file_name.strip_suffix("_input")?;
    let split = stem.find(|c: char| c.is_ascii_digit())?;
    let (prefix, digits) = stem.split_at(split);
    let kind = FeatureKind::from_prefix(prefix)?;
    let index = digits.parse().ok()?;
    Some((kind, index))
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, DriverError> {
    let entries = std::fs::read_dir(dir).map_err(|e| DriverError::Read {
        path: dir.display().to_string(),
        source: e,
    })?;
    entries
        .map(|entry| {
            entry.map(|e| e.path()).map_err(|e| DriverError::Read {
                path: dir.display().to_string(),
                source: e,
            })
        })
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
