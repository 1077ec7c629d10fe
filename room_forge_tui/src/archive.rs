use std::{
    fs::{self, File, OpenOptions},
    io::{BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use room_forge_core::{Cell, Grid, LayoutArchive};
use serde::Serialize;

#[derive(Serialize)]
struct LayoutRecord<'a> {
    score: f32,
    grid: &'a Grid<Cell>,
}

/// Writes every archived layout to `layout_<n>.json` in a directory.
#[derive(Debug)]
pub struct JsonArchive {
    dir: PathBuf,
    next_index: usize,
}

impl JsonArchive {
    /// Creates `dir` if needed. Numbering continues after the highest layout already there.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create archive directory {}", dir.display()))?;
        let next_index = fs::read_dir(&dir)
            .with_context(|| format!("Failed to list archive directory {}", dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| layout_index(&entry.file_name().to_string_lossy()))
            .max()
            .map_or(0, |highest| highest + 1);
        Ok(JsonArchive { dir, next_index })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Opens the next free `layout_<n>.json`. Existing files are never truncated.
    fn create_next(&mut self) -> Result<(PathBuf, File)> {
        loop {
            let path = self.dir.join(format!("layout_{}.json", self.next_index));
            self.next_index += 1;
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => {
                    return Err(err).with_context(|| format!("Failed to create {}", path.display()));
                }
            }
        }
    }

    fn write(&mut self, grid: &Grid<Cell>, score: f32) -> Result<PathBuf> {
        let (path, file) = self.create_next()?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &LayoutRecord { score, grid })
            .with_context(|| format!("Failed to write {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("Failed to flush {}", path.display()))?;
        Ok(path)
    }
}

fn layout_index(file_name: &str) -> Option<usize> {
    file_name
        .strip_prefix("layout_")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

impl LayoutArchive for JsonArchive {
    fn on_high_engagement_layout(&mut self, grid: &Grid<Cell>, score: f32) {
        match self.write(grid, score) {
            Ok(path) => log::info!("Archived layout to {}", path.display()),
            Err(err) => log::error!("Could not archive layout: {:#}", err),
        }
    }
}
