//! Persisting cleaned batches.
//!
//! The cleaner itself never writes. This module is the sink used by the CLI:
//! the cleaned batch goes to `<entity>.csv` and its manifest to
//! `<entity>_manifest.json`, both replacing any earlier files.

use crate::error::Result;
use crate::types::{CleanedBatch, CleaningManifest};
use polars::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Files written for one cleaned batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub data: PathBuf,
    pub manifest: PathBuf,
}

/// Write a cleaned batch and its manifest into `output_dir`.
pub fn write_outputs(batch: &CleanedBatch, output_dir: &Path) -> Result<OutputPaths> {
    fs::create_dir_all(output_dir)?;
    let entity = batch.manifest.entity;

    let data_path = output_dir.join(format!("{entity}.csv"));
    let mut df = batch.data.clone();
    let mut file = File::create(&data_path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(&mut df)?;
    info!("Cleaned data saved: {}", data_path.display());

    let manifest_path = write_manifest(&batch.manifest, output_dir)?;

    Ok(OutputPaths {
        data: data_path,
        manifest: manifest_path,
    })
}

/// Write only the manifest, as pretty JSON.
pub fn write_manifest(manifest: &CleaningManifest, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("{}_manifest.json", manifest.entity));
    let mut file = File::create(&path)?;
    file.write_all(serde_json::to_string_pretty(manifest)?.as_bytes())?;
    info!("Manifest saved: {}", path.display());
    Ok(path)
}
