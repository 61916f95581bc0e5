//! Copies of auxiliary files that live outside the scaffolding template:
//! per-plate index-sort tables, the experiment reference document, and the
//! derived barcode list.

use std::fs;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};

/// Copies every `<plate>_<anything>.csv` table from `source_dir` into
/// `dest_dir`, plate by plate. A plate without a single matching table is
/// fatal; a table already present at the destination is left alone so that
/// re-runs do not clobber earlier copies.
pub fn copy_index_sort(source_dir: &Path, dest_dir: &Path, plates: &[String]) -> Result<()> {
    lazy_static! {
        static ref RE_TABLE: Regex = Regex::new(r"^(?P<plate>.*)_.*\.csv$").unwrap();
    }

    fs::create_dir_all(dest_dir)?;

    for plate in plates {
        let mut found = false;
        for entry in fs::read_dir(source_dir)? {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().to_string();
            let matched = RE_TABLE
                .captures(&file_name)
                .map(|c| c.name("plate").unwrap().as_str() == plate)
                .unwrap_or(false);
            if !matched {
                continue;
            }
            found = true;

            let dest = dest_dir.join(&file_name);
            if dest.exists() {
                warn!("Skipped: file already exists in destination: {}", dest.display());
                continue;
            }
            fs::copy(entry.path(), &dest)?;
        }
        if !found {
            return Err(Error::MissingIndexSort(plate.clone()));
        }
    }
    Ok(())
}

fn backup_name(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    match path.extension() {
        Some(ext) => path.with_file_name(format!("{}_old.{}", stem, ext.to_string_lossy())),
        None => path.with_file_name(format!("{}_old", stem)),
    }
}

/// Copies a single reference file into `dest_dir`, returning the destination
/// path. A same-named file already there is shifted aside once with an
/// `_old` suffix before the new copy lands; only one prior generation is
/// kept. Copying a file onto itself is a warned no-op.
pub fn copy_reference_file(source: &Path, dest_dir: &Path) -> Result<PathBuf> {
    if !source.is_file() {
        return Err(Error::MissingFile(source.to_path_buf()));
    }
    fs::create_dir_all(dest_dir)?;

    let dest = dest_dir.join(source.file_name().unwrap());
    if dest == source {
        warn!("Using already existing reference file {}", source.display());
        return Ok(dest);
    }

    if dest.exists() {
        let old = backup_name(&dest);
        fs::rename(&dest, &old)?;
    }
    fs::copy(source, &dest)?;
    Ok(dest)
}

/// Derives the well-less barcode list consumed by the zUMIs configuration
/// from the template-provided per-well table.
pub fn write_barcode_list(well_table: &Path, output: &Path) -> Result<()> {
    if !well_table.is_file() {
        return Err(Error::MissingFile(well_table.to_path_buf()));
    }
    let content = fs::read_to_string(well_table)?;
    let mut lines = content.lines();

    let header = lines.next().unwrap_or("");
    let column = header
        .split(',')
        .position(|c| c.trim() == "BarcodeSequence")
        .ok_or_else(|| Error::MalformedTable {
            path: well_table.to_path_buf(),
            reason: String::from("no BarcodeSequence column"),
        })?;

    let mut out = String::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(barcode) = line.split(',').nth(column) {
            out.push_str(barcode.trim());
            out.push('\n');
        }
    }
    fs::write(output, out)?;
    Ok(())
}
