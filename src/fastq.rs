//! Plate to read-pair resolution.
//!
//! Scans the sequencer output tree, classifies every FASTQ file by plate and
//! read orientation from its name, and wires a symlink for each matched file
//! into the canonical raw-data directory. Every declared plate must come out
//! of the scan with exactly one R1 and one R2 file.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// One pair of paired-end read files, bound to one plate. The members point
/// at the symlinks under the raw-data directory, which is what the
/// downstream pipeline reads.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadPair {
    pub r1: PathBuf,
    pub r2: PathBuf,
}

fn is_fastq(name: &str) -> bool {
    name.ends_with(".fastq.gz")
}

/// Matched slot for one plate. Keeps the source path alongside the link path
/// so a duplicate match can name both offending files.
#[derive(Default)]
struct Slot {
    r1: Option<(PathBuf, PathBuf)>,
    r2: Option<(PathBuf, PathBuf)>,
}

/// Resolves each declared plate to its R1/R2 file pair, creating symlinks in
/// `link_dir` as files are matched. The returned pairs are index-aligned
/// with `plates`.
///
/// A file that would land in an already-taken (plate, orientation) slot
/// aborts the resolution; silently keeping one of the two would risk mixing
/// sequencing runs. A pre-existing symlink is tolerated so that a partially
/// scaffolded experiment can be re-run.
pub fn resolve_reads(source_dir: &Path, link_dir: &Path, plates: &[String]) -> Result<Vec<ReadPair>> {
    lazy_static! {
        static ref RE_R1: Regex = Regex::new(r"^(?P<plate>.*)_.*_R1_.*\.fastq\.gz$").unwrap();
        static ref RE_R2: Regex = Regex::new(r"^(?P<plate>.*)_.*_R2_.*\.fastq\.gz$").unwrap();
    }

    fs::create_dir_all(link_dir)?;

    let mut found: HashMap<&str, Slot> = plates
        .iter()
        .map(|p| (p.as_str(), Slot::default()))
        .collect();

    for entry in WalkDir::new(source_dir) {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().to_string();
        if !is_fastq(&file_name) {
            continue;
        }

        // A file names at most one orientation; R1 wins if a pathological
        // name would satisfy both patterns.
        let (plate, orientation) = if let Some(c) = RE_R1.captures(&file_name) {
            (c.name("plate").unwrap().as_str(), "R1")
        } else if let Some(c) = RE_R2.captures(&file_name) {
            (c.name("plate").unwrap().as_str(), "R2")
        } else {
            continue;
        };

        let plate = plate.to_string();
        let slot = match found.get_mut(plate.as_str()) {
            Some(slot) => slot,
            None => continue,
        };
        let taken = match orientation {
            "R1" => &mut slot.r1,
            _ => &mut slot.r2,
        };

        if let Some((_, first_source)) = taken {
            return Err(Error::AmbiguousReadFile {
                plate,
                orientation,
                first: first_source.clone(),
                second: entry.path().to_path_buf(),
            });
        }

        let link_path = link_dir.join(&file_name);
        match symlink(entry.path(), &link_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                warn!("The symbolic link {} already exists", link_path.display());
            }
            Err(e) => {
                error!("Error creating symbolic link {}: {}", link_path.display(), e);
            }
        }

        *taken = Some((link_path, entry.path().to_path_buf()));
    }

    let mut pairs = Vec::with_capacity(plates.len());
    for plate in plates {
        match found.remove(plate.as_str()) {
            Some(Slot {
                r1: Some((r1, _)),
                r2: Some((r2, _)),
            }) => pairs.push(ReadPair { r1, r2 }),
            _ => return Err(Error::IncompleteReadPair(plate.clone())),
        }
    }

    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap();
    }

    fn plates(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn fixture() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        let rna = dir.path().join("rna");
        touch(&source.join("runA/P1_S1_R1_001.fastq.gz"));
        touch(&source.join("runA/P1_S1_R2_001.fastq.gz"));
        touch(&source.join("runB/P2_S2_R1_001.fastq.gz"));
        touch(&source.join("runB/P2_S2_R2_001.fastq.gz"));
        touch(&source.join("runB/notes.txt"));
        touch(&source.join("runB/P9_S9_R1_001.fastq.gz"));
        (dir, source, rna)
    }

    #[test]
    fn resolves_pairs_in_declaration_order() {
        let (_dir, source, rna) = fixture();
        let pairs = resolve_reads(&source, &rna, &plates(&["P1", "P2"])).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].r1, rna.join("P1_S1_R1_001.fastq.gz"));
        assert_eq!(pairs[0].r2, rna.join("P1_S1_R2_001.fastq.gz"));
        assert_eq!(pairs[1].r1, rna.join("P2_S2_R1_001.fastq.gz"));

        // matched files are wired as symlinks under the raw-data directory
        let meta = fs::symlink_metadata(&pairs[0].r1).unwrap();
        assert!(meta.file_type().is_symlink());
        // the undeclared plate got no link
        assert!(fs::symlink_metadata(rna.join("P9_S9_R1_001.fastq.gz")).is_err());
    }

    #[test]
    fn reversed_declaration_reverses_output() {
        let (_dir, source, rna) = fixture();
        let pairs = resolve_reads(&source, &rna, &plates(&["P2", "P1"])).unwrap();
        assert_eq!(pairs[0].r1, rna.join("P2_S2_R1_001.fastq.gz"));
        assert_eq!(pairs[1].r1, rna.join("P1_S1_R1_001.fastq.gz"));
    }

    #[test]
    fn missing_plate_fails_with_its_name() {
        let (_dir, source, rna) = fixture();
        match resolve_reads(&source, &rna, &plates(&["P1", "P3"])) {
            Err(Error::IncompleteReadPair(plate)) => assert_eq!(plate, "P3"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn missing_orientation_fails() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        let rna = dir.path().join("rna");
        touch(&source.join("P1_S1_R1_001.fastq.gz"));
        assert!(matches!(
            resolve_reads(&source, &rna, &plates(&["P1"])),
            Err(Error::IncompleteReadPair(_))
        ));
    }

    #[test]
    fn duplicate_match_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        let rna = dir.path().join("rna");
        touch(&source.join("runA/P1_S1_R1_001.fastq.gz"));
        touch(&source.join("runA/P1_S1_R2_001.fastq.gz"));
        touch(&source.join("runB/P1_S7_R1_001.fastq.gz"));
        match resolve_reads(&source, &rna, &plates(&["P1"])) {
            Err(Error::AmbiguousReadFile { plate, orientation, .. }) => {
                assert_eq!(plate, "P1");
                assert_eq!(orientation, "R1");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn rerun_tolerates_existing_symlinks() {
        let (_dir, source, rna) = fixture();
        let declared = plates(&["P1", "P2"]);
        let first = resolve_reads(&source, &rna, &declared).unwrap();
        let second = resolve_reads(&source, &rna, &declared).unwrap();
        assert_eq!(first, second);
    }
}
