//! Builds the per-plate samplesheet consumed by the airrflow repertoire
//! workflow.
//!
//! The scaffolding template ships the sheet with a header row only; that
//! header defines the column set and order, and the file is rewritten in
//! place with one row per plate.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::fastq::ReadPair;
use crate::params::{as_r_bool, AnalysisFlags, Method};

/// Fixed biomaterial provider stamped into every row
const PROVIDER: &str = "CB2M";

const KNOWN_COLUMNS: [&str; 11] = [
    "sample_id",
    "filename_R1",
    "filename_R2",
    "subject_id",
    "species",
    "pcr_target_locus",
    "single_cell",
    "tissue",
    "sex",
    "age",
    "biomaterial_provider",
];

fn cell(
    column: &str,
    row: usize,
    plate: &str,
    pair: &ReadPair,
    species: &str,
    flags: &AnalysisFlags,
) -> String {
    match column {
        "sample_id" => plate.to_string(),
        "filename_R1" => pair.r1.display().to_string(),
        "filename_R2" => pair.r2.display().to_string(),
        "subject_id" => format!("S{}", row + 1),
        "species" => species.to_string(),
        "pcr_target_locus" => flags.locus().to_string(),
        "single_cell" => as_r_bool(flags.method == Method::SingleCell).to_string(),
        "biomaterial_provider" => PROVIDER.to_string(),
        _ => String::from("NA"),
    }
}

/// Rewrites the samplesheet template at `path` with one row per plate,
/// preserving the template's column order.
pub fn generate(
    path: &Path,
    plates: &[String],
    pairs: &[ReadPair],
    species: &str,
    flags: &AnalysisFlags,
) -> Result<()> {
    if !path.is_file() {
        return Err(Error::MissingFile(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let header = content
        .lines()
        .next()
        .filter(|line| !line.trim().is_empty())
        .ok_or_else(|| Error::MalformedTable {
            path: path.to_path_buf(),
            reason: String::from("samplesheet template has no header row"),
        })?;

    let columns: Vec<&str> = header.split('\t').map(|c| c.trim()).collect();
    for column in &columns {
        if !KNOWN_COLUMNS.contains(column) {
            warn!("Unknown samplesheet column '{}', filling with NA", column);
        }
    }

    let mut out = String::from(header);
    out.push('\n');
    for (row, (plate, pair)) in plates.iter().zip(pairs).enumerate() {
        let cells: Vec<String> = columns
            .iter()
            .map(|column| cell(column, row, plate, pair, species, flags))
            .collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }

    fs::write(path, out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::RepertoireTool;
    use std::path::PathBuf;

    const HEADER: &str = "sample_id\tfilename_R1\tfilename_R2\tsubject_id\tspecies\tpcr_target_locus\tsingle_cell\ttissue\tsex\tage\tbiomaterial_provider";

    fn flags() -> AnalysisFlags {
        AnalysisFlags {
            method: Method::SingleCell,
            index_sort: true,
            bcr: true,
            tcr: false,
            metadata: false,
            repertoire: Some(RepertoireTool::Airrflow),
        }
    }

    fn pairs() -> Vec<ReadPair> {
        vec![
            ReadPair {
                r1: PathBuf::from("/rna/P1_S1_R1_001.fastq.gz"),
                r2: PathBuf::from("/rna/P1_S1_R2_001.fastq.gz"),
            },
            ReadPair {
                r1: PathBuf::from("/rna/P2_S2_R1_001.fastq.gz"),
                r2: PathBuf::from("/rna/P2_S2_R2_001.fastq.gz"),
            },
        ]
    }

    fn plates() -> Vec<String> {
        vec![String::from("P1"), String::from("P2")]
    }

    #[test]
    fn writes_one_row_per_plate() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = dir.path().join("samplesheet.tsv");
        fs::write(&sheet, format!("{}\n", HEADER)).unwrap();

        generate(&sheet, &plates(), &pairs(), "human", &flags()).unwrap();

        let content = fs::read_to_string(&sheet).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER);
        assert_eq!(
            lines[1],
            "P1\t/rna/P1_S1_R1_001.fastq.gz\t/rna/P1_S1_R2_001.fastq.gz\tS1\thuman\tIG\tTRUE\tNA\tNA\tNA\tCB2M"
        );
        assert_eq!(
            lines[2],
            "P2\t/rna/P2_S2_R1_001.fastq.gz\t/rna/P2_S2_R2_001.fastq.gz\tS2\thuman\tIG\tTRUE\tNA\tNA\tNA\tCB2M"
        );
    }

    #[test]
    fn respects_template_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = dir.path().join("samplesheet.tsv");
        fs::write(&sheet, "subject_id\tsample_id\tspecies\n").unwrap();

        generate(&sheet, &plates(), &pairs(), "mouse", &flags()).unwrap();

        let content = fs::read_to_string(&sheet).unwrap();
        assert_eq!(content.lines().nth(1).unwrap(), "S1\tP1\tmouse");
    }

    #[test]
    fn locus_falls_back_when_no_repertoire() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = dir.path().join("samplesheet.tsv");
        fs::write(&sheet, "sample_id\tpcr_target_locus\tsingle_cell\n").unwrap();

        let mut f = flags();
        f.bcr = false;
        f.tcr = false;
        f.method = Method::Minibulk;
        generate(&sheet, &plates(), &pairs(), "human", &f).unwrap();

        let content = fs::read_to_string(&sheet).unwrap();
        assert_eq!(content.lines().nth(1).unwrap(), "P1\tNA\tFALSE");
    }

    #[test]
    fn stale_rows_are_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = dir.path().join("samplesheet.tsv");
        fs::write(&sheet, "sample_id\tsubject_id\nOLD\tS9\n").unwrap();

        generate(&sheet, &plates(), &pairs(), "human", &flags()).unwrap();

        let content = fs::read_to_string(&sheet).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["sample_id\tsubject_id", "P1\tS1", "P2\tS2"]);
    }

    #[test]
    fn missing_template_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            generate(&dir.path().join("nope.tsv"), &plates(), &pairs(), "human", &flags()),
            Err(Error::MissingFile(_))
        ));
    }
}
