//! Canonical paths of a scaffolded experiment tree.
//!
//! The directory names are the contract between this tool, the scaffolding
//! template and the downstream pipeline scripts, so they are fixed here in
//! one place.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug)]
pub struct Layout {
    /// Experiment root (the working directory)
    pub experience: PathBuf,
    /// Parent directory holding all experiments of the project
    pub project: PathBuf,

    pub raw_data: PathBuf,
    pub rna: PathBuf,
    pub index_sorting: PathBuf,

    pub reference: PathBuf,
    pub experiment_reference: PathBuf,

    pub workflow: PathBuf,
    pub snakemake: PathBuf,
    pub airrflow: PathBuf,
}

impl Layout {
    pub fn new(working_dir: &Path) -> Self {
        let experience = working_dir.to_path_buf();
        let project = experience
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        let raw_data = experience.join("00_RawData");
        let reference = experience.join("01_Reference");
        let workflow = experience.join("04_Workflow");

        Layout {
            rna: raw_data.join("00_RNA"),
            index_sorting: raw_data.join("01_IndexSort"),
            experiment_reference: reference.join("00_Experiment"),
            snakemake: workflow.join("01_snakemake"),
            airrflow: workflow.join("02_airrflow"),
            experience,
            project,
            raw_data,
            reference,
            workflow,
        }
    }

    /// User-authored experiment configuration
    pub fn config_file(&self) -> PathBuf {
        self.reference.join("config_plateprep.yml")
    }

    pub fn ercc_concentration(&self) -> PathBuf {
        self.experiment_reference.join("ERCC_concentration.csv")
    }

    pub fn barcode_well(&self) -> PathBuf {
        self.experiment_reference.join("cell_barcode_well.csv")
    }

    /// Well-less barcode list, derived from `cell_barcode_well.csv`
    pub fn barcode_list(&self) -> PathBuf {
        self.experiment_reference.join("cell_barcode.txt")
    }

    /// Destination of the experiment reference document
    pub fn gsf_destination(&self, gsf_source: &Path) -> PathBuf {
        let name = gsf_source.file_name().unwrap_or_default();
        self.experiment_reference.join(name)
    }

    pub fn samplesheet(&self) -> PathBuf {
        self.airrflow.join("samplesheet.tsv")
    }

    pub fn analysis_params(&self) -> PathBuf {
        self.experience
            .join("03_Script/01_PlatePrep/03_QC/analysisParams.R")
    }

    pub fn project_params(&self) -> PathBuf {
        self.experience.join("03_Script/01_PlatePrep/projectParams.R")
    }

    pub fn snakefile(&self) -> PathBuf {
        self.snakemake.join("snakefile.yaml")
    }
}

/// Asserts that every file the scaffolding was supposed to produce actually
/// exists. Offenders are collected so one run reports them all.
pub fn check_artifacts(expected: &[PathBuf]) -> Result<()> {
    let missing: Vec<PathBuf> = expected
        .iter()
        .filter(|p| !p.is_file())
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingArtifacts(missing))
    }
}
