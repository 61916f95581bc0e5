//! Loading, validation and normalization of the user-authored experiment
//! configuration.
//!
//! The raw YAML image is validated in one pass and turned into an owned
//! [`Config`]; nothing downstream ever sees an unchecked value. Sections
//! whose module is disabled are exempted from the emptiness check and pinned
//! to the sentinel string `"FALSE"`, which the scaffolding template and the
//! downstream R scripts expect as a concrete scalar.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::params::{AnalysisFlags, Method, RepertoireTool};

/// Placeholder written into exempted sections
pub const DISABLED: &str = "FALSE";

/// Separators that would make the comma-split of list sections ambiguous
const BAD_SEPARATORS: [char; 5] = [':', ';', '/', '.', '?'];

/// Boolean-like config value. Older config files carry yes/no text where
/// newer ones use native YAML booleans, so both encodings deserialize.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Text(String),
}

/// Direct serde image of the config file. Every section is optional here so
/// that emptiness can be checked in one batch instead of failing on the
/// first absent key.
#[derive(Debug, Default, Deserialize)]
pub struct RawConfig {
    pub experience_name: Option<String>,
    pub plate_names: Option<String>,
    pub gsf_file: Option<String>,
    pub fastq_directories: Option<String>,
    pub index_sort: Option<Flag>,
    pub not_fluorescent: Option<Flag>,
    pub categoriale_term_set: Option<String>,
    pub species: Option<String>,
    pub star_index: Option<HashMap<String, String>>,
    pub gtf_file: Option<HashMap<String, String>>,
    #[serde(rename = "trust4_imgt_BCR_TCR")]
    pub trust4_imgt_bcr_tcr: Option<HashMap<String, String>>,
    #[serde(rename = "trust4_imgt_VDJ")]
    pub trust4_imgt_vdj: Option<HashMap<String, String>>,
    pub outdir_temp: Option<String>,
    pub method_analysis: Option<String>,
    pub index_sort_analysis: Option<Flag>,
    pub bcr_repertoire_analysis: Option<Flag>,
    pub tcr_repertoire_analysis: Option<Flag>,
    pub metadata_analysis: Option<Flag>,
    pub repertoire_tool: Option<Flag>,
}

/// Validated and normalized configuration
#[derive(Debug)]
pub struct Config {
    pub experience_name: String,
    pub plates: Vec<String>,
    pub gsf_file: PathBuf,
    pub fastq_directories: PathBuf,
    /// Index-sort table source directory, or `"FALSE"` when disabled
    pub index_sort: String,
    pub not_fluorescent: String,
    pub categorial_terms: Vec<String>,
    pub species: String,
    pub star_index: String,
    pub gtf_file: String,
    pub imgt_bcr_tcr: String,
    pub imgt_vdj: String,
    pub outdir_temp: String,
    pub flags: AnalysisFlags,
}

pub fn load(path: &Path) -> Result<RawConfig> {
    if !path.is_file() {
        return Err(Error::MissingFile(path.to_path_buf()));
    }
    let file = File::open(path)?;
    Ok(serde_yaml::from_reader(file)?)
}

/// Normalizes a yes/no parameter to a native boolean. Anything outside
/// native booleans and case-insensitive yes/no text is rejected with the
/// offending section name.
pub fn verify_parameters(value: &Flag, field: &str) -> Result<bool> {
    match value {
        Flag::Bool(b) => Ok(*b),
        Flag::Text(t) if t.eq_ignore_ascii_case("yes") => Ok(true),
        Flag::Text(t) if t.eq_ignore_ascii_case("no") => Ok(false),
        Flag::Text(_) => Err(Error::InvalidParameter {
            field: field.to_string(),
        }),
    }
}

fn parse_repertoire_tool(value: Option<&Flag>) -> Result<Option<RepertoireTool>> {
    match value {
        None | Some(Flag::Bool(false)) => Ok(None),
        Some(Flag::Bool(true)) => Err(Error::InvalidRepertoireTool(String::from("true"))),
        Some(Flag::Text(t)) => match t.as_str() {
            "trust4" => Ok(Some(RepertoireTool::Trust4)),
            "airrflow" => Ok(Some(RepertoireTool::Airrflow)),
            other => Err(Error::InvalidRepertoireTool(other.to_string())),
        },
    }
}

fn verify_separator(field: &str, value: &str) -> Result<()> {
    if value.contains(|c| BAD_SEPARATORS.contains(&c)) {
        Err(Error::SeparatorViolation {
            field: field.to_string(),
            value: value.to_string(),
        })
    } else {
        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(|item| item.trim().to_string()).collect()
}

fn species_entry(
    map: Option<HashMap<String, String>>,
    field: &str,
    species: &str,
) -> Result<String> {
    map.unwrap_or_default()
        .remove(species)
        .ok_or_else(|| Error::UnknownSpecies {
            field: field.to_string(),
            species: species.to_string(),
        })
}

/// Text value of a path-or-false section. A native `false` collapses to the
/// sentinel; `true` makes no sense for a path and is rejected.
fn path_or_false(value: Flag, field: &str) -> Result<String> {
    match value {
        Flag::Text(t) => Ok(t),
        Flag::Bool(false) => Ok(DISABLED.to_string()),
        Flag::Bool(true) => Err(Error::InvalidParameter {
            field: field.to_string(),
        }),
    }
}

/// Validates the raw config against the working directory and produces the
/// normalized [`Config`]. Pure with respect to the input: exemption
/// placeholders land in the returned value, the raw image is consumed.
pub fn validate(raw: RawConfig, working_dir: &Path) -> Result<Config> {
    // Exemptions are derived before the emptiness pass. A section whose
    // controlling flag is off must not be reported as empty.
    let skip_index_sort = match raw.index_sort_analysis.as_ref() {
        Some(f) => matches!(verify_parameters(f, "index_sort_analysis"), Ok(false)),
        None => false,
    };
    let repertoire = parse_repertoire_tool(raw.repertoire_tool.as_ref());
    let skip_repertoire = matches!(repertoire, Ok(None));

    let sections = [
        ("experience_name", raw.experience_name.is_some(), false),
        ("plate_names", raw.plate_names.is_some(), false),
        ("gsf_file", raw.gsf_file.is_some(), false),
        ("fastq_directories", raw.fastq_directories.is_some(), false),
        ("index_sort", raw.index_sort.is_some(), skip_index_sort),
        ("not_fluorescent", raw.not_fluorescent.is_some(), skip_index_sort),
        ("categoriale_term_set", raw.categoriale_term_set.is_some(), false),
        ("species", raw.species.is_some(), false),
        ("star_index", raw.star_index.is_some(), false),
        ("gtf_file", raw.gtf_file.is_some(), false),
        ("trust4_imgt_BCR_TCR", raw.trust4_imgt_bcr_tcr.is_some(), skip_repertoire),
        ("trust4_imgt_VDJ", raw.trust4_imgt_vdj.is_some(), skip_repertoire),
        ("outdir_temp", raw.outdir_temp.is_some(), false),
        ("method_analysis", raw.method_analysis.is_some(), false),
        ("index_sort_analysis", raw.index_sort_analysis.is_some(), false),
        ("bcr_repertoire_analysis", raw.bcr_repertoire_analysis.is_some(), skip_repertoire),
        ("tcr_repertoire_analysis", raw.tcr_repertoire_analysis.is_some(), skip_repertoire),
        ("metadata_analysis", raw.metadata_analysis.is_some(), false),
    ];
    let empty: Vec<String> = sections
        .iter()
        .filter(|(_, present, skipped)| !present && !skipped)
        .map(|(name, _, _)| name.to_string())
        .collect();
    if !empty.is_empty() {
        return Err(Error::EmptyFields(empty));
    }

    let repertoire = repertoire?;

    let experience_name = raw.experience_name.unwrap();
    let path_name = working_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if path_name != experience_name {
        return Err(Error::NameMismatch {
            path_name,
            config_name: experience_name,
        });
    }

    let plate_names = raw.plate_names.unwrap();
    verify_separator("plate_names", &plate_names)?;
    let plates = split_list(&plate_names);

    let terms = raw.categoriale_term_set.unwrap();
    verify_separator("categoriale_term_set", &terms)?;
    let categorial_terms = split_list(&terms);

    let method = Method::parse(&raw.method_analysis.unwrap())?;
    info!("Selected method: {}", method.as_str());

    let index_sort_analysis = if skip_index_sort {
        false
    } else {
        verify_parameters(raw.index_sort_analysis.as_ref().unwrap(), "index_sort_analysis")?
    };
    let (bcr, tcr) = if skip_repertoire {
        (false, false)
    } else {
        (
            verify_parameters(raw.bcr_repertoire_analysis.as_ref().unwrap(), "bcr_repertoire_analysis")?,
            verify_parameters(raw.tcr_repertoire_analysis.as_ref().unwrap(), "tcr_repertoire_analysis")?,
        )
    };
    let metadata = verify_parameters(raw.metadata_analysis.as_ref().unwrap(), "metadata_analysis")?;
    info!(
        "Selected modules: index_sort={} bcr={} tcr={} metadata={} repertoire={:?}",
        index_sort_analysis, bcr, tcr, metadata, repertoire
    );

    let species = raw.species.unwrap();
    let star_index = species_entry(raw.star_index, "star_index", &species)?;
    let gtf_file = species_entry(raw.gtf_file, "gtf_file", &species)?;
    let (imgt_bcr_tcr, imgt_vdj) = if skip_repertoire {
        (DISABLED.to_string(), DISABLED.to_string())
    } else {
        (
            species_entry(raw.trust4_imgt_bcr_tcr, "trust4_imgt_BCR_TCR", &species)?,
            species_entry(raw.trust4_imgt_vdj, "trust4_imgt_VDJ", &species)?,
        )
    };

    let index_sort = if skip_index_sort {
        DISABLED.to_string()
    } else {
        path_or_false(raw.index_sort.unwrap(), "index_sort")?
    };
    let not_fluorescent = if skip_index_sort {
        DISABLED.to_string()
    } else {
        match raw.not_fluorescent.unwrap() {
            Flag::Text(t) => t,
            Flag::Bool(b) => crate::params::as_r_bool(b).to_string(),
        }
    };

    Ok(Config {
        experience_name,
        plates,
        gsf_file: PathBuf::from(raw.gsf_file.unwrap()),
        fastq_directories: PathBuf::from(raw.fastq_directories.unwrap()),
        index_sort,
        not_fluorescent,
        categorial_terms,
        species,
        star_index,
        gtf_file,
        imgt_bcr_tcr,
        imgt_vdj,
        outdir_temp: raw.outdir_temp.unwrap(),
        flags: AnalysisFlags {
            method,
            index_sort: index_sort_analysis,
            bcr,
            tcr,
            metadata,
            repertoire,
        },
    })
}
