//! Error types shared across the scaffolding pipeline.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can abort the scaffolding run. All variants are fatal;
/// `main` renders them once and exits non-zero.
#[derive(Error, Debug)]
pub enum Error {
    /// A required input file is absent
    #[error("The file does not exist ({}). Check the project and experience names.", .0.display())]
    MissingFile(PathBuf),

    /// One or more mandatory config sections are unset. Collected in one
    /// pass so the user sees every offender in a single run.
    #[error("Empty sections in the config file: {}. Please provide at least 1 element each.", .0.join(", "))]
    EmptyFields(Vec<String>),

    /// Analysis method outside the two supported preparations
    #[error("The method '{0}' is erroneous, expected 'single-cell' or 'minibulk' (check the config file)")]
    InvalidMethod(String),

    /// A yes/no parameter that is neither a boolean nor yes/no text
    #[error("The parameter '{field}' is erroneous, it should be 'yes' or 'no' (check the config file)")]
    InvalidParameter { field: String },

    /// Repertoire tool selector outside its domain
    #[error("The repertoire tool '{0}' is erroneous, expected 'trust4', 'airrflow' or false")]
    InvalidRepertoireTool(String),

    /// A list-valued field uses a delimiter other than the comma
    #[error("Bad separator in config section '{field}' ({value}). Use ',' to separate the names.")]
    SeparatorViolation { field: String, value: String },

    /// Experience directory does not match the configured name
    #[error("Path to experiment ({path_name}) is different from the name given in the config file ({config_name})")]
    NameMismatch {
        path_name: String,
        config_name: String,
    },

    /// A species-keyed reference map has no entry for the configured species
    #[error("No entry for species '{species}' in config section '{field}'")]
    UnknownSpecies { field: String, species: String },

    /// A declared plate is missing one of its two read orientations
    #[error("R1 or R2 files missing for plate '{0}'")]
    IncompleteReadPair(String),

    /// Two files claim the same (plate, orientation) slot
    #[error("Several {orientation} files match plate '{plate}': {} and {}", first.display(), second.display())]
    AmbiguousReadFile {
        plate: String,
        orientation: &'static str,
        first: PathBuf,
        second: PathBuf,
    },

    /// No index-sort table was found for a declared plate
    #[error("No index sort file found for plate '{0}'")]
    MissingIndexSort(String),

    /// A table produced by the scaffolding template does not have the
    /// expected shape
    #[error("Malformed table {}: {reason}", path.display())]
    MalformedTable { path: PathBuf, reason: String },

    /// Scaffolded tree is missing expected files after the engine ran
    #[error("Missing artifacts after scaffolding: {}", .0.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "))]
    MissingArtifacts(Vec<PathBuf>),

    /// The external scaffolding engine failed or could not be spawned
    #[error("Template engine failed: {0}")]
    TemplateEngine(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
