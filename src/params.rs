//! Effective analysis-mode flags, derived from the validated configuration
//! with the cross-field override rules applied.

use crate::error::{Error, Result};

/// Sample preparation method. The two values are mutually exclusive and
/// decide which downstream options are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    SingleCell,
    Minibulk,
}

impl Method {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "single-cell" => Ok(Method::SingleCell),
            "minibulk" => Ok(Method::Minibulk),
            other => Err(Error::InvalidMethod(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::SingleCell => "single-cell",
            Method::Minibulk => "minibulk",
        }
    }
}

/// Downstream repertoire caller fed by the scaffolded experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepertoireTool {
    Trust4,
    Airrflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisFlags {
    pub method: Method,
    pub index_sort: bool,
    pub bcr: bool,
    pub tcr: bool,
    pub metadata: bool,
    pub repertoire: Option<RepertoireTool>,
}

impl AnalysisFlags {
    /// PCR target locus for the repertoire samplesheet. BCR takes precedence
    /// over TCR when both are enabled.
    pub fn locus(&self) -> &'static str {
        if self.bcr {
            "IG"
        } else if self.tcr {
            "TR"
        } else {
            "NA"
        }
    }

    /// Clonal analysis parameter of the airrflow workflow. BCR takes
    /// precedence over TCR.
    pub fn clonal_threshold(&self) -> &'static str {
        match self.repertoire {
            Some(RepertoireTool::Airrflow) => {
                if self.bcr {
                    "auto"
                } else if self.tcr {
                    "0"
                } else {
                    "FALSE"
                }
            }
            _ => "FALSE",
        }
    }
}

/// Downstream R scripts read uppercase tokens as boolean literals
pub fn as_r_bool(b: bool) -> &'static str {
    if b {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// Applies the override rules. Minibulk preparations cannot carry index-sort
/// tables, so an enabled index sort is corrected rather than rejected. With
/// no repertoire tool selected the BCR/TCR flags are meaningless and forced
/// off.
pub fn resolve(mut flags: AnalysisFlags) -> AnalysisFlags {
    if flags.method == Method::Minibulk && flags.index_sort {
        warn!("Index sort was requested but the method is 'minibulk'; index sort is now disabled");
        flags.index_sort = false;
    }

    if flags.repertoire.is_none() {
        flags.bcr = false;
        flags.tcr = false;
    }

    flags
}
