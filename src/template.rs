//! Assembly of the flat value mapping consumed by the scaffolding engine,
//! patching of the engine's question file, and the engine invocation.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::process::Command;

use serde_yaml::Value;

use crate::config::Opt;
use crate::error::{Error, Result};
use crate::experiment::Config;
use crate::fastq::ReadPair;
use crate::layout::Layout;
use crate::params::{as_r_bool, AnalysisFlags};

/// Merges everything the template needs into one flat string mapping. The
/// mapping is assembled once and handed over; the engine ignores keys its
/// question file does not declare.
pub fn assemble(
    opt: &Opt,
    cfg: &Config,
    flags: &AnalysisFlags,
    layout: &Layout,
    pairs: &[ReadPair],
) -> HashMap<String, String> {
    let read1: Vec<String> = pairs.iter().map(|p| p.r1.display().to_string()).collect();
    let read2: Vec<String> = pairs.iter().map(|p| p.r2.display().to_string()).collect();

    let mut values = HashMap::new();
    let mut set = |key: &str, value: String| {
        values.insert(key.to_string(), value);
    };

    set("experience_name", cfg.experience_name.clone());
    set("project_name", opt.project_name.clone());
    set("path_project", layout.project.display().to_string());
    set("template_path", opt.template_path.display().to_string());
    set("plate_names", cfg.plates.join(","));
    set("fastq_files_read1", read1.join(","));
    set("fastq_files_read2", read2.join(","));
    set("star_index", cfg.star_index.clone());
    set("gtf_file", cfg.gtf_file.clone());
    set("trust4_imgt_BCR_TCR", cfg.imgt_bcr_tcr.clone());
    set("trust4_imgt_VDJ", cfg.imgt_vdj.clone());
    set("gsf_file", layout.gsf_destination(&cfg.gsf_file).display().to_string());
    set("index_sort", cfg.index_sort.clone());
    set("not_fluorescent", cfg.not_fluorescent.clone());
    set("species", cfg.species.clone());
    set("barcode_file", layout.barcode_list().display().to_string());
    set(
        "ercc_concentration_file",
        layout.ercc_concentration().display().to_string(),
    );
    set("outdir_temp", cfg.outdir_temp.clone());
    set("categoriale_term_set", cfg.categorial_terms.join(","));
    set("method_analysis", flags.method.as_str().to_string());
    set("index_sort_analysis", as_r_bool(flags.index_sort).to_string());
    set("bcr_repertoire_analysis", as_r_bool(flags.bcr).to_string());
    set("tcr_repertoire_analysis", as_r_bool(flags.tcr).to_string());
    set("metadata_analysis", as_r_bool(flags.metadata).to_string());
    set("clonal_threshold", flags.clonal_threshold().to_string());

    values
}

/// Replaces the `default` of every question the mapping covers. Keys the
/// question file does not declare are skipped, that is the engine's own
/// lookup contract.
pub fn patch_template(question_file: &Path, values: &HashMap<String, String>) -> Result<()> {
    let text = fs::read_to_string(question_file)?;
    let mut data: Value = serde_yaml::from_str(&text)?;

    if let Value::Mapping(map) = &mut data {
        for (key, value) in values {
            if let Some(Value::Mapping(question)) = map.get_mut(&Value::String(key.clone())) {
                question.insert(
                    Value::String(String::from("default")),
                    Value::String(value.clone()),
                );
            }
        }
    }

    fs::write(question_file, serde_yaml::to_string(&data)?)?;
    Ok(())
}

/// Expands the directory template into the project root.
pub fn run_engine(template: &Path, destination: &Path) -> Result<()> {
    info!("Launching the scaffolding engine, this may take a few minutes");
    let status = Command::new("copier")
        .arg("copy")
        .arg("-f")
        .arg(template)
        .arg(destination)
        .status()
        .map_err(|e| Error::TemplateEngine(format!("could not start copier: {}", e)))?;

    if !status.success() {
        return Err(Error::TemplateEngine(format!("copier exited with {}", status)));
    }
    Ok(())
}
