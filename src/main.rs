#[macro_use]
extern crate log;

mod auxfiles;
mod config;
mod error;
mod experiment;
mod fastq;
mod layout;
mod params;
mod samplesheet;
mod template;

use std::path::Path;

use env_logger::Env;
use structopt::StructOpt;

use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::params::RepertoireTool;

fn run(opt: config::Opt) -> Result<()> {
    // Pointing the tool at the wrong directory is caught before anything is
    // read or written.
    let path_name = opt
        .working_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if path_name != opt.experience_name {
        return Err(Error::NameMismatch {
            path_name,
            config_name: opt.experience_name.clone(),
        });
    }

    let layout = Layout::new(&opt.working_dir);

    info!("Reading config file");
    let raw = experiment::load(&layout.config_file())?;
    let cfg = experiment::validate(raw, &opt.working_dir)?;
    let flags = params::resolve(cfg.flags);

    info!("Resolving FASTQ read pairs for {} plates", cfg.plates.len());
    let pairs = fastq::resolve_reads(&cfg.fastq_directories, &layout.rna, &cfg.plates)?;

    let values = template::assemble(&opt, &cfg, &flags, &layout, &pairs);
    template::patch_template(&opt.template_path.join("copier.yml"), &values)?;
    template::run_engine(&opt.template_path, &layout.project)?;

    auxfiles::write_barcode_list(&layout.barcode_well(), &layout.barcode_list())?;

    if flags.index_sort && cfg.index_sort != experiment::DISABLED {
        auxfiles::copy_index_sort(Path::new(&cfg.index_sort), &layout.index_sorting, &cfg.plates)?;
    }
    let gsf_dest = auxfiles::copy_reference_file(&cfg.gsf_file, &layout.experiment_reference)?;

    if flags.repertoire == Some(RepertoireTool::Airrflow) {
        info!("Writing the airrflow samplesheet");
        samplesheet::generate(&layout.samplesheet(), &cfg.plates, &pairs, &cfg.species, &flags)?;
    }

    let mut expected = vec![
        layout.ercc_concentration(),
        layout.barcode_well(),
        layout.barcode_list(),
        layout.analysis_params(),
        layout.project_params(),
        layout.snakefile(),
        gsf_dest,
    ];
    if flags.repertoire == Some(RepertoireTool::Airrflow) {
        expected.push(layout.samplesheet());
    }
    layout::check_artifacts(&expected)?;

    info!("Success: the project structure is now in place");
    Ok(())
}

fn main() {
    let opt = config::Opt::from_args();

    // set up logging
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = run(opt) {
        error!("{}", e);
        std::process::exit(1);
    }
}
