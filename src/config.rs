use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
pub struct Opt {
    /// Name of the enclosing project
    #[structopt(short, long)]
    pub project_name: String,

    /// Name of the experiment to scaffold, must match the last component of
    /// the working directory
    #[structopt(short, long)]
    pub experience_name: String,

    /// Experiment working directory
    #[structopt(short, long, parse(from_os_str))]
    pub working_dir: PathBuf,

    /// Directory template consumed by the scaffolding engine
    #[structopt(short, long, parse(from_os_str))]
    pub template_path: PathBuf,
}
