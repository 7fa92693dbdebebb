// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Four subcommands:
//
//   export   - raw <name>.bin parameter blobs for the GPU runtime
//   package  - one packaged model archive with metadata
//   summary  - list the layers of a weights file
//   inspect  - read a package back and print its metadata

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::export_use_case::ExportConfig;
use crate::application::package_use_case::PackageConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write one raw f32 parameter file per convolution layer
    Export(ExportArgs),

    /// Bundle weights, architecture and metadata into one package
    Package(PackageArgs),

    /// Print every layer of a weights file with its parameter shapes
    Summary(SummaryArgs),

    /// Print the metadata of a package and check its weights load
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Trained weights (safetensors, keys layers.<index>.<slot>)
    #[arg(long, default_value = "model_data/tiny-yolo-voc.safetensors")]
    pub model: PathBuf,

    /// Directory the <name>.bin files are written to
    #[arg(long, default_value = "Parameters")]
    pub out_dir: PathBuf,

    /// JSON layer table; defaults to the tiny-yolo-voc layout
    #[arg(long)]
    pub table: Option<PathBuf>,
}

impl From<ExportArgs> for ExportConfig {
    fn from(a: ExportArgs) -> Self {
        ExportConfig {
            model_path: a.model,
            out_dir:    a.out_dir,
            table_path: a.table,
        }
    }
}

#[derive(Args, Debug)]
pub struct PackageArgs {
    /// Trained weights (safetensors, keys layers.<index>.<slot>)
    #[arg(long, default_value = "model_data/tiny-yolo-voc.safetensors")]
    pub model: PathBuf,

    /// Package file; ".tar.gz" is appended unless it ends in .gz
    #[arg(long, default_value = "TinyYOLO.tar.gz")]
    pub output: PathBuf,

    /// JSON layer table; defaults to the tiny-yolo-voc layout
    #[arg(long)]
    pub table: Option<PathBuf>,

    /// Author credited in the package metadata
    #[arg(long)]
    pub author: Option<String>,

    /// License recorded in the package metadata
    #[arg(long)]
    pub license: Option<String>,

    /// Short human-readable description of the model
    #[arg(long)]
    pub description: Option<String>,

    /// Name of the image input feature
    #[arg(long)]
    pub input_name: Option<String>,

    /// Description of the image input feature
    #[arg(long)]
    pub input_description: Option<String>,

    /// Name of the grid output feature
    #[arg(long)]
    pub output_name: Option<String>,

    /// Description of the grid output feature
    #[arg(long)]
    pub output_description: Option<String>,

    /// Factor applied to input pixel values (default 1/255)
    #[arg(long)]
    pub image_scale: Option<f32>,
}

/// Flags left unset keep the tiny-yolo-voc defaults.
impl From<PackageArgs> for PackageConfig {
    fn from(a: PackageArgs) -> Self {
        let d = PackageConfig::default();
        PackageConfig {
            model_path: a.model,
            output:     a.output,
            table_path: a.table,

            author:             a.author.unwrap_or(d.author),
            license:            a.license.unwrap_or(d.license),
            description:        a.description.unwrap_or(d.description),
            input_name:         a.input_name.unwrap_or(d.input_name),
            input_description:  a.input_description.unwrap_or(d.input_description),
            output_name:        a.output_name.unwrap_or(d.output_name),
            output_description: a.output_description.unwrap_or(d.output_description),
            image_scale:        a.image_scale.unwrap_or(d.image_scale),
        }
    }
}

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Trained weights (safetensors, keys layers.<index>.<slot>)
    #[arg(long, default_value = "model_data/tiny-yolo-voc.safetensors")]
    pub model: PathBuf,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Package written by the package command
    #[arg(long, default_value = "TinyYOLO.tar.gz")]
    pub package: PathBuf,
}
