// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Parses arguments with clap, hands them to the matching use
// case in Layer 2, and prints the result. No conversion logic
// lives here.

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, ExportArgs, InspectArgs, PackageArgs, SummaryArgs};

#[derive(Parser, Debug)]
#[command(
    name = "tiny-yolo-convert",
    version,
    about = "Convert trained Tiny YOLO weights into a packaged model or raw GPU parameter files."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Export(args)  => run_export(args),
            Commands::Package(args) => run_package(args),
            Commands::Summary(args) => run_summary(args),
            Commands::Inspect(args) => run_inspect(args),
        }
    }
}

fn run_export(args: ExportArgs) -> Result<()> {
    use crate::application::export_use_case::ExportUseCase;

    tracing::info!("Exporting parameters from '{}'", args.model.display());

    let exported = ExportUseCase::new(args.into()).execute()?;
    for layer in &exported {
        println!("{:<8} {:>10} floats  {}", layer.name, layer.values, layer.path.display());
    }
    println!("Done!");
    Ok(())
}

fn run_package(args: PackageArgs) -> Result<()> {
    use crate::application::package_use_case::PackageUseCase;

    tracing::info!("Packaging '{}'", args.model.display());

    let path = PackageUseCase::new(args.into()).execute()?;
    println!("Saved package to {}", path.display());
    Ok(())
}

fn run_summary(args: SummaryArgs) -> Result<()> {
    use crate::application::summary_use_case::SummaryUseCase;

    let rows = SummaryUseCase::new(args.model).execute()?;

    println!("{:<6} {:<24} {:<32} {:>10}", "Index", "Layer", "Shapes", "Params");
    let mut total = 0;
    for row in &rows {
        let shapes = row
            .shapes
            .iter()
            .map(|s| format!("{s:?}"))
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "{:<6} {:<24} {:<32} {:>10}",
            row.index,
            row.name.as_deref().unwrap_or("-"),
            shapes,
            row.params,
        );
        total += row.params;
    }
    println!("Total params: {total}");
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    use crate::application::inspect_use_case::InspectUseCase;

    let report = InspectUseCase::new(args.package).execute()?;
    let m = &report.metadata;

    println!("Author:       {}", m.author);
    println!("License:      {}", m.license);
    println!("Description:  {}", m.short_description);
    println!("Input:        {} ({}), scale {}", m.input.name, m.input.description, m.image_scale);
    println!("Output:       {} ({})", m.output.name, m.output.description);
    println!("Source:       {}", m.source);
    println!("Converted at: {}", m.converted_at);
    for b in &m.architecture {
        println!(
            "  {:<8} {}x{} {:>5} -> {:<5}{}{}",
            b.name,
            b.kernel[0],
            b.kernel[1],
            b.in_channels,
            b.out_channels,
            if b.batch_norm { " +bn" } else { "" },
            if b.bias { " +bias" } else { "" },
        );
    }
    println!("Parameters:   {}", report.params);
    Ok(())
}
