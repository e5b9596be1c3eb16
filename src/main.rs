//! Headless renderer binary: load a PDB file, render it once, and write
//! the exported frame as a binary PPM.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use provis::error::ProvisError;
use provis::export;
use provis::options::Options;
use provis::visualizer::Visualizer;

struct CliArgs {
    pdb_path: PathBuf,
    output_path: PathBuf,
    options_path: Option<PathBuf>,
}

fn parse_args() -> Option<CliArgs> {
    let mut args = std::env::args().skip(1);
    let pdb_path = PathBuf::from(args.next()?);
    let output_path = args
        .next()
        .map_or_else(|| PathBuf::from("render.ppm"), PathBuf::from);
    let options_path = args.next().map(PathBuf::from);
    Some(CliArgs {
        pdb_path,
        output_path,
        options_path,
    })
}

fn load_options(path: Option<&Path>) -> Result<Options, ProvisError> {
    match path {
        Some(path) => Options::load(path),
        None => Ok(Options::default()),
    }
}

fn run(args: &CliArgs) -> Result<(), ProvisError> {
    let options = load_options(args.options_path.as_deref())?;
    let multiplier = options.export.multiplier;

    let mut visualizer = Visualizer::new(options)?;
    let text = std::fs::read_to_string(&args.pdb_path)?;
    let _ = visualizer.load_structure(&text)?;
    visualizer.render_frame();

    let image = visualizer.on_export_request(multiplier)?;
    std::fs::write(&args.output_path, export::to_ppm(&image))?;
    log::info!(
        "wrote {}x{} image to {}",
        image.width,
        image.height,
        args.output_path.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let Some(args) = parse_args() else {
        log::error!("Usage: provis <structure.pdb> [output.ppm] [options.toml]");
        return ExitCode::FAILURE;
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
