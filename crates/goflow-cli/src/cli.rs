use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{ArgAction, Parser};
use goflow_codegen::{CodeGenerator, FlowType};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

/// File name used when `--out` names a directory.
const DEFAULT_OUTPUT: &str = "models.js";

#[derive(Debug, Parser)]
#[command(name = "goflow", bin_name = "goflow", version)]
#[command(about = "Generate Flow type definitions from Go structs")]
#[command(after_help = r#"EXAMPLES:
  goflow --dir ./models --out ./web/
  goflow --file ./models/user.go --out ./web/user.js
  goflow --dir ./models -r false --map uuid.UUID=string"#)]
pub struct Cli {
    /// Directory to read Go source files from
    #[arg(long, value_name = "DIR", default_value = "./")]
    pub dir: PathBuf,

    /// Single Go file to read, overrides --dir
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Output file, or directory to write models.js into
    #[arg(long, value_name = "PATH", default_value = "./")]
    pub out: String,

    /// Descend into subdirectories of --dir
    #[arg(short = 'r', long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set)]
    pub recursive: bool,

    /// Emit nested anonymous structs as inline objects
    #[arg(long)]
    pub nested: bool,

    /// Map a Go type to a Flow type, e.g. uuid.UUID=string
    #[arg(long = "map", value_name = "NAME=TYPE", value_parser = parse_mapping)]
    pub mappings: Vec<(String, String)>,

    /// Hide the progress spinner
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("the file passed in is not a go file: {}", .0.display())]
    NotGoFile(PathBuf),

    #[error("error creating {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Codegen(#[from] goflow_codegen::Error),
}

fn parse_mapping(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((name, ty)) if !name.trim().is_empty() && !ty.trim().is_empty() => {
            Ok((name.trim().to_string(), ty.trim().to_string()))
        }
        _ => Err(format!("expected NAME=TYPE, got `{value}`")),
    }
}

/// Where to save the document: a `.js` path is used as-is, anything else is
/// treated as a directory.
pub fn output_path(out: &str) -> PathBuf {
    if out.ends_with(".js") {
        PathBuf::from(out)
    } else if out.ends_with('/') {
        PathBuf::from(format!("{out}{DEFAULT_OUTPUT}"))
    } else {
        PathBuf::from(format!("{out}/{DEFAULT_OUTPUT}"))
    }
}

fn is_go_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "go")
}

fn spinner(enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

pub fn run(cli: Cli) -> Result<(), CliError> {
    let start = Instant::now();

    if let Some(file) = &cli.file {
        if !is_go_file(file) {
            return Err(CliError::NotGoFile(file.clone()));
        }
    }

    let save_location = output_path(&cli.out);
    let output = File::create(&save_location).map_err(|source| CliError::Output {
        path: save_location.clone(),
        source,
    })?;

    let mut codegen = CodeGenerator::new();
    codegen.nested_records(cli.nested);
    for (name, ty) in &cli.mappings {
        codegen.register_type(name.as_str(), FlowType::named(ty));
    }

    let progress = spinner(!cli.no_progress);
    progress.set_message("parsing go sources");
    match &cli.file {
        Some(file) => {
            codegen.add_source_file(file);
        }
        None => {
            codegen.add_source_dir(&cli.dir, cli.recursive)?;
        }
    }

    progress.set_message("writing flow types");
    let written = codegen.write_to(BufWriter::new(output));
    progress.finish_and_clear();
    written?;

    info!("saved to {}", save_location.display());
    info!("completed code generation in {:?}", start.elapsed());
    Ok(())
}
