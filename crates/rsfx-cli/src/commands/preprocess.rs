//! `rsfx preprocess` - expand meta-code across a script's import closure.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Args;

use rsfx_engine::{Environment, LoadOptions, load_program};

/// Arguments for the preprocess command.
#[derive(Args)]
pub struct PreprocessArgs {
    /// Script file to preprocess
    pub input: PathBuf,

    /// Define a preprocessor variable (repeatable)
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,

    /// Extra directory searched for imports
    #[arg(long, value_name = "DIR")]
    pub import_root: Option<PathBuf>,

    /// Output directory (default: <input stem>_preprocessed next to the input)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
}

/// Run the preprocess command.
pub fn run(args: PreprocessArgs) -> anyhow::Result<()> {
    let mut env = Environment::new();
    if let Some(root) = &args.import_root {
        env.set_import_root(root);
    }
    for def in &args.vars {
        let Some((name, value)) = def.split_once('=') else {
            bail!("malformed --var '{def}', expected NAME=VALUE");
        };
        let value: f64 = value
            .parse()
            .with_context(|| format!("malformed --var value in '{def}'"))?;
        env.set_preprocessor_var(name, value);
    }

    let program = load_program(&args.input, &env, LoadOptions::default())
        .with_context(|| format!("failed to preprocess '{}'", args.input.display()))?;
    tracing::debug!(units = program.units().len(), "program loaded");

    let out_dir = match args.output {
        Some(dir) => dir,
        None => default_output_dir(&args.input)?,
    };
    let input_dir = args.input.parent().unwrap_or(Path::new("."));

    for unit in program.units() {
        let relative = unit
            .path
            .strip_prefix(input_dir)
            .map_or_else(|_| flat_name(&unit.path), Path::to_path_buf);
        let target = out_dir.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create '{}'", parent.display()))?;
        }
        fs::write(&target, &unit.preprocessed)
            .with_context(|| format!("failed to write '{}'", target.display()))?;
        println!("{} -> {}", unit.path.display(), target.display());
    }

    Ok(())
}

/// `<input stem>_preprocessed` next to the input file.
fn default_output_dir(input: &Path) -> anyhow::Result<PathBuf> {
    let stem = input
        .file_stem()
        .with_context(|| format!("'{}' has no file name", input.display()))?;
    let mut name = stem.to_os_string();
    name.push("_preprocessed");
    Ok(input.parent().unwrap_or(Path::new(".")).join(name))
}

/// Fallback for units outside the input's directory tree (e.g. resolved
/// through an import root): keep just the file name.
fn flat_name(path: &Path) -> PathBuf {
    path.file_name().map_or_else(|| PathBuf::from("unit"), PathBuf::from)
}
