//! CLI: resolve declaration units → (generate | check)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use crate::emit::NamedArtifact;
use crate::load::from_str_with_path;
use crate::raw::RawUnit;
use crate::resolve::{GenOptions, resolve};
use crate::synth;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile schema declaration units into derived model source
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// resolve every unit and write its artifact set
    Generate(GenerateOut),
    /// resolve every unit and report diagnostics, writing nothing
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JQ pre-process filter applied to each document; one document may fan
    /// out into several declaration units
    #[arg(long)]
    jq_expr: Option<String>,

    /// enforce the legacy cap on total union arity
    #[arg(long, default_value_t = false)]
    legacy_union_limit: bool,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output directory, one subdirectory per unit (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct CheckArgs {
    #[command(flatten)]
    input_settings: InputSettings,
}

/// One fully processed unit, ready to write.
struct UnitOutput {
    name: String,
    warnings: Vec<String>,
    artifacts: Vec<NamedArtifact>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Load every declaration unit named by the inputs, after globbing and
    /// the optional jq pre-filter.
    fn load_units(&self) -> Result<Vec<RawUnit>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut units = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file `{source_path_str}`"))?;
            match self.jq_expr.as_ref() {
                None => {
                    let unit = from_str_with_path::<RawUnit>(&source)
                        .map_err(|e| anyhow!("{source_path_str}: {e}"))?;
                    units.push(unit);
                }
                Some(jq_expr) => {
                    let document =
                        serde_json::from_str::<serde_json::Value>(&source).with_context(|| {
                            format!("failed to parse JSON source file `{source_path_str}`")
                        })?;
                    let filtered = crate::jq_exec::apply_filter(jq_expr, &document)
                        .with_context(|| {
                            format!("failed to apply jq expression to `{source_path_str}`")
                        })?;
                    for text in filtered {
                        let unit = from_str_with_path::<RawUnit>(&text)
                            .map_err(|e| anyhow!("{source_path_str} (after jq): {e}"))?;
                        units.push(unit);
                    }
                }
            }
        }
        Ok(units)
    }

    fn gen_options(&self) -> GenOptions {
        GenOptions {
            legacy_union_limit: self.legacy_union_limit,
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Generate(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let outputs = process_units(&target.input_settings)?;
                for output in &outputs {
                    report_warnings(output);
                    write_unit(output, target.out.as_deref())?;
                }
                Ok(())
            }
            Command::Check(target) => {
                let outputs = process_units(&target.input_settings)?;
                for output in &outputs {
                    report_warnings(output);
                    eprintln!(
                        "{} unit `{}`: {} artifact(s)",
                        "ok:".green().bold(),
                        output.name,
                        output.artifacts.len()
                    );
                }
                Ok(())
            }
        }
    }
}

/// Resolve and synthesize every unit, in parallel. Any failing unit fails
/// the whole run; nothing is written for any unit in that case.
fn process_units(settings: &InputSettings) -> Result<Vec<UnitOutput>> {
    let units = settings.load_units()?;
    let opts = settings.gen_options();
    units
        .par_iter()
        .map(|raw| {
            let resolution =
                resolve(raw, &opts).map_err(|e| anyhow!("unit `{}`: {e}", raw.name))?;
            let artifacts = synth::synthesize(&resolution.unit)
                .map_err(|e| anyhow!("unit `{}`: {e}", raw.name))?;
            Ok(UnitOutput {
                name: resolution.unit.name.clone(),
                warnings: resolution.warnings,
                artifacts,
            })
        })
        .collect()
}

fn report_warnings(output: &UnitOutput) {
    for warning in &output.warnings {
        eprintln!(
            "{} unit `{}`: {}",
            "warning:".yellow().bold(),
            output.name,
            warning
        );
    }
}

fn write_unit(output: &UnitOutput, out_dir: Option<&Path>) -> Result<()> {
    match out_dir {
        Some(dir) => {
            let unit_dir = dir.join(&output.name);
            std::fs::create_dir_all(&unit_dir).with_context(|| {
                format!("failed to create output directory `{}`", unit_dir.display())
            })?;
            for artifact in &output.artifacts {
                let path = unit_dir.join(&artifact.file_name);
                std::fs::write(&path, &artifact.source)
                    .with_context(|| format!("failed to write `{}`", path.display()))?;
            }
        }
        None => {
            for artifact in &output.artifacts {
                println!("// ==== {}/{} ====", output.name, artifact.file_name);
                println!("{}", artifact.source);
            }
        }
    }
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                return Err(anyhow!("glob pattern matched no files: {pattern}"));
            }
        } else {
            // Treat as a literal path
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_paths_pass_through_unchanged() {
        let paths = resolve_file_path_patterns(["a/b.json", "c.json"]).unwrap();
        assert_eq!(paths, [PathBuf::from("a/b.json"), PathBuf::from("c.json")]);
    }

    #[test]
    fn unmatched_glob_is_an_error() {
        let err = resolve_file_path_patterns(["/nonexistent-dir-xyz/*.json"]).unwrap_err();
        assert!(err.to_string().contains("matched no files"));
    }
}
