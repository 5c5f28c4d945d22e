mod bulk;
mod error_formatter;
mod formatter;
mod output;

use anyhow::{bail, Result};
use bulk::Discovery;
use clap::{Args, Parser, Subcommand};
use formatter::{CountReport, Formatter};
use output::OutputDir;
use procgen::{Engine, GenerationLimits, Mode, ProcgenError, ProcgenResult, Template};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "procgen")]
#[command(about = "Procedurally generate variations of an AnimalAI task definition.")]
#[command(
    long_about = "procgen expands an AnimalAI arena template annotated with !Proc* tags into concrete task variations.\nThe CLI counts variations, samples them at random, or generates every one of them, for a single template or a whole directory."
)]
#[command(version)]
struct Cli {
    /// Log every generated variation (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct SharedOptions {
    /// Seed for random number generation
    #[arg(short, long, default_value_t = GenerationLimits::default().seed)]
    seed: u64,
    /// Output directory for the variations (default: tmp/<template>_variations, or tmp for bulk runs)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Copy the template to the output directory (default)
    #[arg(long, overrides_with = "no_copy_template")]
    copy_template: bool,
    /// Do not copy the template to the output directory
    #[arg(long, overrides_with = "copy_template")]
    no_copy_template: bool,
}

impl SharedOptions {
    fn copy_template(&self) -> bool {
        self.copy_template || !self.no_copy_template
    }
}

#[derive(Args, Clone)]
struct BulkOptions {
    /// Directories to skip, by name or path relative to the template directory
    #[arg(short, long, num_args = 1..)]
    ignore_dirs: Vec<PathBuf>,
    /// Also look for templates in hidden directories
    #[arg(long)]
    no_ignore_hidden: bool,
    /// Put all variation directories directly under the output directory.
    ///
    /// Templates with the same file name overwrite each other's variations.
    #[arg(long)]
    flatten: bool,
}

impl BulkOptions {
    fn discovery(&self) -> Discovery {
        Discovery {
            ignore_dirs: self.ignore_dirs.clone(),
            ignore_hidden: !self.no_ignore_hidden,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Sample random variations of a template
    ///
    /// Draws every variation independently, so the same variation can appear more than once.
    Sample {
        /// Template file
        path: PathBuf,
        /// Number of variations to sample
        #[arg(default_value_t = GenerationLimits::default().sample_amount)]
        amount: usize,
        #[command(flatten)]
        shared: SharedOptions,
    },
    /// Generate every variation of a template
    ///
    /// Refuses templates with more than --max variations unless --head is given.
    Gen {
        /// Template file
        path: PathBuf,
        /// Largest number of variations to generate
        #[arg(short, long, default_value_t = GenerationLimits::default().max_variations)]
        max: u128,
        /// Only generate the first N variations
        #[arg(long)]
        head: Option<usize>,
        #[command(flatten)]
        shared: SharedOptions,
    },
    /// Count the variations of a template and show where the count comes from
    Count {
        /// Template file
        path: PathBuf,
    },
    /// Sample random variations of every template in a directory
    SampleBulk {
        /// Directory containing template files
        path: PathBuf,
        /// Number of variations to sample per template
        #[arg(default_value_t = GenerationLimits::default().sample_amount)]
        amount: usize,
        #[command(flatten)]
        shared: SharedOptions,
        #[command(flatten)]
        bulk: BulkOptions,
    },
    /// Generate every variation of every template in a directory
    ///
    /// Templates with more than --max variations are reported as failed.
    GenBulk {
        /// Directory containing template files
        path: PathBuf,
        /// Largest number of variations to generate per template
        #[arg(short, long, default_value_t = GenerationLimits::default().max_variations)]
        max: u128,
        #[command(flatten)]
        shared: SharedOptions,
        #[command(flatten)]
        bulk: BulkOptions,
    },
    /// Count the variations of every template in a directory
    CountBulk {
        /// Directory containing template files
        path: PathBuf,
        /// Print the counts as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        bulk: BulkOptions,
    },
}

/// What to produce from one template
#[derive(Debug, Clone, Copy)]
enum Request {
    Sample { amount: usize },
    Generate { head: Option<usize> },
}

/// Result of expanding one template
struct Expansion {
    count: u128,
    explanation: String,
    /// `None` when the template was refused for having too many variations
    written: Option<usize>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Sample {
            path,
            amount,
            shared,
        } => single_command(
            path,
            Request::Sample { amount: *amount },
            shared,
            engine(shared.seed, None),
        ),
        Commands::Gen {
            path,
            max,
            head,
            shared,
        } => single_command(
            path,
            Request::Generate { head: *head },
            shared,
            engine(shared.seed, Some(*max)),
        ),
        Commands::Count { path } => count_command(path),
        Commands::SampleBulk {
            path,
            amount,
            shared,
            bulk,
        } => bulk_command(
            path,
            Request::Sample { amount: *amount },
            shared,
            bulk,
            engine(shared.seed, None),
        ),
        Commands::GenBulk {
            path,
            max,
            shared,
            bulk,
        } => bulk_command(
            path,
            Request::Generate { head: None },
            shared,
            bulk,
            engine(shared.seed, Some(*max)),
        ),
        Commands::CountBulk { path, json, bulk } => count_bulk_command(path, *json, bulk),
    };

    if let Err(e) = result {
        if let Some(procgen_err) = e.downcast_ref::<ProcgenError>() {
            eprintln!("{}", error_formatter::format_error(procgen_err));
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "procgen=debug" } else { "procgen=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(io::stderr)
        .init();
}

fn engine(seed: u64, max: Option<u128>) -> Engine {
    let defaults = GenerationLimits::default();
    Engine::with_limits(GenerationLimits {
        seed,
        max_variations: max.unwrap_or(defaults.max_variations),
        ..defaults
    })
}

fn single_command(
    path: &Path,
    request: Request,
    shared: &SharedOptions,
    engine: Engine,
) -> Result<()> {
    if path.is_dir() {
        bail!(
            "{} is a directory. Use sample-bulk or gen-bulk to process a directory of templates.",
            path.display()
        );
    }

    let out_dir = shared
        .output
        .clone()
        .unwrap_or_else(|| output::default_dir(path));
    let expansion = expand_template(&engine, path, request, &out_dir, shared.copy_template())?;

    let formatter = Formatter::default();
    print!(
        "{}",
        formatter.format_count(expansion.count, &expansion.explanation)
    );
    match expansion.written {
        Some(written) => {
            println!("Wrote {} variation(s) to {}", written, out_dir.display());
            Ok(())
        }
        None => bail!(too_many(expansion.count, engine.limits())),
    }
}

fn too_many(count: u128, limits: &GenerationLimits) -> String {
    format!(
        "Too many variations. The total number of possible variations is {}, while the maximum is {}. \
         Try reducing choices, increasing --max, or using --head.",
        count, limits.max_variations
    )
}

/// Read one template and write its variations to `out_dir`
fn expand_template(
    engine: &Engine,
    path: &Path,
    request: Request,
    out_dir: &Path,
    copy_template: bool,
) -> Result<Expansion> {
    let source_id = path.display().to_string();
    let annotate = |error: ProcgenError| error.in_source(&source_id);

    let document = engine.read(path).map_err(annotate)?;
    let count = engine.count(&document).map_err(annotate)?;
    let explanation = engine.explain(&document).map_err(annotate)?;
    info!(template = %source_id, count = %count, "{}", explanation);

    let (mode, amount) = match request {
        Request::Sample { amount } => (Mode::Sample, amount),
        Request::Generate { head } => {
            if head.is_none() && !engine.limits().allows(count) {
                return Ok(Expansion {
                    count,
                    explanation,
                    written: None,
                });
            }
            let mut cap = count.min(engine.limits().max_variations);
            if let Some(head) = head {
                cap = cap.min(head as u128);
            }
            (
                Mode::Exhaustive,
                usize::try_from(cap).unwrap_or(usize::MAX),
            )
        }
    };

    let template = Template::split(&document).map_err(annotate)?;
    let mut out = OutputDir::create(out_dir, &output::stem(path))?;
    if copy_template {
        out.copy_template(&document)?;
    }
    for variation in engine.generate(mode, &template, amount).map_err(annotate)? {
        let (node, meta) = variation.map_err(annotate)?;
        out.write(&node, &meta)?;
    }
    info!(template = %source_id, output = %out.path().display(), "Wrote variations");
    let written = out.finish()?;

    Ok(Expansion {
        count,
        explanation,
        written: Some(written),
    })
}

fn bulk_command(
    root: &Path,
    request: Request,
    shared: &SharedOptions,
    bulk: &BulkOptions,
    engine: Engine,
) -> Result<()> {
    let templates = bulk.discovery().templates(root)?;
    let output_root = shared.output.clone().unwrap_or_else(|| PathBuf::from("tmp"));
    info!(templates = templates.len(), root = %root.display(), "Processing templates");

    let mut failed = Vec::new();
    for template in &templates {
        let source_id = template.display().to_string();
        let out_dir = bulk::output_dir_for(root, template, &output_root, bulk.flatten);
        let error_dir = bulk::error_dir_for(root, template, &output_root, bulk.flatten);
        let stem = output::stem(template);

        match expand_template(&engine, template, request, &out_dir, shared.copy_template()) {
            Ok(Expansion {
                written: Some(written),
                count,
                ..
            }) => {
                println!("{}\t{}\t{} written", source_id, count, written);
            }
            Ok(Expansion {
                written: None,
                count,
                explanation,
            }) => {
                let report = format!(
                    "TooManyVariations in {}\n{}\n{}",
                    source_id,
                    too_many(count, engine.limits()),
                    explanation
                );
                let artifact = output::write_error(&error_dir, &stem, &report)?;
                warn!(template = %source_id, artifact = %artifact.display(), "Too many variations, skipped");
                failed.push((source_id, "TooManyVariations".to_string()));
            }
            Err(error) => match error.downcast_ref::<ProcgenError>() {
                Some(procgen_err) if procgen_err.is_user_facing() => {
                    let artifact = output::write_error(&error_dir, &stem, &procgen_err.to_string())?;
                    warn!(
                        template = %source_id,
                        error = procgen_err.user_label(),
                        artifact = %artifact.display(),
                        "Template failed"
                    );
                    failed.push((source_id, procgen_err.user_label().to_string()));
                }
                _ => return Err(error),
            },
        }
    }

    let formatter = Formatter::default();
    print!(
        "{}",
        formatter.format_bulk_summary(templates.len(), &failed)
    );
    if !failed.is_empty() {
        bail!(
            "{} of {} template(s) failed. See the .error.txt files in {}",
            failed.len(),
            templates.len(),
            output_root.display()
        );
    }
    Ok(())
}

fn count_template(engine: &Engine, path: &Path) -> ProcgenResult<(u128, String)> {
    let document = engine.read(path)?;
    Ok((engine.count(&document)?, engine.explain(&document)?))
}

fn count_command(path: &Path) -> Result<()> {
    let engine = Engine::default();
    let (count, explanation) =
        count_template(&engine, path).map_err(|e| e.in_source(path.display().to_string()))?;
    print!("{}", Formatter::default().format_count(count, &explanation));
    Ok(())
}

fn count_bulk_command(root: &Path, json: bool, bulk: &BulkOptions) -> Result<()> {
    let engine = Engine::default();
    let mut reports = Vec::new();
    for template in bulk.discovery().templates(root)? {
        let source_id = template.display().to_string();
        match count_template(&engine, &template) {
            Ok((count, explanation)) => {
                reports.push(CountReport::counted(source_id, count, explanation));
            }
            Err(error) if error.is_user_facing() => {
                warn!(template = %source_id, "{}", error);
                reports.push(CountReport::failed(source_id, error.user_label()));
            }
            Err(error) => return Err(error.in_source(source_id).into()),
        }
    }

    let formatter = Formatter::default();
    if json {
        println!("{}", formatter.format_count_json(&reports)?);
    } else {
        print!("{}", formatter.format_count_table(&reports));
    }

    let failed = reports.iter().filter(|report| report.error.is_some()).count();
    if failed > 0 {
        bail!("{} of {} template(s) could not be counted", failed, reports.len());
    }
    Ok(())
}
