//! unpage CLI - PAGE-XML to shared JSON conversion tool

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use unpage::{
    detect_format_from_path, write_json_file, ConvertResult, DirectoryWatcher, DocumentStore,
    JsonFormat, JsonLinesStore, PageVersion, Unpage, WatchOptions,
};

#[derive(Parser)]
#[command(name = "unpage")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Convert PAGE-XML documents to the shared JSON document format", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a single PAGE-XML file
    File {
        /// Input PAGE-XML file
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output JSON file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        sinks: SinkArgs,

        #[command(flatten)]
        convert: ConvertArgs,
    },

    /// Watch a directory and convert files as they arrive
    Watch {
        /// Directory to watch
        #[arg(short, long, value_name = "DIR")]
        input: PathBuf,

        /// Output directory for JSON files
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Seconds between polls
        #[arg(long, value_name = "SECS", default_value = "2")]
        interval: u64,

        /// Keep source files after conversion
        #[arg(long)]
        keep: bool,

        #[command(flatten)]
        sinks: SinkArgs,

        #[command(flatten)]
        convert: ConvertArgs,
    },

    /// Show detected version and schema validation results
    Info {
        /// Input PAGE-XML file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Directory holding the version schemas
        #[arg(long, value_name = "DIR", env = "UNPAGE_SCHEMA_DIR")]
        schema_dir: Option<PathBuf>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

/// Where converted documents go besides the output file.
#[derive(Args)]
struct SinkArgs {
    /// Append documents to a JSON-lines store
    #[arg(long, value_name = "FILE")]
    store: Option<PathBuf>,

    /// Log converted documents
    #[arg(long)]
    log_output: bool,

    /// Write compact JSON
    #[arg(long)]
    compact: bool,
}

#[derive(Args)]
struct ConvertArgs {
    /// Skip detection and convert as this version (2017-07-15, 2019-07-15)
    #[arg(long, value_name = "VERSION")]
    force: Option<String>,

    /// Directory holding the version schemas
    #[arg(long, value_name = "DIR", env = "UNPAGE_SCHEMA_DIR")]
    schema_dir: Option<PathBuf>,
}

impl ConvertArgs {
    fn converter(&self) -> Result<Unpage, Box<dyn std::error::Error>> {
        let mut converter = Unpage::new();
        if let Some(dir) = &self.schema_dir {
            converter = converter.with_schema_dir(dir);
        }
        if let Some(version) = &self.force {
            converter = converter.force_version(version.parse::<PageVersion>()?);
        }
        Ok(converter)
    }
}

/// Opened sinks for one command.
struct Outputs {
    store: Option<JsonLinesStore>,
    log_output: bool,
    format: JsonFormat,
}

impl Outputs {
    fn open(args: &SinkArgs, has_output: bool) -> Result<Self, Box<dyn std::error::Error>> {
        if !has_output && args.store.is_none() && !args.log_output {
            return Err("nothing to do: give an output, --store or --log-output".into());
        }
        let store = args.store.as_ref().map(JsonLinesStore::open).transpose()?;
        Ok(Self {
            store,
            log_output: args.log_output,
            format: if args.compact {
                JsonFormat::Compact
            } else {
                JsonFormat::Pretty
            },
        })
    }

    fn emit(&mut self, result: &ConvertResult, output: Option<&Path>) -> unpage::Result<Option<PathBuf>> {
        let written = output
            .map(|path| write_json_file(path, &result.document, self.format))
            .transpose()?;
        if let Some(store) = &mut self.store {
            store.insert_one(&result.document.to_value()?)?;
        }
        if self.log_output {
            unpage::log_document(&result.document)?;
        }
        Ok(written)
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::File {
            input,
            output,
            sinks,
            convert,
        } => cmd_file(&input, output.as_deref(), &sinks, &convert),
        Commands::Watch {
            input,
            output,
            interval,
            keep,
            sinks,
            convert,
        } => cmd_watch(&input, output.as_deref(), interval, keep, &sinks, &convert),
        Commands::Info {
            input,
            schema_dir,
            json,
        } => cmd_info(&input, schema_dir, json),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_file(
    input: &Path,
    output: Option<&Path>,
    sinks: &SinkArgs,
    convert: &ConvertArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut outputs = Outputs::open(sinks, output.is_some())?;
    let converter = convert.converter()?;
    log::debug!("Converting {} with {} schema versions", input.display(), converter.chain().len());

    let result = converter.convert_file(input)?;
    let written = outputs.emit(&result, output)?;

    println!(
        "{} {} as PAGE {}{}",
        "Converted".green().bold(),
        input.display(),
        result.version,
        if result.forced { " (forced)" } else { "" }
    );
    if let Some(path) = written {
        println!("{} {}", "Saved to".green(), path.display());
    }
    print_warnings(&result);

    Ok(())
}

fn cmd_watch(
    input: &Path,
    output: Option<&Path>,
    interval: u64,
    keep: bool,
    sinks: &SinkArgs,
    convert: &ConvertArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut outputs = Outputs::open(sinks, output.is_some())?;
    let converter = convert.converter()?;

    let mut options = WatchOptions::new().with_interval(Duration::from_secs(interval.max(1)));
    if keep {
        options = options.keep_sources();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message(format!("Watching {}", input.display()));

    log::debug!("Watch options: {:?}", options);
    let mut converted = 0usize;
    let mut watcher = DirectoryWatcher::new(input, converter, options);
    // Never sent to: the watcher runs until the process is interrupted.
    let (_stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);

    watcher.run(&stop_rx, |source, result| {
        let target = output.map(|dir| dir.join(json_file_name(source)));
        outputs.emit(result, target.as_deref())?;
        converted += 1;
        spinner.set_message(format!(
            "Watching {} ({} converted, last: {})",
            input.display(),
            converted,
            source.display()
        ));
        Ok(())
    })?;

    spinner.finish_with_message("Done!");
    Ok(())
}

fn cmd_info(input: &Path, schema_dir: Option<PathBuf>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let format = detect_format_from_path(input)?;
    let mut converter = Unpage::new();
    if let Some(dir) = schema_dir {
        converter = converter.with_schema_dir(dir);
    }

    let data = std::fs::read(input)?;
    let mut checks = Vec::new();
    for version in converter.chain().versions() {
        if let Some(handler) = converter.chain().get_by_version(version) {
            checks.push((version, handler.validate(&data)?));
        }
    }

    if json {
        let value = serde_json::json!({
            "file": input.display().to_string(),
            "root": format.root,
            "namespace": format.namespace,
            "detected": format.version.map(|v| v.to_string()),
            "validation": checks.iter().map(|(version, result)| serde_json::json!({
                "version": version.to_string(),
                "valid": result.ok,
                "diagnostic": result.diagnostic,
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), format);

    println!();
    println!("{}", "Schema Validation".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for (version, result) in &checks {
        if result.ok {
            println!("{}: {}", version.to_string().bold(), "valid".green());
        } else {
            println!(
                "{}: {} {}",
                version.to_string().bold(),
                "invalid".red(),
                result.diagnostic.as_deref().unwrap_or_default().dimmed()
            );
        }
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "unpage".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PAGE-XML to shared JSON document converter");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/unpage".dimmed());
    println!("License: MIT");
}

fn print_warnings(result: &ConvertResult) {
    if result.warnings.is_empty() {
        return;
    }
    println!(
        "\n{} {}",
        result.warnings.len().to_string().yellow().bold(),
        "conversion warnings:".yellow()
    );
    for (i, warning) in result.warnings.iter().enumerate() {
        let branch = if i + 1 == result.warnings.len() { "└─" } else { "├─" };
        println!("  {} {}", branch.dimmed(), warning);
    }
}

/// `page.xml` -> `page.xml.json`
fn json_file_name(source: &Path) -> String {
    let name = source.file_name().unwrap_or_default().to_string_lossy();
    format!("{}.json", name)
}
