//! pdf-outline CLI - title and heading outline extraction

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdf_outline::analysis::{outline_source, HeadingScorer, OutlineSource};
use pdf_outline::batch::{collect_inputs, run_batch_with_progress, BatchOptions};
use pdf_outline::{
    render, DetectionOptions, Document, FontProfile, JsonFormat, Outliner, PageSelection,
    ParseOptions,
};

#[derive(Parser)]
#[command(name = "pdf-outline")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Extract titles and H1-H3 outlines from PDF documents", long_about = None)]
struct Cli {
    /// Detection options (JSON file)
    #[arg(long, global = true, value_name = "FILE", env = "OUTLINE_CONFIG")]
    config: Option<PathBuf>,

    /// Always detect headings from typography, ignoring bookmarks
    #[arg(long, global = true)]
    no_toc: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every PDF of a directory to JSON (the default command)
    Batch(BatchArgs),

    /// Print the outline of one PDF as JSON
    Outline {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Show the extracted lines with their heading scores
    Layout {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Dump lines as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Show document information and font statistics
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Args, Default)]
struct BatchArgs {
    /// Directory containing the PDF files
    #[arg(short, long, value_name = "DIR", env = "INPUT_DIR", default_value = "input")]
    input: PathBuf,

    /// Directory receiving the JSON files
    #[arg(short, long, value_name = "DIR", env = "OUTPUT_DIR", default_value = "output")]
    output: PathBuf,

    /// Process files one at a time
    #[arg(long)]
    sequential: bool,

    /// Make outputs world-writable (for container volume mounts)
    #[arg(long)]
    relax_permissions: bool,

    /// Write compact JSON
    #[arg(long)]
    compact: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = load_detection(cli.config.as_deref(), cli.no_toc).and_then(|detection| {
        match cli.command {
            Some(Commands::Batch(args)) => cmd_batch(&args, detection),
            Some(Commands::Outline {
                input,
                output,
                compact,
                pages,
            }) => cmd_outline(&input, output.as_deref(), compact, pages.as_deref(), detection),
            Some(Commands::Layout { input, json, pages }) => {
                cmd_layout(&input, json, pages.as_deref(), &detection)
            }
            Some(Commands::Info { input }) => cmd_info(&input, &detection),
            Some(Commands::Version) => {
                cmd_version();
                Ok(())
            }
            None => cmd_batch(&default_batch_args(), detection),
        }
    });

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Batch arguments when no subcommand is given, honoring the same
/// environment variables as `batch`.
fn default_batch_args() -> BatchArgs {
    let dir = |var: &str, default: &str| {
        std::env::var_os(var)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(default))
    };
    BatchArgs {
        input: dir("INPUT_DIR", "input"),
        output: dir("OUTPUT_DIR", "output"),
        ..BatchArgs::default()
    }
}

fn load_detection(
    config: Option<&Path>,
    no_toc: bool,
) -> Result<DetectionOptions, Box<dyn std::error::Error>> {
    let mut detection = match config {
        Some(path) => {
            log::info!("Loading detection options from {}", path.display());
            DetectionOptions::from_json_file(path)?
        }
        None => DetectionOptions::default(),
    };
    if no_toc {
        detection = detection.ignore_native_toc();
    }
    Ok(detection)
}

fn parse_pages(pages: Option<&str>) -> Result<PageSelection, Box<dyn std::error::Error>> {
    match pages {
        Some(p) => Ok(PageSelection::parse(p)?),
        None => Ok(PageSelection::All),
    }
}

fn cmd_batch(
    args: &BatchArgs,
    detection: DetectionOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = if args.compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let mut options = BatchOptions::new(&args.input, &args.output)
        .with_relaxed_permissions(args.relax_permissions)
        .with_format(format)
        .with_outliner(Outliner::new().with_detection(detection));
    if args.sequential {
        options = options.sequential();
    }

    let total = collect_inputs(&args.input)
        .map_err(|e| format!("Cannot read input directory {}: {}", args.input.display(), e))?
        .len();
    if total == 0 {
        println!(
            "{} no PDF files in {}",
            "Nothing to do:".yellow(),
            args.input.display()
        );
        return Ok(());
    }

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let report = run_batch_with_progress(&options, |outcome| {
        let name = outcome
            .input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if let Some(ref error) = outcome.error {
            pb.println(format!("{} {}: {}", "Failed".red(), name, error));
        }
        pb.set_message(name);
        pb.inc(1);
    })?;
    pb.finish_with_message("Done!");

    println!(
        "\n{} {} succeeded, {} failed in {:.2?}",
        "Finished:".green().bold(),
        report.succeeded(),
        report.failed(),
        report.elapsed
    );
    println!("{} {}", "Output:".dimmed(), args.output.display());

    Ok(())
}

fn cmd_outline(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    pages: Option<&str>,
    detection: DetectionOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let outliner = Outliner::new()
        .with_detection(detection)
        .with_pages(parse_pages(pages)?);
    let result = outliner.extract(input)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let json = render::to_json(&result, format)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_layout(
    input: &Path,
    json: bool,
    pages: Option<&str>,
    detection: &DetectionOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = ParseOptions::new()
        .lenient()
        .with_pages(parse_pages(pages)?);
    let doc = pdf_outline::parse_file_with_options(input, options)?;

    if json {
        println!("{}", render::layout_to_json(&doc, JsonFormat::Pretty)?);
        return Ok(());
    }

    let profile = FontProfile::build(&doc, detection);
    let scorer = HeadingScorer::new(&profile, detection);

    let mut pages: Vec<_> = doc.pages.iter().collect();
    pages.sort_by_key(|p| p.index);
    for page in pages {
        println!("{}", format!("Page {}", page.index).cyan().bold());
        for line in &page.lines {
            let text = line.text();
            let Some(features) = scorer.features(line, page.width) else {
                println!("  {:>5.1} {:>5} {}", line.size(), "", text.dimmed());
                continue;
            };
            let score = scorer.score(&features);
            let marker = if scorer.is_heading(score) {
                scorer.level(features.size).to_string().green().bold()
            } else {
                "  ".normal()
            };
            println!("  {:>5.1} {:>5.2} {} {}", features.size, score, marker, text);
        }
    }

    Ok(())
}

fn cmd_info(input: &Path, detection: &DetectionOptions) -> Result<(), Box<dyn std::error::Error>> {
    // Lenient: metadata is still worth showing when some pages fail
    let doc: Document =
        pdf_outline::parse_file_with_options(input, ParseOptions::new().lenient())?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), doc.metadata.pdf_version);
    println!("{}: {}", "Pages".bold(), doc.metadata.page_count);
    println!(
        "{}: {}",
        "Encrypted".bold(),
        if doc.metadata.encrypted { "Yes" } else { "No" }
    );

    if let Some(ref title) = doc.metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = doc.metadata.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref producer) = doc.metadata.producer {
        println!("{}: {}", "Producer".bold(), producer);
    }
    if let Some(ref created) = doc.metadata.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = doc.metadata.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    println!();
    println!("{}", "Outline Sources".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Bookmarks".bold(), doc.toc.len());
    let source = match outline_source(&doc, detection) {
        OutlineSource::NativeToc => "bookmarks",
        OutlineSource::Heuristic => "heading detection",
    };
    println!("{}: {}", "Outline from".bold(), source);

    println!();
    println!("{}", "Font Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let profile = FontProfile::build(&doc, detection);
    println!("{}: {}", "Spans".bold(), profile.span_count());
    match profile.body_size() {
        Some(size) => println!("{}: {:.1}pt", "Body size".bold(), size),
        None => println!("{}: {}", "Body size".bold(), "none".dimmed()),
    }
    for (level, size) in profile.size_map() {
        println!("{}: {:.1}pt", level.to_string().bold(), size);
    }
    for cluster in profile.clusters() {
        println!(
            "  {} {:>5.1}pt x{}",
            "├─".dimmed(),
            cluster.median,
            cluster.members
        );
    }
    for (style, count) in profile.style_histogram() {
        println!("  {} {} x{}", "└─".dimmed(), style, count);
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdf-outline".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF title and outline extraction tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/pdf-outline".dimmed());
    println!("License: MIT");
}
