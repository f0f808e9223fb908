//! Directory batch conversion.
//!
//! Every `.pdf` file of an input directory is summarized into
//! `<output>/<stem>.json`. A document that cannot be processed still gets a
//! JSON file: the "Extraction Failed" result carrying the error message.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::detect::has_pdf_extension;
use crate::error::Result;
use crate::model::OutlineResult;
use crate::render::{self, JsonFormat};
use crate::Outliner;

/// Options for a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Directory scanned for `.pdf` files (not recursive)
    pub input_dir: PathBuf,

    /// Directory receiving one `.json` file per input
    pub output_dir: PathBuf,

    /// Process documents in parallel
    pub parallel: bool,

    /// Make the output directory and files world-writable (Unix only)
    pub relax_permissions: bool,

    /// JSON layout of the output files
    pub format: JsonFormat,

    /// Parse and detection settings applied to every document
    pub outliner: Outliner,
}

impl BatchOptions {
    /// Create batch options for an input and output directory.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            parallel: true,
            relax_permissions: false,
            format: JsonFormat::Pretty,
            outliner: Outliner::default(),
        }
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Enable or disable permission relaxation on the outputs.
    pub fn with_relaxed_permissions(mut self, relax: bool) -> Self {
        self.relax_permissions = relax;
        self
    }

    /// Set the JSON format of the output files.
    pub fn with_format(mut self, format: JsonFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the parse and detection settings.
    pub fn with_outliner(mut self, outliner: Outliner) -> Self {
        self.outliner = outliner;
        self
    }
}

/// What happened to one input file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Title written to the output (the failure title for failed documents)
    pub title: String,
    /// Number of outline entries written
    pub entries: usize,
    /// Error message when the document failed or its output could not be written
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Per-file outcomes, in input order
    pub outcomes: Vec<FileOutcome>,
    /// Wall-clock time of the whole run
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }
}

/// List the PDF files of a directory, sorted by path.
///
/// The extension check is case-insensitive; subdirectories are ignored.
pub fn collect_inputs<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for entry in fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if path.is_file() && has_pdf_extension(&path) {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

/// Output path of an input file: `<output_dir>/<stem>.json`.
pub fn output_path(output_dir: &Path, input: &Path) -> PathBuf {
    output_dir.join(format!("{}.json", file_stem(input)))
}

/// Output paths for `inputs`, in the same order.
///
/// Inputs sharing a stem (`a.pdf` and `a.PDF`) would overwrite each other.
/// The first keeps `<stem>.json`, later ones get `<stem>_2.json`,
/// `<stem>_3.json` and so on. Names are compared case-insensitively so the
/// outputs stay distinct on case-insensitive filesystems too.
pub fn output_paths(output_dir: &Path, inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut taken = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let mut output = output_path(output_dir, input);
            let mut n = 2;
            while !taken.insert(output.to_string_lossy().to_lowercase()) {
                output = output_dir.join(format!("{}_{}.json", file_stem(input), n));
                n += 1;
            }
            if n > 2 {
                log::warn!(
                    "{} shares its output name with another input; writing {}",
                    input.display(),
                    output.display()
                );
            }
            output
        })
        .collect()
}

fn file_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string())
}

/// Summarize one file and write its JSON output.
///
/// Extraction failures are written as the failure document; only a failed
/// write leaves no output behind. Either way the outcome records the error.
pub fn process_file(input: &Path, output: &Path, options: &BatchOptions) -> FileOutcome {
    let result = options.outliner.extract(input).unwrap_or_else(|e| {
        log::warn!("{}: {}", input.display(), e);
        OutlineResult::failed(e)
    });

    let mut outcome = FileOutcome {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        title: result.title.clone(),
        entries: result.outline.len(),
        error: result.error.clone(),
    };

    if let Err(e) = write_result(&result, output, options) {
        log::error!("{}: cannot write output: {}", output.display(), e);
        outcome.error = Some(e.to_string());
    }
    outcome
}

fn write_result(result: &OutlineResult, output: &Path, options: &BatchOptions) -> Result<()> {
    let json = render::to_json(result, options.format)?;
    fs::write(output, json)?;
    if options.relax_permissions {
        relax_permissions(output, 0o666);
    }
    Ok(())
}

/// Convert every PDF of the input directory.
///
/// A missing or unreadable input directory fails the whole batch; per-file
/// problems are reported in the [`BatchReport`].
pub fn run_batch(options: &BatchOptions) -> Result<BatchReport> {
    run_batch_with_progress(options, |_| {})
}

/// Like [`run_batch`], calling `on_file` after each file is written.
pub fn run_batch_with_progress<F>(options: &BatchOptions, on_file: F) -> Result<BatchReport>
where
    F: Fn(&FileOutcome) + Sync,
{
    let start = Instant::now();
    let inputs = collect_inputs(&options.input_dir)?;

    fs::create_dir_all(&options.output_dir)?;
    if options.relax_permissions {
        relax_permissions(&options.output_dir, 0o777);
    }

    log::info!(
        "Processing {} PDF file(s) from {}",
        inputs.len(),
        options.input_dir.display()
    );

    let outputs = output_paths(&options.output_dir, &inputs);
    let jobs: Vec<(&PathBuf, &PathBuf)> = inputs.iter().zip(&outputs).collect();

    let process = |&(input, output): &(&PathBuf, &PathBuf)| {
        let outcome = process_file(input, output, options);
        on_file(&outcome);
        outcome
    };

    let outcomes: Vec<FileOutcome> = if options.parallel {
        jobs.par_iter().map(process).collect()
    } else {
        jobs.iter().map(process).collect()
    };

    let report = BatchReport {
        outcomes,
        elapsed: start.elapsed(),
    };
    log::info!(
        "Finished: {} succeeded, {} failed in {:.2?}",
        report.succeeded(),
        report.failed(),
        report.elapsed
    );
    Ok(report)
}

#[cfg(unix)]
fn relax_permissions(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(mode)) {
        log::warn!("Cannot change permissions of {}: {}", path.display(), e);
    }
}

#[cfg(not(unix))]
fn relax_permissions(_path: &Path, _mode: u32) {}
