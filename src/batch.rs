//! Batch processing of many PDFs with a failure ledger.
//!
//! Every document runs through three stages: extraction, export (metadata
//! and crops) and an optional debug overlay. A failure is recorded in the
//! ledger file of its stage and never stops the other documents.
//!
//! # Example
//!
//! ```no_run
//! use figcap::batch::{collect_pdfs, BatchOptions, BatchProcessor};
//! use figcap::parser::FigureExtractor;
//! use figcap::source::{SidecarMeasurer, XpdfSource};
//! use std::sync::Arc;
//!
//! fn main() -> figcap::Result<()> {
//!     let extractor = FigureExtractor::new(
//!         Arc::new(XpdfSource::new("/tmp/artifacts")),
//!         Arc::new(SidecarMeasurer::new()),
//!     );
//!     let options = BatchOptions::new("/tmp/data").with_logs_dir("/tmp/logs");
//!
//!     let pdfs = collect_pdfs("/tmp/pdfs")?;
//!     let report = BatchProcessor::new(extractor, options).run(&pdfs)?;
//!     println!("{}/{} succeeded", report.succeeded, report.total);
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Serialize;

use crate::detect::document_name;
use crate::error::{Error, Result};
use crate::parser::FigureExtractor;
use crate::render::{debug, export_metadata, save_images, ExportOptions};

const SUCCESS_LOG: &str = "success.log";

/// Options for batch runs.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Documents per thread pool; the pool is rebuilt for every chunk
    pub chunk_size: usize,

    /// Worker threads (0 = available parallelism)
    pub threads: usize,

    /// Folder receiving the ledger files
    pub logs_dir: PathBuf,

    /// Folder receiving metadata and crops
    pub data_dir: PathBuf,

    /// Write each document's output into `<data_dir>/<name>/`
    pub per_document_dir: bool,

    /// Process documents listed in the extraction failure ledger again
    pub reprocess_errors: bool,

    /// Draw debug overlays
    pub draw: bool,

    /// Export options
    pub export: ExportOptions,
}

impl BatchOptions {
    /// Create options writing into `data_dir`, with ledgers next to it.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            chunk_size: 32,
            threads: 0,
            logs_dir: data_dir.clone(),
            data_dir,
            per_document_dir: true,
            reprocess_errors: false,
            draw: false,
            export: ExportOptions::default(),
        }
    }

    /// Set the chunk size.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Set the number of worker threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the ledger folder.
    pub fn with_logs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.logs_dir = dir.into();
        self
    }

    /// Write all documents straight into the data folder.
    pub fn with_per_document_dir(mut self, enabled: bool) -> Self {
        self.per_document_dir = enabled;
        self
    }

    /// Retry documents that failed extraction in earlier runs.
    pub fn with_reprocess_errors(mut self, enabled: bool) -> Self {
        self.reprocess_errors = enabled;
        self
    }

    /// Enable debug overlays.
    pub fn with_draw(mut self, draw: bool) -> Self {
        self.draw = draw;
        self
    }

    /// Set export options.
    pub fn with_export(mut self, export: ExportOptions) -> Self {
        self.export = export;
        self
    }

    /// Output folder of the document called `name`.
    pub fn output_dir(&self, name: &str) -> PathBuf {
        if self.per_document_dir {
            self.data_dir.join(name)
        } else {
            self.data_dir.clone()
        }
    }

    fn thread_count(&self) -> usize {
        if self.threads > 0 {
            self.threads
        } else {
            std::thread::available_parallelism().map_or(1, |n| n.get())
        }
    }
}

/// Pipeline stage a document failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Layout, caption, candidate or sweep stage; nothing was exported
    Extraction,
    /// Metadata or image writing
    Export,
    /// Debug overlay; extracted data is unaffected
    Draw,
}

impl FailureKind {
    /// Ledger file of this stage.
    pub fn ledger_file(&self) -> &'static str {
        match self {
            FailureKind::Extraction => "failed_extract.log",
            FailureKind::Export => "failed_export.log",
            FailureKind::Draw => "failed_draw.log",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::Extraction => "FAILED_EXTRACT",
            FailureKind::Export => "FAILED_EXPORT",
            FailureKind::Draw => "FAILED_DRAW",
        };
        f.write_str(s)
    }
}

/// Result of processing one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentOutcome {
    pub name: String,
    pub path: PathBuf,
    /// Figures found (0 when extraction failed)
    pub figures: usize,
    /// Failed stages with their error message
    pub failures: Vec<(FailureKind, String)>,
}

impl DocumentOutcome {
    fn new(name: String, path: &Path) -> Self {
        Self {
            name,
            path: path.to_path_buf(),
            figures: 0,
            failures: Vec::new(),
        }
    }

    /// Extraction and export both went through. Draw failures don't count.
    pub fn is_success(&self) -> bool {
        !self.failed(FailureKind::Extraction) && !self.failed(FailureKind::Export)
    }

    pub fn failed(&self, kind: FailureKind) -> bool {
        self.failures.iter().any(|(k, _)| *k == kind)
    }
}

/// Process one document.
///
/// Errors of every stage are caught here and reported in the outcome. A
/// later stage failing never discards what an earlier one produced.
pub fn process_pdf(extractor: &FigureExtractor, pdf: &Path, options: &BatchOptions) -> DocumentOutcome {
    let name = document_name(pdf).unwrap_or_else(|_| pdf.display().to_string());
    let mut outcome = DocumentOutcome::new(name, pdf);

    let doc = match extractor.extract(pdf) {
        Ok(doc) => doc,
        Err(e) => {
            log::error!("{},{}: {}", outcome.name, FailureKind::Extraction, e);
            outcome.failures.push((FailureKind::Extraction, e.to_string()));
            return outcome;
        }
    };
    outcome.figures = doc.figure_count();

    let out_dir = options.output_dir(&doc.name);
    let mut export = options.export.clone();
    if export.prefix.is_none() {
        export.prefix = Some(doc.name.clone());
    }

    let exported = export_metadata(&doc, &out_dir, &export)
        .and_then(|_| save_images(&doc, extractor.source(), &out_dir, &export));
    if let Err(e) = exported {
        log::error!("{},{}: {}", outcome.name, FailureKind::Export, e);
        outcome.failures.push((FailureKind::Export, e.to_string()));
        return outcome;
    }

    if options.draw {
        if let Err(e) = debug::draw_document(&doc, &out_dir, &export) {
            log::warn!("{},{}: {}", outcome.name, FailureKind::Draw, e);
            outcome.failures.push((FailureKind::Draw, e.to_string()));
        }
    }

    outcome
}

/// Append-only ledger files, one document name per line.
#[derive(Debug, Clone)]
pub struct FailureLedger {
    dir: PathBuf,
}

impl FailureLedger {
    /// Open the ledger in `dir`, creating the folder if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write every ledger line of `outcome`.
    pub fn record(&self, outcome: &DocumentOutcome) -> Result<()> {
        for (kind, _) in &outcome.failures {
            self.append(kind.ledger_file(), &outcome.name)?;
        }
        if outcome.is_success() {
            self.append(SUCCESS_LOG, &outcome.name)?;
        }
        Ok(())
    }

    /// Names listed in the ledger of `kind`.
    pub fn failed(&self, kind: FailureKind) -> Result<HashSet<String>> {
        self.read(kind.ledger_file())
    }

    /// Names listed in the success ledger.
    pub fn succeeded(&self) -> Result<HashSet<String>> {
        self.read(SUCCESS_LOG)
    }

    fn append(&self, file: &str, name: &str) -> Result<()> {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(file))?;
        writeln!(f, "{}", name)?;
        Ok(())
    }

    fn read(&self, file: &str) -> Result<HashSet<String>> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Ok(HashSet::new());
        }
        Ok(fs::read_to_string(path)?
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// Summary of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Documents handed to the run
    pub total: usize,
    /// Documents skipped because an earlier run failed to extract them
    pub skipped: usize,
    pub succeeded: usize,
    pub failed_extraction: usize,
    pub failed_export: usize,
    pub failed_draw: usize,
    pub figures: usize,
}

impl BatchReport {
    fn start(total: usize) -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            total,
            skipped: 0,
            succeeded: 0,
            failed_extraction: 0,
            failed_export: 0,
            failed_draw: 0,
            figures: 0,
        }
    }

    fn add(&mut self, outcome: &DocumentOutcome) {
        if outcome.is_success() {
            self.succeeded += 1;
        }
        for (kind, _) in &outcome.failures {
            match kind {
                FailureKind::Extraction => self.failed_extraction += 1,
                FailureKind::Export => self.failed_export += 1,
                FailureKind::Draw => self.failed_draw += 1,
            }
        }
        self.figures += outcome.figures;
    }

    /// Wall-clock duration of the run.
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Runs [`process_pdf`] over many documents in bounded chunks.
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    extractor: FigureExtractor,
    options: BatchOptions,
}

impl BatchProcessor {
    pub fn new(extractor: FigureExtractor, options: BatchOptions) -> Self {
        Self { extractor, options }
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Process `pdfs` and return the run summary.
    pub fn run(&self, pdfs: &[PathBuf]) -> Result<BatchReport> {
        self.run_with_progress(pdfs, |_| {})
    }

    /// Process `pdfs`, calling `on_done` once per finished document.
    ///
    /// Workers send their outcomes to a single writer that owns the ledger.
    pub fn run_with_progress<F>(&self, pdfs: &[PathBuf], mut on_done: F) -> Result<BatchReport>
    where
        F: FnMut(&DocumentOutcome) + Send,
    {
        let ledger = FailureLedger::open(&self.options.logs_dir)?;
        let mut report = BatchReport::start(pdfs.len());

        let pending: Vec<&PathBuf> = if self.options.reprocess_errors {
            pdfs.iter().collect()
        } else {
            let failed = ledger.failed(FailureKind::Extraction)?;
            pdfs.iter()
                .filter(|p| {
                    document_name(p).map_or(true, |name| !failed.contains(&name))
                })
                .collect()
        };
        report.skipped = pdfs.len() - pending.len();
        if report.skipped > 0 {
            log::info!("skipping {} document(s) that failed before", report.skipped);
        }

        let threads = self.options.thread_count();
        let (tx, rx) = crossbeam_channel::unbounded::<DocumentOutcome>();

        let processed = std::thread::scope(|scope| {
            let writer = scope.spawn(|| {
                let mut totals = BatchReport::start(0);
                for outcome in rx {
                    if let Err(e) = ledger.record(&outcome) {
                        log::error!("{}: cannot write ledger: {}", outcome.name, e);
                    }
                    totals.add(&outcome);
                    on_done(&outcome);
                }
                totals
            });

            let mut result = Ok(());
            for (idx, chunk) in pending.chunks(self.options.chunk_size.max(1)).enumerate() {
                log::debug!("chunk {}: {} document(s) on {} thread(s)", idx + 1, chunk.len(), threads);
                let pool = match ThreadPoolBuilder::new().num_threads(threads).build() {
                    Ok(pool) => pool,
                    Err(e) => {
                        result = Err(Error::Other(format!("cannot build thread pool: {}", e)));
                        break;
                    }
                };
                pool.install(|| {
                    chunk.par_iter().for_each_with(tx.clone(), |tx, pdf| {
                        let outcome = process_pdf(&self.extractor, pdf, &self.options);
                        let _ = tx.send(outcome);
                    });
                });
            }
            drop(tx);

            let totals = writer
                .join()
                .map_err(|_| Error::Other("ledger writer panicked".to_string()));
            result.and(totals)
        })?;

        report.succeeded = processed.succeeded;
        report.failed_extraction = processed.failed_extraction;
        report.failed_export = processed.failed_export;
        report.failed_draw = processed.failed_draw;
        report.figures = processed.figures;
        report.finished_at = Utc::now();

        log::info!(
            "batch finished: {} succeeded, {} extraction / {} export / {} draw failure(s), {} figure(s)",
            report.succeeded,
            report.failed_extraction,
            report.failed_export,
            report.failed_draw,
            report.figures
        );
        Ok(report)
    }
}

/// PDF files directly inside `dir`, sorted by name.
pub fn collect_pdfs(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut pdfs: Vec<PathBuf> = fs::read_dir(dir.as_ref())?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    pdfs.sort();
    Ok(pdfs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, failures: &[FailureKind]) -> DocumentOutcome {
        let mut outcome = DocumentOutcome::new(name.to_string(), Path::new("x.pdf"));
        outcome.failures = failures.iter().map(|k| (*k, "boom".to_string())).collect();
        outcome
    }

    #[test]
    fn test_draw_failure_still_succeeds() {
        assert!(outcome("a", &[]).is_success());
        assert!(outcome("a", &[FailureKind::Draw]).is_success());
        assert!(!outcome("a", &[FailureKind::Export]).is_success());
        assert!(!outcome("a", &[FailureKind::Extraction]).is_success());
    }

    #[test]
    fn test_ledger_files() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = FailureLedger::open(tmp.path().join("logs")).unwrap();

        ledger.record(&outcome("good", &[])).unwrap();
        ledger.record(&outcome("drawn", &[FailureKind::Draw])).unwrap();
        ledger.record(&outcome("broken", &[FailureKind::Extraction])).unwrap();

        let succeeded = ledger.succeeded().unwrap();
        assert!(succeeded.contains("good") && succeeded.contains("drawn"));
        assert_eq!(succeeded.len(), 2);
        assert!(ledger.failed(FailureKind::Extraction).unwrap().contains("broken"));
        assert!(ledger.failed(FailureKind::Draw).unwrap().contains("drawn"));
        assert!(ledger.failed(FailureKind::Export).unwrap().is_empty());
        assert!(tmp.path().join("logs").join("failed_extract.log").exists());
    }

    #[test]
    fn test_output_dir() {
        let options = BatchOptions::new("/data");
        assert_eq!(options.output_dir("paper"), PathBuf::from("/data/paper"));
        let options = options.with_per_document_dir(false);
        assert_eq!(options.output_dir("paper"), PathBuf::from("/data"));
    }

    #[test]
    fn test_collect_pdfs() {
        let tmp = tempfile::tempdir().unwrap();
        for file in ["b.pdf", "a.PDF", "notes.txt"] {
            fs::write(tmp.path().join(file), b"").unwrap();
        }
        fs::create_dir(tmp.path().join("dir.pdf")).unwrap();

        let pdfs = collect_pdfs(tmp.path()).unwrap();
        assert_eq!(pdfs, vec![tmp.path().join("a.PDF"), tmp.path().join("b.pdf")]);
    }
}
