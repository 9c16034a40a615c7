//! figcap CLI - figure and caption extraction tool

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use figcap::batch::{collect_pdfs, BatchOptions, BatchProcessor};
use figcap::render::{self, debug};
use figcap::{
    ExportOptions, ExtractOptions, FigureExtractor, JsonFormat, PageSelection, SidecarMeasurer,
    XpdfSource,
};

#[derive(Parser)]
#[command(name = "figcap")]
#[command(author = "figcap contributors")]
#[command(version)]
#[command(about = "Extract figures and their captions from academic PDFs", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract figures from one PDF (metadata JSON and cropped images)
    Extract {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Page range (e.g., "2-10", "2,4,6")
        #[arg(long)]
        pages: Option<String>,

        /// Skip cropping figure images
        #[arg(long)]
        no_images: bool,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Extract figures from every PDF in a folder
    Batch {
        /// Folder with PDF files
        #[arg(value_name = "INPUT_DIR")]
        input: PathBuf,

        /// Output directory
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Ledger directory (defaults to the output directory)
        #[arg(long, value_name = "DIR", env = "FIGCAP_LOGS")]
        logs: Option<PathBuf>,

        /// Worker threads (0 = all cores)
        #[arg(long, default_value = "0", env = "FIGCAP_THREADS")]
        threads: usize,

        /// Documents per thread pool
        #[arg(long, default_value = "32", env = "FIGCAP_CHUNK_SIZE")]
        chunk_size: usize,

        /// Write every document straight into OUTPUT
        #[arg(long)]
        no_individual_folders: bool,

        /// Retry documents listed in failed_extract.log
        #[arg(long)]
        reprocess_errors: bool,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Show layout and figures of a PDF without writing outputs
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Folder for conversion artifacts
        #[arg(long, value_name = "DIR", default_value = "artifacts", env = "FIGCAP_ARTIFACTS")]
        artifacts: PathBuf,

        /// Include page 1 in the traversal
        #[arg(long)]
        include_first_page: bool,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct CommonArgs {
    /// Folder for conversion artifacts (reused when present)
    #[arg(long, value_name = "DIR", default_value = "artifacts", env = "FIGCAP_ARTIFACTS")]
    artifacts: PathBuf,

    /// Include page 1 in the traversal
    #[arg(long)]
    include_first_page: bool,

    /// Orphan regions smaller than this area are ignored
    #[arg(long, default_value = "1000")]
    min_orphan_size: i64,

    /// Raster resolution for cropped figures
    #[arg(long, default_value = "300", env = "FIGCAP_DPI")]
    dpi: u32,

    /// Crop expansion in percent of the figure size
    #[arg(long, default_value = "3.5")]
    padding: f32,

    /// Output compact JSON
    #[arg(long)]
    compact: bool,

    /// Draw debug overlays
    #[arg(long)]
    draw: bool,
}

impl CommonArgs {
    fn extract_options(&self) -> ExtractOptions {
        ExtractOptions::new()
            .with_first_page(self.include_first_page)
            .with_min_orphan_size(self.min_orphan_size)
    }

    fn export_options(&self) -> ExportOptions {
        let format = if self.compact {
            JsonFormat::Compact
        } else {
            JsonFormat::Pretty
        };
        ExportOptions::new()
            .with_dpi(self.dpi)
            .with_crop_percentage(self.padding)
            .with_json_format(format)
    }

    fn extractor(&self, options: ExtractOptions) -> FigureExtractor {
        FigureExtractor::new(
            Arc::new(XpdfSource::new(&self.artifacts)),
            Arc::new(SidecarMeasurer::new()),
        )
        .with_options(options)
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Extract {
            input,
            output,
            pages,
            no_images,
            common,
        }) => cmd_extract(&input, output.as_deref(), pages.as_deref(), no_images, &common),
        Some(Commands::Batch {
            input,
            output,
            logs,
            threads,
            chunk_size,
            no_individual_folders,
            reprocess_errors,
            common,
        }) => {
            let options = BatchOptions::new(&output)
                .with_logs_dir(logs.unwrap_or_else(|| output.clone()))
                .with_threads(threads)
                .with_chunk_size(chunk_size)
                .with_per_document_dir(!no_individual_folders)
                .with_reprocess_errors(reprocess_errors)
                .with_draw(common.draw)
                .with_export(common.export_options());
            cmd_batch(&input, options, &common)
        }
        Some(Commands::Info {
            input,
            artifacts,
            include_first_page,
        }) => cmd_info(&input, &artifacts, include_first_page),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: extract if input is provided
            if let Some(input) = cli.input {
                let common = CommonArgs {
                    artifacts: PathBuf::from("artifacts"),
                    include_first_page: false,
                    min_orphan_size: 1000,
                    dpi: 300,
                    padding: 3.5,
                    compact: false,
                    draw: false,
                };
                cmd_extract(&input, cli.output.as_deref(), None, false, &common)
            } else {
                println!("{}", "Usage: figcap <FILE> [OUTPUT]".yellow());
                println!("       figcap --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_extract(
    input: &Path,
    output: Option<&Path>,
    pages: Option<&str>,
    no_images: bool,
    common: &CommonArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_figures", stem))
    });

    let mut options = common.extract_options();
    if let Some(p) = pages {
        options = options.with_pages(PageSelection::parse(p)?);
    }
    let extractor = common.extractor(options);

    let pb = ProgressBar::new(4);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    pb.set_message("Extracting figures...");
    let doc = extractor.extract(input)?;
    pb.inc(1);

    let export = common.export_options().with_prefix(doc.name.clone());

    pb.set_message("Writing metadata...");
    let metadata_path = render::export_metadata(&doc, &output_dir, &export)?;
    pb.inc(1);

    let mut images = Vec::new();
    if !no_images {
        pb.set_message("Cropping figures...");
        images = render::save_images(&doc, extractor.source(), &output_dir, &export)?;
    }
    pb.inc(1);

    let mut overlays = Vec::new();
    if common.draw {
        pb.set_message("Drawing overlays...");
        overlays = debug::draw_document(&doc, &output_dir, &export)?;
    }
    pb.inc(1);

    pb.finish_with_message("Done!");

    println!(
        "\n{} {} figure(s) on {} page(s)",
        "Found".green().bold(),
        doc.figure_count(),
        doc.page_count()
    );
    println!("{}", "Output files:".green().bold());
    println!("  {} {}", "├─".dimmed(), metadata_path.display());
    println!("  {} {} image(s)", "├─".dimmed(), images.len());
    println!("  {} {} overlay(s)", "└─".dimmed(), overlays.len());

    Ok(())
}

fn cmd_batch(
    input: &Path,
    options: BatchOptions,
    common: &CommonArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let pdfs = collect_pdfs(input)?;
    if pdfs.is_empty() {
        println!("{} {}", "No PDF files in".yellow(), input.display());
        return Ok(());
    }

    log::info!("Processing {} PDF file(s) from {}", pdfs.len(), input.display());
    let processor = BatchProcessor::new(common.extractor(common.extract_options()), options);

    let pb = ProgressBar::new(pdfs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let progress = pb.clone();
    let report = processor.run_with_progress(&pdfs, move |outcome| {
        progress.set_message(outcome.name.clone());
        progress.inc(1);
    })?;
    pb.finish_with_message("Done!");

    println!();
    println!("{}", "Batch Summary".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Documents".bold(), report.total);
    if report.skipped > 0 {
        println!("{}: {}", "Skipped".bold(), report.skipped);
    }
    println!("{}: {}", "Succeeded".bold(), report.succeeded.to_string().green());
    println!("{}: {}", "Extraction failures".bold(), fmt_failures(report.failed_extraction));
    println!("{}: {}", "Export failures".bold(), fmt_failures(report.failed_export));
    println!("{}: {}", "Draw failures".bold(), fmt_failures(report.failed_draw));
    println!("{}: {}", "Figures".bold(), report.figures);
    println!(
        "{}: {:.1}s",
        "Elapsed".bold(),
        report.duration().num_milliseconds() as f64 / 1000.0
    );
    println!("{}: {}", "Ledgers".bold(), processor.options().logs_dir.display());

    Ok(())
}

fn fmt_failures(count: usize) -> colored::ColoredString {
    if count == 0 {
        "0".normal()
    } else {
        count.to_string().red()
    }
}

fn cmd_info(input: &Path, artifacts: &Path, include_first_page: bool) -> Result<(), Box<dyn std::error::Error>> {
    let format = figcap::detect_format_from_path(input)?;
    let options = ExtractOptions::new().with_first_page(include_first_page);
    let doc = figcap::extract_figures_with_options(input, artifacts, options)?;
    let layout = &doc.layout;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), format);
    println!("{}: {}", "Pages".bold(), doc.page_count());
    println!("{}: {}", "Artifacts".bold(), doc.artifacts_path.display());

    println!();
    println!("{}", "Layout".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}x{}", "Page size".bold(), layout.width, layout.height);
    println!("{}: {}", "Columns".bold(), layout.num_columns);
    println!("{}: {:?}", "Column boundaries".bold(), layout.column_coordinates);
    println!("{}: {:?}", "Content region".bold(), layout.content_region.to_array());
    println!("{}: {}x{}", "Text row".bold(), layout.row_width, layout.row_height);

    println!();
    println!("{}", "Figures".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    for page in doc.pages.iter().filter(|p| !p.figures.is_empty()) {
        for figure in &page.figures {
            let name = if figure.identifier.is_empty() {
                "(no caption)".dimmed().to_string()
            } else {
                figure.identifier.clone()
            };
            println!(
                "  pg.{:<4} {:<12} {:<10} {:?}{}",
                page.number,
                name,
                figure.sweep_type.as_str(),
                figure.bbox.to_array(),
                if figure.multicolumn { " multicolumn" } else { "" }
            );
        }
    }
    println!("{}: {}", "Total".bold(), doc.figure_count());
    println!("{}: {}", "Captions left on pages".bold(), doc.caption_count());

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "figcap".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Figure and caption extraction tool");
    println!();
    println!("Library: figcap {}", figcap::version());
    println!("License: MIT");
}
