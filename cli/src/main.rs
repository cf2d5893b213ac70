//! scoremeta CLI - sheet-music metadata extraction tool

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use scoremeta::generative::prompt::{median_height, region_line};
use scoremeta::{
    CancellationToken, ExtractOptions, ExtractedMetadata, MetadataExtractor, PdfDocument,
    RecognitionOptions, TesseractRecognizer,
};

#[derive(Parser)]
#[command(name = "scoremeta")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Extract title, composer, instruments, key and time signature from PDF scores", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Propose metadata for one or more PDF scores
    Extract {
        /// Input PDF files
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        /// Output JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Output compact JSON
        #[arg(long, requires = "json")]
        compact: bool,

        /// Write output to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Show document attributes and page geometry
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show the text regions the heuristics would see
    Regions {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Show version information
    Version,
}

/// Engine configuration shared by commands that run the pipeline.
#[derive(Args, Debug, Clone)]
struct EngineArgs {
    /// Tesseract executable used for OCR
    #[arg(long, env = "SCOREMETA_TESSERACT", default_value = "tesseract")]
    tesseract: PathBuf,

    /// OCR languages joined with '+'
    #[arg(long, default_value = "kor+eng")]
    lang: String,

    /// Faster, less accurate OCR
    #[arg(long)]
    fast: bool,

    /// Read the embedded text layer when OCR finds nothing
    #[arg(long)]
    text_layer: bool,

    /// Ollama server for generative refinement (disabled if unset)
    #[arg(long, env = "SCOREMETA_OLLAMA_URL")]
    ollama_url: Option<String>,

    /// Model name for generative refinement
    #[arg(long, env = "SCOREMETA_MODEL", default_value = "llama3.2")]
    model: String,

    /// Seconds to wait for the generative model
    #[arg(long, default_value = "20")]
    timeout: u64,

    /// Directory containing the PDFium library
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Extract {
            inputs,
            json,
            compact,
            output,
            engine,
        }) => cmd_extract(&inputs, json, compact, output.as_deref(), &engine),
        Some(Commands::Info { input }) => cmd_info(&input),
        Some(Commands::Regions {
            input,
            json,
            engine,
        }) => cmd_regions(&input, json, &engine),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            println!("{}", "Usage: scoremeta extract <FILE>...".yellow());
            println!("       scoremeta --help for more information");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn recognition_options(engine: &EngineArgs) -> RecognitionOptions {
    RecognitionOptions::new()
        .with_languages(engine.lang.split('+').map(str::trim).filter(|l| !l.is_empty()))
        .with_accurate(!engine.fast)
}

fn build_extractor(engine: &EngineArgs) -> MetadataExtractor {
    let options = ExtractOptions::new()
        .with_recognition(recognition_options(engine))
        .with_generative_timeout(Duration::from_secs(engine.timeout))
        .with_text_layer_fallback(engine.text_layer);
    let mut extractor = MetadataExtractor::with_options(options);

    #[cfg(feature = "pdfium")]
    {
        let mut renderer = scoremeta::PdfiumRenderer::new();
        if let Some(dir) = &engine.pdfium_lib {
            renderer = renderer.with_library_dir(dir);
        }
        if renderer.is_available() {
            extractor = extractor.with_renderer(Arc::new(renderer));
        } else {
            log::warn!("PDFium library not found; page rendering disabled");
        }
    }
    #[cfg(not(feature = "pdfium"))]
    {
        if engine.pdfium_lib.is_some() {
            log::warn!("built without the pdfium feature; --pdfium-lib ignored");
        }
    }

    let tesseract = TesseractRecognizer::new().with_command(&engine.tesseract);
    if tesseract.is_available() {
        extractor = extractor.with_recognizer(Arc::new(tesseract));
    } else {
        log::warn!("{} not runnable; OCR disabled", engine.tesseract.display());
    }

    if let Some(url) = &engine.ollama_url {
        #[cfg(feature = "ollama")]
        {
            match scoremeta::OllamaModel::new(url.as_str(), engine.model.as_str()) {
                Ok(model) => extractor = extractor.with_generative_model(Arc::new(model)),
                Err(e) => log::warn!("ollama client not created: {}", e),
            }
        }
        #[cfg(not(feature = "ollama"))]
        {
            log::warn!(
                "built without the ollama feature; {} ({}) ignored",
                url,
                engine.model
            );
        }
    }

    extractor
}

/// Read every input, skipping (and reporting) unreadable files.
fn read_inputs(inputs: &[PathBuf]) -> Vec<(PathBuf, Vec<u8>)> {
    let mut documents = Vec::with_capacity(inputs.len());
    for path in inputs {
        match fs::read(path) {
            Ok(data) => documents.push((path.clone(), data)),
            Err(e) => eprintln!("{} {}: {}", "Skipped".yellow(), path.display(), e),
        }
    }
    documents
}

fn cmd_extract(
    inputs: &[PathBuf],
    json: bool,
    compact: bool,
    output: Option<&Path>,
    engine: &EngineArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let documents = read_inputs(inputs);
    if documents.is_empty() {
        return Err("no readable input files".into());
    }

    let extractor = build_extractor(engine);
    let data: Vec<&[u8]> = documents.iter().map(|(_, d)| d.as_slice()).collect();

    let pb = ProgressBar::new(data.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    pb.set_message("Extracting...");
    let results = extractor.extract_batch_with_progress(&data, |done, _| pb.set_position(done as u64));
    pb.finish_and_clear();

    let rendered = if json {
        render_json(&documents, &results, compact)?
    } else {
        render_summary(&documents, &results)
    };

    if let Some(path) = output {
        fs::write(path, &rendered)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", rendered);
    }

    Ok(())
}

fn render_json(
    documents: &[(PathBuf, Vec<u8>)],
    results: &[ExtractedMetadata],
    compact: bool,
) -> Result<String, serde_json::Error> {
    let entries: Vec<serde_json::Value> = documents
        .iter()
        .zip(results)
        .map(|((path, _), metadata)| {
            serde_json::json!({
                "file": path.display().to_string(),
                "metadata": metadata,
            })
        })
        .collect();

    if compact {
        serde_json::to_string(&entries)
    } else {
        serde_json::to_string_pretty(&entries)
    }
}

fn render_summary(documents: &[(PathBuf, Vec<u8>)], results: &[ExtractedMetadata]) -> String {
    let mut out = String::new();
    for ((path, _), metadata) in documents.iter().zip(results) {
        out.push_str(&format!("{}\n", path.display().to_string().cyan().bold()));
        let fields = [
            ("Title", metadata.title.clone()),
            ("Composer", metadata.composer.clone()),
            ("Instruments", metadata.instrument_label()),
            ("Key", metadata.key.clone()),
            ("Time", metadata.time_signature.clone()),
        ];
        for (label, value) in fields {
            let value = match value {
                Some(v) => v,
                None => "-".dimmed().to_string(),
            };
            out.push_str(&format!("  {}: {}\n", label.bold(), value));
        }
    }
    out.trim_end().to_string()
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    let doc = PdfDocument::from_bytes(&data)?;
    let attributes = doc.attributes();

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), doc.format());
    println!("{}: {}", "Pages".bold(), doc.page_count());
    println!(
        "{}: {}",
        "Encrypted".bold(),
        if doc.is_encrypted() { "Yes" } else { "No" }
    );

    if let Some(title) = attributes.title() {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(author) = attributes.author() {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(subject) = attributes.subject() {
        println!("{}: {}", "Subject".bold(), subject);
    }
    if let Some(creator) = attributes.creator() {
        println!("{}: {}", "Creator".bold(), creator);
    }

    if let Ok(page) = doc.first_page() {
        let geometry = doc.page_geometry(page);
        println!();
        println!("{}", "First Page".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        println!(
            "{}: {:.0} × {:.0} pt",
            "Size".bold(),
            geometry.width,
            geometry.height
        );
        println!("{}: {}×", "Render scale".bold(), geometry.render_scale());
        if let Some((w, h)) = geometry.pixel_size() {
            println!("{}: {} × {} px", "Bitmap".bold(), w, h);
        }
    }

    Ok(())
}

fn cmd_regions(input: &Path, json: bool, engine: &EngineArgs) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    let extractor = build_extractor(engine);
    let evidence = extractor.gather(&data, &CancellationToken::never());

    if json {
        let value = serde_json::json!({
            "source": evidence.source,
            "regions": evidence.regions,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!(
        "{} {} regions ({:?})",
        "Found".green(),
        evidence.regions.len(),
        evidence.source
    );
    let median = median_height(&evidence.regions);
    for region in &evidence.regions {
        println!(
            "{} {}",
            format!("{:.2}", region.confidence).dimmed(),
            region_line(region, median)
        );
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "scoremeta".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Sheet-music metadata extraction tool");
    println!();
    println!(
        "Features: pdfium={}, ollama={}",
        cfg!(feature = "pdfium"),
        cfg!(feature = "ollama")
    );
    println!("License: MIT");
}
