//! CLI tool for checking presentations against the house slide style.

use anyhow::{Context, Result};
use clap::Parser;
use deckcheck_core::{AnalysisSettings, ConformanceReport, DeckStats, SlideFinding};
use deckcheck_engine::{Analysis, Analyzer};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Check PowerPoint decks for background, font, text, image and animation
/// rules and score how ready they are for the design team.
#[derive(Parser, Debug)]
#[command(name = "deckcheck")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PowerPoint file(s) (.pptx)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Slides to analyze: "all", "4", "2-5" or "1,3,5-7"
    #[arg(short, long, default_value = "all")]
    slides: String,

    /// Skip OCR and judge text on images by layout only
    #[arg(long)]
    no_ocr: bool,

    /// Tesseract language(s), e.g. "rus+eng" (default: negotiated)
    #[arg(long)]
    lang: Option<String>,

    /// Path to the tesseract binary (default: looked up on PATH)
    #[arg(long)]
    tesseract: Option<PathBuf>,

    /// JSON file with analysis settings
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Per-slide character limit
    #[arg(long)]
    max_chars: Option<usize>,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Write a JSON report per input into this directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let settings = load_settings(&args)?;
    let analyzer = build_analyzer(&args, settings);

    for input_path in &args.input {
        if args.verbose {
            eprintln!("Processing: {}", input_path.display());
        }

        let analysis = analyzer.analyze_path(input_path, Some(args.slides.as_str()), !args.no_ocr);
        if analysis.is_empty() {
            eprintln!("Error processing {}: the deck could not be analyzed", input_path.display());
            continue;
        }
        let report = analysis.score();

        if args.json {
            println!("{}", to_json(input_path, &analysis, report.as_ref())?);
        } else {
            print!("{}", render_text(input_path, &analysis, report.as_ref()));
        }

        if let Some(dir) = &args.output {
            let output_path = get_output_path(input_path, dir)?;
            write_output(&output_path, &to_json(input_path, &analysis, report.as_ref())?)?;
            if args.verbose {
                eprintln!("Written to: {}", output_path.display());
            }
        }
    }

    Ok(())
}

/// Defaults, overlaid by the settings file, overlaid by flags.
fn load_settings(args: &Args) -> Result<AnalysisSettings> {
    let mut settings = match &args.settings {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid settings in {}", path.display()))?
        }
        None => AnalysisSettings::default(),
    };

    if let Some(max) = args.max_chars {
        settings = settings.with_max_text_chars(max);
    }

    Ok(settings)
}

fn build_analyzer(args: &Args, settings: AnalysisSettings) -> Analyzer {
    if args.no_ocr {
        return Analyzer::new(settings);
    }

    let ensemble = deckcheck_ocr::detect_ensemble(
        args.tesseract.as_deref(),
        args.lang.as_deref(),
        settings.ocr_min_confidence,
    );
    let analyzer = Analyzer::new(settings);

    match ensemble {
        Some(ensemble) => analyzer.with_extractor(Box::new(ensemble)),
        None => {
            log::warn!("Tesseract not found; text on images is judged by layout only");
            analyzer
        }
    }
}

fn to_json(
    input_path: &Path,
    analysis: &Analysis,
    report: Option<&ConformanceReport>,
) -> Result<String> {
    let value = serde_json::json!({
        "file": input_path.display().to_string(),
        "findings": analysis.findings,
        "stats": analysis.stats,
        "score": report,
    });
    serde_json::to_string_pretty(&value).context("Failed to serialize report")
}

fn mark(ok: bool) -> &'static str {
    if ok {
        "✓"
    } else {
        "✗"
    }
}

/// Human-readable report: slide table, deck statistics and the score.
fn render_text(
    input_path: &Path,
    analysis: &Analysis,
    report: Option<&ConformanceReport>,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", input_path.display()));
    out.push_str(&format!(
        "{:>5}  {:^4}  {:^5}  {:^4}  {:^5}  {:^5}  {:^9}  {:>6}  {:<12}  {}\n",
        "Slide", "Bg", "Fonts", "Text", "Anim", "Trans", "Img text", "Images", "Chars", "Status"
    ));
    for f in &analysis.findings {
        out.push_str(&render_row(f));
    }

    if let Some(stats) = &analysis.stats {
        out.push('\n');
        out.push_str(&render_stats(stats));
    }

    for f in &analysis.findings {
        if let Some(ocr) = &f.ocr {
            out.push_str(&format!(
                "\nSlide {} image text ({}, {:.0}% confidence, {} image(s)):\n{}\n",
                f.slide, ocr.method, ocr.confidence, ocr.images_with_text, ocr.text
            ));
        }
    }

    out.push('\n');
    match report {
        Some(r) => out.push_str(&render_score(r)),
        None => out.push_str("Score unavailable\n"),
    }
    out.push('\n');
    out
}

fn render_row(f: &SlideFinding) -> String {
    format!(
        "{:>5}  {:^4}  {:^5}  {:^4}  {:^5}  {:^5}  {:^9}  {:>6}  {:<12}  {}\n",
        f.slide,
        mark(f.background_ok),
        mark(f.fonts_pass()),
        mark(f.text_ok),
        mark(f.animations_ok),
        mark(f.transitions_ok),
        if f.text_on_image { "yes" } else { "no" },
        f.image_count,
        f.text_detail,
        f.status()
    )
}

fn render_stats(stats: &DeckStats) -> String {
    let ocr = match (stats.ocr_enabled, stats.ocr_available) {
        (false, _) => "off",
        (true, false) => "unavailable",
        (true, true) if stats.ocr_used => "used",
        (true, true) => "no text found",
    };
    format!(
        "Slides analyzed: {} of {} (selection: {})\n\
         Custom fonts: {}\n\
         Transitions: {}\n\
         Images: {}, with text: {} slide(s)\n\
         OCR: {} ({} characters)\n",
        stats.analyzed_slides,
        stats.total_slides,
        stats.effective_range,
        stats.font_count,
        if stats.has_transitions { "yes" } else { "no" },
        stats.total_images,
        stats.text_on_image_slides,
        ocr,
        stats.total_ocr_characters
    )
}

fn render_score(report: &ConformanceReport) -> String {
    let mut out = format!(
        "{} Conformance: {:.1}% ({}), {:.1}/{:.0} points, {} of {} slides fully compliant\n{}\n",
        report.tier.emblem(),
        report.percentage,
        report.tier.label(),
        report.achieved_score,
        report.total_possible,
        report.compliant_slides,
        report.total_slides,
        report.summary
    );
    for rec in &report.recommendations {
        out.push_str(&format!("  - {}\n", rec));
    }
    out
}

/// Determine the JSON report path for a processed file.
fn get_output_path(input_path: &Path, output_dir: &Path) -> Result<PathBuf> {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    std::fs::create_dir_all(output_dir).with_context(|| {
        format!("Failed to create output directory: {}", output_dir.display())
    })?;

    Ok(output_dir.join(format!("{}.deckcheck.json", stem)))
}

/// Write output to a file.
fn write_output(path: &Path, content: &str) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}
