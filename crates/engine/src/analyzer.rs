//! The analysis pipeline: open the deck, select slides, run every inspector
//! per slide, settle fonts deck-wide and assemble the statistics.

use deckcheck_core::inspect::{
    deck_has_transitions, has_animations, inspect_background, inspect_text_volume,
};
use deckcheck_core::text_on_image::detect;
use deckcheck_core::{
    classify, score, AnalysisSettings, ConformanceReport, Deck, DeckStats, Error, FontInventory,
    ImageTextExtractor, OcrPolicy, Result, Slide, SlideFinding, SlideSelection, Violation,
};
use deckcheck_pptx::PptxParser;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Local file header signature of a ZIP container.
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Findings and statistics of one run.
///
/// An empty analysis (no findings, no stats) means the deck could not be
/// analyzed at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Analysis {
    pub findings: Vec<SlideFinding>,
    pub stats: Option<DeckStats>,
}

impl Analysis {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Conformance score, or `None` when unavailable.
    pub fn score(&self) -> Option<ConformanceReport> {
        let stats = self.stats.as_ref()?;
        score(&self.findings, stats)
    }
}

/// Runs analyses with fixed settings and an optional OCR engine.
///
/// Holds no per-run state, so one analyzer can serve any number of runs.
pub struct Analyzer {
    settings: AnalysisSettings,
    extractor: Option<Box<dyn ImageTextExtractor>>,
}

impl Analyzer {
    pub fn new(settings: AnalysisSettings) -> Self {
        Self {
            settings,
            extractor: None,
        }
    }

    /// Use an OCR engine for text-on-image confirmation.
    pub fn with_extractor(mut self, extractor: Box<dyn ImageTextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub fn ocr_available(&self) -> bool {
        self.extractor.is_some()
    }

    /// Analyze a presentation file. Never fails; see [`Analysis`].
    pub fn analyze_path(
        &self,
        path: impl AsRef<Path>,
        range: Option<&str>,
        ocr_enabled: bool,
    ) -> Analysis {
        let path = path.as_ref();
        match self.open_path(path) {
            Ok(deck) => self.analyze_deck(&deck, range, ocr_enabled),
            Err(e) => {
                log::error!("Could not analyze {}: {}", path.display(), e);
                Analysis::empty()
            }
        }
    }

    /// Analyze a presentation from any seekable byte source.
    pub fn analyze_reader<R: Read + Seek>(
        &self,
        reader: R,
        filename: &str,
        range: Option<&str>,
        ocr_enabled: bool,
    ) -> Analysis {
        match open_deck(reader, filename) {
            Ok(deck) => self.analyze_deck(&deck, range, ocr_enabled),
            Err(e) => {
                log::error!("Could not analyze {}: {}", filename, e);
                Analysis::empty()
            }
        }
    }

    /// Analyze an already parsed deck.
    pub fn analyze_deck(&self, deck: &Deck, range: Option<&str>, ocr_enabled: bool) -> Analysis {
        let total = deck.slide_count();
        if total == 0 {
            log::warn!("{} has no slides", deck.filename);
            return Analysis::empty();
        }

        let selection = SlideSelection::parse(range, total);
        let policy = match (ocr_enabled, self.extractor.as_deref()) {
            (false, _) => OcrPolicy::Disabled,
            (true, None) => OcrPolicy::Unavailable,
            (true, Some(extractor)) => OcrPolicy::Enabled(extractor),
        };

        let mut run = RunContext::new(&self.settings, policy);
        for &index in &selection.indices {
            let slide = &deck.slides[index - 1];
            run.analyze_slide(deck, slide);
        }

        let stats = DeckStats {
            has_transitions: deck_has_transitions(deck),
            ocr_enabled,
            ocr_available: self.ocr_available(),
            requested_range: range.unwrap_or(deckcheck_core::range::ALL).to_string(),
            effective_range: selection.effective_range(range),
            total_slides: total,
            ..Default::default()
        };
        let analysis = run.finish(stats);

        log::info!(
            "Analyzed {} of {} slides in {}",
            analysis.findings.len(),
            total,
            deck.filename
        );
        analysis
    }

    fn open_path(&self, path: &Path) -> Result<Deck> {
        let file = File::open(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        open_deck(BufReader::new(file), filename)
    }
}

/// Check the container signature and parse the deck.
fn open_deck<R: Read + Seek>(mut reader: R, filename: &str) -> Result<Deck> {
    let mut magic = [0u8; 4];
    reader
        .read_exact(&mut magic)
        .map_err(|_| Error::UnsupportedFormat(format!("{} is too short", filename)))?;
    if magic != ZIP_MAGIC {
        return Err(Error::UnsupportedFormat(format!(
            "{} is not a zipped presentation",
            filename
        )));
    }
    reader.seek(SeekFrom::Start(0))?;

    PptxParser::new().parse(reader, filename)
}

/// Mutable state of a single run: the rows produced so far and the fonts
/// seen on them.
struct RunContext<'a> {
    settings: &'a AnalysisSettings,
    policy: OcrPolicy<'a>,
    fonts: FontInventory,
    findings: Vec<SlideFinding>,
}

impl<'a> RunContext<'a> {
    fn new(settings: &'a AnalysisSettings, policy: OcrPolicy<'a>) -> Self {
        Self {
            settings,
            policy,
            fonts: FontInventory::new(),
            findings: Vec::new(),
        }
    }

    fn analyze_slide(&mut self, deck: &Deck, slide: &Slide) {
        let settings = self.settings;
        let shapes = classify(slide);
        let mut finding = SlideFinding::new(slide.number);
        finding.shape_count = slide.shapes.len();

        if !inspect_background(slide, deck, settings.background_area_ratio) {
            finding.record(Violation::Background);
        }

        let (overloaded, chars) = inspect_text_volume(&shapes, settings.max_text_chars);
        finding.char_count = chars;
        finding.text_detail = format!("{} chars", chars);
        if overloaded {
            finding.record(Violation::TextVolume(chars));
        }

        if has_animations(&slide.xml) {
            finding.record(Violation::Animations);
        }

        let verdict = detect(&shapes, deck, self.policy, settings);
        finding.image_count = verdict.image_count;
        finding.ocr = verdict.ocr;
        if verdict.detected {
            finding.record(Violation::TextOnImage);
        }

        self.fonts
            .add(shapes.text_shapes.iter().flat_map(|t| t.fonts.iter()));

        log::debug!("Slide {}: {}", finding.slide, finding.status());
        self.findings.push(finding);
    }

    /// Settle the font verdict and fill in the per-slide counters.
    fn finish(mut self, mut stats: DeckStats) -> Analysis {
        stats.font_count = self.fonts.finalize(&mut self.findings);

        for f in &self.findings {
            if !f.animations_ok {
                stats.slides_with_animations += 1;
            }
            if !f.background_ok {
                stats.background_issues += 1;
            }
            if f.text_on_image {
                stats.text_on_image_slides += 1;
            }
            stats.total_images += f.image_count;
            if let Some(ocr) = f.ocr.as_ref().filter(|o| !o.text.is_empty()) {
                stats.ocr_used = true;
                stats.total_ocr_characters += ocr.text.chars().count();
            }
        }
        stats.analyzed_slides = self.findings.len();

        Analysis {
            findings: self.findings,
            stats: Some(stats),
        }
    }
}
