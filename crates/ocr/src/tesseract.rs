//! Thin wrapper around the `tesseract` command-line binary.

use crate::WordRecognizer;
use deckcheck_core::{Error, Result};
use image::GrayImage;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Default install location of the Windows installer.
pub const WINDOWS_DEFAULT_PATH: &str = r"C:\Program Files\Tesseract-OCR\tesseract.exe";

/// Preferred language pack combination.
pub const PREFERRED_LANGUAGES: &str = "rus+eng";

/// Places distribution packages put language data in.
const TESSDATA_CANDIDATES: &[&str] = &[
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tesseract-ocr/tessdata",
    "/usr/share/tessdata",
];

/// A recognized token with the engine's confidence (0-100, or -1 for
/// structural rows that carry no recognition score).
#[derive(Debug, Clone, PartialEq)]
pub struct OcrWord {
    pub text: String,
    pub confidence: f64,
}

/// A located Tesseract installation with a negotiated language.
#[derive(Debug, Clone)]
pub struct Tesseract {
    binary: PathBuf,
    language: String,
    tessdata: Option<PathBuf>,
}

impl Tesseract {
    /// Locate the binary, probe its language packs and pick the language.
    ///
    /// `language` overrides negotiation. Returns `None` when no working
    /// binary is found; OCR is then reported as unavailable.
    pub fn detect(explicit: Option<&Path>, language: Option<&str>) -> Option<Self> {
        let binary = locate_binary(explicit)?;
        let tessdata = find_tessdata_dir();

        let mut engine = Self {
            binary,
            language: PREFERRED_LANGUAGES.to_string(),
            tessdata,
        };

        match engine.list_languages() {
            Ok(langs) => {
                let negotiated = negotiate_language(&langs);
                engine.language = language.map(str::to_string).unwrap_or(negotiated);
            }
            Err(e) => {
                log::warn!(
                    "Tesseract at {} is not usable: {}",
                    engine.binary.display(),
                    e
                );
                return None;
            }
        }

        log::info!(
            "Using tesseract at {} with language {}",
            engine.binary.display(),
            engine.language
        );
        Some(engine)
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Language packs installed for this binary.
    pub fn list_languages(&self) -> Result<Vec<String>> {
        let output = self
            .command()
            .arg("--list-langs")
            .output()
            .map_err(|e| Error::OcrError(format!("failed to run tesseract: {}", e)))?;

        if !output.status.success() {
            return Err(Error::OcrError(format!(
                "tesseract --list-langs exited with {}",
                output.status
            )));
        }

        Ok(parse_language_list(&String::from_utf8_lossy(&output.stdout)))
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        if std::env::var_os("TESSDATA_PREFIX").is_none() {
            if let Some(dir) = &self.tessdata {
                cmd.env("TESSDATA_PREFIX", dir);
            }
        }
        cmd
    }
}

impl WordRecognizer for Tesseract {
    fn recognize(&self, image: &GrayImage, psm: u8) -> Result<Vec<OcrWord>> {
        let input = tempfile::Builder::new()
            .prefix("deckcheck-ocr-")
            .suffix(".png")
            .tempfile()?;
        image
            .save_with_format(input.path(), image::ImageFormat::Png)
            .map_err(|e| Error::ImageError(e.to_string()))?;

        let psm = psm.to_string();
        let output = self
            .command()
            .arg(input.path())
            .arg("stdout")
            .args(["--oem", "3", "--psm", &psm, "-l", &self.language])
            .arg("tsv")
            .output()
            .map_err(|e| Error::OcrError(format!("failed to run tesseract: {}", e)))?;

        if !output.status.success() {
            return Err(Error::OcrError(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(parse_tsv(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Explicit path first, then `PATH`, then the Windows default location.
pub fn locate_binary(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        log::warn!("Tesseract not found at {}", path.display());
    }

    if let Ok(path) = which::which("tesseract") {
        return Some(path);
    }

    let windows = Path::new(WINDOWS_DEFAULT_PATH);
    if cfg!(windows) && windows.is_file() {
        return Some(windows.to_path_buf());
    }

    None
}

fn find_tessdata_dir() -> Option<PathBuf> {
    TESSDATA_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_dir())
}

/// `rus+eng` when both are installed, `rus` alone if only that is, else `eng`.
pub fn negotiate_language(available: &[String]) -> String {
    let has = |lang: &str| available.iter().any(|l| l == lang);
    match (has("rus"), has("eng")) {
        (true, true) => PREFERRED_LANGUAGES.to_string(),
        (true, false) => "rus".to_string(),
        _ => "eng".to_string(),
    }
}

/// Parse `--list-langs` output, which starts with a header line.
pub fn parse_language_list(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| !line.starts_with("List of available languages"))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse Tesseract TSV output into words, skipping rows without text.
pub fn parse_tsv(tsv: &str) -> Vec<OcrWord> {
    let mut words = Vec::new();

    for line in tsv.lines().skip(1) {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < 12 {
            continue;
        }
        let text = columns[11].trim();
        if text.is_empty() {
            continue;
        }
        let confidence = columns[10].trim().parse::<f64>().unwrap_or(-1.0);
        words.push(OcrWord {
            text: text.to_string(),
            confidence,
        });
    }

    words
}
