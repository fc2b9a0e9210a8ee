//! Core deck model, slide inspectors and conformance scoring for checking
//! presentations against the house slide style.

pub mod classify;
pub mod error;
pub mod finding;
pub mod fonts;
pub mod inspect;
pub mod normalize;
pub mod range;
pub mod score;
pub mod settings;
pub mod text_on_image;
pub mod types;

pub use classify::{classify, ClassifiedShapes, ImageShape, TextShape};
pub use error::{Error, Result};
pub use finding::{DeckStats, OcrCandidate, OcrSummary, SlideFinding, Violation, STATUS_OK};
pub use fonts::{FontInventory, MAX_FONTS};
pub use inspect::CheckOutcome;
pub use normalize::Script;
pub use range::SlideSelection;
pub use score::{score, ConformanceReport, ReadinessTier};
pub use settings::AnalysisSettings;
pub use text_on_image::{ImageTextExtractor, OcrPolicy, TextOnImage};
pub use types::{Color, Deck, Fill, MediaRef, Picture, Rect, Shape, ShapeKind, Slide, TextFrame};
