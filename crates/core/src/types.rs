//! Domain types for representing a parsed presentation deck.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default slide width (10 inches) in EMU.
pub const DEFAULT_SLIDE_WIDTH: i64 = 9_144_000;

/// Default slide height (7.5 inches) in EMU.
pub const DEFAULT_SLIDE_HEIGHT: i64 = 6_858_000;

/// An entire presentation, as seen by the inspectors.
#[derive(Debug, Clone)]
pub struct Deck {
    /// Original filename (without path).
    pub filename: String,

    /// Slide width and height in EMU.
    pub slide_size: (i64, i64),

    /// Slides in presentation order.
    pub slides: Vec<Slide>,

    /// Embedded media keyed by package path (e.g. `ppt/media/image1.png`).
    media: HashMap<String, Vec<u8>>,
}

impl Deck {
    /// Create an empty deck with the default slide size.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            slide_size: (DEFAULT_SLIDE_WIDTH, DEFAULT_SLIDE_HEIGHT),
            slides: Vec::new(),
            media: HashMap::new(),
        }
    }

    /// Set the slide size in EMU.
    pub fn with_slide_size(mut self, width: i64, height: i64) -> Self {
        self.slide_size = (width, height);
        self
    }

    /// Add a slide to the deck.
    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    /// Store the bytes of an embedded media part.
    pub fn insert_media(&mut self, path: impl Into<String>, bytes: Vec<u8>) {
        self.media.insert(path.into(), bytes);
    }

    /// Raw bytes for a media reference, if the part was present in the package.
    pub fn media(&self, reference: &MediaRef) -> Option<&[u8]> {
        self.media.get(&reference.0).map(Vec::as_slice)
    }

    /// Total number of slides.
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Slide area in EMU².
    pub fn slide_area(&self) -> i128 {
        self.slide_size.0 as i128 * self.slide_size.1 as i128
    }
}

/// A single slide.
#[derive(Debug, Clone, Default)]
pub struct Slide {
    /// 1-based slide number, stable with respect to the original deck.
    pub number: usize,

    /// The slide's raw XML markup.
    pub xml: String,

    /// Slide-level background fill.
    pub background: Fill,

    /// Top-level shapes of the slide's shape tree.
    pub shapes: Vec<Shape>,
}

impl Slide {
    /// Create a new empty slide with the given number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            ..Default::default()
        }
    }

    /// Iterate over every non-group shape, descending into groups.
    pub fn leaf_shapes(&self) -> Vec<&Shape> {
        let mut out = Vec::new();
        for shape in &self.shapes {
            shape.collect_leaves(&mut out);
        }
        out
    }
}

/// Axis-aligned bounding box in slide coordinates (EMU).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    pub fn new(left: i64, top: i64, width: i64, height: i64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Right edge, clamped at the `i64` range for corrupt geometry.
    pub fn right(&self) -> i64 {
        self.left.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i64 {
        self.top.saturating_add(self.height)
    }

    pub fn area(&self) -> i128 {
        self.width as i128 * self.height as i128
    }

    /// Strict intersection test: touching edges do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        let overlap_x = !(self.right() <= other.left || self.left >= other.right());
        let overlap_y = !(self.bottom() <= other.top || self.top >= other.bottom());
        overlap_x && overlap_y
    }
}

/// A color as written in the markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Color {
    /// Explicit RGB value.
    Rgb(u8, u8, u8),
    /// Theme color reference (e.g. `bg1`, `accent2`), not resolved.
    Scheme(String),
    /// Anything else the reader did not resolve.
    Unknown,
}

impl Color {
    /// Parse a 6-digit hex value such as `FFFFFF`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::Rgb(r, g, b))
    }

    pub fn is_white(&self) -> bool {
        matches!(self, Self::Rgb(255, 255, 255))
    }
}

/// A fill applied to a slide background or a shape.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Fill {
    /// Explicit `noFill`.
    NoFill,
    /// No fill given; inherited from layout, master or theme.
    #[default]
    Inherited,
    Solid(Color),
    Gradient,
    Pattern,
    Picture,
}

/// Structural kind of a shape-tree element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShapeKind {
    #[default]
    AutoShape,
    Picture,
    Group,
    GraphicFrame,
    Connector,
}

/// A shape on a slide. Groups carry their children.
#[derive(Debug, Clone, Default)]
pub struct Shape {
    pub name: String,
    pub kind: ShapeKind,

    /// Bounding box in slide coordinates, if the markup gives one.
    pub bounds: Option<Rect>,

    pub fill: Fill,

    /// Text frame contents, if the shape has a text body.
    pub text: Option<TextFrame>,

    /// Picture data, if the shape is an image.
    pub picture: Option<Picture>,

    /// Children of a group shape.
    pub children: Vec<Shape>,
}

impl Shape {
    pub fn is_group(&self) -> bool {
        self.kind == ShapeKind::Group
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Shape>) {
        if self.is_group() {
            for child in &self.children {
                child.collect_leaves(out);
            }
        } else {
            out.push(self);
        }
    }
}

/// Text content of a shape's text body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextFrame {
    /// Paragraph text joined with newlines.
    pub text: String,

    /// Latin typeface names of the runs, in run order (may repeat).
    pub fonts: Vec<String>,
}

/// Reference to an embedded media part by package path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaRef(pub String);

/// An image placed on a slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    pub media: MediaRef,

    /// Lowercase file extension of the media part (e.g. `png`).
    pub format: String,

    /// Native pixel dimensions, when the image header could be read.
    pub pixel_size: Option<(u32, u32)>,
}
