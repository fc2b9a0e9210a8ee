//! PPTX file parser implementation.

use deckcheck_core::{
    Color, Deck, Error, Fill, MediaRef, Picture, Rect, Result, Shape, ShapeKind, Slide, TextFrame,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use zip::ZipArchive;

const PRESENTATION_PATH: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PATH: &str = "ppt/_rels/presentation.xml.rels";

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a PPTX file from a reader into the deck model.
    pub fn parse<R: Read + Seek>(&self, reader: R, filename: &str) -> Result<Deck> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        if archive.by_name(PRESENTATION_PATH).is_err() {
            return Err(Error::PptxParseError(format!(
                "{} has no {}",
                filename, PRESENTATION_PATH
            )));
        }
        let presentation_xml = self.read_file_from_archive(&mut archive, PRESENTATION_PATH)?;
        let info = parse_presentation_xml(&presentation_xml)?;

        let mut deck = Deck::new(filename);
        if let Some((cx, cy)) = info.slide_size {
            deck = deck.with_slide_size(cx, cy);
        }

        let slide_order = self.get_slide_order(&mut archive, &info.slide_ids)?;
        log::debug!("Found {} slides in {}", slide_order.len(), filename);

        for (idx, slide_path) in slide_order.iter().enumerate() {
            let number = idx + 1;
            let slide = match self.parse_slide(&mut archive, slide_path, number) {
                Ok(slide) => slide,
                Err(e) => {
                    log::warn!("Slide {} ({}) could not be read: {}", number, slide_path, e);
                    Slide::new(number)
                }
            };
            deck.add_slide(slide);
        }

        self.load_media(&mut archive, &mut deck);

        Ok(deck)
    }

    /// Ordered slide part paths.
    ///
    /// Follows `p:sldIdLst` when present; otherwise slide relationships are
    /// ordered by their trailing number.
    fn get_slide_order<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_ids: &[String],
    ) -> Result<Vec<String>> {
        let rels_content = self.read_file_from_archive(archive, PRESENTATION_RELS_PATH)?;
        let rels = parse_relationships(&rels_content)?;

        if !slide_ids.is_empty() {
            let ordered: Vec<String> = slide_ids
                .iter()
                .filter_map(|id| rels.get(id))
                .filter(|rel| is_slide_relationship(&rel.rel_type))
                .map(|rel| resolve_target("ppt", &rel.target))
                .collect();
            if !ordered.is_empty() {
                return Ok(ordered);
            }
        }

        let mut slides: Vec<(String, Option<usize>)> = rels
            .iter()
            .filter(|(_, rel)| is_slide_relationship(&rel.rel_type))
            .map(|(id, rel)| {
                let order_num =
                    extract_slide_number(&rel.target).or_else(|| extract_slide_number(id));
                (resolve_target("ppt", &rel.target), order_num)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Parse a single slide from the archive.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        slide_number: usize,
    ) -> Result<Slide> {
        let content = self.read_file_from_archive(archive, slide_path)?;

        let rels = match self.read_file_from_archive(archive, &rels_path_for(slide_path)) {
            Ok(rels_content) => parse_relationships(&rels_content)?,
            Err(_) => HashMap::new(),
        };

        let (dir, _) = slide_path.rsplit_once('/').unwrap_or(("", slide_path));
        let image_targets: HashMap<String, String> = rels
            .into_iter()
            .filter(|(_, rel)| rel.rel_type.ends_with("/image"))
            .map(|(id, rel)| (id, resolve_target(dir, &rel.target)))
            .collect();

        let mut slide = parse_slide_xml(&content, &image_targets)?;
        slide.number = slide_number;
        Ok(slide)
    }

    /// Load every picture's media part into the deck and read its pixel size.
    fn load_media<R: Read + Seek>(&self, archive: &mut ZipArchive<R>, deck: &mut Deck) {
        let media_paths: Vec<String> = deck
            .slides
            .iter()
            .flat_map(|slide| slide.leaf_shapes())
            .filter_map(|shape| shape.picture.as_ref().map(|p| p.media.0.clone()))
            .collect();

        let mut sizes: HashMap<String, Option<(u32, u32)>> = HashMap::new();
        for path in media_paths {
            if sizes.contains_key(&path) {
                continue;
            }
            let size = match self.read_bytes_from_archive(archive, &path) {
                Ok(bytes) => {
                    let size = image_dimensions(&bytes);
                    if size.is_none() {
                        log::debug!("Could not read image header of {}", path);
                    }
                    deck.insert_media(path.clone(), bytes);
                    size
                }
                Err(e) => {
                    log::warn!("Missing image part: {}", e);
                    None
                }
            };
            sizes.insert(path, size);
        }

        for slide in &mut deck.slides {
            for shape in &mut slide.shapes {
                apply_pixel_sizes(shape, &sizes);
            }
        }
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }

    fn read_bytes_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<Vec<u8>> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(bytes)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_pixel_sizes(shape: &mut Shape, sizes: &HashMap<String, Option<(u32, u32)>>) {
    if let Some(picture) = &mut shape.picture {
        picture.pixel_size = sizes.get(&picture.media.0).copied().flatten();
    }
    for child in &mut shape.children {
        apply_pixel_sizes(child, sizes);
    }
}

/// Pixel dimensions from the image header, without decoding the bitmap.
fn image_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// Data read from `presentation.xml`.
#[derive(Debug, Default)]
struct PresentationInfo {
    slide_size: Option<(i64, i64)>,
    /// Relationship ids of `p:sldId` entries, in order.
    slide_ids: Vec<String>,
}

fn parse_presentation_xml(xml: &str) -> Result<PresentationInfo> {
    let mut info = PresentationInfo::default();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                match local_name(e.name().as_ref()) {
                    b"sldSz" => {
                        let cx = attr_value(e, b"cx").and_then(|v| v.parse().ok());
                        let cy = attr_value(e, b"cy").and_then(|v| v.parse().ok());
                        if let (Some(cx), Some(cy)) = (cx, cy) {
                            info.slide_size = Some((cx, cy));
                        }
                    }
                    b"sldId" => {
                        if let Some(id) = relationship_id(e) {
                            info.slide_ids.push(id);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing presentation: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(info)
}

/// The namespaced `r:id` of an element that also carries a plain `id`.
fn relationship_id(e: &BytesStart) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| {
            let key = a.key.as_ref();
            key.contains(&b':') && local_name(key) == b"id"
        })
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

/// A package relationship.
#[derive(Debug, Clone)]
struct Relationship {
    rel_type: String,
    target: String,
}

fn parse_relationships(xml: &str) -> Result<HashMap<String, Relationship>> {
    let mut rels = HashMap::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut rel_type = String::new();
                let mut target = String::new();
                let mut id = String::new();

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Type" => {
                            rel_type = String::from_utf8_lossy(&attr.value).to_string();
                        }
                        b"Target" => {
                            target = String::from_utf8_lossy(&attr.value).to_string();
                        }
                        b"Id" => {
                            id = String::from_utf8_lossy(&attr.value).to_string();
                        }
                        _ => {}
                    }
                }

                if !id.is_empty() {
                    rels.insert(id, Relationship { rel_type, target });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(rels)
}

fn is_slide_relationship(rel_type: &str) -> bool {
    rel_type.ends_with("/slide")
}

/// `ppt/slides/slide1.xml` -> `ppt/slides/_rels/slide1.xml.rels`
fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// A shape being assembled while its element is open.
#[derive(Debug, Default)]
struct ShapeBuilder {
    shape: Shape,
    off: Option<(i64, i64)>,
    ext: Option<(i64, i64)>,
    ch_off: Option<(i64, i64)>,
    ch_ext: Option<(i64, i64)>,
    paragraphs: Vec<String>,
    paragraph: String,
}

impl ShapeBuilder {
    fn new(kind: ShapeKind) -> Self {
        Self {
            shape: Shape {
                kind,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn finish(mut self) -> Shape {
        if let (Some((x, y)), Some((cx, cy))) = (self.off, self.ext) {
            self.shape.bounds = Some(Rect::new(x, y, cx, cy));
        }
        if let Some(frame) = &mut self.shape.text {
            frame.text = self.paragraphs.join("\n");
        }
        if self.shape.is_group() {
            if let Some(transform) = self.group_transform() {
                for child in &mut self.shape.children {
                    transform.apply(child);
                }
            }
        }
        self.shape
    }

    fn group_transform(&self) -> Option<GroupTransform> {
        Some(GroupTransform {
            off: self.off?,
            ext: self.ext?,
            ch_off: self.ch_off.unwrap_or(self.off?),
            ch_ext: self.ch_ext.unwrap_or(self.ext?),
        })
    }
}

/// Maps a group's child coordinate space onto its parent's.
#[derive(Debug, Clone, Copy)]
struct GroupTransform {
    off: (i64, i64),
    ext: (i64, i64),
    ch_off: (i64, i64),
    ch_ext: (i64, i64),
}

impl GroupTransform {
    fn apply(&self, shape: &mut Shape) {
        if let Some(b) = shape.bounds {
            let (left, width) = map_axis(b.left, b.width, self.off.0, self.ext.0, self.ch_off.0, self.ch_ext.0);
            let (top, height) = map_axis(b.top, b.height, self.off.1, self.ext.1, self.ch_off.1, self.ch_ext.1);
            shape.bounds = Some(Rect::new(left, top, width, height));
        }
        for child in &mut shape.children {
            self.apply(child);
        }
    }
}

fn map_axis(pos: i64, len: i64, off: i64, ext: i64, ch_off: i64, ch_ext: i64) -> (i64, i64) {
    let scale = if ch_ext == 0 {
        1.0
    } else {
        ext as f64 / ch_ext as f64
    };
    let mapped_pos = off as f64 + (pos as f64 - ch_off as f64) * scale;
    let mapped_len = len as f64 * scale;
    // Float-to-int casts saturate, so corrupt offsets clamp instead of wrapping.
    (mapped_pos.round() as i64, mapped_len.round() as i64)
}

/// Streaming state for one slide document.
struct SlideXmlState<'a> {
    image_targets: &'a HashMap<String, String>,
    path: Vec<Vec<u8>>,
    builders: Vec<ShapeBuilder>,
    slide: Slide,
}

impl<'a> SlideXmlState<'a> {
    fn new(xml: &str, image_targets: &'a HashMap<String, String>) -> Self {
        Self {
            image_targets,
            path: Vec::new(),
            builders: Vec::new(),
            slide: Slide {
                xml: xml.to_string(),
                ..Default::default()
            },
        }
    }

    fn parent(&self) -> &[u8] {
        self.path.last().map(Vec::as_slice).unwrap_or(b"")
    }

    fn grandparent(&self) -> &[u8] {
        if self.path.len() >= 2 {
            &self.path[self.path.len() - 2]
        } else {
            b""
        }
    }

    fn open(&mut self, e: &BytesStart) {
        let name = e.name();
        let local = local_name(name.as_ref()).to_vec();

        match local.as_slice() {
            b"sp" => self.builders.push(ShapeBuilder::new(ShapeKind::AutoShape)),
            b"pic" => self.builders.push(ShapeBuilder::new(ShapeKind::Picture)),
            b"grpSp" => self.builders.push(ShapeBuilder::new(ShapeKind::Group)),
            b"graphicFrame" => self.builders.push(ShapeBuilder::new(ShapeKind::GraphicFrame)),
            b"cxnSp" => self.builders.push(ShapeBuilder::new(ShapeKind::Connector)),
            b"cNvPr" => {
                if let Some(builder) = self.builders.last_mut() {
                    builder.shape.name = attr_value(e, b"name").unwrap_or_default();
                }
            }
            b"off" | b"ext" | b"chOff" | b"chExt" if self.parent() == b"xfrm" => {
                self.read_xfrm_point(&local, e);
            }
            b"noFill" | b"solidFill" | b"gradFill" | b"pattFill" | b"blipFill" | b"grpFill" => {
                self.read_fill(&local);
            }
            b"srgbClr" | b"schemeClr" | b"sysClr" | b"prstClr" | b"scrgbClr"
                if self.parent() == b"solidFill" =>
            {
                self.read_color(&local, e);
            }
            b"blip" if self.parent() == b"blipFill" => {
                self.read_blip(e);
            }
            b"txBody" => {
                let in_shape = is_shape_element(self.parent());
                if let Some(builder) = self.builders.last_mut().filter(|_| in_shape) {
                    builder.shape.text = Some(TextFrame::default());
                }
            }
            b"p" if self.parent() == b"txBody" => {
                if let Some(builder) = self.builders.last_mut() {
                    builder.paragraph.clear();
                }
            }
            b"br" if self.parent() == b"p" => {
                if let Some(builder) = self.text_builder() {
                    builder.paragraph.push('\n');
                }
            }
            b"latin" if self.parent() == b"rPr" && self.grandparent() == b"r" => {
                if let Some(typeface) = attr_value(e, b"typeface") {
                    if let Some(frame) = self.text_builder().and_then(|b| b.shape.text.as_mut()) {
                        frame.fonts.push(typeface);
                    }
                }
            }
            _ => {}
        }

        self.path.push(local);
    }

    fn close(&mut self) {
        let Some(local) = self.path.pop() else {
            return;
        };

        match local.as_slice() {
            b"p" if self.parent() == b"txBody" => {
                if let Some(builder) = self.text_builder() {
                    let paragraph = std::mem::take(&mut builder.paragraph);
                    builder.paragraphs.push(paragraph);
                }
            }
            name if is_shape_element(name) => {
                if let Some(builder) = self.builders.pop() {
                    let shape = builder.finish();
                    match self.builders.last_mut() {
                        Some(parent) if parent.shape.is_group() => parent.shape.children.push(shape),
                        Some(_) => {}
                        None => self.slide.shapes.push(shape),
                    }
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.parent() == b"t" {
            if let Some(builder) = self.text_builder() {
                builder.paragraph.push_str(text);
            }
        }
    }

    /// The innermost shape with an open text body.
    fn text_builder(&mut self) -> Option<&mut ShapeBuilder> {
        self.builders
            .last_mut()
            .filter(|b| b.shape.text.is_some())
    }

    fn read_xfrm_point(&mut self, local: &[u8], e: &BytesStart) {
        // Only the transform of the innermost open shape
        let owner = self.grandparent();
        if !matches!(owner, b"spPr" | b"grpSpPr" | b"graphicFrame") {
            return;
        }
        let Some(builder) = self.builders.last_mut() else {
            return;
        };
        let (kx, ky): (&[u8], &[u8]) = match local {
            b"off" | b"chOff" => (b"x", b"y"),
            _ => (b"cx", b"cy"),
        };
        let x = attr_value(e, kx).and_then(|v| v.parse::<i64>().ok());
        let y = attr_value(e, ky).and_then(|v| v.parse::<i64>().ok());
        let Some(point) = x.zip(y) else {
            return;
        };
        match local {
            b"off" => builder.off = Some(point),
            b"ext" => builder.ext = Some(point),
            b"chOff" => builder.ch_off = Some(point),
            _ => builder.ch_ext = Some(point),
        }
    }

    fn fill_target(&mut self) -> Option<&mut Fill> {
        match self.parent() {
            b"bgPr" => Some(&mut self.slide.background),
            b"spPr" | b"grpSpPr" => self.builders.last_mut().map(|b| &mut b.shape.fill),
            _ => None,
        }
    }

    fn read_fill(&mut self, local: &[u8]) {
        let fill = match local {
            b"noFill" => Fill::NoFill,
            b"solidFill" => Fill::Solid(Color::Unknown),
            b"gradFill" => Fill::Gradient,
            b"pattFill" => Fill::Pattern,
            b"blipFill" => Fill::Picture,
            _ => Fill::Inherited,
        };
        if let Some(target) = self.fill_target() {
            *target = fill;
        }
    }

    fn read_color(&mut self, local: &[u8], e: &BytesStart) {
        let color = match local {
            b"srgbClr" => attr_value(e, b"val")
                .and_then(|v| Color::from_hex(&v))
                .unwrap_or(Color::Unknown),
            b"sysClr" => attr_value(e, b"lastClr")
                .and_then(|v| Color::from_hex(&v))
                .unwrap_or(Color::Unknown),
            b"schemeClr" => attr_value(e, b"val")
                .map(Color::Scheme)
                .unwrap_or(Color::Unknown),
            b"prstClr" => match attr_value(e, b"val").as_deref() {
                Some("white") => Color::Rgb(255, 255, 255),
                Some("black") => Color::Rgb(0, 0, 0),
                _ => Color::Unknown,
            },
            _ => scrgb_color(e).unwrap_or(Color::Unknown),
        };

        // The solidFill is the parent; its owner decides where the color goes
        let owner = self.grandparent().to_vec();
        let target = match owner.as_slice() {
            b"bgPr" => Some(&mut self.slide.background),
            b"spPr" | b"grpSpPr" => self.builders.last_mut().map(|b| &mut b.shape.fill),
            _ => None,
        };
        if let Some(target) = target {
            *target = Fill::Solid(color);
        }
    }

    fn read_blip(&mut self, e: &BytesStart) {
        let Some(builder) = self.builders.last_mut() else {
            return;
        };
        if builder.shape.kind != ShapeKind::Picture {
            return;
        }
        let Some(rel_id) = attr_value(e, b"embed") else {
            return;
        };
        let Some(target) = self.image_targets.get(&rel_id) else {
            log::debug!("Picture references unknown relationship {}", rel_id);
            return;
        };
        let format = target
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        builder.shape.picture = Some(Picture {
            media: MediaRef(target.clone()),
            format,
            pixel_size: None,
        });
    }
}

fn is_shape_element(local: &[u8]) -> bool {
    matches!(local, b"sp" | b"pic" | b"grpSp" | b"graphicFrame" | b"cxnSp")
}

fn scrgb_color(e: &BytesStart) -> Option<Color> {
    let channel = |key: &[u8]| -> Option<u8> {
        let v: f64 = attr_value(e, key)?.parse().ok()?;
        Some((v / 100_000.0 * 255.0).round().clamp(0.0, 255.0) as u8)
    };
    Some(Color::Rgb(channel(b"r")?, channel(b"g")?, channel(b"b")?))
}

/// Parse one slide document into the slide model.
///
/// `image_targets` maps the slide's image relationship ids to package paths.
fn parse_slide_xml(xml: &str, image_targets: &HashMap<String, String>) -> Result<Slide> {
    let mut reader = Reader::from_str(xml);
    let mut state = SlideXmlState::new(xml, image_targets);

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if local_name(e.name().as_ref()) == b"Fallback" {
                    // Alternate content duplicates the Choice branch
                    reader
                        .read_to_end(e.name())
                        .map_err(|err| Error::XmlError(format!("Error skipping fallback: {}", err)))?;
                    continue;
                }
                state.open(e);
            }
            Ok(Event::Empty(ref e)) => {
                state.open(e);
                state.close();
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default();
                state.text(&text);
            }
            Ok(Event::End(_)) => state.close(),
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("XML parsing error (keeping shapes read so far): {}", e);
                break;
            }
            _ => {}
        }
    }

    Ok(state.slide)
}

/// Value of the attribute whose local name is `key`.
fn attr_value(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| local_name(a.key.as_ref()) == key)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
