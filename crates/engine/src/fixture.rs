//! In-memory presentation packages for pipeline tests.

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

struct FixtureSlide {
    xml: String,
    image: Option<(String, Vec<u8>)>,
}

#[derive(Default)]
pub struct DeckBuilder {
    slides: Vec<FixtureSlide>,
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_slide(&mut self, xml: String) {
        self.slides.push(FixtureSlide { xml, image: None });
    }

    /// Add a slide whose `rId2` points at `ppt/media/<name>`.
    pub fn add_slide_with_image(&mut self, xml: String, name: &str, bytes: &[u8]) {
        self.slides.push(FixtureSlide {
            xml,
            image: Some((name.to_string(), bytes.to_vec())),
        });
    }

    pub fn build(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();

        let ids: String = (0..self.slides.len())
            .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 2))
            .collect();
        let presentation = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation {NS}><p:sldIdLst>{ids}</p:sldIdLst><p:sldSz cx="9144000" cy="6858000"/></p:presentation>"#
        );
        put(&mut zip, "ppt/presentation.xml", presentation.as_bytes(), options);

        let rels: String = (0..self.slides.len())
            .map(|i| {
                format!(
                    r#"<Relationship Id="rId{}" Type="{REL_SLIDE}" Target="slides/slide{}.xml"/>"#,
                    i + 2,
                    i + 1
                )
            })
            .collect();
        put(
            &mut zip,
            "ppt/_rels/presentation.xml.rels",
            relationships(&rels).as_bytes(),
            options,
        );

        for (i, slide) in self.slides.iter().enumerate() {
            let n = i + 1;
            put(
                &mut zip,
                &format!("ppt/slides/slide{}.xml", n),
                slide.xml.as_bytes(),
                options,
            );
            if let Some((name, bytes)) = &slide.image {
                let rel = format!(
                    r#"<Relationship Id="rId2" Type="{REL_IMAGE}" Target="../media/{name}"/>"#
                );
                put(
                    &mut zip,
                    &format!("ppt/slides/_rels/slide{}.xml.rels", n),
                    relationships(&rel).as_bytes(),
                    options,
                );
                put(&mut zip, &format!("ppt/media/{}", name), bytes, options);
            }
        }

        zip.finish().unwrap().into_inner()
    }
}

fn put(zip: &mut ZipWriter<Cursor<Vec<u8>>>, name: &str, bytes: &[u8], options: FileOptions) {
    zip.start_file(name, options).unwrap();
    zip.write_all(bytes).unwrap();
}

fn relationships(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{body}</Relationships>"#
    )
}

fn xfrm((x, y, cx, cy): (i64, i64, i64, i64)) -> String {
    format!(r#"<a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#)
}

/// A slide document. `background` is an optional solid RGB hex fill.
pub fn slide(background: Option<&str>, shapes: &str) -> String {
    let bg = background
        .map(|hex| {
            format!(
                r#"<p:bg><p:bgPr><a:solidFill><a:srgbClr val="{hex}"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#
            )
        })
        .unwrap_or_default();
    slide_document(&bg, shapes, "")
}

/// A white slide with extra markup after the shape tree (timing, transition).
pub fn slide_with_extra(shapes: &str, extra: &str) -> String {
    slide_document("", shapes, extra)
}

fn slide_document(bg: &str, shapes: &str, extra: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld {NS}><p:cSld>{bg}<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{shapes}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>{extra}</p:sld>"#
    )
}

pub fn text_box(id: u32, bounds: (i64, i64, i64, i64), text: &str, font: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr>{}</p:spPr><p:txBody><a:bodyPr/><a:p><a:r><a:rPr lang="en-US"><a:latin typeface="{font}"/></a:rPr><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#,
        xfrm(bounds)
    )
}

pub fn picture(id: u32, rel_id: &str, bounds: (i64, i64, i64, i64)) -> String {
    format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Picture {id}"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{rel_id}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr>{}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#,
        xfrm(bounds)
    )
}
