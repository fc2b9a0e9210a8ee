//! Partitioning of a slide's shape tree into text and image buckets.

use crate::types::{MediaRef, Rect, Slide};

/// A shape carrying non-empty text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextShape {
    pub bounds: Option<Rect>,
    /// Trimmed text.
    pub text: String,
    pub char_count: usize,
    /// Typefaces of the shape's runs.
    pub fonts: Vec<String>,
}

/// A shape carrying an image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageShape {
    pub bounds: Option<Rect>,
    pub pixel_size: Option<(u32, u32)>,
    pub format: String,
    pub media: MediaRef,
}

/// Text and image shapes of one slide, groups flattened.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedShapes {
    pub text_shapes: Vec<TextShape>,
    pub image_shapes: Vec<ImageShape>,
}

impl ClassifiedShapes {
    pub fn image_count(&self) -> usize {
        self.image_shapes.len()
    }
}

/// Walk the slide's shapes (descending into groups) and bucket them.
///
/// A shape with both a text frame and a picture lands in both lists.
pub fn classify(slide: &Slide) -> ClassifiedShapes {
    let mut out = ClassifiedShapes::default();

    for shape in slide.leaf_shapes() {
        if let Some(picture) = &shape.picture {
            out.image_shapes.push(ImageShape {
                bounds: shape.bounds,
                pixel_size: picture.pixel_size,
                format: picture.format.clone(),
                media: picture.media.clone(),
            });
        }

        if let Some(frame) = &shape.text {
            let text = frame.text.trim();
            if !text.is_empty() {
                out.text_shapes.push(TextShape {
                    bounds: shape.bounds,
                    text: text.to_string(),
                    char_count: text.chars().count(),
                    fonts: frame.fonts.clone(),
                });
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Picture, Shape, ShapeKind, TextFrame};

    fn text_shape(text: &str) -> Shape {
        Shape {
            bounds: Some(Rect::new(0, 0, 100, 100)),
            text: Some(TextFrame {
                text: text.to_string(),
                fonts: vec!["Roboto".into()],
            }),
            ..Default::default()
        }
    }

    fn picture_shape() -> Shape {
        Shape {
            kind: ShapeKind::Picture,
            bounds: Some(Rect::new(10, 10, 50, 50)),
            picture: Some(Picture {
                media: MediaRef("ppt/media/image1.png".into()),
                format: "png".into(),
                pixel_size: Some((640, 480)),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_classify_flattens_nested_groups() {
        let mut slide = Slide::new(1);
        slide.shapes.push(text_shape("  Title  "));
        slide.shapes.push(Shape {
            kind: ShapeKind::Group,
            children: vec![
                picture_shape(),
                Shape {
                    kind: ShapeKind::Group,
                    children: vec![text_shape("Caption"), picture_shape()],
                    ..Default::default()
                },
            ],
            ..Default::default()
        });

        let classified = classify(&slide);
        assert_eq!(classified.text_shapes.len(), 2);
        assert_eq!(classified.image_count(), 2);
        assert_eq!(classified.text_shapes[0].text, "Title");
        assert_eq!(classified.text_shapes[0].char_count, 5);
        assert_eq!(classified.image_shapes[0].pixel_size, Some((640, 480)));
    }

    #[test]
    fn test_blank_text_is_ignored() {
        let mut slide = Slide::new(1);
        slide.shapes.push(text_shape("   \n "));
        slide.shapes.push(Shape::default());
        let classified = classify(&slide);
        assert!(classified.text_shapes.is_empty());
        assert!(classified.image_shapes.is_empty());
    }

    #[test]
    fn test_picture_with_caption_lands_in_both_lists() {
        let mut shape = picture_shape();
        shape.text = Some(TextFrame {
            text: "Figure 1".into(),
            fonts: Vec::new(),
        });
        let mut slide = Slide::new(1);
        slide.shapes.push(shape);

        let classified = classify(&slide);
        assert_eq!(classified.text_shapes.len(), 1);
        assert_eq!(classified.image_count(), 1);
    }

    #[test]
    fn test_char_count_uses_characters() {
        let mut slide = Slide::new(1);
        slide.shapes.push(text_shape("Привет"));
        assert_eq!(classify(&slide).text_shapes[0].char_count, 6);
    }
}
