//! Image-page assembly: JPEG files → one multi-page PDF via `lopdf`.
//!
//! Each JPEG is embedded verbatim as a `DCTDecode` image XObject, so the
//! quality chosen at encode time is exactly what ends up in the document.
//! Page size is the pixel size scaled to the requested DPI.

use super::{EncodedPage, PageAssembler};
use crate::error::EngineError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tracing::debug;

/// Default [`PageAssembler`] built on `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfAssembler;

impl PageAssembler for LopdfAssembler {
    fn assemble(&self, pages: &[EncodedPage], dpi: u32) -> Result<Vec<u8>, EngineError> {
        if pages.is_empty() {
            return Err(EngineError::Write("no pages to assemble".into()));
        }
        let dpi = dpi.max(1) as f32;

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

        for page in pages {
            let jpeg = std::fs::read(&page.path)?;

            let image = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => page.width as i64,
                    "Height" => page.height as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                jpeg,
            )
            .with_compression(false);
            let image_id = doc.add_object(image);

            let width_pt = page.width as f32 * 72.0 / dpi;
            let height_pt = page.height as f32 * 72.0 / dpi;

            let content = Content {
                operations: vec![
                    Operation::new("q", vec![]),
                    Operation::new(
                        "cm",
                        vec![
                            width_pt.into(),
                            0.into(),
                            0.into(),
                            height_pt.into(),
                            0.into(),
                            0.into(),
                        ],
                    ),
                    Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                    Operation::new("Q", vec![]),
                ],
            };
            let encoded = content
                .encode()
                .map_err(|e| EngineError::Write(format!("content stream: {e}")))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), width_pt.into(), height_pt.into()],
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "XObject" => dictionary! { "Im0" => image_id },
                },
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|e| EngineError::Write(format!("failed to serialise PDF: {e}")))?;

        debug!(pages = pages.len(), bytes = output.len(), "Assembled image PDF");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::encode::encode_jpeg;
    use image::{DynamicImage, Rgb, RgbImage};

    fn write_page(dir: &std::path::Path, name: &str, w: u32, h: u32) -> EncodedPage {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([200, 30, 30])));
        let bytes = encode_jpeg(&img, 40).expect("encode");
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        EncodedPage {
            path,
            width: w,
            height: h,
        }
    }

    #[test]
    fn assembles_one_page_per_image() {
        let dir = tempfile::tempdir().unwrap();
        let pages = vec![
            write_page(dir.path(), "a.jpg", 40, 60),
            write_page(dir.path(), "b.jpg", 40, 60),
            write_page(dir.path(), "c.jpg", 60, 40),
        ];

        let bytes = LopdfAssembler.assemble(&pages, 100).expect("assemble");
        assert!(bytes.starts_with(b"%PDF"));

        let reloaded = Document::load_mem(&bytes).expect("valid PDF");
        assert_eq!(reloaded.get_pages().len(), 3);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(LopdfAssembler.assemble(&[], 100).is_err());
    }

    #[test]
    fn missing_image_file_is_an_error() {
        let page = EncodedPage {
            path: "/definitely/not/here.jpg".into(),
            width: 10,
            height: 10,
        };
        assert!(matches!(
            LopdfAssembler.assemble(&[page], 100),
            Err(EngineError::Io(_))
        ));
    }
}
