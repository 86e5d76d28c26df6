//! PDF loader backed by `lopdf`

use super::{DocumentLoader, LoadedDocument};
use crate::error::AnalyzerError;
use crate::Result;
use lopdf::Document;
use std::path::Path;
use tracing::debug;

/// Extracts the text content of every page, in page order
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfLoader;

impl DocumentLoader for PdfLoader {
    fn load(&self, path: &Path) -> Result<LoadedDocument> {
        let document = Document::load(path).map_err(|e| AnalyzerError::unreadable(path, e))?;

        if document.is_encrypted() {
            return Err(AnalyzerError::unreadable(path, "document is encrypted"));
        }

        let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
        let mut pages = Vec::with_capacity(page_numbers.len());

        for page_number in page_numbers {
            let text = document.extract_text(&[page_number]).map_err(|e| {
                AnalyzerError::unreadable(path, format!("page {}: {}", page_number, e))
            })?;
            pages.push(text);
        }

        debug!(path = %path.display(), page_count = pages.len(), "PDF pages extracted");

        Ok(LoadedDocument {
            path: path.to_path_buf(),
            pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::NormalizedDocument;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};
    use std::fs;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn temp_pdf(prefix: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{}-{}.pdf", prefix, Uuid::new_v4()))
    }

    /// One page per entry, each drawing its line with a single `Tj`
    fn build_pdf(lines: &[&str]) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::with_capacity(lines.len());
        for line in lines {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*line)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(Object::Reference(page_id));
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => lines.len() as i64,
                "Kids" => kids,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    #[test]
    fn test_pages_extracted_in_order() {
        let path = temp_pdf("statement");
        build_pdf(&["Total Revenue 1000", "Net Income 200"]).save(&path).unwrap();

        let result = PdfLoader.load(&path);
        fs::remove_file(&path).ok();
        let loaded = result.unwrap();

        assert_eq!(loaded.path, path);
        assert_eq!(loaded.pages.len(), 2);
        assert!(loaded.pages[0].contains("Total Revenue 1000"));
        assert!(loaded.pages[1].contains("Net Income 200"));

        let document = NormalizedDocument::from_loaded(loaded);
        assert_eq!(document.page_count, 2);
        assert_eq!(document.text, "Total Revenue 1000 Net Income 200");
    }

    #[test]
    fn test_encrypted_file_is_unreadable() {
        let path = temp_pdf("encrypted");
        let mut doc = build_pdf(&["Revenue 1000"]);
        let encrypt_id = doc.add_object(dictionary! {
            "Filter" => "Standard",
            "V" => 1,
            "R" => 2,
            "Length" => 40,
            "P" => -4,
            "O" => Object::string_literal(vec![0u8; 32]),
            "U" => Object::string_literal(vec![0u8; 32]),
        });
        doc.trailer.set("Encrypt", encrypt_id);
        doc.trailer.set(
            "ID",
            vec![
                Object::string_literal(vec![1u8; 16]),
                Object::string_literal(vec![1u8; 16]),
            ],
        );
        doc.save(&path).unwrap();

        let result = PdfLoader.load(&path);
        fs::remove_file(&path).ok();

        assert!(matches!(result, Err(AnalyzerError::DocumentUnreadable { .. })));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let path = temp_pdf("missing");

        let err = PdfLoader.load(&path).unwrap_err();
        match err {
            AnalyzerError::DocumentUnreadable { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_corrupt_file_is_unreadable() {
        let path = temp_pdf("corrupt");
        fs::write(&path, b"this is not a pdf at all").unwrap();

        let result = PdfLoader.load(&path);
        fs::remove_file(&path).ok();

        assert!(matches!(result, Err(AnalyzerError::DocumentUnreadable { .. })));
    }
}
