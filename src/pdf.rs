//! PDF page-level operations.
//!
//! The batch runner only needs two things from PDFs: concatenating
//! documents and stamping one document's first page over every page of
//! another. Both sit behind [`PdfBackend`] so batches can be tested
//! without real documents.

use std::fmt;
use std::path::{Path, PathBuf};

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

use crate::error::{FpError, Result};

/// Resource name the stamp is registered under on each page.
const STAMP_NAME: &str = "FpWatermark0";

/// Page attributes inherited from the page tree when absent on a page.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Page-level PDF operations used by the batch runner.
pub trait PdfBackend: Sync {
    /// Concatenate `inputs`, in order, into `output`.
    fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<()>;

    /// Write `input` to `output` with the first page of `stamp` drawn over
    /// every page.
    fn overlay(&self, input: &Path, stamp: &Path, output: &Path) -> Result<()>;
}

/// [`PdfBackend`] implemented with `lopdf`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfBackend;

fn pdf_error(path: &Path, e: impl fmt::Display) -> FpError {
    FpError::Pdf {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

fn load(path: &Path) -> Result<Document> {
    Document::load(path).map_err(|e| pdf_error(path, e))
}

fn save(doc: &mut Document, path: &Path) -> Result<()> {
    doc.prune_objects();
    doc.compress();
    doc.save(path).map(|_| ()).map_err(|e| pdf_error(path, e))
}

fn type_of(object: &Object) -> Option<&[u8]> {
    object.as_dict().ok()?.get(b"Type").ok()?.as_name().ok()
}

fn is_page_tree(object: &Object) -> bool {
    matches!(type_of(object), Some(b"Catalog" | b"Pages" | b"Page"))
}

/// Look up `key` on a page, walking up the page tree.
fn inherited(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut node = Some(page_id);
    while let Some(id) = node {
        let dict = doc.get_dictionary(id).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        node = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

/// Resolve an optional dictionary or reference to an owned dictionary.
fn owned_dict(doc: &Document, object: Option<Object>) -> Dictionary {
    match object {
        Some(Object::Dictionary(dict)) => dict,
        Some(Object::Reference(id)) => doc
            .get_dictionary(id)
            .cloned()
            .unwrap_or_else(|_| Dictionary::new()),
        _ => Dictionary::new(),
    }
}

/// Copy inherited attributes onto each page so pages survive losing their
/// original page tree.
fn flatten_inheritance(doc: &mut Document, pages: &[ObjectId]) {
    for &page_id in pages {
        let missing: Vec<(&[u8], Object)> = INHERITABLE
            .iter()
            .filter(|key| {
                doc.get_dictionary(page_id)
                    .is_ok_and(|page| page.get(key).is_err())
            })
            .filter_map(|key| inherited(doc, page_id, key).map(|value| (*key, value)))
            .collect();

        if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
            for (key, value) in missing {
                page.set(key, value);
            }
        }
    }
}

/// Import the first page of `stamp_path` into `doc` as a Form XObject.
fn import_stamp(doc: &mut Document, stamp_path: &Path) -> Result<ObjectId> {
    let mut stamp = load(stamp_path)?;
    stamp.renumber_objects_with(doc.max_id + 1);

    let page_id = stamp
        .get_pages()
        .into_values()
        .next()
        .ok_or_else(|| pdf_error(stamp_path, "Watermark PDF has no pages"))?;

    let content = stamp
        .get_page_content(page_id)
        .map_err(|e| pdf_error(stamp_path, e))?;
    let resources = inherited(&stamp, page_id, b"Resources")
        .unwrap_or_else(|| Object::Dictionary(Dictionary::new()));
    let bbox = inherited(&stamp, page_id, b"MediaBox").unwrap_or_else(|| {
        Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()])
    });

    let stamp_max = stamp.max_id;
    for (id, object) in stamp.objects {
        if !is_page_tree(&object) {
            doc.objects.insert(id, object);
        }
    }
    doc.max_id = doc.max_id.max(stamp_max);

    let form = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => bbox,
            "Resources" => resources,
        },
        content,
    );
    Ok(doc.add_object(form))
}

impl PdfBackend for LopdfBackend {
    fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        if inputs.is_empty() {
            return Err(FpError::NoInput {
                message: "No PDFs to merge".to_string(),
            });
        }

        let mut merged = Document::with_version("1.5");
        let mut next_id = 1;
        let mut kids: Vec<ObjectId> = Vec::new();

        for path in inputs {
            let mut doc = load(path)?;
            doc.renumber_objects_with(next_id);
            next_id = doc.max_id + 1;

            let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
            flatten_inheritance(&mut doc, &pages);
            debug!(path = %path.display(), pages = pages.len(), "Merging PDF");

            for (id, object) in doc.objects {
                if matches!(type_of(&object), Some(b"Catalog" | b"Pages")) {
                    continue;
                }
                merged.objects.insert(id, object);
            }
            kids.extend(pages);
        }

        merged.max_id = next_id - 1;
        let pages_id = merged.new_object_id();
        for &kid in &kids {
            if let Ok(page) = merged.get_object_mut(kid).and_then(Object::as_dict_mut) {
                page.set("Parent", pages_id);
            }
        }

        let count = kids.len() as i64;
        merged.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids.into_iter().map(Object::Reference).collect::<Vec<_>>(),
                "Count" => count,
            }),
        );
        let catalog_id = merged.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        merged.trailer.set("Root", catalog_id);

        save(&mut merged, output)
    }

    fn overlay(&self, input: &Path, stamp: &Path, output: &Path) -> Result<()> {
        let mut doc = load(input)?;
        let form_id = import_stamp(&mut doc, stamp)?;
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();

        // Isolate the original content's graphics state from the stamp.
        let open = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let close = doc.add_object(Stream::new(
            Dictionary::new(),
            format!("\nQ\nq /{} Do Q\n", STAMP_NAME).into_bytes(),
        ));

        for page_id in pages {
            let mut resources = owned_dict(&doc, inherited(&doc, page_id, b"Resources"));
            let mut xobjects = owned_dict(&doc, resources.get(b"XObject").ok().cloned());
            xobjects.set(STAMP_NAME, form_id);
            resources.set("XObject", xobjects);

            let mut contents = vec![Object::Reference(open)];
            match doc.get_dictionary(page_id).ok().and_then(|p| p.get(b"Contents").ok()) {
                Some(Object::Array(parts)) => contents.extend(parts.iter().cloned()),
                Some(Object::Reference(id)) => match doc.get_object(*id) {
                    Ok(Object::Array(parts)) => contents.extend(parts.iter().cloned()),
                    _ => contents.push(Object::Reference(*id)),
                },
                _ => {}
            }
            contents.push(Object::Reference(close));

            let page = doc
                .get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .map_err(|e| pdf_error(input, e))?;
            page.set("Resources", resources);
            page.set("Contents", contents);
        }

        save(&mut doc, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Write a PDF with `pages` pages whose resources live on the page tree.
    fn write_pdf(path: &Path, pages: usize) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids: Vec<Object> = Vec::new();
        for _ in 0..pages {
            let content_id = doc.add_object(Stream::new(
                Dictionary::new(),
                b"0 0 m 10 10 l S".to_vec(),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
                "MediaBox" => vec![0.into(), 0.into(), 100.into(), 100.into()],
                "Resources" => Dictionary::new(),
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_merge_concatenates_pages() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        let b = dir.path().join("b.pdf");
        write_pdf(&a, 2);
        write_pdf(&b, 3);
        let output = dir.path().join("merged_file.pdf");

        LopdfBackend.merge(&[a, b], &output).unwrap();

        let merged = Document::load(&output).unwrap();
        let pages = merged.get_pages();
        assert_eq!(pages.len(), 5);
        for page_id in pages.values() {
            assert!(inherited(&merged, *page_id, b"MediaBox").is_some());
        }
    }

    #[test]
    fn test_merge_empty_is_no_input() {
        let dir = tempdir().unwrap();
        let result = LopdfBackend.merge(&[], &dir.path().join("out.pdf"));
        assert!(matches!(result, Err(FpError::NoInput { .. })));
    }

    #[test]
    fn test_merge_invalid_pdf() {
        let dir = tempdir().unwrap();
        let broken = dir.path().join("broken.pdf");
        std::fs::write(&broken, b"not a pdf").unwrap();

        let result = LopdfBackend.merge(&[broken], &dir.path().join("out.pdf"));
        assert!(matches!(result, Err(FpError::Pdf { .. })));
    }

    #[test]
    fn test_overlay_stamps_every_page() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("doc.pdf");
        let stamp = dir.path().join("stamp.pdf");
        write_pdf(&input, 3);
        write_pdf(&stamp, 1);
        let output = dir.path().join("watermarked_doc.pdf");

        LopdfBackend.overlay(&input, &stamp, &output).unwrap();

        let doc = Document::load(&output).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 3);
        for page_id in pages.values() {
            let resources = owned_dict(&doc, inherited(&doc, *page_id, b"Resources"));
            let xobjects = owned_dict(&doc, resources.get(b"XObject").ok().cloned());
            assert!(xobjects.has(STAMP_NAME.as_bytes()));

            let content = doc.get_page_content(*page_id).unwrap();
            let text = String::from_utf8_lossy(&content);
            assert!(text.contains("/FpWatermark0 Do"), "{}", text);
            assert!(text.contains("10 10 l"), "{}", text);
        }
    }

    #[test]
    fn test_overlay_missing_stamp() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("doc.pdf");
        write_pdf(&input, 1);

        let result = LopdfBackend.overlay(
            &input,
            &dir.path().join("missing.pdf"),
            &dir.path().join("out.pdf"),
        );
        assert!(matches!(result, Err(FpError::Pdf { .. })));
    }
}
