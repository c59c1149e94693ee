//! Batch runner.
//!
//! Drives the merge, watermark and metadata operations over a sorted file
//! list. Per-file errors are logged with the file's metadata and never
//! stop the rest of the batch; the entry points report only a
//! [`BatchOutcome`].

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, error, info, warn};

use crate::discovery::{
    classify, write_metadata_json, FileKind, FileMetadata, MERGED_PDF_FILENAME,
};
use crate::error::{FpError, Result};
use crate::pdf::PdfBackend;
use crate::render::{
    compose, merge_images, open_image, save_rgb, save_rgba, watermarked_path, Mark,
    WatermarkAssets,
};
use crate::types::{BatchOutcome, BatchTally, MergeSpec, WatermarkSpec};

/// Result of processing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileResult {
    /// Output written to the given path.
    Written(PathBuf),
    /// File type not handled by the operation.
    Skipped,
}

fn log_failure(path: &Path, err: &FpError) {
    error!(
        path = %path.display(),
        metadata = %FileMetadata::describe(path),
        "{}",
        err
    );
}

/// Watermark a single file.
///
/// Images go through the compositor; PDFs are stamped through `backend`
/// and only when the watermark itself is a PDF.
pub fn watermark_file(
    path: &Path,
    spec: &WatermarkSpec,
    assets: &WatermarkAssets,
    backend: &dyn PdfBackend,
    today: NaiveDate,
) -> Result<FileResult> {
    let output = watermarked_path(path);

    match classify(path) {
        FileKind::Image => {
            let base = open_image(path)?;
            let marked = compose(&base, spec, assets, today)?;
            save_rgba(&marked, &output)?;
        }
        FileKind::Pdf => match &assets.mark {
            Mark::Pdf(stamp) => backend.overlay(path, stamp, &output)?,
            _ => {
                return Err(FpError::MissingResource {
                    path: path.to_path_buf(),
                    message: "PDF files can only be watermarked with a PDF watermark".to_string(),
                    help: Some("Pass a .pdf file as the watermark".to_string()),
                })
            }
        },
        FileKind::Unsupported => {
            info!(path = %path.display(), "Skipping unsupported file type");
            return Ok(FileResult::Skipped);
        }
    }

    info!(
        path = %path.display(),
        output = %output.display(),
        "Watermark applied"
    );
    Ok(FileResult::Written(output))
}

/// Fold per-file results into a tally, logging failures.
fn fold_results(files: &[PathBuf], results: Vec<Result<FileResult>>) -> BatchTally {
    let mut tally = BatchTally::new();
    for (path, result) in files.iter().zip(results) {
        match result {
            Ok(FileResult::Written(_)) => tally.record_success(),
            Ok(FileResult::Skipped) => tally.record_skip(),
            Err(e) => {
                log_failure(path, &e);
                tally.record_failure();
            }
        }
    }
    tally
}

/// Watermark every file in `files`.
///
/// With `jobs > 1` files are processed on a dedicated thread pool; results
/// are still folded in path order.
pub fn run_watermark(
    files: &[PathBuf],
    spec: &WatermarkSpec,
    backend: &dyn PdfBackend,
    jobs: usize,
    today: NaiveDate,
) -> BatchOutcome {
    if files.is_empty() {
        error!("No files found to process");
        return BatchOutcome::FAILURE;
    }

    let assets = match WatermarkAssets::load(spec) {
        Ok(assets) => assets,
        Err(e) => {
            error!("{}", e);
            return BatchOutcome::FAILURE;
        }
    };
    debug!(?spec, files = files.len(), jobs, "Starting watermark batch");

    let process = |path: &PathBuf| watermark_file(path, spec, &assets, backend, today);

    let results: Vec<Result<FileResult>> = if jobs > 1 {
        match ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => pool.install(|| files.par_iter().map(process).collect()),
            Err(e) => {
                warn!(error = %e, "Could not start worker pool, running sequentially");
                files.iter().map(process).collect()
            }
        }
    } else {
        files.iter().map(process).collect()
    };

    let tally = fold_results(files, results);
    info!(
        eligible = tally.eligible(),
        succeeded = tally.succeeded,
        failed = tally.failed,
        skipped = tally.skipped,
        "Watermark batch finished"
    );
    tally.outcome()
}

fn merge_raster(dir: &Path, images: &[&PathBuf], spec: &MergeSpec) -> Result<PathBuf> {
    let decoded = images
        .iter()
        .map(|path| open_image(path))
        .collect::<Result<Vec<_>>>()?;

    let canvas = merge_images(&decoded, spec)?;
    let output = dir.join(spec.output_name());
    save_rgb(&canvas, &output, spec.format.image_format())?;
    Ok(output)
}

/// Merge the images in `files` into one grid image and the PDFs into one
/// document, both written to `dir`.
///
/// Each merge is all-or-nothing. When both kinds are present and only one
/// merge succeeds the outcome is partial.
pub fn run_merge(
    dir: &Path,
    files: &[PathBuf],
    spec: &MergeSpec,
    backend: &dyn PdfBackend,
) -> BatchOutcome {
    let images: Vec<&PathBuf> = files
        .iter()
        .filter(|f| classify(f) == FileKind::Image)
        .collect();
    let pdfs: Vec<PathBuf> = files
        .iter()
        .filter(|f| classify(f) == FileKind::Pdf)
        .cloned()
        .collect();

    if images.is_empty() && pdfs.is_empty() {
        error!(dir = %dir.display(), "No images found to merge");
        return BatchOutcome::FAILURE;
    }

    let mut tally = BatchTally::new();

    if !images.is_empty() {
        debug!(count = images.len(), ?spec, "Merging images");
        match merge_raster(dir, &images, spec) {
            Ok(output) => {
                info!(output = %output.display(), "Merged image saved");
                tally.record_success();
            }
            Err(e) => {
                error!(dir = %dir.display(), "Error merging images: {}", e);
                tally.record_failure();
            }
        }
    }

    if !pdfs.is_empty() {
        let output = dir.join(MERGED_PDF_FILENAME);
        match backend.merge(&pdfs, &output) {
            Ok(()) => {
                info!(output = %output.display(), count = pdfs.len(), "Merged PDF saved");
                tally.record_success();
            }
            Err(e) => {
                error!(dir = %dir.display(), "Error merging PDFs: {}", e);
                tally.record_failure();
            }
        }
    }

    tally.outcome()
}

/// Write `metadata.json` describing every file in `files` into `dir`.
pub fn run_metadata(dir: &Path, files: &[PathBuf]) -> BatchOutcome {
    if files.is_empty() {
        error!(dir = %dir.display(), "No files found to describe");
        return BatchOutcome::FAILURE;
    }

    let mut tally = BatchTally::new();
    let mut records = Vec::with_capacity(files.len());
    for path in files {
        match FileMetadata::read(path) {
            Ok(record) => {
                records.push(record);
                tally.record_success();
            }
            Err(e) => {
                error!(path = %path.display(), "{}", e);
                tally.record_failure();
            }
        }
    }

    match write_metadata_json(dir, &records) {
        Ok(output) => {
            info!(output = %output.display(), records = records.len(), "Metadata written");
            tally.outcome()
        }
        Err(e) => {
            error!("{}", e);
            BatchOutcome::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnchorPosition, FillPolicy, GridShape};
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Records calls instead of touching PDFs.
    #[derive(Default)]
    struct MockPdf {
        fail: bool,
        calls: Mutex<Vec<String>>,
    }

    impl PdfBackend for MockPdf {
        fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("merge {} -> {}", inputs.len(), output.display()));
            if self.fail {
                return Err(FpError::Pdf {
                    path: output.to_path_buf(),
                    message: "mock failure".to_string(),
                });
            }
            Ok(())
        }

        fn overlay(&self, input: &Path, _stamp: &Path, output: &Path) -> Result<()> {
            self.calls.lock().unwrap().push(format!(
                "overlay {}",
                input.file_name().unwrap().to_string_lossy()
            ));
            fs::write(output, b"%PDF-mock").unwrap();
            Ok(())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
    }

    fn write_png(path: &Path, w: u32, h: u32, rgb: [u8; 3]) {
        RgbImage::from_pixel(w, h, Rgb(rgb)).save(path).unwrap();
    }

    fn text_spec() -> WatermarkSpec {
        WatermarkSpec::builder()
            .text(Some("(c) test".to_string()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_watermark_one_failure_is_partial() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        let c = dir.path().join("c.png");
        write_png(&a, 200, 100, [0, 0, 0]);
        fs::write(&b, b"corrupt").unwrap();
        write_png(&c, 200, 100, [0, 0, 0]);

        let outcome = run_watermark(
            &[a, b, c],
            &text_spec(),
            &MockPdf::default(),
            1,
            today(),
        );

        assert_eq!(outcome, BatchOutcome::PARTIAL);
        assert!(dir.path().join("watermarked_a.png").exists());
        assert!(!dir.path().join("watermarked_b.png").exists());
        assert!(dir.path().join("watermarked_c.png").exists());
    }

    #[test]
    fn test_watermark_zero_files_is_failure() {
        let outcome = run_watermark(&[], &text_spec(), &MockPdf::default(), 1, today());
        assert_eq!(outcome, BatchOutcome::FAILURE);
    }

    #[test]
    fn test_watermark_all_ok_is_success() {
        let dir = tempdir().unwrap();
        let files: Vec<PathBuf> = (0..3)
            .map(|i| {
                let path = dir.path().join(format!("{}.png", i));
                write_png(&path, 120, 80, [10, 20, 30]);
                path
            })
            .collect();

        let outcome = run_watermark(&files, &text_spec(), &MockPdf::default(), 1, today());

        assert_eq!(outcome, BatchOutcome::SUCCESS);
        for i in 0..3 {
            assert!(dir.path().join(format!("watermarked_{}.png", i)).exists());
        }
    }

    #[test]
    fn test_watermark_parallel_matches_sequential() {
        let dir = tempdir().unwrap();
        let mut files = Vec::new();
        for i in 0..6 {
            let path = dir.path().join(format!("{}.png", i));
            if i == 2 {
                fs::write(&path, b"corrupt").unwrap();
            } else {
                write_png(&path, 64, 64, [200, 0, 0]);
            }
            files.push(path);
        }

        let outcome = run_watermark(&files, &text_spec(), &MockPdf::default(), 4, today());
        assert_eq!(outcome, BatchOutcome::PARTIAL);
    }

    #[test]
    fn test_watermark_all_failed_is_failure() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.png");
        fs::write(&a, b"corrupt").unwrap();

        let outcome = run_watermark(&[a], &text_spec(), &MockPdf::default(), 1, today());
        assert_eq!(outcome, BatchOutcome::FAILURE);
    }

    #[test]
    fn test_watermark_skips_unsupported() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.png");
        let notes = dir.path().join("notes.txt");
        write_png(&a, 50, 50, [0, 0, 0]);
        fs::write(&notes, b"hello").unwrap();

        let outcome = run_watermark(&[a, notes], &text_spec(), &MockPdf::default(), 1, today());

        assert_eq!(outcome, BatchOutcome::SUCCESS);
        assert!(!dir.path().join("watermarked_notes.txt").exists());
    }

    #[test]
    fn test_watermark_missing_watermark_file_is_failure() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.png");
        write_png(&a, 50, 50, [0, 0, 0]);
        let spec = WatermarkSpec::builder()
            .watermark(Some(dir.path().join("missing.png")))
            .build()
            .unwrap();

        let outcome = run_watermark(&[a], &spec, &MockPdf::default(), 1, today());
        assert_eq!(outcome, BatchOutcome::FAILURE);
    }

    #[test]
    fn test_watermark_pdf_uses_backend() {
        let dir = tempdir().unwrap();
        let stamp = dir.path().join("stamp.pdf");
        let doc = dir.path().join("doc.pdf");
        fs::write(&stamp, b"%PDF").unwrap();
        fs::write(&doc, b"%PDF").unwrap();

        let spec = WatermarkSpec::builder()
            .watermark(Some(stamp))
            .build()
            .unwrap();
        let backend = MockPdf::default();

        let outcome = run_watermark(&[doc], &spec, &backend, 1, today());

        assert_eq!(outcome, BatchOutcome::SUCCESS);
        assert_eq!(*backend.calls.lock().unwrap(), vec!["overlay doc.pdf".to_string()]);
        assert!(dir.path().join("watermarked_doc.pdf").exists());
    }

    #[test]
    fn test_watermark_pdf_with_raster_mark_fails() {
        let dir = tempdir().unwrap();
        let mark = dir.path().join("mark.png");
        let doc = dir.path().join("doc.pdf");
        let photo = dir.path().join("photo.png");
        write_png(&mark, 10, 10, [255, 255, 255]);
        write_png(&photo, 100, 100, [0, 0, 0]);
        fs::write(&doc, b"%PDF").unwrap();

        let spec = WatermarkSpec::builder()
            .watermark(Some(mark))
            .image_position(AnchorPosition::MiddleCenter)
            .build()
            .unwrap();
        let backend = MockPdf::default();

        let outcome = run_watermark(&[doc, photo], &spec, &backend, 1, today());

        assert_eq!(outcome, BatchOutcome::PARTIAL);
        assert!(backend.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_watermark_file_writes_alongside_original() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        RgbImage::from_pixel(100, 60, Rgb([0, 0, 0]))
            .save(&path)
            .unwrap();
        let spec = text_spec();
        let assets = WatermarkAssets::load(&spec).unwrap();

        let result = watermark_file(&path, &spec, &assets, &MockPdf::default(), today()).unwrap();

        let output = dir.path().join("watermarked_photo.jpg");
        assert_eq!(result, FileResult::Written(output.clone()));
        let written = image::open(&output).unwrap();
        assert_eq!((written.width(), written.height()), (100, 60));
        assert!(!written.color().has_alpha());
    }

    fn merge_spec(rows: u32, fill: FillPolicy) -> MergeSpec {
        MergeSpec::new(GridShape::Rows(rows), fill).unwrap()
    }

    #[test]
    fn test_merge_writes_grid() {
        let dir = tempdir().unwrap();
        write_png(&dir.path().join("a.png"), 10, 10, [255, 0, 0]);
        write_png(&dir.path().join("b.png"), 10, 10, [0, 255, 0]);
        write_png(&dir.path().join("c.png"), 10, 10, [0, 0, 255]);
        let files: Vec<PathBuf> = ["a.png", "b.png", "c.png"]
            .iter()
            .map(|n| dir.path().join(n))
            .collect();

        let spec = merge_spec(1, FillPolicy::Leave).with_format(crate::types::OutputFormat::Png);
        let outcome = run_merge(dir.path(), &files, &spec, &MockPdf::default());

        assert_eq!(outcome, BatchOutcome::SUCCESS);
        let merged = image::open(dir.path().join("merged_image.png")).unwrap().to_rgb8();
        assert_eq!(merged.dimensions(), (30, 10));
        assert_eq!(merged.get_pixel(15, 5).0, [0, 255, 0]);
    }

    #[test]
    fn test_merge_decode_failure_aborts() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        write_png(&a, 10, 10, [255, 0, 0]);
        fs::write(&b, b"corrupt").unwrap();

        let outcome = run_merge(
            dir.path(),
            &[a, b],
            &merge_spec(1, FillPolicy::Stretch),
            &MockPdf::default(),
        );

        assert_eq!(outcome, BatchOutcome::FAILURE);
        assert!(!dir.path().join("merged_image.jpg").exists());
    }

    #[test]
    fn test_merge_without_images_is_failure() {
        let dir = tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        fs::write(&notes, b"hello").unwrap();

        let outcome = run_merge(
            dir.path(),
            &[notes],
            &merge_spec(1, FillPolicy::Stretch),
            &MockPdf::default(),
        );
        assert_eq!(outcome, BatchOutcome::FAILURE);
    }

    #[test]
    fn test_merge_pdf_failure_with_images_is_partial() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.png");
        let doc = dir.path().join("doc.pdf");
        write_png(&a, 10, 10, [255, 0, 0]);
        fs::write(&doc, b"%PDF").unwrap();
        let backend = MockPdf {
            fail: true,
            ..Default::default()
        };

        let outcome = run_merge(
            dir.path(),
            &[a, doc],
            &merge_spec(1, FillPolicy::Stretch),
            &backend,
        );

        assert_eq!(outcome, BatchOutcome::PARTIAL);
        assert!(dir.path().join("merged_image.jpg").exists());
        assert_eq!(backend.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_metadata_written() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.txt");
        fs::write(&a, b"12").unwrap();
        fs::write(&b, b"1234").unwrap();

        let outcome = run_metadata(dir.path(), &[a, b]);

        assert_eq!(outcome, BatchOutcome::SUCCESS);
        let records: Vec<FileMetadata> = serde_json::from_str(
            &fs::read_to_string(dir.path().join("metadata.json")).unwrap(),
        )
        .unwrap();
        let sizes: Vec<u64> = records.iter().map(|r| r.size).collect();
        assert_eq!(sizes, vec![2, 4]);
    }

    #[test]
    fn test_metadata_missing_file_is_partial() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.png");
        fs::write(&a, b"12").unwrap();

        let outcome = run_metadata(dir.path(), &[a, dir.path().join("gone.png")]);
        assert_eq!(outcome, BatchOutcome::PARTIAL);
    }

    #[test]
    fn test_metadata_no_files_is_failure() {
        let dir = tempdir().unwrap();
        assert_eq!(run_metadata(dir.path(), &[]), BatchOutcome::FAILURE);
    }

    #[test]
    fn test_transparent_png_survives_watermark() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clear.png");
        RgbaImage::from_pixel(40, 40, Rgba([0, 0, 0, 0]))
            .save(&path)
            .unwrap();
        let spec = WatermarkSpec::builder().build().unwrap();

        let outcome = run_watermark(&[path], &spec, &MockPdf::default(), 1, today());

        assert_eq!(outcome, BatchOutcome::SUCCESS);
        let out = image::open(dir.path().join("watermarked_clear.png"))
            .unwrap()
            .to_rgba8();
        assert_eq!(out.get_pixel(20, 20).0, [0, 0, 0, 0]);
    }
}
