//! Watermark command implementation.
//!
//! Stamps every image in a directory with an image and/or text watermark,
//! writing `watermarked_<name>` next to each original.

use std::path::{Path, PathBuf};

use chrono::Local;
use clap::{ArgAction, Args};
use serde::{Deserialize, Serialize};

use crate::batch::run_watermark;
use crate::discovery::Manifest;
use crate::error::Result;
use crate::output::plural;
use crate::pdf::LopdfBackend;
use crate::request::LastRequest;
use crate::types::{AnchorPosition, BatchOutcome, WatermarkSpec};

use super::{Context, ScanParams};

/// Watermark every image in a directory
#[derive(Args, Debug)]
pub struct WatermarkArgs {
    /// Directory containing the files to watermark
    pub directory: PathBuf,

    #[command(flatten)]
    pub params: WatermarkParams,
}

/// Watermark options. Unset values fall back to fileproc.yaml.
#[derive(Args, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkParams {
    /// Watermark image (PNG/JPEG/WebP, or PDF for PDF inputs)
    #[arg(short, long)]
    pub watermark: Option<PathBuf>,

    /// Watermark text
    #[arg(short, long)]
    pub text: Option<String>,

    /// Append today's date (YYYY-MM-DD) to the text
    #[arg(long, action = ArgAction::Set)]
    pub include_date: Option<bool>,

    /// Anchor of the watermark image
    #[arg(long, value_enum)]
    pub image_position: Option<AnchorPosition>,

    /// Anchor of the text; overrides --same-position
    #[arg(long, value_enum)]
    pub text_position: Option<AnchorPosition>,

    /// Put the text at the image anchor
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    pub same_position: bool,

    /// Watermark size as a percentage of the image size
    #[arg(short, long)]
    pub size: Option<u32>,

    /// Watermark opacity, 0 (invisible) to 255 (unchanged)
    #[arg(long)]
    pub transparency: Option<u32>,

    /// Fade the watermark towards its edges
    #[arg(long)]
    pub soft_edge: Option<bool>,

    /// TrueType/OpenType font for the text
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Font size in pixels
    #[arg(long)]
    pub font_size: Option<u32>,

    /// Worker threads
    #[arg(short, long)]
    pub jobs: Option<usize>,

    #[command(flatten)]
    pub scan: ScanParams,
}

impl Default for WatermarkParams {
    fn default() -> Self {
        Self {
            watermark: None,
            text: None,
            include_date: None,
            image_position: None,
            text_position: None,
            same_position: true,
            size: None,
            transparency: None,
            soft_edge: None,
            font: None,
            font_size: None,
            jobs: None,
            scan: ScanParams::default(),
        }
    }
}

impl WatermarkParams {
    /// Resolve against the manifest defaults.
    pub fn to_spec(&self, manifest: &Manifest) -> Result<WatermarkSpec> {
        let defaults = &manifest.watermark;
        let image_position = self.image_position.unwrap_or(defaults.position);
        let text_position = match (self.text_position, self.same_position) {
            (Some(position), _) => position,
            (None, true) => image_position,
            (None, false) => defaults.position,
        };

        WatermarkSpec::builder()
            .watermark(self.watermark.clone())
            .text(self.text.clone())
            .include_date(self.include_date.unwrap_or(defaults.include_date))
            .image_position(image_position)
            .text_position(Some(text_position))
            .size_pct(self.size.unwrap_or(defaults.size))
            .transparency(self.transparency.unwrap_or(defaults.transparency))
            .soft_edge(self.soft_edge.unwrap_or(defaults.soft_edge))
            .font(self.font.clone().or_else(|| defaults.font.clone()))
            .font_size(self.font_size.unwrap_or(defaults.font_size))
            .build()
    }

    fn jobs(&self, manifest: &Manifest) -> usize {
        self.jobs.unwrap_or(manifest.jobs).max(1)
    }
}

/// Run a watermark batch without recording it.
pub fn execute(directory: &Path, params: &WatermarkParams, ctx: &Context) -> Result<BatchOutcome> {
    let spec = params.to_spec(&ctx.manifest)?;
    let files = ctx.scan(directory, &params.scan)?;
    let jobs = params.jobs(&ctx.manifest);

    if jobs > 1 {
        ctx.printer
            .info("Watermarking", &format!("using {}", plural(jobs, "worker", "workers")));
    }
    let today = Local::now().date_naive();
    let outcome = run_watermark(&files, &spec, &LopdfBackend, jobs, today);
    ctx.report(outcome, directory);
    Ok(outcome)
}

pub fn run(args: WatermarkArgs, ctx: &Context) -> Result<BatchOutcome> {
    ctx.remember(&LastRequest::ApplyWatermark {
        directory: args.directory.clone(),
        params: args.params.clone(),
    });
    execute(&args.directory, &args.params, ctx)
}
