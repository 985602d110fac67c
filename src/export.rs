//! Crop export.
//!
//! Each committed box is mapped from display space onto native pixels with
//! the image's fixed fit ratio, cropped, encoded as an independent JPEG and
//! stored in one ZIP archive. The current pan/zoom plays no part: the box
//! coordinates were already normalized to image space when captured.
//!
//! Encodes run in parallel on native targets. Archive assembly waits for all
//! of them, then writes entries in box insertion order.

use std::io::{Cursor, Write};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage, imageops};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::constants::{
    CROP_ENTRY_EXTENSION, CROP_ENTRY_PREFIX, DEFAULT_ARCHIVE_NAME, DEFAULT_JPEG_QUALITY,
};
use crate::error::{AnnotatorError, Result};
use crate::image_data::LoadedImage;
use crate::model::BoundingBox;

/// Export settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Download name of the archive
    pub archive_name: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
        }
    }
}

/// Native-pixel rectangle to cut out for one box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    /// 1-based position of the box in insertion order
    pub index: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// Archive entry name for this crop.
    pub fn entry_name(&self) -> String {
        crop_entry_name(self.index)
    }
}

/// Archive entry name for the crop of the box at 1-based `index`.
pub fn crop_entry_name(index: usize) -> String {
    format!("{}{}.{}", CROP_ENTRY_PREFIX, index, CROP_ENTRY_EXTENSION)
}

/// A finished archive ready to be offered as a download.
#[derive(Debug, Clone)]
pub struct ExportArchive {
    /// Download file name
    pub name: String,
    /// ZIP bytes
    pub bytes: Vec<u8>,
    /// Entry names in archive order
    pub entries: Vec<String>,
    /// Boxes that produced no crop
    pub warnings: Vec<String>,
    /// Image generation the archive was built from
    pub generation: u64,
}

impl ExportArchive {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Map a box onto native pixels, clipped to the image.
///
/// Returns `None` if nothing of the box lies inside the image.
pub fn crop_region(index: usize, bbox: &BoundingBox, image: &LoadedImage) -> Option<CropRegion> {
    let (to_original_x, to_original_y) = image.display_to_original();
    let native = bbox.normalized().scaled(to_original_x, to_original_y);

    let max_w = image.original_width() as f32;
    let max_h = image.original_height() as f32;
    let x0 = native.x.round().clamp(0.0, max_w);
    let y0 = native.y.round().clamp(0.0, max_h);
    let x1 = (native.x + native.width).round().clamp(0.0, max_w);
    let y1 = (native.y + native.height).round().clamp(0.0, max_h);

    // NaN coordinates fail both comparisons and land here too.
    if !(x1 > x0 && y1 > y0) {
        return None;
    }

    Some(CropRegion {
        index,
        x: x0 as u32,
        y: y0 as u32,
        width: (x1 - x0) as u32,
        height: (y1 - y0) as u32,
    })
}

/// Cut out and JPEG-encode a single region.
pub fn encode_crop(pixels: &RgbaImage, region: &CropRegion, quality: u8) -> Result<Vec<u8>> {
    let crop =
        imageops::crop_imm(pixels, region.x, region.y, region.width, region.height).to_image();
    // JPEG carries no alpha channel.
    let rgb = DynamicImage::ImageRgba8(crop).to_rgb8();

    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    encoder
        .encode_image(&rgb)
        .map_err(|e| AnnotatorError::encode(region.index, e))?;
    Ok(bytes)
}

/// Number of encoder threads to use for `regions` crops.
#[cfg(not(target_arch = "wasm32"))]
fn encoder_threads(regions: usize) -> usize {
    std::thread::available_parallelism()
        .map_or(1, |n| n.get())
        .min(regions)
        .max(1)
}

/// Encode every region on at most `workers` threads, returning results in
/// region order.
#[cfg(not(target_arch = "wasm32"))]
fn encode_all(
    pixels: &RgbaImage,
    regions: &[CropRegion],
    quality: u8,
    workers: usize,
) -> Result<Vec<Result<Vec<u8>>>> {
    if regions.is_empty() {
        return Ok(Vec::new());
    }
    let chunk_size = regions.len().div_ceil(workers.max(1));

    std::thread::scope(|scope| {
        let mut handles = Vec::new();
        for (i, chunk) in regions.chunks(chunk_size).enumerate() {
            let handle = std::thread::Builder::new()
                .name(format!("crop-encoder-{}", i))
                .spawn_scoped(scope, move || {
                    chunk
                        .iter()
                        .map(|region| encode_crop(pixels, region, quality))
                        .collect::<Vec<_>>()
                })
                .map_err(AnnotatorError::Worker)?;
            handles.push(handle);
        }

        // Chunks are contiguous, so joining in spawn order keeps region order.
        let mut results = Vec::with_capacity(regions.len());
        for handle in handles {
            let chunk = handle
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            results.extend(chunk);
        }
        Ok(results)
    })
}

/// Encode every region, returning results in region order.
#[cfg(target_arch = "wasm32")]
fn encode_all(
    pixels: &RgbaImage,
    regions: &[CropRegion],
    quality: u8,
    _workers: usize,
) -> Result<Vec<Result<Vec<u8>>>> {
    Ok(regions
        .iter()
        .map(|region| encode_crop(pixels, region, quality))
        .collect())
}

#[cfg(target_arch = "wasm32")]
fn encoder_threads(_regions: usize) -> usize {
    1
}

/// Write encoded crops into an in-memory ZIP, in the order given.
pub fn write_archive(crops: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    // JPEG data is already compressed.
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    for (name, bytes) in crops {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(bytes)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Crop, encode and archive every box.
///
/// Boxes that fall entirely outside the image are skipped with a warning;
/// the other entries keep their box's 1-based index in their name. Fails with
/// [`AnnotatorError::NothingToExport`] if no box leaves a crop, so an empty
/// archive is never produced.
pub fn export_all(
    image: &LoadedImage,
    boxes: &[BoundingBox],
    options: &ExportOptions,
    generation: u64,
) -> Result<ExportArchive> {
    if boxes.is_empty() {
        return Err(AnnotatorError::NothingToExport);
    }

    let start = web_time::Instant::now();
    let mut warnings = Vec::new();
    let mut regions = Vec::with_capacity(boxes.len());

    for (i, bbox) in boxes.iter().enumerate() {
        let index = i + 1;
        match crop_region(index, bbox, image) {
            Some(region) => regions.push(region),
            None => {
                let warning = format!("Box #{} lies outside the image and was skipped", index);
                log::warn!("⚠️ {}", warning);
                warnings.push(warning);
            }
        }
    }

    if regions.is_empty() {
        return Err(AnnotatorError::NothingToExport);
    }

    // Barrier: every encode finishes before the archive is assembled.
    let encoded = encode_all(
        image.pixels(),
        &regions,
        options.jpeg_quality,
        encoder_threads(regions.len()),
    )?;

    let mut crops = Vec::with_capacity(regions.len());
    for (region, result) in regions.iter().zip(encoded) {
        crops.push((region.entry_name(), result?));
    }

    let bytes = write_archive(&crops)?;
    let entries: Vec<String> = crops.into_iter().map(|(name, _)| name).collect();

    log::info!(
        "📦 Exported {} crops to '{}' ({} bytes) in {:.1?}",
        entries.len(),
        options.archive_name,
        bytes.len(),
        start.elapsed()
    );

    Ok(ExportArchive {
        name: options.archive_name.clone(),
        bytes,
        entries,
        warnings,
        generation,
    })
}
