use anyhow::{Context, Result, bail};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use log::debug;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Preferred cell width; the cell height follows the frame's aspect ratio.
pub const CELL_WIDTH: u32 = 320;
/// Cells are never shorter than this; very wide frames grow the width instead.
pub const MIN_CELL_HEIGHT: u32 = 180;
pub const JPEG_QUALITY: u8 = 85;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub columns: u32,
    pub rows: u32,
    pub cell_width: u32,
    pub cell_height: u32,
}

impl GridLayout {
    /// Sizes the cells from the native frame size, integer arithmetic throughout.
    pub fn for_frame(columns: u32, rows: u32, frame_width: u32, frame_height: u32) -> Result<Self> {
        if columns == 0 || rows == 0 {
            bail!("grid must have at least one column and one row");
        }
        if frame_width == 0 || frame_height == 0 {
            bail!("frame has no size ({frame_width}x{frame_height})");
        }

        let (frame_width, frame_height) = (u64::from(frame_width), u64::from(frame_height));
        let mut cell_width = u64::from(CELL_WIDTH);
        let mut cell_height = cell_width * frame_height / frame_width;
        if cell_height < u64::from(MIN_CELL_HEIGHT) {
            cell_height = u64::from(MIN_CELL_HEIGHT);
            cell_width = cell_height * frame_width / frame_height;
        }

        Ok(Self {
            columns,
            rows,
            cell_width: u32::try_from(cell_width.max(1)).context("cell width out of range")?,
            cell_height: u32::try_from(cell_height).context("cell height out of range")?,
        })
    }

    #[must_use]
    pub const fn canvas_size(&self) -> (u32, u32) {
        (self.cell_width * self.columns, self.cell_height * self.rows)
    }

    /// Row-major: index 0 is top-left, `columns` starts the second row.
    #[must_use]
    pub const fn cell_origin(&self, index: u32) -> (u32, u32) {
        let column = index % self.columns;
        let row = index / self.columns;
        (column * self.cell_width, row * self.cell_height)
    }
}

/// Draws `frames` into a `columns` x `rows` sheet and writes it as JPEG.
///
/// The number of frames must match the number of cells exactly; the check runs
/// before anything is decoded or written.
pub fn create_contact_sheet(
    frames: &[PathBuf],
    output_path: &Path,
    columns: u32,
    rows: u32,
) -> Result<GridLayout> {
    let expected = u64::from(columns) * u64::from(rows);
    if u64::try_from(frames.len()).ok() != Some(expected) {
        bail!(
            "frame count mismatch: grid {columns}x{rows} needs {expected}, got {}",
            frames.len()
        );
    }

    let first = open_frame(&frames[0])?;
    let layout = GridLayout::for_frame(columns, rows, first.width(), first.height())?;
    let (canvas_width, canvas_height) = layout.canvas_size();
    debug!(
        "Composing {expected} frames into {canvas_width}x{canvas_height} ({}x{} cells)",
        layout.cell_width, layout.cell_height
    );

    let mut canvas = RgbImage::new(canvas_width, canvas_height);
    draw_cell(&mut canvas, &layout, 0, &first);
    for (index, frame) in frames.iter().enumerate().skip(1) {
        let image = open_frame(frame)?;
        let index = u32::try_from(index).context("frame index out of range")?;
        draw_cell(&mut canvas, &layout, index, &image);
    }

    let file = File::create(output_path)
        .with_context(|| format!("cannot create {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY)
        .encode_image(&canvas)
        .with_context(|| format!("cannot encode {}", output_path.display()))?;
    writer
        .flush()
        .with_context(|| format!("cannot write {}", output_path.display()))?;

    Ok(layout)
}

fn open_frame(path: &Path) -> Result<DynamicImage> {
    image::open(path).with_context(|| format!("cannot decode frame {}", path.display()))
}

fn draw_cell(canvas: &mut RgbImage, layout: &GridLayout, index: u32, frame: &DynamicImage) {
    let cell = imageops::resize(
        &frame.to_rgb8(),
        layout.cell_width,
        layout.cell_height,
        FilterType::Triangle,
    );
    let (x, y) = layout.cell_origin(index);
    imageops::replace(canvas, &cell, i64::from(x), i64::from(y));
}
