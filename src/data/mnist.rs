// ============================================================
// Layer 4 — MNIST Loader
// ============================================================
// Reads the MNIST dataset from its four IDX files:
//
//   train-images-idx3-ubyte   train-labels-idx1-ubyte
//   t10k-images-idx3-ubyte    t10k-labels-idx1-ubyte
//
// IDX layout (all integers big-endian u32):
//   images: magic 2051, count, rows, cols, then rows*cols bytes
//           per image
//   labels: magic 2049, count, then one byte per label

use anyhow::{bail, ensure, Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::sample::{LabeledImage, Split};
use crate::domain::traits::DigitSource;
use crate::domain::{FRAME_SIZE, NUM_CLASSES};

const IMAGES_MAGIC: u32 = 2051;
const LABELS_MAGIC: u32 = 2049;

/// Loads MNIST splits from a directory of uncompressed IDX files.
pub struct MnistLoader {
    dir: PathBuf,
}

impl MnistLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_names(split: Split) -> (&'static str, &'static str) {
        match split {
            Split::Train => ("train-images-idx3-ubyte", "train-labels-idx1-ubyte"),
            Split::Test  => ("t10k-images-idx3-ubyte", "t10k-labels-idx1-ubyte"),
        }
    }
}

impl DigitSource for MnistLoader {
    fn load_split(&self, split: Split) -> Result<Vec<LabeledImage>> {
        if !self.dir.is_dir() {
            bail!(
                "MNIST directory '{}' does not exist. Download the four IDX files \
                 (train-*/t10k-*) and unpack them there.",
                self.dir.display()
            );
        }

        let (images_name, labels_name) = Self::file_names(split);
        let images = read_file(&self.dir.join(images_name))?;
        let labels = read_file(&self.dir.join(labels_name))?;

        let samples = parse_idx(&images, &labels)
            .with_context(|| format!("Invalid IDX data in '{}'", self.dir.display()))?;

        tracing::info!("Loaded {} {:?} images from '{}'", samples.len(), split, self.dir.display());
        Ok(samples)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Cannot read '{}'", path.display()))
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32> {
    let word: [u8; 4] = bytes
        .get(offset..offset + 4)
        .and_then(|s| s.try_into().ok())
        .context("IDX header truncated")?;
    Ok(u32::from_be_bytes(word))
}

/// Pair an IDX image file with its label file.
pub fn parse_idx(images: &[u8], labels: &[u8]) -> Result<Vec<LabeledImage>> {
    ensure!(read_u32(images, 0)? == IMAGES_MAGIC, "bad image file magic");
    ensure!(read_u32(labels, 0)? == LABELS_MAGIC, "bad label file magic");

    let count = read_u32(images, 4)? as usize;
    let rows  = read_u32(images, 8)? as usize;
    let cols  = read_u32(images, 12)? as usize;
    ensure!(
        rows == FRAME_SIZE && cols == FRAME_SIZE,
        "expected {FRAME_SIZE}x{FRAME_SIZE} images, found {rows}x{cols}"
    );

    let label_count = read_u32(labels, 4)? as usize;
    ensure!(count == label_count, "{count} images but {label_count} labels");

    let pixels = &images[16..];
    let tags   = &labels[8..];
    let stride = rows * cols;
    ensure!(pixels.len() >= count * stride, "image data truncated");
    ensure!(tags.len() >= count, "label data truncated");

    pixels
        .chunks_exact(stride)
        .zip(tags)
        .take(count)
        .map(|(px, &label)| {
            ensure!((label as usize) < NUM_CLASSES, "label {label} out of range");
            Ok(LabeledImage::new(px.to_vec(), label))
        })
        .collect()
}
