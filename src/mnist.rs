//! Decoder for MNIST style label and image sets.
//!
//! Every integer is a big-endian `i32`. A labels file holds its magic number, the amount of
//! labels and one byte per label. An images file holds its magic number, the amount of
//! images and then, for every image, its rows, its cols and `rows * cols` pixel bytes.

use std::{
    error::Error,
    fmt::{self, Display},
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

use log::{debug, info, warn};

use crate::{Feedforward, Matrix};

pub const LABEL_MAGIC: i32 = 0x801;
pub const IMAGE_MAGIC: i32 = 0x803;

/// Errors produced while decoding a set.
#[derive(Debug)]
pub enum MnistErr {
    InvalidMagicNumber { expected: i32, got: i32 },
    /// A count or an image dimension was negative.
    NegativeSize(i32),
    /// The pixel count of an image doesn't fit in memory addressing.
    ImageTooLarge { rows: usize, cols: usize },
    /// The labels and images files describe a different amount of samples.
    LengthMismatch { labels: usize, images: usize },
    Io(io::Error),
}

impl Display for MnistErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMagicNumber { expected, got } => {
                write!(f, "invalid magic number {got:#x}, expected {expected:#x}")
            }
            Self::NegativeSize(size) => write!(f, "invalid negative size {size}"),
            Self::ImageTooLarge { rows, cols } => write!(f, "image of {rows}x{cols} is too large"),
            Self::LengthMismatch { labels, images } => {
                write!(f, "got {labels} labels for {images} images")
            }
            Self::Io(e) => write!(f, "unexpected error while reading: {e}"),
        }
    }
}

impl Error for MnistErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MnistErr {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// A single grayscale image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub rows: usize,
    pub cols: usize,
    pub pixels: Vec<u8>,
}

impl Image {
    /// Returns the pixel at the given row and column, if inside the image.
    pub fn get(&self, row: usize, col: usize) -> Option<u8> {
        if row >= self.rows || col >= self.cols {
            return None;
        }

        Some(self.pixels[self.cols * row + col])
    }

    /// Flattens the image into a `(rows * cols, 1)` column with pixels scaled into `[0, 1]`.
    pub fn to_column(&self) -> crate::Result<Matrix> {
        let data = self.pixels.iter().map(|&p| f64::from(p) / 255.).collect();
        Matrix::from_vec(data, self.pixels.len(), 1)
    }
}

/// Labels paired with their images.
#[derive(Debug, Clone, Default)]
pub struct Set {
    pub labels: Vec<u8>,
    pub images: Vec<Image>,
}

impl Set {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &Image)> {
        self.labels.iter().copied().zip(&self.images)
    }

    /// Predicts every image and counts the ones whose largest output matches the label.
    ///
    /// Images that can't be turned into an input for `model` are logged and skipped.
    pub fn evaluate<M: Feedforward>(&self, model: &M) -> Score {
        let mut score = Score::default();
        for (i, (label, image)) in self.iter().enumerate() {
            let output = match image.to_column().and_then(|input| model.forward(&input)) {
                Ok(output) => output,
                Err(e) => {
                    warn!("skipping image {i}: {e}");
                    score.skipped += 1;
                    continue;
                }
            };

            let (guess, _) = output.argmax();
            debug!("image {i}: predicted {guess}, label {label}");
            score.total += 1;
            if guess == usize::from(label) {
                score.hits += 1;
            }
        }

        score
    }
}

/// The outcome of `Set::evaluate`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    /// Predictions matching their label.
    pub hits: usize,
    /// Images that were predicted.
    pub total: usize,
    /// Images that couldn't be predicted.
    pub skipped: usize,
}

impl Score {
    /// The fraction of predicted images that hit, 0 when nothing was predicted.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.;
        }

        self.hits as f64 / self.total as f64
    }
}

fn read_i32<R: Read>(r: &mut R) -> io::Result<i32> {
    let mut buf = [0; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

fn read_size<R: Read>(r: &mut R) -> Result<usize, MnistErr> {
    let size = read_i32(r)?;
    usize::try_from(size).map_err(|_| MnistErr::NegativeSize(size))
}

fn read_header<R: Read>(r: &mut R, expected: i32) -> Result<usize, MnistErr> {
    let magic = read_i32(r)?;
    if magic != expected {
        return Err(MnistErr::InvalidMagicNumber {
            expected,
            got: magic,
        });
    }

    read_size(r)
}

/// Reads exactly `n` bytes, growing the buffer only as data actually arrives.
fn read_bytes<R: Read>(r: &mut R, n: usize) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    r.by_ref().take(n as u64).read_to_end(&mut buf)?;
    if buf.len() != n {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {n} bytes, got {}", buf.len()),
        ));
    }

    Ok(buf)
}

/// Reads a labels set.
pub fn read_labels<R: Read>(mut r: R) -> Result<Vec<u8>, MnistErr> {
    let size = read_header(&mut r, LABEL_MAGIC)?;
    Ok(read_bytes(&mut r, size)?)
}

/// Reads an images set.
pub fn read_images<R: Read>(mut r: R) -> Result<Vec<Image>, MnistErr> {
    let size = read_header(&mut r, IMAGE_MAGIC)?;

    // The count comes from the file, don't trust it for preallocation.
    let mut images = Vec::with_capacity(size.min(1 << 16));
    for _ in 0..size {
        let rows = read_size(&mut r)?;
        let cols = read_size(&mut r)?;
        let len = rows
            .checked_mul(cols)
            .ok_or(MnistErr::ImageTooLarge { rows, cols })?;
        let pixels = read_bytes(&mut r, len)?;
        images.push(Image { rows, cols, pixels });
    }

    Ok(images)
}

/// Loads a full set out of its labels and images files.
pub fn load_set<P, Q>(labels_path: P, images_path: Q) -> Result<Set, MnistErr>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let labels = read_labels(BufReader::new(File::open(labels_path)?))?;
    let images = read_images(BufReader::new(File::open(images_path)?))?;

    if labels.len() != images.len() {
        return Err(MnistErr::LengthMismatch {
            labels: labels.len(),
            images: images.len(),
        });
    }

    info!("loaded {} samples", labels.len());
    Ok(Set { labels, images })
}
