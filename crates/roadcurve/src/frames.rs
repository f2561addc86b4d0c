//! Image-file frame sources and PNG diagnostics.

use crate::stream::{DiagnosticsSink, FrameSource, FrameSourceError, SinkError};
use image::{GrayImage, ImageReader, Luma, RgbImage};
use roadcurve_core::Frame;
use roadcurve_search::FrameEstimate;
use std::fs;
use std::path::{Path, PathBuf};

const FRAME_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "tif"];

fn has_frame_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            FRAME_EXTENSIONS
                .iter()
                .any(|known| e.eq_ignore_ascii_case(known))
        })
}

/// Convert a decoded RGB image into a [`Frame`].
pub fn frame_from_rgb(img: &RgbImage) -> Frame {
    Frame {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw().clone(),
    }
}

/// Decode one image file into a [`Frame`].
pub fn load_frame(path: impl AsRef<Path>) -> Result<Frame, FrameSourceError> {
    let path = path.as_ref();
    let decode = |source| FrameSourceError::Decode {
        path: path.to_path_buf(),
        source,
    };
    let img = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(decode)?;
    Ok(frame_from_rgb(&img.to_rgb8()))
}

/// Frames read from the image files of one directory, in file-name order.
///
/// Video containers are decoded elsewhere; extract them to a directory of
/// stills first.
#[derive(Clone, Debug)]
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    next: usize,
}

impl ImageSequenceSource {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, FrameSourceError> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if path.is_file() && has_frame_extension(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        log::debug!(
            "{} frames in {}",
            paths.len(),
            dir.as_ref().display()
        );
        Ok(Self { paths, next: 0 })
    }

    /// Explicit list of files, used in the given order.
    pub fn from_paths(paths: Vec<PathBuf>) -> Result<Self, FrameSourceError> {
        if let Some(bad) = paths.iter().find(|p| !has_frame_extension(p)) {
            return Err(FrameSourceError::Unsupported(bad.clone()));
        }
        Ok(Self { paths, next: 0 })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    #[inline]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, FrameSourceError> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;
        load_frame(path).map(Some)
    }

    fn skip_frame(&mut self) -> Result<bool, FrameSourceError> {
        if self.next < self.paths.len() {
            self.next += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// Writes the best un-bent road image and its column profile per frame.
///
/// Files are `frame_NNNNNN_shift.png` (invalid pixels black) and
/// `frame_NNNNNN_profile.png` (the profile repeated over a few rows).
#[derive(Clone, Debug)]
pub struct ImageDumpSink {
    dir: PathBuf,
    strip_rows: u32,
}

impl ImageDumpSink {
    /// Create `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, strip_rows: 5 })
    }

    pub fn with_strip_rows(mut self, rows: u32) -> Self {
        self.strip_rows = rows.max(1);
        self
    }

    pub fn shift_path(&self, frame_index: usize) -> PathBuf {
        self.dir.join(format!("frame_{frame_index:06}_shift.png"))
    }

    pub fn profile_path(&self, frame_index: usize) -> PathBuf {
        self.dir.join(format!("frame_{frame_index:06}_profile.png"))
    }
}

impl DiagnosticsSink for ImageDumpSink {
    fn record(&mut self, frame_index: usize, frame: &FrameEstimate) -> Result<(), SinkError> {
        let shifted = &frame.estimate.shifted.image;
        let empty = SinkError::EmptyImage {
            width: shifted.width,
            height: shifted.height,
        };
        if shifted.width == 0 || shifted.height == 0 {
            return Err(empty);
        }
        let rgb = RgbImage::from_raw(
            shifted.width as u32,
            shifted.height as u32,
            shifted.to_rgb_bytes([0, 0, 0]),
        )
        .ok_or(empty)?;
        rgb.save(self.shift_path(frame_index))?;

        let values = frame.estimate.profile.as_slice();
        if values.is_empty() {
            return Err(SinkError::EmptyImage {
                width: 0,
                height: self.strip_rows as usize,
            });
        }
        let strip = GrayImage::from_fn(values.len() as u32, self.strip_rows, |x, _| {
            Luma([values[x as usize]])
        });
        strip.save(self.profile_path(frame_index))?;
        Ok(())
    }
}
