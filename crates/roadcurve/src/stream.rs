//! Driving the curvature search over a stream of frames.

use roadcurve_core::Frame;
use roadcurve_search::{CurvatureSearch, FrameEstimate, FrameReport, SkippedFrame};
use std::collections::VecDeque;
use std::path::PathBuf;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug)]
pub enum FrameSourceError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[cfg(feature = "image")]
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("frame {} is not an image file", .0.display())]
    Unsupported(PathBuf),
}

#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[cfg(feature = "image")]
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error("diagnostic image {width}x{height} has no pixels")]
    EmptyImage { width: usize, height: usize },
}

#[derive(thiserror::Error, Debug)]
pub enum StreamError {
    #[error(transparent)]
    Source(#[from] FrameSourceError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// A finite or endless supply of frames. End of stream is `Ok(None)`.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, FrameSourceError>;

    /// Advance past one frame without handing it out. Returns `false` at
    /// end of stream.
    fn skip_frame(&mut self) -> Result<bool, FrameSourceError> {
        Ok(self.next_frame()?.is_some())
    }
}

impl FrameSource for VecDeque<Frame> {
    fn next_frame(&mut self) -> Result<Option<Frame>, FrameSourceError> {
        Ok(self.pop_front())
    }

    fn skip_frame(&mut self) -> Result<bool, FrameSourceError> {
        Ok(self.pop_front().is_some())
    }
}

/// Which frame indices are processed: `offset`, `offset + every_nth`, ...
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameCadence {
    every_nth: usize,
    offset: usize,
}

impl Default for FrameCadence {
    /// Every fourth frame, starting with the first.
    fn default() -> Self {
        Self {
            every_nth: 4,
            offset: 0,
        }
    }
}

impl FrameCadence {
    /// `every_nth` of zero is treated as one.
    pub fn new(every_nth: usize, offset: usize) -> Self {
        Self {
            every_nth: every_nth.max(1),
            offset,
        }
    }

    /// Process every frame.
    pub fn every_frame() -> Self {
        Self::new(1, 0)
    }

    #[inline]
    pub fn every_nth(&self) -> usize {
        self.every_nth
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn includes(&self, index: usize) -> bool {
        index >= self.offset && (index - self.offset) % self.every_nth == 0
    }
}

/// Receives every successful per-frame result.
pub trait DiagnosticsSink {
    fn record(&mut self, frame_index: usize, frame: &FrameEstimate) -> Result<(), SinkError>;
}

/// What a stream run produced.
#[derive(Clone, Debug, Default)]
pub struct StreamOutcome {
    pub frames: Vec<FrameReport>,
    pub skipped: Vec<SkippedFrame>,
    /// Frames read from the source, sampled or not.
    pub visited: usize,
}

/// Pull frames from `source` until it ends, searching those `cadence`
/// selects.
///
/// A frame the search rejects is recorded as skipped and the run goes on.
/// Source and sink failures abort the run.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
pub fn run_stream<S: FrameSource + ?Sized>(
    source: &mut S,
    cadence: FrameCadence,
    search: &CurvatureSearch,
    mut sink: Option<&mut dyn DiagnosticsSink>,
) -> Result<StreamOutcome, StreamError> {
    let mut outcome = StreamOutcome::default();
    let mut index = 0usize;

    loop {
        if !cadence.includes(index) {
            if !source.skip_frame()? {
                break;
            }
            index += 1;
            continue;
        }
        let Some(frame) = source.next_frame()? else {
            break;
        };

        match search.process(&frame.view()) {
            Ok(estimate) => {
                if let Some(sink) = sink.as_deref_mut() {
                    sink.record(index, &estimate)?;
                }
                outcome
                    .frames
                    .push(FrameReport::from_estimate(index, &estimate));
            }
            Err(err) => {
                log::warn!("frame {index} skipped: {err}");
                outcome.skipped.push(SkippedFrame {
                    frame_index: index,
                    reason: err.to_string(),
                });
            }
        }
        index += 1;
    }

    outcome.visited = index;
    log::info!(
        "stream done: {} frames read, {} searched, {} skipped",
        outcome.visited,
        outcome.frames.len(),
        outcome.skipped.len()
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadcurve_core::CameraGeometry;
    use roadcurve_search::{RadiusCandidate, SearchParams};

    fn search() -> CurvatureSearch {
        let geometry =
            CameraGeometry::from_degrees(160, 120, 5.0, 60.0, 1.2, 0.32).expect("geometry");
        let params = SearchParams {
            profile_width: 24,
            candidate_count: 4,
            parallel: false,
            ..SearchParams::default()
        };
        CurvatureSearch::new(geometry, params).expect("search")
    }

    #[derive(Default)]
    struct Recorder(Vec<(usize, RadiusCandidate)>);

    impl DiagnosticsSink for Recorder {
        fn record(&mut self, frame_index: usize, frame: &FrameEstimate) -> Result<(), SinkError> {
            self.0.push((frame_index, frame.estimate.candidate));
            Ok(())
        }
    }

    #[test]
    fn cadence_selects_every_nth_after_offset() {
        let cadence = FrameCadence::new(4, 1);
        let picked: Vec<usize> = (0..12).filter(|&i| cadence.includes(i)).collect();
        assert_eq!(picked, vec![1, 5, 9]);
        assert_eq!(FrameCadence::new(0, 0), FrameCadence::every_frame());
        assert!(FrameCadence::default().includes(8));
        assert!(!FrameCadence::default().includes(6));
    }

    #[test]
    fn stream_processes_sampled_frames_and_skips_bad_ones() {
        let mut frames: VecDeque<Frame> = (0..7)
            .map(|i| {
                if i == 4 {
                    Frame::filled(80, 60, [0, 0, 0])
                } else {
                    Frame::filled(160, 120, [100, 100, 100])
                }
            })
            .collect();
        let mut recorder = Recorder::default();

        let outcome = run_stream(
            &mut frames,
            FrameCadence::new(2, 0),
            &search(),
            Some(&mut recorder),
        )
        .expect("stream");

        assert_eq!(outcome.visited, 7);
        let searched: Vec<usize> = outcome.frames.iter().map(|f| f.frame_index).collect();
        assert_eq!(searched, vec![0, 2, 6]);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].frame_index, 4);
        assert_eq!(
            recorder.0,
            vec![
                (0, RadiusCandidate::Straight),
                (2, RadiusCandidate::Straight),
                (6, RadiusCandidate::Straight),
            ]
        );
    }

    #[test]
    fn empty_source_yields_empty_outcome() {
        let mut frames: VecDeque<Frame> = VecDeque::new();
        let outcome =
            run_stream(&mut frames, FrameCadence::default(), &search(), None).expect("stream");
        assert_eq!(outcome.visited, 0);
        assert!(outcome.frames.is_empty());
    }
}
