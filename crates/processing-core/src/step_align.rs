//! Step alignment: bin captured frames into procedure steps.
//!
//! # Algorithm
//!
//! The video is cut into N equal time windows, one per step. Window `i`
//! covers `[d*i/N, d*(i+1)/N)`; the last window is closed on the right so a
//! frame captured at exactly `d` still lands in the final step. A frame on a
//! boundary belongs to the later window.
//!
//! The binning looks only at frame times. It never inspects image content
//! or step text.

use serde::{Deserialize, Serialize};

use framedoc_common::error::FramedocError;
use framedoc_project_model::frame::FrameCapture;
use framedoc_project_model::procedure::Procedure;

/// Why an alignment came out degenerate. Not an error: the partition is
/// still well defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentAdvisory {
    /// The procedure has no steps; every frame is unassigned.
    NoSteps,
    /// The video duration is zero or unknown; every frame went to step 0.
    UnknownDuration,
}

impl AlignmentAdvisory {
    pub fn describe(self) -> &'static str {
        match self {
            Self::NoSteps => "procedure has no steps; frames left unassigned",
            Self::UnknownDuration => "video duration unknown; all frames assigned to step 1",
        }
    }
}

impl From<AlignmentAdvisory> for FramedocError {
    fn from(advisory: AlignmentAdvisory) -> Self {
        FramedocError::alignment_degenerate(advisory.describe())
    }
}

/// One step's time window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepWindow {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    /// True only for the last window.
    pub closed_end: bool,
}

impl StepWindow {
    pub fn contains(&self, time_secs: f64) -> bool {
        time_secs >= self.start
            && (time_secs < self.end || (self.closed_end && time_secs == self.end))
    }
}

/// The windows for `step_count` steps over `duration_secs`.
///
/// Empty when there are no steps or the duration is not a positive number.
pub fn step_windows(step_count: usize, duration_secs: f64) -> Vec<StepWindow> {
    if step_count == 0 || !(duration_secs.is_finite() && duration_secs > 0.0) {
        return vec![];
    }
    (0..step_count)
        .map(|i| StepWindow {
            index: i,
            start: boundary(duration_secs, step_count, i),
            end: boundary(duration_secs, step_count, i + 1),
            closed_end: i + 1 == step_count,
        })
        .collect()
}

/// Result of binning frames into steps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alignment {
    /// One frame list per step, each in input order.
    pub steps: Vec<Vec<FrameCapture>>,
    /// Frames no step received. Non-empty only when there are no steps.
    pub unassigned: Vec<FrameCapture>,
    pub advisory: Option<AlignmentAdvisory>,
}

impl Alignment {
    pub fn assigned_count(&self) -> usize {
        self.steps.iter().map(Vec::len).sum()
    }
}

/// Assign every frame to exactly one of `step_count` steps.
///
/// `duration_secs` of `None`, zero, or non-finite puts every frame in step
/// 0 and reports [`AlignmentAdvisory::UnknownDuration`].
pub fn align(
    step_count: usize,
    frames: &[FrameCapture],
    duration_secs: Option<f64>,
) -> Alignment {
    if step_count == 0 {
        if !frames.is_empty() {
            tracing::warn!(frames = frames.len(), "No steps to align frames to");
        }
        return Alignment {
            steps: vec![],
            unassigned: frames.to_vec(),
            advisory: Some(AlignmentAdvisory::NoSteps),
        };
    }

    let mut steps = vec![Vec::new(); step_count];
    let duration = duration_secs.filter(|d| d.is_finite() && *d > 0.0);
    let Some(duration) = duration else {
        tracing::warn!(
            frames = frames.len(),
            "Video duration unknown; assigning all frames to the first step"
        );
        steps[0] = frames.to_vec();
        return Alignment {
            steps,
            unassigned: vec![],
            advisory: Some(AlignmentAdvisory::UnknownDuration),
        };
    };

    for frame in frames {
        let idx = step_index(frame.time_secs(), duration, step_count);
        tracing::debug!(id = %frame.id(), time = frame.time_secs(), step = idx, "Aligned frame");
        steps[idx].push(frame.clone());
    }

    Alignment {
        steps,
        unassigned: vec![],
        advisory: None,
    }
}

/// A procedure with `steps[*].frames` filled in by [`align`].
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedProcedure {
    pub procedure: Procedure,
    pub unassigned: Vec<FrameCapture>,
    pub advisory: Option<AlignmentAdvisory>,
}

/// Align `frames` to the steps of `procedure`, returning a new procedure.
///
/// Any frames already attached to the input steps are replaced; the input
/// itself is left untouched.
pub fn align_procedure(
    procedure: &Procedure,
    frames: &[FrameCapture],
    duration_secs: Option<f64>,
) -> AlignedProcedure {
    let alignment = align(procedure.steps.len(), frames, duration_secs);

    let mut aligned = procedure.clone();
    for (step, frames) in aligned.steps.iter_mut().zip(alignment.steps) {
        step.frames = frames;
    }
    tracing::info!(
        steps = aligned.steps.len(),
        frames = frames.len(),
        unassigned = alignment.unassigned.len(),
        "Aligned frames to procedure steps"
    );

    AlignedProcedure {
        procedure: aligned,
        unassigned: alignment.unassigned,
        advisory: alignment.advisory,
    }
}

fn boundary(duration: f64, step_count: usize, i: usize) -> f64 {
    duration * i as f64 / step_count as f64
}

/// Window index for `time`, clamped to `[0, step_count - 1]`.
///
/// The float estimate is corrected against the exact boundaries so the
/// result agrees with [`StepWindow::contains`].
fn step_index(time: f64, duration: f64, step_count: usize) -> usize {
    if !time.is_finite() || time <= 0.0 {
        return 0;
    }
    let last = step_count - 1;
    let mut idx = ((time * step_count as f64 / duration).floor() as usize).min(last);
    while idx < last && time >= boundary(duration, step_count, idx + 1) {
        idx += 1;
    }
    while idx > 0 && time < boundary(duration, step_count, idx) {
        idx -= 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use framedoc_common::error::ErrorKind;
    use framedoc_project_model::frame::{FrameImage, ImageEncoding};
    use framedoc_project_model::procedure::ProcedureStep;
    use proptest::prelude::*;

    fn frame(time: f64) -> FrameCapture {
        FrameCapture::new(time, FrameImage::new(ImageEncoding::Jpeg, 16, 9, vec![0]))
    }

    fn step_times(alignment: &Alignment) -> Vec<Vec<f64>> {
        alignment
            .steps
            .iter()
            .map(|s| s.iter().map(FrameCapture::time_secs).collect())
            .collect()
    }

    #[test]
    fn test_three_steps_over_hundred_seconds() {
        let frames: Vec<_> = [0.0, 33.0, 34.0, 66.0, 67.0, 100.0]
            .into_iter()
            .map(frame)
            .collect();
        let alignment = align(3, &frames, Some(100.0));

        assert_eq!(
            step_times(&alignment),
            vec![vec![0.0, 33.0], vec![34.0, 66.0], vec![67.0, 100.0]]
        );
        assert!(alignment.unassigned.is_empty());
        assert!(alignment.advisory.is_none());
    }

    #[test]
    fn test_frame_on_boundary_goes_to_later_window() {
        let frames = vec![frame(25.0), frame(50.0), frame(75.0)];
        let alignment = align(4, &frames, Some(100.0));
        assert_eq!(
            step_times(&alignment),
            vec![vec![], vec![25.0], vec![50.0], vec![75.0]]
        );
    }

    #[test]
    fn test_frame_at_duration_lands_in_last_step() {
        let alignment = align(7, &[frame(13.0)], Some(13.0));
        assert_eq!(alignment.steps[6].len(), 1);
    }

    #[test]
    fn test_zero_steps() {
        let frames = vec![frame(1.0), frame(2.0)];
        let alignment = align(0, &frames, Some(10.0));
        assert!(alignment.steps.is_empty());
        assert_eq!(alignment.unassigned.len(), 2);
        assert_eq!(alignment.advisory, Some(AlignmentAdvisory::NoSteps));
    }

    #[test]
    fn test_unknown_duration_puts_everything_in_first_step() {
        let frames = vec![frame(1.0), frame(200.0)];
        for duration in [None, Some(0.0), Some(f64::NAN)] {
            let alignment = align(3, &frames, duration);
            assert_eq!(step_times(&alignment), vec![vec![1.0, 200.0], vec![], vec![]]);
            assert_eq!(alignment.advisory, Some(AlignmentAdvisory::UnknownDuration));
        }
    }

    #[test]
    fn test_advisory_converts_to_error_kind() {
        let err: FramedocError = AlignmentAdvisory::NoSteps.into();
        assert_eq!(err.kind(), ErrorKind::AlignmentDegenerate);
    }

    #[test]
    fn test_windows() {
        let windows = step_windows(3, 90.0);
        assert_eq!(windows.len(), 3);
        assert_eq!((windows[1].start, windows[1].end), (30.0, 60.0));
        assert!(!windows[1].contains(60.0));
        assert!(windows[2].contains(90.0));
        assert!(step_windows(0, 90.0).is_empty());
        assert!(step_windows(3, 0.0).is_empty());
    }

    #[test]
    fn test_align_procedure_does_not_mutate_input() {
        let mut procedure = Procedure::new("Replace a fuse");
        procedure.steps = vec![ProcedureStep::new("Open panel"), ProcedureStep::new("Swap fuse")];
        procedure.steps[0].frames.push(frame(99.0));
        let before = procedure.clone();

        let aligned = align_procedure(&procedure, &[frame(2.0), frame(8.0)], Some(10.0));

        assert_eq!(procedure, before);
        assert_eq!(aligned.procedure.steps[0].frames.len(), 1);
        assert_eq!(aligned.procedure.steps[0].frames[0].time_secs(), 2.0);
        assert_eq!(aligned.procedure.steps[1].frames[0].time_secs(), 8.0);
        assert_eq!(aligned.procedure.title, "Replace a fuse");
    }

    #[test]
    fn test_advisory_serializes_snake_case() {
        let json = serde_json::to_string(&AlignmentAdvisory::UnknownDuration).unwrap();
        assert_eq!(json, "\"unknown_duration\"");
    }

    proptest! {
        #[test]
        fn prop_partition_is_exhaustive(
            duration in 0.5f64..10_000.0,
            steps in 1usize..40,
            fractions in prop::collection::vec(0.0f64..=1.0, 0..60),
        ) {
            let frames: Vec<_> = fractions.iter().map(|f| frame(f * duration)).collect();
            let alignment = align(steps, &frames, Some(duration));

            prop_assert_eq!(alignment.steps.len(), steps);
            prop_assert!(alignment.unassigned.is_empty());

            let mut seen: Vec<_> = alignment.steps.iter().flatten().map(FrameCapture::id).collect();
            let mut expected: Vec<_> = frames.iter().map(FrameCapture::id).collect();
            seen.sort();
            expected.sort();
            prop_assert_eq!(seen, expected);
        }

        #[test]
        fn prop_frames_land_in_their_window(
            duration in 1.0f64..5_000.0,
            steps in 1usize..25,
            fraction in 0.0f64..=1.0,
        ) {
            let time = fraction * duration;
            let alignment = align(steps, &[frame(time)], Some(duration));
            let windows = step_windows(steps, duration);
            let idx = alignment.steps.iter().position(|s| !s.is_empty()).unwrap();
            prop_assert!(windows[idx].contains(time));
        }
    }
}
