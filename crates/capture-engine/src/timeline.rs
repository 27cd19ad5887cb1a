//! The frame timeline: captures of one video, kept in playback order.

use std::sync::{Arc, Mutex, MutexGuard};

use framedoc_common::error::{FramedocError, FramedocResult};
use framedoc_project_model::frame::{FrameCapture, FrameId, FrameImage};

/// Ordered set of frame captures plus the current playback position.
///
/// Frames are sorted by time ascending; frames sharing a time keep their
/// insertion order.
#[derive(Debug, Clone, Default)]
pub struct TimelineStore {
    frames: Vec<FrameCapture>,
    duration: Option<f64>,
    current_time: f64,
}

impl TimelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store for a video whose duration is already known.
    pub fn with_duration(duration_secs: f64) -> Self {
        let mut store = Self::new();
        store.duration = known(duration_secs);
        store
    }

    /// Rebuild a store from previously saved frames.
    ///
    /// Frames are re-sorted; ties keep the order they appear in `frames`.
    pub fn from_frames(frames: Vec<FrameCapture>, duration: Option<f64>) -> Self {
        let mut store = Self {
            frames: Vec::with_capacity(frames.len()),
            duration: duration.and_then(known),
            current_time: 0.0,
        };
        for frame in frames {
            store.insert_sorted(frame);
        }
        store
    }

    /// Known duration, `None` while video metadata is unavailable.
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Record the video duration once metadata has loaded.
    ///
    /// Frames past the new duration are removed and returned.
    pub fn set_duration(&mut self, duration_secs: f64) -> Vec<FrameCapture> {
        self.duration = known(duration_secs);
        let Some(limit) = self.duration else {
            return vec![];
        };

        let (kept, dropped): (Vec<_>, Vec<_>) = std::mem::take(&mut self.frames)
            .into_iter()
            .partition(|f| f.time_secs() <= limit);
        self.frames = kept;
        if !dropped.is_empty() {
            tracing::warn!(
                dropped = dropped.len(),
                duration = limit,
                "Removed frames beyond the video duration"
            );
        }
        self.current_time = self.current_time.min(limit);
        dropped
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Move the playback position. Rejects times outside `[0, duration]`.
    pub fn seek(&mut self, time_secs: f64) -> FramedocResult<()> {
        self.check_time(time_secs)?;
        self.current_time = time_secs;
        Ok(())
    }

    /// Create and store a capture at `time_secs`.
    pub fn add_frame(&mut self, time_secs: f64, image: FrameImage) -> FramedocResult<FrameCapture> {
        self.check_time(time_secs)?;
        let frame = FrameCapture::new(time_secs, image);
        self.insert_sorted(frame.clone());
        tracing::debug!(id = %frame.id(), time = time_secs, "Added frame");
        Ok(frame)
    }

    /// Store a capture produced elsewhere (e.g. by a `FrameCapturer`).
    pub fn insert(&mut self, frame: FrameCapture) -> FramedocResult<()> {
        self.check_time(frame.time_secs())?;
        self.insert_sorted(frame);
        Ok(())
    }

    /// Remove a frame by id.
    pub fn remove_frame(&mut self, id: FrameId) -> Option<FrameCapture> {
        let idx = self.frames.iter().position(|f| f.id() == id)?;
        let removed = self.frames.remove(idx);
        tracing::debug!(id = %id, "Removed frame");
        Some(removed)
    }

    /// Frames in timeline order.
    pub fn list(&self) -> &[FrameCapture] {
        &self.frames
    }

    pub fn get(&self, id: FrameId) -> Option<&FrameCapture> {
        self.frames.iter().find(|f| f.id() == id)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Take the frames out, leaving the store empty.
    pub fn into_frames(self) -> Vec<FrameCapture> {
        self.frames
    }

    fn check_time(&self, time_secs: f64) -> FramedocResult<()> {
        let out_of_range = !time_secs.is_finite()
            || time_secs < 0.0
            || self.duration.is_some_and(|d| time_secs > d);
        if out_of_range {
            return Err(FramedocError::invalid_time(
                time_secs,
                self.duration.unwrap_or(0.0),
            ));
        }
        Ok(())
    }

    /// Insert after every frame with time <= the new frame's time.
    fn insert_sorted(&mut self, frame: FrameCapture) {
        let t = frame.time_secs();
        let idx = self.frames.partition_point(|f| f.time_secs() <= t);
        self.frames.insert(idx, frame);
    }
}

/// Zero, negative, and non-finite durations mean "unknown".
fn known(duration_secs: f64) -> Option<f64> {
    (duration_secs.is_finite() && duration_secs > 0.0).then_some(duration_secs)
}

/// A [`TimelineStore`] shared between threads.
///
/// Every operation takes the single lock, so add/remove/list calls are
/// serialized.
#[derive(Debug, Clone, Default)]
pub struct SharedTimeline {
    inner: Arc<Mutex<TimelineStore>>,
}

impl SharedTimeline {
    pub fn new(store: TimelineStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TimelineStore> {
        // A panic while holding the lock cannot leave the Vec half-sorted:
        // every mutation is a single insert/remove.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_frame(&self, time_secs: f64, image: FrameImage) -> FramedocResult<FrameCapture> {
        self.lock().add_frame(time_secs, image)
    }

    pub fn insert(&self, frame: FrameCapture) -> FramedocResult<()> {
        self.lock().insert(frame)
    }

    pub fn remove_frame(&self, id: FrameId) -> Option<FrameCapture> {
        self.lock().remove_frame(id)
    }

    /// Snapshot of the frames in timeline order.
    pub fn list(&self) -> Vec<FrameCapture> {
        self.lock().list().to_vec()
    }

    pub fn set_duration(&self, duration_secs: f64) -> Vec<FrameCapture> {
        self.lock().set_duration(duration_secs)
    }

    /// Run `f` with exclusive access to the store.
    pub fn with<R>(&self, f: impl FnOnce(&mut TimelineStore) -> R) -> R {
        f(&mut self.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framedoc_common::error::ErrorKind;
    use framedoc_project_model::frame::ImageEncoding;
    use proptest::prelude::*;

    fn img(tag: u8) -> FrameImage {
        FrameImage::new(ImageEncoding::Jpeg, 16, 9, vec![tag])
    }

    fn times(store: &TimelineStore) -> Vec<f64> {
        store.list().iter().map(FrameCapture::time_secs).collect()
    }

    #[test]
    fn test_ordering_with_ties_keeps_insertion_order() {
        let mut store = TimelineStore::with_duration(60.0);
        let _five = store.add_frame(5.0, img(1)).unwrap();
        let first_two = store.add_frame(2.0, img(2)).unwrap();
        let second_two = store.add_frame(2.0, img(3)).unwrap();
        let _nine = store.add_frame(9.0, img(4)).unwrap();

        assert_eq!(times(&store), vec![2.0, 2.0, 5.0, 9.0]);
        assert_eq!(store.list()[0].id(), first_two.id());
        assert_eq!(store.list()[1].id(), second_two.id());
    }

    #[test]
    fn test_add_rejects_out_of_range_time() {
        let mut store = TimelineStore::with_duration(10.0);
        assert_eq!(
            store.add_frame(-0.1, img(0)).unwrap_err().kind(),
            ErrorKind::InvalidTime
        );
        assert_eq!(
            store.add_frame(10.5, img(0)).unwrap_err().kind(),
            ErrorKind::InvalidTime
        );
        assert!(store.add_frame(10.0, img(0)).is_ok());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unknown_duration_skips_upper_bound_check() {
        let mut store = TimelineStore::new();
        assert!(store.add_frame(5_000.0, img(0)).is_ok());
        let mut zero = TimelineStore::with_duration(0.0);
        assert!(zero.duration().is_none());
        assert!(zero.add_frame(3.0, img(0)).is_ok());
        assert!(zero.add_frame(-3.0, img(0)).is_err());
    }

    #[test]
    fn test_remove_frame() {
        let mut store = TimelineStore::new();
        let a = store.add_frame(1.0, img(1)).unwrap();
        let b = store.add_frame(2.0, img(2)).unwrap();

        assert_eq!(store.remove_frame(a.id()).map(|f| f.id()), Some(a.id()));
        assert!(store.remove_frame(a.id()).is_none());
        assert_eq!(store.list().len(), 1);
        assert_eq!(store.list()[0].id(), b.id());
    }

    #[test]
    fn test_set_duration_drops_late_frames() {
        let mut store = TimelineStore::new();
        store.add_frame(3.0, img(1)).unwrap();
        store.add_frame(30.0, img(2)).unwrap();
        store.seek(25.0).unwrap();

        let dropped = store.set_duration(20.0);
        assert_eq!(dropped.len(), 1);
        assert_eq!(times(&store), vec![3.0]);
        assert_eq!(store.current_time(), 20.0);
    }

    #[test]
    fn test_seek_bounds() {
        let mut store = TimelineStore::with_duration(8.0);
        assert!(store.seek(8.0).is_ok());
        assert!(store.seek(8.01).is_err());
        assert_eq!(store.current_time(), 8.0);
    }

    #[test]
    fn test_from_frames_resorts() {
        let frames = vec![
            FrameCapture::new(4.0, img(1)),
            FrameCapture::new(1.0, img(2)),
            FrameCapture::new(4.0, img(3)),
        ];
        let ids: Vec<_> = frames.iter().map(FrameCapture::id).collect();
        let store = TimelineStore::from_frames(frames, Some(10.0));
        let sorted: Vec<_> = store.list().iter().map(FrameCapture::id).collect();
        assert_eq!(sorted, vec![ids[1], ids[0], ids[2]]);
    }

    #[test]
    fn test_shared_timeline_serializes_writers() {
        let shared = SharedTimeline::new(TimelineStore::with_duration(100.0));
        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        let t = ((i * 4 + worker) % 100) as f64;
                        shared.add_frame(t, img(worker as u8)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let frames = shared.list();
        assert_eq!(frames.len(), 100);
        assert!(frames
            .windows(2)
            .all(|w| w[0].time_secs() <= w[1].time_secs()));
    }

    proptest! {
        #[test]
        fn prop_list_sorted_with_stable_ties(raw in prop::collection::vec(0u32..50, 0..40)) {
            let mut store = TimelineStore::with_duration(50.0);
            let mut added = Vec::new();
            for t in &raw {
                added.push(store.add_frame(*t as f64, img(0)).unwrap());
            }

            let mut expected = added.clone();
            expected.sort_by(|a, b| a.time_secs().total_cmp(&b.time_secs()));
            let expected_ids: Vec<_> = expected.iter().map(FrameCapture::id).collect();
            let actual_ids: Vec<_> = store.list().iter().map(FrameCapture::id).collect();
            prop_assert_eq!(actual_ids, expected_ids);
        }
    }
}
