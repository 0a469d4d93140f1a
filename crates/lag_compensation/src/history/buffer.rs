//! Bounded per-object pose history with time interpolation

use std::collections::VecDeque;

use crate::error::HistoryError;
use crate::history::sample::TransformSample;

/// Frames retained when no capacity is configured
pub const DEFAULT_HISTORY_CAPACITY: usize = 40;

/// Last answered query
#[derive(Debug, Clone, Copy, Default)]
struct QueryCache {
    time: Option<f64>,
    sample: TransformSample,
    fresh: bool,
}

/// Ring buffer of `(time, pose)` frames, oldest first
///
/// Times are strictly increasing. When the buffer is full the oldest frame is
/// evicted before a new one is appended.
///
/// The buffer also remembers the last query it answered. Repeating a query for
/// the same time returns the remembered pose without scanning. The `fresh` flag
/// on that cache belongs to the owner: it is lowered whenever a new time is
/// queried and raised only through [`HistoryBuffer::mark_fresh`].
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    capacity: usize,
    frames: VecDeque<(f64, TransformSample)>,
    cache: QueryCache,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryBuffer {
    /// Create an empty buffer holding at most `capacity` frames (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            frames: VecDeque::with_capacity(capacity),
            cache: QueryCache::default(),
        }
    }

    /// Maximum number of frames retained
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity, evicting the oldest frames if needed
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.frames.len() > self.capacity {
            self.frames.pop_front();
        }
        self.invalidate();
    }

    /// Number of stored frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no frame has been recorded
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Time of the oldest stored frame
    pub fn oldest_time(&self) -> Option<f64> {
        self.frames.front().map(|(time, _)| *time)
    }

    /// Time of the newest stored frame
    pub fn newest_time(&self) -> Option<f64> {
        self.frames.back().map(|(time, _)| *time)
    }

    /// Iterate stored frames oldest first
    pub fn iter(&self) -> impl Iterator<Item = &(f64, TransformSample)> {
        self.frames.iter()
    }

    /// Drop every frame and the query cache
    pub fn clear(&mut self) {
        self.frames.clear();
        self.invalidate();
    }

    /// Append a frame, evicting the oldest one when full
    ///
    /// Frames must arrive in strictly increasing, finite time order; anything
    /// else is rejected and leaves the buffer untouched. A successful record starts a
    /// new tick, so the query cache is dropped.
    pub fn record(&mut self, time: f64, sample: TransformSample) -> Result<(), HistoryError> {
        let latest = self.newest_time().unwrap_or(f64::NEG_INFINITY);
        if !time.is_finite() || time <= latest {
            return Err(HistoryError::NonMonotonicTime { time, latest });
        }

        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back((time, sample));
        self.invalidate();
        Ok(())
    }

    /// Pose at `query_time`
    ///
    /// Between two frames the result is blended from them. Past the newest
    /// frame it is blended from that frame toward `live`, reaching `live` at
    /// time `now`. A query older than every frame, or on an empty buffer, is
    /// an underflow; the cache is cleared in that case so no stale pose leaks
    /// out through [`HistoryBuffer::cached`].
    pub fn interpolate(
        &mut self,
        query_time: f64,
        live: &TransformSample,
        now: f64,
    ) -> Result<TransformSample, HistoryError> {
        if self.cache.time == Some(query_time) {
            return Ok(self.cache.sample);
        }

        let Some(older_index) = self.frames.iter().rposition(|(time, _)| *time <= query_time) else {
            self.invalidate();
            return Err(HistoryError::Underflow {
                query_time,
                oldest: self.oldest_time(),
            });
        };

        let (older_time, older) = self.frames[older_index];
        let (newer_time, newer) = match self.frames.get(older_index + 1) {
            Some(&(time, sample)) => (time, sample),
            None => (now, *live),
        };

        let span = newer_time - older_time;
        let fraction = if span > 0.0 {
            ((query_time - older_time) / span).clamp(0.0, 1.0)
        } else if query_time > older_time {
            1.0
        } else {
            0.0
        };

        let sample = older.interpolate(&newer, fraction as f32);
        self.cache = QueryCache {
            time: Some(query_time),
            sample,
            fresh: false,
        };
        Ok(sample)
    }

    /// Last answered query as `(time, pose)`
    pub fn cached(&self) -> Option<(f64, TransformSample)> {
        self.cache.time.map(|time| (time, self.cache.sample))
    }

    /// Time of the last answered query
    pub fn cached_time(&self) -> Option<f64> {
        self.cache.time
    }

    /// Whether the owner finished its work for the cached time
    pub fn is_fresh(&self) -> bool {
        self.cache.fresh
    }

    /// Whether the cache is fresh and answers `time`
    pub fn is_fresh_for(&self, time: f64) -> bool {
        self.cache.fresh && self.cache.time == Some(time)
    }

    /// Flag the cached time as fully processed by the owner
    ///
    /// Has no effect when nothing is cached.
    pub fn mark_fresh(&mut self) {
        self.cache.fresh = self.cache.time.is_some();
    }

    /// Lower the fresh flag, keeping the cached pose
    pub fn clear_fresh(&mut self) {
        self.cache.fresh = false;
    }

    /// Forget the cached query entirely
    pub fn invalidate(&mut self) {
        self.cache = QueryCache::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Quat, Vec3};
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    fn at_x(x: f32) -> TransformSample {
        TransformSample::from_position(Vec3::new(x, 0.0, 0.0))
    }

    fn filled(times: &[f64]) -> HistoryBuffer {
        let mut buffer = HistoryBuffer::new(8);
        for &time in times {
            buffer.record(time, at_x(time as f32 * 10.0)).expect("monotonic");
        }
        buffer
    }

    #[test]
    fn test_empty_history_underflows() {
        let mut buffer = HistoryBuffer::default();
        let result = buffer.interpolate(1.0, &TransformSample::identity(), 2.0);
        assert_eq!(
            result,
            Err(HistoryError::Underflow { query_time: 1.0, oldest: None })
        );
        assert!(buffer.cached().is_none());
    }

    #[test]
    fn test_query_before_oldest_underflows() {
        let mut buffer = filled(&[1.0, 2.0]);
        let result = buffer.interpolate(0.5, &TransformSample::identity(), 3.0);
        assert!(matches!(
            result,
            Err(HistoryError::Underflow { oldest: Some(t), .. }) if (t - 1.0).abs() < 1e-12
        ));
    }

    #[test]
    fn test_interpolates_between_frames() {
        let mut buffer = filled(&[1.0, 2.0, 3.0]);
        let pose = buffer
            .interpolate(2.25, &TransformSample::identity(), 4.0)
            .expect("inside history");
        assert_relative_eq!(pose.position.x, 22.5, epsilon = EPSILON);
    }

    #[test]
    fn test_exact_frame_time_returns_frame() {
        let mut buffer = filled(&[1.0, 2.0, 3.0]);
        let pose = buffer
            .interpolate(2.0, &TransformSample::identity(), 4.0)
            .expect("inside history");
        assert_relative_eq!(pose.position.x, 20.0, epsilon = EPSILON);
    }

    #[test]
    fn test_past_newest_blends_toward_live() {
        let mut buffer = filled(&[1.0, 2.0]);
        let live = at_x(40.0);
        // Newest frame at t=2 is x=20; live x=40 at now=4
        let pose = buffer.interpolate(3.0, &live, 4.0).expect("recent past");
        assert_relative_eq!(pose.position.x, 30.0, epsilon = EPSILON);

        let beyond = buffer.interpolate(9.0, &live, 4.0).expect("future clamps");
        assert_relative_eq!(beyond.position.x, 40.0, epsilon = EPSILON);
    }

    #[test]
    fn test_past_newest_with_stalled_clock() {
        let mut buffer = filled(&[1.0]);
        let live = at_x(5.0);
        let pose = buffer.interpolate(1.5, &live, 1.0).expect("recent past");
        assert_relative_eq!(pose.position.x, 5.0, epsilon = EPSILON);
    }

    #[test]
    fn test_rotation_is_slerped() {
        let mut buffer = HistoryBuffer::new(4);
        buffer.record(0.0, TransformSample::identity()).expect("first");
        buffer
            .record(
                1.0,
                TransformSample::new(
                    Vec3::zeros(),
                    Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2),
                ),
            )
            .expect("second");
        let pose = buffer
            .interpolate(0.5, &TransformSample::identity(), 2.0)
            .expect("inside");
        assert_relative_eq!(pose.rotation.angle(), std::f32::consts::FRAC_PI_4, epsilon = EPSILON);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut buffer = HistoryBuffer::new(3);
        for i in 0..5 {
            buffer.record(f64::from(i), at_x(i as f32)).expect("monotonic");
        }
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.oldest_time(), Some(2.0));
        assert_eq!(buffer.newest_time(), Some(4.0));
        let times: Vec<f64> = buffer.iter().map(|(time, _)| *time).collect();
        assert_eq!(times, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_rejects_out_of_order_frames() {
        let mut buffer = filled(&[1.0, 2.0]);
        assert_eq!(
            buffer.record(2.0, at_x(0.0)),
            Err(HistoryError::NonMonotonicTime { time: 2.0, latest: 2.0 })
        );
        assert!(buffer.record(1.5, at_x(0.0)).is_err());
        assert!(buffer.record(f64::NAN, at_x(0.0)).is_err());
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_same_time_query_uses_cache_without_freshness() {
        let mut buffer = filled(&[1.0, 2.0]);
        let live = at_x(100.0);
        let first = buffer.interpolate(2.5, &live, 3.0).expect("recent past");
        // Moving the live pose does not change a repeated query
        let second = buffer.interpolate(2.5, &at_x(-100.0), 3.0).expect("cached");
        assert_eq!(first, second);
        assert!(!buffer.is_fresh());

        buffer.mark_fresh();
        assert!(buffer.is_fresh_for(2.5));
        buffer.interpolate(2.5, &live, 3.0).expect("cached");
        assert!(buffer.is_fresh_for(2.5));

        buffer.interpolate(1.5, &live, 3.0).expect("new time");
        assert!(!buffer.is_fresh());
    }

    #[test]
    fn test_record_and_invalidate_drop_cache() {
        let mut buffer = filled(&[1.0, 2.0]);
        buffer.interpolate(1.5, &TransformSample::identity(), 3.0).expect("inside");
        buffer.mark_fresh();
        buffer.record(3.0, at_x(30.0)).expect("monotonic");
        assert!(buffer.cached().is_none());
        assert!(!buffer.is_fresh());

        buffer.interpolate(1.5, &TransformSample::identity(), 3.0).expect("inside");
        buffer.invalidate();
        assert!(buffer.cached_time().is_none());
    }

    #[test]
    fn test_mark_fresh_without_cache_is_noop() {
        let mut buffer = HistoryBuffer::default();
        buffer.mark_fresh();
        assert!(!buffer.is_fresh());
    }

    #[test]
    fn test_shrinking_capacity_keeps_newest() {
        let mut buffer = filled(&[1.0, 2.0, 3.0, 4.0]);
        buffer.set_capacity(2);
        assert_eq!(buffer.capacity(), 2);
        assert_eq!(buffer.oldest_time(), Some(3.0));
    }
}
