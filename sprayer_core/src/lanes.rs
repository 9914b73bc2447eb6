//! Partition of the frame width into one lane per nozzle.
//!
//! Boundaries use integer arithmetic, `start[i] = floor(i * W / N)` and
//! `end[i] = start[i + 1]`, so the lanes tile `[0, W)` without gaps or
//! overlaps regardless of whether `W` divides evenly by `N`.

use crate::error::BuildError;

/// Half-open pixel interval `[start, end)` covered by one nozzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lane {
    pub index: usize,
    pub start: u32,
    pub end: u32,
}

impl Lane {
    pub fn contains(&self, x: i64) -> bool {
        i64::from(self.start) <= x && x < i64::from(self.end)
    }

    pub fn width(&self) -> u32 {
        self.end - self.start
    }
}

#[derive(Debug, Clone)]
pub struct LaneMap {
    width: u32,
    lanes: Vec<Lane>,
}

#[inline]
fn boundary(i: usize, width: u32, count: usize) -> u32 {
    // u64 intermediates: i * W cannot overflow for any u32 width
    ((i as u64 * u64::from(width)) / count as u64) as u32
}

impl LaneMap {
    /// Build `count` lanes over a frame `width` pixels wide.
    pub fn new(width: u32, count: usize) -> Result<Self, BuildError> {
        if count == 0 {
            return Err(BuildError::InvalidConfig("lane count must be >= 1"));
        }
        if (width as usize) < count {
            return Err(BuildError::InvalidConfig(
                "frame width must be at least one pixel per lane",
            ));
        }
        let lanes = (0..count)
            .map(|i| Lane {
                index: i,
                start: boundary(i, width, count),
                end: boundary(i + 1, width, count),
            })
            .collect();
        Ok(Self { width, lanes })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    /// Lane whose interval contains `x`; `None` outside `[0, width)`.
    pub fn lane_of(&self, x: i64) -> Option<usize> {
        if x < 0 || x >= i64::from(self.width) {
            return None;
        }
        // lanes[0].start == 0 <= x, so the partition point is >= 1
        let idx = self.lanes.partition_point(|l| i64::from(l.start) <= x) - 1;
        debug_assert!(self.lanes[idx].contains(x));
        Some(idx)
    }

    /// All lanes matching `x`: zero or one with integer boundaries.
    pub fn lanes_for(&self, x: i64) -> impl Iterator<Item = usize> + '_ {
        self.lane_of(x).into_iter()
    }
}
