//! Per-frame detector output as seen by the dispatcher.

/// Pixel coordinate; `y` grows towards the bottom of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl BoundingBox {
    /// Saturates at the `i32` range; such centers fall outside every lane.
    pub fn center(&self) -> Point {
        Point::new(midpoint(self.x, self.w), midpoint(self.y, self.h))
    }
}

fn midpoint(origin: i32, extent: i32) -> i32 {
    let mid = i64::from(origin) + i64::from(extent) / 2;
    mid.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Detections of one processed frame. Only `centers` drive actuation.
#[derive(Debug, Clone, Default)]
pub struct Detections {
    pub centers: Vec<Point>,
    pub boxes: Vec<BoundingBox>,
}

impl Detections {
    pub fn from_centers(centers: impl IntoIterator<Item = Point>) -> Self {
        Self {
            centers: centers.into_iter().collect(),
            boxes: Vec::new(),
        }
    }

    /// Build from boxes only, deriving each center.
    pub fn from_boxes(boxes: Vec<BoundingBox>) -> Self {
        Self {
            centers: boxes.iter().map(BoundingBox::center).collect(),
            boxes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }
}
