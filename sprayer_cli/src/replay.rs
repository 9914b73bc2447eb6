//! JSON-lines detection streams.
//!
//! One frame per line: `{"t_ms": 40, "centers": [[x, y]], "boxes": [[x, y, w, h]]}`.
//! `t_ms` is the capture time relative to the start of the stream. When a
//! frame carries boxes but no centers, the centers are derived from the boxes.

use std::io::BufRead;
use std::time::Duration;

use eyre::WrapErr;
use serde::Deserialize;
use sprayer_core::{BoundingBox, Detections, Point};

#[derive(Debug, Deserialize)]
struct FrameRecord {
    t_ms: u64,
    #[serde(default)]
    centers: Vec<[i32; 2]>,
    #[serde(default)]
    boxes: Vec<[i32; 4]>,
}

#[derive(Debug, Clone)]
pub struct Frame {
    /// Capture time relative to the start of the stream.
    pub at: Duration,
    pub detections: Detections,
}

impl From<FrameRecord> for Frame {
    fn from(r: FrameRecord) -> Self {
        let boxes: Vec<BoundingBox> = r
            .boxes
            .iter()
            .map(|&[x, y, w, h]| BoundingBox { x, y, w, h })
            .collect();
        let detections = if r.centers.is_empty() {
            Detections::from_boxes(boxes)
        } else {
            Detections {
                centers: r.centers.iter().map(|&[x, y]| Point::new(x, y)).collect(),
                boxes,
            }
        };
        Self {
            at: Duration::from_millis(r.t_ms),
            detections,
        }
    }
}

/// Parse a whole stream. Blank lines and lines starting with `#` are skipped.
pub fn parse(reader: impl BufRead) -> eyre::Result<Vec<Frame>> {
    let mut frames = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.wrap_err("read detection stream")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let rec: FrameRecord = serde_json::from_str(line)
            .wrap_err_with(|| format!("detection stream line {}", idx + 1))?;
        frames.push(Frame::from(rec));
    }
    if frames.windows(2).any(|w| w[1].at < w[0].at) {
        eyre::bail!("detection stream timestamps (t_ms) must not decrease");
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_centers_and_derives_from_boxes() {
        let text = r#"
# recorded on the test field
{"t_ms": 0, "centers": [[700, 400]]}
{"t_ms": 40, "boxes": [[100, 300, 20, 40]]}

{"t_ms": 80}
"#;
        let frames = parse(text.as_bytes()).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].detections.centers, vec![Point::new(700, 400)]);
        assert_eq!(frames[1].at, Duration::from_millis(40));
        assert_eq!(frames[1].detections.centers, vec![Point::new(110, 320)]);
        assert!(frames[2].detections.is_empty());
    }

    #[test]
    fn reports_bad_line_number() {
        let err = parse("{\"t_ms\": 0}\n{\"t_ms\": \"x\"}\n".as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn rejects_time_going_backwards() {
        assert!(parse("{\"t_ms\": 50}\n{\"t_ms\": 10}\n".as_bytes()).is_err());
    }

    #[test]
    fn extreme_box_coordinates_do_not_overflow() {
        let line = r#"{"t_ms": 0, "boxes": [[2147483647, 400, 4, 4]]}"#;
        let frames = parse(line.as_bytes()).unwrap();
        assert_eq!(frames[0].detections.centers, vec![Point::new(i32::MAX, 402)]);
    }
}
