//! Per-job log records: lane, detection time, location, delay, duration.
use std::fs::OpenOptions;
use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use eyre::WrapErr;

use crate::error::Result;
use crate::job::ActuationJob;

pub trait JobLogger: Send {
    fn record(&mut self, job: &ActuationJob) -> Result<()>;
}

/// Wall-clock milliseconds since the Unix epoch at which `at` happened.
pub fn unix_ms(at: Instant) -> u64 {
    let age = Instant::now().saturating_duration_since(at);
    SystemTime::now()
        .checked_sub(age)
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis().min(u128::from(u64::MAX)) as u64)
        .unwrap_or(0)
}

/// Emits each job as a `tracing` event at info level.
#[derive(Debug, Default)]
pub struct TracingJobLogger;

impl JobLogger for TracingJobLogger {
    fn record(&mut self, job: &ActuationJob) -> Result<()> {
        let (x, y) = job.location.map(|p| (p.x, p.y)).unwrap_or((-1, -1));
        tracing::info!(
            target: "sprayer::jobs",
            lane = job.lane,
            detected_ms = unix_ms(job.detected_at),
            x,
            y,
            delay_s = job.delay.as_secs_f64(),
            duration_s = job.duration.as_secs_f64(),
            "job"
        );
        Ok(())
    }
}

/// Appends one CSV row per job; writes the header when the file is new.
///
/// Header: `lane,detected_ms,x,y,delay_s,duration_s`
pub struct CsvJobLogger {
    writer: csv::Writer<std::fs::File>,
}

impl CsvJobLogger {
    pub const HEADER: [&'static str; 6] = ["lane", "detected_ms", "x", "y", "delay_s", "duration_s"];

    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .wrap_err_with(|| format!("open job log {}", path.display()))?;
        let fresh = file.metadata().map(|m| m.len() == 0).unwrap_or(true);
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if fresh {
            writer.write_record(Self::HEADER)?;
            writer.flush()?;
        }
        Ok(Self { writer })
    }
}

impl JobLogger for CsvJobLogger {
    fn record(&mut self, job: &ActuationJob) -> Result<()> {
        let (x, y) = job
            .location
            .map(|p| (p.x.to_string(), p.y.to_string()))
            .unwrap_or_default();
        self.writer.write_record([
            job.lane.to_string(),
            unix_ms(job.detected_at).to_string(),
            x,
            y,
            format!("{:.3}", job.delay.as_secs_f64()),
            format!("{:.3}", job.duration.as_secs_f64()),
        ])?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Point;
    use std::time::Duration;

    #[test]
    fn csv_log_appends_rows_under_single_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weed_log.csv");
        let job = ActuationJob::new(
            2,
            Instant::now(),
            Duration::from_millis(50),
            Duration::from_millis(800),
        )
        .at(Point::new(700, 400));

        CsvJobLogger::open(&path).unwrap().record(&job).unwrap();
        // reopening must not repeat the header
        CsvJobLogger::open(&path).unwrap().record(&job).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "lane,detected_ms,x,y,delay_s,duration_s");
        assert!(lines[1].starts_with("2,"));
        assert!(lines[1].ends_with(",700,400,0.050,0.800"));
    }

    #[test]
    fn unix_ms_is_close_to_now() {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let ms = unix_ms(Instant::now());
        assert!(ms.abs_diff(now_ms) < 1_000);
    }
}
