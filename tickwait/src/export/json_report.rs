use serde::Serialize;
use std::io::Write;

use crate::domain::{ExportError, SupervisionReport, TimerConfig};
use crate::supervision::Worker;

/// Report file container
#[derive(Debug, Serialize)]
struct ReportFile<'a> {
    tool: &'static str,
    version: &'static str,
    #[serde(rename = "intervalMs")]
    interval_ms: u64,
    #[serde(rename = "workerLifetimeMs")]
    worker_lifetime_ms: u64,
    /// Interruptions a perfectly punctual timer would cause
    #[serde(rename = "expectedInterruptions")]
    expected_interruptions: u64,
    report: &'a SupervisionReport,
}

/// Writes a [`SupervisionReport`] together with the configuration that produced it
pub struct ReportExporter {
    timer: TimerConfig,
    worker: Worker,
}

impl ReportExporter {
    pub fn new(timer: TimerConfig, worker: Worker) -> Self {
        Self { timer, worker }
    }

    /// Serialize `report` as pretty-printed JSON into `writer`
    ///
    /// # Errors
    /// Returns error if serialization or writing fails.
    pub fn export<W: Write>(&self, report: &SupervisionReport, mut writer: W) -> Result<(), ExportError> {
        let file = ReportFile {
            tool: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            interval_ms: millis(self.timer.interval().as_millis()),
            worker_lifetime_ms: millis(self.worker.lifetime().as_millis()),
            expected_interruptions: self.timer.ticks_within(self.worker.lifetime()),
            report,
        };
        serde_json::to_writer_pretty(&mut writer, &file)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

fn millis(ms: u128) -> u64 {
    u64::try_from(ms).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExitStatus, ResourceUsage};
    use std::time::Duration;

    fn sample_report() -> SupervisionReport {
        SupervisionReport {
            pid: 4242,
            status: ExitStatus::from_raw(2 << 8),
            usage: ResourceUsage { user_time_us: 10, system_time_us: 20, max_rss_kib: 1024 },
            interruptions: 6,
            heartbeats: 6,
            elapsed_ms: 3004,
        }
    }

    #[test]
    fn test_export_structure() {
        let exporter = ReportExporter::new(TimerConfig::default(), Worker::default());
        let mut buffer = Vec::new();
        exporter.export(&sample_report(), &mut buffer).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed["tool"], "tickwait");
        assert_eq!(parsed["intervalMs"], 500);
        assert_eq!(parsed["workerLifetimeMs"], 3000);
        assert_eq!(parsed["expectedInterruptions"], 6);
        assert_eq!(parsed["report"]["pid"], 4242);
        assert_eq!(parsed["report"]["status"]["raw"], 512);
        assert_eq!(parsed["report"]["status"]["kind"], "exited");
        assert_eq!(parsed["report"]["status"]["code"], 2);
        assert_eq!(parsed["report"]["usage"]["max_rss_kib"], 1024);
    }

    #[test]
    fn test_export_expected_interruptions_for_short_worker() {
        let exporter =
            ReportExporter::new(TimerConfig::default(), Worker::new(Duration::from_millis(100)));
        let mut buffer = Vec::new();
        exporter.export(&sample_report(), &mut buffer).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed["expectedInterruptions"], 0);
    }

    /// Buffers everything, then refuses to flush
    struct UnflushableWriter(Vec<u8>);

    impl Write for UnflushableWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::WriteZero, "disk full"))
        }
    }

    #[test]
    fn test_flush_failure_keeps_io_error() {
        let exporter = ReportExporter::new(TimerConfig::default(), Worker::default());
        let result = exporter.export(&sample_report(), UnflushableWriter(Vec::new()));

        assert!(
            matches!(result, Err(ExportError::Io(ref e)) if e.kind() == std::io::ErrorKind::WriteZero),
            "unexpected result: {result:?}"
        );
    }
}
