//! Report Emitter
//!
//! Serializes the aggregated records as a single JSON array. The whole
//! document is encoded before anything is written, so a failed encoding
//! never leaves half a report on the output stream.

use crate::domain::ports::VmStatsRecord;
use crate::error::{Error, Result};
use std::io::Write;

/// Output layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Compact,
    Pretty,
}

/// Encode records into a JSON document
pub fn encode_report(records: &[VmStatsRecord], format: ReportFormat) -> Result<Vec<u8>> {
    let encoded = match format {
        ReportFormat::Compact => serde_json::to_vec(records),
        ReportFormat::Pretty => serde_json::to_vec_pretty(records),
    };
    encoded.map_err(Error::Encoding)
}

/// Encode records and write them, newline-terminated, to `out`
pub fn write_report<W: Write>(
    records: &[VmStatsRecord],
    format: ReportFormat,
    mut out: W,
) -> Result<()> {
    let mut document = encode_report(records, format)?;
    document.push(b'\n');
    out.write_all(&document)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::VmStatus;

    fn record(id: &str) -> VmStatsRecord {
        VmStatsRecord {
            id: id.into(),
            name: Some(format!("{id}-name")),
            memory: Some(4_294_967_296),
            status: Some(VmStatus::Up),
            hdd_disk_size: 5_368_709_120,
            ssd_disk_size: 10_737_418_240,
            disk_count: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_report_is_empty_array() {
        let mut out = Vec::new();
        write_report(&[], ReportFormat::Compact, &mut out).unwrap();
        assert_eq!(out, b"[]\n");
    }

    #[test]
    fn test_report_shape() {
        let mut out = Vec::new();
        write_report(&[record("vm-1"), record("vm-2")], ReportFormat::Compact, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], "vm-1");
        assert_eq!(rows[0]["status"], "up");
        assert_eq!(rows[0]["memory"], 4_294_967_296u64);
        assert_eq!(rows[0]["ssd_disk_size"], 10_737_418_240u64);
        assert_eq!(rows[0]["hdd_disk_size"], 5_368_709_120u64);
        assert_eq!(rows[0]["disk_count"], 2);
        assert!(rows[0].get("fqdn").is_none());
    }

    #[test]
    fn test_pretty_and_compact_agree() {
        let records = [record("vm-1")];
        let compact = encode_report(&records, ReportFormat::Compact).unwrap();
        let pretty = encode_report(&records, ReportFormat::Pretty).unwrap();

        assert!(pretty.len() > compact.len());
        let a: serde_json::Value = serde_json::from_slice(&compact).unwrap();
        let b: serde_json::Value = serde_json::from_slice(&pretty).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_write_failure_is_io_error() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let err = write_report(&[record("vm-1")], ReportFormat::Compact, Broken).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
