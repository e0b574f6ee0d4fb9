use crate::store::StepRecord;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

pub fn write_json<T: Serialize + ?Sized, P: AsRef<Path>>(
    value: &T,
    path: P,
) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}

#[derive(Serialize)]
struct Row {
    id: String,
    timestamp: String,
    steps: u32,
}

impl From<&StepRecord> for Row {
    fn from(r: &StepRecord) -> Self {
        Row {
            id: r.id.to_string(),
            timestamp: r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            steps: r.steps,
        }
    }
}

/// Write `records` as CSV with an `id,timestamp,steps` header.
pub fn write_csv(writer: impl Write, records: &[StepRecord]) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for r in records {
        wtr.serialize(Row::from(r))?;
    }
    wtr.flush().map_err(Into::into)
}

pub fn save_records_csv<P: AsRef<Path>>(path: P, records: &[StepRecord]) -> csv::Result<()> {
    write_csv(std::fs::File::create(path)?, records)
}

pub fn save_records_json<P: AsRef<Path>>(path: P, records: &[StepRecord]) -> std::io::Result<()> {
    write_json(records, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn sample() -> Vec<StepRecord> {
        vec![StepRecord {
            id: Uuid::nil(),
            timestamp: NaiveDate::from_ymd_opt(2024, 2, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            steps: 123,
        }]
    }

    #[test]
    fn csv_has_header_and_rows() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &sample()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "id,timestamp,steps\n00000000-0000-0000-0000-000000000000,2024-02-01 08:00:00,123\n"
        );
    }

    #[test]
    fn json_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steps.json");
        save_records_json(&path, &sample()).unwrap();
        let data = std::fs::read_to_string(&path).unwrap();
        let loaded: Vec<StepRecord> = serde_json::from_str(&data).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn csv_file_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steps.csv");
        save_records_csv(&path, &sample()).unwrap();
        let data = std::fs::read_to_string(&path).unwrap();
        assert!(data.starts_with("id,timestamp,steps\n"));
    }
}
