//! C10: streams batch records in from a delimited source and writes results
//! out incrementally, flushing after every row for crash safety.

use crate::error::{BatchError, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

pub type Record = BTreeMap<String, String>;

#[derive(Debug)]
pub struct CsvSource {
    records: Vec<Record>,
}

impl CsvSource {
    /// Read the whole file up front, validating `query_column` is present
    /// and augmenting each record with a synthetic `row_id`.
    pub fn load(path: &Path, delimiter: char, query_column: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter as u8)
            .from_path(path)?;

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if !headers.iter().any(|h| h == query_column) {
            return Err(BatchError::MissingQueryColumn(query_column.to_string(), headers.join(", ")));
        }

        let mut records = Vec::new();
        for (row_id, result) in reader.records().enumerate() {
            let row = result?;
            let mut record: Record = headers.iter().cloned().zip(row.iter().map(str::to_string)).collect();
            record.insert("row_id".to_string(), row_id.to_string());
            records.push(record);
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }
}

pub struct BatchResultRow {
    pub record_id: String,
    pub success: bool,
    pub response: String,
    pub error: Option<String>,
    pub cost: Option<f64>,
    pub tokens: Option<u64>,
    pub latency: Option<f64>,
    pub original_record: Record,
}

/// Column set is fixed on the first write: the base columns, metrics
/// columns if any result carries metrics, and `original_<col>` for every
/// non-`row_id` column observed on the first record.
pub struct CsvSink {
    writer: Option<csv::Writer<File>>,
    columns: Vec<String>,
    delimiter: u8,
    path: std::path::PathBuf,
    rows_written: usize,
}

impl CsvSink {
    pub fn new(path: &Path, delimiter: char) -> Self {
        Self {
            writer: None,
            columns: Vec::new(),
            delimiter: delimiter as u8,
            path: path.to_path_buf(),
            rows_written: 0,
        }
    }

    fn ensure_open(&mut self, first: &BatchResultRow) -> Result<()> {
        if self.writer.is_some() {
            return Ok(());
        }

        let mut columns = vec!["record_id".to_string(), "success".to_string(), "response".to_string(), "error".to_string()];
        if first.cost.is_some() || first.tokens.is_some() || first.latency.is_some() {
            columns.extend(["cost".to_string(), "tokens".to_string(), "latency".to_string()]);
        }
        for key in first.original_record.keys() {
            if key != "row_id" {
                columns.push(format!("original_{key}"));
            }
        }

        let mut writer = csv::WriterBuilder::new().delimiter(self.delimiter).from_path(&self.path)?;
        writer.write_record(&columns)?;
        self.columns = columns;
        self.writer = Some(writer);
        Ok(())
    }

    pub fn write_row(&mut self, row: BatchResultRow) -> Result<()> {
        self.ensure_open(&row)?;
        let writer = self.writer.as_mut().expect("ensure_open populates writer");

        let mut fields = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let value = match column.as_str() {
                "record_id" => row.record_id.clone(),
                "success" => row.success.to_string(),
                "response" => row.response.clone(),
                "error" => row.error.clone().unwrap_or_default(),
                "cost" => row.cost.map(|v| v.to_string()).unwrap_or_default(),
                "tokens" => row.tokens.map(|v| v.to_string()).unwrap_or_default(),
                "latency" => row.latency.map(|v| v.to_string()).unwrap_or_default(),
                other => other
                    .strip_prefix("original_")
                    .and_then(|key| row.original_record.get(key))
                    .cloned()
                    .unwrap_or_default(),
            };
            fields.push(value);
        }

        writer.write_record(&fields)?;
        writer.flush()?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn finalize(mut self) -> Result<usize> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(self.rows_written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn source_validates_query_column_presence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.csv");
        std::fs::write(&path, "id,text\n1,hello\n").unwrap();

        let err = CsvSource::load(&path, ',', "prompt").unwrap_err();
        assert!(matches!(err, BatchError::MissingQueryColumn(_, _)));
    }

    #[test]
    fn source_augments_rows_with_row_id() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.csv");
        std::fs::write(&path, "id,query\n1,hello\n2,world\n").unwrap();

        let source = CsvSource::load(&path, ',', "query").unwrap();
        assert_eq!(source.records().len(), 2);
        assert_eq!(source.records()[0].get("row_id").unwrap(), "0");
        assert_eq!(source.records()[1].get("row_id").unwrap(), "1");
    }

    #[test]
    fn sink_writes_header_and_rows_with_original_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut sink = CsvSink::new(&path, ',');

        let mut original = Record::new();
        original.insert("row_id".to_string(), "0".to_string());
        original.insert("id".to_string(), "1".to_string());

        sink.write_row(BatchResultRow {
            record_id: "0".to_string(),
            success: true,
            response: "hi".to_string(),
            error: None,
            cost: None,
            tokens: None,
            latency: None,
            original_record: original,
        })
        .unwrap();
        let count = sink.finalize().unwrap();
        assert_eq!(count, 1);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("record_id,success,response,error,original_id"));
        assert!(contents.contains("0,true,hi,,1"));
    }

    #[test]
    fn sink_includes_metrics_columns_when_present() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut sink = CsvSink::new(&path, ',');
        sink.write_row(BatchResultRow {
            record_id: "0".to_string(),
            success: true,
            response: "hi".to_string(),
            error: None,
            cost: Some(0.01),
            tokens: Some(42),
            latency: Some(1.5),
            original_record: Record::new(),
        })
        .unwrap();
        sink.finalize().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("record_id,success,response,error,cost,tokens,latency"));
    }
}
