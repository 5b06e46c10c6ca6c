//! Arrow tables and Parquet I/O
//!
//! Result rows convert to columnar [`RecordBatch`]es with one column per
//! field and one nullable `Float64` column per metric. Undefined metric
//! values and missing winners become nulls.
//!
//! Ground-truth series can be loaded from a numeric Parquet column.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, AsArray, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Float64Type, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;

use crate::evaluation::{BestRow, EvaluationRow, SummaryRow, Winner};
use crate::experiment::Condition;
use crate::metrics::{Metric, MetricValue};
use crate::series::{Dataset, DatasetId};
use crate::{Error, Result};

/// Conversion of a row collection into a single record batch.
pub trait ToRecordBatch {
    /// Build the batch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Arrow`] if the columns do not form a valid batch.
    fn to_record_batch(&self) -> Result<RecordBatch>;
}

/// Columns accumulated in schema order.
#[derive(Default)]
struct Columns {
    fields: Vec<Field>,
    arrays: Vec<ArrayRef>,
}

impl Columns {
    fn push(&mut self, field: Field, array: ArrayRef) {
        self.fields.push(field);
        self.arrays.push(array);
    }

    fn conditions<'a>(&mut self, conditions: impl Iterator<Item = &'a Condition> + Clone) {
        let datasets: Vec<&str> = conditions.clone().map(|c| &*c.dataset).collect();
        let proportions: Vec<f64> = conditions.clone().map(|c| c.proportion).collect();
        let widths: Vec<u64> = conditions.map(|c| c.gap_width as u64).collect();
        self.push(
            Field::new("dataset", DataType::Utf8, false),
            Arc::new(StringArray::from(datasets)),
        );
        self.push(
            Field::new("proportion", DataType::Float64, false),
            Arc::new(Float64Array::from(proportions)),
        );
        self.push(
            Field::new("gap_width", DataType::UInt64, false),
            Arc::new(UInt64Array::from(widths)),
        );
    }

    fn counts(&mut self, name: &str, values: Vec<u64>) {
        self.push(
            Field::new(name, DataType::UInt64, false),
            Arc::new(UInt64Array::from(values)),
        );
    }

    fn winners<'a>(&mut self, winners: impl Iterator<Item = Option<&'a Winner>> + Clone) {
        let names: Vec<Option<&str>> = winners.clone().map(|w| w.map(|w| &*w.algorithm)).collect();
        let ranks: Vec<Option<u64>> = winners.map(|w| w.map(|w| w.rank as u64)).collect();
        self.push(
            Field::new("winner", DataType::Utf8, true),
            Arc::new(StringArray::from(names)),
        );
        self.push(
            Field::new("winner_rank", DataType::UInt64, true),
            Arc::new(UInt64Array::from(ranks)),
        );
    }

    fn values(&mut self, name: &str, values: impl Iterator<Item = MetricValue>) {
        let values: Vec<Option<f64>> = values.map(MetricValue::value).collect();
        self.push(
            Field::new(name, DataType::Float64, true),
            Arc::new(Float64Array::from(values)),
        );
    }

    fn finish(self) -> Result<RecordBatch> {
        Ok(RecordBatch::try_new(
            Arc::new(Schema::new(self.fields)),
            self.arrays,
        )?)
    }
}

impl ToRecordBatch for [EvaluationRow] {
    fn to_record_batch(&self) -> Result<RecordBatch> {
        let mut columns = Columns::default();
        columns.conditions(self.iter().map(|row| &row.condition));
        columns.push(
            Field::new("algorithm", DataType::Utf8, false),
            Arc::new(StringArray::from(
                self.iter().map(|row| &*row.algorithm).collect::<Vec<_>>(),
            )),
        );
        columns.counts(
            "algorithm_rank",
            self.iter().map(|row| row.algorithm_rank as u64).collect(),
        );
        columns.counts(
            "replicates",
            self.iter().map(|row| row.replicates as u64).collect(),
        );
        columns.counts(
            "failures",
            self.iter().map(|row| row.failures as u64).collect(),
        );
        for metric in Metric::ALL {
            columns.values(metric.name(), self.iter().map(|row| row.metrics.get(metric)));
        }
        columns.finish()
    }
}

impl ToRecordBatch for [BestRow] {
    fn to_record_batch(&self) -> Result<RecordBatch> {
        let mut columns = Columns::default();
        columns.conditions(self.iter().map(|row| &row.condition));
        columns.push(
            Field::new("metric", DataType::Utf8, false),
            Arc::new(StringArray::from(
                self.iter().map(|row| row.metric.name()).collect::<Vec<_>>(),
            )),
        );
        columns.push(
            Field::new("direction", DataType::Utf8, false),
            Arc::new(StringArray::from(
                self.iter().map(|row| row.direction.name()).collect::<Vec<_>>(),
            )),
        );
        columns.winners(self.iter().map(|row| row.winner.as_ref()));
        columns.values("value", self.iter().map(|row| row.value));
        columns.finish()
    }
}

impl ToRecordBatch for [SummaryRow] {
    fn to_record_batch(&self) -> Result<RecordBatch> {
        let mut columns = Columns::default();
        columns.conditions(self.iter().map(|row| &row.condition));
        columns.winners(self.iter().map(|row| row.winner.as_ref()));
        columns.counts("wins", self.iter().map(|row| row.wins as u64).collect());
        columns.counts("decided", self.iter().map(|row| row.decided as u64).collect());
        columns.finish()
    }
}

/// Write one batch to a Parquet file, replacing any existing file.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be created and
/// [`Error::Parquet`] if encoding fails.
pub fn write_parquet<P: AsRef<Path>>(batch: &RecordBatch, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

/// Read every record batch of a Parquet file.
///
/// # Errors
///
/// Returns [`Error::StorageError`] if the file cannot be opened or parsed.
pub fn read_parquet<P: AsRef<Path>>(path: P) -> Result<Vec<RecordBatch>> {
    let file = File::open(path.as_ref())
        .map_err(|e| Error::StorageError(format!("Failed to open Parquet file: {e}")))?;

    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| Error::StorageError(format!("Failed to parse Parquet file: {e}")))?
        .build()
        .map_err(|e| Error::StorageError(format!("Failed to create Parquet reader: {e}")))?;

    reader
        .map(|batch| {
            batch.map_err(|e| Error::StorageError(format!("Failed to read record batch: {e}")))
        })
        .collect()
}

/// Load one numeric column of a Parquet file as a ground-truth dataset.
///
/// Any numeric column type is cast to `Float64`.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the column is missing, not numeric, or
/// contains nulls, and [`Error::StorageError`] if the file cannot be read.
pub fn load_dataset_parquet<P: AsRef<Path>>(
    path: P,
    column: &str,
    name: impl Into<DatasetId>,
) -> Result<Dataset> {
    let mut values = Vec::new();
    for batch in read_parquet(path)? {
        let schema = batch.schema();
        let Some((index, field)) = schema.column_with_name(column) else {
            return Err(Error::InvalidInput(format!("no column named {column}")));
        };
        if !field.data_type().is_numeric() {
            return Err(Error::InvalidInput(format!(
                "column {column} has non-numeric type {}",
                field.data_type()
            )));
        }

        let array = arrow::compute::cast(batch.column(index), &DataType::Float64)?;
        if array.null_count() > 0 {
            return Err(Error::InvalidInput(format!(
                "column {column} contains {} nulls",
                array.null_count()
            )));
        }
        values.extend_from_slice(array.as_primitive::<Float64Type>().values());
    }

    Ok(Dataset::new(name, values))
}
