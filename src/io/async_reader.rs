//! Asynchronous CSV decoding
//!
//! Decodes uploaded bytes into raw rows. Nothing is interpreted here: the
//! first row is returned like any other and the caller treats it as the
//! header. Rows may have different lengths; short rows are handled by the
//! parsers as field-level errors.
//!
//! # Architecture
//!
//! ```text
//! bytes → RecordReader (csv-async) → Vec<Row> → header resolver / batch processor
//! ```

use csv_async::AsyncReaderBuilder;
use futures::io::{AsyncRead, Cursor};
use futures::stream::StreamExt;

use crate::strategy::Row;
use crate::types::UploadError;

/// Streaming reader of raw CSV rows
pub struct RecordReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncReader<R>,
}

impl<R: AsyncRead + Unpin + Send> RecordReader<R> {
    /// Create a new RecordReader from an async reader
    ///
    /// Headers are not consumed and ragged rows are accepted.
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .create_reader(reader);

        Self { csv_reader }
    }

    /// Read every remaining row
    pub async fn read_all(mut self) -> Result<Vec<Row>, UploadError> {
        let mut rows = Vec::new();
        let mut records = self.csv_reader.records();
        while let Some(record) = records.next().await {
            rows.push(record?.iter().map(str::to_string).collect());
        }
        Ok(rows)
    }
}

/// Decode a whole upload into rows, header included
pub async fn read_records(content: &[u8]) -> Result<Vec<Row>, UploadError> {
    RecordReader::new(Cursor::new(content)).read_all().await
}
