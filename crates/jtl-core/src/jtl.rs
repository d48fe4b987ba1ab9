//! CSV sink and reader for JTL result files.

use crate::record::{JtlRecord, JTL_HEADER};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Streams records to a JTL file, header first.
pub struct JtlWriter<W: Write> {
    inner: csv::Writer<W>,
    written: u64,
}

impl JtlWriter<File> {
    /// Create (or truncate) the file at `path`, creating parent directories.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {:?}", parent))?;
            }
        }

        let file =
            File::create(path).with_context(|| format!("Failed to create JTL file {:?}", path))?;
        Self::from_writer(file)
    }
}

impl<W: Write> JtlWriter<W> {
    pub fn from_writer(writer: W) -> Result<Self> {
        // Header is written by hand so an empty run still yields a valid file.
        let mut inner = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        inner
            .write_record(JTL_HEADER)
            .context("Failed to write JTL header")?;

        Ok(Self { inner, written: 0 })
    }

    pub fn write(&mut self, record: &JtlRecord) -> Result<()> {
        self.inner
            .serialize(record)
            .context("Failed to write JTL record")?;
        self.written += 1;
        Ok(())
    }

    /// Number of records written so far (header excluded).
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush buffered rows and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.inner.flush().context("Failed to flush JTL file")?;
        self.inner
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush JTL file: {}", e.error()))
    }
}

/// Reads JTL rows back, matching columns by header name.
pub struct JtlReader<R: Read> {
    inner: csv::Reader<R>,
}

impl JtlReader<File> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open JTL file {:?}", path))?;
        Self::from_reader(file).with_context(|| format!("Failed to read JTL file {:?}", path))
    }
}

impl<R: Read> JtlReader<R> {
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut inner = csv::Reader::from_reader(reader);
        let headers = inner.headers().context("Failed to read JTL header")?;

        for column in JTL_HEADER {
            if !headers.iter().any(|h| h == column) {
                anyhow::bail!("JTL header is missing column '{}'", column);
            }
        }

        Ok(Self { inner })
    }

    pub fn records(&mut self) -> impl Iterator<Item = Result<JtlRecord>> + '_ {
        self.inner
            .deserialize()
            .map(|row| row.context("Failed to parse JTL row"))
    }
}

/// Write every record to `path`, returning how many rows were written.
pub fn write_jtl<I>(path: impl AsRef<Path>, records: I) -> Result<u64>
where
    I: IntoIterator<Item = JtlRecord>,
{
    let mut writer = JtlWriter::create(path)?;
    for record in records {
        writer.write(&record)?;
    }
    let written = writer.written();
    writer.finish()?;
    Ok(written)
}

pub fn read_jtl(path: impl AsRef<Path>) -> Result<Vec<JtlRecord>> {
    let path = path.as_ref();
    let mut reader = JtlReader::open(path)?;
    reader
        .records()
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("Failed to read JTL file {:?}", path))
}
