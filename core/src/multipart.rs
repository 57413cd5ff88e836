//! `multipart/form-data` bodies for upload tests.
//!
//! # Design
//! `MultipartWriter` serializes parts straight into any `io::Write` sink, so
//! finishing the body is a fallible step like every other write.
//! [`form_data`] is the convenience entry point: it buffers text fields and
//! files into memory and hands back the bytes together with the
//! boundary-bearing `Content-Type` value. Files are opened one at a time and
//! dropped as soon as their content has been copied.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Error, Result};

/// A serialized multipart body and the header value needed to send it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartForm {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Builds a multipart body from text fields and files on disk.
///
/// Fields are written first, then files, each in the order given. A file part
/// is named after its field and reports the file's base name as `filename`.
pub fn form_data<P: AsRef<Path>>(
    fields: &[(&str, &str)],
    files: &[(&str, P)],
) -> Result<MultipartForm> {
    let mut writer = MultipartWriter::new(Vec::new());
    for (name, value) in fields {
        writer.write_field(name, value)?;
    }
    for (name, path) in files {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| {
            warn!(path = %path.display(), error = %source, "multipart file cannot be opened");
            Error::FileOpen {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        writer.write_file_part(name, &filename, file).map_err(|e| match e {
            Error::FileRead { source, .. } => Error::FileRead {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
    }
    let content_type = writer.content_type();
    let data = writer.finish()?;
    Ok(MultipartForm { data, content_type })
}

/// Streaming `multipart/form-data` writer.
#[derive(Debug)]
pub struct MultipartWriter<W: Write> {
    inner: W,
    boundary: String,
    wrote_part: bool,
}

impl<W: Write> MultipartWriter<W> {
    /// Creates a writer with a random boundary.
    pub fn new(inner: W) -> Self {
        Self::with_boundary(inner, Uuid::new_v4().simple().to_string())
    }

    pub fn with_boundary(inner: W, boundary: impl Into<String>) -> Self {
        Self {
            inner,
            boundary: boundary.into(),
            wrote_part: false,
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn write_field(&mut self, name: &str, value: &str) -> Result<()> {
        let headers = format!(
            "Content-Disposition: form-data; name=\"{}\"\r\n",
            escape_quotes(name)
        );
        self.create_part(&headers).map_err(Error::WriteFinalization)?;
        self.inner
            .write_all(value.as_bytes())
            .map_err(Error::WriteFinalization)?;
        debug!(name, len = value.len(), "wrote multipart field");
        Ok(())
    }

    /// Starts a file part; the caller writes the content into the returned sink.
    pub fn create_form_file(&mut self, name: &str, filename: &str) -> Result<&mut W> {
        let headers = format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
             Content-Type: application/octet-stream\r\n",
            escape_quotes(name),
            escape_quotes(filename)
        );
        self.create_part(&headers).map_err(Error::WriteFinalization)?;
        Ok(&mut self.inner)
    }

    /// Writes a file part whose content is read from `reader` until EOF.
    pub fn write_file_part<R: Read>(
        &mut self,
        name: &str,
        filename: &str,
        mut reader: R,
    ) -> Result<u64> {
        let sink = self.create_form_file(name, filename)?;
        let copied = copy(&mut reader, sink, filename)?;
        debug!(name, filename, len = copied, "wrote multipart file part");
        Ok(copied)
    }

    /// Writes the closing delimiter and returns the sink.
    pub fn finish(mut self) -> Result<W> {
        let trailer = if self.wrote_part {
            format!("\r\n--{}--\r\n", self.boundary)
        } else {
            format!("--{}--\r\n", self.boundary)
        };
        self.inner
            .write_all(trailer.as_bytes())
            .and_then(|()| self.inner.flush())
            .map_err(Error::WriteFinalization)?;
        Ok(self.inner)
    }

    fn create_part(&mut self, headers: &str) -> io::Result<()> {
        let delimiter = if self.wrote_part {
            format!("\r\n--{}\r\n", self.boundary)
        } else {
            format!("--{}\r\n", self.boundary)
        };
        self.wrote_part = true;
        self.inner.write_all(delimiter.as_bytes())?;
        self.inner.write_all(headers.as_bytes())?;
        self.inner.write_all(b"\r\n")
    }
}

/// `io::copy` with read and write failures told apart.
fn copy<R: Read, W: Write>(reader: &mut R, writer: &mut W, filename: &str) -> Result<u64> {
    let mut buf = [0u8; 8 * 1024];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(Error::FileRead {
                    path: filename.into(),
                    source,
                })
            }
        };
        writer.write_all(&buf[..n]).map_err(Error::WriteFinalization)?;
        total += n as u64;
    }
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
