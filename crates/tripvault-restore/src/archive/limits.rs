//! Resource limits for reading uploaded archives.

use serde::Deserialize;
use std::io::Read;

/// Upper bounds applied while unpacking an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadLimits {
    /// Compressed bytes read from the source.
    pub max_archive_bytes: u64,
    /// Bytes produced by the gzip decoder.
    pub max_decode_bytes: u64,
    /// Size of each JSON payload (`meta.json`, `trip.json`, `entries.json`).
    pub max_payload_bytes: u64,
    /// Number of tar entries.
    pub max_entries: usize,
    /// Length of a single entry path in bytes.
    pub max_path_len: usize,
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self {
            max_archive_bytes: 4 * 1024 * 1024 * 1024, // 4 GB compressed
            max_decode_bytes: 8 * 1024 * 1024 * 1024,  // 8 GB uncompressed
            max_payload_bytes: 64 * 1024 * 1024,       // 64 MB
            max_entries: 100_000,
            max_path_len: 1024,
        }
    }
}

/// Partial overrides for `ReadLimits`, parsed from CLI/config JSON.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadLimitsOverrides {
    pub max_archive_bytes: Option<u64>,
    pub max_decode_bytes: Option<u64>,
    pub max_payload_bytes: Option<u64>,
    pub max_entries: Option<usize>,
    pub max_path_len: Option<usize>,
}

impl ReadLimits {
    /// Apply overrides onto these limits. Only `Some` values override.
    pub fn apply(self, overrides: ReadLimitsOverrides) -> Self {
        Self {
            max_archive_bytes: overrides.max_archive_bytes.unwrap_or(self.max_archive_bytes),
            max_decode_bytes: overrides.max_decode_bytes.unwrap_or(self.max_decode_bytes),
            max_payload_bytes: overrides.max_payload_bytes.unwrap_or(self.max_payload_bytes),
            max_entries: overrides.max_entries.unwrap_or(self.max_entries),
            max_path_len: overrides.max_path_len.unwrap_or(self.max_path_len),
        }
    }
}

/// Which limit tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    ArchiveBytes,
    DecodeBytes,
    PayloadBytes,
    Entries,
    PathLength,
}

impl LimitKind {
    pub(crate) fn tag(self) -> &'static str {
        match self {
            LimitKind::ArchiveBytes => "LimitArchiveBytes",
            LimitKind::DecodeBytes => "LimitDecodeBytes",
            LimitKind::PayloadBytes => "LimitPayloadBytes",
            LimitKind::Entries => "LimitEntries",
            LimitKind::PathLength => "LimitPathLength",
        }
    }

    /// Recover the limit from an I/O error raised by [`CappedReader`].
    pub(crate) fn from_io(err: &std::io::Error) -> Option<Self> {
        let msg = err.to_string();
        [
            LimitKind::ArchiveBytes,
            LimitKind::DecodeBytes,
            LimitKind::PayloadBytes,
        ]
        .into_iter()
        .find(|kind| msg.contains(kind.tag()))
    }
}

impl std::fmt::Display for LimitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Reader that fails once more than `cap` bytes have been read.
pub(crate) struct CappedReader<R> {
    inner: R,
    cap: u64,
    consumed: u64,
    kind: LimitKind,
}

impl<R: Read> CappedReader<R> {
    pub(crate) fn new(inner: R, cap: u64, kind: LimitKind) -> Self {
        Self {
            inner,
            cap,
            consumed: 0,
            kind,
        }
    }
}

impl<R: Read> Read for CappedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.consumed >= self.cap {
            // One byte of lookahead tells "exactly at cap" apart from "over cap".
            let mut extra = [0u8; 1];
            return match self.inner.read(&mut extra)? {
                0 => Ok(0),
                _ => Err(std::io::Error::other(format!(
                    "{}: exceeded limit of {} bytes",
                    self.kind.tag(),
                    self.cap
                ))),
            };
        }

        let room = (self.cap - self.consumed).min(buf.len() as u64) as usize;
        let n = self.inner.read(&mut buf[..room])?;
        self.consumed += n as u64;
        Ok(n)
    }
}

const MAX_EINTR_RETRIES: usize = 16;

/// Reader that retries reads interrupted by a signal, a bounded number of times.
pub(crate) struct RetryInterrupted<R> {
    inner: R,
}

impl<R: Read> RetryInterrupted<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Read> Read for RetryInterrupted<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut attempts = 0;
        loop {
            match self.inner.read(buf) {
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {
                    attempts += 1;
                    if attempts >= MAX_EINTR_RETRIES {
                        return Err(std::io::Error::new(
                            std::io::ErrorKind::Interrupted,
                            format!("read interrupted {} consecutive times", MAX_EINTR_RETRIES),
                        ));
                    }
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn overrides_only_touch_given_fields() {
        let overrides: ReadLimitsOverrides =
            serde_json::from_str(r#"{"max_entries": 10, "max_path_len": 64}"#).unwrap();
        let limits = ReadLimits::default().apply(overrides);
        assert_eq!(limits.max_entries, 10);
        assert_eq!(limits.max_path_len, 64);
        assert_eq!(
            limits.max_payload_bytes,
            ReadLimits::default().max_payload_bytes
        );
    }

    #[test]
    fn overrides_reject_unknown_fields() {
        assert!(serde_json::from_str::<ReadLimitsOverrides>(r#"{"max_bytes": 1}"#).is_err());
    }

    #[test]
    fn capped_reader_allows_exact_size() {
        let mut out = Vec::new();
        CappedReader::new(Cursor::new(vec![7u8; 8]), 8, LimitKind::PayloadBytes)
            .read_to_end(&mut out)
            .unwrap();
        assert_eq!(out.len(), 8);
    }

    #[test]
    fn capped_reader_fails_over_size() {
        let mut out = Vec::new();
        let err = CappedReader::new(Cursor::new(vec![7u8; 9]), 8, LimitKind::DecodeBytes)
            .read_to_end(&mut out)
            .unwrap_err();
        assert_eq!(LimitKind::from_io(&err), Some(LimitKind::DecodeBytes));
    }

    struct Flaky {
        interrupts: usize,
    }

    impl Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.interrupts > 0 {
                self.interrupts -= 1;
                return Err(std::io::ErrorKind::Interrupted.into());
            }
            buf[0] = 1;
            Ok(1)
        }
    }

    #[test]
    fn retries_interrupted_reads() {
        let mut buf = [0u8; 4];
        let n = RetryInterrupted::new(Flaky { interrupts: 3 })
            .read(&mut buf)
            .unwrap();
        assert_eq!(n, 1);

        let err = RetryInterrupted::new(Flaky { interrupts: 100 })
            .read(&mut buf)
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Interrupted);
    }
}
