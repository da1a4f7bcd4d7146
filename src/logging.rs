//! Tracing setup with secret redaction

use std::borrow::Cow;
use std::io::{self, Write};
use std::sync::Arc;

use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Replacement written in place of a secret
pub const REDACTED: &str = "[REDACTED]";

/// Install the process subscriber. `RUST_LOG` overrides the configured level.
pub fn init(config: &LoggingConfig, secrets: Vec<String>) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("alma_service={},tower_http=debug", config.level).into());
    let writer = RedactingMakeWriter::new(secrets);

    let registry = tracing_subscriber::registry().with(filter);
    if config.format.eq_ignore_ascii_case("json") {
        registry.with(fmt::layer().json().with_writer(writer)).try_init()
    } else {
        registry.with(fmt::layer().with_writer(writer)).try_init()
    }
}

/// Mask every occurrence of the secrets in a log line
pub fn redact<'a>(line: &'a str, secrets: &[String]) -> Cow<'a, str> {
    let mut out = Cow::Borrowed(line);
    for secret in secrets.iter().filter(|s| !s.is_empty()) {
        if out.contains(secret.as_str()) {
            out = Cow::Owned(out.replace(secret.as_str(), REDACTED));
        }
    }
    out
}

/// Stdout writer factory masking secrets
#[derive(Clone, Default)]
pub struct RedactingMakeWriter {
    secrets: Arc<[String]>,
}

impl RedactingMakeWriter {
    pub fn new(secrets: Vec<String>) -> Self {
        Self {
            secrets: Arc::from(secrets),
        }
    }
}

impl<'a> MakeWriter<'a> for RedactingMakeWriter {
    type Writer = RedactingWriter<io::Stdout>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new(io::stdout(), self.secrets.clone())
    }
}

/// Writer masking secrets before forwarding to `inner`.
/// The fmt layer hands over one formatted event per write.
pub struct RedactingWriter<W> {
    inner: W,
    secrets: Arc<[String]>,
}

impl<W: Write> RedactingWriter<W> {
    pub fn new(inner: W, secrets: Arc<[String]>) -> Self {
        Self { inner, secrets }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.secrets.is_empty() {
            return self.inner.write(buf);
        }
        let line = String::from_utf8_lossy(buf);
        self.inner.write_all(redact(&line, &self.secrets).as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
