//! Test doubles for the tokenizer backend

use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokcache_core::{Error, Result};

use tracing_subscriber::fmt::MakeWriter;

use crate::backend::{Encoder, TokenizerBackend};

/// Texts containing this marker fail to encode
pub const FAIL_MARKER: &str = "<boom>";

pub struct FakeHandle {
    scheme: String,
}

impl FakeHandle {
    pub fn scheme(&self) -> &str {
        &self.scheme
    }
}

impl Encoder for FakeHandle {
    fn encode_len(&self, text: &str) -> Result<usize> {
        if text.contains(FAIL_MARKER) {
            return Err(Error::Encode {
                scheme: self.scheme.clone(),
                reason: "marker found".to_string(),
            });
        }
        Ok(text.split_whitespace().count())
    }
}

/// Backend that counts constructions and knows a fixed set of schemes
pub struct FakeBackend {
    known: HashSet<String>,
    fallback_enabled: bool,
    specialized_attempts: AtomicUsize,
    constructions: AtomicUsize,
    fallback_constructions: AtomicUsize,
}

impl FakeBackend {
    pub fn new(known: &[&str]) -> Self {
        Self {
            known: known.iter().map(|s| s.to_string()).collect(),
            fallback_enabled: true,
            specialized_attempts: AtomicUsize::new(0),
            constructions: AtomicUsize::new(0),
            fallback_constructions: AtomicUsize::new(0),
        }
    }

    pub fn without_fallback(mut self) -> Self {
        self.fallback_enabled = false;
        self
    }

    /// Handles built, specialized or fallback
    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }

    pub fn specialized_attempts(&self) -> usize {
        self.specialized_attempts.load(Ordering::SeqCst)
    }

    pub fn fallback_constructions(&self) -> usize {
        self.fallback_constructions.load(Ordering::SeqCst)
    }
}

impl TokenizerBackend for FakeBackend {
    type Handle = FakeHandle;

    fn for_scheme(&self, scheme: &str) -> Result<FakeHandle> {
        self.specialized_attempts.fetch_add(1, Ordering::SeqCst);
        if !self.known.contains(scheme) {
            return Err(Error::UnknownScheme(scheme.to_string()));
        }
        self.constructions.fetch_add(1, Ordering::SeqCst);
        Ok(FakeHandle {
            scheme: scheme.to_string(),
        })
    }

    fn fallback(&self) -> Result<FakeHandle> {
        if !self.fallback_enabled {
            return Err(Error::FallbackUnavailable("disabled".to_string()));
        }
        self.constructions.fetch_add(1, Ordering::SeqCst);
        self.fallback_constructions.fetch_add(1, Ordering::SeqCst);
        Ok(FakeHandle {
            scheme: "fallback".to_string(),
        })
    }
}

/// In-memory log sink for asserting on formatted log lines
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with a debug-level subscriber and return its output with everything it logged
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    let output = tracing::subscriber::with_default(subscriber, f);
    (output, capture.contents())
}
