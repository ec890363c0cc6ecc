//! Format dispatch and the uniform extraction contract.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, bounded};
use tracing::{debug, debug_span};

use crate::config::ExtractConfig;
use crate::document::{ExtractionOutcome, SourceDocument};
use crate::epub::EpubCoverExtractor;
use crate::error::{ConfigError, ExtractionError};
use crate::format::{DetectedFormat, detect};
use crate::pdf::{PdfCoverExtractor, RasterBackend};
use crate::txt::TxtCoverRenderer;

/// Derives a cover image from a PDF, EPUB or TXT document.
///
/// Every call returns exactly one [`ExtractionOutcome`]. Errors from the
/// format extractors, and panics raised inside them, come back as
/// `Err(ExtractionError)`; nothing escapes to the caller.
///
/// Cloning is cheap and clones share the raster backend, so one engine can
/// be handed to several worker threads.
#[derive(Clone)]
pub struct CoverEngine {
    config: ExtractConfig,
    pdf: Option<PdfCoverExtractor>,
    epub: EpubCoverExtractor,
    txt: TxtCoverRenderer,
}

impl CoverEngine {
    /// Engine with the default raster backend.
    ///
    /// Without the `pdfium` feature there is no default backend and PDF
    /// inputs fail with an internal error; use
    /// [`with_raster_backend`](Self::with_raster_backend) instead.
    pub fn new(config: ExtractConfig) -> Result<Self, ConfigError> {
        #[cfg(feature = "pdfium")]
        let backend: Option<Arc<dyn RasterBackend>> =
            Some(Arc::new(crate::pdf::PdfiumBackend::system()));
        #[cfg(not(feature = "pdfium"))]
        let backend: Option<Arc<dyn RasterBackend>> = None;

        Self::build(config, backend)
    }

    /// Engine that rasterizes PDFs with `backend`.
    pub fn with_raster_backend(
        config: ExtractConfig,
        backend: Arc<dyn RasterBackend>,
    ) -> Result<Self, ConfigError> {
        Self::build(config, Some(backend))
    }

    fn build(
        config: ExtractConfig,
        backend: Option<Arc<dyn RasterBackend>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            pdf: backend.map(|b| PdfCoverExtractor::new(b, config.pdf_dpi)),
            epub: EpubCoverExtractor::new(),
            txt: TxtCoverRenderer::new(config),
        })
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Extract a cover from `doc`.
    pub fn extract(&self, doc: &SourceDocument) -> ExtractionOutcome {
        let span = debug_span!("extract", doc = doc.name().unwrap_or("<buffer>"));
        let _guard = span.enter();

        let outcome = contained(|| {
            let format = detect(doc.data(), doc.hint());
            debug!(%format, bytes = doc.data().len(), "sniffed format");
            self.dispatch(format, doc.data())
        });

        match &outcome {
            Ok(cover) => debug!(
                strategy = %cover.strategy,
                encoding = %cover.encoding,
                bytes = cover.data.len(),
                "extracted cover"
            ),
            Err(e) => debug!(kind = %e.kind(), error = %e, "extraction failed"),
        }
        outcome
    }

    /// Like [`extract`](Self::extract), but gives up after `timeout`.
    ///
    /// The extraction runs on its own thread over a copy of the document.
    /// On timeout the thread is abandoned, not interrupted; it finishes in
    /// the background and its result is discarded.
    pub fn extract_with_timeout(&self, doc: &SourceDocument, timeout: Duration) -> ExtractionOutcome {
        let (tx, rx) = bounded(1);
        let engine = self.clone();
        let doc = doc.clone();

        thread::Builder::new()
            .name("coverx-extract".into())
            .spawn(move || {
                let _ = tx.send(engine.extract(&doc));
            })
            .map_err(|e| ExtractionError::Internal(format!("cannot spawn extraction thread: {e}")))?;

        match rx.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => Err(ExtractionError::Timeout(timeout.as_millis())),
            Err(RecvTimeoutError::Disconnected) => Err(ExtractionError::Internal(
                "extraction thread exited without a result".into(),
            )),
        }
    }

    fn dispatch(&self, format: DetectedFormat, data: &[u8]) -> ExtractionOutcome {
        match format {
            DetectedFormat::Pdf => match &self.pdf {
                Some(pdf) => pdf.extract(data),
                None => Err(ExtractionError::Internal(
                    "no raster backend configured for PDF input".into(),
                )),
            },
            DetectedFormat::Epub => self.epub.extract(data),
            DetectedFormat::Txt => self.txt.render(data),
            DetectedFormat::Unknown => Err(ExtractionError::UnsupportedFormat(if data.is_empty() {
                "empty input".into()
            } else {
                "not a PDF, EPUB or UTF-8 text file".into()
            })),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    }
}

/// Run `f`, turning a panic anywhere inside it (sniffing included) into
/// `InternalError`.
fn contained(f: impl FnOnce() -> ExtractionOutcome) -> ExtractionOutcome {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        Err(ExtractionError::Internal(format!(
            "extractor panicked: {}",
            panic_message(payload.as_ref())
        )))
    })
}
