//! Optional generative refinement of title, composer and instruments.
//!
//! A [`GenerativeMetadataModel`] receives instructions, a prompt built from
//! document attributes and tagged OCR lines, and a JSON schema for its answer.
//! The call runs on a worker thread. The caller waits on the result, a
//! [`CancellationToken`] and a timeout, whichever comes first. Every failure
//! mode yields no result, never a partial one.

mod cancel;
#[cfg(feature = "ollama")]
mod ollama;
pub mod prompt;

pub use cancel::{cancellation, CancelHandle, CancellationToken};
#[cfg(feature = "ollama")]
pub use ollama::OllamaModel;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{after, select};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{DocumentAttributes, OcrRegion};

/// Default wait for a model answer.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// What the model is asked to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerativeRequest {
    /// System instructions
    pub instructions: String,
    /// User prompt with attributes and tagged OCR lines
    pub prompt: String,
    /// JSON schema the answer must satisfy
    pub schema: Value,
}

impl GenerativeRequest {
    /// Build the standard request from the evidence gathered so far.
    pub fn new(attributes: &DocumentAttributes, regions: &[OcrRegion], max_regions: usize) -> Self {
        Self {
            instructions: prompt::INSTRUCTIONS.to_string(),
            prompt: prompt::build_prompt(attributes, regions, max_regions),
            schema: prompt::output_schema(),
        }
    }
}

/// The model's structured answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerativeResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub composer: Option<String>,
    #[serde(default)]
    pub instruments: Vec<String>,
}

impl GenerativeResult {
    /// Parse a JSON answer. Anything that does not fit the schema is an error.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text.trim())?)
    }
}

/// Abstract interface for a local language model.
pub trait GenerativeMetadataModel: Send + Sync {
    /// Short model name for logs.
    fn name(&self) -> &str;

    /// Check whether the model can answer right now.
    fn is_available(&self) -> bool;

    /// Answer `request`. Called on a worker thread; may block.
    fn respond(&self, request: &GenerativeRequest) -> Result<GenerativeResult>;
}

/// Run `model` on a worker thread, bounded by `timeout` and `cancel`.
///
/// On timeout or cancellation the worker is abandoned and its eventual answer
/// dropped.
pub fn respond_with_timeout(
    model: Arc<dyn GenerativeMetadataModel>,
    request: GenerativeRequest,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<GenerativeResult> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let (tx, rx) = crossbeam_channel::bounded(1);
    thread::Builder::new()
        .name("scoremeta-generative".to_string())
        .spawn(move || {
            // The receiver may be gone after a timeout
            let _ = tx.send(model.respond(&request));
        })?;

    select! {
        recv(rx) -> answer => answer
            .map_err(|_| Error::Generative("worker exited without an answer".to_string()))?,
        recv(cancel.receiver()) -> _ => Err(Error::Cancelled),
        recv(after(timeout)) -> _ => Err(Error::Timeout(millis(timeout))),
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// The refinement step as the pipeline runs it.
#[derive(Clone)]
pub struct GenerativeStep {
    model: Arc<dyn GenerativeMetadataModel>,
    timeout: Duration,
    max_regions: usize,
}

impl GenerativeStep {
    pub fn new(model: Arc<dyn GenerativeMetadataModel>, timeout: Duration, max_regions: usize) -> Self {
        Self {
            model,
            timeout,
            max_regions,
        }
    }

    /// Refine, or `None` when skipped or failed.
    ///
    /// Skipped without a model call when there are no OCR regions, the model
    /// is unavailable, or `cancel` has fired.
    pub fn run(
        &self,
        attributes: &DocumentAttributes,
        regions: &[OcrRegion],
        cancel: &CancellationToken,
    ) -> Option<GenerativeResult> {
        if regions.is_empty() {
            log::debug!("generative step skipped: no OCR regions");
            return None;
        }
        if cancel.is_cancelled() {
            log::debug!("generative step skipped: cancelled");
            return None;
        }
        if !self.model.is_available() {
            log::debug!("generative step skipped: {} unavailable", self.model.name());
            return None;
        }

        let request = GenerativeRequest::new(attributes, regions, self.max_regions);
        match respond_with_timeout(Arc::clone(&self.model), request, self.timeout, cancel) {
            Ok(result) => Some(result),
            Err(e @ (Error::Timeout(_) | Error::Cancelled)) => {
                log::debug!("{} abandoned: {}", self.model.name(), e);
                None
            }
            Err(e) => {
                log::warn!("{} failed: {}", self.model.name(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundingBox;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        available: bool,
        delay: Duration,
        answer: fn() -> Result<GenerativeResult>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(answer: fn() -> Result<GenerativeResult>) -> Self {
            Self {
                available: true,
                delay: Duration::ZERO,
                answer,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl GenerativeMetadataModel for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn respond(&self, _request: &GenerativeRequest) -> Result<GenerativeResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            (self.answer)()
        }
    }

    fn good() -> Result<GenerativeResult> {
        Ok(GenerativeResult {
            title: Some("Canon in D".to_string()),
            composer: None,
            instruments: vec!["Violin".to_string()],
        })
    }

    fn regions() -> Vec<OcrRegion> {
        vec![OcrRegion::new(
            "Canon",
            BoundingBox::from_center(0.5, 0.9, 0.3, 0.05),
            0.9,
        )]
    }

    fn step(model: Scripted, timeout: Duration) -> (GenerativeStep, Arc<Scripted>) {
        let model = Arc::new(model);
        (GenerativeStep::new(model.clone(), timeout, 50), model)
    }

    #[test]
    fn test_answer_passed_through() {
        let (step, _) = step(Scripted::new(good), DEFAULT_TIMEOUT);
        let result = step.run(&DocumentAttributes::default(), &regions(), &CancellationToken::never());
        assert_eq!(result.unwrap().title.as_deref(), Some("Canon in D"));
    }

    #[test]
    fn test_error_is_no_result() {
        let (step, _) = step(
            Scripted::new(|| Err(Error::Generative("bad".to_string()))),
            DEFAULT_TIMEOUT,
        );
        assert!(step
            .run(&DocumentAttributes::default(), &regions(), &CancellationToken::never())
            .is_none());
    }

    #[test]
    fn test_timeout_is_no_result() {
        let model = Scripted {
            delay: Duration::from_millis(500),
            ..Scripted::new(good)
        };
        let (step, _) = step(model, Duration::from_millis(20));
        assert!(step
            .run(&DocumentAttributes::default(), &regions(), &CancellationToken::never())
            .is_none());
    }

    #[test]
    fn test_unavailable_or_empty_skips_call() {
        let model = Scripted {
            available: false,
            ..Scripted::new(good)
        };
        let (step, model) = step(model, DEFAULT_TIMEOUT);
        assert!(step
            .run(&DocumentAttributes::default(), &regions(), &CancellationToken::never())
            .is_none());
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);

        let (step, model) = self::step(Scripted::new(good), DEFAULT_TIMEOUT);
        assert!(step
            .run(&DocumentAttributes::default(), &[], &CancellationToken::never())
            .is_none());
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancelled_before_start() {
        let (handle, token) = cancellation();
        handle.cancel();
        let (step, model) = step(Scripted::new(good), DEFAULT_TIMEOUT);
        assert!(step.run(&DocumentAttributes::default(), &regions(), &token).is_none());
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancel_during_wait() {
        let model = Scripted {
            delay: Duration::from_millis(500),
            ..Scripted::new(good)
        };
        let (handle, token) = cancellation();
        let waiter = thread::spawn(move || {
            respond_with_timeout(
                Arc::new(model),
                GenerativeRequest::new(&DocumentAttributes::default(), &regions(), 50),
                DEFAULT_TIMEOUT,
                &token,
            )
        });
        thread::sleep(Duration::from_millis(20));
        handle.cancel();
        assert!(matches!(waiter.join().unwrap(), Err(Error::Cancelled)));
    }

    #[test]
    fn test_timeout_millis_saturate() {
        assert_eq!(millis(Duration::from_millis(1500)), 1500);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_parse_answer() {
        let result = GenerativeResult::from_json(
            r#" {"title": "Air", "instruments": ["Cello", "Piano"]} "#,
        )
        .unwrap();
        assert_eq!(result.title.as_deref(), Some("Air"));
        assert_eq!(result.composer, None);
        assert_eq!(result.instruments, vec!["Cello", "Piano"]);

        assert!(GenerativeResult::from_json("not json").is_err());
        assert!(GenerativeResult::from_json(r#"{"instruments": "Cello"}"#).is_err());
    }
}
