//! Engine stand-in for queue tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, Semaphore};

use file43::error::TranscodeError;
use file43::{AudioFormat, OutputArtifact, TranscodeRequest, Transcoder};

/// Records every dispatch and fails the source names it is told to.
///
/// When gated, each conversion announces itself on the gate's channel and
/// then blocks until the test releases a permit.
pub struct ScriptedTranscoder {
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<TranscodeRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    permits: Option<Arc<Semaphore>>,
    started: Option<mpsc::UnboundedSender<String>>,
}

/// Test side of a gated transcoder.
pub struct Gate {
    permits: Arc<Semaphore>,
    started: mpsc::UnboundedReceiver<String>,
}

impl Gate {
    /// Lets `n` blocked or future conversions finish.
    pub fn release(&self, n: usize) {
        self.permits.add_permits(n);
    }

    /// Waits until the next conversion has started and returns its source name.
    pub async fn next_started(&mut self) -> String {
        self.started
            .recv()
            .await
            .expect("transcoder dropped before starting a conversion")
    }
}

impl ScriptedTranscoder {
    pub fn new() -> Self {
        Self {
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            permits: None,
            started: None,
        }
    }

    pub fn gated() -> (Self, Gate) {
        let permits = Arc::new(Semaphore::new(0));
        let (tx, rx) = mpsc::unbounded_channel();
        let transcoder = Self {
            permits: Some(permits.clone()),
            started: Some(tx),
            ..Self::new()
        };
        (
            transcoder,
            Gate {
                permits,
                started: rx,
            },
        )
    }

    pub fn failing(self, names: &[&str]) -> Self {
        for name in names {
            self.set_failing(name, true);
        }
        self
    }

    pub fn set_failing(&self, name: &str, fail: bool) {
        let mut failing = self.failing.lock().unwrap();
        if fail {
            failing.insert(name.to_string());
        } else {
            failing.remove(name);
        }
    }

    /// Source names in dispatch order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.source.name.clone())
            .collect()
    }

    /// Formats in dispatch order.
    pub fn formats(&self) -> Vec<AudioFormat> {
        self.calls.lock().unwrap().iter().map(|r| r.format).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transcoder for ScriptedTranscoder {
    async fn transcode(&self, request: TranscodeRequest) -> Result<OutputArtifact, TranscodeError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let name = request.source.name.clone();
        let today = chrono::Local::now().date_naive();
        let base = request
            .naming
            .apply(request.source.base_name(), request.ordinal, today);
        let output_name = format!("{}.{}", base, request.format.extension());
        self.calls.lock().unwrap().push(request);

        if let Some(started) = &self.started {
            let _ = started.send(name.clone());
        }
        if let Some(permits) = &self.permits {
            if let Ok(permit) = permits.acquire().await {
                permit.forget();
            }
        }
        // Give a competing caller the chance to overlap with this one.
        tokio::task::yield_now().await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.lock().unwrap().contains(&name) {
            return Err(TranscodeError::Failed {
                status: "1".to_string(),
                detail: format!("scripted failure for {}", name),
            });
        }
        Ok(OutputArtifact {
            locator: format!("/out/{}", output_name),
            name: output_name,
        })
    }
}
