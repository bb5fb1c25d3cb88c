// SPDX-License-Identifier: MPL-2.0
//! [`TileDecoder`] adapters.
//!
//! - [`ThreadedDecoder`]: decodes on the tokio blocking pool and hands
//!   results back over a channel.
//! - [`DeferredDecoder`]: queues requests and decodes them on the caller's
//!   thread when asked.
//! - [`ManualDecoder`]: records requests and lets the host supply the
//!   pixels, for hosts with their own decoding pipeline.

use crate::application::port::{DecodeCompletion, DecodeHandle, DecodeRequest, TileDecoder};
use crate::error::DecodeError;
use crate::media::{decode_region, OrientedImageCache, TilePixels};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
struct HandleSequence(u64);

impl HandleSequence {
    fn next(&mut self) -> DecodeHandle {
        self.0 += 1;
        DecodeHandle::new(self.0)
    }
}

fn decode_with_cache(
    cache: &mut OrientedImageCache,
    request: &DecodeRequest,
) -> Result<TilePixels, DecodeError> {
    let image = cache.get_or_load(&request.source)?;
    decode_region(&image, request.region, request.divisor)
}

// =============================================================================
// ThreadedDecoder
// =============================================================================

/// One blocking-pool decode. The cache lock covers only the full-image
/// lookup; cropping and scaling run unlocked so workers overlap.
///
/// Returns `None` once `cancelled` is set, checked before each stage.
fn decode_shared(
    cache: &Mutex<OrientedImageCache>,
    request: &DecodeRequest,
    cancelled: &AtomicBool,
) -> Option<Result<TilePixels, DecodeError>> {
    if cancelled.load(Ordering::Acquire) {
        return None;
    }
    let image = cache
        .lock()
        .map_err(|_| DecodeError::Worker("image cache lock poisoned".into()))
        .and_then(|mut cache| cache.get_or_load(&request.source));
    let image = match image {
        Ok(image) => image,
        Err(err) => return Some(Err(err)),
    };

    if cancelled.load(Ordering::Acquire) {
        return None;
    }
    Some(decode_region(&image, request.region, request.divisor))
}

struct InFlight {
    task: JoinHandle<()>,
    cancelled: Arc<AtomicBool>,
}

impl InFlight {
    fn cancel(self) {
        self.cancelled.store(true, Ordering::Release);
        self.task.abort();
    }
}

/// Decodes on the tokio blocking pool.
///
/// Results are queued on an unbounded channel and only surface through
/// [`TileDecoder::poll_completions`]. Cancelling raises the request's flag,
/// so a worker that already picked it up stops at the next stage, and
/// aborts the task. A result that was already queued is dropped at poll
/// time.
pub struct ThreadedDecoder {
    runtime: Handle,
    completion_tx: mpsc::UnboundedSender<DecodeCompletion>,
    completion_rx: mpsc::UnboundedReceiver<DecodeCompletion>,
    in_flight: HashMap<DecodeHandle, InFlight>,
    handles: HandleSequence,
    image_cache: Arc<Mutex<OrientedImageCache>>,
}

impl ThreadedDecoder {
    /// Creates a decoder spawning its work on `runtime`.
    #[must_use]
    pub fn new(runtime: Handle) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            completion_tx,
            completion_rx,
            in_flight: HashMap::new(),
            handles: HandleSequence::default(),
            image_cache: Arc::new(Mutex::new(OrientedImageCache::new())),
        }
    }

    /// Creates a decoder on the runtime of the calling context, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    /// Number of requests not yet reported or cancelled.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

impl TileDecoder for ThreadedDecoder {
    fn request(&mut self, request: DecodeRequest) -> DecodeHandle {
        let handle = self.handles.next();
        let completion_tx = self.completion_tx.clone();
        let image_cache = Arc::clone(&self.image_cache);

        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let task = self.runtime.spawn(async move {
            let outcome = tokio::task::spawn_blocking(move || {
                decode_shared(&image_cache, &request, &flag)
            })
            .await;
            let result = match outcome {
                Ok(Some(result)) => result,
                Ok(None) => return,
                Err(err) => Err(DecodeError::Worker(err.to_string())),
            };

            // A closed channel means the decoder was dropped.
            let _ = completion_tx.send(DecodeCompletion { handle, result });
        });

        self.in_flight.insert(handle, InFlight { task, cancelled });
        handle
    }

    fn cancel(&mut self, handle: DecodeHandle) {
        if let Some(in_flight) = self.in_flight.remove(&handle) {
            in_flight.cancel();
            tracing::trace!(handle = handle.value(), "cancelled threaded decode");
        }
    }

    fn poll_completions(&mut self) -> Vec<DecodeCompletion> {
        let mut completions = Vec::new();
        while let Ok(completion) = self.completion_rx.try_recv() {
            if self.in_flight.remove(&completion.handle).is_some() {
                completions.push(completion);
            }
        }
        completions
    }
}

impl Drop for ThreadedDecoder {
    fn drop(&mut self) {
        for (_, in_flight) in self.in_flight.drain() {
            in_flight.cancel();
        }
    }
}

// =============================================================================
// DeferredDecoder
// =============================================================================

/// Queues requests and decodes them on the calling thread.
#[derive(Debug, Default)]
pub struct DeferredDecoder {
    queue: VecDeque<(DecodeHandle, DecodeRequest)>,
    ready: Vec<DecodeCompletion>,
    handles: HandleSequence,
    image_cache: OrientedImageCache,
}

impl DeferredDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests waiting to be decoded.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Decodes the oldest queued request. Returns false when idle.
    pub fn run_next(&mut self) -> bool {
        let Some((handle, request)) = self.queue.pop_front() else {
            return false;
        };
        let result = decode_with_cache(&mut self.image_cache, &request);
        self.ready.push(DecodeCompletion { handle, result });
        true
    }

    /// Decodes everything queued, returning how many requests ran.
    pub fn run_queued(&mut self) -> usize {
        let mut count = 0;
        while self.run_next() {
            count += 1;
        }
        count
    }
}

impl TileDecoder for DeferredDecoder {
    fn request(&mut self, request: DecodeRequest) -> DecodeHandle {
        let handle = self.handles.next();
        self.queue.push_back((handle, request));
        handle
    }

    fn cancel(&mut self, handle: DecodeHandle) {
        self.queue.retain(|(queued, _)| *queued != handle);
        self.ready.retain(|completion| completion.handle != handle);
    }

    fn poll_completions(&mut self) -> Vec<DecodeCompletion> {
        std::mem::take(&mut self.ready)
    }
}

// =============================================================================
// ManualDecoder
// =============================================================================

/// Records requests; the host resolves them with pixels of its own.
#[derive(Debug, Default)]
pub struct ManualDecoder {
    outstanding: BTreeMap<DecodeHandle, DecodeRequest>,
    cancelled: Vec<DecodeHandle>,
    ready: Vec<DecodeCompletion>,
    handles: HandleSequence,
    issued: u64,
}

impl ManualDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Outstanding requests in issue order.
    pub fn outstanding(&self) -> impl Iterator<Item = (DecodeHandle, &DecodeRequest)> {
        self.outstanding.iter().map(|(handle, request)| (*handle, request))
    }

    #[must_use]
    pub fn outstanding_handles(&self) -> Vec<DecodeHandle> {
        self.outstanding.keys().copied().collect()
    }

    /// Handles cancelled so far, oldest first.
    #[must_use]
    pub fn cancelled(&self) -> &[DecodeHandle] {
        &self.cancelled
    }

    /// Total number of requests ever issued.
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.issued
    }

    /// Completes an outstanding request. Returns false for unknown handles.
    pub fn resolve(
        &mut self,
        handle: DecodeHandle,
        result: Result<TilePixels, DecodeError>,
    ) -> bool {
        if self.outstanding.remove(&handle).is_none() {
            return false;
        }
        self.ready.push(DecodeCompletion { handle, result });
        true
    }

    /// Completes every outstanding request with the result of `decode`.
    pub fn resolve_all_with<F>(&mut self, mut decode: F) -> usize
    where
        F: FnMut(&DecodeRequest) -> Result<TilePixels, DecodeError>,
    {
        let outstanding = std::mem::take(&mut self.outstanding);
        let count = outstanding.len();
        for (handle, request) in outstanding {
            let result = decode(&request);
            self.ready.push(DecodeCompletion { handle, result });
        }
        count
    }

    /// Queues a completion as-is, even for a handle that is no longer
    /// outstanding, as happens when a result races its cancellation.
    pub fn inject(&mut self, completion: DecodeCompletion) {
        self.outstanding.remove(&completion.handle);
        self.ready.push(completion);
    }
}

impl TileDecoder for ManualDecoder {
    fn request(&mut self, request: DecodeRequest) -> DecodeHandle {
        let handle = self.handles.next();
        self.issued += 1;
        self.outstanding.insert(handle, request);
        handle
    }

    fn cancel(&mut self, handle: DecodeHandle) {
        if self.outstanding.remove(&handle).is_some() {
            self.cancelled.push(handle);
        }
        self.ready.retain(|completion| completion.handle != handle);
    }

    fn poll_completions(&mut self) -> Vec<DecodeCompletion> {
        std::mem::take(&mut self.ready)
    }
}
