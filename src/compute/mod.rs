//! Offscreen compute channel
//!
//! Runs the sampler and mesh loader on a small dedicated thread pool so
//! CPU-heavy sampling (hundreds of thousands of points) never blocks the
//! render thread, and exposes a request/response API keyed by correlation ID.
//!
//! Responses for different IDs may complete in any order relative to
//! submission; callers hold a [`PendingSample`] per request and must not
//! assume FIFO completion. Teardown rejects every still-pending request with
//! [`EngineError::ChannelClosed`] rather than leaving waiters hanging.

mod protocol;
mod worker;

pub use protocol::{RequestId, SampleRequest, SampleResponse};

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;

use crate::error::{EngineError, EngineResult};
use crate::loader::{MeshSource, StreamingMeshLoader};
use crate::sampler::PointSet;

/// Progress callback invoked on the channel's router thread
pub type ProgressFn = Box<dyn FnMut(u32) + Send + 'static>;

/// Threads in the compute pool. Two is enough to let a fast sphere
/// generation overtake a slow mesh download.
const COMPUTE_THREADS: usize = 2;

type TerminalResult = Result<PointSet, EngineError>;

struct PendingEntry {
    terminal_tx: Sender<TerminalResult>,
    on_progress: Option<ProgressFn>,
}

type PendingMap = Arc<Mutex<HashMap<RequestId, PendingEntry>>>;

/// Handle to one in-flight sample request.
pub struct PendingSample {
    id: RequestId,
    terminal_rx: Receiver<TerminalResult>,
}

impl PendingSample {
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Block until the terminal response arrives.
    pub fn wait(self) -> EngineResult<PointSet> {
        match self.terminal_rx.recv() {
            Ok(result) => result,
            Err(_) => Err(EngineError::ChannelClosed),
        }
    }

    /// Non-blocking check for the terminal response.
    pub fn try_wait(&self) -> Option<EngineResult<PointSet>> {
        match self.terminal_rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(EngineError::ChannelClosed)),
        }
    }
}

/// Request/response channel to the compute context.
///
/// One dispatcher thread drains the request queue onto a named rayon pool;
/// one router thread drains responses back into the pending-request map.
/// Each visual component owns its own channel instance, so tearing one down
/// can never destroy another component's in-flight work.
pub struct ComputeChannel {
    request_tx: Option<Sender<(RequestId, SampleRequest)>>,
    next_id: AtomicU64,
    pending: PendingMap,
    shutting_down: Arc<AtomicBool>,
    dispatcher: Option<JoinHandle<()>>,
    router: Option<JoinHandle<()>>,
}

impl ComputeChannel {
    /// Spawn the compute context around a mesh transport.
    pub fn spawn(source: Arc<dyn MeshSource>) -> Self {
        let (request_tx, request_rx) = unbounded::<(RequestId, SampleRequest)>();
        let (response_tx, response_rx) = unbounded::<SampleResponse>();
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let shutting_down = Arc::new(AtomicBool::new(false));

        let dispatcher = std::thread::Builder::new()
            .name("compute-dispatch".into())
            .spawn({
                let shutting_down = Arc::clone(&shutting_down);
                move || dispatch_loop(source, request_rx, response_tx, shutting_down)
            })
            .expect("failed to spawn compute dispatcher thread");

        let router = std::thread::Builder::new()
            .name("compute-router".into())
            .spawn({
                let pending = Arc::clone(&pending);
                move || route_loop(response_rx, pending)
            })
            .expect("failed to spawn compute router thread");

        Self {
            request_tx: Some(request_tx),
            next_id: AtomicU64::new(0),
            pending,
            shutting_down,
            dispatcher: Some(dispatcher),
            router: Some(router),
        }
    }

    /// Submit a request. Progress callbacks run on the router thread and are
    /// fire-and-forget; the returned handle settles exactly once.
    ///
    /// Submitting after [`shutdown`](Self::shutdown) yields a handle that
    /// settles immediately with [`EngineError::ChannelClosed`].
    pub fn submit(&self, request: SampleRequest, on_progress: Option<ProgressFn>) -> PendingSample {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (terminal_tx, terminal_rx) = bounded(1);
        self.pending.lock().insert(
            id,
            PendingEntry {
                terminal_tx,
                on_progress,
            },
        );

        let sent = self
            .request_tx
            .as_ref()
            .is_some_and(|tx| tx.send((id, request)).is_ok());
        if !sent {
            // Dropping the entry disconnects the terminal channel, which the
            // handle reports as ChannelClosed
            self.pending.lock().remove(&id);
        }

        PendingSample { id, terminal_rx }
    }

    /// Tear the channel down: queued-but-unstarted requests are skipped,
    /// in-flight tasks run to completion, and every request still pending
    /// afterwards is rejected with [`EngineError::ChannelClosed`].
    /// Idempotent; also invoked on drop.
    pub fn shutdown(&mut self) {
        self.shutting_down.store(true, Ordering::Relaxed);
        self.request_tx = None;
        if let Some(handle) = self.dispatcher.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.router.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ComputeChannel {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn dispatch_loop(
    source: Arc<dyn MeshSource>,
    request_rx: Receiver<(RequestId, SampleRequest)>,
    response_tx: Sender<SampleResponse>,
    shutting_down: Arc<AtomicBool>,
) {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(COMPUTE_THREADS)
        .thread_name(|idx| format!("compute-{}", idx))
        .build()
        .expect("failed to create compute thread pool");
    let loader = Arc::new(StreamingMeshLoader::new(source));

    for (id, request) in request_rx.iter() {
        if shutting_down.load(Ordering::Relaxed) {
            // Drained but never started; the router rejects it on teardown
            log::debug!("skipping queued request {id} during shutdown");
            continue;
        }

        let loader = Arc::clone(&loader);
        let tx = response_tx.clone();
        let shutting_down = Arc::clone(&shutting_down);
        pool.spawn(move || {
            // Re-check at execution time: the request may have sat in the
            // pool queue while teardown began. Left pending, the router
            // rejects it on drain.
            if shutting_down.load(Ordering::Relaxed) {
                log::debug!("skipping pooled request {id} during shutdown");
                return;
            }
            let task = AssertUnwindSafe(|| worker::handle_request(&loader, id, request, &tx));
            if let Err(panic) = catch_unwind(task) {
                let _ = tx.send(SampleResponse::Error {
                    id,
                    error: EngineError::WorkerPanic(panic_message(&panic)),
                });
            }
        });
    }

    // Pool drop joins in-flight tasks, so their response senders are gone
    // before ours is; the router sees a clean disconnect.
    drop(pool);
}

fn route_loop(response_rx: Receiver<SampleResponse>, pending: PendingMap) {
    for response in response_rx.iter() {
        match response {
            SampleResponse::Progress { id, percent } => {
                // Take the callback out of the map while it runs so a slow
                // callback never blocks terminal routing for other IDs.
                let callback = pending.lock().get_mut(&id).and_then(|e| e.on_progress.take());
                match callback {
                    Some(mut cb) => {
                        cb(percent);
                        if let Some(entry) = pending.lock().get_mut(&id) {
                            entry.on_progress = Some(cb);
                        }
                    }
                    None => log::debug!("dropping progress for request {id}"),
                }
            }
            SampleResponse::Result { id, points } => deliver(&pending, id, Ok(points)),
            SampleResponse::Error { id, error } => deliver(&pending, id, Err(error)),
        }
    }

    // All response senders are gone: nothing pending can settle any more
    let mut pending = pending.lock();
    for (id, entry) in pending.drain() {
        log::debug!("rejecting pending request {id} on channel teardown");
        let _ = entry.terminal_tx.send(Err(EngineError::ChannelClosed));
    }
}

fn deliver(pending: &PendingMap, id: RequestId, result: TerminalResult) {
    match pending.lock().remove(&id) {
        // The waiter may have dropped its handle; that is not an error
        Some(entry) => {
            let _ = entry.terminal_tx.send(result);
        }
        None => log::debug!("terminal response for unknown request {id}, dropping"),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverFetched;

    impl MeshSource for NeverFetched {
        fn fetch(&self, url: &str, _progress: &mut dyn FnMut(u32)) -> EngineResult<Vec<u8>> {
            panic!("unexpected fetch of {url}");
        }
    }

    #[test]
    fn sphere_request_round_trips() {
        let channel = ComputeChannel::spawn(Arc::new(NeverFetched));
        let pending = channel.submit(
            SampleRequest::GenerateSphere {
                point_count: 100,
                radius: 1.5,
                seed: 1,
            },
            None,
        );
        let points = pending.wait().unwrap();
        assert_eq!(points.point_count(), 100);
        assert_eq!(points, crate::sampler::generate_sphere_sorted(100, 1.5, 1));
    }

    #[test]
    fn correlation_ids_increase_monotonically() {
        let channel = ComputeChannel::spawn(Arc::new(NeverFetched));
        let request = SampleRequest::GenerateSphere {
            point_count: 1,
            radius: 1.0,
            seed: 1,
        };
        let a = channel.submit(request.clone(), None);
        let b = channel.submit(request, None);
        assert!(b.id() > a.id());
    }

    #[test]
    fn worker_panic_surfaces_as_terminal_error() {
        let channel = ComputeChannel::spawn(Arc::new(NeverFetched));
        // NeverFetched panics on any mesh load
        let pending = channel.submit(
            SampleRequest::LoadAndSampleMesh {
                url: "mem://nope.ply".into(),
                point_count: 10,
                target_radius: 1.0,
            },
            None,
        );
        assert!(matches!(pending.wait(), Err(EngineError::WorkerPanic(_))));
    }

    #[test]
    fn submit_after_shutdown_settles_closed() {
        let mut channel = ComputeChannel::spawn(Arc::new(NeverFetched));
        channel.shutdown();
        let pending = channel.submit(
            SampleRequest::GenerateSphere {
                point_count: 10,
                radius: 1.0,
                seed: 1,
            },
            None,
        );
        assert!(matches!(pending.wait(), Err(EngineError::ChannelClosed)));
    }
}
