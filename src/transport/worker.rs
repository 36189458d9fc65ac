//! Background worker hosting one compute engine.
//!
//! The caller side encodes a [`ComputeRequest`] and hands the bytes to a
//! dedicated thread; the thread decodes, runs its engine and sends the
//! result back over a one-shot reply channel. The response's matrix buffer
//! is moved through the channel, so the worker keeps no copy.
//!
//! A worker accepts one request at a time. Submitting while a request is
//! in flight fails with [`LiveMapError::Busy`] instead of queueing.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use super::codec::{decode_request, encode_request};
use super::{ComputeRequest, ComputeResponse};
use crate::engine::{ComputeEngine, EngineKind};
use crate::error::LiveMapError;

type Reply = Result<ComputeResponse, LiveMapError>;

#[derive(Debug)]
enum WorkerMessage {
    Compute {
        payload: Vec<u8>,
        reply: mpsc::Sender<Reply>,
    },
    Shutdown,
}

/// Lifecycle of a submitted request as seen from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// No request in flight.
    Idle,
    /// Submitted, no reply yet.
    Sent,
    /// The worker replied with a response.
    Completed,
    /// The worker replied with an error or went away.
    Failed,
}

/// Owns a compute engine running on a background thread.
#[derive(Debug)]
pub struct ComputeWorker {
    kind: EngineKind,
    request_tx: mpsc::Sender<WorkerMessage>,
    in_flight: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl ComputeWorker {
    /// Move `engine` onto a new named thread.
    ///
    /// # Errors
    ///
    /// [`LiveMapError::ThreadSpawn`] if the thread cannot be started.
    pub fn spawn<E: ComputeEngine>(engine: E) -> Result<Self, LiveMapError> {
        let kind = engine.kind();
        let (request_tx, request_rx) = mpsc::channel::<WorkerMessage>();
        let in_flight = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&in_flight);

        let thread = std::thread::Builder::new()
            .name(kind.thread_name().into())
            .spawn(move || {
                Self::thread_loop(&engine, &request_rx, &flag);
            })
            .map_err(LiveMapError::ThreadSpawn)?;

        log::debug!("spawned {kind} worker");
        Ok(Self {
            kind,
            request_tx,
            in_flight,
            thread: Some(thread),
        })
    }

    /// The kind of engine this worker runs.
    #[must_use]
    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    /// Whether the worker can accept a request right now.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        !self.in_flight.load(Ordering::Acquire)
    }

    /// [`RequestState::Sent`] while a request is running, otherwise
    /// [`RequestState::Idle`]. Outcomes are reported by the
    /// [`PendingResponse`] of each request.
    #[must_use]
    pub fn state(&self) -> RequestState {
        if self.is_idle() {
            RequestState::Idle
        } else {
            RequestState::Sent
        }
    }

    /// Hand a request to the worker without waiting for the result.
    ///
    /// # Errors
    ///
    /// [`LiveMapError::Busy`] while a previous request is still running,
    /// [`LiveMapError::Transport`] if the request cannot be encoded or the
    /// worker thread is gone.
    pub fn submit(
        &self,
        request: &ComputeRequest,
    ) -> Result<PendingResponse, LiveMapError> {
        let payload = encode_request(request)?;

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(LiveMapError::Busy(self.kind));
        }

        let (reply, reply_rx) = mpsc::channel();
        if self
            .request_tx
            .send(WorkerMessage::Compute { payload, reply })
            .is_err()
        {
            self.in_flight.store(false, Ordering::Release);
            return Err(LiveMapError::Transport(format!(
                "{} worker has shut down",
                self.kind
            )));
        }

        Ok(PendingResponse {
            kind: self.kind,
            reply_rx,
            state: RequestState::Sent,
        })
    }

    /// Submit a request and block until it completes.
    ///
    /// # Errors
    ///
    /// Anything [`submit`](Self::submit) or the engine reports.
    pub fn compute(
        &self,
        request: &ComputeRequest,
    ) -> Result<ComputeResponse, LiveMapError> {
        self.submit(request)?.wait()
    }

    /// Stop the background thread and wait for it to finish.
    pub fn shutdown(&mut self) {
        let _ = self.request_tx.send(WorkerMessage::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
            log::debug!("{} worker stopped", self.kind);
        }
    }

    fn thread_loop<E: ComputeEngine>(
        engine: &E,
        request_rx: &mpsc::Receiver<WorkerMessage>,
        in_flight: &AtomicBool,
    ) {
        while let Ok(message) = request_rx.recv() {
            match message {
                WorkerMessage::Shutdown => break,
                WorkerMessage::Compute { payload, reply } => {
                    let result = Self::run(engine, &payload);
                    if let Err(e) = &result {
                        log::warn!("{} request failed: {e}", engine.kind());
                    }
                    // Cleared before replying so a caller that has just
                    // received its result can submit again immediately.
                    in_flight.store(false, Ordering::Release);
                    let _ = reply.send(result);
                }
            }
        }
    }

    fn run<E: ComputeEngine>(engine: &E, payload: &[u8]) -> Reply {
        let request = decode_request(payload)?;
        panic::catch_unwind(AssertUnwindSafe(|| engine.execute(&request)))
            .unwrap_or_else(|cause| {
                let detail = cause
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| cause.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_owned());
                Err(LiveMapError::Transport(format!(
                    "{} engine panicked: {detail}",
                    engine.kind()
                )))
            })
    }
}

impl Drop for ComputeWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Caller's handle on a submitted request.
#[derive(Debug)]
pub struct PendingResponse {
    kind: EngineKind,
    reply_rx: mpsc::Receiver<Reply>,
    state: RequestState,
}

impl PendingResponse {
    /// Current state of the request.
    #[must_use]
    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Block until the worker replies.
    ///
    /// # Errors
    ///
    /// The engine's error, or [`LiveMapError::Transport`] if the worker
    /// went away without replying.
    pub fn wait(mut self) -> Result<ComputeResponse, LiveMapError> {
        let reply = self.reply_rx.recv().map_err(|_| self.disconnected());
        self.settle(reply.and_then(|r| r))
    }

    /// Poll for the reply without blocking. `None` while the request is
    /// still running, or once the reply has already been taken.
    pub fn try_recv(
        &mut self,
    ) -> Option<Result<ComputeResponse, LiveMapError>> {
        if self.state != RequestState::Sent {
            return None;
        }
        match self.reply_rx.try_recv() {
            Ok(reply) => Some(self.settle(reply)),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => {
                let err = self.disconnected();
                Some(self.settle(Err(err)))
            }
        }
    }

    fn settle(&mut self, reply: Reply) -> Reply {
        self.state = if reply.is_ok() {
            RequestState::Completed
        } else {
            RequestState::Failed
        };
        reply
    }

    fn disconnected(&self) -> LiveMapError {
        LiveMapError::Transport(format!(
            "{} worker exited before replying",
            self.kind
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::{Receiver, SyncSender};
    use std::sync::Mutex;

    use super::*;
    use crate::engine::{ContactFrequencyEngine, DistanceMatrixEngine};
    use crate::matrix::{ContactMatrix, DistanceMatrix, MatrixBuffer};
    use crate::trace::{Point3D, Trace};
    use crate::transport::Mode;

    fn line_trace() -> Trace {
        Trace::new(vec![
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(1.0, 0.0, 0.0),
            Point3D::new(10.0, 0.0, 0.0),
        ])
    }

    /// Engine that blocks until the test releases it.
    struct GatedEngine {
        started: SyncSender<()>,
        release: Mutex<Receiver<()>>,
    }

    impl ComputeEngine for GatedEngine {
        fn kind(&self) -> EngineKind {
            EngineKind::Distance
        }

        fn execute(
            &self,
            request: &ComputeRequest,
        ) -> Result<ComputeResponse, LiveMapError> {
            self.started.send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
            Ok(ComputeResponse {
                mode: request.mode,
                matrix_buffer: MatrixBuffer::default(),
                max_distance: None,
            })
        }
    }

    struct PanickingEngine;

    impl ComputeEngine for PanickingEngine {
        fn kind(&self) -> EngineKind {
            EngineKind::ContactFrequency
        }

        #[allow(clippy::panic)]
        fn execute(
            &self,
            _request: &ComputeRequest,
        ) -> Result<ComputeResponse, LiveMapError> {
            panic!("boom")
        }
    }

    #[test]
    fn contact_worker_computes_a_trace() {
        let worker =
            ComputeWorker::spawn(ContactFrequencyEngine::default()).unwrap();
        let response = worker
            .compute(&ComputeRequest::contact_trace(line_trace(), 3, Some(2.0)))
            .unwrap();
        let m = ContactMatrix::from_buffer(&response.matrix_buffer).unwrap();
        assert_eq!(m.cells(), &[1, 1, 0, 1, 1, 0, 0, 0, 1]);
        assert!(worker.is_idle());
    }

    #[test]
    fn distance_worker_computes_an_ensemble() {
        let a = Trace::new(vec![
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(2.0, 0.0, 0.0),
        ]);
        let b = Trace::new(vec![
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(0.0, 4.0, 0.0),
        ]);
        let worker =
            ComputeWorker::spawn(DistanceMatrixEngine::default()).unwrap();
        let mut pending = worker
            .submit(&ComputeRequest::distance_ensemble(vec![a, b], 2))
            .unwrap();
        assert_eq!(pending.state(), RequestState::Sent);

        let response = loop {
            if let Some(result) = pending.try_recv() {
                break result.unwrap();
            }
            std::thread::yield_now();
        };
        assert_eq!(pending.state(), RequestState::Completed);
        assert!(pending.try_recv().is_none());
        assert_eq!(response.mode, Mode::Ensemble);
        assert_eq!(response.max_distance, Some(3.0));
        let m = DistanceMatrix::from_buffer(&response.matrix_buffer).unwrap();
        assert_eq!(m.get(0, 1), Some(3.0));
    }

    #[test]
    fn second_submit_while_running_is_busy() {
        let (started, started_rx) = mpsc::sync_channel(1);
        let (release_tx, release) = mpsc::channel();
        let worker = ComputeWorker::spawn(GatedEngine {
            started,
            release: Mutex::new(release),
        })
        .unwrap();

        let request = ComputeRequest::distance_trace(line_trace(), 3);
        let first = worker.submit(&request).unwrap();
        started_rx.recv().unwrap();
        assert_eq!(worker.state(), RequestState::Sent);
        assert!(matches!(
            worker.submit(&request),
            Err(LiveMapError::Busy(EngineKind::Distance))
        ));

        release_tx.send(()).unwrap();
        assert!(first.wait().is_ok());
        assert_eq!(worker.state(), RequestState::Idle);

        let again = worker.submit(&request).unwrap();
        started_rx.recv().unwrap();
        release_tx.send(()).unwrap();
        assert!(again.wait().is_ok());
    }

    #[test]
    fn both_workers_report_bounds_errors() {
        let contact =
            ComputeWorker::spawn(ContactFrequencyEngine::default()).unwrap();
        let distance =
            ComputeWorker::spawn(DistanceMatrixEngine::default()).unwrap();

        let err = contact
            .compute(&ComputeRequest::contact_trace(line_trace(), 2, Some(1.0)))
            .unwrap_err();
        assert!(matches!(err, LiveMapError::Bounds { .. }));

        let err = distance
            .compute(&ComputeRequest::distance_trace(line_trace(), 2))
            .unwrap_err();
        assert!(matches!(err, LiveMapError::Bounds { .. }));

        assert!(contact.is_idle());
        assert!(distance.is_idle());
    }

    #[test]
    fn missing_payload_fails_without_killing_the_worker() {
        let worker =
            ComputeWorker::spawn(DistanceMatrixEngine::default()).unwrap();
        let mut request = ComputeRequest::distance_trace(line_trace(), 3);
        request.trace = None;
        let mut pending = worker.submit(&request).unwrap();
        let result = loop {
            if let Some(result) = pending.try_recv() {
                break result;
            }
            std::thread::yield_now();
        };
        assert!(matches!(result, Err(LiveMapError::Transport(_))));
        assert_eq!(pending.state(), RequestState::Failed);

        let ok =
            worker.compute(&ComputeRequest::distance_trace(line_trace(), 3));
        assert!(ok.is_ok());
    }

    #[test]
    fn non_finite_threshold_is_reported_through_the_worker() {
        let worker =
            ComputeWorker::spawn(ContactFrequencyEngine::default()).unwrap();
        for bad in [f64::INFINITY, f64::NAN] {
            let request =
                ComputeRequest::contact_trace(line_trace(), 3, Some(bad));
            let err = worker.compute(&request).unwrap_err();
            assert!(matches!(err, LiveMapError::Transport(_)), "{err}");
            assert!(worker.is_idle());
        }

        let ok = worker
            .compute(&ComputeRequest::contact_trace(line_trace(), 3, Some(2.0)))
            .unwrap();
        assert_eq!(ok.matrix_buffer.len(), 9);
    }

    #[test]
    fn non_finite_coordinates_are_reported_through_the_worker() {
        let worker =
            ComputeWorker::spawn(DistanceMatrixEngine::default()).unwrap();
        let trace = Trace::new(vec![
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(f64::NAN, 1.0, 1.0),
        ]);
        let err = worker
            .compute(&ComputeRequest::distance_trace(trace, 2))
            .unwrap_err();
        assert!(matches!(err, LiveMapError::Construction(_)), "{err}");
    }

    #[test]
    fn huge_side_fails_without_killing_the_worker() {
        let trace = Trace::new(vec![Point3D::new(0.0, 0.0, 0.0)]);
        let distance =
            ComputeWorker::spawn(DistanceMatrixEngine::default()).unwrap();
        let err = distance
            .compute(&ComputeRequest::distance_trace(trace.clone(), 1 << 22))
            .unwrap_err();
        assert!(matches!(err, LiveMapError::Transport(_)), "{err}");
        assert!(distance
            .compute(&ComputeRequest::distance_trace(trace.clone(), 1))
            .is_ok());

        let contact =
            ComputeWorker::spawn(ContactFrequencyEngine::default()).unwrap();
        let request = ComputeRequest::contact_trace(trace, 1 << 22, Some(1.0));
        assert!(matches!(
            contact.compute(&request),
            Err(LiveMapError::Transport(_))
        ));
        assert!(contact.is_idle());
    }

    #[test]
    fn engine_panic_becomes_a_transport_error() {
        let worker = ComputeWorker::spawn(PanickingEngine).unwrap();
        let request = ComputeRequest::contact_trace(line_trace(), 3, Some(1.0));
        let err = worker.compute(&request).unwrap_err();
        assert!(err.to_string().contains("boom"), "{err}");
        assert!(worker.is_idle());
    }

    #[test]
    fn shutdown_rejects_later_requests() {
        let mut worker =
            ComputeWorker::spawn(DistanceMatrixEngine::default()).unwrap();
        worker.shutdown();
        let err = worker
            .submit(&ComputeRequest::distance_trace(line_trace(), 3))
            .unwrap_err();
        assert!(matches!(err, LiveMapError::Transport(_)));
        assert!(worker.is_idle());
    }
}
