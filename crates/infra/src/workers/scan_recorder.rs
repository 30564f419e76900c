use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{debug, warn};

use ecosmart_core::UserId;
use ecosmart_events::{EventBus, EventEnvelope, Subscription, UserScoped};
use ecosmart_rewards::RewardEvent;

use crate::scan_history::{NewScanRecord, ScanHistoryStore, StoreError};

const WORKER_NAME: &str = "scan-recorder";

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Drains reward events from the bus into the scan-history sink.
///
/// - Runs on its own thread so the request path never waits on persistence
/// - Store futures are driven through the given runtime handle
/// - Failed writes are logged and dropped
#[derive(Debug)]
pub struct ScanRecorder;

impl ScanRecorder {
    /// Subscribe to `bus` and spawn the recorder thread.
    ///
    /// - `user_id`: when provided, events for other users are ignored
    /// - `runtime`: must not be the handle of a runtime the calling thread is
    ///   blocked inside
    pub fn spawn<B, S>(bus: &B, store: S, runtime: Handle, user_id: Option<UserId>) -> io::Result<WorkerHandle>
    where
        B: EventBus<EventEnvelope<RewardEvent>>,
        S: ScanHistoryStore + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub = bus.subscribe();

        let join = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || {
                worker_loop(sub, shutdown_rx, user_id, |envelope| record(&store, &runtime, envelope))
            })?;

        Ok(WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

fn record<S>(store: &S, runtime: &Handle, envelope: EventEnvelope<RewardEvent>) -> Result<(), StoreError>
where
    S: ScanHistoryStore,
{
    let Some(new_record) = NewScanRecord::from_event(envelope.event_id(), envelope.payload()) else {
        return Ok(());
    };

    let stored = runtime.block_on(store.record_scan(new_record))?;
    debug!(
        scan_id = %stored.id,
        action = stored.action.as_str(),
        points = stored.points_earned,
        "scan recorded"
    );
    Ok(())
}

fn worker_loop<H>(
    sub: Subscription<EventEnvelope<RewardEvent>>,
    shutdown_rx: mpsc::Receiver<()>,
    user_id: Option<UserId>,
    mut handler: H,
) where
    H: FnMut(EventEnvelope<RewardEvent>) -> Result<(), StoreError>,
{
    let tick = Duration::from_millis(250);

    let mut deliver = |envelope: EventEnvelope<RewardEvent>| {
        if let Some(u) = user_id {
            if envelope.user_id() != u {
                return;
            }
        }

        let event_type = envelope.event_type();
        if let Err(err) = handler(envelope) {
            warn!(worker = WORKER_NAME, event_type, error = %err, "scan history write failed");
        }
    };

    loop {
        // Shutdown check (non-blocking); whatever is already queued is still recorded.
        if shutdown_rx.try_recv().is_ok() {
            while let Ok(envelope) = sub.try_recv() {
                deliver(envelope);
            }
            break;
        }

        match sub.recv_timeout(tick) {
            Ok(envelope) => deliver(envelope),
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}
