//! The background push loop.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::stats::Shared;
use crate::{Error, Transport};

/// Samples and pushes metrics once per interval on a dedicated thread.
///
/// The thread holds the shutdown lock whenever it is not waiting, so
/// setting the shutdown flag waits for an in-flight push to finish and no
/// push can begin afterwards.
pub(crate) struct Worker {
    shared: Arc<Shared>,
    transport: Arc<dyn Transport>,
    shutdown: Arc<(Mutex<bool>, Condvar)>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawns the worker thread.
    ///
    /// On failure the transport is closed again.
    pub(crate) fn spawn(
        shared: Arc<Shared>,
        transport: Arc<dyn Transport>,
        interval: Duration,
    ) -> Result<Self, Error> {
        #[allow(clippy::mutex_atomic)]
        let shutdown = Arc::new((Mutex::new(false), Condvar::new()));

        let worker_shared = shared.clone();
        let worker_transport = transport.clone();
        let worker_shutdown = shutdown.clone();
        let spawned = thread::Builder::new()
            .name("runstats-worker".into())
            .spawn(move || {
                let (lock, cvar) = worker_shutdown.as_ref();
                let mut shutdown = lock.lock().unwrap_or_else(PoisonError::into_inner);
                // check this immediately, in case we are stopped already
                if *shutdown {
                    return;
                }
                runstats_debug!("worker started, pushing every {:?}", interval);
                let mut last_push = Instant::now();
                loop {
                    let timeout = interval
                        .checked_sub(last_push.elapsed())
                        .unwrap_or_default();
                    shutdown = cvar
                        .wait_timeout(shutdown, timeout)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                    if *shutdown {
                        runstats_debug!("worker stopped");
                        return;
                    }
                    if last_push.elapsed() >= interval {
                        last_push = Instant::now();
                        push_samples(&worker_shared, worker_transport.as_ref());
                    }
                }
            });

        match spawned {
            Ok(handle) => Ok(Self {
                shared,
                transport,
                shutdown,
                handle: Some(handle),
            }),
            Err(err) => {
                transport.close();
                Err(Error::Spawn(err))
            }
        }
    }

    /// Pushes one round of samples right away.
    ///
    /// Returns `false` if the worker is shutting down.
    pub(crate) fn push_now(&self) -> bool {
        let (lock, _) = self.shutdown.as_ref();
        let shutdown = lock.lock().unwrap_or_else(PoisonError::into_inner);
        if *shutdown {
            return false;
        }
        push_samples(&self.shared, self.transport.as_ref());
        drop(shutdown);
        true
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        let (lock, cvar) = self.shutdown.as_ref();
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_one();

        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
        self.transport.close();
    }
}

/// Samples every sampler and sends the results through `transport`.
///
/// Send and flush errors are logged and otherwise ignored.
pub(crate) fn push_samples(shared: &Shared, transport: &dyn Transport) {
    let samples = shared.collect();
    runstats_debug!("pushing {} samples", samples.len());

    for sample in &samples {
        if let Err(err) = transport.gauge(&sample.name, sample.value) {
            runstats_debug!("failed to send {}: {}", sample.name, err);
        }
    }
    if let Err(err) = transport.flush() {
        runstats_debug!("failed to flush transport: {}", err);
    }
}
