use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use runstats_core::collectors::{
    ConcurrencySampler, ForeignCallSampler, GcSampler, MemorySampler,
};
use runstats_core::{sanitize_metric_name, ProcessSnapshot, RuntimeSnapshot, Sample, Sampler};

use crate::transports::StatsdTransportFactory;
use crate::utils::server_name;
use crate::worker::Worker;
use crate::{Error, StatsOptions, TransportFactory};

/// Hostname used when the local host cannot report its name.
const UNKNOWN_HOSTNAME: &str = "unknown";

/// Builds the namespace prepended to every metric name.
///
/// # Examples
///
/// ```
/// assert_eq!(
///     runstats::metric_base("testclient", "web-1.example.com"),
///     "testclient.web-1_example_com."
/// );
/// ```
pub fn metric_base(client_name: &str, hostname: &str) -> String {
    format!("{}.{}.", client_name, sanitize_metric_name(hostname))
}

/// The lifecycle state of a [`Stats`] exporter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Created but never started.
    Created,
    /// Pushing metrics in the background.
    Running,
    /// Stopped for good.
    Stopped,
}

enum Lifecycle {
    Created,
    Running(Worker),
    Stopped,
}

/// The part of the exporter the background worker reads.
pub(crate) struct Shared {
    client_name: String,
    hostname: RwLock<String>,
    snapshot: Arc<dyn RuntimeSnapshot>,
    samplers: Vec<Arc<dyn Sampler>>,
}

impl Shared {
    fn metric_base(&self) -> String {
        let hostname = self.hostname.read().unwrap_or_else(PoisonError::into_inner);
        metric_base(&self.client_name, &hostname)
    }

    /// Runs all samplers and prefixes their keys with the metric base.
    ///
    /// A sampler that panics contributes no samples to this round.
    pub(crate) fn collect(&self) -> Vec<Sample> {
        let base = self.metric_base();
        let mut samples = Vec::new();
        for sampler in &self.samplers {
            let sampled =
                panic::catch_unwind(AssertUnwindSafe(|| sampler.sample(self.snapshot.as_ref())));
            let Ok(sampled) = sampled else {
                runstats_debug!("sampler {} panicked, skipping its samples", sampler.name());
                continue;
            };
            for (key, value) in sampled {
                samples.push(Sample::new(format!("{base}{key}"), value));
            }
        }
        samples
    }
}

/// A runtime metrics exporter.
///
/// The exporter samples the process every push interval and sends each
/// sample as a gauge named `<client_name>.<hostname>.<metric>` to statsd.
///
/// It moves through the states of [`State`] exactly once: it is created
/// idle, [`start`](Self::start) spawns the background worker and
/// [`stop`](Self::stop) ends it.  Dropping a running exporter stops it.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
///
/// let stats = runstats::start("127.0.0.1:8125", Duration::from_secs(10), "api")?;
/// // ...
/// stats.stop();
/// # Ok::<(), runstats::Error>(())
/// ```
pub struct Stats {
    options: StatsOptions,
    shared: Arc<Shared>,
    lifecycle: Mutex<Lifecycle>,
}

impl Stats {
    /// Creates an exporter with default options.
    ///
    /// Nothing is sampled or sent until the exporter is started.  Without
    /// [`StatsOptions::with_allocator`] the allocation counters
    /// (`memory.objects.HeapObjects`, `memory.counters.Mallocs`,
    /// `memory.counters.Frees`) are not sent.
    pub fn new() -> Self {
        Self::with_options(StatsOptions::default())
    }

    /// Creates an exporter with the given options.
    pub fn with_options(options: StatsOptions) -> Self {
        let hostname = options.hostname.clone().unwrap_or_else(|| {
            sanitize_metric_name(&server_name().unwrap_or_else(|| UNKNOWN_HOSTNAME.into()))
        });

        let mut samplers: Vec<Arc<dyn Sampler>> = Vec::new();
        if options.collect_memory {
            samplers.push(Arc::new(MemorySampler::new()));
        }
        if options.collect_concurrency {
            samplers.push(Arc::new(ConcurrencySampler::new()));
        }
        if options.collect_foreign_calls {
            samplers.push(Arc::new(ForeignCallSampler::new()));
        }
        if options.collect_gc {
            samplers.push(Arc::new(GcSampler::new()));
        }
        samplers.extend(options.samplers.iter().cloned());

        let snapshot = options
            .snapshot
            .clone()
            .unwrap_or_else(|| Arc::new(ProcessSnapshot::new()));

        let shared = Arc::new(Shared {
            client_name: options.client_name().to_owned(),
            hostname: RwLock::new(hostname),
            snapshot,
            samplers,
        });

        Self {
            options,
            shared,
            lifecycle: Mutex::new(Lifecycle::Created),
        }
    }

    /// The options this exporter was created with.
    pub fn options(&self) -> &StatsOptions {
        &self.options
    }

    /// The statsd address metrics are sent to.
    pub fn statsd_host(&self) -> &str {
        self.options.statsd_host()
    }

    /// How often metrics are pushed.
    pub fn push_interval(&self) -> Duration {
        self.options.push_interval()
    }

    /// The first segment of every metric name.
    pub fn client_name(&self) -> &str {
        &self.shared.client_name
    }

    /// The hostname used as the second segment of every metric name.
    pub fn hostname(&self) -> String {
        self.shared
            .hostname
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the hostname.
    ///
    /// The value is sanitized when the metric base is built.  A running
    /// exporter picks it up on its next push; a push that is already in
    /// progress may or may not see it.
    pub fn set_hostname<S: Into<String>>(&self, hostname: S) {
        *self
            .shared
            .hostname
            .write()
            .unwrap_or_else(PoisonError::into_inner) = hostname.into();
    }

    /// The namespace prepended to every metric name.
    pub fn metric_base(&self) -> String {
        self.shared.metric_base()
    }

    /// Runs all samplers once and returns the prefixed samples without
    /// sending them.
    pub fn collect(&self) -> Vec<Sample> {
        self.shared.collect()
    }

    /// The current lifecycle state.
    pub fn state(&self) -> State {
        match *self.lock_lifecycle() {
            Lifecycle::Created => State::Created,
            Lifecycle::Running(_) => State::Running,
            Lifecycle::Stopped => State::Stopped,
        }
    }

    /// Whether metrics are being pushed.
    pub fn is_running(&self) -> bool {
        self.state() == State::Running
    }

    /// Connects the transport and starts pushing metrics in the background.
    ///
    /// Returns right away; the first push happens one interval later.
    /// Starting a running exporter does nothing.  If connecting fails the
    /// exporter stays idle and may be started again.
    pub fn start(&self) -> Result<(), Error> {
        let mut lifecycle = self.lock_lifecycle();
        match *lifecycle {
            Lifecycle::Created => {}
            Lifecycle::Running(_) => {
                runstats_debug!("exporter is already running");
                return Ok(());
            }
            Lifecycle::Stopped => return Err(Error::Stopped),
        }

        let interval = self.push_interval();
        if interval.is_zero() {
            return Err(Error::InvalidInterval);
        }

        let transport = match self.options.transport {
            Some(ref factory) => factory.create_transport(&self.options)?,
            None => StatsdTransportFactory.create_transport(&self.options)?,
        };
        let worker = Worker::spawn(self.shared.clone(), transport, interval)?;

        *lifecycle = Lifecycle::Running(worker);
        Ok(())
    }

    /// Samples and pushes metrics right away, outside the regular schedule.
    ///
    /// Returns `false` if the exporter is not running.
    pub fn flush(&self) -> bool {
        match *self.lock_lifecycle() {
            Lifecycle::Running(ref worker) => worker.push_now(),
            _ => false,
        }
    }

    /// Stops pushing metrics and closes the transport.
    ///
    /// Waits for a push in progress to finish; nothing is sent after this
    /// returns.  Stopping an exporter that is idle or already stopped does
    /// nothing.  Must not be called from within a sampler.
    pub fn stop(&self) {
        let mut lifecycle = self.lock_lifecycle();
        if let Lifecycle::Running(_) = *lifecycle {
            // dropping the worker joins its thread
            drop(mem::replace(&mut *lifecycle, Lifecycle::Stopped));
        }
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stats")
            .field("metric_base", &self.metric_base())
            .field("statsd_host", &self.statsd_host())
            .field("push_interval", &self.push_interval())
            .field("state", &self.state())
            .finish()
    }
}

/// Creates an exporter and starts it.
///
/// `push_interval` is the time between two pushes and `client_name` the
/// first segment of every metric name; an empty name selects
/// [`DEFAULT_CLIENT_NAME`](crate::DEFAULT_CLIENT_NAME).
///
/// The exporter reads the live process without allocation counters; use
/// [`Stats::with_options`] and [`StatsOptions::with_allocator`] to send
/// them too.
pub fn start(
    statsd_host: &str,
    push_interval: Duration,
    client_name: &str,
) -> Result<Stats, Error> {
    let stats = Stats::with_options(
        StatsOptions::new()
            .with_statsd_host(statsd_host)
            .with_interval(push_interval)
            .with_client_name(client_name),
    );
    stats.start()?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestTransport;
    use runstats_core::{GcStats, StaticSnapshot};

    fn test_options() -> StatsOptions {
        StatsOptions::new()
            .with_client_name("testclient")
            .with_hostname("localhost")
            .with_transport(TestTransport::new())
    }

    #[test]
    fn test_new() {
        let stats = Stats::new();
        let expected = sanitize_metric_name(&server_name().unwrap_or_else(|| "unknown".into()));

        assert_eq!(stats.hostname(), expected);
        assert_eq!(stats.client_name(), "runstats");
        assert_eq!(stats.state(), State::Created);

        stats.set_hostname("localhost");
        assert_eq!(stats.metric_base(), "runstats.localhost.");
    }

    #[test]
    fn test_metric_base() {
        let stats = Stats::with_options(test_options());
        assert_eq!(stats.metric_base(), "testclient.localhost.");

        stats.set_hostname("db.internal/eu west");
        assert_eq!(stats.hostname(), "db.internal/eu west");
        assert_eq!(stats.metric_base(), "testclient.db_internal_eu_west.");
    }

    #[test]
    fn test_stop_is_idempotent() {
        let stats = Stats::with_options(test_options());
        stats.stop();
        assert_eq!(stats.state(), State::Created);

        stats.start().unwrap();
        stats.stop();
        stats.stop();
        assert_eq!(stats.state(), State::Stopped);
        assert!(matches!(stats.start(), Err(Error::Stopped)));
    }

    #[test]
    fn test_start_twice_keeps_one_worker() {
        let transport = TestTransport::new();
        let stats = Stats::with_options(test_options().with_transport(transport.clone()));

        stats.start().unwrap();
        stats.start().unwrap();
        assert!(stats.is_running());

        stats.stop();
        assert_eq!(transport.close_count(), 1);
    }

    #[test]
    fn test_failed_start_stays_created() {
        let stats = Stats::with_options(
            StatsOptions::new()
                .with_statsd_host("localhost")
                .with_interval(Duration::from_secs(1)),
        );
        assert!(stats.start().is_err());
        assert_eq!(stats.state(), State::Created);

        let stats = Stats::with_options(test_options().with_interval(Duration::ZERO));
        assert!(matches!(stats.start(), Err(Error::InvalidInterval)));
        assert_eq!(stats.state(), State::Created);
    }

    #[test]
    fn test_collect_prefixes_samples() {
        let stats = Stats::with_options(
            test_options()
                .with_memory_metrics(false)
                .with_concurrency_metrics(false)
                .with_snapshot(StaticSnapshot {
                    foreign_calls: Some(7),
                    gc: Some(GcStats {
                        collections: 2,
                        pause_total_ns: 4_000_000,
                        uptime: Duration::from_secs(4),
                    }),
                    ..Default::default()
                }),
        );

        let samples = stats.collect();
        let names: Vec<_> = samples.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "testclient.localhost.cgo.calls",
                "testclient.localhost.gc.pauseTimeMs",
                "testclient.localhost.gc.pauseTimeNs",
                "testclient.localhost.gc.perSecond",
            ]
        );
        assert_eq!(samples[0].value, 7.0);
        assert_eq!(samples[1].value, 4.0);
        assert_eq!(samples[3].value, 0.5);
    }

    #[test]
    fn test_default_memory_metrics() {
        let stats = Stats::with_options(
            test_options()
                .with_concurrency_metrics(false)
                .with_foreign_call_metrics(false)
                .with_gc_metrics(false),
        );

        let names: Vec<_> = stats.collect().into_iter().map(|s| s.name).collect();
        assert!(!names.contains(&"testclient.localhost.memory.objects.HeapObjects".to_owned()));
        assert!(!names.contains(&"testclient.localhost.memory.counters.Mallocs".to_owned()));
        assert!(!names.contains(&"testclient.localhost.memory.counters.Frees".to_owned()));

        #[cfg(all(target_os = "linux", target_env = "gnu", not(feature = "jemalloc")))]
        assert_eq!(
            names,
            [
                "testclient.localhost.memory.heap.Idle",
                "testclient.localhost.memory.heap.InUse",
                "testclient.localhost.memory.summary.Alloc",
                "testclient.localhost.memory.summary.System",
            ]
        );
    }

    #[test]
    fn test_flush_requires_running() {
        let transport = TestTransport::new();
        let stats = Stats::with_options(
            test_options()
                .with_interval(Duration::from_secs(3600))
                .with_transport(transport.clone()),
        );
        assert!(!stats.flush());

        stats.start().unwrap();
        assert!(stats.flush());
        assert_eq!(transport.flush_count(), 1);
        assert!(!transport.fetch_and_clear_samples().is_empty());

        stats.stop();
        assert!(!stats.flush());
    }
}
