use std::alloc::System;
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use runstats_core::{ProcessSnapshot, RuntimeSnapshot, Sampler};
use stats_alloc::StatsAlloc;

use crate::TransportFactory;

/// The client name used when none is configured.
pub const DEFAULT_CLIENT_NAME: &str = "runstats";

/// The statsd address used when none is configured.
pub const DEFAULT_STATSD_HOST: &str = "127.0.0.1:8125";

/// The push interval used when none is configured.
pub const DEFAULT_PUSH_INTERVAL: Duration = Duration::from_secs(10);

/// Configuration settings for the exporter.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// let options = runstats::StatsOptions {
///     client_name: Some("api".into()),
///     push_interval: Some(Duration::from_secs(5)),
///     ..Default::default()
/// };
/// assert_eq!(options.client_name(), "api");
/// assert_eq!(options.statsd_host(), runstats::DEFAULT_STATSD_HOST);
/// ```
#[derive(Clone)]
pub struct StatsOptions {
    /// The statsd address as `host:port`.
    ///
    /// Defaults to [`DEFAULT_STATSD_HOST`].
    pub statsd_host: Option<String>,
    /// How often to sample and push metrics.
    ///
    /// Defaults to [`DEFAULT_PUSH_INTERVAL`].
    pub push_interval: Option<Duration>,
    /// The first segment of every metric name.
    ///
    /// Defaults to [`DEFAULT_CLIENT_NAME`], which also replaces an empty name.
    pub client_name: Option<String>,
    /// The hostname used as the second segment of every metric name.
    ///
    /// Defaults to the sanitized name of the local host.
    pub hostname: Option<String>,
    /// Enable the memory sampler. (defaults to true)
    pub collect_memory: bool,
    /// Enable the thread count sampler. (defaults to true)
    pub collect_concurrency: bool,
    /// Enable the foreign call sampler. (defaults to true)
    pub collect_foreign_calls: bool,
    /// Enable the collection activity sampler. (defaults to true)
    pub collect_gc: bool,
    /// Custom samplers to run after the built-in ones.
    pub samplers: Vec<Arc<dyn Sampler>>,
    /// The source of runtime statistics.
    ///
    /// Defaults to a [`ProcessSnapshot`] without allocation counters.
    pub snapshot: Option<Arc<dyn RuntimeSnapshot>>,
    /// The transport to use.
    ///
    /// Defaults to the [`StatsdTransportFactory`](crate::transports::StatsdTransportFactory).
    pub transport: Option<Arc<dyn TransportFactory>>,
}

impl StatsOptions {
    /// Creates new options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates new options with unset values filled in from the environment.
    ///
    /// See [`apply_defaults`].
    pub fn from_env() -> Self {
        apply_defaults(Self::default())
    }

    /// Sets the statsd address.
    #[must_use]
    pub fn with_statsd_host<S: Into<String>>(mut self, statsd_host: S) -> Self {
        self.statsd_host = Some(statsd_host.into());
        self
    }

    /// Sets the push interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.push_interval = Some(interval);
        self
    }

    /// Sets the client name.
    #[must_use]
    pub fn with_client_name<S: Into<String>>(mut self, client_name: S) -> Self {
        self.client_name = Some(client_name.into());
        self
    }

    /// Sets the hostname.
    #[must_use]
    pub fn with_hostname<S: Into<String>>(mut self, hostname: S) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Enables or disables memory metrics.
    #[must_use]
    pub fn with_memory_metrics(mut self, enabled: bool) -> Self {
        self.collect_memory = enabled;
        self
    }

    /// Enables or disables thread count metrics.
    #[must_use]
    pub fn with_concurrency_metrics(mut self, enabled: bool) -> Self {
        self.collect_concurrency = enabled;
        self
    }

    /// Enables or disables foreign call metrics.
    #[must_use]
    pub fn with_foreign_call_metrics(mut self, enabled: bool) -> Self {
        self.collect_foreign_calls = enabled;
        self
    }

    /// Enables or disables collection activity metrics.
    #[must_use]
    pub fn with_gc_metrics(mut self, enabled: bool) -> Self {
        self.collect_gc = enabled;
        self
    }

    /// Adds a custom sampler.
    #[must_use]
    pub fn add_sampler<S: Sampler>(mut self, sampler: S) -> Self {
        self.samplers.push(Arc::new(sampler));
        self
    }

    /// Sets the source of runtime statistics.
    #[must_use]
    pub fn with_snapshot<S: RuntimeSnapshot>(mut self, snapshot: S) -> Self {
        self.snapshot = Some(Arc::new(snapshot));
        self
    }

    /// Reads allocation counters from the instrumented global allocator.
    ///
    /// This replaces the snapshot source with a
    /// [`ProcessSnapshot`] attached to `allocator`, which enables the
    /// `memory.objects.HeapObjects`, `memory.counters.Mallocs` and
    /// `memory.counters.Frees` metrics.
    #[must_use]
    pub fn with_allocator(self, allocator: &'static StatsAlloc<System>) -> Self {
        self.with_snapshot(ProcessSnapshot::with_allocator(allocator))
    }

    /// Sets the transport factory.
    #[must_use]
    pub fn with_transport<F: TransportFactory + 'static>(mut self, transport: F) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// The effective statsd address.
    pub fn statsd_host(&self) -> &str {
        self.statsd_host.as_deref().unwrap_or(DEFAULT_STATSD_HOST)
    }

    /// The effective push interval.
    pub fn push_interval(&self) -> Duration {
        self.push_interval.unwrap_or(DEFAULT_PUSH_INTERVAL)
    }

    /// The effective client name.
    pub fn client_name(&self) -> &str {
        self.client_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_CLIENT_NAME)
    }
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            statsd_host: None,
            push_interval: None,
            client_name: None,
            hostname: None,
            collect_memory: true,
            collect_concurrency: true,
            collect_foreign_calls: true,
            collect_gc: true,
            samplers: Vec::new(),
            snapshot: None,
            transport: None,
        }
    }
}

impl fmt::Debug for StatsOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[derive(Debug)]
        struct TransportFactory;

        f.debug_struct("StatsOptions")
            .field("statsd_host", &self.statsd_host)
            .field("push_interval", &self.push_interval)
            .field("client_name", &self.client_name)
            .field("hostname", &self.hostname)
            .field("collect_memory", &self.collect_memory)
            .field("collect_concurrency", &self.collect_concurrency)
            .field("collect_foreign_calls", &self.collect_foreign_calls)
            .field("collect_gc", &self.collect_gc)
            .field("samplers_count", &self.samplers.len())
            .field("snapshot", &self.snapshot.as_ref().map(|_| "RuntimeSnapshot"))
            .field("transport", &self.transport.as_ref().map(|_| TransportFactory))
            .finish()
    }
}

/// Fills unset options from the environment.
///
/// - `statsd_host` from `RUNSTATS_STATSD_HOST`
/// - `push_interval` from `RUNSTATS_PUSH_INTERVAL`, in whole seconds
/// - `client_name` from `RUNSTATS_CLIENT_NAME`
///
/// Values that cannot be parsed are ignored.
pub fn apply_defaults(mut opts: StatsOptions) -> StatsOptions {
    if opts.statsd_host.is_none() {
        opts.statsd_host = env::var("RUNSTATS_STATSD_HOST").ok();
    }
    if opts.push_interval.is_none() {
        opts.push_interval = env::var("RUNSTATS_PUSH_INTERVAL")
            .ok()
            .and_then(|secs| secs.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
    }
    if opts.client_name.is_none() {
        opts.client_name = env::var("RUNSTATS_CLIENT_NAME").ok();
    }
    opts
}
