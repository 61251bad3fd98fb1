use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use runstats::test::{with_captured_samples, TestTransport};
use runstats::{
    RuntimeSnapshot, Sampler, Samples, State, StaticSnapshot, Stats, StatsOptions,
};

const WAIT: Duration = Duration::from_secs(10);

fn options(transport: &Arc<TestTransport>) -> StatsOptions {
    StatsOptions::new()
        .with_client_name("testclient")
        .with_hostname("localhost")
        .with_interval(Duration::from_millis(20))
        .with_transport(transport.clone())
}

#[test]
fn test_pushes_every_interval() {
    let transport = TestTransport::new();
    let stats = Stats::with_options(options(&transport));

    stats.start().unwrap();
    assert!(transport.wait_for_flushes(3, WAIT));
    stats.stop();

    let samples = transport.fetch_and_clear_samples();
    assert!(samples
        .iter()
        .all(|s| s.name.starts_with("testclient.localhost.")));
    for metric in ["cgo.calls", "gc.perSecond", "gc.pauseTimeNs", "gc.pauseTimeMs"] {
        let name = format!("testclient.localhost.{metric}");
        assert!(
            samples.iter().filter(|s| s.name == name).count() >= 3,
            "should push {name} on every tick"
        );
    }
}

#[test]
fn test_nothing_is_sent_after_stop() {
    let transport = TestTransport::new();
    let stats = Stats::with_options(options(&transport));

    stats.start().unwrap();
    assert!(transport.wait_for_flushes(1, WAIT));
    stats.stop();

    let flushes = transport.flush_count();
    transport.fetch_and_clear_samples();
    thread::sleep(Duration::from_millis(100));

    assert_eq!(transport.flush_count(), flushes);
    assert!(transport.fetch_and_clear_samples().is_empty());
    assert_eq!(transport.close_count(), 1);

    stats.stop();
    assert_eq!(transport.close_count(), 1);
    assert_eq!(stats.state(), State::Stopped);
}

#[test]
fn test_drop_stops_worker() {
    let transport = TestTransport::new();
    let stats = Stats::with_options(options(&transport));
    stats.start().unwrap();
    drop(stats);

    assert_eq!(transport.close_count(), 1);
    let flushes = transport.flush_count();
    thread::sleep(Duration::from_millis(100));
    assert_eq!(transport.flush_count(), flushes);
}

#[test]
fn test_stop_from_other_thread() {
    let transport = TestTransport::new();
    let stats = Arc::new(Stats::with_options(options(&transport)));
    stats.start().unwrap();
    assert!(transport.wait_for_flushes(1, WAIT));

    let remote = stats.clone();
    thread::spawn(move || remote.stop()).join().unwrap();

    assert_eq!(stats.state(), State::Stopped);
    assert_eq!(transport.close_count(), 1);
}

#[test]
fn test_hostname_change_reaches_next_tick() {
    let transport = TestTransport::new();
    let stats = Stats::with_options(options(&transport));
    stats.start().unwrap();
    assert!(transport.wait_for_flushes(1, WAIT));

    stats.set_hostname("web 2.example");
    let seen = transport.flush_count();
    // the push in flight may still use the old name, the one after must not
    assert!(transport.wait_for_flushes(seen + 2, WAIT));
    stats.stop();

    let samples = transport.fetch_and_clear_samples();
    assert!(samples
        .iter()
        .any(|s| s.name.starts_with("testclient.web_2_example.")));
    assert_eq!(stats.metric_base(), "testclient.web_2_example.");
}

struct QueueDepthSampler;

impl Sampler for QueueDepthSampler {
    fn sample(&self, _snapshot: &dyn RuntimeSnapshot) -> Samples {
        let mut samples = Samples::new();
        samples.insert("queue.depth".into(), 42.0);
        samples
    }

    fn name(&self) -> &'static str {
        "queue-depth"
    }
}

#[test]
fn test_custom_sampler() {
    let samples = with_captured_samples(
        StatsOptions::new()
            .with_client_name("testclient")
            .with_hostname("localhost")
            .with_memory_metrics(false)
            .with_concurrency_metrics(false)
            .with_foreign_call_metrics(false)
            .with_gc_metrics(false)
            .add_sampler(QueueDepthSampler),
        |stats| {
            assert!(stats.flush());
        },
    );

    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].name, "testclient.localhost.queue.depth");
    assert_eq!(samples[0].value, 42.0);
}

struct FlakySampler {
    calls: Arc<AtomicUsize>,
}

impl Sampler for FlakySampler {
    fn sample(&self, _snapshot: &dyn RuntimeSnapshot) -> Samples {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("sampler failed");
        }
        let mut samples = Samples::new();
        samples.insert("flaky.value".into(), 1.0);
        samples
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}

#[test]
fn test_panicking_sampler_keeps_pushing() {
    let transport = TestTransport::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let stats = Stats::with_options(
        options(&transport)
            .with_snapshot(StaticSnapshot {
                foreign_calls: Some(3),
                ..Default::default()
            })
            .add_sampler(FlakySampler {
                calls: calls.clone(),
            }),
    );

    stats.start().unwrap();
    assert!(transport.wait_for_flushes(3, WAIT));
    assert!(stats.is_running());
    stats.stop();

    assert!(calls.load(Ordering::SeqCst) >= 3);
    let samples = transport.fetch_and_clear_samples();
    let count = |name: &str| samples.iter().filter(|s| s.name == name).count();
    // the first round drops the flaky keys only
    assert!(count("testclient.localhost.cgo.calls") >= 3);
    assert_eq!(
        count("testclient.localhost.flaky.value"),
        count("testclient.localhost.cgo.calls") - 1
    );
}
