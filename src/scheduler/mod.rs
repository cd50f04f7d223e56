//! Fixed-cadence sampling
//!
//! [`SampleScheduler`] resolves the configured groups once, starts RDT
//! monitoring for each, then runs strictly sequential cycles. Every cycle
//! measures the PMU counters over the configured period, polls RDT once per
//! group, emits one record per (group, metric) plus three RDT records per
//! group, and sleeps out the rest of the cadence.
//!
//! # Example
//!
//! ```no_run
//! use pgos::prelude::*;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<()> {
//!     let config = SamplerConfig::from_json_file("pgos.json")?;
//!     let backend = ResctrlBackend::new(&config.resctrl_root);
//!     let mut scheduler = SampleScheduler::new(config, LinuxPerfSource, backend)?;
//!     scheduler.setup();
//!
//!     let mut sink = TsvSink::new(std::io::stdout());
//!     scheduler.run(&mut sink).await?;
//!     Ok(())
//! }
//! ```

mod record;

pub use record::{
    MetricValue, OutputRecord, TsvSink, LLC_OCCUPANCY, MEMORY_BANDWIDTH_LOCAL, MEMORY_BANDWIDTH_REMOTE,
};

use std::future::{self, Future};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::SamplerConfig;
use crate::error::Result;
use crate::group::GroupRegistry;
use crate::perf::{CounterMatrix, MetricDefinition, PerfCounterBank};
use crate::rdt::RdtMonitor;
use crate::traits::{PerfEventSource, RdtBackend, RecordSink};

/// Wall-clock time that advances with tokio's clock.
///
/// Anchored once, so cycle timestamps stay monotonic and follow paused time
/// in tests.
#[derive(Debug, Clone, Copy)]
struct CycleClock {
    anchor: SystemTime,
    started: Instant,
}

impl CycleClock {
    fn start() -> Self {
        Self {
            anchor: SystemTime::now(),
            started: Instant::now(),
        }
    }

    fn unix_secs(&self) -> u64 {
        (self.anchor + self.started.elapsed())
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Drives sampling cycles over a [`PerfEventSource`] and an [`RdtBackend`]
pub struct SampleScheduler<S: PerfEventSource, B: RdtBackend> {
    config: SamplerConfig,
    metrics: Vec<MetricDefinition>,
    registry: GroupRegistry,
    bank: PerfCounterBank<S>,
    rdt: RdtMonitor<B>,
}

impl<S: PerfEventSource, B: RdtBackend> SampleScheduler<S, B> {
    pub fn new(config: SamplerConfig, source: S, backend: B) -> Result<Self> {
        config.validate()?;
        let metrics = config.metric_definitions()?;
        let bank = PerfCounterBank::new(source, config.scope);
        let rdt = RdtMonitor::new(backend, config.rdt_capacity);
        Ok(Self {
            config,
            metrics,
            registry: GroupRegistry::new(),
            bank,
            rdt,
        })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn registry(&self) -> &GroupRegistry {
        &self.registry
    }

    pub fn rdt(&self) -> &RdtMonitor<B> {
        &self.rdt
    }

    /// Resolve the configured groups and start RDT monitoring for each.
    ///
    /// Unavailable groups are skipped. A group whose RDT monitoring cannot
    /// start is still sampled; its RDT records read zero. Returns the number
    /// of groups being monitored.
    pub fn setup(&mut self) -> usize {
        self.registry = GroupRegistry::load(&self.config.cgroups);
        for group in self.registry.groups_mut() {
            if group.pids().is_empty() {
                warn!(group = %group.name(), "group has no processes, RDT monitoring skipped");
                continue;
            }
            match self.rdt.start(group.name(), group.pids()) {
                Ok(handle) => group.attach_rdt(handle),
                Err(e) => warn!(group = %group.name(), error = %e, "RDT monitoring unavailable"),
            }
        }
        info!(
            groups = self.registry.len(),
            rdt_slots = self.rdt.len(),
            "monitoring set up"
        );
        self.registry.len()
    }

    /// Run every configured cycle, then release RDT monitoring
    pub async fn run<K: RecordSink>(&mut self, sink: &mut K) -> Result<u32> {
        self.run_until(sink, future::pending()).await
    }

    /// Run cycles until done or until `shutdown` resolves.
    ///
    /// `shutdown` is only observed between cycles; a cycle that has started
    /// always finishes. A sink failure cuts the current cycle's output short
    /// but the next cycle still runs. RDT monitoring is released on every exit
    /// path. Returns the number of completed cycles.
    pub async fn run_until<K, F>(&mut self, sink: &mut K, shutdown: F) -> Result<u32>
    where
        K: RecordSink,
        F: Future<Output = ()>,
    {
        let result = self.cycles(sink, shutdown).await;
        self.rdt.stop_all();
        result
    }

    async fn cycles<K, F>(&mut self, sink: &mut K, shutdown: F) -> Result<u32>
    where
        K: RecordSink,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let clock = CycleClock::start();
        let pause = self.config.pause();
        let total = self.config.cycles;

        let mut completed = 0;
        while completed < total {
            let span = info_span!("cycle", n = completed + 1, of = total);
            if let Err(e) = self.run_cycle(sink, &clock).instrument(span).await {
                error!(cycle = completed + 1, error = %e, "cycle output incomplete");
            }
            completed += 1;
            if completed == total {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = &mut shutdown => {
                    info!(completed, "shutdown requested");
                    break;
                }
            }
        }
        Ok(completed)
    }

    async fn run_cycle<K: RecordSink>(&mut self, sink: &mut K, clock: &CycleClock) -> Result<()> {
        let timestamp = clock.unix_secs();
        let period = self.config.period();
        let groups = self.registry.groups();

        let matrix = match self
            .bank
            .collect(groups, self.config.cpu_count, &self.metrics, period)
            .await
        {
            Ok(matrix) => matrix,
            Err(e) => {
                error!(error = %e, "collection pass failed, reporting zeros");
                CounterMatrix::zeroed(groups.len(), self.metrics.len())
            }
        };

        for (gi, group) in groups.iter().enumerate() {
            for (mi, metric) in self.metrics.iter().enumerate() {
                let value = MetricValue::Count(matrix.get(gi, mi));
                sink.emit(&OutputRecord::new(group.name(), metric.name.as_str(), timestamp, value))?;
            }

            let snapshot = group.rdt().map(|handle| self.rdt.poll(handle)).unwrap_or_default();
            for (name, value) in [
                (LLC_OCCUPANCY, MetricValue::Count(snapshot.llc_kib())),
                (MEMORY_BANDWIDTH_LOCAL, MetricValue::Rate(snapshot.local_mib_per_sec(period))),
                (MEMORY_BANDWIDTH_REMOTE, MetricValue::Rate(snapshot.remote_mib_per_sec(period))),
            ] {
                sink.emit(&OutputRecord::new(group.name(), name, timestamp, value))?;
            }
        }
        sink.flush()?;
        debug!(timestamp, records = groups.len() * (self.metrics.len() + 3), "cycle emitted");
        Ok(())
    }
}
