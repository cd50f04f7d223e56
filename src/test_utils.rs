//! Hand-written fakes for the counter source, shared by unit tests.

use std::cell::RefCell;
use std::collections::HashSet;
use std::io;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::perf::{CounterReading, CounterTarget, MetricDefinition};
use crate::traits::{PerfCounter, PerfEventSource};

/// Lifecycle events recorded by [`FakePerfSource`], keyed by open order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterEvent {
    Open { id: usize, target: CounterTarget, cpu: u32, metric: String },
    Reset(usize),
    Enable(usize),
    Disable(usize),
    Read(usize),
    Close(usize),
}

/// Shared view of everything the fake counters did
#[derive(Debug, Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<CounterEvent>>>);

impl EventLog {
    fn push(&self, event: CounterEvent) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<CounterEvent> {
        self.0.borrow().clone()
    }

    pub fn opens(&self) -> usize {
        self.count(|e| matches!(e, CounterEvent::Open { .. }))
    }

    pub fn closes(&self) -> usize {
        self.count(|e| matches!(e, CounterEvent::Close(_)))
    }

    pub fn count(&self, pred: impl Fn(&CounterEvent) -> bool) -> usize {
        self.0.borrow().iter().filter(|e| pred(e)).count()
    }

    /// Position of the first event matching `pred`
    pub fn position(&self, pred: impl Fn(&CounterEvent) -> bool) -> Option<usize> {
        self.0.borrow().iter().position(|e| pred(e))
    }

    /// Position of the last event matching `pred`
    pub fn last_position(&self, pred: impl Fn(&CounterEvent) -> bool) -> Option<usize> {
        self.0.borrow().iter().rposition(|e| pred(e))
    }
}

type ReadingFn = dyn Fn(CounterTarget, u32, &MetricDefinition) -> CounterReading;

/// Counter source whose counters only log what happens to them
pub struct FakePerfSource {
    log: EventLog,
    reading: Rc<ReadingFn>,
    fail_open_at: Option<usize>,
    fail_enable_at: Option<usize>,
    fail_read: HashSet<usize>,
}

impl FakePerfSource {
    /// Every counter reads `value` with equal enabled and running times
    pub fn constant(value: u64) -> Self {
        Self::with_reading(move |_, _, _| CounterReading::new(value, 1_000, 1_000))
    }

    pub fn with_reading(reading: impl Fn(CounterTarget, u32, &MetricDefinition) -> CounterReading + 'static) -> Self {
        Self {
            log: EventLog::default(),
            reading: Rc::new(reading),
            fail_open_at: None,
            fail_enable_at: None,
            fail_read: HashSet::new(),
        }
    }

    /// Fail the `n`-th open (zero-based)
    pub fn fail_open_at(mut self, n: usize) -> Self {
        self.fail_open_at = Some(n);
        self
    }

    /// Fail enabling the counter opened `n`-th
    pub fn fail_enable_at(mut self, n: usize) -> Self {
        self.fail_enable_at = Some(n);
        self
    }

    /// Fail reading the counter opened `n`-th
    pub fn fail_read_at(mut self, n: usize) -> Self {
        self.fail_read.insert(n);
        self
    }

    pub fn log(&self) -> EventLog {
        self.log.clone()
    }
}

impl PerfEventSource for FakePerfSource {
    fn open(&self, target: CounterTarget, cpu: u32, metric: &MetricDefinition) -> Result<Box<dyn PerfCounter>> {
        let id = self.log.opens();
        if self.fail_open_at == Some(id) {
            return Err(Error::counter_open(
                target.raw(),
                cpu,
                metric.name.as_str(),
                io::Error::from_raw_os_error(libc::EACCES),
            ));
        }
        self.log.push(CounterEvent::Open {
            id,
            target,
            cpu,
            metric: metric.name.clone(),
        });
        Ok(Box::new(FakeCounter {
            id,
            log: self.log.clone(),
            reading: (self.reading)(target, cpu, metric),
            fail_enable: self.fail_enable_at == Some(id),
            fail_read: self.fail_read.contains(&id),
        }))
    }
}

struct FakeCounter {
    id: usize,
    log: EventLog,
    reading: CounterReading,
    fail_enable: bool,
    fail_read: bool,
}

impl PerfCounter for FakeCounter {
    fn reset(&mut self) -> Result<()> {
        self.log.push(CounterEvent::Reset(self.id));
        Ok(())
    }

    fn enable(&mut self) -> Result<()> {
        if self.fail_enable {
            return Err(Error::counter_control("enable", io::Error::from_raw_os_error(libc::EINVAL)));
        }
        self.log.push(CounterEvent::Enable(self.id));
        Ok(())
    }

    fn disable(&mut self) -> Result<()> {
        self.log.push(CounterEvent::Disable(self.id));
        Ok(())
    }

    fn read(&mut self) -> Result<CounterReading> {
        self.log.push(CounterEvent::Read(self.id));
        if self.fail_read {
            return Err(Error::counter_read(io::Error::from_raw_os_error(libc::EIO)));
        }
        Ok(self.reading)
    }
}

impl Drop for FakeCounter {
    fn drop(&mut self) {
        self.log.push(CounterEvent::Close(self.id));
    }
}
