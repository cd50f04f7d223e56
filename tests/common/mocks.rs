use std::cell::RefCell;
use std::rc::Rc;

use pgos::perf::{CounterReading, CounterTarget, MetricDefinition};
use pgos::rdt::{RdtGroupId, RdtSnapshot};
use pgos::traits::{PerfCounter, PerfEventSource, RdtBackend};
use pgos::{Pid, Result};

/// Counter source whose counters all read the same value
pub struct StubPerfSource {
    reading: CounterReading,
    open: Rc<RefCell<usize>>,
}

impl StubPerfSource {
    pub fn new(value: u64) -> Self {
        Self {
            reading: CounterReading::new(value, 1_000_000, 1_000_000),
            open: Rc::default(),
        }
    }

    /// Counters currently open
    pub fn open_count(&self) -> Rc<RefCell<usize>> {
        Rc::clone(&self.open)
    }
}

impl PerfEventSource for StubPerfSource {
    fn open(&self, _target: CounterTarget, _cpu: u32, _metric: &MetricDefinition) -> Result<Box<dyn PerfCounter>> {
        *self.open.borrow_mut() += 1;
        Ok(Box::new(StubCounter {
            reading: self.reading,
            open: Rc::clone(&self.open),
        }))
    }
}

struct StubCounter {
    reading: CounterReading,
    open: Rc<RefCell<usize>>,
}

impl PerfCounter for StubCounter {
    fn reset(&mut self) -> Result<()> {
        Ok(())
    }

    fn enable(&mut self) -> Result<()> {
        Ok(())
    }

    fn disable(&mut self) -> Result<()> {
        Ok(())
    }

    fn read(&mut self) -> Result<CounterReading> {
        Ok(self.reading)
    }
}

impl Drop for StubCounter {
    fn drop(&mut self) {
        *self.open.borrow_mut() -= 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RdtCall {
    Start(String, Vec<Pid>),
    Poll(u64),
    Stop(u64),
}

/// RDT backend that records every call and reports a fixed snapshot
pub struct StubRdtBackend {
    snapshot: RdtSnapshot,
    next: u64,
    calls: Rc<RefCell<Vec<RdtCall>>>,
}

impl StubRdtBackend {
    pub fn new(snapshot: RdtSnapshot) -> Self {
        Self {
            snapshot,
            next: 0,
            calls: Rc::default(),
        }
    }

    pub fn calls(&self) -> Rc<RefCell<Vec<RdtCall>>> {
        Rc::clone(&self.calls)
    }
}

impl RdtBackend for StubRdtBackend {
    fn start(&mut self, name: &str, pids: &[Pid]) -> Result<RdtGroupId> {
        self.calls.borrow_mut().push(RdtCall::Start(name.to_string(), pids.to_vec()));
        self.next += 1;
        Ok(RdtGroupId(self.next))
    }

    fn poll(&mut self, group: RdtGroupId) -> Result<RdtSnapshot> {
        self.calls.borrow_mut().push(RdtCall::Poll(group.0));
        Ok(self.snapshot)
    }

    fn stop(&mut self, group: RdtGroupId) -> Result<()> {
        self.calls.borrow_mut().push(RdtCall::Stop(group.0));
        Ok(())
    }
}
