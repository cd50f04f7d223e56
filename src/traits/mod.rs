// Traits module
//
// Capability interfaces between the sampling engine and the kernel. The
// engine only talks to hardware through these, which keeps collection,
// scaling and aggregation testable against fakes.

pub mod hardware;

pub use hardware::{PerfCounter, PerfEventSource, RdtBackend, RecordSink};

#[cfg(test)]
pub use hardware::{MockPerfEventSource, MockRdtBackend};
