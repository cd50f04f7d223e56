use crate::ffi::{
    PERF_COUNT_HW_BRANCH_INSTRUCTIONS, PERF_COUNT_HW_BRANCH_MISSES, PERF_COUNT_HW_BUS_CYCLES,
    PERF_COUNT_HW_CACHE_MISSES, PERF_COUNT_HW_CACHE_REFERENCES, PERF_COUNT_HW_CPU_CYCLES,
    PERF_COUNT_HW_INSTRUCTIONS, PERF_COUNT_HW_REF_CPU_CYCLES,
};

/// Display names of the generic hardware events the bank knows how to open
pub const METRIC_INSTRUCTIONS: &str = "instructions";
pub const METRIC_CYCLES: &str = "cycles";
pub const METRIC_LLC_MISSES: &str = "LLC misses";
pub const METRIC_CACHE_REFERENCES: &str = "cache references";
pub const METRIC_BRANCH_INSTRUCTIONS: &str = "branch instructions";
pub const METRIC_BRANCH_MISSES: &str = "branch misses";
pub const METRIC_BUS_CYCLES: &str = "bus cycles";
pub const METRIC_REF_CYCLES: &str = "ref cycles";

/// Built-in metric table, display name to hardware event code
pub const BUILTIN_METRICS: &[(&str, u64)] = &[
    (METRIC_INSTRUCTIONS, PERF_COUNT_HW_INSTRUCTIONS),
    (METRIC_CYCLES, PERF_COUNT_HW_CPU_CYCLES),
    (METRIC_LLC_MISSES, PERF_COUNT_HW_CACHE_MISSES),
    (METRIC_CACHE_REFERENCES, PERF_COUNT_HW_CACHE_REFERENCES),
    (METRIC_BRANCH_INSTRUCTIONS, PERF_COUNT_HW_BRANCH_INSTRUCTIONS),
    (METRIC_BRANCH_MISSES, PERF_COUNT_HW_BRANCH_MISSES),
    (METRIC_BUS_CYCLES, PERF_COUNT_HW_BUS_CYCLES),
    (METRIC_REF_CYCLES, PERF_COUNT_HW_REF_CPU_CYCLES),
];

/// Metrics sampled when the configuration does not name any
pub const DEFAULT_METRICS: &[&str] = &[METRIC_INSTRUCTIONS, METRIC_CYCLES, METRIC_LLC_MISSES];
