#![allow(dead_code)]

pub mod builders;
pub mod mocks;

pub use builders::CgroupTreeBuilder;
pub use mocks::{RdtCall, StubPerfSource, StubRdtBackend};
