//! Raw `perf_event_open(2)` ABI.
//!
//! Only the parts of `linux/perf_event.h` the counter bank needs are mirrored
//! here: the version-0 attribute layout, the read format for counting mode,
//! and the ioctl request codes.

use std::io;
use std::os::fd::{FromRawFd, OwnedFd, RawFd};

/// Generic hardware event type
pub const PERF_TYPE_HARDWARE: u32 = 0;

/// Generic hardware event codes
pub const PERF_COUNT_HW_CPU_CYCLES: u64 = 0;
pub const PERF_COUNT_HW_INSTRUCTIONS: u64 = 1;
pub const PERF_COUNT_HW_CACHE_REFERENCES: u64 = 2;
pub const PERF_COUNT_HW_CACHE_MISSES: u64 = 3;
pub const PERF_COUNT_HW_BRANCH_INSTRUCTIONS: u64 = 4;
pub const PERF_COUNT_HW_BRANCH_MISSES: u64 = 5;
pub const PERF_COUNT_HW_BUS_CYCLES: u64 = 6;
pub const PERF_COUNT_HW_REF_CPU_CYCLES: u64 = 9;

/// Read format flags
pub const PERF_FORMAT_TOTAL_TIME_ENABLED: u64 = 1 << 0;
pub const PERF_FORMAT_TOTAL_TIME_RUNNING: u64 = 1 << 1;
pub const PERF_FORMAT_ID: u64 = 1 << 2;

/// `perf_event_open` flags
pub const PERF_FLAG_PID_CGROUP: libc::c_ulong = 1 << 2;
pub const PERF_FLAG_FD_CLOEXEC: libc::c_ulong = 1 << 3;

/// ioctl requests, `_IO('$', n)`
pub const PERF_EVENT_IOC_ENABLE: libc::c_ulong = 0x2400;
pub const PERF_EVENT_IOC_DISABLE: libc::c_ulong = 0x2401;
pub const PERF_EVENT_IOC_RESET: libc::c_ulong = 0x2403;

/// Size of the version-0 attribute struct
pub const PERF_ATTR_SIZE_VER0: u32 = 64;

/// Bit 0 of the attribute flag word
const ATTR_FLAG_DISABLED: u64 = 1 << 0;

/// `struct perf_event_attr`, version 0 layout
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct PerfEventAttr {
    pub type_: u32,
    pub size: u32,
    pub config: u64,
    pub sample_period: u64,
    pub sample_type: u64,
    pub read_format: u64,
    pub flags: u64,
    pub wakeup_events: u32,
    pub bp_type: u32,
    pub config1: u64,
}

impl PerfEventAttr {
    /// Counting-mode attribute for a generic hardware event, created disabled
    /// and reporting enabled/running times for multiplexing correction.
    pub fn counting(config: u64) -> Self {
        Self {
            type_: PERF_TYPE_HARDWARE,
            size: PERF_ATTR_SIZE_VER0,
            config,
            read_format: PERF_FORMAT_TOTAL_TIME_ENABLED | PERF_FORMAT_TOTAL_TIME_RUNNING | PERF_FORMAT_ID,
            flags: ATTR_FLAG_DISABLED,
            ..Default::default()
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.flags & ATTR_FLAG_DISABLED != 0
    }
}

/// Layout returned by `read(2)` for the read format set by [`PerfEventAttr::counting`]
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadFormat {
    pub value: u64,
    pub time_enabled: u64,
    pub time_running: u64,
    pub id: u64,
}

/// Opens a perf event descriptor.
///
/// `target` is a pid, or a cgroup directory descriptor when `flags` carries
/// [`PERF_FLAG_PID_CGROUP`].
pub fn perf_event_open(attr: &PerfEventAttr, target: i32, cpu: i32, flags: libc::c_ulong) -> io::Result<OwnedFd> {
    let group_fd: libc::c_int = -1;
    // SAFETY: attr points to a live, fully initialised perf_event_attr whose
    // size field matches the struct we pass.
    let ret = unsafe {
        libc::syscall(
            libc::SYS_perf_event_open,
            attr as *const PerfEventAttr,
            target as libc::pid_t,
            cpu as libc::c_int,
            group_fd,
            flags,
        )
    };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: the kernel returned a fresh descriptor that nothing else owns.
    Ok(unsafe { OwnedFd::from_raw_fd(ret as RawFd) })
}

/// Issues an argument-less perf ioctl.
pub fn perf_ioctl(fd: RawFd, request: libc::c_ulong) -> io::Result<()> {
    // SAFETY: the perf ioctls used here take no pointer argument.
    let ret = unsafe { libc::ioctl(fd, request as _, 0) };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Reads one [`ReadFormat`] record from a perf descriptor.
pub fn read_counter(fd: RawFd) -> io::Result<ReadFormat> {
    let mut rf = ReadFormat::default();
    let len = std::mem::size_of::<ReadFormat>();
    // SAFETY: rf is a plain repr(C) struct of len bytes owned by this frame.
    let n = unsafe { libc::read(fd, (&mut rf as *mut ReadFormat).cast::<libc::c_void>(), len) };
    if n < 0 {
        return Err(io::Error::last_os_error());
    }
    if n as usize != len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("short perf read: {n} of {len} bytes"),
        ));
    }
    Ok(rf)
}
