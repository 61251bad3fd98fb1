//! Platform specific process introspection.

use std::time::{Duration, Instant};

lazy_static::lazy_static! {
    static ref PROCESS_CLOCK: Instant = Instant::now();
}

/// Starts the fallback process clock if it is not running yet.
pub(crate) fn start_clock() {
    lazy_static::initialize(&PROCESS_CLOCK);
}

/// Gets the time since the process was started.
///
/// Where the operating system cannot tell, this is the time since the
/// process clock was first started.
pub(crate) fn uptime() -> Duration {
    os_uptime().unwrap_or_else(|| PROCESS_CLOCK.elapsed())
}

/// Gets the process uptime from procfs.
#[cfg(target_os = "linux")]
fn os_uptime() -> Option<Duration> {
    use std::fs;

    // Format: pid (comm) state ppid ... starttime is field 22, in clock ticks
    // since boot.  `comm` may contain spaces, so skip past its closing paren.
    let stat = fs::read_to_string("/proc/self/stat").ok()?;
    let rest = &stat[stat.rfind(')')? + 1..];
    let start_ticks: f64 = rest.split_whitespace().nth(19)?.parse().ok()?;

    let ticks_per_second = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if ticks_per_second <= 0 {
        return None;
    }

    let system_uptime: f64 = fs::read_to_string("/proc/uptime")
        .ok()?
        .split_whitespace()
        .next()?
        .parse()
        .ok()?;

    let uptime = system_uptime - start_ticks / ticks_per_second as f64;
    Some(Duration::from_secs_f64(uptime.max(0.0)))
}

/// Fallback for platforms without procfs.
#[cfg(not(target_os = "linux"))]
fn os_uptime() -> Option<Duration> {
    None
}

/// Gets the RSS (Resident Set Size) in bytes.
#[cfg(target_os = "linux")]
pub(crate) fn resident_bytes() -> Option<u64> {
    use std::fs;

    // Format: size resident shared text lib data dt
    // Values are in pages
    let statm = fs::read_to_string("/proc/self/statm").ok()?;
    let resident_pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page_size <= 0 {
        return None;
    }
    Some(resident_pages * page_size as u64)
}

/// Gets the RSS (Resident Set Size) in bytes.
#[cfg(target_os = "macos")]
pub(crate) fn resident_bytes() -> Option<u64> {
    use std::mem;

    unsafe {
        let mut info: libc::rusage = mem::zeroed();
        if libc::getrusage(libc::RUSAGE_SELF, &mut info) == 0 {
            // On macOS, ru_maxrss is in bytes
            u64::try_from(info.ru_maxrss).ok()
        } else {
            None
        }
    }
}

/// Gets the RSS (Resident Set Size) in bytes.
#[cfg(target_os = "windows")]
pub(crate) fn resident_bytes() -> Option<u64> {
    use windows_sys::Win32::System::ProcessStatus::{
        GetProcessMemoryInfo, PROCESS_MEMORY_COUNTERS,
    };
    use windows_sys::Win32::System::Threading::GetCurrentProcess;

    unsafe {
        let process = GetCurrentProcess();
        let mut pmc: PROCESS_MEMORY_COUNTERS = std::mem::zeroed();
        pmc.cb = std::mem::size_of::<PROCESS_MEMORY_COUNTERS>() as u32;

        if GetProcessMemoryInfo(
            process,
            &mut pmc,
            std::mem::size_of::<PROCESS_MEMORY_COUNTERS>() as u32,
        ) != 0
        {
            Some(pmc.WorkingSetSize as u64)
        } else {
            None
        }
    }
}

/// Fallback for unsupported platforms.
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub(crate) fn resident_bytes() -> Option<u64> {
    None
}

/// Heap figures reported by the C allocator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MallocInfo {
    /// Bytes in allocated chunks, including mmapped ones.
    pub in_use: u64,
    /// Bytes in free chunks.
    pub free: u64,
}

/// Gets the heap figures from glibc's `mallinfo2`.
#[cfg(all(target_os = "linux", target_env = "gnu"))]
pub(crate) fn malloc_info() -> Option<MallocInfo> {
    let info = unsafe { libc::mallinfo2() };
    Some(MallocInfo {
        in_use: (info.uordblks + info.hblkhd) as u64,
        free: info.fordblks as u64,
    })
}

/// Fallback for allocators without `mallinfo2`.
#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
pub(crate) fn malloc_info() -> Option<MallocInfo> {
    None
}

/// Gets the number of threads in the current process.
#[cfg(target_os = "linux")]
pub(crate) fn thread_count() -> Option<u64> {
    let entries = std::fs::read_dir("/proc/self/task").ok()?;
    Some(entries.count() as u64)
}

/// Gets the number of threads in the current process.
#[cfg(target_os = "macos")]
pub(crate) fn thread_count() -> Option<u64> {
    use std::mem;

    unsafe {
        let mut info: libc::proc_taskinfo = mem::zeroed();
        let size = mem::size_of::<libc::proc_taskinfo>() as libc::c_int;
        let written = libc::proc_pidinfo(
            libc::getpid(),
            libc::PROC_PIDTASKINFO,
            0,
            &mut info as *mut libc::proc_taskinfo as *mut libc::c_void,
            size,
        );
        if written == size {
            u64::try_from(info.pti_threadnum).ok()
        } else {
            None
        }
    }
}

/// Gets the number of threads in the current process.
#[cfg(target_os = "windows")]
pub(crate) fn thread_count() -> Option<u64> {
    use windows_sys::Win32::Foundation::{CloseHandle, INVALID_HANDLE_VALUE};
    use windows_sys::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, Thread32First, Thread32Next, TH32CS_SNAPTHREAD, THREADENTRY32,
    };
    use windows_sys::Win32::System::Threading::GetCurrentProcessId;

    unsafe {
        // The snapshot covers the threads of every process on the system
        let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPTHREAD, 0);
        if snapshot == INVALID_HANDLE_VALUE {
            return None;
        }

        let pid = GetCurrentProcessId();
        let mut entry: THREADENTRY32 = std::mem::zeroed();
        entry.dwSize = std::mem::size_of::<THREADENTRY32>() as u32;

        let mut count = 0;
        let mut more = Thread32First(snapshot, &mut entry) != 0;
        while more {
            if entry.th32OwnerProcessID == pid {
                count += 1;
            }
            more = Thread32Next(snapshot, &mut entry) != 0;
        }
        CloseHandle(snapshot);

        Some(count)
    }
}

/// Fallback for unsupported platforms.
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub(crate) fn thread_count() -> Option<u64> {
    None
}

/// Gets jemalloc's `(mapped, allocated)` byte counts.
#[cfg(all(unix, feature = "jemalloc"))]
pub(crate) fn jemalloc_stats() -> Option<(u64, u64)> {
    use tikv_jemalloc_ctl::{epoch, stats};

    // Advance the epoch to get fresh stats
    epoch::advance().ok()?;

    let mapped = stats::mapped::read().ok()? as u64;
    let allocated = stats::allocated::read().ok()? as u64;

    Some((mapped, allocated))
}
