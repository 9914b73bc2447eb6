//! Real-time scheduling helpers (Linux SCHED_FIFO / mlockall; macOS mlockall).
//!
//! Applied once, before the lane workers are spawned, so every worker thread
//! inherits the scheduling policy.

use crate::cli::RtLock;

#[cfg(unix)]
fn mem_lock(lock: RtLock) -> std::io::Result<()> {
    use libc::{MCL_CURRENT, MCL_FUTURE, mlockall};
    let flags = match lock {
        RtLock::None => return Ok(()),
        RtLock::Current => MCL_CURRENT,
        RtLock::All => MCL_CURRENT | MCL_FUTURE,
    };
    let rc = unsafe { mlockall(flags) };
    if rc != 0 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}

#[cfg(unix)]
fn memlock_limit_hint() -> Option<String> {
    let mut rlim = std::mem::MaybeUninit::<libc::rlimit>::uninit();
    let rc = unsafe { libc::getrlimit(libc::RLIMIT_MEMLOCK, rlim.as_mut_ptr()) };
    if rc != 0 {
        return None;
    }
    let cur = unsafe { rlim.assume_init() }.rlim_cur;
    if cur == libc::RLIM_INFINITY {
        Some("memlock limit: unlimited".to_string())
    } else {
        Some(format!("memlock limit: {} KiB", cur / 1024))
    }
}

#[cfg(unix)]
fn try_apply_mem_lock(lock: RtLock) -> eyre::Result<()> {
    let err = match mem_lock(lock) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };
    let retryable =
        matches!(err.raw_os_error(), Some(code) if code == libc::EPERM || code == libc::ENOMEM);
    // current|future can exceed the limit where current alone fits
    if lock == RtLock::All && retryable && mem_lock(RtLock::Current).is_ok() {
        tracing::warn!(error = %err, "mlockall(current|future) failed; locked current pages only");
        return Ok(());
    }
    let mut msg = format!("mlockall failed: {err}");
    if retryable {
        if let Some(h) = memlock_limit_hint() {
            msg.push_str(&format!("; {h}"));
        }
        msg.push_str("; hint: needs CAP_IPC_LOCK (or root) and sufficient 'ulimit -l'");
    }
    Err(eyre::eyre!(msg))
}

#[cfg(target_os = "linux")]
fn try_apply_fifo_priority(prio: Option<i32>) -> eyre::Result<i32> {
    use libc::{SCHED_FIFO, sched_get_priority_max, sched_get_priority_min, sched_param};

    let (min, max) = unsafe {
        let min = sched_get_priority_min(SCHED_FIFO);
        let max = sched_get_priority_max(SCHED_FIFO);
        if min < 0 || max < 0 { (1, 99) } else { (min, max) }
    };
    let prio_val = prio.unwrap_or(max).clamp(min, max);
    let param = sched_param {
        sched_priority: prio_val,
    };
    let rc = unsafe { libc::sched_setscheduler(0, SCHED_FIFO, &param) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        eyre::bail!(
            "sched_setscheduler(SCHED_FIFO, {prio_val}) failed: {err}; hint: needs CAP_SYS_NICE or root"
        );
    }
    Ok(prio_val)
}

#[cfg(target_os = "linux")]
pub fn setup_rt_once(rt: bool, prio: Option<i32>, lock: RtLock) {
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();
    if !rt {
        return;
    }
    RT_ONCE.get_or_init(|| {
        match try_apply_mem_lock(lock) {
            Ok(()) => tracing::info!(?lock, "RT: memory lock applied"),
            Err(err) => tracing::warn!(error = %err, "RT: memory lock not applied"),
        }
        match try_apply_fifo_priority(prio) {
            Ok(p) => tracing::info!(priority = p, "RT: SCHED_FIFO enabled"),
            Err(err) => tracing::warn!(error = %err, "RT: SCHED_FIFO not applied"),
        }
    });
}

#[cfg(target_os = "macos")]
pub fn setup_rt_once(rt: bool, _prio: Option<i32>, lock: RtLock) {
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();
    if !rt {
        return;
    }
    RT_ONCE.get_or_init(|| {
        if let Err(err) = try_apply_mem_lock(lock) {
            tracing::warn!(error = %err, "RT: memory lock not applied");
        }
        tracing::warn!("RT: macOS does not support SCHED_FIFO; only mlockall applied");
    });
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub fn setup_rt_once(rt: bool, _prio: Option<i32>, _lock: RtLock) {
    if rt {
        tracing::warn!("RT: real-time mode is not supported on this OS");
    }
}
