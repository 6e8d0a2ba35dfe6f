//! Open-file-descriptor limit handling for compaction, which holds every
//! input segment open at once.

use crate::core::error::Result;
use tracing::{debug, warn};

/// Raise the soft `RLIMIT_NOFILE` to at least `wanted`, capped at the hard
/// limit. Returns the soft limit in effect afterwards.
#[cfg(unix)]
pub fn raise_open_file_limit(wanted: u64) -> Result<u64> {
    let mut limit = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };

    unsafe {
        if libc::getrlimit(libc::RLIMIT_NOFILE, &mut limit) != 0 {
            return Err(std::io::Error::last_os_error().into());
        }
    }

    let current = limit.rlim_cur as u64;
    if current >= wanted {
        return Ok(current);
    }

    let target = wanted.min(limit.rlim_max as u64);
    if target <= current {
        warn!(wanted, hard = limit.rlim_max as u64, "open file limit already at hard ceiling");
        return Ok(current);
    }

    limit.rlim_cur = target as libc::rlim_t;
    unsafe {
        if libc::setrlimit(libc::RLIMIT_NOFILE, &limit) != 0 {
            // Some platforms cap below the advertised hard limit
            let err = std::io::Error::last_os_error();
            warn!(target, error = %err, "could not raise open file limit");
            return Ok(current);
        }
    }

    debug!(from = current, to = target, "raised open file limit");
    Ok(target)
}

#[cfg(not(unix))]
pub fn raise_open_file_limit(_wanted: u64) -> Result<u64> {
    Ok(u64::MAX)
}
