//! Clock readouts as the scoreboard shows them.

/// Match clock: minutes and seconds, zero padded.
pub fn match_clock(ms: u64) -> String {
    let total_seconds = ms / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Timeout countdown uses the same readout as the match clock.
pub fn timeout_clock(ms: u64) -> String {
    match_clock(ms)
}

/// Raid clock: whole seconds until the last ten, then seconds and
/// centiseconds for the closing stretch.
pub fn raid_clock(ms: u64) -> String {
    let seconds = ms / 1000;
    if seconds >= 10 {
        format!("{:02}", seconds)
    } else {
        format!("{}.{:02}", seconds, (ms % 1000) / 10)
    }
}
