/// `m:ss` for a millisecond count. Minutes are not wrapped into hours.
pub fn format_clock(ms: u64) -> String {
    let total_seconds = ms / 1_000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// The `current/total` label under the video.
///
/// The engine may briefly report a position past the duration around seeks;
/// the label never shows more than the total once the duration is known.
pub fn format_time_label(position_ms: u64, duration_ms: u64) -> String {
    let shown = if duration_ms > 0 {
        position_ms.min(duration_ms)
    } else {
        position_ms
    };
    format!("{}/{}", format_clock(shown), format_clock(duration_ms))
}
