//! Log output for the consumer loop.
//!
//! Drains the RT and background log streams into the console writer.
//! RT entries go first; they come from the edge handlers and are the ones
//! most likely to be dropped under load.

use core::fmt::Write;

use crate::logging::{LogEntry, LogStream};

/// Write one entry as `[timestamp_ms] LEVEL: message`, newline included.
pub fn write_log_entry(out: &mut dyn Write, entry: &LogEntry) -> core::fmt::Result {
    writeln!(
        out,
        "[{:10}] {}: {}",
        entry.timestamp_ms,
        entry.level.as_str(),
        entry.message()
    )
}

/// Drain both streams into `out`.
///
/// Reports and clears non-zero drop counters after the entries. Returns
/// the number of entries written.
pub fn drain_logs<const R: usize, const B: usize>(
    rt: &LogStream<R>,
    bg: &LogStream<B>,
    out: &mut dyn Write,
) -> usize {
    let mut written = 0;

    while let Some(entry) = rt.drain() {
        let _ = write_log_entry(out, &entry);
        written += 1;
    }

    while let Some(entry) = bg.drain() {
        let _ = write_log_entry(out, &entry);
        written += 1;
    }

    let rt_dropped = rt.dropped();
    let bg_dropped = bg.dropped();
    if rt_dropped > 0 || bg_dropped > 0 {
        let _ = writeln!(out, "[WARN] Dropped: RT={}, BG={}", rt_dropped, bg_dropped);
        rt.reset_dropped();
        bg.reset_dropped();
    }

    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;

    #[test]
    fn test_write_log_entry() {
        let stream = LogStream::<4>::new();
        stream.push(1234567, LogLevel::Info, b"Hello world");
        let entry = stream.drain().unwrap();

        let mut line = String::new();
        write_log_entry(&mut line, &entry).unwrap();
        assert_eq!(line, "[   1234567] INFO: Hello world\n");
    }

    #[test]
    fn test_drain_order_and_drops() {
        let rt = LogStream::<2>::new();
        let bg = LogStream::<4>::new();

        rt.push(1, LogLevel::Warn, b"rt one");
        rt.push(2, LogLevel::Warn, b"rt two");
        rt.push(3, LogLevel::Warn, b"rt lost");
        bg.push(0, LogLevel::Info, b"bg one");

        let mut out = String::new();
        assert_eq!(drain_logs(&rt, &bg, &mut out), 3);

        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].ends_with("WARN: rt one"));
        assert!(lines[1].ends_with("WARN: rt two"));
        assert!(lines[2].ends_with("INFO: bg one"));
        assert_eq!(lines[3], "[WARN] Dropped: RT=1, BG=0");

        assert_eq!(rt.dropped(), 0);
        assert_eq!(drain_logs(&rt, &bg, &mut out), 0);
    }
}
