use cloud_log_format::formatter::Formatter;
use cloud_log_format::level::Level;
use cloud_log_format::record::{CallerFrame, LogRecord};
use std::io::Write;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Keep only the last path segment of the function and the file name.
    let formatter = Formatter::new()
        .with_pretty_print(true)
        .with_trim_filename_prefix("/build/")
        .with_caller_prettyfier(|frame| {
            let function = frame.function.rsplit("::").next().unwrap_or_default().to_string();
            (function, frame.file.clone())
        });

    let record = LogRecord::new(Level::Warning, "disk almost full")
        .with_field("free_bytes", 1_048_576u64)
        .with_field("mount", "/var")
        .with_caller(CallerFrame {
            function: "storage::monitor::check_disk".to_string(),
            file: "/build/src/storage/monitor.rs".to_string(),
            line: 88,
        });

    let mut out = Vec::new();
    formatter.format_into(&record, &mut out)?;
    std::io::stdout().write_all(&out)?;
    Ok(())
}
