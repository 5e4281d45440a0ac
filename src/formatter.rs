use crate::error::FormatError;
use crate::record::{CallerFrame, LogRecord};
use crate::value::FieldValue;
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Key Cloud Logging reads the call site from.
pub const SOURCE_LOCATION_KEY: &str = "logging.googleapis.com/sourceLocation";

/// Prefix applied to user fields whose name is already taken.
pub const FIELD_COLLISION_PREFIX: &str = "fields.";

/// Rewrites a caller frame into `(function, file)` labels.
///
/// An empty function label drops `function` from the source location; an
/// empty file label drops both `file` and `line`.
pub type CallerPrettyfier = Arc<dyn Fn(&CallerFrame) -> (String, String) + Send + Sync>;

/// Formats [`LogRecord`]s as newline-terminated JSON objects using the
/// special field names of Google Cloud Logging.
///
/// The formatter holds configuration only. It can be shared between threads
/// and called concurrently as long as each call has its own destination
/// buffer.
#[derive(Clone, Default)]
pub struct Formatter {
    /// Omit the `timestamp` key entirely.
    pub disable_timestamp: bool,
    /// Optional rewrite of the caller's function and file labels. Runs after
    /// `trim_filename_prefix` has been applied to the frame.
    pub caller_prettyfier: Option<CallerPrettyfier>,
    /// Literal prefix removed from caller file paths.
    pub trim_filename_prefix: String,
    /// Indent output with two spaces.
    pub pretty_print: bool,
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formatter")
            .field("disable_timestamp", &self.disable_timestamp)
            .field("caller_prettyfier", &self.caller_prettyfier.as_ref().map(|_| ".."))
            .field("trim_filename_prefix", &self.trim_filename_prefix)
            .field("pretty_print", &self.pretty_print)
            .finish()
    }
}

/// One top-level entry of the output document.
enum Slot<'r> {
    Json(Value),
    Field(&'r FieldValue),
}

impl Serialize for Slot<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Slot::Json(v) => v.serialize(serializer),
            Slot::Field(v) => v.serialize(serializer),
        }
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_disable_timestamp(mut self, disable: bool) -> Self {
        self.disable_timestamp = disable;
        self
    }

    pub fn with_caller_prettyfier<F>(mut self, prettyfier: F) -> Self
    where
        F: Fn(&CallerFrame) -> (String, String) + Send + Sync + 'static,
    {
        self.caller_prettyfier = Some(Arc::new(prettyfier));
        self
    }

    pub fn with_trim_filename_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.trim_filename_prefix = prefix.into();
        self
    }

    pub fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    /// Format `record` into a freshly allocated buffer.
    pub fn format(&self, record: &LogRecord) -> Result<Vec<u8>, FormatError> {
        let mut buf = Vec::new();
        self.format_into(record, &mut buf)?;
        Ok(buf)
    }

    /// Append the formatted `record` to `buf`.
    ///
    /// On error `buf` may hold a partial write.
    pub fn format_into(&self, record: &LogRecord, buf: &mut Vec<u8>) -> Result<(), FormatError> {
        let doc = self.document(record);

        if self.pretty_print {
            let fmt = serde_json::ser::PrettyFormatter::with_indent(b"  ");
            let mut ser = serde_json::Serializer::with_formatter(&mut *buf, fmt);
            doc.serialize(&mut ser)?;
        } else {
            serde_json::to_writer(&mut *buf, &doc)?;
        }
        buf.push(b'\n');
        Ok(())
    }

    fn document<'r>(&self, record: &'r LogRecord) -> BTreeMap<String, Slot<'r>> {
        let mut doc = BTreeMap::new();

        if !self.disable_timestamp {
            let (seconds, nanos) = split_timestamp(record);
            doc.insert(
                "timestamp".to_string(),
                Slot::Json(json!({ "seconds": seconds, "nanos": nanos })),
            );
        }
        doc.insert("message".to_string(), Slot::Json(Value::from(record.message.as_str())));
        doc.insert(
            "severity".to_string(),
            Slot::Json(Value::from(record.level.severity().as_str())),
        );
        doc.insert("level".to_string(), Slot::Json(Value::from(record.level.as_str())));

        if let Some(caller) = &record.caller {
            doc.insert(
                SOURCE_LOCATION_KEY.to_string(),
                Slot::Json(Value::Object(self.source_location(caller))),
            );
        }

        for (key, value) in &record.fields {
            let mut key = key.clone();
            // Repeat so a renamed field never lands on a user field that
            // already carries the prefix.
            while doc.contains_key(&key) {
                key.insert_str(0, FIELD_COLLISION_PREFIX);
            }
            doc.insert(key, Slot::Field(value));
        }

        doc
    }

    fn source_location(&self, caller: &CallerFrame) -> Map<String, Value> {
        let file = caller
            .file
            .strip_prefix(self.trim_filename_prefix.as_str())
            .unwrap_or(&caller.file);

        let (function, file) = match &self.caller_prettyfier {
            Some(prettyfier) => prettyfier(&CallerFrame {
                function: caller.function.clone(),
                file: file.to_string(),
                line: caller.line,
            }),
            None => (caller.function.clone(), file.to_string()),
        };

        let mut loc = Map::new();
        if !function.is_empty() {
            loc.insert("function".to_string(), Value::from(function));
        }
        if !file.is_empty() {
            loc.insert("file".to_string(), Value::from(file));
            loc.insert("line".to_string(), Value::from(caller.line));
        }
        loc
    }
}

/// Unix seconds and the nanosecond fraction. Leap seconds, which chrono
/// reports as `nanos >= 1_000_000_000`, roll over into the next second.
fn split_timestamp(record: &LogRecord) -> (i64, u32) {
    const NANOS_PER_SEC: u32 = 1_000_000_000;
    let seconds = record.timestamp.timestamp();
    let nanos = record.timestamp.timestamp_subsec_nanos();
    if nanos >= NANOS_PER_SEC {
        (seconds + 1, nanos - NANOS_PER_SEC)
    } else {
        (seconds, nanos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use crate::value::MarshalJson;
    use chrono::TimeZone;
    use chrono::Utc;

    fn decode(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    fn frame() -> CallerFrame {
        CallerFrame {
            function: "billing::charge".to_string(),
            file: "/src/app/billing/charge.rs".to_string(),
            line: 42,
        }
    }

    #[test]
    fn timestamp_is_seconds_and_nanos() {
        let ts = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let record = LogRecord::new(Level::Info, "hi").with_timestamp(ts);
        let out = decode(&Formatter::new().format(&record).unwrap());
        assert_eq!(out["timestamp"], json!({"seconds": 1_700_000_000i64, "nanos": 123_456_789}));
    }

    #[test]
    fn leap_second_carries_into_seconds() {
        let ts = Utc.timestamp_opt(1_483_228_799, 1_500_000_000).unwrap();
        let record = LogRecord::new(Level::Info, "leap").with_timestamp(ts);
        let out = decode(&Formatter::new().format(&record).unwrap());
        assert_eq!(out["timestamp"], json!({"seconds": 1_483_228_800i64, "nanos": 500_000_000}));
    }

    #[test]
    fn trim_prefix_applies_before_prettyfier() {
        let formatter = Formatter::new()
            .with_trim_filename_prefix("/src/app/")
            .with_caller_prettyfier(|f| (format!("fn:{}", f.function), format!("file:{}", f.file)));
        let record = LogRecord::new(Level::Info, "hi").with_caller(frame());
        let out = decode(&formatter.format(&record).unwrap());
        assert_eq!(
            out[SOURCE_LOCATION_KEY],
            json!({"function": "fn:billing::charge", "file": "file:billing/charge.rs", "line": 42})
        );
    }

    #[test]
    fn trim_prefix_without_match_keeps_path() {
        let formatter = Formatter::new().with_trim_filename_prefix("/other/");
        let record = LogRecord::new(Level::Info, "hi").with_caller(frame());
        let out = decode(&formatter.format(&record).unwrap());
        assert_eq!(out[SOURCE_LOCATION_KEY]["file"], "/src/app/billing/charge.rs");
    }

    #[test]
    fn empty_prettyfier_file_drops_file_and_line() {
        let formatter =
            Formatter::new().with_caller_prettyfier(|f| (f.function.clone(), String::new()));
        let record = LogRecord::new(Level::Info, "hi").with_caller(frame());
        let out = decode(&formatter.format(&record).unwrap());
        assert_eq!(out[SOURCE_LOCATION_KEY], json!({"function": "billing::charge"}));
    }

    #[test]
    fn empty_prettyfier_function_drops_function() {
        let formatter = Formatter::new().with_caller_prettyfier(|f| (String::new(), f.file.clone()));
        let record = LogRecord::new(Level::Info, "hi").with_caller(frame());
        let out = decode(&formatter.format(&record).unwrap());
        assert_eq!(
            out[SOURCE_LOCATION_KEY],
            json!({"file": "/src/app/billing/charge.rs", "line": 42})
        );
    }

    #[test]
    fn fully_redacted_caller_leaves_empty_object() {
        let formatter = Formatter::new().with_caller_prettyfier(|_| (String::new(), String::new()));
        let record = LogRecord::new(Level::Info, "hi").with_caller(frame());
        let out = decode(&formatter.format(&record).unwrap());
        assert_eq!(out[SOURCE_LOCATION_KEY], json!({}));
    }

    #[test]
    fn renamed_field_does_not_clobber_prefixed_field() {
        let record = LogRecord::new(Level::Info, "real")
            .with_field("message", "user message")
            .with_field("fields.message", "already prefixed");
        let out = decode(&Formatter::new().format(&record).unwrap());
        assert_eq!(out["message"], "real");
        assert_eq!(out["fields.message"], "already prefixed");
        assert_eq!(out["fields.fields.message"], "user message");
    }

    #[test]
    fn format_into_appends_to_existing_buffer() {
        let formatter = Formatter::new().with_disable_timestamp(true);
        let mut buf = b"prev\n".to_vec();
        formatter
            .format_into(&LogRecord::new(Level::Info, "next"), &mut buf)
            .unwrap();
        assert!(buf.starts_with(b"prev\n{"));
        assert_eq!(decode(&buf[5..])["message"], "next");
    }

    #[derive(Debug)]
    struct Broken;

    impl fmt::Display for Broken {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("broken")
        }
    }

    impl std::error::Error for Broken {}

    impl MarshalJson for Broken {
        fn marshal_json(&self) -> Result<Value, serde_json::Error> {
            Err(serde::ser::Error::custom("cannot marshal"))
        }
    }

    #[test]
    fn marshal_failure_is_encode_error() {
        let record = LogRecord::new(Level::Error, "boom")
            .with_field("err", FieldValue::structured_error(Broken));
        let err = Formatter::new().format(&record).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("failed to marshal fields to JSON, "), "{msg}");
        assert!(msg.contains("cannot marshal"), "{msg}");
    }
}
