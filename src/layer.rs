use crate::formatter::Formatter;
use crate::level::Level;
use crate::record::{CallerFrame, LogRecord};
use crate::value::FieldValue;
use chrono::Utc;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns every event into a [`LogRecord`],
/// formats it with a [`Formatter`] and writes the resulting JSON line to
/// the configured writer.
///
/// Level filtering is left to the subscriber stack; this layer formats
/// whatever reaches it.
pub struct CloudLogLayer<W> {
    formatter: Formatter,
    make_writer: W,
    report_caller: bool,
    /// Total events seen by the layer.
    pub total_events: Arc<AtomicU64>,
    /// Events formatted and written successfully.
    pub written_events: Arc<AtomicU64>,
    /// Events lost to a formatting or write error.
    pub failed_events: Arc<AtomicU64>,
}

impl<W> CloudLogLayer<W>
where
    W: for<'a> MakeWriter<'a> + 'static,
{
    /// Create a layer writing through `make_writer`.
    ///
    /// **Parameters**
    /// - `formatter`: output configuration applied to every event.
    /// - `make_writer`: destination, e.g. `std::io::stdout`.
    /// - `report_caller`: attach the event's module, file and line as the
    ///   source location.
    pub fn new(formatter: Formatter, make_writer: W, report_caller: bool) -> Self {
        Self {
            formatter,
            make_writer,
            report_caller,
            total_events: Arc::new(AtomicU64::new(0)),
            written_events: Arc::new(AtomicU64::new(0)),
            failed_events: Arc::new(AtomicU64::new(0)),
        }
    }

    fn record_for(&self, event: &Event<'_>) -> LogRecord {
        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;

        let mut visitor = FieldVisitor { fields: &mut fields, message: &mut message };
        event.record(&mut visitor);

        let meta = event.metadata();
        let caller = if self.report_caller {
            Some(CallerFrame {
                function: meta.module_path().unwrap_or_else(|| meta.target()).to_string(),
                file: meta.file().unwrap_or_default().to_string(),
                line: meta.line().unwrap_or_default(),
            })
        } else {
            None
        };

        LogRecord {
            timestamp: Utc::now(),
            level: Level::from(*meta.level()),
            message: message.unwrap_or_default(),
            caller,
            fields,
        }
    }
}

impl<S, W> Layer<S> for CloudLogLayer<W>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    W: for<'a> MakeWriter<'a> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let record = self.record_for(event);
        let mut buf = Vec::with_capacity(256);
        if let Err(e) = self.formatter.format_into(&record, &mut buf) {
            self.failed_events.fetch_add(1, Ordering::Relaxed);
            eprintln!("dropping log record: {}", e);
            return;
        }

        let mut writer = self.make_writer.make_writer_for(event.metadata());
        match writer.write_all(&buf) {
            Ok(()) => {
                self.written_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.failed_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("error writing log record: {}", e);
            }
        }
    }
}

use tracing::field::{Field, Visit};

/// Collects event fields into [`FieldValue`]s. The `message` field becomes
/// the record message.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, FieldValue>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), FieldValue::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), FieldValue::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), FieldValue::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), FieldValue::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), FieldValue::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.fields.insert(
            field.name().to_string(),
            FieldValue::error(MessageError(value.to_string())),
        );
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), FieldValue::from(format!("{:?}", value)));
        }
    }
}

/// Owned snapshot of a borrowed `tracing` error.
#[derive(Debug)]
struct MessageError(String);

impl std::fmt::Display for MessageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for MessageError {}
