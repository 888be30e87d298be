use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use kusto_log_exporter::{
    ErrorInfo, EventId, ExportContext, ExporterOptions, IngestionProperties, IngestionSink, KustoLogExporter,
    LogExporter, LogRecord, Resource, RowSchema, Severity, SinkError, SpanId, TraceFlags, TraceId,
};
use serde_json::json;

const BATCH_SIZE: usize = 512;

// Sink that does nothing - for measuring pure encoding and flush control
struct NullSink;

impl IngestionSink for NullSink {
    fn ingest(&self, data: &[u8], _properties: &IngestionProperties) -> Result<(), SinkError> {
        black_box(data);
        Ok(())
    }
}

fn batch() -> Vec<LogRecord> {
    let trace = TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap_or_default();
    let span = SpanId::from_hex("00f067aa0ba902b7").unwrap_or_default();

    (0..BATCH_SIZE)
        .map(|i| {
            let record = LogRecord::new(Utc::now(), "Bench.Program", Severity::Information)
                .with_event(EventId::new(i as i32, "BenchEvent"))
                .with_trace(trace, span, TraceFlags::RECORDED);
            match i % 3 {
                0 => record.with_message(format!("Some info message with param {}", i)),
                1 => record.with_state(json!({
                    "FieldA": "Some text, with a comma",
                    "FieldB": i,
                    "FieldC": null,
                })),
                _ => record.with_error(ErrorInfo::new(
                    "InvalidOperation",
                    "my exception message",
                    "InvalidOperation: my exception message\n  at bench",
                )),
            }
        })
        .collect()
}

fn exporter(schema: RowSchema) -> KustoLogExporter<NullSink> {
    let mut options = ExporterOptions::new("https://ingest-bench.kusto.windows.net");
    options.schema = schema;
    let resource = Resource::new().with_service("bench", "kusto", "1.0.0");
    match KustoLogExporter::new(options, &resource, NullSink) {
        Ok(exporter) => exporter,
        Err(err) => panic!("bench exporter: {}", err),
    }
}

fn bench_export(c: &mut Criterion) {
    let records = batch();
    let mut group = c.benchmark_group("export");
    group.throughput(Throughput::Elements(BATCH_SIZE as u64));

    for (name, schema) in [("enriched", RowSchema::Enriched), ("minimal", RowSchema::Minimal)] {
        let exporter = exporter(schema);
        let mut context = ExportContext::new();
        group.bench_function(name, |b| {
            b.iter(|| black_box(exporter.export(&mut context, black_box(&records))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_export);
criterion_main!(benches);
