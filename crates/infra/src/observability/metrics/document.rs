//! Business metrics emitted once per processed document

use std::collections::BTreeSet;

use piiguard_common::observability::{
    DIMENSION_ACCESS_POINT, DIMENSION_LANGUAGE, DIMENSION_PII_ENTITY_TYPE,
};
use piiguard_common::{MetricDatum, MetricUnit};
use piiguard_core::MetricsSink;
use piiguard_domain::constants::{
    METRIC_DOCUMENTS_PROCESSED, METRIC_PII_DOCUMENTS_PROCESSED,
    METRIC_PII_DOCUMENT_TYPES_PROCESSED,
};
use tracing::warn;

/// Dimensions shared by all business metrics of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetrics {
    pub language: String,
    pub access_point: String,
}

impl DocumentMetrics {
    pub fn new(language: impl Into<String>, access_point: impl Into<String>) -> Self {
        Self { language: language.into(), access_point: access_point.into() }
    }

    /// Record the outcome of one request
    ///
    /// Nothing is recorded for a document that was not processed. A
    /// processed document with interesting PII additionally counts once as
    /// a PII document and once per entity type found.
    pub fn record(&self, sink: &dyn MetricsSink, processed: bool, pii_types: &BTreeSet<String>) {
        if !processed {
            return;
        }

        self.emit(sink, self.datum(METRIC_DOCUMENTS_PROCESSED));
        if pii_types.is_empty() {
            return;
        }

        self.emit(sink, self.datum(METRIC_PII_DOCUMENTS_PROCESSED));
        for entity_type in pii_types {
            self.emit(
                sink,
                self.datum(METRIC_PII_DOCUMENT_TYPES_PROCESSED)
                    .with_dimension(DIMENSION_PII_ENTITY_TYPE, entity_type.as_str()),
            );
        }
    }

    fn datum(&self, name: &str) -> MetricDatum {
        MetricDatum::new(name, MetricUnit::Count, 1.0)
            .with_dimension(DIMENSION_LANGUAGE, self.language.as_str())
            .with_dimension(DIMENSION_ACCESS_POINT, self.access_point.as_str())
    }

    fn emit(&self, sink: &dyn MetricsSink, datum: MetricDatum) {
        if let Err(e) = sink.record(datum) {
            warn!(error = %e, "failed to record business metric");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::observability::metrics::buffered::{BufferedMetricsSink, MetricsPublisher};
    use piiguard_common::MetricsResult;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture(Mutex<Vec<MetricDatum>>);

    impl MetricsPublisher for Capture {
        fn publish(&self, _namespace: &str, batch: &[MetricDatum]) -> MetricsResult<()> {
            self.0.lock().unwrap().extend_from_slice(batch);
            Ok(())
        }
    }

    fn recorded(processed: bool, types: &[&str]) -> Vec<MetricDatum> {
        let capture = Arc::new(Capture::default());
        let sink = BufferedMetricsSink::new(capture.clone());
        let types: BTreeSet<String> = types.iter().map(|t| (*t).to_string()).collect();

        DocumentMetrics::new("en", "arn:aws:s3-object-lambda:us-east-1:123:accesspoint/ap")
            .record(&sink, processed, &types);
        sink.flush();

        let data = capture.0.lock().unwrap().clone();
        data
    }

    #[test]
    fn test_unprocessed_document_records_nothing() {
        assert!(recorded(false, &["SSN"]).is_empty());
    }

    #[test]
    fn test_clean_document_counts_only_as_processed() {
        let data = recorded(true, &[]);
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].metric_name, METRIC_DOCUMENTS_PROCESSED);
        assert_eq!(data[0].dimension(DIMENSION_LANGUAGE), Some("en"));
        assert!(data[0].dimension(DIMENSION_ACCESS_POINT).is_some());
    }

    #[test]
    fn test_pii_document_counts_each_entity_type() {
        let data = recorded(true, &["SSN", "NAME"]);
        let names: Vec<&str> = data.iter().map(|d| d.metric_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                METRIC_DOCUMENTS_PROCESSED,
                METRIC_PII_DOCUMENTS_PROCESSED,
                METRIC_PII_DOCUMENT_TYPES_PROCESSED,
                METRIC_PII_DOCUMENT_TYPES_PROCESSED,
            ]
        );
        // BTreeSet ordering
        assert_eq!(data[2].dimension(DIMENSION_PII_ENTITY_TYPE), Some("NAME"));
        assert_eq!(data[3].dimension(DIMENSION_PII_ENTITY_TYPE), Some("SSN"));
    }
}
