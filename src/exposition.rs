//! Prometheus text exposition of collected samples.
//!
//! Containers carry different user labels, so a family's label schema is the
//! union of the label names seen in this scrape. Samples without a given
//! label render it as an empty string, which Prometheus treats as absent.

use std::collections::BTreeSet;

use prometheus::proto::MetricFamily;
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

use crate::collector::MetricSample;
use crate::schema::CONTAINER_METRICS;

/// Initial buffer capacity for encoding.
const BUFFER_CAP: usize = 64 * 1024;

/// Builds metric families for the samples of one scrape.
///
/// Families come out sorted by name. Families without samples are omitted.
pub fn gather_samples(samples: &[MetricSample]) -> Result<Vec<MetricFamily>, prometheus::Error> {
    let registry = Registry::new();

    for desc in CONTAINER_METRICS.iter() {
        let family: Vec<&MetricSample> = samples.iter().filter(|s| s.name == desc.name).collect();
        if family.is_empty() {
            continue;
        }

        let label_names: Vec<&str> = family
            .iter()
            .flat_map(|s| s.labels.keys().map(String::as_str))
            .collect::<BTreeSet<&str>>()
            .into_iter()
            .collect();

        let gauges = GaugeVec::new(Opts::new(desc.name, desc.help), &label_names)?;
        for sample in family {
            let values: Vec<&str> = label_names
                .iter()
                .map(|name| sample.labels.get(*name).map(String::as_str).unwrap_or(""))
                .collect();
            gauges
                .get_metric_with_label_values(values.as_slice())?
                .set(sample.value);
        }
        registry.register(Box::new(gauges))?;
    }

    Ok(registry.gather())
}

/// Encodes families in the Prometheus text format.
pub fn encode(families: &[MetricFamily]) -> Result<String, prometheus::Error> {
    let mut buffer = Vec::with_capacity(BUFFER_CAP);
    TextEncoder::new().encode(families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Renders container samples followed by any additional families
/// (exporter telemetry, build info).
pub fn render(
    samples: &[MetricSample],
    extra: Vec<MetricFamily>,
) -> Result<String, prometheus::Error> {
    let mut families = gather_samples(samples)?;
    families.extend(extra);
    encode(&families)
}
