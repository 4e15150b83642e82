//! Saved QuantumLeap (FIWARE NGSI-v2 time series) entity responses.
//!
//! The body of `GET /v2/entities/{id}` looks like
//! `{"entityId": .., "index": [..], "attributes": [{"attrName": "ecg", "values": [..]}]}`.
//! Samples are taken from the attribute whose `attrName` matches, never by position.

use super::SampleSource;
use crate::signal::TimeSeries;
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityResponse {
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub index: Vec<String>,
    pub attributes: Vec<AttributeSeries>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeSeries {
    pub attr_name: String,
    #[serde(default)]
    pub values: Vec<Value>,
}

impl EntityResponse {
    pub fn attribute(&self, name: &str) -> Option<&AttributeSeries> {
        self.attributes.iter().find(|a| a.attr_name == name)
    }

    /// Samples of attribute `name`, flattened in order.
    pub fn samples(&self, name: &str) -> Result<Vec<f64>> {
        let attr = self.attribute(name).ok_or_else(|| {
            let available: Vec<_> = self.attributes.iter().map(|a| a.attr_name.as_str()).collect();
            anyhow!(
                "entity {} has no attribute '{}' (attributes: {})",
                self.entity_id.as_deref().unwrap_or("<unnamed>"),
                name,
                available.join(", ")
            )
        })?;
        let mut out = Vec::with_capacity(attr.values.len());
        for (pos, value) in attr.values.iter().enumerate() {
            push_numeric(value, &mut out)
                .with_context(|| format!("attribute '{}' value {}", name, pos))?;
        }
        if out.is_empty() {
            bail!("attribute '{}' has no samples", name);
        }
        Ok(out)
    }
}

fn push_numeric(value: &Value, out: &mut Vec<f64>) -> Result<()> {
    match value {
        Value::Number(n) => {
            let v = n.as_f64().ok_or_else(|| anyhow!("{n} is not representable as f64"))?;
            out.push(v);
        }
        Value::String(s) => {
            let v = s
                .trim()
                .parse::<f64>()
                .with_context(|| format!("'{s}' is not numeric"))?;
            out.push(v);
        }
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Array(_) => bail!("nested sample arrays are not supported"),
                    other => push_numeric(other, out)?,
                }
            }
        }
        Value::Null => bail!("missing sample (null)"),
        other => bail!("unexpected sample {other}"),
    }
    Ok(())
}

pub fn parse_entity_response(text: &str) -> Result<EntityResponse> {
    serde_json::from_str(text).context("parsing QuantumLeap entity response")
}

pub fn load_entity_samples(path: &Path, attribute: &str) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_entity_response(&text)
        .with_context(|| path.display().to_string())?
        .samples(attribute)
}

/// One attribute of a saved entity response, sampled at `fs`.
#[derive(Debug, Clone)]
pub struct QuantumLeapSource {
    pub path: PathBuf,
    pub attribute: String,
    pub fs: f64,
}

impl QuantumLeapSource {
    pub fn new(path: impl Into<PathBuf>, attribute: impl Into<String>, fs: f64) -> Self {
        Self {
            path: path.into(),
            attribute: attribute.into(),
            fs,
        }
    }
}

impl SampleSource for QuantumLeapSource {
    fn acquire(&self) -> Result<TimeSeries> {
        let data = load_entity_samples(&self.path, &self.attribute)?;
        Ok(TimeSeries::new(self.fs, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "entityId": "urn:ngsiv2:Ecg:Patient01",
        "entityType": "Ecg",
        "index": ["2021-03-01T10:00:00.000+00:00", "2021-03-01T10:00:05.000+00:00"],
        "attributes": [
            {"attrName": "battery", "values": [98, 97]},
            {"attrName": "ecg", "values": [[0.1, 0.2, 0.3], [0.4, "0.5"]]}
        ]
    }"#;

    #[test]
    fn looks_up_attribute_by_name() {
        let resp = parse_entity_response(BODY).unwrap();
        assert_eq!(resp.entity_type.as_deref(), Some("Ecg"));
        assert_eq!(resp.index.len(), 2);
        assert_eq!(resp.samples("ecg").unwrap(), vec![0.1, 0.2, 0.3, 0.4, 0.5]);
        assert_eq!(resp.samples("battery").unwrap(), vec![98.0, 97.0]);
    }

    #[test]
    fn unknown_attribute_lists_names() {
        let resp = parse_entity_response(BODY).unwrap();
        let msg = resp.samples("heartRate").unwrap_err().to_string();
        assert!(msg.contains("Patient01"), "{msg}");
        assert!(msg.contains("battery, ecg"), "{msg}");
    }

    #[test]
    fn null_sample_is_reported_with_position() {
        let resp =
            parse_entity_response(r#"{"attributes": [{"attrName": "ecg", "values": [1.0, null]}]}"#)
                .unwrap();
        let err = resp.samples("ecg").unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("value 1"), "{msg}");
        assert!(msg.contains("null"), "{msg}");
    }

    #[test]
    fn rejects_payload_without_attributes() {
        assert!(parse_entity_response(r#"{"entityId": "x"}"#).is_err());
    }

    #[test]
    fn source_reads_saved_response() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), BODY).unwrap();
        let ts = QuantumLeapSource::new(file.path(), "ecg", 256.0)
            .acquire()
            .unwrap();
        assert_eq!(ts.len(), 5);
        assert_eq!(ts.fs, 256.0);
    }
}
