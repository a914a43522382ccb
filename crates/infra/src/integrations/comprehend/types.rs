//! Wire types of the PII service JSON protocol
use piiguard_domain::Annotation;
use serde::{Deserialize, Serialize};

/// Body shared by both APIs
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct PiiTextRequest<'a> {
    pub text: &'a str,
    pub language_code: &'a str,
}

/// One entity type score returned by `ContainsPiiEntities`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntityLabel {
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ContainsPiiEntitiesResponse {
    #[serde(default)]
    pub labels: Vec<EntityLabel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DetectPiiEntitiesResponse {
    #[serde(default)]
    pub entities: Vec<Annotation>,
}

/// Error document returned with a non-success status
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ServiceErrorBody {
    #[serde(rename = "__type", default)]
    pub error_type: Option<String>,
    #[serde(alias = "Message", default)]
    pub message: Option<String>,
}

impl ServiceErrorBody {
    /// `Type: message`, with whatever parts are present
    pub fn describe(&self) -> String {
        let error_type = self.error_type.as_deref().map(|t| t.rsplit('#').next().unwrap_or(t));
        match (error_type, self.message.as_deref()) {
            (Some(t), Some(m)) => format!("{t}: {m}"),
            (Some(t), None) => t.to_string(),
            (None, Some(m)) => m.to_string(),
            (None, None) => "no error details".to_string(),
        }
    }
}
