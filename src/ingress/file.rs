//! Offline ingress source reading a `kubectl get ingress -A -o json` dump.

use std::path::PathBuf;

use async_trait::async_trait;
use k8s_openapi::api::networking::v1::Ingress;
use serde::Deserialize;

use super::{IngressSource, IngressSpec};
use crate::error_handling::SetupError;

/// Accepts both the `List` wrapper kubectl prints and a bare JSON array.
#[derive(Deserialize)]
#[serde(untagged)]
enum IngressDocument {
    List { items: Vec<Ingress> },
    Array(Vec<Ingress>),
}

pub struct FileIngressSource {
    path: PathBuf,
}

impl FileIngressSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parses a document already in memory.
    ///
    /// # Errors
    ///
    /// Returns `SetupError::IngressFileParse` if the JSON is not an ingress list.
    pub fn parse(&self, contents: &str) -> Result<Vec<IngressSpec>, SetupError> {
        let document: IngressDocument =
            serde_json::from_str(contents).map_err(|source| SetupError::IngressFileParse {
                path: self.path.display().to_string(),
                source,
            })?;
        let items = match document {
            IngressDocument::List { items } | IngressDocument::Array(items) => items,
        };
        Ok(items.iter().map(IngressSpec::from).collect())
    }
}

#[async_trait]
impl IngressSource for FileIngressSource {
    fn describe(&self) -> String {
        format!("file ({})", self.path.display())
    }

    async fn list_ingresses(&self) -> Result<Vec<IngressSpec>, SetupError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SetupError::IngressFileRead {
                path: self.path.display().to_string(),
                source,
            })?;
        self.parse(&contents)
    }
}
