//! Ingress sources.
//!
//! The scan only needs the host field of each ingress rule, so sources reduce whatever
//! they read to [`IngressSpec`] values. Two sources exist: the Kubernetes API and a
//! JSON file in `kubectl get ingress -o json` form.

mod cluster;
mod file;

use async_trait::async_trait;
use k8s_openapi::api::networking::v1::Ingress;

use crate::config::{Config, IngressSourceKind};
use crate::error_handling::SetupError;

pub use cluster::KubeIngressSource;
pub use file::FileIngressSource;

/// One routing rule; only the host matters here.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IngressRule {
    pub host: Option<String>,
}

impl IngressRule {
    pub fn with_host(host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
        }
    }
}

/// The parts of an ingress object the scan reads.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IngressSpec {
    pub namespace: Option<String>,
    pub name: Option<String>,
    pub rules: Vec<IngressRule>,
}

impl From<&Ingress> for IngressSpec {
    fn from(ingress: &Ingress) -> Self {
        let rules = ingress
            .spec
            .as_ref()
            .and_then(|spec| spec.rules.as_ref())
            .map(|rules| {
                rules
                    .iter()
                    .map(|rule| IngressRule {
                        host: rule.host.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            namespace: ingress.metadata.namespace.clone(),
            name: ingress.metadata.name.clone(),
            rules,
        }
    }
}

/// Read-only source of ingress objects.
#[async_trait]
pub trait IngressSource: Send + Sync {
    /// Short description for log lines (e.g. `kube (all namespaces)`).
    fn describe(&self) -> String;

    /// Lists every ingress, in the order the source returns them.
    ///
    /// # Errors
    ///
    /// Any error here is fatal for the run.
    async fn list_ingresses(&self) -> Result<Vec<IngressSpec>, SetupError>;

    /// Raw rule hosts across all ingresses, in order, including empty ones.
    async fn list_ingress_hosts(&self) -> Result<Vec<Option<String>>, SetupError> {
        Ok(self
            .list_ingresses()
            .await?
            .into_iter()
            .flat_map(|ingress| ingress.rules.into_iter().map(|rule| rule.host))
            .collect())
    }
}

/// Builds the source selected by `config`.
///
/// # Errors
///
/// Returns `SetupError::ClusterClient` when no Kubernetes credentials are available,
/// or `SetupError::InvalidConfig` for a file source without a path.
pub async fn build_source(config: &Config) -> Result<Box<dyn IngressSource>, SetupError> {
    match config.source {
        IngressSourceKind::Kube => Ok(Box::new(
            KubeIngressSource::connect(config.namespace.clone(), config.selector.clone()).await?,
        )),
        IngressSourceKind::File => {
            let path = config.ingress_file.clone().ok_or_else(|| {
                SetupError::InvalidConfig("--source file requires --ingress-file".to_string())
            })?;
            Ok(Box::new(FileIngressSource::new(path)))
        }
    }
}

/// Fixed in-memory list, used by tests and library callers that already hold specs.
#[derive(Debug, Clone, Default)]
pub struct StaticIngressSource {
    ingresses: Vec<IngressSpec>,
}

impl StaticIngressSource {
    pub fn new(ingresses: Vec<IngressSpec>) -> Self {
        Self { ingresses }
    }
}

#[async_trait]
impl IngressSource for StaticIngressSource {
    fn describe(&self) -> String {
        format!("static ({} ingresses)", self.ingresses.len())
    }

    async fn list_ingresses(&self) -> Result<Vec<IngressSpec>, SetupError> {
        Ok(self.ingresses.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::networking::v1::{IngressRule as K8sRule, IngressSpec as K8sSpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    #[test]
    fn test_from_ingress_keeps_rule_order_and_empty_hosts() {
        let ingress = Ingress {
            metadata: ObjectMeta {
                name: Some("web".to_string()),
                namespace: Some("prod".to_string()),
                ..Default::default()
            },
            spec: Some(K8sSpec {
                rules: Some(vec![
                    K8sRule {
                        host: Some("b.example.com".to_string()),
                        ..Default::default()
                    },
                    K8sRule::default(),
                    K8sRule {
                        host: Some("a.example.com".to_string()),
                        ..Default::default()
                    },
                ]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let spec = IngressSpec::from(&ingress);
        assert_eq!(spec.name.as_deref(), Some("web"));
        assert_eq!(spec.namespace.as_deref(), Some("prod"));
        assert_eq!(
            spec.rules,
            vec![
                IngressRule::with_host("b.example.com"),
                IngressRule { host: None },
                IngressRule::with_host("a.example.com"),
            ]
        );
    }

    #[test]
    fn test_from_ingress_without_spec_has_no_rules() {
        let spec = IngressSpec::from(&Ingress::default());
        assert!(spec.rules.is_empty());
    }

    #[tokio::test]
    async fn test_list_ingress_hosts_flattens_in_order() {
        let source = StaticIngressSource::new(vec![
            IngressSpec {
                rules: vec![IngressRule::with_host("a.com"), IngressRule::default()],
                ..Default::default()
            },
            IngressSpec {
                rules: vec![IngressRule::with_host("b.com")],
                ..Default::default()
            },
        ]);
        let hosts = source.list_ingress_hosts().await.unwrap();
        assert_eq!(
            hosts,
            vec![Some("a.com".to_string()), None, Some("b.com".to_string())]
        );
    }

    #[tokio::test]
    async fn test_build_source_file() {
        let config = Config {
            source: IngressSourceKind::File,
            ingress_file: Some("ingresses.json".into()),
            ..Default::default()
        };
        let source = build_source(&config).await.unwrap();
        assert_eq!(source.describe(), "file (ingresses.json)");
    }

    #[tokio::test]
    async fn test_build_source_file_without_path() {
        let config = Config {
            source: IngressSourceKind::File,
            ..Default::default()
        };
        assert!(matches!(
            build_source(&config).await,
            Err(SetupError::InvalidConfig(_))
        ));
    }
}
