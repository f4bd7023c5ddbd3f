//! Kubernetes API ingress source.

use async_trait::async_trait;
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::{Api, ListParams};
use kube::Client;

use super::{IngressSource, IngressSpec};
use crate::error_handling::SetupError;

/// Lists `networking.k8s.io/v1` ingresses through the cluster API.
pub struct KubeIngressSource {
    client: Client,
    namespace: Option<String>,
    selector: Option<String>,
}

impl KubeIngressSource {
    /// Connects with the in-cluster service account, falling back to the local
    /// kubeconfig.
    ///
    /// # Errors
    ///
    /// Returns `SetupError::ClusterClient` if no credentials can be loaded.
    pub async fn connect(
        namespace: Option<String>,
        selector: Option<String>,
    ) -> Result<Self, SetupError> {
        let client = Client::try_default()
            .await
            .map_err(SetupError::ClusterClient)?;
        Ok(Self::new(client, namespace, selector))
    }

    pub fn new(client: Client, namespace: Option<String>, selector: Option<String>) -> Self {
        Self {
            client,
            namespace,
            selector,
        }
    }

    fn api(&self) -> Api<Ingress> {
        match &self.namespace {
            Some(namespace) => Api::namespaced(self.client.clone(), namespace),
            None => Api::all(self.client.clone()),
        }
    }
}

#[async_trait]
impl IngressSource for KubeIngressSource {
    fn describe(&self) -> String {
        let scope = match &self.namespace {
            Some(namespace) => format!("namespace {namespace}"),
            None => "all namespaces".to_string(),
        };
        match &self.selector {
            Some(selector) => format!("kube ({scope}, selector {selector})"),
            None => format!("kube ({scope})"),
        }
    }

    async fn list_ingresses(&self) -> Result<Vec<IngressSpec>, SetupError> {
        let mut params = ListParams::default();
        if let Some(selector) = &self.selector {
            params = params.labels(selector);
        }

        let list = self
            .api()
            .list(&params)
            .await
            .map_err(SetupError::ListIngresses)?;

        log::debug!("Kubernetes returned {} ingress object(s)", list.items.len());
        Ok(list.items.iter().map(IngressSpec::from).collect())
    }
}
