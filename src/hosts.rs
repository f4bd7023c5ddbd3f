//! Host extraction from ingress rules.

use std::collections::HashSet;

use crate::ingress::IngressSpec;
use crate::models::Host;

/// Collects the distinct rule hosts of `ingresses`, in order of first appearance.
///
/// Rules without a host (or with a blank one) are skipped, as are wildcard hosts,
/// which cannot be dialled. Names are trimmed but otherwise compared verbatim.
pub fn extract_hosts(ingresses: &[IngressSpec], port: u16) -> Vec<Host> {
    let mut seen = HashSet::new();
    let mut hosts = Vec::new();

    for ingress in ingresses {
        for rule in &ingress.rules {
            let Some(name) = rule.host.as_deref().map(str::trim) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            if name.starts_with('*') {
                log::debug!(
                    "Skipping wildcard host {name} in ingress {}/{}",
                    ingress.namespace.as_deref().unwrap_or("-"),
                    ingress.name.as_deref().unwrap_or("-")
                );
                continue;
            }
            if seen.insert(name.to_string()) {
                hosts.push(Host::new(name, port));
            }
        }
    }

    hosts
}
