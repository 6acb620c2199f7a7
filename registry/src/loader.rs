//! Fetches and parses the registry manifest.

use procontext_types::{ProContextError, RegistryEntry};
use sha2::{Digest, Sha256};

/// Fetches `url`, parses it as a JSON array, and validates each element
/// against [`RegistryEntry`]'s schema. An element failing to deserialize is
/// dropped with a warning; the rest of the manifest still loads. Also
/// derives a `registry_version` from `metadata_url`, falling back to a
/// deterministic hash of the manifest body when the metadata endpoint is
/// unavailable.
pub async fn load_registry(
    client: &reqwest::Client,
    url: &str,
    metadata_url: &str,
) -> Result<(Vec<RegistryEntry>, String), ProContextError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ProContextError::registry_load_failed(format!("manifest fetch failed: {e}")))?;

    if !response.status().is_success() {
        return Err(ProContextError::registry_load_failed(format!(
            "manifest endpoint returned {}",
            response.status()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| ProContextError::registry_load_failed(format!("manifest body read failed: {e}")))?;

    let raw: serde_json::Value = serde_json::from_str(&body)
        .map_err(|e| ProContextError::registry_load_failed(format!("manifest is not valid JSON: {e}")))?;

    let array = raw
        .as_array()
        .ok_or_else(|| ProContextError::registry_load_failed("manifest top level is not an array"))?;

    let mut entries = Vec::with_capacity(array.len());
    for (index, value) in array.iter().enumerate() {
        match serde_json::from_value::<RegistryEntry>(value.clone()) {
            Ok(entry) => entries.push(entry),
            Err(error) => {
                tracing::warn!(event = "registry_entry_invalid", index, %error);
            }
        }
    }

    let version = fetch_registry_version(client, metadata_url, &body).await;

    Ok((entries, version))
}

async fn fetch_registry_version(client: &reqwest::Client, metadata_url: &str, manifest_body: &str) -> String {
    let fetched = async {
        let response = client.get(metadata_url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let text = response.text().await.ok()?;
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
            if let Some(version) = value.get("version").and_then(|v| v.as_str()) {
                return Some(version.to_string());
            }
        }
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
    .await;

    fetched.unwrap_or_else(|| manifest_hash(manifest_body))
}

fn manifest_hash(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
