//! Client-side aggregation of several list endpoints into one view-model.
//!
//! All requests are sent at once and joined. One failed request fails the
//! whole load; nothing is retried.

use futures::future::join_all;
use log::{debug, warn};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HookError {
    #[error("Error al cargar {resource}: {status}")]
    Status {
        resource: String,
        status: reqwest::StatusCode,
    },

    #[error("Error al cargar {resource}: {source}")]
    Transport {
        resource: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub loading: bool,
    pub error: Option<String>,
    /// One slice per registered source, keyed by its name.
    pub data: BTreeMap<String, Vec<Value>>,
}

impl ViewModel {
    pub fn slice(&self, key: &str) -> &[Value] {
        self.data.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

pub struct DataHook {
    http: reqwest::Client,
    base_url: String,
    sources: Vec<(String, String)>,
}

impl DataHook {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        DataHook {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            sources: Vec::new(),
        }
    }

    /// Adds a slice named `key`, filled from `GET {base_url}{path}`.
    pub fn source(mut self, key: &str, path: &str) -> Self {
        self.sources.push((key.to_string(), path.to_string()));
        self
    }

    /// State before any response has arrived.
    pub fn initial_state(&self) -> ViewModel {
        ViewModel {
            loading: true,
            error: None,
            data: self
                .sources
                .iter()
                .map(|(key, _)| (key.clone(), Vec::new()))
                .collect(),
        }
    }

    pub async fn load(&self) -> ViewModel {
        let fetches = self
            .sources
            .iter()
            .map(|(key, path)| self.fetch(key, path));
        let results = join_all(fetches).await;

        let mut state = self.initial_state();
        state.loading = false;

        let mut slices = Vec::with_capacity(results.len());
        for (result, (key, _)) in results.into_iter().zip(&self.sources) {
            match result {
                Ok(rows) => slices.push((key.clone(), rows)),
                Err(e) => {
                    warn!("{}", e);
                    state.error = Some(e.to_string());
                    return state;
                }
            }
        }

        for (key, rows) in slices {
            debug!("Loaded {} rows for {}", rows.len(), key);
            state.data.insert(key, rows);
        }
        state
    }

    async fn fetch(&self, key: &str, path: &str) -> Result<Vec<Value>, HookError> {
        let url = format!("{}{}", self.base_url, path);
        let transport = |source| HookError::Transport {
            resource: key.to_string(),
            source,
        };

        let response = self.http.get(&url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(HookError::Status {
                resource: key.to_string(),
                status,
            });
        }

        let body: Value = response.json().await.map_err(transport)?;
        Ok(rows_from_body(body))
    }
}

/// `{ "data": [...] }` or a bare array; anything else is an empty slice.
fn rows_from_body(body: Value) -> Vec<Value> {
    match body {
        Value::Array(rows) => rows,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(rows)) => rows,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
