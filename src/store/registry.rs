use http::HeaderMap;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use super::SessionBackend;
use crate::errors::Result;
use crate::session::Session;

/// Per-request session cache.
///
/// Repeated `get` calls for the same name return the same session, so a
/// handler and its middleware share state for the lifetime of one request.
#[derive(Debug, Default)]
pub struct Registry {
    request: HeaderMap,
    sessions: HashMap<String, Session>,
}

impl Registry {
    pub fn new(request: HeaderMap) -> Self {
        Self {
            request,
            sessions: HashMap::new(),
        }
    }

    pub fn request(&self) -> &HeaderMap {
        &self.request
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub async fn get(&mut self, backend: &dyn SessionBackend, name: &str) -> Result<&mut Session> {
        match self.sessions.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let session = backend.new_session(&self.request, name).await?;
                Ok(entry.insert(session))
            }
        }
    }

    /// Save every session obtained through this registry, stopping at the
    /// first failure.
    pub async fn save_all(&mut self, backend: &dyn SessionBackend, response: &mut HeaderMap) -> Result<()> {
        for session in self.sessions.values_mut() {
            backend.save(response, session).await?;
        }
        Ok(())
    }
}
