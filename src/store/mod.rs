pub mod cookies;
pub mod registry;

pub use registry::Registry;

use async_trait::async_trait;
use chrono::Utc;
use http::HeaderMap;
use sessionstore_codec::{CodecPipeline, KeyPair};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info};

use crate::client::StoreClient;
use crate::errors::Result;
use crate::record;
use crate::session::{Options, Session, generate_session_id};
use crate::sweeper::{self, SweeperHandle};


/// What a host's session middleware needs from a backend.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Load the session named `name` from the request cookies, or start a new one.
    async fn new_session(&self, request: &HeaderMap, name: &str) -> Result<Session>;

    /// Persist `session` and append its `Set-Cookie` header to `response`.
    async fn save(&self, response: &mut HeaderMap, session: &mut Session) -> Result<()>;
}

/// Database-backed session store.
///
/// The cookie carries only the codec-encoded session id; values live in the
/// store client's records, encoded with the same codecs.
pub struct SessionStore {
    client: Arc<dyn StoreClient>,
    codecs: CodecPipeline,
    options: RwLock<Options>,
    sweeper: tokio::sync::Mutex<Option<SweeperHandle>>,
}

impl SessionStore {
    /// Build a store over `client`, provisioning its schema.
    ///
    /// The first key pair signs new cookies; the rest are accepted on decode.
    pub async fn new(client: Arc<dyn StoreClient>, key_pairs: &[KeyPair]) -> Result<Self> {
        let codecs = CodecPipeline::from_pairs(key_pairs)?;
        client.ensure_schema().await?;

        let options = Options::default();
        codecs.set_max_age(options.max_age);

        Ok(Self {
            client,
            codecs,
            options: RwLock::new(options),
            sweeper: tokio::sync::Mutex::new(None),
        })
    }

    pub fn client(&self) -> &Arc<dyn StoreClient> {
        &self.client
    }

    /// A copy of the default options handed to new sessions.
    pub fn options(&self) -> Options {
        self.options
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_default_options(&self, options: Options) {
        self.codecs.set_max_age(options.max_age);
        *self.options.write().unwrap_or_else(PoisonError::into_inner) = options;
    }

    /// Set the default max-age for new sessions and the codec age limit.
    pub fn set_max_age(&self, age: i64) {
        self.options
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .max_age = age;
        self.codecs.set_max_age(age);
    }

    /// Limit encoded cookie and record size, in bytes. 0 removes the limit.
    pub fn set_max_length(&self, length: usize) {
        self.codecs.set_max_length(length);
    }

    pub async fn new_session(&self, request: &HeaderMap, name: &str) -> Result<Session> {
        let mut session = Session::new(name, self.options());

        let Some(token) = cookies::read_cookie(request, name) else {
            return Ok(session);
        };
        match self.codecs.decode::<String>(name, &token) {
            Ok(id) => session.id = id,
            Err(e) => {
                debug!(session = name, error = %e, "session cookie rejected, starting new session");
                return Ok(session);
            }
        }

        match self.load(&mut session).await {
            Ok(true) => session.is_new = false,
            Ok(false) => {}
            Err(e) if e.is_recoverable() => {
                debug!(session = name, error = %e, "session record rejected, starting new session");
            }
            Err(e) => return Err(e),
        }
        Ok(session)
    }

    /// Same as [`new_session`](Self::new_session), cached in `registry` for
    /// the rest of the request.
    pub async fn get<'r>(&self, registry: &'r mut Registry, name: &str) -> Result<&'r mut Session> {
        registry.get(self, name).await
    }

    /// Fill `session` from its stored record. `Ok(false)` when there is no
    /// live record.
    async fn load(&self, session: &mut Session) -> Result<bool> {
        let Some(record) = self.client.fetch_by_id(&session.id).await? else {
            debug!(session = session.name(), "no stored record for session id");
            return Ok(false);
        };
        if record.is_expired(Utc::now()) {
            debug!(session = session.name(), "stored record already expired");
            return Ok(false);
        }
        record::from_record(&self.codecs, &record, session)?;
        Ok(true)
    }

    pub async fn save(&self, response: &mut HeaderMap, session: &mut Session) -> Result<()> {
        if session.options.max_age < 0 {
            return self.delete(response, session).await;
        }

        if session.id.is_empty() {
            session.id = generate_session_id();
        }

        let record = record::to_record(&self.codecs, session, Utc::now())?;
        let stored = self.client.upsert(&session.id, record).await?;
        session.created_on = Some(stored.created_on);
        session.expires_on = Some(stored.expires_on);

        let token = self.codecs.encode(session.name(), &session.id)?;
        let cookie = cookies::build_cookie(session.name(), &token, &session.options);
        cookies::append_set_cookie(response, &cookie)?;
        debug!(session = session.name(), expires_on = %stored.expires_on, "session saved");
        Ok(())
    }

    async fn delete(&self, response: &mut HeaderMap, session: &Session) -> Result<()> {
        if !session.id.is_empty() {
            self.client.delete_by_id(&session.id).await?;
        }
        let cookie = cookies::build_cookie(session.name(), "", &session.options);
        cookies::append_set_cookie(response, &cookie)?;
        debug!(session = session.name(), "session deleted");
        Ok(())
    }

    /// Start sweeping expired records every `interval`, replacing any
    /// sweeper this store already runs.
    pub async fn start_cleanup(&self, interval: Duration) {
        let mut slot = self.sweeper.lock().await;
        if let Some(previous) = slot.take() {
            previous.stop().await;
        }
        *slot = Some(sweeper::start(Arc::clone(&self.client), interval));
    }

    /// Stop the running sweeper, if any. Returns whether one was running.
    pub async fn stop_cleanup(&self) -> bool {
        let Some(handle) = self.sweeper.lock().await.take() else {
            return false;
        };
        handle.stop().await;
        true
    }

    pub async fn is_cleanup_running(&self) -> bool {
        self.sweeper.lock().await.is_some()
    }

    pub async fn close(&self) {
        if self.stop_cleanup().await {
            info!("session store closed");
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("codecs", &self.codecs)
            .field("options", &self.options())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SessionBackend for SessionStore {
    async fn new_session(&self, request: &HeaderMap, name: &str) -> Result<Session> {
        SessionStore::new_session(self, request, name).await
    }

    async fn save(&self, response: &mut HeaderMap, session: &mut Session) -> Result<()> {
        SessionStore::save(self, response, session).await
    }
}
