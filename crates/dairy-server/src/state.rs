//! Shared application state.

use dairy_audit::{AuditLogger, AuditStorage, PrincipalDirectory};
use dairy_auth::{KeyPair, TokenService};
use dairy_core::DairyConfig;
use std::sync::Arc;

use crate::error::ServerError;
use crate::geo::{GeoLocator, create_locator};
use crate::store::{BmcStore, MpcStore, MppStore, UserStore};

/// Shared state handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DairyConfig,
    tokens: TokenService,
    audit: AuditLogger,
    geo: Arc<dyn GeoLocator>,
    users: Arc<UserStore>,
    bmcs: BmcStore,
    mpps: MppStore,
    mpc: MpcStore,
}

impl AppState {
    /// Build the state described by `config`.
    pub fn new(config: DairyConfig) -> Result<Self, ServerError> {
        let keypair = KeyPair::from_config(&config.auth)?;
        let tokens = TokenService::new(keypair, config.auth.token_ttl_secs);
        let storage = dairy_audit::create_storage(&config.audit)?;
        let geo = create_locator(&config.geo);
        Ok(Self::from_parts(config, tokens, storage, geo))
    }

    /// Assemble state from explicit parts.
    pub fn from_parts(
        config: DairyConfig,
        tokens: TokenService,
        audit_storage: Arc<dyn AuditStorage>,
        geo: Arc<dyn GeoLocator>,
    ) -> Self {
        let users = Arc::new(UserStore::new());
        let directory: Arc<dyn PrincipalDirectory> = users.clone();
        let audit = AuditLogger::with_storage(config.audit.clone(), audit_storage)
            .with_directory(directory);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                tokens,
                audit,
                geo,
                users,
                bmcs: BmcStore::new(),
                mpps: MppStore::new(),
                mpc: MpcStore::new(),
            }),
        }
    }

    pub fn config(&self) -> &DairyConfig {
        &self.inner.config
    }

    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.inner.audit
    }

    pub fn geo(&self) -> &dyn GeoLocator {
        self.inner.geo.as_ref()
    }

    pub fn users(&self) -> &UserStore {
        &self.inner.users
    }

    pub fn bmcs(&self) -> &BmcStore {
        &self.inner.bmcs
    }

    pub fn mpps(&self) -> &MppStore {
        &self.inner.mpps
    }

    pub fn mpc(&self) -> &MpcStore {
        &self.inner.mpc
    }
}
