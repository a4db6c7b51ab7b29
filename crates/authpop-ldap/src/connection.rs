//! LDAP connection pool management.
//!
//! ## Security Requirements
//!
//! All connections use LDAPS (TLS from connection start).
//! STARTTLS is NOT supported to prevent downgrade attacks.

use std::sync::Arc;

use ldap3::{Ldap, LdapConnAsync, LdapConnSettings};
use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::LdapConfig;
use crate::error::{LdapError, LdapResult};

/// Connection pool for LDAP connections.
///
/// At most `pool_max_size` connections are checked out at once. Idle,
/// bound connections are reused; broken ones are dropped.
pub struct LdapConnectionPool {
    config: Arc<LdapConfig>,
    semaphore: Arc<Semaphore>,
    idle: Arc<Mutex<Vec<Ldap>>>,
}

impl LdapConnectionPool {
    /// Creates a new connection pool.
    ///
    /// ## Security
    ///
    /// The configuration must use LDAPS. This is validated at config build time.
    #[must_use]
    pub fn new(config: LdapConfig) -> Self {
        let max_size = config.pool_max_size;
        Self {
            config: Arc::new(config),
            semaphore: Arc::new(Semaphore::new(max_size)),
            idle: Arc::new(Mutex::new(Vec::with_capacity(max_size))),
        }
    }

    /// Gets a connection from the pool.
    ///
    /// Waits for a free slot, then reuses an idle connection that is still
    /// open or opens a new one. Idle connections the server has closed are
    /// discarded.
    pub async fn get(&self) -> LdapResult<LdapConnection> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| LdapError::PoolExhausted)?;

        let reused = pop_open(&mut *self.idle.lock(), Ldap::is_closed);
        let ldap = match reused {
            Some(ldap) => ldap,
            None => self.create_connection().await?,
        };

        Ok(LdapConnection {
            ldap,
            idle: Arc::clone(&self.idle),
            reusable: true,
            _permit: permit,
        })
    }

    /// Creates a new LDAPS connection bound as the service account.
    async fn create_connection(&self) -> LdapResult<Ldap> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.config.connection_timeout)
            .set_no_tls_verify(!self.config.validate_certificates);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &self.config.connection_url)
            .await
            .map_err(|e| LdapError::Connection(e.to_string()))?;

        // Spawn connection driver
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                tracing::warn!("LDAP connection driver error: {}", e);
            }
        });

        ldap.simple_bind(&self.config.bind_dn, &self.config.bind_credential)
            .await
            .map_err(|e| LdapError::Bind(e.to_string()))?
            .success()
            .map_err(|e| LdapError::Bind(format!("Bind failed: {e}")))?;

        tracing::debug!(url = %self.config.connection_url, "Opened LDAP connection");

        Ok(ldap)
    }

    /// Tests the connection to the LDAP server by reading the root DSE.
    pub async fn test_connection(&self) -> LdapResult<()> {
        let mut conn = self.get().await?;
        let timeout = self.config.read_timeout;

        let result = conn
            .ldap_mut()
            .with_timeout(timeout)
            .search("", ldap3::Scope::Base, "(objectClass=*)", vec!["namingContexts"])
            .await
            .map_err(|e| LdapError::Connection(format!("Test search failed: {e}")))
            .and_then(|rs| {
                rs.success()
                    .map_err(|e| LdapError::Connection(format!("Test search failed: {e}")))
            });

        if result.is_err() {
            conn.invalidate();
        }
        result.map(|_| ())
    }

    /// Returns the number of idle connections.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &LdapConfig {
        &self.config
    }
}

/// A connection from the pool.
///
/// When dropped, a reusable connection is returned to the pool.
pub struct LdapConnection {
    ldap: Ldap,
    idle: Arc<Mutex<Vec<Ldap>>>,
    reusable: bool,
    _permit: OwnedSemaphorePermit,
}

impl LdapConnection {
    /// Returns a mutable reference to the LDAP connection.
    #[must_use]
    pub fn ldap_mut(&mut self) -> &mut Ldap {
        &mut self.ldap
    }

    /// Marks the connection as broken so it is not returned to the pool.
    pub fn invalidate(&mut self) {
        self.reusable = false;
    }
}

impl Drop for LdapConnection {
    fn drop(&mut self) {
        // Ldap is a cheap handle onto the connection driver.
        if self.reusable && !self.ldap.is_closed() {
            self.idle.lock().push(self.ldap.clone());
        }
    }
}

/// Pops idle handles until one is still open, dropping the closed ones.
fn pop_open<T>(idle: &mut Vec<T>, mut is_closed: impl FnMut(&mut T) -> bool) -> Option<T> {
    while let Some(mut handle) = idle.pop() {
        if is_closed(&mut handle) {
            tracing::debug!("Discarding idle LDAP connection closed by the server");
            continue;
        }
        return Some(handle);
    }
    None
}
