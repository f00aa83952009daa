//! Document — in-memory model of the inspected site collection.
//!
//! DESIGN
//! ======
//! One property bag per site, keyed by property key so repeated writes
//! replace. Write access can be revoked to model a session without manage
//! permission; reads keep working, writes report a structured denial.

use std::collections::BTreeMap;

use tokio::sync::RwLock;

use crate::model::{Site, SiteProperty};

/// Failures the document reports to commands.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("site not found: {0}")]
    UnknownSite(String),

    #[error("access denied: property bag is read-only for this session")]
    ReadOnly,
}

struct Inner {
    sites: Vec<Site>,
    bags: BTreeMap<String, BTreeMap<String, SiteProperty>>,
    writable: bool,
}

/// Sites plus one property bag each. Shared by commands via `Arc`.
pub struct SiteDocument {
    inner: RwLock<Inner>,
}

impl SiteDocument {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner { sites: Vec::new(), bags: BTreeMap::new(), writable: true }),
        }
    }

    /// Add a site with an empty property bag.
    pub async fn add_site(&self, site: Site) {
        let mut inner = self.inner.write().await;
        inner.bags.entry(site.key.clone()).or_default();
        inner.sites.push(site);
    }

    pub async fn set_writable(&self, writable: bool) {
        self.inner.write().await.writable = writable;
    }

    /// All properties of `site_key`, in key order.
    ///
    /// # Errors
    /// [`DocumentError::UnknownSite`] when no such site exists.
    pub async fn properties(&self, site_key: &str) -> Result<Vec<SiteProperty>, DocumentError> {
        let inner = self.inner.read().await;
        let bag = inner
            .bags
            .get(site_key)
            .ok_or_else(|| DocumentError::UnknownSite(site_key.to_owned()))?;
        Ok(bag.values().cloned().collect())
    }

    /// Insert or replace one property in `site_key`'s bag.
    ///
    /// # Errors
    /// [`DocumentError::ReadOnly`] without write access,
    /// [`DocumentError::UnknownSite`] when no such site exists.
    pub async fn upsert_property(
        &self,
        site_key: &str,
        property: SiteProperty,
    ) -> Result<(), DocumentError> {
        let mut inner = self.inner.write().await;
        if !inner.writable {
            return Err(DocumentError::ReadOnly);
        }
        let bag = inner
            .bags
            .get_mut(site_key)
            .ok_or_else(|| DocumentError::UnknownSite(site_key.to_owned()))?;
        bag.insert(property.key.clone(), property);
        Ok(())
    }

    /// Sites whose title or url contains `query`, case-insensitively.
    pub async fn search_sites(&self, query: &str) -> Vec<Site> {
        let needle = query.to_lowercase();
        let inner = self.inner.read().await;
        inner
            .sites
            .iter()
            .filter(|site| {
                site.title.to_lowercase().contains(&needle)
                    || site.url.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }
}

impl Default for SiteDocument {
    fn default() -> Self {
        Self::new()
    }
}
