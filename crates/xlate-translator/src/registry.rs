use std::sync::Arc;

use crate::engine::VendorHandle;

/// Vendors in registration order, which is also the rotation order.
///
/// Built once at startup, then shared read-only behind an `Arc`.
#[derive(Default)]
pub struct VendorRegistry {
    vendors: Vec<(String, Arc<VendorHandle>)>,
}

impl VendorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-registering an id replaces the vendor but keeps its position
    pub fn register(&mut self, id: impl Into<String>, vendor: VendorHandle) -> Arc<VendorHandle> {
        let id = id.into();
        let vendor = Arc::new(vendor);

        match self.position(&id) {
            Some(idx) => {
                tracing::debug!(vendor = %id, "vendor replaced");
                self.vendors[idx].1 = vendor.clone();
            }
            None => {
                tracing::debug!(vendor = %id, "vendor registered");
                self.vendors.push((id, vendor.clone()));
            }
        }

        vendor
    }

    pub fn list(&self) -> impl Iterator<Item = &Arc<VendorHandle>> {
        self.vendors.iter().map(|(_, v)| v)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.vendors.iter().map(|(id, _)| id.as_str())
    }

    pub fn lookup(&self, id: &str) -> Option<&Arc<VendorHandle>> {
        self.position(id).map(|idx| &self.vendors[idx].1)
    }

    pub fn len(&self) -> usize {
        self.vendors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
    }

    /// First vendor after `id` (before it if `reverse`), wrapping around,
    /// that can translate the pair. `id` itself is never returned.
    pub fn next(
        &self,
        id: &str,
        source_lang: &str,
        target_lang: &str,
        reverse: bool,
    ) -> Option<&Arc<VendorHandle>> {
        let (before, after) = match self.position(id) {
            Some(idx) => (&self.vendors[..idx], &self.vendors[idx + 1..]),
            None => (&self.vendors[..0], &self.vendors[..]),
        };

        let candidates: Vec<&(String, Arc<VendorHandle>)> = if reverse {
            before.iter().rev().chain(after.iter().rev()).collect()
        } else {
            after.iter().chain(before.iter()).collect()
        };

        candidates
            .into_iter()
            .map(|(_, vendor)| vendor)
            .find(|vendor| vendor.can_translate(source_lang, target_lang))
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.vendors.iter().position(|(vendor_id, _)| vendor_id == id)
    }
}
