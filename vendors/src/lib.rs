pub mod deepl;
pub mod google;
pub mod languages;
pub mod libre;

pub use deepl::DeeplVendor;
pub use google::GoogleVendor;
pub use libre::LibreVendor;

use std::sync::Arc;

use xlate_config::vendors::VendorsConfig;
use xlate_translator::{DisplayLanguage, HttpFetch, Vendor, VendorHandle, VendorRegistry};

/// Register every enabled vendor, in rotation order
pub fn register_all(
    registry: &mut VendorRegistry,
    config: &VendorsConfig,
    fetch: Arc<dyn HttpFetch>,
    locale: Arc<dyn DisplayLanguage>,
) {
    let mut vendors: Vec<Arc<dyn Vendor>> = Vec::new();

    if config.google.enabled {
        vendors.push(Arc::new(GoogleVendor::new(fetch.clone(), config.google.api_url.clone())));
    }
    if config.deepl.enabled {
        vendors.push(Arc::new(DeeplVendor::new(
            fetch.clone(),
            config.deepl.api_key.clone(),
            config.deepl.api_url.clone(),
        )));
    }
    if config.libre.enabled {
        vendors.push(Arc::new(LibreVendor::new(
            fetch.clone(),
            config.libre.api_url.clone(),
            config.libre.api_key.clone(),
        )));
    }

    for vendor in vendors {
        let id = vendor.id().to_string();
        tracing::info!(vendor = %id, title = %vendor.descriptor().title, "vendor enabled");
        registry.register(id, VendorHandle::new(vendor, locale.clone()));
    }
}
