//! Deterministic endpoint locators

use crate::utils::config::ClientSettings;

/// Builds every backend address from one origin and prefix. Pure string
/// construction: no I/O, never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    root: String,
}

impl Endpoints {
    pub fn new(base_url: &str, api_prefix: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        let prefix = api_prefix.trim_matches('/');
        let root = if prefix.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, prefix)
        };
        Self { root }
    }

    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self::new(&settings.base_url, &settings.api_prefix)
    }

    pub fn extract(&self) -> String {
        format!("{}/extract", self.root)
    }

    pub fn downloads(&self) -> String {
        format!("{}/downloads", self.root)
    }

    pub fn download(&self, id: &str) -> String {
        format!("{}/downloads/{}", self.root, id)
    }

    /// Address of the server-push progress stream for `id`
    pub fn progress_channel_address(&self, id: &str) -> String {
        format!("{}/downloads/{}/progress", self.root, id)
    }

    /// Address a browser or `open` follows to save the finished file
    pub fn file_address(&self, id: &str) -> String {
        format!("{}/downloads/{}/file", self.root, id)
    }
}
