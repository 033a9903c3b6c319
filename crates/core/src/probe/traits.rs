//! Trait definitions for the media prober.

use async_trait::async_trait;
use std::path::Path;

use super::error::ProbeError;
use super::types::MediaInfo;

/// Something that can inspect a media file.
#[async_trait]
pub trait MediaProber: Send + Sync {
    /// Returns the name of this prober implementation.
    fn name(&self) -> &str;

    /// Probes a media file. Idempotent for an unchanged file.
    async fn probe(&self, path: &Path) -> Result<MediaInfo, ProbeError>;
}
