//! Data structures for video catalogs

use serde::{Deserialize, Serialize};

/// Video metadata plus the encoding variants the backend can produce.
///
/// Immutable once fetched; a new extraction replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoCatalog {
    #[serde(rename = "url")]
    pub source_url: String,
    pub title: String,
    #[serde(rename = "thumbnail", default)]
    pub thumbnail_url: Option<String>,
    #[serde(rename = "duration", default)]
    pub duration_seconds: Option<u64>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(rename = "formats", default)]
    pub variants: Vec<Variant>,
}

/// One selectable encoding option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    #[serde(rename = "format_id")]
    pub variant_id: String,
    #[serde(rename = "ext")]
    pub container_ext: String,
    pub quality_label: String,
    #[serde(rename = "filesize_approx", default)]
    pub approx_size_bytes: Option<u64>,
    #[serde(rename = "has_video")]
    pub has_video_track: bool,
    #[serde(rename = "has_audio")]
    pub has_audio_track: bool,
    #[serde(default)]
    pub note: String,
}

impl Variant {
    pub fn is_audio_only(&self) -> bool {
        self.has_audio_track && !self.has_video_track
    }
}

/// Variants split for display. Both groups keep catalog order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatPartition<'a> {
    pub video: Vec<&'a Variant>,
    pub audio_only: Vec<&'a Variant>,
}

impl VideoCatalog {
    /// Split variants into "has video" and "audio only".
    /// Variants with neither track belong to no group.
    pub fn partition(&self) -> FormatPartition<'_> {
        let mut partition = FormatPartition::default();
        for variant in &self.variants {
            if variant.has_video_track {
                partition.video.push(variant);
            } else if variant.is_audio_only() {
                partition.audio_only.push(variant);
            }
        }
        partition
    }

    pub fn variant(&self, variant_id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.variant_id == variant_id)
    }
}
