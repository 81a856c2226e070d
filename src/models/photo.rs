//! Identity photo uploads.

use serde::{Deserialize, Serialize};

/// Which side of the national ID a photo shows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PhotoSlot {
    Front,
    Back,
}

impl PhotoSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoSlot::Front => "front",
            PhotoSlot::Back => "back",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "front" => Some(PhotoSlot::Front),
            "back" => Some(PhotoSlot::Back),
            _ => None,
        }
    }
}

impl std::fmt::Display for PhotoSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file picked by the user, held in memory until uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Response body of a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadedPhoto {
    pub url: String,
}
