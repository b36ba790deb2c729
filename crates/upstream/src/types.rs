//! Track payloads exchanged with the music API.
//!
//! The core treats these as opaque: it only forwards them into the
//! recommendation result.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub name: String,
    /// Largest first
    #[serde(default)]
    pub images: Vec<Image>,
}

/// A recommendable track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album: Album,
    pub preview_url: Option<String>,
    /// Link to the track on the provider's site
    pub url: Option<String>,
    pub explicit: bool,
}

impl Track {
    /// The album's first (largest) image
    pub fn cover_art(&self) -> Option<&str> {
        self.album.images.first().map(|image| image.url.as_str())
    }

    /// "Artist A, Artist B"
    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
}

/// A seed track resolved with its artists' genre tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedTrack {
    pub id: String,
    pub name: String,
    pub artists: Vec<ArtistRef>,
    /// Raw genre tags, de-duplicated, in artist order
    pub genres: Vec<String>,
    pub cover_art: Option<String>,
}

impl SeedTrack {
    pub fn artist_names(&self) -> impl Iterator<Item = &str> {
        self.artists.iter().map(|artist| artist.name.as_str())
    }
}
