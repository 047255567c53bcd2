use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::geo::LatLng;

/// Stable identifier of a point of interest
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoiId(pub String);

impl PoiId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PoiId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PoiId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for PoiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attraction categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Nature,
    History,
    Culture,
    Recreation,
    Gastronomy,
    Religion,
    Viewpoint,
    #[default]
    Other,
}

/// Visual attributes of a category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryStyle {
    /// RGBA accent color
    pub color: [u8; 4],
    pub symbol: &'static str,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Nature,
        Category::History,
        Category::Culture,
        Category::Recreation,
        Category::Gastronomy,
        Category::Religion,
        Category::Viewpoint,
        Category::Other,
    ];

    pub fn style(self) -> CategoryStyle {
        let (color, symbol) = match self {
            Category::Nature => ([76, 175, 80, 255], "🌲"),
            Category::History => ([121, 85, 72, 255], "🏛"),
            Category::Culture => ([156, 39, 176, 255], "🎭"),
            Category::Recreation => ([3, 169, 244, 255], "🏞"),
            Category::Gastronomy => ([255, 152, 0, 255], "🍽"),
            Category::Religion => ([255, 193, 7, 255], "⛪"),
            Category::Viewpoint => ([0, 150, 136, 255], "🔭"),
            Category::Other => ([96, 125, 139, 255], "📍"),
        };
        CategoryStyle { color, symbol }
    }
}

/// A point of interest as supplied by the application's data layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub id: PoiId,
    pub position: LatLng,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub photo_urls: Vec<String>,
}

impl Poi {
    pub fn new(id: impl Into<PoiId>, position: LatLng) -> Self {
        Self {
            id: id.into(),
            position,
            name: String::new(),
            category: Category::Other,
            photo_urls: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_photo(mut self, url: impl Into<String>) -> Self {
        self.photo_urls.push(url.into());
        self
    }

    /// The photo used for the marker, if any. Blank URLs do not count.
    pub fn first_photo(&self) -> Option<&str> {
        self.photo_urls
            .first()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
    }
}

/// Parses a JSON array of POIs
pub fn pois_from_json(json: &str) -> crate::Result<Vec<Poi>> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_has_a_distinct_color() {
        let colors: std::collections::HashSet<_> =
            Category::ALL.iter().map(|c| c.style().color).collect();
        assert_eq!(colors.len(), Category::ALL.len());
        assert!(Category::ALL.iter().all(|c| c.style().color[3] == 255));
    }

    #[test]
    fn test_first_photo_skips_blank_urls() {
        let poi = Poi::new("lago-naki", LatLng::new(44.09, 40.02));
        assert_eq!(poi.first_photo(), None);

        let poi = poi.clone().with_photo("  ");
        assert_eq!(poi.first_photo(), None);

        let poi = Poi::new("lago-naki", LatLng::new(44.09, 40.02))
            .with_photo("https://example.org/naki.jpg")
            .with_photo("https://example.org/naki-2.jpg");
        assert_eq!(poi.first_photo(), Some("https://example.org/naki.jpg"));
    }

    #[test]
    fn test_pois_from_json() {
        let json = r#"[
            { "id": "khadzhokh", "position": { "lat": 44.3083, "lng": 40.1794 },
              "name": "Khadzhokh Gorge", "category": "nature",
              "photo_urls": ["https://example.org/k.jpg"] },
            { "id": "dolmen", "position": { "lat": 44.2, "lng": 40.1 } }
        ]"#;
        let pois = pois_from_json(json).unwrap();

        assert_eq!(pois.len(), 2);
        assert_eq!(pois[0].id, PoiId::from("khadzhokh"));
        assert_eq!(pois[0].category, Category::Nature);
        assert_eq!(pois[1].category, Category::Other);
        assert!(pois[1].photo_urls.is_empty());
    }
}
