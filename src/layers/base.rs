use crate::core::geo::{LatLng, Point};
use crate::data::poi::PoiId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Native placemarks drawn by the map surface
    Visual,
    /// Transparent hit targets drawn by the UI side
    Interactive,
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerKind::Visual => write!(f, "visual"),
            LayerKind::Interactive => write!(f, "interactive"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayerProperties {
    pub id: String,
    pub name: String,
    pub kind: LayerKind,
    pub z_index: i32,
    pub visible: bool,
    pub interactive: bool,
}

impl LayerProperties {
    pub fn new(id: String, name: String, kind: LayerKind) -> Self {
        Self {
            id,
            name,
            kind,
            z_index: 0,
            visible: true,
            interactive: kind == LayerKind::Interactive,
        }
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }
}

/// A tap that landed on a marker
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerTap {
    pub poi: PoiId,
    /// Geographic position of the marker
    pub position: LatLng,
    /// Where the tap landed, in screen pixels
    pub at: Point,
}

/// Common surface of the two overlay layers
pub trait OverlayLayer {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn kind(&self) -> LayerKind;

    fn z_index(&self) -> i32;

    fn set_z_index(&mut self, z_index: i32);

    fn is_visible(&self) -> bool;

    fn set_visible(&mut self, visible: bool);

    fn is_interactive(&self) -> bool;

    /// Whether taps are offered to this layer at all
    fn receives_input(&self) -> bool {
        self.is_visible() && self.is_interactive()
    }

    /// Marker under `point`, if this layer handles taps
    fn hit_test(&self, _point: &Point) -> Option<MarkerTap> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_properties() {
        let props = LayerProperties::new("hits".to_string(), "Hit targets".to_string(), LayerKind::Interactive)
            .with_z_index(i32::MAX);

        assert_eq!(props.id, "hits");
        assert_eq!(props.kind, LayerKind::Interactive);
        assert_eq!(props.z_index, i32::MAX);
        assert!(props.visible);
        assert!(props.interactive);

        let visual = LayerProperties::new("pins".to_string(), "Pins".to_string(), LayerKind::Visual);
        assert!(!visual.interactive);
    }

    #[test]
    fn test_layer_kind_display() {
        assert_eq!(LayerKind::Visual.to_string(), "visual");
        assert_eq!(LayerKind::Interactive.to_string(), "interactive");
    }
}
