pub mod poi;

pub use poi::{pois_from_json, Category, CategoryStyle, Poi, PoiId};
