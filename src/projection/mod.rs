pub mod converter;

pub use converter::CoordinateConverter;
