pub mod bundle;
pub mod psychro;
pub mod wy3;

pub use bundle::{run_conversion, ConvertOptions, ConvertReport};
pub use psychro::psat_water_vapour;
pub use wy3::Wy3Converter;
