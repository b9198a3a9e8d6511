//! Converts IES LM-63 photometric data into grayscale light cookie textures.

pub mod error;
pub mod generator;
pub mod math;
pub mod parser;
pub mod processing;
pub mod types;
pub mod vtf_writer;

pub use error::{IesError, Result};
pub use processing::generate_cookie;
pub use types::{CookieSettings, CookieTexture, Normalization, PhotometricTable, PhotometricType};
