mod geometry;
mod projection;
mod renderer;
mod transition;

pub use projection::{natural_earth, natural_earth_inverse, Viewport};
pub use renderer::{fill_for, CountryShape, MapRaster, MapRenderer};
pub use transition::{ease_cubic_in_out, FillTransition, FILL_TRANSITION};
