mod chart;
pub mod styles;


pub use chart::{language_chart_svg, MAX_BARS};
