//! Price-series indicators shared by selectors, signals and analysis.

pub mod rolling_max;
pub mod swings;

pub use rolling_max::{high_point_days, RollingMax};
pub use swings::{swing_sections, turning_points, SwingSection, TurnKind, TurningPoint};
