mod progress;

pub use progress::{clear_active_bar, set_active_bar, BarProgress, ProgressWriterFactory};
