pub mod state;

pub use state::{DeviceState, Indicators, Mode};
