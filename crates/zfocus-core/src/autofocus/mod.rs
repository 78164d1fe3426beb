pub mod config;
pub mod controller;
pub mod display;
pub mod types;

pub use config::{AutofocusConfig, DeviceTimeouts, SearchStrategy};
pub use controller::Autofocus;
pub use display::BackgroundDisplay;
pub use types::{
    CancelToken, Evaluation, FocusOutcome, FocusStage, NoOpReporter, ProgressReporter,
    StrategyReport,
};
