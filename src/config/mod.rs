mod settings;

pub use settings::{
    AutoPublishConfig, LogConfig, OtelConfig, ServerConfig, Settings, SimulatorConfig,
};
