//! Subscriber installation. Runs in its own process because it sets the
//! global default subscriber.

use sdrplay_binding::{
    config::{BindingConfig, LoggingConfig},
    logging::{self, OutputFormat},
};

#[test]
fn test_init_is_idempotent() {
    let config = BindingConfig::default();
    assert!(logging::init_from_config(&config).is_ok());

    let json = LoggingConfig {
        level: "debug".to_string(),
        format: OutputFormat::Json,
    };
    assert!(logging::init(&json).is_ok());

    tracing::info!("Logging initialised twice");
}
