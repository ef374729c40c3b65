use std::time::Duration;

use switchyard::config::{DEFAULT_JOB_QUEUE_CAPACITY, DEFAULT_SEND_TIMEOUT, DEFAULT_TICK_INTERVAL};
use switchyard::{DispatchConfig, LoopConfig, PoolConfig, SetupError, TickMode};

#[test]
fn test_dispatch_config_defaults() {
    let config = DispatchConfig::default();

    assert_eq!(config.default_pool_size, num_cpus::get());
    assert_eq!(config.default_job_capacity, DEFAULT_JOB_QUEUE_CAPACITY);
    assert_eq!(config.default_result_capacity, 0);
    assert_eq!(config.default_mailbox_capacity, 0);
    assert_eq!(config.default_tick_interval, Some(DEFAULT_TICK_INTERVAL));
    assert_eq!(config.default_tick_mode, TickMode::Idle);
    assert_eq!(config.default_send_timeout, Some(DEFAULT_SEND_TIMEOUT));
    assert_eq!(config.default_output_capacity, 0);
    assert!(!config.default_blocking_processors);
    assert!(config.validate().is_ok());
}

#[test]
fn test_component_config_defaults() {
    let loop_config = LoopConfig::default();
    assert!(loop_config.mailbox_capacity.is_none());
    assert!(loop_config.tick_interval.is_none());
    assert!(loop_config.tick_mode.is_none());
    assert!(loop_config.send_timeout.is_none());

    let pool_config = PoolConfig::default();
    assert!(pool_config.workers.is_none());
    assert!(pool_config.job_capacity.is_none());
    assert!(pool_config.result_capacity.is_none());
    assert!(pool_config.blocking.is_none());
}

#[test]
fn test_merge_keeps_explicit_values() {
    let system = DispatchConfig {
        default_mailbox_capacity: 16,
        ..Default::default()
    };

    let merged = system.merge_with_loop_config(&LoopConfig::default().without_tick());
    assert_eq!(merged.mailbox_capacity, Some(16));
    assert_eq!(merged.tick_interval, Some(None));
    assert_eq!(merged.tick_mode, Some(TickMode::Idle));
    assert_eq!(merged.send_timeout, Some(Some(DEFAULT_SEND_TIMEOUT)));

    let merged = system.merge_with_pool_config(&PoolConfig::with_workers(3).result_capacity(2));
    assert_eq!(merged.workers, Some(3));
    assert_eq!(merged.job_capacity, Some(DEFAULT_JOB_QUEUE_CAPACITY));
    assert_eq!(merged.result_capacity, Some(2));
    assert_eq!(merged.blocking, Some(false));
}

#[test]
fn test_validate_rejects_zero_values() {
    let zero_pool = DispatchConfig {
        default_pool_size: 0,
        ..Default::default()
    };
    assert!(matches!(zero_pool.validate(), Err(SetupError::InvalidConfig(_))));

    let zero_tick = DispatchConfig {
        default_tick_interval: Some(Duration::ZERO),
        ..Default::default()
    };
    assert!(matches!(zero_tick.validate(), Err(SetupError::InvalidConfig(_))));

    let no_tick = DispatchConfig {
        default_tick_interval: None,
        ..Default::default()
    };
    assert!(no_tick.validate().is_ok());
}

#[test]
fn test_config_debug_format() {
    assert!(format!("{:?}", DispatchConfig::default()).contains("default_pool_size"));
    assert!(format!("{:?}", PoolConfig::with_workers(2)).contains("workers"));
}
