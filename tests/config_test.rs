//! Tests for configuration parsing and scheduler construction.

use keyed_task_queue::builders::build_scheduler;
use keyed_task_queue::config::{AppConfig, SchedulerConfig};
use keyed_task_queue::core::{SchedulerError, SleepExecutor};
use keyed_task_queue::runtime::TokioSpawner;

#[test]
fn test_config_from_json() {
    let json = r#"{
        "scheduler": { "max_concurrency": 3 },
        "server": { "host": "127.0.0.1", "port": 9090, "worker_threads": 2 }
    }"#;

    let config = AppConfig::from_json_str(json).unwrap();
    assert_eq!(config.scheduler.max_concurrency, 3);
    assert_eq!(config.server.bind_addr(), "127.0.0.1:9090");
}

#[test]
fn test_partial_json_uses_defaults() {
    let config = AppConfig::from_json_str(r#"{ "scheduler": { "max_concurrency": 1 } }"#).unwrap();
    assert_eq!(config.scheduler.max_concurrency, 1);
    assert_eq!(config.server.port, 8080);
}

#[test]
fn test_invalid_json_config() {
    assert!(AppConfig::from_json_str("{").is_err());
    assert!(AppConfig::from_json_str(r#"{ "scheduler": { "max_concurrency": 0 } }"#).is_err());
    assert!(AppConfig::from_json_str(r#"{ "server": { "worker_threads": 0 } }"#).is_err());
}

#[tokio::test]
async fn test_build_scheduler_from_config() {
    let cfg = SchedulerConfig { max_concurrency: 2 };
    let scheduler = build_scheduler(&cfg, SleepExecutor, TokioSpawner::current(), None).unwrap();
    assert_eq!(scheduler.max_concurrency().get(), 2);
}

#[tokio::test]
async fn test_build_scheduler_rejects_zero_capacity() {
    let cfg = SchedulerConfig { max_concurrency: 0 };
    let err = build_scheduler(&cfg, SleepExecutor, TokioSpawner::current(), None)
        .err()
        .unwrap();
    assert!(matches!(err, SchedulerError::InvalidConfig(_)));
    assert_eq!(err.to_string(), "invalid config: max_concurrency must be greater than 0");
}
