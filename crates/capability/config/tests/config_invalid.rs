use gridwatch_config::{AppConfig, ConfigError};

// 独立二进制且合并为单个测试：环境变量是进程级共享状态，
// 不能让多个用例并发读写。
#[test]
fn rejects_bad_or_missing_env() {
    unsafe {
        std::env::set_var("GRIDWATCH_DATABASE_URL", "postgresql://gridwatch@localhost/gw");
        std::env::set_var("GRIDWATCH_BOT_TOKEN", "bot-token");
        std::env::set_var("GRIDWATCH_CHAT_ID", "chat-1");
        std::env::set_var("GRIDWATCH_DEVICE_SECRET", "secret-1");
        std::env::set_var("GRIDWATCH_OUTAGE_THRESHOLD_MS", "not-a-number");
    }
    let err = AppConfig::from_env().expect_err("invalid threshold");
    assert!(matches!(err, ConfigError::Invalid(key, _) if key == "GRIDWATCH_OUTAGE_THRESHOLD_MS"));

    unsafe {
        std::env::set_var("GRIDWATCH_OUTAGE_THRESHOLD_MS", "0");
    }
    let err = AppConfig::from_env().expect_err("zero threshold");
    assert!(matches!(err, ConfigError::Invalid(key, _) if key == "GRIDWATCH_OUTAGE_THRESHOLD_MS"));

    unsafe {
        std::env::remove_var("GRIDWATCH_OUTAGE_THRESHOLD_MS");
        std::env::remove_var("GRIDWATCH_BOT_TOKEN");
    }
    let err = AppConfig::from_env().expect_err("missing bot token");
    assert!(matches!(err, ConfigError::Missing(key) if key == "GRIDWATCH_BOT_TOKEN"));
}
