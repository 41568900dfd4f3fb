//! Tests for configuration

#[cfg(test)]
mod tests {
    use super::super::config::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_scan_config_default() {
        let config = ScanConfig::default();
        assert_eq!(config.max_risk, dec!(35));
        assert_eq!(config.top_n, 25);
        assert_eq!(config.min_volume, dec!(25000));
    }

    #[test]
    fn test_monitor_config_default() {
        let config = MonitorConfig::default();
        assert_eq!(config.poll_interval_secs, 30);
        assert_eq!(config.alert_threshold_cents, dec!(1.0));
        assert_eq!(config.positions_path, "positions.json");
        assert_eq!(config.add_semantics, AddSemantics::Upsert);
    }

    #[test]
    fn test_polymarket_config_defaults() {
        let config: PolymarketConfig = toml::from_str("").unwrap();
        assert_eq!(config.gamma_url, "https://gamma-api.polymarket.com");
        assert_eq!(config.clob_url, "https://clob.polymarket.com");
        assert_eq!(config.data_api_url, "https://data-api.polymarket.com");
    }

    #[test]
    fn test_monitor_config_deserialize() {
        let toml_str = r#"
poll_interval_secs = 15
alert_threshold_cents = 0.5
positions_path = "~/lp/positions.json"
add_semantics = "strict"
"#;
        let config: MonitorConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.poll_interval_secs, 15);
        assert_eq!(config.alert_threshold_cents, dec!(0.5));
        assert_eq!(config.add_semantics, AddSemantics::Strict);
        // Tilde expands to an absolute path
        assert!(!config
            .expanded_positions_path()
            .to_string_lossy()
            .starts_with('~'));
    }

    #[test]
    fn test_scan_config_deserialize() {
        let toml_str = r#"
max_risk = 45
top_n = 10
min_volume = 10000
"#;
        let config: ScanConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.max_risk, dec!(45));
        assert_eq!(config.top_n, 10);
        assert_eq!(config.min_volume, dec!(10000));
    }

    #[test]
    fn test_telegram_config_defaults() {
        let toml_str = r#"
bot_token = "123:abc"
chat_id = "12345"
"#;
        let config: TelegramConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.bot_token, "123:abc");
        assert_eq!(config.chat_id, "12345");
        assert!(config.notify_errors);
    }

    #[test]
    fn test_telegram_config_disabled_error_notifications() {
        let toml_str = r#"
bot_token = "123:abc"
chat_id = "12345"
notify_errors = false
"#;
        let config: TelegramConfig = toml::from_str(toml_str).unwrap();
        assert!(!config.notify_errors);
    }

    #[test]
    fn test_add_semantics_rejects_unknown_value() {
        let result: Result<MonitorConfig, _> = toml::from_str(r#"add_semantics = "maybe""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_full_config_with_optional_telegram_absent() {
        let config: Config = toml::from_str(
            r#"
[scan]
top_n = 5
"#,
        )
        .unwrap();
        assert!(config.telegram.is_none());
        assert_eq!(config.scan.top_n, 5);
        assert_eq!(config.monitor.poll_interval_secs, 30);
    }
}
