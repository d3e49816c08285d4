#[cfg(test)]
mod tests {

    use crate::core::AppConfig;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.server_url, "http://127.0.0.1:5001");
        assert_eq!(config.hover_rate, 1.5);
        assert_eq!(config.hover_leave_delay_ms, 50);
        assert_eq!(config.document_reload_delay_ms, 10);
        assert!(config.persist_session);
        assert_eq!(config.default_zoom, 1.0);
    }

    #[test]
    fn test_app_config_serialization() {
        let mut config = AppConfig::default();
        config.server_url = "http://192.168.0.5:8080".to_string();
        config.hover_rate = 2.0;
        config.persist_session = false;

        let serialized = serde_json::to_string(&config).expect("Failed to serialize config");
        let deserialized: AppConfig =
            serde_json::from_str(&serialized).expect("Failed to deserialize config");

        assert_eq!(config.server_url, deserialized.server_url);
        assert_eq!(config.hover_rate, deserialized.hover_rate);
        assert_eq!(config.persist_session, deserialized.persist_session);
    }

    #[test]
    fn test_malformed_config_fails_parsing() {
        // The loader treats a parse failure as "rewrite with defaults", so a
        // config from a broken edit must actually fail to parse.
        let result = serde_json::from_str::<AppConfig>("{\"server_url\": 42}");
        assert!(result.is_err());
    }
}
