use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_resolve_to_memory_cache_and_uk_region() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.backend, CacheBackendKind::Memory);
    assert_eq!(settings.cache.key_prefix, "labmyshare");
    assert_eq!(settings.cache.default_timeout, Duration::from_secs(3600));
    assert_eq!(settings.cache.region_timeout, Duration::from_secs(3600));
    assert_eq!(settings.regions.default_region.as_deref(), Some("UK"));
    assert!(settings.database.url.is_none());
}

#[test]
fn cache_settings_defaults_match_cache_config_defaults() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
    let converted = CacheConfig::from(&settings.cache);
    let defaults = CacheConfig::default();

    assert_eq!(converted.enabled, defaults.enabled);
    assert_eq!(converted.backend, defaults.backend);
    assert_eq!(converted.redis_url, defaults.redis_url);
    assert_eq!(converted.key_prefix, defaults.key_prefix);
    assert_eq!(converted.default_timeout, defaults.default_timeout);
    assert_eq!(converted.region_timeout, defaults.region_timeout);
    assert_eq!(converted.memory_capacity, defaults.memory_capacity);
}

#[test]
fn empty_default_region_disables_fallback() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        default_region: Some("  ".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.regions.default_region.is_none());
}

#[test]
fn default_region_is_upper_cased() {
    let mut raw = RawSettings::default();
    raw.regions.default_region = Some("uae".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.regions.default_region.as_deref(), Some("UAE"));
}

#[test]
fn endpoint_overrides_are_carried_through() {
    let mut raw = RawSettings::default();
    raw.cache.endpoints.insert(
        "ProfessionalListView".to_string(),
        RawEndpointSettings {
            timeout_seconds: Some(7200),
            key_prefix: Some("professionals".to_string()),
        },
    );

    let settings = Settings::from_raw(raw).expect("valid settings");
    let endpoint = settings
        .cache
        .endpoints
        .get("ProfessionalListView")
        .expect("endpoint present");
    assert_eq!(endpoint.timeout, Some(Duration::from_secs(7200)));
    assert_eq!(endpoint.key_prefix.as_deref(), Some("professionals"));
}

#[test]
fn zero_timeout_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.default_timeout_seconds = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero timeout");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.default_timeout_seconds",
            ..
        }
    ));
}

#[test]
fn unknown_backend_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.backend = Some("memcached".to_string());

    let err = Settings::from_raw(raw).expect_err("unknown backend");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.backend",
            ..
        }
    ));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["labmyshare"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "labmyshare",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-url",
        "postgres://override",
        "--cache-backend",
        "redis",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.database_url.as_deref(),
                Some("postgres://override")
            );
            assert_eq!(serve.overrides.cache.cache_backend.as_deref(), Some("redis"));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_purge_cache_arguments() {
    let args = CliArgs::parse_from([
        "labmyshare",
        "purge-cache",
        "--cache-redis-url",
        "redis://cache:6379/2",
        "ServiceListView:UK",
    ]);

    match args.command.expect("purge-cache command") {
        Command::PurgeCache(purge) => {
            assert_eq!(purge.pattern, "ServiceListView:UK");
            assert_eq!(
                purge.cache.cache_redis_url.as_deref(),
                Some("redis://cache:6379/2")
            );
        }
        _ => panic!("wrong command parsed"),
    }
}
