//! CLI surface tests against the public crate API.

use custos::cli::commands;

#[test]
fn help_lists_store_arguments() {
    let mut command = commands::new();
    let help = command.render_long_help().to_string();
    assert!(help.contains("--dsn"));
    assert!(help.contains("--redis-url"));
    assert!(help.contains("--jwt-secret"));
    assert!(help.contains("--blacklist-ttl-seconds"));
    assert!(help.contains("--reset-outbox-poll-seconds"));
}

#[test]
fn defaults_are_applied_without_env() {
    temp_env::with_vars_unset(
        [
            "CUSTOS_PORT",
            "CUSTOS_ACCESS_TOKEN_TTL_MINUTES",
            "CUSTOS_REFRESH_TOKEN_TTL_DAYS",
            "CUSTOS_BLACKLIST_TTL_SECONDS",
        ],
        || {
            let command = commands::new();
            let matches = command.get_matches_from(vec![
                "custos",
                "--dsn",
                "postgres://localhost:5432/custos",
                "--redis-url",
                "redis://localhost:6379/0",
                "--jwt-secret",
                "0123456789abcdef0123456789abcdef",
            ]);

            assert_eq!(matches.get_one::<u16>("port").copied(), Some(8080));
            assert_eq!(
                matches.get_one::<i64>("access-token-ttl-minutes").copied(),
                Some(15)
            );
            assert_eq!(
                matches.get_one::<i64>("refresh-token-ttl-days").copied(),
                Some(7)
            );
            assert_eq!(
                matches.get_one::<u64>("blacklist-ttl-seconds").copied(),
                Some(3600)
            );
        },
    );
}

#[test]
fn env_overrides_defaults() {
    temp_env::with_vars(
        [
            ("CUSTOS_PORT", Some("9090")),
            ("CUSTOS_BLACKLIST_TTL_SECONDS", Some("600")),
        ],
        || {
            let command = commands::new();
            let matches = command.get_matches_from(vec![
                "custos",
                "--dsn",
                "postgres://localhost:5432/custos",
                "--redis-url",
                "redis://localhost:6379/0",
                "--jwt-secret",
                "0123456789abcdef0123456789abcdef",
            ]);

            assert_eq!(matches.get_one::<u16>("port").copied(), Some(9090));
            assert_eq!(
                matches.get_one::<u64>("blacklist-ttl-seconds").copied(),
                Some(600)
            );
        },
    );
}
