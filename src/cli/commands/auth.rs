use clap::{Arg, Command};

pub const ARG_JWT_SECRET: &str = "jwt-secret";

pub fn with_args(command: Command) -> Command {
    let command = with_token_args(command);
    let command = with_session_args(command);
    with_reset_outbox_args(command)
}

fn with_token_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("Secret used to sign access tokens (HS256)")
                .env("CUSTOS_JWT_SECRET")
                .required(true),
        )
        .arg(
            Arg::new("access-token-ttl-minutes")
                .long("access-token-ttl-minutes")
                .help("Access token lifetime in minutes")
                .env("CUSTOS_ACCESS_TOKEN_TTL_MINUTES")
                .default_value("15")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("refresh-token-ttl-days")
                .long("refresh-token-ttl-days")
                .help("Refresh token lifetime in days")
                .env("CUSTOS_REFRESH_TOKEN_TTL_DAYS")
                .default_value("7")
                .value_parser(clap::value_parser!(i64)),
        )
}

fn with_session_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("blacklist-ttl-seconds")
                .long("blacklist-ttl-seconds")
                .help("Grace window during which a rotated refresh token is remembered")
                .env("CUSTOS_BLACKLIST_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("store-timeout-seconds")
                .long("store-timeout-seconds")
                .help("Per-operation timeout for session store calls")
                .env("CUSTOS_STORE_TIMEOUT_SECONDS")
                .default_value("5")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("frontend-base-url")
                .long("frontend-base-url")
                .help("Frontend base URL used for password-reset links and CORS")
                .env("CUSTOS_FRONTEND_BASE_URL")
                .default_value("https://custos.dev"),
        )
}

fn with_reset_outbox_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("reset-outbox-poll-seconds")
                .long("reset-outbox-poll-seconds")
                .help("Reset outbox poll interval in seconds")
                .env("CUSTOS_RESET_OUTBOX_POLL_SECONDS")
                .default_value("5")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("reset-outbox-batch-size")
                .long("reset-outbox-batch-size")
                .help("Reset outbox batch size per poll")
                .env("CUSTOS_RESET_OUTBOX_BATCH_SIZE")
                .default_value("10")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("reset-outbox-max-attempts")
                .long("reset-outbox-max-attempts")
                .help("Max attempts before marking a reset message as failed")
                .env("CUSTOS_RESET_OUTBOX_MAX_ATTEMPTS")
                .default_value("5")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("reset-outbox-backoff-base-seconds")
                .long("reset-outbox-backoff-base-seconds")
                .help("Base delay for reset outbox retry backoff")
                .env("CUSTOS_RESET_OUTBOX_BACKOFF_BASE_SECONDS")
                .default_value("5")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("reset-outbox-backoff-max-seconds")
                .long("reset-outbox-backoff-max-seconds")
                .help("Max delay for reset outbox retry backoff")
                .env("CUSTOS_RESET_OUTBOX_BACKOFF_MAX_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(u64)),
        )
}
