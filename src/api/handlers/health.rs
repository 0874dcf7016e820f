use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use sqlx::{Connection, PgPool};
use tracing::{error, info_span, Instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    message: String,
}

#[utoipa::path(
    get,
    path = "/healthcheck",
    responses(
        (status = 200, description = "Both stores are reachable", body = Health),
        (status = 503, description = "Database or session store is unhealthy", body = Health),
    ),
    tag = "health"
)]
pub async fn health(
    pool: Extension<PgPool>,
    redis: Extension<ConnectionManager>,
) -> impl IntoResponse {
    let database = match pool.0.acquire().await {
        Ok(mut conn) => {
            let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
            match conn.ping().instrument(ping_span).await {
                Ok(()) => true,
                Err(error) => {
                    error!("Failed to ping database: {}", error);
                    false
                }
            }
        }
        Err(error) => {
            error!("Failed to acquire database connection: {}", error);
            false
        }
    };

    let mut conn = redis.0.clone();
    let sessions = match redis::cmd("PING")
        .query_async::<String>(&mut conn)
        .await
    {
        Ok(_) => true,
        Err(error) => {
            error!("Failed to ping session store: {}", error);
            false
        }
    };

    if database && sessions {
        (
            StatusCode::OK,
            Json(Health {
                message: "ok".to_string(),
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(Health {
                message: "unavailable".to_string(),
            }),
        )
    }
}
