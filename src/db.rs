//! PostgreSQL 存储后端
//! 连接 users / auth_tokens 所在的数据库，启动时应用内置迁移

use crate::config::DatabaseConfig;
use secrecy::ExposeSecret;
use sqlx::{
    migrate::Migrator,
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use std::time::{Duration, Instant};

/// 编译期嵌入的迁移（users、auth_tokens）
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// 应用迁移后的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// 内置迁移数量
    pub available: usize,
    /// 最新的迁移版本
    pub latest_version: Option<i64>,
}

/// 解析数据库地址，只接受 postgres 方案
pub fn parse_url(url: &str) -> Result<PgConnectOptions, DbError> {
    if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
        return Err(DbError::InvalidUrl(
            "database.url must start with postgres:// or postgresql://".to_string(),
        ));
    }

    url.parse::<PgConnectOptions>()
        .map_err(|e| DbError::InvalidUrl(e.to_string()))
}

/// 连接数据库并应用迁移，返回可直接交给仓库层的连接池
pub async fn open(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    let pool = connect(config).await?;
    migrate(&pool).await?;
    Ok(pool)
}

/// 创建连接池（日志中不包含密码）
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    let options = parse_url(config.url.expose_secret())?;

    tracing::debug!(
        backend = "postgres",
        host = options.get_host(),
        port = options.get_port(),
        database = options.get_database().unwrap_or_default(),
        "Connecting to auth database"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .test_before_acquire(true)
        .connect_with(options)
        .await
        .map_err(|e| {
            tracing::error!(backend = "postgres", "Failed to connect: {}", e);
            DbError::ConnectionFailed(e.to_string())
        })?;

    tracing::info!(
        backend = "postgres",
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Auth database pool ready"
    );

    Ok(pool)
}

/// 应用内置迁移，已执行过的版本会被跳过
pub async fn migrate(pool: &PgPool) -> Result<MigrationReport, DbError> {
    let report = migration_report(&MIGRATOR);

    for migration in MIGRATOR.iter() {
        tracing::debug!(
            version = migration.version,
            description = %migration.description,
            "Known migration"
        );
    }

    MIGRATOR.run(pool).await.map_err(|e| {
        tracing::error!("Migration failed: {}", e);
        DbError::MigrationFailed(e.to_string())
    })?;

    tracing::info!(
        available = report.available,
        latest_version = ?report.latest_version,
        "Auth schema up to date"
    );
    Ok(report)
}

fn migration_report(migrator: &Migrator) -> MigrationReport {
    MigrationReport {
        available: migrator.iter().count(),
        latest_version: migrator.iter().map(|m| m.version).max(),
    }
}

/// 就绪检查：执行一次往返查询并记录耗时
pub async fn health_check(pool: &PgPool) -> HealthStatus {
    let started = Instant::now();

    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => {
            let latency_ms = started.elapsed().as_millis() as u64;
            tracing::debug!(latency_ms, "Database health check: OK");
            HealthStatus::Healthy { latency_ms }
        }
        Err(e) => {
            tracing::warn!("Database health check failed: {}", e);
            HealthStatus::Unhealthy(e.to_string())
        }
    }
}

/// 记录数据库连接池指标
pub fn record_pool_metrics(pool: &PgPool) {
    metrics::gauge!("auth_db_pool_size").set(pool.size() as f64);
    metrics::gauge!("auth_db_pool_idle").set(pool.num_idle() as f64);
}

/// 数据库错误类型
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Invalid database url: {0}")]
    InvalidUrl(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

/// 健康状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy { latency_ms: u64 },
    Unhealthy(String),
}
