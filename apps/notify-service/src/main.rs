//! # Notify Service サーバー
//!
//! 外部の評価ワークフローからのイベントをメール通知に変換して配信する。
//!
//! ## 起動手順
//!
//! 1. `.env` と環境変数から設定を読み込む
//! 2. トレーシングを初期化する
//! 3. SQLite の接続プールを作成し、マイグレーションを適用する
//! 4. 送信バックエンドとメトリクスのレコーダーを用意し、ルーターを組み立てる
//! 5. Ctrl-C / SIGTERM でグレースフルシャットダウンし、プールを閉じる

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;
use bcimail_domain::clock::SystemClock;
use bcimail_infra::{
    db,
    repository::{SqliteCustomerRepository, SqliteEmailLogRepository},
};
use bcimail_notify_service::{
    app_builder::{AppDependencies, build_app, build_sender},
    config::ServiceConfig,
    usecase::DispatchMetrics,
};
use bcimail_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let tracing_config = TracingConfig::from_env("notify-service");
    init_tracing(&tracing_config);
    let _tracing_guard = tracing::info_span!("app", service = "notify-service").entered();

    let config = ServiceConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        environment = %config.environment,
        notification = ?config.notification,
        "Notify Service を起動します: {}:{}",
        config.host,
        config.port
    );

    if let Some(file) = config.database_file() {
        let parent = file.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("DB ディレクトリを作成できません: {}", parent.display())
            })?;
        }
    }

    let pool = db::create_pool(&config.database_url)
        .await
        .context("データベースへの接続に失敗しました")?;
    db::run_migrations(&pool)
        .await
        .context("マイグレーションの実行に失敗しました")?;
    tracing::info!("データベースに接続しました: {}", config.database_url);

    let sender = build_sender(&config.notification).await?;

    let metrics = DispatchMetrics::new();
    metrics.install()?;

    let app = build_app(
        &config,
        AppDependencies {
            pool:       pool.clone(),
            customers:  Arc::new(SqliteCustomerRepository::new(pool.clone())),
            email_logs: Arc::new(SqliteEmailLogRepository::new(pool.clone())),
            sender,
            clock:      Arc::new(SystemClock),
            metrics,
        },
    )?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("バインドアドレスが不正です")?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Notify Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Notify Service サーバーを停止しました");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.ok();
    };
    #[cfg(unix)]
    let term = async {
        if let Ok(mut s) = signal::unix::signal(signal::unix::SignalKind::terminate()) {
            s.recv().await;
        }
    };
    #[cfg(not(unix))]
    let term = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = term => {},
    }
    tracing::info!("シャットダウンシグナルを受信しました");
}
