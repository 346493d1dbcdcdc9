pub mod config;
pub mod db;
pub mod import;
pub mod models;
pub mod services;
pub mod validation;

use std::sync::Arc;

use log::{error, info, warn};

pub use db::EntryCache;
pub use models::{CreateEntryDto, Entry, UtilityType};
pub use services::config::RemoteConfig;
pub use services::network_monitor::{NetworkMonitor, NetworkStatus};
pub use services::remote_store::{HttpRemoteStore, RemoteStore};
pub use services::sync_service::{start_auto_sync, AutoSyncHandle, SyncService};
pub use services::{AppError, AppResult};
pub use validation::{validate_create_dto, ValidationError};

/// アプリケーションを初期化し、同期エンジンを構築する
///
/// # 戻り値
/// 同期エンジン、または失敗時はエラーメッセージ
///
/// # 処理内容
/// 1. ログシステムの初期化
/// 2. 環境変数の読み込みとリモートストア設定の検証
/// 3. キャッシュデータベースの初期化
/// 4. 同期エンジンの構築（接続状態はUnknownから開始し、
///    ホスト側がset_statusで報告する）
pub fn initialize() -> Result<Arc<SyncService<HttpRemoteStore>>, String> {
    // ログシステムを初期化
    initialize_logging_system();

    info!("アプリケーション初期化を開始します...");

    // 環境変数を読み込み（.envファイルがある場合）
    if dotenv::dotenv().is_err() {
        // .envファイルがない場合は無視（本番環境では環境変数が直接設定される）
        warn!(".envファイルが見つかりません。環境変数が直接設定されていることを確認してください。");
    } else {
        info!(".envファイルを読み込みました");
    }

    // リモートストア設定の読み込みと検証
    let remote_config = RemoteConfig::from_env().map_err(|e| {
        error!("リモートストア設定の読み込みに失敗しました: {}", e.details());
        String::from(e)
    })?;

    remote_config.validate().map_err(|e| {
        error!("リモートストア設定の検証に失敗しました: {}", e.details());
        String::from(e)
    })?;

    // アプリ起動時にキャッシュデータベースを初期化
    info!("キャッシュデータベースを初期化しています...");
    let init_result = config::initialize_application()?;

    let conn = db::open_cache_database(&init_result.database_path).map_err(|e| {
        error!("データベースの初期化に失敗しました: {}", e.details());
        String::from(e)
    })?;

    config::log_initialization_complete(&init_result);

    let cache = Arc::new(EntryCache::new(conn));
    let monitor = Arc::new(NetworkMonitor::new(NetworkStatus::Unknown));
    let remote = HttpRemoteStore::new(remote_config).map_err(String::from)?;

    info!("アプリケーション初期化が完了しました");

    Ok(Arc::new(SyncService::new(remote, cache, monitor)))
}

/// ログシステムを初期化
fn initialize_logging_system() {
    // ログレベルを設定
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    };

    // env_loggerを初期化
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp_secs()
        .format_module_path(false)
        .format_target(false)
        .init();

    info!("ログシステムを初期化しました: level={log_level}");
}
