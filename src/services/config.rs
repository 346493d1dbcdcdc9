// リモートストア設定管理モジュール

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::env;

use super::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
    pub max_retries: u32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8787".to_string(),
            api_key: None,
            timeout_seconds: 30,
            max_retries: 3,
        }
    }
}

impl RemoteConfig {
    /// 環境変数から設定を読み込む
    ///
    /// # 戻り値
    /// 設定、または失敗時はエラー
    ///
    /// # 取得順序
    /// 1. 起動時の環境変数（`std::env::var`）
    /// 2. コンパイル時の埋め込み環境変数（`option_env!`マクロ）
    /// 3. どちらも見つからない場合はエラー（REMOTE_API_URLのみ必須）
    pub fn from_env() -> AppResult<Self> {
        info!("リモートストア設定を環境変数から読み込み中...");

        let base_url = env::var("REMOTE_API_URL")
            .ok()
            .or_else(|| option_env!("EMBEDDED_REMOTE_API_URL").map(|v| v.to_string()))
            .ok_or_else(|| {
                AppError::configuration("REMOTE_API_URLが設定されていません".to_string())
            })?;

        let api_key = env::var("REMOTE_API_KEY")
            .ok()
            .or_else(|| option_env!("EMBEDDED_REMOTE_API_KEY").map(|v| v.to_string()));

        let timeout_seconds = env::var("REMOTE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        let max_retries = env::var("REMOTE_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);

        let config = Self {
            base_url,
            api_key,
            timeout_seconds,
            max_retries,
        };

        info!("リモートストア設定の読み込みが完了しました");
        debug!(
            "設定詳細: base_url={}, timeout={}s, max_retries={}",
            config.base_url, config.timeout_seconds, config.max_retries
        );

        Ok(config)
    }

    /// 設定の検証
    pub fn validate(&self) -> AppResult<()> {
        if self.base_url.is_empty() {
            return Err(AppError::configuration("ベースURLが空です"));
        }

        // URLとして解析できることを確認
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| AppError::configuration(format!("ベースURLが不正です: {e}")))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(AppError::configuration(format!(
                "ベースURLのスキームが不正です: {}",
                parsed.scheme()
            )));
        }

        if self.api_key.is_none() {
            warn!("APIキーが設定されていません。認証なしで接続します");
        }

        Ok(())
    }

    /// 記録コレクションのエンドポイントURLを生成する
    pub fn entries_url(&self) -> String {
        format!("{}/entries", self.base_url.trim_end_matches('/'))
    }

    /// 個別記録のエンドポイントURLを生成する
    pub fn entry_url(&self, id: &str) -> String {
        format!("{}/{id}", self.entries_url())
    }
}
