// リモートストアクライアントモジュール
//
// リモートの記録テーブルに対するフルスキャン取得・upsert・削除を提供する。
// 同期エンジンはトレイト越しにこのクライアントを受け取るため、
// テストではフェイク実装に差し替えられる。

use std::future::Future;
use std::time::Duration;

use log::{info, warn};
use reqwest::{Client, Response};

use super::config::RemoteConfig;
use super::{AppError, AppResult};
use crate::models::RemoteEntryRecord;

/// リモートストアの操作契約
///
/// 記録テーブルはIDをキーとし、検針日降順のフルスキャン、
/// insert-or-replace（保存された行を返す）、ID指定削除、全件削除を持つ。
pub trait RemoteStore {
    /// 全記録を検針日降順で取得する
    fn fetch_all(&self) -> impl Future<Output = AppResult<Vec<RemoteEntryRecord>>> + Send;

    /// 記録をID一致でinsert-or-replaceし、保存された行を返す
    fn upsert(
        &self,
        record: RemoteEntryRecord,
    ) -> impl Future<Output = AppResult<RemoteEntryRecord>> + Send;

    /// 記録をID指定で削除する
    fn delete(&self, id: &str) -> impl Future<Output = AppResult<()>> + Send;

    /// 全記録を削除する
    fn delete_all(&self) -> impl Future<Output = AppResult<()>> + Send;
}

/// HTTP JSON APIに対するリモートストアクライアント
pub struct HttpRemoteStore {
    client: Client,
    config: RemoteConfig,
}

impl HttpRemoteStore {
    /// クライアントを初期化する
    ///
    /// # 引数
    /// * `config` - リモートストア設定
    ///
    /// # 戻り値
    /// クライアント、または失敗時はエラー
    pub fn new(config: RemoteConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::configuration(format!("HTTPクライアント初期化失敗: {e}"))
            })?;

        Ok(Self { client, config })
    }

    /// APIキーが設定されていれば認証ヘッダーを付与する
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(ref key) = self.config.api_key {
            request.header("Authorization", format!("Bearer {key}"))
        } else {
            request
        }
    }

    /// リトライ機能付きでリクエストを送信する
    ///
    /// 接続エラーは指数バックオフで再試行し、HTTPエラーステータスは
    /// 即座にエラーとして返す。
    async fn send_with_retry(
        &self,
        request: reqwest::RequestBuilder,
        method: &str,
        url: &str,
    ) -> AppResult<Response> {
        let mut attempts = 0;
        loop {
            let cloned = request.try_clone().ok_or_else(|| {
                AppError::remote_unavailable("リクエストのクローンに失敗しました")
            })?;

            match cloned.send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        info!("{method}リクエスト成功: url={url}");
                        return Ok(response);
                    }
                    return Err(Self::status_error(response).await);
                }
                Err(e) => {
                    if attempts < self.config.max_retries {
                        attempts += 1;
                        // 指数バックオフ（2^attempts秒待機）
                        let delay = Duration::from_secs(2_u64.pow(attempts));
                        warn!(
                            "リクエスト失敗、リトライします: attempt={attempts}/{}, delay={delay:?}",
                            self.config.max_retries
                        );
                        tokio::time::sleep(delay).await;
                    } else {
                        return Err(AppError::remote_unavailable(format!(
                            "リモートストアへの接続に失敗しました: {e}"
                        )));
                    }
                }
            }
        }
    }

    /// HTTPエラーステータスをエラー型に変換する
    async fn status_error(response: Response) -> AppError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "レスポンス読み取り失敗".to_string());

        let message = match status {
            400 => "リクエストの形式が正しくありません",
            401 => "認証に失敗しました",
            403 => "この操作を実行する権限がありません",
            404 => "指定されたリソースが見つかりません",
            429 => "リクエストが多すぎます",
            500 => "サーバー内部エラーが発生しました",
            502 | 503 | 504 => "サーバーが一時的に利用できません",
            _ => "不明なエラーが発生しました",
        };

        warn!("リモートストアからエラーレスポンス: status={status}, body={body}");

        AppError::remote_unavailable(format!("{message} (status={status})"))
    }
}

impl RemoteStore for HttpRemoteStore {
    async fn fetch_all(&self) -> AppResult<Vec<RemoteEntryRecord>> {
        let url = self.config.entries_url();
        let request = self
            .authorize(self.client.get(&url))
            .query(&[("order", "readingdate.desc")]);

        let response = self.send_with_retry(request, "GET", &url).await?;
        let records: Vec<RemoteEntryRecord> = response.json().await.map_err(|e| {
            AppError::remote_unavailable(format!("レスポンス解析エラー: {e}"))
        })?;

        Ok(records)
    }

    async fn upsert(&self, record: RemoteEntryRecord) -> AppResult<RemoteEntryRecord> {
        let url = self.config.entries_url();
        let request = self.authorize(self.client.post(&url)).json(&record);

        let response = self.send_with_retry(request, "POST", &url).await?;
        let stored: RemoteEntryRecord = response.json().await.map_err(|e| {
            AppError::remote_unavailable(format!("レスポンス解析エラー: {e}"))
        })?;

        Ok(stored)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let url = self.config.entry_url(id);
        let request = self.authorize(self.client.delete(&url));

        self.send_with_retry(request, "DELETE", &url).await?;
        Ok(())
    }

    async fn delete_all(&self) -> AppResult<()> {
        let url = self.config.entries_url();
        let request = self.authorize(self.client.delete(&url));

        self.send_with_retry(request, "DELETE", &url).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_construction() {
        let config = RemoteConfig {
            base_url: "https://api.example.com".to_string(),
            api_key: Some("test_key".to_string()),
            timeout_seconds: 5,
            max_retries: 0,
        };

        assert!(HttpRemoteStore::new(config).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_yields_remote_unavailable() {
        // 到達不能なホストへの接続は即座にRemoteUnavailableになる
        let config = RemoteConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            api_key: None,
            timeout_seconds: 1,
            max_retries: 0,
        };

        let store = HttpRemoteStore::new(config).unwrap();
        let result = store.fetch_all().await;
        assert!(matches!(result, Err(AppError::RemoteUnavailable(_))));
    }
}
