// 同期エンジンモジュール
//
// 読み書きの向き先（リモートストア／ローカルキャッシュ）を決定し、
// リモートに到達しなかった書き込みを未同期セットとして追跡し、
// 接続回復時に保留分をリモートへ流し込む。

use std::sync::Arc;

use chrono::Utc;
use chrono_tz::Asia::Tokyo;
use log::{error, info, warn};
use tokio::task::JoinHandle;

use super::network_monitor::{NetworkMonitor, NetworkStatus};
use super::remote_store::RemoteStore;
use super::AppResult;
use crate::db::EntryCache;
use crate::models::{from_remote, generate_local_id, is_local_id, to_remote, Entry};

/// JSTの現在時刻をRFC3339文字列で取得する
fn now_jst() -> String {
    Utc::now().with_timezone(&Tokyo).to_rfc3339()
}

/// 同期エンジン
///
/// 接続モニター・リモートストア・ローカルキャッシュへの参照を保持し、
/// プロセスごとに1度構築して利用側へ明示的に渡す。
pub struct SyncService<R: RemoteStore> {
    remote: R,
    cache: Arc<EntryCache>,
    monitor: Arc<NetworkMonitor>,
}

impl<R: RemoteStore> SyncService<R> {
    /// 同期エンジンを構築する
    pub fn new(remote: R, cache: Arc<EntryCache>, monitor: Arc<NetworkMonitor>) -> Self {
        Self {
            remote,
            cache,
            monitor,
        }
    }

    /// 接続モニターへの参照を取得する
    pub fn monitor(&self) -> &Arc<NetworkMonitor> {
        &self.monitor
    }

    /// 全記録を取得する
    ///
    /// オンライン時はリモートから検針日降順で全件取得し、結果を
    /// キャッシュへ丸ごとミラーリングして返す。リモートエラー時
    /// またはオフライン時はキャッシュの内容をそのまま返す。
    ///
    /// 注意: リモート取得成功時、キャッシュはマージなしで上書きされる。
    /// 未同期文書は上書きの対象外なので、保留中の記録が失われることはない。
    pub async fn get_entries(&self) -> Vec<Entry> {
        if self.monitor.is_online() {
            match self.remote.fetch_all().await {
                Ok(records) => {
                    let entries: Vec<Entry> = records.into_iter().map(from_remote).collect();
                    if let Err(e) = self.cache.replace_all(&entries) {
                        error!("キャッシュのミラーリングに失敗しました: {e}");
                    }
                    return entries;
                }
                Err(e) => {
                    warn!("リモート取得に失敗したためキャッシュを返します: {e}");
                }
            }
        }

        self.cache.read_all()
    }

    /// 記録を保存する
    ///
    /// updated_atを現在時刻に更新し、created_atは未設定の場合のみ設定する。
    /// オンライン時はリモートへupsertし、成功すればサーバー確定版を
    /// キャッシュへミラーリングして返す。リモート失敗時・オフライン時は
    /// ローカル保存にフォールバックする。
    ///
    /// # 引数
    /// * `entry` - 保存する記録（新規の場合はID未割り当て）
    ///
    /// # 戻り値
    /// 保存後の記録（永続化に失敗した場合もメモリ上の状態として返す）
    pub async fn save_entry(&self, mut entry: Entry) -> Entry {
        let now = now_jst();
        entry.updated_at = Some(now.clone());
        // 作成時刻は初回保存時のみ設定し、編集時は保持する
        if entry.created_at.is_none() {
            entry.created_at = Some(now);
        }

        if self.monitor.is_online() {
            let previous_id = entry.id.clone();

            match self.remote.upsert(to_remote(&entry)).await {
                Ok(stored) => {
                    let confirmed = from_remote(stored);

                    // ローカル仮IDからサーバーIDに変わった場合は旧レコードを除去
                    if let Some(ref old_id) = previous_id {
                        if confirmed.id.as_deref() != Some(old_id.as_str()) {
                            if let Err(e) = self.cache.remove(old_id) {
                                error!("旧IDレコードの削除に失敗しました: {e}");
                            }
                        }
                        if let Err(e) = self.cache.remove_unsynced(old_id) {
                            error!("保留コピーの削除に失敗しました: {e}");
                        }
                    }
                    // 同期が成功した時点で保留コピーは不要になる
                    if let Some(ref new_id) = confirmed.id {
                        if let Err(e) = self.cache.remove_unsynced(new_id) {
                            error!("保留コピーの削除に失敗しました: {e}");
                        }
                    }

                    if let Err(e) = self.cache.upsert(&confirmed) {
                        error!("確定記録のミラーリングに失敗しました: {e}");
                    }

                    return confirmed;
                }
                Err(e) => {
                    warn!("リモート保存に失敗したためローカル保存にフォールバックします: {e}");
                }
            }
        }

        self.save_local_entry(entry)
    }

    /// 記録をローカルのみに保存する
    ///
    /// ID未割り当ての場合はローカル専用IDを生成する。リモートに到達して
    /// いない書き込みは定義上未同期なので、syncedをfalseにして
    /// キャッシュと未同期セットの両方へupsertする。
    pub fn save_local_entry(&self, mut entry: Entry) -> Entry {
        let now = now_jst();
        if entry.id.is_none() {
            entry.id = Some(generate_local_id());
            entry.created_at = Some(now.clone());
        }
        entry.updated_at = Some(now);
        entry.synced = false;

        if let Err(e) = self.cache.upsert(&entry) {
            error!("ローカル保存に失敗しました: {e}");
        }
        if let Err(e) = self.cache.upsert_unsynced(&entry) {
            error!("未同期セットへの記録に失敗しました: {e}");
        }

        entry
    }

    /// 記録を削除する
    ///
    /// オンラインかつサーバー発行IDの場合はまずリモート削除を行い、
    /// 失敗したら操作全体を中断する（リモートに残っているのに成功と
    /// 報告しないため）。ローカル仮IDはリモートに存在しないため
    /// リモート呼び出しをスキップする。
    ///
    /// # 引数
    /// * `id` - 削除する記録のID
    ///
    /// # 戻り値
    /// 成功時はOk(())、中断時はエラー
    pub async fn delete_entry(&self, id: &str) -> AppResult<()> {
        if self.monitor.is_online() && !is_local_id(id) {
            self.remote.delete(id).await?;
        }

        self.cache.remove(id)?;
        self.cache.remove_unsynced(id)?;

        Ok(())
    }

    /// 全記録を削除する
    ///
    /// オンライン時はリモートの全件削除を先に行い、失敗したら
    /// ローカルに触れず中断する。成功時またはオフライン時は
    /// キャッシュと未同期セットを完全に消去する。
    pub async fn delete_all_entries(&self) -> AppResult<()> {
        if self.monitor.is_online() {
            self.remote.delete_all().await?;
        }

        self.cache.clear_all()?;

        Ok(())
    }

    /// 未同期の記録一覧を取得する
    pub fn get_unsynced_entries(&self) -> Vec<Entry> {
        self.cache.read_unsynced()
    }

    /// 未同期の記録をリモートへ同期する
    ///
    /// オフライン時・保留なしの場合は何もせず0を返す。保留分は1件ずつ
    /// 順番に処理する（共有キャッシュ文書への書き込みを直列化するため）。
    /// 1件の失敗はバッチ全体を中断せず、その記録を保留のまま残す。
    ///
    /// # 戻り値
    /// 同期に成功した件数
    pub async fn sync_unsynced_entries(&self) -> usize {
        if !self.monitor.is_online() {
            return 0;
        }

        let pending = self.cache.read_unsynced();
        if pending.is_empty() {
            return 0;
        }

        info!("未同期記録の同期を開始します: {}件", pending.len());
        let mut synced_count = 0;

        for entry in pending {
            let Some(original_id) = entry.id.clone() else {
                warn!("IDのない未同期記録をスキップします");
                continue;
            };

            let mut candidate = entry;
            // ローカル仮IDを取り除き、リモートに新しいIDを発行させる
            if is_local_id(&original_id) {
                candidate.id = None;
            }
            candidate.synced = true;

            match self.remote.upsert(to_remote(&candidate)).await {
                Ok(stored) => {
                    let confirmed = from_remote(stored);

                    if let Err(e) = self.cache.remove_unsynced(&original_id) {
                        error!("保留コピーの削除に失敗しました: {e}");
                    }
                    if let Err(e) = self.cache.remove(&original_id) {
                        error!("旧IDレコードの削除に失敗しました: {e}");
                    }
                    if let Err(e) = self.cache.upsert(&confirmed) {
                        error!("確定記録のミラーリングに失敗しました: {e}");
                    }

                    synced_count += 1;
                }
                Err(e) => {
                    // 失敗した記録は保留のまま残し、次の記録の処理を続ける
                    warn!("記録の同期に失敗しました: id={original_id}, error={e}");
                }
            }
        }

        info!("未同期記録の同期が完了しました: {synced_count}件");
        synced_count
    }
}

/// 接続回復リスナーのハンドル
///
/// ドロップまたはstop()でリスナータスクを停止する。
pub struct AutoSyncHandle {
    handle: JoinHandle<()>,
}

impl AutoSyncHandle {
    /// リスナーを停止する
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for AutoSyncHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// 接続回復時の自動同期リスナーを起動する
///
/// オフライン→オンラインの遷移ごとに1回だけsync_unsynced_entriesを
/// 実行し、同期件数をログに出す（件数は通知表示用であり、制御には
/// 使用しない）。
///
/// # 引数
/// * `service` - 同期エンジン
///
/// # 戻り値
/// リスナーのハンドル
pub fn start_auto_sync<R>(service: Arc<SyncService<R>>) -> AutoSyncHandle
where
    R: RemoteStore + Send + Sync + 'static,
{
    let mut rx = service.monitor.subscribe();
    let mut previous = *rx.borrow();

    let handle = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let current = *rx.borrow();

            if current == NetworkStatus::Online && previous != NetworkStatus::Online {
                let count = service.sync_unsynced_entries().await;
                if count > 0 {
                    info!("接続回復により{count}件の記録を同期しました");
                }
            }

            previous = current;
        }
    });

    AutoSyncHandle { handle }
}
