// ローカルキャッシュストアモジュール
//
// キャッシュ媒体は全文書単位の読み書きしか持たないため、
// 1件の更新でもコレクション全体を読み出して書き戻す。
// 書き戻しは単一のINSERT OR REPLACEで行われる。

use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use crate::models::Entry;
use crate::services::{AppError, AppResult};

/// 記録コレクション全体を保持する固定キー
pub const KEY_ENTRIES: &str = "entries";

/// 未同期サブセットを保持する固定キー
pub const KEY_UNSYNCED: &str = "unsynced_entries";

/// ローカルキャッシュストア
///
/// 記録コレクションと未同期セットの2文書を保持する。
/// プロセス全体で1つの接続を共有する。
pub struct EntryCache {
    conn: Mutex<Connection>,
}

impl EntryCache {
    /// キャッシュストアを初期化する
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// インメモリのキャッシュストアを作成する（テスト用）
    #[cfg(test)]
    pub fn open_in_memory() -> Self {
        let conn = Connection::open_in_memory().unwrap();
        super::migrations::run_migrations(&conn).unwrap();
        Self::new(conn)
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| AppError::storage_unavailable(format!("キャッシュロックエラー: {e}")))
    }

    /// 指定キーの文書を読み出す
    fn read_document(conn: &Connection, key: &str) -> AppResult<Vec<Entry>> {
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match value {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// 指定キーの文書を丸ごと書き戻す
    fn write_document(conn: &Connection, key: &str, entries: &[Entry]) -> AppResult<()> {
        let json = serde_json::to_string(entries)?;
        conn.execute(
            "INSERT OR REPLACE INTO kv_store (key, value) VALUES (?1, ?2)",
            params![key, json],
        )?;
        Ok(())
    }

    /// ID一致で置換、なければ末尾に追加する
    fn upsert_into(conn: &Connection, key: &str, entry: &Entry) -> AppResult<()> {
        let id = entry
            .id
            .as_deref()
            .ok_or_else(|| AppError::validation("IDのない記録はキャッシュに保存できません"))?;

        let mut entries = Self::read_document(conn, key)?;
        if let Some(existing) = entries.iter_mut().find(|e| e.id.as_deref() == Some(id)) {
            *existing = entry.clone();
        } else {
            entries.push(entry.clone());
        }

        Self::write_document(conn, key, &entries)
    }

    /// ID一致の記録を取り除く（存在しない場合は何もしない）
    fn remove_from(conn: &Connection, key: &str, id: &str) -> AppResult<()> {
        let mut entries = Self::read_document(conn, key)?;
        let before = entries.len();
        entries.retain(|e| e.id.as_deref() != Some(id));

        if entries.len() == before {
            return Ok(());
        }

        Self::write_document(conn, key, &entries)
    }

    /// 記録コレクション全体を読み出す
    ///
    /// 媒体が利用できない・文書が壊れている場合は、エラーを送出せず
    /// 空のリストを返す（呼び出し側はオフライン起動時も動作を続ける）。
    pub fn read_all(&self) -> Vec<Entry> {
        match self.lock().and_then(|conn| Self::read_document(&conn, KEY_ENTRIES)) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("キャッシュの読み出しに失敗したため空リストを返します: {e}");
                Vec::new()
            }
        }
    }

    /// 記録をコレクション文書にupsertする
    ///
    /// # 引数
    /// * `entry` - ID割り当て済みの記録
    ///
    /// # 戻り値
    /// 成功時はOk(())、失敗時はエラー（呼び出し側で報告する）
    pub fn upsert(&self, entry: &Entry) -> AppResult<()> {
        let conn = self.lock()?;
        Self::upsert_into(&conn, KEY_ENTRIES, entry)
    }

    /// 記録をコレクション文書から削除する
    pub fn remove(&self, id: &str) -> AppResult<()> {
        let conn = self.lock()?;
        Self::remove_from(&conn, KEY_ENTRIES, id)
    }

    /// コレクション文書を丸ごと置き換える
    ///
    /// リモート取得成功時のミラーリングに使用する。未同期文書には触れない。
    pub fn replace_all(&self, entries: &[Entry]) -> AppResult<()> {
        let conn = self.lock()?;
        Self::write_document(&conn, KEY_ENTRIES, entries)
    }

    /// 未同期セットを読み出す
    ///
    /// 読み出し失敗時は空のリストを返す。
    pub fn read_unsynced(&self) -> Vec<Entry> {
        match self.lock().and_then(|conn| Self::read_document(&conn, KEY_UNSYNCED)) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("未同期セットの読み出しに失敗したため空リストを返します: {e}");
                Vec::new()
            }
        }
    }

    /// 記録を未同期文書にupsertする（同一IDの保留コピーは置き換え）
    pub fn upsert_unsynced(&self, entry: &Entry) -> AppResult<()> {
        let conn = self.lock()?;
        Self::upsert_into(&conn, KEY_UNSYNCED, entry)
    }

    /// 記録を未同期文書から削除する
    pub fn remove_unsynced(&self, id: &str) -> AppResult<()> {
        let conn = self.lock()?;
        Self::remove_from(&conn, KEY_UNSYNCED, id)
    }

    /// 両文書を完全に消去する
    pub fn clear_all(&self) -> AppResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM kv_store WHERE key IN (?1, ?2)",
            params![KEY_ENTRIES, KEY_UNSYNCED],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entry::UtilityType;

    fn sample_entry(id: &str) -> Entry {
        Entry {
            id: Some(id.to_string()),
            utility_type: UtilityType::Water,
            supplier: "水道局".to_string(),
            reading_date: "2024-02-01".to_string(),
            reading: Some(14.2),
            unit: Some("m3".to_string()),
            amount: 2800.0,
            notes: None,
            payment_date: None,
            payment_reference: None,
            created_at: Some("2024-02-01T09:00:00+09:00".to_string()),
            updated_at: Some("2024-02-01T09:00:00+09:00".to_string()),
            synced: false,
        }
    }

    #[test]
    fn test_read_all_empty() {
        let cache = EntryCache::open_in_memory();
        assert!(cache.read_all().is_empty());
        assert!(cache.read_unsynced().is_empty());
    }

    #[test]
    fn test_upsert_is_idempotent_by_id() {
        let cache = EntryCache::open_in_memory();

        let mut entry = sample_entry("a-1");
        cache.upsert(&entry).unwrap();

        // 同じIDで2回upsertしても1件のまま、フィールドは最終書き込みが勝つ
        entry.amount = 3000.0;
        cache.upsert(&entry).unwrap();

        let all = cache.read_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].amount, 3000.0);
    }

    #[test]
    fn test_upsert_appends_new_ids_in_order() {
        let cache = EntryCache::open_in_memory();
        cache.upsert(&sample_entry("a-1")).unwrap();
        cache.upsert(&sample_entry("a-2")).unwrap();
        cache.upsert(&sample_entry("a-3")).unwrap();

        // 永続化順が保存される
        let ids: Vec<String> = cache
            .read_all()
            .into_iter()
            .map(|e| e.id.unwrap())
            .collect();
        assert_eq!(ids, vec!["a-1", "a-2", "a-3"]);
    }

    #[test]
    fn test_upsert_requires_id() {
        let cache = EntryCache::open_in_memory();
        let mut entry = sample_entry("a-1");
        entry.id = None;

        assert!(matches!(
            cache.upsert(&entry),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_remove_is_noop_when_absent() {
        let cache = EntryCache::open_in_memory();
        cache.upsert(&sample_entry("a-1")).unwrap();

        // 存在しないIDの削除は成功扱い
        cache.remove("no-such-id").unwrap();
        assert_eq!(cache.read_all().len(), 1);

        cache.remove("a-1").unwrap();
        assert!(cache.read_all().is_empty());
    }

    #[test]
    fn test_unsynced_document_is_independent() {
        let cache = EntryCache::open_in_memory();
        cache.upsert(&sample_entry("a-1")).unwrap();
        cache.upsert_unsynced(&sample_entry("a-1")).unwrap();

        // コレクション文書の置き換えは未同期文書に影響しない
        cache.replace_all(&[sample_entry("b-1")]).unwrap();
        assert_eq!(cache.read_all().len(), 1);
        assert_eq!(cache.read_unsynced().len(), 1);

        cache.remove_unsynced("a-1").unwrap();
        assert!(cache.read_unsynced().is_empty());
        assert_eq!(cache.read_all().len(), 1);
    }

    #[test]
    fn test_clear_all_removes_both_documents() {
        let cache = EntryCache::open_in_memory();
        cache.upsert(&sample_entry("a-1")).unwrap();
        cache.upsert_unsynced(&sample_entry("a-2")).unwrap();

        cache.clear_all().unwrap();
        assert!(cache.read_all().is_empty());
        assert!(cache.read_unsynced().is_empty());
    }

    #[test]
    fn test_corrupted_document_reads_as_empty() {
        let cache = EntryCache::open_in_memory();

        // 文書を直接破壊する
        {
            let conn = cache.conn.lock().unwrap();
            conn.execute(
                "INSERT OR REPLACE INTO kv_store (key, value) VALUES (?1, ?2)",
                params![KEY_ENTRIES, "{{not json"],
            )
            .unwrap();
        }

        // 読み出しはエラーを送出せず空リストを返す
        assert!(cache.read_all().is_empty());
    }
}
