use crate::services::{AppError, AppResult};
use rusqlite::Connection;
use std::path::Path;

/// キャッシュ用データベース接続を開き、マイグレーションを実行する
///
/// # 引数
/// * `database_path` - データベースファイルのパス
///
/// # 戻り値
/// データベース接続、または失敗時はエラー
pub fn open_cache_database(database_path: &Path) -> AppResult<Connection> {
    let conn = Connection::open(database_path)
        .map_err(|e| AppError::storage_unavailable(format!("データベースのオープンに失敗: {e}")))?;

    super::migrations::run_migrations(&conn)
        .map_err(|e| AppError::storage_unavailable(format!("マイグレーションの実行に失敗: {e}")))?;

    log::info!("キャッシュデータベースを初期化しました: {:?}", database_path);

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_cache_database() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test_cache.db");

        // 接続が開けることを確認
        let conn = open_cache_database(&db_path).unwrap();

        // マイグレーション済みであることを確認
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='kv_store'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);

        // ファイルが作成されていることを確認
        assert!(db_path.exists());
    }
}
