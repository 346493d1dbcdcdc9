// リモートストアとのデータ変換モジュール
//
// リモートストアのカラム名は小文字連結（readingdateなど）で、
// アプリケーション側のフィールド名と異なる。この変換だけを担う
// 純粋関数をここに集め、ネットワーク・ストレージへのアクセスは行わない。

use serde::{Deserialize, Serialize};

use crate::models::entry::{Entry, UtilityType};

/// リモートストアの行データ
///
/// ワイヤー上のスキーマをそのまま型として表現する。
/// 想定外の形のレスポンスはデシリアライズ時点で拒否される。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteEntryRecord {
    pub id: Option<String>,
    pub utilitytype: String,
    pub supplier: String,
    pub readingdate: String,
    pub reading: Option<f64>,
    pub unit: Option<String>,
    pub amount: f64,
    pub notes: Option<String>,
    pub paymentdate: Option<String>,
    pub paymentreference: Option<String>,
    pub createdat: Option<String>,
    pub updatedat: Option<String>,
}

/// 記録をリモートストアの行データに変換する
///
/// # 引数
/// * `entry` - アプリケーション側の記録
///
/// # 戻り値
/// リモートストアのカラム名に合わせた行データ
pub fn to_remote(entry: &Entry) -> RemoteEntryRecord {
    RemoteEntryRecord {
        id: entry.id.clone(),
        utilitytype: entry.utility_type.as_str().to_string(),
        supplier: entry.supplier.clone(),
        readingdate: entry.reading_date.clone(),
        reading: entry.reading,
        unit: entry.unit.clone(),
        amount: entry.amount,
        notes: entry.notes.clone(),
        paymentdate: entry.payment_date.clone(),
        paymentreference: entry.payment_reference.clone(),
        createdat: entry.created_at.clone(),
        updatedat: entry.updated_at.clone(),
    }
}

/// リモートストアの行データを記録に変換する
///
/// リモートから取得した・リモートへ書き込めたデータは定義上同期済み
/// なので、syncedは常にtrueになる。未知の種別文字列はOtherに落とす
/// （この関数は全域関数であり、失敗しない）。
///
/// # 引数
/// * `record` - リモートストアの行データ
///
/// # 戻り値
/// アプリケーション側の記録（synced = true）
pub fn from_remote(record: RemoteEntryRecord) -> Entry {
    let utility_type =
        UtilityType::parse(&record.utilitytype).unwrap_or(UtilityType::Other);

    Entry {
        id: record.id,
        utility_type,
        supplier: record.supplier,
        reading_date: record.readingdate,
        reading: record.reading,
        unit: record.unit,
        amount: record.amount,
        notes: record.notes,
        payment_date: record.paymentdate,
        payment_reference: record.paymentreference,
        created_at: record.createdat,
        updated_at: record.updatedat,
        synced: true,
    }
}
