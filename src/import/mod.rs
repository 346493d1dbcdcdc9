// CSV一括インポートモジュール
//
// テキストを行単位で解析し、各行を記録作成DTOとして検証する。
// エラーは行・フィールド単位で収集され、1行の失敗がバッチ全体を
// 中断することはない。

use serde::Serialize;

use crate::models::CreateEntryDto;
use crate::services::remote_store::RemoteStore;
use crate::services::sync_service::SyncService;
use crate::validation::{validate_create_dto, ValidationError};

/// 期待されるCSVの列数
const COLUMN_COUNT: usize = 9;

/// 行単位のインポートエラー
#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    /// 1始まりの行番号
    pub row: usize,
    pub errors: Vec<ValidationError>,
}

/// 検証を通過した1行
#[derive(Debug)]
pub struct CsvRow {
    pub row: usize,
    pub dto: CreateEntryDto,
}

/// CSV解析の結果
#[derive(Debug)]
pub struct CsvParseResult {
    pub valid: Vec<CsvRow>,
    pub errors: Vec<RowError>,
}

/// インポート実行の結果
#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub saved: usize,
    pub errors: Vec<RowError>,
}

/// CSVテキストを解析し、各行を検証する
///
/// 期待する列順:
/// `utility_type,supplier,reading_date,reading,unit,amount,notes,payment_date,payment_reference`
///
/// 先頭行が列名そのものの場合はヘッダーとしてスキップする。
/// 空行は無視する。
///
/// # 引数
/// * `text` - CSVテキスト
///
/// # 戻り値
/// 検証を通過した行と、行・フィールド単位のエラーのリスト
pub fn parse_csv(text: &str) -> CsvParseResult {
    let mut valid = Vec::new();
    let mut errors = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let row = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let fields = split_csv_line(line);

        // ヘッダー行はスキップ
        if row == 1 && fields.first().map(|f| f == "utility_type").unwrap_or(false) {
            continue;
        }

        if fields.len() != COLUMN_COUNT {
            errors.push(RowError {
                row,
                errors: vec![ValidationError {
                    field: "row".to_string(),
                    message: format!(
                        "列数が正しくありません（{}列、期待値{COLUMN_COUNT}列）",
                        fields.len()
                    ),
                }],
            });
            continue;
        }

        // 数値フィールドの解析エラーもフィールド単位で報告する
        let mut field_errors = Vec::new();

        let amount = if fields[5].is_empty() {
            field_errors.push(ValidationError {
                field: "amount".to_string(),
                message: "金額を入力してください".to_string(),
            });
            None
        } else {
            match fields[5].parse::<f64>() {
                Ok(v) => Some(v),
                Err(_) => {
                    field_errors.push(ValidationError {
                        field: "amount".to_string(),
                        message: "金額は数値で入力してください".to_string(),
                    });
                    None
                }
            }
        };

        let reading = if fields[3].is_empty() {
            None
        } else {
            match fields[3].parse::<f64>() {
                Ok(v) => Some(v),
                Err(_) => {
                    field_errors.push(ValidationError {
                        field: "reading".to_string(),
                        message: "検針値は数値で入力してください".to_string(),
                    });
                    None
                }
            }
        };

        if !field_errors.is_empty() {
            errors.push(RowError {
                row,
                errors: field_errors,
            });
            continue;
        }

        let dto = CreateEntryDto {
            utility_type: fields[0].clone(),
            supplier: fields[1].clone(),
            reading_date: fields[2].clone(),
            reading,
            unit: optional(&fields[4]),
            amount: amount.unwrap_or(0.0),
            notes: optional(&fields[6]),
            payment_date: optional(&fields[7]),
            payment_reference: optional(&fields[8]),
        };

        match validate_create_dto(&dto) {
            Ok(()) => valid.push(CsvRow { row, dto }),
            Err(validation_errors) => errors.push(RowError {
                row,
                errors: validation_errors,
            }),
        }
    }

    CsvParseResult { valid, errors }
}

/// CSVテキストを解析し、検証を通過した行を1件ずつ保存する
///
/// 各行は独立して保存され、不正な行があっても残りの行の保存は続行する。
///
/// # 引数
/// * `service` - 同期エンジン
/// * `text` - CSVテキスト
///
/// # 戻り値
/// 保存件数と行単位のエラーのリスト
pub async fn import_csv<R: RemoteStore>(
    service: &SyncService<R>,
    text: &str,
) -> ImportSummary {
    let parsed = parse_csv(text);
    let mut saved = 0;

    for row in parsed.valid {
        match row.dto.into_entry() {
            Some(entry) => {
                service.save_entry(entry).await;
                saved += 1;
            }
            None => {
                // 検証済みなので通常は到達しない
                log::warn!("検証済みの行の変換に失敗しました: row={}", row.row);
            }
        }
    }

    if !parsed.errors.is_empty() {
        log::warn!(
            "CSVインポートで{}行がエラーになりました（{saved}行保存）",
            parsed.errors.len()
        );
    }

    ImportSummary {
        saved,
        errors: parsed.errors,
    }
}

/// 空文字列をNoneとして扱う
fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// ダブルクォート対応の1行分割
///
/// クォート内のカンマは区切りとして扱わず、二重クォートは
/// エスケープされたクォート1文字として扱う。
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
    }

    fields.push(current.trim().to_string());
    fields
}
