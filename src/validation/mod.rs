// 記録バリデーションモジュール
//
// 作成フォームとCSV一括インポートの両方が同じスキーマ検査を通る。
// 失敗はフィールド単位で収集され、最初の1件で打ち切らない。

use chrono::NaiveDate;
use chrono_tz::Asia::Tokyo;
use serde::Serialize;

use crate::models::entry::{CreateEntryDto, UtilityType};

/// 金額の上限（10桁）
const MAX_AMOUNT: f64 = 9_999_999_999.0;

/// 供給者名の最大文字数
const MAX_SUPPLIER_LEN: usize = 100;

/// メモの最大文字数
const MAX_NOTES_LEN: usize = 500;

/// フィールド単位のバリデーションエラー
///
/// インポート側が行・フィールド単位でエラーを報告できるよう、
/// 対象フィールド名と人間向けメッセージを持つ。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// 記録作成DTOを検証する
///
/// # 引数
/// * `dto` - 検証対象のDTO
///
/// # 戻り値
/// 成功時はOk(())、失敗時は全フィールドのエラーのリスト
pub fn validate_create_dto(dto: &CreateEntryDto) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // 種別は固定の列挙に含まれること
    if dto.utility_type.trim().is_empty() {
        errors.push(ValidationError::new(
            "utility_type",
            "公共料金の種別を指定してください",
        ));
    } else if UtilityType::parse(&dto.utility_type).is_none() {
        errors.push(ValidationError::new(
            "utility_type",
            format!("不明な公共料金種別です: {}", dto.utility_type),
        ));
    }

    // 供給者名は必須・非空
    if dto.supplier.trim().is_empty() {
        errors.push(ValidationError::new(
            "supplier",
            "供給者名を入力してください",
        ));
    } else if dto.supplier.chars().count() > MAX_SUPPLIER_LEN {
        errors.push(ValidationError::new(
            "supplier",
            format!("供給者名は{MAX_SUPPLIER_LEN}文字以内で入力してください"),
        ));
    }

    // 検針日はYYYY-MM-DD形式の暦日
    match NaiveDate::parse_from_str(&dto.reading_date, "%Y-%m-%d") {
        Ok(reading_date) => {
            // JSTで今日の日付を取得
            let today = chrono::Utc::now().with_timezone(&Tokyo).date_naive();
            if reading_date > today {
                errors.push(ValidationError::new(
                    "reading_date",
                    "未来の日付は指定できません",
                ));
            }
        }
        Err(_) => {
            errors.push(ValidationError::new(
                "reading_date",
                "日付の形式が正しくありません（YYYY-MM-DD形式で入力してください）",
            ));
        }
    }

    // 金額は0以上の数値
    if !dto.amount.is_finite() || dto.amount < 0.0 {
        errors.push(ValidationError::new(
            "amount",
            "金額は0以上の数値である必要があります",
        ));
    } else if dto.amount > MAX_AMOUNT {
        errors.push(ValidationError::new(
            "amount",
            "金額は10桁以内で入力してください",
        ));
    }

    // 検針値は指定されている場合のみ検査
    if let Some(reading) = dto.reading {
        if !reading.is_finite() || reading < 0.0 {
            errors.push(ValidationError::new(
                "reading",
                "検針値は0以上の数値である必要があります",
            ));
        }
    }

    // メモは500文字以内
    if let Some(ref notes) = dto.notes {
        if notes.chars().count() > MAX_NOTES_LEN {
            errors.push(ValidationError::new(
                "notes",
                format!("メモは{MAX_NOTES_LEN}文字以内で入力してください"),
            ));
        }
    }

    // 支払日は指定されている場合のみ形式を検査
    if let Some(ref payment_date) = dto.payment_date {
        if NaiveDate::parse_from_str(payment_date, "%Y-%m-%d").is_err() {
            errors.push(ValidationError::new(
                "payment_date",
                "支払日の形式が正しくありません（YYYY-MM-DD形式で入力してください）",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_dto() -> CreateEntryDto {
        CreateEntryDto {
            utility_type: "electricity".to_string(),
            supplier: "東京電力".to_string(),
            reading_date: "2024-01-15".to_string(),
            reading: Some(320.5),
            unit: Some("kWh".to_string()),
            amount: 8420.0,
            notes: Some("1月分".to_string()),
            payment_date: Some("2024-01-31".to_string()),
            payment_reference: Some("PAY-202401".to_string()),
        }
    }

    #[test]
    fn test_valid_dto_passes() {
        assert!(validate_create_dto(&valid_dto()).is_ok());
    }

    #[test]
    fn test_optional_fields_may_be_absent() {
        let mut dto = valid_dto();
        dto.reading = None;
        dto.unit = None;
        dto.notes = None;
        dto.payment_date = None;
        dto.payment_reference = None;

        assert!(validate_create_dto(&dto).is_ok());
    }

    #[test]
    fn test_unknown_utility_type() {
        let mut dto = valid_dto();
        dto.utility_type = "rocket_fuel".to_string();

        let errors = validate_create_dto(&dto).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "utility_type");
    }

    #[test]
    fn test_empty_supplier() {
        let mut dto = valid_dto();
        dto.supplier = "   ".to_string();

        let errors = validate_create_dto(&dto).unwrap_err();
        assert_eq!(errors[0].field, "supplier");
    }

    #[test]
    fn test_invalid_reading_date_format() {
        let mut dto = valid_dto();
        dto.reading_date = "15/01/2024".to_string();

        let errors = validate_create_dto(&dto).unwrap_err();
        assert_eq!(errors[0].field, "reading_date");
    }

    #[test]
    fn test_future_reading_date_rejected() {
        let mut dto = valid_dto();
        dto.reading_date = "2099-01-01".to_string();

        let errors = validate_create_dto(&dto).unwrap_err();
        assert_eq!(errors[0].field, "reading_date");
        assert_eq!(errors[0].message, "未来の日付は指定できません");
    }

    #[test]
    fn test_negative_amount_rejected() {
        let mut dto = valid_dto();
        dto.amount = -1.0;

        let errors = validate_create_dto(&dto).unwrap_err();
        assert_eq!(errors[0].field, "amount");
    }

    #[test]
    fn test_zero_amount_allowed() {
        // 0円の記録（無料期間など）は許可される
        let mut dto = valid_dto();
        dto.amount = 0.0;

        assert!(validate_create_dto(&dto).is_ok());
    }

    #[test]
    fn test_amount_digit_cap() {
        let mut dto = valid_dto();
        dto.amount = 10_000_000_000.0;

        let errors = validate_create_dto(&dto).unwrap_err();
        assert_eq!(errors[0].field, "amount");
    }

    #[test]
    fn test_negative_reading_rejected() {
        let mut dto = valid_dto();
        dto.reading = Some(-5.0);

        let errors = validate_create_dto(&dto).unwrap_err();
        assert_eq!(errors[0].field, "reading");
    }

    #[test]
    fn test_notes_length_cap() {
        let mut dto = valid_dto();
        dto.notes = Some("あ".repeat(501));

        let errors = validate_create_dto(&dto).unwrap_err();
        assert_eq!(errors[0].field, "notes");
    }

    #[test]
    fn test_all_failing_fields_collected() {
        // 複数フィールドが同時に不正な場合、全件が収集される
        let dto = CreateEntryDto {
            utility_type: "rocket_fuel".to_string(),
            supplier: "".to_string(),
            reading_date: "not-a-date".to_string(),
            reading: Some(f64::NAN),
            unit: None,
            amount: -100.0,
            notes: None,
            payment_date: Some("31-01-2024".to_string()),
            payment_reference: None,
        };

        let errors = validate_create_dto(&dto).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();

        assert!(fields.contains(&"utility_type"));
        assert!(fields.contains(&"supplier"));
        assert!(fields.contains(&"reading_date"));
        assert!(fields.contains(&"reading"));
        assert!(fields.contains(&"amount"));
        assert!(fields.contains(&"payment_date"));
        assert_eq!(errors.len(), 6);
    }
}
