use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ローカル専用IDの予約プレフィックス
///
/// オフライン時に生成されるIDはこのプレフィックスを持ち、
/// サーバー発行のIDと衝突しないことが保証される。
pub const LOCAL_ID_PREFIX: &str = "local-";

/// 公共料金の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilityType {
    Electricity,
    Water,
    Gas,
    Internet,
    Heat,
    HotWater,
    ColdWater,
    Phone,
    HousingService,
    Renovation,
    Loan,
    Interest,
    Insurance,
    Waste,
    Other,
}

impl UtilityType {
    /// 種別を文字列表現に変換する
    pub fn as_str(&self) -> &'static str {
        match self {
            UtilityType::Electricity => "electricity",
            UtilityType::Water => "water",
            UtilityType::Gas => "gas",
            UtilityType::Internet => "internet",
            UtilityType::Heat => "heat",
            UtilityType::HotWater => "hot_water",
            UtilityType::ColdWater => "cold_water",
            UtilityType::Phone => "phone",
            UtilityType::HousingService => "housing_service",
            UtilityType::Renovation => "renovation",
            UtilityType::Loan => "loan",
            UtilityType::Interest => "interest",
            UtilityType::Insurance => "insurance",
            UtilityType::Waste => "waste",
            UtilityType::Other => "other",
        }
    }

    /// 文字列から種別を解析する
    ///
    /// # 引数
    /// * `s` - 種別文字列（snake_case）
    ///
    /// # 戻り値
    /// 該当する種別、未知の文字列の場合はNone
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "electricity" => Some(UtilityType::Electricity),
            "water" => Some(UtilityType::Water),
            "gas" => Some(UtilityType::Gas),
            "internet" => Some(UtilityType::Internet),
            "heat" => Some(UtilityType::Heat),
            "hot_water" => Some(UtilityType::HotWater),
            "cold_water" => Some(UtilityType::ColdWater),
            "phone" => Some(UtilityType::Phone),
            "housing_service" => Some(UtilityType::HousingService),
            "renovation" => Some(UtilityType::Renovation),
            "loan" => Some(UtilityType::Loan),
            "interest" => Some(UtilityType::Interest),
            "insurance" => Some(UtilityType::Insurance),
            "waste" => Some(UtilityType::Waste),
            "other" => Some(UtilityType::Other),
            _ => None,
        }
    }

    /// 全種別の一覧
    pub fn all() -> &'static [UtilityType] {
        &[
            UtilityType::Electricity,
            UtilityType::Water,
            UtilityType::Gas,
            UtilityType::Internet,
            UtilityType::Heat,
            UtilityType::HotWater,
            UtilityType::ColdWater,
            UtilityType::Phone,
            UtilityType::HousingService,
            UtilityType::Renovation,
            UtilityType::Loan,
            UtilityType::Interest,
            UtilityType::Insurance,
            UtilityType::Waste,
            UtilityType::Other,
        ]
    }
}

impl std::fmt::Display for UtilityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 記録データモデル
///
/// 1件の検針値・支払い記録を表す。IDは新規作成時はNoneで、
/// リモート保存成功時にサーバー発行ID、オフライン保存時に
/// ローカル専用IDが割り当てられる。
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Entry {
    pub id: Option<String>,
    pub utility_type: UtilityType,
    pub supplier: String,
    pub reading_date: String,
    pub reading: Option<f64>,
    pub unit: Option<String>,
    pub amount: f64,
    pub notes: Option<String>,
    pub payment_date: Option<String>,
    pub payment_reference: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub synced: bool,
}

impl Entry {
    /// 記録がローカル専用IDを持つかどうかを判定する
    pub fn has_local_id(&self) -> bool {
        self.id.as_deref().map(is_local_id).unwrap_or(false)
    }
}

/// 記録作成用DTO
///
/// フォーム入力およびCSVインポートの1行分。種別は文字列のまま受け取り、
/// バリデーション通過後にEntryへ変換する。
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEntryDto {
    pub utility_type: String,
    pub supplier: String,
    pub reading_date: String,
    pub reading: Option<f64>,
    pub unit: Option<String>,
    pub amount: f64,
    pub notes: Option<String>,
    pub payment_date: Option<String>,
    pub payment_reference: Option<String>,
}

impl CreateEntryDto {
    /// バリデーション済みDTOから新規記録を作成する
    ///
    /// # 戻り値
    /// ID・タイムスタンプ未割り当ての記録、種別が未知の場合はNone
    pub fn into_entry(self) -> Option<Entry> {
        let utility_type = UtilityType::parse(&self.utility_type)?;
        Some(Entry {
            id: None,
            utility_type,
            supplier: self.supplier,
            reading_date: self.reading_date,
            reading: self.reading,
            unit: self.unit,
            amount: self.amount,
            notes: self.notes,
            payment_date: self.payment_date,
            payment_reference: self.payment_reference,
            created_at: None,
            updated_at: None,
            synced: false,
        })
    }
}

/// ローカル専用IDを生成する
///
/// # 戻り値
/// `local-`プレフィックス付きの一意なID
pub fn generate_local_id() -> String {
    format!("{}{}", LOCAL_ID_PREFIX, Uuid::new_v4())
}

/// IDがローカル専用IDかどうかを判定する
pub fn is_local_id(id: &str) -> bool {
    id.starts_with(LOCAL_ID_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utility_type_parse_roundtrip() {
        // 全種別が文字列表現を往復できることを確認
        for utility_type in UtilityType::all() {
            assert_eq!(UtilityType::parse(utility_type.as_str()), Some(*utility_type));
        }

        // 未知の種別はNone
        assert_eq!(UtilityType::parse("rocket_fuel"), None);
        assert_eq!(UtilityType::parse(""), None);
    }

    #[test]
    fn test_utility_type_serde_snake_case() {
        // serde表現がsnake_caseであることを確認
        let json = serde_json::to_string(&UtilityType::HotWater).unwrap();
        assert_eq!(json, "\"hot_water\"");

        let parsed: UtilityType = serde_json::from_str("\"housing_service\"").unwrap();
        assert_eq!(parsed, UtilityType::HousingService);
    }

    #[test]
    fn test_local_id_generation() {
        let id1 = generate_local_id();
        let id2 = generate_local_id();

        // ローカルIDは予約プレフィックスを持つ
        assert!(is_local_id(&id1));
        assert!(is_local_id(&id2));

        // 生成のたびに一意
        assert_ne!(id1, id2);

        // サーバー発行形式のIDはローカルIDではない
        assert!(!is_local_id("42"));
        assert!(!is_local_id("550e8400-e29b-41d4-a716-446655440000"));
    }

    #[test]
    fn test_dto_into_entry() {
        let dto = CreateEntryDto {
            utility_type: "electricity".to_string(),
            supplier: "東京電力".to_string(),
            reading_date: "2024-01-15".to_string(),
            reading: Some(320.5),
            unit: Some("kWh".to_string()),
            amount: 8420.0,
            notes: None,
            payment_date: None,
            payment_reference: None,
        };

        let entry = dto.into_entry().unwrap();
        assert_eq!(entry.utility_type, UtilityType::Electricity);
        assert_eq!(entry.supplier, "東京電力");
        assert_eq!(entry.id, None);
        assert_eq!(entry.created_at, None);
        assert!(!entry.synced);
    }

    #[test]
    fn test_dto_into_entry_unknown_type() {
        let dto = CreateEntryDto {
            utility_type: "magic".to_string(),
            supplier: "テスト".to_string(),
            reading_date: "2024-01-15".to_string(),
            reading: None,
            unit: None,
            amount: 0.0,
            notes: None,
            payment_date: None,
            payment_reference: None,
        };

        // 未知の種別は変換できない
        assert!(dto.into_entry().is_none());
    }
}
