use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::initials::Initials;
use super::palette::MAX_VARIANTS;
use super::store::{DEFAULT_VARIANT_COUNT, Variant};
use crate::error::AppError;

/// 单个用户生成请求体
#[derive(Debug, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GenerateRequest {
    #[schema(example = "Arjun")]
    #[serde(default)]
    pub first_name: Option<String>,
    #[schema(example = "Sharma")]
    #[serde(default)]
    pub last_name: Option<String>,
}

/// 多变体生成请求体
#[derive(Debug, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GenerateVariantsRequest {
    #[schema(example = "Arjun")]
    #[serde(default)]
    pub first_name: Option<String>,
    #[schema(example = "Sharma")]
    #[serde(default)]
    pub last_name: Option<String>,
    /// 变体数量，整数 1-12，默认 3
    #[schema(value_type = Option<u32>, example = 5)]
    #[serde(default)]
    pub num_variants: Option<Value>,
}

/// 批量生成请求体（`users` 保留原始 JSON，便于逐条报告错误）
#[derive(Debug, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BulkGenerateRequest {
    #[schema(value_type = Option<Vec<GenerateRequest>>)]
    #[serde(default)]
    pub users: Option<Value>,
}

/// 去除首尾空白后的姓名与首字母
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct UserInfo {
    pub first_name: String,
    pub last_name: String,
    #[schema(value_type = String, example = "AS")]
    pub initials: Initials,
}

impl UserInfo {
    /// 校验姓名并派生首字母。
    pub fn from_names(first_name: Option<&str>, last_name: Option<&str>) -> Result<Self, AppError> {
        let first_name = first_name.unwrap_or_default().trim().to_string();
        let last_name = last_name.unwrap_or_default().trim().to_string();
        let initials = Initials::from_names(&first_name, &last_name)?;
        Ok(Self {
            first_name,
            last_name,
            initials,
        })
    }

    /// 从批量请求中的任意 JSON 值提取姓名；非对象/非字符串字段按缺失处理。
    pub fn from_json(user: &Value) -> Result<Self, AppError> {
        let field = |key: &str| user.get(key).and_then(Value::as_str);
        Self::from_names(field("first_name"), field("last_name"))
    }
}

/// 解析 `num_variants`：缺省为 3，必须是 1-12 的整数。
pub fn parse_num_variants(raw: Option<&Value>) -> Result<usize, AppError> {
    let invalid =
        || AppError::Validation(format!("num_variants must be an integer between 1 and {MAX_VARIANTS}"));
    match raw {
        None | Some(Value::Null) => Ok(DEFAULT_VARIANT_COUNT),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| usize::try_from(v).ok())
            .filter(|v| (1..=MAX_VARIANTS).contains(v))
            .ok_or_else(invalid),
        Some(_) => Err(invalid()),
    }
}

/// POST /generate 响应
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct GenerateResponse {
    pub success: bool,
    pub user_info: UserInfo,
    pub image: Variant,
    pub message: String,
}

/// POST /generate-variants 响应
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct GenerateVariantsResponse {
    pub success: bool,
    pub user_info: UserInfo,
    pub variants: Vec<Variant>,
    pub total_variants: usize,
    pub message: String,
}

/// 批量生成中的单条结果
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct BulkItemResult {
    /// 原样回显的输入
    #[schema(value_type = Object)]
    pub user: Value,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub initials: Option<Initials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Variant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BulkItemResult {
    pub fn succeeded(user: Value, initials: Initials, image: Variant) -> Self {
        Self {
            user,
            success: true,
            initials: Some(initials),
            image: Some(image),
            error: None,
        }
    }

    pub fn failed(user: Value, error: &AppError) -> Self {
        Self {
            user,
            success: false,
            initials: None,
            image: None,
            error: Some(error.public_message()),
        }
    }
}

/// POST /bulk-generate 响应
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct BulkGenerateResponse {
    pub success: bool,
    pub total_users: usize,
    pub successful_generations: usize,
    pub failed_generations: usize,
    pub results: Vec<BulkItemResult>,
}

/// GET /image-base64 响应
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ImageBase64Response {
    pub success: bool,
    pub initials: String,
    pub filename: String,
    /// `data:image/png;base64,...`
    pub image_base64: String,
}

/// GET /colors 响应
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ColorsResponse {
    pub success: bool,
    pub colors: Vec<String>,
    pub total_colors: usize,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::{UserInfo, parse_num_variants};
    use crate::error::AppError;
    use serde_json::json;

    #[test]
    fn num_variants_defaults_and_bounds() {
        assert_eq!(parse_num_variants(None).expect("default"), 3);
        assert_eq!(parse_num_variants(Some(&json!(null))).expect("null"), 3);
        assert_eq!(parse_num_variants(Some(&json!(1))).expect("min"), 1);
        assert_eq!(parse_num_variants(Some(&json!(12))).expect("max"), 12);
        for bad in [
            json!(0),
            json!(13),
            json!(20),
            json!(-1),
            json!(2.5),
            json!("3"),
            json!(true),
            json!(4_294_967_299u64),
            json!(u64::MAX),
        ] {
            assert!(
                matches!(parse_num_variants(Some(&bad)), Err(AppError::Validation(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn user_info_trims_names() {
        let info = UserInfo::from_names(Some("  Arjun "), Some("Sharma\n")).expect("info");
        assert_eq!(info.first_name, "Arjun");
        assert_eq!(info.last_name, "Sharma");
        assert_eq!(info.initials.as_str(), "AS");
    }

    #[test]
    fn user_info_from_loose_json() {
        assert!(UserInfo::from_json(&json!({"first_name": "a", "last_name": "b"})).is_ok());
        assert!(UserInfo::from_json(&json!({"first_name": "a"})).is_err());
        assert!(UserInfo::from_json(&json!({"first_name": 1, "last_name": "b"})).is_err());
        assert!(UserInfo::from_json(&json!("John Doe")).is_err());
        assert!(UserInfo::from_json(&json!(null)).is_err());
    }
}
