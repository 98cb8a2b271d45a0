//! Design project request/response DTOs for the v1 API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::common::{validate_color_palette, validate_not_blank};
use crate::models::{self, AssetFormat, DesignStatus, DesignType, GroupCount, Metadata};

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Request body for `POST /v1/design-projects`. Projects start `generating`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDesignProjectRequest {
    #[validate(
        length(min = 1, max = 120, message = "must be 1 to 120 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    pub design_type: Option<DesignType>,
    #[validate(
        length(min = 1, max = 4000, message = "must be 1 to 4000 characters"),
        custom(function = "validate_not_blank")
    )]
    pub prompt: String,
    #[serde(default)]
    #[validate(custom(function = "validate_color_palette"))]
    pub color_palette: Vec<String>,
    #[schema(value_type = Object)]
    pub metadata: Option<Metadata>,
}

/// Request body for `PATCH /v1/design-projects/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDesignProjectRequest {
    #[validate(
        length(min = 1, max = 120, message = "must be 1 to 120 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,
    pub design_type: Option<DesignType>,
    #[validate(custom(function = "validate_color_palette"))]
    pub color_palette: Option<Vec<String>>,
    /// Applied as a JSON merge patch: keys merge into the existing metadata
    /// and a `null` value removes the key.
    #[schema(value_type = Object)]
    pub metadata: Option<Metadata>,
}

/// Request body for `POST /v1/design-projects/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransitionStatusRequest {
    pub status: DesignStatus,
    /// Recorded when moving to `failed`.
    #[validate(length(min = 1, max = 2000))]
    pub error_message: Option<String>,
}

/// Request body for `POST /v1/design-projects/{id}/assets`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddAssetRequest {
    #[validate(url(message = "must be a valid URL"))]
    pub url: String,
    pub format: AssetFormat,
    #[validate(range(min = 1, max = 10000))]
    pub width: Option<u32>,
    #[validate(range(min = 1, max = 10000))]
    pub height: Option<u32>,
}

impl AddAssetRequest {
    pub fn into_asset(self) -> models::DesignAsset {
        let mut asset = models::DesignAsset::new(self.url, self.format);
        asset.width = self.width;
        asset.height = self.height;
        asset
    }
}

/// Query parameters for `GET /v1/design-projects`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListDesignProjectsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[param(value_type = Option<String>)]
    pub status: Option<DesignStatus>,
    #[param(value_type = Option<String>)]
    pub design_type: Option<DesignType>,
    /// Case-insensitive substring of the name or prompt.
    pub search: Option<String>,
    #[param(value_type = Option<String>)]
    pub created_from: Option<DateTime<Utc>>,
    #[param(value_type = Option<String>)]
    pub created_to: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DesignAssetResponse {
    pub id: String,
    pub url: String,
    pub format: AssetFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl From<models::DesignAsset> for DesignAssetResponse {
    fn from(asset: models::DesignAsset) -> Self {
        Self {
            id: asset.id,
            url: asset.url,
            format: asset.format,
            width: asset.width,
            height: asset.height,
            created_at: asset.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DesignProjectResponse {
    pub id: String,
    pub name: String,
    pub design_type: DesignType,
    pub prompt: String,
    pub status: DesignStatus,
    pub assets: Vec<DesignAssetResponse>,
    pub color_palette: Vec<String>,
    #[schema(value_type = Object)]
    pub metadata: Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub completed_at: Option<DateTime<Utc>>,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl From<models::DesignProject> for DesignProjectResponse {
    fn from(project: models::DesignProject) -> Self {
        Self {
            id: project.id,
            name: project.name,
            design_type: project.design_type,
            prompt: project.prompt,
            status: project.status,
            assets: project.assets.into_iter().map(Into::into).collect(),
            color_palette: project.color_palette,
            metadata: project.metadata,
            error_message: project.error_message,
            completed_at: project.completed_at,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DesignProjectStatsResponse {
    pub total: u64,
    pub by_status: Vec<GroupCount>,
    pub by_type: Vec<GroupCount>,
    pub total_assets: u64,
    pub created_last_30_days: u64,
}

impl From<models::DesignProjectStats> for DesignProjectStatsResponse {
    fn from(stats: models::DesignProjectStats) -> Self {
        Self {
            total: stats.total,
            by_status: stats.by_status,
            by_type: stats.by_type,
            total_assets: stats.total_assets,
            created_last_30_days: stats.created_last_30_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_req(value: serde_json::Value) -> CreateDesignProjectRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn bad_palette_color_fails_validation() {
        let req = create_req(serde_json::json!({
            "name": "Brand", "prompt": "a fox", "colorPalette": ["#ff0000", "red"]
        }));
        assert!(req.validate().is_err());
    }

    #[test]
    fn minimal_create_request_is_valid() {
        let req = create_req(serde_json::json!({ "name": "Brand", "prompt": "a fox" }));
        assert!(req.validate().is_ok());
        assert!(req.design_type.is_none());
        assert!(req.color_palette.is_empty());
    }

    #[test]
    fn asset_url_and_dimensions_are_checked() {
        let req: AddAssetRequest = serde_json::from_value(serde_json::json!({
            "url": "not a url", "format": "png"
        }))
        .unwrap();
        assert!(req.validate().is_err());

        let req: AddAssetRequest = serde_json::from_value(serde_json::json!({
            "url": "https://cdn.example.com/a.png", "format": "png", "width": 0
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn unknown_design_type_is_rejected_by_serde() {
        let parsed: Result<CreateDesignProjectRequest, _> = serde_json::from_value(
            serde_json::json!({ "name": "x", "prompt": "y", "designType": "poster" }),
        );
        assert!(parsed.is_err());
    }
}
