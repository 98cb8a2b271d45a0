use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DateRange, GroupCount, Metadata};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DesignType {
    Logo,
    Banner,
    SocialPost,
    Presentation,
    Illustration,
    UiMockup,
    #[default]
    Other,
}

impl std::fmt::Display for DesignType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logo => write!(f, "logo"),
            Self::Banner => write!(f, "banner"),
            Self::SocialPost => write!(f, "social_post"),
            Self::Presentation => write!(f, "presentation"),
            Self::Illustration => write!(f, "illustration"),
            Self::UiMockup => write!(f, "ui_mockup"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for DesignType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "logo" => Ok(Self::Logo),
            "banner" => Ok(Self::Banner),
            "social_post" => Ok(Self::SocialPost),
            "presentation" => Ok(Self::Presentation),
            "illustration" => Ok(Self::Illustration),
            "ui_mockup" => Ok(Self::UiMockup),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown design type: {s}")),
        }
    }
}

/// Generation lifecycle of a design project.
///
/// ```text
/// generating --> completed
///     |  ^           |
///     v  +-----------+ (regenerate)
///   failed ----------^
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DesignStatus {
    #[default]
    Generating,
    Completed,
    Failed,
}

impl DesignStatus {
    pub fn can_transition_to(self, next: DesignStatus) -> bool {
        matches!(
            (self, next),
            (Self::Generating, Self::Completed)
                | (Self::Generating, Self::Failed)
                | (Self::Completed, Self::Generating)
                | (Self::Failed, Self::Generating)
        )
    }
}

impl std::fmt::Display for DesignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generating => write!(f, "generating"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for DesignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generating" => Ok(Self::Generating),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown design status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssetFormat {
    Png,
    Jpg,
    Svg,
    Webp,
    Pdf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DesignAsset {
    pub id: String,
    pub url: String,
    pub format: AssetFormat,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl DesignAsset {
    pub fn new(url: String, format: AssetFormat) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            url,
            format,
            width: None,
            height: None,
            created_at: super::utc_now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignProject {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub design_type: DesignType,
    pub prompt: String,
    pub status: DesignStatus,
    pub assets: Vec<DesignAsset>,
    pub color_palette: Vec<String>,
    pub metadata: Metadata,
    pub error_message: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DesignProject {
    pub fn new(id: String, user_id: String, name: String, prompt: String) -> Self {
        let now = super::utc_now();
        Self {
            id,
            user_id,
            name,
            design_type: DesignType::default(),
            prompt,
            status: DesignStatus::Generating,
            assets: Vec::new(),
            color_palette: Vec::new(),
            metadata: Metadata::new(),
            error_message: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Note recorded on projects swept out of a stuck `generating` state.
pub fn stuck_generation_note(threshold_hours: i64) -> String {
    format!("Generation timed out after {threshold_hours} hours")
}

#[derive(Debug, Clone, Default)]
pub struct ListDesignProjectsFilter {
    pub status: Option<DesignStatus>,
    pub design_type: Option<DesignType>,
    pub search: Option<String>,
    pub created: DateRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignProjectStats {
    pub total: u64,
    pub by_status: Vec<GroupCount>,
    pub by_type: Vec<GroupCount>,
    pub total_assets: u64,
    pub created_last_30_days: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use DesignStatus::*;
        assert!(Generating.can_transition_to(Completed));
        assert!(Generating.can_transition_to(Failed));
        assert!(Completed.can_transition_to(Generating));
        assert!(Failed.can_transition_to(Generating));

        assert!(!Generating.can_transition_to(Generating));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Completed));
    }

    #[test]
    fn test_new_project_starts_generating() {
        let p = DesignProject::new("d1".into(), "u1".into(), "Logo".into(), "a fox".into());
        assert_eq!(p.status, DesignStatus::Generating);
        assert!(p.assets.is_empty());
    }

    #[test]
    fn test_design_type_parse_and_display() {
        assert_eq!("social_post".parse::<DesignType>().unwrap(), DesignType::SocialPost);
        assert_eq!(DesignType::UiMockup.to_string(), "ui_mockup");
        assert!("poster".parse::<DesignType>().is_err());
    }

    #[test]
    fn test_stuck_note_mentions_threshold() {
        assert_eq!(stuck_generation_note(24), "Generation timed out after 24 hours");
    }
}
