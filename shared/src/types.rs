use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ========== COURSE ==========
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub url: String, // natural key for dedup
    pub description: String,
    pub source: String,
    pub difficulty: String,
    pub topics: Vec<String>,
    #[serde(alias = "is_free")]
    pub is_free: bool,
    pub author: String,
    pub duration: i64,
    pub language: String,
}

// ========== ROADMAP ==========
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Roadmap {
    pub id: String,
    pub title: String,
    pub author: String,
    pub author_id: String,
    /// Materialized from `course_ids` at read time, never stored.
    pub courses: Vec<Course>,
    #[serde(rename = "courseIDs")]
    pub course_ids: Vec<String>,
    pub topics: Vec<String>,
    pub is_custom: bool,
    pub created_by: String,
    pub likes: i64,
    pub difficulty: String,
    /// Per-viewer flag, only set on feed reads.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub liked: bool,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    pub description: String,
    pub verified: bool,
}

// ========== TOPIC ==========
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Topic {
    pub name: String,
    pub roadmap_ids: Vec<String>,
}

impl Topic {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roadmap_ids: Vec::new(),
        }
    }
}

// ========== USER ==========
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub name: String,
    pub role: i64,
    pub email: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
    pub daily_challenge_available: bool,
    pub username: String,
    #[serde(rename = "roadmapsIds")]
    pub roadmaps: Vec<String>,
    pub gen_usages_remaining: i64,
    pub daily_challenges_remaining: i64,
    pub roadmaps_created: Vec<String>,
    pub last_daily_challenge: Option<chrono::DateTime<chrono::Utc>>,
    pub daily_challenge_streak: i64,
    pub roadmaps_viewed: i64,
    pub creations_remaining: i64,
    #[serde(rename = "roadmapProgress")]
    pub roadmaps_progress: HashMap<String, i64>,
}

// ========== DAILY CHALLENGE ==========
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Problem {
    pub question: String,
    pub categories: Vec<String>,
    #[serde(rename = "type")]
    pub problem_type: String,
}

/// Rating returned by the challenge model for a submitted answer.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Rating {
    pub rating: i64,
    pub insight: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    pub user_id: String,
    pub question: String,
    pub answer: String,
    pub rating: i64,
    pub insight: String,
    pub left: i64,
}

// ========== PAGINATION ==========
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    /// Opaque cursor handed back by the previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct CoursePage {
    pub courses: Vec<Course>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_course_accepts_snake_case_is_free() {
        let course: Course = serde_json::from_str(
            r#"{"title":"Rust","url":"https://a","is_free":true,"duration":3}"#,
        )
        .unwrap();
        assert!(course.is_free);
        assert!(course.id.is_empty());
        assert_eq!(course.duration, 3);
    }

    #[test]
    fn roadmap_uses_graphql_field_names() {
        let roadmap = Roadmap {
            id: "r1".into(),
            course_ids: vec!["c1".into()],
            image_url: "img".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&roadmap).unwrap();
        assert_eq!(json["courseIDs"], serde_json::json!(["c1"]));
        assert_eq!(json["imageUrl"], "img");
        assert!(json.get("liked").is_none());
        assert!(json.get("isCustom").is_some());
    }

    #[test]
    fn user_roadmaps_serialize_as_roadmaps_ids() {
        let user: User = serde_json::from_str(
            r#"{"name":"ana","roadmapsIds":["r1"],"genUsagesRemaining":4}"#,
        )
        .unwrap();
        assert_eq!(user.roadmaps, vec!["r1".to_string()]);
        assert_eq!(user.gen_usages_remaining, 4);
        assert!(user.last_daily_challenge.is_none());
    }
}
