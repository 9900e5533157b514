//! Hand-written attribute mapping between domain records and DynamoDB items.
//!
//! Attribute names follow the JSON field names of the GraphQL contract so the
//! tables stay readable from the console and from older writers.

use crate::error::StoreError;
use crate::types::{Course, Roadmap, Topic, User};
use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;

pub type Item = HashMap<String, AttributeValue>;

/// DynamoDB caps BatchWriteItem at 25 requests.
pub const BATCH_WRITE_LIMIT: usize = 25;
/// DynamoDB caps BatchGetItem at 100 keys.
pub const BATCH_GET_LIMIT: usize = 100;

// ---------- readers ----------

pub fn get_s(item: &Item, key: &str) -> String {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
        .unwrap_or_default()
}

pub fn get_n(item: &Item, key: &str) -> i64 {
    item.get(key)
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse::<i64>().ok())
        .unwrap_or(0)
}

pub fn get_bool(item: &Item, key: &str) -> bool {
    item.get(key)
        .and_then(|v| v.as_bool().ok())
        .copied()
        .unwrap_or(false)
}

/// Reads a list of strings stored either as `L` of `S` or as a string set.
pub fn get_string_list(item: &Item, key: &str) -> Vec<String> {
    match item.get(key) {
        Some(AttributeValue::L(values)) => values
            .iter()
            .filter_map(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .collect(),
        Some(AttributeValue::Ss(values)) => values.clone(),
        _ => Vec::new(),
    }
}

fn get_number_map(item: &Item, key: &str) -> HashMap<String, i64> {
    item.get(key)
        .and_then(|v| v.as_m().ok())
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| {
                    v.as_n()
                        .ok()
                        .and_then(|n| n.parse::<i64>().ok())
                        .map(|n| (k.clone(), n))
                })
                .collect()
        })
        .unwrap_or_default()
}

// ---------- writers ----------

pub fn s(value: impl Into<String>) -> AttributeValue {
    AttributeValue::S(value.into())
}

pub fn n(value: i64) -> AttributeValue {
    AttributeValue::N(value.to_string())
}

pub fn string_list(values: &[String]) -> AttributeValue {
    AttributeValue::L(values.iter().map(|v| s(v.clone())).collect())
}

// ---------- course ----------

pub fn course_to_item(course: &Course) -> Item {
    let mut item = HashMap::new();
    item.insert("id".to_string(), s(&course.id));
    item.insert("title".to_string(), s(&course.title));
    item.insert("url".to_string(), s(&course.url));
    item.insert("description".to_string(), s(&course.description));
    item.insert("source".to_string(), s(&course.source));
    item.insert("difficulty".to_string(), s(&course.difficulty));
    item.insert("topics".to_string(), string_list(&course.topics));
    item.insert("isFree".to_string(), AttributeValue::Bool(course.is_free));
    item.insert("author".to_string(), s(&course.author));
    item.insert("duration".to_string(), n(course.duration));
    item.insert("language".to_string(), s(&course.language));
    item
}

pub fn course_from_item(item: &Item) -> Result<Course, StoreError> {
    let id = get_s(item, "id");
    if id.is_empty() {
        return Err(StoreError::Malformed {
            entity: "course",
            reason: "missing id".to_string(),
        });
    }
    Ok(Course {
        id,
        title: get_s(item, "title"),
        url: get_s(item, "url"),
        description: get_s(item, "description"),
        source: get_s(item, "source"),
        difficulty: get_s(item, "difficulty"),
        topics: get_string_list(item, "topics"),
        is_free: get_bool(item, "isFree"),
        author: get_s(item, "author"),
        duration: get_n(item, "duration"),
        language: get_s(item, "language"),
    })
}

// ---------- topic ----------

pub fn topic_to_item(topic: &Topic) -> Item {
    let mut item = HashMap::new();
    item.insert("name".to_string(), s(&topic.name));
    item.insert("roadmapIds".to_string(), string_list(&topic.roadmap_ids));
    item
}

pub fn topic_from_item(item: &Item) -> Topic {
    Topic {
        name: get_s(item, "name"),
        roadmap_ids: get_string_list(item, "roadmapIds"),
    }
}

// ---------- roadmap ----------

/// `courses` and `liked` are views, not stored.
pub fn roadmap_to_item(roadmap: &Roadmap) -> Item {
    let mut item = HashMap::new();
    item.insert("id".to_string(), s(&roadmap.id));
    item.insert("title".to_string(), s(&roadmap.title));
    item.insert("author".to_string(), s(&roadmap.author));
    item.insert("authorId".to_string(), s(&roadmap.author_id));
    item.insert("courseIDs".to_string(), string_list(&roadmap.course_ids));
    item.insert("topics".to_string(), string_list(&roadmap.topics));
    item.insert("isCustom".to_string(), AttributeValue::Bool(roadmap.is_custom));
    item.insert("createdBy".to_string(), s(&roadmap.created_by));
    item.insert("likes".to_string(), n(roadmap.likes));
    item.insert("difficulty".to_string(), s(&roadmap.difficulty));
    item.insert("imageUrl".to_string(), s(&roadmap.image_url));
    item.insert("description".to_string(), s(&roadmap.description));
    item.insert("verified".to_string(), AttributeValue::Bool(roadmap.verified));
    item
}

pub fn roadmap_from_item(item: &Item) -> Result<Roadmap, StoreError> {
    let id = get_s(item, "id");
    if id.is_empty() {
        return Err(StoreError::Malformed {
            entity: "roadmap",
            reason: "missing id".to_string(),
        });
    }
    Ok(Roadmap {
        id,
        title: get_s(item, "title"),
        author: get_s(item, "author"),
        author_id: get_s(item, "authorId"),
        courses: Vec::new(),
        course_ids: get_string_list(item, "courseIDs"),
        topics: get_string_list(item, "topics"),
        is_custom: get_bool(item, "isCustom"),
        created_by: get_s(item, "createdBy"),
        likes: get_n(item, "likes"),
        difficulty: get_s(item, "difficulty"),
        liked: false,
        image_url: get_s(item, "imageUrl"),
        description: get_s(item, "description"),
        verified: get_bool(item, "verified"),
    })
}

// ---------- user ----------

pub fn user_to_item(user: &User) -> Item {
    let mut item = HashMap::new();
    item.insert("name".to_string(), s(&user.name));
    item.insert("role".to_string(), n(user.role));
    item.insert("email".to_string(), s(&user.email));
    item.insert("topics".to_string(), string_list(&user.topics));
    item.insert(
        "dailyChallengeAvailable".to_string(),
        AttributeValue::Bool(user.daily_challenge_available),
    );
    item.insert("username".to_string(), s(&user.username));
    item.insert("roadmapsIds".to_string(), string_list(&user.roadmaps));
    item.insert("genUsagesRemaining".to_string(), n(user.gen_usages_remaining));
    item.insert(
        "dailyChallengesRemaining".to_string(),
        n(user.daily_challenges_remaining),
    );
    item.insert("roadmapsCreated".to_string(), string_list(&user.roadmaps_created));
    if let Some(last) = user.last_daily_challenge {
        item.insert("lastDailyChallenge".to_string(), s(last.to_rfc3339()));
    }
    item.insert("dailyChallengeStreak".to_string(), n(user.daily_challenge_streak));
    item.insert("roadmapsViewed".to_string(), n(user.roadmaps_viewed));
    item.insert("creationsRemaining".to_string(), n(user.creations_remaining));
    item.insert(
        "roadmapProgress".to_string(),
        AttributeValue::M(
            user.roadmaps_progress
                .iter()
                .map(|(k, v)| (k.clone(), n(*v)))
                .collect(),
        ),
    );
    item
}

pub fn user_from_item(item: &Item) -> Result<User, StoreError> {
    let name = get_s(item, "name");
    if name.is_empty() {
        return Err(StoreError::Malformed {
            entity: "user",
            reason: "missing name".to_string(),
        });
    }
    let last_daily_challenge = item
        .get("lastDailyChallenge")
        .and_then(|v| v.as_s().ok())
        .and_then(|raw| chrono::DateTime::parse_from_rfc3339(raw).ok())
        .map(|ts| ts.with_timezone(&chrono::Utc));

    Ok(User {
        name,
        role: get_n(item, "role"),
        email: get_s(item, "email"),
        topics: get_string_list(item, "topics"),
        daily_challenge_available: get_bool(item, "dailyChallengeAvailable"),
        username: get_s(item, "username"),
        roadmaps: get_string_list(item, "roadmapsIds"),
        gen_usages_remaining: get_n(item, "genUsagesRemaining"),
        daily_challenges_remaining: get_n(item, "dailyChallengesRemaining"),
        roadmaps_created: get_string_list(item, "roadmapsCreated"),
        last_daily_challenge,
        daily_challenge_streak: get_n(item, "dailyChallengeStreak"),
        roadmaps_viewed: get_n(item, "roadmapsViewed"),
        creations_remaining: get_n(item, "creationsRemaining"),
        roadmaps_progress: get_number_map(item, "roadmapProgress"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_survives_item_mapping() {
        let course = Course {
            id: "c1".into(),
            title: "Rust in Action".into(),
            url: "https://example.com/rust".into(),
            topics: vec!["rust".into(), "systems".into()],
            is_free: true,
            duration: 12,
            ..Default::default()
        };
        let back = course_from_item(&course_to_item(&course)).unwrap();
        assert_eq!(back, course);
    }

    #[test]
    fn roadmap_item_never_stores_materialized_courses() {
        let roadmap = Roadmap {
            id: "r1".into(),
            courses: vec![Course::default()],
            course_ids: vec!["c1".into()],
            liked: true,
            ..Default::default()
        };
        let item = roadmap_to_item(&roadmap);
        assert!(!item.contains_key("courses"));
        assert!(!item.contains_key("liked"));
        let back = roadmap_from_item(&item).unwrap();
        assert!(back.courses.is_empty());
        assert!(!back.liked);
        assert_eq!(back.course_ids, vec!["c1".to_string()]);
    }

    #[test]
    fn missing_attributes_fall_back_to_defaults() {
        let mut item = HashMap::new();
        item.insert("name".to_string(), s("ana"));
        item.insert("topics".to_string(), AttributeValue::Ss(vec!["go".into()]));
        let user = user_from_item(&item).unwrap();
        assert_eq!(user.gen_usages_remaining, 0);
        assert_eq!(user.topics, vec!["go".to_string()]);
        assert!(user.roadmaps.is_empty());
        assert!(user.last_daily_challenge.is_none());
    }

    #[test]
    fn record_without_key_is_malformed() {
        let item = HashMap::new();
        assert!(matches!(
            course_from_item(&item),
            Err(StoreError::Malformed { entity: "course", .. })
        ));
    }
}
