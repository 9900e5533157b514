//! In-process store implementations.
//!
//! Each store can be told to fail reads or writes, and counts the writes it
//! accepted, so callers can check which side effects actually happened.

use crate::courses::{decode_cursor, encode_cursor, page_size, CourseStore};
use crate::error::StoreError;
use crate::roadmaps::RoadmapStore;
use crate::topics::TopicStore;
use crate::types::{Course, Pagination, Roadmap, Topic, User};
use crate::users::UserStore;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct Faults {
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl Faults {
    fn read(&self, store: &str) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{} reads disabled", store)));
        }
        Ok(())
    }

    fn write(&self, store: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{} writes disabled", store)));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

macro_rules! fault_controls {
    ($store:ty) => {
        impl $store {
            pub fn with_failing_reads(self, fail: bool) -> Self {
                self.faults.fail_reads.store(fail, Ordering::SeqCst);
                self
            }

            pub fn with_failing_writes(self, fail: bool) -> Self {
                self.faults.fail_writes.store(fail, Ordering::SeqCst);
                self
            }

            pub fn set_failing(&self, fail: bool) {
                self.faults.fail_reads.store(fail, Ordering::SeqCst);
                self.faults.fail_writes.store(fail, Ordering::SeqCst);
            }

            /// Number of successful write calls.
            pub fn write_count(&self) -> usize {
                self.faults.writes.load(Ordering::SeqCst)
            }
        }
    };
}

// ---------- courses ----------

#[derive(Default)]
pub struct MemoryCourseStore {
    courses: Mutex<BTreeMap<String, Course>>,
    faults: Faults,
}

fault_controls!(MemoryCourseStore);

impl MemoryCourseStore {
    pub fn with_courses(courses: impl IntoIterator<Item = Course>) -> Self {
        let store = Self::default();
        {
            let mut map = store.courses.lock().unwrap_or_else(|e| e.into_inner());
            for course in courses {
                map.insert(course.id.clone(), course);
            }
        }
        store
    }

    pub fn snapshot(&self) -> Vec<Course> {
        self.courses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CourseStore for MemoryCourseStore {
    async fn get_by_urls(&self, urls: &[String]) -> Result<Vec<Course>, StoreError> {
        self.faults.read("course")?;
        let map = self.courses.lock().unwrap_or_else(|e| e.into_inner());
        Ok(map
            .values()
            .filter(|c| urls.contains(&c.url))
            .cloned()
            .collect())
    }

    async fn bulk_insert(&self, courses: &[Course]) -> Result<(), StoreError> {
        self.faults.write("course")?;
        let mut map = self.courses.lock().unwrap_or_else(|e| e.into_inner());
        for course in courses {
            map.insert(course.id.clone(), course.clone());
        }
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Course, StoreError> {
        self.faults.read("course")?;
        self.courses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("course", id))
    }

    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Course>, StoreError> {
        self.faults.read("course")?;
        let map = self.courses.lock().unwrap_or_else(|e| e.into_inner());
        let mut seen = std::collections::HashSet::new();
        Ok(ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .filter_map(|id| map.get(id).cloned())
            .collect())
    }

    async fn upsert(&self, course: &Course) -> Result<(), StoreError> {
        self.faults.write("course")?;
        self.courses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(course.id.clone(), course.clone());
        Ok(())
    }

    async fn list(&self, page: &Pagination) -> Result<(Vec<Course>, Option<String>), StoreError> {
        self.faults.read("course")?;
        let after = match page.last_evaluated_key.as_deref() {
            Some(cursor) if !cursor.is_empty() => Some(decode_cursor(cursor)?),
            _ => None,
        };
        let limit = page_size(page) as usize;

        let map = self.courses.lock().unwrap_or_else(|e| e.into_inner());
        let remaining: Vec<&Course> = map
            .values()
            .filter(|c| after.as_deref().map_or(true, |last| c.id.as_str() > last))
            .collect();

        let courses: Vec<Course> = remaining.iter().take(limit).map(|c| (*c).clone()).collect();
        let next = if remaining.len() > limit {
            courses.last().map(|c| encode_cursor(&c.id))
        } else {
            None
        };
        Ok((courses, next))
    }
}

// ---------- topics ----------

#[derive(Default)]
pub struct MemoryTopicStore {
    topics: Mutex<BTreeMap<String, Topic>>,
    faults: Faults,
}

fault_controls!(MemoryTopicStore);

impl MemoryTopicStore {
    pub fn with_topics(topics: impl IntoIterator<Item = Topic>) -> Self {
        let store = Self::default();
        {
            let mut map = store.topics.lock().unwrap_or_else(|e| e.into_inner());
            for topic in topics {
                map.insert(topic.name.clone(), topic);
            }
        }
        store
    }

    pub fn get(&self, name: &str) -> Option<Topic> {
        self.topics
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }
}

#[async_trait]
impl TopicStore for MemoryTopicStore {
    async fn get_by_names(&self, names: &[String]) -> Result<Vec<Topic>, StoreError> {
        self.faults.read("topic")?;
        let map = self.topics.lock().unwrap_or_else(|e| e.into_inner());
        Ok(names
            .iter()
            .map(|name| map.get(name).cloned().unwrap_or_else(|| Topic::empty(name.as_str())))
            .collect())
    }

    async fn bulk_write(&self, topics: &[Topic]) -> Result<(), StoreError> {
        self.faults.write("topic")?;
        let mut map = self.topics.lock().unwrap_or_else(|e| e.into_inner());
        for topic in topics {
            map.insert(topic.name.clone(), topic.clone());
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Topic>, StoreError> {
        self.faults.read("topic")?;
        Ok(self
            .topics
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect())
    }
}

// ---------- users ----------

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<BTreeMap<String, User>>,
    faults: Faults,
}

fault_controls!(MemoryUserStore);

impl MemoryUserStore {
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let store = Self::default();
        {
            let mut map = store.users.lock().unwrap_or_else(|e| e.into_inner());
            for user in users {
                map.insert(user.name.clone(), user);
            }
        }
        store
    }

    pub fn get(&self, name: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_by_name(&self, name: &str) -> Result<User, StoreError> {
        self.faults.read("user")?;
        self.get(name).ok_or_else(|| StoreError::not_found("user", name))
    }

    async fn upsert(&self, user: &User) -> Result<(), StoreError> {
        self.faults.write("user")?;
        self.users
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(user.name.clone(), user.clone());
        Ok(())
    }

    async fn decrement_gen_usages(&self, name: &str) -> Result<i64, StoreError> {
        if self.faults.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("user writes disabled".to_string()));
        }
        let mut map = self.users.lock().unwrap_or_else(|e| e.into_inner());
        let user = map
            .get_mut(name)
            .ok_or_else(|| StoreError::not_found("user", name))?;
        user.gen_usages_remaining -= 1;
        self.faults.writes.fetch_add(1, Ordering::SeqCst);
        Ok(user.gen_usages_remaining)
    }

    async fn list_all(&self) -> Result<Vec<User>, StoreError> {
        self.faults.read("user")?;
        Ok(self
            .users
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect())
    }
}

// ---------- roadmaps ----------

#[derive(Default)]
pub struct MemoryRoadmapStore {
    roadmaps: Mutex<BTreeMap<String, Roadmap>>,
    faults: Faults,
}

fault_controls!(MemoryRoadmapStore);

impl MemoryRoadmapStore {
    pub fn with_roadmaps(roadmaps: impl IntoIterator<Item = Roadmap>) -> Self {
        let store = Self::default();
        {
            let mut map = store.roadmaps.lock().unwrap_or_else(|e| e.into_inner());
            for roadmap in roadmaps {
                map.insert(roadmap.id.clone(), roadmap);
            }
        }
        store
    }
}

/// Stored shape: views are stripped like the DynamoDB mapping does.
fn stored(roadmap: &Roadmap) -> Roadmap {
    Roadmap {
        courses: Vec::new(),
        liked: false,
        ..roadmap.clone()
    }
}

#[async_trait]
impl RoadmapStore for MemoryRoadmapStore {
    async fn get(&self, id: &str) -> Result<Roadmap, StoreError> {
        self.faults.read("roadmap")?;
        self.roadmaps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .map(stored)
            .ok_or_else(|| StoreError::not_found("roadmap", id))
    }

    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Roadmap>, StoreError> {
        self.faults.read("roadmap")?;
        let map = self.roadmaps.lock().unwrap_or_else(|e| e.into_inner());
        let mut seen = std::collections::HashSet::new();
        Ok(ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .filter_map(|id| map.get(id).map(stored))
            .collect())
    }

    async fn put(&self, roadmap: &Roadmap) -> Result<(), StoreError> {
        self.faults.write("roadmap")?;
        self.roadmaps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(roadmap.id.clone(), stored(roadmap));
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Roadmap>, StoreError> {
        self.faults.read("roadmap")?;
        Ok(self
            .roadmaps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(stored)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(id: &str) -> Course {
        Course {
            id: id.to_string(),
            url: format!("https://example.com/{}", id),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn course_listing_pages_through_cursor() {
        let store = MemoryCourseStore::with_courses(["a", "b", "c"].map(course));
        let first = Pagination {
            page: 1,
            per_page: 2,
            last_evaluated_key: None,
        };
        let (page, cursor) = store.list(&first).await.unwrap();
        assert_eq!(page.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(), ["a", "b"]);
        let cursor = cursor.expect("more pages");

        let second = Pagination {
            page: 2,
            per_page: 2,
            last_evaluated_key: Some(cursor),
        };
        let (page, cursor) = store.list(&second).await.unwrap();
        assert_eq!(page.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(), ["c"]);
        assert!(cursor.is_none());
    }

    #[tokio::test]
    async fn failing_writes_are_not_counted() {
        let store = MemoryUserStore::default().with_failing_writes(true);
        let err = store.upsert(&User::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn missing_topics_are_synthesized() {
        let store = MemoryTopicStore::default();
        let topics = store.get_by_names(&["go".to_string()]).await.unwrap();
        assert_eq!(topics, vec![Topic::empty("go")]);
        assert!(store.get("go").is_none());
    }
}
