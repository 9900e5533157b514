use crate::courses::{page_size, CourseStore};
use crate::error::{LearningError, StoreError};
use crate::roadmaps::RoadmapStore;
use crate::topics::TopicStore;
use crate::types::{Course, CoursePage, Pagination, Roadmap, Topic, User};
use crate::users::UserStore;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Reads and writes over courses, topics and roadmaps.
pub struct Catalog {
    courses: Arc<dyn CourseStore>,
    topics: Arc<dyn TopicStore>,
    users: Arc<dyn UserStore>,
    roadmaps: Arc<dyn RoadmapStore>,
}

impl Catalog {
    pub fn new(
        courses: Arc<dyn CourseStore>,
        topics: Arc<dyn TopicStore>,
        users: Arc<dyn UserStore>,
        roadmaps: Arc<dyn RoadmapStore>,
    ) -> Self {
        Self {
            courses,
            topics,
            users,
            roadmaps,
        }
    }

    // ========== COURSES ==========

    pub async fn get_course(&self, id: &str) -> Result<Course, LearningError> {
        Ok(self.courses.get_by_id(id).await?)
    }

    pub async fn list_courses(&self, page: Pagination) -> Result<CoursePage, LearningError> {
        let (courses, next) = self.courses.list(&page).await?;
        tracing::info!("Fetched {} courses (page {})", courses.len(), page.page);
        Ok(CoursePage {
            courses,
            pagination: Pagination {
                page: page.page,
                per_page: page_size(&page),
                last_evaluated_key: next,
            },
        })
    }

    pub async fn upsert_course(&self, mut course: Course) -> Result<Course, LearningError> {
        if course.id.is_empty() {
            course.id = uuid::Uuid::new_v4().to_string();
        }
        self.courses.upsert(&course).await?;
        Ok(course)
    }

    // ========== TOPICS ==========

    pub async fn all_topics(&self) -> Result<Vec<Topic>, LearningError> {
        Ok(self.topics.list_all().await?)
    }

    /// Creates the named topics. Topics that already exist keep their index.
    pub async fn add_topics(&self, names: &[String]) -> Result<Vec<Topic>, LearningError> {
        let mut seen = HashSet::new();
        let names: Vec<String> = names
            .iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty() && seen.insert(n.clone()))
            .collect();
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let topics = self.topics.get_by_names(&names).await?;
        self.topics.bulk_write(&topics).await?;
        Ok(topics)
    }

    // ========== USERS ==========

    pub async fn get_user(&self, name: &str) -> Result<User, LearningError> {
        Ok(self.users.get_by_name(name).await?)
    }

    pub async fn all_users(&self) -> Result<Vec<User>, LearningError> {
        let users = self.users.list_all().await?;
        tracing::info!("Fetched {} users", users.len());
        Ok(users)
    }

    // ========== ROADMAPS ==========

    pub async fn all_roadmaps(&self) -> Result<Vec<Roadmap>, LearningError> {
        Ok(self.roadmaps.list_all().await?)
    }

    /// The roadmap with `courses` joined from `courseIDs`. Ids with no
    /// stored course are dropped.
    pub async fn get_roadmap(&self, id: &str) -> Result<Roadmap, LearningError> {
        let mut roadmap = self.roadmaps.get(id).await?;
        self.join_courses(&mut roadmap).await?;
        Ok(roadmap)
    }

    async fn join_courses(&self, roadmap: &mut Roadmap) -> Result<(), StoreError> {
        if roadmap.course_ids.is_empty() {
            roadmap.courses = Vec::new();
            return Ok(());
        }

        let found = self.courses.get_by_ids(&roadmap.course_ids).await?;
        let by_id: HashMap<&str, &Course> = found.iter().map(|c| (c.id.as_str(), c)).collect();

        let courses: Vec<Course> = roadmap
            .course_ids
            .iter()
            .filter_map(|id| by_id.get(id.as_str()).map(|c| (*c).clone()))
            .collect();

        let missing = roadmap.course_ids.len() - courses.len();
        if missing > 0 {
            tracing::warn!("Roadmap {} references {} missing courses", roadmap.id, missing);
        }
        roadmap.courses = courses;
        Ok(())
    }

    /// Persists the roadmap and indexes it under each of its topics. The
    /// index update is best-effort: its failure is logged only.
    pub async fn upsert_roadmap(&self, mut roadmap: Roadmap) -> Result<Roadmap, LearningError> {
        if roadmap.id.is_empty() {
            roadmap.id = uuid::Uuid::new_v4().to_string();
        }
        tracing::info!("Upserting roadmap {}", roadmap.id);

        let topics = Arc::clone(&self.topics);
        let roadmap_id = roadmap.id.clone();
        let topic_names = roadmap.topics.clone();
        let index = tokio::spawn(async move {
            if let Err(e) = index_roadmap(topics.as_ref(), &roadmap_id, &topic_names).await {
                tracing::error!("Failed to index roadmap {} under its topics: {}", roadmap_id, e);
            }
        });

        let written = self.roadmaps.put(&roadmap).await;

        if let Err(e) = index.await {
            tracing::error!("Topic index task did not complete: {}", e);
        }

        written?;
        Ok(roadmap)
    }

    pub async fn add_course_to_roadmap(
        &self,
        course_id: &str,
        roadmap_id: &str,
    ) -> Result<(), LearningError> {
        let mut roadmap = self.roadmaps.get(roadmap_id).await?;
        roadmap.course_ids.push(course_id.to_string());
        self.upsert_roadmap(roadmap).await?;
        Ok(())
    }

    pub async fn roadmaps_by_user(&self, user_id: &str) -> Result<Vec<Roadmap>, LearningError> {
        let user = self.users.get_by_name(user_id).await?;
        if user.roadmaps.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.roadmaps.get_by_ids(&user.roadmaps).await?)
    }

    /// Roadmaps indexed under any of the user's topics, first-seen order,
    /// flagged `liked` when the user holds them.
    pub async fn roadmap_feed(&self, user_id: &str) -> Result<Vec<Roadmap>, LearningError> {
        let user = self.users.get_by_name(user_id).await?;

        let mut seen_topics = HashSet::new();
        let topic_names: Vec<String> = user
            .topics
            .iter()
            .filter(|t| seen_topics.insert(t.as_str()))
            .cloned()
            .collect();
        if topic_names.is_empty() {
            return Ok(Vec::new());
        }

        let topics = self.topics.get_by_names(&topic_names).await?;
        let mut seen = HashSet::new();
        let roadmap_ids: Vec<String> = topics
            .into_iter()
            .flat_map(|t| t.roadmap_ids)
            .filter(|id| seen.insert(id.clone()))
            .collect();
        if roadmap_ids.is_empty() {
            return Ok(Vec::new());
        }

        let liked: HashSet<&str> = user.roadmaps.iter().map(|s| s.as_str()).collect();
        let mut feed = self.roadmaps.get_by_ids(&roadmap_ids).await?;
        for roadmap in &mut feed {
            roadmap.liked = liked.contains(roadmap.id.as_str());
        }
        Ok(feed)
    }

    /// Records the like on the user and bumps the roadmap's count. Both
    /// sides run concurrently; either failure is returned.
    pub async fn like_roadmap(&self, user_id: &str, roadmap_id: &str) -> Result<(), LearningError> {
        let on_user = async {
            let mut user = self.users.get_by_name(user_id).await?;
            if !user.roadmaps.iter().any(|id| id == roadmap_id) {
                user.roadmaps.push(roadmap_id.to_string());
            }
            self.users.upsert(&user).await
        };
        let on_roadmap = async {
            let mut roadmap = self.roadmaps.get(roadmap_id).await?;
            roadmap.likes += 1;
            self.roadmaps.put(&roadmap).await
        };

        let (user_result, roadmap_result) = tokio::join!(on_user, on_roadmap);
        user_result?;
        roadmap_result?;
        Ok(())
    }
}

/// Adds `roadmap_id` to each topic's index, writing only topics that change.
async fn index_roadmap(
    topics: &dyn TopicStore,
    roadmap_id: &str,
    names: &[String],
) -> Result<(), StoreError> {
    // A batch write may not name the same key twice
    let mut seen = HashSet::new();
    let names: Vec<String> = names
        .iter()
        .filter(|n| seen.insert(n.as_str()))
        .cloned()
        .collect();
    if names.is_empty() {
        return Ok(());
    }

    let changed: Vec<Topic> = topics
        .get_by_names(&names)
        .await?
        .into_iter()
        .filter_map(|mut topic| {
            if topic.roadmap_ids.iter().any(|id| id == roadmap_id) {
                None
            } else {
                topic.roadmap_ids.push(roadmap_id.to_string());
                Some(topic)
            }
        })
        .collect();

    if changed.is_empty() {
        return Ok(());
    }
    topics.bulk_write(&changed).await
}
