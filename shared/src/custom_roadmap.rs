//! Custom roadmap requests: generate, reconcile against stored courses by
//! url, persist the novel ones and charge the user one generation.

use crate::courses::CourseStore;
use crate::error::{LearningError, StoreError};
use crate::generator::RoadmapGenerator;
use crate::types::{Course, Roadmap};
use crate::users::UserStore;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub struct CustomRoadmapRequester {
    generator: Arc<dyn RoadmapGenerator>,
    courses: Arc<dyn CourseStore>,
    users: Arc<dyn UserStore>,
    generated_author: String,
}

impl CustomRoadmapRequester {
    pub fn new(
        generator: Arc<dyn RoadmapGenerator>,
        courses: Arc<dyn CourseStore>,
        users: Arc<dyn UserStore>,
        generated_author: &str,
    ) -> Self {
        Self {
            generator,
            courses,
            users,
            generated_author: generated_author.to_string(),
        }
    }

    /// Returns the generated roadmap with every course carrying a stored id.
    ///
    /// The quota charge runs alongside reconciliation and is joined before
    /// returning. Its failure is logged and never reaches the caller.
    pub async fn request(&self, user_id: &str, prompt: &str) -> Result<Roadmap, LearningError> {
        tracing::info!("User {} requested a custom roadmap for prompt {}", user_id, prompt);

        let mut roadmap = self.generator.generate(prompt).await?;

        let quota = self.charge_generation(user_id);
        let reconciled = self.reconcile(&mut roadmap).await;

        if let Err(e) = quota.await {
            tracing::error!("Quota task for user {} did not complete: {}", user_id, e);
        }

        reconciled?;
        Ok(roadmap)
    }

    /// At-most-once, best-effort decrement of `genUsagesRemaining`.
    fn charge_generation(&self, user_id: &str) -> JoinHandle<()> {
        let users = Arc::clone(&self.users);
        let user_id = user_id.to_string();
        tokio::spawn(async move {
            match users.decrement_gen_usages(&user_id).await {
                Ok(remaining) => {
                    tracing::info!("User {} has {} generations left", user_id, remaining)
                }
                Err(e) => tracing::error!("Failed to update user {}: {}", user_id, e),
            }
        })
    }

    async fn reconcile(&self, roadmap: &mut Roadmap) -> Result<(), StoreError> {
        let urls: Vec<String> = {
            let mut seen = HashSet::new();
            roadmap
                .courses
                .iter()
                .filter(|c| seen.insert(c.url.as_str()))
                .map(|c| c.url.clone())
                .collect()
        };

        let existing = if urls.is_empty() {
            Vec::new()
        } else {
            self.courses.get_by_urls(&urls).await?
        };

        let mut by_url: HashMap<&str, &Course> = HashMap::new();
        for course in &existing {
            by_url.entry(course.url.as_str()).or_insert(course);
        }

        // Each generated course is matched on its own, so two proposals with
        // the same unseen url both become new records.
        let mut new_courses = Vec::new();
        let reconciled: Vec<Course> = roadmap
            .courses
            .drain(..)
            .map(|mut course| {
                match by_url.get(course.url.as_str()) {
                    Some(stored) => {
                        course.id = stored.id.clone();
                        course.author = stored.author.clone();
                    }
                    None => {
                        course.id = uuid::Uuid::new_v4().to_string();
                        course.author = self.generated_author.clone();
                        new_courses.push(course.clone());
                    }
                }
                course
            })
            .collect();

        tracing::info!(
            "Reconciled {} generated courses: {} existing, {} new",
            reconciled.len(),
            reconciled.len() - new_courses.len(),
            new_courses.len()
        );

        if !new_courses.is_empty() {
            self.courses.bulk_insert(&new_courses).await?;
        }

        roadmap.course_ids = reconciled.iter().map(|c| c.id.clone()).collect();
        roadmap.courses = reconciled;
        Ok(())
    }
}
