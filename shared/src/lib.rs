pub mod appsync;
pub mod catalog;
pub mod challenge;
pub mod config;
pub mod courses;
pub mod custom_roadmap;
pub mod daily;
pub mod dynamo;
pub mod error;
pub mod generator;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod roadmaps;
pub mod topics;
pub mod types;
pub mod users;

use aws_sdk_dynamodb::Client as DynamoClient;
use config::Config;
use courses::{CourseStore, DynamoCourseStore};
use roadmaps::{DynamoRoadmapStore, RoadmapStore};
use std::sync::Arc;
use topics::{DynamoTopicStore, TopicStore};
use users::{DynamoUserStore, UserStore};

/// Store handles shared by every service in a lambda.
#[derive(Clone)]
pub struct Stores {
    pub courses: Arc<dyn CourseStore>,
    pub topics: Arc<dyn TopicStore>,
    pub users: Arc<dyn UserStore>,
    pub roadmaps: Arc<dyn RoadmapStore>,
}

impl Stores {
    pub fn dynamo(client: DynamoClient, config: &Config) -> Self {
        Self {
            courses: Arc::new(DynamoCourseStore::new(
                client.clone(),
                &config.courses_table,
                &config.courses_url_index,
            )),
            topics: Arc::new(DynamoTopicStore::new(client.clone(), &config.topics_table)),
            users: Arc::new(DynamoUserStore::new(client.clone(), &config.users_table)),
            roadmaps: Arc::new(DynamoRoadmapStore::new(client, &config.roadmaps_table)),
        }
    }
}
