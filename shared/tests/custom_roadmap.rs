use async_trait::async_trait;
use qriosity_shared::courses::CourseStore;
use qriosity_shared::custom_roadmap::CustomRoadmapRequester;
use qriosity_shared::error::{GeneratorError, LearningError};
use qriosity_shared::generator::RoadmapGenerator;
use qriosity_shared::memory::{MemoryCourseStore, MemoryUserStore};
use qriosity_shared::types::{Course, Roadmap, User};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct StubGenerator {
    courses: Vec<Course>,
    fail: bool,
    calls: AtomicUsize,
}

impl StubGenerator {
    fn proposing(urls: &[&str]) -> Self {
        Self {
            courses: urls
                .iter()
                .map(|url| Course {
                    title: format!("Course at {}", url),
                    url: url.to_string(),
                    author: "model".into(),
                    ..Default::default()
                })
                .collect(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            courses: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RoadmapGenerator for StubGenerator {
    async fn generate(&self, prompt: &str) -> Result<Roadmap, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(GeneratorError::Unavailable("generator is down".into()));
        }
        Ok(Roadmap {
            title: prompt.to_string(),
            courses: self.courses.clone(),
            is_custom: true,
            ..Default::default()
        })
    }
}

fn stored_course(id: &str, url: &str, author: &str) -> Course {
    Course {
        id: id.into(),
        url: url.into(),
        author: author.into(),
        title: "Stored".into(),
        ..Default::default()
    }
}

fn user(name: &str, gen_usages: i64) -> User {
    User {
        name: name.into(),
        gen_usages_remaining: gen_usages,
        ..Default::default()
    }
}

fn requester(
    generator: Arc<StubGenerator>,
    courses: Arc<MemoryCourseStore>,
    users: Arc<MemoryUserStore>,
) -> CustomRoadmapRequester {
    CustomRoadmapRequester::new(generator, courses, users, "Qriosity-AI")
}

#[tokio::test]
async fn known_urls_are_reused_and_new_ones_stored_once() {
    let courses = Arc::new(MemoryCourseStore::with_courses([stored_course(
        "c1",
        "https://a",
        "alice",
    )]));
    let users = Arc::new(MemoryUserStore::with_users([user("u1", 5)]));
    let generator = Arc::new(StubGenerator::proposing(&["https://a", "https://b"]));

    let roadmap = requester(generator, courses.clone(), users.clone())
        .request("u1", "learn rust")
        .await
        .unwrap();

    assert_eq!(roadmap.courses.len(), 2);
    let first = &roadmap.courses[0];
    assert_eq!(first.id, "c1");
    assert_eq!(first.author, "alice");
    // Other generated fields are kept as proposed
    assert_eq!(first.title, "Course at https://a");

    let second = &roadmap.courses[1];
    assert!(!second.id.is_empty());
    assert_ne!(second.id, "c1");
    assert_eq!(second.author, "Qriosity-AI");

    assert_eq!(roadmap.course_ids, vec!["c1".to_string(), second.id.clone()]);

    let stored_b: Vec<Course> = courses
        .snapshot()
        .into_iter()
        .filter(|c| c.url == "https://b")
        .collect();
    assert_eq!(stored_b.len(), 1);
    assert_eq!(stored_b[0].id, second.id);
    assert_eq!(courses.write_count(), 1);

    assert_eq!(users.get("u1").unwrap().gen_usages_remaining, 4);
}

#[tokio::test]
async fn generator_failure_writes_nothing() {
    let courses = Arc::new(MemoryCourseStore::default());
    let users = Arc::new(MemoryUserStore::with_users([user("u1", 5)]));

    let err = requester(Arc::new(StubGenerator::failing()), courses.clone(), users.clone())
        .request("u1", "learn rust")
        .await
        .unwrap_err();

    assert!(matches!(err, LearningError::Generator(_)));
    assert_eq!(courses.write_count(), 0);
    assert_eq!(users.write_count(), 0);
    assert_eq!(users.get("u1").unwrap().gen_usages_remaining, 5);
}

#[tokio::test]
async fn quota_failure_does_not_fail_the_request() {
    let courses = Arc::new(MemoryCourseStore::default());
    let users = Arc::new(MemoryUserStore::with_users([user("u1", 5)]).with_failing_writes(true));
    let generator = Arc::new(StubGenerator::proposing(&["https://b"]));

    let roadmap = requester(generator, courses.clone(), users.clone())
        .request("u1", "learn rust")
        .await
        .unwrap();

    assert_eq!(roadmap.courses.len(), 1);
    assert_eq!(courses.snapshot().len(), 1);
    assert_eq!(users.get("u1").unwrap().gen_usages_remaining, 5);
}

#[tokio::test]
async fn unknown_user_still_gets_a_roadmap() {
    let courses = Arc::new(MemoryCourseStore::default());
    let users = Arc::new(MemoryUserStore::default());
    let generator = Arc::new(StubGenerator::proposing(&["https://b"]));

    let roadmap = requester(generator, courses, users.clone())
        .request("ghost", "learn rust")
        .await
        .unwrap();

    assert_eq!(roadmap.courses.len(), 1);
    assert!(users.get("ghost").is_none());
}

#[tokio::test]
async fn concurrent_requests_each_charge_once() {
    let courses = Arc::new(MemoryCourseStore::default());
    let users = Arc::new(MemoryUserStore::with_users([user("u1", 5)]));
    let generator = Arc::new(StubGenerator::proposing(&[]));
    let requester = Arc::new(requester(generator.clone(), courses, users.clone()));

    let a = tokio::spawn({
        let requester = Arc::clone(&requester);
        async move { requester.request("u1", "one").await }
    });
    let b = tokio::spawn({
        let requester = Arc::clone(&requester);
        async move { requester.request("u1", "two").await }
    });

    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    assert_eq!(users.get("u1").unwrap().gen_usages_remaining, 3);
}

#[tokio::test]
async fn empty_generation_skips_course_store() {
    let courses = Arc::new(MemoryCourseStore::default().with_failing_reads(true));
    let users = Arc::new(MemoryUserStore::with_users([user("u1", 1)]));
    let generator = Arc::new(StubGenerator::proposing(&[]));

    let roadmap = requester(generator, courses.clone(), users.clone())
        .request("u1", "nothing")
        .await
        .unwrap();

    assert!(roadmap.courses.is_empty());
    assert!(roadmap.course_ids.is_empty());
    assert_eq!(courses.write_count(), 0);
    assert_eq!(users.get("u1").unwrap().gen_usages_remaining, 0);
}

#[tokio::test]
async fn course_lookup_failure_is_returned_after_charging() {
    let courses = Arc::new(MemoryCourseStore::default().with_failing_reads(true));
    let users = Arc::new(MemoryUserStore::with_users([user("u1", 2)]));
    let generator = Arc::new(StubGenerator::proposing(&["https://a"]));

    let err = requester(generator, courses.clone(), users.clone())
        .request("u1", "learn rust")
        .await
        .unwrap_err();

    assert!(matches!(err, LearningError::Store(_)));
    assert_eq!(courses.write_count(), 0);
    // The charge task is joined before the error comes back
    assert_eq!(users.get("u1").unwrap().gen_usages_remaining, 1);
}

#[tokio::test]
async fn insert_failure_is_returned() {
    let courses = Arc::new(MemoryCourseStore::default().with_failing_writes(true));
    let users = Arc::new(MemoryUserStore::with_users([user("u1", 2)]));
    let generator = Arc::new(StubGenerator::proposing(&["https://new"]));

    let err = requester(generator, courses.clone(), users)
        .request("u1", "learn rust")
        .await
        .unwrap_err();

    assert!(matches!(err, LearningError::Store(_)));
    assert!(courses.snapshot().is_empty());
}

#[tokio::test]
async fn repeated_unseen_url_becomes_separate_records() {
    let courses = Arc::new(MemoryCourseStore::default());
    let users = Arc::new(MemoryUserStore::with_users([user("u1", 2)]));
    let generator = Arc::new(StubGenerator::proposing(&["https://dup", "https://dup"]));

    let roadmap = requester(generator, courses.clone(), users)
        .request("u1", "learn rust")
        .await
        .unwrap();

    assert_ne!(roadmap.courses[0].id, roadmap.courses[1].id);
    let stored = courses
        .get_by_urls(&["https://dup".to_string()])
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
}

#[tokio::test]
async fn repeated_known_url_reuses_one_record() {
    let courses = Arc::new(MemoryCourseStore::with_courses([stored_course(
        "c1",
        "https://a",
        "alice",
    )]));
    let users = Arc::new(MemoryUserStore::with_users([user("u1", 2)]));
    let generator = Arc::new(StubGenerator::proposing(&["https://a", "https://a"]));

    let roadmap = requester(generator, courses.clone(), users)
        .request("u1", "learn rust")
        .await
        .unwrap();

    assert_eq!(roadmap.course_ids, vec!["c1".to_string(), "c1".to_string()]);
    assert_eq!(courses.write_count(), 0);
}
