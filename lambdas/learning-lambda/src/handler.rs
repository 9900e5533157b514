use lambda_runtime::Error;
use qriosity_shared::appsync::{to_response, AppSyncEvent, Success};
use qriosity_shared::catalog::Catalog;
use qriosity_shared::custom_roadmap::CustomRoadmapRequester;
use qriosity_shared::error::LearningError;
use qriosity_shared::types::{Course, Pagination, Roadmap};
use serde::Deserialize;
use serde_json::Value;

pub(crate) struct LearningState {
    pub catalog: Catalog,
    pub requester: CustomRoadmapRequester,
}

#[derive(Deserialize)]
struct IdArgs {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserArgs {
    user_id: String,
}

#[derive(Deserialize)]
struct NameArgs {
    name: String,
}

#[derive(Deserialize)]
struct CoursesArgs {
    #[serde(default)]
    pagination: Pagination,
}

#[derive(Deserialize)]
struct AddTopicsArgs {
    #[serde(default)]
    names: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseAddedArgs {
    course_id: String,
    roadmap_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LikeArgs {
    user_id: String,
    roadmap_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomRoadmapArgs {
    user_id: String,
    prompt: String,
}

/// Resolver entry point. Failures are logged and surface to AppSync as a
/// single error message.
pub(crate) async fn function_handler(
    event: AppSyncEvent,
    state: &LearningState,
) -> Result<Value, Error> {
    tracing::info!(
        "Learning resolver invoked: {}.{}",
        event.parent_type_name,
        event.field_name
    );

    dispatch(&event, state).await.map_err(|e| {
        tracing::error!(
            "{}.{} failed: {}",
            event.parent_type_name,
            event.field_name,
            e
        );
        Error::from(e)
    })
}

async fn dispatch(event: &AppSyncEvent, state: &LearningState) -> Result<Value, LearningError> {
    let catalog = &state.catalog;

    match (event.parent_type_name.as_str(), event.field_name.as_str()) {
        ("Query", "getRoadmapById") => {
            let args: IdArgs = event.arguments()?;
            to_response(&catalog.get_roadmap(&args.id).await?)
        }
        ("Query", "getCourseById") => {
            let args: IdArgs = event.arguments()?;
            to_response(&catalog.get_course(&args.id).await?)
        }
        ("Query", "getAllTopics") => to_response(&catalog.all_topics().await?),
        ("Query", "getCourses") => {
            let args: CoursesArgs = event.arguments()?;
            to_response(&catalog.list_courses(args.pagination).await?)
        }
        ("Query", "getRoadmaps") => to_response(&catalog.all_roadmaps().await?),
        ("Query", "getRoadmapsByUser") => {
            let args: UserArgs = event.arguments()?;
            to_response(&catalog.roadmaps_by_user(&args.user_id).await?)
        }
        ("Query", "getRoadmapFeed") => {
            let args: UserArgs = event.arguments()?;
            to_response(&catalog.roadmap_feed(&args.user_id).await?)
        }
        ("Query", "getUserByName") => {
            let args: NameArgs = event.arguments()?;
            to_response(&catalog.get_user(&args.name).await?)
        }
        ("Query", "getUsers") => to_response(&catalog.all_users().await?),
        ("Mutation", "addTopics") => {
            let args: AddTopicsArgs = event.arguments()?;
            to_response(&catalog.add_topics(&args.names).await?)
        }
        ("Mutation", "upsertCourse") => {
            let course: Course = event.input()?;
            to_response(&catalog.upsert_course(course).await?)
        }
        ("Mutation", "upsertRoadmap") => {
            let roadmap: Roadmap = event.input()?;
            to_response(&catalog.upsert_roadmap(roadmap).await?)
        }
        ("Mutation", "courseAddedToRoadmap") => {
            let args: CourseAddedArgs = event.arguments()?;
            catalog
                .add_course_to_roadmap(&args.course_id, &args.roadmap_id)
                .await?;
            to_response(&Success::ok())
        }
        ("Mutation", "userLikedRoadmap") => {
            let args: LikeArgs = event.arguments()?;
            catalog.like_roadmap(&args.user_id, &args.roadmap_id).await?;
            to_response(&Success::ok())
        }
        ("Mutation", "customRoadmapRequested") => {
            let args: CustomRoadmapArgs = event.arguments()?;
            let roadmap = state.requester.request(&args.user_id, &args.prompt).await?;
            to_response(&roadmap)
        }
        _ => Err(LearningError::UnhandledOperation),
    }
}
