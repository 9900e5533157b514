use lambda_runtime::Error;
use qriosity_shared::appsync::{to_response, AppSyncEvent};
use qriosity_shared::daily::DailyChallenges;
use qriosity_shared::error::LearningError;
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionArgs {
    user_id: String,
}

#[derive(Deserialize)]
struct AnswerArgs {
    username: String,
    question: String,
    answer: String,
}

pub(crate) async fn function_handler(
    event: AppSyncEvent,
    challenges: &DailyChallenges,
) -> Result<Value, Error> {
    tracing::info!(
        "Daily challenge resolver invoked: {}.{}",
        event.parent_type_name,
        event.field_name
    );

    dispatch(&event, challenges).await.map_err(|e| {
        tracing::error!("{}.{} failed: {}", event.parent_type_name, event.field_name, e);
        Error::from(e)
    })
}

async fn dispatch(event: &AppSyncEvent, challenges: &DailyChallenges) -> Result<Value, LearningError> {
    match (event.parent_type_name.as_str(), event.field_name.as_str()) {
        ("Query", "dailyChallenge") => {
            let args: QuestionArgs = event.arguments()?;
            to_response(&challenges.question_for(&args.user_id).await?)
        }
        ("Mutation", "dailyChallenge") => {
            let args: AnswerArgs = event.arguments()?;
            let response = challenges
                .submit(&args.username, &args.question, &args.answer)
                .await?;
            to_response(&response)
        }
        _ => Err(LearningError::UnhandledOperation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use qriosity_shared::challenge::ChallengeModel;
    use qriosity_shared::error::GeneratorError;
    use qriosity_shared::memory::MemoryUserStore;
    use qriosity_shared::types::{Problem, Rating, User};
    use serde_json::json;
    use std::sync::Arc;

    struct EchoModel;

    #[async_trait]
    impl ChallengeModel for EchoModel {
        async fn get_question(&self, topic: &str) -> Result<Problem, GeneratorError> {
            Ok(Problem {
                question: format!("What is {}?", topic),
                categories: vec![topic.to_string()],
                problem_type: "open".into(),
            })
        }

        async fn rate_question(&self, _question: &str, _answer: &str) -> Result<Rating, GeneratorError> {
            Ok(Rating {
                rating: 9,
                insight: "solid".into(),
            })
        }
    }

    fn challenges(user: User) -> (DailyChallenges, Arc<MemoryUserStore>) {
        let users = Arc::new(MemoryUserStore::with_users([user]));
        (DailyChallenges::new(users.clone(), Arc::new(EchoModel)), users)
    }

    fn event(parent: &str, arguments: Value) -> AppSyncEvent {
        serde_json::from_value(json!({
            "parentTypeName": parent,
            "fieldName": "dailyChallenge",
            "arguments": arguments,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn question_uses_a_user_topic() {
        let (challenges, _) = challenges(User {
            name: "ana".into(),
            topics: vec!["rust".into()],
            ..Default::default()
        });

        let out = function_handler(event("Query", json!({"userId": "ana"})), &challenges)
            .await
            .unwrap();

        assert_eq!(out["question"], "What is rust?");
        assert_eq!(out["type"], "open");
    }

    #[tokio::test]
    async fn user_without_topics_is_rejected() {
        let (challenges, _) = challenges(User {
            name: "ana".into(),
            ..Default::default()
        });

        let err = function_handler(event("Query", json!({"userId": "ana"})), &challenges)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("no topics"));
    }

    #[tokio::test]
    async fn answer_is_rated_and_attempt_recorded() {
        let (challenges, users) = challenges(User {
            name: "ana".into(),
            daily_challenges_remaining: 1,
            daily_challenge_available: true,
            ..Default::default()
        });

        let out = function_handler(
            event(
                "Mutation",
                json!({"username": "ana", "question": "q", "answer": "a"}),
            ),
            &challenges,
        )
        .await
        .unwrap();

        assert_eq!(out["rating"], 9);
        assert_eq!(out["left"], 0);

        let stored = users.get("ana").unwrap();
        assert!(!stored.daily_challenge_available);
        assert_eq!(stored.daily_challenge_streak, 1);
    }

    #[tokio::test]
    async fn other_fields_are_unhandled() {
        let (challenges, _) = challenges(User::default());
        let err = function_handler(
            serde_json::from_value(json!({
                "parentTypeName": "Query",
                "fieldName": "leaderboard"
            }))
            .unwrap(),
            &challenges,
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "unhandled operation");
    }
}
