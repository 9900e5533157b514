use crate::challenge::ChallengeModel;
use crate::error::LearningError;
use crate::types::{ChallengeResponse, Problem, Rating, User};
use crate::users::UserStore;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use std::sync::Arc;

/// Ratings above this extend the streak.
const PASSING_RATING: i64 = 5;

pub struct DailyChallenges {
    users: Arc<dyn UserStore>,
    model: Arc<dyn ChallengeModel>,
}

impl DailyChallenges {
    pub fn new(users: Arc<dyn UserStore>, model: Arc<dyn ChallengeModel>) -> Self {
        Self { users, model }
    }

    /// A question on one of the user's topics, picked at random.
    pub async fn question_for(&self, user_id: &str) -> Result<Problem, LearningError> {
        let user = self.users.get_by_name(user_id).await?;
        let topic = user
            .topics
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| {
                LearningError::Precondition(format!("user {} has no topics", user_id))
            })?;

        tracing::info!("Daily challenge for {} on topic {}", user_id, topic);
        Ok(self.model.get_question(&topic).await?)
    }

    pub async fn submit(
        &self,
        username: &str,
        question: &str,
        answer: &str,
    ) -> Result<ChallengeResponse, LearningError> {
        let rating = self.model.rate_question(question, answer).await?;

        let mut user = self.users.get_by_name(username).await?;
        record_attempt(&mut user, &rating, Utc::now());
        self.users.upsert(&user).await?;

        Ok(ChallengeResponse {
            user_id: username.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            rating: rating.rating,
            insight: rating.insight,
            left: user.daily_challenges_remaining,
        })
    }
}

/// Spends one attempt and updates the streak for a passing answer.
pub fn record_attempt(user: &mut User, rating: &Rating, now: DateTime<Utc>) {
    user.daily_challenges_remaining = (user.daily_challenges_remaining - 1).max(0);
    if user.daily_challenges_remaining == 0 {
        user.daily_challenge_available = false;
    }

    if rating.rating <= PASSING_RATING {
        return;
    }

    let today = now.date_naive();
    match user.last_daily_challenge.map(|t| t.date_naive()) {
        Some(last) if last == today => {}
        Some(last) if today.pred_opt() == Some(last) => {
            user.daily_challenge_streak += 1;
            user.last_daily_challenge = Some(now);
        }
        _ => {
            user.daily_challenge_streak = 1;
            user.last_daily_challenge = Some(now);
        }
    }
}
