use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use qriosity_shared::appsync::AppSyncEvent;
use qriosity_shared::challenge::HttpChallengeModel;
use qriosity_shared::config::Config;
use qriosity_shared::daily::DailyChallenges;
use qriosity_shared::generator::http_client;
use qriosity_shared::users::DynamoUserStore;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .without_time()
        .init();

    let config = Config::from_env()?;

    let aws_config = aws_config::load_from_env().await;
    let users = DynamoUserStore::new(DynamoClient::new(&aws_config), &config.users_table);

    let client = http_client(config.http_timeout)?;
    let model = HttpChallengeModel::new(client, config.require_challenge_url()?);

    let challenges = Arc::new(DailyChallenges::new(Arc::new(users), Arc::new(model)));

    run(service_fn(move |event: LambdaEvent<AppSyncEvent>| {
        let challenges = Arc::clone(&challenges);
        async move { handler::function_handler(event.payload, &challenges).await }
    }))
    .await
}
