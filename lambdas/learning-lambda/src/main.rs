use aws_sdk_dynamodb::Client as DynamoClient;
use handler::LearningState;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use qriosity_shared::appsync::AppSyncEvent;
use qriosity_shared::catalog::Catalog;
use qriosity_shared::config::Config;
use qriosity_shared::custom_roadmap::CustomRoadmapRequester;
use qriosity_shared::generator::{http_client, HttpRoadmapGenerator};
use qriosity_shared::Stores;
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

    // Clients are built once and reused across invocations
    let aws_config = aws_config::load_from_env().await;
    let stores = Stores::dynamo(DynamoClient::new(&aws_config), &config);

    let client = http_client(config.http_timeout)?;
    let generator = HttpRoadmapGenerator::new(client, config.require_generator_url()?);

    let state = Arc::new(LearningState {
        catalog: Catalog::new(
            Arc::clone(&stores.courses),
            Arc::clone(&stores.topics),
            Arc::clone(&stores.users),
            Arc::clone(&stores.roadmaps),
        ),
        requester: CustomRoadmapRequester::new(
            Arc::new(generator),
            Arc::clone(&stores.courses),
            Arc::clone(&stores.users),
            &config.generated_author,
        ),
    });

    run(service_fn(move |event: LambdaEvent<AppSyncEvent>| {
        let state = Arc::clone(&state);
        async move { handler::function_handler(event.payload, &state).await }
    }))
    .await
}
