use apiclient_http::{ApiClient, ApiClientError, Query};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut client = ApiClient::from_env()?;
    if let Ok(token) = std::env::var("API_TOKEN") {
        client.set_token(token);
    }

    let created = client
        .post("products", &json!({"name": "Widget", "price": 9.5}), ())
        .await?;
    println!("created: {created:?}");

    let listing = client
        .get("products", Query::new().push("page", 1).push("limit", 20))
        .await?;
    println!("products: {listing:?}");

    match client.get("products/does-not-exist", ()).await {
        Ok(payload) => println!("unexpected: {payload:?}"),
        Err(ApiClientError::Api(err)) => println!("{}", err.to_json()),
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
