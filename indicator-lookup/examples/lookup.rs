use std::env;
use std::error::Error;

use indicator_lookup::{BatchLookup, Entity, EntityType, LookupOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::from_filename(".env.local").ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "indicator_lookup=debug,sumologic=debug".into()),
        )
        .init();

    let options = LookupOptions {
        access_id: env::var("SUMO_ACCESS_ID")?,
        access_key: env::var("SUMO_ACCESS_KEY")?,
        endpoint: env::var("SUMO_ENDPOINT").ok(),
        query: env::var("SUMO_QUERY").unwrap_or_else(|_| "\"{{entity}}\"".to_string()),
        from: env::var("SUMO_FROM").unwrap_or_else(|_| "-15m".to_string()),
        to: env::var("SUMO_TO").unwrap_or_else(|_| "now".to_string()),
        time_zone: env::var("SUMO_TIME_ZONE").unwrap_or_else(|_| "UTC".to_string()),
        ..LookupOptions::default()
    };

    let entities: Vec<Entity> = env::args()
        .skip(1)
        .map(|value| Entity::new(EntityType::Ipv4, value))
        .collect();
    if entities.is_empty() {
        eprintln!("usage: lookup <ip> [<ip> ...]");
        return Ok(());
    }

    let lookup = BatchLookup::from_options(options)?;
    let results = lookup.lookup(entities).await?;

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
