//! Mints an access token for a user, creating the account record if it
//! does not exist yet. Operational tool for provisioning and local testing;
//! credential flows live outside this service.
//!
//! Usage: mint-token <email> [display name]

use std::sync::Arc;

use anyhow::{bail, Result};

use rota_api::jwt::{AuthService, JwtAuthService};
use rota_common::Config;
use rota_core::{User, UserRepo};
use rota_store::{PgStore, Store};

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(email) = args.next() else {
        bail!("usage: mint-token <email> [display name]");
    };
    let name = args.next();

    let config = Config::from_env();
    let pg = PgStore::connect(&config.database_url).await?;
    pg.ensure_schema().await?;
    let store: Arc<dyn Store> = Arc::new(pg);
    let users = UserRepo::new(store);

    let user = match users.get_by_email(&email).await? {
        Some(user) => user,
        None => {
            let Some(name) = name else {
                bail!("no account for {email}; pass a display name to create one");
            };
            let user = User::new(&email, &name);
            users.save(&user).await?;
            println!("created user {} ({})", user.id, user.email);
            user
        }
    };

    let auth = JwtAuthService::new(&config.jwt_secret, config.jwt_issuer.clone());
    println!("{}", auth.create_token(&user.id)?);
    Ok(())
}
