use loco_rs::prelude::*;
use sea_orm::*;

use crate::models::_entities::{accounts, bindings, servers};
use crate::models::{Account, Binding, Server};
use crate::models::account::CreateAccountRequest;
use crate::models::binding::CreateBindingRequest;
use crate::models::server::CreateServerRequest;

pub struct DatabaseSeeder;

impl DatabaseSeeder {
    /// Seed the database with initial development data
    pub async fn seed_development(db: &DatabaseConnection) -> Result<()> {
        tracing::info!("Starting development database seeding...");

        let server = Server::create(
            db,
            CreateServerRequest {
                port: 8081,
                base_url: "http://127.0.0.1:8081".to_string(),
                timeout: Some(30),
                retries: Some(3),
                wait_between_retries: Some(2),
                max_requests_queued: Some(10),
                device_id: None,
            },
        )
        .await?;
        tracing::info!("Created server on port {}", server.port);

        let accounts = Self::create_dev_accounts(db).await?;
        tracing::info!("Created {} accounts", accounts.len());

        for account in &accounts {
            Binding::create(
                db,
                CreateBindingRequest {
                    server_id: server.id,
                    account_id: account.id,
                    batch_id: account.batch_id.clone(),
                },
            )
            .await?;
        }
        tracing::info!("Created bindings for dev accounts");

        tracing::info!("Development database seeding completed successfully");
        Ok(())
    }

    async fn create_dev_accounts(db: &DatabaseConnection) -> Result<Vec<Account>> {
        let seed_data = [
            ("081200000001", "alice@example.dev"),
            ("081200000002", "bob@example.dev"),
            ("081200000003", "charlie@example.dev"),
        ];

        let mut created = Vec::new();
        for (msisdn, email) in seed_data {
            let account = Account::create(
                db,
                CreateAccountRequest {
                    msisdn: msisdn.to_string(),
                    batch_id: "batch-dev".to_string(),
                    email: email.to_string(),
                    pin: Some("123456".to_string()),
                    notes: None,
                },
            )
            .await?;
            created.push(account);
        }

        Ok(created)
    }

    /// Check if database has been seeded
    pub async fn is_seeded(db: &DatabaseConnection) -> Result<bool> {
        let server_count = servers::Entity::find().count(db).await?;
        Ok(server_count > 0)
    }

    /// Clear all seeded data (for testing)
    pub async fn clear_all(db: &DatabaseConnection) -> Result<()> {
        tracing::warn!("Clearing all database data...");

        bindings::Entity::delete_many().exec(db).await?;
        accounts::Entity::delete_many().exec(db).await?;
        servers::Entity::delete_many().exec(db).await?;

        tracing::info!("All database data cleared");
        Ok(())
    }
}
