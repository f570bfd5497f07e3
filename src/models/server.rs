use loco_rs::prelude::*;
use sea_orm::*;
use serde::{Deserialize, Serialize};

use crate::models::_entities::{prelude::*, servers};
use crate::services::errors::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub id: i32,
    pub port: i32,
    pub base_url: String,
    pub timeout: i32,
    pub retries: i32,
    pub wait_between_retries: i32,
    pub max_requests_queued: i32,
    pub is_active: bool,
    pub device_id: Option<String>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateServerRequest {
    pub port: i32,
    pub base_url: String,
    pub timeout: Option<i32>,
    pub retries: Option<i32>,
    pub wait_between_retries: Option<i32>,
    pub max_requests_queued: Option<i32>,
    pub device_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateServerRequest {
    pub base_url: Option<String>,
    pub timeout: Option<i32>,
    pub retries: Option<i32>,
    pub wait_between_retries: Option<i32>,
    pub max_requests_queued: Option<i32>,
    pub is_active: Option<bool>,
    pub device_id: Option<String>,
}

impl From<servers::Model> for Server {
    fn from(model: servers::Model) -> Self {
        Self {
            id: model.id,
            port: model.port,
            base_url: model.base_url,
            timeout: model.timeout,
            retries: model.retries,
            wait_between_retries: model.wait_between_retries,
            max_requests_queued: model.max_requests_queued,
            is_active: model.is_active,
            device_id: model.device_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl Server {
    pub async fn create(db: &DatabaseConnection, req: CreateServerRequest) -> AppResult<Server> {
        if Servers::find()
            .filter(servers::Column::Port.eq(req.port))
            .one(db)
            .await?
            .is_some()
        {
            return Err(AppError::validation("server_port_taken", "Port already registered"));
        }

        let now = chrono::Utc::now().naive_utc();
        let server = servers::ActiveModel {
            port: Set(req.port),
            base_url: Set(req.base_url),
            timeout: Set(req.timeout.unwrap_or(10)),
            retries: Set(req.retries.unwrap_or(3)),
            wait_between_retries: Set(req.wait_between_retries.unwrap_or(1)),
            max_requests_queued: Set(req.max_requests_queued.unwrap_or(5)),
            is_active: Set(true),
            device_id: Set(req.device_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let created = server.insert(db).await?;
        Ok(Server::from(created))
    }

    pub async fn find_by_id(db: &DatabaseConnection, id: i32) -> Result<Option<Server>> {
        let server = Servers::find_by_id(id).one(db).await?;
        Ok(server.map(Server::from))
    }

    pub async fn find_active(db: &DatabaseConnection) -> Result<Vec<Server>> {
        let servers = Servers::find()
            .filter(servers::Column::IsActive.eq(true))
            .order_by_asc(servers::Column::Id)
            .all(db)
            .await?;
        Ok(servers.into_iter().map(Server::from).collect())
    }

    pub async fn list(db: &DatabaseConnection, page: u64, per_page: u64) -> Result<(Vec<Server>, u64)> {
        let paginator = Servers::find()
            .order_by_desc(servers::Column::CreatedAt)
            .paginate(db, per_page);

        let total_pages = paginator.num_pages().await?;
        let servers = paginator.fetch_page(page - 1).await?;
        Ok((servers.into_iter().map(Server::from).collect(), total_pages))
    }

    pub async fn update(db: &DatabaseConnection, id: i32, req: UpdateServerRequest) -> Result<Server> {
        let server = Servers::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Server not found"))?;

        let mut server: servers::ActiveModel = server.into();

        if let Some(base_url) = req.base_url {
            server.base_url = Set(base_url);
        }
        if let Some(timeout) = req.timeout {
            server.timeout = Set(timeout);
        }
        if let Some(retries) = req.retries {
            server.retries = Set(retries);
        }
        if let Some(wait) = req.wait_between_retries {
            server.wait_between_retries = Set(wait);
        }
        if let Some(max_q) = req.max_requests_queued {
            server.max_requests_queued = Set(max_q);
        }
        if let Some(is_active) = req.is_active {
            server.is_active = Set(is_active);
        }
        if let Some(device_id) = req.device_id {
            server.device_id = Set(Some(device_id));
        }
        server.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = server.update(db).await?;
        Ok(Server::from(updated))
    }

    /// Soft-disable: refuses if the server still has an active binding.
    pub async fn disable(db: &DatabaseConnection, id: i32) -> AppResult<Server> {
        use crate::models::_entities::bindings;

        let has_active_binding = Bindings::find()
            .filter(bindings::Column::ServerId.eq(id))
            .filter(bindings::Column::UnboundAt.is_null())
            .one(db)
            .await?
            .is_some();

        if has_active_binding {
            return Err(AppError::validation(
                "server_has_active_binding",
                "Server has an active binding and cannot be disabled",
            ));
        }

        let server = Servers::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Server not found"))?;

        let mut server: servers::ActiveModel = server.into();
        server.is_active = Set(false);
        server.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = server.update(db).await?;
        Ok(Server::from(updated))
    }
}
