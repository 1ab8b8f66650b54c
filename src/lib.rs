pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;
pub mod store;

use std::sync::Arc;

use crate::app::auth::AuthService;
use crate::app::engagement::EngagementService;
use crate::app::feed::FeedService;
use crate::app::media::MediaService;
use crate::app::posts::PostService;
use crate::infra::storage::MediaStore;
use crate::store::{Catalog, PostStore, UserDirectory};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PostStore>,
    pub users: Arc<dyn UserDirectory>,
    pub catalog: Arc<dyn Catalog>,
    pub media: Arc<dyn MediaStore>,
    pub paseto_access_key: [u8; 32],
    pub access_ttl_minutes: u64,
    pub image_max_bytes: usize,
    pub request_body_limit_bytes: usize,
}

impl AppState {
    pub fn auth_service(&self) -> AuthService {
        AuthService::new(self.paseto_access_key, self.access_ttl_minutes)
    }

    pub fn post_service(&self) -> PostService {
        PostService::new(
            self.store.clone(),
            self.catalog.clone(),
            MediaService::new(self.media.clone(), self.image_max_bytes),
        )
    }

    pub fn engagement_service(&self) -> EngagementService {
        EngagementService::new(self.store.clone())
    }

    pub fn feed_service(&self) -> FeedService {
        FeedService::new(self.store.clone(), self.catalog.clone())
    }
}
