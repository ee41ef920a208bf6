//! Users service - maps user operations onto the HTTP wrapper.

use async_trait::async_trait;

use crate::api::ApiClient;
use crate::error::Result;
use crate::types::{
    ApiResponse, CreateUserRequest, UpdateUserRequest, User, UserId, UserQuery, UserResponse,
    UserStatsResponse, UsersResponse,
};

/// Operations on the `users` resource.
#[async_trait]
pub trait UserService: Send + Sync {
    /// `GET /users`
    async fn get_users(&self) -> Result<UsersResponse>;

    /// `GET /users/:id`
    async fn get_user_by_id(&self, id: UserId) -> Result<UserResponse>;

    /// `POST /users`
    async fn create_user(&self, request: &CreateUserRequest) -> Result<UserResponse>;

    /// `PUT /users/:id`
    async fn update_user(&self, id: UserId, request: &UpdateUserRequest) -> Result<UserResponse>;

    /// `DELETE /users/:id`, answering with the removed user.
    async fn delete_user(&self, id: UserId) -> Result<ApiResponse<User>>;

    /// `GET /users?name=&email=&page=&limit=`
    async fn search_users(&self, query: &UserQuery) -> Result<UsersResponse>;

    /// `GET /users/stats`
    async fn get_user_stats(&self) -> Result<UserStatsResponse>;
}

/// [`UserService`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpUserService {
    api: ApiClient,
}

impl HttpUserService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

/// Endpoint for a search, with the query string only when a filter is set.
pub fn search_endpoint(query: &UserQuery) -> String {
    match query.to_query_string() {
        Some(qs) => format!("/users?{qs}"),
        None => "/users".to_string(),
    }
}

#[async_trait]
impl UserService for HttpUserService {
    async fn get_users(&self) -> Result<UsersResponse> {
        self.api.get("/users").await
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<UserResponse> {
        self.api.get(&format!("/users/{id}")).await
    }

    async fn create_user(&self, request: &CreateUserRequest) -> Result<UserResponse> {
        self.api.post("/users", request).await
    }

    async fn update_user(&self, id: UserId, request: &UpdateUserRequest) -> Result<UserResponse> {
        self.api.put(&format!("/users/{id}"), request).await
    }

    async fn delete_user(&self, id: UserId) -> Result<ApiResponse<User>> {
        self.api.delete(&format!("/users/{id}")).await
    }

    async fn search_users(&self, query: &UserQuery) -> Result<UsersResponse> {
        self.api.get(&search_endpoint(query)).await
    }

    async fn get_user_stats(&self) -> Result<UserStatsResponse> {
        self.api.get("/users/stats").await
    }
}
