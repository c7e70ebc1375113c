//! Backend endpoints. Query parameters are appended to the endpoint path.

use serde_json::Value;

use super::{ApiClient, ApiResponse, HttpTransport, Method};
use crate::error::ApiError;

impl<T: HttpTransport> ApiClient<T> {
    async fn get(&self, endpoint: &str) -> Result<ApiResponse, ApiError> {
        self.request(Method::Get, &[], endpoint, None).await
    }

    async fn post(&self, endpoint: &str, body: &Value) -> Result<ApiResponse, ApiError> {
        self.request(Method::Post, &[], endpoint, Some(body)).await
    }

    // -- auth ---------------------------------------------------------------

    pub async fn login(&self, credentials: &Value) -> Result<ApiResponse, ApiError> {
        self.post("/login", credentials).await
    }

    pub async fn login_with_google(&self, token: &Value) -> Result<ApiResponse, ApiError> {
        self.post("/auth/google", token).await
    }

    pub async fn register(&self, user: &Value) -> Result<ApiResponse, ApiError> {
        self.post("/register", user).await
    }

    pub async fn get_user(&self, id: &str) -> Result<ApiResponse, ApiError> {
        self.get(&format!("/get-user?id={id}")).await
    }

    pub async fn history(&self, id: &str, limit: u32) -> Result<ApiResponse, ApiError> {
        self.get(&format!("/history?id={id}&limit={limit}")).await
    }

    pub async fn deposit(&self, id: &str, data: &Value) -> Result<ApiResponse, ApiError> {
        self.post(&format!("/deposit?id={id}"), data).await
    }

    pub async fn withdraw(&self, id: &str, data: &Value) -> Result<ApiResponse, ApiError> {
        self.post(&format!("/withdraw?id={id}"), data).await
    }

    // -- baskets ------------------------------------------------------------

    pub async fn create_basket(&self, basket: &Value) -> Result<ApiResponse, ApiError> {
        self.post("/create-basket", basket).await
    }

    pub async fn get_all_baskets(&self, limit: u32) -> Result<ApiResponse, ApiError> {
        self.get(&format!("/get-all-basket?limit={limit}")).await
    }

    pub async fn buy_basket(&self, purchase: &Value) -> Result<ApiResponse, ApiError> {
        self.post("/buy-basket", purchase).await
    }

    pub async fn get_user_baskets(&self, id: &str, limit: u32) -> Result<ApiResponse, ApiError> {
        self.get(&format!("/get-user-baskets?id={id}&limit={limit}")).await
    }

    pub async fn get_basket_details(&self, id: &str) -> Result<ApiResponse, ApiError> {
        self.get(&format!("/get-basket-details?id={id}")).await
    }

    pub async fn get_basket_transactions(
        &self,
        id: &str,
        limit: u32,
    ) -> Result<ApiResponse, ApiError> {
        self.get(&format!("/get-basket-transactions?id={id}&limit={limit}"))
            .await
    }
}
