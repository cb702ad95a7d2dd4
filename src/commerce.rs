//! # Commerce client
//!
//! Thin reqwest wrapper over the external commerce API. Every call is a
//! form-encoded POST against `{endpoint}/{route}&api_token={token}` (the
//! backend routes through a single script, hence the unusual URL shape) and
//! returns JSON. The client holds no session state; tokens come from the
//! caller's cookie.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{
    Address, CartEnvelope, LoginResponse, MenuContentResponse, ProductsResponse, EXTRA_QUANTITY,
};

const NO_PARAMS: &[(&str, &str)] = &[];

pub struct CommerceClient {
    http: Client,
    base: String,
    username: String,
    key: String,
}

impl CommerceClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: Client::new(),
            base: config.commerce_endpoint.clone(),
            username: config.commerce_username.clone(),
            key: config.commerce_key.clone(),
        }
    }

    /// Exchange the fixed credential pair for a session token.
    pub async fn login(&self) -> Result<String, AppError> {
        let response = self
            .http
            .post(format!("{}/account/login", self.base))
            .form(&[("username", self.username.as_str()), ("key", self.key.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let login: LoginResponse = response.json().await?;
        Ok(login.api_token)
    }

    async fn call<T, F>(&self, token: &str, route: &str, form: &F) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        F: serde::Serialize + ?Sized,
    {
        let url = format!("{}/{}&api_token={}", self.base, route, token);

        #[cfg(feature = "verbose")]
        tracing::info!("POST {url}");

        let response = self
            .http
            .post(&url)
            .form(form)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    pub async fn get_cart(&self, token: &str) -> Result<CartEnvelope, AppError> {
        self.call(token, "cart/getCart", NO_PARAMS).await
    }

    pub async fn get_menu_content(
        &self,
        token: &str,
        menu: u32,
    ) -> Result<MenuContentResponse, AppError> {
        self.call(token, "catalog/getMenuContent", &[("menu", menu.to_string())])
            .await
    }

    pub async fn get_categories(&self, token: &str) -> Result<Value, AppError> {
        self.call(token, "catalog/getCategories", NO_PARAMS).await
    }

    pub async fn get_packages(&self, token: &str) -> Result<Value, AppError> {
        self.call(token, "catalog/getPackages", NO_PARAMS).await
    }

    pub async fn get_products_by_category(
        &self,
        token: &str,
        category_id: &str,
    ) -> Result<ProductsResponse, AppError> {
        self.call(
            token,
            "catalog/getProductsByCategory",
            &[("category_id", category_id)],
        )
        .await
    }

    pub async fn get_product_by_id(&self, token: &str, product_id: &str) -> Result<Value, AppError> {
        self.call(token, "catalog/getProductById", &[("product_id", product_id)])
            .await
    }

    pub async fn add_main_product(
        &self,
        token: &str,
        product_id: &str,
        quantity: u32,
    ) -> Result<Value, AppError> {
        self.call(
            token,
            "cart/addProduct",
            &[("id", product_id.to_string()), ("quantity", quantity.to_string())],
        )
        .await
    }

    /// Create a priced extra. The wire protocol has no explicit tag for
    /// extras; the reserved quantity set here is the only place the crate
    /// produces it.
    pub async fn add_extra(&self, token: &str, product_id: &str) -> Result<Value, AppError> {
        self.call(
            token,
            "cart/addExtra",
            &[
                ("product_id", product_id.to_string()),
                ("quantity", EXTRA_QUANTITY.to_string()),
            ],
        )
        .await
    }

    pub async fn edit_product(
        &self,
        token: &str,
        cart_id: &str,
        quantity: u32,
    ) -> Result<Value, AppError> {
        self.call(
            token,
            "cart/editProduct",
            &[("id", cart_id.to_string()), ("quantity", quantity.to_string())],
        )
        .await
    }

    pub async fn remove_product(&self, token: &str, cart_id: &str) -> Result<Value, AppError> {
        self.call(
            token,
            "cart/removeProduct",
            &[("id", cart_id), ("quantity", "0")],
        )
        .await
    }

    pub async fn clear_cart(&self, token: &str) -> Result<Value, AppError> {
        self.call(token, "cart/clear", NO_PARAMS).await
    }

    pub async fn add_package(&self, token: &str) -> Result<Value, AppError> {
        self.call(token, "sale/addPackage", NO_PARAMS).await
    }

    pub async fn delete_package(&self, token: &str) -> Result<Value, AppError> {
        self.call(token, "sale/deletePackage", NO_PARAMS).await
    }

    pub async fn get_payment_methods(&self, token: &str) -> Result<Value, AppError> {
        self.call(token, "checkout/getPaymentMethods", NO_PARAMS).await
    }

    pub async fn set_payment_method(&self, token: &str, method: &str) -> Result<Value, AppError> {
        self.call(
            token,
            "checkout/setPaymentMethod",
            &[("payment_method", method)],
        )
        .await
    }

    pub async fn set_shipping_address(
        &self,
        token: &str,
        address: &Address,
    ) -> Result<Value, AppError> {
        self.call(token, "checkout/setShippingAddress", address).await
    }

    pub async fn set_payment_address(
        &self,
        token: &str,
        address: &Address,
    ) -> Result<Value, AppError> {
        self.call(token, "checkout/setPaymentAddress", address).await
    }

    pub async fn get_shipping_method(&self, token: &str) -> Result<Value, AppError> {
        self.call(token, "checkout/getShippingMethod", NO_PARAMS).await
    }

    pub async fn set_shipping_method(&self, token: &str, method: &str) -> Result<Value, AppError> {
        self.call(
            token,
            "checkout/setShippingMethod",
            &[("shipping_method", method)],
        )
        .await
    }
}
