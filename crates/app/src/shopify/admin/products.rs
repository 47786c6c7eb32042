//! Demo product mutations.

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::AdminClient;
use crate::shopify::types::Connection;
use crate::shopify::{AdminShopifyError, GraphQLError};

/// Colors a generated demo product can get.
pub const COLORS: [&str; 4] = ["Red", "Orange", "Yellow", "Green"];

/// Price applied to the first variant of a generated product.
pub const DEMO_VARIANT_PRICE: &str = "100.00";

const PRODUCT_CREATE: &str = r"
mutation populateProduct($product: ProductCreateInput!) {
  productCreate(product: $product) {
    product {
      id
      title
      handle
      status
      variants(first: 10) { edges { node { id price barcode createdAt } } }
    }
    userErrors { field message }
  }
}";

const VARIANTS_BULK_UPDATE: &str = r"
mutation updateDemoVariant($productId: ID!, $variants: [ProductVariantsBulkInput!]!) {
  productVariantsBulkUpdate(productId: $productId, variants: $variants) {
    productVariants { id price barcode createdAt }
    userErrors { field message }
  }
}";

/// Product returned by `productCreate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedProduct {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub variants: Connection<CreatedVariant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedVariant {
    pub id: String,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Result of [`AdminClient::generate_demo_product`], shaped for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedProduct {
    pub product: CreatedProduct,
    pub variant: Vec<CreatedVariant>,
}

#[derive(Debug, Deserialize)]
struct UserError {
    #[serde(default)]
    field: Option<Vec<String>>,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductCreateData {
    product_create: Option<ProductCreatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductCreatePayload {
    product: Option<CreatedProduct>,
    #[serde(default)]
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantsBulkUpdateData {
    product_variants_bulk_update: Option<VariantsBulkUpdatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantsBulkUpdatePayload {
    #[serde(default)]
    product_variants: Vec<CreatedVariant>,
    #[serde(default)]
    user_errors: Vec<UserError>,
}

fn check_user_errors(errors: &[UserError]) -> Result<(), AdminShopifyError> {
    if errors.is_empty() {
        return Ok(());
    }
    let messages: Vec<String> = errors
        .iter()
        .map(|e| {
            let field = e.field.as_ref().map_or_else(String::new, |f| f.join("."));
            format!("{}: {}", field, e.message)
        })
        .collect();
    Err(AdminShopifyError::UserError(messages.join("; ")))
}

fn missing(what: &str) -> AdminShopifyError {
    AdminShopifyError::GraphQL(vec![GraphQLError {
        message: format!("No {what} returned"),
        locations: vec![],
        path: vec![],
    }])
}

/// Pick a random demo color.
#[must_use]
pub fn random_color() -> &'static str {
    COLORS.choose(&mut rand::rng()).copied().unwrap_or("Red")
}

impl AdminClient {
    /// Create a product with the given title.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns user errors.
    #[instrument(skip(self))]
    pub async fn create_product(&self, title: &str) -> Result<CreatedProduct, AdminShopifyError> {
        let data: ProductCreateData = self
            .execute(
                PRODUCT_CREATE,
                "populateProduct",
                serde_json::json!({ "product": { "title": title } }),
            )
            .await?;

        let payload = data.product_create.ok_or_else(|| missing("product"))?;
        check_user_errors(&payload.user_errors)?;
        payload.product.ok_or_else(|| missing("product"))
    }

    /// Set the price of one variant.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns user errors.
    #[instrument(skip(self))]
    pub async fn update_variant_price(
        &self,
        product_id: &str,
        variant_id: &str,
        price: &str,
    ) -> Result<Vec<CreatedVariant>, AdminShopifyError> {
        let data: VariantsBulkUpdateData = self
            .execute(
                VARIANTS_BULK_UPDATE,
                "updateDemoVariant",
                serde_json::json!({
                    "productId": product_id,
                    "variants": [{ "id": variant_id, "price": price }]
                }),
            )
            .await?;

        let payload = data
            .product_variants_bulk_update
            .ok_or_else(|| missing("variants"))?;
        check_user_errors(&payload.user_errors)?;
        Ok(payload.product_variants)
    }

    /// Create `"<color> Snowboard"` and price its first variant.
    ///
    /// # Errors
    ///
    /// Returns an error if either mutation fails or the product has no variant.
    pub async fn generate_demo_product(
        &self,
        color: &str,
    ) -> Result<GeneratedProduct, AdminShopifyError> {
        let product = self.create_product(&format!("{color} Snowboard")).await?;
        let variant_id = product
            .variants
            .first_node()
            .map(|v| v.id.clone())
            .ok_or_else(|| missing("variant"))?;

        let variant = self
            .update_variant_price(&product.id, &variant_id, DEMO_VARIANT_PRICE)
            .await?;

        tracing::info!(product_id = %product.id, title = %product.title, "Generated demo product");
        Ok(GeneratedProduct { product, variant })
    }
}
