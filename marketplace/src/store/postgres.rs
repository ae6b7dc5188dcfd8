// marketplace/src/store/postgres.rs

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, instrument};

use super::query::{OrderQuery, PageResult};
use super::{OrderStore, SellerPolicies, ShippingCatalog, StoreError, StoreHealth, StoreResult};
use crate::models::{
  NewOrderBatch, OrderDetail, OrderItem, OrderStatus, OrderSummary, SellerShippingPolicy, ShippingMethod,
};

const SUMMARY_COLUMNS: &str = "o.id, o.buyer_id, o.listing_id, o.price_at_purchase, o.subtotal, o.tax_amount, \
   o.tax_rate, o.payment_id, o.status, o.shipping_info, o.is_paid, o.created_at, \
   l.title AS listing_title, l.image_url AS listing_image";

// Profiles written by other services may leave the fee NULL; that reads as no fee.
const POLICY_COLUMNS: &str = "user_id AS seller_id, offers_free_shipping, \
   COALESCE(standard_shipping_fee, 0) AS standard_shipping_fee, \
   uses_calculated_shipping, shipping_policy AS policy_text";

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }
}

#[async_trait]
impl ShippingCatalog for PgStore {
  async fn active_shipping_methods(&self) -> StoreResult<Vec<ShippingMethod>> {
    sqlx::query_as::<_, ShippingMethod>(
      "SELECT id, name, provider, service_code, display_name, is_active \
       FROM shipping_methods WHERE is_active ORDER BY provider, display_name",
    )
    .fetch_all(&self.pool)
    .await
    .map_err(StoreError::query)
  }

  async fn shipping_method(&self, id: i64) -> StoreResult<Option<ShippingMethod>> {
    sqlx::query_as::<_, ShippingMethod>(
      "SELECT id, name, provider, service_code, display_name, is_active FROM shipping_methods WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&self.pool)
    .await
    .map_err(StoreError::query)
  }
}

#[async_trait]
impl SellerPolicies for PgStore {
  async fn seller_policies(&self, seller_ids: &[i64]) -> StoreResult<Vec<SellerShippingPolicy>> {
    if seller_ids.is_empty() {
      return Ok(Vec::new());
    }
    sqlx::query_as::<_, SellerShippingPolicy>(&format!(
      "SELECT {} FROM seller_profiles WHERE user_id = ANY($1)",
      POLICY_COLUMNS
    ))
    .bind(seller_ids)
    .fetch_all(&self.pool)
    .await
    .map_err(StoreError::query)
  }

  async fn seller_policy(&self, seller_id: i64) -> StoreResult<Option<SellerShippingPolicy>> {
    sqlx::query_as::<_, SellerShippingPolicy>(&format!(
      "SELECT {} FROM seller_profiles WHERE user_id = $1",
      POLICY_COLUMNS
    ))
    .bind(seller_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(StoreError::query)
  }

  #[instrument(name = "PgStore::upsert_seller_policy", skip(self, policy), fields(seller_id = policy.seller_id))]
  async fn upsert_seller_policy(&self, policy: &SellerShippingPolicy) -> StoreResult<SellerShippingPolicy> {
    sqlx::query_as::<_, SellerShippingPolicy>(&format!(
      "INSERT INTO seller_profiles \
         (user_id, offers_free_shipping, standard_shipping_fee, uses_calculated_shipping, shipping_policy) \
       VALUES ($1, $2, $3, $4, $5) \
       ON CONFLICT (user_id) DO UPDATE SET \
         offers_free_shipping = EXCLUDED.offers_free_shipping, \
         standard_shipping_fee = EXCLUDED.standard_shipping_fee, \
         uses_calculated_shipping = EXCLUDED.uses_calculated_shipping, \
         shipping_policy = EXCLUDED.shipping_policy, \
         updated_at = NOW() \
       RETURNING {}",
      POLICY_COLUMNS
    ))
    .bind(policy.seller_id)
    .bind(policy.offers_free_shipping)
    .bind(policy.standard_shipping_fee)
    .bind(policy.uses_calculated_shipping)
    .bind(policy.policy_text.as_deref())
    .fetch_one(&self.pool)
    .await
    .map_err(StoreError::query)
  }
}

#[async_trait]
impl OrderStore for PgStore {
  #[instrument(
    name = "PgStore::insert_order_batch",
    skip(self, batch),
    fields(buyer_id = batch.buyer_id, lines = batch.lines.len())
  )]
  async fn insert_order_batch(&self, batch: &NewOrderBatch) -> StoreResult<Vec<i64>> {
    if batch.lines.is_empty() {
      return Ok(Vec::new());
    }

    // Dropping `tx` on any early return rolls the whole batch back.
    let mut tx = self.pool.begin().await.map_err(|e| StoreError::transaction("begin", e))?;

    // Ids are reserved up front so each order item can be paired with its
    // order by position; RETURNING does not promise VALUES order.
    let order_ids: Vec<i64> = sqlx::query_scalar(
      "SELECT nextval(pg_get_serial_sequence('orders', 'id')) FROM generate_series(1, $1) ORDER BY 1",
    )
    .bind(batch.lines.len() as i64)
    .fetch_all(&mut *tx)
    .await
    .map_err(|e| StoreError::transaction("reserve_order_ids", e))?;

    let mut orders = QueryBuilder::<Postgres>::new(
      "INSERT INTO orders (id, buyer_id, listing_id, price_at_purchase, subtotal, tax_amount, tax_rate, \
       payment_id, status, shipping_info, is_paid) ",
    );
    orders.push_values(order_ids.iter().zip(&batch.lines), |mut row, (order_id, line)| {
      row
        .push_bind(*order_id)
        .push_bind(batch.buyer_id)
        .push_bind(line.listing_id)
        .push_bind(line.amounts.total)
        .push_bind(line.amounts.subtotal)
        .push_bind(line.amounts.tax)
        .push_bind(batch.tax_rate)
        .push_bind(batch.payment_id.clone())
        .push_bind(OrderStatus::Pending)
        .push_bind(batch.shipping_info.clone().map(Json))
        .push_bind(batch.is_paid());
    });
    orders
      .build()
      .execute(&mut *tx)
      .await
      .map_err(|e| StoreError::transaction("insert_orders", e))?;

    let mut items = QueryBuilder::<Postgres>::new("INSERT INTO order_items (order_id, listing_id, quantity, price) ");
    items.push_values(order_ids.iter().zip(&batch.lines), |mut row, (order_id, line)| {
      row
        .push_bind(*order_id)
        .push_bind(line.listing_id)
        .push_bind(line.quantity)
        .push_bind(line.unit_price);
    });
    items
      .build()
      .execute(&mut *tx)
      .await
      .map_err(|e| StoreError::transaction("insert_order_items", e))?;

    tx.commit().await.map_err(|e| StoreError::transaction("commit", e))?;
    debug!(?order_ids, "Order batch committed.");
    Ok(order_ids)
  }

  async fn order_detail(&self, order_id: i64) -> StoreResult<Option<OrderDetail>> {
    let summary = sqlx::query_as::<_, OrderSummary>(&format!(
      "SELECT {} FROM orders o LEFT JOIN listings l ON l.id = o.listing_id WHERE o.id = $1",
      SUMMARY_COLUMNS
    ))
    .bind(order_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(StoreError::query)?;

    let Some(summary) = summary else {
      return Ok(None);
    };

    let items = sqlx::query_as::<_, OrderItem>(
      "SELECT id, order_id, listing_id, quantity, price FROM order_items WHERE order_id = $1 ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(&self.pool)
    .await
    .map_err(StoreError::query)?;

    Ok(Some(OrderDetail { summary, items }))
  }

  async fn list_orders(&self, query: &OrderQuery) -> StoreResult<PageResult<OrderSummary>> {
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders o");
    query.push_filters(&mut count);
    let total: i64 = count
      .build_query_scalar()
      .fetch_one(&self.pool)
      .await
      .map_err(StoreError::query)?;

    let mut select = QueryBuilder::<Postgres>::new(format!(
      "SELECT {} FROM orders o LEFT JOIN listings l ON l.id = o.listing_id",
      SUMMARY_COLUMNS
    ));
    query.push_filters(&mut select);
    query.push_pagination(&mut select);
    let items = select
      .build_query_as::<OrderSummary>()
      .fetch_all(&self.pool)
      .await
      .map_err(StoreError::query)?;

    Ok(PageResult {
      items,
      total,
      page: query.page(),
    })
  }
}

#[async_trait]
impl StoreHealth for PgStore {
  async fn ping(&self) -> StoreResult<()> {
    sqlx::query("SELECT 1").execute(&self.pool).await.map_err(StoreError::query)?;
    Ok(())
  }
}
