use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};

use emporium_core::{Currency, ProductId};

use super::PgDatabase;
use crate::db::{Page, ProductFilter, ProductSort, ProductStore, RepositoryError, StockStatus};
use crate::models::product::LOW_STOCK_THRESHOLD;
use crate::models::{NewProduct, Product};

const PRODUCT_COLUMNS: &str = "id, name, description, price, currency, category, image, stock, \
                               rating, num_reviews, is_active, discount, features, brand, \
                               colors, sizes, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: String,
    price: Decimal,
    currency: String,
    category: String,
    image: String,
    stock: i32,
    rating: f64,
    num_reviews: i32,
    is_active: bool,
    discount: i32,
    features: Vec<String>,
    brand: Option<String>,
    colors: Vec<String>,
    sizes: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let currency: Currency = row
            .currency
            .parse()
            .map_err(|e| RepositoryError::corrupt("currency", e))?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            currency,
            category: row.category,
            image: row.image,
            stock: row.stock,
            rating: row.rating,
            num_reviews: row.num_reviews,
            is_active: row.is_active,
            discount: row.discount,
            features: row.features,
            brand: row.brand,
            colors: row.colors,
            sizes: row.sizes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Append `WHERE` clauses for `filter`.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    qb.push(" WHERE TRUE");
    if let Some(active) = filter.is_active {
        qb.push(" AND is_active = ").push_bind(active);
    }
    if let Some(category) = &filter.category {
        qb.push(" AND category = ").push_bind(category.clone());
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND price <= ").push_bind(max);
    }
    if let Some(term) = &filter.search {
        let pattern = format!("%{}%", escape_like(term));
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR category ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    match filter.stock {
        Some(StockStatus::Low) => {
            qb.push(" AND stock < ").push_bind(LOW_STOCK_THRESHOLD);
        }
        Some(StockStatus::Out) => {
            qb.push(" AND stock = 0");
        }
        None => {}
    }
    if let Some(exclude) = filter.exclude {
        qb.push(" AND id <> ").push_bind(exclude);
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

const fn order_by(sort: ProductSort) -> &'static str {
    match sort {
        ProductSort::Newest => " ORDER BY created_at DESC, id DESC",
        ProductSort::PriceAsc => " ORDER BY price ASC, id ASC",
        ProductSort::PriceDesc => " ORDER BY price DESC, id ASC",
        ProductSort::Rating => " ORDER BY rating DESC, id ASC",
    }
}

#[async_trait]
impl ProductStore for PgDatabase {
    async fn count_products(&self, filter: &ProductFilter) -> Result<i64, RepositoryError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM products");
        push_filter(&mut qb, filter);
        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: Option<Page>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut qb = QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
        push_filter(&mut qb, filter);
        qb.push(order_by(sort));
        if let Some(page) = page {
            qb.push(" LIMIT ")
                .push_bind(i64::from(page.limit))
                .push(" OFFSET ")
                .push_bind(page.offset());
        }

        let rows: Vec<ProductRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let row: ProductRow = sqlx::query_as(&format!(
            r"
            INSERT INTO products (name, description, price, currency, category, image, stock,
                                  rating, num_reviews, is_active, discount, features, brand,
                                  colors, sizes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.currency.code())
        .bind(&product.category)
        .bind(&product.image)
        .bind(product.stock)
        .bind(product.rating)
        .bind(product.num_reviews)
        .bind(product.is_active)
        .bind(product.discount)
        .bind(&product.features)
        .bind(&product.brand)
        .bind(&product.colors)
        .bind(&product.sizes)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn update_product(&self, product: &Product) -> Result<Product, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            r"
            UPDATE products
            SET name = $2, description = $3, price = $4, currency = $5, category = $6,
                image = $7, stock = $8, rating = $9, num_reviews = $10, is_active = $11,
                discount = $12, features = $13, brand = $14, colors = $15, sizes = $16,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.currency.code())
        .bind(&product.category)
        .bind(&product.image)
        .bind(product.stock)
        .bind(product.rating)
        .bind(product.num_reviews)
        .bind(product.is_active)
        .bind(product.discount)
        .bind(&product.features)
        .bind(&product.brand)
        .bind(&product.colors)
        .bind(&product.sizes)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn product_categories(&self, active_only: bool) -> Result<Vec<String>, RepositoryError> {
        let categories: Vec<String> = sqlx::query_scalar(
            r"
            SELECT DISTINCT category FROM products
            WHERE NOT $1 OR is_active
            ORDER BY category
            ",
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }
}
