use super::validate_table_name;
use aurum_domain::entities::product::Product;
use aurum_domain::repositories::quote_store::{QuoteStore, StoreError};
use aurum_domain::value_objects::quote::{ProductId, Quote};
use chrono::{DateTime, Utc};
use postgres::error::SqlState;
use postgres::NoTls;
use r2d2::{Pool, PooledConnection};
use r2d2_postgres::PostgresConnectionManager;
use rust_decimal::Decimal;
use std::time::Instant;

type PgPool = Pool<PostgresConnectionManager<NoTls>>;
type PgConnection = PooledConnection<PostgresConnectionManager<NoTls>>;

#[derive(Debug, Clone)]
pub struct PostgresQuoteStore {
    pool: PgPool,
    quotes_table: String,
    products_table: String,
}

impl PostgresQuoteStore {
    pub fn new(
        db_url: String,
        quotes_table: String,
        products_table: String,
        pool_max_size: u32,
    ) -> Result<Self, String> {
        if let Err(err) = validate_table_name(&quotes_table) {
            return Err(format!("invalid quotes_table '{}': {}", quotes_table, err));
        }
        if let Err(err) = validate_table_name(&products_table) {
            return Err(format!("invalid products_table '{}': {}", products_table, err));
        }

        let config = db_url
            .parse::<postgres::Config>()
            .map_err(|err| format!("invalid postgres db url: {err}"))?;
        let manager = PostgresConnectionManager::new(config, NoTls);
        let pool = Pool::builder()
            .max_size(pool_max_size)
            .build(manager)
            .map_err(|err| format!("failed to build postgres pool: {err}"))?;

        Ok(Self {
            pool,
            quotes_table,
            products_table,
        })
    }

    fn checkout(&self, op: &'static str) -> Result<PgConnection, StoreError> {
        let get_start = Instant::now();
        match self.pool.get() {
            Ok(conn) => {
                metrics::histogram!("aurum.infra.postgres.pool.get_ms")
                    .record(get_start.elapsed().as_secs_f64() * 1000.0);
                Ok(conn)
            }
            Err(err) => {
                metrics::counter!("aurum.infra.postgres.pool.get.errors_total", "op" => op)
                    .increment(1);
                tracing::error!(error = %err, op, "failed to checkout postgres connection");
                Err(StoreError::Connection(format!(
                    "failed to checkout postgres connection: {err}"
                )))
            }
        }
    }
}

impl QuoteStore for PostgresQuoteStore {
    fn ensure_schema(&self, catalog: &[Product]) -> Result<(), StoreError> {
        let span = tracing::info_span!(
            "infra.postgres.ensure_schema",
            quotes_table = %self.quotes_table,
            products_table = %self.products_table,
            catalog = catalog.len()
        );
        let _enter = span.enter();

        let mut conn = self.checkout("ensure_schema")?;
        conn.batch_execute(&schema_sql(&self.quotes_table, &self.products_table))
            .map_err(|err| StoreError::Schema(format!("failed to create tables: {err}")))?;

        let exists: bool = conn
            .query_one(
                "SELECT to_regclass($1::text) IS NOT NULL",
                &[&self.products_table.as_str()],
            )
            .and_then(|row| row.try_get(0))
            .map_err(|err| StoreError::Schema(format!("failed to inspect catalog table: {err}")))?;
        if !exists {
            return Err(StoreError::Schema(format!(
                "catalog table {} is missing",
                self.products_table
            )));
        }

        let upsert = catalog_upsert_sql(&self.products_table);
        let mut tx = conn
            .transaction()
            .map_err(|err| StoreError::Schema(format!("failed to start transaction: {err}")))?;
        for product in catalog {
            tx.execute(upsert.as_str(), &[&product.id, &product.name])
                .map_err(|err| {
                    StoreError::Schema(format!("failed to seed product {}: {err}", product.id))
                })?;
        }
        tx.commit()
            .map_err(|err| StoreError::Schema(format!("failed to commit catalog: {err}")))?;

        tracing::info!("schema ready");
        Ok(())
    }

    fn insert(&self, quote: &Quote) -> Result<(), StoreError> {
        let span = tracing::info_span!(
            "infra.postgres.insert_quote",
            table = %self.quotes_table,
            product_id = quote.product_id
        );
        let _enter = span.enter();
        let start = Instant::now();
        let mut conn = self.checkout("insert")?;
        let statement = format!(
            "INSERT INTO {} (product_id, observed_at, buy_price, sell_price) \
             VALUES ($1, $2, $3, $4)",
            self.quotes_table
        );

        let result = conn.execute(
            statement.as_str(),
            &[
                &quote.product_id,
                &quote.observed_at,
                &quote.buy_price,
                &quote.sell_price,
            ],
        );
        match result {
            Ok(_) => {
                metrics::counter!("aurum.infra.postgres.insert_quote.calls_total", "result" => "ok")
                    .increment(1);
                metrics::histogram!("aurum.infra.postgres.insert_quote_ms")
                    .record(start.elapsed().as_secs_f64() * 1000.0);
                Ok(())
            }
            Err(err) => {
                metrics::counter!("aurum.infra.postgres.insert_quote.calls_total", "result" => "err")
                    .increment(1);
                if err.code() == Some(&SqlState::FOREIGN_KEY_VIOLATION) {
                    return Err(StoreError::Insert(format!(
                        "unknown product id {}",
                        quote.product_id
                    )));
                }
                Err(StoreError::Insert(format!("failed to insert quote: {err}")))
            }
        }
    }

    fn latest_quote(&self, product_id: ProductId) -> Result<Quote, StoreError> {
        let span = tracing::info_span!(
            "infra.postgres.latest_sell_price",
            table = %self.quotes_table,
            product_id
        );
        let _enter = span.enter();
        let start = Instant::now();
        let mut conn = self.checkout("latest_quote")?;
        let query = format!(
            "SELECT observed_at, buy_price, sell_price FROM {} \
             WHERE product_id=$1 \
             ORDER BY observed_at DESC, id DESC \
             LIMIT 1",
            self.quotes_table
        );

        let row = conn.query_opt(query.as_str(), &[&product_id]).map_err(|err| {
            metrics::counter!("aurum.infra.postgres.latest_quote.calls_total", "result" => "err")
                .increment(1);
            tracing::error!(product_id, error = %err, "failed to query latest quote");
            StoreError::Query(format!("failed to query latest quote: {err}"))
        })?;
        metrics::histogram!("aurum.infra.postgres.latest_quote_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);

        let Some(row) = row else {
            metrics::counter!("aurum.infra.postgres.latest_quote.calls_total", "result" => "miss")
                .increment(1);
            return Err(StoreError::NotFound(product_id));
        };
        metrics::counter!("aurum.infra.postgres.latest_quote.calls_total", "result" => "ok")
            .increment(1);

        let decode = |err: postgres::Error| StoreError::Query(format!("failed to decode row: {err}"));
        let observed_at: DateTime<Utc> = row.try_get(0).map_err(decode)?;
        let buy_price: Decimal = row.try_get(1).map_err(decode)?;
        let sell_price: Decimal = row.try_get(2).map_err(decode)?;
        Quote::new(product_id, observed_at, buy_price, sell_price).map_err(StoreError::Query)
    }
}

fn schema_sql(quotes_table: &str, products_table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {products} (
            id INT PRIMARY KEY,
            name TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        CREATE TABLE IF NOT EXISTS {quotes} (
            id BIGSERIAL PRIMARY KEY,
            product_id INT NOT NULL REFERENCES {products} (id),
            observed_at TIMESTAMPTZ NOT NULL,
            buy_price NUMERIC(18,5) NOT NULL CHECK (buy_price >= 0),
            sell_price NUMERIC(18,5) NOT NULL CHECK (sell_price >= 0),
            ingested_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        CREATE INDEX IF NOT EXISTS {index} ON {quotes} (product_id, observed_at DESC);",
        products = products_table,
        quotes = quotes_table,
        index = index_name(quotes_table),
    )
}

/// Config is the source of truth for product names, so re-seeding renames.
fn catalog_upsert_sql(products_table: &str) -> String {
    format!(
        "INSERT INTO {products_table} (id, name) VALUES ($1, $2) \
         ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name"
    )
}

fn index_name(quotes_table: &str) -> String {
    let bare = quotes_table.rsplit('.').next().unwrap_or(quotes_table);
    format!("{bare}_product_observed_idx")
}
