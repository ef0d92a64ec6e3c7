//! Supplier and customer billing repository.
//!
//! Prices are stored as integer cents.

use chrono::{DateTime, Utc};

use farm_core::entities::{CustomerBilling, SupplierBilling};
use farm_core::enums::{ActionKind, FinancingType};
use farm_core::ids::{PREFIX_CUSTOMER_BILLING, PREFIX_SUPPLIER_BILLING};

use crate::error::DatabaseError;
use crate::helpers::{UpdateSql, format_datetime, now_micros, parse_datetime, parse_enum, to_stored_precision};
use crate::service::FarmService;
use crate::updates::billing::{CustomerBillingUpdate, SupplierBillingUpdate};

const SELECT_SUPPLIER_BILLING: &str =
    "SELECT id, name, date, date_supplier, price_cents, payment, comment FROM supplier_billings";
const SELECT_CUSTOMER_BILLING: &str =
    "SELECT id, name, date, date_billing, price_cents, payment, comment FROM customer_billings";

/// Input for creating either kind of bill.
#[derive(Debug, Clone)]
pub struct NewBilling {
    pub name: String,
    /// Supplier date or billing date, depending on the bill kind.
    pub counterpart_date: DateTime<Utc>,
    pub price_cents: i64,
    pub payment: FinancingType,
    pub comment: String,
}

impl NewBilling {
    /// A bill paid in cash with no comment.
    #[must_use]
    pub fn new(name: impl Into<String>, counterpart_date: DateTime<Utc>, price_cents: i64) -> Self {
        Self {
            name: name.into(),
            counterpart_date,
            price_cents,
            payment: FinancingType::Cash,
            comment: String::new(),
        }
    }

    #[must_use]
    pub fn payment(mut self, payment: FinancingType) -> Self {
        self.payment = payment;
        self
    }

    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

fn row_to_supplier_billing(row: &libsql::Row) -> Result<SupplierBilling, DatabaseError> {
    Ok(SupplierBilling {
        id: row.get::<String>(0)?,
        name: row.get::<String>(1)?,
        date: parse_datetime(&row.get::<String>(2)?)?,
        date_supplier: parse_datetime(&row.get::<String>(3)?)?,
        price_cents: row.get::<i64>(4)?,
        payment: parse_enum(&row.get::<String>(5)?)?,
        comment: row.get::<String>(6)?,
    })
}

fn row_to_customer_billing(row: &libsql::Row) -> Result<CustomerBilling, DatabaseError> {
    Ok(CustomerBilling {
        id: row.get::<String>(0)?,
        name: row.get::<String>(1)?,
        date: parse_datetime(&row.get::<String>(2)?)?,
        date_billing: parse_datetime(&row.get::<String>(3)?)?,
        price_cents: row.get::<i64>(4)?,
        payment: parse_enum(&row.get::<String>(5)?)?,
        comment: row.get::<String>(6)?,
    })
}

async fn fetch_supplier_billing(
    conn: &libsql::Connection,
    id: &str,
) -> Result<SupplierBilling, DatabaseError> {
    let mut rows = conn
        .query(&format!("{SELECT_SUPPLIER_BILLING} WHERE id = ?1"), [id])
        .await?;
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    row_to_supplier_billing(&row)
}

async fn fetch_customer_billing(
    conn: &libsql::Connection,
    id: &str,
) -> Result<CustomerBilling, DatabaseError> {
    let mut rows = conn
        .query(&format!("{SELECT_CUSTOMER_BILLING} WHERE id = ?1"), [id])
        .await?;
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    row_to_customer_billing(&row)
}

fn billing_update_sql(
    name: Option<String>,
    counterpart: Option<(&str, DateTime<Utc>)>,
    price_cents: Option<i64>,
    payment: Option<FinancingType>,
    comment: Option<String>,
) -> UpdateSql {
    let mut sql = UpdateSql::new();
    if let Some(name) = name {
        sql.set("name", name);
    }
    if let Some((column, date)) = counterpart {
        sql.set(column, format_datetime(&to_stored_precision(date)));
    }
    if let Some(price) = price_cents {
        sql.set("price_cents", price);
    }
    if let Some(payment) = payment {
        sql.set("payment", payment.as_str());
    }
    if let Some(comment) = comment {
        sql.set("comment", comment);
    }
    sql
}

impl FarmService {
    // -----------------------------------------------------------------------
    // Supplier billing
    // -----------------------------------------------------------------------

    /// Create a supplier bill and record its CREATE action.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Reference` if the actor does not exist.
    pub async fn create_supplier_billing(
        &self,
        actor_id: &str,
        input: NewBilling,
    ) -> Result<SupplierBilling, DatabaseError> {
        let mut tx = self.begin_audited().await?;
        let result = async {
            let billing = SupplierBilling {
                id: tx.generate_id(PREFIX_SUPPLIER_BILLING).await?,
                name: input.name,
                date: now_micros(),
                date_supplier: to_stored_precision(input.counterpart_date),
                price_cents: input.price_cents,
                payment: input.payment,
                comment: input.comment,
            };
            tx.conn()
                .execute(
                    "INSERT INTO supplier_billings (id, name, date, date_supplier, price_cents, payment, comment)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    libsql::params![
                        billing.id.as_str(),
                        billing.name.as_str(),
                        format_datetime(&billing.date),
                        format_datetime(&billing.date_supplier),
                        billing.price_cents,
                        billing.payment.as_str(),
                        billing.comment.as_str()
                    ],
                )
                .await?;
            tx.record_and_link(ActionKind::Create, actor_id, &billing)
                .await?;
            Ok::<_, DatabaseError>(billing)
        }
        .await;
        tx.finish(result).await
    }

    /// Get a supplier bill by ID.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the bill does not exist.
    pub async fn get_supplier_billing(&self, id: &str) -> Result<SupplierBilling, DatabaseError> {
        fetch_supplier_billing(&*self.db().conn().await, id).await
    }

    /// List supplier bills, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_supplier_billings(
        &self,
        limit: u32,
    ) -> Result<Vec<SupplierBilling>, DatabaseError> {
        let conn = self.db().conn().await;
        let mut rows = conn
            .query(
                &format!("{SELECT_SUPPLIER_BILLING} ORDER BY date DESC, id LIMIT ?1"),
                [i64::from(limit)],
            )
            .await?;
        let mut billings = Vec::new();
        while let Some(row) = rows.next().await? {
            billings.push(row_to_supplier_billing(&row)?);
        }
        Ok(billings)
    }

    /// Apply `update` and record an UPDATE action.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the bill does not exist.
    pub async fn update_supplier_billing(
        &self,
        actor_id: &str,
        id: &str,
        update: SupplierBillingUpdate,
    ) -> Result<SupplierBilling, DatabaseError> {
        let sql = billing_update_sql(
            update.name,
            update.date_supplier.map(|d| ("date_supplier", d)),
            update.price_cents,
            update.payment,
            update.comment,
        );
        if sql.is_empty() {
            return self.get_supplier_billing(id).await;
        }

        let mut tx = self.begin_audited().await?;
        let result = async {
            let (sql, params) = sql.finish("supplier_billings", "id", id);
            tx.conn()
                .execute(&sql, libsql::params_from_iter(params))
                .await?;
            let billing = fetch_supplier_billing(tx.conn(), id).await?;
            tx.record_and_link(ActionKind::Update, actor_id, &billing)
                .await?;
            Ok::<_, DatabaseError>(billing)
        }
        .await;
        tx.finish(result).await
    }

    /// Record a DELETE action, then delete the supplier bill.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the bill does not exist.
    pub async fn delete_supplier_billing(
        &self,
        actor_id: &str,
        id: &str,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.begin_audited().await?;
        let result = async {
            let billing = fetch_supplier_billing(tx.conn(), id).await?;
            tx.record_and_link(ActionKind::Delete, actor_id, &billing)
                .await?;
            tx.conn()
                .execute("DELETE FROM supplier_billings WHERE id = ?1", [id])
                .await?;
            Ok::<_, DatabaseError>(())
        }
        .await;
        tx.finish(result).await
    }

    // -----------------------------------------------------------------------
    // Customer billing
    // -----------------------------------------------------------------------

    /// Create a customer bill and record its CREATE action.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Reference` if the actor does not exist.
    pub async fn create_customer_billing(
        &self,
        actor_id: &str,
        input: NewBilling,
    ) -> Result<CustomerBilling, DatabaseError> {
        let mut tx = self.begin_audited().await?;
        let result = async {
            let billing = CustomerBilling {
                id: tx.generate_id(PREFIX_CUSTOMER_BILLING).await?,
                name: input.name,
                date: now_micros(),
                date_billing: to_stored_precision(input.counterpart_date),
                price_cents: input.price_cents,
                payment: input.payment,
                comment: input.comment,
            };
            tx.conn()
                .execute(
                    "INSERT INTO customer_billings (id, name, date, date_billing, price_cents, payment, comment)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    libsql::params![
                        billing.id.as_str(),
                        billing.name.as_str(),
                        format_datetime(&billing.date),
                        format_datetime(&billing.date_billing),
                        billing.price_cents,
                        billing.payment.as_str(),
                        billing.comment.as_str()
                    ],
                )
                .await?;
            tx.record_and_link(ActionKind::Create, actor_id, &billing)
                .await?;
            Ok::<_, DatabaseError>(billing)
        }
        .await;
        tx.finish(result).await
    }

    /// Get a customer bill by ID.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the bill does not exist.
    pub async fn get_customer_billing(&self, id: &str) -> Result<CustomerBilling, DatabaseError> {
        fetch_customer_billing(&*self.db().conn().await, id).await
    }

    /// List customer bills, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_customer_billings(
        &self,
        limit: u32,
    ) -> Result<Vec<CustomerBilling>, DatabaseError> {
        let conn = self.db().conn().await;
        let mut rows = conn
            .query(
                &format!("{SELECT_CUSTOMER_BILLING} ORDER BY date DESC, id LIMIT ?1"),
                [i64::from(limit)],
            )
            .await?;
        let mut billings = Vec::new();
        while let Some(row) = rows.next().await? {
            billings.push(row_to_customer_billing(&row)?);
        }
        Ok(billings)
    }

    /// Apply `update` and record an UPDATE action.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the bill does not exist.
    pub async fn update_customer_billing(
        &self,
        actor_id: &str,
        id: &str,
        update: CustomerBillingUpdate,
    ) -> Result<CustomerBilling, DatabaseError> {
        let sql = billing_update_sql(
            update.name,
            update.date_billing.map(|d| ("date_billing", d)),
            update.price_cents,
            update.payment,
            update.comment,
        );
        if sql.is_empty() {
            return self.get_customer_billing(id).await;
        }

        let mut tx = self.begin_audited().await?;
        let result = async {
            let (sql, params) = sql.finish("customer_billings", "id", id);
            tx.conn()
                .execute(&sql, libsql::params_from_iter(params))
                .await?;
            let billing = fetch_customer_billing(tx.conn(), id).await?;
            tx.record_and_link(ActionKind::Update, actor_id, &billing)
                .await?;
            Ok::<_, DatabaseError>(billing)
        }
        .await;
        tx.finish(result).await
    }

    /// Record a DELETE action, then delete the customer bill.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the bill does not exist.
    pub async fn delete_customer_billing(
        &self,
        actor_id: &str,
        id: &str,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.begin_audited().await?;
        let result = async {
            let billing = fetch_customer_billing(tx.conn(), id).await?;
            tx.record_and_link(ActionKind::Delete, actor_id, &billing)
                .await?;
            tx.conn()
                .execute("DELETE FROM customer_billings WHERE id = ?1", [id])
                .await?;
            Ok::<_, DatabaseError>(())
        }
        .await;
        tx.finish(result).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{create_test_actor, test_service};
    use crate::updates::billing::{CustomerBillingUpdateBuilder, SupplierBillingUpdateBuilder};
    use farm_core::registry::EntityType;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn supplier_billing_lifecycle() {
        let svc = test_service().await;
        let actor = create_test_actor(&svc).await;

        let bill = svc
            .create_supplier_billing(
                &actor.id,
                NewBilling::new("Foin Dupont", now_micros(), 12_550)
                    .payment(FinancingType::Bank)
                    .comment("2 tonnes"),
            )
            .await
            .unwrap();
        assert!(bill.id.starts_with("sbl-"));
        assert_eq!(svc.get_supplier_billing(&bill.id).await.unwrap(), bill);

        let updated = svc
            .update_supplier_billing(
                &actor.id,
                &bill.id,
                SupplierBillingUpdateBuilder::new().price_cents(13_000).build(),
            )
            .await
            .unwrap();
        assert_eq!(updated.price_cents, 13_000);
        assert_eq!(updated.payment, FinancingType::Bank);

        svc.delete_supplier_billing(&actor.id, &bill.id).await.unwrap();
        let actions: Vec<ActionKind> = svc
            .history(EntityType::SupplierBilling, &bill.id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.action)
            .collect();
        assert_eq!(
            actions,
            vec![ActionKind::Create, ActionKind::Update, ActionKind::Delete]
        );
    }

    #[tokio::test]
    async fn customer_billing_lifecycle() {
        let svc = test_service().await;
        let actor = create_test_actor(&svc).await;

        let bill = svc
            .create_customer_billing(&actor.id, NewBilling::new("Marché", now_micros(), 4_000))
            .await
            .unwrap();
        assert!(bill.id.starts_with("cbl-"));
        assert_eq!(bill.payment, FinancingType::Cash);

        let updated = svc
            .update_customer_billing(
                &actor.id,
                &bill.id,
                CustomerBillingUpdateBuilder::new()
                    .payment(FinancingType::Other)
                    .name("Marché du samedi")
                    .build(),
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Marché du samedi");
        assert_eq!(updated.payment, FinancingType::Other);

        assert_eq!(svc.list_customer_billings(10).await.unwrap().len(), 1);
        svc.delete_customer_billing(&actor.id, &bill.id).await.unwrap();
        assert!(svc.list_customer_billings(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn billing_trails_stay_separate_per_type() {
        let svc = test_service().await;
        let actor = create_test_actor(&svc).await;
        svc.create_supplier_billing(&actor.id, NewBilling::new("A", now_micros(), 1))
            .await
            .unwrap();
        svc.create_customer_billing(&actor.id, NewBilling::new("B", now_micros(), 2))
            .await
            .unwrap();

        assert_eq!(svc.count_links(EntityType::SupplierBilling).await.unwrap(), 1);
        assert_eq!(svc.count_links(EntityType::CustomerBilling).await.unwrap(), 1);
    }
}
