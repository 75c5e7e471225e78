use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// Quotes and invoices share one table, distinguished by `doc_type`.
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InvoiceDocType {
    Quote,
    #[default]
    Invoice,
}

/// Informal lifecycle: draft → sent → paid/overdue/cancelled for invoices,
/// draft → sent → accepted/rejected for quotes. Any transition is accepted.
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
    Accepted,
    Rejected,
}

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    PartiallyPaid,
    Paid,
}

/// Monetary amounts are integer cents; tax rates are basis points.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Invoice {
    pub id: Uuid,
    pub project_id: Uuid,
    pub doc_type: InvoiceDocType,
    pub number: String,
    pub status: InvoiceStatus,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_rate_bp: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_status: PaymentStatus,
    pub approved_by_client: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct InvoiceItem {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub description: String,
    /// Quantity in thousandths, so fractional hours survive integer storage.
    pub quantity_milli: i64,
    pub unit_price_cents: i64,
    pub amount_cents: i64,
    pub position: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateInvoiceItem {
    pub description: String,
    pub quantity_milli: Option<i64>,
    pub unit_price_cents: i64,
    pub position: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateInvoice {
    pub doc_type: InvoiceDocType,
    pub number: String,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub discount_cents: Option<i64>,
    pub tax_rate_bp: Option<i64>,
    pub notes: Option<String>,
    pub items: Vec<CreateInvoiceItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct InvoiceWithItems {
    #[serde(flatten)]
    #[ts(flatten)]
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
}

impl std::ops::Deref for InvoiceWithItems {
    type Target = Invoice;
    fn deref(&self) -> &Self::Target {
        &self.invoice
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

/// Line amount: quantity (thousandths) × unit price, rounded half-up.
pub fn item_amount_cents(quantity_milli: i64, unit_price_cents: i64) -> i64 {
    let raw = quantity_milli as i128 * unit_price_cents as i128;
    ((raw + 500) / 1000) as i64
}

/// Totals are always derived server-side: tax applies to the discounted
/// subtotal, and `total = subtotal - discount + tax`.
pub fn compute_totals(item_amounts: &[i64], discount_cents: i64, tax_rate_bp: i64) -> InvoiceTotals {
    let subtotal_cents: i64 = item_amounts.iter().sum();
    let taxable = (subtotal_cents - discount_cents).max(0);
    let tax_cents = ((taxable as i128 * tax_rate_bp as i128 + 5_000) / 10_000) as i64;
    InvoiceTotals {
        subtotal_cents,
        tax_cents,
        total_cents: subtotal_cents - discount_cents + tax_cents,
    }
}

const INVOICE_COLUMNS: &str = r#"id, project_id, doc_type, number, status, issue_date, due_date,
    subtotal_cents, discount_cents, tax_rate_bp, tax_cents, total_cents, payment_status,
    approved_by_client, notes, created_at, updated_at"#;

const ITEM_COLUMNS: &str =
    "id, invoice_id, description, quantity_milli, unit_price_cents, amount_cents, position";

impl Invoice {
    /// Insert the invoice and its line items in one transaction, with all
    /// derived amounts computed here rather than trusted from the caller.
    pub async fn create_with_items(
        pool: &SqlitePool,
        project_id: Uuid,
        data: &CreateInvoice,
    ) -> Result<InvoiceWithItems, sqlx::Error> {
        let id = Uuid::new_v4();
        let discount_cents = data.discount_cents.unwrap_or(0);
        let tax_rate_bp = data.tax_rate_bp.unwrap_or(0);

        let amounts: Vec<i64> = data
            .items
            .iter()
            .map(|item| item_amount_cents(item.quantity_milli.unwrap_or(1000), item.unit_price_cents))
            .collect();
        let totals = compute_totals(&amounts, discount_cents, tax_rate_bp);

        let mut tx = pool.begin().await?;

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"INSERT INTO invoices
                   (id, project_id, doc_type, number, issue_date, due_date, subtotal_cents,
                    discount_cents, tax_rate_bp, tax_cents, total_cents, notes)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
               RETURNING {INVOICE_COLUMNS}"#
        ))
        .bind(id)
        .bind(project_id)
        .bind(data.doc_type)
        .bind(&data.number)
        .bind(data.issue_date)
        .bind(data.due_date)
        .bind(totals.subtotal_cents)
        .bind(discount_cents)
        .bind(tax_rate_bp)
        .bind(totals.tax_cents)
        .bind(totals.total_cents)
        .bind(&data.notes)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(data.items.len());
        for (i, item) in data.items.iter().enumerate() {
            let quantity_milli = item.quantity_milli.unwrap_or(1000);
            let row = sqlx::query_as::<_, InvoiceItem>(&format!(
                r#"INSERT INTO invoice_items
                       (id, invoice_id, description, quantity_milli, unit_price_cents,
                        amount_cents, position)
                   VALUES ($1, $2, $3, $4, $5, $6, $7)
                   RETURNING {ITEM_COLUMNS}"#
            ))
            .bind(Uuid::new_v4())
            .bind(id)
            .bind(&item.description)
            .bind(quantity_milli)
            .bind(item.unit_price_cents)
            .bind(amounts[i])
            .bind(item.position.unwrap_or(i as i64))
            .fetch_one(&mut *tx)
            .await?;
            items.push(row);
        }

        tx.commit().await?;

        Ok(InvoiceWithItems { invoice, items })
    }

    pub async fn find_by_project_id(
        pool: &SqlitePool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Invoice>(&format!(
            r#"SELECT {INVOICE_COLUMNS}
               FROM invoices
               WHERE project_id = $1
               ORDER BY created_at DESC"#
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Invoice>(&format!(
            r#"SELECT {INVOICE_COLUMNS}
               FROM invoices
               WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_items(pool: &SqlitePool, invoice_id: Uuid) -> Result<Vec<InvoiceItem>, sqlx::Error> {
        sqlx::query_as::<_, InvoiceItem>(&format!(
            r#"SELECT {ITEM_COLUMNS}
               FROM invoice_items
               WHERE invoice_id = $1
               ORDER BY position ASC"#
        ))
        .bind(invoice_id)
        .fetch_all(pool)
        .await
    }

    pub async fn with_items(
        pool: &SqlitePool,
        id: Uuid,
    ) -> Result<Option<InvoiceWithItems>, sqlx::Error> {
        let Some(invoice) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let items = Self::find_items(pool, id).await?;
        Ok(Some(InvoiceWithItems { invoice, items }))
    }

    /// Drop and re-insert line items, recomputing all totals.
    pub async fn replace_items(
        pool: &SqlitePool,
        id: Uuid,
        items: &[CreateInvoiceItem],
    ) -> Result<Option<InvoiceWithItems>, sqlx::Error> {
        let Some(existing) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let amounts: Vec<i64> = items
            .iter()
            .map(|item| item_amount_cents(item.quantity_milli.unwrap_or(1000), item.unit_price_cents))
            .collect();
        let totals = compute_totals(&amounts, existing.discount_cents, existing.tax_rate_bp);

        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM invoice_items WHERE invoice_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let mut new_items = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let row = sqlx::query_as::<_, InvoiceItem>(&format!(
                r#"INSERT INTO invoice_items
                       (id, invoice_id, description, quantity_milli, unit_price_cents,
                        amount_cents, position)
                   VALUES ($1, $2, $3, $4, $5, $6, $7)
                   RETURNING {ITEM_COLUMNS}"#
            ))
            .bind(Uuid::new_v4())
            .bind(id)
            .bind(&item.description)
            .bind(item.quantity_milli.unwrap_or(1000))
            .bind(item.unit_price_cents)
            .bind(amounts[i])
            .bind(item.position.unwrap_or(i as i64))
            .fetch_one(&mut *tx)
            .await?;
            new_items.push(row);
        }

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"UPDATE invoices
               SET subtotal_cents = $2, tax_cents = $3, total_cents = $4,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {INVOICE_COLUMNS}"#
        ))
        .bind(id)
        .bind(totals.subtotal_cents)
        .bind(totals.tax_cents)
        .bind(totals.total_cents)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(InvoiceWithItems {
            invoice,
            items: new_items,
        }))
    }

    pub async fn update_status(
        pool: &SqlitePool,
        id: Uuid,
        status: InvoiceStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Invoice>(&format!(
            r#"UPDATE invoices
               SET status = $2, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {INVOICE_COLUMNS}"#
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await
    }

    pub async fn set_payment_status(
        pool: &SqlitePool,
        id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Invoice>(&format!(
            r#"UPDATE invoices
               SET payment_status = $2, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {INVOICE_COLUMNS}"#
        ))
        .bind(id)
        .bind(payment_status)
        .fetch_optional(pool)
        .await
    }

    /// Client approval only means anything for quotes; the flag is stored
    /// regardless and read by the financials completion predicate.
    pub async fn set_client_approval(
        pool: &SqlitePool,
        id: Uuid,
        approved: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Invoice>(&format!(
            r#"UPDATE invoices
               SET approved_by_client = $2, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {INVOICE_COLUMNS}"#
        ))
        .bind(id)
        .bind(approved)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_match_the_worked_example() {
        // subtotal 1000.00, discount 100.00, tax 5% → tax 45.00, total 945.00
        let totals = compute_totals(&[100_000], 10_000, 500);
        assert_eq!(totals.subtotal_cents, 100_000);
        assert_eq!(totals.tax_cents, 4_500);
        assert_eq!(totals.total_cents, 94_500);
    }

    #[test]
    fn discount_larger_than_subtotal_does_not_go_negative_on_tax() {
        let totals = compute_totals(&[5_000], 10_000, 500);
        assert_eq!(totals.tax_cents, 0);
        assert_eq!(totals.total_cents, -5_000);
    }

    #[test]
    fn item_amount_rounds_half_up() {
        // 1.5 × $0.33 = $0.495 → 50 cents
        assert_eq!(item_amount_cents(1_500, 33), 50);
        // whole quantities stay exact
        assert_eq!(item_amount_cents(3_000, 2_500), 7_500);
    }

    #[tokio::test]
    async fn create_with_items_persists_derived_totals() {
        let db = crate::DBService::new_in_memory().await.unwrap();
        let project = crate::models::project::Project::create(
            &db.pool,
            &crate::models::project::CreateProject {
                name: "Acme site".into(),
                company_id: None,
                contact_id: None,
                status: None,
                pipeline: None,
                subtype: None,
                needs_figma: None,
                value_cents: None,
                start_date: None,
                due_date: None,
            },
        )
        .await
        .unwrap();

        let created = Invoice::create_with_items(
            &db.pool,
            project.id,
            &CreateInvoice {
                doc_type: InvoiceDocType::Invoice,
                number: "INV-001".into(),
                issue_date: None,
                due_date: None,
                discount_cents: Some(10_000),
                tax_rate_bp: Some(500),
                notes: None,
                items: vec![CreateInvoiceItem {
                    description: "Build".into(),
                    quantity_milli: Some(1_000),
                    unit_price_cents: 100_000,
                    position: None,
                }],
            },
        )
        .await
        .unwrap();

        assert_eq!(created.total_cents, 94_500);
        let reloaded = Invoice::with_items(&db.pool, created.id).await.unwrap().unwrap();
        assert_eq!(reloaded.items.len(), 1);
        assert_eq!(reloaded.subtotal_cents, 100_000);
    }
}
