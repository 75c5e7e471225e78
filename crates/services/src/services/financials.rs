//! Per-project financial summary, aggregated from the invoices table.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// One row per project that has at least one quote or invoice. Rejected
/// quotes and cancelled invoices are left out of the sums.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ProjectFinancialSummary {
    pub project_id: Uuid,
    pub project_name: String,
    pub quoted_cents: i64,
    pub invoiced_cents: i64,
    pub paid_cents: i64,
    pub outstanding_cents: i64,
}

pub async fn summary(pool: &SqlitePool) -> Result<Vec<ProjectFinancialSummary>, sqlx::Error> {
    sqlx::query_as::<_, ProjectFinancialSummary>(
        r#"SELECT
               p.id   AS project_id,
               p.name AS project_name,
               COALESCE(SUM(CASE WHEN i.doc_type = 'quote'   AND i.status != 'rejected'
                                 THEN i.total_cents END), 0) AS quoted_cents,
               COALESCE(SUM(CASE WHEN i.doc_type = 'invoice' AND i.status != 'cancelled'
                                 THEN i.total_cents END), 0) AS invoiced_cents,
               COALESCE(SUM(CASE WHEN i.doc_type = 'invoice' AND i.status != 'cancelled'
                                 AND i.payment_status = 'paid'
                                 THEN i.total_cents END), 0) AS paid_cents,
               COALESCE(SUM(CASE WHEN i.doc_type = 'invoice' AND i.status != 'cancelled'
                                 THEN i.total_cents END), 0)
                 - COALESCE(SUM(CASE WHEN i.doc_type = 'invoice' AND i.status != 'cancelled'
                                 AND i.payment_status = 'paid'
                                 THEN i.total_cents END), 0) AS outstanding_cents
           FROM projects p
           JOIN invoices i ON i.project_id = p.id
           GROUP BY p.id, p.name
           ORDER BY p.name ASC"#,
    )
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::models::invoice::{
        CreateInvoice, CreateInvoiceItem, Invoice, InvoiceDocType, PaymentStatus,
    };
    use db::models::project::{CreateProject, Project};

    async fn invoice(
        pool: &SqlitePool,
        project_id: Uuid,
        doc_type: InvoiceDocType,
        number: &str,
        unit_price_cents: i64,
    ) -> Invoice {
        Invoice::create_with_items(
            pool,
            project_id,
            &CreateInvoice {
                doc_type,
                number: number.into(),
                issue_date: None,
                due_date: None,
                discount_cents: None,
                tax_rate_bp: None,
                notes: None,
                items: vec![CreateInvoiceItem {
                    description: "work".into(),
                    quantity_milli: None,
                    unit_price_cents,
                    position: None,
                }],
            },
        )
        .await
        .unwrap()
        .invoice
    }

    #[tokio::test]
    async fn summary_splits_quoted_invoiced_and_paid() {
        let db = db::DBService::new_in_memory().await.unwrap();
        let project = Project::create(
            &db.pool,
            &CreateProject {
                name: "Relaunch".into(),
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

        invoice(&db.pool, project.id, InvoiceDocType::Quote, "Q-1", 200_000).await;
        let paid = invoice(&db.pool, project.id, InvoiceDocType::Invoice, "INV-1", 120_000).await;
        invoice(&db.pool, project.id, InvoiceDocType::Invoice, "INV-2", 60_000).await;
        Invoice::set_payment_status(&db.pool, paid.id, PaymentStatus::Paid)
            .await
            .unwrap();

        let rows = summary(&db.pool).await.unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.quoted_cents, 200_000);
        assert_eq!(row.invoiced_cents, 180_000);
        assert_eq!(row.paid_cents, 120_000);
        assert_eq!(row.outstanding_cents, 60_000);
    }
}
