//! Global search across projects, companies, contacts, tasks, notes and
//! invoices. Plain LIKE matching per table, grouped into typed hits.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use strum_macros::Display;
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SearchKind {
    Project,
    Company,
    Contact,
    Task,
    Note,
    Invoice,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct SearchHit {
    pub kind: SearchKind,
    pub id: Uuid,
    /// Set when the hit belongs to a project, for the route hint.
    pub project_id: Option<Uuid>,
    pub title: String,
    pub snippet: Option<String>,
}

const PER_KIND_LIMIT: i64 = 20;

/// Escape LIKE wildcards in user input; queries use `ESCAPE '\'`.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

pub async fn search(pool: &SqlitePool, query: &str) -> Result<Vec<SearchHit>, sqlx::Error> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let pattern = like_pattern(trimmed);

    let mut hits = Vec::new();

    let projects: Vec<(Uuid, String, String)> = sqlx::query_as(
        r#"SELECT id, name, status
           FROM projects
           WHERE name LIKE $1 ESCAPE '\'
           ORDER BY name ASC
           LIMIT $2"#,
    )
    .bind(&pattern)
    .bind(PER_KIND_LIMIT)
    .fetch_all(pool)
    .await?;
    hits.extend(projects.into_iter().map(|(id, name, status)| SearchHit {
        kind: SearchKind::Project,
        id,
        project_id: Some(id),
        title: name,
        snippet: Some(status),
    }));

    let companies: Vec<(Uuid, String)> = sqlx::query_as(
        r#"SELECT id, name
           FROM companies
           WHERE name LIKE $1 ESCAPE '\'
           ORDER BY name ASC
           LIMIT $2"#,
    )
    .bind(&pattern)
    .bind(PER_KIND_LIMIT)
    .fetch_all(pool)
    .await?;
    hits.extend(companies.into_iter().map(|(id, name)| SearchHit {
        kind: SearchKind::Company,
        id,
        project_id: None,
        title: name,
        snippet: None,
    }));

    let contacts: Vec<(Uuid, String, Option<String>)> = sqlx::query_as(
        r#"SELECT id, name, email
           FROM contacts
           WHERE name LIKE $1 ESCAPE '\' OR email LIKE $1 ESCAPE '\'
           ORDER BY name ASC
           LIMIT $2"#,
    )
    .bind(&pattern)
    .bind(PER_KIND_LIMIT)
    .fetch_all(pool)
    .await?;
    hits.extend(contacts.into_iter().map(|(id, name, email)| SearchHit {
        kind: SearchKind::Contact,
        id,
        project_id: None,
        title: name,
        snippet: email,
    }));

    let tasks: Vec<(Uuid, Uuid, String)> = sqlx::query_as(
        r#"SELECT id, project_id, title
           FROM tasks
           WHERE title LIKE $1 ESCAPE '\' OR description LIKE $1 ESCAPE '\'
           ORDER BY created_at DESC
           LIMIT $2"#,
    )
    .bind(&pattern)
    .bind(PER_KIND_LIMIT)
    .fetch_all(pool)
    .await?;
    hits.extend(tasks.into_iter().map(|(id, project_id, title)| SearchHit {
        kind: SearchKind::Task,
        id,
        project_id: Some(project_id),
        title,
        snippet: None,
    }));

    let notes: Vec<(Uuid, Uuid, String)> = sqlx::query_as(
        r#"SELECT id, project_id, body
           FROM project_notes
           WHERE body LIKE $1 ESCAPE '\'
           ORDER BY created_at DESC
           LIMIT $2"#,
    )
    .bind(&pattern)
    .bind(PER_KIND_LIMIT)
    .fetch_all(pool)
    .await?;
    hits.extend(notes.into_iter().map(|(id, project_id, body)| {
        let title: String = body.chars().take(80).collect();
        SearchHit {
            kind: SearchKind::Note,
            id,
            project_id: Some(project_id),
            title,
            snippet: None,
        }
    }));

    let invoices: Vec<(Uuid, Uuid, String, String)> = sqlx::query_as(
        r#"SELECT id, project_id, number, status
           FROM invoices
           WHERE number LIKE $1 ESCAPE '\'
           ORDER BY created_at DESC
           LIMIT $2"#,
    )
    .bind(&pattern)
    .bind(PER_KIND_LIMIT)
    .fetch_all(pool)
    .await?;
    hits.extend(
        invoices
            .into_iter()
            .map(|(id, project_id, number, status)| SearchHit {
                kind: SearchKind::Invoice,
                id,
                project_id: Some(project_id),
                title: number,
                snippet: Some(status),
            }),
    );

    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_patterns_escape_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("acme"), "%acme%");
    }

    #[tokio::test]
    async fn search_groups_hits_by_kind() {
        let db = db::DBService::new_in_memory().await.unwrap();
        let company = db::models::company::Company::create(
            &db.pool,
            &db::models::company::CreateCompany {
                name: "Acme Corp".into(),
                website: None,
                notes: None,
            },
        )
        .await
        .unwrap();
        let project = db::models::project::Project::create(
            &db.pool,
            &db::models::project::CreateProject {
                name: "Acme relaunch".into(),
                company_id: Some(company.id),
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
        db::models::note::ProjectNote::create(
            &db.pool,
            project.id,
            &db::models::note::CreateNote {
                author_user_id: None,
                body: "Call acme about hosting".into(),
            },
        )
        .await
        .unwrap();

        let hits = search(&db.pool, "acme").await.unwrap();
        assert!(hits.iter().any(|h| h.kind == SearchKind::Project));
        assert!(hits.iter().any(|h| h.kind == SearchKind::Company));
        assert!(hits.iter().any(|h| h.kind == SearchKind::Note));

        assert!(search(&db.pool, "   ").await.unwrap().is_empty());
    }
}
