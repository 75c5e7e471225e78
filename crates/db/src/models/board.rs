use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Column of a lightweight per-project note board. Card ordering within a
/// column is whatever the client last arranged.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct BoardColumn {
    pub id: String,
    pub title: String,
    pub card_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct BoardCard {
    pub id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// The board body, stored and returned wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct BoardLayout {
    pub columns: Vec<BoardColumn>,
    pub cards: Vec<BoardCard>,
}

/// One note board per project.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Board {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    /// JSON-serialized [`BoardLayout`].
    pub layout: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Board {
    pub fn parsed_layout(&self) -> BoardLayout {
        serde_json::from_str(&self.layout).unwrap_or_default()
    }

    pub async fn find_by_project_id(
        pool: &SqlitePool,
        project_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Board>(
            r#"SELECT id, project_id, title, layout, created_at, updated_at
               FROM boards
               WHERE project_id = $1"#,
        )
        .bind(project_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn upsert(
        pool: &SqlitePool,
        project_id: Uuid,
        title: &str,
        layout: &BoardLayout,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        let json = serde_json::to_string(layout).map_err(|e| sqlx::Error::Protocol(e.to_string()))?;
        sqlx::query_as::<_, Board>(
            r#"INSERT INTO boards (id, project_id, title, layout)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT(project_id) DO UPDATE SET
                   title = excluded.title,
                   layout = excluded.layout,
                   updated_at = datetime('now', 'subsec')
               RETURNING id, project_id, title, layout, created_at, updated_at"#,
        )
        .bind(id)
        .bind(project_id)
        .bind(title)
        .bind(json)
        .fetch_one(pool)
        .await
    }
}
