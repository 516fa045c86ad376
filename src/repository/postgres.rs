use crate::error::Result;
use crate::models::{EmbeddedTrack, TrackFeatures, TrackSummary};
use crate::repository::{CriteriaQuery, MusicRepository};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

/// Postgres-backed catalog access. All queries are runtime-checked
/// (`query_as`/`query_scalar` with binds) to stay compatible with the
/// pgvector column without binary-protocol surprises.
pub struct PgMusicRepository {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct EmbeddedTrackRow {
    id: Uuid,
    embedding: pgvector::Vector,
    release_year: Option<i32>,
}

#[derive(Debug, FromRow)]
struct PrimaryArtistRow {
    track_id: Uuid,
    artist_id: Uuid,
}

impl PgMusicRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MusicRepository for PgMusicRepository {
    async fn artist_names(&self) -> Result<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT name
            FROM artists
            ORDER BY LENGTH(name) DESC, name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(names)
    }

    async fn find_artist_ids_by_name(&self, names: &[String]) -> Result<Vec<Uuid>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let lowered: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id
            FROM artists
            WHERE LOWER(name) = ANY($1)
            "#,
        )
        .bind(&lowered)
        .fetch_all(&self.db)
        .await?;

        Ok(ids)
    }

    async fn find_genre_ids_by_name(&self, names: &[String]) -> Result<Vec<Uuid>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let lowered: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id
            FROM genres
            WHERE LOWER(name) = ANY($1)
            "#,
        )
        .bind(&lowered)
        .fetch_all(&self.db)
        .await?;

        Ok(ids)
    }

    async fn embedded_tracks(
        &self,
        limit: usize,
        avoid_explicit: bool,
    ) -> Result<Vec<EmbeddedTrack>> {
        let rows = sqlx::query_as::<_, EmbeddedTrackRow>(
            r#"
            SELECT
                id, embedding,
                EXTRACT(YEAR FROM release_date)::int AS release_year
            FROM tracks
            WHERE embedding IS NOT NULL
            AND ($2 = false OR explicit = false)
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .bind(avoid_explicit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| EmbeddedTrack {
                id: r.id,
                embedding: r.embedding.to_vec(),
                release_year: r.release_year,
            })
            .collect())
    }

    async fn candidate_features(&self, ids: &[Uuid]) -> Result<Vec<TrackFeatures>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, TrackFeatures>(
            r#"
            SELECT
                id, tempo, energy, danceability, valence, acousticness,
                EXTRACT(YEAR FROM release_date)::int AS release_year,
                explicit
            FROM tracks
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    async fn candidates_have_release_dates(&self, ids: &[Uuid]) -> Result<bool> {
        if ids.is_empty() {
            return Ok(false);
        }

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM tracks
            WHERE id = ANY($1)
            AND release_date IS NOT NULL
            "#,
        )
        .bind(ids)
        .fetch_one(&self.db)
        .await?;

        Ok(count > 0)
    }

    async fn primary_artists(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Uuid>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, PrimaryArtistRow>(
            r#"
            SELECT DISTINCT ON (track_id) track_id, artist_id
            FROM track_artists
            WHERE track_id = ANY($1)
            ORDER BY track_id, position
            "#,
        )
        .bind(ids)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| (r.track_id, r.artist_id)).collect())
    }

    async fn search_tracks_text(&self, query: &str, limit: usize) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT t.id
            FROM tracks t
            LEFT JOIN track_artists ta ON ta.track_id = t.id AND ta.position = 0
            LEFT JOIN artists a ON a.id = ta.artist_id
            WHERE to_tsvector('simple', t.title || ' ' || COALESCE(a.name, ''))
                  @@ plainto_tsquery('simple', $1)
            LIMIT $2
            "#,
        )
        .bind(query)
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        Ok(ids)
    }

    async fn search_tracks_substring(&self, query: &str, limit: usize) -> Result<Vec<Uuid>> {
        let pattern = format!("%{}%", query);
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT t.id
            FROM tracks t
            LEFT JOIN track_artists ta ON ta.track_id = t.id
            LEFT JOIN artists a ON a.id = ta.artist_id
            WHERE t.title ILIKE $1 OR a.name ILIKE $1
            LIMIT $2
            "#,
        )
        .bind(pattern)
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        Ok(ids)
    }

    async fn tracks_by_genre(&self, genre: &str, limit: usize) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT tg.track_id
            FROM track_genres tg
            JOIN genres g ON g.id = tg.genre_id
            WHERE LOWER(g.name) = LOWER($1)
            ORDER BY RANDOM()
            LIMIT $2
            "#,
        )
        .bind(genre)
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        Ok(ids)
    }

    async fn tracks_by_artist(&self, artist: &str, limit: usize) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT ta.track_id
            FROM track_artists ta
            JOIN artists a ON a.id = ta.artist_id
            WHERE LOWER(a.name) = LOWER($1)
            ORDER BY RANDOM()
            LIMIT $2
            "#,
        )
        .bind(artist)
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        Ok(ids)
    }

    async fn tracks_by_criteria(&self, query: &CriteriaQuery, limit: usize) -> Result<Vec<Uuid>> {
        let (year_min, year_max) = query.year_range.unwrap_or((i32::MIN, i32::MAX));
        let (energy_min, energy_max) = query.energy_range.unwrap_or((0.0, 1.0));

        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT t.id
            FROM tracks t
            LEFT JOIN track_genres tg ON tg.track_id = t.id
            LEFT JOIN genres g ON g.id = tg.genre_id
            WHERE (CARDINALITY($1::text[]) = 0 OR LOWER(g.name) = ANY($1))
            AND ($2::int IS NULL OR EXTRACT(YEAR FROM t.release_date)::int BETWEEN $2 AND $3)
            AND (t.energy IS NULL OR t.energy BETWEEN $4 AND $5)
            LIMIT $6
            "#,
        )
        .bind(
            query
                .genres
                .iter()
                .map(|g| g.to_lowercase())
                .collect::<Vec<_>>(),
        )
        .bind(query.year_range.map(|_| year_min))
        .bind(year_max)
        .bind(energy_min)
        .bind(energy_max)
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        Ok(ids)
    }

    async fn random_tracks(&self, limit: usize) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM tracks ORDER BY RANDOM() LIMIT $1")
                .bind(limit as i64)
                .fetch_all(&self.db)
                .await?;

        Ok(ids)
    }

    async fn any_tracks(&self, limit: usize) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM tracks LIMIT $1")
            .bind(limit as i64)
            .fetch_all(&self.db)
            .await?;

        Ok(ids)
    }

    async fn track_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracks")
            .fetch_one(&self.db)
            .await?;

        Ok(count)
    }

    async fn track_summaries(&self, ids: &[Uuid]) -> Result<Vec<TrackSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, TrackSummary>(
            r#"
            SELECT
                t.id, t.title,
                COALESCE(a.name, 'Unknown') AS artist,
                EXTRACT(YEAR FROM t.release_date)::int AS year
            FROM tracks t
            LEFT JOIN track_artists ta ON ta.track_id = t.id AND ta.position = 0
            LEFT JOIN artists a ON a.id = ta.artist_id
            WHERE t.id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }
}
