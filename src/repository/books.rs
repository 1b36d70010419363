//! Books repository (catalog accessor)

use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use super::page_bounds;
use crate::{
    error::{AppError, AppResult},
    models::book::{check_counts, Book, BookQuery, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Search books; `title`, `author` and `category` are OR-ed together
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let (limit, offset) = page_bounds(query.page, query.per_page);

        const FILTER: &str = r#"
            ($1::text IS NULL AND $2::text IS NULL AND $3::text IS NULL)
            OR title ILIKE '%' || $1 || '%'
            OR author ILIKE '%' || $2 || '%'
            OR category ILIKE '%' || $3 || '%'
        "#;

        let select_sql = format!(
            "SELECT * FROM books WHERE {} ORDER BY title LIMIT $4 OFFSET $5",
            FILTER
        );
        let count_sql = format!("SELECT COUNT(*) FROM books WHERE {}", FILTER);

        let books = sqlx::query_as::<_, Book>(&select_sql)
            .bind(&query.title)
            .bind(&query.author)
            .bind(&query.category)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(&query.title)
            .bind(&query.author)
            .bind(&query.category)
            .fetch_one(&self.pool)
            .await?;

        Ok((books, total))
    }

    /// Create a new book
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let available = book.available_count.unwrap_or(book.total_count);
        check_counts(book.total_count, available)?;

        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (id, title, author, category, total_count, available_count)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.category)
        .bind(book.total_count)
        .bind(available)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Update a book, keeping the stored value of every omitted field
    pub async fn update(&self, id: Uuid, update: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;
        let current = self.lock_by_id(&mut *tx, id).await?;

        let total = update.total_count.unwrap_or(current.total_count);
        let available = update.available_count.unwrap_or(current.available_count);
        check_counts(total, available)?;

        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $2, author = $3, category = $4, total_count = $5, available_count = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.title.as_ref().unwrap_or(&current.title))
        .bind(update.author.as_ref().unwrap_or(&current.author))
        .bind(update.category.as_ref().unwrap_or(&current.category))
        .bind(total)
        .bind(available)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Delete a book; fails with `Conflict` while loans still reference it
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    /// Find a book by its exact title and lock it
    pub async fn lock_by_title(&self, conn: &mut PgConnection, title: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE title = $1 FOR UPDATE")
            .bind(title)
            .fetch_optional(conn)
            .await?;
        Ok(book)
    }

    /// Get a book by ID and lock it
    pub async fn lock_by_id(&self, conn: &mut PgConnection, id: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Add `delta` to the available count of a locked book.
    ///
    /// The update re-checks the bounds in SQL so a stale `book` can never
    /// drive the count below zero or above the total.
    pub async fn adjust_availability(
        &self,
        conn: &mut PgConnection,
        book: &Book,
        delta: i32,
    ) -> AppResult<Book> {
        book.availability_after(delta)?;

        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET available_count = available_count + $2
            WHERE id = $1
              AND available_count + $2 >= 0
              AND available_count + $2 <= total_count
            RETURNING *
            "#,
        )
        .bind(book.id)
        .bind(delta)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| {
            AppError::Conflict(format!(
                "Availability of '{}' changed concurrently, retry the operation",
                book.title
            ))
        })
    }
}
