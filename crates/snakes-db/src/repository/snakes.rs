//! Snake repository.
//!
//! Rows are opaque: whatever columns the `snakes` table has come back as JSON.

use snakes_common::error::QueryFailure;

use crate::{Database, JsonRow, Param};

const LIST_ALL: &str = "SELECT * FROM snakes";
const FIND_BY_ID: &str = "SELECT * FROM snakes WHERE id = ?";

/// List every snake in the store's natural order.
pub async fn list_all(db: &Database) -> Result<Vec<JsonRow>, QueryFailure> {
    db.execute(LIST_ALL, &[]).await
}

/// Find a snake by id.
///
/// `id` is the raw path segment; see [`Param::coerce`]. Should the store hold
/// duplicate ids, the first row wins.
pub async fn find_by_id(db: &Database, id: &str) -> Result<Option<JsonRow>, QueryFailure> {
    let rows = db.execute(FIND_BY_ID, &[Param::coerce(id)]).await?;
    Ok(rows.into_iter().next())
}
