//! Database operations for categories.
//!
//! Every query is scoped by the owning user so that one user can never see or
//! change another user's categories.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    auth::UserID,
    category::{Category, CategoryId, CategoryName},
    db::{UserValues, get_user_values},
    error::is_foreign_key_violation,
};

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id),
            category TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_categories_user_id ON categories(user_id);",
    )?;

    Ok(())
}

/// Retrieve the user's categories ordered alphabetically by name.
pub fn list_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, category FROM categories WHERE user_id = :user_id \
            ORDER BY category COLLATE NOCASE ASC;",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Retrieve a single category by ID if it belongs to `user_id`.
pub fn get_category(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, category FROM categories WHERE id = :id AND user_id = :user_id;")?
        .query_row(
            &[(":id", &category_id), (":user_id", &user_id.as_i64())],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve the user's category called `name`, ignoring case.
pub fn get_category_by_name(
    user_id: UserID,
    name: &CategoryName,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "SELECT id, category FROM categories \
            WHERE user_id = ?1 AND category = ?2 COLLATE NOCASE \
            ORDER BY id ASC LIMIT 1;",
        )?
        .query_row((user_id.as_i64(), name.as_ref()), map_row)
        .map_err(|error| error.into())
}

fn name_exists(user_id: UserID, name: &CategoryName, connection: &Connection) -> Result<bool, Error> {
    let names: Vec<String> = get_user_values(UserValues::CategoryNames, user_id, connection)?;

    Ok(names.iter().any(|existing_name| name.matches(existing_name)))
}

/// Create a category for `user_id` and return it with its generated ID.
///
/// # Errors
///
/// Returns [Error::DuplicateCategoryName] if the user already has a category
/// with the same name, ignoring case.
pub fn create_category(
    user_id: UserID,
    name: CategoryName,
    connection: &Connection,
) -> Result<Category, Error> {
    if name_exists(user_id, &name, connection)? {
        return Err(Error::DuplicateCategoryName(name.to_string()));
    }

    connection.execute(
        "INSERT INTO categories (user_id, category) VALUES (?1, ?2);",
        (user_id.as_i64(), name.as_ref()),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category { id, name })
}

/// Rename the user's category `old_name` to `new_name`, keeping its ID.
///
/// # Errors
///
/// Returns:
/// - [Error::UnknownCategory] if the user has no category called `old_name`.
/// - [Error::DuplicateCategoryName] if the user already has a category called
///   `new_name`, which includes renaming a category to its own name.
pub fn rename_category(
    user_id: UserID,
    old_name: &CategoryName,
    new_name: CategoryName,
    connection: &Connection,
) -> Result<Category, Error> {
    let category = match get_category_by_name(user_id, old_name, connection) {
        Ok(category) => category,
        Err(Error::NotFound) => return Err(Error::UnknownCategory(old_name.to_string())),
        Err(error) => return Err(error),
    };

    if name_exists(user_id, &new_name, connection)? {
        return Err(Error::DuplicateCategoryName(new_name.to_string()));
    }

    connection.execute(
        "UPDATE categories SET category = ?1 WHERE id = ?2 AND user_id = ?3;",
        (new_name.as_ref(), category.id, user_id.as_i64()),
    )?;

    Ok(Category {
        id: category.id,
        name: new_name,
    })
}

/// Count the user's expenses that are recorded under `category_id`, across all years.
pub fn count_expenses_in_category(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(1) FROM expenses WHERE user_id = ?1 AND category_id = ?2;",
            (user_id.as_i64(), category_id),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// The result of a successful call to [delete_category].
#[derive(Debug, PartialEq)]
pub enum CategoryDeletion {
    /// The category was removed.
    Deleted(Category),
    /// The user has no category with that name, nothing changed.
    NotFound,
}

/// Delete the user's category called `name`.
///
/// # Errors
///
/// Returns [Error::CategoryNotEmpty] if any of the user's expenses are recorded
/// under the category.
pub fn delete_category(
    user_id: UserID,
    name: &CategoryName,
    connection: &Connection,
) -> Result<CategoryDeletion, Error> {
    let category = match get_category_by_name(user_id, name, connection) {
        Ok(category) => category,
        Err(Error::NotFound) => {
            tracing::warn!("User {user_id} tried to delete the missing category \"{name}\"");
            return Ok(CategoryDeletion::NotFound);
        }
        Err(error) => return Err(error),
    };

    if count_expenses_in_category(user_id, category.id, connection)? > 0 {
        return Err(Error::CategoryNotEmpty(category.name.to_string()));
    }

    connection
        .execute(
            "DELETE FROM categories WHERE id = ?1 AND user_id = ?2;",
            (category.id, user_id.as_i64()),
        )
        .map_err(|error| {
            if is_foreign_key_violation(&error) {
                Error::CategoryNotEmpty(category.name.to_string())
            } else {
                error.into()
            }
        })?;

    Ok(CategoryDeletion::Deleted(category))
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let name = CategoryName::new_unchecked(&raw_name);

    Ok(Category { id, name })
}
