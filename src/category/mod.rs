//! Categories group a user's expenses, e.g. 'Groceries' or 'Rent'.

mod create;
mod db;
mod delete;
mod domain;
mod page;
mod rename;

pub use create::create_category_endpoint;
pub use db::{
    CategoryDeletion, create_category, create_category_table, delete_category, get_category,
    list_categories, rename_category,
};
pub use delete::delete_category_endpoint;
pub use domain::{
    Category, CategoryId, CategoryName, CreateCategoryForm, DeleteCategoryForm,
    RenameCategoryForm,
};
pub use page::{CategoryState, get_categories_page};
pub use rename::{get_rename_category, rename_category_endpoint};
