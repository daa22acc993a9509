//! The endpoint URIs.
//!
//! Pages and the form posts that act on them share a path where possible,
//! e.g. `GET /add` shows the form and `POST /add` records the expense.

/// The monthly expenses page, the landing page for logged in users.
pub const ROOT: &str = "/";
/// The page and form post for adding an expense.
pub const ADD_EXPENSE: &str = "/add";
/// The page for listing categories and the form post for creating one.
pub const CATEGORIES: &str = "/categories";
/// The form post for deleting a category.
pub const DELETE_CATEGORY: &str = "/delete/category";
/// The form post for deleting an expense.
pub const DELETE_EXPENSE: &str = "/delete/expense";
/// The form post for renaming a category.
pub const RENAME_CATEGORY: &str = "/rename";
/// The page with the pie chart of yearly spending by category.
pub const STRUCTURE: &str = "/structure";
/// The route for getting the registration page and registering a user.
pub const REGISTER: &str = "/register";
/// The route for getting the log in page and logging in.
pub const LOG_IN: &str = "/login";
/// The route for logging out.
pub const LOG_OUT: &str = "/logout";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";
