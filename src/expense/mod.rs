//! Expenses are amounts spent on a day, recorded against one of the user's categories.

mod create;
mod db;
mod delete;
mod domain;

pub use create::{ExpenseState, add_expense_endpoint, get_add_expense_page};
pub use db::{
    ExpenseDeletion, add_expense, create_expense_table, delete_expense,
    delete_expense_with_disambiguation, get_expense, get_expenses_on_same_day,
};
pub use delete::delete_expense_endpoint;
pub use domain::{
    DeleteExpenseForm, Expense, ExpenseDate, ExpenseForm, ExpenseId, parse_amount,
    parse_category_id,
};
