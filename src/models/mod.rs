pub mod expense;
pub mod project;
pub mod upload;
pub mod user;

pub use expense::{Expense, NewExpense};
pub use project::Project;
pub use upload::Upload;
pub use user::User;
