pub mod expenses;
pub mod projects;
pub mod uploads;
pub mod users;
