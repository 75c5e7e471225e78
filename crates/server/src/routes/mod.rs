pub mod ai;
pub mod boards;
pub mod companies;
pub mod contacts;
pub mod files;
pub mod financials;
pub mod invoices;
pub mod notes;
pub mod projects;
pub mod search;
pub mod tasks;
pub mod users;
pub mod workflows;
