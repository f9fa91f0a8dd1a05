pub mod bank_balance;
pub mod health;
pub mod invoices;
pub mod payments;
pub mod students;
