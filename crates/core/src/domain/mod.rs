pub mod account;
pub mod chat;
pub mod product;
pub mod sale;
