pub mod account;
pub mod models;
pub mod sign;
pub mod trading;
