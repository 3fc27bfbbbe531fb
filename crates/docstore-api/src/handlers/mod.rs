pub mod documents;
pub mod health;
pub mod transfer;
pub mod validation;
