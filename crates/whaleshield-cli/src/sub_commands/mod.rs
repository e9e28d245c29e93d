pub mod balance;
pub mod new_identity;
pub mod quote;
pub mod simulate;
