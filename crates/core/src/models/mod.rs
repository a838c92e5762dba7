pub mod currency;
pub mod deposit;
pub mod rate;
pub mod settings;
pub mod statement;
