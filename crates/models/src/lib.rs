pub mod artifact;
pub mod errors;
pub mod market;
pub mod schema;

pub use artifact::PriceModel;
pub use market::MarketTable;
pub use schema::CategorySchema;
