pub mod calculation;
pub mod product;
pub mod scenario;
pub mod wizard;
