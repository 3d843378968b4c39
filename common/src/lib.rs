pub mod audit;
pub mod farmer;
pub mod feedback;
pub mod order;
pub mod product;
pub mod role;
pub mod scoring;
pub mod user;
pub mod validate;
