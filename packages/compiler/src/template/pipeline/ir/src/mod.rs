pub mod expression;
pub mod handle;
pub mod operations;
pub mod ops;
pub mod traits;
pub mod variable;
