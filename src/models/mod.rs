pub mod city;
pub mod customer;
pub mod flat;
pub mod invoice;
pub mod meter;
pub mod project;
pub mod report;
pub mod template;
pub mod tower;
pub mod user;

pub use city::*;
pub use customer::*;
pub use flat::*;
pub use invoice::*;
pub use meter::*;
pub use project::*;
pub use report::*;
pub use template::*;
pub use tower::*;
pub use user::*;
