pub mod assemble;
pub mod codechef;
pub mod codeforces;
pub mod config;
pub mod error;
pub mod locate;
pub mod normalize;
pub mod problem;
pub mod render;
pub mod report;

pub use assemble::{EditorialResult, ProblemMetadata};
pub use config::EditorialConfig;
pub use error::{EditorialError, Result};
pub use locate::Strategy;
pub use problem::{Platform, ProblemRef};
