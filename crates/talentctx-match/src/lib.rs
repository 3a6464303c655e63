pub mod matcher;
pub mod resolver;

pub use matcher::{MatchPolicy, NameMatcher};
pub use resolver::{CompanyResolver, MatchPath, Resolution};
