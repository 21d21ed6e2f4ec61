pub mod keywords;
pub mod resolver;

pub use keywords::{detect, KeywordMatch};
pub use resolver::{DescriptionProvider, DescriptionResolver, EmbeddedDescription, ResolvedDescription};
