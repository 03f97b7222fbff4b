pub mod labels;
pub mod post;
