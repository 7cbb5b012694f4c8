pub mod build;
pub mod config;
pub mod recommend;
pub mod status;
pub mod vocab;

pub use build::run_build;
pub use recommend::{run_recommend, RecommendRequest};
pub use status::show_status;
pub use vocab::show_vocab;
