mod assets;
mod builder;
mod document;
mod featured;
mod markdown;
mod paths;
mod render;
mod source;
mod study;
mod toc;

pub use builder::Builder;
pub use paths::base_path_from_config;
