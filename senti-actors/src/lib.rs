//! Small tokio actor runtime plus the page actor that drives the
//! sentiment front end.

pub mod actor;
pub mod builder;
pub mod page;
pub mod registry;
pub mod system;

pub use page::{PageActor, PageEvent, PageMsg};
