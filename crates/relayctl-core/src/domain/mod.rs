//! Domain types for streams and their sources.

mod source;
mod stream;

pub use source::MediaSource;
pub use stream::{SlotSnapshot, SupervisionMode, stream_name, stream_url};
