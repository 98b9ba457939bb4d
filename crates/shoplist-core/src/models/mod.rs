pub mod filter_tag;
pub mod geolocation;
pub mod item;
pub mod received;

pub use filter_tag::{active_tags, merge_filter_state, toggle_by_tag, FilterTag};
pub use geolocation::Geolocation;
pub use item::{tags_equal, ClientRevision, Item, RevisionPolicy};
pub use received::{parse_received_items, ReceivedItem};
