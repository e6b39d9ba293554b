mod key;
mod structs;

pub use key::cache_key;
pub use structs::RequestCache;
