pub mod filename;
pub mod hash;
pub mod jwt;
pub mod location;
pub mod slug;
pub mod sniff;
pub mod token;
pub mod url_rewrite;
