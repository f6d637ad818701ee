pub mod content;
pub mod ddl;
pub mod metadata;
pub mod playlists;
