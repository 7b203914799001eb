mod identity_map;

pub use identity_map::SqliteIdentityMapRepo;
