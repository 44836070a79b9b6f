//! Hashing defaults for the maps held by props and the in-memory host.

#[cfg(feature = "std-hash")]
pub mod default {
    pub use std::collections::hash_map::RandomState as BuildHasher;

    pub type HashMap<K, V> = std::collections::HashMap<K, V, BuildHasher>;
}

#[cfg(not(feature = "std-hash"))]
pub mod default {
    pub use ahash::RandomState as BuildHasher;

    pub type HashMap<K, V> = hashbrown::HashMap<K, V, BuildHasher>;
}

/// Ordered map keyed by prop name, hashed with whichever default is active.
pub type OrderedMap<K, V> = indexmap::IndexMap<K, V, default::BuildHasher>;
