use crate::state::{ItemType, OwnedItem};

/// Resolves a feat, talent, power or gear name to a full item record.
///
/// The engine decides *which* names to materialize; the catalog only knows
/// what a name looks like as an item. Returned records carry `ItemId(0)`; the
/// id is assigned when the item is inserted into an actor.
pub trait ItemCatalog: Send + Sync {
    fn resolve(&self, item_type: ItemType, name: &str) -> Option<OwnedItem>;
}

/// Catalog that resolves nothing. Every materialized name becomes a bare record.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyCatalog;

impl ItemCatalog for EmptyCatalog {
    fn resolve(&self, _item_type: ItemType, _name: &str) -> Option<OwnedItem> {
        None
    }
}
