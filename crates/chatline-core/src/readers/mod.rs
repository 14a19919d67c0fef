//! Single-purpose readers over the conversations and messages tables.
//! Each one is a thin query description plus row decoding; pagination is
//! left to [`crate::pager::walk`].

mod activity;
mod index;
mod participants;
mod thread;

use std::sync::Arc;

use chatline_db::Store;

use crate::tables::Tables;

/// Store capability plus table names, shared by every reader. Cloning is
/// cheap so it can be moved into spawned fan-out tasks.
#[derive(Clone)]
pub struct Readers {
    store: Arc<dyn Store>,
    tables: Arc<Tables>,
}

impl Readers {
    pub fn new(store: Arc<dyn Store>, tables: Tables) -> Self {
        Self {
            store,
            tables: Arc::new(tables),
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }
}
