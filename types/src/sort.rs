use serde::{Deserialize, Serialize};

/// Fields a `ModuleStore` may be sorted by when building a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    Hits,
    Visitors,
    Data,
    Bw,
    Usec,
    Prot,
    Mthd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// A sort configuration for one module's snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Sort {
    #[must_use]
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    #[must_use]
    pub fn hits_desc() -> Self {
        Self::new(SortField::Hits, SortOrder::Desc)
    }
}

impl Default for Sort {
    fn default() -> Self {
        Self::hits_desc()
    }
}
