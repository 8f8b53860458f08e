use std::fmt;
use std::marker::PhantomData;

/// Index-based identifier into one of the engine's arenas (nodes or the middlebox catalog).
///
/// The tag type keeps a `NodeId` from being used where a `MiddleboxId` is expected.
/// An `Id` carries no guarantee that the index is valid; the owning arena checks bounds.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct Id<T> {
    index: usize,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub const fn new(index: usize) -> Self {
        Id { index, _marker: PhantomData }
    }

    pub const fn index(&self) -> usize {
        self.index
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index)
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full_name = std::any::type_name::<T>();
        let clean_name = full_name.split("::").last().unwrap_or(full_name);
        let display_name = clean_name.replace("Tag", "Id");

        write!(f, "{}: {}", display_name, self.index)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct NodeTag;
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct MiddleboxTag;

pub type NodeId = Id<NodeTag>;
pub type MiddleboxId = Id<MiddleboxTag>;
