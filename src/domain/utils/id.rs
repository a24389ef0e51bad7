use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A typed integer identifier.
///
/// The tag parameter keeps task ids and VM indices from being mixed up while
/// both stay plain `usize` values at runtime.
pub struct Id<T> {
    pub id: usize,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub const fn new(id: usize) -> Self {
        Id { id, _marker: PhantomData }
    }
}

// Manual impls: deriving would require the tag types to implement the traits.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full_name = std::any::type_name::<T>();
        let clean_name = full_name.split("::").last().unwrap_or(full_name);
        let display_name = clean_name.replace("Tag", "Id");

        write!(f, "{}: {}", display_name, self.id)
    }
}

impl<T> From<usize> for Id<T> {
    fn from(id: usize) -> Self {
        Id::new(id)
    }
}

impl<T> From<Id<T>> for usize {
    fn from(id_wrapper: Id<T>) -> Self {
        id_wrapper.id
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct TaskTag;
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct VmTag;

pub type TaskId = Id<TaskTag>;
pub type VmId = Id<VmTag>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_output_names_the_id_kind() {
        assert_eq!(format!("{:?}", TaskId::new(7)), "TaskId: 7");
        assert_eq!(format!("{:?}", VmId::new(2)), "VmId: 2");
        assert_eq!(TaskId::new(3).to_string(), "3");
    }
}
