//! Projections from a parent model into one of its parts.
//!
//! A projection is the runtime half of a member descriptor: it knows how to
//! reach a field, an enum alternative or a container slot from a reference
//! to the enclosing value. Projections return `None` when the part does not
//! exist (any more), which detaches every place built on top of them.

/// Reach a `T` inside a `P`.
pub trait Project<P, T>: 'static {
    /// Shared access to the part, if it exists.
    fn project<'a>(&self, parent: &'a P) -> Option<&'a T>;

    /// Exclusive access to the part, if it exists.
    fn project_mut<'a>(&self, parent: &'a mut P) -> Option<&'a mut T>;
}

/// A struct field, addressed by a pair of accessor functions.
///
/// This is the equivalent of a pointer-to-member: the two functions are
/// plain `fn` pointers, so non-capturing closures such as `|m| &m.count`
/// coerce to them.
pub struct Field<P: 'static, T: 'static> {
    get: fn(&P) -> &T,
    get_mut: fn(&mut P) -> &mut T,
}

impl<P: 'static, T: 'static> Field<P, T> {
    /// Build a field projection.
    pub fn new(get: fn(&P) -> &T, get_mut: fn(&mut P) -> &mut T) -> Self {
        Self { get, get_mut }
    }
}

impl<P: 'static, T: 'static> Project<P, T> for Field<P, T> {
    fn project<'a>(&self, parent: &'a P) -> Option<&'a T> {
        Some((self.get)(parent))
    }

    fn project_mut<'a>(&self, parent: &'a mut P) -> Option<&'a mut T> {
        Some((self.get_mut)(parent))
    }
}

/// One alternative of an enum. Resolves only while that alternative is
/// active.
pub struct Arm<P: 'static, T: 'static> {
    get: fn(&P) -> Option<&T>,
    get_mut: fn(&mut P) -> Option<&mut T>,
}

impl<P: 'static, T: 'static> Arm<P, T> {
    /// Build an alternative projection.
    pub fn new(get: fn(&P) -> Option<&T>, get_mut: fn(&mut P) -> Option<&mut T>) -> Self {
        Self { get, get_mut }
    }
}

impl<P: 'static, T: 'static> Project<P, T> for Arm<P, T> {
    fn project<'a>(&self, parent: &'a P) -> Option<&'a T> {
        (self.get)(parent)
    }

    fn project_mut<'a>(&self, parent: &'a mut P) -> Option<&'a mut T> {
        (self.get_mut)(parent)
    }
}

/// A position in a `Vec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Index(pub usize);

impl<T: 'static> Project<Vec<T>, T> for Index {
    fn project<'a>(&self, parent: &'a Vec<T>) -> Option<&'a T> {
        parent.get(self.0)
    }

    fn project_mut<'a>(&self, parent: &'a mut Vec<T>) -> Option<&'a mut T> {
        parent.get_mut(self.0)
    }
}
