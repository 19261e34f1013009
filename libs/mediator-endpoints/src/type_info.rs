//! Runtime type identity for request, response and handler types.
//!
//! Key = `TypeId`, label = `type_name::<T>()`. The short name (last path segment,
//! generic arguments dropped) is what endpoint naming starts from.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a Rust type captured at registration time.
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    full_name: &'static str,
}

impl TypeInfo {
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            full_name: type_name::<T>(),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully-qualified name, e.g. `my_app::users::GetUserRequest`.
    #[inline]
    #[must_use]
    pub fn full_name(&self) -> &'static str {
        self.full_name
    }

    /// Short name: last path segment without generic arguments.
    ///
    /// ```
    /// # use mediator_endpoints::TypeInfo;
    /// assert_eq!(TypeInfo::of::<String>().name(), "String");
    /// assert_eq!(TypeInfo::of::<Vec<String>>().name(), "Vec");
    /// ```
    #[must_use]
    pub fn name(&self) -> &'static str {
        let head = match self.full_name.find('<') {
            Some(idx) => &self.full_name[..idx],
            None => self.full_name,
        };
        head.rsplit("::").next().unwrap_or(head)
    }

    #[inline]
    #[must_use]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_name)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::collections::HashSet;

    mod nested {
        pub struct GetUserRequest;
    }

    #[test]
    fn short_name_strips_module_path() {
        let info = TypeInfo::of::<nested::GetUserRequest>();
        assert_eq!(info.name(), "GetUserRequest");
        assert!(info.full_name().ends_with("nested::GetUserRequest"));
    }

    #[test]
    fn short_name_drops_generic_arguments() {
        assert_eq!(TypeInfo::of::<Option<nested::GetUserRequest>>().name(), "Option");
        assert_eq!(TypeInfo::of::<()>().name(), "()");
    }

    #[test]
    fn equality_uses_type_id() {
        assert_eq!(TypeInfo::of::<String>(), TypeInfo::of::<String>());
        assert_ne!(TypeInfo::of::<String>(), TypeInfo::of::<&'static str>());

        let set: HashSet<TypeInfo> = [TypeInfo::of::<u8>(), TypeInfo::of::<u8>()].into();
        assert_eq!(set.len(), 1);
        assert!(TypeInfo::of::<u8>().is::<u8>());
    }
}
