//! Process-wide string interning.
//!
//! Per §5, the only shared mutable state in this crate is the string-intern table and the
//! font data cache (see `resolver::font`), both behind a mutex. Interning is used for
//! identifiers that recur constantly across a stylesheet (element tag names, `auto`,
//! `none`, custom property names) so that cascade comparisons are pointer/`Rc::ptr_eq`
//! comparisons rather than string comparisons, and so equal identifiers share storage.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::Mutex;

use once_cell::sync::Lazy;

static TABLE: Lazy<Mutex<HashSet<Rc<str>>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// An interned, reference-counted string.
///
/// Two `InternedStr`s produced from equal text always compare equal with `==`; they are
/// also cheap to `Clone` (an `Rc` bump) and cheap to compare for identity via
/// `InternedStr::ptr_eq`.
#[derive(Clone)]
pub struct InternedStr(Rc<str>);

impl InternedStr {
    pub fn new(s: &str) -> Self {
        let mut table = TABLE.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = table.get(s) {
            return InternedStr(existing.clone());
        }
        let rc: Rc<str> = Rc::from(s);
        table.insert(rc.clone());
        InternedStr(rc)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn ptr_eq(a: &InternedStr, b: &InternedStr) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl PartialEq for InternedStr {
    fn eq(&self, other: &Self) -> bool {
        InternedStr::ptr_eq(self, other) || self.0 == other.0
    }
}
impl Eq for InternedStr {}

impl Hash for InternedStr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for InternedStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for InternedStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl From<&str> for InternedStr {
    fn from(s: &str) -> Self {
        InternedStr::new(s)
    }
}

impl std::borrow::Borrow<str> for InternedStr {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_text_shares_storage() {
        let a = InternedStr::new("auto");
        let b = InternedStr::new("auto");
        assert!(InternedStr::ptr_eq(&a, &b));
    }

    #[test]
    fn different_text_does_not_share_storage() {
        let a = InternedStr::new("auto");
        let b = InternedStr::new("none");
        assert!(!InternedStr::ptr_eq(&a, &b));
        assert_ne!(a, b);
    }
}
