//! Presence checks over optional and repeated binding fields.
//!
//! PAGE element types carry many optional attributes this crate does not
//! interpret. They are passed through as metadata, which needs one uniform
//! notion of "this field was given" for singular and repeated fields alike.

use crate::model::MetadataMap;
use serde::Serialize;
use serde_json::Value;

/// Whether a bound field carries a value.
pub trait Presence {
    /// `true` if the field was given and is not empty.
    fn is_present(&self) -> bool;
}

impl<T: Presence> Presence for Option<T> {
    fn is_present(&self) -> bool {
        self.as_ref().is_some_and(Presence::is_present)
    }
}

impl<T: Presence + ?Sized> Presence for &T {
    fn is_present(&self) -> bool {
        (**self).is_present()
    }
}

impl<T: Presence + ?Sized> Presence for Box<T> {
    fn is_present(&self) -> bool {
        (**self).is_present()
    }
}

impl Presence for str {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Presence for String {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Presence for [T] {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Presence for Vec<T> {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Presence for MetadataMap {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Presence for Value {
    fn is_present(&self) -> bool {
        match self {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
            Value::Bool(_) | Value::Number(_) => true,
        }
    }
}

macro_rules! always_present {
    ($($t:ty),*) => {
        $(impl Presence for $t {
            fn is_present(&self) -> bool {
                true
            }
        })*
    };
}

always_present!(bool, i32, i64, u32, u64, usize, f32, f64);

/// Insert `value` under `name` if it is present.
pub fn insert_if_present<T>(map: &mut MetadataMap, name: &str, value: &T)
where
    T: Presence + Serialize + ?Sized,
{
    if !value.is_present() {
        return;
    }
    match serde_json::to_value(value) {
        Ok(v) => {
            map.insert(name.to_string(), v);
        }
        Err(e) => log::warn!("Could not record attribute [{}]: {}", name, e),
    }
}

/// Build a sparse metadata map holding only the present entries.
///
/// ```
/// use unpage::collect_if_present;
///
/// let rows: Option<i64> = Some(3);
/// let colour: Option<String> = None;
/// let map = collect_if_present! { "rows" => rows, "lineColour" => colour };
/// assert_eq!(map.len(), 1);
/// ```
#[macro_export]
macro_rules! collect_if_present {
    ($($name:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut map = $crate::model::MetadataMap::new();
        $( $crate::binding::presence::insert_if_present(&mut map, $name, &$value); )*
        map
    }};
}
