/// Implement [`Set`](crate::data::Set) for a struct by listing its bindable fields
/// in SQL position order, each with its [`Type`](crate::types::Type) variant name.
///
/// Field storage must match the kind: `Int` → [`Int`](crate::types::Int),
/// `IntN` → [`IntN`](crate::data::IntN), `Char`/`Binary` → `[u8; N]`,
/// `CharN`/`BinaryN` → [`NullableArray<u8, N>`](crate::data::NullableArray). The
/// byte size of fixed fields is taken from the array length.
///
/// ```rust
/// use sql_dispatch::data::{NullableArray, Set, TextN};
/// use sql_dispatch::types::{Bigint, Type};
///
/// #[derive(Default)]
/// struct Session {
///     id: Bigint,
///     user: TextN,
///     token: [u8; 16],
///     tag: NullableArray<u8, 4>,
/// }
///
/// sql_dispatch::sql_set!(Session {
///     id: Bigint,
///     user: TextN,
///     token: Binary,
///     tag: CharN,
/// });
///
/// let s = Session::default();
/// assert_eq!(s.count(), 4);
/// assert_eq!(s.size_of(2), 16);
/// assert_eq!(s.size_of(3), 4);
/// assert_eq!(s.type_of(4), Type::Nothing);
/// ```
#[macro_export]
macro_rules! sql_set {
    (@count) => { 0usize };
    (@count $head:ident $($tail:ident)*) => { 1usize + $crate::sql_set!(@count $($tail)*) };

    (@size Char, $place:expr) => { $place.len() };
    (@size Binary, $place:expr) => { $place.len() };
    (@size CharN, $place:expr) => { $place.storage().len() };
    (@size BinaryN, $place:expr) => { $place.storage().len() };
    (@size $kind:ident, $place:expr) => { 0usize };

    (@ref Char, $place:expr) => { $crate::data::FieldRef::Char(&$place[..]) };
    (@ref Binary, $place:expr) => { $crate::data::FieldRef::Binary(&$place[..]) };
    (@ref CharN, $place:expr) => {
        $crate::data::FieldRef::CharN(&$place.storage()[..], $place.is_null())
    };
    (@ref BinaryN, $place:expr) => {
        $crate::data::FieldRef::BinaryN(&$place.storage()[..], $place.is_null())
    };
    (@ref $kind:ident, $place:expr) => { $crate::data::FieldRef::$kind(&$place) };

    (@mut Char, $place:expr) => { $crate::data::FieldMut::Char(&mut $place[..]) };
    (@mut Binary, $place:expr) => { $crate::data::FieldMut::Binary(&mut $place[..]) };
    (@mut CharN, $place:expr) => {{
        let (bytes, null) = $place.parts_mut();
        $crate::data::FieldMut::CharN(&mut bytes[..], null)
    }};
    (@mut BinaryN, $place:expr) => {{
        let (bytes, null) = $place.parts_mut();
        $crate::data::FieldMut::BinaryN(&mut bytes[..], null)
    }};
    (@mut $kind:ident, $place:expr) => { $crate::data::FieldMut::$kind(&mut $place) };

    ($record:ident { $( $field:ident : $kind:ident ),* $(,)? }) => {
        impl $crate::data::Set for $record {
            fn count(&self) -> usize {
                $crate::sql_set!(@count $($field)*)
            }

            fn type_of(&self, index: usize) -> $crate::types::Type {
                const TYPES: &[$crate::types::Type] = &[$($crate::types::Type::$kind),*];
                TYPES
                    .get(index)
                    .copied()
                    .unwrap_or($crate::types::Type::Nothing)
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn size_of(&self, index: usize) -> usize {
                let mut remaining = index;
                $(
                    if remaining == 0 {
                        return $crate::sql_set!(@size $kind, self.$field);
                    }
                    remaining -= 1;
                )*
                0
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn field(&self, index: usize) -> Option<$crate::data::FieldRef<'_>> {
                let mut remaining = index;
                $(
                    if remaining == 0 {
                        return Some($crate::sql_set!(@ref $kind, self.$field));
                    }
                    remaining -= 1;
                )*
                None
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn field_mut(&mut self, index: usize) -> Option<$crate::data::FieldMut<'_>> {
                let mut remaining = index;
                $(
                    if remaining == 0 {
                        return Some($crate::sql_set!(@mut $kind, self.$field));
                    }
                    remaining -= 1;
                )*
                None
            }
        }
    };
}
