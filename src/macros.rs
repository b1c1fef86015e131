/// Builds a [`Value`](crate::Value) from JSON-like syntax.
///
/// ```rust
/// use serde_memo::{wire, Value};
///
/// let point = wire!({ "x": 1, "y": 2.5, "__type__": "Point" });
/// assert_eq!(point.type_tag(), Some("Point"));
/// assert_eq!(wire!([null, true]), Value::Array(vec![Value::Null, Value::Bool(true)]));
/// ```
#[macro_export]
macro_rules! wire {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![$($crate::wire!($elem)),*])
    };

    ({}) => {
        $crate::Value::Object($crate::ValueMap::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::ValueMap::new();
        $(
            object.insert($key.to_string(), $crate::wire!($value));
        )*
        $crate::Value::Object(object)
    }};

    // Any other expression with a `From` conversion into `Value`
    ($s:expr) => {
        $crate::Value::from($s)
    };
}

/// Implements [`Serializable`](crate::Serializable) for a struct with
/// `Default`, serializing the listed fields in order.
///
/// The wire name defaults to the struct name; `as "Name"` overrides it.
///
/// ```rust
/// use serde_memo::{serializable, Serializable};
///
/// #[derive(Default)]
/// struct Point { x: i64, y: i64 }
/// serializable!(Point as "geo.Point" { x, y });
///
/// assert_eq!(Point::TYPE_NAME, "geo.Point");
/// assert_eq!(Point::FIELDS, &["x", "y"]);
/// ```
#[macro_export]
macro_rules! serializable {
    ($ty:ident { $($field:ident),* $(,)? }) => {
        $crate::serializable!(@impl $ty, stringify!($ty), [$($field),*]);
    };

    ($ty:ident as $name:literal { $($field:ident),* $(,)? }) => {
        $crate::serializable!(@impl $ty, $name, [$($field),*]);
    };

    (@impl $ty:ident, $name:expr, [$($field:ident),*]) => {
        impl $crate::Serializable for $ty {
            const TYPE_NAME: &'static str = $name;
            const FIELDS: &'static [&'static str] = &[$(stringify!($field)),*];

            fn placeholder() -> Self {
                <Self as ::core::default::Default>::default()
            }

            #[allow(unused_variables)]
            fn serialize_field(
                &self,
                field: &str,
                ser: &mut $crate::Serializer<'_>,
            ) -> $crate::Result<$crate::Value> {
                $(
                    if field == stringify!($field) {
                        return ser.serialize(&self.$field);
                    }
                )*
                ::core::result::Result::Err($crate::Error::unexpected_field(
                    <Self as $crate::Serializable>::TYPE_NAME,
                    field,
                ))
            }

            #[allow(unused_variables)]
            fn deserialize_field(
                &mut self,
                field: &str,
                value: &$crate::Value,
                de: &mut $crate::Deserializer<'_>,
            ) -> $crate::Result<()> {
                $(
                    if field == stringify!($field) {
                        self.$field = de.deserialize(value)?;
                        return ::core::result::Result::Ok(());
                    }
                )*
                ::core::result::Result::Err($crate::Error::unexpected_field(
                    <Self as $crate::Serializable>::TYPE_NAME,
                    field,
                ))
            }
        }
    };
}
