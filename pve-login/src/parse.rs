//! Helpers for the loosely typed values the PVE API returns, where booleans and numbers may show
//! up as integers, strings or proper JSON values depending on the endpoint.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Unexpected};

/// Types a boolean-ish API value can be deserialized into.
pub trait FromBool: Sized + Default {
    fn from_bool(value: bool) -> Self;
}

impl FromBool for bool {
    fn from_bool(value: bool) -> Self {
        value
    }
}

impl FromBool for Option<bool> {
    fn from_bool(value: bool) -> Self {
        Some(value)
    }
}

/// Deserialize `1`, `0`, `true`, `"yes"`, `"off"`, ... into a boolean.
pub fn deserialize_bool<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: FromBool,
{
    deserializer.deserialize_any(BoolVisitor::<T>(PhantomData))
}

struct BoolVisitor<T>(PhantomData<T>);

impl<'de, T: FromBool> de::Visitor<'de> for BoolVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a boolean-ish value")
    }

    fn visit_some<D>(self, deserializer: D) -> Result<T, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }

    fn visit_none<E>(self) -> Result<T, E> {
        Ok(T::default())
    }

    fn visit_unit<E>(self) -> Result<T, E> {
        Ok(T::default())
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<T, E> {
        Ok(T::from_bool(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<T, E> {
        Ok(T::from_bool(value != 0))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<T, E> {
        Ok(T::from_bool(value != 0))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<T, E> {
        if value.eq_ignore_ascii_case("true")
            || value.eq_ignore_ascii_case("yes")
            || value.eq_ignore_ascii_case("on")
            || value == "1"
        {
            Ok(T::from_bool(true))
        } else if value.eq_ignore_ascii_case("false")
            || value.eq_ignore_ascii_case("no")
            || value.eq_ignore_ascii_case("off")
            || value == "0"
        {
            Ok(T::from_bool(false))
        } else {
            Err(E::invalid_value(Unexpected::Str(value), &self))
        }
    }
}

macro_rules! integer_helper {
    ($ty:ident, $deserialize_name:ident, $trait:ident, $from_name:ident, $visitor:ident) => {
        /// Types an integer-ish API value can be deserialized into.
        pub trait $trait: Sized + Default {
            fn $from_name(value: $ty) -> Self;
        }

        impl $trait for $ty {
            fn $from_name(value: $ty) -> Self {
                value
            }
        }

        impl $trait for Option<$ty> {
            fn $from_name(value: $ty) -> Self {
                Some(value)
            }
        }

        /// Deserialize a number which may also be sent as a string.
        pub fn $deserialize_name<'de, D, T>(deserializer: D) -> Result<T, D::Error>
        where
            D: serde::Deserializer<'de>,
            T: $trait,
        {
            deserializer.deserialize_any($visitor::<T>(PhantomData))
        }

        struct $visitor<T>(PhantomData<T>);

        impl<'de, T: $trait> de::Visitor<'de> for $visitor<T> {
            type Value = T;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(concat!("a ", stringify!($ty), "-ish value"))
            }

            fn visit_some<D>(self, deserializer: D) -> Result<T, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                deserializer.deserialize_any(self)
            }

            fn visit_none<E>(self) -> Result<T, E> {
                Ok(T::default())
            }

            fn visit_unit<E>(self) -> Result<T, E> {
                Ok(T::default())
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<T, E> {
                $ty::try_from(value)
                    .map_err(|_| E::invalid_value(Unexpected::Signed(value), &self))
                    .map(T::$from_name)
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<T, E> {
                $ty::try_from(value)
                    .map_err(|_| E::invalid_value(Unexpected::Unsigned(value), &self))
                    .map(T::$from_name)
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<T, E> {
                value
                    .parse::<$ty>()
                    .map_err(|_| E::invalid_value(Unexpected::Str(value), &self))
                    .map(T::$from_name)
            }
        }
    };
}

integer_helper!(u32, deserialize_u32, FromU32, from_u32, U32Visitor);
integer_helper!(u64, deserialize_u64, FromU64, from_u64, U64Visitor);
integer_helper!(i64, deserialize_i64, FromI64, from_i64, I64Visitor);

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Flags {
        #[serde(default, deserialize_with = "super::deserialize_bool")]
        need_tfa: bool,
        #[serde(default, deserialize_with = "super::deserialize_bool")]
        template: Option<bool>,
        #[serde(default, deserialize_with = "super::deserialize_u32")]
        vmid: Option<u32>,
    }

    #[test]
    fn perlish_values() {
        let flags: Flags =
            serde_json::from_str(r#"{"need_tfa": 1, "template": "0", "vmid": "100"}"#).unwrap();
        assert!(flags.need_tfa);
        assert_eq!(flags.template, Some(false));
        assert_eq!(flags.vmid, Some(100));

        let flags: Flags = serde_json::from_str(r#"{"need_tfa": true, "vmid": 101}"#).unwrap();
        assert!(flags.need_tfa);
        assert_eq!(flags.template, None);
        assert_eq!(flags.vmid, Some(101));

        let flags: Flags = serde_json::from_str("{}").unwrap();
        assert!(!flags.need_tfa);

        assert!(serde_json::from_str::<Flags>(r#"{"vmid": -1}"#).is_err());
        assert!(serde_json::from_str::<Flags>(r#"{"need_tfa": "maybe"}"#).is_err());
    }
}
