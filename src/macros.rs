/// Declares a string-backed enum that stays open to values Meta adds later.
///
/// Every listed variant maps to one wire string. Anything else decodes into
/// `Other(raw)` and encodes back to the same `raw`, so unknown values survive
/// a decode/encode cycle untouched.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $raw:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(PartialEq, Eq, Hash, Clone, Debug)]
        #[non_exhaustive]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )*
            /// A value not known to this crate, kept verbatim.
            Other(String),
        }

        impl $name {
            /// Returns the wire representation of this value.
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $raw,)*
                    Self::Other(raw) => raw,
                }
            }

            /// Whether this value is not one of the known variants.
            #[inline]
            pub fn is_other(&self) -> bool {
                matches!(self, Self::Other(_))
            }

            fn known(raw: &str) -> Option<Self> {
                match raw {
                    $($raw => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::known(raw).unwrap_or_else(|| Self::Other(raw.to_owned()))
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self::known(&raw).unwrap_or(Self::Other(raw))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                <String as serde::Deserialize>::deserialize(deserializer).map(Self::from)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    string_enum! {
        pub enum Fruit {
            Apple => "apple",
            Pear => "pear",
        }
    }

    #[test]
    fn known_and_unknown_values() {
        let apple: Fruit = serde_json::from_str("\"apple\"").unwrap();
        let kiwi: Fruit = serde_json::from_str("\"kiwi\"").unwrap();

        assert_eq!(apple, Fruit::Apple);
        assert_eq!(kiwi, Fruit::Other("kiwi".to_owned()));
        assert!(kiwi.is_other());
        assert_eq!(serde_json::to_string(&kiwi).unwrap(), "\"kiwi\"");
        assert_eq!(Fruit::Pear.to_string(), "pear");
    }

    #[test]
    fn non_string_is_rejected() {
        assert!(serde_json::from_str::<Fruit>("3").is_err());
    }
}
