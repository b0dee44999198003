//! Macros for defining typed name types.

/// Macro to define a typed name with a specific prefix.
///
/// This generates a newtype wrapper around `String` with:
/// - A `PREFIX` constant used by `random()`
/// - `random()` to generate a fresh collision-free name
/// - `new()` to validate a caller-supplied name
/// - `Display`, `FromStr`, `AsRef<str>` implementations
/// - `Serialize` and `Deserialize` implementations
///
/// # Example
///
/// ```ignore
/// define_name!(AppName, "app");
///
/// let generated = AppName::random();
/// let supplied = AppName::new("app!@#$%^&*-name")?;
/// ```
#[macro_export]
macro_rules! define_name {
    ($name:ident, $prefix:literal) => {
        /// A typed name for this resource type.
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// The prefix used for generated names.
            pub const PREFIX: &'static str = $prefix;

            /// Generates a fresh name from a new ULID.
            #[must_use]
            pub fn random() -> Self {
                Self::from_ulid($crate::Ulid::new())
            }

            /// Builds the generated form of a name from a raw ULID.
            #[must_use]
            pub fn from_ulid(ulid: $crate::Ulid) -> Self {
                Self(format!(
                    "{}-{}",
                    Self::PREFIX,
                    ulid.to_string().to_lowercase()
                ))
            }

            /// Validates a caller-supplied name.
            ///
            /// Any non-blank string without control characters is accepted;
            /// special characters are left for the platform to judge.
            pub fn new(raw: impl Into<String>) -> Result<Self, $crate::NameError> {
                let raw = raw.into();
                if raw.is_empty() {
                    return Err($crate::NameError::Empty);
                }
                if raw.trim().is_empty() {
                    return Err($crate::NameError::Blank);
                }
                if let Some((index, _)) = raw.char_indices().find(|(_, c)| c.is_control()) {
                    return Err($crate::NameError::ControlCharacter { index });
                }
                Ok(Self(raw))
            }

            /// Returns the name as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if this name looks like one produced by `random()`.
            #[must_use]
            pub fn is_generated(&self) -> bool {
                self.0
                    .strip_prefix(Self::PREFIX)
                    .and_then(|rest| rest.strip_prefix('-'))
                    .map(|ulid| ulid.to_uppercase().parse::<$crate::Ulid>().is_ok())
                    .unwrap_or(false)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::NameError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<std::ffi::OsStr> for $name {
            fn as_ref(&self) -> &std::ffi::OsStr {
                std::ffi::OsStr::new(&self.0)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::new(s).map_err(serde::de::Error::custom)
            }
        }
    };
}
