//! `define_port_error!`: error enums for port adapters.
//!
//! Each variant gets a `thiserror` message and a snake_case constructor whose
//! parameters accept anything convertible into the field type, so adapters
//! can write `MessageRepositoryError::query(err.to_string())` or pass a
//! `&str` directly.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            #[doc = concat!("Build the `", stringify!($variant), "` variant.")]
            #[must_use]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_fields $variant [] [] $( $field : $ty, )*);
    };

    (@ctor_fields $variant:ident [$($params:tt)*] [$($inits:tt)*]) => {
        ::paste::paste! {
            #[doc = concat!("Build the `", stringify!($variant), "` variant.")]
            #[must_use]
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_fields $variant:ident [$($params:tt)*] [$($inits:tt)*] $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_fields
            $variant
            [$($params)* $field: impl Into<$ty>,]
            [$($inits)* $field: $field.into(),]
            $($rest)*
        );
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum UploadError {
            Closed => "upload store closed",
            Io { message: String } => "upload failed: {message}",
            TooLarge { size: usize } => "upload of {size} bytes is too large",
            Rejected { file_name: String, size: usize } => "{file_name} rejected at {size} bytes",
        }
    }

    #[test]
    fn unit_variants_get_nullary_constructors() {
        assert_eq!(UploadError::closed(), UploadError::Closed);
        assert_eq!(UploadError::closed().to_string(), "upload store closed");
    }

    #[test]
    fn string_fields_accept_borrowed_text() {
        let err = UploadError::io("disk full");
        assert_eq!(err.to_string(), "upload failed: disk full");
    }

    #[test]
    fn numeric_fields_keep_their_type() {
        let err = UploadError::too_large(5_242_881_usize);
        assert_eq!(err, UploadError::TooLarge { size: 5_242_881 });
    }

    #[test]
    fn mixed_fields_keep_declaration_order() {
        let err = UploadError::rejected("brief.exe", 12_usize);
        assert_eq!(err.to_string(), "brief.exe rejected at 12 bytes");
    }
}
