// SPDX-License-Identifier: MIT

/// Wires the layered error enums together.
///
/// - `top`: each listed error converts into the top-level enum variant.
/// - `str_into`: `&'static str` converts into `Other` of each listed enum and
///   of the top-level enum.
/// - `sub`: inter-layer conversions, `Src => [Dst::Variant, ...]`.
#[macro_export]
macro_rules! fs_error_wiring {
    (
        top => $top:ident {
            $($top_src:ty : $top_variant:ident),+ $(,)?
        },
        str_into => [ $($str_tgt:ty),* $(,)? ],
        sub => {
            $($src_sub:ty => [ $($dst_sub:ident::$dst_variant:ident),+ ] ),* $(,)?
        } $(,)?
    ) => {
        $( $crate::fs_error_wiring!(@from $top_src => $top::$top_variant); )+

        $(
            impl From<&'static str> for $str_tgt {
                #[inline]
                fn from(msg: &'static str) -> Self { <$str_tgt>::Other(msg) }
            }
        )*
        impl From<&'static str> for $top {
            #[inline]
            fn from(msg: &'static str) -> Self { <$top>::Other(msg) }
        }

        $( $( $crate::fs_error_wiring!(@from $src_sub => $dst_sub::$dst_variant); )+ )*
    };

    (@from $src:ty => $dst:ident :: $variant:ident) => {
        impl From<$src> for $dst {
            #[inline]
            fn from(e: $src) -> Self { $dst::$variant(e) }
        }
    };
}

/// Returns early with `$err.into()` unless `$cond` holds.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return Err($err.into());
        }
    };
}

/// Returns early with `$err.into()`.
#[macro_export]
macro_rules! bail {
    ($err:expr $(,)?) => {
        return Err($err.into())
    };
}
