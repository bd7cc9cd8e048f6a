/// Declares a newtype over one of the kernel's integer code spaces.
///
/// One declaration produces everything a code type needs:
///
/// - the `#[repr(transparent)]` wrapper with a named constant per kernel value (the wrapper can
///   hold values the constants don't cover, since the kernel may send codes this crate doesn't
///   know about yet);
/// - a `Debug` impl printing `prefix` + constant name, falling back to `TypeName(0x..)` for
///   unnamed values;
/// - with `bitmap: <ceiling>`, the storage glue that lets the type index a
///   [`BitSet`][crate::bits::BitSet], sized to the kernel's bitmap for that code space.
macro_rules! kernel_code {
    (
        $( #[$attrs:meta] )*
        $v:vis struct $name:ident($native:ty);
        prefix: $prefix:literal;
        $( bitmap: $max:literal; )?
        values: {
            $(
                $( #[$variant_attrs:meta] )*
                $variant:ident = $value:expr
            ),+ $(,)?
        }
    ) => {
        $( #[$attrs] )*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        $v struct $name(pub(crate) $native);

        impl $name {
            $(
                $( #[$variant_attrs] )*
                $v const $variant: Self = Self($value);
            )+
        }

        impl ::std::fmt::Debug for $name {
            // Aliased constants make later arms unreachable; the first name wins.
            #[allow(unreachable_patterns)]
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match *self {
                    $(
                        Self::$variant => f.write_str(concat!($prefix, stringify!($variant))),
                    )+
                    _ => write!(f, concat!(stringify!($name), "({:#x})"), self.0),
                }
            }
        }

        $(
            impl $name {
                pub(crate) const MAX: Self = Self($max);
            }

            impl $crate::bits::BitValueImpl for $name {
                type Array = [$crate::bits::Word;
                    ($max as usize + 1).div_ceil($crate::bits::Word::BITS as usize)];
                const ZERO: Self::Array =
                    [0; ($max as usize + 1).div_ceil($crate::bits::Word::BITS as usize)];

                #[inline]
                fn from_index(index: usize) -> Self {
                    Self(index as _)
                }
                #[inline]
                fn into_index(self) -> usize {
                    self.0 as _
                }
            }

            impl $crate::bits::BitValue for $name {
                const MAX: Self = Self($max);
            }
        )?
    };
}
