use crate::{
    model::{FieldSpec, TypeSpec},
    traits::Reflect,
};

// Tuples are anonymous composites; positions are exposed as fields "0", "1", ...
macro_rules! impl_reflect_tuple {
    ( $( ( $( $idx:tt $name:ident ),+ ) ),+ $(,)? ) => {
        $(
            impl<$( $name: Reflect ),+> Reflect for ( $( $name, )+ ) {
                type Member = Self;

                fn type_spec() -> TypeSpec {
                    TypeSpec::anonymous::<Self>()
                }

                fn fields() -> Vec<FieldSpec> {
                    vec![
                        $(
                            FieldSpec::new::<Self, $name>(
                                stringify!($idx),
                                |owner| &owner.$idx,
                                |owner| &mut owner.$idx,
                            ),
                        )+
                    ]
                }

                fn construct() -> Option<Self> {
                    Some(( $( $name::construct()?, )+ ))
                }
            }
        )+
    };
}

impl_reflect_tuple!((0 A, 1 B), (0 A, 1 B, 2 C));
