use proc_macro::TokenStream;

mod model;
mod util;

/// Derive `Reflect` for a struct so it can take part in mappings.
///
/// Field attributes: `#[model(skip)]`, `#[model(read_only)]`,
/// `#[model(write_only)]`, `#[model(rename = "name")]`.
///
/// Struct attributes: `#[model(no_default)]`,
/// `#[model(computed(name = "x", get = "Self::x"))]`,
/// `#[model(setter(name = "x", set = "Self::set_x"))]`.
#[proc_macro_derive(Model, attributes(model))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    model::derive_model(input.into()).into()
}
