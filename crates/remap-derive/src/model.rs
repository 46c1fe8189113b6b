use crate::util::{type_param_bounds, where_clause_with_bounds};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Error, ExprPath, Index, LitStr, Member, ext::IdentExt,
    meta::ParseNestedMeta, spanned::Spanned,
};

// derive_model
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    expand(&input).unwrap_or_else(Error::into_compile_error)
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let Data::Struct(data) = &input.data else {
        return Err(Error::new_spanned(
            &input.ident,
            "Model can only be derived for structs",
        ));
    };

    let struct_attrs = StructAttrs::parse(&input.attrs)?;

    let mut specs = Vec::new();
    for (index, field) in data.fields.iter().enumerate() {
        let attrs = FieldAttrs::parse(&field.attrs)?;
        if attrs.skip {
            continue;
        }

        let member = field.ident.as_ref().map_or_else(
            || Member::Unnamed(Index::from(index)),
            |ident| Member::Named(ident.clone()),
        );
        let name = match (&attrs.rename, &field.ident) {
            (Some(rename), _) => rename.value(),
            (None, Some(ident)) => ident.unraw().to_string(),
            (None, None) => index.to_string(),
        };
        let ty = &field.ty;

        let spec = match (attrs.read_only, attrs.write_only) {
            (true, true) => {
                return Err(Error::new(
                    field.span(),
                    "a field cannot be both read_only and write_only",
                ));
            }
            (true, false) => quote! {
                ::remap::model::FieldSpec::read_only::<Self, #ty>(
                    #name,
                    |owner| &owner.#member,
                )
            },
            (false, true) => quote! {
                ::remap::model::FieldSpec::write_only::<Self, #ty>(
                    #name,
                    |owner| &mut owner.#member,
                )
            },
            (false, false) => quote! {
                ::remap::model::FieldSpec::new::<Self, #ty>(
                    #name,
                    |owner| &owner.#member,
                    |owner| &mut owner.#member,
                )
            },
        };
        specs.push(spec);
    }

    for PropertyAttr { name, path } in &struct_attrs.computed {
        specs.push(quote! {
            ::remap::model::FieldSpec::computed::<Self, _>(#name, #path)
        });
    }
    for PropertyAttr { name, path } in &struct_attrs.setters {
        specs.push(quote! {
            ::remap::model::FieldSpec::setter::<Self, _>(#name, #path)
        });
    }

    let construct = if struct_attrs.no_default {
        quote!()
    } else {
        quote! {
            fn construct() -> ::core::option::Option<Self> {
                ::core::option::Option::Some(<Self as ::core::default::Default>::default())
            }
        }
    };

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut bounds = type_param_bounds(&input.generics, &quote!(::remap::traits::Reflect));
    if !struct_attrs.no_default && input.generics.type_params().next().is_some() {
        bounds.push(quote!(Self: ::core::default::Default));
    }
    let where_clause = where_clause_with_bounds(where_clause, &bounds);

    Ok(quote! {
        impl #impl_generics ::remap::traits::Reflect for #ident #ty_generics #where_clause {
            type Member = Self;

            fn type_spec() -> ::remap::model::TypeSpec {
                ::remap::model::TypeSpec::composite::<Self>()
            }

            fn fields() -> ::std::vec::Vec<::remap::model::FieldSpec> {
                ::std::vec![#(#specs),*]
            }

            #construct
        }
    })
}

///
/// FieldAttrs
///

#[derive(Default)]
struct FieldAttrs {
    skip: bool,
    read_only: bool,
    write_only: bool,
    rename: Option<LitStr>,
}

impl FieldAttrs {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();

        for attr in attrs.iter().filter(|attr| attr.path().is_ident("model")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    out.skip = true;
                } else if meta.path.is_ident("read_only") {
                    out.read_only = true;
                } else if meta.path.is_ident("write_only") {
                    out.write_only = true;
                } else if meta.path.is_ident("rename") {
                    out.rename = Some(meta.value()?.parse()?);
                } else {
                    return Err(meta.error("unsupported field attribute"));
                }

                Ok(())
            })?;
        }

        Ok(out)
    }
}

///
/// StructAttrs
///

#[derive(Default)]
struct StructAttrs {
    no_default: bool,
    computed: Vec<PropertyAttr>,
    setters: Vec<PropertyAttr>,
}

struct PropertyAttr {
    name: LitStr,
    path: ExprPath,
}

impl StructAttrs {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();

        for attr in attrs.iter().filter(|attr| attr.path().is_ident("model")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("no_default") {
                    out.no_default = true;
                } else if meta.path.is_ident("computed") {
                    out.computed.push(parse_property(&meta, "get")?);
                } else if meta.path.is_ident("setter") {
                    out.setters.push(parse_property(&meta, "set")?);
                } else {
                    return Err(meta.error("unsupported struct attribute"));
                }

                Ok(())
            })?;
        }

        Ok(out)
    }
}

// parse `name = "..", <key> = "path"`
fn parse_property(meta: &ParseNestedMeta<'_>, key: &str) -> syn::Result<PropertyAttr> {
    let mut name = None;
    let mut path = None;

    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("name") {
            name = Some(inner.value()?.parse::<LitStr>()?);
        } else if inner.path.is_ident(key) {
            let lit: LitStr = inner.value()?.parse()?;
            path = Some(lit.parse::<ExprPath>()?);
        } else {
            return Err(inner.error("unsupported property key"));
        }

        Ok(())
    })?;

    match (name, path) {
        (Some(name), Some(path)) => Ok(PropertyAttr { name, path }),
        _ => Err(meta.error(format!("expected `name = \"..\"` and `{key} = \"..\"`"))),
    }
}
