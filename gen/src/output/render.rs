//! `ToTokens` renderings of the abstract definition model
//!
//! The rendering is one possible consumption of the model: Rust-flavored
//! output where contracts become traits and implementation types become
//! structs with impl blocks. The emission collaborator is free to walk
//! the structured model instead.

use proc_macro2::TokenStream;
use quote::{ToTokens, quote};

use super::{Expr, GeneratedUnit, ImplBlock, Instr, MethodDef, Place, ReceiverKind, TypeDef, TypeKind};

impl ToTokens for Place {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.extend(match self {
            Self::SelfField(name) => quote!(self.#name),
            Self::FieldOf { base, name } => quote!(#base.#name),
            Self::Var(name) => quote!(#name),
        });
    }
}

impl ToTokens for Expr {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.extend(match self {
            Self::Var(name) => quote!(#name),
            Self::SelfRef => quote!(self),
            Self::SelfField(name) => quote!(self.#name),
            Self::FieldOf { base, name } => quote!(#base.#name),
            Self::Bool(value) => quote!(#value),
            Self::DefaultValue => quote!(::core::default::Default::default()),
            Self::EmptyCollection(kind) => kind.empty_expr(),
            Self::New { ty, args } => quote!(#ty::new(#(#args),*)),
            Self::StaticCall { ty, method, args } => quote!(#ty::#method(#(#args),*)),
            Self::MethodCall { recv, method, args } => quote!(#recv.#method(#(#args),*)),
            Self::AcquireSlot { unit, cache_type, field } => {
                let slot = field.to_string();
                quote! {
                    ::stepgen_runtime::acquire(
                        #slot,
                        &mut ctx.unit_cache::<#cache_type>(#unit).#field,
                    )
                }
            }
            Self::Verbatim(fragment) => fragment.clone(),
        });
    }
}

impl ToTokens for Instr {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.extend(match self {
            Self::Bind { name, expr } => quote!(let mut #name = #expr;),
            Self::Assign { place, expr } => quote!(#place = #expr;),
            Self::NullCheck { parameter, subject } => {
                let name = parameter.to_string();
                quote!(::stepgen_runtime::check_required(#name, &#subject);)
            }
            Self::Eval { expr } => quote!(#expr;),
            Self::Return { expr: Some(expr) } => quote!(return #expr;),
            Self::Return { expr: None } => quote!(return;),
        });
    }
}

impl MethodDef {
    fn receiver_tokens(&self) -> TokenStream {
        match self.receiver {
            ReceiverKind::Function => TokenStream::new(),
            ReceiverKind::RefMutSelf if self.params.is_empty() => quote!(&mut self),
            ReceiverKind::RefMutSelf => quote!(&mut self,),
        }
    }

    fn ret_tokens(&self) -> TokenStream {
        self.ret
            .as_ref()
            .map_or_else(TokenStream::new, |ret| quote!(-> #ret))
    }

    /// Signature only, as declared inside a contract.
    #[must_use]
    pub fn signature(&self) -> TokenStream {
        let name = &self.name;
        let receiver = self.receiver_tokens();
        let params = self.params.iter().map(|p| {
            let (pname, pty) = (&p.name, &p.ty);
            quote!(#pname: #pty)
        });
        let ret = self.ret_tokens();
        quote!(fn #name(#receiver #(#params),*) #ret;)
    }

    /// Full definition, with or without a visibility qualifier
    /// (contract impl blocks take none).
    #[must_use]
    pub fn definition(&self, with_vis: bool) -> TokenStream {
        let name = &self.name;
        let access = if with_vis {
            self.access.to_token_stream()
        } else {
            TokenStream::new()
        };
        let receiver = self.receiver_tokens();
        let params = self.params.iter().map(|p| {
            let (pname, pty) = (&p.name, &p.ty);
            quote!(#pname: #pty)
        });
        let ret = self.ret_tokens();
        let body = &self.body;
        quote! {
            #access fn #name(#receiver #(#params),*) #ret {
                #(#body)*
            }
        }
    }
}

impl ToTokens for MethodDef {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.extend(self.definition(true));
    }
}

impl ToTokens for TypeDef {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let name = &self.name;
        let access = &self.access;
        match &self.kind {
            TypeKind::Contract { methods } => {
                let signatures = methods.iter().map(MethodDef::signature);
                tokens.extend(quote! {
                    #access trait #name {
                        #(#signatures)*
                    }
                });
            }
            TypeKind::Implementation { fields, impls, recycle } => {
                let field_defs = fields.iter().map(|field| {
                    let (fname, fty) = (&field.name, &field.ty);
                    quote!(#fname: #fty,)
                });
                tokens.extend(quote! {
                    #[derive(Default)]
                    #access struct #name {
                        #(#field_defs)*
                    }
                });
                for block in impls {
                    tokens.extend(render_impl_block(name, block));
                }
                if *recycle {
                    tokens.extend(quote! {
                        impl ::stepgen_runtime::Recycle for #name {
                            fn currently_in_use(&self) -> bool {
                                self.currently_in_use
                            }
                            fn set_in_use(&mut self, in_use: bool) {
                                self.currently_in_use = in_use;
                            }
                        }
                    });
                }
            }
        }
    }
}

fn render_impl_block(name: &syn::Ident, block: &ImplBlock) -> TokenStream {
    match &block.contract {
        Some(contract) => {
            let methods = block.methods.iter().map(|m| m.definition(false));
            quote! {
                impl #contract for #name {
                    #(#methods)*
                }
            }
        }
        None => {
            let methods = block.methods.iter().map(|m| m.definition(true));
            quote! {
                impl #name {
                    #(#methods)*
                }
            }
        }
    }
}

impl ToTokens for GeneratedUnit {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let module = &self.module_name;
        let access = &self.access;
        let types = &self.types;
        let cache = self.cache.iter();
        let entries = &self.entries;
        tokens.extend(quote! {
            #access mod #module {
                use super::*;

                #(#types)*
                #(#cache)*
                #(#entries)*
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::super::{FieldDef, ParamDef};
    use super::*;
    use crate::naming::NamingExt;
    use crate::types::{Access, TypeRef};

    #[test]
    fn test_null_check_renders_runtime_guard() {
        let check = Instr::NullCheck {
            parameter: "notes".as_ident(),
            subject:   Expr::Var("notes".as_ident()),
        };
        assert_eq!(
            check.to_token_stream().to_string(),
            quote!(::stepgen_runtime::check_required("notes", &notes);).to_string()
        );
    }

    #[test]
    fn test_constructor_invocation_renders_in_arg_order() {
        let invoke = Expr::New {
            ty:   TypeRef::new(syn::parse_quote!(Point)),
            args: vec![Expr::SelfField("x".as_ident()), Expr::Var("y".as_ident())],
        };
        assert_eq!(
            invoke.to_token_stream().to_string(),
            quote!(Point::new(self.x, y)).to_string()
        );
    }

    #[test]
    fn test_contract_renders_signatures_only() {
        let contract = TypeDef {
            name:   "PointBuilderX".as_ident(),
            access: Access::Public,
            kind:   TypeKind::Contract {
                methods: vec![MethodDef {
                    name:     "x".as_ident(),
                    access:   Access::Public,
                    receiver: ReceiverKind::RefMutSelf,
                    params:   vec![ParamDef::new("x".as_ident(), quote!(i32))],
                    ret:      Some(quote!(&mut dyn PointBuilderY)),
                    body:     vec![],
                    throws:   vec![],
                }],
            },
        };
        let rendered = contract.to_token_stream().to_string();
        assert!(rendered.contains("pub trait PointBuilderX"));
        assert!(rendered.contains("fn x (& mut self , x : i32) -> & mut dyn PointBuilderY ;"));
    }

    #[test]
    fn test_recycling_implementation_wires_the_runtime_trait() {
        let impl_type = TypeDef {
            name:   "PointBuilderImpl".as_ident(),
            access: Access::Private,
            kind:   TypeKind::Implementation {
                fields:  vec![
                    FieldDef::new("x".as_ident(), quote!(i32)),
                    FieldDef::new("currently_in_use".as_ident(), quote!(bool)),
                ],
                impls:   vec![],
                recycle: true,
            },
        };
        let rendered = impl_type.to_token_stream().to_string();
        assert!(rendered.contains("impl :: stepgen_runtime :: Recycle for PointBuilderImpl"));
        assert!(rendered.contains("# [derive (Default)]"));
    }
}
