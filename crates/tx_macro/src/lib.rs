extern crate proc_macro;

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned as _, FnArg, Ident, ItemFn, Pat};

/// Runs the body of an async method inside a transaction on its
/// `session` argument: committed on `Ok`, aborted on `Err`.
///
/// The function's error type must be constructible from `eyre::Error`.
#[proc_macro_attribute]
pub fn tx(_args: TokenStream, input: TokenStream) -> TokenStream {
    let input_fn = parse_macro_input!(input as ItemFn);
    match expand(input_fn) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input_fn: ItemFn) -> syn::Result<proc_macro2::TokenStream> {
    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = input_fn;

    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "#[tx] requires an async fn"));
    }

    let mut has_receiver = false;
    let mut has_session = false;
    let mut call_args: Vec<Ident> = Vec::new();
    let mut outer_sig = sig.clone();
    for arg in outer_sig.inputs.iter_mut() {
        match arg {
            FnArg::Receiver(_) => has_receiver = true,
            FnArg::Typed(pat_type) => match pat_type.pat.as_mut() {
                Pat::Ident(pat_ident) => {
                    // the outer fn only forwards its arguments
                    pat_ident.mutability = None;
                    if pat_ident.ident == "session" {
                        has_session = true;
                    }
                    call_args.push(pat_ident.ident.clone());
                }
                other => {
                    return Err(syn::Error::new(
                        other.span(),
                        "#[tx] arguments must be plain identifiers",
                    ))
                }
            },
        }
    }
    if !has_session {
        return Err(syn::Error::new(
            sig.inputs.span(),
            "#[tx] requires a `session: &mut Session` argument",
        ));
    }

    let fn_name = &sig.ident;
    let inner_name = format_ident!("__{}_in_tx", fn_name);
    let mut inner_sig = sig.clone();
    inner_sig.ident = inner_name.clone();

    let call = if has_receiver {
        quote! { self.#inner_name(#(#call_args),*) }
    } else {
        quote! { Self::#inner_name(#(#call_args),*) }
    };
    let fn_label = fn_name.to_string();

    Ok(quote! {
        #[doc(hidden)]
        #inner_sig #block

        #(#attrs)*
        #vis #outer_sig {
            session
                .start_transaction()
                .await
                .map_err(::eyre::Error::from)?;
            match #call.await {
                Ok(result) => {
                    session
                        .commit_transaction()
                        .await
                        .map_err(::eyre::Error::from)?;
                    Ok(result)
                }
                Err(err) => {
                    ::log::debug!("{}: transaction aborted", #fn_label);
                    session
                        .abort_transaction()
                        .await
                        .map_err(::eyre::Error::from)?;
                    Err(err)
                }
            }
        }
    })
}
