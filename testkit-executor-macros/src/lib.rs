//! Procedural macros for testkit-executor
//!
//! This crate provides the `#[testkit_executor::test]` attribute macro, which
//! gives each test its own fresh `MockExecutor`.
//!
//! # Example
//!
//! ```rust,ignore
//! use testkit_executor::prelude::*;
//!
//! #[testkit_executor::test]
//! fn my_test(executor: MockExecutor) {
//!     executor.execute(Box::new(|| {}));
//!     assert_eq!(executor.drain_all().unwrap(), 1);
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse::{Parse, ParseStream},
    parse_macro_input, FnArg, Ident, ItemFn, Lit, Pat, Token, Type,
};

/// Configuration options for the test macro.
#[derive(Default)]
struct TestConfig {
    /// Drain failure policy ("stop_on_failure" or "continue_on_failure")
    drain_policy: Option<String>,
    /// Fail the test if work is still queued when it ends
    verify_drained: bool,
    /// Flavor for tokio runtime ("current_thread" or "multi_thread")
    flavor: Option<String>,
}

impl Parse for TestConfig {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut config = TestConfig::default();

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "drain_policy" => config.drain_policy = Some(parse_str_lit(input, &ident)?),
                "verify_drained" => match input.parse::<Lit>()? {
                    Lit::Bool(b) => config.verify_drained = b.value(),
                    other => {
                        return Err(syn::Error::new_spanned(
                            other,
                            "verify_drained expects a bool literal",
                        ));
                    }
                },
                "flavor" => config.flavor = Some(parse_str_lit(input, &ident)?),
                _ => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {ident}"),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(config)
    }
}

/// Parses the value of an option that takes a string literal.
fn parse_str_lit(input: ParseStream, option: &Ident) -> syn::Result<String> {
    match input.parse::<Lit>()? {
        Lit::Str(s) => Ok(s.value()),
        other => Err(syn::Error::new_spanned(
            other,
            format!("{option} expects a string literal"),
        )),
    }
}

/// Determines if a function parameter is requesting a MockExecutor.
fn is_executor_param(arg: &FnArg) -> bool {
    if let FnArg::Typed(pat_type) = arg {
        if let Type::Path(type_path) = &*pat_type.ty {
            if let Some(segment) = type_path.path.segments.last() {
                return segment.ident == "MockExecutor";
            }
        }
    }
    false
}

/// Extracts the parameter name from a function argument.
fn get_param_name(arg: &FnArg) -> Option<&Pat> {
    if let FnArg::Typed(pat_type) = arg {
        Some(&pat_type.pat)
    } else {
        None
    }
}

/// Test attribute macro that injects a fresh `MockExecutor`.
///
/// Works on both plain and `async` test functions; `async` tests run on
/// tokio.
///
/// # Basic Usage
///
/// ```rust,ignore
/// use testkit_executor::prelude::*;
///
/// #[testkit_executor::test]
/// fn test_dispatch(executor: MockExecutor) {
///     executor.execute(Box::new(|| {}));
///     assert_eq!(executor.pending_count(), 1);
/// }
/// ```
///
/// # Configuration Options
///
/// - `drain_policy = "stop_on_failure"` (default) or
///   `drain_policy = "continue_on_failure"` - Drain failure policy
/// - `verify_drained = true` - Fail the test if work is still queued at
///   the end
/// - `flavor = "multi_thread"` - Tokio runtime flavor for `async` tests
///
/// ```rust,ignore
/// #[testkit_executor::test(drain_policy = "continue_on_failure", verify_drained = true)]
/// fn test_all_run(executor: MockExecutor) {
///     executor.execute(Box::new(|| {}));
///     executor.drain_all().unwrap();
/// }
/// ```
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let config = parse_macro_input!(attr as TestConfig);
    let input = parse_macro_input!(item as ItemFn);

    expand_test(config, input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_test(config: TestConfig, input: ItemFn) -> syn::Result<TokenStream2> {
    let name = &input.sig.ident;
    let body = &input.block;
    let attrs = &input.attrs;
    let vis = &input.vis;
    let output = &input.sig.output;

    let executor_param_name = input
        .sig
        .inputs
        .iter()
        .find(|arg| is_executor_param(arg))
        .and_then(get_param_name);

    if let Some(extra) = input.sig.inputs.iter().filter(|arg| is_executor_param(arg)).nth(1) {
        return Err(syn::Error::new_spanned(
            extra,
            "only one `MockExecutor` parameter can be injected",
        ));
    }

    if let Some(extra) = input.sig.inputs.iter().find(|arg| !is_executor_param(arg)) {
        return Err(syn::Error::new_spanned(
            extra,
            "only a `MockExecutor` parameter can be injected",
        ));
    }

    let policy = match config.drain_policy.as_deref() {
        None | Some("stop_on_failure") => quote! {
            ::testkit_executor::executor::DrainPolicy::StopOnFirstFailure
        },
        Some("continue_on_failure") => quote! {
            ::testkit_executor::executor::DrainPolicy::ContinueOnFailure
        },
        Some(other) => {
            return Err(syn::Error::new(
                proc_macro2::Span::call_site(),
                format!(
                    "unsupported drain_policy: {other}. Use \"stop_on_failure\" or \"continue_on_failure\""
                ),
            ));
        }
    };

    // Generate executor initialization
    let executor_init = match executor_param_name {
        Some(executor_name) => {
            let guard = if config.verify_drained {
                quote! {
                    let __testkit_drain_guard =
                        ::testkit_executor::executor::DrainGuard::new(#executor_name.clone());
                }
            } else {
                quote! {}
            };
            quote! {
                let #executor_name =
                    ::testkit_executor::executor::MockExecutor::with_policy(#policy);
                #guard
            }
        }
        None if config.verify_drained => {
            return Err(syn::Error::new_spanned(
                &input.sig,
                "verify_drained needs an `executor: MockExecutor` parameter",
            ));
        }
        None => quote! {},
    };

    let wrapper = if input.sig.asyncness.is_some() {
        let flavor_attr = match config.flavor.as_deref() {
            Some("multi_thread") => quote! { #[::tokio::test(flavor = "multi_thread")] },
            None | Some("current_thread") => quote! { #[::tokio::test] },
            Some(other) => {
                return Err(syn::Error::new(
                    proc_macro2::Span::call_site(),
                    format!("unsupported flavor: {other}. Use \"current_thread\" or \"multi_thread\""),
                ));
            }
        };
        quote! {
            #flavor_attr
            #(#attrs)*
            #vis async fn #name() #output {
                #executor_init
                #body
            }
        }
    } else {
        if config.flavor.is_some() {
            return Err(syn::Error::new_spanned(
                &input.sig,
                "flavor only applies to async test functions",
            ));
        }
        quote! {
            #[::core::prelude::v1::test]
            #(#attrs)*
            #vis fn #name() #output {
                #executor_init
                #body
            }
        }
    };

    Ok(wrapper)
}
