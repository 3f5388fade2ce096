//! Declarative surface for defining generators.
//!
//! # Definition form
//!
//! ```
//! use yieldpoint::{generator, suspend};
//!
//! generator! {
//!     /// Yields `start`, `start + 1`, `start + 2`.
//!     pub fn count_three(start: i32)() -> i32 {
//!         let n: i32 = start;
//!         resume st {
//!             first => {
//!                 suspend!(st.n => second);
//!             }
//!             second => {
//!                 st.n += 1;
//!                 suspend!(st.n => third);
//!             }
//!             third => {
//!                 st.n += 1;
//!                 suspend!(st.n => done);
//!             }
//!             done => {}
//!         }
//!     }
//! }
//!
//! let g = count_three(5);
//! assert_eq!(g.call(()), 5);
//! assert_eq!(g.call(()), 6);
//! assert_eq!(g.call(()), 7);
//! assert_eq!(g.call(()), 0);
//! ```
//!
//! - The first parameter list is passed once, at creation. The second is
//!   passed on every call, as a tuple.
//! - `let` lines declare the persisted state, initialized in order, so a later
//!   initializer may use an earlier one. Blocks reach the state through the
//!   name given after `resume`. Locals declared inside a block do not survive
//!   a suspension.
//! - Per-call parameters are bound once per call. A change a block makes to
//!   one is seen by the sites it falls through or jumps to in that call, and
//!   is gone at the next call. A block that hands a parameter off by value
//!   must clone it.
//! - Each `site => { .. }` is a resume site; the first one is where a fresh
//!   generator starts. A block that finishes without suspending falls
//!   through into the next site. The last block falling through completes
//!   the generator.
//! - `suspend!(value => site)` yields `value`; the next call resumes at `site`.
//!   `goto!(site)` continues at `site` without yielding.
//! - An optional `cleanup st { .. }` block runs once when the last handle is
//!   dropped, with access to the persisted state.
//!
//! Sites become variants of a private enum and persisted locals become fields
//! of a private struct, so a repeated site or local is a compile error.
//!
//! `suspend!` and `goto!` return from the body; they cannot be used inside a
//! closure nested in a block.
//!
//! # Declaration form
//!
//! ```
//! use yieldpoint::{Generator, generator, generator_decl, suspend};
//!
//! trait Numbers {
//!     generator_decl! {
//!         fn evens(limit: u32)() -> u32;
//!     }
//! }
//!
//! struct Plain;
//!
//! impl Numbers for Plain {
//!     generator! {
//!         fn evens(limit: u32)() -> u32 {
//!             let next: u32 = 0;
//!             resume st {
//!                 top => {
//!                     if st.next < limit {
//!                         let value = st.next;
//!                         st.next += 2;
//!                         suspend!(value => top);
//!                     }
//!                 }
//!             }
//!         }
//!     }
//! }
//!
//! let evens: Generator<(), u32> = Plain::evens(5);
//! assert_eq!(evens.iter().collect::<Vec<_>>(), vec![0, 2, 4]);
//! ```

/// Declares a generator constructor without a body.
///
/// Expands to `fn name(creation params) -> Generator<(per-call types,), T>;`,
/// for use in traits.
#[macro_export]
macro_rules! generator_decl {
    (
        $(#[$meta:meta])*
        $vis:vis fn $name:ident ( $($cp:ident : $cty:ty),* $(,)? )
            ( $($pp:ident : $pty:ty),* $(,)? ) -> $ret:ty;
    ) => {
        $(#[$meta])*
        $vis fn $name($($cp: $cty),*) -> $crate::Generator<($($pty,)*), $ret>;
    };
}

/// Defines a generator constructor. See the [module docs](crate::macros).
#[macro_export]
macro_rules! generator {
    (
        $(#[$meta:meta])*
        $vis:vis fn $name:ident ( $($cp:ident : $cty:ty),* $(,)? )
            ( $($pp:ident : $pty:ty),* $(,)? ) -> $ret:ty {
            $(let $var:ident : $vty:ty = $init:expr;)*
            resume $st:ident {
                $($site:ident => $block:block)+
            }
            $(cleanup $cst:ident $cleanup:block)?
        }
    ) => {
        $(#[$meta])*
        $vis fn $name($($cp: $cty),*) -> $crate::Generator<($($pty,)*), $ret> {
            #[allow(non_camel_case_types, dead_code)]
            #[derive(Clone, Copy)]
            #[repr(u32)]
            enum __Site {
                $($site,)+
                __End,
            }

            #[allow(dead_code)]
            struct __State {
                $($var: $vty,)*
            }

            static __TABLE: ::std::sync::LazyLock<::std::sync::Arc<$crate::ResumeTable>> =
                ::std::sync::LazyLock::new(|| {
                    ::std::sync::Arc::new($crate::ResumeTable::from_names(&[
                        $(::core::stringify!($site)),+
                    ]))
                });

            let __state = {
                $(let $var: $vty = $init;)*
                __State { $($var,)* }
            };

            #[allow(
                unused_variables,
                unused_mut,
                unreachable_code,
                clippy::needless_return,
                clippy::redundant_closure_call
            )]
            let __body = move |$st: &mut __State,
                               __at: $crate::ResumePoint,
                               __params: &($($pty,)*)|
                  -> $crate::Step<$ret> {
                // Bound once per call: changes survive fall-through and goto.
                let ($(mut $pp,)*) = ::core::clone::Clone::clone(__params);
                let mut __at = __at;
                loop {
                    let __step = (|| -> $crate::Step<$ret> {
                        $(
                            if __at.index() == __Site::$site as u32 {
                                $block
                                let __next = __Site::$site as u32 + 1;
                                return if __next == __Site::__End as u32 {
                                    $crate::Step::Complete
                                } else {
                                    $crate::Step::Goto($crate::ResumePoint::new(__next))
                                };
                            }
                        )+
                        $crate::Step::Complete
                    })();
                    match __step {
                        $crate::Step::Goto(__target) => __at = __target,
                        __step => return __step,
                    }
                }
            };

            $crate::GeneratorBuilder::new(__state)
                .name(::core::stringify!($name))
                .table(::std::sync::Arc::clone(&__TABLE))
                $(.finalizer(move |$cst: &mut __State| $cleanup))?
                .build(__body)
        }
    };
}

/// Suspends a `generator!` body: yields a value and names the resume site.
#[macro_export]
macro_rules! suspend {
    ($value:expr => $site:ident) => {
        return $crate::Step::Yield($value, $crate::__site!($site))
    };
}

/// Jumps to a site of a `generator!` body without yielding.
#[macro_export]
macro_rules! goto {
    ($site:ident) => {
        return $crate::Step::Goto($crate::__site!($site))
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __site {
    ($site:ident) => {
        $crate::ResumePoint::new(__Site::$site as u32)
    };
}
