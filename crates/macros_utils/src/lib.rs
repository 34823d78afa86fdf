//! Small declarative helpers shared by the HTTP apps.

#[cfg(feature = "actix")]
#[doc(hidden)]
pub use actix_web;

/// Generate a `routes(&mut ServiceConfig)` function for a route module.
///
/// `route` registers a handler generated by the actix routing attributes,
/// `scope` mounts another route module under a path prefix.
///
/// ```ignore
/// macros_utils::routes! {
///     route index_route,
///     scope "/health" => health,
/// }
/// ```
#[cfg(feature = "actix")]
#[macro_export]
macro_rules! routes {
    ($($body:tt)*) => {
        pub fn routes(cfg: &mut $crate::actix_web::web::ServiceConfig) {
            $crate::__routes_munch!(cfg; $($body)*);
        }
    };
}

#[cfg(feature = "actix")]
#[doc(hidden)]
#[macro_export]
macro_rules! __routes_munch {
    ($cfg:ident;) => {};
    ($cfg:ident; route $handler:path $(, $($rest:tt)*)?) => {
        $cfg.service($handler);
        $crate::__routes_munch!($cfg; $($($rest)*)?);
    };
    ($cfg:ident; scope $prefix:literal => $module:ident $(, $($rest:tt)*)?) => {
        $cfg.service($crate::actix_web::web::scope($prefix).configure($module::routes));
        $crate::__routes_munch!($cfg; $($($rest)*)?);
    };
}
