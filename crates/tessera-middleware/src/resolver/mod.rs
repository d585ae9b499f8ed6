//! Identity resolution.
//!
//! Each resolver derives one identity value from the request. Resolvers
//! decide; they never write headers or cookies.
//!
//! | Value | Resolver | Sources |
//! |-------|----------|---------|
//! | Client ID | [`resolve_client_id`] | client ID cookie |
//! | User token | [`resolve_user_token`] | user token cookie, `x-user-token` header |
//! | Preview token | [`resolve_preview_token`] | `croct-preview` query, preview cookie |
//! | Locale | [`resolve_locale`] | resolver, path, `Accept-Language`, default |
//! | Client IP | [`resolve_client_ip`] | `x-forwarded-for`, `x-real-ip`, peer address |
//! | Request URI | [`request_uri`] | URI, `x-forwarded-proto`, `Host` |

pub mod client_id;
pub mod client_ip;
pub mod locale;
pub mod preview;
pub mod request_uri;
pub mod sources;
pub mod user_token;

pub use client_id::resolve_client_id;
pub use client_ip::resolve_client_ip;
pub use locale::{detect_locale, resolve_locale};
pub use preview::{resolve_preview_token, ExitReason, PreviewState, PreviewToken};
pub use request_uri::request_uri;
pub use user_token::{reconcile, resolve_user_token, Reconciliation, ReissueReason};
