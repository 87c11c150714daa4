//! Router Module Index
//!
//! Organizes the application's routing logic into security-segregated modules.
//! Access control is applied explicitly at the module level (via Axum layers
//! and the `AdminUser` extractor), preventing accidental exposure of protected
//! endpoints.
//!
//! The two modules map directly to the two access tiers this tool has:
//! anonymous employees submitting feedback, and the authenticated admin.

/// Routes accessible to all clients: the captcha, the public feedback form,
/// login/logout, and operational probes. The mixed-method `/api/submissions`
/// path also lives here; its admin-only methods gate themselves through the
/// `AdminUser` extractor.
pub mod public;

/// Routes restricted to an authenticated admin session. The whole module is
/// additionally wrapped in the session middleware layer in `create_router`.
pub mod admin;
