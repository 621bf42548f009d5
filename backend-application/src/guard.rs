//! Access guard shared by every use case.
//!
//! Each operation names an [`AccessPolicy`] and calls [`authorize`] before
//! touching any state, so a denied call has no side effects.

use tracing::warn;

use backend_domain::{Role, Session, SubRole};

use crate::{AppError, AppState};

#[derive(Debug, Clone, Copy)]
pub struct AccessPolicy {
    pub name: &'static str,
    pub roles: &'static [Role],
    /// `None` accepts any sub-role, including none at all.
    pub sub_roles: Option<&'static [SubRole]>,
}

pub const REVIEW_MODERATION: AccessPolicy = AccessPolicy {
    name: "review moderation",
    roles: &[Role::Admin],
    sub_roles: Some(&[SubRole::Staff, SubRole::SuperAdmin]),
};

pub const PAYOUT_PROCESSING: AccessPolicy = AccessPolicy {
    name: "payout processing",
    roles: &[Role::Admin],
    sub_roles: Some(&[SubRole::SuperAdmin]),
};

pub const REFUND_PROCESSING: AccessPolicy = AccessPolicy {
    name: "refund processing",
    roles: &[Role::Admin],
    sub_roles: Some(&[SubRole::Staff, SubRole::SuperAdmin]),
};

pub const FINANCE_DASHBOARD: AccessPolicy = AccessPolicy {
    name: "finance dashboard",
    roles: &[Role::Admin],
    sub_roles: Some(&[SubRole::Staff, SubRole::SuperAdmin]),
};

pub const ORGANIZER: AccessPolicy = AccessPolicy {
    name: "organizer",
    roles: &[Role::Organizer, Role::Admin],
    sub_roles: None,
};

pub const AUTHENTICATED: AccessPolicy = AccessPolicy {
    name: "authenticated user",
    roles: &[Role::Admin, Role::Organizer, Role::User],
    sub_roles: None,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    NotAuthenticated,
    InsufficientPermissions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Authorized { user_id: String },
    Denied(DenialReason),
}

impl AccessPolicy {
    pub fn check(&self, session: Option<&Session>) -> AccessDecision {
        let Some(session) = session else {
            return AccessDecision::Denied(DenialReason::NotAuthenticated);
        };
        if !self.roles.contains(&session.role) {
            return AccessDecision::Denied(DenialReason::InsufficientPermissions);
        }
        if let Some(allowed) = self.sub_roles {
            let permitted = session
                .sub_role
                .map(|sub_role| allowed.contains(&sub_role))
                .unwrap_or(false);
            if !permitted {
                return AccessDecision::Denied(DenialReason::InsufficientPermissions);
            }
        }
        AccessDecision::Authorized {
            user_id: session.user_id.clone(),
        }
    }
}

/// Resolves the policy against the session; denials are counted and logged.
pub fn authorize<'a>(
    state: &AppState,
    policy: &AccessPolicy,
    session: Option<&'a Session>,
) -> Result<&'a Session, AppError> {
    match (policy.check(session), session) {
        (AccessDecision::Authorized { .. }, Some(session)) => Ok(session),
        (AccessDecision::Denied(DenialReason::InsufficientPermissions), Some(session)) => {
            state.metrics.record_access_denied();
            warn!(
                user_id = %session.user_id,
                role = session.role.as_str(),
                policy = policy.name,
                "access denied"
            );
            Err(AppError::Forbidden(format!("{} requires elevated access", policy.name)))
        }
        _ => {
            state.metrics.record_access_denied();
            Err(AppError::Unauthenticated)
        }
    }
}
