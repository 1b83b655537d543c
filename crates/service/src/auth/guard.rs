use axum::http::Method;
use models::types::Role;

use super::errors::AuthError;

/// Access rule for a route: the role it requires and the HTTP methods it
/// governs. Methods outside the governed set are denied outright, before
/// any credential is inspected.
#[derive(Debug, Clone)]
pub struct Guard {
    required: Role,
    methods: Vec<Method>,
}

impl Guard {
    pub fn user(methods: &[Method]) -> Self {
        Self {
            required: Role::User,
            methods: methods.to_vec(),
        }
    }

    pub fn admin(methods: &[Method]) -> Self {
        Self {
            required: Role::Admin,
            methods: methods.to_vec(),
        }
    }

    pub fn governs(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    /// An admin identity satisfies any requirement.
    pub fn allows_role(&self, role: Role) -> Result<(), AuthError> {
        if role == Role::Admin || role == self.required {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }

    /// Full check in evaluation order: method gate first, then role.
    pub fn check(&self, method: &Method, role: Role) -> Result<(), AuthError> {
        if !self.governs(method) {
            return Err(AuthError::Forbidden);
        }
        self.allows_role(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ungoverned_method_is_denied_even_for_admin() {
        let guard = Guard::user(&[Method::POST]);
        assert!(matches!(
            guard.check(&Method::GET, Role::Admin),
            Err(AuthError::Forbidden)
        ));
    }

    #[test]
    fn admin_satisfies_user_requirement() {
        let guard = Guard::user(&[Method::GET]);
        assert!(guard.check(&Method::GET, Role::Admin).is_ok());
        assert!(guard.check(&Method::GET, Role::User).is_ok());
    }

    #[test]
    fn user_cannot_pass_admin_guard() {
        let guard = Guard::admin(&[Method::DELETE]);
        assert!(matches!(
            guard.check(&Method::DELETE, Role::User),
            Err(AuthError::Forbidden)
        ));
        assert!(guard.check(&Method::DELETE, Role::Admin).is_ok());
    }
}
