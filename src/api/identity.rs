use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use super::errors::ApiError;
use crate::domain::cart::CartOwner;
use crate::domain::order::Actor;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const GUEST_TOKEN_HEADER: &str = "x-guest-token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Partner,
    Admin,
}

/// Caller identity as asserted by the upstream session service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn actor(self) -> Actor {
        match self.role {
            Role::Customer => Actor::Customer(self.user_id),
            Role::Partner => Actor::Partner(self.user_id),
            Role::Admin => Actor::Admin(self.user_id),
        }
    }

    pub fn customer_id(self) -> Result<Uuid, ApiError> {
        match self.role {
            Role::Customer => Ok(self.user_id),
            _ => Err(ApiError::forbidden("customers only")),
        }
    }

    pub fn partner_id(self) -> Result<Uuid, ApiError> {
        match self.role {
            Role::Partner => Ok(self.user_id),
            _ => Err(ApiError::forbidden("partners only")),
        }
    }

    fn from_request_headers(req: &HttpRequest) -> Result<Option<Self>, ApiError> {
        let Some(raw_id) = header(req, USER_ID_HEADER) else {
            return Ok(None);
        };
        let user_id = Uuid::parse_str(raw_id)
            .map_err(|_| ApiError::unauthenticated("x-user-id is not a valid UUID"))?;

        let role = match header(req, USER_ROLE_HEADER).map(str::to_ascii_lowercase).as_deref() {
            None | Some("customer") => Role::Customer,
            Some("partner") => Role::Partner,
            Some("admin") => Role::Admin,
            Some(_) => return Err(ApiError::unauthenticated("unknown x-user-role")),
        };
        Ok(Some(Self { user_id, role }))
    }
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

impl FromRequest for Identity {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            Identity::from_request_headers(req)
                .and_then(|id| id.ok_or_else(|| ApiError::unauthenticated("missing x-user-id"))),
        )
    }
}

/// Signed-in user's cart, or a guest cart keyed by `x-guest-token`.
#[derive(Debug, Clone)]
pub struct CartCaller(pub CartOwner);

impl FromRequest for CartCaller {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let owner = match Identity::from_request_headers(req) {
            Ok(Some(identity)) => Ok(CartOwner::User(identity.user_id)),
            Ok(None) => match header(req, GUEST_TOKEN_HEADER) {
                Some(token) if !token.trim().is_empty() => Ok(CartOwner::Guest(token.trim().to_string())),
                _ => Err(ApiError::unauthenticated("missing x-user-id or x-guest-token")),
            },
            Err(e) => Err(e),
        };
        ready(owner.map(CartCaller))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_role_defaults_to_customer() {
        let id = Uuid::new_v4();
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, id.to_string()))
            .to_http_request();
        let identity = Identity::from_request_headers(&req).unwrap().unwrap();
        assert_eq!(identity.actor(), Actor::Customer(id));
    }

    #[test]
    fn test_partner_role_and_bad_values() {
        let id = Uuid::new_v4();
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, id.to_string()))
            .insert_header((USER_ROLE_HEADER, "Partner"))
            .to_http_request();
        assert_eq!(Identity::from_request_headers(&req).unwrap().unwrap().role, Role::Partner);

        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "not-a-uuid"))
            .to_http_request();
        assert!(Identity::from_request_headers(&req).is_err());

        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, id.to_string()))
            .insert_header((USER_ROLE_HEADER, "root"))
            .to_http_request();
        assert!(Identity::from_request_headers(&req).is_err());
    }

    #[actix_web::test]
    async fn test_guest_token_identifies_cart() {
        let req = TestRequest::default()
            .insert_header((GUEST_TOKEN_HEADER, "abc"))
            .to_http_request();
        let caller = CartCaller::from_request(&req, &mut Payload::None).await.unwrap();
        assert_eq!(caller.0, CartOwner::Guest("abc".into()));
    }
}
