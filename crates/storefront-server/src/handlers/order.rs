//! Order lifecycle handlers.
//!
//! Placing an order is the only public order operation. Without a bearer
//! token the handler provisions a guest account from the order's contact
//! fields and places the order under it.

use http::StatusCode;
use storefront_core::{AuthenticatedUser, ErrorKind, Observation, Order, StoreError, StoreResult};
use storefront_middleware::{bearer_token, envelope, BoxFuture, MiddlewareContext, Request, Response};
use uuid::Uuid;

use super::{fail, fail_with, read_json, INPUT_ERRORS};
use crate::query::Query;
use crate::state::AppState;

pub(crate) const OP_LIST: &str = "orders.listOrders.handler";
pub(crate) const OP_LIST_USER: &str = "orders.listUserOrders.handler";
pub(crate) const OP_GET: &str = "orders.getOrder.handler";
pub(crate) const OP_CREATE: &str = "orders.createOrder.handler";
pub(crate) const OP_UPDATE: &str = "orders.updateOrder.handler";
pub(crate) const OP_CANCEL: &str = "orders.cancelOrder.handler";

/// Path prefix in front of an order id.
pub const ORDER_PATH_PREFIX: &str = "/api/order/";

/// Parses the order id trailing [`ORDER_PATH_PREFIX`].
pub fn parse_order_id(path: &str) -> StoreResult<u64> {
    let raw = path.strip_prefix(ORDER_PATH_PREFIX).unwrap_or(path);
    raw.parse().map_err(|_| StoreError::invalid_id("order", raw))
}

/// `GET /api/order`
pub fn list<'a>(
    state: &'a AppState,
    ctx: &'a mut MiddlewareContext,
    request: Request,
) -> BoxFuture<'a, Response> {
    Box::pin(async move {
        let mut obs = Observation::start(state.metrics.as_ref(), OP_LIST, StatusCode::OK);
        let query = Query::from_request(&request);
        let page = query.positive_or("page", state.pagination.default_page);
        let size = query.positive_or("size", state.pagination.default_page_size);
        let filters = query.filters();

        match state
            .controller
            .list_orders(page, size, &filters, query.sort())
            .await
        {
            Ok(result) => envelope::success_paginated(obs.status(), &result),
            Err(err) => fail(&mut obs, ctx, &err, &[]),
        }
    })
}

/// `GET /api/order/me`
///
/// A subject that is not a UUID is a 401 here.
pub fn list_mine<'a>(
    state: &'a AppState,
    ctx: &'a mut MiddlewareContext,
    request: Request,
) -> BoxFuture<'a, Response> {
    Box::pin(async move {
        let mut obs = Observation::start(state.metrics.as_ref(), OP_LIST_USER, StatusCode::OK);

        let user = match ctx.user().and_then(AuthenticatedUser::user_id) {
            Ok(user) => user,
            Err(err) => {
                return fail_with(
                    &mut obs,
                    ctx,
                    StatusCode::UNAUTHORIZED,
                    &StoreError::from(err),
                )
            }
        };

        let query = Query::from_request(&request);
        let page = query.positive_or("page", state.pagination.default_page);
        let size = query.positive_or("size", state.pagination.default_page_size);

        match state.controller.list_user_orders(user, page, size).await {
            Ok(result) => envelope::success_paginated(obs.status(), &result),
            Err(err) => fail(&mut obs, ctx, &err, &[]),
        }
    })
}

/// `GET /api/order/{id}`
pub fn get<'a>(
    state: &'a AppState,
    ctx: &'a mut MiddlewareContext,
    request: Request,
) -> BoxFuture<'a, Response> {
    Box::pin(async move {
        let mut obs = Observation::start(state.metrics.as_ref(), OP_GET, StatusCode::OK);
        let id = match parse_order_id(request.uri().path()) {
            Ok(id) => id,
            Err(err) => return fail(&mut obs, ctx, &err, &INPUT_ERRORS),
        };

        match state.controller.get_order(id).await {
            Ok(order) => envelope::success(obs.status(), &order),
            Err(err) => fail(&mut obs, ctx, &err, &[ErrorKind::NotFound]),
        }
    })
}

/// `POST /api/order`
///
/// A bearer token whose subject is not a UUID is a 400 here, not a 401.
pub fn create<'a>(
    state: &'a AppState,
    ctx: &'a mut MiddlewareContext,
    request: Request,
) -> BoxFuture<'a, Response> {
    Box::pin(async move {
        let mut obs = Observation::start(state.metrics.as_ref(), OP_CREATE, StatusCode::CREATED);
        let token = bearer_token(&request).map(str::to_string);

        let order: Order = match read_json(request).await {
            Ok(order) => order,
            Err(err) => return fail(&mut obs, ctx, &err, &INPUT_ERRORS),
        };
        if let Err(err) = state.validator.validate_order(&order) {
            return fail(&mut obs, ctx, &err, &INPUT_ERRORS);
        }

        let mut owner = Uuid::nil();
        if let Some(token) = token {
            owner = match resolve_subject(state, &token).await {
                Ok(owner) => owner,
                Err(err) => return fail_with(&mut obs, ctx, StatusCode::BAD_REQUEST, &err),
            };
        }

        if owner.is_nil() {
            let password = Uuid::new_v4().simple().to_string();
            let issued = match state
                .identity
                .create_user(&order.full_name, &order.email, &password)
                .await
            {
                Ok(issued) => issued,
                Err(err) => return fail_with(&mut obs, ctx, StatusCode::BAD_REQUEST, &err),
            };
            owner = match Uuid::parse_str(&issued) {
                Ok(owner) => owner,
                Err(err) => {
                    let err = StoreError::internal_with_source(
                        format!("identity provider issued malformed user id '{issued}'"),
                        err,
                    );
                    return fail(&mut obs, ctx, &err, &[]);
                }
            };
            tracing::debug!(op = OP_CREATE, user = %owner, "provisioned guest user");
        }

        match state.controller.create_order(owner, order).await {
            Ok(created) => envelope::success(obs.status(), &created),
            Err(err) => fail(
                &mut obs,
                ctx,
                &err,
                &[ErrorKind::NotFound, ErrorKind::AlreadyExists],
            ),
        }
    })
}

async fn resolve_subject(state: &AppState, token: &str) -> StoreResult<Uuid> {
    let subject = state.identity.parse_claims(token).await?;
    Ok(AuthenticatedUser::new(subject).user_id()?)
}

/// `PUT /api/order/{id}`
pub fn update<'a>(
    state: &'a AppState,
    ctx: &'a mut MiddlewareContext,
    request: Request,
) -> BoxFuture<'a, Response> {
    Box::pin(async move {
        let mut obs = Observation::start(state.metrics.as_ref(), OP_UPDATE, StatusCode::OK);
        let id = match parse_order_id(request.uri().path()) {
            Ok(id) => id,
            Err(err) => return fail(&mut obs, ctx, &err, &INPUT_ERRORS),
        };

        let order: Order = match read_json(request).await {
            Ok(order) => order,
            Err(err) => return fail(&mut obs, ctx, &err, &INPUT_ERRORS),
        };
        if let Err(err) = state.validator.validate_order(&order) {
            return fail(&mut obs, ctx, &err, &INPUT_ERRORS);
        }

        match state.controller.update_order(id, order).await {
            Ok(()) => envelope::success(obs.status(), "OK"),
            Err(err) => fail(&mut obs, ctx, &err, &[ErrorKind::NotFound]),
        }
    })
}

/// `DELETE /api/order/{id}`
pub fn cancel<'a>(
    state: &'a AppState,
    ctx: &'a mut MiddlewareContext,
    request: Request,
) -> BoxFuture<'a, Response> {
    Box::pin(async move {
        let mut obs = Observation::start(state.metrics.as_ref(), OP_CANCEL, StatusCode::OK);
        let id = match parse_order_id(request.uri().path()) {
            Ok(id) => id,
            Err(err) => return fail(&mut obs, ctx, &err, &INPUT_ERRORS),
        };

        match state.controller.cancel_order(id).await {
            Ok(()) => envelope::success(obs.status(), "OK"),
            Err(err) => fail(&mut obs, ctx, &err, &[ErrorKind::NotFound]),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_order_id() {
        assert_eq!(parse_order_id("/api/order/42").unwrap(), 42);
        for bad in ["/api/order/abc", "/api/order/12/x", "/api/order/", "/api/order/-1"] {
            let err = parse_order_id(bad).unwrap_err();
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST, "{bad}");
        }
    }
}
