//! Catalog category handlers.
//!
//! Reads are public. Create, update and delete run behind authentication.

use http::StatusCode;
use storefront_core::{Category, ErrorKind, Filter, Observation};
use storefront_middleware::{envelope, BoxFuture, MiddlewareContext, Request, Response};

use super::{fail, read_json, INPUT_ERRORS};
use crate::query::Query;
use crate::state::AppState;

pub(crate) const OP_LIST: &str = "category.listCategories.handler";
pub(crate) const OP_CREATE: &str = "category.createCategory.handler";
pub(crate) const OP_GET: &str = "category.getCategory.handler";
pub(crate) const OP_UPDATE: &str = "category.updateCategory.handler";
pub(crate) const OP_DELETE: &str = "category.deleteCategory.handler";
pub(crate) const OP_SEARCH: &str = "category.search.handler";
pub(crate) const OP_FILTERS_SEARCH: &str = "category.categoryFiltersSearch.handler";
pub(crate) const OP_LIST_FILTERS: &str = "category.listCategoryFilters.handler";

fn slug(ctx: &MiddlewareContext) -> String {
    ctx.param("slug").unwrap_or_default().to_string()
}

/// Returns the search text if it is long enough to reach the controller.
fn search_text(state: &AppState, query: &Query) -> Option<String> {
    let q = query.get("q").unwrap_or_default();
    (q.chars().count() >= state.pagination.min_search_len).then(|| q.to_string())
}

/// `GET /api/category`
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

        match state.controller.list_categories(page, size).await {
            Ok(result) => envelope::success_paginated(obs.status(), &result),
            Err(err) => fail(&mut obs, ctx, &err, &[]),
        }
    })
}

/// `POST /api/category`
pub fn create<'a>(
    state: &'a AppState,
    ctx: &'a mut MiddlewareContext,
    request: Request,
) -> BoxFuture<'a, Response> {
    Box::pin(async move {
        let mut obs = Observation::start(state.metrics.as_ref(), OP_CREATE, StatusCode::CREATED);

        let category: Category = match read_json(request).await {
            Ok(category) => category,
            Err(err) => return fail(&mut obs, ctx, &err, &INPUT_ERRORS),
        };
        if let Err(err) = state.validator.validate_category(&category) {
            return fail(&mut obs, ctx, &err, &INPUT_ERRORS);
        }

        match state.controller.create_category(category).await {
            Ok(created) => envelope::success(obs.status(), &created),
            Err(err) => fail(&mut obs, ctx, &err, &[ErrorKind::AlreadyExists]),
        }
    })
}

/// `GET /api/category/{slug}`
pub fn get<'a>(
    state: &'a AppState,
    ctx: &'a mut MiddlewareContext,
    _request: Request,
) -> BoxFuture<'a, Response> {
    Box::pin(async move {
        let mut obs = Observation::start(state.metrics.as_ref(), OP_GET, StatusCode::OK);
        let slug = slug(ctx);

        match state.controller.get_category_by_slug(&slug).await {
            Ok(category) => envelope::success(obs.status(), &category),
            Err(err) => fail(&mut obs, ctx, &err, &[ErrorKind::NotFound]),
        }
    })
}

/// `PUT /api/category/{slug}`
pub fn update<'a>(
    state: &'a AppState,
    ctx: &'a mut MiddlewareContext,
    request: Request,
) -> BoxFuture<'a, Response> {
    Box::pin(async move {
        let mut obs = Observation::start(state.metrics.as_ref(), OP_UPDATE, StatusCode::OK);
        let slug = slug(ctx);

        let category: Category = match read_json(request).await {
            Ok(category) => category,
            Err(err) => return fail(&mut obs, ctx, &err, &INPUT_ERRORS),
        };
        if let Err(err) = state.validator.validate_category(&category) {
            return fail(&mut obs, ctx, &err, &INPUT_ERRORS);
        }

        match state.controller.update_category(&slug, category).await {
            Ok(updated) => envelope::success(obs.status(), &updated),
            Err(err) => fail(
                &mut obs,
                ctx,
                &err,
                &[ErrorKind::NotFound, ErrorKind::AlreadyExists],
            ),
        }
    })
}

/// `DELETE /api/category/{slug}`
///
/// Answers 204; the transport drops the `"OK"` body.
pub fn delete<'a>(
    state: &'a AppState,
    ctx: &'a mut MiddlewareContext,
    _request: Request,
) -> BoxFuture<'a, Response> {
    Box::pin(async move {
        let mut obs = Observation::start(state.metrics.as_ref(), OP_DELETE, StatusCode::NO_CONTENT);
        let slug = slug(ctx);

        match state.controller.delete_category(&slug).await {
            Ok(()) => envelope::success(obs.status(), "OK"),
            Err(err) => fail(&mut obs, ctx, &err, &[ErrorKind::NotFound]),
        }
    })
}

/// `GET /api/category/search?q=`
pub fn search<'a>(
    state: &'a AppState,
    ctx: &'a mut MiddlewareContext,
    request: Request,
) -> BoxFuture<'a, Response> {
    Box::pin(async move {
        let mut obs = Observation::start(state.metrics.as_ref(), OP_SEARCH, StatusCode::OK);
        let query = Query::from_request(&request);
        let Some(text) = search_text(state, &query) else {
            return envelope::success(obs.status(), &Vec::<Category>::new());
        };
        let page = query.positive_or("page", state.pagination.search_page);
        let size = query.positive_or("size", state.pagination.search_page_size);

        match state.controller.category_search(&text, page, size).await {
            Ok(result) => envelope::success_paginated(obs.status(), &result),
            Err(err) => fail(&mut obs, ctx, &err, &[]),
        }
    })
}

/// `GET /api/category/filters/search?q=`
pub fn filters_search<'a>(
    state: &'a AppState,
    ctx: &'a mut MiddlewareContext,
    request: Request,
) -> BoxFuture<'a, Response> {
    Box::pin(async move {
        let mut obs = Observation::start(state.metrics.as_ref(), OP_FILTERS_SEARCH, StatusCode::OK);
        let query = Query::from_request(&request);
        let Some(text) = search_text(state, &query) else {
            return envelope::success(obs.status(), &Vec::<Filter>::new());
        };
        let page = query.positive_or("page", state.pagination.search_page);
        let size = query.positive_or("size", state.pagination.search_page_size);

        match state.controller.category_filters_search(&text, page, size).await {
            Ok(result) => envelope::success_paginated(obs.status(), &result),
            Err(err) => fail(&mut obs, ctx, &err, &[]),
        }
    })
}

/// `GET /api/category/{slug}/filters`
pub fn list_filters<'a>(
    state: &'a AppState,
    ctx: &'a mut MiddlewareContext,
    _request: Request,
) -> BoxFuture<'a, Response> {
    Box::pin(async move {
        let mut obs = Observation::start(state.metrics.as_ref(), OP_LIST_FILTERS, StatusCode::OK);
        let slug = slug(ctx);

        match state.controller.list_category_filters(&slug).await {
            Ok(filters) => envelope::success(obs.status(), &filters),
            Err(err) => fail(&mut obs, ctx, &err, &[]),
        }
    })
}

