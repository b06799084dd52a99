//! Route table and handlers.
//!
//! [`Router::handle`] is transport independent: it takes an [`ApiRequest`]
//! and returns an [`ApiResponse`], so handlers are tested without a socket.

use super::context::RequestContext;
use super::dto::{self, BrandBody, CreateCategoryBody, ProductBody, SupplierBody, UpdateCategoryBody};
use super::request::ApiRequest;
use super::response::{self, ApiResponse};
use crate::service::{CatalogService, ServiceResult};
use crate::tree::SiblingOrder;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone)]
pub struct Router {
    service: CatalogService,
}

/// The entity a path addresses, used for 404 descriptions.
#[derive(Debug, Clone, Copy)]
enum Entity {
    Brand,
    Category,
    Supplier,
    Product,
}

impl Entity {
    fn not_found(self) -> &'static str {
        match self {
            Entity::Brand => "Brand Not Found",
            Entity::Category => "Category Not Found",
            Entity::Supplier => "Supplier Not Found",
            Entity::Product => "Product Not Found",
        }
    }
}

fn method_not_allowed() -> ApiResponse {
    ApiResponse::json(405, "Method Not Allowed", serde_json::Value::Null)
}

impl Router {
    pub fn new(service: CatalogService) -> Self {
        Self { service }
    }

    pub fn handle(&self, req: &ApiRequest, ctx: &RequestContext) -> ApiResponse {
        ctx.info(
            "req payload",
            &format!("{} {} {}", req.method, req.path, req.body_text()),
        );
        let resp = self.dispatch(req, ctx);
        ctx.info(
            "res payload",
            &format!("{} {}", resp.status, String::from_utf8_lossy(&resp.body)),
        );
        resp
    }

    fn dispatch(&self, req: &ApiRequest, ctx: &RequestContext) -> ApiResponse {
        let method = req.method.as_str();
        match req.segments().as_slice() {
            ["api", "health"] => match method {
                "GET" => ApiResponse {
                    status: 200,
                    content_type: "application/json",
                    body: br#""OK""#.to_vec(),
                },
                _ => method_not_allowed(),
            },

            ["api", "brands"] => match method {
                "POST" => self.create_brand(req, ctx),
                "GET" => self.list_brands(req, ctx),
                _ => method_not_allowed(),
            },
            ["api", "brands", id] => self.with_id(Entity::Brand, id, |id| match method {
                "GET" => respond(ctx, response::FETCHED, self.service.get_brand(id)),
                "PUT" => self.update_brand(id, req, ctx),
                "DELETE" => respond(ctx, response::DELETED, self.delete_brand(id)),
                _ => method_not_allowed(),
            }),

            ["api", "categories"] => match method {
                "POST" => self.create_category(req, ctx),
                "GET" => self.list_categories(req, ctx),
                _ => method_not_allowed(),
            },
            ["api", "categories", "tree"] => match method {
                "GET" => self.category_tree(req, ctx),
                _ => method_not_allowed(),
            },
            ["api", "categories", id] => self.with_id(Entity::Category, id, |id| match method {
                "GET" => respond(ctx, response::FETCHED, self.service.get_category(id)),
                "PUT" => self.update_category(id, req, ctx),
                "DELETE" => respond(ctx, response::DELETED, self.delete_category(id)),
                _ => method_not_allowed(),
            }),

            ["api", "suppliers"] => match method {
                "POST" => self.create_supplier(req, ctx),
                "GET" => self.list_suppliers(req, ctx),
                _ => method_not_allowed(),
            },
            ["api", "suppliers", id] => self.with_id(Entity::Supplier, id, |id| match method {
                "GET" => respond(ctx, response::FETCHED, self.service.get_supplier(id)),
                "PUT" => self.update_supplier(id, req, ctx),
                "DELETE" => respond(ctx, response::DELETED, self.delete_supplier(id)),
                _ => method_not_allowed(),
            }),

            ["api", "products"] => match method {
                "POST" => self.create_product(req, ctx),
                "GET" => self.list_products(req, ctx),
                _ => method_not_allowed(),
            },
            ["api", "products", id] => self.with_id(Entity::Product, id, |id| match method {
                "GET" => respond(ctx, response::FETCHED, self.service.get_product(id)),
                "PUT" => self.update_product(id, req, ctx),
                "DELETE" => respond(ctx, response::DELETED, self.delete_product(id)),
                _ => method_not_allowed(),
            }),

            #[cfg(feature = "metrics")]
            ["metrics"] => match method {
                "GET" => match crate::metrics::METRICS.render() {
                    Ok(text) => ApiResponse::text(200, text),
                    Err(e) => {
                        ctx.error("cannot render metrics", &e);
                        ApiResponse::internal_error()
                    }
                },
                _ => method_not_allowed(),
            },

            _ => ApiResponse::not_found("Not Found"),
        }
    }

    /// Path ids that are not UUIDs cannot name a stored record.
    fn with_id(
        &self,
        entity: Entity,
        raw: &str,
        handler: impl FnOnce(Uuid) -> ApiResponse,
    ) -> ApiResponse {
        match Uuid::parse_str(raw) {
            Ok(id) => handler(id),
            Err(_) => ApiResponse::not_found(entity.not_found()),
        }
    }

    // ---- brands ----

    fn create_brand(&self, req: &ApiRequest, ctx: &RequestContext) -> ApiResponse {
        match dto::parse_body::<BrandBody>(&req.body).and_then(BrandBody::validate) {
            Ok(draft) => respond(ctx, response::CREATED, self.service.add_brand(&draft)),
            Err(msg) => invalid(ctx, msg),
        }
    }

    fn list_brands(&self, req: &ApiRequest, ctx: &RequestContext) -> ApiResponse {
        match dto::page_request(&req.query) {
            Ok(page) => respond(ctx, "Fetched brands", self.service.list_brands(page)),
            Err(msg) => invalid(ctx, msg),
        }
    }

    fn update_brand(&self, id: Uuid, req: &ApiRequest, ctx: &RequestContext) -> ApiResponse {
        let draft = match dto::parse_body::<BrandBody>(&req.body).and_then(BrandBody::validate) {
            Ok(draft) => draft,
            Err(msg) => return invalid(ctx, msg),
        };
        let result = self
            .service
            .update_brand(id, &draft)
            .and_then(|_| self.service.get_brand(id));
        respond(ctx, response::UPDATED, result)
    }

    fn delete_brand(&self, id: Uuid) -> ServiceResult<crate::model::Brand> {
        let brand = self.service.get_brand(id)?;
        self.service.delete_brand(id)?;
        Ok(brand)
    }

    // ---- categories ----

    fn create_category(&self, req: &ApiRequest, ctx: &RequestContext) -> ApiResponse {
        match dto::parse_body::<CreateCategoryBody>(&req.body).and_then(CreateCategoryBody::validate) {
            Ok(draft) => respond(ctx, response::CREATED, self.service.add_category(&draft)),
            Err(msg) => invalid(ctx, msg),
        }
    }

    fn list_categories(&self, req: &ApiRequest, ctx: &RequestContext) -> ApiResponse {
        match dto::page_request(&req.query) {
            Ok(page) => respond(
                ctx,
                response::FETCHED_CATEGORIES,
                self.service.list_categories(page),
            ),
            Err(msg) => invalid(ctx, msg),
        }
    }

    fn category_tree(&self, req: &ApiRequest, ctx: &RequestContext) -> ApiResponse {
        let order = match req.query.get("order") {
            None | Some("") | Some("insertion") => SiblingOrder::Insertion,
            Some("sequence") => SiblingOrder::Sequence,
            Some(other) => return invalid(ctx, format!("unknown order '{other}'")),
        };
        respond(
            ctx,
            response::FETCHED_CATEGORIES,
            self.service.category_tree(order),
        )
    }

    fn update_category(&self, id: Uuid, req: &ApiRequest, ctx: &RequestContext) -> ApiResponse {
        let update = match dto::parse_body::<UpdateCategoryBody>(&req.body)
            .and_then(UpdateCategoryBody::validate)
        {
            Ok(update) => update,
            Err(msg) => return invalid(ctx, msg),
        };
        let result = self
            .service
            .update_category(id, &update)
            .and_then(|_| self.service.get_category(id));
        respond(ctx, response::UPDATED, result)
    }

    fn delete_category(&self, id: Uuid) -> ServiceResult<crate::model::Category> {
        let category = self.service.get_category(id)?;
        self.service.delete_category(id)?;
        Ok(category)
    }

    // ---- suppliers ----

    fn create_supplier(&self, req: &ApiRequest, ctx: &RequestContext) -> ApiResponse {
        match dto::parse_body::<SupplierBody>(&req.body).and_then(SupplierBody::validate) {
            Ok(draft) => respond(ctx, response::CREATED, self.service.add_supplier(&draft)),
            Err(msg) => invalid(ctx, msg),
        }
    }

    fn list_suppliers(&self, req: &ApiRequest, ctx: &RequestContext) -> ApiResponse {
        match dto::page_request(&req.query) {
            Ok(page) => respond(ctx, "Fetched suppliers", self.service.list_suppliers(page)),
            Err(msg) => invalid(ctx, msg),
        }
    }

    fn update_supplier(&self, id: Uuid, req: &ApiRequest, ctx: &RequestContext) -> ApiResponse {
        let draft = match dto::parse_body::<SupplierBody>(&req.body).and_then(SupplierBody::validate) {
            Ok(draft) => draft,
            Err(msg) => return invalid(ctx, msg),
        };
        let result = self
            .service
            .update_supplier(id, &draft)
            .and_then(|_| self.service.get_supplier(id));
        respond(ctx, response::UPDATED, result)
    }

    fn delete_supplier(&self, id: Uuid) -> ServiceResult<crate::model::Supplier> {
        let supplier = self.service.get_supplier(id)?;
        self.service.delete_supplier(id)?;
        Ok(supplier)
    }

    // ---- products ----

    fn create_product(&self, req: &ApiRequest, ctx: &RequestContext) -> ApiResponse {
        match dto::parse_body::<ProductBody>(&req.body).and_then(ProductBody::validate) {
            Ok(draft) => respond(ctx, response::CREATED, self.service.add_product(&draft)),
            Err(msg) => invalid(ctx, msg),
        }
    }

    fn list_products(&self, req: &ApiRequest, ctx: &RequestContext) -> ApiResponse {
        match dto::product_filter(&req.query) {
            Ok(params) => respond(ctx, "Fetched products", self.service.list_products(&params)),
            Err(msg) => invalid(ctx, msg),
        }
    }

    fn update_product(&self, id: Uuid, req: &ApiRequest, ctx: &RequestContext) -> ApiResponse {
        let draft = match dto::parse_body::<ProductBody>(&req.body).and_then(ProductBody::validate) {
            Ok(draft) => draft,
            Err(msg) => return invalid(ctx, msg),
        };
        let result = self
            .service
            .update_product(id, &draft)
            .and_then(|_| self.service.get_product(id));
        respond(ctx, response::UPDATED, result)
    }

    fn delete_product(&self, id: Uuid) -> ServiceResult<crate::model::Product> {
        let product = self.service.get_product(id)?;
        self.service.delete_product(id)?;
        Ok(product)
    }
}

fn invalid(ctx: &RequestContext, msg: String) -> ApiResponse {
    ctx.error("cannot pass validation", &msg);
    ApiResponse::invalid(msg)
}

fn respond<T: Serialize>(
    ctx: &RequestContext,
    description: &str,
    result: ServiceResult<T>,
) -> ApiResponse {
    match result {
        Ok(data) => ApiResponse::ok(description, data),
        Err(e) => {
            ctx.error("request failed", &e);
            ApiResponse::from_service_error(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::Repositories;
    use serde_json::{json, Value};

    fn router() -> Router {
        Router::new(CatalogService::new(Repositories::in_memory()))
    }

    fn call(router: &Router, method: &str, target: &str, body: Option<Value>) -> (u16, Value) {
        let mut req = ApiRequest::new(method, target);
        if let Some(body) = body {
            req = req.with_body(body.to_string());
        }
        let resp = router.handle(&req, &RequestContext::new(None));
        let json = if resp.body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&resp.body).unwrap()
        };
        (resp.status, json)
    }

    fn create(router: &Router, path: &str, body: Value) -> String {
        let (status, json) = call(router, "POST", path, Some(body));
        assert_eq!(status, 200, "{json}");
        json["data"]["id"].as_str().unwrap().to_string()
    }

    fn seed_references(router: &Router) -> (String, String, String) {
        let brand = create(router, "/api/brands", json!({"name": "Lenovo", "status_id": 1}));
        let category = create(
            router,
            "/api/categories",
            json!({"name": "Laptop", "parent_id": "", "status_id": 1}),
        );
        let supplier = create(
            router,
            "/api/suppliers",
            json!({
                "name": "Z Studio",
                "email": "sales@zstudio.com",
                "phone": "01712345678",
                "status_id": 1,
                "is_verified_supplier": true
            }),
        );
        (brand, category, supplier)
    }

    fn product_body(name: &str, price: f64, ids: &(String, String, String)) -> Value {
        json!({
            "name": name,
            "description": "A capable laptop",
            "specifications": "16GB RAM",
            "brand_id": ids.0,
            "category_id": ids.1,
            "supplier_id": ids.2,
            "unit_price": price,
            "discount_price": 0,
            "tags": ["Laptop"],
            "status_id": 1,
            "stock_quantity": 3
        })
    }

    #[test]
    fn test_health() {
        let (status, json) = call(&router(), "GET", "/api/health", None);
        assert_eq!(status, 200);
        assert_eq!(json, json!("OK"));
    }

    #[test]
    fn test_unknown_route_and_method() {
        let r = router();
        assert_eq!(call(&r, "GET", "/api/widgets", None).0, 404);
        assert_eq!(call(&r, "PATCH", "/api/brands", None).0, 405);
    }

    #[test]
    fn test_brand_lifecycle() {
        let r = router();
        let id = create(&r, "/api/brands", json!({"name": "Lenovo", "status_id": 1}));

        let (status, json) = call(&r, "GET", &format!("/api/brands/{id}"), None);
        assert_eq!(status, 200);
        assert_eq!(json["description"], response::FETCHED);
        assert_eq!(json["data"]["name"], "Lenovo");

        let (status, json) = call(
            &r,
            "PUT",
            &format!("/api/brands/{id}"),
            Some(json!({"name": "Lenovo Group", "status_id": 2})),
        );
        assert_eq!(status, 200);
        assert_eq!(json["data"]["name"], "Lenovo Group");
        assert_eq!(json["data"]["status_id"], 2);

        let (status, json) = call(&r, "GET", "/api/brands?page=1&limit=10", None);
        assert_eq!(status, 200);
        assert_eq!(json["data"]["total"], 1);

        let (status, _) = call(&r, "DELETE", &format!("/api/brands/{id}"), None);
        assert_eq!(status, 200);
        let (status, json) = call(&r, "GET", &format!("/api/brands/{id}"), None);
        assert_eq!(status, 404);
        assert_eq!(json["description"], "Brand Not Found");
    }

    #[test]
    fn test_validation_errors_are_400() {
        let r = router();
        let (status, json) = call(&r, "POST", "/api/brands", Some(json!({"name": "L", "status_id": 1})));
        assert_eq!(status, 400);
        assert_eq!(json["description"], response::INVALID_PARAMETER);
        assert!(json["data"].as_str().unwrap().contains("name"));

        assert_eq!(call(&r, "GET", "/api/brands?page=0&limit=10", None).0, 400);
        assert_eq!(call(&r, "GET", "/api/products?page=1", None).0, 400);
        assert_eq!(
            call(&r, "GET", "/api/products?limit=10&page=9223372036854775807", None).0,
            400
        );
        assert_eq!(call(&r, "GET", "/api/brands?page=9223372036854775807&limit=100", None).0, 400);
    }

    #[test]
    fn test_malformed_id_is_404() {
        let (status, json) = call(&router(), "GET", "/api/products/not-a-uuid", None);
        assert_eq!(status, 404);
        assert_eq!(json["description"], "Product Not Found");
    }

    #[test]
    fn test_category_tree_route() {
        let r = router();
        let laptop = create(
            &r,
            "/api/categories",
            json!({"name": "Laptop", "parent_id": "", "status_id": 1}),
        );
        create(
            &r,
            "/api/categories",
            json!({"name": "Ultrabook", "parent_id": laptop, "sequence": 1, "status_id": 1}),
        );
        create(
            &r,
            "/api/categories",
            json!({"name": "Gaming Laptop", "parent_id": laptop, "sequence": 2, "status_id": 1}),
        );

        let (status, json) = call(&r, "GET", "/api/categories/tree", None);
        assert_eq!(status, 200);
        assert_eq!(json["description"], response::FETCHED_CATEGORIES);
        assert_eq!(json["data"][0]["category_name"], "Laptop");
        // newest sibling first
        assert_eq!(json["data"][0]["children"][0]["category_name"], "Gaming Laptop");
        assert_eq!(json["data"][0]["children"][1]["category_name"], "Ultrabook");
        assert!(json["data"][0]["children"][0].get("children").is_none());

        let (_, json) = call(&r, "GET", "/api/categories/tree?order=sequence", None);
        assert_eq!(json["data"][0]["children"][0]["category_name"], "Ultrabook");

        assert_eq!(call(&r, "GET", "/api/categories/tree?order=random", None).0, 400);
    }

    #[test]
    fn test_category_with_missing_parent_is_400() {
        let (status, json) = call(
            &router(),
            "POST",
            "/api/categories",
            Some(json!({"name": "Orphan", "parent_id": Uuid::new_v4().to_string(), "status_id": 1})),
        );
        assert_eq!(status, 400);
        assert_eq!(json["description"], "Parent category not found");
    }

    #[test]
    fn test_product_create_filter_and_conflicts() {
        let r = router();
        let ids = seed_references(&r);
        let cheap = create(&r, "/api/products", product_body("IdeaPad", 499.0, &ids));
        create(&r, "/api/products", product_body("ThinkPad", 1499.5, &ids));

        let (status, json) = call(&r, "POST", "/api/products", Some(product_body("IdeaPad", 10.0, &ids)));
        assert_eq!(status, 400);
        assert_eq!(json["data"], "Product name already exists for this supplier");

        let (status, json) = call(&r, "GET", "/api/products?limit=10&max_price=1000", None);
        assert_eq!(status, 200);
        assert_eq!(json["data"]["total"], 1);
        assert_eq!(json["data"]["products"][0]["name"], "IdeaPad");
        assert_eq!(json["data"]["products"][0]["brand"]["name"], "Lenovo");
        assert_eq!(json["data"]["products"][0]["product_stock"]["stock_quantity"], 3);

        let (_, json) = call(&r, "GET", "/api/products?limit=10&is_verified_supplier=true", None);
        assert_eq!(json["data"]["total"], 2);
        assert_eq!(json["data"]["products"][1]["unit_price"], 1499.5);

        let (status, _) = call(&r, "DELETE", &format!("/api/brands/{}", ids.0), None);
        assert_eq!(status, 409);

        let (status, _) = call(&r, "DELETE", &format!("/api/products/{cheap}"), None);
        assert_eq!(status, 200);
        let (_, json) = call(&r, "GET", "/api/products?limit=10", None);
        assert_eq!(json["data"]["total"], 1);
    }

    #[test]
    fn test_product_with_unknown_supplier_is_400() {
        let r = router();
        let mut ids = seed_references(&r);
        ids.2 = Uuid::new_v4().to_string();
        let (status, json) = call(&r, "POST", "/api/products", Some(product_body("IdeaPad", 499.0, &ids)));
        assert_eq!(status, 400);
        assert_eq!(json["description"], "Supplier not found");
    }
}
