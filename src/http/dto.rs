//! Request bodies and query parameters, and their validation.
//!
//! Every field is optional at the serde level so a missing field becomes a
//! readable validation message instead of a deserializer error. `validate`
//! turns a body into the draft the service works with.

use crate::model::{
    BrandDraft, CategoryDraft, FilterProductsParams, PageRequest, ProductDraft, Status,
    SupplierDraft,
};
use crate::service::{CategoryUpdate, ParentChange};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::str::FromStr;
use uuid::Uuid;

use super::request::QueryParams;

pub type Validation<T> = Result<T, String>;

static EMAIL: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$"));
static PHONE: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"^\d{11}$"));

fn matches(re: &Lazy<Result<Regex, regex::Error>>, value: &str) -> bool {
    match re.as_ref() {
        Ok(re) => re.is_match(value),
        Err(e) => {
            log::error!("validation pattern failed to compile: {}", e);
            false
        }
    }
}

/// Parse a JSON request body.
pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Validation<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err("request body is required".to_string());
    }
    serde_json::from_slice(body).map_err(|e| format!("invalid request body: {e}"))
}

fn required<T>(value: Option<T>, field: &str) -> Validation<T> {
    value.ok_or_else(|| format!("{field} is required"))
}

fn length(value: String, field: &str, min: usize, max: usize) -> Validation<String> {
    let n = value.chars().count();
    if n < min || n > max {
        return Err(format!("{field} must be between {min} and {max} characters"));
    }
    Ok(value)
}

fn status(value: Option<i32>) -> Validation<i32> {
    let id = required(value, "status_id")?;
    Status::from_id(id)
        .map(Status::id)
        .ok_or_else(|| format!("status_id must be {} or {}", Status::ACTIVE_ID, Status::INACTIVE_ID))
}

fn uuid_field(value: &str, field: &str) -> Validation<Uuid> {
    Uuid::parse_str(value.trim()).map_err(|_| format!("{field} must be a valid id"))
}

fn decimal(value: f64, field: &str) -> Validation<Decimal> {
    if !value.is_finite() {
        return Err(format!("{field} must be a number"));
    }
    Decimal::from_str(&value.to_string()).map_err(|_| format!("{field} is out of range"))
}

/// Empty string means "not set".
fn optional_uuid(value: Option<&str>, field: &str) -> Validation<Option<Uuid>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => uuid_field(v, field).map(Some),
    }
}

// ---- brands ----

#[derive(Debug, Default, Deserialize)]
pub struct BrandBody {
    pub name: Option<String>,
    pub status_id: Option<i32>,
}

impl BrandBody {
    pub fn validate(self) -> Validation<BrandDraft> {
        Ok(BrandDraft {
            name: length(required(self.name, "name")?, "name", 2, 50)?,
            status_id: status(self.status_id)?,
        })
    }
}

// ---- categories ----

#[derive(Debug, Default, Deserialize)]
pub struct CreateCategoryBody {
    pub name: Option<String>,
    pub parent_id: Option<String>,
    pub sequence: Option<i32>,
    pub status_id: Option<i32>,
}

impl CreateCategoryBody {
    pub fn validate(self) -> Validation<CategoryDraft> {
        Ok(CategoryDraft {
            name: length(required(self.name, "name")?, "name", 2, 50)?,
            parent_id: optional_uuid(self.parent_id.as_deref(), "parent_id")?,
            sequence: self.sequence,
            status_id: status(self.status_id)?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategoryBody {
    pub name: Option<String>,
    /// Absent or `0` keeps the stored status.
    pub status_id: Option<i32>,
    pub sequence: Option<i32>,
    /// Absent keeps the parent, `""` moves to the root.
    pub parent_id: Option<String>,
}

impl UpdateCategoryBody {
    pub fn validate(self) -> Validation<CategoryUpdate> {
        let status_id = match self.status_id {
            None | Some(0) => None,
            Some(id) => Some(status(Some(id))?),
        };
        let parent = match self.parent_id.as_deref().map(str::trim) {
            None => ParentChange::Keep,
            Some("") => ParentChange::Root,
            Some(id) => ParentChange::To(uuid_field(id, "parent_id")?),
        };
        Ok(CategoryUpdate {
            name: length(required(self.name, "name")?, "name", 2, 50)?,
            status_id,
            sequence: self.sequence,
            parent,
        })
    }
}

// ---- suppliers ----

#[derive(Debug, Default, Deserialize)]
pub struct SupplierBody {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status_id: Option<i32>,
    pub is_verified_supplier: Option<bool>,
}

impl SupplierBody {
    pub fn validate(self) -> Validation<SupplierDraft> {
        let name = length(required(self.name, "name")?, "name", 2, 50)?;
        let email = required(self.email, "email")?;
        if !matches(&EMAIL, &email) {
            return Err("email must be a valid email address".to_string());
        }
        let phone = required(self.phone, "phone")?;
        if !matches(&PHONE, &phone) {
            return Err("phone must be exactly 11 digits".to_string());
        }
        Ok(SupplierDraft {
            name,
            email,
            phone,
            status_id: status(self.status_id)?,
            is_verified_supplier: required(self.is_verified_supplier, "is_verified_supplier")?,
        })
    }
}

// ---- products ----

#[derive(Debug, Default, Deserialize)]
pub struct ProductBody {
    pub name: Option<String>,
    pub description: Option<String>,
    pub specifications: Option<String>,
    pub brand_id: Option<String>,
    pub category_id: Option<String>,
    pub supplier_id: Option<String>,
    pub unit_price: Option<f64>,
    pub discount_price: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub status_id: Option<i32>,
    pub stock_quantity: Option<i64>,
}

impl ProductBody {
    pub fn validate(self) -> Validation<ProductDraft> {
        let name = length(required(self.name, "name")?, "name", 2, 50)?;
        let description = length(
            required(self.description, "description")?,
            "description",
            2,
            500,
        )?;
        let specifications = length(self.specifications.unwrap_or_default(), "specifications", 0, 500)?;

        let brand_id = uuid_field(&required(self.brand_id, "brand_id")?, "brand_id")?;
        let category_id = uuid_field(&required(self.category_id, "category_id")?, "category_id")?;
        let supplier_id = uuid_field(&required(self.supplier_id, "supplier_id")?, "supplier_id")?;

        let unit_price = decimal(required(self.unit_price, "unit_price")?, "unit_price")?;
        if unit_price <= Decimal::ZERO {
            return Err("unit_price must be greater than 0".to_string());
        }
        let discount_price = decimal(
            required(self.discount_price, "discount_price")?,
            "discount_price",
        )?;
        if discount_price < Decimal::ZERO {
            return Err("discount_price must not be negative".to_string());
        }

        let tags = required(self.tags, "tags")?;
        let stock_quantity = required(self.stock_quantity, "stock_quantity")?;
        if stock_quantity < 1 {
            return Err("stock_quantity must be at least 1".to_string());
        }
        let stock_quantity =
            i32::try_from(stock_quantity).map_err(|_| "stock_quantity is too large".to_string())?;

        Ok(ProductDraft {
            name,
            description,
            specifications,
            brand_id,
            category_id,
            supplier_id,
            unit_price,
            discount_price,
            tags,
            status_id: status(self.status_id)?,
            stock_quantity,
        })
    }
}

// ---- query strings ----

/// Keeps `(page - 1) * limit` well inside a BIGINT offset.
pub const MAX_PAGE: i64 = 1_000_000;

fn int_param(query: &QueryParams, key: &str) -> Validation<Option<i64>> {
    match query.get(key).map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v
            .parse::<i64>()
            .map(Some)
            .map_err(|_| format!("{key} must be an integer")),
    }
}

fn limit_param(query: &QueryParams) -> Validation<u64> {
    let limit = required(int_param(query, "limit")?, "limit")?;
    if !(1..=100).contains(&limit) {
        return Err("limit must be between 1 and 100".to_string());
    }
    Ok(limit as u64)
}

fn price_param(query: &QueryParams, key: &str) -> Validation<Decimal> {
    match query.get(key).map(str::trim) {
        None | Some("") => Ok(Decimal::ZERO),
        Some(v) => {
            let price = v
                .parse::<f64>()
                .map_err(|_| format!("{key} must be a number"))?;
            if price < 0.0 {
                return Err(format!("{key} must not be negative"));
            }
            decimal(price, key)
        }
    }
}

/// `page` (1..=MAX_PAGE) and `limit` (1..=100), both required.
pub fn page_request(query: &QueryParams) -> Validation<PageRequest> {
    let page = required(int_param(query, "page")?, "page")?;
    if page < 1 {
        return Err("page must be at least 1".to_string());
    }
    if page > MAX_PAGE {
        return Err(format!("page must be at most {MAX_PAGE}"));
    }
    Ok(PageRequest::new(page as u64, limit_param(query)?))
}

/// Product listing filter. `page` may also be spelled `Page`.
pub fn product_filter(query: &QueryParams) -> Validation<FilterProductsParams> {
    let page = match int_param(query, "page")? {
        Some(p) => Some(p),
        None => int_param(query, "Page")?,
    };
    let page = match page {
        None => 1,
        Some(p) if p < 0 => return Err("page must not be negative".to_string()),
        Some(p) if p > MAX_PAGE => return Err(format!("page must be at most {MAX_PAGE}")),
        Some(p) => (p as u64).max(1),
    };

    let brand_ids = query
        .get_all("brand_ids")
        .into_iter()
        .filter(|v| !v.trim().is_empty())
        .map(|v| uuid_field(v, "brand_ids"))
        .collect::<Validation<Vec<_>>>()?;

    let is_verified_supplier = match query.get("is_verified_supplier").map(str::trim) {
        None | Some("") => false,
        Some(v) => v
            .parse::<bool>()
            .map_err(|_| "is_verified_supplier must be true or false".to_string())?,
    };

    Ok(FilterProductsParams {
        name: query
            .get("name")
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        min_price: price_param(query, "min_price")?,
        max_price: price_param(query, "max_price")?,
        brand_ids,
        category_id: optional_uuid(query.get("category_id"), "category_id")?,
        supplier_id: optional_uuid(query.get("supplier_id"), "supplier_id")?,
        is_verified_supplier,
        page,
        limit: limit_param(query)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body<T: DeserializeOwned>(value: serde_json::Value) -> T {
        parse_body(value.to_string().as_bytes()).unwrap()
    }

    fn product_json() -> serde_json::Value {
        json!({
            "name": "Legion 5",
            "description": "Gaming laptop",
            "brand_id": Uuid::new_v4().to_string(),
            "category_id": Uuid::new_v4().to_string(),
            "supplier_id": Uuid::new_v4().to_string(),
            "unit_price": 1299.99,
            "discount_price": 5,
            "tags": ["Laptop"],
            "status_id": 1,
            "stock_quantity": 4
        })
    }

    #[test]
    fn test_brand_name_length() {
        let short: BrandBody = body(json!({"name": "L", "status_id": 1}));
        assert!(short.validate().is_err());

        let long: BrandBody = body(json!({"name": "x".repeat(51), "status_id": 1}));
        assert!(long.validate().is_err());

        let ok: BrandBody = body(json!({"name": "Lenovo", "status_id": 2}));
        assert_eq!(ok.validate().unwrap().status_id, 2);
    }

    #[test]
    fn test_status_must_be_known() {
        for status_id in [0, 3, -1] {
            let b: BrandBody = body(json!({"name": "Lenovo", "status_id": status_id}));
            assert!(b.validate().is_err(), "status {status_id} accepted");
        }
        let missing: BrandBody = body(json!({"name": "Lenovo"}));
        assert_eq!(missing.validate().unwrap_err(), "status_id is required");
    }

    #[test]
    fn test_empty_body_rejected() {
        assert!(parse_body::<BrandBody>(b"").is_err());
        assert!(parse_body::<BrandBody>(b"{not json").is_err());
    }

    #[test]
    fn test_category_parent_parsing() {
        let root: CreateCategoryBody = body(json!({"name": "Laptop", "parent_id": "", "status_id": 1}));
        assert_eq!(root.validate().unwrap().parent_id, None);

        let bad: CreateCategoryBody = body(json!({"name": "Laptop", "parent_id": "42", "status_id": 1}));
        assert!(bad.validate().is_err());

        let keep: UpdateCategoryBody = body(json!({"name": "Laptop"}));
        let update = keep.validate().unwrap();
        assert_eq!(update.parent, ParentChange::Keep);
        assert_eq!(update.status_id, None);

        let to_root: UpdateCategoryBody = body(json!({"name": "Laptop", "parent_id": "", "status_id": 2}));
        let update = to_root.validate().unwrap();
        assert_eq!(update.parent, ParentChange::Root);
        assert_eq!(update.status_id, Some(2));
    }

    #[test]
    fn test_supplier_rules() {
        let ok = json!({
            "name": "Z Studio",
            "email": "sales@zstudio.com",
            "phone": "01712345678",
            "status_id": 1,
            "is_verified_supplier": false
        });
        assert!(body::<SupplierBody>(ok.clone()).validate().is_ok());

        let mut bad_phone = ok.clone();
        bad_phone["phone"] = json!("0171234567");
        assert!(body::<SupplierBody>(bad_phone).validate().is_err());

        let mut bad_email = ok.clone();
        bad_email["email"] = json!("not-an-email");
        assert!(body::<SupplierBody>(bad_email).validate().is_err());

        let mut no_flag = ok;
        no_flag.as_object_mut().unwrap().remove("is_verified_supplier");
        assert_eq!(
            body::<SupplierBody>(no_flag).validate().unwrap_err(),
            "is_verified_supplier is required"
        );
    }

    #[test]
    fn test_product_rules() {
        let draft = body::<ProductBody>(product_json()).validate().unwrap();
        assert_eq!(draft.unit_price, Decimal::new(129_999, 2));
        assert_eq!(draft.discount_price, Decimal::new(5, 0));
        assert_eq!(draft.specifications, "");

        let mut zero_price = product_json();
        zero_price["unit_price"] = json!(0);
        assert!(body::<ProductBody>(zero_price).validate().is_err());

        let mut no_stock = product_json();
        no_stock["stock_quantity"] = json!(0);
        assert!(body::<ProductBody>(no_stock).validate().is_err());

        let mut bad_id = product_json();
        bad_id["brand_id"] = json!("brand-1");
        assert_eq!(
            body::<ProductBody>(bad_id).validate().unwrap_err(),
            "brand_id must be a valid id"
        );

        let mut no_tags = product_json();
        no_tags.as_object_mut().unwrap().remove("tags");
        assert!(body::<ProductBody>(no_tags).validate().is_err());
    }

    #[test]
    fn test_page_request_bounds() {
        assert!(page_request(&QueryParams::parse("page=1&limit=10")).is_ok());
        assert!(page_request(&QueryParams::parse("page=0&limit=10")).is_err());
        assert!(page_request(&QueryParams::parse("page=1&limit=101")).is_err());
        assert!(page_request(&QueryParams::parse("limit=10")).is_err());
        assert!(page_request(&QueryParams::parse("page=x&limit=10")).is_err());
        assert!(page_request(&QueryParams::parse("page=1000000&limit=100")).is_ok());
        assert!(page_request(&QueryParams::parse("page=1000001&limit=10")).is_err());
    }

    #[test]
    fn test_product_filter_params() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let q = QueryParams::parse(&format!(
            "Page=2&limit=5&brand_ids={a}&brand_ids={b}&min_price=10&max_price=99.5&is_verified_supplier=true"
        ));
        let f = product_filter(&q).unwrap();
        assert_eq!(f.page, 2);
        assert_eq!(f.limit, 5);
        assert_eq!(f.brand_ids, vec![a, b]);
        assert_eq!(f.min_price, Decimal::new(10, 0));
        assert_eq!(f.max_price, Decimal::new(995, 1));
        assert!(f.is_verified_supplier);

        let defaults = product_filter(&QueryParams::parse("limit=10")).unwrap();
        assert_eq!(defaults.page, 1);
        assert!(!defaults.has_max_price());

        assert!(product_filter(&QueryParams::parse("page=1")).is_err());
        assert!(product_filter(&QueryParams::parse("limit=10&min_price=-1")).is_err());
        assert!(product_filter(&QueryParams::parse("limit=10&brand_ids=nope")).is_err());
        assert!(product_filter(&QueryParams::parse("limit=10&page=9223372036854775807")).is_err());
    }
}
