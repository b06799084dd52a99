//! Demo data.
//!
//! Creates one brand, a small category hierarchy, one verified supplier and
//! `product_count` products with randomised names, prices and stock. Goes
//! through [`CatalogService`] so the same rules apply as for API writes.

use crate::model::{BrandDraft, CategoryDraft, ProductDraft, Status, SupplierDraft};
use crate::service::{CatalogService, ServiceResult};
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::LastName;
use fake::Fake;
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use uuid::Uuid;

pub const DEFAULT_PRODUCT_COUNT: usize = 20;

const TAGS: &[&str] = &["Laptop", "Portable", "Gaming", "Business", "Student"];

/// What a seed run created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub brand_id: Uuid,
    pub category_ids: Vec<Uuid>,
    pub supplier_id: Uuid,
    pub product_ids: Vec<Uuid>,
}

pub fn seed(service: &CatalogService, product_count: usize) -> ServiceResult<SeedSummary> {
    let mut rng = rand::thread_rng();

    let brand = service.add_brand(&BrandDraft {
        name: "Lenovo".to_string(),
        status_id: Status::ACTIVE_ID,
    })?;

    let laptop = service.add_category(&CategoryDraft {
        name: "Laptop".to_string(),
        parent_id: None,
        sequence: Some(1),
        status_id: Status::ACTIVE_ID,
    })?;
    let mut category_ids = vec![laptop.id];
    for (sequence, name) in [(1, "Gaming Laptop"), (2, "Ultrabook")] {
        let child = service.add_category(&CategoryDraft {
            name: name.to_string(),
            parent_id: Some(laptop.id),
            sequence: Some(sequence),
            status_id: Status::ACTIVE_ID,
        })?;
        category_ids.push(child.id);
    }

    let supplier = service.add_supplier(&SupplierDraft {
        name: "Z Studio".to_string(),
        email: "zstudio@gmail.com".to_string(),
        phone: "01234567895".to_string(),
        status_id: Status::ACTIVE_ID,
        is_verified_supplier: true,
    })?;

    let mut product_ids = Vec::with_capacity(product_count);
    for i in 1..=product_count {
        let draft = random_product(&mut rng, i, brand.id, &category_ids, supplier.id);
        let product = service.add_product(&draft)?;
        log::debug!("seeded product {} ({})", product.name, product.id);
        product_ids.push(product.id);
    }

    log::info!(
        "seed completed: 1 brand, {} categories, 1 supplier, {} products",
        category_ids.len(),
        product_ids.len()
    );

    Ok(SeedSummary {
        brand_id: brand.id,
        category_ids,
        supplier_id: supplier.id,
        product_ids,
    })
}

fn random_product<R: Rng>(
    rng: &mut R,
    index: usize,
    brand_id: Uuid,
    category_ids: &[Uuid],
    supplier_id: Uuid,
) -> ProductDraft {
    // the index keeps names unique per supplier
    let name = format!("{} {}", LastName().fake_with_rng::<String, _>(rng), index);
    let description: String = Sentence(4..10).fake_with_rng(rng);
    let specifications: String = Sentence(3..8).fake_with_rng(rng);
    let category_id = category_ids.choose(rng).copied().unwrap_or_default();
    let tags = TAGS
        .choose_multiple(rng, 2)
        .map(|t| t.to_string())
        .collect();

    ProductDraft {
        name,
        description,
        specifications,
        brand_id,
        category_id,
        supplier_id,
        unit_price: Decimal::new(rng.gen_range(10_000..=300_000), 2),
        discount_price: Decimal::new(5, 0),
        tags,
        status_id: Status::ACTIVE_ID,
        stock_quantity: rng.gen_range(1..=100),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FilterProductsParams;
    use crate::repo::Repositories;
    use crate::tree::SiblingOrder;

    #[test]
    fn test_seed_in_memory() {
        let service = CatalogService::new(Repositories::in_memory());
        let summary = seed(&service, 12).unwrap();
        assert_eq!(summary.product_ids.len(), 12);
        assert_eq!(summary.category_ids.len(), 3);

        let page = service
            .list_products(&FilterProductsParams {
                limit: 100,
                ..FilterProductsParams::default()
            })
            .unwrap();
        assert_eq!(page.total, 12);
        assert!(page.products.iter().all(|p| p.unit_price >= Decimal::new(100, 0)));
        assert!(page.products.iter().all(|p| p.product_stock.stock_quantity >= 1));

        let tree = service.category_tree(SiblingOrder::Sequence).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(tree[0].children[0].category_name, "Gaming Laptop");
    }

    #[test]
    fn test_random_product_passes_length_rules() {
        let mut rng = rand::thread_rng();
        let ids = [Uuid::new_v4()];
        for i in 0..50 {
            let draft = random_product(&mut rng, i, Uuid::new_v4(), &ids, Uuid::new_v4());
            assert!((2..=50).contains(&draft.name.chars().count()));
            assert!(draft.description.chars().count() >= 2);
            assert!(draft.specifications.chars().count() <= 500);
            assert_eq!(draft.category_id, ids[0]);
        }
    }
}
