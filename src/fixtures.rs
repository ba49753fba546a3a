use crate::models::{Dataset, EventRecord};

pub fn record(count: u64, brand: &str, marketplace: &str, week: i64) -> EventRecord {
    EventRecord {
        count,
        protected_brand_id: format!("id-{brand}"),
        protected_brand_name: brand.to_string(),
        marketplace_id: marketplace.to_string(),
        action_type: "suppress".to_string(),
        rule_id: "r1".to_string(),
        template_source: "manual".to_string(),
        infringing_brand: "Knockoff".to_string(),
        action_date: None,
        gl_product_group_desc: "Toys".to_string(),
        template_sub_type: "sub".to_string(),
        week,
    }
}

pub fn detailed(
    count: u64,
    brand: &str,
    marketplace: &str,
    category: &str,
    infringing: &str,
    week: i64,
) -> EventRecord {
    EventRecord {
        gl_product_group_desc: category.to_string(),
        infringing_brand: infringing.to_string(),
        ..record(count, brand, marketplace, week)
    }
}

/// Three-row dataset: A/1=10, B/1=5, A/2=20.
pub fn scenario() -> Dataset {
    Dataset::new(vec![
        record(10, "A", "US", 1),
        record(5, "B", "UK", 1),
        record(20, "A", "US", 2),
    ])
}
