//! Aggregation steps over order records.
//!
//! Each step is a pure function. The service composes them as
//! filter → group → sort → limit → enrich.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use common::ProductId;
use domain::{Category, Money, Order};
use serde::Serialize;

/// Revenue totals over a set of orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RevenueSummary {
    pub total_revenue: Money,
    pub total_orders: u64,
    /// Zero when there are no orders.
    pub average_order_value: Money,
}

/// Units and revenue for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategorySales {
    pub category: Category,
    pub quantity: u64,
    pub revenue: Money,
}

/// Orders and revenue for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlySales {
    /// 1 = January.
    pub month: u32,
    pub orders: u64,
    pub revenue: Money,
}

/// Units and revenue for one product, before enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProductSales {
    pub product_id: ProductId,
    pub quantity: u64,
    pub revenue: Money,
}

/// A ranked product with its current name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopProduct {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u64,
    pub revenue: Money,
}

/// Leaves out cancelled orders.
pub fn billable<'a>(orders: impl IntoIterator<Item = &'a Order>) -> impl Iterator<Item = &'a Order> {
    orders.into_iter().filter(|o| !o.is_cancelled())
}

/// Sums `total_amount` and counts orders. Sums clamp rather than wrap.
pub fn revenue_summary<'a>(orders: impl IntoIterator<Item = &'a Order>) -> RevenueSummary {
    let (total_revenue, total_orders) = orders
        .into_iter()
        .fold((Money::zero(), 0u64), |(sum, count), o| {
            (sum.saturating_add(o.total_amount()), count + 1)
        });
    RevenueSummary {
        total_revenue,
        total_orders,
        average_order_value: Money::average(total_revenue, total_orders),
    }
}

/// Every product id referenced by the orders' line items, deduplicated.
pub fn referenced_products<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Vec<ProductId> {
    let mut ids: Vec<ProductId> = orders
        .into_iter()
        .flat_map(|o| o.items().iter().map(|item| item.product_id))
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

/// Groups line items by the category of the product they reference.
///
/// Line items whose product is not in `categories` are dropped. Sorted by
/// revenue, highest first.
pub fn sales_by_category<'a>(
    orders: impl IntoIterator<Item = &'a Order>,
    categories: &HashMap<ProductId, Category>,
) -> Vec<CategorySales> {
    let mut groups: HashMap<Category, (u64, Money)> = HashMap::new();

    for item in orders.into_iter().flat_map(|o| o.items()) {
        let Some(category) = categories.get(&item.product_id) else {
            continue;
        };
        let entry = groups.entry(*category).or_insert((0, Money::zero()));
        entry.0 += u64::from(item.quantity);
        entry.1 = entry.1.saturating_add(item.price.saturating_mul(item.quantity));
    }

    let mut sales: Vec<_> = groups
        .into_iter()
        .map(|(category, (quantity, revenue))| CategorySales {
            category,
            quantity,
            revenue,
        })
        .collect();
    sales.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.category.cmp(&b.category))
    });
    sales
}

/// Start of the calendar year containing `now`.
pub fn start_of_year(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

/// Groups orders created in `year` by calendar month, ascending. Months
/// without orders are absent.
pub fn monthly_sales<'a>(orders: impl IntoIterator<Item = &'a Order>, year: i32) -> Vec<MonthlySales> {
    let mut months: [(u64, Money); 12] = [(0, Money::zero()); 12];

    for order in orders {
        let created = order.created_at();
        if created.year() != year {
            continue;
        }
        let slot = &mut months[created.month0() as usize];
        slot.0 += 1;
        slot.1 = slot.1.saturating_add(order.total_amount());
    }

    months
        .iter()
        .enumerate()
        .filter(|(_, (count, _))| *count > 0)
        .map(|(i, (orders, revenue))| MonthlySales {
            month: i as u32 + 1,
            orders: *orders,
            revenue: *revenue,
        })
        .collect()
}

/// Groups line items by product and ranks by units sold, highest first.
///
/// Ties are broken by revenue, then by product id, so the ranking is stable.
pub fn rank_products<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Vec<ProductSales> {
    let mut groups: HashMap<ProductId, (u64, Money)> = HashMap::new();

    for item in orders.into_iter().flat_map(|o| o.items()) {
        let entry = groups.entry(item.product_id).or_insert((0, Money::zero()));
        entry.0 += u64::from(item.quantity);
        entry.1 = entry.1.saturating_add(item.price.saturating_mul(item.quantity));
    }

    let mut ranked: Vec<_> = groups
        .into_iter()
        .map(|(product_id, (quantity, revenue))| ProductSales {
            product_id,
            quantity,
            revenue,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| b.revenue.cmp(&a.revenue))
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    ranked
}

/// Attaches current product names to an already limited ranking.
///
/// Products missing from `names` are dropped, so the result may be shorter
/// than the input.
pub fn enrich_top_products(
    ranked: Vec<ProductSales>,
    names: &HashMap<ProductId, String>,
) -> Vec<TopProduct> {
    ranked
        .into_iter()
        .filter_map(|sales| {
            names.get(&sales.product_id).map(|name| TopProduct {
                product_id: sales.product_id,
                name: name.clone(),
                quantity: sales.quantity,
                revenue: sales.revenue,
            })
        })
        .collect()
}
